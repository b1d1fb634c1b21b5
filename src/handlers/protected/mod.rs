// handlers/protected/mod.rs - Handlers that require a signed-in, active account
//
// Dashboard pages rely on the page gate having run and read the resolved
// session from request extensions. API handlers take an `AuthContext`,
// which runs the API authorizer independently of the gate.
pub mod auth;
pub mod dashboard;

pub use auth::{access_check, logout, whoami};
pub use dashboard::{dashboard_page, root_redirect};
