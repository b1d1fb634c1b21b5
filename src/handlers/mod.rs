// handlers/mod.rs - Handlers grouped by who may reach them
//
// Public handlers serve the sign-in flow and health checks. Protected
// handlers sit behind the page gate (dashboard pages) or the API
// authorizer (`AuthContext` extractor).
pub mod public;
pub mod protected;

pub use public::*;
pub use protected::*;
