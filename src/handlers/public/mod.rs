// handlers/public/mod.rs - Pages and endpoints reachable without a session
//
// The auth pages are still routed through the page gate so that signed-in
// visitors are bounced to the dashboard.
pub mod health;
pub mod pages;

pub use health::health;
pub use pages::{forgot_password_page, login_page, reset_password_page, signup_page};
