use axum::{extract::Query, response::Html};
use serde::Deserialize;

/// Query parameters the login page understands
#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    /// Path to return to after signing in
    pub redirect: Option<String>,
    /// Set to `account_inactive` when a suspended account was signed out
    pub error: Option<String>,
}

/// GET /login
pub async fn login_page(Query(query): Query<LoginQuery>) -> Html<String> {
    let notice = match query.error.as_deref() {
        Some("account_inactive") => "<p class=\"error\">Your account is not active. Contact an administrator.</p>",
        _ => "",
    };
    let return_to = query.redirect.as_deref().filter(|p| p.starts_with('/')).unwrap_or("/dashboard");

    Html(format!(
        "<h1>Sign in</h1>{notice}<form method=\"post\" data-return-to=\"{}\"></form>",
        escape_attribute(return_to)
    ))
}

/// GET /signup
pub async fn signup_page() -> Html<&'static str> {
    Html("<h1>Create an account</h1>")
}

/// GET /forgot-password
pub async fn forgot_password_page() -> Html<&'static str> {
    Html("<h1>Reset your password</h1>")
}

/// GET /reset-password
pub async fn reset_password_page() -> Html<&'static str> {
    Html("<h1>Choose a new password</h1>")
}

fn escape_attribute(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
