use axum::{
    extract::State,
    http::Uri,
    response::{Html, Redirect},
    Extension,
};

use crate::auth::Session;
use crate::profile::AccountStatus;
use crate::state::AppState;

/// GET / - The dashboard is the landing page for signed-in users
pub async fn root_redirect(State(state): State<AppState>) -> Redirect {
    Redirect::temporary(&state.config.gate.dashboard_path)
}

/// GET /dashboard and GET /dashboard/*rest
///
/// The gate inserts the resolved `Session` and, when the profile lookup
/// succeeded, the `AccountStatus`. A missing profile is allowed through.
pub async fn dashboard_page(
    uri: Uri,
    session: Option<Extension<Session>>,
    account: Option<Extension<AccountStatus>>,
) -> Html<String> {
    let who = session
        .as_ref()
        .and_then(|Extension(s)| s.email.clone())
        .unwrap_or_else(|| "unknown user".to_string());
    let role = account
        .as_ref()
        .map(|Extension(a)| a.role.as_str())
        .unwrap_or("unassigned");

    Html(format!(
        "<h1>Dashboard</h1><p data-path=\"{}\">Signed in as {} ({})</p>",
        uri.path(),
        html_escape(&who),
        role
    ))
}

fn html_escape(value: &str) -> String {
    value.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}
