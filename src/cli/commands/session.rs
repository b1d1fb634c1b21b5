use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde_json::json;

use crate::cli::utils::{describe_rotation, output_error, output_success};
use crate::cli::OutputFormat;
use crate::config::AppConfig;
use crate::identity::{HttpIdentityProvider, IdentityProvider, Rotation};

pub async fn handle(
    config: &AppConfig,
    access_token: Option<String>,
    refresh_token: Option<String>,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    let provider = HttpIdentityProvider::new(&config.identity, &config.cookies)?;
    let names = provider.credential_cookies();

    let mut credentials = CookieJar::new();
    if let Some(token) = access_token {
        credentials = credentials.add(Cookie::new(names.access_token_name.clone(), token));
    }
    if let Some(token) = refresh_token {
        credentials = credentials.add(Cookie::new(names.refresh_token_name.clone(), token));
    }

    let mut rotation = Rotation::default();
    match provider.resolve_session(&credentials, &mut rotation).await? {
        Some(session) => output_success(
            &output_format,
            &format!("Session for {}", session.subject_id),
            Some(json!({
                "subject_id": session.subject_id,
                "email": session.email,
                "issued_at": session.issued_at,
                "expires_at": session.expires_at,
                "rotation": describe_rotation(&rotation),
            })),
        ),
        None => output_error(
            &output_format,
            &format!("No session (rotation: {})", describe_rotation(&rotation)),
            Some("NO_SESSION"),
        ),
    }
}
