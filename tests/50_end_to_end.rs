//! Full router against the mock auth service and REST profile gateway.

mod common;

use std::sync::Arc;

use anyhow::Result;
use axum::http::StatusCode;

use common::mock_auth::{self, MockAuth, MockServer, GOOD_REFRESH, ROTATED_REFRESH};
use axum::Router;
use common::{assert_redirect, request, set_cookies, test_config};
use textile_dashboard::identity::HttpIdentityProvider;
use textile_dashboard::profile;
use textile_dashboard::state::AppState;

fn live_app(server: &MockServer) -> Result<Router> {
    let mut config = test_config();
    config.identity = server.identity_config();
    config.cookies = server.cookie_config();
    config.profiles.service_key = Some("service-key".to_string());

    let identity = Arc::new(HttpIdentityProvider::new(&config.identity, &config.cookies)?);
    let profiles = profile::from_config(&config)?;
    Ok(textile_dashboard::app(AppState::new(config, identity, profiles)))
}

#[tokio::test]
async fn expiring_session_is_refreshed_on_a_page_load() -> Result<()> {
    let server = mock_auth::spawn().await?;
    server.mock.set_profile("active", "Manager");
    let app = live_app(&server)?;

    let cookie = format!("sb-access-token={}; sb-refresh-token={}", server.mock.mint(10), GOOD_REFRESH);
    let res = request(&app, "GET", "/dashboard/orders", Some(&cookie), None).await?;

    assert_eq!(res.status(), StatusCode::OK);
    let cookies = set_cookies(&res);
    assert!(cookies.iter().any(|c| c.starts_with(&format!("sb-refresh-token={}", ROTATED_REFRESH))));
    assert_eq!(MockAuth::calls(&server.mock.refresh_calls), 1);
    assert_eq!(MockAuth::calls(&server.mock.profile_calls), 1);
    Ok(())
}

#[tokio::test]
async fn suspended_profile_forces_remote_sign_out() -> Result<()> {
    let server = mock_auth::spawn().await?;
    server.mock.set_profile("suspended", "User");
    let app = live_app(&server)?;

    let cookie = format!("sb-access-token={}", server.mock.mint_accepted(3600));
    let res = request(&app, "GET", "/dashboard", Some(&cookie), None).await?;

    assert_redirect(&res, "/login?error=account_inactive");
    assert_eq!(MockAuth::calls(&server.mock.logout_calls), 1);
    assert!(set_cookies(&res).iter().all(|c| c.contains("Max-Age=0")));
    Ok(())
}

#[tokio::test]
async fn api_whoami_uses_the_real_backends() -> Result<()> {
    let server = mock_auth::spawn().await?;
    server.mock.set_profile("active", "Imanager");
    let app = live_app(&server)?;

    let token = server.mock.mint_accepted(3600);
    let res = request(&app, "GET", "/api/auth/whoami", None, Some(&token)).await?;

    assert_eq!(res.status(), StatusCode::OK);
    let body = common::body_json(res).await?;
    assert_eq!(body["data"]["role"], "Imanager");
    assert_eq!(body["data"]["email"], "weaver@example.com");
    Ok(())
}
