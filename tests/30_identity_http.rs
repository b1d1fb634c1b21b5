mod common;

use anyhow::Result;
use axum_extra::extract::cookie::{Cookie, CookieJar};

use common::mock_auth::{self, MockAuth, MockServer, GOOD_REFRESH, ROTATED_REFRESH};
use textile_dashboard::identity::{
    CredentialUpdate, HttpIdentityProvider, IdentityError, IdentityProvider, Rotation,
};

fn provider(server: &MockServer) -> Result<HttpIdentityProvider> {
    Ok(HttpIdentityProvider::new(&server.identity_config(), &server.cookie_config())?)
}

fn jar(access: Option<&str>, refresh: Option<&str>) -> CookieJar {
    let mut jar = CookieJar::new();
    if let Some(token) = access {
        jar = jar.add(Cookie::new("sb-access-token", token.to_string()));
    }
    if let Some(token) = refresh {
        jar = jar.add(Cookie::new("sb-refresh-token", token.to_string()));
    }
    jar
}

fn set_value<'a>(rotation: &'a Rotation, name: &str) -> Option<&'a str> {
    rotation.updates().iter().find_map(|update| match update {
        CredentialUpdate::Set(cookie) if cookie.name() == name => Some(cookie.value()),
        _ => None,
    })
}

fn is_cleared(rotation: &Rotation) -> bool {
    rotation.updates().len() == 2
        && rotation
            .updates()
            .iter()
            .all(|u| matches!(u, CredentialUpdate::Unset(_)))
}

#[tokio::test]
async fn live_access_token_resolves_without_refresh() -> Result<()> {
    let server = mock_auth::spawn().await?;
    let token = server.mock.mint_accepted(3600);

    let mut rotation = Rotation::default();
    let session = provider(&server)?
        .resolve_session(&jar(Some(&token), Some(GOOD_REFRESH)), &mut rotation)
        .await?
        .expect("session");

    assert_eq!(session.subject_id, server.mock.user_id);
    assert_eq!(session.email.as_deref(), Some("weaver@example.com"));
    assert_eq!(session.access_token(), token);
    assert!(rotation.is_empty());
    assert_eq!(MockAuth::calls(&server.mock.user_calls), 1);
    assert_eq!(MockAuth::calls(&server.mock.refresh_calls), 0);
    Ok(())
}

#[tokio::test]
async fn near_expiry_token_is_refreshed_up_front() -> Result<()> {
    let server = mock_auth::spawn().await?;
    let token = server.mock.mint_accepted(30);

    let mut rotation = Rotation::default();
    let session = provider(&server)?
        .resolve_session(&jar(Some(&token), Some(GOOD_REFRESH)), &mut rotation)
        .await?
        .expect("session");

    assert_eq!(session.subject_id, server.mock.user_id);
    assert_eq!(MockAuth::calls(&server.mock.user_calls), 0);
    assert_eq!(MockAuth::calls(&server.mock.refresh_calls), 1);

    let new_access = set_value(&rotation, "sb-access-token").expect("access cookie");
    assert_ne!(new_access, token);
    assert_eq!(session.access_token(), new_access);
    assert_eq!(set_value(&rotation, "sb-refresh-token"), Some(ROTATED_REFRESH));
    Ok(())
}

#[tokio::test]
async fn refresh_cookie_alone_restores_the_session() -> Result<()> {
    let server = mock_auth::spawn().await?;

    let mut rotation = Rotation::default();
    let session = provider(&server)?
        .resolve_session(&jar(None, Some(GOOD_REFRESH)), &mut rotation)
        .await?;

    assert!(session.is_some());
    assert_eq!(rotation.updates().len(), 2);
    assert_eq!(set_value(&rotation, "sb-refresh-token"), Some(ROTATED_REFRESH));
    Ok(())
}

#[tokio::test]
async fn revoked_access_token_falls_back_to_refresh() -> Result<()> {
    let server = mock_auth::spawn().await?;
    // Well-formed and unexpired, but unknown to the provider
    let token = server.mock.mint(3600);

    let mut rotation = Rotation::default();
    let session = provider(&server)?
        .resolve_session(&jar(Some(&token), Some(GOOD_REFRESH)), &mut rotation)
        .await?;

    assert!(session.is_some());
    assert_eq!(MockAuth::calls(&server.mock.user_calls), 1);
    assert_eq!(MockAuth::calls(&server.mock.refresh_calls), 1);
    assert!(set_value(&rotation, "sb-access-token").is_some());
    Ok(())
}

#[tokio::test]
async fn revoked_access_token_without_refresh_clears_credentials() -> Result<()> {
    let server = mock_auth::spawn().await?;
    let token = server.mock.mint(3600);

    let mut rotation = Rotation::default();
    let session = provider(&server)?
        .resolve_session(&jar(Some(&token), None), &mut rotation)
        .await?;

    assert!(session.is_none());
    assert!(is_cleared(&rotation));
    Ok(())
}

#[tokio::test]
async fn rejected_refresh_token_clears_credentials() -> Result<()> {
    let server = mock_auth::spawn().await?;

    let mut rotation = Rotation::default();
    let session = provider(&server)?
        .resolve_session(&jar(None, Some("used-up")), &mut rotation)
        .await?;

    assert!(session.is_none());
    assert!(is_cleared(&rotation));
    assert_eq!(MockAuth::calls(&server.mock.refresh_calls), 1);
    Ok(())
}

#[tokio::test]
async fn out_of_range_token_lifetime_fails_closed() -> Result<()> {
    let server = mock_auth::spawn().await?;
    server.mock.set_token_expires_in(i64::MAX / 1000);

    let mut rotation = Rotation::default();
    let result = provider(&server)?
        .resolve_session(&jar(None, Some(GOOD_REFRESH)), &mut rotation)
        .await;

    assert!(matches!(result, Err(IdentityError::InvalidResponse(_))));
    assert!(rotation.is_empty());
    assert_eq!(MockAuth::calls(&server.mock.refresh_calls), 1);
    Ok(())
}

#[tokio::test]
async fn provider_server_errors_surface() -> Result<()> {
    let server = mock_auth::spawn().await?;
    let token = server.mock.mint_accepted(3600);
    server.mock.fail_user_endpoint(500);

    let mut rotation = Rotation::default();
    let result = provider(&server)?
        .resolve_session(&jar(Some(&token), None), &mut rotation)
        .await;

    assert!(matches!(result, Err(IdentityError::Rejected { status: 500, .. })));
    assert!(rotation.is_empty());
    Ok(())
}

#[tokio::test]
async fn unreachable_provider_is_an_error() -> Result<()> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);

    let server = mock_auth::spawn().await?;
    let mut config = server.identity_config();
    config.url = format!("http://{}", addr);
    let provider = HttpIdentityProvider::new(&config, &server.cookie_config())?;

    let token = server.mock.mint(3600);
    let mut rotation = Rotation::default();
    let result = provider.resolve_session(&jar(Some(&token), None), &mut rotation).await;

    assert!(matches!(result, Err(IdentityError::Unreachable(_))));
    Ok(())
}

#[tokio::test]
async fn invalidate_signs_out_and_clears_cookies() -> Result<()> {
    let server = mock_auth::spawn().await?;
    let token = server.mock.mint_accepted(3600);
    let provider = provider(&server)?;

    let mut rotation = Rotation::default();
    let session = provider
        .resolve_session(&jar(Some(&token), None), &mut rotation)
        .await?
        .expect("session");

    provider.invalidate_session(&session, &mut rotation).await?;
    assert_eq!(MockAuth::calls(&server.mock.logout_calls), 1);
    assert!(is_cleared(&rotation));

    // The provider no longer accepts the token
    let mut rotation = Rotation::default();
    let again = provider.resolve_session(&jar(Some(&token), None), &mut rotation).await?;
    assert!(again.is_none());
    Ok(())
}
