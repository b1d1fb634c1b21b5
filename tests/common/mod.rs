#![allow(dead_code)]

pub mod mock_auth;

use std::sync::Arc;

use anyhow::Result;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, Response, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use textile_dashboard::config::{AppConfig, Environment};
use textile_dashboard::state::AppState;
use textile_dashboard::testing::{FakeIdentityProvider, FakeProfileStore};

pub struct TestApp {
    pub router: Router,
    pub identity: Arc<FakeIdentityProvider>,
    pub profiles: Arc<FakeProfileStore>,
}

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::for_environment(Environment::Development);
    config.cookies.secure = false;
    config.server.enable_request_logging = false;
    config.security.enable_cors = false;
    config
}

/// Router wired to in-memory collaborators the test can seed and inspect
pub fn test_app(identity: Arc<FakeIdentityProvider>, profiles: Arc<FakeProfileStore>) -> TestApp {
    let state = AppState::new(test_config(), identity.clone(), profiles.clone());
    TestApp {
        router: textile_dashboard::app(state),
        identity,
        profiles,
    }
}

impl TestApp {
    pub async fn get(&self, path: &str, cookie: Option<&str>) -> Result<Response<Body>> {
        self.send("GET", path, cookie, None).await
    }

    pub async fn send(
        &self,
        method: &str,
        path: &str,
        cookie: Option<&str>,
        bearer: Option<&str>,
    ) -> Result<Response<Body>> {
        request(&self.router, method, path, cookie, bearer).await
    }
}

/// One-shot request against a router, with optional cookie header and bearer token
pub async fn request(
    router: &Router,
    method: &str,
    path: &str,
    cookie: Option<&str>,
    bearer: Option<&str>,
) -> Result<Response<Body>> {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    Ok(router.clone().oneshot(builder.body(Body::empty())?).await?)
}

pub fn location(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

pub fn set_cookies(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(str::to_string)
        .collect()
}

pub fn assert_redirect(response: &Response<Body>, expected: &str) {
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(response).as_deref(), Some(expected));
}

pub async fn body_json(response: Response<Body>) -> Result<Value> {
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

pub async fn body_text(response: Response<Body>) -> Result<String> {
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    Ok(String::from_utf8(bytes.to_vec())?)
}
