//! Mock hosted auth service and REST profile gateway on an ephemeral port.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, AtomicU16, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use uuid::Uuid;

use textile_dashboard::config::{CookieConfig, IdentityConfig};

pub const GOOD_REFRESH: &str = "good-refresh";
pub const ROTATED_REFRESH: &str = "rotated-refresh";

#[derive(Default)]
pub struct MockAuth {
    pub user_id: Uuid,
    accepted: Mutex<Vec<String>>,
    profiles: Mutex<HashMap<Uuid, (String, String)>>,
    user_status_override: AtomicU16,
    token_expires_in: AtomicI64,
    pub user_calls: AtomicUsize,
    pub refresh_calls: AtomicUsize,
    pub logout_calls: AtomicUsize,
    pub profile_calls: AtomicUsize,
}

impl MockAuth {
    /// Mint a token for the mock user expiring in `expires_in_secs`
    pub fn mint(&self, expires_in_secs: i64) -> String {
        let now = Utc::now().timestamp();
        let claims = json!({
            "sub": self.user_id.to_string(),
            "exp": now + expires_in_secs,
            "iat": now,
            "email": "weaver@example.com",
        });
        encode(&Header::default(), &claims, &EncodingKey::from_secret(b"mock-secret")).unwrap()
    }

    /// Mint a token the provider will accept on `/auth/v1/user`
    pub fn mint_accepted(&self, expires_in_secs: i64) -> String {
        let token = self.mint(expires_in_secs);
        self.accepted.lock().unwrap().push(token.clone());
        token
    }

    pub fn set_profile(&self, status: &str, role: &str) {
        self.profiles
            .lock()
            .unwrap()
            .insert(self.user_id, (status.to_string(), role.to_string()));
    }

    pub fn fail_user_endpoint(&self, status: u16) {
        self.user_status_override.store(status, Ordering::SeqCst);
    }

    /// Override `expires_in` on refresh responses (0 restores the default)
    pub fn set_token_expires_in(&self, secs: i64) {
        self.token_expires_in.store(secs, Ordering::SeqCst);
    }

    pub fn calls(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

pub struct MockServer {
    pub mock: Arc<MockAuth>,
    pub base_url: String,
}

impl MockServer {
    pub fn identity_config(&self) -> IdentityConfig {
        IdentityConfig {
            url: self.base_url.clone(),
            anon_key: "anon-key".to_string(),
            request_timeout_secs: 5,
            refresh_margin_secs: 60,
        }
    }

    pub fn cookie_config(&self) -> CookieConfig {
        CookieConfig {
            secure: false,
            ..CookieConfig::default()
        }
    }
}

pub async fn spawn() -> Result<MockServer> {
    let mock = Arc::new(MockAuth {
        user_id: Uuid::new_v4(),
        ..MockAuth::default()
    });

    let router = Router::new()
        .route("/auth/v1/user", get(user))
        .route("/auth/v1/token", post(token))
        .route("/auth/v1/logout", post(logout))
        .route("/rest/v1/profiles", get(profiles))
        .with_state(mock.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });

    Ok(MockServer {
        mock,
        base_url: format!("http://{}", addr),
    })
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string)
}

async fn user(State(mock): State<Arc<MockAuth>>, headers: HeaderMap) -> Response {
    mock.user_calls.fetch_add(1, Ordering::SeqCst);

    let forced = mock.user_status_override.load(Ordering::SeqCst);
    if forced != 0 {
        let status = StatusCode::from_u16(forced).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        return (status, "forced failure").into_response();
    }
    if headers.get("apikey").is_none() {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "msg": "no apikey" }))).into_response();
    }

    let accepted = bearer(&headers).map_or(false, |t| mock.accepted.lock().unwrap().contains(&t));
    if accepted {
        Json(json!({ "id": mock.user_id, "email": "weaver@example.com", "aud": "authenticated" })).into_response()
    } else {
        (StatusCode::UNAUTHORIZED, Json(json!({ "msg": "invalid JWT" }))).into_response()
    }
}

async fn token(
    State(mock): State<Arc<MockAuth>>,
    Query(query): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> Response {
    mock.refresh_calls.fetch_add(1, Ordering::SeqCst);

    let grant_ok = query.get("grant_type").map(String::as_str) == Some("refresh_token");
    if !grant_ok || body["refresh_token"] != GOOD_REFRESH {
        return (StatusCode::BAD_REQUEST, Json(json!({ "error": "invalid_grant" }))).into_response();
    }

    let access_token = mock.mint_accepted(3600);
    let expires_in = match mock.token_expires_in.load(Ordering::SeqCst) {
        0 => 3600,
        secs => secs,
    };
    Json(json!({
        "access_token": access_token,
        "refresh_token": ROTATED_REFRESH,
        "token_type": "bearer",
        "expires_in": expires_in,
        "user": { "id": mock.user_id, "email": "weaver@example.com" },
    }))
    .into_response()
}

async fn logout(State(mock): State<Arc<MockAuth>>, headers: HeaderMap) -> StatusCode {
    mock.logout_calls.fetch_add(1, Ordering::SeqCst);
    if let Some(token) = bearer(&headers) {
        mock.accepted.lock().unwrap().retain(|t| t != &token);
    }
    StatusCode::NO_CONTENT
}

async fn profiles(
    State(mock): State<Arc<MockAuth>>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    mock.profile_calls.fetch_add(1, Ordering::SeqCst);

    if headers.get("apikey").is_none() {
        return (StatusCode::UNAUTHORIZED, "no apikey").into_response();
    }

    let id = query
        .get("id")
        .and_then(|f| f.strip_prefix("eq."))
        .and_then(|s| Uuid::parse_str(s).ok());
    let rows: Vec<Value> = id
        .and_then(|id| mock.profiles.lock().unwrap().get(&id).cloned())
        .map(|(status, role)| json!({ "status": status, "role": role }))
        .into_iter()
        .collect();

    Json(rows).into_response()
}
