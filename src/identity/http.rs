use async_trait::async_trait;
use axum_extra::extract::cookie::CookieJar;
use chrono::{DateTime, Duration, TimeZone, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::rotation::{CredentialCookies, Rotation};
use super::{IdentityError, IdentityProvider};
use crate::auth::{fingerprint, AccessClaims, Session};
use crate::config::{CookieConfig, IdentityConfig};

/// Identity provider speaking the hosted auth service's REST API
pub struct HttpIdentityProvider {
    client: Client,
    base_url: String,
    anon_key: String,
    refresh_margin: Duration,
    cookies: CredentialCookies,
}

#[derive(Debug, Deserialize)]
struct RemoteUser {
    id: Uuid,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: RemoteUser,
}

impl HttpIdentityProvider {
    pub fn new(identity: &IdentityConfig, cookies: &CookieConfig) -> Result<Self, IdentityError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(identity.request_timeout_secs))
            .build()?;

        Ok(Self::with_client(client, identity, cookies))
    }

    pub fn with_client(client: Client, identity: &IdentityConfig, cookies: &CookieConfig) -> Self {
        Self {
            client,
            base_url: identity.url.trim_end_matches('/').to_string(),
            anon_key: identity.anon_key.clone(),
            refresh_margin: Duration::try_seconds(identity.refresh_margin_secs).unwrap_or(Duration::zero()),
            cookies: CredentialCookies::from_config(cookies),
        }
    }

    pub fn credential_cookies(&self) -> &CredentialCookies {
        &self.cookies
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    /// GET /auth/v1/user. `None` when the provider rejects the token.
    async fn fetch_user(&self, access_token: &str) -> Result<Option<RemoteUser>, IdentityError> {
        let response = self
            .client
            .get(self.endpoint("user"))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => Ok(Some(response.json::<RemoteUser>().await?)),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(None),
            status => Err(rejected(status, response).await),
        }
    }

    /// Exchange the refresh token for a new pair, rotating the cookies.
    async fn refresh(
        &self,
        refresh_token: &str,
        rotation: &mut Rotation,
    ) -> Result<Option<Session>, IdentityError> {
        debug!(token = %fingerprint(refresh_token), "Refreshing session");

        let response = self
            .client
            .post(self.endpoint("token"))
            .query(&[("grant_type", "refresh_token")])
            .header("apikey", &self.anon_key)
            .json(&json!({ "refresh_token": refresh_token }))
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => {
                let tokens = response.json::<TokenResponse>().await?;
                let cookies = self.cookies.issue(&tokens.access_token, &tokens.refresh_token);
                let session = session_from_tokens(tokens)?;
                rotation.replace(cookies);
                info!(subject_id = %session.subject_id, "Session refreshed");
                Ok(Some(session))
            }
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                info!(token = %fingerprint(refresh_token), "Refresh token rejected; clearing credentials");
                rotation.replace(self.cookies.clear());
                Ok(None)
            }
            status => Err(rejected(status, response).await),
        }
    }

    async fn refresh_or_clear(
        &self,
        refresh_token: Option<&str>,
        rotation: &mut Rotation,
    ) -> Result<Option<Session>, IdentityError> {
        match refresh_token {
            Some(token) => self.refresh(token, rotation).await,
            None => {
                rotation.replace(self.cookies.clear());
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn resolve_session(
        &self,
        credentials: &CookieJar,
        rotation: &mut Rotation,
    ) -> Result<Option<Session>, IdentityError> {
        let access_token = self.cookies.access_token(credentials);
        let refresh_token = self.cookies.refresh_token(credentials);

        let access_token = match (access_token, refresh_token) {
            (None, None) => return Ok(None),
            (None, Some(refresh)) => return self.refresh(refresh, rotation).await,
            (Some(access), _) => access,
        };

        let claims = match AccessClaims::peek(access_token) {
            Ok(claims) => claims,
            Err(e) => {
                warn!(token = %fingerprint(access_token), "Unreadable access token: {}", e);
                return self.refresh_or_clear(refresh_token, rotation).await;
            }
        };

        if claims.expires_within(self.refresh_margin, Utc::now()) {
            debug!(token = %fingerprint(access_token), exp = claims.exp, "Access token near expiry");
            return self.refresh_or_clear(refresh_token, rotation).await;
        }

        match self.fetch_user(access_token).await? {
            Some(user) => {
                let expires_at = claims
                    .expires_at()
                    .map_err(|e| IdentityError::MalformedCredentials(e.to_string()))?;
                let issued_at = claims
                    .issued_at()
                    .map_err(|e| IdentityError::MalformedCredentials(e.to_string()))?
                    .unwrap_or_else(Utc::now);

                Ok(Some(
                    Session::new(user.id, user.email.or(claims.email), issued_at, expires_at)
                        .with_tokens(access_token, refresh_token.map(str::to_string)),
                ))
            }
            None => {
                debug!(token = %fingerprint(access_token), "Access token rejected by provider");
                self.refresh_or_clear(refresh_token, rotation).await
            }
        }
    }

    async fn invalidate_session(
        &self,
        session: &Session,
        rotation: &mut Rotation,
    ) -> Result<(), IdentityError> {
        rotation.replace(self.cookies.clear());

        let response = self
            .client
            .post(self.endpoint("logout"))
            .query(&[("scope", "local")])
            .header("apikey", &self.anon_key)
            .bearer_auth(session.access_token())
            .send()
            .await?;

        match response.status() {
            // An already-revoked session counts as signed out
            status if status.is_success() || status == StatusCode::UNAUTHORIZED || status == StatusCode::NOT_FOUND => {
                info!(subject_id = %session.subject_id, "Session invalidated");
                Ok(())
            }
            status => Err(rejected(status, response).await),
        }
    }
}

fn session_from_tokens(tokens: TokenResponse) -> Result<Session, IdentityError> {
    let now = Utc::now();
    let claims = AccessClaims::peek(&tokens.access_token).ok();

    let expires_at = match (tokens.expires_at, tokens.expires_in, claims.as_ref()) {
        (Some(at), _, _) => from_timestamp(at)?,
        (None, Some(secs), _) => Duration::try_seconds(secs)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .ok_or_else(|| IdentityError::InvalidResponse(format!("expires_in out of range: {}", secs)))?,
        (None, None, Some(claims)) => from_timestamp(claims.exp)?,
        (None, None, None) => {
            return Err(IdentityError::InvalidResponse(
                "token response carries no expiry".to_string(),
            ))
        }
    };

    let issued_at = claims
        .as_ref()
        .and_then(|c| c.iat)
        .map(from_timestamp)
        .transpose()?
        .unwrap_or(now);

    Ok(Session::new(tokens.user.id, tokens.user.email, issued_at, expires_at)
        .with_tokens(tokens.access_token, Some(tokens.refresh_token)))
}

fn from_timestamp(secs: i64) -> Result<DateTime<Utc>, IdentityError> {
    Utc.timestamp_opt(secs, 0)
        .single()
        .ok_or_else(|| IdentityError::InvalidResponse(format!("timestamp out of range: {}", secs)))
}

async fn rejected(status: StatusCode, response: reqwest::Response) -> IdentityError {
    let message = response.text().await.unwrap_or_default();
    IdentityError::Rejected {
        status: status.as_u16(),
        message: message.chars().take(200).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> HttpIdentityProvider {
        let identity = IdentityConfig {
            url: "http://auth.invalid/".to_string(),
            anon_key: "anon".to_string(),
            request_timeout_secs: 1,
            refresh_margin_secs: 60,
        };
        HttpIdentityProvider::new(&identity, &CookieConfig::default()).unwrap()
    }

    fn token_response(expires_at: Option<i64>, expires_in: Option<i64>) -> TokenResponse {
        TokenResponse {
            access_token: "opaque".to_string(),
            refresh_token: "r".to_string(),
            expires_in,
            expires_at,
            user: RemoteUser {
                id: Uuid::nil(),
                email: None,
            },
        }
    }

    #[test]
    fn builds_endpoints_without_double_slash() {
        assert_eq!(provider().endpoint("user"), "http://auth.invalid/auth/v1/user");
    }

    #[tokio::test]
    async fn no_cookies_means_no_session_and_no_call() {
        let mut rotation = Rotation::default();
        let session = provider()
            .resolve_session(&CookieJar::new(), &mut rotation)
            .await
            .unwrap();
        assert!(session.is_none());
        assert!(rotation.is_empty());
    }

    #[tokio::test]
    async fn garbage_access_token_without_refresh_clears_cookies() {
        let provider = provider();
        let jar = CookieJar::new().add(axum_extra::extract::cookie::Cookie::new(
            provider.credential_cookies().access_token_name.clone(),
            "garbage",
        ));
        let mut rotation = Rotation::default();
        let session = provider.resolve_session(&jar, &mut rotation).await.unwrap();

        assert!(session.is_none());
        assert_eq!(rotation.updates().len(), 2);
    }

    #[test]
    fn token_expiry_prefers_absolute_timestamp() {
        let at = Utc::now().timestamp() + 500;
        let session = session_from_tokens(token_response(Some(at), Some(10))).unwrap();
        assert_eq!(session.expires_at.timestamp(), at);
        assert_eq!(session.refresh_token(), Some("r"));
    }

    #[test]
    fn token_expiry_falls_back_to_relative() {
        let before = Utc::now();
        let session = session_from_tokens(token_response(None, Some(3600))).unwrap();
        assert!(session.expires_at >= before + Duration::seconds(3600));
    }

    #[test]
    fn out_of_range_relative_expiry_is_invalid() {
        assert!(matches!(
            session_from_tokens(token_response(None, Some(i64::MAX / 1000))),
            Err(IdentityError::InvalidResponse(_))
        ));
        assert!(matches!(
            session_from_tokens(token_response(None, Some(i64::MAX))),
            Err(IdentityError::InvalidResponse(_))
        ));
    }

    #[test]
    fn token_without_any_expiry_is_invalid() {
        assert!(matches!(
            session_from_tokens(token_response(None, None)),
            Err(IdentityError::InvalidResponse(_))
        ));
    }
}
