use async_trait::async_trait;
use axum::http::request::Parts;
use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use uuid::Uuid;

/// Shared capability of the coarse path gate and the per-handler API checks
#[async_trait]
pub trait Authorize: Send + Sync {
    type Decision: Send;

    async fn authorize(&self, request: &Parts) -> Self::Decision;
}

/// Authenticated session as reported by the identity provider
#[derive(Clone, Serialize)]
pub struct Session {
    pub subject_id: Uuid,
    pub email: Option<String>,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    #[serde(skip)]
    access_token: String,
    #[serde(skip)]
    refresh_token: Option<String>,
}

impl Session {
    pub fn new(
        subject_id: Uuid,
        email: Option<String>,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            subject_id,
            email,
            issued_at,
            expires_at,
            access_token: String::new(),
            refresh_token: None,
        }
    }

    pub fn with_tokens(mut self, access_token: impl Into<String>, refresh_token: Option<String>) -> Self {
        self.access_token = access_token.into();
        self.refresh_token = refresh_token;
        self
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("subject_id", &self.subject_id)
            .field("email", &self.email)
            .field("issued_at", &self.issued_at)
            .field("expires_at", &self.expires_at)
            .field("access_token", &fingerprint(&self.access_token))
            .field("refresh_token", &self.refresh_token.as_deref().map(fingerprint))
            .finish()
    }
}

/// Claims carried by the provider's access tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: String,
    pub exp: i64,
    #[serde(default)]
    pub iat: Option<i64>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ClaimsError {
    #[error("Malformed access token: {0}")]
    Malformed(#[from] jsonwebtoken::errors::Error),

    #[error("Access token timestamp out of range: {0}")]
    InvalidTimestamp(i64),
}

impl AccessClaims {
    /// Read the claims without verifying the signature.
    ///
    /// Only used to decide when to refresh; the identity provider remains the
    /// authority on whether the token is valid.
    pub fn peek(token: &str) -> Result<Self, ClaimsError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        let data = decode::<AccessClaims>(token, &DecodingKey::from_secret(&[]), &validation)?;
        Ok(data.claims)
    }

    pub fn expires_at(&self) -> Result<DateTime<Utc>, ClaimsError> {
        timestamp(self.exp)
    }

    pub fn issued_at(&self) -> Result<Option<DateTime<Utc>>, ClaimsError> {
        self.iat.map(timestamp).transpose()
    }

    /// True when the token is expired or expires within `margin`.
    /// A window past the representable range counts as expiring.
    pub fn expires_within(&self, margin: Duration, now: DateTime<Utc>) -> bool {
        match now.checked_add_signed(margin) {
            Some(deadline) => self.exp <= deadline.timestamp(),
            None => true,
        }
    }
}

fn timestamp(secs: i64) -> Result<DateTime<Utc>, ClaimsError> {
    Utc.timestamp_opt(secs, 0)
        .single()
        .ok_or(ClaimsError::InvalidTimestamp(secs))
}

/// Short stable identifier for a credential, safe to log
pub fn fingerprint(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    digest.iter().take(4).map(|b| format!("{:02x}", b)).collect()
}
