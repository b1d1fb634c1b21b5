//! Identity provider seam: session resolution, refresh and sign-out.

use async_trait::async_trait;
use axum_extra::extract::cookie::CookieJar;
use thiserror::Error;

use crate::auth::Session;

pub mod http;
pub mod rotation;

pub use http::HttpIdentityProvider;
pub use rotation::{CredentialCookies, CredentialUpdate, Rotation};

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Identity provider unreachable: {0}")]
    Unreachable(#[from] reqwest::Error),

    #[error("Identity provider returned HTTP {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("Malformed credentials: {0}")]
    MalformedCredentials(String),

    #[error("Unexpected identity provider response: {0}")]
    InvalidResponse(String),
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolve the session carried by the request's credential cookies.
    ///
    /// Any credential replacement (or removal) is written to `rotation`;
    /// callers must propagate it to both the forwarded request and the response.
    async fn resolve_session(
        &self,
        credentials: &CookieJar,
        rotation: &mut Rotation,
    ) -> Result<Option<Session>, IdentityError>;

    /// Sign the session out. Clears the credential cookies through `rotation`
    /// even when the remote call fails.
    async fn invalidate_session(
        &self,
        session: &Session,
        rotation: &mut Rotation,
    ) -> Result<(), IdentityError>;
}
