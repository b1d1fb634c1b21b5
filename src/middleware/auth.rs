use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use std::sync::Arc;

use crate::auth::{Authorize, Session};
use crate::error::ApiError;
use crate::identity::{CredentialCookies, IdentityProvider, Rotation};
use crate::profile::{AccountStatus, ProfileStore};
use crate::state::AppState;
use crate::types::{Access, AccountState, Resource};

/// Authenticated, active caller of an API handler
#[derive(Clone, Debug)]
pub struct AuthContext {
    pub session: Session,
    pub account: AccountStatus,
    /// Credentials rotated while authenticating; return them with the response
    pub rotation: Rotation,
}

impl AuthContext {
    pub fn require(&self, resource: Resource, access: Access) -> Result<(), ApiError> {
        if self.account.role.permits(resource, access) {
            Ok(())
        } else {
            tracing::warn!(
                subject_id = %self.session.subject_id,
                role = %self.account.role,
                %resource,
                %access,
                "Permission denied"
            );
            Err(ApiError::forbidden(format!(
                "Role '{}' may not {} {}",
                self.account.role, access, resource
            )))
        }
    }
}

/// Rejection that still hands rotated credentials back to the client
#[derive(Debug)]
pub struct ApiRejection {
    pub error: ApiError,
    pub rotation: Rotation,
}

impl From<ApiError> for ApiRejection {
    fn from(error: ApiError) -> Self {
        Self {
            error,
            rotation: Rotation::default(),
        }
    }
}

impl IntoResponse for ApiRejection {
    fn into_response(self) -> Response {
        (self.rotation, self.error).into_response()
    }
}

/// Fine-grained checker used by API handlers, independent of the page gate
pub struct ApiAuthorizer {
    identity: Arc<dyn IdentityProvider>,
    profiles: Arc<dyn ProfileStore>,
    cookies: Arc<CredentialCookies>,
    requirement: Option<(Resource, Access)>,
}

impl ApiAuthorizer {
    pub fn from_state(state: &AppState) -> Self {
        Self {
            identity: state.identity.clone(),
            profiles: state.profiles.clone(),
            cookies: state.cookies.clone(),
            requirement: None,
        }
    }

    pub fn requiring(mut self, resource: Resource, access: Access) -> Self {
        self.requirement = Some((resource, access));
        self
    }

    /// Credential cookies, with a bearer token overriding the access cookie
    pub fn credentials(&self, headers: &HeaderMap) -> Result<CookieJar, ApiError> {
        let jar = CookieJar::from_headers(headers);
        Ok(match extract_bearer_token(headers)? {
            Some(token) => jar.add(Cookie::new(self.cookies.access_token_name.clone(), token)),
            None => jar,
        })
    }

    pub fn identity(&self) -> &Arc<dyn IdentityProvider> {
        &self.identity
    }

    async fn check(&self, headers: &HeaderMap, rotation: &mut Rotation) -> Result<AuthContext, ApiError> {
        let credentials = self.credentials(headers)?;

        let session = self
            .identity
            .resolve_session(&credentials, rotation)
            .await?
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

        let account = self
            .profiles
            .lookup_account_status(session.subject_id)
            .await?
            .ok_or_else(|| {
                tracing::warn!(subject_id = %session.subject_id, "API caller has no profile");
                ApiError::forbidden("Account profile not found")
            })?;

        match account.status {
            AccountState::Active => {}
            AccountState::Suspended | AccountState::Inactive => {
                tracing::warn!(subject_id = %session.subject_id, status = %account.status, "API caller not active");
                return Err(ApiError::forbidden("Account is not active"));
            }
        }

        let context = AuthContext {
            session,
            account,
            rotation: Rotation::default(),
        };
        if let Some((resource, access)) = self.requirement {
            context.require(resource, access)?;
        }
        Ok(context)
    }
}

#[async_trait]
impl Authorize for ApiAuthorizer {
    type Decision = Result<AuthContext, ApiRejection>;

    async fn authorize(&self, request: &Parts) -> Self::Decision {
        let mut rotation = Rotation::default();
        match self.check(&request.headers, &mut rotation).await {
            Ok(mut context) => {
                context.rotation = rotation;
                Ok(context)
            }
            Err(error) => Err(ApiRejection { error, rotation }),
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthContext {
    type Rejection = ApiRejection;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        ApiAuthorizer::from_state(state).authorize(parts).await
    }
}

/// Extract the bearer token from the Authorization header, if any
fn extract_bearer_token(headers: &HeaderMap) -> Result<Option<String>, ApiError> {
    let Some(auth_header) = headers.get(AUTHORIZATION) else {
        return Ok(None);
    };

    let auth_str = auth_header
        .to_str()
        .map_err(|_| ApiError::unauthorized("Invalid Authorization header format"))?;

    match auth_str.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(Some(token.trim().to_string())),
        Some(_) => Err(ApiError::unauthorized("Empty bearer token")),
        None => Err(ApiError::unauthorized("Authorization header must use Bearer token format")),
    }
}
