use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use axum_extra::extract::cookie::CookieJar;
use serde_json::{json, Map, Value};

use crate::identity::Rotation;
use crate::middleware::{ApiAuthorizer, ApiResponse, AuthContext};
use crate::state::AppState;
use crate::types::{Access, Resource};

/// GET /api/auth/whoami - Current session, profile and effective permissions
///
/// ```json
/// {
///   "success": true,
///   "data": {
///     "id": "subject uuid",
///     "email": "user@example.com",
///     "role": "Imanager",
///     "status": "active",
///     "expires_at": "2026-01-01T00:00:00Z",
///     "permissions": { "inventory": { "read": true, "write": true }, "...": {} }
///   }
/// }
/// ```
pub async fn whoami(ctx: AuthContext) -> impl IntoResponse {
    let AuthContext {
        session,
        account,
        rotation,
    } = ctx;

    let permissions: Map<String, Value> = Resource::ALL
        .iter()
        .map(|resource| {
            (
                resource.as_str().to_string(),
                json!({
                    "read": account.role.permits(*resource, Access::Read),
                    "write": account.role.permits(*resource, Access::Write),
                }),
            )
        })
        .collect();

    (
        rotation,
        ApiResponse::success(json!({
            "id": session.subject_id,
            "email": session.email,
            "role": account.role,
            "status": account.status,
            "expires_at": session.expires_at,
            "permissions": permissions,
        })),
    )
}

/// POST /api/auth/logout - Sign out and clear the credential cookies
///
/// Only needs a resolvable session; suspended accounts may still sign out.
/// Cookies are cleared even when there is no session, the Authorization
/// header is malformed, or the provider fails.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    let authorizer = ApiAuthorizer::from_state(&state);
    let credentials = authorizer.credentials(&headers).unwrap_or_else(|e| {
        tracing::warn!("Logout ignoring Authorization header: {}", e.message());
        CookieJar::from_headers(&headers)
    });

    let mut rotation = Rotation::default();
    let session = match authorizer.identity().resolve_session(&credentials, &mut rotation).await {
        Ok(session) => session,
        Err(e) => {
            tracing::warn!("Logout could not resolve session: {}", e);
            None
        }
    };

    if let Some(session) = session {
        if let Err(e) = authorizer.identity().invalidate_session(&session, &mut rotation).await {
            tracing::warn!(subject_id = %session.subject_id, "Remote sign-out failed: {}", e);
        } else {
            tracing::info!(subject_id = %session.subject_id, "Signed out");
        }
    }

    rotation.replace(state.cookies.clear());
    (rotation, ApiResponse::with_status((), StatusCode::NO_CONTENT))
}
