use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::auth::Authorize;
use crate::gate::AccessGate;

/// Page-level gate: redirects or forwards, propagating rotated credentials
/// and the resolved `Session`/`AccountStatus` as request extensions.
pub async fn access_gate_middleware(State(gate): State<AccessGate>, request: Request, next: Next) -> Response {
    let (mut parts, body) = request.into_parts();
    let outcome = gate.authorize(&parts).await;

    if let Some(location) = gate.location(&outcome.decision) {
        tracing::debug!(path = parts.uri.path(), %location, "Gate redirect");
        let mut response = Redirect::temporary(&location).into_response();
        outcome.rotation.apply_to_response(response.headers_mut());
        return response;
    }

    outcome.rotation.apply_to_request(&mut parts.headers);
    if let Some(session) = outcome.session {
        parts.extensions.insert(session);
    }
    if let Some(account) = outcome.account {
        parts.extensions.insert(account);
    }

    let mut response = next.run(Request::from_parts(parts, body)).await;
    outcome.rotation.apply_to_response(response.headers_mut());
    response
}
