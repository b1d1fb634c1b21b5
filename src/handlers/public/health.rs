use axum::extract::State;
use serde_json::{json, Value};

use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// GET /api/health - Liveness probe
///
/// Does not touch the identity provider or the profile store.
///
/// ```json
/// { "success": true, "data": { "status": "ok", "environment": "Production", "version": "0.1.0" } }
/// ```
pub async fn health(State(state): State<AppState>) -> ApiResult<Value> {
    Ok(ApiResponse::success(json!({
        "status": "ok",
        "environment": state.config.environment,
        "version": env!("CARGO_PKG_VERSION"),
    })))
}
