use axum::{
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::SecurityConfig;
use crate::error::ApiError;
use crate::handlers::{protected, public};
use crate::middleware::access_gate_middleware;
use crate::state::AppState;

/// Full router: every route, including the fallback, runs behind the page gate.
/// API paths are exempt from the gate and authorize per handler.
pub fn app(state: AppState) -> Router {
    let mut router = Router::new()
        .merge(page_routes())
        .merge(api_routes())
        .fallback(not_found)
        .layer(from_fn_with_state(state.gate.clone(), access_gate_middleware))
        .with_state(state.clone());

    if state.config.server.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }
    if state.config.security.enable_cors {
        router = router.layer(cors_layer(&state.config.security));
    }
    router
}

fn page_routes() -> Router<AppState> {
    Router::new()
        // Public auth pages
        .route("/login", get(public::login_page))
        .route("/signup", get(public::signup_page))
        .route("/forgot-password", get(public::forgot_password_page))
        .route("/reset-password", get(public::reset_password_page))
        // Protected pages
        .route("/", get(protected::root_redirect))
        .route("/dashboard", get(protected::dashboard_page))
        .route("/dashboard/*rest", get(protected::dashboard_page))
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/api/health", get(public::health))
        .route("/api/auth/whoami", get(protected::whoami))
        .route("/api/auth/logout", post(protected::logout))
        .route("/api/auth/access/:resource/:access", get(protected::access_check))
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            // Credentialed CORS cannot use a wildcard origin
            Ok(_) if origin == "*" => {
                tracing::warn!("Ignoring wildcard CORS origin");
                None
            }
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
}

async fn not_found() -> ApiError {
    ApiError::not_found("Route not found")
}
