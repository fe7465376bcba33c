//! HTTP adapters - REST API over the bracket handlers.
//!
//! ```text
//! GET  /health
//! POST /api/sessions                 create a session
//! GET  /api/sessions                 list the caller's session ids
//! GET  /api/sessions/:id             full session tree
//! POST /api/sessions/:id/advance     submit an outcome, get the next action
//! POST /api/sessions/:id/report      regenerate the final report
//! ```

pub mod bracket;
pub mod middleware;

pub use bracket::{bracket_routes, BracketHandlers};

use axum::http::{header, HeaderName, HeaderValue, Method};
use axum::{routing::get, Json, Router};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use middleware::{user_id_middleware, USER_ID_HEADER};

/// Builds the full application router with tracing, CORS, timeout and
/// identity layers.
pub fn app_router(handlers: BracketHandlers, server: &ServerConfig) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/sessions", bracket_routes(handlers))
        .layer(axum::middleware::from_fn(user_id_middleware))
        .layer(TimeoutLayer::new(server.request_timeout()))
        .layer(cors_layer(&server.cors_origins_list()))
        .layer(TraceLayer::new_for_http())
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Allows the configured origins only; no origins means no CORS headers.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if allowed.is_empty() {
        return CorsLayer::new();
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static(USER_ID_HEADER)])
}
