//! HTTP routes for bracket endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{
    advance_session, create_session, generate_report, get_session, list_sessions,
    BracketHandlers,
};

/// Creates the session router with all endpoints.
pub fn bracket_routes(handlers: BracketHandlers) -> Router {
    Router::new()
        .route("/", post(create_session).get(list_sessions))
        .route("/:id", get(get_session))
        .route("/:id/advance", post(advance_session))
        .route("/:id/report", post(generate_report))
        .with_state(handlers)
}
