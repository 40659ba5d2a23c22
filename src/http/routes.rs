use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Session lifecycle
        .route("/sessions", post(handlers::create_session))
        .route(
            "/sessions/:channel",
            get(handlers::get_session_status).delete(handlers::close_session),
        )
        // Session input
        .route("/sessions/:channel/audio", post(handlers::submit_audio))
        .route("/sessions/:channel/control", post(handlers::submit_control))
        .route("/sessions/:channel/language", post(handlers::set_language))
        // Session output
        .route("/sessions/:channel/events", get(handlers::get_session_events))
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
