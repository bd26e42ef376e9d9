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
        // Recording control
        .route("/recorder/start", post(handlers::start))
        .route("/recorder/pause", post(handlers::pause))
        .route("/recorder/resume", post(handlers::resume))
        .route("/recorder/stop", post(handlers::stop))
        // Queries
        .route("/recorder/status", get(handlers::status))
        .route("/recorder/artifact", get(handlers::artifact))
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
