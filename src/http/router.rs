//! Router configuration for the HTTP API.
//!
//! This module sets up all routes, middleware (CORS, compression, tracing),
//! and creates the axum router ready for serving.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;

/// Create the main application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration - permissive for development, should be restricted in production
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build the API router with versioned endpoints
    let api_v1 = Router::new()
        // Conflict detection
        .route("/conflicts", get(handlers::scan_conflicts))
        .route("/conflicts/resolve", post(handlers::resolve_conflict))
        // Distribution reconciliation
        .route("/distribution/{subject}", get(handlers::get_distribution))
        // Session CRUD
        .route("/sessions", post(handlers::create_session))
        .route("/sessions", get(handlers::list_sessions))
        .route(
            "/sessions/{id}",
            get(handlers::get_session)
                .patch(handlers::update_session)
                .delete(handlers::delete_session),
        )
        .route("/sessions/{id}/audit", get(handlers::get_audit_trail))
        // Lifecycle
        .route("/sessions/publish", post(handlers::publish_sessions))
        .route("/sessions/{id}/unpublish", post(handlers::unpublish_session))
        .route("/sessions/{id}/archive", post(handlers::archive_session))
        // Faculty availability
        .route(
            "/faculty/{email}/availability",
            get(handlers::check_availability),
        );

    // Combine all routes
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/v1", api_v1)
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
