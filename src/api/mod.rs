//! HTTP API for the document pipeline.

pub mod handlers;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use handlers::AppState;

/// Multipart framing allowance on top of the document size limit.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Build the HTTP routes.
pub fn router(state: Arc<AppState>) -> Router {
    let body_limit = state.pipeline.config().max_document_bytes + MULTIPART_OVERHEAD;

    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Documents
        .route("/documents", post(handlers::upload_document))
        .route("/documents/progress", get(handlers::get_progress))
        // Utilities
        .route("/tokenize", post(handlers::tokenize_text))
        // State
        .with_state(state)
        // Middleware
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}
