//! Application builder: wires router + middleware + state into an Axum app.

use axum::Router;
use axum::extract::DefaultBodyLimit;
use tower_http::trace::TraceLayer;

use crate::middleware::compression::build_compression_layer;
use crate::middleware::cors::build_cors_layer;
use crate::router::build_router;
use crate::state::AppState;

/// Largest accepted request body. Every endpoint takes small JSON documents.
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Builds the complete Axum application with all routes and middleware.
pub fn build_app(state: AppState) -> Router {
    let cors = build_cors_layer(&state.config.server.cors);
    build_router(state)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(build_compression_layer())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
