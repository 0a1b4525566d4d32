//! API route configuration.

use std::sync::Arc;

use axum::{routing::get, Router};

use crate::handlers;
use crate::state::AppState;

/// Creates the API router with all routes configured.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Cached fetch
        .route("/resource", get(handlers::get_resource))
        // Counters
        .route("/api/v1/count", get(handlers::get_count))
        .with_state(state)
}
