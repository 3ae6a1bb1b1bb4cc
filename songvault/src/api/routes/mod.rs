//! API route modules.
//!
//! Organizes routes by resource type.

pub mod health;
pub mod ingest;
pub mod logging;
pub mod manifest;
pub mod songs;

use axum::Router;
use axum::routing::get;

use crate::api::server::AppState;

/// Create the main API router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/manifest.json", get(manifest::manifest))
        .nest("/api", ingest::router())
        .nest("/api/songs", songs::router())
        .nest("/api/logging", logging::router())
        .nest("/health", health::router())
        .with_state(state)
}
