// src/server/routes.rs
//! Axum router configuration
//!
//! Route names mirror the v2 protocol verbatim, parentheses included:
//! clients address `/Packages()` and `/Search()` as literal paths.

use crate::server::ServerState;
use crate::server::handlers::{index, packages};
use axum::{Router, routing::get};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// Create the main application router
pub fn create_router(state: Arc<ServerState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/BuildIndex", get(index::build_index))
        .route("/Packages()", get(packages::search))
        .route("/Search()", get(packages::search))
        .route("/FindPackagesById()", get(packages::find_by_id))
        .route("/Package/:id/:version", get(packages::download))
        .layer(cors)
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
