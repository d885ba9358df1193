// src/server/handlers/index.rs
//! Index rebuild endpoint

use crate::server::ServerState;
use crate::server::handlers::{base_url, error_response};
use crate::{db, index};
use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

/// GET /BuildIndex
///
/// Rescans the package directory and commits the diff in one transaction.
/// The rebuild lock serializes concurrent requests; each waits its turn
/// rather than failing.
pub async fn build_index(State(state): State<Arc<ServerState>>, headers: HeaderMap) -> Response {
    let _writer = state.rebuild_lock.lock().await;
    let base_url = base_url(&headers, &state.config);

    let result = db::open(&state.config.db_path).and_then(|mut conn| {
        index::rebuild(&mut conn, &state.config.package_directory, &base_url)
    });

    match result {
        Ok(summary) => Json(summary).into_response(),
        Err(err) => error_response(err),
    }
}
