// src/server/handlers/mod.rs
//! Request handlers

pub mod index;
pub mod packages;

use crate::config::Config;
use crate::error::Error;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use tracing::error;

/// Base URL for links in generated documents.
///
/// An explicitly configured external URL wins (the server may sit behind a
/// TLS-terminating proxy); otherwise the request's Host header (http scheme),
/// then the bind address.
pub(crate) fn base_url(headers: &HeaderMap, config: &Config) -> String {
    if let Some(configured) = &config.base_url {
        return configured.clone();
    }
    match headers.get(header::HOST).and_then(|host| host.to_str().ok()) {
        Some(host) => format!("http://{host}"),
        None => config.base_url(),
    }
}

/// Map a core error onto an HTTP response.
///
/// Malformed client input is a 400; everything else (archive IO, manifest
/// format, database) surfaces as a 500.
pub(crate) fn error_response(err: Error) -> Response {
    match err {
        Error::Argument { .. } => (StatusCode::BAD_REQUEST, err.to_string()).into_response(),
        err => {
            error!("request failed: {err}");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response()
        }
    }
}
