// src/server/handlers/packages.rs
//! Feed and download endpoints

use crate::archive::ARCHIVE_EXTENSION;
use crate::db::{self, models::PackageRecord};
use crate::error::{Error, Result};
use crate::query::{self, QueryParameters};
use crate::server::ServerState;
use crate::server::handlers::{base_url, error_response};
use crate::feed;
use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::io::ReaderStream;

const FEED_CONTENT_TYPE: &str = "application/atom+xml; charset=utf-8";

/// GET /Packages() and GET /Search()
///
/// The general search feed: filter, order, count, paginate, serialize.
/// The count reflects the full filtered set, not the returned page.
pub async fn search(
    State(state): State<Arc<ServerState>>,
    Query(raw): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let base_url = base_url(&headers, &state.config);
    match search_feed(&state, &raw, &base_url) {
        Ok(feed) => feed_response(feed),
        Err(err) => error_response(err),
    }
}

fn search_feed(
    state: &ServerState,
    raw: &HashMap<String, String>,
    base_url: &str,
) -> Result<String> {
    let params = QueryParameters::from_query(raw)?;
    let conn = db::open(&state.config.db_path)?;
    let records = PackageRecord::list_all(&conn)?;

    let filtered = query::apply_filters(records, &params);
    let count = filtered.len();
    let mut page = query::paginate(filtered, &params);

    Ok(feed::render_feed(
        &mut page,
        count,
        base_url,
        params.selected_fields.as_deref(),
    ))
}

/// GET /FindPackagesById()?id='X'
///
/// Exact identifier lookup, run through the same filter/order pipeline as
/// search for consistency, without pagination or projection.
pub async fn find_by_id(
    State(state): State<Arc<ServerState>>,
    Query(raw): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let base_url = base_url(&headers, &state.config);
    match lookup_feed(&state, &raw, &base_url) {
        Ok(feed) => feed_response(feed),
        Err(err) => error_response(err),
    }
}

fn lookup_feed(
    state: &ServerState,
    raw: &HashMap<String, String>,
    base_url: &str,
) -> Result<String> {
    let identifier = raw
        .get("id")
        .map(|id| id.trim_matches('\'').to_string())
        .ok_or_else(|| Error::argument("id", "<missing>"))?;

    let params = QueryParameters::from_query(raw)?;
    let conn = db::open(&state.config.db_path)?;
    let records = PackageRecord::find_by_identifier(&conn, &identifier)?;

    let mut filtered = query::apply_filters(records, &params);
    let count = filtered.len();

    Ok(feed::render_feed(&mut filtered, count, base_url, None))
}

/// GET /Package/:id/:version
///
/// Streams `<identifier>.<version>.nupkg` straight from the package
/// directory; the index is not consulted.
pub async fn download(
    State(state): State<Arc<ServerState>>,
    Path((id, version)): Path<(String, String)>,
) -> Response {
    let file_name = format!("{id}.{version}.{ARCHIVE_EXTENSION}");
    let path = state.config.package_directory.join(&file_name);

    let file = match tokio::fs::File::open(&path).await {
        Ok(file) => file,
        Err(_) => return (StatusCode::NOT_FOUND, "Package not found").into_response(),
    };

    let body = Body::from_stream(ReaderStream::new(file));
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/zip")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{file_name}\""),
        )
        .body(body)
        .expect("static headers are valid")
}

fn feed_response(feed: String) -> Response {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, FEED_CONTENT_TYPE)
        .body(Body::from(feed))
        .expect("static headers are valid")
}
