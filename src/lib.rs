// src/lib.rs

//! nupkgd - NuGet-v2-compatible package feed server
//!
//! Scans a directory of `.nupkg` archives into a SQLite index and answers
//! OData-shaped search and listing queries over it as Atom XML feeds.
//!
//! # Architecture
//!
//! - `archive`: opens one package archive; hash, size, manifest, lib folders
//! - `manifest`: nuspec parsing, dependency flattening, moniker mapping
//! - `index`: directory scan, diff by (identifier, version), atomic commit
//! - `query`: filter/order/paginate pipeline over the index
//! - `feed`: Atom/OData serialization with a closed, typed field table
//! - `db`: SQLite store with versioned schema
//! - `server`: axum HTTP surface

pub mod archive;
pub mod config;
pub mod db;
mod error;
pub mod feed;
pub mod hash;
pub mod index;
pub mod manifest;
pub mod query;
pub mod server;

pub use config::Config;
pub use error::{Error, Result};
pub use index::IndexSummary;
pub use query::QueryParameters;
