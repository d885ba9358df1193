// src/error.rs

//! Crate-wide error type
//!
//! One enum covers the indexing pipeline and the query surface. Handlers map
//! `Argument` to a client error; everything else is a server-side fault.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("bad archive {path}: {source}")]
    Zip {
        path: PathBuf,
        source: zip::result::ZipError,
    },

    #[error("format error: {0}")]
    Format(String),

    #[error("invalid value for {name}: {value}")]
    Argument { name: String, value: String },

    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    pub fn format(message: impl Into<String>) -> Self {
        Error::Format(message.into())
    }

    pub fn argument(name: impl Into<String>, value: impl Into<String>) -> Self {
        Error::Argument {
            name: name.into(),
            value: value.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
