// src/config.rs

//! Configuration file parsing
//!
//! A small TOML file covers everything the server needs: where the archives
//! live, where the index database goes, and what address to bind. The loaded
//! `Config` is passed explicitly into the index builder and the handlers;
//! nothing reads configuration from ambient state.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Directory enumerated for `.nupkg` archives
    pub package_directory: PathBuf,
    /// SQLite index database path
    pub db_path: PathBuf,
    /// Address the HTTP server binds
    pub bind_addr: SocketAddr,
    /// External base URL for generated links; when unset, per-request Host
    /// headers (or the bind address) are used instead
    pub base_url: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            package_directory: PathBuf::from("packages"),
            db_path: PathBuf::from("nupkgd.db"),
            bind_addr: "127.0.0.1:5000".parse().expect("valid default address"),
            base_url: None,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Config> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        toml::from_str(&text)
            .map_err(|e| Error::Config(format!("cannot parse {}: {e}", path.display())))
    }

    /// Load from a file when one is given, defaults otherwise
    pub fn load_or_default(path: Option<&Path>) -> Result<Config> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Config::default()),
        }
    }

    /// Base URL used when no request context is available
    pub fn base_url(&self) -> String {
        self.base_url
            .clone()
            .unwrap_or_else(|| format!("http://{}", self.bind_addr))
    }
}
