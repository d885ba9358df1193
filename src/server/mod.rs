// src/server/mod.rs
//! HTTP surface for the package feed
//!
//! Thin axum layer over the core: a rebuild endpoint returning JSON, two
//! feed endpoints returning Atom XML, and a raw archive download. Handlers
//! open their own database connection per request; the only shared mutable
//! state is the rebuild lock, which keeps concurrent rebuilds from racing
//! on the same delete-set computation.

mod handlers;
mod routes;

pub use routes::create_router;

use crate::config::Config;
use crate::error::Result;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

/// Shared server state
pub struct ServerState {
    pub config: Config,
    /// Writer lock: one rebuild at a time
    rebuild_lock: Mutex<()>,
}

impl ServerState {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            rebuild_lock: Mutex::new(()),
        }
    }
}

/// Bind and serve until shutdown
pub async fn run(config: Config) -> Result<()> {
    let bind_addr = config.bind_addr;
    let state = Arc::new(ServerState::new(config));
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!("nupkgd listening on http://{bind_addr}");
    axum::serve(listener, app).await?;
    Ok(())
}
