//! # repochat-server
//!
//! HTTP backend for chatting with a GitHub repository. Clients register a
//! repository, poll it until indexing finishes, ask questions that come back with
//! file citations, and open cited files as highlighted HTML.
//!
//! ## Indexing modes
//!
//! - **simulated** (default): no work is done. Every status poll advances the
//!   counters and the fourth poll marks the repository `READY`.
//! - **clone**: a background task shallow clones the repository and walks it.
//! - **github-api**: a background task reads the branch through the GitHub REST API.
//!
//! ## Endpoints
//!
//! ```text
//! POST /api/repos                     register a repository
//! GET  /api/repos/{repoId}            poll status
//! GET  /api/repos/{repoId}/file?path= highlighted file
//! POST /api/chat                      answer with citations
//! POST /api/ingest                    one-shot clone + walk
//! GET  /api/health                    liveness and counters
//! ```
//!
//! ## Use as a library
//! ```no_run
//! use repochat_server::{ServerConfig, run_server};
//!
//! # async fn example() -> anyhow::Result<()> {
//! run_server(ServerConfig::default()).await?;
//! # Ok(())
//! # }
//! ```

pub mod assistant;
pub mod background;
pub mod error;
pub mod fixtures;
pub mod handlers;
pub mod highlight;
pub mod models;
pub mod server;
pub mod store;

use anyhow::Result;
use repochat_ingest::ingestion::indexing_mode::IndexingMode;
use repochat_ingest::ingestion::pipeline::IngestConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

pub use server::{AppState, router};

/// Configuration for the repochat server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to
    pub bind: SocketAddr,
    /// How registered repositories get indexed
    pub indexing_mode: IndexingMode,
    /// Settings for clone and GitHub API ingestion
    pub ingest: IngestConfig,
}

impl ServerConfig {
    pub fn new(bind: SocketAddr) -> Self {
        Self {
            bind,
            ..Self::default()
        }
    }

    pub fn with_indexing_mode(mut self, mode: IndexingMode) -> Self {
        self.indexing_mode = mode;
        self
    }

    pub fn with_ingest(mut self, ingest: IngestConfig) -> Self {
        self.ingest = ingest;
        self
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 3000)),
            indexing_mode: IndexingMode::default(),
            ingest: IngestConfig::default(),
        }
    }
}

/// Bind the listener and serve until the process is stopped.
///
/// # Errors
/// - The bind address is unavailable
/// - The ingestion pipeline or highlighter cannot be initialised
pub async fn run_server(config: ServerConfig) -> Result<()> {
    info!("Starting repochat server");
    let state = Arc::new(AppState::new(&config)?);
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
