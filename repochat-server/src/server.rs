use axum::Router;
use axum::routing::{get, post};
use repochat_ingest::ingestion::indexing_mode::IndexingMode;
use repochat_ingest::ingestion::pipeline::IngestionPipeline;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::ServerConfig;
use crate::assistant::{CannedResponder, ChatResponder};
use crate::handlers::{chat, files, health, ingest, repos};
use crate::highlight::Highlighter;
use crate::store::RepoStore;

/// State shared by every request handler
pub struct AppState {
    pub store: Arc<RepoStore>,
    pub pipeline: Arc<IngestionPipeline>,
    pub highlighter: Arc<Highlighter>,
    pub responder: Arc<dyn ChatResponder>,
    pub indexing_mode: IndexingMode,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(config: &ServerConfig) -> anyhow::Result<Self> {
        info!(
            "Initializing repochat state (indexing mode: {})",
            config.indexing_mode
        );
        Ok(Self {
            store: Arc::new(RepoStore::new()),
            pipeline: Arc::new(IngestionPipeline::new(config.ingest.clone())?),
            highlighter: Arc::new(Highlighter::new()?),
            responder: Arc::new(CannedResponder),
            indexing_mode: config.indexing_mode,
            start_time: Instant::now(),
        })
    }

    /// Replace the chat responder
    pub fn with_responder(mut self, responder: Arc<dyn ChatResponder>) -> Self {
        self.responder = responder;
        self
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

/// Build the axum router with all routes
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/repos", post(repos::create_repo))
        .route("/api/repos/{repo_id}", get(repos::get_repo))
        .route("/api/repos/{repo_id}/file", get(files::get_file))
        .route("/api/chat", post(chat::chat))
        .route("/api/ingest", post(ingest::ingest))
        .route("/api/health", get(health::health))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
