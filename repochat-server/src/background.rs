//! Real ingestion for registered repositories, run off the request path.

use async_trait::async_trait;
use repochat_ingest::github::RepoSlug;
use repochat_ingest::ingestion::indexing_mode::IndexingMode;
use repochat_ingest::ingestion::pipeline::{IngestObserver, IngestReport};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::models::{Repo, RepoProgress};
use crate::server::AppState;
use crate::store::RepoStore;

/// Mirrors pipeline progress into the repository record
pub struct StoreObserver {
    store: Arc<RepoStore>,
    repo_id: String,
}

impl StoreObserver {
    pub fn new(store: Arc<RepoStore>, repo_id: String) -> Self {
        Self { store, repo_id }
    }
}

#[async_trait]
impl IngestObserver for StoreObserver {
    async fn on_progress(&self, files_processed: usize, chunks: usize) {
        self.store
            .update_progress(
                &self.repo_id,
                RepoProgress {
                    files_processed,
                    chunks_embedded: chunks,
                },
            )
            .await;
    }
}

/// Start ingesting `repo` according to the server's indexing mode.
///
/// Returns `None` in simulated mode, where polling drives the lifecycle instead.
pub fn spawn_ingestion(state: Arc<AppState>, repo: Repo) -> Option<JoinHandle<()>> {
    if !state.indexing_mode.runs_ingestion() {
        return None;
    }
    Some(tokio::spawn(async move {
        run_ingestion(&state, &repo).await;
    }))
}

async fn run_ingestion(state: &AppState, repo: &Repo) {
    let slug = RepoSlug {
        owner: repo.owner.clone(),
        name: repo.name.clone(),
    };
    let branch = repo.default_branch.clone().unwrap_or_else(|| "main".to_string());
    let observer = StoreObserver::new(state.store.clone(), repo.id.clone());

    info!(
        "Ingesting {} for {} ({} mode)",
        slug, repo.id, state.indexing_mode
    );
    let result = match state.indexing_mode {
        IndexingMode::Clone => {
            let url = state.pipeline.config().github.clone_url(&slug);
            state.pipeline.ingest_clone(&url, &observer).await
        }
        IndexingMode::GitHubApi => {
            state
                .pipeline
                .ingest_github(&slug, &branch, &observer)
                .await
        }
        IndexingMode::Simulated => return,
    };

    match result {
        Ok(report) => finish(state, &repo.id, report).await,
        Err(e) => {
            warn!("Ingestion of {} failed: {}", slug, e);
            state.store.mark_failed(&repo.id, e.to_string()).await;
        }
    }
}

async fn finish(state: &AppState, repo_id: &str, report: IngestReport) {
    let progress = RepoProgress {
        files_processed: report.files_processed(),
        chunks_embedded: report.chunks,
    };
    state
        .store
        .mark_ready(
            repo_id,
            progress,
            report.commit_sha,
            report.default_branch,
            report.files,
        )
        .await;
}
