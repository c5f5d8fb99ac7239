//! Ingestion pipeline that turns a repository reference into source files.
//!
//! Two sources feed the same report:
//!
//! ```text
//! clone:      git clone --depth 1 → walk checkout → filter → read → cleanup
//! github-api: git tree listing    → filter        → contents API (bounded concurrency)
//!                                          ↓
//!                           chunk counting → IngestReport
//! ```
//!
//! Progress is pushed to an [`IngestObserver`] while files are collected, so a
//! caller can surface `filesProcessed` / `chunksEmbedded` counters before the
//! run finishes. Checkouts are always removed, including when a step fails.

use async_trait::async_trait;
use futures::{StreamExt, stream};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use super::chunking::{ChunkingConfig, ChunkingStrategy};
use super::clone::{cleanup_repo, clone_repo, current_branch, default_clone_root, head_commit};
use super::code_filter::should_ingest_path;
use super::walker::{SourceFile, WalkOptions, read_repo_files};
use crate::error::Result;
use crate::github::{GitHubClient, GitHubConfig, RepoSlug};

/// Report progress to the observer after this many files
const PROGRESS_BATCH: usize = 25;

/// Configuration for the ingestion pipeline
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Parent directory for temporary clones
    pub clone_root: PathBuf,
    /// File selection settings for checkout walks
    pub walk_options: WalkOptions,
    /// Line-window settings used for chunk counts
    pub chunking_config: ChunkingConfig,
    /// GitHub REST API settings
    pub github: GitHubConfig,
    /// Maximum in-flight contents requests
    pub fetch_concurrency: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            clone_root: default_clone_root(),
            walk_options: WalkOptions::default(),
            chunking_config: ChunkingConfig::default(),
            github: GitHubConfig::default(),
            fetch_concurrency: 8,
        }
    }
}

impl IngestConfig {
    pub fn with_clone_root(mut self, root: PathBuf) -> Self {
        self.clone_root = root;
        self
    }

    pub fn with_walk_options(mut self, options: WalkOptions) -> Self {
        self.walk_options = options;
        self
    }

    pub fn with_chunking_config(mut self, config: ChunkingConfig) -> Self {
        self.chunking_config = config;
        self
    }

    pub fn with_github(mut self, github: GitHubConfig) -> Self {
        self.github = github;
        self
    }

    pub fn with_fetch_concurrency(mut self, concurrency: usize) -> Self {
        self.fetch_concurrency = concurrency.max(1);
        self
    }
}

/// Result of one ingestion run
#[derive(Debug, Clone)]
pub struct IngestReport {
    /// Collected files, sorted by path
    pub files: Vec<SourceFile>,
    /// Line-window chunks across all files
    pub chunks: usize,
    /// Commit the files were read from, when it could be determined
    pub commit_sha: Option<String>,
    /// Branch the files were read from, when it could be determined
    pub default_branch: Option<String>,
    pub processing_time: Duration,
}

impl IngestReport {
    pub fn files_processed(&self) -> usize {
        self.files.len()
    }

    /// First `n` files, in path order
    pub fn preview(&self, n: usize) -> &[SourceFile] {
        &self.files[..n.min(self.files.len())]
    }
}

/// Receives running totals while an ingestion is in progress
#[async_trait]
pub trait IngestObserver: Send + Sync {
    async fn on_progress(&self, files_processed: usize, chunks: usize);
}

/// Observer that ignores progress
pub struct NoopObserver;

#[async_trait]
impl IngestObserver for NoopObserver {
    async fn on_progress(&self, _files_processed: usize, _chunks: usize) {}
}

/// Observer that records every progress callback, for tests.
#[derive(Default)]
pub struct RecordingObserver {
    pub calls: Arc<Mutex<Vec<(usize, usize)>>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<(usize, usize)> {
        self.calls.lock().ok().and_then(|c| c.last().copied())
    }
}

#[async_trait]
impl IngestObserver for RecordingObserver {
    async fn on_progress(&self, files_processed: usize, chunks: usize) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((files_processed, chunks));
        }
    }
}

/// Running totals across every ingestion this pipeline has performed
#[derive(Debug, Default, Clone)]
pub struct ProcessingStats {
    pub runs: usize,
    pub files_processed: usize,
    pub chunks_created: usize,
    pub errors: usize,
}

/// Clones or fetches repositories and collects their source files
#[derive(Debug)]
pub struct IngestionPipeline {
    config: IngestConfig,
    chunking_strategy: ChunkingStrategy,
    github: GitHubClient,
    stats: RwLock<ProcessingStats>,
}

impl IngestionPipeline {
    pub fn new(config: IngestConfig) -> Result<Self> {
        let github = GitHubClient::new(config.github.clone())?;
        let chunking_strategy = ChunkingStrategy::new(config.chunking_config.clone());
        Ok(Self {
            config,
            chunking_strategy,
            github,
            stats: RwLock::new(ProcessingStats::default()),
        })
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    pub async fn get_stats(&self) -> ProcessingStats {
        self.stats.read().await.clone()
    }

    /// Shallow clone `repo_url`, collect its code files and remove the checkout.
    pub async fn ingest_clone(
        &self,
        repo_url: &str,
        observer: &dyn IngestObserver,
    ) -> Result<IngestReport> {
        let start_time = Instant::now();
        let repo_dir = match clone_repo(repo_url, &self.config.clone_root).await {
            Ok(dir) => dir,
            Err(e) => {
                self.record_failure().await;
                return Err(e);
            }
        };

        let result = self.collect_checkout(&repo_dir, observer, start_time).await;
        cleanup_repo(&repo_dir).await;

        if result.is_err() {
            self.record_failure().await;
        }
        result
    }

    /// Collect code files from an existing checkout without cloning or removing it.
    pub async fn ingest_local(
        &self,
        repo_dir: &Path,
        observer: &dyn IngestObserver,
    ) -> Result<IngestReport> {
        self.collect_checkout(repo_dir, observer, Instant::now())
            .await
    }

    async fn collect_checkout(
        &self,
        repo_dir: &Path,
        observer: &dyn IngestObserver,
        start_time: Instant,
    ) -> Result<IngestReport> {
        let commit_sha = match head_commit(repo_dir).await {
            Ok(sha) => Some(sha),
            Err(e) => {
                debug!("No commit for {}: {}", repo_dir.display(), e);
                None
            }
        };
        let default_branch = current_branch(repo_dir).await.ok();

        let files = read_repo_files(repo_dir, &self.config.walk_options).await?;
        let chunks = self.count_with_progress(&files, observer).await;

        let report = IngestReport {
            files,
            chunks,
            commit_sha,
            default_branch,
            processing_time: start_time.elapsed(),
        };
        self.record_success(&report).await;
        Ok(report)
    }

    /// Read `branch` of `slug` through the GitHub REST API.
    ///
    /// Files whose contents cannot be fetched are skipped and counted as errors;
    /// only a failed tree listing fails the run.
    pub async fn ingest_github(
        &self,
        slug: &RepoSlug,
        branch: &str,
        observer: &dyn IngestObserver,
    ) -> Result<IngestReport> {
        let start_time = Instant::now();
        info!("Fetching {} ({}) from the GitHub API", slug, branch);

        let tree = match self.github.fetch_repo_tree(slug, branch).await {
            Ok(tree) => tree,
            Err(e) => {
                self.record_failure().await;
                return Err(e);
            }
        };
        if tree.truncated {
            warn!("Tree listing for {} was truncated by GitHub", slug);
        }

        let commit_sha = match self.github.fetch_branch_commit(slug, branch).await {
            Ok(sha) => Some(sha),
            Err(e) => {
                warn!("Could not resolve {} of {}: {}", branch, slug, e);
                None
            }
        };

        let max_size = self.config.walk_options.max_file_size;
        let paths: Vec<String> = tree
            .blobs
            .into_iter()
            .filter(|b| should_ingest_path(Path::new(&b.path)))
            .filter(|b| b.size.is_none_or(|size| size <= max_size))
            .map(|b| b.path)
            .collect();
        debug!("{} of the tree entries are code files", paths.len());

        let mut fetches = stream::iter(paths)
            .map(|path| async move {
                let content = self.github.fetch_file_content(slug, &path).await;
                (path, content)
            })
            .buffer_unordered(self.config.fetch_concurrency.max(1));

        let mut files = Vec::new();
        let mut chunks = 0;
        let mut errors = 0;
        while let Some((path, content)) = fetches.next().await {
            match content {
                Ok(Some(content)) => {
                    chunks += self.chunking_strategy.count_chunks(&content);
                    files.push(SourceFile { path, content });
                    if files.len() % PROGRESS_BATCH == 0 {
                        observer.on_progress(files.len(), chunks).await;
                    }
                }
                Ok(None) => debug!("No inline content for {}", path),
                Err(e) => {
                    error!("Failed to fetch {}: {}", path, e);
                    errors += 1;
                }
            }
        }
        observer.on_progress(files.len(), chunks).await;

        files.sort_by(|a, b| a.path.cmp(&b.path));
        let report = IngestReport {
            files,
            chunks,
            commit_sha,
            default_branch: Some(branch.to_string()),
            processing_time: start_time.elapsed(),
        };

        self.record_success(&report).await;
        self.stats.write().await.errors += errors;
        Ok(report)
    }

    async fn count_with_progress(&self, files: &[SourceFile], observer: &dyn IngestObserver) -> usize {
        let mut chunks = 0;
        for (i, file) in files.iter().enumerate() {
            chunks += self.chunking_strategy.count_chunks(&file.content);
            if (i + 1) % PROGRESS_BATCH == 0 {
                observer.on_progress(i + 1, chunks).await;
            }
        }
        observer.on_progress(files.len(), chunks).await;
        chunks
    }

    async fn record_success(&self, report: &IngestReport) {
        info!(
            "Ingested {} files ({} chunks) in {:?}",
            report.files.len(),
            report.chunks,
            report.processing_time
        );
        let mut stats = self.stats.write().await;
        stats.runs += 1;
        stats.files_processed += report.files.len();
        stats.chunks_created += report.chunks;
    }

    async fn record_failure(&self) {
        let mut stats = self.stats.write().await;
        stats.runs += 1;
        stats.errors += 1;
    }
}
