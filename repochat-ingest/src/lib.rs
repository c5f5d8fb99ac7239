//! repochat-ingest: Repository ingestion for the repochat server
//!
//! Takes a GitHub repository reference and produces the code files a chat
//! session can be grounded on. Repositories are read either from a shallow
//! clone or through the GitHub REST API.
//!
//! ## Key Modules
//!
//! - **[`github`]**: Repository URL parsing and a small GitHub REST client
//! - **[`ingestion`]**: Clone, walk, filter and chunk-count pipeline
//! - **[`error`]**: Error type shared by every ingestion step
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use repochat_ingest::github::RepoSlug;
//! use repochat_ingest::ingestion::pipeline::{IngestConfig, IngestionPipeline, NoopObserver};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let slug = RepoSlug::parse("rust-lang/log")?;
//! let pipeline = IngestionPipeline::new(IngestConfig::default())?;
//! let report = pipeline.ingest_clone(&slug.clone_url(), &NoopObserver).await?;
//! println!("{} files, {} chunks", report.files_processed(), report.chunks);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! RepoSlug → clone_repo ──→ read_repo_files ─┐
//!        └─→ GitHubClient (tree + contents) ─┴→ ChunkingStrategy → IngestReport
//! ```

pub mod error;
pub mod github;
pub mod ingestion;

pub use error::{IngestError, Result};
