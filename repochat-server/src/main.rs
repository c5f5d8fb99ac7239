use anyhow::Result;
use clap::Parser;
use repochat_ingest::github::{DEFAULT_API_BASE, DEFAULT_CLONE_BASE, GitHubConfig};
use repochat_ingest::ingestion::indexing_mode::IndexingMode;
use repochat_ingest::ingestion::pipeline::IngestConfig;
use repochat_ingest::ingestion::walker::WalkOptions;
use repochat_server::{ServerConfig, run_server};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// HTTP backend for chatting with GitHub repositories
#[derive(Parser, Debug)]
#[command(name = "repochat-server", author, version, about, long_about = None)]
struct Args {
    /// Address to listen on
    #[arg(long, env = "REPOCHAT_BIND", default_value = "127.0.0.1:3000")]
    bind: SocketAddr,

    /// simulated, clone or github-api
    #[arg(long, env = "REPOCHAT_INDEXING_MODE", default_value = "simulated")]
    indexing_mode: IndexingMode,

    /// Directory that temporary clones are created under
    #[arg(long, env = "REPOCHAT_CLONE_ROOT")]
    clone_root: Option<PathBuf>,

    /// Skip files larger than this many bytes
    #[arg(long, default_value_t = 1 << 20)]
    max_file_size: u64,

    /// Honour each repository's root .gitignore
    #[arg(long)]
    gitignore: bool,

    /// Token for the GitHub REST API
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    github_token: Option<String>,

    /// Base URL of the GitHub REST API
    #[arg(long, env = "GITHUB_API_BASE", default_value = DEFAULT_API_BASE)]
    github_api_base: String,

    /// Root that owner/name is appended to when cloning
    #[arg(long, env = "GITHUB_CLONE_BASE", default_value = DEFAULT_CLONE_BASE)]
    github_clone_base: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut ingest = IngestConfig::default()
        .with_walk_options(
            WalkOptions::default()
                .with_max_file_size(args.max_file_size)
                .with_gitignore(args.gitignore),
        )
        .with_github(
            GitHubConfig::default()
                .with_api_base(args.github_api_base)
                .with_clone_base(args.github_clone_base)
                .with_token(args.github_token),
        );
    if let Some(root) = args.clone_root {
        ingest = ingest.with_clone_root(root);
    }

    let config = ServerConfig::new(args.bind)
        .with_indexing_mode(args.indexing_mode)
        .with_ingest(ingest);

    run_server(config).await
}
