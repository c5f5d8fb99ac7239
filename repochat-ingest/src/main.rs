use clap::{Parser, Subcommand};
use repochat_ingest::{
    github::{GitHubConfig, RepoSlug},
    ingestion::{
        pipeline::{IngestConfig, IngestReport, IngestionPipeline, NoopObserver},
        walker::{WalkOptions, read_repo_files},
    },
};
use serde::Serialize;
use std::path::PathBuf;
use std::process;

/// A CLI tool to run repochat ingestion outside the server.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Skip files larger than this many bytes
    #[arg(long, default_value_t = 1 << 20)]
    max_file_size: u64,

    /// Honour the repository's root .gitignore
    #[arg(long)]
    gitignore: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ingest a GitHub repository and print what was collected
    Ingest {
        /// Repository URL or owner/name; any URL with a scheme is cloned as given
        repo: String,
        /// Read through the GitHub REST API instead of cloning
        #[arg(long)]
        api: bool,
        /// Branch to read in API mode
        #[arg(long, default_value = "main")]
        branch: String,
        /// GitHub token for API mode
        #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
        token: Option<String>,
        /// Directory that temporary clones are created under
        #[arg(long)]
        clone_root: Option<PathBuf>,
        /// Output format
        #[arg(short, long, default_value = "summary")]
        format: OutputFormat,
    },
    /// List the code files a local checkout would contribute
    Files {
        /// Checkout directory
        dir: PathBuf,
        /// Output format
        #[arg(short, long, default_value = "summary")]
        format: OutputFormat,
    },
    /// Parse a repository reference and print its owner and name
    Parse {
        /// Repository URL or owner/name
        repo: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
enum OutputFormat {
    Summary,
    Full,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "summary" => Ok(OutputFormat::Summary),
            "full" => Ok(OutputFormat::Full),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Invalid format: {s}")),
        }
    }
}

#[derive(Serialize)]
struct FileOutput<'a> {
    path: &'a str,
    lines: usize,
    bytes: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct IngestOutput<'a> {
    repo: String,
    commit_sha: Option<&'a str>,
    branch: Option<&'a str>,
    files_processed: usize,
    chunks: usize,
    processing_time_ms: u128,
    files: Vec<FileOutput<'a>>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let args = Args::parse();
    let walk_options = WalkOptions::default()
        .with_max_file_size(args.max_file_size)
        .with_gitignore(args.gitignore);

    match args.command {
        Commands::Ingest {
            repo,
            api,
            branch,
            token,
            clone_root,
            format,
        } => {
            let github = GitHubConfig::default().with_token(token);
            let mut config = IngestConfig::default()
                .with_walk_options(walk_options)
                .with_github(github.clone());
            if let Some(root) = clone_root {
                config = config.with_clone_root(root);
            }
            let pipeline = IngestionPipeline::new(config)?;

            if api {
                let slug = RepoSlug::parse(&repo)?;
                let report = pipeline.ingest_github(&slug, &branch, &NoopObserver).await?;
                print_report(&slug.to_string(), &report, &format)
            } else {
                let clone_url = github.resolve_clone_url(&repo)?;
                let report = pipeline.ingest_clone(&clone_url, &NoopObserver).await?;
                print_report(&clone_url, &report, &format)
            }
        }
        Commands::Files { dir, format } => {
            let files = read_repo_files(&dir, &walk_options).await?;
            let outputs: Vec<FileOutput> = files
                .iter()
                .map(|f| FileOutput {
                    path: &f.path,
                    lines: f.content.lines().count(),
                    bytes: f.content.len(),
                })
                .collect();

            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&outputs)?),
                OutputFormat::Summary => {
                    println!("Found {} code files in {}:", outputs.len(), dir.display());
                    for output in outputs {
                        println!("  {} ({} lines)", output.path, output.lines);
                    }
                }
                OutputFormat::Full => {
                    for file in &files {
                        println!("==> {} <==", file.path);
                        println!("{}", file.content);
                    }
                }
            }
            Ok(())
        }
        Commands::Parse { repo } => {
            let slug = RepoSlug::parse(&repo)?;
            println!("Owner: {}", slug.owner);
            println!("Name: {}", slug.name);
            println!("Clone URL: {}", slug.clone_url());
            Ok(())
        }
    }
}

fn print_report(label: &str, report: &IngestReport, format: &OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            let output = IngestOutput {
                repo: label.to_string(),
                commit_sha: report.commit_sha.as_deref(),
                branch: report.default_branch.as_deref(),
                files_processed: report.files_processed(),
                chunks: report.chunks,
                processing_time_ms: report.processing_time.as_millis(),
                files: report
                    .files
                    .iter()
                    .map(|f| FileOutput {
                        path: &f.path,
                        lines: f.content.lines().count(),
                        bytes: f.content.len(),
                    })
                    .collect(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Summary => {
            println!("Repository: {label}");
            println!(
                "Commit: {} ({})",
                report.commit_sha.as_deref().unwrap_or("unknown"),
                report.default_branch.as_deref().unwrap_or("unknown branch")
            );
            println!("Files processed: {}", report.files_processed());
            println!("Chunks: {}", report.chunks);
            println!("Took: {:?}", report.processing_time);
            for file in report.preview(3) {
                println!("  {}", file.path);
            }
            if report.files.len() > 3 {
                println!("  ... and {} more", report.files.len() - 3);
            }
        }
        OutputFormat::Full => {
            for file in &report.files {
                println!("==> {} <==", file.path);
                println!("{}", file.content);
            }
        }
    }
    Ok(())
}
