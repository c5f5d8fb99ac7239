//! Shallow clones into throwaway directories.
//!
//! Each clone gets its own `<root>/<uuid>` directory so concurrent ingestions
//! never share a checkout. Callers own the directory and must hand it to
//! [`cleanup_repo`] when done.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::error::{IngestError, Result};

/// Default parent directory for clones: `$TMPDIR/rag-repos`
pub fn default_clone_root() -> PathBuf {
    std::env::temp_dir().join("rag-repos")
}

/// Clone `repo_url` with `--depth 1` into a fresh directory under `root`.
pub async fn clone_repo(repo_url: &str, root: &Path) -> Result<PathBuf> {
    let target = root.join(uuid::Uuid::new_v4().to_string());
    tokio::fs::create_dir_all(&target)
        .await
        .map_err(|source| IngestError::Workspace {
            path: target.clone(),
            source,
        })?;

    info!("Cloning {} into {}", repo_url, target.display());

    let output = Command::new("git")
        .arg("clone")
        .args(["--depth", "1"])
        .arg("--quiet")
        .arg("--")
        .arg(repo_url)
        .arg(&target)
        .env("GIT_TERMINAL_PROMPT", "0")
        .stdin(Stdio::null())
        .output()
        .await;

    let output = match output {
        Ok(output) => output,
        Err(e) => {
            cleanup_repo(&target).await;
            return Err(e.into());
        }
    };

    if !output.status.success() {
        cleanup_repo(&target).await;
        return Err(IngestError::git("clone", &output.stderr));
    }

    Ok(target)
}

async fn rev_parse(repo_dir: &Path, args: &[&str]) -> Result<String> {
    let output = Command::new("git")
        .arg("rev-parse")
        .args(args)
        .current_dir(repo_dir)
        .output()
        .await?;

    if !output.status.success() {
        return Err(IngestError::git("rev-parse", &output.stderr));
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Commit sha checked out in `repo_dir`
pub async fn head_commit(repo_dir: &Path) -> Result<String> {
    rev_parse(repo_dir, &["HEAD"]).await
}

/// Branch checked out in `repo_dir`
pub async fn current_branch(repo_dir: &Path) -> Result<String> {
    rev_parse(repo_dir, &["--abbrev-ref", "HEAD"]).await
}

/// Remove a clone. A directory that is already gone is fine; any other
/// failure is logged and swallowed.
pub async fn cleanup_repo(dir: &Path) {
    match tokio::fs::remove_dir_all(dir).await {
        Ok(()) => debug!("Removed {}", dir.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to clean up {}: {}", dir.display(), e),
    }
}
