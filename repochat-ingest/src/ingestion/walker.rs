use ignore::gitignore::Gitignore;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::code_filter::{is_code_file, is_excluded_dir};
use crate::error::Result;

/// A source file read from a checkout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    /// Path relative to the checkout root, `/`-separated
    pub path: String,
    pub content: String,
}

/// Knobs for [`read_repo_files`]
#[derive(Debug, Clone)]
pub struct WalkOptions {
    /// Files larger than this many bytes are skipped
    pub max_file_size: u64,
    /// Honour the `.gitignore` at the checkout root
    pub respect_gitignore: bool,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            max_file_size: 1 << 20,
            respect_gitignore: false,
        }
    }
}

impl WalkOptions {
    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes;
        self
    }

    pub fn with_gitignore(mut self, respect: bool) -> Self {
        self.respect_gitignore = respect;
        self
    }
}

fn relative_slash_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Read one candidate file. Oversize and unreadable files yield `None`.
async fn read_source_file(root: &Path, path: &Path, max_file_size: u64) -> Option<SourceFile> {
    let size = match tokio::fs::metadata(path).await {
        Ok(metadata) => metadata.len(),
        Err(e) => {
            warn!("Failed to stat {}: {}", path.display(), e);
            return None;
        }
    };
    if size > max_file_size {
        debug!("Skipping {} ({} bytes)", path.display(), size);
        return None;
    }

    match tokio::fs::read(path).await {
        Ok(bytes) => Some(SourceFile {
            path: relative_slash_path(root, path),
            content: String::from_utf8_lossy(&bytes).into_owned(),
        }),
        Err(e) => {
            warn!("Failed to read {}: {}", path.display(), e);
            None
        }
    }
}

/// Collect every code file under `root`.
///
/// Walks depth-first with an explicit stack, skipping `node_modules` and `.git`.
/// Directories and files that cannot be read are logged and skipped rather than
/// failing the whole walk. Non-UTF-8 bytes are replaced. The result is sorted by path.
pub async fn read_repo_files(root: &Path, options: &WalkOptions) -> Result<Vec<SourceFile>> {
    let gitignore = if options.respect_gitignore {
        let (matcher, err) = Gitignore::new(root.join(".gitignore"));
        if let Some(e) = err {
            debug!("No usable .gitignore in {}: {}", root.display(), e);
        }
        Some(matcher)
    } else {
        None
    };
    let is_ignored = |path: &Path, is_dir: bool| {
        gitignore
            .as_ref()
            .is_some_and(|g| g.matched_path_or_any_parents(path, is_dir).is_ignore())
    };

    let mut results = Vec::new();
    let mut dir_stack: Vec<PathBuf> = vec![root.to_path_buf()];

    while let Some(current_dir) = dir_stack.pop() {
        let mut read_dir = match tokio::fs::read_dir(&current_dir).await {
            Ok(rd) => rd,
            Err(e) => {
                warn!("Failed to read directory {}: {}", current_dir.display(), e);
                continue;
            }
        };

        while let Some(entry) = read_dir.next_entry().await? {
            let path = entry.path();
            let file_type = match entry.file_type().await {
                Ok(t) => t,
                Err(e) => {
                    warn!("Failed to get file type for {}: {}", path.display(), e);
                    continue;
                }
            };
            let name = entry.file_name();
            let name = name.to_string_lossy();

            if file_type.is_dir() {
                if is_excluded_dir(&name) || is_ignored(&path, true) {
                    continue;
                }
                dir_stack.push(path);
                continue;
            }

            if !file_type.is_file() || !is_code_file(&name) || is_ignored(&path, false) {
                continue;
            }

            if let Some(file) = read_source_file(root, &path, options.max_file_size).await {
                results.push(file);
            }
        }
    }

    results.sort_by(|a, b| a.path.cmp(&b.path));
    debug!("Collected {} code files from {}", results.len(), root.display());
    Ok(results)
}
