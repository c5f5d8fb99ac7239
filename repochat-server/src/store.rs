//! In-memory repository registry.
//!
//! Records live for the lifetime of the process. Each entry also keeps the
//! source files captured by a real ingestion so the file viewer can serve them.

use chrono::Utc;
use repochat_ingest::github::RepoSlug;
use repochat_ingest::ingestion::walker::SourceFile;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::models::{Repo, RepoProgress, RepoStatus};

/// Polls before a simulated repository turns `READY`
pub const SIMULATED_READY_AFTER_POLLS: u32 = 4;
/// Final counters reported by a simulated ingestion
pub const SIMULATED_FINAL_PROGRESS: RepoProgress = RepoProgress {
    files_processed: 512,
    chunks_embedded: 8421,
};
pub const SIMULATED_COMMIT_SHA: &str = "mock_sha_abcdef123456";

const SIMULATED_FILES_STEP: usize = 80;
const SIMULATED_FILES_CAP: usize = 500;
const SIMULATED_CHUNKS_STEP: usize = 1200;
const SIMULATED_CHUNKS_CAP: usize = 9000;

#[derive(Debug)]
struct RepoEntry {
    repo: Repo,
    poll_count: u32,
    files: HashMap<String, String>,
}

#[derive(Debug, Default)]
pub struct RepoStore {
    repos: RwLock<HashMap<String, RepoEntry>>,
}

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_LEN: usize = 8;

/// `repo_` followed by eight random base36 characters
fn new_repo_id() -> String {
    let mut bits = uuid::Uuid::new_v4().as_u128();
    let suffix: String = (0..ID_LEN)
        .map(|_| {
            let c = ID_ALPHABET[(bits % 36) as usize] as char;
            bits /= 36;
            c
        })
        .collect();
    format!("repo_{suffix}")
}

impl RepoStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `repo_url` in the `INDEXING` state.
    pub async fn create(&self, repo_url: &str) -> repochat_ingest::Result<Repo> {
        self.create_with_ids(repo_url, new_repo_id).await
    }

    async fn create_with_ids(
        &self,
        repo_url: &str,
        mut next_id: impl FnMut() -> String,
    ) -> repochat_ingest::Result<Repo> {
        let slug = RepoSlug::parse(repo_url)?;
        let now = Utc::now();
        let mut repo = Repo {
            id: String::new(),
            owner: slug.owner,
            name: slug.name,
            repo_url: repo_url.to_string(),
            status: RepoStatus::Indexing,
            default_branch: Some("main".to_string()),
            last_indexed_commit_sha: None,
            progress: Some(RepoProgress::default()),
            error: None,
            created_at: now,
            updated_at: now,
        };

        let mut repos = self.repos.write().await;
        loop {
            let id = next_id();
            match repos.entry(id) {
                Entry::Occupied(taken) => debug!("Repo id {} already taken", taken.key()),
                Entry::Vacant(slot) => {
                    repo.id = slot.key().clone();
                    slot.insert(RepoEntry {
                        repo: repo.clone(),
                        poll_count: 0,
                        files: HashMap::new(),
                    });
                    break;
                }
            }
        }

        info!("Registered {} as {}", repo.repo_url, repo.id);
        Ok(repo)
    }

    /// Read `id` and advance the simulated lifecycle by one step.
    pub async fn poll(&self, id: &str) -> Option<Repo> {
        let mut repos = self.repos.write().await;
        let entry = repos.get_mut(id)?;
        entry.poll_count += 1;

        let repo = &mut entry.repo;
        if repo.status == RepoStatus::Indexing {
            let now = Utc::now();
            let previous = repo.progress.unwrap_or_default();
            repo.progress = Some(RepoProgress {
                files_processed: (previous.files_processed + SIMULATED_FILES_STEP)
                    .min(SIMULATED_FILES_CAP),
                chunks_embedded: (previous.chunks_embedded + SIMULATED_CHUNKS_STEP)
                    .min(SIMULATED_CHUNKS_CAP),
            });
            repo.updated_at = now;

            if entry.poll_count >= SIMULATED_READY_AFTER_POLLS {
                repo.status = RepoStatus::Ready;
                repo.progress = Some(SIMULATED_FINAL_PROGRESS);
                repo.last_indexed_commit_sha = Some(SIMULATED_COMMIT_SHA.to_string());
                info!("Simulated indexing of {} finished", id);
            }
        }

        Some(entry.repo.clone())
    }

    /// Read `id` without touching its lifecycle
    pub async fn get(&self, id: &str) -> Option<Repo> {
        self.repos.read().await.get(id).map(|e| e.repo.clone())
    }

    pub async fn len(&self) -> usize {
        self.repos.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.repos.read().await.is_empty()
    }

    /// Record running counters for a repository that is still indexing.
    pub async fn update_progress(&self, id: &str, progress: RepoProgress) -> bool {
        let mut repos = self.repos.write().await;
        let Some(entry) = repos.get_mut(id) else {
            return false;
        };
        if entry.repo.status.is_terminal() {
            debug!("Ignoring progress for finished repo {}", id);
            return false;
        }
        entry.repo.progress = Some(progress);
        entry.repo.updated_at = Utc::now();
        true
    }

    /// Finish a real ingestion and keep its files for the file viewer.
    pub async fn mark_ready(
        &self,
        id: &str,
        progress: RepoProgress,
        commit_sha: Option<String>,
        default_branch: Option<String>,
        files: Vec<SourceFile>,
    ) -> bool {
        let mut repos = self.repos.write().await;
        let Some(entry) = repos.get_mut(id) else {
            return false;
        };
        if entry.repo.status.is_terminal() {
            warn!("Repo {} already finished as {:?}", id, entry.repo.status);
            return false;
        }

        let repo = &mut entry.repo;
        repo.status = RepoStatus::Ready;
        repo.progress = Some(progress);
        repo.last_indexed_commit_sha = commit_sha;
        if default_branch.is_some() {
            repo.default_branch = default_branch;
        }
        repo.error = None;
        repo.updated_at = Utc::now();
        entry.files = files.into_iter().map(|f| (f.path, f.content)).collect();
        info!("Repo {} is ready with {} files", id, entry.files.len());
        true
    }

    pub async fn mark_failed(&self, id: &str, error: impl Into<String>) -> bool {
        let mut repos = self.repos.write().await;
        let Some(entry) = repos.get_mut(id) else {
            return false;
        };
        if entry.repo.status.is_terminal() {
            return false;
        }

        let error = error.into();
        warn!("Repo {} failed: {}", id, error);
        entry.repo.status = RepoStatus::Failed;
        entry.repo.error = Some(error);
        entry.repo.updated_at = Utc::now();
        true
    }

    /// Content captured for `path` by the ingestion of `id`
    pub async fn snapshot_file(&self, id: &str, path: &str) -> Option<String> {
        self.repos
            .read()
            .await
            .get(id)
            .and_then(|e| e.files.get(path).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_initial_state() {
        let store = RepoStore::new();
        let repo = store
            .create("https://github.com/acme/widgets.git")
            .await
            .unwrap();

        assert!(repo.id.starts_with("repo_"));
        assert_eq!(repo.id.len(), 13);
        assert!(repo.id[5..].chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
        assert_eq!(repo.owner, "acme");
        assert_eq!(repo.name, "widgets");
        assert_eq!(repo.repo_url, "https://github.com/acme/widgets.git");
        assert_eq!(repo.status, RepoStatus::Indexing);
        assert_eq!(repo.default_branch.as_deref(), Some("main"));
        assert_eq!(repo.progress, Some(RepoProgress::default()));
        assert!(repo.last_indexed_commit_sha.is_none());
        assert_eq!(repo.created_at, repo.updated_at);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_create_never_reuses_an_id() {
        let store = RepoStore::new();
        let first = store.create("acme/widgets").await.unwrap();

        let mut scripted = vec![
            "repo_zzzzzzzz".to_string(),
            first.id.clone(),
            first.id.clone(),
        ];
        let second = store
            .create_with_ids("acme/gadgets", || scripted.pop().unwrap_or_default())
            .await
            .unwrap();

        assert_eq!(second.id, "repo_zzzzzzzz");
        assert_eq!(store.len().await, 2);
        assert_eq!(store.get(&first.id).await.unwrap().name, "widgets");
        assert_eq!(store.get(&second.id).await.unwrap().name, "gadgets");
    }

    #[tokio::test]
    async fn test_ids_are_distinct_base36() {
        let store = RepoStore::new();
        let mut ids = std::collections::HashSet::new();
        for _ in 0..500 {
            let repo = store.create("acme/widgets").await.unwrap();
            assert!(repo.id[5..].bytes().all(|b| ID_ALPHABET.contains(&b)));
            ids.insert(repo.id);
        }
        assert_eq!(ids.len(), 500);
        assert_eq!(store.len().await, 500);
    }

    #[tokio::test]
    async fn test_create_rejects_bad_url() {
        let store = RepoStore::new();
        let err = store.create("not-a-repo").await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid repo format. Use https://github.com/owner/name or owner/name."
        );
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_poll_progression() {
        let store = RepoStore::new();
        let id = store.create("acme/widgets").await.unwrap().id;

        let expected = [(80, 1200), (160, 2400), (240, 3600)];
        for (files, chunks) in expected {
            let repo = store.poll(&id).await.unwrap();
            assert_eq!(repo.status, RepoStatus::Indexing);
            assert_eq!(
                repo.progress,
                Some(RepoProgress {
                    files_processed: files,
                    chunks_embedded: chunks
                })
            );
        }

        let repo = store.poll(&id).await.unwrap();
        assert_eq!(repo.status, RepoStatus::Ready);
        assert_eq!(repo.progress, Some(SIMULATED_FINAL_PROGRESS));
        assert_eq!(
            repo.last_indexed_commit_sha.as_deref(),
            Some(SIMULATED_COMMIT_SHA)
        );

        // Ready records are returned unchanged
        let again = store.poll(&id).await.unwrap();
        assert_eq!(again, repo);
    }

    #[tokio::test]
    async fn test_poll_unknown_repo() {
        let store = RepoStore::new();
        assert!(store.poll("repo_missing").await.is_none());
        assert!(store.get("repo_missing").await.is_none());
    }

    #[tokio::test]
    async fn test_get_does_not_advance() {
        let store = RepoStore::new();
        let id = store.create("acme/widgets").await.unwrap().id;
        for _ in 0..10 {
            store.get(&id).await.unwrap();
        }
        let repo = store.poll(&id).await.unwrap();
        assert_eq!(repo.progress.unwrap().files_processed, 80);
    }

    #[tokio::test]
    async fn test_ready_is_terminal() {
        let store = RepoStore::new();
        let id = store.create("acme/widgets").await.unwrap().id;

        assert!(store.update_progress(&id, RepoProgress { files_processed: 3, chunks_embedded: 7 }).await);
        let files = vec![SourceFile {
            path: "src/lib.rs".to_string(),
            content: "pub fn f() {}\n".to_string(),
        }];
        assert!(
            store
                .mark_ready(
                    &id,
                    RepoProgress { files_processed: 1, chunks_embedded: 1 },
                    Some("abc".to_string()),
                    Some("trunk".to_string()),
                    files,
                )
                .await
        );

        assert!(!store.mark_failed(&id, "late failure").await);
        assert!(!store.update_progress(&id, RepoProgress::default()).await);

        let repo = store.get(&id).await.unwrap();
        assert_eq!(repo.status, RepoStatus::Ready);
        assert_eq!(repo.default_branch.as_deref(), Some("trunk"));
        assert_eq!(repo.last_indexed_commit_sha.as_deref(), Some("abc"));
        assert!(repo.error.is_none());
        assert_eq!(
            store.snapshot_file(&id, "src/lib.rs").await.as_deref(),
            Some("pub fn f() {}\n")
        );
        assert!(store.snapshot_file(&id, "missing.rs").await.is_none());
    }

    #[tokio::test]
    async fn test_mark_failed_records_error() {
        let store = RepoStore::new();
        let id = store.create("acme/widgets").await.unwrap().id;

        assert!(store.mark_failed(&id, "git clone failed: not found").await);
        let repo = store.poll(&id).await.unwrap();
        assert_eq!(repo.status, RepoStatus::Failed);
        assert_eq!(repo.error.as_deref(), Some("git clone failed: not found"));
        assert!(!store.mark_failed("repo_missing", "x").await);
    }
}
