//! GitHub repository addressing and a small REST client.
//!
//! [`RepoSlug`] turns whatever the user pasted (`https://github.com/owner/name`,
//! `github.com/owner/name.git`, or plain `owner/name`) into an owner/name pair.
//! [`GitHubClient`] reads repository trees and file contents through the REST API,
//! which lets ingestion run without a local `git` binary.

use base64::Engine;
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::error::{IngestError, Result};

pub const DEFAULT_API_BASE: &str = "https://api.github.com";
/// Root that `owner/name` is appended to when cloning
pub const DEFAULT_CLONE_BASE: &str = "https://github.com";

const JSON_MEDIA_TYPE: &str = "application/vnd.github+json";
const SHA_MEDIA_TYPE: &str = "application/vnd.github.sha";

/// Owner and repository name of a GitHub repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoSlug {
    pub owner: String,
    pub name: String,
}

impl RepoSlug {
    /// Parse a repository URL or `owner/name` pair.
    ///
    /// Inputs mentioning `github.com` are parsed as URLs (a missing scheme is
    /// assumed to be https) and the first two path segments are used. Anything
    /// else must be exactly `owner/name`. A trailing `.git` is dropped from the name.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(IngestError::invalid_url("Repo URL is required."));
        }

        if trimmed.contains("github.com") {
            let with_scheme = if trimmed.contains("://") {
                trimmed.to_string()
            } else {
                format!("https://{trimmed}")
            };
            let url = Url::parse(&with_scheme)
                .map_err(|_| IngestError::invalid_url("Invalid GitHub repo URL."))?;
            let parts: Vec<&str> = url
                .path_segments()
                .map(|segments| segments.filter(|s| !s.is_empty()).collect())
                .unwrap_or_default();
            if parts.len() < 2 {
                return Err(IngestError::invalid_url("Invalid GitHub repo URL."));
            }
            return Ok(Self::from_parts(parts[0], parts[1]));
        }

        let parts: Vec<&str> = trimmed.split('/').filter(|s| !s.is_empty()).collect();
        if parts.len() != 2 {
            return Err(IngestError::invalid_url(
                "Invalid repo format. Use https://github.com/owner/name or owner/name.",
            ));
        }
        Ok(Self::from_parts(parts[0], parts[1]))
    }

    fn from_parts(owner: &str, name: &str) -> Self {
        Self {
            owner: owner.to_string(),
            name: name.strip_suffix(".git").unwrap_or(name).to_string(),
        }
    }

    /// HTTPS clone URL for this repository on github.com.
    pub fn clone_url(&self) -> String {
        self.clone_url_at(DEFAULT_CLONE_BASE)
    }

    /// Clone URL for this repository under another host or mirror root.
    pub fn clone_url_at(&self, base: &str) -> String {
        format!(
            "{}/{}/{}.git",
            base.trim_end_matches('/'),
            self.owner,
            self.name
        )
    }
}

impl fmt::Display for RepoSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Connection settings for the GitHub REST API
#[derive(Debug, Clone)]
pub struct GitHubConfig {
    /// API root, overridable for GitHub Enterprise and tests
    pub api_base: String,
    /// Clone root, overridable for mirrors and tests
    pub clone_base: String,
    /// Bearer token; anonymous requests are heavily rate limited
    pub token: Option<String>,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            clone_base: DEFAULT_CLONE_BASE.to_string(),
            token: None,
        }
    }
}

impl GitHubConfig {
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn with_clone_base(mut self, clone_base: impl Into<String>) -> Self {
        self.clone_base = clone_base.into();
        self
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.trim().is_empty());
        self
    }

    /// Clone URL for `slug` under the configured clone root
    pub fn clone_url(&self, slug: &RepoSlug) -> String {
        slug.clone_url_at(&self.clone_base)
    }

    /// Turn user input into something `git clone` accepts.
    ///
    /// Inputs with a scheme or an scp-style `git@` prefix are used as-is;
    /// anything else must parse as a [`RepoSlug`].
    pub fn resolve_clone_url(&self, input: &str) -> Result<String> {
        let trimmed = input.trim();
        if trimmed.contains("://") || trimmed.starts_with("git@") {
            return Ok(trimmed.to_string());
        }
        Ok(self.clone_url(&RepoSlug::parse(trimmed)?))
    }
}

/// One entry of a recursive git tree listing
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TreeEntry {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub sha: String,
    #[serde(default)]
    pub size: Option<u64>,
}

impl TreeEntry {
    pub fn is_blob(&self) -> bool {
        self.kind == "blob"
    }
}

/// Blob entries of a branch, plus the tree sha they were read from
#[derive(Debug, Clone)]
pub struct RepoTree {
    pub sha: String,
    pub blobs: Vec<TreeEntry>,
    pub truncated: bool,
}

#[derive(Deserialize)]
struct TreeResponse {
    sha: String,
    tree: Vec<TreeEntry>,
    #[serde(default)]
    truncated: bool,
}

/// Thin wrapper over the handful of GitHub endpoints ingestion needs.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: Client,
    config: GitHubConfig,
}

impl GitHubClient {
    pub fn new(config: GitHubConfig) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("repochat/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http, config })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.api_base.trim_end_matches('/'), path)
    }

    fn get(&self, url: &str, accept: &str) -> reqwest::RequestBuilder {
        let request = self.http.get(url).header(reqwest::header::ACCEPT, accept);
        match &self.config.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// List every blob reachable from `branch`.
    pub async fn fetch_repo_tree(&self, slug: &RepoSlug, branch: &str) -> Result<RepoTree> {
        let url = self.endpoint(&format!(
            "repos/{}/{}/git/trees/{}?recursive=1",
            slug.owner, slug.name, branch
        ));
        let response = self.get(&url, JSON_MEDIA_TYPE).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(IngestError::GitHubApi {
                message: "Failed to fetch repo tree".to_string(),
                status: status.as_u16(),
            });
        }

        let data: TreeResponse = response.json().await?;
        debug!(
            "GitHub tree for {} has {} entries (truncated: {})",
            slug,
            data.tree.len(),
            data.truncated
        );

        Ok(RepoTree {
            sha: data.sha,
            blobs: data.tree.into_iter().filter(TreeEntry::is_blob).collect(),
            truncated: data.truncated,
        })
    }

    /// Resolve the commit sha `branch` currently points at.
    pub async fn fetch_branch_commit(&self, slug: &RepoSlug, branch: &str) -> Result<String> {
        let url = self.endpoint(&format!(
            "repos/{}/{}/commits/{}",
            slug.owner, slug.name, branch
        ));
        let response = self.get(&url, SHA_MEDIA_TYPE).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(IngestError::GitHubApi {
                message: format!("Failed to resolve branch {branch}"),
                status: status.as_u16(),
            });
        }
        Ok(response.text().await?.trim().to_string())
    }

    /// Fetch and decode a single file.
    ///
    /// Returns `Ok(None)` when the API refuses the request or the response has no
    /// inline content (directories, submodules, files over the inline size limit).
    pub async fn fetch_file_content(&self, slug: &RepoSlug, path: &str) -> Result<Option<String>> {
        let url = self.endpoint(&format!(
            "repos/{}/{}/contents/{}",
            slug.owner,
            slug.name,
            path.trim_start_matches('/')
        ));
        let response = self.get(&url, JSON_MEDIA_TYPE).send().await?;
        if response.status() != StatusCode::OK {
            debug!("Contents API returned {} for {}", response.status(), path);
            return Ok(None);
        }

        let data: serde_json::Value = response.json().await?;
        let Some(encoded) = data.get("content").and_then(|c| c.as_str()) else {
            return Ok(None);
        };
        if encoded.is_empty() {
            return Ok(None);
        }

        // The API wraps base64 payloads at 60 columns
        let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
        let bytes = base64::engine::general_purpose::STANDARD.decode(compact)?;
        Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slug(owner: &str, name: &str) -> RepoSlug {
        RepoSlug {
            owner: owner.to_string(),
            name: name.to_string(),
        }
    }

    #[test]
    fn test_parse_full_url() {
        assert_eq!(
            RepoSlug::parse("https://github.com/tokio-rs/axum").unwrap(),
            slug("tokio-rs", "axum")
        );
        assert_eq!(
            RepoSlug::parse("  https://github.com/tokio-rs/axum.git  ").unwrap(),
            slug("tokio-rs", "axum")
        );
        assert_eq!(
            RepoSlug::parse("https://github.com/tokio-rs/axum/tree/main/examples").unwrap(),
            slug("tokio-rs", "axum")
        );
    }

    #[test]
    fn test_parse_url_without_scheme() {
        assert_eq!(
            RepoSlug::parse("github.com/serde-rs/json").unwrap(),
            slug("serde-rs", "json")
        );
    }

    #[test]
    fn test_parse_owner_name() {
        assert_eq!(
            RepoSlug::parse("serde-rs/serde").unwrap(),
            slug("serde-rs", "serde")
        );
        assert_eq!(
            RepoSlug::parse("/serde-rs/serde.git/").unwrap(),
            slug("serde-rs", "serde")
        );
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            RepoSlug::parse("   ").unwrap_err().to_string(),
            "Repo URL is required."
        );
        assert_eq!(
            RepoSlug::parse("https://github.com/only-owner")
                .unwrap_err()
                .to_string(),
            "Invalid GitHub repo URL."
        );
        assert_eq!(
            RepoSlug::parse("a/b/c").unwrap_err().to_string(),
            "Invalid repo format. Use https://github.com/owner/name or owner/name."
        );
        assert!(RepoSlug::parse("just-a-name").is_err());
    }

    #[test]
    fn test_clone_url_and_display() {
        let s = slug("rust-lang", "cargo");
        assert_eq!(s.clone_url(), "https://github.com/rust-lang/cargo.git");
        assert_eq!(s.to_string(), "rust-lang/cargo");
    }

    #[test]
    fn test_clone_base_override() {
        let config = GitHubConfig::default().with_clone_base("file:///srv/mirror/");
        assert_eq!(
            config.clone_url(&slug("acme", "widgets")),
            "file:///srv/mirror/acme/widgets.git"
        );
        assert_eq!(
            GitHubConfig::default().clone_url(&slug("acme", "widgets")),
            "https://github.com/acme/widgets.git"
        );
    }

    #[test]
    fn test_resolve_clone_url() {
        let config = GitHubConfig::default();
        assert_eq!(
            config.resolve_clone_url("acme/widgets").unwrap(),
            "https://github.com/acme/widgets.git"
        );
        assert_eq!(
            config
                .resolve_clone_url(" https://github.com/acme/widgets ")
                .unwrap(),
            "https://github.com/acme/widgets"
        );
        assert_eq!(
            config.resolve_clone_url("file:///tmp/repo").unwrap(),
            "file:///tmp/repo"
        );
        assert_eq!(
            config
                .resolve_clone_url("git@github.com:acme/widgets.git")
                .unwrap(),
            "git@github.com:acme/widgets.git"
        );
        assert!(config.resolve_clone_url("nonsense").is_err());
    }

    #[test]
    fn test_empty_token_is_ignored() {
        let config = GitHubConfig::default().with_token(Some("  ".to_string()));
        assert!(config.token.is_none());
    }

    #[tokio::test]
    async fn test_fetch_repo_tree_keeps_blobs() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/repos/acme/widgets/git/trees/main")
            .match_query(mockito::Matcher::UrlEncoded(
                "recursive".into(),
                "1".into(),
            ))
            .match_header("authorization", "Bearer secret")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "sha": "abc123",
                    "truncated": false,
                    "tree": [
                        {"path": "src", "type": "tree", "sha": "t1"},
                        {"path": "src/main.rs", "type": "blob", "sha": "b1", "size": 12},
                        {"path": "README.md", "type": "blob", "sha": "b2", "size": 40}
                    ]
                }"#,
            )
            .create_async()
            .await;

        let client = GitHubClient::new(
            GitHubConfig::default()
                .with_api_base(server.url())
                .with_token(Some("secret".to_string())),
        )
        .unwrap();
        let tree = client
            .fetch_repo_tree(&slug("acme", "widgets"), "main")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(tree.sha, "abc123");
        let paths: Vec<&str> = tree.blobs.iter().map(|b| b.path.as_str()).collect();
        assert_eq!(paths, vec!["src/main.rs", "README.md"]);
    }

    #[tokio::test]
    async fn test_fetch_repo_tree_error_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/repos/acme/missing/git/trees/main")
            .match_query(mockito::Matcher::Any)
            .with_status(404)
            .create_async()
            .await;

        let client =
            GitHubClient::new(GitHubConfig::default().with_api_base(server.url())).unwrap();
        let err = client
            .fetch_repo_tree(&slug("acme", "missing"), "main")
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::GitHubApi { status: 404, .. }));
        assert!(err.to_string().starts_with("Failed to fetch repo tree"));
    }

    #[tokio::test]
    async fn test_fetch_file_content_decodes_wrapped_base64() {
        let mut server = mockito::Server::new_async().await;
        // "fn main() {}\n" split across two lines the way the API returns it
        server
            .mock("GET", "/repos/acme/widgets/contents/src/main.rs")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"encoding": "base64", "content": "Zm4gbWFp\nbigpIHt9Cg==\n"}"#)
            .create_async()
            .await;

        let client =
            GitHubClient::new(GitHubConfig::default().with_api_base(server.url())).unwrap();
        let content = client
            .fetch_file_content(&slug("acme", "widgets"), "src/main.rs")
            .await
            .unwrap();
        assert_eq!(content.as_deref(), Some("fn main() {}\n"));
    }

    #[tokio::test]
    async fn test_fetch_file_content_missing_is_none() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/repos/acme/widgets/contents/nope.rs")
            .with_status(404)
            .create_async()
            .await;
        server
            .mock("GET", "/repos/acme/widgets/contents/src")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"name": "main.rs", "type": "file"}]"#)
            .create_async()
            .await;

        let client =
            GitHubClient::new(GitHubConfig::default().with_api_base(server.url())).unwrap();
        let widgets = slug("acme", "widgets");
        assert!(
            client
                .fetch_file_content(&widgets, "nope.rs")
                .await
                .unwrap()
                .is_none()
        );
        assert!(
            client
                .fetch_file_content(&widgets, "src")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_fetch_branch_commit_uses_sha_media_type() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/repos/acme/widgets/commits/main")
            .match_header("accept", "application/vnd.github.sha")
            .with_status(200)
            .with_body("0123456789abcdef0123456789abcdef01234567\n")
            .create_async()
            .await;

        let client =
            GitHubClient::new(GitHubConfig::default().with_api_base(server.url())).unwrap();
        let sha = client
            .fetch_branch_commit(&slug("acme", "widgets"), "main")
            .await
            .unwrap();
        assert_eq!(sha, "0123456789abcdef0123456789abcdef01234567");
    }
}
