//! Error types for repository ingestion

use std::path::PathBuf;

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;

/// Everything that can go wrong between a repository URL and a list of source files.
///
/// URL problems carry the exact message shown to API clients, so the server can
/// forward them verbatim as a 400 body.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// The repository URL or `owner/name` slug could not be understood
    #[error("{message}")]
    InvalidRepoUrl { message: String },

    /// `git` exited unsuccessfully
    #[error("git {command} failed: {stderr}")]
    Git { command: String, stderr: String },

    /// The GitHub REST API answered with a non-success status
    #[error("{message} (status {status})")]
    GitHubApi { message: String, status: u16 },

    /// A directory could not be created or removed
    #[error("Failed to prepare {path}: {source}")]
    Workspace {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// IO errors while walking or reading files
    #[error("IO error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// Transport-level HTTP failures
    #[error("HTTP error: {source}")]
    Http {
        #[from]
        source: reqwest::Error,
    },

    /// Base64 payloads from the contents API that do not decode
    #[error("Invalid file encoding: {source}")]
    Decode {
        #[from]
        source: base64::DecodeError,
    },
}

impl IngestError {
    /// Create an invalid repository URL error with a user-facing message.
    pub fn invalid_url<S: Into<String>>(message: S) -> Self {
        Self::InvalidRepoUrl {
            message: message.into(),
        }
    }

    /// Create a git failure from the subcommand and its captured stderr.
    pub fn git<C: Into<String>>(command: C, stderr: &[u8]) -> Self {
        Self::Git {
            command: command.into(),
            stderr: String::from_utf8_lossy(stderr).trim().to_string(),
        }
    }

    /// Whether this error was caused by the caller's input rather than the environment.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidRepoUrl { .. })
    }
}
