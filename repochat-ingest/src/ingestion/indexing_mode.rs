use serde::{Deserialize, Serialize};

/// How a newly registered repository gets from `INDEXING` to `READY`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IndexingMode {
    /// No real work. Progress advances each time the status is polled and the
    /// repository turns ready on the fourth poll.
    Simulated,

    /// Shallow clone the repository in the background and walk the checkout
    Clone,

    /// Read the branch tree and file contents through the GitHub REST API
    #[serde(rename = "github-api")]
    GitHubApi,
}

impl IndexingMode {
    /// Check if this mode does real ingestion work in the background
    pub fn runs_ingestion(&self) -> bool {
        matches!(self, IndexingMode::Clone | IndexingMode::GitHubApi)
    }

    /// Check if status polls drive the lifecycle
    pub fn advances_on_poll(&self) -> bool {
        matches!(self, IndexingMode::Simulated)
    }
}

impl Default for IndexingMode {
    fn default() -> Self {
        Self::Simulated
    }
}

impl std::fmt::Display for IndexingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IndexingMode::Simulated => write!(f, "simulated"),
            IndexingMode::Clone => write!(f, "clone"),
            IndexingMode::GitHubApi => write!(f, "github-api"),
        }
    }
}

impl std::str::FromStr for IndexingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "simulated" | "mock" | "sim" => Ok(IndexingMode::Simulated),
            "clone" | "git" => Ok(IndexingMode::Clone),
            "github-api" | "github_api" | "github" | "api" => Ok(IndexingMode::GitHubApi),
            _ => Err(format!(
                "Invalid indexing mode: '{s}'. Valid values are: simulated, clone, github-api"
            )),
        }
    }
}
