use serde::{Deserialize, Serialize};

/// Lookup key for a tracked repository (`owner/repo`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RepoKey(pub String);

impl std::fmt::Display for RepoKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a remote repository
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoRef {
    pub owner: String,
    pub repo: String,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
        }
    }

    /// Case-sensitive `owner/repo` key used for every map lookup
    pub fn key(&self) -> RepoKey {
        RepoKey(format!("{}/{}", self.owner, self.repo))
    }

    /// Browser URL for this repository on the given web host
    pub fn web_url(&self, web_base: &str) -> String {
        format!(
            "{}/{}/{}",
            web_base.trim_end_matches('/'),
            self.owner,
            self.repo
        )
    }
}

impl std::fmt::Display for RepoRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// A tracked repository as stored in the config file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoEntry {
    #[serde(flatten)]
    pub target: RepoRef,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub notes: String,
}

impl RepoEntry {
    pub fn new(target: RepoRef, notes: impl Into<String>) -> Self {
        Self {
            target,
            notes: notes.into(),
        }
    }

    pub fn key(&self) -> RepoKey {
        self.target.key()
    }
}
