use super::commit::CommitSummary;
use super::repo::RepoRef;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// At most this many unreleased commits are kept per status
pub const MAX_RECENT_COMMITS: usize = 5;

/// Error text shown in a row is cut to this many characters
pub const MAX_ERROR_LEN: usize = 40;

/// Deploy state of a repository
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusState {
    Loading,
    /// Default branch head is the released commit
    Clean,
    /// Commits on the default branch have not been released
    Behind,
    /// Neither a release nor a tag exists
    NoRelease,
    Error,
}

impl std::fmt::Display for StatusState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            StatusState::Loading => "loading",
            StatusState::Clean => "clean",
            StatusState::Behind => "behind",
            StatusState::NoRelease => "no_release",
            StatusState::Error => "error",
        };
        f.write_str(name)
    }
}

/// What the release point was resolved from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefKind {
    None,
    Tag,
    Release,
}

/// Resolved snapshot of one repository at one point in time.
///
/// Built only through the constructors below so that `state`, `ref_kind`,
/// `commits_ahead` and `error_message` always agree with each other.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoStatus {
    pub target: RepoRef,
    pub default_branch: String,
    pub ref_name: String,
    pub ref_kind: RefKind,
    pub commits_ahead: u32,
    /// Newest first; only populated when `state` is `Behind`
    pub recent_commits: Vec<CommitSummary>,
    pub state: StatusState,
    pub error_message: String,
    pub checked_at: DateTime<Utc>,
}

impl RepoStatus {
    /// A resolution that failed; `message` is cut to [`MAX_ERROR_LEN`]
    pub fn failed(
        target: RepoRef,
        default_branch: impl Into<String>,
        message: &str,
        checked_at: DateTime<Utc>,
    ) -> Self {
        let mut error_message = truncate_error(message);
        if error_message.is_empty() {
            error_message = "unknown error".to_string();
        }
        Self {
            target,
            default_branch: default_branch.into(),
            ref_name: String::new(),
            ref_kind: RefKind::None,
            commits_ahead: 0,
            recent_commits: Vec::new(),
            state: StatusState::Error,
            error_message,
            checked_at,
        }
    }

    /// The repository has no release and no tag yet
    pub fn no_release(
        target: RepoRef,
        default_branch: impl Into<String>,
        checked_at: DateTime<Utc>,
    ) -> Self {
        Self {
            target,
            default_branch: default_branch.into(),
            ref_name: String::new(),
            ref_kind: RefKind::None,
            commits_ahead: 0,
            recent_commits: Vec::new(),
            state: StatusState::NoRelease,
            error_message: String::new(),
            checked_at,
        }
    }

    /// Compared against a release point: `Clean` when nothing is ahead,
    /// `Behind` otherwise. `ref_kind` must be `Tag` or `Release`.
    pub fn compared(
        target: RepoRef,
        default_branch: impl Into<String>,
        ref_name: impl Into<String>,
        ref_kind: RefKind,
        commits_ahead: u32,
        mut recent_commits: Vec<CommitSummary>,
        checked_at: DateTime<Utc>,
    ) -> Self {
        debug_assert!(ref_kind != RefKind::None);
        let state = if commits_ahead > 0 {
            StatusState::Behind
        } else {
            recent_commits.clear();
            StatusState::Clean
        };
        recent_commits.truncate(MAX_RECENT_COMMITS);
        Self {
            target,
            default_branch: default_branch.into(),
            ref_name: ref_name.into(),
            ref_kind,
            commits_ahead,
            recent_commits,
            state,
            error_message: String::new(),
            checked_at,
        }
    }

    /// Commits ahead that are not listed in `recent_commits`
    pub fn hidden_commits(&self) -> u32 {
        self.commits_ahead
            .saturating_sub(self.recent_commits.len() as u32)
    }
}

/// Cut an error message to [`MAX_ERROR_LEN`] characters
pub fn truncate_error(message: &str) -> String {
    message.trim().chars().take(MAX_ERROR_LEN).collect()
}
