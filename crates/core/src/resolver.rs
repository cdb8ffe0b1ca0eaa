//! Remote status resolution.
//!
//! [`StatusResolver::resolve`] runs a short chain of dependent remote calls
//! (metadata, release point, comparison) and folds the outcome into a single
//! [`RepoStatus`]. Failures never escape: they become `StatusState::Error` on
//! the returned status.

use crate::domain::{CommitSummary, RefKind, RepoRef, RepoStatus, MAX_RECENT_COMMITS};
use crate::error::{ApiError, ApiResult};
use crate::ports::{ComparedCommit, Clock, ObjectKind, RemoteApi};
use std::sync::Arc;
use tracing::{debug, warn};

/// Branch assumed when the metadata does not name one
pub const FALLBACK_BRANCH: &str = "main";

/// The commit a repository was last released or tagged at
#[derive(Debug, Clone, PartialEq, Eq)]
struct ReleasePoint {
    name: String,
    kind: RefKind,
    sha: String,
}

/// Resolves the deploy status of one repository at a time.
///
/// Holds no per-repository state, so one instance is shared by every
/// background task.
pub struct StatusResolver {
    api: Arc<dyn RemoteApi>,
    clock: Arc<dyn Clock>,
}

impl StatusResolver {
    pub fn new(api: Arc<dyn RemoteApi>, clock: Arc<dyn Clock>) -> Self {
        Self { api, clock }
    }

    /// Resolve `target`. Never fails; errors are encoded in the status.
    pub fn resolve(&self, target: &RepoRef) -> RepoStatus {
        debug!("Resolving {}", target);

        let branch = match self.default_branch(target) {
            Ok(branch) => branch,
            Err(e) => return self.failure(target, "", e),
        };

        let point = match self.latest_release_point(target) {
            Ok(Some(point)) => point,
            Ok(None) => {
                debug!("{} has no release or tag", target);
                return RepoStatus::no_release(target.clone(), branch, self.clock.now());
            }
            Err(e) => return self.failure(target, &branch, e),
        };

        let comparison = match self.api.compare(target, &point.sha, &branch) {
            Ok(comparison) => comparison,
            Err(e) => return self.failure(target, &branch, e),
        };

        debug!(
            "{} is {} commit(s) ahead of {}",
            target, comparison.ahead_by, point.name
        );

        RepoStatus::compared(
            target.clone(),
            branch,
            point.name,
            point.kind,
            comparison.ahead_by,
            recent_commits(comparison.commits),
            self.clock.now(),
        )
    }

    fn failure(&self, target: &RepoRef, branch: &str, err: ApiError) -> RepoStatus {
        warn!("Resolving {} failed: {}", target, err);
        RepoStatus::failed(target.clone(), branch, &err.to_string(), self.clock.now())
    }

    fn default_branch(&self, target: &RepoRef) -> ApiResult<String> {
        let info = self.api.repository(target)?;
        Ok(info
            .default_branch
            .filter(|b| !b.is_empty())
            .unwrap_or_else(|| FALLBACK_BRANCH.to_string()))
    }

    /// Latest release if it resolves to a commit, otherwise the newest tag.
    /// `None` when the repository has neither.
    fn latest_release_point(&self, target: &RepoRef) -> ApiResult<Option<ReleasePoint>> {
        match self.api.latest_release(target) {
            Ok(release) if !release.tag_name.is_empty() => {
                match self.resolve_tag_commit(target, &release.tag_name) {
                    Ok(sha) => {
                        return Ok(Some(ReleasePoint {
                            name: release.tag_name,
                            kind: RefKind::Release,
                            sha,
                        }))
                    }
                    Err(e) => debug!(
                        "Release {} of {} did not resolve ({}), trying tags",
                        release.tag_name, target, e
                    ),
                }
            }
            Ok(_) => debug!("Release of {} has no tag name, trying tags", target),
            Err(ApiError::NotFound) => debug!("{} has no releases, trying tags", target),
            Err(e) => debug!("Release lookup for {} failed ({}), trying tags", target, e),
        }

        let Some(tag) = self.api.tags(target, 1)?.into_iter().next() else {
            return Ok(None);
        };

        let sha = match self.resolve_tag_commit(target, &tag.name) {
            Ok(sha) => sha,
            Err(e) => {
                debug!("Tag ref {} of {} did not resolve ({}), using listed commit", tag.name, target, e);
                tag.commit.sha
            }
        };

        Ok(Some(ReleasePoint {
            name: tag.name,
            kind: RefKind::Tag,
            sha,
        }))
    }

    /// Commit id a tag points at, peeling one annotated tag object
    fn resolve_tag_commit(&self, target: &RepoRef, tag: &str) -> ApiResult<String> {
        let reference = self.api.tag_ref(target, tag)?;
        if reference.object.kind != ObjectKind::Tag {
            return Ok(reference.object.sha);
        }

        match self.api.tag_object(target, &reference.object.sha) {
            Ok(tag_object) => Ok(tag_object.object.sha),
            Err(e) => {
                debug!("Could not peel tag {} of {}: {}", tag, target, e);
                Ok(reference.object.sha)
            }
        }
    }
}

/// Newest [`MAX_RECENT_COMMITS`] of an oldest-first commit list, newest first
pub fn recent_commits(commits: Vec<ComparedCommit>) -> Vec<CommitSummary> {
    let skip = commits.len().saturating_sub(MAX_RECENT_COMMITS);
    commits
        .into_iter()
        .skip(skip)
        .rev()
        .map(|c| {
            let at = c.authored_at();
            CommitSummary::new(&c.sha, &c.commit.message, at)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{CommitAuthor, CommitDetail};
    use chrono::{TimeZone, Utc};

    fn raw(n: i64) -> ComparedCommit {
        ComparedCommit {
            sha: format!("{:040}", n),
            commit: CommitDetail {
                message: format!("change {}\n\nbody", n),
                author: Some(CommitAuthor {
                    date: Some(Utc.timestamp_opt(1_700_000_000 + n * 60, 0).unwrap()),
                }),
            },
        }
    }

    #[test]
    fn test_recent_commits_takes_newest_five_newest_first() {
        let commits: Vec<_> = (1..=8).map(raw).collect();
        let recent = recent_commits(commits);

        assert_eq!(recent.len(), 5);
        let headlines: Vec<_> = recent.iter().map(|c| c.headline.as_str()).collect();
        assert_eq!(headlines, vec!["change 8", "change 7", "change 6", "change 5", "change 4"]);
        assert!(recent.windows(2).all(|w| w[0].timestamp > w[1].timestamp));
        assert!(recent.iter().all(|c| c.short_id.len() == 7));
    }

    #[test]
    fn test_recent_commits_short_list() {
        let recent = recent_commits(vec![raw(1), raw(2)]);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].headline, "change 2");
    }

    #[test]
    fn test_recent_commits_empty() {
        assert!(recent_commits(Vec::new()).is_empty());
    }
}
