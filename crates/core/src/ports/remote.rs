use crate::domain::repo::RepoRef;
use crate::error::ApiResult;
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Port for the read-only remote repository API.
///
/// Every call is blocking and may take up to the adapter's timeout; the
/// caller should run resolutions in `spawn_blocking`.
pub trait RemoteApi: Send + Sync {
    /// Repository metadata
    fn repository(&self, target: &RepoRef) -> ApiResult<RepositoryInfo>;

    /// Latest published release; `ApiError::NotFound` when there is none
    fn latest_release(&self, target: &RepoRef) -> ApiResult<ReleaseInfo>;

    /// Most recent tags, newest first
    fn tags(&self, target: &RepoRef, per_page: u32) -> ApiResult<Vec<TagInfo>>;

    /// The ref object for `refs/tags/<tag>`
    fn tag_ref(&self, target: &RepoRef, tag: &str) -> ApiResult<GitRefInfo>;

    /// An annotated tag object
    fn tag_object(&self, target: &RepoRef, sha: &str) -> ApiResult<TagObjectInfo>;

    /// Commits reachable from `head` but not from `base`
    fn compare(&self, target: &RepoRef, base: &str, head: &str) -> ApiResult<Comparison>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RepositoryInfo {
    #[serde(default)]
    pub default_branch: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ReleaseInfo {
    #[serde(default)]
    pub tag_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TagInfo {
    pub name: String,
    pub commit: ObjectId,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ObjectId {
    pub sha: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    Commit,
    /// Annotated tag; needs one more lookup to reach the commit
    Tag,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GitObject {
    #[serde(rename = "type")]
    pub kind: ObjectKind,
    pub sha: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GitRefInfo {
    pub object: GitObject,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TagObjectInfo {
    pub object: ObjectId,
}

/// Result of an ahead-by comparison. `commits` is oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Comparison {
    pub ahead_by: u32,
    #[serde(default)]
    pub commits: Vec<ComparedCommit>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ComparedCommit {
    pub sha: String,
    pub commit: CommitDetail,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CommitDetail {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub author: Option<CommitAuthor>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CommitAuthor {
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
}

impl ComparedCommit {
    pub fn authored_at(&self) -> Option<DateTime<Utc>> {
        self.commit.author.as_ref().and_then(|a| a.date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ref_object_kinds() {
        let annotated: GitRefInfo =
            serde_json::from_value(json!({"ref": "refs/tags/v1", "object": {"type": "tag", "sha": "aaa"}}))
                .unwrap();
        assert_eq!(annotated.object.kind, ObjectKind::Tag);

        let light: GitRefInfo =
            serde_json::from_value(json!({"object": {"type": "commit", "sha": "bbb"}})).unwrap();
        assert_eq!(light.object.kind, ObjectKind::Commit);

        let odd: GitRefInfo =
            serde_json::from_value(json!({"object": {"type": "blob", "sha": "ccc"}})).unwrap();
        assert_eq!(odd.object.kind, ObjectKind::Other);
    }

    #[test]
    fn test_comparison_tolerates_missing_author() {
        let cmp: Comparison = serde_json::from_value(json!({
            "ahead_by": 2,
            "status": "ahead",
            "commits": [
                {"sha": "111", "commit": {"message": "a", "author": {"date": "2024-05-01T10:00:00Z"}}},
                {"sha": "222", "commit": {"message": "b", "author": null}}
            ]
        }))
        .unwrap();
        assert_eq!(cmp.ahead_by, 2);
        assert!(cmp.commits[0].authored_at().is_some());
        assert!(cmp.commits[1].authored_at().is_none());
    }

    #[test]
    fn test_repository_without_default_branch() {
        let info: RepositoryInfo = serde_json::from_value(json!({"name": "web"})).unwrap();
        assert_eq!(info.default_branch, None);
    }
}
