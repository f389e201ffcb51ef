//! Canonical per-cycle pull request record and its derived states.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::github::{MergeableState, PullRequestRole, RepositoryFullName, SearchItem};

/// Overall review verdict for a pull request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewState {
    /// No decisive verdict yet.
    #[default]
    Pending,
    /// At least one approval and no outstanding change requests.
    Approved,
    /// At least one reviewer requested changes.
    ChangesRequested,
}

/// Overall CI verdict for a pull request's head commit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CiStatus {
    /// No CI signal is available.
    None,
    /// CI is running or has not reported yet.
    #[default]
    Pending,
    /// CI passed.
    Success,
    /// CI failed.
    Failure,
}

/// Roles the watching user holds on a pull request.
///
/// Flags are only ever unioned: discovering a pull request through another
/// query can add a role but never clears one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleFlags {
    /// The user opened the pull request.
    pub is_author: bool,
    /// The user was asked to review.
    pub is_reviewer: bool,
    /// The user is assigned.
    pub is_assignee: bool,
}

impl RoleFlags {
    /// Flags with only `role` set.
    #[must_use]
    pub const fn for_role(role: PullRequestRole) -> Self {
        Self {
            is_author: matches!(role, PullRequestRole::Author),
            is_reviewer: matches!(role, PullRequestRole::Reviewer),
            is_assignee: matches!(role, PullRequestRole::Assignee),
        }
    }

    /// Logical OR of both flag sets.
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self {
            is_author: self.is_author || other.is_author,
            is_reviewer: self.is_reviewer || other.is_reviewer,
            is_assignee: self.is_assignee || other.is_assignee,
        }
    }
}

/// A pull request as published in the `prs` blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestRecord {
    /// Platform-assigned numeric identifier.
    pub id: u64,
    /// Human-facing number within the repository.
    pub number: u64,
    /// Repository full name (`owner/repo`).
    pub repository: String,
    /// Title.
    pub title: String,
    /// Author login.
    #[serde(default)]
    pub author: Option<String>,
    /// Author avatar URL.
    #[serde(default)]
    pub author_avatar: Option<String>,
    /// HTML URL.
    pub url: String,
    /// Creation timestamp.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Last update timestamp, used for ordering.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    /// Roles held by the watching user.
    #[serde(flatten)]
    pub roles: RoleFlags,
    /// Whether the pull request is a draft.
    #[serde(default)]
    pub is_draft: bool,
    /// General plus inline review comments.
    #[serde(default)]
    pub comment_count: u64,
    /// Reduced review verdict.
    #[serde(default)]
    pub review_state: ReviewState,
    /// Reviewers with a surviving verdict.
    #[serde(default)]
    pub review_count: u64,
    /// Reviewers whose surviving verdict is an approval.
    #[serde(default)]
    pub approval_count: u64,
    /// Merged CI verdict.
    #[serde(default)]
    pub ci_status: CiStatus,
    /// Check runs plus commit statuses seen.
    #[serde(default)]
    pub ci_checks: u64,
    /// How many of those reported success.
    #[serde(default)]
    pub ci_passed: u64,
    /// Fallback mergeability reported on the detail resource.
    #[serde(default)]
    pub mergeable_state: Option<MergeableState>,
    /// Head commit SHA.
    #[serde(default)]
    pub head_sha: Option<String>,
}

impl PullRequestRecord {
    /// Builds the initial record for a search hit.
    ///
    /// Enrichment starts from a non-draft pull request whose review and CI
    /// states are pending and whose comment count is the search counter.
    #[must_use]
    pub fn from_search(item: SearchItem, repository: &RepositoryFullName, roles: RoleFlags) -> Self {
        Self {
            id: item.id,
            number: item.number,
            repository: repository.as_str().to_owned(),
            title: item.title,
            author: item.author,
            author_avatar: item.author_avatar,
            url: item.html_url,
            created_at: item.created_at,
            updated_at: item.updated_at,
            roles,
            is_draft: false,
            comment_count: item.comments,
            review_state: ReviewState::Pending,
            review_count: 0,
            approval_count: 0,
            ci_status: CiStatus::Pending,
            ci_checks: 0,
            ci_passed: 0,
            mergeable_state: None,
            head_sha: None,
        }
    }

    /// Whether CI passed, the review is approved, and the PR is not a draft.
    #[must_use]
    pub fn is_ready_to_merge(&self) -> bool {
        self.ci_status == CiStatus::Success
            && self.review_state == ReviewState::Approved
            && !self.is_draft
    }
}

/// Orders records by `updated_at`, newest first; records without a
/// timestamp sort last.
pub fn sort_by_recent_update(records: &mut [PullRequestRecord]) {
    records.sort_by(|left, right| right.updated_at.cmp(&left.updated_at));
}
