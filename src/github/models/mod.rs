//! Data models for the GitHub resources the poller reads.
//!
//! Types prefixed with `Api` are internal deserialisation targets that map
//! the wire shape into the public domain types. Missing optional fields are
//! defaulted here so the enrichment stages never see partial JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

/// A pull request hit returned by the issue search endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchItem {
    /// Platform-assigned numeric identifier.
    pub id: u64,
    /// Human-facing pull request number.
    pub number: u64,
    /// Title of the pull request.
    pub title: String,
    /// HTML URL for displaying to a user.
    pub html_url: String,
    /// Author login if present.
    pub author: Option<String>,
    /// Author avatar URL if present.
    pub author_avatar: Option<String>,
    /// Creation timestamp.
    pub created_at: Option<DateTime<Utc>>,
    /// Last update timestamp.
    pub updated_at: Option<DateTime<Utc>>,
    /// General comment counter reported by search.
    pub comments: u64,
    /// API URL of the pull request detail resource.
    pub detail_url: Option<String>,
}

/// Mergeability summary reported on the pull request detail resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeableState {
    /// Mergeable and all checks passed.
    Clean,
    /// Mergeable but with failing checks.
    Unstable,
    /// Blocked, usually waiting for required checks or reviews.
    Blocked,
    /// Merge conflicts with the base branch.
    Dirty,
    /// Any other value GitHub reports (`unknown`, `draft`, `behind`, ...).
    #[serde(untagged)]
    Other(String),
}

impl MergeableState {
    /// Parses the raw `mergeable_state` string.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw {
            "clean" => Self::Clean,
            "unstable" => Self::Unstable,
            "blocked" => Self::Blocked,
            "dirty" => Self::Dirty,
            other => Self::Other(other.to_owned()),
        }
    }
}

/// Authoritative pull request detail used for enrichment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PullRequestDetail {
    /// Whether the pull request is a draft.
    pub draft: bool,
    /// General (issue) comment count.
    pub comments: u64,
    /// Inline review comment count.
    pub review_comments: u64,
    /// Head commit SHA.
    pub head_sha: Option<String>,
    /// Mergeability summary used as a CI fallback.
    pub mergeable_state: Option<MergeableState>,
}

impl PullRequestDetail {
    /// Total number of comments across both counters.
    #[must_use]
    pub const fn total_comments(&self) -> u64 {
        self.comments.saturating_add(self.review_comments)
    }
}

/// Verdict recorded by a submitted review.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewSubmission {
    /// The reviewer approved.
    Approved,
    /// The reviewer requested changes.
    ChangesRequested,
    /// The reviewer only commented.
    Commented,
    /// The review has not been submitted yet.
    Pending,
    /// A previous verdict was dismissed.
    Dismissed,
}

/// A single pull request review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Review {
    /// Reviewer login; `None` for deleted accounts.
    pub reviewer: Option<String>,
    /// Submitted state.
    pub state: ReviewSubmission,
}

/// Execution status of a check run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckRunStatus {
    /// Waiting in the queue.
    Queued,
    /// Currently running.
    InProgress,
    /// Finished; see the conclusion.
    Completed,
    /// Waiting on a deployment protection rule.
    Waiting,
    /// Requested but not yet queued.
    Requested,
    /// Pending execution.
    Pending,
    /// Unrecognised status.
    #[serde(other)]
    Unknown,
}

/// Outcome of a completed check run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckRunConclusion {
    /// The run passed.
    Success,
    /// The run failed.
    Failure,
    /// The run finished without a verdict.
    Neutral,
    /// The run was cancelled.
    Cancelled,
    /// The run was skipped.
    Skipped,
    /// The run exceeded its time limit.
    TimedOut,
    /// The run needs manual action.
    ActionRequired,
    /// The run went stale.
    Stale,
    /// Unrecognised conclusion.
    #[serde(other)]
    Unknown,
}

/// A check run attached to a commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckRun {
    /// Execution status.
    pub status: CheckRunStatus,
    /// Conclusion once completed.
    pub conclusion: Option<CheckRunConclusion>,
}

/// State reported by the legacy commit status API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitState {
    /// All statuses passed.
    Success,
    /// At least one status failed.
    Failure,
    /// At least one status is still running.
    Pending,
    /// At least one status errored.
    Error,
}

/// Combined commit status for a commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombinedStatus {
    /// Platform-combined state.
    pub state: CommitState,
    /// Individual status states.
    pub statuses: Vec<CommitState>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiSearchResponse {
    #[serde(default)]
    pub(crate) items: Vec<ApiSearchItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiSearchItem {
    pub(crate) id: u64,
    pub(crate) number: u64,
    #[serde(default)]
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) html_url: String,
    pub(crate) user: Option<ApiUser>,
    pub(crate) created_at: Option<DateTime<Utc>>,
    pub(crate) updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub(crate) comments: u64,
    pub(crate) pull_request: Option<ApiPullRequestLink>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiPullRequestLink {
    pub(crate) url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiUser {
    pub(crate) login: Option<String>,
    pub(crate) avatar_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiPullRequestDetail {
    #[serde(default)]
    pub(crate) draft: Option<bool>,
    #[serde(default)]
    pub(crate) comments: Option<u64>,
    #[serde(default)]
    pub(crate) review_comments: Option<u64>,
    pub(crate) head: Option<ApiCommitRef>,
    pub(crate) mergeable_state: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiCommitRef {
    pub(crate) sha: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiReview {
    pub(crate) user: Option<ApiUser>,
    pub(crate) state: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiCheckRunList {
    #[serde(default)]
    pub(crate) check_runs: Vec<ApiCheckRun>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiCheckRun {
    pub(crate) status: CheckRunStatus,
    pub(crate) conclusion: Option<CheckRunConclusion>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiCombinedStatus {
    pub(crate) state: CommitState,
    #[serde(default)]
    pub(crate) statuses: Vec<ApiCommitStatus>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiCommitStatus {
    pub(crate) state: CommitState,
}

impl From<ApiSearchItem> for SearchItem {
    fn from(value: ApiSearchItem) -> Self {
        let (author, author_avatar) = value
            .user
            .map_or((None, None), |user| (user.login, user.avatar_url));
        Self {
            id: value.id,
            number: value.number,
            title: value.title,
            html_url: value.html_url,
            author,
            author_avatar,
            created_at: value.created_at,
            updated_at: value.updated_at,
            comments: value.comments,
            detail_url: value.pull_request.and_then(|link| link.url),
        }
    }
}

impl From<ApiPullRequestDetail> for PullRequestDetail {
    fn from(value: ApiPullRequestDetail) -> Self {
        Self {
            draft: value.draft.unwrap_or(false),
            comments: value.comments.unwrap_or(0),
            review_comments: value.review_comments.unwrap_or(0),
            head_sha: value.head.and_then(|head| head.sha),
            mergeable_state: value.mergeable_state.as_deref().map(MergeableState::parse),
        }
    }
}

impl From<ApiReview> for Review {
    fn from(value: ApiReview) -> Self {
        let state = match value.state.as_str() {
            "APPROVED" => ReviewSubmission::Approved,
            "CHANGES_REQUESTED" => ReviewSubmission::ChangesRequested,
            "PENDING" => ReviewSubmission::Pending,
            "DISMISSED" => ReviewSubmission::Dismissed,
            _ => ReviewSubmission::Commented,
        };
        Self {
            reviewer: value.user.and_then(|user| user.login),
            state,
        }
    }
}

impl From<ApiCheckRun> for CheckRun {
    fn from(value: ApiCheckRun) -> Self {
        Self {
            status: value.status,
            conclusion: value.conclusion,
        }
    }
}

impl From<ApiCombinedStatus> for CombinedStatus {
    fn from(value: ApiCombinedStatus) -> Self {
        Self {
            state: value.state,
            statuses: value.statuses.into_iter().map(|status| status.state).collect(),
        }
    }
}
