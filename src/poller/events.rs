//! Notification events produced by reconciliation.

use serde::{Deserialize, Serialize};

use super::policy::EventCategory;
use super::record::{PullRequestRecord, ReviewState};

/// Minimal reference to the pull request an event concerns.
///
/// Closed pull requests are no longer in the current list, so their
/// reference is rebuilt from the stored snapshot entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrRef {
    /// Platform-assigned numeric identifier.
    pub id: u64,
    /// Human-facing number.
    pub number: u64,
    /// Repository full name.
    pub repository: String,
    /// Title.
    pub title: String,
    /// HTML URL.
    pub url: String,
    /// Author login, when known.
    pub author: Option<String>,
}

impl PrRef {
    /// Reference to a current record.
    #[must_use]
    pub fn from_record(record: &PullRequestRecord) -> Self {
        Self {
            id: record.id,
            number: record.number,
            repository: record.repository.clone(),
            title: record.title.clone(),
            url: record.url.clone(),
            author: record.author.clone(),
        }
    }
}

/// Direction of a status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusChange {
    /// Draft converted to ready for review.
    Ready,
    /// Ready converted back to draft.
    Draft,
    /// No longer open (closed or merged).
    Closed,
}

/// What changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// First observation of the pull request.
    NewPr,
    /// New comments; carries the positive delta.
    Comment {
        /// Number of comments added since the previous cycle.
        count: u64,
    },
    /// Review verdict moved to approved or changes requested.
    Review(ReviewState),
    /// CI moved to failure.
    CiFailure,
    /// CI moved to success.
    CiSuccess,
    /// CI success, approval, and non-draft now hold together.
    ReadyToMerge,
    /// Draft, ready, or closed transition.
    Status(StatusChange),
}

impl EventKind {
    /// Policy category gating this kind.
    #[must_use]
    pub const fn category(self) -> EventCategory {
        match self {
            Self::NewPr => EventCategory::NewPrs,
            Self::Comment { .. } => EventCategory::Comments,
            Self::Review(_) => EventCategory::Reviews,
            Self::CiFailure => EventCategory::CiFailure,
            Self::CiSuccess => EventCategory::CiSuccess,
            Self::ReadyToMerge => EventCategory::ReadyToMerge,
            Self::Status(_) => EventCategory::Status,
        }
    }

    /// Stable type name used in the `highlightedPRs` blob.
    #[must_use]
    pub const fn type_name(self) -> &'static str {
        match self {
            Self::NewPr => "new_pr",
            Self::Comment { .. } => "comment",
            Self::Review(_) => "review",
            Self::CiFailure => "ci_failure",
            Self::CiSuccess => "ci_success",
            Self::ReadyToMerge => "ready_to_merge",
            Self::Status(_) => "status",
        }
    }
}

/// One change detected during a poll cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationEvent {
    /// Affected pull request.
    pub pr: PrRef,
    /// What changed.
    pub kind: EventKind,
}

impl NotificationEvent {
    /// Creates an event for `pr`.
    #[must_use]
    pub const fn new(pr: PrRef, kind: EventKind) -> Self {
        Self { pr, kind }
    }
}
