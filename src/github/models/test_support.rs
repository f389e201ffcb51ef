//! Test helpers for constructing GitHub model fixtures.
//!
//! These builders keep poller tests focused on the fields that matter to a
//! scenario. Everything else is filled with stable defaults derived from the
//! identifier and repository.

use chrono::{DateTime, TimeZone, Utc};

use super::{
    CheckRun, CheckRunConclusion, CheckRunStatus, CombinedStatus, CommitState, MergeableState,
    PullRequestDetail, Review, ReviewSubmission, SearchItem,
};

/// Fixed timestamp used as the base for fixture `updated_at` values.
#[must_use]
pub fn fixture_time(offset_minutes: i64) -> Option<DateTime<Utc>> {
    Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0)
        .single()
        .map(|base| base + chrono::Duration::minutes(offset_minutes))
}

/// Constructs a search hit for pull request `number` in `repository`.
///
/// The detail URL points at `https://api.github.com`.
#[must_use]
pub fn search_item(id: u64, repository: &str, number: u64) -> SearchItem {
    SearchItem {
        id,
        number,
        title: format!("Pull request {number}"),
        html_url: format!("https://github.com/{repository}/pull/{number}"),
        author: Some("octocat".to_owned()),
        author_avatar: None,
        created_at: fixture_time(0),
        updated_at: fixture_time(i64::try_from(id).unwrap_or(0)),
        comments: 0,
        detail_url: Some(format!(
            "https://api.github.com/repos/{repository}/pulls/{number}"
        )),
    }
}

/// Returns a copy of `item` authored by `login`.
#[must_use]
pub fn authored_by(item: SearchItem, login: &str) -> SearchItem {
    SearchItem {
        author: Some(login.to_owned()),
        ..item
    }
}

/// Detail for a ready (non-draft) pull request at `sha`.
#[must_use]
pub fn detail_at(sha: &str, comments: u64) -> PullRequestDetail {
    PullRequestDetail {
        draft: false,
        comments,
        review_comments: 0,
        head_sha: Some(sha.to_owned()),
        mergeable_state: None,
    }
}

/// Detail carrying a mergeable state.
#[must_use]
pub fn detail_with_mergeable(sha: &str, state: &str) -> PullRequestDetail {
    PullRequestDetail {
        mergeable_state: Some(MergeableState::parse(state)),
        ..detail_at(sha, 0)
    }
}

/// A review submitted by `reviewer`.
#[must_use]
pub fn review(reviewer: &str, state: ReviewSubmission) -> Review {
    Review {
        reviewer: Some(reviewer.to_owned()),
        state,
    }
}

/// A completed check run with `conclusion`.
#[must_use]
pub const fn completed_run(conclusion: CheckRunConclusion) -> CheckRun {
    CheckRun {
        status: CheckRunStatus::Completed,
        conclusion: Some(conclusion),
    }
}

/// A check run that has not finished.
#[must_use]
pub const fn running_run() -> CheckRun {
    CheckRun {
        status: CheckRunStatus::InProgress,
        conclusion: None,
    }
}

/// Combined status with the given overall state and no individual statuses.
#[must_use]
pub const fn empty_status(state: CommitState) -> CombinedStatus {
    CombinedStatus {
        state,
        statuses: Vec::new(),
    }
}

/// Combined status whose individual statuses all share `state`.
#[must_use]
pub fn uniform_status(state: CommitState, count: usize) -> CombinedStatus {
    CombinedStatus {
        state,
        statuses: vec![state; count],
    }
}
