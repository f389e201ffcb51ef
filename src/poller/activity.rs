//! Review and CI enrichment.
//!
//! Reviews reduce to one [`ReviewState`]: the latest decisive verdict per
//! reviewer survives, then changes-requested beats approved beats pending.
//!
//! CI reduces in three stages. Check runs and the legacy combined status
//! each produce an optional [`CiSignal`]; the two signals merge with failure
//! dominant, then success, then pending. Only when neither source has an
//! opinion does the pull request's mergeable state decide.

use std::collections::HashMap;

use tracing::warn;

use crate::github::{
    CheckRun, CheckRunConclusion, CheckRunStatus, CombinedStatus, CommitState, MergeableState,
    PullRequestGateway, RepositoryFullName, Review, ReviewSubmission,
};

use super::record::{CiStatus, PullRequestRecord, ReviewState};

/// Opinion of a single CI source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CiSignal {
    /// At least one failure.
    Failure,
    /// Still running.
    Pending,
    /// Passed.
    Success,
}

/// Reduced review verdict plus display counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReviewSummary {
    /// Reduced verdict.
    pub state: ReviewState,
    /// Distinct reviewers with a surviving verdict.
    pub review_count: u64,
    /// How many surviving verdicts are approvals.
    pub approval_count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum ReviewerKey<'a> {
    Login(&'a str),
    Anonymous(usize),
}

/// Reduces a review list to a single verdict.
///
/// Comments and unsubmitted reviews never replace a verdict. A dismissal
/// replaces the reviewer's earlier verdict and counts as pending. Reviews
/// from deleted accounts cannot be attributed, so each stands alone.
#[must_use]
pub fn reduce_reviews(reviews: &[Review]) -> ReviewSummary {
    let mut latest: HashMap<ReviewerKey<'_>, ReviewSubmission> = HashMap::new();
    for (position, review) in reviews.iter().enumerate() {
        if matches!(
            review.state,
            ReviewSubmission::Commented | ReviewSubmission::Pending
        ) {
            continue;
        }
        let reviewer = review
            .reviewer
            .as_deref()
            .map_or(ReviewerKey::Anonymous(position), ReviewerKey::Login);
        latest.insert(reviewer, review.state);
    }

    let verdicts: Vec<ReviewSubmission> = latest.into_values().collect();
    let state = if verdicts.contains(&ReviewSubmission::ChangesRequested) {
        ReviewState::ChangesRequested
    } else if verdicts.contains(&ReviewSubmission::Approved) {
        ReviewState::Approved
    } else {
        ReviewState::Pending
    };

    ReviewSummary {
        state,
        review_count: count(verdicts.iter()),
        approval_count: count(
            verdicts
                .iter()
                .filter(|verdict| **verdict == ReviewSubmission::Approved),
        ),
    }
}

/// Stage one: reduces the check-run list.
#[must_use]
pub fn check_runs_signal(runs: &[CheckRun]) -> Option<CiSignal> {
    if runs.is_empty() {
        return None;
    }

    let completed: Vec<&CheckRun> = runs
        .iter()
        .filter(|run| run.status == CheckRunStatus::Completed)
        .collect();

    let has_failure = completed.iter().any(|run| {
        matches!(
            run.conclusion,
            Some(
                CheckRunConclusion::Failure
                    | CheckRunConclusion::TimedOut
                    | CheckRunConclusion::ActionRequired
            )
        )
    });
    let has_pending = runs.iter().any(|run| {
        matches!(
            run.status,
            CheckRunStatus::Queued
                | CheckRunStatus::InProgress
                | CheckRunStatus::Waiting
                | CheckRunStatus::Pending
        )
    });
    let all_passing = !completed.is_empty()
        && completed.iter().all(|run| {
            matches!(
                run.conclusion,
                Some(
                    CheckRunConclusion::Success
                        | CheckRunConclusion::Skipped
                        | CheckRunConclusion::Neutral
                )
            )
        });

    if has_failure {
        Some(CiSignal::Failure)
    } else if has_pending {
        Some(CiSignal::Pending)
    } else if all_passing || completed.len() == runs.len() {
        Some(CiSignal::Success)
    } else {
        Some(CiSignal::Pending)
    }
}

/// Stage two: reduces the legacy combined commit status.
#[must_use]
pub const fn commit_status_signal(status: &CombinedStatus) -> Option<CiSignal> {
    if status.statuses.is_empty() {
        return None;
    }
    Some(match status.state {
        CommitState::Success => CiSignal::Success,
        CommitState::Pending => CiSignal::Pending,
        CommitState::Failure | CommitState::Error => CiSignal::Failure,
    })
}

/// Stage three: merges both sources, falling back to the mergeable state.
#[must_use]
pub fn merge_ci(
    check_runs: Option<CiSignal>,
    commit_status: Option<CiSignal>,
    mergeable_state: Option<&MergeableState>,
) -> CiStatus {
    let either = |signal: CiSignal| check_runs == Some(signal) || commit_status == Some(signal);

    if either(CiSignal::Failure) {
        CiStatus::Failure
    } else if either(CiSignal::Success) {
        CiStatus::Success
    } else if either(CiSignal::Pending) {
        CiStatus::Pending
    } else {
        match mergeable_state {
            Some(MergeableState::Clean) => CiStatus::Success,
            Some(MergeableState::Unstable) => CiStatus::Failure,
            Some(MergeableState::Blocked) => CiStatus::Pending,
            Some(MergeableState::Dirty | MergeableState::Other(_)) | None => CiStatus::None,
        }
    }
}

/// Check and pass counters across both CI sources.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CiTally {
    /// Entries seen.
    pub checks: u64,
    /// Entries that succeeded.
    pub passed: u64,
}

impl CiTally {
    fn add_check_runs(self, runs: &[CheckRun]) -> Self {
        Self {
            checks: self.checks.saturating_add(count(runs.iter())),
            passed: self.passed.saturating_add(count(
                runs.iter()
                    .filter(|run| run.conclusion == Some(CheckRunConclusion::Success)),
            )),
        }
    }

    fn add_statuses(self, status: &CombinedStatus) -> Self {
        Self {
            checks: self.checks.saturating_add(count(status.statuses.iter())),
            passed: self.passed.saturating_add(count(
                status
                    .statuses
                    .iter()
                    .filter(|state| **state == CommitState::Success),
            )),
        }
    }
}

fn count<I: Iterator>(iter: I) -> u64 {
    u64::try_from(iter.count()).unwrap_or(u64::MAX)
}

/// Reads reviews and CI signals for a record.
///
/// Every sub-fetch failure is logged and treated as "no opinion" from that
/// source; enrichment never fails as a whole.
pub struct ActivityEnricher<'a, G: PullRequestGateway + ?Sized> {
    gateway: &'a G,
}

impl<'a, G: PullRequestGateway + ?Sized> ActivityEnricher<'a, G> {
    /// Creates an enricher that reads through `gateway`.
    #[must_use]
    pub const fn new(gateway: &'a G) -> Self {
        Self { gateway }
    }

    /// Fills the review and CI fields of `record`.
    pub async fn enrich(&self, repository: &RepositoryFullName, record: &mut PullRequestRecord) {
        match self.gateway.list_reviews(repository, record.number).await {
            Ok(reviews) => {
                let summary = reduce_reviews(&reviews);
                record.review_state = summary.state;
                record.review_count = summary.review_count;
                record.approval_count = summary.approval_count;
            }
            Err(error) => warn!(
                repository = %repository,
                number = record.number,
                %error,
                "review list unavailable; keeping pending review state"
            ),
        }

        let Some(sha) = record.head_sha.clone() else {
            return;
        };

        let runs = match self.gateway.list_check_runs(repository, &sha).await {
            Ok(runs) => Some(runs),
            Err(error) => {
                warn!(repository = %repository, number = record.number, %error, "check runs unavailable");
                None
            }
        };
        let status = match self.gateway.combined_status(repository, &sha).await {
            Ok(status) => Some(status),
            Err(error) => {
                warn!(repository = %repository, number = record.number, %error, "commit status unavailable");
                None
            }
        };

        let mut tally = CiTally::default();
        let runs_signal = runs.as_deref().and_then(|list| {
            tally = tally.add_check_runs(list);
            check_runs_signal(list)
        });
        let status_signal = status.as_ref().and_then(|combined| {
            tally = tally.add_statuses(combined);
            commit_status_signal(combined)
        });

        record.ci_status = merge_ci(runs_signal, status_signal, record.mergeable_state.as_ref());
        record.ci_checks = tally.checks;
        record.ci_passed = tally.passed;
    }
}

#[cfg(test)]
#[path = "activity_tests.rs"]
mod tests;
