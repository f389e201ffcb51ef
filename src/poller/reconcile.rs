//! Diffing the current cycle against the previous snapshot.
//!
//! Reconciliation is pure: it reads the current records and the prior
//! [`SnapshotState`] and returns the events plus the state to persist. The
//! caller owns the commit.

use std::collections::{BTreeSet, HashSet};

use tracing::debug;

use super::events::{EventKind, NotificationEvent, PrRef, StatusChange};
use super::policy::PolicySet;
use super::record::{CiStatus, PullRequestRecord, ReviewState};
use super::state::{PersistedPrState, SnapshotState};

/// Inputs of one reconciliation.
#[derive(Debug, Clone, Copy)]
pub struct ReconcileInput<'a> {
    /// Enriched records of this cycle, already ordered for display.
    pub records: &'a [PullRequestRecord],
    /// Snapshot read at the start of the cycle.
    pub previous: &'a SnapshotState,
    /// Per-repository notification toggles.
    pub policies: &'a PolicySet,
    /// Repositories whose fetch failed this cycle. Their stored entries are
    /// kept as they were and never reported closed.
    pub carried_repositories: &'a BTreeSet<String>,
}

/// Outcome of one reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    /// Events in generation order.
    pub events: Vec<NotificationEvent>,
    /// State to persist at the end of the cycle.
    pub next: SnapshotState,
}

/// Diffs `input.records` against `input.previous`.
#[must_use]
pub fn reconcile(input: ReconcileInput<'_>) -> Reconciliation {
    let ReconcileInput {
        records,
        previous,
        policies,
        carried_repositories,
    } = input;

    let mut events = Vec::new();
    for record in records {
        let policy = policies.policy_for(&record.repository);
        if !previous.seen.contains(record.id) {
            if policy.allows(EventKind::NewPr.category()) {
                events.push(NotificationEvent::new(
                    PrRef::from_record(record),
                    EventKind::NewPr,
                ));
            }
            continue;
        }
        let Some(stored) = previous.entries.get(&record.id) else {
            debug!(
                repository = %record.repository,
                number = record.number,
                "no stored state for known pull request; skipping diff"
            );
            continue;
        };
        let reference = PrRef::from_record(record);
        events.extend(
            changes(record, stored)
                .into_iter()
                .filter(|kind| policy.allows(kind.category()))
                .map(|kind| NotificationEvent::new(reference.clone(), kind)),
        );
    }

    let current_ids: HashSet<u64> = records.iter().map(|record| record.id).collect();
    for (id, stored) in &previous.entries {
        if current_ids.contains(id) {
            continue;
        }
        let Some(repository) = stored.repository.as_deref() else {
            continue;
        };
        if carried_repositories.contains(repository) {
            continue;
        }
        let closed = EventKind::Status(StatusChange::Closed);
        if !policies.allows(repository, closed.category()) {
            continue;
        }
        if let Some(reference) = stored.pr_ref(*id) {
            events.push(NotificationEvent::new(reference, closed));
        }
    }

    Reconciliation {
        events,
        next: next_state(records, previous, carried_repositories),
    }
}

/// Field-by-field transitions of a known pull request, in emission order.
fn changes(record: &PullRequestRecord, stored: &PersistedPrState) -> Vec<EventKind> {
    let mut kinds = Vec::new();

    if record.comment_count > stored.comment_count {
        kinds.push(EventKind::Comment {
            count: record.comment_count - stored.comment_count,
        });
    }

    if let Some(previous_review) = stored.review_state
        && previous_review != record.review_state
        && matches!(
            record.review_state,
            ReviewState::Approved | ReviewState::ChangesRequested
        )
    {
        kinds.push(EventKind::Review(record.review_state));
    }

    if record.ci_status == CiStatus::Failure && stored.ci_status != Some(CiStatus::Failure) {
        kinds.push(EventKind::CiFailure);
    }

    if record.ci_status == CiStatus::Success
        && stored
            .ci_status
            .is_some_and(|previous_ci| previous_ci != CiStatus::Success)
    {
        kinds.push(EventKind::CiSuccess);
    }

    if record.is_ready_to_merge() && stored.ci_status.is_some() && !stored.was_ready_to_merge() {
        kinds.push(EventKind::ReadyToMerge);
    }

    match (stored.is_draft, record.is_draft) {
        (Some(true), false) => kinds.push(EventKind::Status(StatusChange::Ready)),
        (Some(false), true) => kinds.push(EventKind::Status(StatusChange::Draft)),
        _ => {}
    }

    kinds
}

/// Fresh entries for every current record plus the untouched entries of
/// carried repositories; the seen set only grows.
fn next_state(
    records: &[PullRequestRecord],
    previous: &SnapshotState,
    carried_repositories: &BTreeSet<String>,
) -> SnapshotState {
    let mut next = SnapshotState {
        seen: previous.seen.clone(),
        entries: previous
            .entries
            .iter()
            .filter(|(_, stored)| {
                stored
                    .repository
                    .as_deref()
                    .is_some_and(|repository| carried_repositories.contains(repository))
            })
            .map(|(id, stored)| (*id, stored.clone()))
            .collect(),
    };

    for record in records {
        next.seen.insert(record.id);
        next.entries
            .insert(record.id, PersistedPrState::from_record(record));
    }

    next
}

#[cfg(test)]
#[path = "reconcile_tests.rs"]
mod tests;
