//! Folding a cycle's events into one notification.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::notify::Notification;

use super::events::{EventKind, NotificationEvent, PrRef, StatusChange};
use super::record::ReviewState;

/// Why a non-empty batch was not delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Suppression {
    /// No cycle has completed since the process started.
    FirstCycle,
    /// Notifications are switched off globally.
    NotificationsDisabled,
    /// No pull request was known before this cycle.
    ColdStart,
}

impl Suppression {
    /// Short reason for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FirstCycle => "first cycle since start",
            Self::NotificationsDisabled => "notifications disabled",
            Self::ColdStart => "no previously known pull requests",
        }
    }
}

/// Facts the suppression rule depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchContext {
    /// Cycles that completed since the process started.
    pub completed_cycles: u64,
    /// Global notification switch.
    pub notifications_enabled: bool,
    /// Size of the seen set before this cycle.
    pub previously_seen: usize,
}

impl BatchContext {
    const fn suppression(self) -> Option<Suppression> {
        if self.completed_cycles == 0 {
            Some(Suppression::FirstCycle)
        } else if !self.notifications_enabled {
            Some(Suppression::NotificationsDisabled)
        } else if self.previously_seen == 0 {
            Some(Suppression::ColdStart)
        } else {
            None
        }
    }
}

/// Event type names per pull request id, persisted for highlight markers.
pub type HighlightMap = BTreeMap<u64, Vec<String>>;

/// What a notification click resolves against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetainedSummary {
    /// Distinct affected pull requests in first-event order.
    pub affected: Vec<PrRef>,
    /// Number of events in the batch.
    pub event_count: usize,
}

impl RetainedSummary {
    /// The affected pull request when there is exactly one.
    #[must_use]
    pub fn single_pr(&self) -> Option<&PrRef> {
        match self.affected.as_slice() {
            [only] => Some(only),
            _ => None,
        }
    }
}

/// A batch ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    /// The message to hand to the transport.
    pub notification: Notification,
    /// Highlight markers to persist with the snapshot.
    pub highlights: HighlightMap,
    /// Summary kept for click resolution.
    pub retained: RetainedSummary,
}

/// Decision for one cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchPlan {
    /// The cycle produced no events.
    Nothing,
    /// Events exist but delivery is suppressed.
    Suppressed(Suppression),
    /// Deliver this batch.
    Deliver(Batch),
}

/// Applies the suppression rule and builds the batch.
#[must_use]
pub fn plan(events: &[NotificationEvent], context: BatchContext) -> BatchPlan {
    if events.is_empty() {
        return BatchPlan::Nothing;
    }
    if let Some(reason) = context.suppression() {
        return BatchPlan::Suppressed(reason);
    }
    let Some(notification) = compose(events) else {
        return BatchPlan::Nothing;
    };

    BatchPlan::Deliver(Batch {
        notification,
        highlights: highlights(events),
        retained: RetainedSummary {
            affected: affected_pull_requests(events),
            event_count: events.len(),
        },
    })
}

/// Builds the message for `events` without applying suppression.
///
/// One affected pull request gets a detailed body keyed off its first
/// event; several get a per-category summary.
#[must_use]
pub fn compose(events: &[NotificationEvent]) -> Option<Notification> {
    let first = events.first()?;
    let affected = affected_pull_requests(events);
    let notification = match affected.as_slice() {
        [only] => Notification::tagged(
            format!("{}#{}", only.repository, only.number),
            detail_body(first),
        ),
        _ => Notification::tagged(
            plural(events.len(), "PR update", "PR updates"),
            summary_body(events),
        ),
    };
    Some(notification)
}

fn affected_pull_requests(events: &[NotificationEvent]) -> Vec<PrRef> {
    let mut seen = HashSet::new();
    events
        .iter()
        .filter(|event| seen.insert(event.pr.id))
        .map(|event| event.pr.clone())
        .collect()
}

fn highlights(events: &[NotificationEvent]) -> HighlightMap {
    let mut map = HighlightMap::new();
    for event in events {
        map.entry(event.pr.id)
            .or_default()
            .push(event.kind.type_name().to_owned());
    }
    map
}

/// Body for a single affected pull request, keyed off its first event.
fn detail_body(event: &NotificationEvent) -> String {
    let title = &event.pr.title;
    match event.kind {
        EventKind::NewPr => format!(
            "New PR by @{}: {title}",
            event.pr.author.as_deref().unwrap_or("unknown")
        ),
        EventKind::Comment { count } => format!(
            "{} on \"{title}\"",
            plural_u64(count, "new comment", "new comments")
        ),
        EventKind::Review(ReviewState::Approved) => format!("✓ PR approved: {title}"),
        EventKind::Review(_) => format!("⚠ Changes requested: {title}"),
        EventKind::CiFailure => format!("✗ CI failed: {title}"),
        EventKind::CiSuccess => format!("✓ CI passed: {title}"),
        EventKind::ReadyToMerge => format!("🚀 Ready to merge: {title}"),
        EventKind::Status(StatusChange::Ready) => format!("▶ Ready for review: {title}"),
        EventKind::Status(StatusChange::Draft) => format!("◼ Converted to draft: {title}"),
        EventKind::Status(StatusChange::Closed) => format!("✓ Closed/Merged: {title}"),
    }
}

#[derive(Debug, Default)]
struct Tally {
    new_prs: usize,
    comments: u64,
    reviews: usize,
    ci_failures: usize,
    ci_passed: usize,
    ready: usize,
    status: usize,
}

/// Per-category counts joined with a bullet, zero categories omitted.
fn summary_body(events: &[NotificationEvent]) -> String {
    let mut tally = Tally::default();
    for event in events {
        match event.kind {
            EventKind::NewPr => tally.new_prs += 1,
            EventKind::Comment { count } => tally.comments = tally.comments.saturating_add(count),
            EventKind::Review(_) => tally.reviews += 1,
            EventKind::CiFailure => tally.ci_failures += 1,
            EventKind::CiSuccess => tally.ci_passed += 1,
            EventKind::ReadyToMerge => tally.ready += 1,
            EventKind::Status(_) => tally.status += 1,
        }
    }

    let parts = [
        (tally.new_prs > 0).then(|| plural(tally.new_prs, "new PR", "new PRs")),
        (tally.comments > 0).then(|| plural_u64(tally.comments, "comment", "comments")),
        (tally.reviews > 0).then(|| plural(tally.reviews, "review", "reviews")),
        (tally.ci_failures > 0).then(|| plural(tally.ci_failures, "CI failure", "CI failures")),
        (tally.ci_passed > 0).then(|| format!("{} CI passed", tally.ci_passed)),
        (tally.ready > 0).then(|| format!("{} ready to merge", tally.ready)),
        (tally.status > 0).then(|| plural(tally.status, "status change", "status changes")),
    ];
    parts.into_iter().flatten().collect::<Vec<_>>().join(" • ")
}

fn plural(count: usize, one: &str, many: &str) -> String {
    format!("{count} {}", if count == 1 { one } else { many })
}

fn plural_u64(count: u64, one: &str, many: &str) -> String {
    format!("{count} {}", if count == 1 { one } else { many })
}

#[cfg(test)]
#[path = "batch_tests.rs"]
mod tests;
