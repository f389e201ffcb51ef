//! Inbound commands and their single dispatch point.

use std::time::Duration;

use tracing::{debug, info};

use crate::config::WatchSettings;
use crate::persistence::BlobWrite;

use super::badge::{Badge, DisplayFilter, project};
use super::cycle::{CycleReport, Poller};
use super::error::PollError;
use super::record::PullRequestRecord;
use super::state::{encode_json, keys, load_json, tolerate_malformed};

/// A request from the presentation side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run a poll cycle now.
    RefreshNow,
    /// Read the last published snapshot.
    GetCurrentSnapshot,
    /// Adopt new settings and restart the schedule.
    SettingsChanged(WatchSettings),
    /// Persist a display filter and recompute the badge.
    SetDisplayFilter(DisplayFilter),
    /// The user clicked the last notification.
    NotificationClicked,
}

/// The last published snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotView {
    /// Published pull requests, newest update first.
    pub prs: Vec<PullRequestRecord>,
    /// Epoch milliseconds of the last finished cycle.
    pub last_updated: Option<i64>,
    /// Failure text of the last cycle, if it failed or dropped repositories.
    pub error: Option<String>,
}

/// Where a notification click leads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickAction {
    /// Open the single affected pull request.
    OpenPullRequest(String),
    /// Open the pull request list.
    OpenSummary,
    /// Nothing was retained to act on.
    Ignored,
}

/// Result of a dispatched command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// A cycle ran or was joined.
    Refreshed(CycleReport),
    /// The persisted snapshot.
    Snapshot(SnapshotView),
    /// Settings were replaced; the schedule restarts at this interval.
    Rescheduled {
        /// New time between cycles.
        interval: Duration,
    },
    /// The badge was recomputed.
    BadgeUpdated(Badge),
    /// A click was resolved.
    ClickResolved(ClickAction),
}

/// Executes `command` against `poller`.
///
/// # Errors
///
/// Returns [`PollError`] when a refresh fails or the store cannot be read
/// or written.
pub async fn dispatch(poller: &Poller, command: Command) -> Result<CommandOutcome, PollError> {
    match command {
        Command::RefreshNow => poller.run_cycle().await.map(CommandOutcome::Refreshed),
        Command::GetCurrentSnapshot => current_snapshot(poller).map(CommandOutcome::Snapshot),
        Command::SettingsChanged(settings) => {
            let interval = settings.poll_interval;
            poller.replace_settings(settings).await;
            info!(interval_secs = interval.as_secs(), "settings replaced");
            Ok(CommandOutcome::Rescheduled { interval })
        }
        Command::SetDisplayFilter(filter) => {
            set_display_filter(poller, filter).map(CommandOutcome::BadgeUpdated)
        }
        Command::NotificationClicked => notification_clicked(poller)
            .await
            .map(CommandOutcome::ClickResolved),
    }
}

fn current_snapshot(poller: &Poller) -> Result<SnapshotView, PollError> {
    let store = poller.store();
    let prs = tolerate_malformed(load_json::<Vec<PullRequestRecord>>(store, keys::PRS))?;
    let last_updated = tolerate_malformed(load_json::<i64>(store, keys::LAST_UPDATED))?;
    let error = tolerate_malformed(load_json::<Option<String>>(store, keys::ERROR))?;
    Ok(SnapshotView {
        prs: prs.unwrap_or_default(),
        last_updated,
        error: error.flatten(),
    })
}

fn set_display_filter(poller: &Poller, filter: DisplayFilter) -> Result<Badge, PollError> {
    let store = poller.store();
    store.commit(&[encode_json(keys::PR_FILTER, &filter)?])?;
    let prs = tolerate_malformed(load_json::<Vec<PullRequestRecord>>(store, keys::PRS))?
        .unwrap_or_default();
    let badge = project(&prs, filter);
    poller.badge_sink().publish(badge);
    debug!(%filter, %badge, "display filter applied");
    Ok(badge)
}

async fn notification_clicked(poller: &Poller) -> Result<ClickAction, PollError> {
    let retained = poller.state().lock().await.retained.take();
    let Some(summary) = retained else {
        return Ok(ClickAction::Ignored);
    };
    let Some(single) = summary.single_pr() else {
        return Ok(ClickAction::OpenSummary);
    };
    poller
        .store()
        .commit(&[BlobWrite::remove(keys::HIGHLIGHTED_PRS)])?;
    Ok(ClickAction::OpenPullRequest(single.url.clone()))
}

#[cfg(test)]
#[path = "commands_tests.rs"]
mod tests;
