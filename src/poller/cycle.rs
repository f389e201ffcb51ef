//! Poll-cycle orchestration.
//!
//! A cycle reads the snapshot, fetches every repository concurrently,
//! reconciles, and then replaces the snapshot in one atomic commit before
//! any notification leaves the process. Cycles never overlap: callers
//! funnel through [`Poller::run_cycle`], and a caller that arrives while a
//! cycle is running receives that cycle's outcome.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use chrono::Utc;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::config::{WatchSettings, WatchedRepository};
use crate::github::{GatewayConnector, PersonalAccessToken, PullRequestGateway};
use crate::notify::{BadgeSink, NotificationTransport};
use crate::persistence::{PersistenceError, SnapshotStore};
use crate::telemetry::{TelemetryEvent, TelemetrySink};

use super::badge::{Badge, DisplayFilter, project};
use super::batch::{BatchContext, BatchPlan, Suppression, plan};
use super::error::PollError;
use super::events::NotificationEvent;
use super::fetcher::RepositoryFetcher;
use super::reconcile::{ReconcileInput, reconcile};
use super::record::{PullRequestRecord, sort_by_recent_update};
use super::state::{PollerState, SnapshotState, encode_json, keys, load_json, tolerate_malformed};

/// Which required setting is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingConfiguration {
    /// No personal access token.
    MissingToken,
    /// No username to query for.
    MissingUsername,
    /// No repository is watched.
    NoRepositories,
}

impl fmt::Display for MissingConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::MissingToken => "no GitHub token configured",
            Self::MissingUsername => "no username configured",
            Self::NoRepositories => "no repositories configured",
        })
    }
}

/// A repository whose contribution was dropped this cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryFailure {
    /// Repository full name.
    pub repository: String,
    /// Failure text.
    pub message: String,
}

/// What happened to the batched notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// No events were produced.
    NoEvents,
    /// Events were produced but not delivered.
    Suppressed(Suppression),
    /// The transport accepted the notification.
    Delivered,
    /// The transport rejected the notification.
    Failed(String),
}

/// Result of a cycle that published a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleSummary {
    /// Pull requests in the published list, carried ones included.
    pub pr_count: usize,
    /// Events in generation order.
    pub events: Vec<NotificationEvent>,
    /// Repositories dropped from this cycle.
    pub failed_repositories: Vec<RepositoryFailure>,
    /// Notification outcome.
    pub delivery: Delivery,
    /// Badge published at the end of the cycle.
    pub badge: Badge,
}

/// Outcome of a cycle that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleReport {
    /// A snapshot was published.
    Published(CycleSummary),
    /// The cycle did not run.
    Skipped(MissingConfiguration),
}

/// Everything the poller talks to.
#[derive(Clone)]
pub struct Collaborators {
    /// Builds the API gateway for each cycle's credentials.
    pub connector: Arc<dyn GatewayConnector>,
    /// Durable blob storage.
    pub store: Arc<dyn SnapshotStore>,
    /// Notification delivery.
    pub transport: Arc<dyn NotificationTransport>,
    /// Badge output.
    pub badge: Arc<dyn BadgeSink>,
    /// Structured telemetry.
    pub telemetry: Arc<dyn TelemetrySink>,
}

/// Long-lived poller owning the settings and the in-process state.
pub struct Poller {
    collaborators: Collaborators,
    settings: RwLock<WatchSettings>,
    state: Mutex<PollerState>,
    finished_cycles: AtomicU64,
}

impl Poller {
    /// Creates a poller that has not run any cycle yet.
    #[must_use]
    pub fn new(settings: WatchSettings, collaborators: Collaborators) -> Self {
        Self {
            collaborators,
            settings: RwLock::new(settings),
            state: Mutex::new(PollerState::default()),
            finished_cycles: AtomicU64::new(0),
        }
    }

    /// Copy of the settings in force.
    pub async fn settings(&self) -> WatchSettings {
        self.settings.read().await.clone()
    }

    /// Replaces the settings used by subsequent cycles.
    pub async fn replace_settings(&self, settings: WatchSettings) {
        *self.settings.write().await = settings;
    }

    pub(crate) fn store(&self) -> &dyn SnapshotStore {
        self.collaborators.store.as_ref()
    }

    pub(crate) fn badge_sink(&self) -> &dyn BadgeSink {
        self.collaborators.badge.as_ref()
    }

    pub(crate) const fn state(&self) -> &Mutex<PollerState> {
        &self.state
    }

    /// Runs one poll cycle, or waits for the one in flight.
    ///
    /// # Errors
    ///
    /// Returns [`PollError::Transport`] when every repository failed, and
    /// [`PollError::Persistence`] when the snapshot cannot be read or
    /// committed. In both cases the previous pull request list stays
    /// published and the badge shows the error sentinel.
    pub async fn run_cycle(&self) -> Result<CycleReport, PollError> {
        let observed = self.finished_cycles.load(Ordering::Acquire);
        let mut state = self.state.lock().await;

        if self.finished_cycles.load(Ordering::Acquire) != observed
            && let Some(outcome) = state.last_outcome.clone()
        {
            debug!("joined the outcome of an in-flight poll cycle");
            return outcome;
        }

        let outcome = self.execute(&mut state).await;
        state.last_outcome = Some(outcome.clone());
        self.finished_cycles.fetch_add(1, Ordering::AcqRel);
        outcome
    }

    async fn execute(&self, state: &mut PollerState) -> Result<CycleReport, PollError> {
        let started = Instant::now();
        let settings = self.settings().await;

        let (token, username) = match required_settings(&settings) {
            Ok(required) => required,
            Err(reason) => {
                info!(%reason, "skipping poll cycle");
                self.collaborators.badge.publish(Badge::Unconfigured);
                return Ok(CycleReport::Skipped(reason));
            }
        };

        match self.poll(&settings, &token, &username, state, started).await {
            Ok(summary) => Ok(CycleReport::Published(summary)),
            Err(error) => {
                self.record_failure(&error);
                Err(error)
            }
        }
    }

    async fn poll(
        &self,
        settings: &WatchSettings,
        token: &PersonalAccessToken,
        username: &str,
        state: &mut PollerState,
        started: Instant,
    ) -> Result<CycleSummary, PollError> {
        let gateway = self
            .collaborators
            .connector
            .connect(token, &settings.api_base)?;

        let mut batches = Vec::new();
        let mut failures = Vec::new();
        for (repository, result) in fetch_all(
            gateway,
            &settings.repositories,
            username,
            settings.include_authored,
        )
        .await
        {
            match result {
                Ok(records) => batches.push(records),
                Err(message) => {
                    warn!(%repository, %message, "repository fetch failed; keeping its previous state");
                    failures.push(RepositoryFailure {
                        repository,
                        message,
                    });
                }
            }
        }
        if batches.is_empty()
            && let Some(first) = failures.first()
        {
            return Err(PollError::Transport {
                message: first.message.clone(),
            });
        }

        let store = self.store();
        let previous = SnapshotState::load(store)?;
        let carried: BTreeSet<String> = failures
            .iter()
            .map(|failure| failure.repository.clone())
            .collect();

        let mut fresh = merge_records(batches);
        sort_by_recent_update(&mut fresh);
        let policies = settings.policies();
        let reconciliation = reconcile(ReconcileInput {
            records: &fresh,
            previous: &previous,
            policies: &policies,
            carried_repositories: &carried,
        });
        let batch_plan = plan(
            &reconciliation.events,
            BatchContext {
                completed_cycles: state.completed_cycles,
                notifications_enabled: settings.notifications_enabled,
                previously_seen: previous.seen.len(),
            },
        );

        let mut published = fresh;
        if !carried.is_empty() {
            published.extend(carried_records(store, &carried)?);
            sort_by_recent_update(&mut published);
        }

        let mut writes = reconciliation.next.to_writes()?;
        writes.push(encode_json(keys::PRS, &published)?);
        writes.push(encode_json(keys::LAST_UPDATED, &now_millis())?);
        writes.push(encode_json(keys::ERROR, &partial_failure_text(&failures))?);
        if let BatchPlan::Deliver(batch) = &batch_plan {
            writes.push(encode_json(keys::HIGHLIGHTED_PRS, &batch.highlights)?);
        }
        store.commit(&writes)?;

        let delivery = self.deliver(batch_plan, state).await;
        let badge = project(&published, load_display_filter(store)?);
        self.collaborators.badge.publish(badge);
        state.completed_cycles = state.completed_cycles.saturating_add(1);

        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        self.collaborators
            .telemetry
            .record(TelemetryEvent::PollCycleCompleted {
                pr_count: saturating_u64(published.len()),
                event_count: saturating_u64(reconciliation.events.len()),
                failed_repositories: saturating_u64(failures.len()),
                duration_ms,
            });
        info!(
            pr_count = published.len(),
            event_count = reconciliation.events.len(),
            failed_repositories = failures.len(),
            duration_ms,
            "poll cycle completed"
        );

        Ok(CycleSummary {
            pr_count: published.len(),
            events: reconciliation.events,
            failed_repositories: failures,
            delivery,
            badge,
        })
    }

    async fn deliver(&self, batch_plan: BatchPlan, state: &mut PollerState) -> Delivery {
        match batch_plan {
            BatchPlan::Nothing => Delivery::NoEvents,
            BatchPlan::Suppressed(reason) => {
                debug!(reason = reason.as_str(), "notification suppressed");
                Delivery::Suppressed(reason)
            }
            BatchPlan::Deliver(batch) => {
                state.retained = Some(batch.retained);
                match self
                    .collaborators
                    .transport
                    .deliver(&batch.notification)
                    .await
                {
                    Ok(()) => Delivery::Delivered,
                    Err(error) => {
                        warn!(%error, "notification transport failed");
                        Delivery::Failed(error.message)
                    }
                }
            }
        }
    }

    fn record_failure(&self, error: &PollError) {
        let message = error.to_string();
        warn!(%error, "poll cycle failed; previous pull request list kept");

        let committed = [
            encode_json(keys::ERROR, &message),
            encode_json(keys::LAST_UPDATED, &now_millis()),
        ]
        .into_iter()
        .collect::<Result<Vec<_>, PersistenceError>>()
        .and_then(|writes| self.store().commit(&writes));
        if let Err(persist_error) = committed {
            warn!(error = %persist_error, "failed to record poll cycle failure");
        }

        self.collaborators.badge.publish(Badge::Error);
        self.collaborators
            .telemetry
            .record(TelemetryEvent::PollCycleFailed { message });
    }
}

fn required_settings(
    settings: &WatchSettings,
) -> Result<(PersonalAccessToken, String), MissingConfiguration> {
    let token = settings
        .token
        .clone()
        .ok_or(MissingConfiguration::MissingToken)?;
    let username = settings
        .username
        .clone()
        .ok_or(MissingConfiguration::MissingUsername)?;
    if settings.repositories.is_empty() {
        return Err(MissingConfiguration::NoRepositories);
    }
    Ok((token, username))
}

type RepositoryOutcome = (String, Result<Vec<PullRequestRecord>, String>);

/// Fetches every repository on its own task; outcomes keep configuration
/// order.
async fn fetch_all(
    gateway: Arc<dyn PullRequestGateway>,
    repositories: &[WatchedRepository],
    username: &str,
    include_authored: bool,
) -> Vec<RepositoryOutcome> {
    let mut tasks = JoinSet::new();
    for (index, watched) in repositories.iter().enumerate() {
        let task_gateway = Arc::clone(&gateway);
        let repository = watched.full_name.clone();
        let login = username.to_owned();
        tasks.spawn(async move {
            let result = RepositoryFetcher::new(task_gateway.as_ref())
                .fetch(&repository, &login, include_authored)
                .await
                .map_err(|error| error.to_string());
            (index, result)
        });
    }

    let mut slots: Vec<Option<Result<Vec<PullRequestRecord>, String>>> =
        vec![None; repositories.len()];
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, result)) => {
                if let Some(slot) = slots.get_mut(index) {
                    *slot = Some(result);
                }
            }
            Err(error) => warn!(%error, "repository fetch task did not finish"),
        }
    }

    repositories
        .iter()
        .zip(slots)
        .map(|(watched, slot)| {
            (
                watched.full_name.as_str().to_owned(),
                slot.unwrap_or_else(|| Err("repository fetch task did not finish".to_owned())),
            )
        })
        .collect()
}

/// Flattens per-repository records, unioning roles of repeated ids.
fn merge_records(batches: Vec<Vec<PullRequestRecord>>) -> Vec<PullRequestRecord> {
    let mut merged: Vec<PullRequestRecord> = Vec::new();
    let mut positions: HashMap<u64, usize> = HashMap::new();
    for record in batches.into_iter().flatten() {
        if let Some(existing) = positions
            .get(&record.id)
            .and_then(|position| merged.get_mut(*position))
        {
            existing.roles = existing.roles.union(record.roles);
            continue;
        }
        positions.insert(record.id, merged.len());
        merged.push(record);
    }
    merged
}

/// Previously published records of repositories that failed this cycle.
fn carried_records(
    store: &dyn SnapshotStore,
    carried: &BTreeSet<String>,
) -> Result<Vec<PullRequestRecord>, PersistenceError> {
    let previous =
        tolerate_malformed(load_json::<Vec<PullRequestRecord>>(store, keys::PRS))?.unwrap_or_default();
    Ok(previous
        .into_iter()
        .filter(|record| carried.contains(&record.repository))
        .collect())
}

pub(crate) fn load_display_filter(
    store: &dyn SnapshotStore,
) -> Result<DisplayFilter, PersistenceError> {
    Ok(tolerate_malformed(load_json::<DisplayFilter>(store, keys::PR_FILTER))?.unwrap_or_default())
}

fn partial_failure_text(failures: &[RepositoryFailure]) -> Option<String> {
    if failures.is_empty() {
        return None;
    }
    Some(
        failures
            .iter()
            .map(|failure| format!("{}: {}", failure.repository, failure.message))
            .collect::<Vec<_>>()
            .join("; "),
    )
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

fn saturating_u64(value: usize) -> u64 {
    u64::try_from(value).unwrap_or(u64::MAX)
}

#[cfg(test)]
#[path = "cycle_tests.rs"]
mod tests;
