//! Wires the poller to its collaborators and runs it.

use std::io::{self, Write};
use std::sync::Arc;

use ortho_config::OrthoConfig;
use prwatch::notify::{LogBadgeSink, LogNotificationTransport};
use prwatch::persistence::migrate_database;
use prwatch::poller::compose;
use prwatch::telemetry::{StderrJsonlTelemetrySink, TelemetrySink};
use prwatch::{
    Collaborators, Command, CycleReport, MemorySnapshotStore, OctocrabConnector, PollError,
    Poller, Request, SnapshotStore, SqliteSnapshotStore, WatchConfig, dispatch, run_until,
};
use tokio::sync::mpsc;
use tracing::{info, warn};

const COMMAND_BUFFER: usize = 8;

/// Runs one cycle with `--once`, otherwise polls until interrupted.
///
/// # Errors
///
/// Returns [`PollError`] when the configuration is invalid, the snapshot
/// store cannot be opened, or a `--once` cycle fails.
pub async fn run(config: &WatchConfig) -> Result<(), PollError> {
    let settings = config.settings()?;
    let telemetry: Arc<dyn TelemetrySink> = Arc::new(StderrJsonlTelemetrySink);
    let store = open_store(config, telemetry.as_ref())?;
    let poller = Poller::new(
        settings,
        Collaborators {
            connector: Arc::new(OctocrabConnector),
            store,
            transport: Arc::new(LogNotificationTransport),
            badge: Arc::new(LogBadgeSink),
            telemetry,
        },
    );

    if let Some(filter) = config.display_filter()? {
        dispatch(&poller, Command::SetDisplayFilter(filter)).await?;
    }

    if config.once {
        let report = poller.run_cycle().await?;
        return write_report(&report);
    }

    let (sender, receiver) = mpsc::channel(COMMAND_BUFFER);
    let reload = tokio::spawn(reload_on_hangup(sender));
    run_until(&poller, receiver, shutdown_signal()).await;
    reload.abort();
    Ok(())
}

/// Opens the `SQLite` snapshot, migrating it first, or falls back to memory.
fn open_store(
    config: &WatchConfig,
    telemetry: &dyn TelemetrySink,
) -> Result<Arc<dyn SnapshotStore>, PollError> {
    let Some(database_url) = config.database_url.as_deref() else {
        info!("no database configured; the snapshot lives in memory");
        return Ok(Arc::new(MemorySnapshotStore::new()));
    };
    migrate_database(database_url, telemetry)?;
    Ok(Arc::new(SqliteSnapshotStore::new(database_url)?))
}

/// Lines printed after a `--once` cycle.
///
/// A single run is always the process's first cycle, so delivery is
/// suppressed; the composed message is printed instead so the changes
/// since the stored snapshot stay visible.
fn report_lines(report: &CycleReport) -> Vec<String> {
    match report {
        CycleReport::Published(summary) => {
            let headline = format!(
                "{} open pull requests, {} changes, badge `{}`",
                summary.pr_count,
                summary.events.len(),
                summary.badge
            );
            let message = compose(&summary.events)
                .map(|notification| format!("{}: {}", notification.title, notification.body));
            std::iter::once(headline).chain(message).collect()
        }
        CycleReport::Skipped(reason) => vec![format!("cycle skipped: {reason}")],
    }
}

fn write_report(report: &CycleReport) -> Result<(), PollError> {
    let mut stdout = io::stdout().lock();
    for line in report_lines(report) {
        writeln!(stdout, "{line}").map_err(|error| PollError::Io {
            message: error.to_string(),
        })?;
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        warn!(%error, "cannot listen for Ctrl-C; stopping");
    }
}

/// Reloads configuration on SIGHUP and hands the new settings to the
/// poller.
#[cfg(unix)]
async fn reload_on_hangup(sender: mpsc::Sender<Request>) {
    use prwatch::request;
    use tokio::signal::unix::{SignalKind, signal};

    let mut hangups = match signal(SignalKind::hangup()) {
        Ok(stream) => stream,
        Err(error) => {
            warn!(%error, "cannot listen for SIGHUP; configuration reload disabled");
            return;
        }
    };
    while hangups.recv().await.is_some() {
        let reloaded = WatchConfig::load()
            .map_err(|error| PollError::Configuration {
                message: error.to_string(),
            })
            .and_then(|config| config.settings());
        match reloaded {
            Ok(settings) => match request(&sender, Command::SettingsChanged(settings)).await {
                Ok(outcome) => info!(?outcome, "configuration reloaded"),
                Err(PollError::Stopped) => return,
                Err(error) => warn!(%error, "configuration reload was rejected"),
            },
            Err(error) => warn!(%error, "configuration reload failed; keeping current settings"),
        }
    }
}

#[cfg(not(unix))]
async fn reload_on_hangup(sender: mpsc::Sender<Request>) {
    sender.closed().await;
}
