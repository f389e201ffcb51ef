//! Timer-driven loop that feeds the poller.

use std::future::Future;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::{Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::commands::{Command, CommandOutcome, dispatch};
use super::cycle::Poller;
use super::error::PollError;

/// Outcome of one queued command.
pub type CommandResult = Result<CommandOutcome, PollError>;

/// A command queued for [`run_until`] with the channel its outcome goes to.
#[derive(Debug)]
pub struct Request {
    /// The command to dispatch.
    pub command: Command,
    /// Receives the outcome once the command has been handled.
    pub reply: oneshot::Sender<CommandResult>,
}

impl Request {
    /// Pairs `command` with a fresh reply channel.
    #[must_use]
    pub fn new(command: Command) -> (Self, oneshot::Receiver<CommandResult>) {
        let (reply, outcome) = oneshot::channel();
        (Self { command, reply }, outcome)
    }
}

/// Queues `command` on `requests` and waits for its outcome.
///
/// # Errors
///
/// Returns the command's own [`PollError`], or [`PollError::Stopped`] when
/// the scheduler has exited before handling it.
pub async fn request(requests: &mpsc::Sender<Request>, command: Command) -> CommandResult {
    let (queued, outcome) = Request::new(command);
    requests.send(queued).await.map_err(|_| PollError::Stopped)?;
    outcome.await.map_err(|_| PollError::Stopped)?
}

/// Runs cycles on the configured interval and answers `requests` until
/// `shutdown` resolves.
///
/// The first cycle starts immediately. A settings change restarts the
/// schedule, which also starts a cycle immediately. Cycle failures are
/// already recorded by the poller and do not stop the loop.
pub async fn run_until<F>(poller: &Poller, mut requests: mpsc::Receiver<Request>, shutdown: F)
where
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let mut ticker = schedule(poller.settings().await.poll_interval);

    loop {
        tokio::select! {
            () = &mut shutdown => {
                info!("poller shutting down");
                return;
            }
            _ = ticker.tick() => {
                if let Err(error) = poller.run_cycle().await {
                    debug!(%error, "scheduled cycle failed");
                }
            }
            Some(Request { command, reply }) = requests.recv() => {
                let outcome = dispatch(poller, command).await;
                match &outcome {
                    Ok(CommandOutcome::Rescheduled { interval }) => ticker = schedule(*interval),
                    Ok(handled) => debug!(?handled, "command handled"),
                    Err(error) => warn!(%error, "command failed"),
                }
                if reply.send(outcome).is_err() {
                    debug!("command sender stopped waiting for the outcome");
                }
            }
        }
    }
}

fn schedule(period: Duration) -> Interval {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}
