//! Poll-and-reconcile engine.
//!
//! Each cycle fetches the open pull requests the user is involved in,
//! enriches them with detail and activity signals, diffs them against the
//! persisted snapshot, and turns the differences into one batched
//! notification plus a badge count. The [`Poller`] owns the cycle lock and
//! the in-process state; [`run_until`] drives it from a timer and a command
//! channel.

pub mod activity;
pub mod badge;
pub mod batch;
pub mod commands;
pub mod cycle;
pub mod error;
pub mod events;
pub mod fetcher;
pub mod policy;
pub mod reconcile;
pub mod record;
pub mod scheduler;
pub mod state;

#[cfg(test)]
pub(crate) mod test_support;

pub use activity::ActivityEnricher;
pub use badge::{Badge, DisplayFilter, project};
pub use batch::{BatchPlan, RetainedSummary, Suppression, compose, plan};
pub use commands::{ClickAction, Command, CommandOutcome, SnapshotView, dispatch};
pub use cycle::{
    Collaborators, CycleReport, CycleSummary, Delivery, MissingConfiguration, Poller,
    RepositoryFailure,
};
pub use error::PollError;
pub use events::{EventKind, NotificationEvent, PrRef, StatusChange};
pub use fetcher::{DetailEnricher, RepositoryFetcher};
pub use policy::{EventCategory, PolicySet, RepoNotificationPolicy};
pub use reconcile::{ReconcileInput, Reconciliation, reconcile};
pub use record::{CiStatus, PullRequestRecord, ReviewState, RoleFlags};
pub use scheduler::{CommandResult, Request, request, run_until};
