//! prwatch library crate: a GitHub pull request poller.
//!
//! The library finds the open pull requests a user is asked to review, is
//! assigned to, or authored across a set of repositories. It enriches them
//! with review and CI signals, diffs each cycle against a persisted snapshot,
//! and reports the differences as one batched notification and a badge
//! count.

pub mod config;
pub mod github;
pub mod notify;
pub mod persistence;
pub mod poller;
pub mod telemetry;

pub use config::{WatchConfig, WatchSettings, WatchedRepository, load_watchlist};
pub use github::{
    ApiBase, FetchError, GatewayConnector, OctocrabConnector, OctocrabGateway,
    PersonalAccessToken, PullRequestGateway, RepositoryFullName,
};
pub use notify::{BadgeSink, Notification, NotificationTransport};
pub use persistence::{MemorySnapshotStore, SnapshotStore, SqliteSnapshotStore};
pub use poller::{
    Badge, ClickAction, Collaborators, Command, CommandOutcome, CycleReport, CycleSummary,
    DisplayFilter, PollError, Poller, PullRequestRecord, Request, SnapshotView, dispatch, request,
    run_until,
};
