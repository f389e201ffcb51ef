//! Read-only GitHub access for the poller.
//!
//! This module wraps Octocrab to search for open pull requests, load their
//! detail resources, and read the review and CI signals attached to them.
//! Errors are mapped into [`FetchError`] so that callers can classify
//! failures without exposing Octocrab internals.

pub mod error;
pub mod gateway;
pub mod locator;
pub mod models;
pub mod search;

pub use error::FetchError;
pub use gateway::{GatewayConnector, OctocrabConnector, OctocrabGateway, PullRequestGateway};
pub use locator::{ApiBase, DEFAULT_API_BASE, PersonalAccessToken, RepositoryFullName};
pub use models::{
    CheckRun, CheckRunConclusion, CheckRunStatus, CombinedStatus, CommitState, MergeableState,
    PullRequestDetail, Review, ReviewSubmission, SearchItem,
};
pub use search::{PullRequestRole, SearchQuery};

#[cfg(test)]
pub use gateway::MockPullRequestGateway;
