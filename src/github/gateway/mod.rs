//! Gateways for reading pull request data through Octocrab.
//!
//! The trait-based design enables mocking in tests while the Octocrab
//! implementation handles real HTTP requests. Every call is a read-only GET.

mod client;
mod error_mapping;
mod pull_request;


pub use pull_request::{OctocrabConnector, OctocrabGateway};

use std::sync::Arc;

use async_trait::async_trait;

use crate::github::error::FetchError;
use crate::github::locator::{ApiBase, PersonalAccessToken, RepositoryFullName};
use crate::github::models::{CheckRun, CombinedStatus, PullRequestDetail, Review, SearchItem};
use crate::github::search::SearchQuery;

/// Gateway that can load the resources a poll cycle needs.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PullRequestGateway: Send + Sync {
    /// Run an open-pull-request search.
    async fn search_pull_requests(
        &self,
        query: &SearchQuery,
    ) -> Result<Vec<SearchItem>, FetchError>;

    /// Fetch the pull request detail resource at its API URL.
    async fn pull_request_detail(&self, detail_url: &str)
    -> Result<PullRequestDetail, FetchError>;

    /// List every review submitted on a pull request.
    async fn list_reviews(
        &self,
        repository: &RepositoryFullName,
        number: u64,
    ) -> Result<Vec<Review>, FetchError>;

    /// List check runs for a commit.
    async fn list_check_runs(
        &self,
        repository: &RepositoryFullName,
        sha: &str,
    ) -> Result<Vec<CheckRun>, FetchError>;

    /// Fetch the combined legacy commit status for a commit.
    async fn combined_status(
        &self,
        repository: &RepositoryFullName,
        sha: &str,
    ) -> Result<CombinedStatus, FetchError>;
}

/// Builds gateways for the credentials in force at the start of a cycle.
pub trait GatewayConnector: Send + Sync {
    /// Connect to the API at `api_base` using `token`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] when a client cannot be constructed.
    fn connect(
        &self,
        token: &PersonalAccessToken,
        api_base: &ApiBase,
    ) -> Result<Arc<dyn PullRequestGateway>, FetchError>;
}
