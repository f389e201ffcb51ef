//! Octocrab implementation of the pull request gateway.

use std::sync::Arc;

use async_trait::async_trait;
use octocrab::{Octocrab, Page};

use crate::github::error::FetchError;
use crate::github::locator::{ApiBase, PersonalAccessToken, RepositoryFullName};
use crate::github::models::{
    ApiCheckRunList, ApiCombinedStatus, ApiPullRequestDetail, ApiReview, ApiSearchResponse,
    CheckRun, CombinedStatus, PullRequestDetail, Review, SearchItem,
};
use crate::github::search::SearchQuery;

use super::client::build_octocrab_client;
use super::error_mapping::map_octocrab_error;
use super::{GatewayConnector, PullRequestGateway};

const SEARCH_PATH: &str = "/search/issues";
const PER_PAGE: &str = "100";

/// Octocrab-backed gateway.
pub struct OctocrabGateway {
    client: Octocrab,
    api_base: ApiBase,
}

impl OctocrabGateway {
    /// Creates a new gateway from an Octocrab client and the API base it
    /// was built for.
    #[must_use]
    pub const fn new(client: Octocrab, api_base: ApiBase) -> Self {
        Self { client, api_base }
    }

    /// Builds an Octocrab client for the given token and API base.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::InvalidUrl` when the base URI cannot be parsed or
    /// `FetchError::Api` when Octocrab fails to construct a client.
    pub fn for_token(token: &PersonalAccessToken, api_base: &ApiBase) -> Result<Self, FetchError> {
        let octocrab = build_octocrab_client(token, api_base)?;
        Ok(Self::new(octocrab, api_base.clone()))
    }
}

#[async_trait]
impl PullRequestGateway for OctocrabGateway {
    async fn search_pull_requests(
        &self,
        query: &SearchQuery,
    ) -> Result<Vec<SearchItem>, FetchError> {
        let rendered = query.to_string();
        let params = [("q", rendered.as_str()), ("per_page", PER_PAGE)];

        self.client
            .get::<ApiSearchResponse, _, _>(SEARCH_PATH, Some(&params))
            .await
            .map(|response| response.items.into_iter().map(Into::into).collect())
            .map_err(|error| map_octocrab_error("search pull requests", &error))
    }

    async fn pull_request_detail(
        &self,
        detail_url: &str,
    ) -> Result<PullRequestDetail, FetchError> {
        let route = self.api_base.route_for(detail_url)?;

        self.client
            .get::<ApiPullRequestDetail, _, _>(route, None::<&()>)
            .await
            .map(Into::into)
            .map_err(|error| map_octocrab_error("pull request detail", &error))
    }

    async fn list_reviews(
        &self,
        repository: &RepositoryFullName,
        number: u64,
    ) -> Result<Vec<Review>, FetchError> {
        let params = [("per_page", PER_PAGE)];
        let page = self
            .client
            .get::<Page<ApiReview>, _, _>(repository.reviews_path(number), Some(&params))
            .await
            .map_err(|error| map_octocrab_error("list reviews", &error))?;

        self.client
            .all_pages(page)
            .await
            .map(|reviews| reviews.into_iter().map(Into::into).collect())
            .map_err(|error| map_octocrab_error("list reviews", &error))
    }

    async fn list_check_runs(
        &self,
        repository: &RepositoryFullName,
        sha: &str,
    ) -> Result<Vec<CheckRun>, FetchError> {
        let params = [("per_page", PER_PAGE)];

        self.client
            .get::<ApiCheckRunList, _, _>(repository.check_runs_path(sha), Some(&params))
            .await
            .map(|list| list.check_runs.into_iter().map(Into::into).collect())
            .map_err(|error| map_octocrab_error("list check runs", &error))
    }

    async fn combined_status(
        &self,
        repository: &RepositoryFullName,
        sha: &str,
    ) -> Result<CombinedStatus, FetchError> {
        self.client
            .get::<ApiCombinedStatus, _, _>(repository.commit_status_path(sha), None::<&()>)
            .await
            .map(Into::into)
            .map_err(|error| map_octocrab_error("combined status", &error))
    }
}

/// Connector that builds an [`OctocrabGateway`] per cycle.
#[derive(Debug, Default, Clone, Copy)]
pub struct OctocrabConnector;

impl GatewayConnector for OctocrabConnector {
    fn connect(
        &self,
        token: &PersonalAccessToken,
        api_base: &ApiBase,
    ) -> Result<Arc<dyn PullRequestGateway>, FetchError> {
        let gateway = OctocrabGateway::for_token(token, api_base)?;
        Ok(Arc::new(gateway))
    }
}
