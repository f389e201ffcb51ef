//! Repository fetching and detail enrichment.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::github::{
    FetchError, PullRequestGateway, PullRequestRole, RepositoryFullName, SearchItem, SearchQuery,
};

use super::activity::ActivityEnricher;
use super::record::{PullRequestRecord, RoleFlags};

/// Loads the authoritative detail resource for a record.
pub struct DetailEnricher<'a, G: PullRequestGateway + ?Sized> {
    gateway: &'a G,
}

impl<'a, G: PullRequestGateway + ?Sized> DetailEnricher<'a, G> {
    /// Creates an enricher that reads through `gateway`.
    #[must_use]
    pub const fn new(gateway: &'a G) -> Self {
        Self { gateway }
    }

    /// Fills draft, comment, head, and mergeable fields of `record`.
    ///
    /// When the detail cannot be read the record is left as a non-draft with
    /// the search comment counter and no head commit.
    pub async fn enrich(&self, record: &mut PullRequestRecord, detail_url: Option<&str>) {
        let Some(url) = detail_url else {
            warn!(
                repository = %record.repository,
                number = record.number,
                "search hit has no detail URL; skipping detail enrichment"
            );
            record.is_draft = false;
            return;
        };

        match self.gateway.pull_request_detail(url).await {
            Ok(detail) => {
                record.is_draft = detail.draft;
                record.comment_count = detail.total_comments();
                record.head_sha = detail.head_sha;
                record.mergeable_state = detail.mergeable_state;
            }
            Err(error) => {
                warn!(
                    repository = %record.repository,
                    number = record.number,
                    %error,
                    "pull request detail unavailable; using search counters"
                );
                record.is_draft = false;
            }
        }
    }
}

/// Discovers and enriches the pull requests relevant to a user in one
/// repository.
pub struct RepositoryFetcher<'a, G: PullRequestGateway + ?Sized> {
    gateway: &'a G,
}

impl<'a, G: PullRequestGateway + ?Sized> RepositoryFetcher<'a, G> {
    /// Creates a fetcher that reads through `gateway`.
    #[must_use]
    pub const fn new(gateway: &'a G) -> Self {
        Self { gateway }
    }

    /// Runs the role queries concurrently, merges hits by id, and enriches
    /// each unique pull request in turn.
    ///
    /// The author query is skipped when `include_authored` is false.
    ///
    /// # Errors
    ///
    /// Returns the first [`FetchError`] from any role query; no partial
    /// result is produced for the repository.
    pub async fn fetch(
        &self,
        repository: &RepositoryFullName,
        username: &str,
        include_authored: bool,
    ) -> Result<Vec<PullRequestRecord>, FetchError> {
        let reviewer = SearchQuery::new(repository.clone(), PullRequestRole::Reviewer, username);
        let assignee = SearchQuery::new(repository.clone(), PullRequestRole::Assignee, username);
        let author = SearchQuery::new(repository.clone(), PullRequestRole::Author, username);

        let (reviewer_hits, assignee_hits, author_hits) = tokio::try_join!(
            self.gateway.search_pull_requests(&reviewer),
            self.gateway.search_pull_requests(&assignee),
            async {
                if include_authored {
                    self.gateway.search_pull_requests(&author).await
                } else {
                    Ok(Vec::new())
                }
            },
        )?;

        let merged = merge_hits([
            (PullRequestRole::Reviewer, reviewer_hits),
            (PullRequestRole::Assignee, assignee_hits),
            (PullRequestRole::Author, author_hits),
        ]);
        debug!(
            repository = %repository,
            count = merged.len(),
            "merged role query results"
        );

        let detail = DetailEnricher::new(self.gateway);
        let activity = ActivityEnricher::new(self.gateway);
        let mut records = Vec::with_capacity(merged.len());
        for (item, roles) in merged {
            let detail_url = item.detail_url.clone();
            let mut record = PullRequestRecord::from_search(item, repository, roles);
            detail.enrich(&mut record, detail_url.as_deref()).await;
            activity.enrich(repository, &mut record).await;
            records.push(record);
        }

        Ok(records)
    }
}

/// Deduplicates hits by id in first-seen order, unioning role flags.
fn merge_hits<I>(results: I) -> Vec<(SearchItem, RoleFlags)>
where
    I: IntoIterator<Item = (PullRequestRole, Vec<SearchItem>)>,
{
    let mut merged: Vec<(SearchItem, RoleFlags)> = Vec::new();
    let mut positions: HashMap<u64, usize> = HashMap::new();

    for (role, items) in results {
        let flags = RoleFlags::for_role(role);
        for item in items {
            if let Some(entry) = positions
                .get(&item.id)
                .and_then(|position| merged.get_mut(*position))
            {
                entry.1 = entry.1.union(flags);
                continue;
            }
            positions.insert(item.id, merged.len());
            merged.push((item, flags));
        }
    }

    merged
}

#[cfg(test)]
#[path = "fetcher_tests.rs"]
mod tests;
