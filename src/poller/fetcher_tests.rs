//! Tests for repository fetching and detail enrichment.

use mockall::predicate::{always, function};
use rstest::rstest;

use super::{DetailEnricher, RepositoryFetcher, merge_hits};
use crate::github::models::test_support::{detail_at, search_item, uniform_status};
use crate::github::{
    CommitState, FetchError, MockPullRequestGateway, PullRequestDetail, PullRequestRole,
    RepositoryFullName, SearchQuery,
};
use crate::poller::record::{CiStatus, PullRequestRecord, RoleFlags};

fn repository() -> RepositoryFullName {
    RepositoryFullName::parse("octo/repo").expect("repository should parse")
}

fn role_is(role: PullRequestRole) -> impl Fn(&SearchQuery) -> bool {
    move |query: &SearchQuery| query.role() == role
}

/// Gateway whose activity endpoints return nothing interesting.
fn quiet_activity(gateway: &mut MockPullRequestGateway) {
    gateway.expect_list_reviews().returning(|_, _| Ok(vec![]));
    gateway.expect_list_check_runs().returning(|_, _| Ok(vec![]));
    gateway
        .expect_combined_status()
        .returning(|_, _| Ok(uniform_status(CommitState::Pending, 0)));
}

#[rstest]
fn merge_hits_unions_roles_in_first_seen_order() {
    let merged = merge_hits([
        (
            PullRequestRole::Reviewer,
            vec![search_item(1, "octo/repo", 1), search_item(2, "octo/repo", 2)],
        ),
        (PullRequestRole::Assignee, vec![search_item(2, "octo/repo", 2)]),
        (
            PullRequestRole::Author,
            vec![search_item(3, "octo/repo", 3), search_item(1, "octo/repo", 1)],
        ),
    ]);

    let summary: Vec<(u64, RoleFlags)> = merged
        .iter()
        .map(|(item, roles)| (item.id, *roles))
        .collect();
    assert_eq!(
        summary,
        vec![
            (
                1,
                RoleFlags {
                    is_author: true,
                    is_reviewer: true,
                    is_assignee: false,
                }
            ),
            (
                2,
                RoleFlags {
                    is_author: false,
                    is_reviewer: true,
                    is_assignee: true,
                }
            ),
            (
                3,
                RoleFlags {
                    is_author: true,
                    is_reviewer: false,
                    is_assignee: false,
                }
            ),
        ]
    );
}

#[tokio::test]
async fn fetch_enriches_each_unique_pull_request_once() {
    let mut gateway = MockPullRequestGateway::new();
    gateway
        .expect_search_pull_requests()
        .with(function(role_is(PullRequestRole::Reviewer)))
        .times(1)
        .returning(|_| Ok(vec![search_item(10, "octo/repo", 1)]));
    gateway
        .expect_search_pull_requests()
        .with(function(role_is(PullRequestRole::Assignee)))
        .times(1)
        .returning(|_| Ok(vec![search_item(10, "octo/repo", 1)]));
    gateway
        .expect_search_pull_requests()
        .with(function(role_is(PullRequestRole::Author)))
        .times(1)
        .returning(|_| Ok(vec![search_item(11, "octo/repo", 2)]));
    gateway
        .expect_pull_request_detail()
        .with(always())
        .times(2)
        .returning(|_| Ok(detail_at("abc", 4)));
    quiet_activity(&mut gateway);

    let records = RepositoryFetcher::new(&gateway)
        .fetch(&repository(), "alice", true)
        .await
        .expect("fetch should succeed");

    let first = records.first().expect("first record");
    assert_eq!(records.len(), 2);
    assert!(first.roles.is_reviewer && first.roles.is_assignee);
    assert!(!first.roles.is_author);
    assert_eq!(first.comment_count, 4);
    assert_eq!(first.head_sha.as_deref(), Some("abc"));
}

#[tokio::test]
async fn author_query_is_skipped_when_excluded() {
    let mut gateway = MockPullRequestGateway::new();
    gateway
        .expect_search_pull_requests()
        .with(function(role_is(PullRequestRole::Author)))
        .times(0);
    gateway
        .expect_search_pull_requests()
        .times(2)
        .returning(|_| Ok(vec![]));

    let records = RepositoryFetcher::new(&gateway)
        .fetch(&repository(), "alice", false)
        .await
        .expect("fetch should succeed");

    assert!(records.is_empty());
}

#[tokio::test]
async fn any_role_query_failure_abandons_the_repository() {
    let mut gateway = MockPullRequestGateway::new();
    gateway
        .expect_search_pull_requests()
        .with(function(role_is(PullRequestRole::Assignee)))
        .returning(|_| {
            Err(FetchError::Api {
                message: "search failed".to_owned(),
            })
        });
    gateway
        .expect_search_pull_requests()
        .returning(|_| Ok(vec![search_item(10, "octo/repo", 1)]));
    gateway.expect_pull_request_detail().times(0);

    let result = RepositoryFetcher::new(&gateway)
        .fetch(&repository(), "alice", true)
        .await;

    assert_eq!(
        result,
        Err(FetchError::Api {
            message: "search failed".to_owned(),
        })
    );
}

#[tokio::test]
async fn detail_sums_both_comment_counters() {
    let mut gateway = MockPullRequestGateway::new();
    gateway.expect_pull_request_detail().returning(|_| {
        Ok(PullRequestDetail {
            draft: true,
            comments: 2,
            review_comments: 3,
            head_sha: Some("def".to_owned()),
            mergeable_state: None,
        })
    });

    let mut record =
        PullRequestRecord::from_search(search_item(1, "octo/repo", 1), &repository(), RoleFlags::default());
    DetailEnricher::new(&gateway)
        .enrich(&mut record, Some("https://api.github.com/repos/octo/repo/pulls/1"))
        .await;

    assert!(record.is_draft);
    assert_eq!(record.comment_count, 5);
}

#[tokio::test]
async fn detail_failure_degrades_to_non_draft_with_search_counter() {
    let mut gateway = MockPullRequestGateway::new();
    gateway.expect_pull_request_detail().returning(|_| {
        Err(FetchError::Network {
            message: "timeout".to_owned(),
        })
    });
    gateway.expect_list_reviews().returning(|_, _| Ok(vec![]));
    gateway.expect_list_check_runs().times(0);
    gateway
        .expect_search_pull_requests()
        .returning(|query| {
            if query.role() == PullRequestRole::Reviewer {
                let mut item = search_item(5, "octo/repo", 5);
                item.comments = 7;
                Ok(vec![item])
            } else {
                Ok(vec![])
            }
        });

    let records = RepositoryFetcher::new(&gateway)
        .fetch(&repository(), "alice", true)
        .await
        .expect("detail failure must not fail the repository");

    let record = records.first().expect("one record");
    assert!(!record.is_draft);
    assert_eq!(record.comment_count, 7);
    assert_eq!(record.head_sha, None);
    assert_eq!(record.ci_status, CiStatus::Pending);
}
