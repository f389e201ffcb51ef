//! Wiremock stand-in for the GitHub REST endpoints a poll cycle reads.

use serde_json::{Value, json};
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

/// CI outcome reported for a fixture's head commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CiFixture {
    /// One check run still in progress.
    Running,
    /// One successful check run.
    Passing,
    /// One failed check run.
    Failing,
}

/// An open pull request as the mock API reports it.
#[derive(Debug, Clone)]
pub struct PullRequestFixture {
    /// Search hit id.
    pub id: u64,
    /// Repository full name.
    pub repository: String,
    /// Pull request number.
    pub number: u64,
    /// Draft flag on the detail resource.
    pub draft: bool,
    /// Issue comments on the detail resource.
    pub comments: u64,
    /// Head commit.
    pub head_sha: String,
    /// Whether `bob` has approved.
    pub approved: bool,
    /// Check-run outcome.
    pub ci: CiFixture,
}

impl PullRequestFixture {
    /// A fresh draft with CI running and no reviews.
    pub fn draft(repository: &str, number: u64) -> Self {
        Self {
            id: number,
            repository: repository.to_owned(),
            number,
            draft: true,
            comments: 0,
            head_sha: "abc123".to_owned(),
            approved: false,
            ci: CiFixture::Running,
        }
    }

    /// The same pull request after comments, approval, green CI, and
    /// leaving draft.
    pub fn ready(mut self, comments: u64) -> Self {
        self.draft = false;
        self.comments = comments;
        self.head_sha = "def456".to_owned();
        self.approved = true;
        self.ci = CiFixture::Passing;
        self
    }

    fn html_url(&self) -> String {
        format!("https://github.com/{}/pull/{}", self.repository, self.number)
    }

    fn api_path(&self) -> String {
        format!("/repos/{}/pulls/{}", self.repository, self.number)
    }

    fn search_item(&self, server_uri: &str) -> Value {
        json!({
            "id": self.id,
            "number": self.number,
            "title": format!("Pull request {}", self.number),
            "html_url": self.html_url(),
            "user": { "login": "octocat", "avatar_url": null },
            "created_at": "2025-01-01T00:00:00Z",
            "updated_at": "2025-01-02T00:00:00Z",
            "comments": self.comments,
            "pull_request": { "url": format!("{server_uri}{}", self.api_path()) }
        })
    }

    fn detail(&self) -> Value {
        json!({
            "draft": self.draft,
            "comments": self.comments,
            "review_comments": 0,
            "head": { "sha": self.head_sha },
            "mergeable_state": "blocked"
        })
    }

    fn reviews(&self) -> Value {
        if self.approved {
            json!([{ "user": { "login": "bob", "avatar_url": null }, "state": "APPROVED" }])
        } else {
            json!([])
        }
    }

    fn check_runs(&self) -> Value {
        let run = match self.ci {
            CiFixture::Running => json!({ "status": "in_progress", "conclusion": null }),
            CiFixture::Passing => json!({ "status": "completed", "conclusion": "success" }),
            CiFixture::Failing => json!({ "status": "completed", "conclusion": "failure" }),
        };
        json!({ "total_count": 1, "check_runs": [run] })
    }
}

/// Matches searches scoped to one repository.
struct RepositorySearch(String);

impl Match for RepositorySearch {
    fn matches(&self, request: &Request) -> bool {
        let scope = format!("repo:{}", self.0);
        request
            .url
            .query_pairs()
            .any(|(key, value)| key == "q" && value.split(' ').any(|term| term == scope))
    }
}

/// Mounts search, detail, review, and CI endpoints for `pull_requests`.
///
/// Every role query for a repository returns the same hits, so each
/// pull request carries all three roles.
pub async fn mount_open_pull_requests(
    server: &MockServer,
    repositories: &[&str],
    pull_requests: &[PullRequestFixture],
) {
    let server_uri = server.uri();
    for repository in repositories {
        let items: Vec<Value> = pull_requests
            .iter()
            .filter(|pr| pr.repository == *repository)
            .map(|pr| pr.search_item(&server_uri))
            .collect();
        Mock::given(method("GET"))
            .and(path("/search/issues"))
            .and(RepositorySearch((*repository).to_owned()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "total_count": items.len(),
                "incomplete_results": false,
                "items": items
            })))
            .mount(server)
            .await;
    }

    for pr in pull_requests {
        let ok = |body: Value| ResponseTemplate::new(200).set_body_json(body);
        Mock::given(method("GET"))
            .and(path(pr.api_path()))
            .respond_with(ok(pr.detail()))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("{}/reviews", pr.api_path())))
            .respond_with(ok(pr.reviews()))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!(
                "/repos/{}/commits/{}/check-runs",
                pr.repository, pr.head_sha
            )))
            .respond_with(ok(pr.check_runs()))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!(
                "/repos/{}/commits/{}/status",
                pr.repository, pr.head_sha
            )))
            .respond_with(ok(json!({ "state": "pending", "statuses": [] })))
            .mount(server)
            .await;
    }
}

/// Replaces every endpoint with a failure response.
pub async fn mount_outage(server: &MockServer) {
    server.reset().await;
    Mock::given(path_regex(".*"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "message": "Not Found" })),
        )
        .mount(server)
        .await;
}
