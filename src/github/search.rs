//! Issue-search queries used to discover pull requests by role.

use std::fmt;

use super::locator::RepositoryFullName;

/// Relationship between the watching user and a pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PullRequestRole {
    /// The user has been asked to review.
    Reviewer,
    /// The user is assigned.
    Assignee,
    /// The user opened the pull request.
    Author,
}

impl PullRequestRole {
    /// Search qualifier selecting pull requests for this role.
    #[must_use]
    pub const fn qualifier(self) -> &'static str {
        match self {
            Self::Reviewer => "review-requested",
            Self::Assignee => "assignee",
            Self::Author => "author",
        }
    }
}

/// An open-pull-request search scoped to one repository and one role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    repository: RepositoryFullName,
    role: PullRequestRole,
    username: String,
}

impl SearchQuery {
    /// Builds a query for `username` holding `role` in `repository`.
    #[must_use]
    pub fn new(repository: RepositoryFullName, role: PullRequestRole, username: &str) -> Self {
        Self {
            repository,
            role,
            username: username.to_owned(),
        }
    }

    /// Repository the query is scoped to.
    #[must_use]
    pub const fn repository(&self) -> &RepositoryFullName {
        &self.repository
    }

    /// Role the query selects.
    #[must_use]
    pub const fn role(&self) -> PullRequestRole {
        self.role
    }
}

impl fmt::Display for SearchQuery {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "type:pr state:open repo:{repo} {qualifier}:{user}",
            repo = self.repository,
            qualifier = self.role.qualifier(),
            user = self.username
        )
    }
}
