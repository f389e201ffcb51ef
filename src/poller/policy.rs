//! Per-repository notification toggles.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Notification category gated by a repository policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventCategory {
    /// A pull request appeared for the first time.
    NewPrs,
    /// New comments arrived.
    Comments,
    /// A review verdict changed.
    Reviews,
    /// CI started failing.
    CiFailure,
    /// CI started passing.
    CiSuccess,
    /// The pull request became ready to merge.
    ReadyToMerge,
    /// Draft, ready, or closed transitions.
    Status,
}

/// Which notification categories a repository emits.
///
/// Every flag defaults to enabled, both for repositories without an explicit
/// policy and for keys omitted from a watchlist entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[expect(
    clippy::struct_excessive_bools,
    reason = "mirrors the per-category toggles of the watchlist file"
)]
pub struct RepoNotificationPolicy {
    /// Emit `new_pr` events.
    pub new_prs: bool,
    /// Emit `comment` events.
    pub comments: bool,
    /// Emit `review` events.
    pub reviews: bool,
    /// Emit `ci_failure` events.
    pub ci_failure: bool,
    /// Emit `ci_success` events.
    pub ci_success: bool,
    /// Emit `ready_to_merge` events.
    pub ready_to_merge: bool,
    /// Emit `status` events.
    pub status: bool,
}

impl Default for RepoNotificationPolicy {
    fn default() -> Self {
        Self {
            new_prs: true,
            comments: true,
            reviews: true,
            ci_failure: true,
            ci_success: true,
            ready_to_merge: true,
            status: true,
        }
    }
}

impl RepoNotificationPolicy {
    /// Whether `category` is enabled.
    #[must_use]
    pub const fn allows(&self, category: EventCategory) -> bool {
        match category {
            EventCategory::NewPrs => self.new_prs,
            EventCategory::Comments => self.comments,
            EventCategory::Reviews => self.reviews,
            EventCategory::CiFailure => self.ci_failure,
            EventCategory::CiSuccess => self.ci_success,
            EventCategory::ReadyToMerge => self.ready_to_merge,
            EventCategory::Status => self.status,
        }
    }
}

/// Policies for every configured repository.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicySet {
    policies: HashMap<String, RepoNotificationPolicy>,
}

impl PolicySet {
    /// Creates an empty set; every lookup falls back to all-enabled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the policy for `repository`, replacing any earlier entry.
    pub fn insert(&mut self, repository: &str, policy: RepoNotificationPolicy) {
        self.policies.insert(repository.to_owned(), policy);
    }

    /// Policy for `repository`, or the all-enabled default.
    #[must_use]
    pub fn policy_for(&self, repository: &str) -> RepoNotificationPolicy {
        self.policies.get(repository).copied().unwrap_or_default()
    }

    /// Whether `repository` emits `category`.
    #[must_use]
    pub fn allows(&self, repository: &str, category: EventCategory) -> bool {
        self.policy_for(repository).allows(category)
    }
}

impl<'a> FromIterator<(&'a str, RepoNotificationPolicy)> for PolicySet {
    fn from_iter<I: IntoIterator<Item = (&'a str, RepoNotificationPolicy)>>(iter: I) -> Self {
        let mut set = Self::new();
        for (repository, policy) in iter {
            set.insert(repository, policy);
        }
        set
    }
}
