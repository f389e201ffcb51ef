//! Layered configuration for the poller.
//!
//! Values merge from defaults, a configuration file, `PRWATCH_*`
//! environment variables, and command-line flags, in that order of
//! increasing precedence.
//!
//! # Configuration File
//!
//! Place `.prwatch.toml` in the current directory, home directory, or XDG
//! config directory:
//!
//! ```toml
//! token = "ghp_example"
//! username = "octocat"
//! repositories = "octo/api,octo/web"
//! watchlist = "watchlist.json"
//! poll_interval_minutes = 5
//! database_url = "prwatch.sqlite"
//! ```
//!
//! # Watchlist
//!
//! The optional watchlist is a JSON array carrying per-repository
//! notification toggles. Omitted toggles default to enabled:
//!
//! ```json
//! [{"full_name": "octo/api", "notifications": {"comments": false}}]
//! ```

use std::collections::HashMap;
use std::env;
use std::time::Duration;

use camino::Utf8Path;
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

use crate::github::{ApiBase, DEFAULT_API_BASE, PersonalAccessToken, RepositoryFullName};
use crate::poller::{DisplayFilter, PolicySet, PollError, RepoNotificationPolicy};

/// Minutes between scheduled cycles when nothing else is configured.
pub const DEFAULT_POLL_INTERVAL_MINUTES: u64 = 2;

/// Application configuration supporting CLI, environment, and file sources.
///
/// # Environment Variables
///
/// - `PRWATCH_TOKEN`, `GITHUB_TOKEN`, or `--token`: Authentication token
/// - `PRWATCH_USERNAME` or `--username`: Login whose pull requests are watched
/// - `PRWATCH_REPOSITORIES` or `--repositories`: Comma-separated full names
/// - `PRWATCH_DATABASE_URL` or `--database-url`: Local `SQLite` database path
#[derive(Debug, Clone, Deserialize, Serialize, OrthoConfig)]
#[serde(default)]
#[ortho_config(
    prefix = "PRWATCH",
    discovery(
        dotfile_name = ".prwatch.toml",
        config_file_name = "prwatch.toml",
        app_name = "prwatch"
    )
)]
pub struct WatchConfig {
    /// Personal access token for GitHub API authentication.
    ///
    /// Falls back to `GITHUB_TOKEN` when no other source provides one.
    #[ortho_config(cli_short = 't')]
    pub token: Option<String>,

    /// Login used in the review-requested, assignee, and author queries.
    #[ortho_config(cli_short = 'u')]
    pub username: Option<String>,

    /// Comma-separated `owner/repo` names watched with every notification
    /// category enabled.
    #[ortho_config(cli_short = 'r')]
    pub repositories: Option<String>,

    /// Path to a JSON watchlist with per-repository notification toggles.
    #[ortho_config(cli_short = 'w')]
    pub watchlist: Option<String>,

    /// Skips the author query so only review and assignment work is listed.
    ///
    /// Note: `PRWATCH_EXCLUDE_AUTHORED` is not supported because
    /// `ortho_config` does not load boolean values from the environment.
    #[ortho_config()]
    pub exclude_authored: bool,

    /// Disables batched notifications; the badge still updates.
    #[ortho_config()]
    pub no_notifications: bool,

    /// Minutes between scheduled cycles. Must be positive.
    #[ortho_config(cli_short = 'i')]
    pub poll_interval_minutes: u64,

    /// REST API root; use `https://<host>/api/v3` for GitHub Enterprise.
    #[ortho_config()]
    pub api_base: Option<String>,

    /// Local `SQLite` database URL/path for the snapshot.
    ///
    /// Without it the snapshot lives in memory for the process lifetime.
    #[ortho_config()]
    pub database_url: Option<String>,

    /// Runs database migrations and exits.
    #[ortho_config()]
    pub migrate_db: bool,

    /// Runs a single cycle and exits.
    #[ortho_config()]
    pub once: bool,

    /// Badge filter applied at start-up: `all`, `mine`, or `others`.
    #[ortho_config(cli_short = 'f')]
    pub filter: Option<String>,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            token: None,
            username: None,
            repositories: None,
            watchlist: None,
            exclude_authored: false,
            no_notifications: false,
            poll_interval_minutes: DEFAULT_POLL_INTERVAL_MINUTES,
            api_base: None,
            database_url: None,
            migrate_db: false,
            once: false,
            filter: None,
        }
    }
}

/// A watched repository and its notification toggles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchedRepository {
    /// Validated `owner/repo` name.
    pub full_name: RepositoryFullName,
    /// Categories this repository may emit.
    pub policy: RepoNotificationPolicy,
}

/// Runtime settings resolved from [`WatchConfig`].
///
/// Missing token, username, or repositories are not errors here; a cycle
/// started with them missing is skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchSettings {
    /// Credential, if configured.
    pub token: Option<PersonalAccessToken>,
    /// Watching login, if configured.
    pub username: Option<String>,
    /// Repositories in configuration order, without duplicates.
    pub repositories: Vec<WatchedRepository>,
    /// Whether the author query runs.
    pub include_authored: bool,
    /// Global notification switch.
    pub notifications_enabled: bool,
    /// Time between scheduled cycles.
    pub poll_interval: Duration,
    /// REST API root.
    pub api_base: ApiBase,
}

impl WatchSettings {
    /// Creates settings for `api_base` with nothing configured.
    #[must_use]
    pub fn unconfigured(api_base: ApiBase) -> Self {
        Self {
            token: None,
            username: None,
            repositories: Vec::new(),
            include_authored: true,
            notifications_enabled: true,
            poll_interval: minutes(DEFAULT_POLL_INTERVAL_MINUTES),
            api_base,
        }
    }

    /// Notification toggles keyed by repository.
    #[must_use]
    pub fn policies(&self) -> PolicySet {
        self.repositories
            .iter()
            .map(|repository| (repository.full_name.as_str(), repository.policy))
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct WatchlistEntry {
    full_name: String,
    #[serde(default)]
    notifications: RepoNotificationPolicy,
}

impl WatchConfig {
    /// Resolves the token from configuration or `GITHUB_TOKEN`.
    ///
    /// Blank values count as absent.
    #[must_use]
    pub fn resolve_token(&self) -> Option<PersonalAccessToken> {
        self.token
            .clone()
            .or_else(|| env::var("GITHUB_TOKEN").ok())
            .and_then(|raw| PersonalAccessToken::new(raw).ok())
    }

    /// Resolves the configuration into [`WatchSettings`].
    ///
    /// # Errors
    ///
    /// Returns [`PollError::Configuration`] for a malformed repository name,
    /// an unreadable or malformed watchlist, an invalid API root, or a zero
    /// poll interval.
    pub fn settings(&self) -> Result<WatchSettings, PollError> {
        if self.poll_interval_minutes == 0 {
            return Err(PollError::Configuration {
                message: "poll_interval_minutes must be at least 1".to_owned(),
            });
        }

        let api_base = ApiBase::parse(self.api_base.as_deref().unwrap_or(DEFAULT_API_BASE))
            .map_err(|error| PollError::Configuration {
                message: error.to_string(),
            })?;

        let listed = self.listed_repositories()?;
        let watchlist = match self.watchlist.as_deref() {
            Some(path) => load_watchlist(Utf8Path::new(path))?,
            None => Vec::new(),
        };

        Ok(WatchSettings {
            token: self.resolve_token(),
            username: self
                .username
                .as_deref()
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_owned),
            repositories: merge_repositories(listed, watchlist),
            include_authored: !self.exclude_authored,
            notifications_enabled: !self.no_notifications,
            poll_interval: minutes(self.poll_interval_minutes),
            api_base,
        })
    }

    /// Parses the start-up display filter, if one is configured.
    ///
    /// # Errors
    ///
    /// Returns [`PollError::Configuration`] for an unknown filter name.
    pub fn display_filter(&self) -> Result<Option<DisplayFilter>, PollError> {
        self.filter.as_deref().map(str::parse).transpose()
    }

    fn listed_repositories(&self) -> Result<Vec<WatchedRepository>, PollError> {
        let Some(raw) = self.repositories.as_deref() else {
            return Ok(Vec::new());
        };
        raw.split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(|name| watched(name, RepoNotificationPolicy::default()))
            .collect()
    }
}

/// Reads a watchlist file.
///
/// # Errors
///
/// Returns [`PollError::Configuration`] when the file cannot be read, is
/// not a JSON array of entries, or names a malformed repository.
pub fn load_watchlist(path: &Utf8Path) -> Result<Vec<WatchedRepository>, PollError> {
    let parent = path
        .parent()
        .filter(|parent| !parent.as_str().is_empty())
        .unwrap_or_else(|| Utf8Path::new("."));
    let file_name = path.file_name().ok_or_else(|| PollError::Configuration {
        message: format!("invalid watchlist path '{path}': no file name"),
    })?;

    let dir = Dir::open_ambient_dir(parent, ambient_authority()).map_err(|error| {
        PollError::Configuration {
            message: format!("failed to open watchlist directory '{parent}': {error}"),
        }
    })?;
    let raw = dir
        .read_to_string(file_name)
        .map_err(|error| PollError::Configuration {
            message: format!("failed to read watchlist '{path}': {error}"),
        })?;
    let entries: Vec<WatchlistEntry> =
        serde_json::from_str(&raw).map_err(|error| PollError::Configuration {
            message: format!("malformed watchlist '{path}': {error}"),
        })?;

    entries
        .into_iter()
        .map(|entry| watched(&entry.full_name, entry.notifications))
        .collect()
}

fn watched(name: &str, policy: RepoNotificationPolicy) -> Result<WatchedRepository, PollError> {
    let full_name = RepositoryFullName::parse(name).map_err(|error| PollError::Configuration {
        message: error.to_string(),
    })?;
    Ok(WatchedRepository { full_name, policy })
}

/// Listed repositories followed by watchlist-only ones; a watchlist policy
/// replaces the default policy of a listed repository.
fn merge_repositories(
    listed: Vec<WatchedRepository>,
    watchlist: Vec<WatchedRepository>,
) -> Vec<WatchedRepository> {
    let overrides: HashMap<RepositoryFullName, RepoNotificationPolicy> = watchlist
        .iter()
        .rev()
        .map(|entry| (entry.full_name.clone(), entry.policy))
        .collect();

    let mut merged: Vec<WatchedRepository> = Vec::new();
    for mut entry in listed.into_iter().chain(watchlist) {
        if merged
            .iter()
            .any(|existing| existing.full_name == entry.full_name)
        {
            continue;
        }
        if let Some(policy) = overrides.get(&entry.full_name) {
            entry.policy = *policy;
        }
        merged.push(entry);
    }
    merged
}

const fn minutes(count: u64) -> Duration {
    Duration::from_secs(count.saturating_mul(60))
}

#[cfg(test)]
mod tests;
