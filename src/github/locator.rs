//! Identity wrappers and API route helpers for the GitHub fetch layer.

use std::fmt;

use url::Url;

use super::error::FetchError;

/// Default REST API root for github.com.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// Personal access token wrapper enforcing presence.
#[derive(Clone, PartialEq, Eq)]
pub struct PersonalAccessToken(String);

impl PersonalAccessToken {
    /// Validates that the token is non-empty and trims whitespace.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::MissingToken` when the supplied string is blank.
    pub fn new(token: impl AsRef<str>) -> Result<Self, FetchError> {
        let trimmed = token.as_ref().trim();
        if trimmed.is_empty() {
            return Err(FetchError::MissingToken);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the token value.
    #[must_use]
    pub const fn value(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for PersonalAccessToken {
    fn as_ref(&self) -> &str {
        self.value()
    }
}

impl fmt::Debug for PersonalAccessToken {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("PersonalAccessToken(***)")
    }
}

/// Repository identified by its `owner/repo` full name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RepositoryFullName {
    full_name: String,
}

impl RepositoryFullName {
    /// Parses an `owner/repo` string.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::InvalidRepository` unless the input has exactly
    /// two non-empty, slash-separated segments.
    pub fn parse(input: &str) -> Result<Self, FetchError> {
        let trimmed = input.trim();
        let invalid = || FetchError::InvalidRepository {
            value: input.to_owned(),
        };

        let (owner, name) = trimmed.split_once('/').ok_or_else(invalid)?;
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return Err(invalid());
        }
        if owner.contains(char::is_whitespace) || name.contains(char::is_whitespace) {
            return Err(invalid());
        }

        Ok(Self {
            full_name: trimmed.to_owned(),
        })
    }

    /// The `owner/repo` string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.full_name
    }

    pub(crate) fn reviews_path(&self, number: u64) -> String {
        format!("/repos/{}/pulls/{number}/reviews", self.full_name)
    }

    pub(crate) fn check_runs_path(&self, sha: &str) -> String {
        format!("/repos/{}/commits/{sha}/check-runs", self.full_name)
    }

    pub(crate) fn commit_status_path(&self, sha: &str) -> String {
        format!("/repos/{}/commits/{sha}/status", self.full_name)
    }
}

impl fmt::Display for RepositoryFullName {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.full_name)
    }
}

/// Root URL of the REST API that every route is resolved against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiBase(Url);

impl ApiBase {
    /// Parses an API root such as `https://api.github.com` or
    /// `https://ghe.example.com/api/v3`.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::InvalidUrl` when the input is not an absolute
    /// http(s) URL.
    pub fn parse(input: &str) -> Result<Self, FetchError> {
        let parsed = Url::parse(input.trim())
            .map_err(|error| FetchError::InvalidUrl(error.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(FetchError::InvalidUrl(format!(
                "unsupported scheme `{}`",
                parsed.scheme()
            )));
        }
        if parsed.host_str().is_none() {
            return Err(FetchError::InvalidUrl("URL must include a host".to_owned()));
        }
        Ok(Self(parsed))
    }

    /// API root as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Converts an absolute API URL (as embedded in GitHub payloads) into a
    /// route relative to this base.
    ///
    /// The base path prefix (for example `/api/v3`) is stripped so the route
    /// can be handed to a client that already knows the base.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::InvalidUrl` when the URL cannot be parsed or
    /// points at a different host.
    pub fn route_for(&self, absolute: &str) -> Result<String, FetchError> {
        let parsed =
            Url::parse(absolute).map_err(|error| FetchError::InvalidUrl(error.to_string()))?;

        if parsed.host_str() != self.0.host_str()
            || parsed.port_or_known_default() != self.0.port_or_known_default()
        {
            return Err(FetchError::InvalidUrl(format!(
                "`{absolute}` is not served by {base}",
                base = self.0
            )));
        }

        let base_path = self.0.path().trim_end_matches('/');
        let path = parsed.path();
        let relative = path.strip_prefix(base_path).unwrap_or(path);
        let route = if relative.starts_with('/') {
            relative.to_owned()
        } else {
            format!("/{relative}")
        };

        Ok(match parsed.query() {
            Some(query) => format!("{route}?{query}"),
            None => route,
        })
    }
}
