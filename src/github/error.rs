//! Error types exposed by the GitHub fetch layer.

use thiserror::Error;

/// Errors surfaced while validating inputs or communicating with GitHub.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// The authentication token was missing or blank.
    #[error("personal access token is required")]
    MissingToken,

    /// A repository name was not in `owner/repo` form.
    #[error("repository must be given as owner/repo, got `{value}`")]
    InvalidRepository {
        /// The rejected input.
        value: String,
    },

    /// A URL could not be parsed or does not belong to the API host.
    #[error("URL is invalid: {0}")]
    InvalidUrl(String),

    /// The authentication token was rejected by GitHub.
    #[error("GitHub rejected the token: {message}")]
    Authentication {
        /// GitHub error message returned with the 401/403 response.
        message: String,
    },

    /// GitHub returned a non-authentication API error.
    #[error("GitHub API error: {message}")]
    Api {
        /// Response body from GitHub describing the failure.
        message: String,
    },

    /// Networking failed while calling GitHub.
    #[error("network error talking to GitHub: {message}")]
    Network {
        /// Transport-level error detail.
        message: String,
    },
}
