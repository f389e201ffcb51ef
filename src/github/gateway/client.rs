//! Octocrab client construction helpers for gateway implementations.

use http::Uri;
use http::header::ACCEPT;
use octocrab::Octocrab;

use crate::github::error::FetchError;
use crate::github::locator::{ApiBase, PersonalAccessToken};

use super::error_mapping::map_octocrab_error;

const GITHUB_JSON_MEDIA_TYPE: &str = "application/vnd.github+json";

/// Builds an Octocrab client for the given token and API base URL.
///
/// The client sends the bearer credential and the GitHub JSON accept header
/// on every request.
///
/// # Errors
///
/// Returns `FetchError::InvalidUrl` when the base URI cannot be parsed or
/// `FetchError::Api` when Octocrab fails to construct a client.
pub(super) fn build_octocrab_client(
    token: &PersonalAccessToken,
    api_base: &ApiBase,
) -> Result<Octocrab, FetchError> {
    let base_uri: Uri = api_base
        .as_str()
        .parse::<Uri>()
        .map_err(|error| FetchError::InvalidUrl(error.to_string()))?;

    Octocrab::builder()
        .personal_token(token.as_ref())
        .base_uri(base_uri)
        .map_err(|error| FetchError::Api {
            message: format!("build client failed: {error}"),
        })?
        .add_header(ACCEPT, GITHUB_JSON_MEDIA_TYPE.to_owned())
        .build()
        .map_err(|error| map_octocrab_error("build client", &error))
}
