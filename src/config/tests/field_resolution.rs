//! Tests for token, username, interval, and filter resolution.

use std::time::Duration;

use rstest::rstest;

use crate::WatchConfig;
use crate::github::{ApiBase, DEFAULT_API_BASE};
use crate::poller::{DisplayFilter, PollError};

#[rstest]
fn resolve_token_prefers_configured_value() {
    let _guard = env_lock::lock_env([("GITHUB_TOKEN", Some("env-token"))]);
    let config = WatchConfig {
        token: Some("my-token".to_owned()),
        ..Default::default()
    };

    let token = config.resolve_token().expect("token should resolve");
    assert_eq!(token.value(), "my-token");
}

#[rstest]
fn resolve_token_falls_back_to_github_token() {
    let _guard = env_lock::lock_env([("GITHUB_TOKEN", Some("  env-token "))]);
    let config = WatchConfig::default();

    let token = config.resolve_token().expect("fallback token should resolve");
    assert_eq!(token.value(), "env-token");
}

#[rstest]
fn blank_token_counts_as_missing() {
    let _guard = env_lock::lock_env([("GITHUB_TOKEN", None::<&str>)]);
    let config = WatchConfig {
        token: Some("   ".to_owned()),
        ..Default::default()
    };

    assert!(config.resolve_token().is_none());
}

#[rstest]
fn settings_resolve_defaults() {
    let _guard = env_lock::lock_env([("GITHUB_TOKEN", None::<&str>)]);
    let config = WatchConfig {
        username: Some(" octocat ".to_owned()),
        ..Default::default()
    };

    let settings = config.settings().expect("settings should resolve");

    assert_eq!(settings.token, None);
    assert_eq!(settings.username.as_deref(), Some("octocat"));
    assert!(settings.repositories.is_empty());
    assert!(settings.include_authored);
    assert!(settings.notifications_enabled);
    assert_eq!(settings.poll_interval, Duration::from_secs(120));
    assert_eq!(
        Some(settings.api_base),
        ApiBase::parse(DEFAULT_API_BASE).ok()
    );
}

#[rstest]
fn flags_invert_into_settings() {
    let config = WatchConfig {
        exclude_authored: true,
        no_notifications: true,
        poll_interval_minutes: 7,
        ..Default::default()
    };

    let settings = config.settings().expect("settings should resolve");

    assert!(!settings.include_authored);
    assert!(!settings.notifications_enabled);
    assert_eq!(settings.poll_interval, Duration::from_secs(420));
}

#[rstest]
fn zero_interval_is_rejected() {
    let config = WatchConfig {
        poll_interval_minutes: 0,
        ..Default::default()
    };

    assert!(matches!(
        config.settings(),
        Err(PollError::Configuration { .. })
    ));
}

#[rstest]
#[case::missing_owner("/repo")]
#[case::extra_segment("octo/repo/extra")]
fn malformed_repository_is_rejected(#[case] raw: &str) {
    let config = WatchConfig {
        repositories: Some(format!("octo/fine,{raw}")),
        ..Default::default()
    };

    assert!(matches!(
        config.settings(),
        Err(PollError::Configuration { .. })
    ));
}

#[rstest]
fn repositories_split_trim_and_collapse_duplicates() {
    let config = WatchConfig {
        repositories: Some(" octo/api , octo/web,,octo/api ".to_owned()),
        ..Default::default()
    };

    let settings = config.settings().expect("settings should resolve");
    let names: Vec<&str> = settings
        .repositories
        .iter()
        .map(|repository| repository.full_name.as_str())
        .collect();

    assert_eq!(names, vec!["octo/api", "octo/web"]);
}

#[rstest]
fn enterprise_api_base_is_accepted() {
    let config = WatchConfig {
        api_base: Some("https://ghe.example.com/api/v3".to_owned()),
        ..Default::default()
    };

    let settings = config.settings().expect("settings should resolve");
    assert!(settings.api_base.as_str().starts_with("https://ghe.example.com/api/v3"));
}

#[rstest]
fn invalid_api_base_is_rejected() {
    let config = WatchConfig {
        api_base: Some("not a url".to_owned()),
        ..Default::default()
    };

    assert!(matches!(
        config.settings(),
        Err(PollError::Configuration { .. })
    ));
}

#[rstest]
#[case::absent(None, Some(None))]
#[case::mine(Some("mine"), Some(Some(DisplayFilter::Mine)))]
#[case::unknown(Some("nobody"), None)]
fn display_filter_parses(
    #[case] raw: Option<&str>,
    #[case] expected: Option<Option<DisplayFilter>>,
) {
    let config = WatchConfig {
        filter: raw.map(str::to_owned),
        ..Default::default()
    };

    assert_eq!(config.display_filter().ok(), expected);
}
