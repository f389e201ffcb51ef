//! Tests for configuration layer precedence.

use ortho_config::MergeComposer;
use rstest::rstest;
use serde_json::{Value, json};

use super::helpers::{apply_layer, build_config_from_layers};
use crate::WatchConfig;

#[rstest]
#[case::file_overrides_defaults(
    vec![("defaults", json!({"username": "default-user"})), ("file", json!({"username": "file-user"}))],
    "username",
    "file-user",
    "file should override default"
)]
#[case::environment_overrides_file(
    vec![("file", json!({"token": "file-token"})), ("environment", json!({"token": "env-token"}))],
    "token",
    "env-token",
    "environment should override file"
)]
#[case::cli_overrides_environment(
    vec![
        ("environment", json!({"repositories": "octo/env"})),
        ("cli", json!({"repositories": "octo/cli"}))
    ],
    "repositories",
    "octo/cli",
    "CLI should override environment"
)]
#[case::database_url_defaults_file_env_cli(
    vec![
        ("defaults", json!({"database_url": "default-db"})),
        ("file", json!({"database_url": "file-db"})),
        ("environment", json!({"database_url": "env-db"})),
        ("cli", json!({"database_url": "cli-db"}))
    ],
    "database_url",
    "cli-db",
    "CLI should win for database_url"
)]
fn test_layer_precedence(
    #[case] layers: Vec<(&str, Value)>,
    #[case] field: &str,
    #[case] expected: &str,
    #[case] message: &str,
) {
    let mut composer = MergeComposer::new();

    for (layer_type, value) in layers {
        apply_layer(&mut composer, layer_type, value);
    }

    let config = WatchConfig::merge_from_layers(composer.layers()).expect("merge should succeed");

    let actual = match field {
        "username" => config.username.as_deref(),
        "token" => config.token.as_deref(),
        "repositories" => config.repositories.as_deref(),
        "database_url" => config.database_url.as_deref(),
        _ => panic!("unknown field: {field}"),
    };

    assert_eq!(actual, Some(expected), "{message}");
}

#[rstest]
fn defaults_apply_when_no_sources_provided() {
    let mut composer = MergeComposer::new();
    composer.push_defaults(json!({"token": null, "username": null}));

    let config = WatchConfig::merge_from_layers(composer.layers())
        .expect("merge should succeed with empty defaults");

    assert!(config.token.is_none(), "token should be None");
    assert!(config.repositories.is_none(), "repositories should be None");
    assert!(!config.exclude_authored, "author query runs by default");
    assert!(!config.no_notifications, "notifications are on by default");
    assert!(!config.once, "daemon mode by default");
    assert_eq!(config.poll_interval_minutes, 2);
}

#[rstest]
#[case::file(vec![("file", json!({"poll_interval_minutes": 10}))], 10)]
#[case::cli_over_file(
    vec![
        ("file", json!({"poll_interval_minutes": 10})),
        ("cli", json!({"poll_interval_minutes": 1}))
    ],
    1
)]
fn poll_interval_follows_precedence(#[case] layers: Vec<(&str, Value)>, #[case] expected: u64) {
    let config = build_config_from_layers(&layers);

    assert_eq!(config.poll_interval_minutes, expected);
}

#[rstest]
fn boolean_flags_load_from_file_and_cli() {
    let config = build_config_from_layers(&[
        ("file", json!({"exclude_authored": true})),
        ("cli", json!({"no_notifications": true, "once": true})),
    ]);

    assert!(config.exclude_authored);
    assert!(config.no_notifications);
    assert!(config.once);
}
