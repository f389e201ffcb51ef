//! Tests for watchlist loading and merging with listed repositories.

use camino::Utf8PathBuf;
use rstest::{fixture, rstest};
use tempfile::TempDir;

use crate::WatchConfig;
use crate::config::load_watchlist;
use crate::poller::{EventCategory, PollError};

#[fixture]
fn temp_dir() -> TempDir {
    TempDir::new().expect("temporary directory should be created")
}

fn write_watchlist(dir: &TempDir, contents: &str) -> Utf8PathBuf {
    let path = Utf8PathBuf::from_path_buf(dir.path().join("watchlist.json"))
        .expect("temporary path should be UTF-8");
    std::fs::write(&path, contents).expect("watchlist should be written");
    path
}

#[rstest]
fn omitted_toggles_default_to_enabled(temp_dir: TempDir) {
    let path = write_watchlist(
        &temp_dir,
        r#"[
            {"full_name": "octo/api", "notifications": {"comments": false}},
            {"full_name": "octo/web"}
        ]"#,
    );

    let entries = load_watchlist(&path).expect("watchlist should load");

    let api = entries.first().expect("first entry");
    assert_eq!(api.full_name.as_str(), "octo/api");
    assert!(!api.policy.allows(EventCategory::Comments));
    assert!(api.policy.allows(EventCategory::ReadyToMerge));
    let web = entries.get(1).expect("second entry");
    assert!(web.policy.allows(EventCategory::Comments));
}

#[rstest]
fn watchlist_policy_overrides_listed_repository(temp_dir: TempDir) {
    let path = write_watchlist(
        &temp_dir,
        r#"[
            {"full_name": "octo/extra"},
            {"full_name": "octo/api", "notifications": {"status": false}}
        ]"#,
    );
    let config = WatchConfig {
        repositories: Some("octo/api,octo/web".to_owned()),
        watchlist: Some(path.to_string()),
        ..Default::default()
    };

    let settings = config.settings().expect("settings should resolve");
    let names: Vec<&str> = settings
        .repositories
        .iter()
        .map(|repository| repository.full_name.as_str())
        .collect();
    let policies = settings.policies();

    assert_eq!(names, vec!["octo/api", "octo/web", "octo/extra"]);
    assert!(!policies.allows("octo/api", EventCategory::Status));
    assert!(policies.allows("octo/web", EventCategory::Status));
}

#[rstest]
#[case::not_json("{")]
#[case::not_an_array(r#"{"full_name": "octo/api"}"#)]
#[case::bad_name(r#"[{"full_name": "octo"}]"#)]
fn malformed_watchlist_is_a_configuration_error(temp_dir: TempDir, #[case] contents: &str) {
    let path = write_watchlist(&temp_dir, contents);

    assert!(matches!(
        load_watchlist(&path),
        Err(PollError::Configuration { .. })
    ));
}

#[rstest]
fn missing_watchlist_is_a_configuration_error(temp_dir: TempDir) {
    let path = Utf8PathBuf::from_path_buf(temp_dir.path().join("absent.json"))
        .expect("temporary path should be UTF-8");

    let error = load_watchlist(&path).expect_err("missing file should fail");

    assert!(error.to_string().contains("absent.json"));
}
