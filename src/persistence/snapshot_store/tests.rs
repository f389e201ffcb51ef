//! Tests for the snapshot stores.

type FixtureResult<T> = Result<T, Box<dyn std::error::Error>>;

use diesel::Connection;
use diesel::RunQueryDsl;
use diesel::sql_query;
use diesel::sqlite::SqliteConnection;
use rstest::{fixture, rstest};
use tempfile::TempDir;

use super::{BlobWrite, MemorySnapshotStore, SnapshotStore, SqliteSnapshotStore};
use crate::persistence::{PersistenceError, migrate_database};
use crate::telemetry::NoopTelemetrySink;

#[fixture]
fn temp_db() -> FixtureResult<(TempDir, String)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("prwatch.sqlite");
    Ok((temp_dir, db_path.to_string_lossy().to_string()))
}

#[fixture]
fn migrated_store(
    temp_db: FixtureResult<(TempDir, String)>,
) -> FixtureResult<(TempDir, SqliteSnapshotStore)> {
    let (temp_dir, database_url) = temp_db?;
    migrate_database(&database_url, &NoopTelemetrySink)?;

    let store = SqliteSnapshotStore::new(database_url)?;
    Ok((temp_dir, store))
}

fn exercise_put_replace_remove(store: &dyn SnapshotStore) {
    store
        .commit(&[
            BlobWrite::put("prs", "[]".to_owned()),
            BlobWrite::put("error", "null".to_owned()),
        ])
        .expect("first commit should succeed");
    store
        .commit(&[
            BlobWrite::put("prs", "[1]".to_owned()),
            BlobWrite::remove("error"),
        ])
        .expect("second commit should succeed");

    assert_eq!(
        store.load("prs").expect("load should succeed").as_deref(),
        Some("[1]")
    );
    assert_eq!(store.load("error").expect("load should succeed"), None);
    assert_eq!(store.load("missing").expect("load should succeed"), None);
}

#[rstest]
fn sqlite_store_puts_replaces_and_removes(
    migrated_store: FixtureResult<(TempDir, SqliteSnapshotStore)>,
) {
    let (_temp_dir, store) = migrated_store.expect("fixture should succeed");
    exercise_put_replace_remove(&store);
}

#[rstest]
fn memory_store_puts_replaces_and_removes() {
    let store = MemorySnapshotStore::new();
    exercise_put_replace_remove(&store);
    assert_eq!(store.keys(), vec!["prs".to_owned()]);
}

#[rstest]
fn sqlite_store_reports_missing_schema_when_unmigrated(
    temp_db: FixtureResult<(TempDir, String)>,
) {
    let (_temp_dir, database_url) = temp_db.expect("fixture should succeed");
    let store = SqliteSnapshotStore::new(database_url).expect("store should build");

    let error = store.load("prs").expect_err("unmigrated database should fail");

    assert_eq!(error, PersistenceError::SchemaNotInitialised);
}

#[rstest]
fn sqlite_commit_is_all_or_nothing(temp_db: FixtureResult<(TempDir, String)>) {
    let (_temp_dir, database_url) = temp_db.expect("fixture should succeed");
    migrate_database(&database_url, &NoopTelemetrySink).expect("migrations should run");

    let mut connection =
        SqliteConnection::establish(&database_url).expect("connection should succeed");
    sql_query(
        "CREATE TRIGGER reject_poison BEFORE INSERT ON snapshot_blobs \
         WHEN NEW.key = 'poison' BEGIN SELECT RAISE(ABORT, 'poisoned'); END;",
    )
    .execute(&mut connection)
    .expect("trigger should be created");

    let store = SqliteSnapshotStore::new(database_url).expect("store should build");
    store
        .commit(&[BlobWrite::put("prs", "[]".to_owned())])
        .expect("seed commit should succeed");

    let result = store.commit(&[
        BlobWrite::put("prs", "[1]".to_owned()),
        BlobWrite::put("poison", "x".to_owned()),
    ]);

    assert!(
        matches!(result, Err(PersistenceError::WriteFailed { .. })),
        "expected WriteFailed, got {result:?}"
    );
    assert_eq!(
        store.load("prs").expect("load should succeed").as_deref(),
        Some("[]"),
        "the staged write must be rolled back"
    );
}

#[rstest]
#[case::empty("")]
#[case::whitespace("   ")]
fn blank_url_is_rejected(#[case] url: &str) {
    let result = SqliteSnapshotStore::new(url);
    assert!(
        matches!(result, Err(PersistenceError::BlankDatabaseUrl)),
        "expected BlankDatabaseUrl, got {result:?}"
    );
}

#[rstest]
fn empty_commit_is_a_no_op(temp_db: FixtureResult<(TempDir, String)>) {
    let (_temp_dir, database_url) = temp_db.expect("fixture should succeed");
    let store = SqliteSnapshotStore::new(database_url).expect("store should build");

    store.commit(&[]).expect("empty commit should not touch the schema");
}
