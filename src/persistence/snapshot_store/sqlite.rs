//! Snapshot store backed by the `snapshot_blobs` `SQLite` table.

use diesel::Connection;
use diesel::OptionalExtension;
use diesel::QueryableByName;
use diesel::RunQueryDsl;
use diesel::sql_query;
use diesel::sql_types::{BigInt, Text};
use diesel::sqlite::SqliteConnection;

use super::{BlobWrite, SnapshotStore};
use crate::persistence::PersistenceError;

const SNAPSHOT_TABLE: &str = "snapshot_blobs";

/// SQLite-backed [`SnapshotStore`]; every commit runs in one transaction.
#[derive(Debug, Clone)]
pub struct SqliteSnapshotStore {
    database_url: String,
}

impl SqliteSnapshotStore {
    /// Create a store targeting the configured `database_url`.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::BlankDatabaseUrl`] when the URL is blank.
    pub fn new(database_url: impl Into<String>) -> Result<Self, PersistenceError> {
        let database_url_string = database_url.into();
        if database_url_string.trim().is_empty() {
            return Err(PersistenceError::BlankDatabaseUrl);
        }
        Ok(Self {
            database_url: database_url_string.trim().to_owned(),
        })
    }

    fn establish_connection(&self) -> Result<SqliteConnection, PersistenceError> {
        SqliteConnection::establish(&self.database_url).map_err(|error| {
            PersistenceError::ConnectionFailed {
                message: error.to_string(),
            }
        })
    }

    fn apply(
        connection: &mut SqliteConnection,
        write: &BlobWrite,
    ) -> Result<usize, diesel::result::Error> {
        match write {
            BlobWrite::Put { key, value } => sql_query(
                "INSERT INTO snapshot_blobs (key, value, updated_at) \
                 VALUES (?, ?, CURRENT_TIMESTAMP) \
                 ON CONFLICT(key) DO UPDATE SET \
                   value = excluded.value, \
                   updated_at = CURRENT_TIMESTAMP;",
            )
            .bind::<Text, _>(key.as_str())
            .bind::<Text, _>(value.as_str())
            .execute(connection),
            BlobWrite::Remove { key } => sql_query("DELETE FROM snapshot_blobs WHERE key = ?;")
                .bind::<Text, _>(key.as_str())
                .execute(connection),
        }
    }

    fn snapshot_table_exists(
        connection: &mut SqliteConnection,
    ) -> Result<bool, diesel::result::Error> {
        #[derive(Debug, QueryableByName)]
        struct Row {
            #[diesel(sql_type = BigInt)]
            one: i64,
        }

        let exists: Option<Row> = sql_query(
            "SELECT 1 AS one FROM sqlite_master WHERE type = 'table' AND name = ? LIMIT 1;",
        )
        .bind::<Text, _>(SNAPSHOT_TABLE)
        .get_result(connection)
        .optional()?;

        Ok(exists.is_some_and(|row| row.one == 1))
    }

    fn map_error_with_schema_check<F>(
        connection: &mut SqliteConnection,
        error: &diesel::result::Error,
        create_error: F,
    ) -> PersistenceError
    where
        F: Fn(String) -> PersistenceError,
    {
        match Self::snapshot_table_exists(connection) {
            Ok(false) => PersistenceError::SchemaNotInitialised,
            Ok(true) => create_error(error.to_string()),
            Err(check_error) => create_error(format!(
                "schema presence check failed: {check_error}; original error: {error}"
            )),
        }
    }
}

impl SnapshotStore for SqliteSnapshotStore {
    fn load(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        #[derive(Debug, QueryableByName)]
        struct Row {
            #[diesel(sql_type = Text)]
            value: String,
        }

        let mut connection = self.establish_connection()?;

        let result: Option<Row> =
            sql_query("SELECT value FROM snapshot_blobs WHERE key = ? LIMIT 1;")
                .bind::<Text, _>(key)
                .get_result(&mut connection)
                .optional()
                .map_err(|error| {
                    Self::map_error_with_schema_check(&mut connection, &error, |message| {
                        PersistenceError::QueryFailed { message }
                    })
                })?;

        Ok(result.map(|row| row.value))
    }

    fn commit(&self, writes: &[BlobWrite]) -> Result<(), PersistenceError> {
        if writes.is_empty() {
            return Ok(());
        }

        let mut connection = self.establish_connection()?;

        connection
            .transaction::<_, diesel::result::Error, _>(|transaction| {
                for write in writes {
                    Self::apply(transaction, write)?;
                }
                Ok(())
            })
            .map_err(|error| {
                Self::map_error_with_schema_check(&mut connection, &error, |message| {
                    PersistenceError::WriteFailed { message }
                })
            })
    }
}
