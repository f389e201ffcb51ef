//! Error types for local persistence operations.

use thiserror::Error;

/// Errors returned while migrating or using the snapshot store.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PersistenceError {
    /// No database URL/path was provided.
    #[error("database URL is required (use --database-url or PRWATCH_DATABASE_URL)")]
    MissingDatabaseUrl,

    /// The database URL/path was present but blank.
    #[error("database URL must not be blank")]
    BlankDatabaseUrl,

    /// Establishing a `SQLite` connection failed.
    #[error("failed to connect to SQLite database: {message}")]
    ConnectionFailed {
        /// Error detail from Diesel.
        message: String,
    },

    /// Running pending migrations failed.
    #[error("failed to run database migrations: {message}")]
    MigrationFailed {
        /// Error detail from Diesel migrations.
        message: String,
    },

    /// Reading the schema version from the migration table failed.
    #[error("failed to read schema version after migrations: {message}")]
    SchemaVersionQueryFailed {
        /// Error detail from Diesel query execution.
        message: String,
    },

    /// The migrations completed but no schema version could be found.
    #[error("no schema version recorded after migrations ran")]
    MissingSchemaVersion,

    /// The snapshot table does not exist yet.
    #[error("snapshot schema is missing; run with --migrate-db first")]
    SchemaNotInitialised,

    /// Reading a blob failed.
    #[error("failed to read snapshot blob: {message}")]
    QueryFailed {
        /// Error detail from Diesel query execution.
        message: String,
    },

    /// Committing a batch of blob writes failed; nothing was written.
    #[error("failed to commit snapshot: {message}")]
    WriteFailed {
        /// Error detail from Diesel or the in-memory store.
        message: String,
    },

    /// A blob could not be encoded or decoded as JSON.
    #[error("snapshot blob `{key}` is malformed: {message}")]
    Serialisation {
        /// Blob key.
        key: String,
        /// Error detail from `serde_json`.
        message: String,
    },
}
