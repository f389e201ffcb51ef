//! Local persistence and database migrations.
//!
//! The poller keeps its snapshot as keyed JSON blobs. With a configured
//! database they live in `SQLite`, whose schema is managed with Diesel
//! migrations; without one they live in memory for the lifetime of the
//! process.

mod error;
mod migrator;
mod snapshot_store;

pub use error::PersistenceError;
pub use migrator::{INITIAL_SCHEMA_VERSION, MIGRATIONS, SchemaVersion, migrate_database};
pub use snapshot_store::{BlobWrite, MemorySnapshotStore, SnapshotStore, SqliteSnapshotStore};
