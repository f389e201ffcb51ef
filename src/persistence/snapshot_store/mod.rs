//! Keyed JSON blob storage for poller snapshots.
//!
//! A poll cycle reads individual blobs at its start and writes every changed
//! blob back in one [`SnapshotStore::commit`] call. Implementations must make
//! that commit all-or-nothing so a crash mid-cycle leaves the previous
//! snapshot intact.

mod sqlite;

#[cfg(test)]
mod tests;

use std::collections::BTreeMap;
use std::sync::Mutex;

pub use sqlite::SqliteSnapshotStore;

use super::PersistenceError;

/// A single change applied by [`SnapshotStore::commit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlobWrite {
    /// Insert or replace the blob stored under `key`.
    Put {
        /// Blob key.
        key: String,
        /// Serialised JSON value.
        value: String,
    },
    /// Delete the blob stored under `key`, if any.
    Remove {
        /// Blob key.
        key: String,
    },
}

impl BlobWrite {
    /// Builds a [`BlobWrite::Put`].
    #[must_use]
    pub fn put(key: &str, value: String) -> Self {
        Self::Put {
            key: key.to_owned(),
            value,
        }
    }

    /// Builds a [`BlobWrite::Remove`].
    #[must_use]
    pub fn remove(key: &str) -> Self {
        Self::Remove {
            key: key.to_owned(),
        }
    }
}

/// Storage collaborator for snapshot blobs.
pub trait SnapshotStore: Send + Sync {
    /// Loads the blob stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the backing store cannot be read.
    fn load(&self, key: &str) -> Result<Option<String>, PersistenceError>;

    /// Applies every write atomically.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the batch could not be applied; in
    /// that case none of the writes are visible.
    fn commit(&self, writes: &[BlobWrite]) -> Result<(), PersistenceError>;
}

/// Process-local store used when no database is configured.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    blobs: Mutex<BTreeMap<String, String>>,
}

impl MemorySnapshotStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys currently stored, in sorted order.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.blobs
            .lock()
            .map(|blobs| blobs.keys().cloned().collect())
            .unwrap_or_default()
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn load(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        let blobs = self.blobs.lock().map_err(|error| PersistenceError::QueryFailed {
            message: error.to_string(),
        })?;
        Ok(blobs.get(key).cloned())
    }

    fn commit(&self, writes: &[BlobWrite]) -> Result<(), PersistenceError> {
        let mut blobs = self.blobs.lock().map_err(|error| PersistenceError::WriteFailed {
            message: error.to_string(),
        })?;
        for write in writes {
            match write {
                BlobWrite::Put { key, value } => {
                    blobs.insert(key.clone(), value.clone());
                }
                BlobWrite::Remove { key } => {
                    blobs.remove(key);
                }
            }
        }
        Ok(())
    }
}
