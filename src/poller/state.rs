//! Snapshot state carried between poll cycles and its blob encoding.

use std::collections::{BTreeMap, BTreeSet};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::persistence::{BlobWrite, PersistenceError, SnapshotStore};

use super::batch::RetainedSummary;
use super::cycle::CycleReport;
use super::error::PollError;
use super::events::PrRef;
use super::record::{CiStatus, PullRequestRecord, ReviewState};

/// Blob keys written by the poller.
pub mod keys {
    /// Current pull request list.
    pub const PRS: &str = "prs";
    /// Epoch milliseconds of the last cycle that finished.
    pub const LAST_UPDATED: &str = "lastUpdated";
    /// Last failure message, or `null`.
    pub const ERROR: &str = "error";
    /// Every pull request id ever observed.
    pub const SEEN_PR_IDS: &str = "seenPRIds";
    /// Per-id diff state.
    pub const PR_STATE: &str = "prState";
    /// Per-id event type names for highlight markers.
    pub const HIGHLIGHTED_PRS: &str = "highlightedPRs";
    /// Last active display filter.
    pub const PR_FILTER: &str = "prFilter";
}

/// Fields of a pull request needed to diff the next cycle.
///
/// Optional fields are `None` for entries written before the field existed;
/// the reconciler treats them as "unknown" rather than as a transition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedPrState {
    /// Comment total at the end of the previous cycle.
    #[serde(default)]
    pub comment_count: u64,
    /// Review verdict, if recorded.
    #[serde(default)]
    pub review_state: Option<ReviewState>,
    /// CI verdict, if recorded.
    #[serde(default)]
    pub ci_status: Option<CiStatus>,
    /// Draft flag, if recorded.
    #[serde(default)]
    pub is_draft: Option<bool>,
    /// Repository full name, if recorded.
    #[serde(default, rename = "repo")]
    pub repository: Option<String>,
    /// Human-facing number.
    #[serde(default)]
    pub number: u64,
    /// Title.
    #[serde(default)]
    pub title: String,
    /// HTML URL.
    #[serde(default)]
    pub url: String,
}

impl PersistedPrState {
    /// Captures the diff-relevant fields of `record`.
    #[must_use]
    pub fn from_record(record: &PullRequestRecord) -> Self {
        Self {
            comment_count: record.comment_count,
            review_state: Some(record.review_state),
            ci_status: Some(record.ci_status),
            is_draft: Some(record.is_draft),
            repository: Some(record.repository.clone()),
            number: record.number,
            title: record.title.clone(),
            url: record.url.clone(),
        }
    }

    /// Whether the stored entry already held CI success, approval, and a
    /// known non-draft flag together.
    #[must_use]
    pub fn was_ready_to_merge(&self) -> bool {
        self.ci_status == Some(CiStatus::Success)
            && self.review_state == Some(ReviewState::Approved)
            && self.is_draft == Some(false)
    }

    /// Rebuilds a reference for a pull request that is no longer listed.
    ///
    /// Returns `None` when the entry does not record its repository.
    #[must_use]
    pub fn pr_ref(&self, id: u64) -> Option<PrRef> {
        let repository = self.repository.clone()?;
        Some(PrRef {
            id,
            number: self.number,
            repository,
            title: self.title.clone(),
            url: self.url.clone(),
            author: None,
        })
    }
}

/// Every pull request id ever observed; never shrinks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeenIdSet(BTreeSet<u64>);

impl SeenIdSet {
    /// Whether `id` was observed before.
    #[must_use]
    pub fn contains(&self, id: u64) -> bool {
        self.0.contains(&id)
    }

    /// Marks `id` as observed.
    pub fn insert(&mut self, id: u64) {
        self.0.insert(id);
    }

    /// Number of observed ids.
    #[must_use]
    pub(crate) fn len(&self) -> usize {
        self.0.len()
    }
}

impl FromIterator<u64> for SeenIdSet {
    fn from_iter<I: IntoIterator<Item = u64>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Per-id diff state, serialised as a JSON object keyed by id.
pub type PrStateMap = BTreeMap<u64, PersistedPrState>;

/// The durable state a cycle reads at its start and replaces at its end.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotState {
    /// Ids observed in any earlier cycle.
    pub seen: SeenIdSet,
    /// Entries for the pull requests present in the previous cycle.
    pub entries: PrStateMap,
}

impl SnapshotState {
    /// Reads the seen ids and per-id entries from `store`.
    ///
    /// A malformed blob is logged and treated as absent, which the
    /// reconciler handles as a state gap.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the store cannot be read.
    pub fn load(store: &dyn SnapshotStore) -> Result<Self, PersistenceError> {
        let seen = tolerate_malformed(load_json::<SeenIdSet>(store, keys::SEEN_PR_IDS))?;
        let entries = tolerate_malformed(load_json::<PrStateMap>(store, keys::PR_STATE))?;
        Ok(Self {
            seen: seen.unwrap_or_default(),
            entries: entries.unwrap_or_default(),
        })
    }

    /// Encodes both blobs for an atomic commit.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Serialisation`] when encoding fails.
    pub fn to_writes(&self) -> Result<Vec<BlobWrite>, PersistenceError> {
        Ok(vec![
            encode_json(keys::SEEN_PR_IDS, &self.seen)?,
            encode_json(keys::PR_STATE, &self.entries)?,
        ])
    }
}

/// In-process state owned by the poller between cycles.
///
/// Durable state lives in the store; this only holds what is meaningful
/// for the lifetime of the process.
#[derive(Debug, Clone, Default)]
pub struct PollerState {
    /// Cycles that published a snapshot since start-up.
    pub completed_cycles: u64,
    /// Summary of the last delivered notification, until clicked.
    pub retained: Option<RetainedSummary>,
    /// Outcome of the most recent cycle, shared with callers that waited
    /// on it.
    pub last_outcome: Option<Result<CycleReport, PollError>>,
}

/// Reads and decodes the JSON blob under `key`.
///
/// # Errors
///
/// Returns [`PersistenceError`] when the store fails or the blob does not
/// decode as `T`.
pub fn load_json<T: DeserializeOwned>(
    store: &dyn SnapshotStore,
    key: &str,
) -> Result<Option<T>, PersistenceError> {
    let Some(raw) = store.load(key)? else {
        return Ok(None);
    };
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|error| PersistenceError::Serialisation {
            key: key.to_owned(),
            message: error.to_string(),
        })
}

/// Encodes `value` as a [`BlobWrite::Put`] under `key`.
///
/// # Errors
///
/// Returns [`PersistenceError::Serialisation`] when encoding fails.
pub fn encode_json<T: Serialize + ?Sized>(
    key: &str,
    value: &T,
) -> Result<BlobWrite, PersistenceError> {
    serde_json::to_string(value)
        .map(|raw| BlobWrite::put(key, raw))
        .map_err(|error| PersistenceError::Serialisation {
            key: key.to_owned(),
            message: error.to_string(),
        })
}

/// Downgrades a decode failure to an absent blob.
pub fn tolerate_malformed<T>(
    result: Result<Option<T>, PersistenceError>,
) -> Result<Option<T>, PersistenceError> {
    match result {
        Err(PersistenceError::Serialisation { key, message }) => {
            warn!(%key, %message, "ignoring malformed snapshot blob");
            Ok(None)
        }
        other => other,
    }
}
