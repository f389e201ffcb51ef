//! Error type surfaced by poll cycles and inbound commands.

use thiserror::Error;

use crate::github::FetchError;
use crate::persistence::PersistenceError;

/// Errors that end a poll cycle or a command.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PollError {
    /// Every repository fetch failed; carries the first failure.
    #[error("{message}")]
    Transport {
        /// Failure text recorded under the `error` key.
        message: String,
    },

    /// The snapshot could not be read or written.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    /// The configuration could not be loaded or is inconsistent.
    #[error("configuration error: {message}")]
    Configuration {
        /// Human-readable description of the problem.
        message: String,
    },

    /// The scheduler stopped before answering a queued command.
    #[error("the poller is no longer running")]
    Stopped,

    /// Writing output failed.
    #[error("I/O error: {message}")]
    Io {
        /// Error detail from the underlying writer.
        message: String,
    },
}

impl From<FetchError> for PollError {
    fn from(error: FetchError) -> Self {
        Self::Transport {
            message: error.to_string(),
        }
    }
}
