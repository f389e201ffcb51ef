//! Badge projection from the current pull request list.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::PollError;
use super::record::PullRequestRecord;

/// Which pull requests the badge counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayFilter {
    /// Every listed pull request.
    #[default]
    All,
    /// Only pull requests the user authored.
    Mine,
    /// Only pull requests the user did not author.
    Others,
}

impl DisplayFilter {
    /// Lowercase name, as accepted by [`FromStr`].
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Mine => "mine",
            Self::Others => "others",
        }
    }

    /// Whether `record` passes the filter.
    #[must_use]
    pub const fn includes(self, record: &PullRequestRecord) -> bool {
        match self {
            Self::All => true,
            Self::Mine => record.roles.is_author,
            Self::Others => !record.roles.is_author,
        }
    }
}

impl fmt::Display for DisplayFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DisplayFilter {
    type Err = PollError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "mine" => Ok(Self::Mine),
            "others" => Ok(Self::Others),
            other => Err(PollError::Configuration {
                message: format!("unknown display filter `{other}`; expected all, mine, or others"),
            }),
        }
    }
}

/// Indicator shown next to the application icon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Badge {
    /// Nothing to show.
    Blank,
    /// Positive number of visible pull requests.
    Count(u64),
    /// The last cycle failed.
    Error,
    /// Token, username, or repositories are not configured.
    Unconfigured,
}

impl Badge {
    /// Rendered badge text.
    #[must_use]
    pub fn text(self) -> String {
        match self {
            Self::Blank => String::new(),
            Self::Count(count) => count.to_string(),
            Self::Error => "!".to_owned(),
            Self::Unconfigured => "?".to_owned(),
        }
    }
}

impl fmt::Display for Badge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}

/// Counts the records visible under `filter`.
#[must_use]
pub fn project(records: &[PullRequestRecord], filter: DisplayFilter) -> Badge {
    let visible = records
        .iter()
        .filter(|record| filter.includes(record))
        .count();
    match u64::try_from(visible) {
        Ok(0) => Badge::Blank,
        Ok(count) => Badge::Count(count),
        Err(_) => Badge::Count(u64::MAX),
    }
}
