//! Core data models used throughout marathon-quals.
//!
//! Raw rows come out of the site adapters as untouched text; canonical
//! records are what the normalizers produce and the store persists.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which column of a qualifying-time table a query reads.
///
/// Config and CLI share [`FromStr`], so `"Women"`, `"women"` and `"f"` all
/// load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Gender {
    Women,
    Men,
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gender::Women => f.write_str("Women"),
            Gender::Men => f.write_str("Men"),
        }
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "women" | "woman" | "female" | "f" | "w" => Ok(Gender::Women),
            "men" | "man" | "male" | "m" => Ok(Gender::Men),
            other => Err(format!("unknown gender '{}': expected women or men", other)),
        }
    }
}

impl TryFrom<String> for Gender {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// One qualifying-table row exactly as an adapter scraped it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTimeRow {
    pub age_group_text: String,
    pub women_time_text: String,
    pub men_time_text: String,
}

impl RawTimeRow {
    pub fn new(
        age_group: impl Into<String>,
        women: impl Into<String>,
        men: impl Into<String>,
    ) -> Self {
        Self {
            age_group_text: age_group.into(),
            women_time_text: women.into(),
            men_time_text: men.into(),
        }
    }
}

/// Citation details an adapter pulls from a race page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMetadata {
    pub qualifying_text: String,
    pub link_text: String,
    pub link_url: String,
}

/// Canonical qualifying standard for one age group at one race.
///
/// Natural key: (`age_group`, `location`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QualifyingTime {
    pub age_group: String,
    pub location: String,
    pub women_time_text: Option<String>,
    pub women_seconds: Option<i64>,
    pub men_time_text: Option<String>,
    pub men_seconds: Option<i64>,
}

impl QualifyingTime {
    /// Seconds column for `gender`.
    pub fn seconds_for(&self, gender: Gender) -> Option<i64> {
        match gender {
            Gender::Women => self.women_seconds,
            Gender::Men => self.men_seconds,
        }
    }

    /// Canonical text column for `gender`.
    pub fn text_for(&self, gender: Gender) -> Option<&str> {
        match gender {
            Gender::Women => self.women_time_text.as_deref(),
            Gender::Men => self.men_time_text.as_deref(),
        }
    }
}

/// Race-level metadata captured alongside a qualifying table.
///
/// Natural key: (`race_year`, `location`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RaceMetadata {
    pub race_year: i32,
    pub location: String,
    pub qualifying_text: String,
    pub link_text: String,
    pub link_url: String,
    pub scrape_date: DateTime<Utc>,
    pub page_hash: String,
}

/// Whether an upsert created a record or refreshed an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}
