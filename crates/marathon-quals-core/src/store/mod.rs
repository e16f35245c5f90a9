//! Storage abstraction for qualifying times and race metadata.
//!
//! The [`QualStore`] trait is the only storage surface the reconciliation
//! and query layers see. Backends: [`memory::InMemoryStore`] here, and the
//! SQLite store in the application crate.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{QualifyingTime, RaceMetadata, UpsertOutcome};

/// Outcome of applying one source's writes as a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOutcome {
    pub metadata: UpsertOutcome,
    pub rows_inserted: usize,
    pub rows_updated: usize,
}

/// Abstract record store keyed by natural keys.
///
/// | Method | Key |
/// |--------|-----|
/// | [`upsert_race_metadata`](QualStore::upsert_race_metadata) | (`race_year`, `location`) |
/// | [`upsert_qualifying_time`](QualStore::upsert_qualifying_time) | (`age_group`, `location`) |
/// | [`apply_source_batch`](QualStore::apply_source_batch) | both, atomically |
///
/// Locations compare case-insensitively. Upserts overwrite every non-key
/// field of an existing record and never create a second record for a key.
#[async_trait]
pub trait QualStore: Send + Sync {
    async fn upsert_race_metadata(&self, record: &RaceMetadata) -> Result<UpsertOutcome>;

    async fn upsert_qualifying_time(&self, record: &QualifyingTime) -> Result<UpsertOutcome>;

    /// Write one source's metadata and rows so that either all of them land
    /// or none do.
    async fn apply_source_batch(
        &self,
        metadata: &RaceMetadata,
        rows: &[QualifyingTime],
    ) -> Result<BatchOutcome>;

    /// Every qualifying-time row for `location`, in first-insertion order.
    async fn qualifying_times(&self, location: &str) -> Result<Vec<QualifyingTime>>;

    /// Metadata records for `location`, newest race year first.
    async fn race_metadata(&self, location: &str) -> Result<Vec<RaceMetadata>>;

    /// Number of qualifying-time rows, optionally for one location.
    async fn count_qualifying_times(&self, location: Option<&str>) -> Result<i64>;
}
