//! In-memory [`QualStore`] implementation for tests and dry runs.
//!
//! Records live in `Vec`s behind `std::sync::RwLock`, which keeps
//! first-insertion order for free. Batches take both write locks before
//! touching either table.

use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::models::{QualifyingTime, RaceMetadata, UpsertOutcome};

use super::{BatchOutcome, QualStore};

/// In-memory store.
pub struct InMemoryStore {
    races: RwLock<Vec<RaceMetadata>>,
    times: RwLock<Vec<QualifyingTime>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            races: RwLock::new(Vec::new()),
            times: RwLock::new(Vec::new()),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<T>(_: T) -> Error {
    Error::Storage("in-memory store lock poisoned".to_string())
}

fn same_location(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

fn upsert_race(races: &mut Vec<RaceMetadata>, record: &RaceMetadata) -> UpsertOutcome {
    match races
        .iter_mut()
        .find(|r| r.race_year == record.race_year && same_location(&r.location, &record.location))
    {
        Some(existing) => {
            existing.qualifying_text = record.qualifying_text.clone();
            existing.link_text = record.link_text.clone();
            existing.link_url = record.link_url.clone();
            existing.scrape_date = record.scrape_date;
            existing.page_hash = record.page_hash.clone();
            UpsertOutcome::Updated
        }
        None => {
            races.push(record.clone());
            UpsertOutcome::Inserted
        }
    }
}

fn upsert_time(times: &mut Vec<QualifyingTime>, record: &QualifyingTime) -> UpsertOutcome {
    match times
        .iter_mut()
        .find(|t| t.age_group == record.age_group && same_location(&t.location, &record.location))
    {
        Some(existing) => {
            existing.women_time_text = record.women_time_text.clone();
            existing.women_seconds = record.women_seconds;
            existing.men_time_text = record.men_time_text.clone();
            existing.men_seconds = record.men_seconds;
            UpsertOutcome::Updated
        }
        None => {
            times.push(record.clone());
            UpsertOutcome::Inserted
        }
    }
}

#[async_trait]
impl QualStore for InMemoryStore {
    async fn upsert_race_metadata(&self, record: &RaceMetadata) -> Result<UpsertOutcome> {
        let mut races = self.races.write().map_err(poisoned)?;
        Ok(upsert_race(&mut races, record))
    }

    async fn upsert_qualifying_time(&self, record: &QualifyingTime) -> Result<UpsertOutcome> {
        let mut times = self.times.write().map_err(poisoned)?;
        Ok(upsert_time(&mut times, record))
    }

    async fn apply_source_batch(
        &self,
        metadata: &RaceMetadata,
        rows: &[QualifyingTime],
    ) -> Result<BatchOutcome> {
        let mut races = self.races.write().map_err(poisoned)?;
        let mut times = self.times.write().map_err(poisoned)?;

        let metadata = upsert_race(&mut races, metadata);
        let mut outcome = BatchOutcome {
            metadata,
            rows_inserted: 0,
            rows_updated: 0,
        };
        for row in rows {
            match upsert_time(&mut times, row) {
                UpsertOutcome::Inserted => outcome.rows_inserted += 1,
                UpsertOutcome::Updated => outcome.rows_updated += 1,
            }
        }
        Ok(outcome)
    }

    async fn qualifying_times(&self, location: &str) -> Result<Vec<QualifyingTime>> {
        let times = self.times.read().map_err(poisoned)?;
        Ok(times
            .iter()
            .filter(|t| same_location(&t.location, location))
            .cloned()
            .collect())
    }

    async fn race_metadata(&self, location: &str) -> Result<Vec<RaceMetadata>> {
        let races = self.races.read().map_err(poisoned)?;
        let mut found: Vec<RaceMetadata> = races
            .iter()
            .filter(|r| same_location(&r.location, location))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.race_year.cmp(&a.race_year));
        Ok(found)
    }

    async fn count_qualifying_times(&self, location: Option<&str>) -> Result<i64> {
        let times = self.times.read().map_err(poisoned)?;
        let count = times
            .iter()
            .filter(|t| location.map_or(true, |l| same_location(&t.location, l)))
            .count();
        Ok(count as i64)
    }
}
