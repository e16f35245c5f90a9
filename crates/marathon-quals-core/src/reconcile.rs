//! Reconciliation: turn raw adapter rows into canonical records and upsert
//! them by natural key.
//!
//! Records missing part of their key are rejected with
//! [`Error::Validation`] before the store is touched. In a batch, a bad row
//! is dropped and counted; bad metadata rejects the whole source.

use tracing::{debug, warn};

use crate::age_group::normalize_label;
use crate::error::{Error, Result};
use crate::models::{QualifyingTime, RaceMetadata, RawTimeRow, UpsertOutcome};
use crate::store::QualStore;
use crate::time::{normalize_time_with, TwoTokenRule};

/// Canonicalize one scraped row for `location`.
///
/// Never fails: unparsable times become `None`, an unusable label becomes
/// an empty string that validation later rejects.
pub fn normalize_row(raw: &RawTimeRow, location: &str, rule: TwoTokenRule) -> QualifyingTime {
    let women = normalize_time_with(&raw.women_time_text, rule);
    let men = normalize_time_with(&raw.men_time_text, rule);

    QualifyingTime {
        age_group: normalize_label(Some(&raw.age_group_text)).unwrap_or_default(),
        location: location.trim().to_string(),
        women_time_text: women.text,
        women_seconds: women.seconds,
        men_time_text: men.text,
        men_seconds: men.seconds,
    }
}

pub fn validate_qualifying_time(record: &QualifyingTime) -> Result<()> {
    if record.location.trim().is_empty() {
        return Err(Error::Validation(
            "qualifying time is missing its location".to_string(),
        ));
    }
    if record.age_group.trim().is_empty() {
        return Err(Error::Validation(format!(
            "qualifying time for {} is missing its age group",
            record.location
        )));
    }
    Ok(())
}

pub fn validate_race_metadata(record: &RaceMetadata) -> Result<()> {
    if record.location.trim().is_empty() {
        return Err(Error::Validation(
            "race metadata is missing its location".to_string(),
        ));
    }
    if record.race_year <= 0 {
        return Err(Error::Validation(format!(
            "race metadata for {} has invalid race year {}",
            record.location, record.race_year
        )));
    }
    Ok(())
}

/// Insert or update one qualifying-time record.
pub async fn upsert_qualifying_time(
    store: &dyn QualStore,
    record: &QualifyingTime,
) -> Result<UpsertOutcome> {
    validate_qualifying_time(record)?;
    let outcome = store.upsert_qualifying_time(record).await?;
    debug!(
        location = %record.location,
        age_group = %record.age_group,
        ?outcome,
        "qualifying time reconciled"
    );
    Ok(outcome)
}

/// Insert or update one race-metadata record.
pub async fn upsert_race_metadata(
    store: &dyn QualStore,
    record: &RaceMetadata,
) -> Result<UpsertOutcome> {
    validate_race_metadata(record)?;
    let outcome = store.upsert_race_metadata(record).await?;
    debug!(
        location = %record.location,
        race_year = record.race_year,
        ?outcome,
        "race metadata reconciled"
    );
    Ok(outcome)
}

/// Counts from reconciling one source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileReport {
    pub metadata: UpsertOutcome,
    pub rows_inserted: usize,
    pub rows_updated: usize,
    pub rows_rejected: usize,
    /// Rows stored with at least one unparsable time column.
    pub rows_with_unparsed_times: usize,
}

/// Reconcile one source's metadata and rows through a single atomic store
/// batch. Invalid rows are skipped; invalid metadata, or a row filed under
/// another location, aborts before writing.
pub async fn reconcile_source(
    store: &dyn QualStore,
    metadata: &RaceMetadata,
    rows: &[QualifyingTime],
) -> Result<ReconcileReport> {
    validate_race_metadata(metadata)?;

    let location = metadata.location.trim();
    if let Some(stray) = rows.iter().find(|r| {
        let row_location = r.location.trim();
        !row_location.is_empty() && !row_location.eq_ignore_ascii_case(location)
    }) {
        return Err(Error::Validation(format!(
            "row {} belongs to '{}', not '{}'",
            stray.age_group, stray.location, location
        )));
    }

    let mut accepted = Vec::with_capacity(rows.len());
    let mut rows_rejected = 0;
    for row in rows {
        match validate_qualifying_time(row) {
            Ok(()) => accepted.push(row.clone()),
            Err(e) => {
                warn!(location = %metadata.location, "skipping row: {}", e);
                rows_rejected += 1;
            }
        }
    }

    let rows_with_unparsed_times = accepted
        .iter()
        .filter(|r| r.women_seconds.is_none() || r.men_seconds.is_none())
        .count();

    let outcome = store.apply_source_batch(metadata, &accepted).await?;

    Ok(ReconcileReport {
        metadata: outcome.metadata,
        rows_inserted: outcome.rows_inserted,
        rows_updated: outcome.rows_updated,
        rows_rejected,
        rows_with_unparsed_times,
    })
}
