//! Query engine: standards, margins, and ranked times.
//!
//! A missing standard is data ([`StandardLookup::NotFound`]), never an
//! [`Error`](crate::Error). Only storage failures surface as errors, so a
//! caller can always tell "no such standard" from "the store is down".

use serde::Serialize;

use crate::age_group::{age_in_group, normalize_label};
use crate::classify::classify;
use crate::error::{ParseFailure, Result};
use crate::models::Gender;
use crate::store::QualStore;
use crate::time::normalize_time;

/// The qualifying standard that applies to one runner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Standard {
    pub location: String,
    pub age_group: String,
    pub gender: Gender,
    pub time_text: Option<String>,
    pub seconds: i64,
}

/// Why no standard applies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum NotFoundReason {
    /// Nothing stored for the location.
    UnknownLocation,
    /// Rows exist, but no bracket contains the age.
    NoMatchingBracket,
    /// The matching bracket's time for this gender was unparsable.
    UnparsableStandard { age_group: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StandardLookup {
    Found(Standard),
    NotFound(NotFoundReason),
}

impl StandardLookup {
    pub fn standard(&self) -> Option<&Standard> {
        match self {
            StandardLookup::Found(s) => Some(s),
            StandardLookup::NotFound(_) => None,
        }
    }
}

/// First stored row for `location` whose bracket contains `age`.
pub async fn standard_for(
    store: &dyn QualStore,
    location: &str,
    age: u32,
    gender: Gender,
) -> Result<StandardLookup> {
    let rows = store.qualifying_times(location).await?;
    if rows.is_empty() {
        return Ok(StandardLookup::NotFound(NotFoundReason::UnknownLocation));
    }

    let Some(row) = rows.iter().find(|r| age_in_group(age, &r.age_group)) else {
        return Ok(StandardLookup::NotFound(NotFoundReason::NoMatchingBracket));
    };

    let lookup = match row.seconds_for(gender) {
        Some(seconds) => StandardLookup::Found(Standard {
            location: row.location.clone(),
            age_group: row.age_group.clone(),
            gender,
            time_text: row.text_for(gender).map(str::to_string),
            seconds,
        }),
        None => StandardLookup::NotFound(NotFoundReason::UnparsableStandard {
            age_group: row.age_group.clone(),
        }),
    };
    Ok(lookup)
}

/// Personal best minus standard, in seconds. Negative means the runner is
/// under the standard.
pub fn margin_vs_standard(
    personal_best: &str,
    standard_seconds: i64,
) -> std::result::Result<i64, ParseFailure> {
    normalize_time(personal_best)
        .seconds
        .map(|pb| pb - standard_seconds)
        .ok_or_else(|| ParseFailure {
            text: personal_best.to_string(),
        })
}

/// One row of a ranked listing, projected to a single gender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopTime {
    pub location: String,
    pub age_group: String,
    pub gender: Gender,
    pub time_text: Option<String>,
    pub seconds: Option<i64>,
}

/// Up to `limit` rows for `location`, fastest first, unparsable last.
///
/// `age_group` matches the exact normalized label (not bracket membership);
/// `None` lists every age group at the location.
pub async fn top_times(
    store: &dyn QualStore,
    location: &str,
    age_group: Option<&str>,
    gender: Gender,
    limit: usize,
) -> Result<Vec<TopTime>> {
    let wanted = age_group.and_then(|g| normalize_label(Some(g)));
    let rows = store.qualifying_times(location).await?;

    let mut ranked: Vec<TopTime> = rows
        .into_iter()
        .filter(|r| wanted.as_deref().map_or(true, |g| r.age_group == g))
        .map(|r| TopTime {
            time_text: r.text_for(gender).map(str::to_string),
            seconds: r.seconds_for(gender),
            location: r.location,
            age_group: r.age_group,
            gender,
        })
        .collect();

    // Stable: equal keys keep storage order.
    ranked.sort_by_key(|t| (t.seconds.is_none(), t.seconds));
    ranked.truncate(limit);
    Ok(ranked)
}

/// What a runner asks: "do I qualify?".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerQuery {
    pub age: u32,
    pub gender: Gender,
    pub location: String,
    pub personal_best: Option<String>,
}

/// Answer to a [`RunnerQuery`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarginReport {
    pub location: String,
    pub age: u32,
    pub gender: Gender,
    /// The label the race's own bracket scheme gives this age.
    pub classified_age_group: String,
    pub standard: StandardLookup,
    pub personal_best_text: Option<String>,
    pub personal_best_seconds: Option<i64>,
    /// `None` when there is no standard or no usable personal best.
    pub margin_seconds: Option<i64>,
    pub personal_best_error: Option<String>,
}

impl MarginReport {
    pub fn qualifies(&self) -> Option<bool> {
        self.margin_seconds.map(|m| m <= 0)
    }
}

pub async fn margin_report(store: &dyn QualStore, query: &RunnerQuery) -> Result<MarginReport> {
    let standard = standard_for(store, &query.location, query.age, query.gender).await?;

    let pb = query.personal_best.as_deref().map(normalize_time);
    let personal_best_error = match (&pb, query.personal_best.as_deref()) {
        (Some(parsed), Some(text)) if !parsed.is_parsed() => Some(
            ParseFailure {
                text: text.to_string(),
            }
            .to_string(),
        ),
        _ => None,
    };
    let margin_seconds = match (standard.standard(), query.personal_best.as_deref()) {
        (Some(s), Some(text)) => margin_vs_standard(text, s.seconds).ok(),
        _ => None,
    };

    Ok(MarginReport {
        location: query.location.clone(),
        age: query.age,
        gender: query.gender,
        classified_age_group: classify(query.age, &query.location),
        standard,
        personal_best_text: pb.as_ref().and_then(|t| t.text.clone()),
        personal_best_seconds: pb.as_ref().and_then(|t| t.seconds),
        margin_seconds,
        personal_best_error,
    })
}
