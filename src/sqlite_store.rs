//! SQLite-backed [`QualStore`] implementation.
//!
//! Each upsert checks for the natural key first (to report insert vs
//! update) and then writes with `ON CONFLICT ... DO UPDATE`, so a racing
//! writer can never produce a duplicate. A source batch runs inside one
//! transaction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, Sqlite, SqliteConnection, SqlitePool, Transaction};

use marathon_quals_core::models::{QualifyingTime, RaceMetadata, UpsertOutcome};
use marathon_quals_core::store::{BatchOutcome, QualStore};
use marathon_quals_core::{Error, Result};

/// SQLite implementation of the [`QualStore`] trait.
///
/// Wraps a [`SqlitePool`] and expects the schema created by
/// [`run_migrations`](crate::migrate::run_migrations).
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn begin(&self) -> Result<Transaction<'static, Sqlite>> {
        self.pool.begin().await.map_err(storage)
    }
}

fn storage(e: sqlx::Error) -> Error {
    Error::Storage(e.to_string())
}

fn outcome_from_count(existing: i64) -> UpsertOutcome {
    if existing > 0 {
        UpsertOutcome::Updated
    } else {
        UpsertOutcome::Inserted
    }
}

async fn upsert_race(conn: &mut SqliteConnection, record: &RaceMetadata) -> Result<UpsertOutcome> {
    let existing: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM race_data WHERE race_year = ? AND location = ?")
            .bind(record.race_year)
            .bind(&record.location)
            .fetch_one(&mut *conn)
            .await
            .map_err(storage)?;

    sqlx::query(
        r#"
        INSERT INTO race_data (race_year, location, qualifying_text, link_text, link_url,
                               scrape_date, page_hash)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(race_year, location) DO UPDATE SET
            qualifying_text = excluded.qualifying_text,
            link_text = excluded.link_text,
            link_url = excluded.link_url,
            scrape_date = excluded.scrape_date,
            page_hash = excluded.page_hash
        "#,
    )
    .bind(record.race_year)
    .bind(&record.location)
    .bind(&record.qualifying_text)
    .bind(&record.link_text)
    .bind(&record.link_url)
    .bind(record.scrape_date.timestamp())
    .bind(&record.page_hash)
    .execute(&mut *conn)
    .await
    .map_err(storage)?;

    Ok(outcome_from_count(existing))
}

async fn upsert_time(conn: &mut SqliteConnection, record: &QualifyingTime) -> Result<UpsertOutcome> {
    let existing: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM qualifying_times WHERE age_group = ? AND location = ?",
    )
    .bind(&record.age_group)
    .bind(&record.location)
    .fetch_one(&mut *conn)
    .await
    .map_err(storage)?;

    sqlx::query(
        r#"
        INSERT INTO qualifying_times (age_group, location, women_text, women_seconds,
                                      men_text, men_seconds)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT(age_group, location) DO UPDATE SET
            women_text = excluded.women_text,
            women_seconds = excluded.women_seconds,
            men_text = excluded.men_text,
            men_seconds = excluded.men_seconds
        "#,
    )
    .bind(&record.age_group)
    .bind(&record.location)
    .bind(&record.women_time_text)
    .bind(record.women_seconds)
    .bind(&record.men_time_text)
    .bind(record.men_seconds)
    .execute(&mut *conn)
    .await
    .map_err(storage)?;

    Ok(outcome_from_count(existing))
}

fn from_unix(ts: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(ts, 0).unwrap_or_default()
}

#[async_trait]
impl QualStore for SqliteStore {
    async fn upsert_race_metadata(&self, record: &RaceMetadata) -> Result<UpsertOutcome> {
        let mut tx = self.begin().await?;
        let outcome = upsert_race(&mut tx, record).await?;
        tx.commit().await.map_err(storage)?;
        Ok(outcome)
    }

    async fn upsert_qualifying_time(&self, record: &QualifyingTime) -> Result<UpsertOutcome> {
        let mut tx = self.begin().await?;
        let outcome = upsert_time(&mut tx, record).await?;
        tx.commit().await.map_err(storage)?;
        Ok(outcome)
    }

    async fn apply_source_batch(
        &self,
        metadata: &RaceMetadata,
        rows: &[QualifyingTime],
    ) -> Result<BatchOutcome> {
        let mut tx = self.begin().await?;

        let mut batch = BatchOutcome {
            metadata: upsert_race(&mut tx, metadata).await?,
            rows_inserted: 0,
            rows_updated: 0,
        };
        for row in rows {
            match upsert_time(&mut tx, row).await? {
                UpsertOutcome::Inserted => batch.rows_inserted += 1,
                UpsertOutcome::Updated => batch.rows_updated += 1,
            }
        }

        // Dropping `tx` on an early return above rolls everything back.
        tx.commit().await.map_err(storage)?;
        Ok(batch)
    }

    async fn qualifying_times(&self, location: &str) -> Result<Vec<QualifyingTime>> {
        let rows = sqlx::query(
            r#"
            SELECT age_group, location, women_text, women_seconds, men_text, men_seconds
            FROM qualifying_times
            WHERE location = ?
            ORDER BY id
            "#,
        )
        .bind(location)
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;

        Ok(rows
            .iter()
            .map(|row| QualifyingTime {
                age_group: row.get("age_group"),
                location: row.get("location"),
                women_time_text: row.get("women_text"),
                women_seconds: row.get("women_seconds"),
                men_time_text: row.get("men_text"),
                men_seconds: row.get("men_seconds"),
            })
            .collect())
    }

    async fn race_metadata(&self, location: &str) -> Result<Vec<RaceMetadata>> {
        let rows = sqlx::query(
            r#"
            SELECT race_year, location, qualifying_text, link_text, link_url, scrape_date, page_hash
            FROM race_data
            WHERE location = ?
            ORDER BY race_year DESC
            "#,
        )
        .bind(location)
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;

        Ok(rows
            .iter()
            .map(|row| RaceMetadata {
                race_year: row.get("race_year"),
                location: row.get("location"),
                qualifying_text: row.get("qualifying_text"),
                link_text: row.get("link_text"),
                link_url: row.get("link_url"),
                scrape_date: from_unix(row.get("scrape_date")),
                page_hash: row.get("page_hash"),
            })
            .collect())
    }

    async fn count_qualifying_times(&self, location: Option<&str>) -> Result<i64> {
        let count: i64 = match location {
            Some(loc) => {
                sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM qualifying_times WHERE location = ?")
                    .bind(loc)
                    .fetch_one(&self.pool)
                    .await
            }
            None => {
                sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM qualifying_times")
                    .fetch_one(&self.pool)
                    .await
            }
        }
        .map_err(storage)?;
        Ok(count)
    }
}
