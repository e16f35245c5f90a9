use anyhow::Result;

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;

    // Create race_data table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS race_data (
            race_year INTEGER NOT NULL,
            location TEXT NOT NULL COLLATE NOCASE,
            qualifying_text TEXT NOT NULL,
            link_text TEXT NOT NULL,
            link_url TEXT NOT NULL,
            scrape_date INTEGER NOT NULL,
            page_hash TEXT NOT NULL,
            UNIQUE(race_year, location)
        )
        "#,
    )
    .execute(&pool)
    .await?;

    // Create qualifying_times table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS qualifying_times (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            age_group TEXT NOT NULL,
            location TEXT NOT NULL COLLATE NOCASE,
            women_text TEXT,
            women_seconds INTEGER,
            men_text TEXT,
            men_seconds INTEGER,
            UNIQUE(age_group, location)
        )
        "#,
    )
    .execute(&pool)
    .await?;

    // Create indexes
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_qualifying_times_location ON qualifying_times(location)",
    )
    .execute(&pool)
    .await?;

    pool.close().await;
    Ok(())
}
