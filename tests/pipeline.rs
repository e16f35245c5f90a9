//! Library-level tests of the SQLite store and the ingest pipeline against
//! a real database file.

use chrono::{TimeZone, Utc};
use marathon_quals::config::{Config, RaceYearPolicy};
use marathon_quals::db;
use marathon_quals::fetch::FetchedPage;
use marathon_quals::ingest::ingest_page;
use marathon_quals::migrate;
use marathon_quals::site_london::LondonSite;
use marathon_quals::sqlite_store::SqliteStore;
use marathon_quals_core::models::{Gender, QualifyingTime, RaceMetadata, RawTimeRow, UpsertOutcome};
use marathon_quals_core::query::{margin_report, top_times, RunnerQuery};
use marathon_quals_core::reconcile::{normalize_row, reconcile_source, upsert_qualifying_time};
use marathon_quals_core::store::QualStore;
use marathon_quals_core::time::TwoTokenRule;
use tempfile::TempDir;

async fn setup() -> (TempDir, SqliteStore) {
    let tmp = TempDir::new().unwrap();
    let config: Config = toml::from_str(&format!(
        "[db]\npath = \"{}/data/mq.sqlite\"\n",
        tmp.path().display()
    ))
    .unwrap();
    migrate::run_migrations(&config).await.unwrap();
    let store = SqliteStore::new(db::connect(&config).await.unwrap());
    (tmp, store)
}

fn metadata(location: &str, year: i32) -> RaceMetadata {
    RaceMetadata {
        race_year: year,
        location: location.to_string(),
        qualifying_text: "Run a certified marathon".to_string(),
        link_text: "Qualify".to_string(),
        link_url: "https://example.com/qualify".to_string(),
        scrape_date: Utc.with_ymd_and_hms(2026, 4, 20, 9, 30, 0).unwrap(),
        page_hash: "ab".repeat(32),
    }
}

fn row(group: &str, women: &str, men: &str) -> QualifyingTime {
    normalize_row(
        &RawTimeRow::new(group, women, men),
        "Boston",
        TwoTokenRule::HoursMinutes,
    )
}

#[tokio::test]
async fn test_upsert_is_idempotent() {
    let (_tmp, store) = setup().await;
    let r = row("18-34", "3:30:00", "3:00:00");

    assert_eq!(upsert_qualifying_time(&store, &r).await.unwrap(), UpsertOutcome::Inserted);
    assert_eq!(upsert_qualifying_time(&store, &r).await.unwrap(), UpsertOutcome::Updated);
    assert_eq!(store.count_qualifying_times(Some("Boston")).await.unwrap(), 1);
}

#[tokio::test]
async fn test_upsert_overwrites_and_matches_location_case_insensitively() {
    let (_tmp, store) = setup().await;
    upsert_qualifying_time(&store, &row("18-34", "3:30:00", "3:00:00"))
        .await
        .unwrap();

    let mut changed = row("18-34", "3:25:00", "2:55:00");
    changed.location = "BOSTON".to_string();
    assert_eq!(
        upsert_qualifying_time(&store, &changed).await.unwrap(),
        UpsertOutcome::Updated
    );

    let rows = store.qualifying_times("boston").await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].men_seconds, Some(10500));
    assert_eq!(rows[0].women_time_text.as_deref(), Some("3:25:00"));
}

#[tokio::test]
async fn test_metadata_round_trips_and_orders_by_year() {
    let (_tmp, store) = setup().await;
    store.upsert_race_metadata(&metadata("Boston", 2026)).await.unwrap();
    store.upsert_race_metadata(&metadata("Boston", 2027)).await.unwrap();

    let meta = store.race_metadata("Boston").await.unwrap();
    assert_eq!(meta.len(), 2);
    assert_eq!(meta[0].race_year, 2027);
    assert_eq!(meta[1], metadata("Boston", 2026));
}

#[tokio::test]
async fn test_reconcile_source_skips_invalid_rows() {
    let (_tmp, store) = setup().await;
    let rows = vec![
        row("18-34", "3:30:00", "3:00:00"),
        row("   ", "3:35:00", "3:05:00"),
        row("35-39", "3:35:00", "--"),
    ];

    let report = reconcile_source(&store, &metadata("Boston", 2027), &rows)
        .await
        .unwrap();
    assert_eq!(report.rows_inserted, 2);
    assert_eq!(report.rows_rejected, 1);
    assert_eq!(report.rows_with_unparsed_times, 1);
    assert_eq!(store.count_qualifying_times(None).await.unwrap(), 2);
}

#[tokio::test]
async fn test_failed_batch_rolls_back_metadata() {
    let (_tmp, store) = setup().await;
    sqlx::query("DROP TABLE qualifying_times")
        .execute(store.pool())
        .await
        .unwrap();

    let err = store
        .apply_source_batch(&metadata("Boston", 2027), &[row("18-34", "3:30:00", "3:00:00")])
        .await
        .unwrap_err();
    assert!(matches!(err, marathon_quals_core::Error::Storage(_)));
    assert!(store.race_metadata("Boston").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_ingest_page_into_sqlite_then_query() {
    let (_tmp, store) = setup().await;
    let body = r#"<main><p>Good for age.</p>
        <table>
          <tr><th>Age</th><th>Women</th><th>Men</th></tr>
          <tr><td>18-39</td><td>Sub 3:45</td><td>Sub 3:00</td></tr>
          <tr><td>40-44</td><td>Sub 3:50</td><td>Sub 3:05</td></tr>
          <tr><td>45-49</td><td>Sub 3:58</td><td>Sub 3:10</td></tr>
        </table></main>"#;
    let page = FetchedPage::from_bytes("file:///london.html", body.as_bytes());
    let at = Utc.with_ymd_and_hms(2026, 10, 2, 8, 0, 0).unwrap();

    let summary = ingest_page(&store, &LondonSite, &page, RaceYearPolicy::AfterMonth(9), at)
        .await
        .unwrap();
    assert_eq!(summary.race_year, 2027);
    assert_eq!(summary.report.rows_inserted, 3);

    let meta = store.race_metadata("London").await.unwrap();
    assert_eq!(meta[0].qualifying_text, "Good for age.");
    assert_eq!(meta[0].link_text, "Not found");

    let top = top_times(&store, "London", None, Gender::Women, 2).await.unwrap();
    assert_eq!(
        top.iter().map(|t| t.age_group.as_str()).collect::<Vec<_>>(),
        vec!["18-39", "40-44"]
    );

    let report = margin_report(
        &store,
        &RunnerQuery {
            age: 47,
            gender: Gender::Men,
            location: "London".to_string(),
            personal_best: Some("3h 12m".to_string()),
        },
    )
    .await
    .unwrap();
    assert_eq!(report.classified_age_group, "45-49");
    assert_eq!(report.margin_seconds, Some(120));
    assert_eq!(report.qualifies(), Some(false));
}
