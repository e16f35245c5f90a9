//! Sync pipeline orchestration.
//!
//! For each selected race: fetch the page → adapter extraction →
//! normalization → one atomic reconcile batch. A source that cannot be
//! fetched or parsed is logged and skipped; a storage failure stops the run.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use marathon_quals_core::models::RaceMetadata;
use marathon_quals_core::reconcile::{normalize_row, reconcile_source, ReconcileReport};
use marathon_quals_core::store::memory::InMemoryStore;
use marathon_quals_core::store::QualStore;

use crate::config::{Config, RaceYearPolicy};
use crate::db;
use crate::error::IngestError;
use crate::fetch::{FetchedPage, Fetcher};
use crate::sqlite_store::SqliteStore;
use crate::traits::{AdapterRegistry, SiteAdapter};

/// What one source contributed to a run.
#[derive(Debug, Clone)]
pub struct SourceSummary {
    pub location: String,
    pub race_year: i32,
    pub page_hash: String,
    pub report: ReconcileReport,
}

/// Extract, normalize and reconcile one fetched page.
pub async fn ingest_page(
    store: &dyn QualStore,
    adapter: &dyn SiteAdapter,
    page: &FetchedPage,
    race_year: RaceYearPolicy,
    scraped_at: DateTime<Utc>,
) -> crate::error::Result<SourceSummary> {
    let raw_rows = adapter.extract_rows(&page.body)?;
    if raw_rows.is_empty() {
        return Err(IngestError::structure(
            adapter.location(),
            "qualifying table has no data rows",
        ));
    }

    let rows: Vec<_> = raw_rows
        .iter()
        .map(|raw| normalize_row(raw, adapter.location(), adapter.two_token_rule()))
        .collect();

    let raw_meta = adapter.extract_metadata(&page.body, &page.url);
    let metadata = RaceMetadata {
        race_year: race_year.race_year(scraped_at),
        location: adapter.location().to_string(),
        qualifying_text: raw_meta.qualifying_text,
        link_text: raw_meta.link_text,
        link_url: raw_meta.link_url,
        scrape_date: scraped_at,
        page_hash: page.page_hash.clone(),
    };

    let report = reconcile_source(store, &metadata, &rows).await?;

    if report.rows_with_unparsed_times > 0 {
        warn!(
            location = adapter.location(),
            rows = report.rows_with_unparsed_times,
            "stored rows with unparsable times"
        );
    }

    Ok(SourceSummary {
        location: metadata.location,
        race_year: metadata.race_year,
        page_hash: metadata.page_hash,
        report,
    })
}

/// Run `mq sync <target>`.
///
/// `target` is `"all"` or an adapter name. With `"all"`, sources disabled
/// in config are skipped; naming a disabled source runs it anyway. With
/// `dry_run`, rows are reconciled into a throwaway in-memory store and the
/// database is not opened.
pub async fn run_sync(config: &Config, target: &str, dry_run: bool) -> Result<()> {
    let registry = AdapterRegistry::with_builtins();
    let sites = registry.resolve(config, target)?;
    let fetcher = Fetcher::new(&config.fetch).context("Failed to build HTTP client")?;

    let store: Box<dyn QualStore> = if dry_run {
        Box::new(InMemoryStore::new())
    } else {
        Box::new(SqliteStore::new(db::connect(config).await?))
    };

    let mut succeeded = 0usize;
    let mut failed = 0usize;

    for site in &sites {
        let name = site.adapter.name();
        if !site.enabled {
            if target == "all" {
                info!(source = name, "disabled, skipping");
                continue;
            }
            warn!(source = name, "disabled in config, running because it was named");
        }

        info!(source = name, url = %site.url, "syncing");
        let result = match fetcher.fetch(&site.url).await {
            Ok(page) => {
                ingest_page(store.as_ref(), site.adapter, &page, site.race_year, Utc::now()).await
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(summary) => {
                succeeded += 1;
                print_summary(name, &summary, dry_run);
            }
            Err(e) if e.is_fatal() => {
                return Err(e).with_context(|| format!("sync {} aborted", name));
            }
            Err(e) => {
                failed += 1;
                error!(source = name, "{}", e);
                println!("sync {}", name);
                println!("  failed: {}", e);
            }
        }
    }

    if succeeded == 0 && failed > 0 {
        bail!("all {} selected source(s) failed", failed);
    }

    println!("ok");
    Ok(())
}

fn print_summary(name: &str, summary: &SourceSummary, dry_run: bool) {
    let report = &summary.report;
    if dry_run {
        println!("sync {} (dry-run)", name);
    } else {
        println!("sync {}", name);
    }
    println!("  location: {}", summary.location);
    println!("  race year: {}", summary.race_year);
    println!("  metadata: {:?}", report.metadata);
    println!("  rows inserted: {}", report.rows_inserted);
    println!("  rows updated: {}", report.rows_updated);
    if report.rows_rejected > 0 {
        println!("  rows rejected: {}", report.rows_rejected);
    }
    if report.rows_with_unparsed_times > 0 {
        println!("  rows with unparsed times: {}", report.rows_with_unparsed_times);
    }
    println!("  page hash: {}", &summary.page_hash[..summary.page_hash.len().min(12)]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use marathon_quals_core::models::{Gender, UpsertOutcome};
    use marathon_quals_core::query::standard_for;

    use crate::site_boston::BostonSite;
    use crate::site_chicago::ChicagoSite;

    const BOSTON: &str = r#"
        <table>
          <tr><th>Age Group</th><th>Men</th><th>Women</th></tr>
          <tr><td>18-34</td><td>3hrs 00min 00sec</td><td>3hrs 30min 00sec</td></tr>
          <tr><td>35&ndash;39</td><td>3hrs 05min 00sec</td><td>3hrs 35min 00sec</td></tr>
          <tr><td>80 and over</td><td>TBD</td><td>5hrs 20min 00sec</td></tr>
        </table>
    "#;

    fn scraped_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 1, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_ingest_page_normalizes_and_reconciles() {
        let store = InMemoryStore::new();
        let page = FetchedPage::from_bytes("https://www.baa.org/q", BOSTON.as_bytes());

        let summary = ingest_page(&store, &BostonSite, &page, RaceYearPolicy::Next, scraped_at())
            .await
            .unwrap();
        assert_eq!(summary.race_year, 2027);
        assert_eq!(summary.report.metadata, UpsertOutcome::Inserted);
        assert_eq!(summary.report.rows_inserted, 3);
        assert_eq!(summary.report.rows_with_unparsed_times, 1);

        let rows = store.qualifying_times("Boston").await.unwrap();
        assert_eq!(rows[1].age_group, "35-39");
        assert_eq!(rows[1].men_time_text.as_deref(), Some("3:05:00"));
        assert_eq!(rows[2].men_seconds, None);

        let meta = store.race_metadata("Boston").await.unwrap();
        assert_eq!(meta[0].page_hash, page.page_hash);
        assert_eq!(meta[0].scrape_date, scraped_at());

        let found = standard_for(&store, "Boston", 37, Gender::Women).await.unwrap();
        assert_eq!(found.standard().unwrap().seconds, 12900);
    }

    #[tokio::test]
    async fn test_ingest_page_twice_updates() {
        let store = InMemoryStore::new();
        let page = FetchedPage::from_bytes("u", BOSTON.as_bytes());
        ingest_page(&store, &BostonSite, &page, RaceYearPolicy::Next, scraped_at())
            .await
            .unwrap();
        let again = ingest_page(&store, &BostonSite, &page, RaceYearPolicy::Next, scraped_at())
            .await
            .unwrap();

        assert_eq!(again.report.metadata, UpsertOutcome::Updated);
        assert_eq!(again.report.rows_inserted, 0);
        assert_eq!(again.report.rows_updated, 3);
        assert_eq!(store.count_qualifying_times(Some("Boston")).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_structure_errors_leave_store_untouched() {
        let store = InMemoryStore::new();
        let empty_table = "<table><tr><th>Age</th><th>Men</th><th>Women</th></tr></table>";

        for body in ["<p>page moved</p>", empty_table] {
            let page = FetchedPage::from_bytes("u", body.as_bytes());
            let err = ingest_page(&store, &ChicagoSite, &page, RaceYearPolicy::Next, scraped_at())
                .await
                .unwrap_err();
            assert!(matches!(err, IngestError::SourceStructure { .. }));
            assert!(!err.is_fatal());
        }
        assert_eq!(store.count_qualifying_times(None).await.unwrap(), 0);
        assert!(store.race_metadata("Chicago").await.unwrap().is_empty());
    }
}
