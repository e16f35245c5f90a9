//! Site adapters: one per race website.
//!
//! An adapter knows where a race publishes its qualifying standards and
//! how to pull raw rows and metadata out of that page. It does no I/O and
//! no normalization; [`ingest`](crate::ingest) fetches the page, hands the
//! body to the adapter, then normalizes and reconciles what comes back.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │               AdapterRegistry                │
//! │  boston  london  tokyo  new_york  chicago    │
//! │  berlin  (+ anything passed to register())   │
//! └──────────────────┬───────────────────────────┘
//!                    ▼
//!   fetch → extract_rows / extract_metadata → reconcile
//! ```

use marathon_quals_core::models::{RawMetadata, RawTimeRow};
use marathon_quals_core::time::TwoTokenRule;

use crate::config::{Config, RaceYearPolicy};
use crate::error::{IngestError, Result};
use crate::html::{has_word, tables};

/// Config keys of the adapters shipped with the binary, in sync order.
pub const BUILTIN_SITES: &[&str] = &["boston", "london", "tokyo", "new_york", "chicago", "berlin"];

/// Extracts qualifying standards from one race's web page.
///
/// # Example
///
/// ```rust
/// use marathon_quals::error::Result;
/// use marathon_quals::traits::SiteAdapter;
/// use marathon_quals_core::models::{RawMetadata, RawTimeRow};
///
/// struct TrailRace;
///
/// impl SiteAdapter for TrailRace {
///     fn name(&self) -> &str { "trail" }
///     fn location(&self) -> &str { "Trail" }
///     fn default_url(&self) -> &str { "https://example.com/qualify" }
///
///     fn extract_rows(&self, _body: &str) -> Result<Vec<RawTimeRow>> {
///         Ok(vec![RawTimeRow::new("18+", "5:00:00", "4:30:00")])
///     }
///
///     fn extract_metadata(&self, _body: &str, url: &str) -> RawMetadata {
///         RawMetadata {
///             qualifying_text: "Run it once".to_string(),
///             link_text: "Trail race".to_string(),
///             link_url: url.to_string(),
///         }
///     }
/// }
/// ```
pub trait SiteAdapter: Send + Sync {
    /// Config key, e.g. `"new_york"`.
    fn name(&self) -> &str;

    /// Location stored with every row, e.g. `"New York"`.
    fn location(&self) -> &str;

    fn default_url(&self) -> &str;

    /// How `"3:05"` style times on this page are read.
    fn two_token_rule(&self) -> TwoTokenRule {
        TwoTokenRule::HoursMinutes
    }

    fn default_race_year_policy(&self) -> RaceYearPolicy {
        RaceYearPolicy::Next
    }

    /// Raw standards, one per age group. A page that no longer has the
    /// expected structure is an [`IngestError::SourceStructure`](crate::error::IngestError).
    fn extract_rows(&self, body: &str) -> Result<Vec<RawTimeRow>>;

    /// Descriptive metadata. Never fails; adapters fall back to fixed text.
    fn extract_metadata(&self, body: &str, url: &str) -> RawMetadata;
}

/// Rows of the first table whose headers name an age column and both
/// gender columns. Columns are located by header, so their order on the
/// page does not matter.
pub fn headed_table_rows(body: &str, location: &str) -> Result<Vec<RawTimeRow>> {
    for table in tables(body) {
        let age = table.header_index(|h| h.contains("age"));
        let women = table.header_index(|h| has_word(h, "women"));
        let men = table.header_index(|h| has_word(h, "men"));
        let (Some(age), Some(women), Some(men)) = (age, women, men) else {
            continue;
        };

        let width = age.max(women).max(men);
        return Ok(table
            .rows
            .iter()
            .filter(|cells| cells.len() > width)
            .map(|cells| RawTimeRow::new(&cells[age], &cells[women], &cells[men]))
            .collect());
    }

    Err(IngestError::structure(
        location,
        "no table with age, men and women columns",
    ))
}

/// An adapter with its config resolved.
pub struct ResolvedSite<'a> {
    pub adapter: &'a dyn SiteAdapter,
    pub enabled: bool,
    pub url: String,
    pub race_year: RaceYearPolicy,
}

/// Registry of site adapters.
///
/// Use [`AdapterRegistry::with_builtins`] for the six shipped races, then
/// optionally [`register`](AdapterRegistry::register) more.
pub struct AdapterRegistry {
    adapters: Vec<Box<dyn SiteAdapter>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self {
            adapters: Vec::new(),
        }
    }

    pub fn with_builtins() -> Self {
        use crate::site_berlin::BerlinSite;
        use crate::site_boston::BostonSite;
        use crate::site_chicago::ChicagoSite;
        use crate::site_london::LondonSite;
        use crate::site_new_york::NewYorkSite;
        use crate::site_tokyo::TokyoSite;

        let mut registry = Self::new();
        registry.register(Box::new(BostonSite));
        registry.register(Box::new(LondonSite));
        registry.register(Box::new(TokyoSite));
        registry.register(Box::new(NewYorkSite));
        registry.register(Box::new(ChicagoSite));
        registry.register(Box::new(BerlinSite));
        registry
    }

    /// Register an adapter. [`find`](AdapterRegistry::find) returns the
    /// first one registered under a name.
    pub fn register(&mut self, adapter: Box<dyn SiteAdapter>) {
        self.adapters.push(adapter);
    }

    pub fn adapters(&self) -> &[Box<dyn SiteAdapter>] {
        &self.adapters
    }

    pub fn find(&self, name: &str) -> Option<&dyn SiteAdapter> {
        self.adapters
            .iter()
            .find(|a| a.name() == name)
            .map(|a| a.as_ref())
    }

    /// Adapters selected by `target` (`"all"` or one name), with config
    /// applied. With `"all"`, every adapter is returned; callers skip the
    /// disabled ones.
    pub fn resolve<'a>(&'a self, config: &Config, target: &str) -> anyhow::Result<Vec<ResolvedSite<'a>>> {
        let selected: Vec<&dyn SiteAdapter> = if target == "all" {
            self.adapters.iter().map(|a| a.as_ref()).collect()
        } else {
            let adapter = self.find(target).ok_or_else(|| {
                let names: Vec<&str> = self.adapters.iter().map(|a| a.name()).collect();
                anyhow::anyhow!("Unknown source: '{}'. Available: {}", target, names.join(", "))
            })?;
            vec![adapter]
        };

        Ok(selected
            .into_iter()
            .map(|adapter| {
                let source = config.source(adapter.name());
                ResolvedSite {
                    adapter,
                    enabled: source.enabled,
                    url: source
                        .url
                        .unwrap_or_else(|| adapter.default_url().to_string()),
                    race_year: source
                        .race_year
                        .unwrap_or_else(|| adapter.default_race_year_policy()),
                }
            })
            .collect())
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(extra: &str) -> Config {
        toml::from_str(&format!("[db]\npath = \"x.sqlite\"\n{}", extra)).unwrap()
    }

    #[test]
    fn test_builtins_match_site_names() {
        let registry = AdapterRegistry::with_builtins();
        let names: Vec<&str> = registry.adapters().iter().map(|a| a.name()).collect();
        assert_eq!(names, BUILTIN_SITES);
        assert_eq!(registry.len(), 6);
        assert_eq!(registry.find("new_york").unwrap().location(), "New York");
    }

    #[test]
    fn test_resolve_applies_config() {
        let registry = AdapterRegistry::with_builtins();
        let cfg = config(
            "[sources.chicago]\nurl = \"file:///tmp/chicago.html\"\nrace_year = \"current\"\n\
             [sources.tokyo]\nenabled = false\n",
        );

        let all = registry.resolve(&cfg, "all").unwrap();
        assert_eq!(all.len(), 6);
        let chicago = all.iter().find(|s| s.adapter.name() == "chicago").unwrap();
        assert_eq!(chicago.url, "file:///tmp/chicago.html");
        assert_eq!(chicago.race_year, RaceYearPolicy::Current);
        assert!(!all.iter().find(|s| s.adapter.name() == "tokyo").unwrap().enabled);

        let one = registry.resolve(&cfg, "boston").unwrap();
        assert_eq!(one.len(), 1);
        assert_eq!(one[0].url, registry.find("boston").unwrap().default_url());
        assert_eq!(one[0].race_year, RaceYearPolicy::Next);
    }

    #[test]
    fn test_resolve_unknown_source() {
        let registry = AdapterRegistry::with_builtins();
        let err = registry.resolve(&config(""), "atlantis").err().unwrap();
        assert!(err.to_string().contains("Unknown source"));
    }

    #[test]
    fn test_headed_table_rows_by_header() {
        let body = "<table><tr><th>Women</th><th>Age</th><th>Men</th></tr>\
                    <tr><td>3:30:00</td><td>18-34</td><td>3:00:00</td></tr>\
                    <tr><td>short row</td></tr></table>";
        let rows = headed_table_rows(body, "Boston").unwrap();
        assert_eq!(rows, vec![RawTimeRow::new("18-34", "3:30:00", "3:00:00")]);
    }

    #[test]
    fn test_headed_table_rows_skips_other_tables() {
        let body = "<table><tr><th>Date</th><th>Event</th></tr><tr><td>a</td><td>b</td></tr></table>\
                    <table><tr><th>Age group</th><th>Men</th><th>Women</th></tr>\
                    <tr><td>40-44</td><td>3:10</td><td>3:40</td></tr></table>";
        let rows = headed_table_rows(body, "Boston").unwrap();
        assert_eq!(rows, vec![RawTimeRow::new("40-44", "3:40", "3:10")]);

        let err = headed_table_rows("<p>moved</p>", "Boston").unwrap_err();
        assert!(matches!(err, IngestError::SourceStructure { .. }));
    }

    #[test]
    fn test_empty_registry() {
        let registry = AdapterRegistry::default();
        assert!(registry.is_empty());
        assert!(registry.find("boston").is_none());
    }
}
