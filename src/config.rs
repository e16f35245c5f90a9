use anyhow::{Context, Result};
use chrono::{DateTime, Datelike, Utc};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use marathon_quals_core::models::Gender;

use crate::traits::BUILTIN_SITES;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub runner: RunnerConfig,
    #[serde(default)]
    pub sources: BTreeMap<String, SourceConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FetchConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_backoff_base_secs")]
    pub backoff_base_secs: f64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            backoff_base_secs: default_backoff_base_secs(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_max_retries() -> u32 {
    3
}
fn default_backoff_base_secs() -> f64 {
    1.5
}
fn default_timeout_secs() -> u64 {
    15
}
fn default_user_agent() -> String {
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_5) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36"
        .to_string()
}

/// Defaults for `mq check` when flags are omitted.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct RunnerConfig {
    pub age: Option<u32>,
    pub gender: Option<Gender>,
    pub location: Option<String>,
    pub personal_best: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SourceConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Overrides the adapter's built-in URL. `file://` paths are allowed.
    pub url: Option<String>,
    pub race_year: Option<RaceYearPolicy>,
}

fn default_enabled() -> bool {
    true
}

/// Which running of a race a scrape describes.
///
/// Registration pages advertise the next edition for most of the year, but
/// some flip over only after a given month.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RaceYearPolicy {
    Current,
    #[default]
    Next,
    /// Current year through month `M`, next year afterwards.
    AfterMonth(u32),
}

impl RaceYearPolicy {
    pub fn race_year(&self, scraped_at: DateTime<Utc>) -> i32 {
        let year = scraped_at.year();
        match *self {
            RaceYearPolicy::Current => year,
            RaceYearPolicy::Next => year + 1,
            RaceYearPolicy::AfterMonth(m) if scraped_at.month() > m => year + 1,
            RaceYearPolicy::AfterMonth(_) => year,
        }
    }
}

impl std::fmt::Display for RaceYearPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RaceYearPolicy::Current => f.write_str("current"),
            RaceYearPolicy::Next => f.write_str("next"),
            RaceYearPolicy::AfterMonth(m) => write!(f, "next after month {}", m),
        }
    }
}

impl Config {
    /// Per-source settings, defaulted when the file has no entry.
    pub fn source(&self, name: &str) -> SourceConfig {
        self.sources.get(name).cloned().unwrap_or(SourceConfig {
            enabled: true,
            url: None,
            race_year: None,
        })
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    // Validate fetch
    if config.fetch.max_retries < 1 {
        anyhow::bail!("fetch.max_retries must be >= 1");
    }
    if config.fetch.timeout_secs == 0 {
        anyhow::bail!("fetch.timeout_secs must be > 0");
    }
    if !(config.fetch.backoff_base_secs >= 1.0) {
        anyhow::bail!("fetch.backoff_base_secs must be >= 1.0");
    }

    // Validate runner
    if let Some(age) = config.runner.age {
        if !(1..=120).contains(&age) {
            anyhow::bail!("runner.age must be in 1..=120, got {}", age);
        }
    }

    // Validate sources
    for (name, source) in &config.sources {
        if !BUILTIN_SITES.contains(&name.as_str()) {
            anyhow::bail!(
                "Unknown source: '{}'. Available: {}",
                name,
                BUILTIN_SITES.join(", ")
            );
        }
        if let Some(RaceYearPolicy::AfterMonth(m)) = source.race_year {
            if !(1..=12).contains(&m) {
                anyhow::bail!("sources.{}.race_year.after_month must be in 1..=12", name);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn parse(toml_str: &str) -> Result<Config> {
        let config: Config = toml::from_str(toml_str)?;
        validate(&config)?;
        Ok(config)
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = parse("[db]\npath = \"./data/mq.sqlite\"\n").unwrap();
        assert_eq!(config.fetch.max_retries, 3);
        assert_eq!(config.fetch.timeout_secs, 15);
        assert!(config.sources.is_empty());
        let boston = config.source("boston");
        assert!(boston.enabled);
        assert_eq!(boston.race_year, None);
    }

    #[test]
    fn test_full_config() {
        let config = parse(
            r#"
            [db]
            path = "/tmp/mq.sqlite"

            [fetch]
            max_retries = 5
            backoff_base_secs = 2.0

            [runner]
            age = 42
            gender = "women"
            location = "Boston"
            personal_best = "3:35:00"

            [sources.boston]
            race_year = "current"

            [sources.london]
            enabled = false
            race_year = { after_month = 9 }
            "#,
        )
        .unwrap();
        assert_eq!(config.runner.gender, Some(Gender::Women));
        assert_eq!(config.source("boston").race_year, Some(RaceYearPolicy::Current));
        assert!(!config.source("london").enabled);
        assert_eq!(
            config.source("london").race_year,
            Some(RaceYearPolicy::AfterMonth(9))
        );
    }

    #[test]
    fn test_runner_gender_accepts_any_case() {
        let config = parse("[db]\npath = \"x\"\n[runner]\ngender = \"Women\"\n").unwrap();
        assert_eq!(config.runner.gender, Some(Gender::Women));
        let config = parse("[db]\npath = \"x\"\n[runner]\ngender = \"MEN\"\n").unwrap();
        assert_eq!(config.runner.gender, Some(Gender::Men));
        assert!(parse("[db]\npath = \"x\"\n[runner]\ngender = \"both\"\n").is_err());
    }

    #[test]
    fn test_rejects_unknown_source() {
        let err = parse("[db]\npath = \"x\"\n[sources.atlantis]\n").unwrap_err();
        assert!(err.to_string().contains("Unknown source"));
    }

    #[test]
    fn test_rejects_bad_fetch_settings() {
        assert!(parse("[db]\npath = \"x\"\n[fetch]\nmax_retries = 0\n").is_err());
        assert!(parse("[db]\npath = \"x\"\n[fetch]\nbackoff_base_secs = 0.5\n").is_err());
    }

    #[test]
    fn test_race_year_policy() {
        let march = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        let october = Utc.with_ymd_and_hms(2026, 10, 1, 0, 0, 0).unwrap();
        assert_eq!(RaceYearPolicy::Current.race_year(march), 2026);
        assert_eq!(RaceYearPolicy::Next.race_year(march), 2027);
        assert_eq!(RaceYearPolicy::AfterMonth(9).race_year(march), 2026);
        assert_eq!(RaceYearPolicy::AfterMonth(9).race_year(october), 2027);
    }
}
