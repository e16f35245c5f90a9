use anyhow::Result;

use crate::config::Config;
use crate::traits::AdapterRegistry;

/// One row of `mq sources`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceStatus {
    pub name: String,
    pub location: String,
    pub enabled: bool,
    pub race_year: String,
    pub url: String,
}

pub fn get_sources(config: &Config) -> Result<Vec<SourceStatus>> {
    let registry = AdapterRegistry::with_builtins();
    Ok(registry
        .resolve(config, "all")?
        .into_iter()
        .map(|site| SourceStatus {
            name: site.adapter.name().to_string(),
            location: site.adapter.location().to_string(),
            enabled: site.enabled,
            race_year: site.race_year.to_string(),
            url: site.url,
        })
        .collect())
}

pub fn list_sources(config: &Config) -> Result<()> {
    println!(
        "{:<10} {:<10} {:<8} {:<22} URL",
        "SOURCE", "LOCATION", "ENABLED", "RACE YEAR"
    );
    for s in get_sources(config)? {
        println!(
            "{:<10} {:<10} {:<8} {:<22} {}",
            s.name, s.location, s.enabled, s.race_year, s.url
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_sources_reflects_config() {
        let config: Config = toml::from_str(
            "[db]\npath = \"x.sqlite\"\n[sources.berlin]\nenabled = false\nrace_year = { after_month = 9 }\n",
        )
        .unwrap();
        let sources = get_sources(&config).unwrap();
        assert_eq!(sources.len(), 6);

        let berlin = sources.iter().find(|s| s.name == "berlin").unwrap();
        assert!(!berlin.enabled);
        assert_eq!(berlin.race_year, "next after month 9");

        let boston = sources.iter().find(|s| s.name == "boston").unwrap();
        assert!(boston.enabled);
        assert_eq!(boston.race_year, "next");
        assert!(boston.url.starts_with("https://www.baa.org/"));
    }
}
