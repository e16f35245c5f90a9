//! Query commands: `check`, `top`, `classify`, `parse-time`.
//!
//! Results go to stdout. A missing standard is a normal answer here, printed
//! as "not found" with a reason; only config and storage problems are errors.

use anyhow::{anyhow, Context, Result};

use marathon_quals_core::classify::{classify, scheme_for};
use marathon_quals_core::models::Gender;
use marathon_quals_core::query::{
    margin_report, top_times, MarginReport, NotFoundReason, RunnerQuery, StandardLookup, TopTime,
};
use marathon_quals_core::time::{format_hms, format_margin, normalize_time_with, TwoTokenRule};

use crate::config::Config;
use crate::db;
use crate::sqlite_store::SqliteStore;

/// `mq check` flags; unset ones fall back to `[runner]` in config.
#[derive(Debug, Clone, Default)]
pub struct CheckArgs {
    pub age: Option<u32>,
    pub gender: Option<Gender>,
    pub location: Option<String>,
    pub personal_best: Option<String>,
}

/// Merge flags over config defaults. Age, gender and location are required
/// from one or the other.
pub fn resolve_query(config: &Config, args: &CheckArgs) -> Result<RunnerQuery> {
    let runner = &config.runner;
    let age = args
        .age
        .or(runner.age)
        .ok_or_else(|| anyhow!("missing --age (or runner.age in config)"))?;
    let gender = args
        .gender
        .or(runner.gender)
        .ok_or_else(|| anyhow!("missing --gender (or runner.gender in config)"))?;
    let location = args
        .location
        .clone()
        .or_else(|| runner.location.clone())
        .ok_or_else(|| anyhow!("missing --location (or runner.location in config)"))?;

    Ok(RunnerQuery {
        age,
        gender,
        location,
        personal_best: args
            .personal_best
            .clone()
            .or_else(|| runner.personal_best.clone()),
    })
}

fn describe_not_found(reason: &NotFoundReason) -> String {
    match reason {
        NotFoundReason::UnknownLocation => "no qualifying times stored for this location".to_string(),
        NotFoundReason::NoMatchingBracket => "no stored age group contains this age".to_string(),
        NotFoundReason::UnparsableStandard { age_group } => {
            format!("the {} standard could not be parsed", age_group)
        }
    }
}

/// Human-readable lines for a [`MarginReport`].
pub fn format_check(report: &MarginReport) -> String {
    let mut out = Vec::new();
    out.push(format!("check {}", report.location));
    out.push(format!(
        "  runner: {} {}, age group {}",
        report.gender, report.age, report.classified_age_group
    ));

    match &report.standard {
        StandardLookup::Found(s) => {
            out.push(format!(
                "  standard: {} ({})",
                s.time_text.clone().unwrap_or_else(|| format_hms(s.seconds)),
                s.age_group
            ));
        }
        StandardLookup::NotFound(reason) => {
            out.push(format!("  standard: not found ({})", describe_not_found(reason)));
        }
    }

    if let Some(pb) = &report.personal_best_text {
        out.push(format!("  personal best: {}", pb));
    }
    if let Some(err) = &report.personal_best_error {
        out.push(format!("  personal best: {}", err));
    }
    if let Some(margin) = report.margin_seconds {
        let verdict = if margin <= 0 { "qualifies" } else { "does not qualify" };
        out.push(format!("  margin: {} ({})", format_margin(margin), verdict));
    }

    out.join("\n")
}

pub async fn run_check(config: &Config, args: &CheckArgs, json: bool) -> Result<()> {
    let query = resolve_query(config, args)?;
    let store = SqliteStore::new(db::connect(config).await?);

    let report = margin_report(&store, &query)
        .await
        .context("Failed to look up qualifying standard")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", format_check(&report));
    }
    store.pool().close().await;
    Ok(())
}

pub fn format_top(location: &str, gender: Gender, rows: &[TopTime]) -> String {
    if rows.is_empty() {
        return format!("No qualifying times for {} ({}).", location, gender);
    }
    let mut out = vec![format!("top {} ({})", location, gender)];
    for (i, row) in rows.iter().enumerate() {
        out.push(format!(
            "{:>3}. {:<14} {}",
            i + 1,
            row.age_group,
            row.time_text.as_deref().unwrap_or("unparsed")
        ));
    }
    out.join("\n")
}

pub async fn run_top(
    config: &Config,
    location: &str,
    age_group: Option<&str>,
    gender: Gender,
    limit: usize,
    json: bool,
) -> Result<()> {
    let store = SqliteStore::new(db::connect(config).await?);
    let rows = top_times(&store, location, age_group, gender, limit)
        .await
        .context("Failed to read qualifying times")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        println!("{}", format_top(location, gender, &rows));
    }
    store.pool().close().await;
    Ok(())
}

pub fn run_classify(age: u32, location: &str) -> Result<()> {
    println!("{}", classify(age, location));
    if scheme_for(location).is_none() {
        eprintln!("note: {} has no known bracket scheme", location);
    }
    Ok(())
}

pub fn run_parse_time(text: &str, minutes_seconds: bool) -> Result<()> {
    let rule = if minutes_seconds {
        TwoTokenRule::MinutesSeconds
    } else {
        TwoTokenRule::HoursMinutes
    };
    let parsed = normalize_time_with(text, rule);
    match (&parsed.text, parsed.seconds) {
        (Some(canonical), Some(seconds)) => {
            println!("text: {}", canonical);
            println!("seconds: {}", seconds);
        }
        _ => println!("unparsable: {:?}", text),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use marathon_quals_core::query::Standard;

    fn config(runner: &str) -> Config {
        toml::from_str(&format!("[db]\npath = \"x.sqlite\"\n[runner]\n{}", runner)).unwrap()
    }

    #[test]
    fn test_resolve_query_flags_override_config() {
        let cfg = config(
            "age = 30\ngender = \"men\"\nlocation = \"London\"\npersonal_best = \"2:59:00\"",
        );
        let query = resolve_query(
            &cfg,
            &CheckArgs {
                age: Some(41),
                location: Some("Boston".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(query.age, 41);
        assert_eq!(query.gender, Gender::Men);
        assert_eq!(query.location, "Boston");
        assert_eq!(query.personal_best.as_deref(), Some("2:59:00"));
    }

    #[test]
    fn test_resolve_query_requires_fields() {
        let err = resolve_query(&config(""), &CheckArgs::default()).unwrap_err();
        assert!(err.to_string().contains("--age"));
    }

    fn report(standard: StandardLookup, margin: Option<i64>) -> MarginReport {
        MarginReport {
            location: "Boston".to_string(),
            age: 42,
            gender: Gender::Women,
            classified_age_group: "40-44".to_string(),
            standard,
            personal_best_text: Some("3:35:30".to_string()),
            personal_best_seconds: Some(12930),
            margin_seconds: margin,
            personal_best_error: None,
        }
    }

    #[test]
    fn test_format_check_found() {
        let text = format_check(&report(
            StandardLookup::Found(Standard {
                location: "Boston".to_string(),
                age_group: "40-44".to_string(),
                gender: Gender::Women,
                time_text: Some("3:40:00".to_string()),
                seconds: 13200,
            }),
            Some(-270),
        ));
        assert!(text.contains("standard: 3:40:00 (40-44)"));
        assert!(text.contains("margin: -4:30 (qualifies)"));
    }

    #[test]
    fn test_format_check_not_found() {
        let text = format_check(&report(
            StandardLookup::NotFound(NotFoundReason::UnknownLocation),
            None,
        ));
        assert!(text.contains("standard: not found"));
        assert!(!text.contains("margin"));
    }

    #[test]
    fn test_format_top() {
        let rows = vec![TopTime {
            location: "London".to_string(),
            age_group: "18-39".to_string(),
            gender: Gender::Men,
            time_text: Some("3:00:00".to_string()),
            seconds: Some(10800),
        }];
        let text = format_top("London", Gender::Men, &rows);
        assert!(text.starts_with("top London (Men)"));
        assert!(text.contains("1. 18-39"));
        assert!(format_top("Paris", Gender::Men, &[]).contains("No qualifying times"));
    }
}
