//! Tokyo Marathon "Run as One" elite standards.
//!
//! Tokyo publishes a single standard per gender for every runner 18 and
//! over, inside a table row labelled "Qualifying times":
//!
//! ```text
//! Qualifying times | Men: 2hrs 21min 00sec or faster  Women: 2hrs 52min 00sec or faster
//! ```

use marathon_quals_core::models::{RawMetadata, RawTimeRow};

use crate::error::{IngestError, Result};
use crate::html::elements;
use crate::traits::SiteAdapter;

pub struct TokyoSite;

impl SiteAdapter for TokyoSite {
    fn name(&self) -> &str {
        "tokyo"
    }

    fn location(&self) -> &str {
        "Tokyo"
    }

    fn default_url(&self) -> &str {
        "https://www.marathon.tokyo/en/participants/run-as-one/"
    }

    fn extract_rows(&self, body: &str) -> Result<Vec<RawTimeRow>> {
        for tr in elements(body, &["tr"]) {
            let cells = elements(tr.inner, &["td"]);
            if cells.len() < 2 || !cells[0].text().to_lowercase().contains("qualifying times") {
                continue;
            }

            let text = cells[1].text();
            if let (Some(men), Some(women)) = (
                duration_after(&text, &["men", "male"]),
                duration_after(&text, &["women", "female"]),
            ) {
                return Ok(vec![RawTimeRow::new("18+", women, men)]);
            }
        }

        Err(IngestError::structure(
            self.location(),
            "no \"Qualifying times\" row with both men's and women's times",
        ))
    }

    fn extract_metadata(&self, _body: &str, url: &str) -> RawMetadata {
        RawMetadata {
            qualifying_text: "Elite qualifying standards (Run as One)".to_string(),
            link_text: "Tokyo Marathon \u{2013} Run as One".to_string(),
            link_url: url.to_string(),
        }
    }
}

/// Alphanumeric runs of `text` as byte ranges.
fn word_spans(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut start = None;
    for (i, c) in text.char_indices() {
        match (c.is_alphanumeric(), start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                spans.push((s, i));
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        spans.push((s, text.len()));
    }
    spans
}

/// The `2hrs 21min 00sec` phrase following the first whole-word `markers`
/// occurrence, stopping at the next gender word.
fn duration_after(text: &str, markers: &[&str]) -> Option<String> {
    const GENDER_WORDS: &[&str] = &["men", "male", "women", "female"];

    let spans = word_spans(text);
    let word = |i: usize| text[spans[i].0..spans[i].1].to_lowercase();

    let marker = (0..spans.len()).find(|&i| markers.contains(&word(i).as_str()))?;
    let mut first = None;
    let mut last = None;

    for i in marker + 1..spans.len() {
        let w = word(i);
        if GENDER_WORDS.contains(&w.as_str()) {
            break;
        }
        let has_digit = w.chars().any(|c| c.is_ascii_digit());
        if first.is_none() && has_digit && w.contains("hr") {
            first = Some(i);
        }
        if first.is_some() && (w.contains("min") || w.contains("sec")) {
            last = Some(i);
            if w.contains("sec") {
                break;
            }
        }
    }

    let (first, last) = (first?, last.or(first)?);
    Some(text[spans[first].0..spans[last].1].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <table>
          <tr><td>Eligibility</td><td>Age 19 or over on race day</td></tr>
          <tr>
            <td>Qualifying Times</td>
            <td>Men: 2hrs 21min 00sec or faster<br>Women: 2hrs 52min 00sec or faster</td>
          </tr>
        </table>
    "#;

    #[test]
    fn test_extract_rows() {
        let rows = TokyoSite.extract_rows(PAGE).unwrap();
        assert_eq!(
            rows,
            vec![RawTimeRow::new("18+", "2hrs 52min 00sec", "2hrs 21min 00sec")]
        );
    }

    #[test]
    fn test_women_listed_first() {
        let text = "Women 2hrs 52min 00sec / Men 2hrs 21min 00sec";
        assert_eq!(duration_after(text, &["men"]).as_deref(), Some("2hrs 21min 00sec"));
        assert_eq!(duration_after(text, &["women"]).as_deref(), Some("2hrs 52min 00sec"));
    }

    #[test]
    fn test_missing_gender_is_structure_error() {
        let page = "<table><tr><td>Qualifying times</td><td>Men: 2hrs 21min 00sec</td></tr></table>";
        assert!(matches!(
            TokyoSite.extract_rows(page),
            Err(IngestError::SourceStructure { .. })
        ));
    }
}
