//! Berlin Marathon qualifying standards.
//!
//! Berlin has no table. A `<strong>Qualifying times</strong>` heading is
//! followed by list items such as:
//!
//! ```text
//! Male runners up to 44 years: under 2:45 hours
//! Female runners up to 44 years: under 3:00 hours
//! Male runners over 45 years: under 2:55 hours
//! ```
//!
//! Male and female items are paired in page order. "up to N years" becomes
//! the bracket `18-N`, "over N years" becomes `N+`.

use marathon_quals_core::models::{RawMetadata, RawTimeRow};
use tracing::warn;

use crate::error::{IngestError, Result};
use crate::html::elements;
use crate::traits::SiteAdapter;

pub struct BerlinSite;

impl SiteAdapter for BerlinSite {
    fn name(&self) -> &str {
        "berlin"
    }

    fn location(&self) -> &str {
        "Berlin"
    }

    fn default_url(&self) -> &str {
        "https://www.bmw-berlin-marathon.com/en/registration/lottery"
    }

    fn extract_rows(&self, body: &str) -> Result<Vec<RawTimeRow>> {
        let section = qualifying_section(body).ok_or_else(|| {
            IngestError::structure(self.location(), "no \"Qualifying times\" section")
        })?;

        let mut male = Vec::new();
        let mut female = Vec::new();
        for li in elements(section, &["li"]) {
            let text = li.text();
            let lower = text.to_lowercase();
            if lower.starts_with("female") || lower.starts_with("women") {
                female.push(text);
            } else if lower.starts_with("male")
                || lower.starts_with("men")
                || lower.starts_with("runners")
            {
                male.push(text);
            }
        }

        let mut rows = Vec::new();
        for (m, f) in male.iter().zip(&female) {
            let Some(age_group) = age_group(m) else {
                warn!(location = self.location(), item = %m, "no age range in list item");
                continue;
            };
            rows.push(RawTimeRow::new(
                age_group,
                time_phrase(f).unwrap_or_default(),
                time_phrase(m).unwrap_or_default(),
            ));
        }

        if rows.is_empty() {
            return Err(IngestError::structure(
                self.location(),
                "qualifying section has no paired list items",
            ));
        }
        Ok(rows)
    }

    fn extract_metadata(&self, _body: &str, url: &str) -> RawMetadata {
        RawMetadata {
            qualifying_text: "Official Berlin Marathon qualifying standards".to_string(),
            link_text: "Berlin Marathon".to_string(),
            link_url: url.to_string(),
        }
    }
}

/// Page text from the "Qualifying times" heading to the end of its block.
fn qualifying_section(body: &str) -> Option<&str> {
    let heading = elements(body, &["strong"])
        .into_iter()
        .find(|s| s.text().to_lowercase().contains("qualifying times"))?;

    let rest = &body[heading.start..];
    let end = rest.to_ascii_lowercase().find("</div>").unwrap_or(rest.len());
    Some(&rest[..end])
}

/// Leading digits of `s`.
fn leading_number(s: &str) -> Option<u32> {
    let digits: String = s.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

fn age_group(item: &str) -> Option<String> {
    let lower = item.to_ascii_lowercase();
    if let Some(at) = lower.find("up to ") {
        return leading_number(&lower[at + 6..]).map(|n| format!("18-{}", n));
    }
    if let Some(at) = lower.find("over ") {
        return leading_number(&lower[at + 5..]).map(|n| format!("{}+", n));
    }
    None
}

/// `"under 2:45 hours"` out of a list item, for the time normalizer.
fn time_phrase(item: &str) -> Option<String> {
    let lower = item.to_ascii_lowercase();
    let start = lower.find("under ")?;
    let end = lower[start..]
        .find("hour")
        .map(|rel| {
            let from = start + rel;
            from + lower[from..]
                .find(|c: char| !c.is_alphabetic())
                .unwrap_or(lower.len() - from)
        })
        .unwrap_or(lower.len());
    Some(item[start..end].trim().to_string())
}
