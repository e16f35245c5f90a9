//! London Marathon good-for-age standards.

use marathon_quals_core::models::{RawMetadata, RawTimeRow};

use crate::error::Result;
use crate::html::{elements, links};
use crate::traits::{headed_table_rows, SiteAdapter};

const NOT_FOUND: &str = "Not found";

pub struct LondonSite;

impl SiteAdapter for LondonSite {
    fn name(&self) -> &str {
        "london"
    }

    fn location(&self) -> &str {
        "London"
    }

    fn default_url(&self) -> &str {
        "https://www.londonmarathonevents.co.uk/london-marathon/good-age-entry"
    }

    fn extract_rows(&self, body: &str) -> Result<Vec<RawTimeRow>> {
        headed_table_rows(body, self.location())
    }

    fn extract_metadata(&self, body: &str, url: &str) -> RawMetadata {
        let (link_text, link_url) = links(body)
            .into_iter()
            .find(|(_, href)| href.contains("worldrunning"))
            .unwrap_or_else(|| (NOT_FOUND.to_string(), url.to_string()));

        RawMetadata {
            qualifying_text: qualifying_text(body).unwrap_or_else(|| NOT_FOUND.to_string()),
            link_text,
            link_url,
        }
    }
}

/// The second paragraph of the inset-text block, else the first non-empty
/// paragraph inside `<main>`.
fn qualifying_text(body: &str) -> Option<String> {
    let lower = body.to_ascii_lowercase();

    if let Some(at) = lower.find("paragraph--type--inset-text") {
        let text = elements(&body[at..], &["p"])
            .get(1)
            .map(|p| p.text())
            .filter(|t| !t.is_empty());
        if text.is_some() {
            return text;
        }
    }

    elements(body, &["main"]).first().and_then(|main| {
        elements(main.inner, &["p"])
            .iter()
            .map(|p| p.text())
            .find(|t| !t.is_empty())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <main>
          <p></p>
          <p>Good for age entries are for UK residents.</p>
          <div class="paragraph paragraph--type--inset-text">
            <p>Qualifying window</p>
            <p>Times must be run between 1 January and the ballot closing date.</p>
          </div>
          <p>Races must be on the <a href="https://www.aims-worldrunning.org/calendar">AIMS calendar</a>.</p>
          <table>
            <tr><th>Age</th><th>Women</th><th>Men</th></tr>
            <tr><td>18-39</td><td>Sub 3:45</td><td>Sub 3:00</td></tr>
            <tr><td>90+</td><td>Sub 8:30</td><td>Sub 8:00</td></tr>
          </table>
        </main>
    "#;

    #[test]
    fn test_extract_rows() {
        let rows = LondonSite.extract_rows(PAGE).unwrap();
        assert_eq!(
            rows,
            vec![
                RawTimeRow::new("18-39", "Sub 3:45", "Sub 3:00"),
                RawTimeRow::new("90+", "Sub 8:30", "Sub 8:00"),
            ]
        );
    }

    #[test]
    fn test_metadata_from_page() {
        let meta = LondonSite.extract_metadata(PAGE, "https://london.example/gfa");
        assert_eq!(
            meta.qualifying_text,
            "Times must be run between 1 January and the ballot closing date."
        );
        assert_eq!(meta.link_text, "AIMS calendar");
        assert_eq!(meta.link_url, "https://www.aims-worldrunning.org/calendar");
    }

    #[test]
    fn test_metadata_fallbacks() {
        let meta = LondonSite.extract_metadata(
            "<main><p> </p><p>Apply in spring.</p></main>",
            "https://london.example/gfa",
        );
        assert_eq!(meta.qualifying_text, "Apply in spring.");
        assert_eq!(meta.link_text, "Not found");
        assert_eq!(meta.link_url, "https://london.example/gfa");

        let bare = LondonSite.extract_metadata("", "u");
        assert_eq!(bare.qualifying_text, "Not found");
    }
}
