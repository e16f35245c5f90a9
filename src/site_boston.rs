//! Boston Marathon (B.A.A.) qualifying standards.

use marathon_quals_core::models::{RawMetadata, RawTimeRow};

use crate::error::Result;
use crate::traits::{headed_table_rows, SiteAdapter};

pub struct BostonSite;

impl SiteAdapter for BostonSite {
    fn name(&self) -> &str {
        "boston"
    }

    fn location(&self) -> &str {
        "Boston"
    }

    fn default_url(&self) -> &str {
        "https://www.baa.org/races/boston-marathon/qualify"
    }

    fn extract_rows(&self, body: &str) -> Result<Vec<RawTimeRow>> {
        headed_table_rows(body, self.location())
    }

    fn extract_metadata(&self, _body: &str, url: &str) -> RawMetadata {
        RawMetadata {
            qualifying_text: "See B.A.A. site for qualifying window details.".to_string(),
            link_text: "Qualifier registration information (B.A.A.)".to_string(),
            link_url: url.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <div class="qualifying-standards">
          <table>
            <thead>
              <tr><th>Age Group</th><th>Men</th><th>Women and Non-Binary</th></tr>
            </thead>
            <tbody>
              <tr><td>18-34</td><td>2hrs 55min 00sec</td><td>3hrs 25min 00sec</td></tr>
              <tr><td>35-39</td><td>3hrs 00min 00sec</td><td>3hrs 30min 00sec</td></tr>
              <tr><td>80 and over</td><td>4hrs 50min 00sec</td><td>5hrs 20min 00sec</td></tr>
            </tbody>
          </table>
        </div>
    "#;

    #[test]
    fn test_extract_rows() {
        let rows = BostonSite.extract_rows(PAGE).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(
            rows[0],
            RawTimeRow::new("18-34", "3hrs 25min 00sec", "2hrs 55min 00sec")
        );
        assert_eq!(rows[2].age_group_text, "80 and over");
    }

    #[test]
    fn test_missing_table_is_structure_error() {
        assert!(BostonSite.extract_rows("<p>Qualifying opens soon</p>").is_err());
    }

    #[test]
    fn test_metadata_is_fixed_text() {
        let meta = BostonSite.extract_metadata(PAGE, "https://www.baa.org/q");
        assert_eq!(meta.link_url, "https://www.baa.org/q");
        assert!(meta.link_text.contains("B.A.A."));
    }
}
