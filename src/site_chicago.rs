//! Chicago Marathon time qualifier standards.

use marathon_quals_core::models::{RawMetadata, RawTimeRow};

use crate::error::{IngestError, Result};
use crate::html::tables;
use crate::traits::SiteAdapter;

pub struct ChicagoSite;

impl SiteAdapter for ChicagoSite {
    fn name(&self) -> &str {
        "chicago"
    }

    fn location(&self) -> &str {
        "Chicago"
    }

    fn default_url(&self) -> &str {
        "https://www.chicagomarathon.com/apply/"
    }

    /// First table on the page, columns Age / Men / Women.
    fn extract_rows(&self, body: &str) -> Result<Vec<RawTimeRow>> {
        let table = tables(body)
            .into_iter()
            .next()
            .ok_or_else(|| IngestError::structure(self.location(), "no table on page"))?;

        Ok(table
            .rows
            .iter()
            .filter(|cols| cols.len() >= 3 && !cols[0].to_lowercase().contains("age"))
            .map(|cols| RawTimeRow::new(&cols[0], &cols[2], &cols[1]))
            .collect())
    }

    fn extract_metadata(&self, _body: &str, url: &str) -> RawMetadata {
        RawMetadata {
            qualifying_text: "Time qualifier standards".to_string(),
            link_text: "Chicago Marathon".to_string(),
            link_url: url.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_rows() {
        let page = r#"
            <table>
              <tr><th>Age</th><th>Men</th><th>Women</th></tr>
              <tr><td>16-29</td><td>3:05:00</td><td>3:35:00</td></tr>
              <tr><td>Age group total</td><td>-</td><td>-</td></tr>
              <tr><td>80+</td><td>5:00:00</td><td>5:30:00</td></tr>
            </table>
        "#;
        let rows = ChicagoSite.extract_rows(page).unwrap();
        assert_eq!(
            rows,
            vec![
                RawTimeRow::new("16-29", "3:35:00", "3:05:00"),
                RawTimeRow::new("80+", "5:30:00", "5:00:00"),
            ]
        );
    }

    #[test]
    fn test_no_table() {
        assert!(ChicagoSite.extract_rows("<p>Registration closed</p>").is_err());
    }
}
