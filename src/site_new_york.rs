//! New York City Marathon time qualifiers.
//!
//! NYRR lists men and women in two separate tables with matching age rows.

use marathon_quals_core::models::{RawMetadata, RawTimeRow};

use crate::error::{IngestError, Result};
use crate::html::tables;
use crate::traits::SiteAdapter;

pub struct NewYorkSite;

impl SiteAdapter for NewYorkSite {
    fn name(&self) -> &str {
        "new_york"
    }

    fn location(&self) -> &str {
        "New York"
    }

    fn default_url(&self) -> &str {
        "https://www.nyrr.org/tcsnycmarathon/runners/marathon-time-qualifiers"
    }

    fn extract_rows(&self, body: &str) -> Result<Vec<RawTimeRow>> {
        let tables = tables(body);
        let [men, women, ..] = tables.as_slice() else {
            return Err(IngestError::structure(
                self.location(),
                format!("expected separate men's and women's tables, found {}", tables.len()),
            ));
        };

        Ok(men
            .rows
            .iter()
            .zip(&women.rows)
            .filter(|(m, w)| m.len() >= 2 && w.len() >= 2)
            .filter(|(m, _)| !m[0].to_lowercase().contains("age"))
            .map(|(m, w)| RawTimeRow::new(&m[0], &w[1], &m[1]))
            .collect())
    }

    fn extract_metadata(&self, _body: &str, url: &str) -> RawMetadata {
        RawMetadata {
            qualifying_text: "Time qualifiers".to_string(),
            link_text: "NYRR".to_string(),
            link_url: url.to_string(),
        }
    }
}
