//! Error types for the ingestion pipeline.
//!
//! Each variant says how far a failure reaches: a source-level error skips
//! one race and the run carries on; a reconcile error carrying
//! [`CoreError::Storage`] ends the run.

use thiserror::Error;

use marathon_quals_core::Error as CoreError;

#[derive(Error, Debug)]
pub enum IngestError {
    /// The page was fetched but the expected table or section is missing.
    #[error("{location}: page structure not recognized: {reason}")]
    SourceStructure { location: String, reason: String },

    /// Every fetch attempt failed.
    #[error("fetching {url} failed after {attempts} attempt(s): {last_error}")]
    FetchExhausted {
        url: String,
        attempts: u32,
        last_error: String,
    },

    #[error(transparent)]
    Reconcile(#[from] CoreError),
}

impl IngestError {
    pub fn structure(location: &str, reason: impl Into<String>) -> Self {
        IngestError::SourceStructure {
            location: location.to_string(),
            reason: reason.into(),
        }
    }

    /// Whether the run must stop instead of moving to the next source.
    pub fn is_fatal(&self) -> bool {
        matches!(self, IngestError::Reconcile(CoreError::Storage(_)))
    }
}

/// Convenience Result type using [`IngestError`].
pub type Result<T> = std::result::Result<T, IngestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_storage_is_fatal() {
        assert!(IngestError::Reconcile(CoreError::Storage("down".into())).is_fatal());
        assert!(!IngestError::Reconcile(CoreError::Validation("no key".into())).is_fatal());
        assert!(!IngestError::structure("Boston", "no table").is_fatal());
        assert!(!IngestError::FetchExhausted {
            url: "https://example.invalid".into(),
            attempts: 3,
            last_error: "timeout".into(),
        }
        .is_fatal());
    }

    #[test]
    fn test_messages_name_the_source() {
        let e = IngestError::structure("Berlin", "no qualifying section");
        assert_eq!(
            e.to_string(),
            "Berlin: page structure not recognized: no qualifying section"
        );
    }
}
