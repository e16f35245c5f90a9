//! Error taxonomy for reconciliation and queries.
//!
//! Unparsable time or age-group text is never an [`Error`]: it travels as
//! `None` or a `NotFound` variant so a batch tolerates individual bad rows.

use thiserror::Error;

/// Errors raised by reconciliation and store access.
#[derive(Error, Debug)]
pub enum Error {
    /// A record was missing part of its natural key. Nothing was written.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The storage backend failed (connectivity, constraint, I/O).
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Convenience Result type using the core [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Free text that did not yield a duration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("could not parse a time from '{text}'")]
pub struct ParseFailure {
    pub text: String,
}
