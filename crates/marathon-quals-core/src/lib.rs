//! # Marathon Quals Core
//!
//! Shared, I/O-free logic for marathon-quals: data models, time and
//! age-group normalization, per-race age-group classification, the
//! [`store::QualStore`] abstraction, reconciliation, and the query engine.
//!
//! This crate contains no tokio, sqlx, HTTP, or filesystem dependencies.
//! Storage backends live in the application crate and plug in through
//! [`store::QualStore`].

pub mod age_group;
pub mod classify;
pub mod error;
pub mod models;
pub mod query;
pub mod reconcile;
pub mod store;
pub mod time;

pub use error::{Error, ParseFailure, Result};
