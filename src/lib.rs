//! # Marathon Quals
//!
//! Scrapes qualifying standards from marathon websites, normalizes their
//! times and age-group labels, reconciles them into SQLite, and answers
//! per-runner questions against the stored data.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌───────────────┐   ┌────────────┐   ┌──────────┐
//! │ Fetcher      │──▶│ SiteAdapter   │──▶│ Normalize  │──▶│  SQLite   │
//! │ retry+hash   │   │ rows+metadata │   │ time/label │   │ upserts   │
//! └──────────────┘   └───────────────┘   └────────────┘   └────┬─────┘
//!                                                              ▼
//!                                                     ┌────────────────┐
//!                                                     │ check/top (mq) │
//!                                                     └────────────────┘
//! ```
//!
//! Normalization, classification, reconciliation and queries live in
//! [`marathon_quals_core`]; this crate adds I/O: config, HTTP, HTML
//! extraction, and the SQLite store.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |
//! | [`sqlite_store`] | SQLite `QualStore` |
//! | [`fetch`] | HTTP fetch with retry and page hashing |
//! | [`html`] | Table, link and text extraction |
//! | [`traits`] | `SiteAdapter` and the adapter registry |
//! | `site_*` | One adapter per race |
//! | [`ingest`] | Sync pipeline |
//! | [`report`] | `check`, `top`, `classify`, `parse-time` |
//! | [`sources`] | Adapter listing |
//! | [`error`] | Ingest error taxonomy |

pub mod config;
pub mod db;
pub mod error;
pub mod fetch;
pub mod html;
pub mod ingest;
pub mod migrate;
pub mod report;
pub mod site_berlin;
pub mod site_boston;
pub mod site_chicago;
pub mod site_london;
pub mod site_new_york;
pub mod site_tokyo;
pub mod sources;
pub mod sqlite_store;
pub mod traits;
