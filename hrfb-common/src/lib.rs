//! # HRFB Common Library
//!
//! Shared code for the HR feedback sync service:
//! - Feedback data model (sheet rows, sentiment, persisted records)
//! - Configuration loading (TOML + environment overrides)
//! - Spreadsheet timestamp parsing
//! - Common error type

pub mod config;
pub mod error;
pub mod models;
pub mod time;

pub use error::{Error, Result};
pub use models::{ClassifiedEntry, PersistedFeedback, Sentiment, SentimentLabel, SheetRow, SyncReport};
