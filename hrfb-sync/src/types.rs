//! Core types and trait definitions for hrfb-sync
//!
//! The sync pipeline talks to every collaborator through one of these
//! traits, so it never knows whether it is using the Google clients, the
//! SQLite store, or test doubles.
//!
//! Control flow of one pass:
//! `CredentialMinter` → `SheetSource` → `SentimentClassifier` (per new row)
//! → `FeedbackStore`.

use crate::error::{AuthError, FetchError, StoreError};
use chrono::{DateTime, Utc};
use hrfb_common::{ClassifiedEntry, Sentiment, SheetRow};
use std::fmt;

/// Short-lived bearer token for the spreadsheet API
///
/// Lives for one sync pass. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Raw token, for the `Authorization` header only
    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

/// Produces a bearer token from the long-lived service credential
#[async_trait::async_trait]
pub trait CredentialMinter: Send + Sync {
    async fn mint(&self) -> Result<AccessToken, AuthError>;
}

/// Reads typed rows from the spreadsheet, in native top-to-bottom order
#[async_trait::async_trait]
pub trait SheetSource: Send + Sync {
    async fn fetch(&self, token: &AccessToken) -> Result<Vec<SheetRow>, FetchError>;
}

/// Sentiment classification strategy
///
/// Infallible by contract: implementations return a best-effort result.
#[async_trait::async_trait]
pub trait SentimentClassifier: Send + Sync {
    /// Strategy name for logs and status output
    fn name(&self) -> &'static str;

    async fn classify(&self, text: &str) -> Sentiment;
}

/// Persistence interface required by the sync pipeline
#[async_trait::async_trait]
pub trait FeedbackStore: Send + Sync {
    /// Maximum persisted feedback timestamp, `None` when the store is empty
    async fn latest_timestamp(&self) -> Result<Option<DateTime<Utc>>, StoreError>;

    /// Insert all entries atomically; returns the number inserted
    ///
    /// On error nothing from `entries` is visible in the store.
    async fn insert_batch(&self, entries: &[ClassifiedEntry]) -> Result<usize, StoreError>;
}
