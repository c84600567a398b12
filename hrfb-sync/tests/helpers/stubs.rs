//! Stub pipeline collaborators

use hrfb_common::{Sentiment, SheetRow};
use hrfb_sync::error::{AuthError, FetchError};
use hrfb_sync::services::sentiment::keyword_sentiment;
use hrfb_sync::types::{AccessToken, CredentialMinter, SentimentClassifier, SheetSource};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Build a sheet row with the given timestamp, name and comment
pub fn row(timestamp: &str, name: &str, comment: &str) -> SheetRow {
    SheetRow {
        timestamp: timestamp.to_string(),
        employee_name: Some(name.to_string()),
        department: Some("Engineering".to_string()),
        satisfaction_score: 8,
        happiness_index: 7,
        team_dynamics_score: 8,
        leadership_score: 6,
        growth_opportunities_score: 7,
        company_culture_score: 9,
        open_comments: (!comment.is_empty()).then(|| comment.to_string()),
    }
}

/// Minter that succeeds or fails on demand
#[derive(Default)]
pub struct StubMinter {
    pub fail: AtomicBool,
    pub calls: AtomicUsize,
}

impl StubMinter {
    pub fn failing() -> Self {
        Self {
            fail: AtomicBool::new(true),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait::async_trait]
impl CredentialMinter for StubMinter {
    async fn mint(&self) -> Result<AccessToken, AuthError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            Err(AuthError::MissingCredentials)
        } else {
            Ok(AccessToken::new("stub-token"))
        }
    }
}

/// Sheet source backed by an in-memory row list
#[derive(Default)]
pub struct StubSheet {
    rows: Mutex<Vec<SheetRow>>,
    pub fail: AtomicBool,
    pub fetches: AtomicUsize,
}

impl StubSheet {
    pub fn new(rows: Vec<SheetRow>) -> Self {
        Self {
            rows: Mutex::new(rows),
            ..Default::default()
        }
    }

    pub fn set_rows(&self, rows: Vec<SheetRow>) {
        *self.rows.lock().unwrap() = rows;
    }

    pub fn push_row(&self, row: SheetRow) {
        self.rows.lock().unwrap().push(row);
    }
}

#[async_trait::async_trait]
impl SheetSource for StubSheet {
    async fn fetch(&self, token: &AccessToken) -> Result<Vec<SheetRow>, FetchError> {
        assert_eq!(token.secret(), "stub-token");
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(FetchError::Api {
                status: 403,
                body: "The caller does not have permission".to_string(),
            });
        }
        Ok(self.rows.lock().unwrap().clone())
    }
}

/// Keyword classifier with a per-call delay, to widen race windows
pub struct SlowClassifier {
    pub delay: Duration,
    pub calls: AtomicUsize,
}

impl SlowClassifier {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait::async_trait]
impl SentimentClassifier for SlowClassifier {
    fn name(&self) -> &'static str {
        "slow-heuristic"
    }

    async fn classify(&self, text: &str) -> Sentiment {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        keyword_sentiment(text)
    }
}
