//! Feedback data model
//!
//! Rows flow one way through a sync pass:
//! `SheetRow` → `ClassifiedEntry` → `PersistedFeedback`.
//! A `SheetRow` that is not strictly newer than the stored high-water mark
//! never becomes a `ClassifiedEntry`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// One raw spreadsheet record
///
/// Exists only for the duration of one sync pass. Score fields are not
/// range-checked here; malformed cells have already been coerced to zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SheetRow {
    /// Spreadsheet-local timestamp, unparsed
    pub timestamp: String,
    pub employee_name: Option<String>,
    pub department: Option<String>,
    pub satisfaction_score: i32,
    pub happiness_index: i32,
    pub team_dynamics_score: i32,
    pub leadership_score: i32,
    pub growth_opportunities_score: i32,
    pub company_culture_score: i32,
    /// Free-text comment fed to the sentiment classifier
    pub open_comments: Option<String>,
}

impl SheetRow {
    /// Comment text, or an empty string when the cell was blank
    pub fn comment_text(&self) -> &str {
        self.open_comments.as_deref().unwrap_or("")
    }
}

/// Three-way sentiment label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

impl SentimentLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "positive",
            SentimentLabel::Neutral => "neutral",
            SentimentLabel::Negative => "negative",
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SentimentLabel {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "positive" => Ok(SentimentLabel::Positive),
            "neutral" => Ok(SentimentLabel::Neutral),
            "negative" => Ok(SentimentLabel::Negative),
            other => Err(crate::Error::InvalidInput(format!(
                "Unknown sentiment label: {}",
                other
            ))),
        }
    }
}

/// Bounded sentiment classification result
///
/// `score` is always within [-1.0, 1.0]; construct through [`Sentiment::new`]
/// to keep that invariant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sentiment {
    pub score: f64,
    pub label: SentimentLabel,
}

impl Sentiment {
    /// Create a sentiment, clamping the score into [-1, 1]
    ///
    /// Non-finite scores (NaN, ±inf from a misbehaving model) become 0.
    pub fn new(score: f64, label: SentimentLabel) -> Self {
        let score = if score.is_finite() {
            score.clamp(-1.0, 1.0)
        } else {
            0.0
        };
        Self { score, label }
    }

    pub fn neutral() -> Self {
        Self::new(0.0, SentimentLabel::Neutral)
    }
}

/// A sheet row with a parsed timestamp and a sentiment attached
///
/// Produced immediately before persistence and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedEntry {
    pub timestamp: DateTime<Utc>,
    pub employee_name: Option<String>,
    pub department: Option<String>,
    pub satisfaction_score: i32,
    pub happiness_index: i32,
    pub team_dynamics_score: i32,
    pub leadership_score: i32,
    pub growth_opportunities_score: i32,
    pub company_culture_score: i32,
    pub open_comments: Option<String>,
    pub sentiment_score: f64,
    pub sentiment_label: SentimentLabel,
    /// When the sync pass classified this row
    pub processed_at: DateTime<Utc>,
}

impl ClassifiedEntry {
    pub fn from_row(
        row: SheetRow,
        timestamp: DateTime<Utc>,
        sentiment: Sentiment,
        processed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            timestamp,
            employee_name: row.employee_name,
            department: row.department,
            satisfaction_score: row.satisfaction_score,
            happiness_index: row.happiness_index,
            team_dynamics_score: row.team_dynamics_score,
            leadership_score: row.leadership_score,
            growth_opportunities_score: row.growth_opportunities_score,
            company_culture_score: row.company_culture_score,
            open_comments: row.open_comments,
            sentiment_score: sentiment.score,
            sentiment_label: sentiment.label,
            processed_at,
        }
    }
}

/// Durable feedback record as stored by the store gateway
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedFeedback {
    pub id: Uuid,
    #[serde(flatten)]
    pub entry: ClassifiedEntry,
    pub created_at: DateTime<Utc>,
}

/// Outcome of one completed sync pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncReport {
    /// Entries classified and inserted
    pub processed: usize,
    /// Data rows returned by the sheet (header excluded)
    pub fetched: usize,
    /// Rows dropped for an empty or unparseable timestamp
    pub skipped_invalid: usize,
    /// Rows at or before the high-water mark
    pub skipped_stale: usize,
    pub high_water_mark: DateTime<Utc>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl SyncReport {
    pub fn message(&self) -> String {
        format!("Successfully processed {} new entries", self.processed)
    }
}
