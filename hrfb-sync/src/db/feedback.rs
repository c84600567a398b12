//! Feedback store operations
//!
//! Append-only access to `employee_feedback`. Timestamps are stored as Unix
//! milliseconds so `MAX(timestamp_ms)` is the exact high-water mark
//! regardless of how the text form would sort.

use crate::error::StoreError;
use crate::types::FeedbackStore;
use chrono::{DateTime, Utc};
use hrfb_common::{time, ClassifiedEntry, PersistedFeedback, SentimentLabel};
use sqlx::SqlitePool;
use uuid::Uuid;

/// SQLite implementation of the store gateway
#[derive(Clone)]
pub struct SqliteFeedbackStore {
    pool: SqlitePool,
}

#[derive(Debug, sqlx::FromRow)]
struct FeedbackRow {
    id: String,
    timestamp_ms: i64,
    employee_name: Option<String>,
    department: Option<String>,
    satisfaction_score: i32,
    happiness_index: i32,
    team_dynamics_score: i32,
    leadership_score: i32,
    growth_opportunities_score: i32,
    company_culture_score: i32,
    open_comments: Option<String>,
    sentiment_score: f64,
    sentiment_label: String,
    processed_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl TryFrom<FeedbackRow> for PersistedFeedback {
    type Error = StoreError;

    fn try_from(row: FeedbackRow) -> Result<Self, Self::Error> {
        let id = Uuid::parse_str(&row.id)
            .map_err(|e| StoreError::Corrupt(format!("id {}: {}", row.id, e)))?;
        let timestamp =
            time::from_millis(row.timestamp_ms).map_err(|e| StoreError::Corrupt(e.to_string()))?;
        let sentiment_label = row
            .sentiment_label
            .parse::<SentimentLabel>()
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;

        Ok(PersistedFeedback {
            id,
            entry: ClassifiedEntry {
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
                sentiment_score: row.sentiment_score,
                sentiment_label,
                processed_at: row.processed_at,
            },
            created_at: row.created_at,
        })
    }
}

impl SqliteFeedbackStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Number of persisted feedback rows
    pub async fn count(&self) -> Result<i64, StoreError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM employee_feedback")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Most recent feedback first
    pub async fn recent(&self, limit: i64) -> Result<Vec<PersistedFeedback>, StoreError> {
        let rows: Vec<FeedbackRow> = sqlx::query_as(
            r#"
            SELECT id, timestamp_ms, employee_name, department,
                   satisfaction_score, happiness_index, team_dynamics_score,
                   leadership_score, growth_opportunities_score, company_culture_score,
                   open_comments, sentiment_score, sentiment_label,
                   processed_at, created_at
            FROM employee_feedback
            ORDER BY timestamp_ms DESC, rowid DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(PersistedFeedback::try_from).collect()
    }
}

#[async_trait::async_trait]
impl FeedbackStore for SqliteFeedbackStore {
    async fn latest_timestamp(&self) -> Result<Option<DateTime<Utc>>, StoreError> {
        let (max_ms,): (Option<i64>,) =
            sqlx::query_as("SELECT MAX(timestamp_ms) FROM employee_feedback")
                .fetch_one(&self.pool)
                .await?;

        max_ms
            .map(|ms| time::from_millis(ms).map_err(|e| StoreError::Corrupt(e.to_string())))
            .transpose()
    }

    async fn insert_batch(&self, entries: &[ClassifiedEntry]) -> Result<usize, StoreError> {
        if entries.is_empty() {
            return Ok(0);
        }

        let created_at = Utc::now();
        // Dropping the transaction on any error rolls the whole batch back
        let mut tx = self.pool.begin().await?;

        for entry in entries {
            sqlx::query(
                r#"
                INSERT INTO employee_feedback (
                    id, timestamp_ms, employee_name, department,
                    satisfaction_score, happiness_index, team_dynamics_score,
                    leadership_score, growth_opportunities_score, company_culture_score,
                    open_comments, sentiment_score, sentiment_label,
                    processed_at, created_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(time::to_millis(entry.timestamp))
            .bind(&entry.employee_name)
            .bind(&entry.department)
            .bind(entry.satisfaction_score)
            .bind(entry.happiness_index)
            .bind(entry.team_dynamics_score)
            .bind(entry.leadership_score)
            .bind(entry.growth_opportunities_score)
            .bind(entry.company_culture_score)
            .bind(&entry.open_comments)
            .bind(entry.sentiment_score)
            .bind(entry.sentiment_label.as_str())
            .bind(entry.processed_at)
            .bind(created_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::debug!(count = entries.len(), "Inserted feedback batch");
        Ok(entries.len())
    }
}

// ============================================================================
// Tests
// ============================================================================
