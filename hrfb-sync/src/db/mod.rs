//! Database access for hrfb-sync
//!
//! SQLite-backed feedback store. Tables are created on startup if missing.

pub mod feedback;

pub use feedback::SqliteFeedbackStore;

use anyhow::Result;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::path::Path;

/// Initialize database connection pool
///
/// Creates the database file (and parent directory) if it does not exist.
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // mode=rwc: read, write, create
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    tracing::debug!("Connecting to database: {}", db_url);

    let pool = SqlitePool::connect(&db_url).await?;
    init_tables(&pool).await?;

    Ok(pool)
}

/// Single-connection in-memory pool
///
/// Every SQLite `:memory:` connection is a separate database, so the pool
/// is capped at one connection.
pub async fn init_memory_pool() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    init_tables(&pool).await?;
    Ok(pool)
}

/// Create the feedback table and its timestamp index
pub async fn init_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS employee_feedback (
            id TEXT PRIMARY KEY,
            timestamp_ms INTEGER NOT NULL,
            employee_name TEXT,
            department TEXT,
            satisfaction_score INTEGER NOT NULL DEFAULT 0,
            happiness_index INTEGER NOT NULL DEFAULT 0,
            team_dynamics_score INTEGER NOT NULL DEFAULT 0,
            leadership_score INTEGER NOT NULL DEFAULT 0,
            growth_opportunities_score INTEGER NOT NULL DEFAULT 0,
            company_culture_score INTEGER NOT NULL DEFAULT 0,
            open_comments TEXT,
            sentiment_score REAL NOT NULL DEFAULT 0.0,
            sentiment_label TEXT NOT NULL DEFAULT 'neutral'
                CHECK (sentiment_label IN ('positive', 'neutral', 'negative')),
            processed_at TEXT NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_employee_feedback_timestamp ON employee_feedback (timestamp_ms)",
    )
    .execute(pool)
    .await?;

    tracing::info!("Database tables initialized (employee_feedback)");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_file_pool_creates_parent_and_table() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let db_path = temp_dir.path().join("nested").join("feedback.db");

        let pool = init_database_pool(&db_path).await.unwrap();
        assert!(db_path.exists());

        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'employee_feedback'",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_init_tables_is_idempotent() {
        let pool = init_memory_pool().await.unwrap();
        init_tables(&pool).await.unwrap();
        init_tables(&pool).await.unwrap();
    }

    #[tokio::test]
    async fn test_label_check_constraint() {
        let pool = init_memory_pool().await.unwrap();
        let result = sqlx::query(
            "INSERT INTO employee_feedback (id, timestamp_ms, sentiment_label, processed_at, created_at)
             VALUES ('x', 0, 'ecstatic', '2024-01-01T00:00:00Z', '2024-01-01T00:00:00Z')",
        )
        .execute(&pool)
        .await;
        assert!(result.is_err());
    }
}
