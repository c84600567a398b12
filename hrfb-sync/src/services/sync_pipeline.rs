//! Dedup & ingest orchestrator
//!
//! One sync pass:
//! 1. Mint a bearer token
//! 2. Fetch every sheet row
//! 3. Read the store's high-water mark (epoch when the store is empty)
//! 4. Keep rows whose timestamp parses and is strictly newer than the mark
//! 5. Classify the survivors' comments, preserving sheet order
//! 6. Insert all resulting entries as a single atomic batch
//!
//! Any failure in steps 1–3 or 6 aborts the pass with a [`SyncError`];
//! nothing before the insert has side effects, and the insert is
//! all-or-nothing. Passes within one process are serialized by `pass_lock`,
//! so a pass that waited always sees the previous pass's commit when it
//! reads the high-water mark.

use crate::error::SyncError;
use crate::types::{CredentialMinter, FeedbackStore, SentimentClassifier, SheetSource};
use chrono::{DateTime, FixedOffset, Offset, Utc};
use futures::stream::{self, StreamExt};
use hrfb_common::{time, ClassifiedEntry, SheetRow, SyncReport};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

/// Rows that survived the high-water-mark filter
#[derive(Debug, Default)]
pub struct RowSelection {
    /// Eligible rows with their parsed instants, in sheet order
    pub rows: Vec<(SheetRow, DateTime<Utc>)>,
    pub skipped_invalid: usize,
    pub skipped_stale: usize,
}

/// Drop rows with unusable timestamps or at/before `high_water_mark`
///
/// Rows sharing a timestamp are all kept as long as it is newer than the mark.
pub fn select_new_rows(
    rows: Vec<SheetRow>,
    high_water_mark: DateTime<Utc>,
    sheet_offset: FixedOffset,
) -> RowSelection {
    let mut selection = RowSelection::default();

    for (idx, row) in rows.into_iter().enumerate() {
        let parsed = match time::parse_sheet_timestamp(&row.timestamp, sheet_offset) {
            Ok(parsed) => parsed,
            Err(e) => {
                // +2: one for the header row, one for 1-based sheet rows
                warn!(sheet_row = idx + 2, error = %e, "Skipping row with unusable timestamp");
                selection.skipped_invalid += 1;
                continue;
            }
        };

        if parsed <= high_water_mark {
            selection.skipped_stale += 1;
            continue;
        }
        selection.rows.push((row, parsed));
    }

    selection
}

/// Last pass result, exposed through the status endpoint
#[derive(Debug, Clone, Serialize)]
pub struct PassOutcome {
    pub success: bool,
    pub finished_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<SyncReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The sync job
pub struct SyncPipeline {
    minter: Arc<dyn CredentialMinter>,
    sheet: Arc<dyn SheetSource>,
    classifier: Arc<dyn SentimentClassifier>,
    store: Arc<dyn FeedbackStore>,
    sheet_offset: FixedOffset,
    classify_concurrency: usize,
    pass_lock: Mutex<()>,
    last_outcome: RwLock<Option<PassOutcome>>,
}

impl SyncPipeline {
    pub fn new(
        minter: Arc<dyn CredentialMinter>,
        sheet: Arc<dyn SheetSource>,
        classifier: Arc<dyn SentimentClassifier>,
        store: Arc<dyn FeedbackStore>,
    ) -> Self {
        Self {
            minter,
            sheet,
            classifier,
            store,
            sheet_offset: Utc.fix(),
            classify_concurrency: 4,
            pass_lock: Mutex::new(()),
            last_outcome: RwLock::new(None),
        }
    }

    /// Offset for sheet timestamps that do not carry one
    pub fn with_sheet_offset(mut self, offset: FixedOffset) -> Self {
        self.sheet_offset = offset;
        self
    }

    /// Maximum classification calls in flight (at least 1)
    pub fn with_classify_concurrency(mut self, concurrency: usize) -> Self {
        self.classify_concurrency = concurrency.max(1);
        self
    }

    pub fn classifier_name(&self) -> &'static str {
        self.classifier.name()
    }

    pub async fn last_outcome(&self) -> Option<PassOutcome> {
        self.last_outcome.read().await.clone()
    }

    /// Run one sync pass
    pub async fn run(&self) -> Result<SyncReport, SyncError> {
        let _guard = self.pass_lock.lock().await;

        let result = self.run_pass().await;

        let outcome = match &result {
            Ok(report) => PassOutcome {
                success: true,
                finished_at: report.finished_at,
                report: Some(report.clone()),
                error: None,
            },
            Err(e) => {
                error!(error = %e, "Sync pass failed");
                PassOutcome {
                    success: false,
                    finished_at: Utc::now(),
                    report: None,
                    error: Some(e.to_string()),
                }
            }
        };
        *self.last_outcome.write().await = Some(outcome);

        result
    }

    async fn run_pass(&self) -> Result<SyncReport, SyncError> {
        let started_at = Utc::now();
        info!(classifier = self.classifier.name(), "Starting sync pass");

        let token = self.minter.mint().await?;
        let rows = self.sheet.fetch(&token).await?;
        drop(token);
        let fetched = rows.len();

        // Read after the fetch so the write decision uses the freshest mark
        let high_water_mark = self
            .store
            .latest_timestamp()
            .await?
            .unwrap_or_else(time::epoch);
        info!(fetched, high_water_mark = %high_water_mark, "Fetched sheet rows");

        let selection = select_new_rows(rows, high_water_mark, self.sheet_offset);
        debug!(
            eligible = selection.rows.len(),
            skipped_invalid = selection.skipped_invalid,
            skipped_stale = selection.skipped_stale,
            "Filtered rows against high-water mark"
        );

        let processed_at = Utc::now();
        let classifier = &self.classifier;
        let entries: Vec<ClassifiedEntry> = stream::iter(selection.rows)
            .map(|(row, timestamp)| async move {
                let sentiment = classifier.classify(row.comment_text()).await;
                ClassifiedEntry::from_row(row, timestamp, sentiment, processed_at)
            })
            .buffered(self.classify_concurrency)
            .collect()
            .await;

        let processed = if entries.is_empty() {
            0
        } else {
            self.store.insert_batch(&entries).await?
        };

        let report = SyncReport {
            processed,
            fetched,
            skipped_invalid: selection.skipped_invalid,
            skipped_stale: selection.skipped_stale,
            high_water_mark,
            started_at,
            finished_at: Utc::now(),
        };
        info!(
            processed = report.processed,
            skipped_invalid = report.skipped_invalid,
            skipped_stale = report.skipped_stale,
            "Sync pass complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn row(ts: &str) -> SheetRow {
        SheetRow {
            timestamp: ts.to_string(),
            ..Default::default()
        }
    }

    fn mark() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_select_keeps_only_strictly_newer() {
        let rows = vec![
            row("2023-12-31T23:00:00Z"),
            row("2024-01-01T00:00:00Z"),
            row("2024-01-02T00:00:00Z"),
        ];
        let selection = select_new_rows(rows, mark(), Utc.fix());
        assert_eq!(selection.rows.len(), 1);
        assert_eq!(selection.rows[0].0.timestamp, "2024-01-02T00:00:00Z");
        assert_eq!(selection.skipped_stale, 2);
        assert_eq!(selection.skipped_invalid, 0);
    }

    #[test]
    fn test_select_skips_empty_and_unparseable() {
        let rows = vec![row(""), row("not a date"), row("2024-02-01T00:00:00Z")];
        let selection = select_new_rows(rows, mark(), Utc.fix());
        assert_eq!(selection.rows.len(), 1);
        assert_eq!(selection.skipped_invalid, 2);
    }

    #[test]
    fn test_select_keeps_duplicate_timestamps() {
        let rows = vec![row("2024-03-01T10:00:00Z"), row("2024-03-01T10:00:00Z")];
        let selection = select_new_rows(rows, mark(), Utc.fix());
        assert_eq!(selection.rows.len(), 2);
    }

    #[test]
    fn test_select_preserves_sheet_order() {
        let rows = vec![
            row("2024-05-01T00:00:00Z"),
            row("2024-03-01T00:00:00Z"),
            row("2024-04-01T00:00:00Z"),
        ];
        let selection = select_new_rows(rows, mark(), Utc.fix());
        let order: Vec<_> = selection.rows.iter().map(|(r, _)| r.timestamp.as_str()).collect();
        assert_eq!(
            order,
            vec!["2024-05-01T00:00:00Z", "2024-03-01T00:00:00Z", "2024-04-01T00:00:00Z"]
        );
    }

    #[test]
    fn test_select_uses_sheet_offset() {
        // 2024-01-01 03:00 at UTC+5 is 2023-12-31 22:00 UTC, older than the mark
        let offset = FixedOffset::east_opt(5 * 3600).unwrap();
        let selection = select_new_rows(vec![row("2024-01-01 03:00:00")], mark(), offset);
        assert!(selection.rows.is_empty());
        assert_eq!(selection.skipped_stale, 1);
    }
}
