//! In-process sync scheduler
//!
//! Runs a pass immediately and then once per interval until cancelled.
//! A failed pass is logged and the next tick tries again; there is no retry
//! inside a tick.

use super::sync_pipeline::SyncPipeline;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Spawn the periodic sync task
pub fn spawn_scheduler(
    pipeline: Arc<SyncPipeline>,
    interval: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(interval_secs = interval.as_secs(), "Sync scheduler started");

        let mut ticker = tokio::time::interval(interval);
        // A slow pass delays the schedule instead of triggering a burst
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Sync scheduler stopped");
                    break;
                }
                _ = ticker.tick() => {
                    match pipeline.run().await {
                        Ok(report) => info!(processed = report.processed, "Scheduled sync pass finished"),
                        Err(e) => warn!(error = %e, "Scheduled sync pass failed, will retry next tick"),
                    }
                }
            }
        }
    })
}
