//! hrfb-sync library interface
//!
//! Exposes the sync pipeline, its collaborators and the HTTP router for the
//! binary and for integration tests.

pub mod api;
pub mod db;
pub mod error;
pub mod services;
pub mod types;

pub use crate::error::{ApiError, ApiResult, AuthError, FetchError, StoreError, SyncError};
pub use crate::services::SyncPipeline;

use axum::Router;
use chrono::{DateTime, Utc};
use hrfb_common::config::TomlConfig;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::services::{build_classifier, ServiceAccountMinter, SheetsReader, SHEET_SCHEMA_V1};
use crate::types::FeedbackStore;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<SyncPipeline>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(pipeline: Arc<SyncPipeline>) -> Self {
        Self {
            pipeline,
            startup_time: Utc::now(),
        }
    }
}

/// Wire the production pipeline from configuration
///
/// Expects `config.validate()` to have passed.
pub fn build_pipeline(config: &TomlConfig, store: Arc<dyn FeedbackStore>) -> anyhow::Result<SyncPipeline> {
    let timeout = Duration::from_secs(config.sync.request_timeout_secs);

    let minter = ServiceAccountMinter::new(
        config.google.service_account_source(),
        config.google.token_uri.clone(),
        timeout,
    )?;

    let spreadsheet_id = config
        .google
        .spreadsheet_id
        .clone()
        .ok_or_else(|| anyhow::anyhow!("spreadsheet id not configured"))?;
    let schema = config.google.strict_schema.then_some(SHEET_SCHEMA_V1);
    let reader = SheetsReader::new(
        config.google.sheets_base_url.clone(),
        spreadsheet_id,
        config.google.range.clone(),
        schema,
        timeout,
    )?;

    let classifier = build_classifier(&config.sentiment, timeout);
    let offset = hrfb_common::time::offset_from_minutes(config.google.sheet_utc_offset_minutes)?;

    Ok(SyncPipeline::new(Arc::new(minter), Arc::new(reader), classifier, store)
        .with_sheet_offset(offset)
        .with_classify_concurrency(config.sentiment.concurrency))
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::sync_routes())
        .merge(api::health_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
