//! Sync trigger and status endpoints

use axum::{extract::State, http::StatusCode, routing::get, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use crate::error::ApiResult;
use crate::services::PassOutcome;
use crate::AppState;

/// Successful sync response
#[derive(Debug, Serialize, Deserialize)]
pub struct SyncResponse {
    pub success: bool,
    pub processed: usize,
    pub message: String,
}

/// Sync status response
#[derive(Debug, Serialize)]
pub struct SyncStatusResponse {
    /// Active sentiment strategy ("remote-model", "heuristic", "disabled")
    pub classifier: &'static str,
    /// `null` until the first pass finishes
    pub last_pass: Option<PassOutcome>,
}

/// POST /sync
///
/// Runs one sync pass. No request body is required. Failures map to a 500
/// with `{success: false, error}`.
pub async fn run_sync(State(state): State<AppState>) -> ApiResult<Json<SyncResponse>> {
    let report = state.pipeline.run().await?;

    Ok(Json(SyncResponse {
        success: true,
        processed: report.processed,
        message: report.message(),
    }))
}

/// OPTIONS /sync
///
/// 200 with an empty body. Behind the CORS layer the layer answers first.
pub async fn preflight() -> StatusCode {
    StatusCode::OK
}

/// GET /sync/status
pub async fn sync_status(State(state): State<AppState>) -> Json<SyncStatusResponse> {
    Json(SyncStatusResponse {
        classifier: state.pipeline.classifier_name(),
        last_pass: state.pipeline.last_outcome().await,
    })
}

/// Build sync routes
pub fn sync_routes() -> Router<AppState> {
    Router::new()
        .route("/sync", post(run_sync).options(preflight))
        .route("/sync/status", get(sync_status))
}
