//! Error types for hrfb-sync
//!
//! Each external boundary of a sync pass has its own error enum. Any of them
//! aborts the pass and surfaces as a single [`SyncError`]. Sentiment
//! classification has no error type: its failures are absorbed by the
//! keyword fallback and never reach the caller.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Credential minting failures
#[derive(Debug, Error)]
pub enum AuthError {
    /// No service-account bundle configured
    #[error("Service account credentials not configured")]
    MissingCredentials,

    /// Bundle present but not usable (bad JSON, missing field, bad key)
    #[error("Malformed service account credentials: {0}")]
    MalformedCredentials(String),

    /// Assertion could not be signed
    #[error("Failed to sign token assertion: {0}")]
    Signing(String),

    /// Token endpoint unreachable
    #[error("Token exchange request failed: {0}")]
    Network(String),

    /// Token endpoint answered with a non-success status
    #[error("Token exchange rejected ({status}): {body}")]
    Rejected { status: u16, body: String },

    /// Success status but no usable token in the body
    #[error("Token exchange returned no access token: {0}")]
    InvalidResponse(String),
}

/// Spreadsheet read failures
#[derive(Debug, Error)]
pub enum FetchError {
    /// Sheet API unreachable
    #[error("Spreadsheet request failed: {0}")]
    Network(String),

    /// Sheet API answered with a non-success status
    #[error("Spreadsheet API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// Body was not a value range
    #[error("Failed to decode spreadsheet response: {0}")]
    Decode(String),

    /// Header row does not match the expected column schema
    #[error("Sheet column schema v{version} mismatch at column {column} ({position}): expected \"{expected}\", found \"{found}\"")]
    SchemaMismatch {
        version: u32,
        column: usize,
        position: String,
        expected: String,
        found: String,
    },

    /// Request could not be built from configuration
    #[error("Invalid spreadsheet request: {0}")]
    InvalidRequest(String),
}

/// Feedback store failures
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Stored value could not be converted back into the model
    #[error("Corrupt stored value: {0}")]
    Corrupt(String),
}

/// Terminal outcome of a failed sync pass
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),

    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("Store failed: {0}")]
    Store(#[from] StoreError),
}

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Sync pass failed (500)
    #[error(transparent)]
    Sync(#[from] SyncError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::INTERNAL_SERVER_ERROR;
        let body = Json(json!({
            "success": false,
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
