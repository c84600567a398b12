//! HTTP API handlers for hrfb-sync
//!
//! - `POST /sync`: run a sync pass (CORS preflight answered by the router's CORS layer)
//! - `GET /sync/status`: outcome of the most recent pass
//! - `GET /health`: liveness and uptime

pub mod health;
pub mod sync;

pub use health::health_routes;
pub use sync::sync_routes;
