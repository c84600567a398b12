//! Sync services
//!
//! Leaf-first: credential minter, sheet reader, sentiment strategies, then
//! the pipeline that drives them and the optional scheduler around it.

pub mod credential_minter;
pub mod scheduler;
pub mod sentiment;
pub mod sheet_reader;
pub mod sync_pipeline;

pub use credential_minter::{ServiceAccountKey, ServiceAccountMinter};
pub use scheduler::spawn_scheduler;
pub use sentiment::{build_classifier, DisabledClassifier, HeuristicClassifier, RemoteModelClassifier};
pub use sheet_reader::{SheetSchema, SheetsReader, SHEET_SCHEMA_V1};
pub use sync_pipeline::{PassOutcome, SyncPipeline};
