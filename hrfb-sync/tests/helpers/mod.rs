//! Test Helper Utilities
//!
//! Shared utilities for testing hrfb-sync: fake upstream HTTP services served
//! by axum on ephemeral ports, stub pipeline collaborators, and row builders.

#![allow(dead_code)]

pub mod fake_upstream;
pub mod stubs;

pub use fake_upstream::{spawn_server, FakeGoogle, FakeModel};
pub use stubs::{row, SlowClassifier, StubMinter, StubSheet};

use hrfb_sync::db::SqliteFeedbackStore;
use sqlx::SqlitePool;

pub const TEST_PRIVATE_KEY: &str = include_str!("../fixtures/test_service_account_key.pem");
pub const TEST_PUBLIC_KEY: &str = include_str!("../fixtures/test_service_account_pub.pem");
pub const TEST_CLIENT_EMAIL: &str = "feedback-sync@test-project.iam.gserviceaccount.com";

/// Service-account JSON bundle signed with the fixture key
pub fn service_account_json(token_uri: &str) -> String {
    serde_json::json!({
        "type": "service_account",
        "project_id": "test-project",
        "private_key_id": "fixture-key",
        "private_key": TEST_PRIVATE_KEY,
        "client_email": TEST_CLIENT_EMAIL,
        "token_uri": token_uri,
    })
    .to_string()
}

/// In-memory feedback store plus its pool (for row counts and triggers)
pub async fn memory_store() -> (SqlitePool, SqliteFeedbackStore) {
    let pool = hrfb_sync::db::init_memory_pool().await.unwrap();
    (pool.clone(), SqliteFeedbackStore::new(pool))
}
