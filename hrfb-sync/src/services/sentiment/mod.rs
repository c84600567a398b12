//! Sentiment classification strategies
//!
//! Three strategies implement [`SentimentClassifier`]:
//! - [`RemoteModelClassifier`]: remote model, keyword fallback on failure
//! - [`HeuristicClassifier`]: keyword heuristic only
//! - [`DisabledClassifier`]: always `{0, neutral}`
//!
//! [`build_classifier`] picks one at construction time from configuration,
//! so the sync pipeline never branches on credential presence.

pub mod heuristic;
pub mod remote;

pub use heuristic::{keyword_sentiment, HeuristicClassifier};
pub use remote::RemoteModelClassifier;

use crate::types::SentimentClassifier;
use hrfb_common::config::SentimentConfig;
use hrfb_common::Sentiment;
use std::sync::Arc;
use std::time::Duration;

/// Strategy used when no model credential is configured
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledClassifier;

#[async_trait::async_trait]
impl SentimentClassifier for DisabledClassifier {
    fn name(&self) -> &'static str {
        "disabled"
    }

    async fn classify(&self, _text: &str) -> Sentiment {
        Sentiment::neutral()
    }
}

/// Select the classification strategy for this configuration
///
/// | model key | `heuristic_without_model` | strategy     |
/// |-----------|---------------------------|--------------|
/// | set       | any                       | remote-model |
/// | unset     | false                     | disabled     |
/// | unset     | true                      | heuristic    |
pub fn build_classifier(config: &SentimentConfig, timeout: Duration) -> Arc<dyn SentimentClassifier> {
    let classifier: Arc<dyn SentimentClassifier> = match config.configured_api_key() {
        Some(api_key) => {
            match RemoteModelClassifier::new(&config.base_url, api_key, config.model.clone(), timeout) {
                Ok(remote) => Arc::new(remote),
                Err(e) => {
                    tracing::warn!(error = %e, "Could not build model client, using keyword heuristic");
                    Arc::new(HeuristicClassifier)
                }
            }
        }
        None if config.heuristic_without_model => Arc::new(HeuristicClassifier),
        None => Arc::new(DisabledClassifier),
    };

    tracing::info!(strategy = classifier.name(), "Sentiment classifier selected");
    classifier
}
