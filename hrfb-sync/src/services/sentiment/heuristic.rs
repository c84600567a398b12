//! Keyword sentiment heuristic
//!
//! Deterministic fallback used when the remote model is unavailable or
//! returns something unusable.

use crate::types::SentimentClassifier;
use hrfb_common::{Sentiment, SentimentLabel};

const POSITIVE_WORDS: &[&str] = &["good", "great", "excellent", "love", "amazing", "fantastic"];
const NEGATIVE_WORDS: &[&str] = &["bad", "terrible", "hate", "awful", "poor", "disappointing"];

/// Number of distinct words from `words` that appear in `text`
///
/// A repeated keyword counts once; matching is by substring, so "greatest"
/// counts as "great".
fn count_present(text: &str, words: &[&str]) -> usize {
    words.iter().filter(|word| text.contains(*word)).count()
}

/// Score text by counting positive and negative keywords
///
/// More positive hits → `{0.5, positive}`, more negative → `{-0.5, negative}`,
/// a tie (including no hits) → `{0, neutral}`.
pub fn keyword_sentiment(text: &str) -> Sentiment {
    let lower = text.to_lowercase();
    let positive = count_present(&lower, POSITIVE_WORDS);
    let negative = count_present(&lower, NEGATIVE_WORDS);

    if positive > negative {
        Sentiment::new(0.5, SentimentLabel::Positive)
    } else if negative > positive {
        Sentiment::new(-0.5, SentimentLabel::Negative)
    } else {
        Sentiment::neutral()
    }
}

/// Heuristic-only classification strategy
#[derive(Debug, Default, Clone, Copy)]
pub struct HeuristicClassifier;

#[async_trait::async_trait]
impl SentimentClassifier for HeuristicClassifier {
    fn name(&self) -> &'static str {
        "heuristic"
    }

    async fn classify(&self, text: &str) -> Sentiment {
        keyword_sentiment(text)
    }
}
