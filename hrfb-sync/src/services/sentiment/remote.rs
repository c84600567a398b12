//! Remote language-model sentiment classifier
//!
//! Sends the feedback to a chat-completion endpoint with a fixed system
//! instruction asking for `{"score": number, "label": string}`. Whatever
//! comes back is forced into range: the score is clamped to [-1, 1] and an
//! unknown label becomes `neutral`. Any transport failure, error status or
//! unparseable reply falls back to the keyword heuristic.

use super::heuristic::keyword_sentiment;
use crate::types::SentimentClassifier;
use hrfb_common::{Sentiment, SentimentLabel};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

const CHAT_COMPLETIONS_PATH: &str = "/v1/chat/completions";
const SYSTEM_INSTRUCTION: &str = "Analyze the sentiment of employee feedback. Return a JSON object with \"score\" (number between -1 and 1) and \"label\" (positive, neutral, or negative). Be concise.";
const TEMPERATURE: f32 = 0.1;
const MAX_TOKENS: u32 = 100;

/// Reasons a model reply could not be used
#[derive(Debug, Error)]
enum ModelError {
    #[error("network error: {0}")]
    Network(String),

    #[error("model API returned {0}")]
    Status(u16),

    #[error("unexpected reply shape: {0}")]
    Shape(String),
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ModelSentiment {
    #[serde(default)]
    score: Option<Value>,
    #[serde(default)]
    label: Option<String>,
}

/// Remove a surrounding markdown code fence, if any
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") on the opening fence line
    let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Interpret the model's message content
///
/// Missing or non-numeric score → 0; a label other than the exact lowercase
/// `positive`/`neutral`/`negative` → neutral. Content that
/// is not a JSON object is an error.
fn parse_model_content(content: &str) -> Result<Sentiment, ModelError> {
    let parsed: ModelSentiment = serde_json::from_str(strip_code_fence(content))
        .map_err(|e| ModelError::Shape(e.to_string()))?;

    let score = match parsed.score {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    let label = parsed
        .label
        .and_then(|l| l.parse::<SentimentLabel>().ok())
        .unwrap_or(SentimentLabel::Neutral);

    Ok(Sentiment::new(score, label))
}

/// Model-backed classifier with keyword fallback
pub struct RemoteModelClassifier {
    http_client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl RemoteModelClassifier {
    pub fn new(
        base_url: &str,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http_client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http_client,
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), CHAT_COMPLETIONS_PATH),
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    async fn request_sentiment(&self, text: &str) -> Result<Sentiment, ModelError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_INSTRUCTION.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: format!("Analyze this employee feedback: \"{}\"", text),
                },
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        let response = self
            .http_client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ModelError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ModelError::Status(status.as_u16()));
        }

        let reply: ChatResponse = response
            .json()
            .await
            .map_err(|e| ModelError::Shape(e.to_string()))?;

        let content = reply
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ModelError::Shape("no message content".to_string()))?;

        parse_model_content(&content)
    }
}

#[async_trait::async_trait]
impl SentimentClassifier for RemoteModelClassifier {
    fn name(&self) -> &'static str {
        "remote-model"
    }

    async fn classify(&self, text: &str) -> Sentiment {
        if text.trim().is_empty() {
            return Sentiment::neutral();
        }

        match self.request_sentiment(text).await {
            Ok(sentiment) => sentiment,
            Err(e) => {
                tracing::warn!(error = %e, "Remote sentiment classification failed, using keyword fallback");
                keyword_sentiment(text)
            }
        }
    }
}
