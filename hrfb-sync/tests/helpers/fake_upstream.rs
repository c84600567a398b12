//! Fake Google token/Sheets and chat-completion endpoints

use axum::extract::{Form, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::{Arc, Mutex};

/// Serve `router` on 127.0.0.1 with an OS-assigned port; returns the base URL
pub async fn spawn_server(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Fake OAuth token endpoint and Sheets values endpoint
#[derive(Clone)]
pub struct FakeGoogle {
    pub token_status: Arc<AtomicU16>,
    pub token_body: Arc<Mutex<Value>>,
    pub values_status: Arc<AtomicU16>,
    pub values_body: Arc<Mutex<Value>>,
    /// Form bodies received by the token endpoint
    pub token_requests: Arc<Mutex<Vec<HashMap<String, String>>>>,
    /// (spreadsheet id, range, authorization header) per values read
    pub values_requests: Arc<Mutex<Vec<(String, String, String)>>>,
}

impl Default for FakeGoogle {
    fn default() -> Self {
        Self {
            token_status: Arc::new(AtomicU16::new(200)),
            token_body: Arc::new(Mutex::new(json!({
                "access_token": "fake-access-token",
                "expires_in": 3599,
                "token_type": "Bearer",
            }))),
            values_status: Arc::new(AtomicU16::new(200)),
            values_body: Arc::new(Mutex::new(json!({}))),
            token_requests: Arc::new(Mutex::new(Vec::new())),
            values_requests: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl FakeGoogle {
    pub fn set_values(&self, values: Value) {
        *self.values_body.lock().unwrap() = json!({
            "range": "'Form Responses 1'!A1:K100",
            "majorDimension": "ROWS",
            "values": values,
        });
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/token", post(token_handler))
            .route("/v4/spreadsheets/:id/values/:range", get(values_handler))
            .with_state(self.clone())
    }

    /// Start serving; returns the base URL
    pub async fn spawn(&self) -> String {
        spawn_server(self.router()).await
    }
}

async fn token_handler(
    State(fake): State<FakeGoogle>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    fake.token_requests.lock().unwrap().push(form);
    let status = StatusCode::from_u16(fake.token_status.load(Ordering::SeqCst)).unwrap();
    let body = fake.token_body.lock().unwrap().clone();
    (status, Json(body)).into_response()
}

async fn values_handler(
    State(fake): State<FakeGoogle>,
    Path((id, range)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    fake.values_requests.lock().unwrap().push((id, range, auth));

    let status = StatusCode::from_u16(fake.values_status.load(Ordering::SeqCst)).unwrap();
    let body = fake.values_body.lock().unwrap().clone();
    (status, Json(body)).into_response()
}

/// Fake chat-completion endpoint
#[derive(Clone)]
pub struct FakeModel {
    pub status: Arc<AtomicU16>,
    /// Message content returned in the first choice
    pub content: Arc<Mutex<String>>,
    /// Raw body override (takes precedence over `content`)
    pub raw_body: Arc<Mutex<Option<Value>>>,
    pub requests: Arc<Mutex<Vec<(String, Value)>>>,
}

impl Default for FakeModel {
    fn default() -> Self {
        Self {
            status: Arc::new(AtomicU16::new(200)),
            content: Arc::new(Mutex::new(r#"{"score": 0.0, "label": "neutral"}"#.to_string())),
            raw_body: Arc::new(Mutex::new(None)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl FakeModel {
    pub fn set_content(&self, content: &str) {
        *self.content.lock().unwrap() = content.to_string();
    }

    pub async fn spawn(&self) -> String {
        let router = Router::new()
            .route("/v1/chat/completions", post(chat_handler))
            .with_state(self.clone());
        spawn_server(router).await
    }
}

async fn chat_handler(
    State(fake): State<FakeModel>,
    headers: HeaderMap,
    Json(request): Json<Value>,
) -> Response {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    fake.requests.lock().unwrap().push((auth, request));

    let status = StatusCode::from_u16(fake.status.load(Ordering::SeqCst)).unwrap();
    if !status.is_success() {
        return (status, Json(json!({"error": {"message": "upstream unavailable"}}))).into_response();
    }

    let body = match fake.raw_body.lock().unwrap().clone() {
        Some(raw) => raw,
        None => json!({
            "id": "chatcmpl-test",
            "object": "chat.completion",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": fake.content.lock().unwrap().clone()},
                "finish_reason": "stop",
            }],
        }),
    };
    (status, Json(body)).into_response()
}
