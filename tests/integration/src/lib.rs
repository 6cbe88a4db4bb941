//! Shared fixtures for Parley integration tests.

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use parley_core::types::Message;
use parley_core::{Config, SecretString};
use parley_providers::ProviderError;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use tower::ServiceExt;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Text every summarization prompt starts with.
pub const SUMMARY_PROMPT_MARKER: &str = "Summarize the following conversation";

/// Configuration pointing the provider at `base_url` with a test key.
pub fn config_for(base_url: &str) -> Config {
    let mut config = Config::default();
    config.provider.base_url = base_url.to_string();
    config.provider.api_key = Some(SecretString::new("sk-integration"));
    config.gateway.static_dir = None;
    config
}

/// An OpenAI-style completion body with a single choice.
pub fn completion(content: &str) -> Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }],
        "usage": { "prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15 }
    })
}

/// Answer summarization prompts with `digest`.
///
/// Mount before [`mount_reply`] so summary requests match this mock first.
pub async fn mount_summary(server: &MockServer, digest: &str) {
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_string_contains(SUMMARY_PROMPT_MARKER))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(digest)))
        .mount(server)
        .await;
}

/// Answer every completion request with `reply`.
pub async fn mount_reply(server: &MockServer, reply: &str) {
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-integration"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(reply)))
        .mount(server)
        .await;
}

/// Send a request through the router and decode the JSON body.
pub async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

/// `POST /api/chat` with `message` in `session_id`.
pub fn chat_request(message: &str, session_id: &str) -> Request<Body> {
    Request::post("/api/chat")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({ "message": message, "sessionId": session_id }).to_string(),
        ))
        .unwrap()
}

/// `GET /api/session/{id}`.
pub fn status_request(session_id: &str) -> Request<Body> {
    Request::get(format!("/api/session/{}", session_id))
        .body(Body::empty())
        .unwrap()
}

/// Summarizer that counts calls and always answers with the same digest.
pub struct CountingSummarizer {
    digest: &'static str,
    calls: AtomicUsize,
}

impl CountingSummarizer {
    pub fn new(digest: &'static str) -> Self {
        Self {
            digest,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl parley_agent::Summarizer for CountingSummarizer {
    async fn summarize(&self, _messages: &[Message]) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.digest.to_string())
    }
}
