//! End-to-end chat turns through the HTTP router against a mocked
//! completion service.

use axum::http::StatusCode;
use parley_gateway::Gateway;
use parley_integration_tests::{
    chat_request, completion, config_for, mount_reply, mount_summary, send, status_request,
    SUMMARY_PROMPT_MARKER,
};
use serde_json::Value;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const EIGHT_WORDS: &str = "one two three four five six seven eight";

/// Bodies of completion requests that were not summarization prompts.
async fn reply_requests(server: &MockServer) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|r| serde_json::from_slice::<Value>(&r.body).unwrap())
        .filter(|body| !body.to_string().contains(SUMMARY_PROMPT_MARKER))
        .collect()
}

#[tokio::test]
async fn test_chat_turns_accumulate_history() {
    let server = MockServer::start().await;
    mount_reply(&server, "Welcome aboard.").await;

    let mut config = config_for(&server.uri());
    config.persona.system_prompt = Some("You are Aliya.".to_string());
    let gateway = Gateway::from_config(config).unwrap();

    let (status, body) = send(gateway.router(), chat_request("Hello there", "voyage")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reply"], "Welcome aboard.");
    assert_eq!(body["sessionId"], "voyage");
    assert_eq!(body["messageCount"], 2);
    assert_eq!(body["estimatedTokens"], 4);

    let (_, body) = send(gateway.router(), chat_request("Where to?", "voyage")).await;
    assert_eq!(body["messageCount"], 4);

    let requests = reply_requests(&server).await;
    assert_eq!(requests.len(), 2);
    let second = requests[1]["messages"].as_array().unwrap();
    assert_eq!(second.len(), 4);
    assert_eq!(second[0]["role"], "system");
    assert_eq!(second[0]["content"], "You are Aliya.");
    assert_eq!(second[2]["content"], "Welcome aboard.");
    assert_eq!(second[3]["content"], "Where to?");
}

#[tokio::test]
async fn test_sessions_are_isolated() {
    let server = MockServer::start().await;
    mount_reply(&server, "ok").await;
    let gateway = Gateway::from_config(config_for(&server.uri())).unwrap();

    send(gateway.router(), chat_request("first", "a")).await;
    send(gateway.router(), chat_request("second", "a")).await;
    send(gateway.router(), chat_request("third", "b")).await;

    let (_, a) = send(gateway.router(), status_request("a")).await;
    let (_, b) = send(gateway.router(), status_request("b")).await;
    assert_eq!(a["messageCount"], 4);
    assert_eq!(b["messageCount"], 2);
}

#[tokio::test]
async fn test_long_conversation_is_summarized() {
    let server = MockServer::start().await;
    mount_summary(&server, "They sailed north.").await;
    mount_reply(&server, "Noted.").await;

    let mut config = config_for(&server.uri());
    config.context.max_tokens = 20;
    config.context.min_messages = 4;
    config.context.keep_recent = 2;
    let gateway = Gateway::from_config(config).unwrap();

    for _ in 0..2 {
        let (status, _) = send(gateway.router(), chat_request(EIGHT_WORDS, "long")).await;
        assert_eq!(status, StatusCode::OK);
    }

    // 5 messages and 26 tokens once the third question lands
    let (status, body) = send(gateway.router(), chat_request(EIGHT_WORDS, "long")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["messageCount"], 4);

    let (_, session) = send(gateway.router(), status_request("long")).await;
    assert_eq!(session["hasSummary"], true);
    assert_eq!(session["compactions"], 1);

    let requests = reply_requests(&server).await;
    let last = requests.last().unwrap()["messages"].as_array().unwrap().clone();
    assert_eq!(last.len(), 3);
    assert_eq!(last[0]["role"], "system");
    assert_eq!(last[0]["content"], "conversation summary: They sailed north.");
    assert_eq!(last[1]["content"], "Noted.");
    assert_eq!(last[2]["content"], EIGHT_WORDS);
}

#[tokio::test]
async fn test_failed_summary_truncates_and_turn_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(wiremock::matchers::body_string_contains(SUMMARY_PROMPT_MARKER))
        .respond_with(ResponseTemplate::new(500).set_body_string("overloaded"))
        .mount(&server)
        .await;
    mount_reply(&server, "Noted.").await;

    let mut config = config_for(&server.uri());
    config.context.max_tokens = 20;
    config.context.min_messages = 4;
    config.context.keep_recent = 2;
    let gateway = Gateway::from_config(config).unwrap();

    for _ in 0..3 {
        let (status, _) = send(gateway.router(), chat_request(EIGHT_WORDS, "long")).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (_, session) = send(gateway.router(), status_request("long")).await;
    assert_eq!(session["messageCount"], 3);
    assert_eq!(session["hasSummary"], false);
    assert_eq!(session["compactions"], 1);
    assert_eq!(session["totalTokens"], 1 + 8 + 1);
}

#[tokio::test]
async fn test_rejected_completion_forwards_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(402).set_body_json(serde_json::json!({
            "error": { "message": "Insufficient Balance", "type": "unknown_error" }
        })))
        .mount(&server)
        .await;
    let gateway = Gateway::from_config(config_for(&server.uri())).unwrap();

    let (status, body) = send(gateway.router(), chat_request("Hello", "s1")).await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert!(body["error"].is_string());
    assert!(body["details"]
        .as_str()
        .unwrap()
        .contains("Insufficient Balance"));

    // The user message survives the failed turn
    let (_, session) = send(gateway.router(), status_request("s1")).await;
    assert_eq!(session["messageCount"], 1);
}

#[tokio::test]
async fn test_malformed_completion_is_bad_gateway() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "choices": [] })),
        )
        .mount(&server)
        .await;
    let gateway = Gateway::from_config(config_for(&server.uri())).unwrap();

    let (status, _) = send(gateway.router(), chat_request("Hello", "s1")).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_missing_api_key_is_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("unused")))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = config_for(&server.uri());
    config.provider.api_key = None;
    config.provider.api_key_env = "PARLEY_INTEGRATION_UNSET_KEY".to_string();
    let gateway = Gateway::from_config(config).unwrap();

    let (status, body) = send(gateway.router(), chat_request("Hello", "s1")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].is_string());
}
