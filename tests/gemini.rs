//! Gemini client against a local mock of the generateContent endpoint

use axum::extract::{ Path, State };
use axum::http::{ HeaderMap, StatusCode };
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{ Json, Router };
use gemini_voice_relay::llm::{ LlmConfig, LlmError };
use gemini_voice_relay::llm::chat::ChatClient;
use gemini_voice_relay::llm::chat::gemini::GeminiChatClient;
use gemini_voice_relay::models::chat::Turn;
use serde_json::{ json, Value };
use std::sync::{ Arc, Mutex };
use std::time::Duration;

mod common;
use common::spawn_mock;

#[derive(Clone, Default)]
struct Recorded {
    requests: Arc<Mutex<Vec<(String, Option<String>, Value)>>>,
}

async fn generate_ok(
    State(recorded): State<Recorded>,
    Path(call): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>
) -> impl IntoResponse {
    let key = headers
        .get("x-goog-api-key")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    recorded.requests.lock().unwrap().push((call, key, body));
    Json(json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": "Paris." }] },
            "finishReason": "STOP"
        }]
    }))
}

async fn generate_quota() -> impl IntoResponse {
    (StatusCode::TOO_MANY_REQUESTS, r#"{"error":{"status":"RESOURCE_EXHAUSTED"}}"#)
}

async fn generate_stalled() -> impl IntoResponse {
    tokio::time::sleep(Duration::from_secs(5)).await;
    Json(json!({ "candidates": [] }))
}

async fn generate_blocked() -> impl IntoResponse {
    Json(json!({ "promptFeedback": { "blockReason": "SAFETY" } }))
}

#[tokio::test]
async fn test_complete_sends_history_and_returns_text() {
    let recorded = Recorded::default();
    let base = spawn_mock(
        Router::new()
            .route("/v1beta/models/{call}", post(generate_ok))
            .with_state(recorded.clone())
    ).await;

    let client = GeminiChatClient::new(
        "test-key".into(),
        Some("gemini-test".into()),
        Some(format!("{}/v1beta", base))
    ).unwrap();

    let history = vec![Turn::user("Hi"), Turn::model("Hello!")];
    let resp = client.complete(&history, "Capital of France?").await.unwrap();
    assert_eq!(resp.response, "Paris.");

    let requests = recorded.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    let (call, key, body) = &requests[0];
    assert_eq!(call, "gemini-test:generateContent");
    assert_eq!(key.as_deref(), Some("test-key"));
    assert_eq!(
        body["contents"],
        json!([
            { "role": "user", "parts": [{ "text": "Hi" }] },
            { "role": "model", "parts": [{ "text": "Hello!" }] },
            { "role": "user", "parts": [{ "text": "Capital of France?" }] }
        ])
    );
}

#[tokio::test]
async fn test_error_status_becomes_api_error() {
    let base = spawn_mock(Router::new().route("/v1beta/models/{call}", post(generate_quota))).await;
    let client = GeminiChatClient::new("k".into(), None, Some(format!("{}/v1beta", base))).unwrap();

    match client.complete(&[], "hello").await {
        Err(LlmError::Api { status, body }) => {
            assert_eq!(status.as_u16(), 429);
            assert!(body.contains("RESOURCE_EXHAUSTED"));
        }
        other => panic!("unexpected result: {:?}", other.map(|r| r.response)),
    }
}

#[tokio::test]
async fn test_blocked_prompt_is_empty_response() {
    let base = spawn_mock(Router::new().route("/v1beta/models/{call}", post(generate_blocked))).await;
    let client = GeminiChatClient::new("k".into(), None, Some(format!("{}/v1beta", base))).unwrap();

    let result = client.complete(&[], "something unsafe").await;
    assert!(matches!(result, Err(LlmError::EmptyResponse(Some(ref r))) if r == "SAFETY"));
}

#[tokio::test]
async fn test_unreachable_service_is_http_error() {
    // Bind then drop to get a port nothing listens on.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = GeminiChatClient::new("k".into(), None, Some(format!("http://{}", addr))).unwrap();
    assert!(matches!(client.complete(&[], "hello").await, Err(LlmError::Http(_))));
}

#[tokio::test]
async fn test_stalled_service_times_out_as_http_error() {
    let base = spawn_mock(Router::new().route("/v1beta/models/{call}", post(generate_stalled))).await;
    let client = GeminiChatClient::from_config(&LlmConfig {
        api_key: Some("k".into()),
        base_url: Some(format!("{}/v1beta", base)),
        timeout: Some(Duration::from_millis(200)),
        ..Default::default()
    }).unwrap();

    let started = std::time::Instant::now();
    match client.complete(&[], "hello").await {
        Err(LlmError::Http(e)) => assert!(e.is_timeout(), "expected a timeout, got {e}"),
        other => panic!("unexpected result: {:?}", other.map(|r| r.response)),
    }
    assert!(started.elapsed() < Duration::from_secs(5));
}
