//! Backends against local stub servers.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use plancoach_config::ProviderConfig;
use plancoach_llm::{ProviderError, ProviderKind, from_config};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone, Default)]
struct Captured {
    inner: Arc<Mutex<Vec<(HeaderMap, Value)>>>,
}

impl Captured {
    fn last(&self) -> (HeaderMap, Value) {
        self.inner.lock().unwrap().last().cloned().unwrap()
    }
}

async fn spawn_stub(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}/v1")
}

fn config(kind: ProviderKind, base_url: String, key: Option<&str>) -> ProviderConfig {
    let mut config = ProviderConfig::for_kind(kind);
    config.base_url = base_url;
    config.api_key = key.map(str::to_string);
    config.timeout = Duration::from_secs(5);
    config
}

async fn chat_ok(State(captured): State<Captured>, headers: HeaderMap, Json(body): Json<Value>) -> Json<Value> {
    captured.inner.lock().unwrap().push((headers, body));
    Json(json!({
        "model": "deepseek-reasoner",
        "choices": [{
            "message": {
                "role": "assistant",
                "content": "{\"root_cause_summary\": \"weekend gap\"}",
                "reasoning_content": "Saturday needs three people"
            }
        }],
        "usage": {"prompt_tokens": 120, "completion_tokens": 30}
    }))
}

#[tokio::test]
async fn test_chat_completions_round_trip() {
    let captured = Captured::default();
    let router = Router::new()
        .route("/v1/chat/completions", post(chat_ok))
        .with_state(captured.clone());
    let base = spawn_stub(router).await;

    let client = from_config(&config(ProviderKind::DeepSeek, base, Some("sk-test-0001"))).unwrap();
    let completion = client.generate("Analyze this", 2000).await.unwrap();

    assert_eq!(completion.text, "{\"root_cause_summary\": \"weekend gap\"}");
    assert_eq!(completion.reasoning.as_deref(), Some("Saturday needs three people"));
    assert_eq!(completion.provider, ProviderKind::DeepSeek);
    let usage = completion.usage.unwrap();
    assert_eq!(usage.input_tokens, Some(120));
    assert_eq!(usage.output_tokens, Some(30));

    let (headers, body) = captured.last();
    assert_eq!(
        headers.get("authorization").unwrap().to_str().unwrap(),
        "Bearer sk-test-0001"
    );
    assert_eq!(body["max_tokens"], 2000);
    assert_eq!(body["temperature"].as_f64().map(|t| (t * 10.0).round()), Some(7.0));
    assert_eq!(body["messages"][1]["content"], "Analyze this");
}

#[tokio::test]
async fn test_ollama_sends_no_authorization() {
    let captured = Captured::default();
    let router = Router::new()
        .route("/v1/chat/completions", post(chat_ok))
        .with_state(captured.clone());
    let base = spawn_stub(router).await;

    let client = from_config(&config(ProviderKind::Ollama, base, None)).unwrap();
    client.generate("Analyze this", 500).await.unwrap();

    let (headers, body) = captured.last();
    assert!(headers.get("authorization").is_none());
    assert_eq!(body["stream"], false);
}

#[tokio::test]
async fn test_anthropic_messages_round_trip() {
    let captured = Captured::default();
    async fn messages(
        State(captured): State<Captured>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> Json<Value> {
        captured.inner.lock().unwrap().push((headers, body));
        Json(json!({
            "model": "claude-3-opus-20240229",
            "content": [
                {"type": "text", "text": "part one, "},
                {"type": "text", "text": "part two"}
            ],
            "usage": {"input_tokens": 50, "output_tokens": 9}
        }))
    }

    let router = Router::new()
        .route("/v1/messages", post(messages))
        .with_state(captured.clone());
    let base = spawn_stub(router).await;

    let client = from_config(&config(ProviderKind::Anthropic, base, Some("anthropic-test-key"))).unwrap();
    let completion = client.generate("Analyze this", 2000).await.unwrap();

    assert_eq!(completion.text, "part one, part two");
    assert!(completion.reasoning.is_none());

    let (headers, body) = captured.last();
    assert_eq!(headers.get("x-api-key").unwrap().to_str().unwrap(), "anthropic-test-key");
    assert_eq!(
        headers.get("anthropic-version").unwrap().to_str().unwrap(),
        "2023-06-01"
    );
    assert_eq!(body["system"], plancoach_llm::SYSTEM_PROMPT);
}

#[tokio::test]
async fn test_non_success_status_is_redacted_transport_error() {
    async fn unauthorized() -> impl IntoResponse {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": {"message": "Incorrect API key provided: leaky-key-42"}})),
        )
    }

    let router = Router::new().route("/v1/chat/completions", post(unauthorized));
    let base = spawn_stub(router).await;

    let client = from_config(&config(ProviderKind::OpenAi, base, Some("leaky-key-42"))).unwrap();
    let err = client.generate("x", 10).await.unwrap_err();

    match &err {
        ProviderError::Transport {
            status,
            message,
            body,
            ..
        } => {
            assert_eq!(*status, Some(401));
            assert!(message.starts_with("Incorrect API key provided"), "got: {message}");
            assert!(!message.contains("leaky-key-42"), "got: {message}");
            let body = body.as_deref().unwrap();
            assert!(!body.contains("leaky-key-42"), "got: {body}");
        }
        other => panic!("Expected Transport, got {other:?}"),
    }
    assert_eq!(err.upstream_status(), Some(401));
}

#[tokio::test]
async fn test_undecodable_success_body_keeps_status() {
    async fn garbage() -> &'static str {
        "<html>proxy error</html>"
    }

    let router = Router::new().route("/v1/chat/completions", post(garbage));
    let base = spawn_stub(router).await;

    let client = from_config(&config(ProviderKind::OpenAi, base, Some("k-1"))).unwrap();
    match client.generate("x", 10).await {
        Err(ProviderError::Transport { status, body, .. }) => {
            assert_eq!(status, Some(200));
            assert!(body.unwrap().contains("proxy error"));
        }
        other => panic!("Expected Transport, got {other:?}"),
    }
}

#[tokio::test]
async fn test_slow_backend_times_out() {
    async fn slow() -> Json<Value> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Json(json!({"choices": []}))
    }

    let router = Router::new().route("/v1/chat/completions", post(slow));
    let base = spawn_stub(router).await;

    let mut cfg = config(ProviderKind::Ollama, base, None);
    cfg.timeout = Duration::from_millis(300);
    let client = from_config(&cfg).unwrap();

    let started = std::time::Instant::now();
    match client.generate("x", 10).await {
        Err(ProviderError::Timeout { provider, duration }) => {
            assert_eq!(provider, "ollama");
            assert_eq!(duration, Duration::from_millis(300));
        }
        other => panic!("Expected Timeout, got {other:?}"),
    }
    assert!(started.elapsed() < Duration::from_secs(3));
}

#[tokio::test]
async fn test_connection_refused_is_transport_without_status() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = from_config(&config(
        ProviderKind::Ollama,
        format!("http://{addr}/v1"),
        None,
    ))
    .unwrap();

    match client.generate("x", 10).await {
        Err(ProviderError::Transport { status, .. }) => assert_eq!(status, None),
        other => panic!("Expected Transport, got {other:?}"),
    }
}
