//! GroqClient against a local OpenAI-compatible stub.

use axum::{
    extract::{Multipart, State},
    http::{header, HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use progeny_core::AssistantConfig;
use progeny_runtime_api::{ChatMessage, ChatModel, ChatRequest, Transcriber};
use progeny_runtime_groq::GroqClient;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

const RATE_LIMIT_BODY: &str = r#"{"error":{"message":"Rate limit reached"}}"#;

/// What the stub saw on its last request.
#[derive(Default)]
struct Seen {
    authorization: Option<String>,
    file_name: Option<String>,
    fields: HashMap<String, String>,
    completion: Option<Value>,
}

type Shared = Arc<Mutex<Seen>>;

fn record_auth(seen: &Shared, headers: &HeaderMap) {
    seen.lock().unwrap().authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
}

async fn transcriptions(
    State(seen): State<Shared>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Json<Value> {
    record_auth(&seen, &headers);

    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        if name == "file" {
            seen.lock().unwrap().file_name = field.file_name().map(str::to_string);
            assert_eq!(&field.bytes().await.unwrap()[..], b"fake webm audio");
        } else {
            let text = field.text().await.unwrap();
            seen.lock().unwrap().fields.insert(name, text);
        }
    }

    Json(json!({"text": "Mes feuilles de tomate ont des taches", "x_groq": {"id": "req_1"}}))
}

async fn completions(
    State(seen): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    record_auth(&seen, &headers);
    seen.lock().unwrap().completion = Some(body);

    Json(json!({
        "id": "chatcmpl-1",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": "Retirez les feuilles atteintes."},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 30, "completion_tokens": 6, "total_tokens": 36}
    }))
}

async fn rate_limited() -> (StatusCode, &'static str) {
    (StatusCode::TOO_MANY_REQUESTS, RATE_LIMIT_BODY)
}

async fn spawn_stub(seen: Shared) -> SocketAddr {
    let app = Router::new()
        .route("/v1/audio/transcriptions", post(transcriptions))
        .route("/v1/chat/completions", post(completions))
        .route("/busy/chat/completions", post(rate_limited))
        .with_state(seen);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn client(base_url: String) -> GroqClient {
    GroqClient::new(&AssistantConfig {
        base_url,
        api_key: Some("k".to_string()),
        timeout_secs: 5,
        ..AssistantConfig::default()
    })
    .unwrap()
}

#[tokio::test]
async fn transcription_posts_multipart_with_bearer_key() {
    let seen = Shared::default();
    let addr = spawn_stub(seen.clone()).await;

    let dir = tempfile::tempdir().unwrap();
    let audio = dir.path().join("progeny-voice-x.webm");
    std::fs::write(&audio, b"fake webm audio").unwrap();

    let text = client(format!("http://{}/v1/", addr))
        .transcribe(&audio, Some(" fr "))
        .await
        .unwrap();
    assert_eq!(text, "Mes feuilles de tomate ont des taches");

    let seen = seen.lock().unwrap();
    assert_eq!(seen.authorization.as_deref(), Some("Bearer k"));
    assert_eq!(seen.file_name.as_deref(), Some("progeny-voice-x.webm"));
    assert_eq!(seen.fields["model"], "whisper-large-v3");
    assert_eq!(seen.fields["response_format"], "json");
    assert_eq!(seen.fields["language"], "fr");
}

#[tokio::test]
async fn transcription_omits_blank_language() {
    let seen = Shared::default();
    let addr = spawn_stub(seen.clone()).await;

    let dir = tempfile::tempdir().unwrap();
    let audio = dir.path().join("note.m4a");
    std::fs::write(&audio, b"fake webm audio").unwrap();

    client(format!("http://{}/v1", addr))
        .transcribe(&audio, Some("  "))
        .await
        .unwrap();

    assert!(!seen.lock().unwrap().fields.contains_key("language"));
}

#[tokio::test]
async fn chat_sends_completion_request() {
    let seen = Shared::default();
    let addr = spawn_stub(seen.clone()).await;

    let response = client(format!("http://{}/v1", addr))
        .chat(ChatRequest {
            messages: vec![
                ChatMessage::system("Tu es un agronome."),
                ChatMessage::user("Que faire contre le mildiou ?"),
            ],
            max_tokens: 1024,
            temperature: 0.7,
        })
        .await
        .unwrap();

    assert_eq!(response.content, "Retirez les feuilles atteintes.");
    assert_eq!(response.tokens_used, 36);
    assert_eq!(response.finish_reason, "stop");

    let seen = seen.lock().unwrap();
    assert_eq!(seen.authorization.as_deref(), Some("Bearer k"));
    let body = seen.completion.as_ref().unwrap();
    assert_eq!(body["model"], "llama-3.3-70b-versatile");
    assert_eq!(body["max_tokens"], 1024);
    assert!((body["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
    assert_eq!(
        body["messages"],
        json!([
            {"role": "system", "content": "Tu es un agronome."},
            {"role": "user", "content": "Que faire contre le mildiou ?"}
        ])
    );
}

#[tokio::test]
async fn rate_limit_is_reported_with_status_and_body() {
    let addr = spawn_stub(Shared::default()).await;

    let err = client(format!("http://{}/busy", addr))
        .chat(ChatRequest {
            messages: vec![ChatMessage::user("hello")],
            max_tokens: 16,
            temperature: 0.0,
        })
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        format!(
            "Chat completion request failed (429 Too Many Requests): {}",
            RATE_LIMIT_BODY
        )
    );
}
