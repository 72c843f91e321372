//! progeny_runtime_groq - Groq speech-to-text and chat completion client
//!
//! Talks to any OpenAI-compatible API root:
//! - `POST {base_url}/audio/transcriptions` (multipart upload)
//! - `POST {base_url}/chat/completions` (JSON)
//!
//! Requests are made once; failures are reported, never retried.

use anyhow::{Context, Result};
use async_trait::async_trait;
use progeny_core::AssistantConfig;
use progeny_runtime_api::{ChatModel, ChatRequest, ChatResponse, Transcriber};
use reqwest::{multipart, Client, Response};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub struct GroqClient {
    client: Client,
    base_url: String,
    api_key: String,
    transcription_model: String,
    chat_model: String,
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [progeny_runtime_api::ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
    #[serde(default)]
    usage: Option<CompletionUsage>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CompletionUsage {
    #[serde(default)]
    total_tokens: u32,
}

impl GroqClient {
    /// Build a client from the assistant settings. Fails when no API key is set.
    pub fn new(config: &AssistantConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .context("No API key configured for the assistant (set GROQ_API_KEY)")?;

        let client = Client::builder()
            .user_agent(concat!("progeny/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            transcription_model: config.transcription_model.clone(),
            chat_model: config.chat_model.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

#[async_trait]
impl Transcriber for GroqClient {
    async fn transcribe(&self, audio: &Path, language: Option<&str>) -> Result<String> {
        let bytes = tokio::fs::read(audio)
            .await
            .with_context(|| format!("Failed to read audio file {:?}", audio))?;
        let file_name = audio
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio.m4a".to_string());

        tracing::debug!(
            "Transcribing {} bytes with {}",
            bytes.len(),
            self.transcription_model
        );

        let mut form = multipart::Form::new()
            .part("file", multipart::Part::bytes(bytes).file_name(file_name))
            .text("model", self.transcription_model.clone())
            .text("response_format", "json");
        if let Some(language) = language.filter(|l| !l.trim().is_empty()) {
            form = form.text("language", language.trim().to_string());
        }

        let response = self
            .client
            .post(self.url("audio/transcriptions"))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .context("Failed to reach transcription service")?;

        let body = read_success_body(response, "Transcription").await?;
        parse_transcription(&body)
    }
}

#[async_trait]
impl ChatModel for GroqClient {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        let payload = CompletionRequest {
            model: &self.chat_model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let response = self
            .client
            .post(self.url("chat/completions"))
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .context("Failed to reach chat completion service")?;

        let body = read_success_body(response, "Chat completion").await?;
        parse_completion(&body)
    }
}

async fn read_success_body(response: Response, what: &str) -> Result<String> {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    if !status.is_success() {
        anyhow::bail!("{} request failed ({}): {}", what, status, body);
    }
    Ok(body)
}

/// Extract the transcript text from a `response_format=json` reply.
pub fn parse_transcription(body: &str) -> Result<String> {
    let parsed: TranscriptionResponse =
        serde_json::from_str(body).context("Invalid transcription response")?;
    Ok(parsed.text)
}

/// Extract the first choice of a chat completion reply.
pub fn parse_completion(body: &str) -> Result<ChatResponse> {
    let parsed: CompletionResponse =
        serde_json::from_str(body).context("Invalid chat completion response")?;

    let choice = parsed
        .choices
        .into_iter()
        .next()
        .context("Chat completion returned no choices")?;

    Ok(ChatResponse {
        content: choice.message.content.unwrap_or_default(),
        tokens_used: parsed.usage.map(|u| u.total_tokens).unwrap_or(0),
        finish_reason: choice.finish_reason.unwrap_or_else(|| "stop".to_string()),
    })
}
