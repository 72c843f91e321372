use anyhow::Result;
use progeny_core::{AssistantConfig, Config};
use progeny_runtime_api::{ChatMessage, ChatModel, ChatRequest, Transcriber};
use progeny_runtime_groq::GroqClient;
use std::path::PathBuf;
use std::sync::Arc;

use crate::registry::{ModelRegistry, TractLoader};

/// Shown when the chat service answers with empty content.
const EMPTY_REPLY: &str = "I'm sorry, I couldn't generate a response.";

/// Speech-to-text plus chat completion, with the sampling settings used for
/// every question.
#[derive(Clone)]
pub struct Assistant {
    pub transcriber: Arc<dyn Transcriber>,
    pub chat: Arc<dyn ChatModel>,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Assistant {
    /// `None` when no API key is configured.
    pub fn from_config(config: &AssistantConfig) -> Result<Option<Self>> {
        if config.api_key.as_deref().map_or(true, |k| k.trim().is_empty()) {
            tracing::warn!("GROQ_API_KEY not set, voice and text chat are disabled");
            return Ok(None);
        }

        let client = Arc::new(GroqClient::new(config)?);
        tracing::info!(
            "Assistant enabled ({} / {})",
            config.transcription_model,
            config.chat_model
        );

        Ok(Some(Self {
            transcriber: client.clone(),
            chat: client,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }))
    }

    /// Ask the chat model one question under `system_prompt`.
    pub async fn reply(&self, system_prompt: &str, question: &str) -> Result<String> {
        let response = self
            .chat
            .chat(ChatRequest {
                messages: vec![
                    ChatMessage::system(system_prompt.trim()),
                    ChatMessage::user(question),
                ],
                max_tokens: self.max_tokens,
                temperature: self.temperature,
            })
            .await?;

        tracing::debug!(
            "Chat reply: {} tokens, finish reason {}",
            response.tokens_used,
            response.finish_reason
        );

        if response.content.trim().is_empty() {
            return Ok(EMPTY_REPLY.to_string());
        }
        Ok(response.content)
    }
}

pub struct AppState {
    pub registry: ModelRegistry,
    pub assistant: Option<Assistant>,
    pub models_directory: PathBuf,
    pub static_dir: PathBuf,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(config: &Config, registry: ModelRegistry, assistant: Option<Assistant>) -> Self {
        Self {
            registry,
            assistant,
            models_directory: config.models.directory.clone(),
            static_dir: config.daemon.static_dir.clone(),
            max_upload_bytes: config.daemon.max_upload_mb * 1024 * 1024,
        }
    }

    /// Load every crop model and set up the assistant.
    pub fn from_config(config: &Config) -> Result<Self> {
        let registry = ModelRegistry::load(&config.models, &TractLoader);
        let assistant = Assistant::from_config(&config.assistant)?;
        Ok(Self::new(config, registry, assistant))
    }
}
