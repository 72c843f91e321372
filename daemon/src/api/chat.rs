use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::ApiError;
use crate::state::{AppState, Assistant};

/// Short prompt for spoken answers.
pub const VOICE_SYSTEM_PROMPT: &str = "\
# SYSTEM ROLE — PROGENITURE
You are Progeniture, the core AI intelligence of Progeny, a mobile-first agricultural intelligence platform.
Your goal is to guide farmers step-by-step after plant disease detection.
RESPONSE RULES: Simple, direct language. No markdown. No emojis. 6 steps max.";

/// Full advisor prompt for typed questions.
pub const CHAT_SYSTEM_PROMPT: &str = "\
# CORE IDENTITY: PROGENITURE AI
You are Progeniture AI, the specialized agricultural expert built for the Progeny platform.
You are NOT a generic LLM, assistant, or \"computer program\". You are a dedicated plant pathologist and farming advisor.

## YOUR MISSION
Support farmers by diagnosing plant diseases and providing actionable, step-by-step recovery plans.
Focus strictly on:
- Disease identification and explanation.
- Organic and chemical treatment options (always prioritize safety).
- Preventive farming practices and seasonal advice.
- Yield protection and field management.

## PERSONALITY & CONTEXT
- If asked \"Who are you?\", identify as Progeniture AI, the agricultural core of the Progeny platform.
- Never mention being a generic AI. You are a field-ready expert.
- Tone: Empathetic to the hard work of farmers, direct, professional, and practical.

## OPERATION RULES
1. RESPONSE FORMAT: Plain text only. NO markdown (no **, no #), NO emojis.
2. CONCISENESS: 6 steps maximum per response.
3. SAFETY: Always advise checking with local experts for high-severity issues. Never specify exact chemical dosages; suggest consulting labels.
4. SCOPE: If asked questions completely unrelated to agriculture, politely redirect the user back to their farm and plant health.";

#[derive(Debug, Deserialize)]
pub struct ChatInput {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatOutput {
    pub response: String,
    pub success: bool,
}

pub(crate) fn require_assistant(state: &AppState) -> Result<&Assistant, ApiError> {
    state
        .assistant
        .as_ref()
        .ok_or_else(|| ApiError::ServiceUnavailable("Voice assistant is not configured".to_string()))
}

pub async fn chat(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ChatInput>, JsonRejection>,
) -> Result<Json<ChatOutput>, ApiError> {
    let assistant = require_assistant(&state)?;
    let Json(input) = payload?;

    let message = input
        .message
        .filter(|m| !m.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("Message is required"))?;

    tracing::info!("Chat question ({} chars)", message.len());
    let response = assistant.reply(CHAT_SYSTEM_PROMPT, &message).await?;

    Ok(Json(ChatOutput {
        response,
        success: true,
    }))
}
