//! progeny_runtime_api - Runtime API traits and types
//!
//! This crate defines the contract for pluggable backends:
//! - [`Classifier`]: a loaded image classification model (tract, ...)
//! - [`Transcriber`] and [`ChatModel`]: remote speech-to-text and chat
//!   completion services (Groq, ...)

use anyhow::Result;
use async_trait::async_trait;
use progeny_core::{ImageTensor, InputSpec, OutputKind};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for loading a classifier
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    pub model_path: PathBuf,
    pub input: InputSpec,
    pub output: OutputKind,
}

/// A loaded image classifier. Implementations are immutable once loaded and
/// may be called from many threads at once.
pub trait Classifier: Send + Sync {
    /// Input the model expects
    fn input_spec(&self) -> InputSpec;

    /// Size of the output vector, when the model declares it
    fn num_classes(&self) -> Option<usize>;

    /// Run one forward pass, returning one probability per class
    fn classify(&self, input: &ImageTensor) -> Result<Vec<f32>>;
}

/// Speech-to-text backend
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe the audio file at `audio`; `language` is an optional
    /// ISO-639-1 hint.
    async fn transcribe(&self, audio: &Path, language: Option<&str>) -> Result<String>;
}

/// Chat completion backend
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse>;
}

/// Chat message for completion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Request for chat completion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Response from chat completion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub content: String,
    pub tokens_used: u32,
    pub finish_reason: String,
}

/// One class with its probability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassScore {
    pub class: String,
    pub confidence: f32,
}

/// Pair scores with labels and sort them by confidence, highest first.
///
/// Scores past the end of `class_names` are labelled `Unknown_<index>`. The
/// sort is stable, so ties keep model order and the first entry is the arg-max.
pub fn rank_scores(scores: &[f32], class_names: &[&str]) -> Vec<ClassScore> {
    let mut ranked: Vec<ClassScore> = scores
        .iter()
        .enumerate()
        .map(|(index, &confidence)| ClassScore {
            class: class_names
                .get(index)
                .map(|name| name.to_string())
                .unwrap_or_else(|| format!("Unknown_{}", index)),
            confidence,
        })
        .collect();

    ranked.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    ranked
}

/// Numerically stable softmax
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let max_logit = logits.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let exp: Vec<f32> = logits.iter().map(|&x| (x - max_logit).exp()).collect();
    let sum: f32 = exp.iter().sum();
    exp.iter().map(|&x| x / sum).collect()
}
