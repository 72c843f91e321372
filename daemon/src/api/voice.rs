use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    Json,
};
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tempfile::NamedTempFile;

use super::chat::{require_assistant, VOICE_SYSTEM_PROMPT};
use super::{FormData, Upload};
use crate::error::ApiError;
use crate::state::AppState;

const DEFAULT_AUDIO_SUFFIX: &str = ".m4a";

#[derive(Debug, Serialize)]
pub struct VoiceChatResponse {
    pub user_text: String,
    pub response: String,
    pub success: bool,
}

/// `.ext` of the uploaded file name, if it looks like a real extension.
fn audio_suffix(file_name: Option<&str>) -> String {
    file_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.len() <= 8)
        .filter(|ext| ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_else(|| DEFAULT_AUDIO_SUFFIX.to_string())
}

/// Write the upload to a named temp file. The file is removed when the
/// returned handle drops.
fn write_temp_audio(upload: &Upload) -> Result<NamedTempFile, ApiError> {
    let suffix = audio_suffix(upload.file_name.as_deref());
    let mut file = tempfile::Builder::new()
        .prefix("progeny-voice-")
        .suffix(&suffix)
        .tempfile()
        .map_err(|e| ApiError::Internal(format!("Failed to create temp audio file: {}", e)))?;

    file.write_all(&upload.bytes)
        .and_then(|_| file.flush())
        .map_err(|e| ApiError::Internal(format!("Failed to write temp audio file: {}", e)))?;

    Ok(file)
}

/// [`write_temp_audio`] on the blocking pool.
async fn persist_audio(upload: Upload) -> Result<NamedTempFile, ApiError> {
    tokio::task::spawn_blocking(move || write_temp_audio(&upload))
        .await
        .map_err(|e| ApiError::Internal(format!("Audio write task failed: {}", e)))?
}

pub async fn voice_chat(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<VoiceChatResponse>, ApiError> {
    let assistant = require_assistant(&state)?;
    let mut form = FormData::read(multipart?).await?;

    let upload = form
        .take_file("audio")
        .ok_or_else(|| ApiError::bad_request("No audio file provided"))?;
    let language = form.text("language").map(str::to_string);

    let size = upload.bytes.len();
    let audio = persist_audio(upload).await?;
    tracing::debug!("Saved {} bytes of audio to {:?}", size, audio.path());

    let transcript = assistant
        .transcriber
        .transcribe(audio.path(), language.as_deref())
        .await?;
    let user_text = transcript.trim();
    tracing::info!("Transcribed: {}", user_text);

    if user_text.is_empty() {
        return Err(ApiError::bad_request("Could not understand audio"));
    }

    let response = assistant.reply(VOICE_SYSTEM_PROMPT, user_text).await?;

    Ok(Json(VoiceChatResponse {
        user_text: user_text.to_string(),
        response,
        success: true,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffix_follows_upload_extension() {
        assert_eq!(audio_suffix(Some("question.WAV")), ".wav");
        assert_eq!(audio_suffix(Some("clip.webm")), ".webm");
        assert_eq!(audio_suffix(Some("recording")), ".m4a");
        assert_eq!(audio_suffix(Some("x.m4a;rm -rf")), ".m4a");
        assert_eq!(audio_suffix(None), ".m4a");
    }

    #[tokio::test]
    async fn temp_audio_is_removed_on_drop() {
        let upload = Upload {
            file_name: Some("voice.ogg".to_string()),
            bytes: vec![1, 2, 3],
        };
        let file = persist_audio(upload).await.unwrap();
        let path = file.path().to_path_buf();

        assert!(path.to_string_lossy().ends_with(".ogg"));
        assert_eq!(std::fs::read(&path).unwrap(), vec![1, 2, 3]);

        drop(file);
        assert!(!path.exists());
    }
}
