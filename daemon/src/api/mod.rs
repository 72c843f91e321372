pub mod chat;
pub mod health;
pub mod predict;
pub mod remedies;
pub mod voice;

use axum::{
    extract::{DefaultBodyLimit, Multipart},
    routing::{get, post},
    Router,
};
use std::collections::HashMap;
use std::sync::Arc;
use tower_http::services::ServeFile;

use crate::error::ApiError;
use crate::state::AppState;

pub const RESET_PAGE: &str = "password-reset-success.html";

pub fn routes(state: Arc<AppState>) -> Router {
    let reset_page = ServeFile::new(state.static_dir.join(RESET_PAGE));

    Router::new()
        .route("/", get(health::index))
        .route("/health", get(health::health))
        .route("/predict", post(predict::predict))
        .route("/remedies", post(remedies::remedies))
        .route("/api/chat", post(chat::chat))
        .route("/api/chat/voice", post(voice::voice_chat))
        .route_service(&format!("/{}", RESET_PAGE), reset_page)
        .layer(DefaultBodyLimit::max(state.max_upload_bytes))
        .with_state(state)
}

/// An uploaded file part.
#[derive(Debug)]
pub struct Upload {
    pub file_name: Option<String>,
    pub bytes: Vec<u8>,
}

/// A fully read multipart form. A part is a file when it carries a file name;
/// everything else, typed or not, is a text field.
#[derive(Debug, Default)]
pub struct FormData {
    files: HashMap<String, Upload>,
    fields: HashMap<String, String>,
}

impl FormData {
    pub async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = FormData::default();

        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            if let Some(file_name) = field.file_name().map(str::to_string) {
                let bytes = field.bytes().await?.to_vec();
                form.files.insert(
                    name,
                    Upload {
                        file_name: Some(file_name),
                        bytes,
                    },
                );
            } else {
                let text = field.text().await?;
                form.fields.insert(name, text);
            }
        }

        Ok(form)
    }

    /// Take a non-empty file part.
    pub fn take_file(&mut self, name: &str) -> Option<Upload> {
        self.files.remove(name).filter(|upload| !upload.bytes.is_empty())
    }

    /// A text field, trimmed; blank counts as absent.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }
}
