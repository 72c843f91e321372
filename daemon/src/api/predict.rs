use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    Json,
};
use progeny_core::{remedies_for, Crop};
use progeny_runtime_api::ClassScore;
use serde::Serialize;
use std::sync::Arc;

use super::FormData;
use crate::error::ApiError;
use crate::registry::ModelRegistry;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct PredictionResponse {
    pub disease_name: String,
    pub confidence_score: f32,
    pub remedies: Vec<&'static str>,
    pub all_predictions: Vec<ClassScore>,
}

fn invalid_crop(registry: &ModelRegistry) -> ApiError {
    let crops: Vec<String> = registry
        .loaded_crops()
        .iter()
        .map(|crop| format!("'{}'", crop))
        .collect();
    ApiError::bad_request(format!(
        "Invalid crop type. Must be one of: [{}]",
        crops.join(", ")
    ))
}

pub async fn predict(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<PredictionResponse>, ApiError> {
    let mut form = FormData::read(multipart?).await?;

    let image = form
        .take_file("image")
        .ok_or_else(|| ApiError::bad_request("No image provided"))?;

    let entry = form
        .text("crop_type")
        .and_then(Crop::from_id)
        .and_then(|crop| state.registry.get(crop))
        .cloned()
        .ok_or_else(|| invalid_crop(&state.registry))?;

    let crop = entry.crop;
    tracing::info!(
        "Predicting {} image {:?} ({} bytes)",
        crop,
        image.file_name.as_deref().unwrap_or("<unnamed>"),
        image.bytes.len()
    );

    let ranked = tokio::task::spawn_blocking(move || entry.predict(&image.bytes))
        .await
        .map_err(|e| ApiError::Internal(format!("Inference task failed: {}", e)))??;

    let best = &ranked[0];
    let (remedies, source) = remedies_for(&best.class);
    tracing::info!(
        "{} prediction: {} ({:.2}%), remedies {:?}",
        crop,
        best.class,
        best.confidence * 100.0,
        source
    );

    Ok(Json(PredictionResponse {
        disease_name: best.class.clone(),
        confidence_score: best.confidence,
        remedies: remedies.to_vec(),
        all_predictions: ranked,
    }))
}
