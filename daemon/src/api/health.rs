use axum::{extract::State, Json};
use progeny_core::Crop;
use serde::Serialize;
use std::sync::Arc;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub models_loaded: Vec<Crop>,
    pub models_directory: String,
}

#[derive(Serialize)]
pub struct ServiceInfo {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub endpoints: Vec<&'static str>,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        models_loaded: state.registry.loaded_crops(),
        models_directory: state.models_directory.display().to_string(),
    })
}

pub async fn index() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        status: "running",
        service: "Progeny plant disease detection API",
        version: env!("CARGO_PKG_VERSION"),
        endpoints: vec![
            "GET /health",
            "POST /predict",
            "POST /remedies",
            "POST /api/chat",
            "POST /api/chat/voice",
        ],
    })
}
