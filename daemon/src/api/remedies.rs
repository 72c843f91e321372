use axum::{extract::rejection::JsonRejection, Json};
use progeny_core::{remedies_for, RemedySource};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct RemedyRequest {
    #[serde(default)]
    pub disease_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RemedyResponse {
    pub disease_name: String,
    pub remedies: Vec<&'static str>,
    pub source: RemedySource,
}

pub async fn remedies(
    payload: Result<Json<RemedyRequest>, JsonRejection>,
) -> Result<Json<RemedyResponse>, ApiError> {
    let Json(request) = payload?;

    let disease_name = request
        .disease_name
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .ok_or_else(|| ApiError::bad_request("Disease name is required"))?;

    let (remedies, source) = remedies_for(&disease_name);

    Ok(Json(RemedyResponse {
        disease_name,
        remedies: remedies.to_vec(),
        source,
    }))
}
