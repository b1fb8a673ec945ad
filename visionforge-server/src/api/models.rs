//! Model API Handlers
//!
//! Read-only endpoints over the trained model files.

use axum::{
    Json,
    extract::{Path, State},
};
use visionforge_core::domain::model::ModelInfo;

use crate::api::AppState;
use crate::api::error::ApiResult;
use crate::model;

/// GET /models
/// List trained models, newest first
pub async fn list_models(State(state): State<AppState>) -> ApiResult<Json<Vec<ModelInfo>>> {
    let models = model::list(&state.models).await?;
    tracing::debug!("Listing {} models", models.len());
    Ok(Json(models))
}

/// GET /models/{model_name}
pub async fn get_model(
    State(state): State<AppState>,
    Path(model_name): Path<String>,
) -> ApiResult<Json<ModelInfo>> {
    tracing::debug!("Getting model: {}", model_name);

    let model = model::get(&state.models, &model_name).await?;
    Ok(Json(model))
}
