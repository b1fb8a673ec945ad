//! API Module
//!
//! HTTP API layer of the server.
//! Each submodule handles endpoints for a specific domain.

pub mod error;
pub mod health;
pub mod models;
pub mod training;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::model::ModelCatalog;
use crate::service::TrainingService;

/// Prefix of every versioned endpoint
pub const API_PREFIX: &str = "/api/v1";

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub training: Arc<TrainingService>,
    pub models: Arc<dyn ModelCatalog>,
}

/// Create the main API router with all endpoints
pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Training endpoints
        .route(
            "/train",
            post(training::submit_training).get(training::list_training_jobs),
        )
        .route(
            "/train/{job_id}",
            get(training::get_training_job).delete(training::cancel_training_job),
        )
        .route("/train/{job_id}/resume", post(training::resume_training_job))
        .route("/train/{job_id}/metrics", get(training::get_training_metrics))
        // Model catalog
        .route("/models", get(models::list_models))
        .route("/models/{model_name}", get(models::get_model));

    Router::new()
        .nest(API_PREFIX, api)
        // Add state and middleware
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
