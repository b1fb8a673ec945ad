//! Training API Handlers
//!
//! HTTP endpoints for the training job lifecycle.

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
};
use visionforge_core::domain::job::TrainingJob;
use visionforge_core::domain::training::TrainingConfig;
use visionforge_core::dto::job::{CancelJobResponse, JobMetrics, ListJobsQuery};

use crate::api::AppState;
use crate::api::error::ApiResult;

/// POST /train
/// Submit a training job; returns as soon as the job is queued
pub async fn submit_training(
    State(state): State<AppState>,
    payload: Result<Json<TrainingConfig>, JsonRejection>,
) -> ApiResult<Json<TrainingJob>> {
    let Json(config) = payload?;
    tracing::info!(
        "Training requested: dataset {}, model {}, {} epochs",
        config.dataset_name,
        config.model_size,
        config.epochs
    );

    let job = state.training.submit(config).await?;
    Ok(Json(job))
}

/// GET /train
/// List training jobs, newest first
pub async fn list_training_jobs(
    State(state): State<AppState>,
    query: Result<Query<ListJobsQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<TrainingJob>>> {
    let Query(query) = query?;
    tracing::debug!("Listing training jobs: {:?}", query);

    let jobs = state.training.list(query).await?;
    Ok(Json(jobs))
}

/// GET /train/{job_id}
pub async fn get_training_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<TrainingJob>> {
    tracing::debug!("Getting training job: {}", job_id);

    let job = state.training.get(&job_id).await?;
    Ok(Json(job))
}

/// DELETE /train/{job_id}
/// Cancel a pending or running job
pub async fn cancel_training_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<CancelJobResponse>> {
    tracing::info!("Cancelling training job: {}", job_id);

    let job = state.training.cancel(&job_id).await?;

    Ok(Json(CancelJobResponse {
        success: true,
        message: format!("Job {} cancelled", job.job_id),
        job_id: job.job_id,
    }))
}

/// POST /train/{job_id}/resume
/// Re-run a cancelled or failed job with its original configuration
pub async fn resume_training_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<TrainingJob>> {
    tracing::info!("Resuming training job: {}", job_id);

    let job = state.training.resume(&job_id).await?;
    Ok(Json(job))
}

/// GET /train/{job_id}/metrics
pub async fn get_training_metrics(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<JobMetrics>> {
    let metrics = state.training.metrics(&job_id).await?;
    Ok(Json(metrics))
}
