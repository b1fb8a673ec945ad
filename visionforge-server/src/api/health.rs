//! Health Check API Handler
//!
//! Simple health check endpoint for monitoring.

use axum::Json;
use visionforge_core::dto::health::HealthResponse;

/// GET /health
/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}
