//! API Error Handling
//!
//! Unified error types and conversion for API responses.

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::model::ModelError;
use crate::service::TrainingError;

/// API error type
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    ServiceUnavailable(String),
    InternalError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::ServiceUnavailable(msg) => {
                tracing::warn!("Rejecting request: {}", msg);
                (StatusCode::SERVICE_UNAVAILABLE, msg)
            }
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

impl From<TrainingError> for ApiError {
    fn from(err: TrainingError) -> Self {
        match err {
            TrainingError::NotFound(_) | TrainingError::DatasetNotFound(_) => {
                ApiError::NotFound(err.to_string())
            }
            TrainingError::Validation(msg) | TrainingError::InvalidState(msg) => {
                ApiError::BadRequest(msg)
            }
            TrainingError::QueueFull(_) | TrainingError::SchedulerUnavailable => {
                ApiError::ServiceUnavailable(err.to_string())
            }
            TrainingError::Repository(_) | TrainingError::Dataset(_) => {
                ApiError::InternalError(err.to_string())
            }
        }
    }
}

impl From<ModelError> for ApiError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::NotFound(_) => ApiError::NotFound(err.to_string()),
            ModelError::InvalidName(_) => ApiError::BadRequest(err.to_string()),
            ModelError::Io { .. } | ModelError::Aborted(_) => {
                ApiError::InternalError(err.to_string())
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let cases = [
            (
                TrainingError::NotFound("train_x".to_string()),
                StatusCode::NOT_FOUND,
            ),
            (
                TrainingError::DatasetNotFound("cones".to_string()),
                StatusCode::NOT_FOUND,
            ),
            (
                TrainingError::Validation("epochs must be at least 1".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (
                TrainingError::InvalidState("wrong status".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (TrainingError::QueueFull(32), StatusCode::SERVICE_UNAVAILABLE),
        ];

        for (err, expected) in cases {
            let response = ApiError::from(err).into_response();
            assert_eq!(response.status(), expected);
        }
    }

    #[test]
    fn test_model_error_status_codes() {
        let not_found = ApiError::from(ModelError::NotFound("best.pt".to_string()));
        assert_eq!(not_found.into_response().status(), StatusCode::NOT_FOUND);

        let invalid = ApiError::from(ModelError::InvalidName("../x.pt".to_string()));
        assert_eq!(invalid.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
