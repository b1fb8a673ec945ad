//! Training job DTOs

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::Display;
use std::str::FromStr;

use crate::domain::job::JobStatus;
use crate::domain::metrics::TrainingMetrics;

/// Query parameters of the job listing endpoint
///
/// Empty values (`?status=&limit=`) mean "not given". The status is matched
/// case-insensitively.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListJobsQuery {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub status: Option<JobStatus>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub limit: Option<usize>,
}

fn empty_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    let value = Option::<String>::deserialize(deserializer)?;
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => raw.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

/// Response of a cancel request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelJobResponse {
    pub success: bool,
    pub message: String,
    pub job_id: String,
}

/// Progress and metrics view of a running or completed job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobMetrics {
    pub job_id: String,
    pub status: JobStatus,
    pub current_epoch: u32,
    pub total_epochs: u32,
    pub best_map: f64,
    pub current_metrics: Option<TrainingMetrics>,
    pub final_metrics: Option<TrainingMetrics>,
}
