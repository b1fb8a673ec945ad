//! Training job domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::metrics::TrainingMetrics;
use crate::domain::training::{ModelSize, TrainingConfig};

/// Training job record
///
/// Structure shared between the server (owns and mutates) and clients (poll).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingJob {
    pub job_id: String,
    pub status: JobStatus,
    pub dataset_name: String,
    pub model_size: ModelSize,
    pub epochs: u32,
    pub current_epoch: u32,
    pub best_map: f64,
    pub current_metrics: Option<TrainingMetrics>,
    pub final_metrics: Option<TrainingMetrics>,
    pub model_path: Option<String>,
    pub model_name: Option<String>,
    pub error: Option<String>,
    /// Run generation, incremented on every resume
    pub attempt: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub config: TrainingConfig,
}

/// Training job status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    #[serde(alias = "PENDING")]
    Pending,
    #[serde(alias = "RUNNING")]
    Running,
    #[serde(alias = "COMPLETED")]
    Completed,
    #[serde(alias = "FAILED")]
    Failed,
    #[serde(alias = "CANCELLED")]
    Cancelled,
}

impl JobStatus {
    /// Whether `self -> next` is an edge of the job lifecycle graph
    ///
    /// `Failed`/`Cancelled -> Pending` is the resume edge.
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        use JobStatus::*;
        matches!(
            (self, next),
            (Pending, Running)
                | (Pending, Cancelled)
                | (Running, Completed)
                | (Running, Failed)
                | (Running, Cancelled)
                | (Failed, Pending)
                | (Cancelled, Pending)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(JobStatus::Pending),
            "running" => Ok(JobStatus::Running),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            "cancelled" => Ok(JobStatus::Cancelled),
            other => Err(format!("unknown job status '{}'", other)),
        }
    }
}

/// A set of field writes applied to a job in one atomic step
///
/// `None` leaves a field untouched. `expected_attempt` guards the whole patch:
/// it is rejected if the job has been resumed since the writer started.
#[derive(Debug, Clone, Default)]
pub struct JobPatch {
    pub expected_attempt: Option<u32>,
    pub status: Option<JobStatus>,
    pub attempt: Option<u32>,
    pub current_epoch: Option<u32>,
    pub best_map: Option<f64>,
    pub current_metrics: Option<Option<TrainingMetrics>>,
    pub final_metrics: Option<Option<TrainingMetrics>>,
    pub model_path: Option<Option<String>>,
    pub model_name: Option<Option<String>>,
    pub error: Option<Option<String>>,
}

/// Why a patch was refused
#[derive(Debug, Clone, PartialEq)]
pub enum PatchError {
    InvalidTransition { from: JobStatus, to: JobStatus },
    StaleAttempt { expected: u32, actual: u32 },
}

impl std::fmt::Display for PatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PatchError::InvalidTransition { from, to } => {
                write!(f, "invalid status transition {} -> {}", from, to)
            }
            PatchError::StaleAttempt { expected, actual } => write!(
                f,
                "stale write for attempt {} (job is on attempt {})",
                expected, actual
            ),
        }
    }
}

impl std::error::Error for PatchError {}

impl TrainingJob {
    /// Creates a pending job for a submitted configuration
    pub fn new(config: TrainingConfig) -> Self {
        let now = Utc::now();

        Self {
            job_id: generate_job_id(now),
            status: JobStatus::Pending,
            dataset_name: config.dataset_name.clone(),
            model_size: config.model_size,
            epochs: config.epochs,
            current_epoch: 0,
            best_map: 0.0,
            current_metrics: None,
            final_metrics: None,
            model_path: None,
            model_name: None,
            error: None,
            attempt: 1,
            created_at: now,
            updated_at: now,
            config,
        }
    }

    /// Applies a patch, all or nothing
    ///
    /// Guards are checked before any field is written; on success
    /// `updated_at` is refreshed.
    pub fn apply(&mut self, patch: JobPatch) -> Result<(), PatchError> {
        if let Some(expected) = patch.expected_attempt
            && expected != self.attempt
        {
            return Err(PatchError::StaleAttempt {
                expected,
                actual: self.attempt,
            });
        }

        if let Some(next) = patch.status
            && !self.status.can_transition_to(next)
        {
            return Err(PatchError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }

        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(attempt) = patch.attempt {
            self.attempt = attempt;
        }
        if let Some(epoch) = patch.current_epoch {
            self.current_epoch = epoch;
        }
        if let Some(best_map) = patch.best_map {
            self.best_map = best_map;
        }
        if let Some(metrics) = patch.current_metrics {
            self.current_metrics = metrics;
        }
        if let Some(metrics) = patch.final_metrics {
            self.final_metrics = metrics;
        }
        if let Some(path) = patch.model_path {
            self.model_path = path;
        }
        if let Some(name) = patch.model_name {
            self.model_name = name;
        }
        if let Some(error) = patch.error {
            self.error = error;
        }

        self.updated_at = Utc::now();
        Ok(())
    }
}

/// `train_<YYYYmmdd_HHMMSS>_<8 hex chars>`
pub fn generate_job_id(now: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("train_{}_{}", now.format("%Y%m%d_%H%M%S"), &suffix[..8])
}
