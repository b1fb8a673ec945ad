//! Training Service
//!
//! Business logic for the training job lifecycle: admission of new jobs,
//! cancel, resume and the read side used by the API.

use std::sync::Arc;
use thiserror::Error;
use visionforge_core::domain::job::{JobPatch, JobStatus, TrainingJob};
use visionforge_core::domain::training::TrainingConfig;
use visionforge_core::dto::job::{JobMetrics, ListJobsQuery};

use crate::dataset::{self, DatasetCatalog, DatasetError};
use crate::repository::{JobRepository, RepositoryError};
use crate::scheduler::{JobScheduler, SchedulerError};
use crate::service::runner::QueuedRun;

/// Jobs returned by a listing when no limit is given
pub const DEFAULT_LIST_LIMIT: usize = 50;

/// Service error type
#[derive(Debug, Error)]
pub enum TrainingError {
    #[error("{0}")]
    Validation(String),

    #[error("Training job {0} not found")]
    NotFound(String),

    #[error("Dataset {0} not found")]
    DatasetNotFound(String),

    #[error("{0}")]
    InvalidState(String),

    #[error("Training queue is full ({0} jobs waiting), try again later")]
    QueueFull(usize),

    #[error("Training scheduler is not running")]
    SchedulerUnavailable,

    #[error(transparent)]
    Repository(RepositoryError),

    #[error(transparent)]
    Dataset(DatasetError),
}

impl From<RepositoryError> for TrainingError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(id) | RepositoryError::UnknownJob(id) => {
                TrainingError::NotFound(id)
            }
            other => TrainingError::Repository(other),
        }
    }
}

impl From<DatasetError> for TrainingError {
    fn from(err: DatasetError) -> Self {
        match err {
            DatasetError::NotFound(name) => TrainingError::DatasetNotFound(name),
            DatasetError::InvalidName(name) => {
                TrainingError::Validation(format!("Invalid dataset name '{}'", name))
            }
            other => TrainingError::Dataset(other),
        }
    }
}

impl From<SchedulerError> for TrainingError {
    fn from(err: SchedulerError) -> Self {
        match err {
            SchedulerError::QueueFull(capacity) => TrainingError::QueueFull(capacity),
            SchedulerError::Closed => TrainingError::SchedulerUnavailable,
        }
    }
}

/// Entry point for everything the API does with training jobs
pub struct TrainingService {
    repository: Arc<dyn JobRepository>,
    catalog: Arc<dyn DatasetCatalog>,
    scheduler: JobScheduler,
}

impl TrainingService {
    pub fn new(
        repository: Arc<dyn JobRepository>,
        catalog: Arc<dyn DatasetCatalog>,
        scheduler: JobScheduler,
    ) -> Self {
        Self {
            repository,
            catalog,
            scheduler,
        }
    }

    /// Admits a new training job and queues its first run
    ///
    /// Returns the pending snapshot without waiting for training.
    pub async fn submit(&self, config: TrainingConfig) -> Result<TrainingJob, TrainingError> {
        config.validate().map_err(TrainingError::Validation)?;

        let dataset = dataset::lookup(&self.catalog, &config.dataset_name).await?;
        if dataset.num_images_train == 0 {
            return Err(TrainingError::Validation(
                "Dataset has no training images".to_string(),
            ));
        }
        if dataset.num_images_val == 0 {
            return Err(TrainingError::Validation(
                "Dataset has no validation images".to_string(),
            ));
        }

        // Reserve before creating so a full queue leaves no orphan job behind
        let slot = self.scheduler.reserve()?;
        let job = self.repository.create(config).await?;

        slot.submit(QueuedRun {
            job_id: job.job_id.clone(),
            attempt: job.attempt,
            config: job.config.clone(),
        });

        tracing::info!(
            "Training job {} submitted: dataset {}, model {}, {} epochs",
            job.job_id,
            job.dataset_name,
            job.model_size,
            job.epochs
        );

        Ok(job)
    }

    /// Get a job by ID
    pub async fn get(&self, job_id: &str) -> Result<TrainingJob, TrainingError> {
        Ok(self.repository.get(job_id).await?)
    }

    /// List jobs, newest first
    pub async fn list(&self, query: ListJobsQuery) -> Result<Vec<TrainingJob>, TrainingError> {
        let limit = query.limit.unwrap_or(DEFAULT_LIST_LIMIT);
        Ok(self.repository.list(query.status, limit).await?)
    }

    /// Cancels a pending or running job
    ///
    /// Only the status changes. A run already inside the trainer keeps going
    /// and its terminal write is rejected later.
    pub async fn cancel(&self, job_id: &str) -> Result<TrainingJob, TrainingError> {
        let patch = JobPatch {
            status: Some(JobStatus::Cancelled),
            ..Default::default()
        };

        match self.repository.update(job_id, patch).await {
            Ok(job) => {
                tracing::info!("Training job {} cancelled", job_id);
                Ok(job)
            }
            Err(RepositoryError::Rejected { .. }) => {
                let job = self.repository.get(job_id).await?;
                Err(TrainingError::InvalidState(format!(
                    "Cannot cancel job {} in status {}",
                    job_id, job.status
                )))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Re-queues a cancelled or failed job with its original configuration
    pub async fn resume(&self, job_id: &str) -> Result<TrainingJob, TrainingError> {
        let job = self.repository.get(job_id).await?;
        if !matches!(job.status, JobStatus::Cancelled | JobStatus::Failed) {
            return Err(TrainingError::InvalidState(
                "Can only resume cancelled or failed jobs".to_string(),
            ));
        }

        let slot = self.scheduler.reserve()?;

        let patch = JobPatch {
            expected_attempt: Some(job.attempt),
            status: Some(JobStatus::Pending),
            attempt: Some(job.attempt + 1),
            error: Some(None),
            ..Default::default()
        };

        let job = match self.repository.update(job_id, patch).await {
            Ok(job) => job,
            // Lost a race with another resume
            Err(RepositoryError::Rejected { .. }) => {
                return Err(TrainingError::InvalidState(
                    "Can only resume cancelled or failed jobs".to_string(),
                ));
            }
            Err(e) => return Err(e.into()),
        };

        slot.submit(QueuedRun {
            job_id: job.job_id.clone(),
            attempt: job.attempt,
            config: job.config.clone(),
        });

        tracing::info!("Training job {} resumed (attempt {})", job_id, job.attempt);

        Ok(job)
    }

    /// Metrics view of a running or completed job
    pub async fn metrics(&self, job_id: &str) -> Result<JobMetrics, TrainingError> {
        let job = self.repository.get(job_id).await?;
        if !matches!(job.status, JobStatus::Running | JobStatus::Completed) {
            return Err(TrainingError::InvalidState(
                "Metrics only available for running or completed jobs".to_string(),
            ));
        }

        Ok(JobMetrics {
            job_id: job.job_id,
            status: job.status,
            current_epoch: job.current_epoch,
            total_epochs: job.epochs,
            best_map: job.best_map,
            current_metrics: job.current_metrics,
            final_metrics: job.final_metrics,
        })
    }
}
