//! Job Repository
//!
//! Registry of training jobs keyed by job id.

use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;
use visionforge_core::domain::job::{JobPatch, JobStatus, PatchError, TrainingJob};
use visionforge_core::domain::training::TrainingConfig;

/// Repository error type
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Training job {0} already exists")]
    DuplicateJob(String),

    #[error("Training job {0} not found")]
    NotFound(String),

    #[error("Unknown training job {0}")]
    UnknownJob(String),

    #[error("Update of training job {job_id} rejected: {source}")]
    Rejected {
        job_id: String,
        #[source]
        source: PatchError,
    },
}

/// Repository trait for training jobs
///
/// Every `update` is applied as a single atomic merge, so concurrent writers
/// (the runner of a job and a cancel request) never interleave partial writes.
#[async_trait]
pub trait JobRepository: Send + Sync {
    /// Creates a pending job for the configuration
    async fn create(&self, config: TrainingConfig) -> Result<TrainingJob, RepositoryError>;

    /// Gets a job by ID
    async fn get(&self, job_id: &str) -> Result<TrainingJob, RepositoryError>;

    /// Merges a patch into a job and returns the updated record
    async fn update(&self, job_id: &str, patch: JobPatch) -> Result<TrainingJob, RepositoryError>;

    /// Lists jobs, newest first
    ///
    /// Returns a snapshot; later updates are not reflected in it.
    async fn list(
        &self,
        status: Option<JobStatus>,
        limit: usize,
    ) -> Result<Vec<TrainingJob>, RepositoryError>;
}

/// Process-local job registry
///
/// Nothing survives a restart.
#[derive(Default)]
pub struct InMemoryJobRepository {
    jobs: RwLock<HashMap<String, StoredJob>>,
}

struct StoredJob {
    /// Insertion order, breaks ties between jobs created in the same instant
    seq: u64,
    job: TrainingJob,
}

impl InMemoryJobRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobRepository for InMemoryJobRepository {
    async fn create(&self, config: TrainingConfig) -> Result<TrainingJob, RepositoryError> {
        let job = TrainingJob::new(config);

        let mut jobs = self.jobs.write().await;
        if jobs.contains_key(&job.job_id) {
            return Err(RepositoryError::DuplicateJob(job.job_id));
        }

        let seq = jobs.len() as u64;
        jobs.insert(
            job.job_id.clone(),
            StoredJob {
                seq,
                job: job.clone(),
            },
        );

        Ok(job)
    }

    async fn get(&self, job_id: &str) -> Result<TrainingJob, RepositoryError> {
        self.jobs
            .read()
            .await
            .get(job_id)
            .map(|stored| stored.job.clone())
            .ok_or_else(|| RepositoryError::NotFound(job_id.to_string()))
    }

    async fn update(&self, job_id: &str, patch: JobPatch) -> Result<TrainingJob, RepositoryError> {
        let mut jobs = self.jobs.write().await;
        let stored = jobs
            .get_mut(job_id)
            .ok_or_else(|| RepositoryError::UnknownJob(job_id.to_string()))?;

        stored
            .job
            .apply(patch)
            .map_err(|source| RepositoryError::Rejected {
                job_id: job_id.to_string(),
                source,
            })?;

        Ok(stored.job.clone())
    }

    async fn list(
        &self,
        status: Option<JobStatus>,
        limit: usize,
    ) -> Result<Vec<TrainingJob>, RepositoryError> {
        let jobs = self.jobs.read().await;

        let mut matching: Vec<&StoredJob> = jobs
            .values()
            .filter(|stored| status.is_none_or(|s| stored.job.status == s))
            .collect();

        matching.sort_by(|a, b| {
            b.job
                .created_at
                .cmp(&a.job.created_at)
                .then(b.seq.cmp(&a.seq))
        });

        Ok(matching
            .into_iter()
            .take(limit)
            .map(|stored| stored.job.clone())
            .collect())
    }
}
