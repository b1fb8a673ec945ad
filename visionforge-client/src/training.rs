//! Training job API endpoints

use crate::VisionForgeClient;
use crate::error::Result;
use visionforge_core::domain::job::TrainingJob;
use visionforge_core::domain::training::TrainingConfig;
use visionforge_core::dto::health::HealthResponse;
use visionforge_core::dto::job::{CancelJobResponse, JobMetrics, ListJobsQuery};

impl VisionForgeClient {
    /// Check that the server is up
    pub async fn health(&self) -> Result<HealthResponse> {
        let response = self.client.get(self.url("/health")).send().await?;

        self.handle_response(response).await
    }

    // =============================================================================
    // Job Lifecycle
    // =============================================================================

    /// Submit a training job
    ///
    /// The server answers as soon as the job is queued; poll
    /// [`get_training_job`](Self::get_training_job) to follow it.
    pub async fn submit_training(&self, config: &TrainingConfig) -> Result<TrainingJob> {
        let response = self
            .client
            .post(self.url("/train"))
            .json(config)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Get a training job by ID
    pub async fn get_training_job(&self, job_id: &str) -> Result<TrainingJob> {
        let url = self.url(&format!("/train/{}", job_id));
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }

    /// List training jobs, newest first
    ///
    /// # Arguments
    /// * `query` - Optional status filter and result limit
    pub async fn list_training_jobs(&self, query: &ListJobsQuery) -> Result<Vec<TrainingJob>> {
        let response = self
            .client
            .get(self.url("/train"))
            .query(query)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Cancel a pending or running job
    pub async fn cancel_training_job(&self, job_id: &str) -> Result<CancelJobResponse> {
        let url = self.url(&format!("/train/{}", job_id));
        let response = self.client.delete(&url).send().await?;

        self.handle_response(response).await
    }

    /// Re-run a cancelled or failed job with its original configuration
    pub async fn resume_training_job(&self, job_id: &str) -> Result<TrainingJob> {
        let url = self.url(&format!("/train/{}/resume", job_id));
        let response = self.client.post(&url).send().await?;

        self.handle_response(response).await
    }

    /// Get the metrics of a running or completed job
    pub async fn get_training_metrics(&self, job_id: &str) -> Result<JobMetrics> {
        let url = self.url(&format!("/train/{}/metrics", job_id));
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }
}
