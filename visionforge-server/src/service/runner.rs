//! Job Runner
//!
//! Executes one queued run of a training job: moves the job to running,
//! drives the external trainer on the blocking pool, folds per-epoch
//! progress into the registry and records the terminal state.

use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use visionforge_core::domain::job::{JobPatch, JobStatus};
use visionforge_core::domain::training::TrainingConfig;

use crate::dataset::{self, DatasetCatalog};
use crate::repository::{JobRepository, RepositoryError};
use crate::service::progress::ProgressAggregator;
use crate::trainer::{EpochProgress, TrainOutcome, TrainRequest, Trainer};

/// A run waiting in the scheduler queue
#[derive(Debug, Clone)]
pub struct QueuedRun {
    pub job_id: String,
    /// Attempt the run belongs to, writes for older attempts are rejected
    pub attempt: u32,
    pub config: TrainingConfig,
}

/// Executes queued runs against the registry
pub struct JobRunner {
    repository: Arc<dyn JobRepository>,
    catalog: Arc<dyn DatasetCatalog>,
    trainer: Arc<dyn Trainer>,
}

impl JobRunner {
    pub fn new(
        repository: Arc<dyn JobRepository>,
        catalog: Arc<dyn DatasetCatalog>,
        trainer: Arc<dyn Trainer>,
    ) -> Self {
        Self {
            repository,
            catalog,
            trainer,
        }
    }

    /// Runs a job to a terminal state
    ///
    /// Never returns an error: failures end up in the job record or, when the
    /// record itself cannot be written, in the log.
    pub async fn run(&self, run: QueuedRun) {
        let start = JobPatch {
            expected_attempt: Some(run.attempt),
            status: Some(JobStatus::Running),
            current_epoch: Some(0),
            best_map: Some(0.0),
            current_metrics: Some(None),
            final_metrics: Some(None),
            model_path: Some(None),
            model_name: Some(None),
            error: Some(None),
            ..Default::default()
        };

        match self.repository.update(&run.job_id, start).await {
            Ok(_) => info!("Job {} started (attempt {})", run.job_id, run.attempt),
            Err(RepositoryError::Rejected { source, .. }) => {
                info!("Skipping run of job {}: {}", run.job_id, source);
                return;
            }
            Err(e) => {
                error!("Failed to start job {}: {}", run.job_id, e);
                return;
            }
        }

        let mut aggregator = ProgressAggregator::new();
        let result = self.train(&run, &mut aggregator).await;

        let patch = match &result {
            Ok(outcome) => {
                let (metrics, best_map) = aggregator.finish(&outcome.metrics);
                JobPatch {
                    expected_attempt: Some(run.attempt),
                    status: Some(JobStatus::Completed),
                    best_map: Some(best_map),
                    final_metrics: Some(Some(metrics)),
                    model_path: Some(Some(outcome.model_path.clone())),
                    model_name: Some(outcome.model_name.clone()),
                    ..Default::default()
                }
            }
            Err(message) => JobPatch {
                expected_attempt: Some(run.attempt),
                status: Some(JobStatus::Failed),
                error: Some(Some(message.clone())),
                ..Default::default()
            },
        };

        match self.repository.update(&run.job_id, patch).await {
            Ok(job) => match &result {
                Ok(outcome) => info!(
                    "Job {} completed: best mAP50-95 {:.4}, model {}",
                    job.job_id, job.best_map, outcome.model_path
                ),
                Err(message) => warn!("Job {} failed: {}", job.job_id, message),
            },
            Err(e) => match &result {
                Ok(outcome) => warn!(
                    "Discarding result of job {} (model {}): {}",
                    run.job_id, outcome.model_path, e
                ),
                Err(message) => warn!(
                    "Discarding failure of job {} ({}): {}",
                    run.job_id, message, e
                ),
            },
        }
    }

    /// Resolves the dataset and drives the trainer
    ///
    /// The error side is the message stored on the job.
    async fn train(
        &self,
        run: &QueuedRun,
        aggregator: &mut ProgressAggregator,
    ) -> Result<TrainOutcome, String> {
        let dataset = dataset::lookup(&self.catalog, &run.config.dataset_name)
            .await
            .map_err(|e| e.to_string())?;

        let data_config = PathBuf::from(&dataset.path).join("data.yaml");
        if !data_config.is_file() {
            return Err(format!(
                "Dataset configuration not found: {}",
                data_config.display()
            ));
        }

        let request = TrainRequest::new(&run.job_id, data_config, &run.config);
        let (progress_tx, mut progress_rx) = mpsc::unbounded_channel::<EpochProgress>();
        let trainer = Arc::clone(&self.trainer);

        let handle = tokio::task::spawn_blocking(move || {
            trainer.train(&request, &mut |progress| {
                // The receiver outlives the trainer call
                let _ = progress_tx.send(progress);
            })
        });

        while let Some(progress) = progress_rx.recv().await {
            self.record_progress(run, aggregator, progress).await;
        }

        match handle.await {
            Ok(result) => result.map_err(|e| e.to_string()),
            Err(e) => Err(format!("Trainer panicked: {}", e)),
        }
    }

    async fn record_progress(
        &self,
        run: &QueuedRun,
        aggregator: &mut ProgressAggregator,
        progress: EpochProgress,
    ) {
        let update = aggregator.observe(progress.epoch, &progress.metrics);

        debug!(
            "Job {} epoch {}/{}: mAP50-95 {:.4} (best {:.4})",
            run.job_id,
            progress.epoch,
            progress.total_epochs,
            update.metrics.map50_95,
            update.best_map
        );

        let patch = JobPatch {
            expected_attempt: Some(run.attempt),
            current_epoch: Some(update.epoch),
            best_map: Some(update.best_map),
            current_metrics: Some(Some(update.metrics)),
            ..Default::default()
        };

        if let Err(e) = self.repository.update(&run.job_id, patch).await {
            warn!(
                "Failed to record epoch {} of job {}: {}",
                progress.epoch, run.job_id, e
            );
        }
    }
}
