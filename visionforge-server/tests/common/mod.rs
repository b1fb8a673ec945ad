//! Shared helpers for the server integration tests.
//!
//! Builds the full router on top of an in-memory registry, a temporary
//! dataset directory and a trainer whose behavior each test scripts.

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt;

use visionforge_core::domain::job::{JobPatch, JobStatus, TrainingJob};
use visionforge_core::domain::training::TrainingConfig;
use visionforge_server::api::{self, AppState};
use visionforge_server::dataset::{DatasetCatalog, FsDatasetCatalog};
use visionforge_server::model::FsModelCatalog;
use visionforge_server::repository::{InMemoryJobRepository, JobRepository, RepositoryError};
use visionforge_server::scheduler::JobScheduler;
use visionforge_server::service::{JobRunner, TrainingService};
use visionforge_server::trainer::{
    EpochProgress, RawMetrics, TrainOutcome, TrainRequest, Trainer, TrainerError,
};

/// Trainer that reports a fixed mAP per epoch
///
/// The first `failures` calls fail after reporting their epochs.
pub struct TestTrainer {
    maps: Vec<f64>,
    failures: AtomicUsize,
    requests: Mutex<Vec<TrainRequest>>,
}

impl TestTrainer {
    pub fn succeeding(maps: &[f64]) -> Self {
        Self::failing_first(maps, 0)
    }

    pub fn failing_first(maps: &[f64], failures: usize) -> Self {
        Self {
            maps: maps.to_vec(),
            failures: AtomicUsize::new(failures),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Requests received so far, in call order
    pub fn requests(&self) -> Vec<TrainRequest> {
        self.requests.lock().unwrap().clone()
    }
}

fn map_metrics(map: f64) -> RawMetrics {
    RawMetrics::from([
        ("metrics/mAP50-95(B)".to_string(), serde_json::json!(map)),
        ("train/box_loss".to_string(), serde_json::json!(1.0 - map)),
    ])
}

impl Trainer for TestTrainer {
    fn train(
        &self,
        request: &TrainRequest,
        on_epoch: &mut dyn FnMut(EpochProgress),
    ) -> Result<TrainOutcome, TrainerError> {
        self.requests.lock().unwrap().push(request.clone());

        for (idx, map) in self.maps.iter().enumerate() {
            on_epoch(EpochProgress {
                epoch: idx as u32 + 1,
                total_epochs: request.epochs,
                metrics: map_metrics(*map),
            });
        }

        let fail = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if fail {
            return Err(TrainerError::Failed("GPU lost".to_string()));
        }

        Ok(TrainOutcome {
            model_path: format!("/models/{}.pt", request.job_id),
            model_name: Some(format!("{}.pt", request.job_id)),
            metrics: map_metrics(self.maps.last().copied().unwrap_or_default()),
        })
    }
}

/// Registry wrapper remembering every status each job went through
#[derive(Default)]
pub struct RecordingRepository {
    inner: InMemoryJobRepository,
    history: Mutex<HashMap<String, Vec<JobStatus>>>,
}

impl RecordingRepository {
    pub fn history(&self, job_id: &str) -> Vec<JobStatus> {
        self.history
            .lock()
            .unwrap()
            .get(job_id)
            .cloned()
            .unwrap_or_default()
    }

    fn record(&self, job: &TrainingJob) {
        let mut history = self.history.lock().unwrap();
        let statuses = history.entry(job.job_id.clone()).or_default();
        if statuses.last() != Some(&job.status) {
            statuses.push(job.status);
        }
    }
}

#[async_trait]
impl JobRepository for RecordingRepository {
    async fn create(&self, config: TrainingConfig) -> Result<TrainingJob, RepositoryError> {
        let job = self.inner.create(config).await?;
        self.record(&job);
        Ok(job)
    }

    async fn get(&self, job_id: &str) -> Result<TrainingJob, RepositoryError> {
        self.inner.get(job_id).await
    }

    async fn update(&self, job_id: &str, patch: JobPatch) -> Result<TrainingJob, RepositoryError> {
        let job = self.inner.update(job_id, patch).await?;
        self.record(&job);
        Ok(job)
    }

    async fn list(
        &self,
        status: Option<JobStatus>,
        limit: usize,
    ) -> Result<Vec<TrainingJob>, RepositoryError> {
        self.inner.list(status, limit).await
    }
}

pub struct TestApp {
    pub router: Router,
    pub repository: Arc<RecordingRepository>,
    pub trainer: Arc<TestTrainer>,
    pub models_dir: tempfile::TempDir,
    _datasets: tempfile::TempDir,
}

/// Writes `<root>/<name>` with one class and the given image counts
pub fn write_dataset(root: &Path, name: &str, train: usize, val: usize) {
    let dir = root.join(name);
    std::fs::create_dir_all(dir.join("images/train")).unwrap();
    std::fs::create_dir_all(dir.join("images/val")).unwrap();
    std::fs::write(dir.join("data.yaml"), "nc: 1\nnames: [cone]\n").unwrap();
    for i in 0..train {
        std::fs::write(dir.join(format!("images/train/{i}.jpg")), b"jpg").unwrap();
    }
    for i in 0..val {
        std::fs::write(dir.join(format!("images/val/{i}.jpg")), b"jpg").unwrap();
    }
}

/// Full application with datasets `cones` (usable) and `empty` (no images)
pub fn spawn_app(trainer: TestTrainer, max_concurrent: usize, capacity: usize) -> TestApp {
    let datasets = tempfile::tempdir().unwrap();
    let models_dir = tempfile::tempdir().unwrap();
    write_dataset(datasets.path(), "cones", 4, 2);
    write_dataset(datasets.path(), "empty", 0, 0);

    let repository = Arc::new(RecordingRepository::default());
    let trainer = Arc::new(trainer);
    let catalog: Arc<dyn DatasetCatalog> = Arc::new(FsDatasetCatalog::new(datasets.path()));

    let runner = Arc::new(JobRunner::new(
        repository.clone(),
        Arc::clone(&catalog),
        trainer.clone(),
    ));
    let scheduler = JobScheduler::start(runner, max_concurrent, capacity);
    let training = Arc::new(TrainingService::new(
        repository.clone(),
        catalog,
        scheduler,
    ));

    TestApp {
        router: api::create_router(AppState {
            training,
            models: Arc::new(FsModelCatalog::new(models_dir.path())),
        }),
        repository,
        trainer,
        models_dir,
        _datasets: datasets,
    }
}

impl TestApp {
    /// Sends a request and returns the status and JSON body
    pub async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(serde_json::to_vec(&json).unwrap())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        (status, json)
    }

    /// Polls the job until it reaches `status`
    pub async fn wait_for_status(&self, job_id: &str, status: &str) -> Value {
        let uri = format!("/api/v1/train/{job_id}");
        for _ in 0..300 {
            let (code, job) = self.send(Method::GET, &uri, None).await;
            assert_eq!(code, StatusCode::OK);
            if job["status"] == status {
                return job;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("job {job_id} never reached status {status}");
    }

    /// Submits a job and returns its id
    pub async fn submit(&self, body: Value) -> String {
        let (code, job) = self.send(Method::POST, "/api/v1/train", Some(body)).await;
        assert_eq!(code, StatusCode::OK, "unexpected response: {job}");
        job["job_id"].as_str().unwrap().to_string()
    }
}
