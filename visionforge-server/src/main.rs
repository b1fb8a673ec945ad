use anyhow::{Context, Result};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use visionforge_server::api::{self, AppState};
use visionforge_server::config::Config;
use visionforge_server::dataset::{DatasetCatalog, FsDatasetCatalog};
use visionforge_server::model::FsModelCatalog;
use visionforge_server::repository::{InMemoryJobRepository, JobRepository};
use visionforge_server::scheduler::JobScheduler;
use visionforge_server::service::{JobRunner, TrainingService};
use visionforge_server::trainer::CommandTrainer;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "visionforge_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting VisionForge server...");

    let config = Config::from_env();
    config.validate().context("Invalid configuration")?;
    config
        .ensure_directories()
        .context("Failed to create data directories")?;

    tracing::info!(
        "Datasets: {}, models: {}, results: {}",
        config.datasets_dir.display(),
        config.models_dir.display(),
        config.results_dir.display()
    );

    let trainer = CommandTrainer::from_command_line(
        &config.trainer_command,
        &config.results_dir,
        &config.models_dir,
    )
    .context("TRAINER_COMMAND is empty")?;

    tracing::info!("Trainer command: {}", config.trainer_command);

    let repository: Arc<dyn JobRepository> = Arc::new(InMemoryJobRepository::new());
    let catalog: Arc<dyn DatasetCatalog> = Arc::new(FsDatasetCatalog::new(&config.datasets_dir));

    let runner = Arc::new(JobRunner::new(
        Arc::clone(&repository),
        Arc::clone(&catalog),
        Arc::new(trainer),
    ));
    let scheduler = JobScheduler::start(runner, config.max_concurrent_jobs, config.queue_capacity);

    // Build router with all API endpoints
    let app = api::create_router(AppState {
        training: Arc::new(TrainingService::new(repository, catalog, scheduler)),
        models: Arc::new(FsModelCatalog::new(&config.models_dir)),
    });

    tracing::info!("Listening on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;

    axum::serve(listener, app)
        .await
        .context("Server terminated unexpectedly")?;

    Ok(())
}
