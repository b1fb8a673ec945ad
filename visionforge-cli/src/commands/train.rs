//! Training command handlers
//!
//! Handles all training-related CLI commands: submitting jobs, inspecting
//! them, and cancel/resume.

use anyhow::Result;
use clap::{Args, Subcommand};
use colored::*;
use std::time::Duration;
use visionforge_client::VisionForgeClient;
use visionforge_core::domain::job::{JobStatus, TrainingJob};
use visionforge_core::domain::metrics::TrainingMetrics;
use visionforge_core::domain::training::{ModelSize, TrainingConfig};
use visionforge_core::dto::job::{JobMetrics, ListJobsQuery};

use crate::config::Config;

/// Training subcommands
#[derive(Subcommand)]
pub enum TrainCommands {
    /// Submit a training job
    Submit {
        #[command(flatten)]
        args: SubmitArgs,

        /// Follow the job until it finishes
        #[arg(short, long)]
        wait: bool,
    },
    /// List training jobs
    List {
        /// Only jobs with this status
        #[arg(short, long)]
        status: Option<JobStatus>,

        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Get job details
    Get {
        /// Job ID
        id: String,
    },
    /// Show metrics of a running or completed job
    Metrics {
        /// Job ID
        id: String,
    },
    /// Cancel a pending or running job
    Cancel {
        /// Job ID
        id: String,
    },
    /// Re-run a cancelled or failed job
    Resume {
        /// Job ID
        id: String,

        /// Follow the job until it finishes
        #[arg(short, long)]
        wait: bool,
    },
    /// Follow a job until it finishes
    Wait {
        /// Job ID
        id: String,

        /// Seconds between polls
        #[arg(long, default_value_t = 2)]
        interval: u64,
    },
}

/// Training parameters of `train submit`
///
/// Unset options keep the server-side defaults of [`TrainingConfig`].
#[derive(Args, Debug)]
pub struct SubmitArgs {
    /// Dataset to train on
    dataset: String,

    /// Model size (n, s, m, l, x)
    #[arg(short, long)]
    model_size: Option<ModelSize>,

    #[arg(short, long)]
    epochs: Option<u32>,

    #[arg(short, long)]
    batch_size: Option<u32>,

    /// Input image size in pixels
    #[arg(long)]
    imgsz: Option<u32>,

    /// Initial learning rate
    #[arg(long)]
    lr0: Option<f64>,

    /// Final learning rate, as a fraction of lr0
    #[arg(long)]
    lrf: Option<f64>,

    /// Optimizer (auto, SGD, Adam, AdamW, ...)
    #[arg(long)]
    optimizer: Option<String>,

    /// Epochs without improvement before stopping early
    #[arg(long)]
    patience: Option<u32>,

    /// Save a checkpoint every n epochs (<= 0 disables)
    #[arg(long, allow_negative_numbers = true)]
    save_period: Option<i32>,

    /// Train from scratch instead of pretrained weights
    #[arg(long)]
    no_pretrained: bool,

    /// Device hint (cpu, cuda, 0, ...)
    #[arg(long)]
    device: Option<String>,

    /// Data loader workers
    #[arg(long)]
    workers: Option<u32>,
}

impl SubmitArgs {
    fn into_config(self) -> TrainingConfig {
        let mut config = TrainingConfig::new(self.dataset);

        if let Some(model_size) = self.model_size {
            config.model_size = model_size;
        }
        if let Some(epochs) = self.epochs {
            config.epochs = epochs;
        }
        if let Some(batch_size) = self.batch_size {
            config.batch_size = batch_size;
        }
        if let Some(imgsz) = self.imgsz {
            config.imgsz = imgsz;
        }
        if let Some(lr0) = self.lr0 {
            config.lr0 = lr0;
        }
        if let Some(lrf) = self.lrf {
            config.lrf = lrf;
        }
        if let Some(optimizer) = self.optimizer {
            config.optimizer = optimizer;
        }
        if let Some(patience) = self.patience {
            config.patience = patience;
        }
        if let Some(save_period) = self.save_period {
            config.save_period = save_period;
        }
        if self.no_pretrained {
            config.pretrained = false;
        }
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        config.device = self.device;

        config
    }
}

/// Handle training commands
pub async fn handle_train_command(command: TrainCommands, config: &Config) -> Result<()> {
    let client = VisionForgeClient::new(&config.server_url);

    match command {
        TrainCommands::Submit { args, wait } => {
            let training = args.into_config();

            let job = client.submit_training(&training).await?;
            println!("{}", "✓ Training job submitted".green().bold());
            print_job_details(&job);

            if wait {
                println!();
                wait_for_job(&client, &job.job_id, Duration::from_secs(2)).await?;
            }
            Ok(())
        }
        TrainCommands::List { status, limit } => {
            list_jobs(&client, ListJobsQuery { status, limit }).await
        }
        TrainCommands::Get { id } => {
            let job = client.get_training_job(&id).await?;
            print_job_details(&job);
            Ok(())
        }
        TrainCommands::Metrics { id } => {
            let metrics = client.get_training_metrics(&id).await?;
            print_metrics(&metrics);
            Ok(())
        }
        TrainCommands::Cancel { id } => {
            let response = client.cancel_training_job(&id).await?;
            println!("{} {}", "✓".green(), response.message);
            Ok(())
        }
        TrainCommands::Resume { id, wait } => {
            let job = client.resume_training_job(&id).await?;
            println!(
                "{}",
                format!("✓ Job {} resumed (attempt {})", job.job_id, job.attempt)
                    .green()
                    .bold()
            );

            if wait {
                wait_for_job(&client, &job.job_id, Duration::from_secs(2)).await?;
            }
            Ok(())
        }
        TrainCommands::Wait { id, interval } => {
            wait_for_job(&client, &id, Duration::from_secs(interval.max(1))).await
        }
    }
}

async fn list_jobs(client: &VisionForgeClient, query: ListJobsQuery) -> Result<()> {
    let jobs = client.list_training_jobs(&query).await?;

    if jobs.is_empty() {
        println!("{}", "No training jobs found.".yellow());
    } else {
        println!("{}", format!("Found {} job(s):", jobs.len()).bold());
        println!();
        for job in jobs {
            print_job_summary(&job);
        }
    }

    Ok(())
}

/// Polls a job and prints its progress until it reaches a terminal status
async fn wait_for_job(client: &VisionForgeClient, job_id: &str, interval: Duration) -> Result<()> {
    let mut last_epoch = None;

    loop {
        let job = client.get_training_job(job_id).await?;

        if job.status == JobStatus::Running && last_epoch != Some(job.current_epoch) {
            last_epoch = Some(job.current_epoch);
            println!(
                "  epoch {}/{}  mAP50-95 {:.4}  best {:.4}",
                job.current_epoch,
                job.epochs,
                job.current_metrics.map(|m| m.map50_95).unwrap_or_default(),
                job.best_map
            );
        }

        if job.status.is_terminal() {
            println!();
            print_job_details(&job);
            return Ok(());
        }

        tokio::time::sleep(interval).await;
    }
}

/// Print a one-entry job summary
fn print_job_summary(job: &TrainingJob) {
    println!("  {} Job {}", "▸".cyan(), job.job_id.dimmed());
    println!(
        "    Dataset:  {} (model {}, {} epochs)",
        job.dataset_name, job.model_size, job.epochs
    );
    println!("    Status:   {}", colorize_status(job.status));
    println!(
        "    Progress: {}/{}  best mAP50-95 {:.4}",
        job.current_epoch, job.epochs, job.best_map
    );
    println!(
        "    Created:  {}",
        job.created_at
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
            .dimmed()
    );
    println!();
}

/// Print detailed job information
fn print_job_details(job: &TrainingJob) {
    println!("{}", "Training Job:".bold());
    println!("  ID:          {}", job.job_id.cyan());
    println!("  Status:      {}", colorize_status(job.status));
    println!("  Dataset:     {}", job.dataset_name);
    println!("  Model size:  {}", job.model_size);
    println!("  Epoch:       {}/{}", job.current_epoch, job.epochs);
    println!("  Best mAP:    {:.4}", job.best_map);
    println!("  Attempt:     {}", job.attempt);
    println!(
        "  Created:     {}",
        job.created_at.format("%Y-%m-%d %H:%M:%S")
    );
    println!(
        "  Updated:     {}",
        job.updated_at.format("%Y-%m-%d %H:%M:%S")
    );

    if let Some(path) = &job.model_path {
        println!("  Model:       {}", path.green());
    }

    if let Some(metrics) = &job.final_metrics {
        println!("\n{}", "Final metrics:".bold());
        print_metric_lines(metrics);
    } else if let Some(metrics) = &job.current_metrics {
        println!("\n{}", "Current metrics:".bold());
        print_metric_lines(metrics);
    }

    if let Some(error) = &job.error {
        println!("\n{}", "Error:".bold());
        println!("{}", error.red());
    }
}

fn print_metrics(metrics: &JobMetrics) {
    println!("{}", format!("Metrics for job {}:", metrics.job_id).bold());
    println!("  Status:      {}", colorize_status(metrics.status));
    println!(
        "  Epoch:       {}/{}",
        metrics.current_epoch, metrics.total_epochs
    );
    println!("  Best mAP:    {:.4}", metrics.best_map);

    if let Some(current) = &metrics.current_metrics {
        println!("\n{}", "Current:".bold());
        print_metric_lines(current);
    }
    if let Some(last) = &metrics.final_metrics {
        println!("\n{}", "Final:".bold());
        print_metric_lines(last);
    }
}

fn print_metric_lines(metrics: &TrainingMetrics) {
    println!("  mAP50:       {:.4}", metrics.map50);
    println!("  mAP50-95:    {:.4}", metrics.map50_95);
    println!("  Precision:   {:.4}", metrics.precision);
    println!("  Recall:      {:.4}", metrics.recall);
    println!("  Box loss:    {:.4}", metrics.loss);
}

/// Colorize job status for display
fn colorize_status(status: JobStatus) -> colored::ColoredString {
    let status_str = status.as_str().to_uppercase();
    match status {
        JobStatus::Pending => status_str.yellow(),
        JobStatus::Running => status_str.cyan(),
        JobStatus::Completed => status_str.green(),
        JobStatus::Failed => status_str.red(),
        JobStatus::Cancelled => status_str.dimmed(),
    }
}
