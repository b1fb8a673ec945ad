//! External trainer
//!
//! The deep-learning work happens outside this server. A `Trainer` is a
//! synchronous call that occupies its thread for the whole run, reports
//! progress once per epoch through a callback and finally returns the
//! produced model or an error.

mod command;

pub use command::CommandTrainer;

use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;
use visionforge_core::domain::training::{ModelSize, TrainingConfig};

/// Metrics mapping as emitted by the trainer; key names vary between versions
pub type RawMetrics = HashMap<String, JsonValue>;

/// Everything the trainer needs for one run
#[derive(Debug, Clone, PartialEq)]
pub struct TrainRequest {
    pub job_id: String,
    /// Path to the dataset's `data.yaml`
    pub data_config: PathBuf,
    pub model_size: ModelSize,
    pub epochs: u32,
    pub batch_size: u32,
    pub imgsz: u32,
    pub lr0: f64,
    pub lrf: f64,
    pub optimizer: String,
    pub patience: u32,
    /// Checkpoint period, only set when checkpointing is enabled
    pub save_period: Option<u32>,
    pub pretrained: bool,
    pub device: Option<String>,
    pub workers: u32,
}

impl TrainRequest {
    pub fn new(job_id: impl Into<String>, data_config: PathBuf, config: &TrainingConfig) -> Self {
        Self {
            job_id: job_id.into(),
            data_config,
            model_size: config.model_size,
            epochs: config.epochs,
            batch_size: config.batch_size,
            imgsz: config.imgsz,
            lr0: config.lr0,
            lrf: config.lrf,
            optimizer: config.optimizer.clone(),
            patience: config.patience,
            save_period: u32::try_from(config.save_period).ok().filter(|p| *p > 0),
            pretrained: config.pretrained,
            device: config.device.clone().filter(|d| !d.is_empty()),
            workers: config.workers,
        }
    }
}

/// Progress reported at the end of an epoch
#[derive(Debug, Clone)]
pub struct EpochProgress {
    pub epoch: u32,
    pub total_epochs: u32,
    pub metrics: RawMetrics,
}

/// Result of a successful run
#[derive(Debug, Clone)]
pub struct TrainOutcome {
    /// Where the trained weights were written
    pub model_path: String,
    /// File name inference can refer to the model by
    pub model_name: Option<String>,
    pub metrics: RawMetrics,
}

/// Trainer failure
#[derive(Debug, Error)]
pub enum TrainerError {
    #[error("Failed to launch trainer '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Trainer I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Failed(String),

    #[error("Trainer exited without reporting a result")]
    NoResult,
}

/// External training collaborator
pub trait Trainer: Send + Sync {
    /// Runs training to completion, calling `on_epoch` after every epoch
    ///
    /// Blocks the calling thread for the whole run.
    fn train(
        &self,
        request: &TrainRequest,
        on_epoch: &mut dyn FnMut(EpochProgress),
    ) -> Result<TrainOutcome, TrainerError>;
}
