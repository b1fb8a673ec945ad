//! Server configuration
//!
//! Defines the configurable parameters of the server: bind address,
//! storage directories, the external trainer command and the admission
//! limits of the run queue.

use std::env::VarError;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::sync::Semaphore;
use tracing::warn;

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP API listens on (e.g., "0.0.0.0:8000")
    pub bind_addr: String,

    /// Root directory holding one sub-directory per dataset
    pub datasets_dir: PathBuf,

    /// Directory trained models are copied into
    pub models_dir: PathBuf,

    /// Working directory for trainer runs
    pub results_dir: PathBuf,

    /// External trainer command line, split on whitespace
    ///
    /// There is no shell quoting: a program or argument containing spaces
    /// (e.g. `"/opt/my trainer/bridge.py"`) cannot be expressed here. Point
    /// the command at a wrapper script or a path without spaces instead.
    pub trainer_command: String,

    /// Training runs allowed to execute at the same time
    pub max_concurrent_jobs: usize,

    /// Runs that may wait for a free slot before submissions are refused
    pub queue_capacity: usize,
}

impl Config {
    /// Creates configuration from environment variables
    ///
    /// Expected environment variables (all optional):
    /// - BIND_ADDR (default: 0.0.0.0:8000)
    /// - DATASETS_DIR (default: ./datasets)
    /// - MODELS_DIR (default: ./models)
    /// - RESULTS_DIR (default: ./results)
    /// - TRAINER_COMMAND (default: yolo-train-bridge)
    /// - MAX_CONCURRENT_JOBS (default: 1)
    /// - JOB_QUEUE_CAPACITY (default: 32)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let bind_addr = std::env::var("BIND_ADDR").unwrap_or(defaults.bind_addr);

        let datasets_dir = std::env::var("DATASETS_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.datasets_dir);

        let models_dir = std::env::var("MODELS_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.models_dir);

        let results_dir = std::env::var("RESULTS_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.results_dir);

        let trainer_command =
            std::env::var("TRAINER_COMMAND").unwrap_or(defaults.trainer_command);

        let max_concurrent_jobs = parse_count(
            "MAX_CONCURRENT_JOBS",
            std::env::var("MAX_CONCURRENT_JOBS"),
            defaults.max_concurrent_jobs,
        );

        let queue_capacity = parse_count(
            "JOB_QUEUE_CAPACITY",
            std::env::var("JOB_QUEUE_CAPACITY"),
            defaults.queue_capacity,
        );

        Self {
            bind_addr,
            datasets_dir,
            models_dir,
            results_dir,
            trainer_command,
            max_concurrent_jobs,
            queue_capacity,
        }
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.bind_addr.parse::<SocketAddr>().is_err() {
            anyhow::bail!("bind_addr '{}' is not a valid socket address", self.bind_addr);
        }

        if self.trainer_command.split_whitespace().next().is_none() {
            anyhow::bail!("trainer_command cannot be empty");
        }

        if self.max_concurrent_jobs == 0 {
            anyhow::bail!("max_concurrent_jobs must be greater than 0");
        }

        if self.max_concurrent_jobs > Semaphore::MAX_PERMITS {
            anyhow::bail!(
                "max_concurrent_jobs must be at most {}",
                Semaphore::MAX_PERMITS
            );
        }

        if self.queue_capacity == 0 {
            anyhow::bail!("queue_capacity must be greater than 0");
        }

        if self.queue_capacity > Semaphore::MAX_PERMITS {
            anyhow::bail!("queue_capacity must be at most {}", Semaphore::MAX_PERMITS);
        }

        Ok(())
    }

    /// Creates the storage directories if they do not exist yet
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        for dir in [&self.datasets_dir, &self.models_dir, &self.results_dir] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }
}

/// Parses a numeric variable, warning when a set value is unusable
fn parse_count(name: &str, value: Result<String, VarError>, default: usize) -> usize {
    match value {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("Ignoring {}='{}': not a number, using {}", name, raw, default);
            default
        }),
        Err(VarError::NotPresent) => default,
        Err(VarError::NotUnicode(_)) => {
            warn!("Ignoring {}: not valid unicode, using {}", name, default);
            default
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8000".to_string(),
            datasets_dir: PathBuf::from("datasets"),
            models_dir: PathBuf::from("models"),
            results_dir: PathBuf::from("results"),
            trainer_command: "yolo-train-bridge".to_string(),
            max_concurrent_jobs: 1,
            queue_capacity: 32,
        }
    }
}
