//! Process-backed trainer
//!
//! Runs an external training program (typically a small bridge script around
//! the deep-learning framework) and talks to it over stdout. The program gets
//! the run parameters as flags and prints one JSON object per line:
//!
//! ```text
//! {"event":"epoch","epoch":1,"total_epochs":3,"metrics":{"metrics/mAP50-95(B)":0.12}}
//! {"event":"result","model_path":"models/cones_n.pt","model_name":"cones_n.pt","metrics":{...}}
//! ```
//!
//! Any other stdout line is treated as plain output. Output does not have to
//! be valid UTF-8, bad bytes are replaced before parsing.

use serde::Deserialize;
use std::collections::VecDeque;
use std::io::{self, BufRead, BufReader, Read};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use tracing::{debug, info};

use super::{EpochProgress, RawMetrics, TrainOutcome, TrainRequest, Trainer, TrainerError};

/// Lines of stderr kept for the failure message
const STDERR_TAIL_LINES: usize = 20;

/// Trainer that delegates to an external program
pub struct CommandTrainer {
    program: String,
    args: Vec<String>,
    project_dir: PathBuf,
    models_dir: PathBuf,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
enum TrainerEvent {
    Epoch {
        epoch: u32,
        #[serde(default)]
        total_epochs: Option<u32>,
        #[serde(default)]
        metrics: RawMetrics,
    },
    Result {
        model_path: String,
        #[serde(default)]
        model_name: Option<String>,
        #[serde(default)]
        metrics: RawMetrics,
    },
}

impl CommandTrainer {
    /// Creates a trainer running `program`
    ///
    /// # Arguments
    /// * `program` - Executable name or path
    /// * `project_dir` - Working directory handed to the program for run artifacts
    /// * `models_dir` - Directory the program copies the final model into
    pub fn new(
        program: impl Into<String>,
        project_dir: impl Into<PathBuf>,
        models_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            project_dir: project_dir.into(),
            models_dir: models_dir.into(),
        }
    }

    /// Creates a trainer from a whitespace separated command line
    ///
    /// Quotes are not interpreted, so no part may contain spaces.
    /// Returns `None` if the command line is empty.
    pub fn from_command_line(
        command_line: &str,
        project_dir: impl Into<PathBuf>,
        models_dir: impl Into<PathBuf>,
    ) -> Option<Self> {
        let mut parts = command_line.split_whitespace();
        let program = parts.next()?;

        Some(
            Self::new(program, project_dir, models_dir)
                .with_args(parts.map(str::to_string).collect()),
        )
    }

    /// Arguments placed before the run flags
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    fn command(&self, request: &TrainRequest) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .arg("--job-id")
            .arg(&request.job_id)
            .arg("--data")
            .arg(&request.data_config)
            .arg("--model-size")
            .arg(request.model_size.as_str())
            .arg("--epochs")
            .arg(request.epochs.to_string())
            .arg("--batch")
            .arg(request.batch_size.to_string())
            .arg("--imgsz")
            .arg(request.imgsz.to_string())
            .arg("--lr0")
            .arg(request.lr0.to_string())
            .arg("--lrf")
            .arg(request.lrf.to_string())
            .arg("--optimizer")
            .arg(&request.optimizer)
            .arg("--patience")
            .arg(request.patience.to_string())
            .arg("--pretrained")
            .arg(request.pretrained.to_string())
            .arg("--workers")
            .arg(request.workers.to_string())
            .arg("--project")
            .arg(&self.project_dir)
            .arg("--models-dir")
            .arg(&self.models_dir);

        if let Some(period) = request.save_period {
            cmd.arg("--save-period").arg(period.to_string());
        }

        if let Some(device) = &request.device {
            cmd.arg("--device").arg(device);
        }

        cmd
    }
}

impl Trainer for CommandTrainer {
    fn train(
        &self,
        request: &TrainRequest,
        on_epoch: &mut dyn FnMut(EpochProgress),
    ) -> Result<TrainOutcome, TrainerError> {
        info!(
            "Launching trainer '{}' for job {} ({} epochs)",
            self.program, request.job_id, request.epochs
        );

        let mut child = self
            .command(request)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| TrainerError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let stderr = child.stderr.take();
        let stderr_reader =
            std::thread::spawn(move || stderr.map(|s| tail_lines(s)).unwrap_or_default());

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| TrainerError::Failed("Trainer stdout was not captured".to_string()))?;

        let mut outcome = None;

        for line in lossy_lines(stdout) {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(e.into());
                }
            };

            match serde_json::from_str::<TrainerEvent>(&line) {
                Ok(TrainerEvent::Epoch {
                    epoch,
                    total_epochs,
                    metrics,
                }) => on_epoch(EpochProgress {
                    epoch,
                    total_epochs: total_epochs.unwrap_or(request.epochs),
                    metrics,
                }),
                Ok(TrainerEvent::Result {
                    model_path,
                    model_name,
                    metrics,
                }) => {
                    outcome = Some(TrainOutcome {
                        model_path,
                        model_name,
                        metrics,
                    })
                }
                Err(_) => debug!("[{}] {}", request.job_id, line),
            }
        }

        let status = child.wait()?;
        let stderr_tail = stderr_reader.join().unwrap_or_default();

        if !status.success() {
            let message = if stderr_tail.is_empty() {
                format!("Trainer exited with {}", status)
            } else {
                format!("Trainer exited with {}: {}", status, stderr_tail)
            };
            return Err(TrainerError::Failed(message));
        }

        outcome.ok_or(TrainerError::NoResult)
    }
}

/// Lines of a stream with invalid UTF-8 replaced
fn lossy_lines(stream: impl Read) -> impl Iterator<Item = io::Result<String>> {
    BufReader::new(stream).split(b'\n').map(|line| {
        line.map(|mut bytes| {
            if bytes.last() == Some(&b'\r') {
                bytes.pop();
            }
            String::from_utf8_lossy(&bytes).into_owned()
        })
    })
}

/// Last lines of a stream, joined with newlines
fn tail_lines(stream: impl Read) -> String {
    let mut tail = VecDeque::with_capacity(STDERR_TAIL_LINES);

    for line in lossy_lines(stream).map_while(Result::ok) {
        if tail.len() == STDERR_TAIL_LINES {
            tail.pop_front();
        }
        tail.push_back(line);
    }

    Vec::from(tail).join("\n")
}
