//! Run queue and dispatcher

use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{OwnedSemaphorePermit, Semaphore, mpsc};
use tracing::{debug, info, warn};

use crate::service::runner::{JobRunner, QueuedRun};

/// Scheduler error type
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("Job queue is full ({0} runs waiting)")]
    QueueFull(usize),

    #[error("Job scheduler is not running")]
    Closed,
}

/// Handle for enqueueing runs
#[derive(Clone)]
pub struct JobScheduler {
    sender: mpsc::Sender<QueuedRun>,
    capacity: usize,
}

/// A reserved place in the queue
///
/// Dropping it without submitting gives the place back.
pub struct RunSlot {
    permit: mpsc::OwnedPermit<QueuedRun>,
}

impl RunSlot {
    /// Enqueues a run in the reserved place
    pub fn submit(self, run: QueuedRun) {
        debug!("Queued run of job {} (attempt {})", run.job_id, run.attempt);
        self.permit.send(run);
    }
}

impl JobScheduler {
    /// Starts the dispatcher and returns the handle feeding it
    ///
    /// Must be called inside a tokio runtime. Both limits are capped at
    /// [`Semaphore::MAX_PERMITS`] and the queue holds at least one run.
    pub fn start(runner: Arc<JobRunner>, max_concurrent: usize, capacity: usize) -> Self {
        let capacity = capacity.clamp(1, Semaphore::MAX_PERMITS);
        let max_concurrent = max_concurrent.min(Semaphore::MAX_PERMITS);
        let (sender, receiver) = mpsc::channel(capacity);
        let semaphore = Arc::new(Semaphore::new(max_concurrent));

        info!(
            "Starting job scheduler (queue capacity: {}, max concurrent runs: {})",
            capacity, max_concurrent
        );

        tokio::spawn(dispatch(receiver, runner, semaphore));

        Self { sender, capacity }
    }

    /// Reserves a queue slot without waiting
    pub fn reserve(&self) -> Result<RunSlot, SchedulerError> {
        match self.sender.clone().try_reserve_owned() {
            Ok(permit) => Ok(RunSlot { permit }),
            Err(TrySendError::Full(_)) => Err(SchedulerError::QueueFull(self.capacity)),
            Err(TrySendError::Closed(_)) => Err(SchedulerError::Closed),
        }
    }
}

async fn dispatch(
    mut receiver: mpsc::Receiver<QueuedRun>,
    runner: Arc<JobRunner>,
    semaphore: Arc<Semaphore>,
) {
    // Runs stay in the queue, and count against its capacity, until a permit frees up
    loop {
        let Ok(permit) = semaphore.clone().acquire_owned().await else {
            warn!("Run semaphore closed");
            break;
        };

        let Some(run) = receiver.recv().await else {
            break;
        };

        spawn_run(Arc::clone(&runner), run, permit);
    }

    info!("Job scheduler stopped");
}

fn spawn_run(runner: Arc<JobRunner>, run: QueuedRun, permit: OwnedSemaphorePermit) {
    tokio::spawn(async move {
        runner.run(run).await;
        drop(permit);
    });
}
