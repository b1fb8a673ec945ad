//! Service Module
//!
//! Business logic layer of the server.
//! The training service admits and manages jobs, the runner executes them
//! and the progress aggregator turns raw trainer metrics into job state.

pub mod progress;
pub mod runner;
pub mod training;

pub use runner::{JobRunner, QueuedRun};
pub use training::{TrainingError, TrainingService};
