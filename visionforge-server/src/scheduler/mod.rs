//! Scheduler
//!
//! Bounded run queue in front of the job runner. Admission happens by
//! reserving a queue slot, and a dispatcher task drains the queue while
//! capping the number of runs in flight.

mod queue;

pub use queue::{JobScheduler, RunSlot, SchedulerError};
