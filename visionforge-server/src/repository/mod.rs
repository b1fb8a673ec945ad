//! Repository Module
//!
//! Data access layer of the server. The job registry is reached through the
//! `JobRepository` trait so the store behind it can be swapped without
//! touching the services.

pub mod job;

// Re-export for convenience
pub use job::{InMemoryJobRepository, JobRepository, RepositoryError};
