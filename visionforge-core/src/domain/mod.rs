//! Core domain types
//!
//! These types represent the fundamental business entities and are shared between
//! the server (which owns and mutates them) and clients (which poll them).

pub mod dataset;
pub mod job;
pub mod metrics;
pub mod model;
pub mod training;
