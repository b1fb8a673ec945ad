//! VisionForge Server
//!
//! REST backend that runs object-detection training jobs in the background
//! and exposes their lifecycle through a polling API.
//!
//! Layers:
//! - `api`: axum handlers and error mapping
//! - `service`: job lifecycle (submit, cancel, resume), job runner and
//!   progress aggregation
//! - `scheduler`: bounded run queue with a concurrency cap
//! - `repository`: job registry
//! - `trainer` / `dataset`: external collaborators
//! - `model`: read-only catalog of trained model files

pub mod api;
pub mod config;
pub mod dataset;
pub mod model;
pub mod repository;
pub mod scheduler;
pub mod service;
pub mod trainer;
