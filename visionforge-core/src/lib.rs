//! VisionForge Core
//!
//! Core types shared by the VisionForge training server, its HTTP client and the CLI.
//!
//! This crate contains:
//! - Domain types: training jobs, their configuration, metrics and datasets
//! - DTOs: request/response shapes of the HTTP API

pub mod domain;
pub mod dto;
