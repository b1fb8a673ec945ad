//! Data Transfer Objects
//!
//! Request and response shapes of the HTTP API that are not domain entities
//! themselves.

pub mod health;
pub mod job;
