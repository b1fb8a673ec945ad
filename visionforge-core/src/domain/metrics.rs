//! Canonical training metrics

use serde::{Deserialize, Serialize};

/// Metrics of one epoch (or of the final model) under canonical names
///
/// Fields the trainer did not report are `0.0`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingMetrics {
    pub map50: f64,
    pub map50_95: f64,
    pub precision: f64,
    pub recall: f64,
    pub loss: f64,
}
