//! Progress Aggregator
//!
//! Turns the raw per-epoch metrics mapping reported by the trainer into
//! canonical [`TrainingMetrics`] and tracks the best mAP seen during a run.

use serde_json::Value as JsonValue;
use tracing::debug;
use visionforge_core::domain::metrics::TrainingMetrics;

use crate::trainer::RawMetrics;

/// Key names tried in order for each canonical metric; the first present wins
const MAP50_95_KEYS: &[&str] = &[
    "metrics/mAP50-95(B)",
    "mAP50-95(B)",
    "mAP50-95",
    "map",
    "map50_95",
];
const MAP50_KEYS: &[&str] = &["metrics/mAP50(B)", "mAP50(B)", "mAP50", "map50"];
const PRECISION_KEYS: &[&str] = &["metrics/precision(B)", "precision(B)", "precision", "P"];
const RECALL_KEYS: &[&str] = &["metrics/recall(B)", "recall(B)", "recall", "R"];
const LOSS_KEYS: &[&str] = &["train/box_loss", "box_loss", "loss"];

/// Canonical metrics from a raw mapping
///
/// Missing fields and values that are not numbers default to `0.0`; one bad
/// field never affects the others.
pub fn normalize(raw: &RawMetrics) -> TrainingMetrics {
    TrainingMetrics {
        map50: lookup(raw, MAP50_KEYS),
        map50_95: lookup(raw, MAP50_95_KEYS),
        precision: lookup(raw, PRECISION_KEYS),
        recall: lookup(raw, RECALL_KEYS),
        loss: lookup(raw, LOSS_KEYS),
    }
}

fn lookup(raw: &RawMetrics, keys: &[&str]) -> f64 {
    let Some((key, value)) = keys
        .iter()
        .find_map(|key| raw.get(*key).map(|value| (*key, value)))
    else {
        return 0.0;
    };

    match as_number(value) {
        Some(number) => number,
        None => {
            debug!("Ignoring non-numeric metric {}={}", key, value);
            0.0
        }
    }
}

fn as_number(value: &JsonValue) -> Option<f64> {
    let number = match value {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;

    number.is_finite().then_some(number)
}

/// Registry write derived from one epoch
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpdate {
    pub epoch: u32,
    pub best_map: f64,
    pub metrics: TrainingMetrics,
}

/// Running state of one training run
#[derive(Debug, Clone, Default)]
pub struct ProgressAggregator {
    best_map: f64,
    current_epoch: u32,
}

impl ProgressAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one epoch into the run state
    pub fn observe(&mut self, epoch: u32, raw: &RawMetrics) -> ProgressUpdate {
        let metrics = normalize(raw);

        self.best_map = self.best_map.max(metrics.map50_95);
        self.current_epoch = self.current_epoch.max(epoch);

        ProgressUpdate {
            epoch: self.current_epoch,
            best_map: self.best_map,
            metrics,
        }
    }

    /// Final metrics of the run and the best mAP including them
    pub fn finish(&mut self, raw: &RawMetrics) -> (TrainingMetrics, f64) {
        let metrics = normalize(raw);
        self.best_map = self.best_map.max(metrics.map50_95);
        (metrics, self.best_map)
    }

    pub fn best_map(&self) -> f64 {
        self.best_map
    }

    pub fn current_epoch(&self) -> u32 {
        self.current_epoch
    }
}
