//! Model catalog
//!
//! Read-only view of the trained models the trainer leaves in the models
//! directory. Uploading, deleting and running models are out of scope.

mod fs;

pub use fs::FsModelCatalog;

use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use visionforge_core::domain::model::ModelInfo;

/// Model lookup error
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Model {0} not found")]
    NotFound(String),

    #[error("Invalid model name '{0}'")]
    InvalidName(String),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Model lookup aborted: {0}")]
    Aborted(String),
}

/// Source of model file summaries
pub trait ModelCatalog: Send + Sync {
    /// All models, newest first
    fn list_models(&self) -> Result<Vec<ModelInfo>, ModelError>;

    /// Looks up a model by file name
    fn get_model(&self, name: &str) -> Result<ModelInfo, ModelError>;
}

/// Lists models on the blocking pool
pub async fn list(catalog: &Arc<dyn ModelCatalog>) -> Result<Vec<ModelInfo>, ModelError> {
    let catalog = Arc::clone(catalog);

    tokio::task::spawn_blocking(move || catalog.list_models())
        .await
        .map_err(|e| ModelError::Aborted(e.to_string()))?
}

/// Looks up a model on the blocking pool
pub async fn get(catalog: &Arc<dyn ModelCatalog>, name: &str) -> Result<ModelInfo, ModelError> {
    let catalog = Arc::clone(catalog);
    let name = name.to_string();

    tokio::task::spawn_blocking(move || catalog.get_model(&name))
        .await
        .map_err(|e| ModelError::Aborted(e.to_string()))?
}
