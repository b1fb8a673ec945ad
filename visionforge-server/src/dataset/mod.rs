//! Dataset catalog
//!
//! Read-only access to the datasets training jobs run against. Only the
//! summary needed to admit and launch a run is exposed here; dataset
//! authoring lives outside the server.

mod fs;

pub use fs::FsDatasetCatalog;

use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use visionforge_core::domain::dataset::DatasetInfo;

/// Dataset lookup error
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Dataset {0} not found")]
    NotFound(String),

    #[error("Invalid dataset name '{0}'")]
    InvalidName(String),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Dataset lookup aborted: {0}")]
    Aborted(String),
}

/// Source of dataset summaries
pub trait DatasetCatalog: Send + Sync {
    /// Looks up a dataset by name
    fn get_dataset_info(&self, name: &str) -> Result<DatasetInfo, DatasetError>;
}

/// Looks up a dataset on the blocking pool
///
/// Catalogs may walk the filesystem, which must not happen on a runtime worker.
pub async fn lookup(
    catalog: &Arc<dyn DatasetCatalog>,
    name: &str,
) -> Result<DatasetInfo, DatasetError> {
    let catalog = Arc::clone(catalog);
    let name = name.to_string();

    tokio::task::spawn_blocking(move || catalog.get_dataset_info(&name))
        .await
        .map_err(|e| DatasetError::Aborted(e.to_string()))?
}
