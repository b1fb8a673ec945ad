//! Filesystem model catalog
//!
//! Every `*.pt` file directly inside the models directory is a model.

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tracing::warn;
use visionforge_core::domain::model::ModelInfo;
use visionforge_core::domain::training::ModelSize;

use super::{ModelCatalog, ModelError};

const MODEL_EXTENSION: &str = "pt";

/// Catalog over the models directory
pub struct FsModelCatalog {
    models_dir: PathBuf,
}

impl FsModelCatalog {
    pub fn new(models_dir: impl Into<PathBuf>) -> Self {
        Self {
            models_dir: models_dir.into(),
        }
    }
}

impl ModelCatalog for FsModelCatalog {
    fn list_models(&self) -> Result<Vec<ModelInfo>, ModelError> {
        if !self.models_dir.is_dir() {
            return Ok(Vec::new());
        }

        let io_err = |source| ModelError::Io {
            path: self.models_dir.clone(),
            source,
        };

        let mut models = Vec::new();
        for entry in std::fs::read_dir(&self.models_dir).map_err(io_err)? {
            let path = entry.map_err(io_err)?.path();
            if !is_model_file(&path) {
                continue;
            }

            // A file removed mid-listing or with unreadable metadata is skipped
            match model_info(&path) {
                Ok(info) => models.push(info),
                Err(e) => warn!("Skipping model {}: {}", path.display(), e),
            }
        }

        models.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.name.cmp(&b.name))
        });

        Ok(models)
    }

    fn get_model(&self, name: &str) -> Result<ModelInfo, ModelError> {
        if !is_valid_name(name) {
            return Err(ModelError::InvalidName(name.to_string()));
        }

        let path = self.models_dir.join(name);
        if !path.is_file() {
            return Err(ModelError::NotFound(name.to_string()));
        }

        model_info(&path)
    }
}

/// A plain `.pt` file name, so a lookup never leaves the models dir
fn is_valid_name(name: &str) -> bool {
    let path = Path::new(name);
    is_model_file(path)
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
        && !name.starts_with('.')
}

fn is_model_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == MODEL_EXTENSION)
}

fn model_info(path: &Path) -> Result<ModelInfo, ModelError> {
    let metadata = std::fs::metadata(path).map_err(|source| ModelError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    // Model files are written once by the trainer
    let created = metadata.modified().map_err(|source| ModelError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    Ok(ModelInfo {
        size: ModelSize::from_model_name(&name),
        name,
        path: path.to_string_lossy().to_string(),
        file_size_mb: megabytes(metadata.len()),
        created_at: DateTime::<Utc>::from(created),
    })
}

/// Size in MiB, rounded to two decimals
fn megabytes(bytes: u64) -> f64 {
    (bytes as f64 / (1024.0 * 1024.0) * 100.0).round() / 100.0
}
