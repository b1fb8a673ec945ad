//! Filesystem dataset catalog
//!
//! Layout of a dataset named `name`:
//!
//! ```text
//! <datasets_dir>/<name>/data.yaml
//! <datasets_dir>/<name>/images/{train,val,test}/*
//! ```

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;
use visionforge_core::domain::dataset::DatasetInfo;

use super::{DatasetCatalog, DatasetError};

/// Catalog over a directory of YOLO-style datasets
pub struct FsDatasetCatalog {
    datasets_dir: PathBuf,
}

impl FsDatasetCatalog {
    pub fn new(datasets_dir: impl Into<PathBuf>) -> Self {
        Self {
            datasets_dir: datasets_dir.into(),
        }
    }
}

impl DatasetCatalog for FsDatasetCatalog {
    fn get_dataset_info(&self, name: &str) -> Result<DatasetInfo, DatasetError> {
        if !is_valid_name(name) {
            return Err(DatasetError::InvalidName(name.to_string()));
        }

        let path = self.datasets_dir.join(name);
        if !path.is_dir() {
            return Err(DatasetError::NotFound(name.to_string()));
        }

        let data = read_data_yaml(&path.join("data.yaml"))?;
        let images = path.join("images");

        let info = DatasetInfo {
            name: name.to_string(),
            path: path.to_string_lossy().to_string(),
            num_classes: data.nc,
            class_names: data.names.into_vec(),
            num_images_train: count_files(&images.join("train"))?,
            num_images_val: count_files(&images.join("val"))?,
            num_images_test: count_files(&images.join("test"))?,
        };

        debug!(
            "Dataset {}: {} train / {} val / {} test images",
            name, info.num_images_train, info.num_images_val, info.num_images_test
        );

        Ok(info)
    }
}

/// Alphanumeric plus `_` and `-`, so a name never escapes the datasets dir
fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

#[derive(Debug, Default, Deserialize)]
struct DataYaml {
    #[serde(default)]
    nc: u32,
    #[serde(default)]
    names: ClassNames,
}

/// `names` is either a list or an index -> name map
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ClassNames {
    List(Vec<String>),
    Map(BTreeMap<u32, String>),
}

impl Default for ClassNames {
    fn default() -> Self {
        ClassNames::List(Vec::new())
    }
}

impl ClassNames {
    fn into_vec(self) -> Vec<String> {
        match self {
            ClassNames::List(names) => names,
            ClassNames::Map(names) => names.into_values().collect(),
        }
    }
}

fn read_data_yaml(path: &Path) -> Result<DataYaml, DatasetError> {
    if !path.exists() {
        return Ok(DataYaml::default());
    }

    let content = std::fs::read_to_string(path).map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    serde_yaml::from_str(&content).map_err(|source| DatasetError::Yaml {
        path: path.to_path_buf(),
        source,
    })
}

/// Number of regular files directly inside `dir`, 0 if it does not exist
fn count_files(dir: &Path) -> Result<usize, DatasetError> {
    if !dir.is_dir() {
        return Ok(0);
    }

    let io_err = |source| DatasetError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut count = 0;
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        if entry.map_err(io_err)?.file_type().map_err(io_err)?.is_file() {
            count += 1;
        }
    }

    Ok(count)
}
