//! Dataset domain types

use serde::{Deserialize, Serialize};

/// Summary of a dataset on disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetInfo {
    pub name: String,

    /// Dataset root directory; holds `data.yaml` and `images/{train,val,test}`
    pub path: String,

    pub num_classes: u32,
    pub class_names: Vec<String>,
    pub num_images_train: usize,
    pub num_images_val: usize,
    pub num_images_test: usize,
}
