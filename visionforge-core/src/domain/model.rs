//! Trained model domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::training::ModelSize;

/// A model file in the models directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    /// File name, e.g. `cones_yolo11n_20250101_120000.pt`
    pub name: String,
    pub path: String,

    /// Size variant read from the file name, `None` if it carries no `yolo11<size>` marker
    pub size: Option<ModelSize>,

    pub file_size_mb: f64,
    pub created_at: DateTime<Utc>,
}

impl ModelSize {
    /// Size variant encoded in a model file name (`yolo11n.pt`, `cones_yolo11s_....pt`)
    pub fn from_model_name(name: &str) -> Option<ModelSize> {
        let marker = name.find("yolo11")? + "yolo11".len();
        name[marker..].chars().next()?.to_string().parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_from_model_name() {
        assert_eq!(ModelSize::from_model_name("yolo11n.pt"), Some(ModelSize::Nano));
        assert_eq!(
            ModelSize::from_model_name("cones_yolo11x_20250101_120000.pt"),
            Some(ModelSize::XLarge)
        );
        assert_eq!(ModelSize::from_model_name("custom.pt"), None);
        assert_eq!(ModelSize::from_model_name("yolo11.pt"), None);
        assert_eq!(ModelSize::from_model_name("yolo11"), None);
    }
}
