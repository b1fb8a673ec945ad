//! Training configuration submitted by clients

use serde::{Deserialize, Serialize};

/// Size variant of the detection model to train
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ModelSize {
    #[default]
    #[serde(rename = "n")]
    Nano,
    #[serde(rename = "s")]
    Small,
    #[serde(rename = "m")]
    Medium,
    #[serde(rename = "l")]
    Large,
    #[serde(rename = "x")]
    XLarge,
}

impl ModelSize {
    /// Short code used by the external trainer (`n`, `s`, `m`, `l`, `x`)
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelSize::Nano => "n",
            ModelSize::Small => "s",
            ModelSize::Medium => "m",
            ModelSize::Large => "l",
            ModelSize::XLarge => "x",
        }
    }
}

impl std::fmt::Display for ModelSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ModelSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "n" => Ok(ModelSize::Nano),
            "s" => Ok(ModelSize::Small),
            "m" => Ok(ModelSize::Medium),
            "l" => Ok(ModelSize::Large),
            "x" => Ok(ModelSize::XLarge),
            other => Err(format!("unknown model size '{}' (expected n, s, m, l or x)", other)),
        }
    }
}

/// Training request as submitted by a client
///
/// Frozen at submission time and kept on the job so a resume re-runs
/// exactly the same configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Name of the dataset to train on
    pub dataset_name: String,

    #[serde(default)]
    pub model_size: ModelSize,

    #[serde(default = "default_epochs")]
    pub epochs: u32,

    #[serde(default = "default_batch_size")]
    pub batch_size: u32,

    /// Input image size in pixels
    #[serde(default = "default_imgsz")]
    pub imgsz: u32,

    /// Initial learning rate
    #[serde(default = "default_lr")]
    pub lr0: f64,

    /// Final learning rate (fraction of lr0)
    #[serde(default = "default_lr")]
    pub lrf: f64,

    #[serde(default = "default_optimizer")]
    pub optimizer: String,

    /// Epochs without improvement before early stopping
    #[serde(default = "default_patience")]
    pub patience: u32,

    /// Save a checkpoint every n epochs, disabled when <= 0
    #[serde(default = "default_save_period")]
    pub save_period: i32,

    #[serde(default = "default_pretrained")]
    pub pretrained: bool,

    /// Device hint (cuda, cpu, mps, "0,1", ...)
    #[serde(default)]
    pub device: Option<String>,

    /// Number of data loader workers
    #[serde(default = "default_workers")]
    pub workers: u32,
}

fn default_epochs() -> u32 {
    100
}

fn default_batch_size() -> u32 {
    16
}

fn default_imgsz() -> u32 {
    640
}

fn default_lr() -> f64 {
    0.01
}

fn default_optimizer() -> String {
    "auto".to_string()
}

fn default_patience() -> u32 {
    50
}

fn default_save_period() -> i32 {
    -1
}

fn default_pretrained() -> bool {
    true
}

fn default_workers() -> u32 {
    8
}

impl TrainingConfig {
    /// Creates a configuration for a dataset with every other field defaulted
    pub fn new(dataset_name: impl Into<String>) -> Self {
        Self {
            dataset_name: dataset_name.into(),
            model_size: ModelSize::default(),
            epochs: default_epochs(),
            batch_size: default_batch_size(),
            imgsz: default_imgsz(),
            lr0: default_lr(),
            lrf: default_lr(),
            optimizer: default_optimizer(),
            patience: default_patience(),
            save_period: default_save_period(),
            pretrained: default_pretrained(),
            device: None,
            workers: default_workers(),
        }
    }

    /// Checks the numeric bounds of the configuration
    ///
    /// Returns a human readable message for the first violated bound.
    pub fn validate(&self) -> Result<(), String> {
        if self.dataset_name.trim().is_empty() {
            return Err("dataset_name cannot be empty".to_string());
        }
        if self.epochs < 1 {
            return Err("epochs must be at least 1".to_string());
        }
        if self.batch_size < 1 {
            return Err("batch_size must be at least 1".to_string());
        }
        if self.imgsz == 0 {
            return Err("imgsz must be greater than 0".to_string());
        }
        if !(self.lr0 > 0.0) {
            return Err("lr0 must be greater than 0".to_string());
        }
        if !(self.lrf > 0.0) {
            return Err("lrf must be greater than 0".to_string());
        }
        if self.patience < 1 {
            return Err("patience must be at least 1".to_string());
        }
        if self.workers < 1 {
            return Err("workers must be at least 1".to_string());
        }
        Ok(())
    }
}
