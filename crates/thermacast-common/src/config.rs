use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Application-level configuration, mirrors config/thermacast.yaml.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub features: FeatureConfig,

    #[serde(default)]
    pub training: TrainingConfig,
}

/// Restricts which sensors contribute features. `None` means "all found".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeatureConfig {
    #[serde(default)]
    pub rooms: Option<Vec<String>>,

    #[serde(default)]
    pub hvac_devices: Option<Vec<String>>,

    #[serde(default)]
    pub openings: Option<Vec<String>>,

    #[serde(default)]
    pub timestamp_start: Option<NaiveDateTime>,

    #[serde(default)]
    pub timestamp_end: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    #[serde(default = "default_epochs")]
    pub epochs: usize,

    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,

    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            epochs: default_epochs(),
            batch_size: default_batch_size(),
            learning_rate: default_learning_rate(),
            seed: default_seed(),
        }
    }
}

fn default_epochs() -> usize {
    64
}
fn default_batch_size() -> usize {
    32
}
fn default_learning_rate() -> f64 {
    1e-3
}
fn default_seed() -> u64 {
    42
}
