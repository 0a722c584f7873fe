use thiserror::Error;

#[derive(Error, Debug)]
pub enum ThermacastError {
    /// Malformed model input, rejected before the model runs.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("insufficient data: {0}")]
    InsufficientData(String),

    /// Corrupt or incompatible persisted model. Fatal for the predictor.
    #[error("model artifact error: {0}")]
    ArtifactError(String),

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ThermacastError>;
