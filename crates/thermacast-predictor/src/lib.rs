//! Single-sample prediction: wire types, strict input validation and a
//! shareable handle around a loaded model artifact.

pub mod handle;
pub mod pipeline;
pub mod types;

pub use handle::ModelHandle;
pub use pipeline::predict_single;
pub use types::{FeatureSeries, ModelInput, Prediction, SeriesGroup};
