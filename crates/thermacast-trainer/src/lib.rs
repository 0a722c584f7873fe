//! Training driver: scaler fitting, the shuffled mini-batch Adam loop and
//! held-out evaluation.

pub mod adam;
pub mod trainer;

pub use adam::Adam;
pub use trainer::{evaluate, fit_scalers, train_model, EpochMetrics, EvalMetrics, TrainingReport};
