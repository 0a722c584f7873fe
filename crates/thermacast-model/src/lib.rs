//! Autoregressive sequence model for multi-step room-temperature
//! prediction.
//!
//! The model is deliberately small: one LSTM cell shared between a history
//! encoder and the prediction rollout, and a two-layer readout head whose
//! output layer starts at zero. The dense math and both passes are
//! hand-rolled over `Vec<f64>`; gradients flow through the full rollout
//! and the encoder.

pub mod artifact;
pub mod cell;
pub mod head;
pub mod linalg;
pub mod model;

pub use artifact::{ModelArtifact, ARTIFACT_VERSION};
pub use model::{ModelGrads, RolloutInput, SequenceModel, HEAD_HIDDEN, STATE_SIZE};
