//! Normalization statistics for the three model feature groups.
//!
//! `StandardScaler` is a scalar z-score over one pooled series (the forecast
//! group); `VectorScaler` keeps independent statistics per feature column
//! (the history and control groups). Both serialize so that a persisted
//! model artifact can be loaded without re-fitting.

pub mod standard;
pub mod vector;

pub use standard::StandardScaler;
pub use vector::VectorScaler;

use thermacast_common::Result;

/// Fit/transform interface shared by the scalers.
pub trait Scaler {
    fn fit(&mut self, values: &[f64]) -> Result<()>;
    fn transform(&self, values: &[f64]) -> Result<Vec<f64>>;
    fn inverse_transform(&self, values: &[f64]) -> Result<Vec<f64>>;

    fn fit_transform(&mut self, values: &[f64]) -> Result<Vec<f64>> {
        self.fit(values)?;
        self.transform(values)
    }
}
