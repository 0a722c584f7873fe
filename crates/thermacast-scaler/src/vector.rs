use serde::{Deserialize, Serialize};
use thermacast_common::{Result, ThermacastError};

use crate::standard::StandardScaler;

/// Per-column z-score normalization for fixed-width feature rows.
///
/// Each feature keeps its own mean/std; a constant column (std ≈ 0)
/// transforms to zero, mirroring `StandardScaler`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorScaler {
    mean: Vec<f64>,
    std: Vec<f64>,
}

impl VectorScaler {
    /// Build an already-fitted scaler from externally accumulated statistics.
    pub fn from_stats(mean: Vec<f64>, std: Vec<f64>) -> Result<Self> {
        if mean.len() != std.len() {
            return Err(ThermacastError::InvalidInput(
                "mean and std must have the same length".into(),
            ));
        }
        Ok(Self { mean, std })
    }

    /// Fit from an iterator of feature rows, all of width `width`.
    pub fn fit_rows<'a>(rows: impl Iterator<Item = &'a [f64]>, width: usize) -> Result<Self> {
        let mut count = 0usize;
        let mut sum = vec![0.0; width];
        let mut sum_sq = vec![0.0; width];

        for row in rows {
            if row.len() != width {
                return Err(ThermacastError::InvalidInput(format!(
                    "expected row width {}, got {}",
                    width,
                    row.len()
                )));
            }
            for (j, v) in row.iter().enumerate() {
                sum[j] += v;
                sum_sq[j] += v * v;
            }
            count += 1;
        }

        if count == 0 {
            return Err(ThermacastError::InsufficientData(
                "cannot fit scaler on zero rows".into(),
            ));
        }

        let n = count as f64;
        let mean: Vec<f64> = sum.iter().map(|s| s / n).collect();
        let std: Vec<f64> = sum_sq
            .iter()
            .zip(&mean)
            .map(|(sq, m)| (sq / n - m * m).max(0.0).sqrt())
            .collect();

        Ok(Self { mean, std })
    }

    /// Number of feature columns.
    pub fn width(&self) -> usize {
        self.mean.len()
    }

    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    pub fn std(&self) -> &[f64] {
        &self.std
    }

    /// Normalize one feature row.
    pub fn transform_row(&self, row: &[f64]) -> Result<Vec<f64>> {
        self.check_width(row)?;
        Ok(row
            .iter()
            .zip(self.mean.iter().zip(&self.std))
            .map(|(v, (m, s))| {
                if *s < StandardScaler::EPSILON {
                    0.0
                } else {
                    (v - m) / s
                }
            })
            .collect())
    }

    /// Per-column `1/std` factors (zero for constant columns). This is the
    /// Jacobian diagonal of `transform_row`, needed when gradients flow back
    /// through the normalization.
    pub fn inv_std(&self) -> Vec<f64> {
        self.std
            .iter()
            .map(|s| {
                if *s < StandardScaler::EPSILON {
                    0.0
                } else {
                    1.0 / s
                }
            })
            .collect()
    }

    fn check_width(&self, row: &[f64]) -> Result<()> {
        if row.len() != self.mean.len() {
            return Err(ThermacastError::InvalidInput(format!(
                "expected row width {}, got {}",
                self.mean.len(),
                row.len()
            )));
        }
        Ok(())
    }
}
