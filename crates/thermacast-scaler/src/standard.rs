use serde::{Deserialize, Serialize};
use thermacast_common::{Result, ThermacastError};

/// Scalar z-score normalization: `(x - mean) / std`.
///
/// Statistics are pooled over every value seen, regardless of position; this
/// matches how the forecast group is normalized (one outdoor-temperature
/// distribution shared by all hours-ahead buckets). A constant series
/// (std ≈ 0) transforms to zeros and inverse transforms to the mean.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Option<f64>,
    std: Option<f64>,
}

impl StandardScaler {
    pub const EPSILON: f64 = 1e-10;

    pub fn new() -> Self {
        Self {
            mean: None,
            std: None,
        }
    }

    /// Build an already-fitted scaler from externally accumulated statistics.
    pub fn from_stats(mean: f64, std: f64) -> Self {
        Self {
            mean: Some(mean),
            std: Some(std),
        }
    }

    /// Returns true if the fitted series is constant (std ≈ 0).
    pub fn is_constant(&self) -> bool {
        self.std.map(|s| s < Self::EPSILON).unwrap_or(false)
    }

    pub fn mean(&self) -> Option<f64> {
        self.mean
    }

    pub fn std(&self) -> Option<f64> {
        self.std
    }

    /// Normalize one value. Returns an error when not fitted.
    pub fn transform_value(&self, value: f64) -> Result<f64> {
        let (mean, std) = self.stats()?;
        if std < Self::EPSILON {
            return Ok(0.0);
        }
        Ok((value - mean) / std)
    }

    fn stats(&self) -> Result<(f64, f64)> {
        match (self.mean, self.std) {
            (Some(mean), Some(std)) => Ok((mean, std)),
            _ => Err(ThermacastError::InvalidInput("scaler not fitted".into())),
        }
    }
}

impl Default for StandardScaler {
    fn default() -> Self {
        Self::new()
    }
}

impl crate::Scaler for StandardScaler {
    fn fit(&mut self, values: &[f64]) -> Result<()> {
        if values.is_empty() {
            return Err(ThermacastError::InsufficientData(
                "cannot fit scaler on empty values".into(),
            ));
        }

        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;

        self.mean = Some(mean);
        self.std = Some(variance.sqrt());

        Ok(())
    }

    fn transform(&self, values: &[f64]) -> Result<Vec<f64>> {
        let (mean, std) = self.stats()?;

        if std < Self::EPSILON {
            return Ok(vec![0.0; values.len()]);
        }

        Ok(values.iter().map(|v| (v - mean) / std).collect())
    }

    fn inverse_transform(&self, values: &[f64]) -> Result<Vec<f64>> {
        let (mean, std) = self.stats()?;

        if std < Self::EPSILON {
            return Ok(vec![mean; values.len()]);
        }

        Ok(values.iter().map(|v| v * std + mean).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Scaler;
    use approx::assert_relative_eq;

    #[test]
    fn test_fit_transform_roundtrip() {
        let values = vec![10.0, 20.0, 30.0, 40.0, 50.0];
        let mut scaler = StandardScaler::new();

        let transformed = scaler.fit_transform(&values).unwrap();
        let restored = scaler.inverse_transform(&transformed).unwrap();

        for (original, restored_val) in values.iter().zip(restored.iter()) {
            assert_relative_eq!(original, restored_val, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_standard_scaling_properties() {
        let values = vec![2.0, 4.0, 6.0, 8.0, 10.0];
        let mut scaler = StandardScaler::new();

        let transformed = scaler.fit_transform(&values).unwrap();

        let mean: f64 = transformed.iter().sum::<f64>() / transformed.len() as f64;
        assert_relative_eq!(mean, 0.0, epsilon = 1e-10);

        let variance: f64 =
            transformed.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / transformed.len() as f64;
        assert_relative_eq!(variance.sqrt(), 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_constant_series() {
        let values = vec![21.5; 6];
        let mut scaler = StandardScaler::new();

        let transformed = scaler.fit_transform(&values).unwrap();
        assert!(scaler.is_constant());
        for v in &transformed {
            assert_relative_eq!(*v, 0.0, epsilon = 1e-10);
        }

        let restored = scaler.inverse_transform(&transformed).unwrap();
        for v in &restored {
            assert_relative_eq!(*v, 21.5, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_empty_input() {
        let mut scaler = StandardScaler::new();
        assert!(scaler.fit(&[]).is_err());
    }

    #[test]
    fn test_transform_without_fit() {
        let scaler = StandardScaler::new();
        assert!(scaler.transform(&[1.0, 2.0, 3.0]).is_err());
        assert!(scaler.transform_value(1.0).is_err());
    }

    #[test]
    fn test_from_stats_matches_fit() {
        let values = vec![-5.0, 0.0, 5.0, 10.0];
        let mut fitted = StandardScaler::new();
        fitted.fit(&values).unwrap();

        let rebuilt = StandardScaler::from_stats(fitted.mean().unwrap(), fitted.std().unwrap());
        assert_eq!(
            fitted.transform(&values).unwrap(),
            rebuilt.transform(&values).unwrap()
        );
    }

    #[test]
    fn test_transform_value_matches_transform() {
        let mut scaler = StandardScaler::new();
        scaler.fit(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        let batch = scaler.transform(&[2.5]).unwrap();
        assert_relative_eq!(scaler.transform_value(2.5).unwrap(), batch[0]);
    }
}
