/// Compute Mean Squared Error.
pub fn mse(forecast: &[f64], actual: &[f64]) -> f64 {
    assert_eq!(forecast.len(), actual.len());
    if forecast.is_empty() {
        return 0.0;
    }
    forecast
        .iter()
        .zip(actual)
        .map(|(f, a)| (f - a).powi(2))
        .sum::<f64>()
        / forecast.len() as f64
}

/// Compute Mean Absolute Error.
pub fn mae(forecast: &[f64], actual: &[f64]) -> f64 {
    assert_eq!(forecast.len(), actual.len());
    if forecast.is_empty() {
        return 0.0;
    }
    forecast
        .iter()
        .zip(actual)
        .map(|(f, a)| (f - a).abs())
        .sum::<f64>()
        / forecast.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_mse_and_mae() {
        let forecast = [1.0, 2.0, 3.0];
        let actual = [1.0, 4.0, 6.0];
        assert_relative_eq!(mse(&forecast, &actual), (0.0 + 4.0 + 9.0) / 3.0);
        assert_relative_eq!(mae(&forecast, &actual), (0.0 + 2.0 + 3.0) / 3.0);
    }

    #[test]
    fn test_empty() {
        assert_eq!(mse(&[], &[]), 0.0);
        assert_eq!(mae(&[], &[]), 0.0);
    }
}
