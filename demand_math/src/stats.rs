//! Descriptive statistics over plain slices

/// Arithmetic mean, `NaN` for an empty slice
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population (biased, divide by n) variance, `NaN` for an empty slice
pub fn population_variance(values: &[f64]) -> f64 {
    let m = mean(values);
    if m.is_nan() {
        return f64::NAN;
    }
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64
}

/// Sample (unbiased, divide by n - 1) variance, 0 for fewer than two points
pub fn sample_variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64
}

/// Sum of squared values
pub fn sum_of_squares(values: &[f64]) -> f64 {
    values.iter().map(|v| v * v).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_mean_and_variance() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_relative_eq!(mean(&values), 5.0);
        assert_relative_eq!(population_variance(&values), 4.0);
        assert_relative_eq!(sample_variance(&values), 32.0 / 7.0);
    }

    #[test]
    fn test_empty_input() {
        assert!(mean(&[]).is_nan());
        assert!(population_variance(&[]).is_nan());
        assert_eq!(sample_variance(&[1.0]), 0.0);
    }
}
