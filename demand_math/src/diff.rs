//! Differencing and integration for integrated (ARIMA-family) models
//!
//! A differencing scheme is represented by the coefficients of its lag
//! polynomial `(1 - B)^d (1 - B^s)^D`, lowest lag first. Applying the
//! polynomial differences a series; running it backwards integrates a
//! forecast made on the differenced scale.

use crate::stats::sample_variance;
use crate::{MathError, Result};

/// Multiply two lag polynomials
pub fn poly_mul(a: &[f64], b: &[f64]) -> Vec<f64> {
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }

    let mut out = vec![0.0; a.len() + b.len() - 1];
    for (i, &x) in a.iter().enumerate() {
        for (j, &y) in b.iter().enumerate() {
            out[i + j] += x * y;
        }
    }
    out
}

/// Coefficients of `(1 - B)^d (1 - B^period)^seasonal_d`
///
/// The first coefficient is always 1. A seasonal order with `period < 2` is ignored.
pub fn differencing_polynomial(d: usize, seasonal_d: usize, period: usize) -> Vec<f64> {
    let mut poly = vec![1.0];
    for _ in 0..d {
        poly = poly_mul(&poly, &[1.0, -1.0]);
    }
    if period >= 2 {
        let mut seasonal = vec![0.0; period + 1];
        seasonal[0] = 1.0;
        seasonal[period] = -1.0;
        for _ in 0..seasonal_d {
            poly = poly_mul(&poly, &seasonal);
        }
    }
    poly
}

/// Apply a differencing polynomial; the result is `poly.len() - 1` shorter than the input
pub fn apply_difference(series: &[f64], poly: &[f64]) -> Vec<f64> {
    let order = poly.len().saturating_sub(1);
    if series.len() <= order {
        return Vec::new();
    }

    (order..series.len())
        .map(|t| {
            poly.iter()
                .enumerate()
                .map(|(k, c)| c * series[t - k])
                .sum()
        })
        .collect()
}

/// Undo a differencing polynomial for values forecast beyond the end of `history`
///
/// `y_t = w_t - sum_{k >= 1} c_k * y_{t-k}`
pub fn integrate(history: &[f64], differenced: &[f64], poly: &[f64]) -> Result<Vec<f64>> {
    let order = poly.len().saturating_sub(1);
    if history.len() < order {
        return Err(MathError::InsufficientData(format!(
            "Integration needs {} past values, got {}",
            order,
            history.len()
        )));
    }

    let mut extended = history.to_vec();
    let mut out = Vec::with_capacity(differenced.len());
    for &w in differenced {
        let t = extended.len();
        let carried: f64 = poly
            .iter()
            .enumerate()
            .skip(1)
            .map(|(k, c)| c * extended[t - k])
            .sum();
        let value = w - carried;
        extended.push(value);
        out.push(value);
    }

    Ok(out)
}

/// Suggest a non-seasonal differencing order using a variance-ratio test
///
/// A difference is taken while it reduces the sample variance by at least 10%.
pub fn suggest_differencing(series: &[f64], max_d: usize) -> usize {
    let mut current = series.to_vec();
    let mut d = 0;

    while d < max_d && current.len() >= 3 {
        let next = apply_difference(&current, &[1.0, -1.0]);
        let before = sample_variance(&current);
        let after = sample_variance(&next);
        if before <= 0.0 || after / before >= 0.9 {
            break;
        }
        current = next;
        d += 1;
    }

    d
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_polynomial_first_difference() {
        assert_eq!(differencing_polynomial(1, 0, 0), vec![1.0, -1.0]);
        assert_eq!(differencing_polynomial(2, 0, 0), vec![1.0, -2.0, 1.0]);
    }

    #[test]
    fn test_polynomial_seasonal() {
        let poly = differencing_polynomial(1, 1, 4);
        // (1 - B)(1 - B^4) = 1 - B - B^4 + B^5
        assert_eq!(poly, vec![1.0, -1.0, 0.0, 0.0, -1.0, 1.0]);
    }

    #[test]
    fn test_difference_then_integrate() {
        let series: Vec<f64> = (0..20).map(|i| (i * i) as f64 + (i % 4) as f64).collect();
        let poly = differencing_polynomial(1, 1, 4);
        let (head, tail) = series.split_at(12);

        let diffs = apply_difference(&series, &poly);
        let future_diffs = &diffs[diffs.len() - tail.len()..];
        let rebuilt = integrate(head, future_diffs, &poly).unwrap();

        for (a, b) in rebuilt.iter().zip(tail) {
            assert_relative_eq!(a, b, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_integrate_needs_history() {
        let poly = differencing_polynomial(1, 1, 4);
        assert!(integrate(&[1.0, 2.0], &[0.0], &poly).is_err());
    }

    #[test]
    fn test_suggest_differencing() {
        let trend: Vec<f64> = (0..40).map(|i| 3.0 * i as f64).collect();
        assert!(suggest_differencing(&trend, 2) >= 1);

        let flat: Vec<f64> = (0..40).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        assert_eq!(suggest_differencing(&flat, 2), 0);
    }
}
