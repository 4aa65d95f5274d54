//! Metrics for evaluating forecast accuracy on the holdout window
//!
//! Residuals are `actual - forecast`, so a positive bias means the model
//! under-forecast on average.

use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Accuracy of one model on the test window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccuracyMetrics {
    /// Root mean squared error
    pub rmse: f64,
    /// Mean absolute percentage error over non-zero actuals, in percent
    ///
    /// `None` when every actual is zero.
    pub mape: Option<f64>,
    /// Mean residual
    pub bias: f64,
    /// Mean absolute residual
    pub mad: f64,
}

impl fmt::Display for AccuracyMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RMSE={:.2} MAPE=", self.rmse)?;
        match self.mape {
            Some(mape) => write!(f, "{:.2}%", mape)?,
            None => write!(f, "n/a")?,
        }
        write!(f, " Bias={:.2} MAD={:.2}", self.bias, self.mad)
    }
}

fn check_aligned(actual: &[f64], forecast: &[f64]) -> Result<()> {
    if actual.len() != forecast.len() || actual.is_empty() {
        return Err(ForecastError::ValidationError(format!(
            "Actual ({}) and forecast ({}) values must have the same non-zero length",
            actual.len(),
            forecast.len()
        )));
    }
    Ok(())
}

fn residuals<'a>(actual: &'a [f64], forecast: &'a [f64]) -> impl Iterator<Item = f64> + 'a {
    actual.iter().zip(forecast).map(|(a, f)| a - f)
}

/// Root mean squared error
pub fn root_mean_squared_error(actual: &[f64], forecast: &[f64]) -> Result<f64> {
    check_aligned(actual, forecast)?;
    let mse = residuals(actual, forecast).map(|r| r * r).sum::<f64>() / actual.len() as f64;
    Ok(mse.sqrt())
}

/// Mean absolute percentage error in percent, skipping zero actuals
pub fn mean_absolute_percentage_error(actual: &[f64], forecast: &[f64]) -> Result<Option<f64>> {
    check_aligned(actual, forecast)?;
    let ratios: Vec<f64> = actual
        .iter()
        .zip(forecast)
        .filter(|(a, _)| **a != 0.0)
        .map(|(a, f)| ((a - f) / a).abs())
        .collect();

    if ratios.is_empty() {
        return Ok(None);
    }
    Ok(Some(ratios.iter().sum::<f64>() / ratios.len() as f64 * 100.0))
}

/// Mean of `actual - forecast`
pub fn forecast_bias(actual: &[f64], forecast: &[f64]) -> Result<f64> {
    check_aligned(actual, forecast)?;
    Ok(residuals(actual, forecast).sum::<f64>() / actual.len() as f64)
}

/// Mean absolute deviation of the residuals
pub fn mean_absolute_deviation(actual: &[f64], forecast: &[f64]) -> Result<f64> {
    check_aligned(actual, forecast)?;
    Ok(residuals(actual, forecast).map(f64::abs).sum::<f64>() / actual.len() as f64)
}

/// All four accuracy metrics for one forecast
pub fn evaluate_forecast(actual: &[f64], forecast: &[f64]) -> Result<AccuracyMetrics> {
    Ok(AccuracyMetrics {
        rmse: root_mean_squared_error(actual, forecast)?,
        mape: mean_absolute_percentage_error(actual, forecast)?,
        bias: forecast_bias(actual, forecast)?,
        mad: mean_absolute_deviation(actual, forecast)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_perfect_forecast() {
        let values = [3.0, 4.0, 5.0];
        let metrics = evaluate_forecast(&values, &values).unwrap();
        assert_eq!(metrics.rmse, 0.0);
        assert_eq!(metrics.mape, Some(0.0));
        assert_eq!(metrics.bias, 0.0);
        assert_eq!(metrics.mad, 0.0);
    }

    #[test]
    fn test_bias_sign() {
        // Forecast below actual: positive bias
        assert_approx_eq!(forecast_bias(&[10.0, 10.0], &[8.0, 6.0]).unwrap(), 3.0);
        assert_approx_eq!(forecast_bias(&[10.0], &[12.0]).unwrap(), -2.0);
    }

    #[test]
    fn test_all_zero_actuals_have_no_mape() {
        assert_eq!(mean_absolute_percentage_error(&[0.0, 0.0], &[1.0, 2.0]).unwrap(), None);
    }

    #[test]
    fn test_misaligned_inputs() {
        assert!(evaluate_forecast(&[1.0, 2.0], &[1.0]).is_err());
        assert!(evaluate_forecast(&[], &[]).is_err());
    }

    #[test]
    fn test_display() {
        let metrics = AccuracyMetrics {
            rmse: 1.0,
            mape: None,
            bias: -0.5,
            mad: 0.75,
        };
        assert_eq!(metrics.to_string(), "RMSE=1.00 MAPE=n/a Bias=-0.50 MAD=0.75");
    }
}
