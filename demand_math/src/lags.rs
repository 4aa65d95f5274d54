//! Lagged feature construction for autoregressive regressors
//!
//! Feature rows are ordered newest lag first: column `i` holds `y[t - 1 - i]`.

use crate::{MathError, Result};

/// Build the lagged design matrix and targets for a series
///
/// Row `r` predicts `series[lags + r]` from the `lags` values before it.
/// The first `lags` observations have no complete history and are skipped.
pub fn lag_matrix(series: &[f64], lags: usize) -> Result<(Vec<Vec<f64>>, Vec<f64>)> {
    if lags == 0 {
        return Err(MathError::InvalidInput(
            "Lag count must be positive".to_string(),
        ));
    }
    if series.len() <= lags {
        return Err(MathError::InsufficientData(format!(
            "Need more than {} observations to build {} lags, got {}",
            lags,
            lags,
            series.len()
        )));
    }

    let mut rows = Vec::with_capacity(series.len() - lags);
    let mut targets = Vec::with_capacity(series.len() - lags);
    for t in lags..series.len() {
        rows.push((1..=lags).map(|k| series[t - k]).collect());
        targets.push(series[t]);
    }

    Ok((rows, targets))
}

/// Feature row for the step right after the end of `history`
pub fn lag_features(history: &[f64], lags: usize) -> Result<Vec<f64>> {
    if history.len() < lags {
        return Err(MathError::InsufficientData(format!(
            "Need {} past values, got {}",
            lags,
            history.len()
        )));
    }

    Ok(history.iter().rev().take(lags).copied().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lag_matrix_layout() {
        let series = [1.0, 2.0, 3.0, 4.0, 5.0];
        let (rows, targets) = lag_matrix(&series, 2).unwrap();

        assert_eq!(rows, vec![vec![2.0, 1.0], vec![3.0, 2.0], vec![4.0, 3.0]]);
        assert_eq!(targets, vec![3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_lag_features_match_training_rows() {
        let series = [1.0, 2.0, 3.0, 4.0, 5.0];
        let features = lag_features(&series[..4], 2).unwrap();
        let (rows, _) = lag_matrix(&series, 2).unwrap();
        assert_eq!(&features, rows.last().unwrap());
    }

    #[test]
    fn test_insufficient_history() {
        assert!(lag_matrix(&[1.0, 2.0], 2).is_err());
        assert!(lag_matrix(&[1.0, 2.0], 0).is_err());
        assert!(lag_features(&[1.0], 2).is_err());
    }
}
