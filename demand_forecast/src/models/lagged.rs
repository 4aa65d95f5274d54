//! Shared machinery for autoregressive regressors over lagged values
//!
//! A lag model is any one-step regressor trained on rows of the previous
//! `lags` values (newest first). Multi-step forecasts are produced by a
//! recursive rollout: each prediction is fed back as the newest lag.

use crate::error::Result;
use crate::models::{ForecastResult, TrainedForecastModel};
use demand_math::lags::{lag_features, lag_matrix};
use std::fmt::Debug;
use tracing::debug;

/// Fewest training points a lag model is fitted on
pub const MIN_LAG_POINTS: usize = 3;

/// A fitted regressor predicting the next value from a lag row
pub trait OneStepRegressor: Debug {
    /// Predict from features ordered newest lag first
    fn predict_one(&self, features: &[f64]) -> f64;
}

/// Lag window the history supports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LagWindow {
    /// Too little history to fit anything; repeat the last value
    RepeatLast,
    /// Fit on this many lags
    Lags(usize),
}

/// Choose the lag window for `len` training points and a configured lag count
///
/// The configured count is used when it leaves at least two training rows;
/// otherwise half the history is used.
pub fn lag_window(len: usize, lags: usize) -> LagWindow {
    if len < MIN_LAG_POINTS || lags == 0 {
        LagWindow::RepeatLast
    } else if len >= lags + 2 {
        LagWindow::Lags(lags)
    } else {
        LagWindow::Lags((len / 2).max(1))
    }
}

/// Roll a one-step regressor forward `horizons` steps past `history`
pub fn recursive_rollout<R: OneStepRegressor + ?Sized>(
    regressor: &R,
    history: &[f64],
    lags: usize,
    horizons: usize,
) -> Result<Vec<f64>> {
    let mut extended = history.to_vec();
    let mut out = Vec::with_capacity(horizons);
    for _ in 0..horizons {
        let next = regressor.predict_one(&lag_features(&extended, lags)?);
        extended.push(next);
        out.push(next);
    }
    Ok(out)
}

/// Fitted lag model: a regressor plus the tail of history it rolls forward from
#[derive(Debug, Clone)]
pub struct TrainedLagModel<R> {
    name: String,
    lags: usize,
    history: Vec<f64>,
    /// `None` when the history was too short to fit
    regressor: Option<R>,
}

impl<R: OneStepRegressor> TrainedLagModel<R> {
    /// Build the lag matrix for `train` and fit a regressor with `fit`
    pub fn fit<F>(name: &str, train: &[f64], lags: usize, fit: F) -> Result<Self>
    where
        F: FnOnce(&[Vec<f64>], &[f64]) -> Result<R>,
    {
        match lag_window(train.len(), lags) {
            LagWindow::RepeatLast => {
                debug!(model = name, points = train.len(), "Repeating last value");
                Ok(Self {
                    name: name.to_string(),
                    lags: 0,
                    history: train.iter().rev().take(1).copied().collect(),
                    regressor: None,
                })
            }
            LagWindow::Lags(effective) => {
                if effective != lags {
                    debug!(model = name, lags, effective, "Shrinking lag window");
                }
                let (rows, targets) = lag_matrix(train, effective)?;
                let regressor = fit(&rows, &targets)?;
                Ok(Self {
                    name: name.to_string(),
                    lags: effective,
                    history: train[train.len() - effective..].to_vec(),
                    regressor: Some(regressor),
                })
            }
        }
    }

    /// Lag count actually used
    pub fn lags(&self) -> usize {
        self.lags
    }

    pub fn regressor(&self) -> Option<&R> {
        self.regressor.as_ref()
    }
}

impl<R: OneStepRegressor> TrainedForecastModel for TrainedLagModel<R> {
    fn forecast(&self, horizons: usize) -> Result<ForecastResult> {
        let values = match &self.regressor {
            Some(regressor) => recursive_rollout(regressor, &self.history, self.lags, horizons)?,
            None => vec![self.history.last().copied().unwrap_or(0.0); horizons],
        };
        ForecastResult::new(values, horizons)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Predicts the newest lag plus one
    #[derive(Debug)]
    struct Increment;

    impl OneStepRegressor for Increment {
        fn predict_one(&self, features: &[f64]) -> f64 {
            features[0] + 1.0
        }
    }

    /// Predicts the oldest lag
    #[derive(Debug)]
    struct Oldest;

    impl OneStepRegressor for Oldest {
        fn predict_one(&self, features: &[f64]) -> f64 {
            features[features.len() - 1]
        }
    }

    #[test]
    fn test_lag_window() {
        assert_eq!(lag_window(2, 13), LagWindow::RepeatLast);
        assert_eq!(lag_window(100, 52), LagWindow::Lags(52));
        assert_eq!(lag_window(54, 52), LagWindow::Lags(52));
        assert_eq!(lag_window(40, 52), LagWindow::Lags(20));
        assert_eq!(lag_window(3, 13), LagWindow::Lags(1));
    }

    #[test]
    fn test_rollout_feeds_predictions_back() {
        let out = recursive_rollout(&Increment, &[1.0, 2.0, 3.0], 2, 3).unwrap();
        assert_eq!(out, vec![4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_rollout_drops_oldest_lag() {
        // With 3 lags the oldest lag walks through the history, then the predictions
        let out = recursive_rollout(&Oldest, &[7.0, 8.0, 9.0], 3, 5).unwrap();
        assert_eq!(out, vec![7.0, 8.0, 9.0, 7.0, 8.0]);
    }

    #[test]
    fn test_repeat_last_for_tiny_history() {
        let model =
            TrainedLagModel::<Increment>::fit("tiny", &[3.0, 6.0], 13, |_, _| Ok(Increment))
                .unwrap();
        assert!(model.regressor().is_none());
        assert_eq!(model.forecast(3).unwrap().values(), &[6.0, 6.0, 6.0]);
    }
}
