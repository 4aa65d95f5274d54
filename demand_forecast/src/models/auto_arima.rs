//! Automatic non-seasonal ARIMA order selection
//!
//! The differencing order comes from a variance-ratio test. The AR and MA
//! orders are then found by a stepwise AIC search in the manner of
//! Hyndman-Khandakar: start from a handful of candidate orders and move to a
//! neighbouring order while the AIC keeps improving.

use crate::error::{ForecastError, Result};
use crate::models::arima::{ArimaOrder, ArimaSpec, SeasonalOrder, TrainedArima};
use crate::models::{ForecastModel, TrainedForecastModel};
use demand_math::diff::suggest_differencing;
use std::collections::HashSet;
use tracing::debug;

/// Automatically ordered ARIMA model
#[derive(Debug, Clone)]
pub struct AutoArima {
    name: String,
    max_p: usize,
    max_q: usize,
    max_order: usize,
    max_d: usize,
}

impl AutoArima {
    pub fn new() -> Self {
        Self {
            name: "Auto ARIMA".to_string(),
            max_p: 5,
            max_q: 5,
            max_order: 5,
            max_d: 2,
        }
    }

    fn admissible(&self, p: usize, q: usize) -> bool {
        p <= self.max_p && q <= self.max_q && p + q <= self.max_order
    }

    fn spec(&self, p: usize, d: usize, q: usize) -> ArimaSpec {
        ArimaSpec::new(ArimaOrder::new(p, d, q), SeasonalOrder::none(), d < 2)
    }

    /// Fit every not-yet-tried admissible candidate, returning the best by AIC
    fn best_of(
        &self,
        train: &[f64],
        d: usize,
        candidates: &[(usize, usize)],
        visited: &mut HashSet<(usize, usize)>,
    ) -> Option<TrainedArima> {
        let mut best: Option<TrainedArima> = None;
        for &(p, q) in candidates {
            if !self.admissible(p, q) || !visited.insert((p, q)) {
                continue;
            }
            match TrainedArima::fit(&self.name, self.spec(p, d, q), train) {
                Ok(fit) => {
                    debug!(order = %fit.spec().label(), aic = fit.aic(), "Auto ARIMA candidate");
                    if best.as_ref().map_or(true, |b| fit.aic() < b.aic()) {
                        best = Some(fit);
                    }
                }
                Err(e) => debug!(p, d, q, error = %e, "Auto ARIMA candidate skipped"),
            }
        }
        best
    }
}

impl Default for AutoArima {
    fn default() -> Self {
        Self::new()
    }
}

impl ForecastModel for AutoArima {
    fn name(&self) -> &str {
        &self.name
    }

    fn train(&self, train: &[f64]) -> Result<Box<dyn TrainedForecastModel>> {
        let d = suggest_differencing(train, self.max_d);
        let mut visited = HashSet::new();

        let mut current = self.best_of(train, d, &[(2, 2), (0, 0), (1, 0), (0, 1)], &mut visited);

        while let Some(best) = current.as_ref() {
            let (p, q, best_aic) = (best.spec().order.p, best.spec().order.q, best.aic());
            let mut neighbours = vec![(p + 1, q), (p, q + 1), (p + 1, q + 1)];
            if p > 0 {
                neighbours.push((p - 1, q));
            }
            if q > 0 {
                neighbours.push((p, q - 1));
            }
            if p > 0 && q > 0 {
                neighbours.push((p - 1, q - 1));
            }

            match self.best_of(train, d, &neighbours, &mut visited) {
                Some(candidate) if candidate.aic() < best_aic => current = Some(candidate),
                _ => break,
            }
        }

        let fitted = match current {
            Some(fit) => fit,
            // Every candidate failed; a random walk or mean model needs only one point
            None => TrainedArima::fit(&self.name, self.spec(0, d, 0), train).or_else(|_| {
                TrainedArima::fit(&self.name, self.spec(0, 0, 0), train)
            })?,
        };

        if fitted.aic().is_nan() {
            return Err(ForecastError::model(&self.name, "AIC is undefined"));
        }

        debug!(order = %fitted.spec().label(), aic = fitted.aic(), "Auto ARIMA selected");
        Ok(Box::new(fitted))
    }
}
