//! Holt-Winters exponential smoothing with additive trend and additive season
//!
//! Smoothing weights are chosen by minimising the in-sample one-step SSE
//! with Nelder-Mead. Series shorter than two seasons fall back to Holt's
//! linear trend method, which needs no seasonal initialisation.

use crate::error::{ForecastError, Result};
use crate::models::{ForecastModel, ForecastResult, TrainedForecastModel};
use demand_math::optimization::{nelder_mead, NelderMeadConfig};
use tracing::{debug, info};

const WEIGHT_BOUNDS: (f64, f64) = (0.0001, 0.9999);

/// Additive Holt-Winters model
#[derive(Debug, Clone)]
pub struct HoltWinters {
    name: String,
    period: usize,
}

/// Smoothing state after the last training observation
#[derive(Debug, Clone)]
pub struct TrainedHoltWinters {
    name: String,
    alpha: f64,
    beta: f64,
    gamma: f64,
    level: f64,
    trend: f64,
    /// Seasonal indices by slot `t % period`; empty for the Holt fallback
    seasonals: Vec<f64>,
    /// Number of training observations
    n: usize,
}

impl HoltWinters {
    pub fn new(period: usize) -> Self {
        Self {
            name: "Holt-Winters".to_string(),
            period,
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }

    fn fit_seasonal(&self, values: &[f64]) -> TrainedHoltWinters {
        let period = self.period;
        let result = nelder_mead(
            |w| seasonal_pass(values, period, w[0], w[1], w[2]).sse,
            &[0.3, 0.1, 0.1],
            Some(&[WEIGHT_BOUNDS; 3]),
            &NelderMeadConfig::default(),
        );
        let (alpha, beta, gamma) = (result.point[0], result.point[1], result.point[2]);
        let state = seasonal_pass(values, period, alpha, beta, gamma);

        TrainedHoltWinters {
            name: self.name.clone(),
            alpha,
            beta,
            gamma,
            level: state.level,
            trend: state.trend,
            seasonals: state.seasonals,
            n: values.len(),
        }
    }

    fn fit_holt(&self, values: &[f64]) -> TrainedHoltWinters {
        let result = nelder_mead(
            |w| holt_pass(values, w[0], w[1]).sse,
            &[0.3, 0.1],
            Some(&[WEIGHT_BOUNDS; 2]),
            &NelderMeadConfig::default(),
        );
        let (alpha, beta) = (result.point[0], result.point[1]);
        let state = holt_pass(values, alpha, beta);

        TrainedHoltWinters {
            name: self.name.clone(),
            alpha,
            beta,
            gamma: 0.0,
            level: state.level,
            trend: state.trend,
            seasonals: Vec::new(),
            n: values.len(),
        }
    }
}

struct SmoothingState {
    level: f64,
    trend: f64,
    seasonals: Vec<f64>,
    sse: f64,
}

/// Level from the first season, trend from the first two seasons, seasonals centred on zero
fn initial_state(values: &[f64], period: usize) -> (f64, f64, Vec<f64>) {
    let first = &values[..period];
    let level = first.iter().sum::<f64>() / period as f64;
    let trend = (0..period)
        .map(|i| (values[period + i] - values[i]) / period as f64)
        .sum::<f64>()
        / period as f64;

    let mut seasonals: Vec<f64> = first.iter().map(|y| y - level).collect();
    let offset = seasonals.iter().sum::<f64>() / period as f64;
    for s in &mut seasonals {
        *s -= offset;
    }

    (level, trend, seasonals)
}

fn seasonal_pass(
    values: &[f64],
    period: usize,
    alpha: f64,
    beta: f64,
    gamma: f64,
) -> SmoothingState {
    let (mut level, mut trend, mut seasonals) = initial_state(values, period);
    let mut sse = 0.0;

    for (t, &y) in values.iter().enumerate().skip(period) {
        let slot = t % period;
        let s = seasonals[slot];
        let error = y - (level + trend + s);
        sse += error * error;

        let previous = level;
        level = alpha * (y - s) + (1.0 - alpha) * (previous + trend);
        trend = beta * (level - previous) + (1.0 - beta) * trend;
        seasonals[slot] = gamma * (y - level) + (1.0 - gamma) * s;
    }

    SmoothingState {
        level,
        trend,
        seasonals,
        sse,
    }
}

fn holt_pass(values: &[f64], alpha: f64, beta: f64) -> SmoothingState {
    let mut level = values[0];
    let mut trend = if values.len() > 1 {
        values[1] - values[0]
    } else {
        0.0
    };
    let mut sse = 0.0;

    for &y in &values[1..] {
        let error = y - (level + trend);
        sse += error * error;

        let previous = level;
        level = alpha * y + (1.0 - alpha) * (previous + trend);
        trend = beta * (level - previous) + (1.0 - beta) * trend;
    }

    SmoothingState {
        level,
        trend,
        seasonals: Vec::new(),
        sse,
    }
}

impl ForecastModel for HoltWinters {
    fn name(&self) -> &str {
        &self.name
    }

    fn train(&self, train: &[f64]) -> Result<Box<dyn TrainedForecastModel>> {
        if train.is_empty() {
            return Err(ForecastError::model(&self.name, "empty training series"));
        }

        let fitted = if self.period >= 2 && train.len() >= 2 * self.period {
            self.fit_seasonal(train)
        } else {
            info!(
                points = train.len(),
                period = self.period,
                "Too little history for seasonal smoothing, using Holt's linear trend"
            );
            self.fit_holt(train)
        };

        debug!(
            alpha = fitted.alpha,
            beta = fitted.beta,
            gamma = fitted.gamma,
            "Holt-Winters fitted"
        );
        Ok(Box::new(fitted))
    }
}

impl TrainedForecastModel for TrainedHoltWinters {
    fn forecast(&self, horizons: usize) -> Result<ForecastResult> {
        let values = (1..=horizons)
            .map(|h| {
                let season = if self.seasonals.is_empty() {
                    0.0
                } else {
                    self.seasonals[(self.n + h - 1) % self.seasonals.len()]
                };
                self.level + h as f64 * self.trend + season
            })
            .collect();

        ForecastResult::new(values, horizons)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
