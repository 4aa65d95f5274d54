//! ARIMA models for time series forecasting
//!
//! A seasonal ARIMA(p,d,q)(P,D,Q)s is fitted by conditional sum of squares:
//! the series is differenced with `(1 - B)^d (1 - B^s)^D`, the multiplicative
//! AR and MA lag polynomials are expanded, and their coefficients are found by
//! Nelder-Mead. Forecasts are made on the differenced scale and integrated
//! back onto the original series.

use crate::error::{ForecastError, Result};
use crate::models::{ForecastResult, TrainedForecastModel};
use demand_math::diff::{apply_difference, differencing_polynomial, integrate, poly_mul};
use demand_math::optimization::{nelder_mead, NelderMeadConfig};
use demand_math::stats::mean;

/// Bound on every AR/MA coefficient during fitting
const COEFFICIENT_BOUND: f64 = 0.99;
/// Floor on the residual variance so a perfect fit keeps a finite AIC
const MIN_VARIANCE: f64 = 1e-10;

/// Non-seasonal order (p, d, q)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArimaOrder {
    pub p: usize,
    pub d: usize,
    pub q: usize,
}

impl ArimaOrder {
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self { p, d, q }
    }
}

/// Seasonal order (P, D, Q, s); `period == 0` disables the seasonal part
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SeasonalOrder {
    pub p: usize,
    pub d: usize,
    pub q: usize,
    pub period: usize,
}

impl SeasonalOrder {
    pub fn new(p: usize, d: usize, q: usize, period: usize) -> Self {
        Self { p, d, q, period }
    }

    /// The (0, 0, 0, 0) order
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_none(&self) -> bool {
        self.period < 2 || (self.p == 0 && self.d == 0 && self.q == 0)
    }
}

/// Full model specification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArimaSpec {
    pub order: ArimaOrder,
    pub seasonal: SeasonalOrder,
    /// Estimate a constant on the differenced scale (a drift when d = 1)
    pub with_intercept: bool,
}

impl ArimaSpec {
    pub fn new(order: ArimaOrder, seasonal: SeasonalOrder, with_intercept: bool) -> Self {
        let seasonal = if seasonal.is_none() {
            SeasonalOrder::none()
        } else {
            seasonal
        };
        Self {
            order,
            seasonal,
            with_intercept,
        }
    }

    /// Number of estimated coefficients
    pub fn num_params(&self) -> usize {
        self.order.p
            + self.order.q
            + self.seasonal.p
            + self.seasonal.q
            + usize::from(self.with_intercept)
    }

    /// Human-readable label, e.g. `ARIMA(1,1,1)(1,1,1)[13]`
    pub fn label(&self) -> String {
        let base = format!("ARIMA({},{},{})", self.order.p, self.order.d, self.order.q);
        if self.seasonal.is_none() {
            base
        } else {
            format!(
                "{}({},{},{})[{}]",
                base, self.seasonal.p, self.seasonal.d, self.seasonal.q, self.seasonal.period
            )
        }
    }

    fn differencing(&self) -> Vec<f64> {
        differencing_polynomial(self.order.d, self.seasonal.d, self.seasonal.period)
    }

    /// Coefficients `a_k` of `u_t = sum a_k u_{t-k}`, index 0 unused
    fn ar_lags(&self, phi: &[f64], seasonal_phi: &[f64]) -> Vec<f64> {
        let poly = poly_mul(
            &lag_polynomial(phi, 1, -1.0),
            &lag_polynomial(seasonal_phi, self.seasonal.period.max(1), -1.0),
        );
        poly.iter().map(|c| -c).collect()
    }

    /// Coefficients `b_k` of the MA part `sum b_k e_{t-k}`, index 0 unused
    fn ma_lags(&self, theta: &[f64], seasonal_theta: &[f64]) -> Vec<f64> {
        poly_mul(
            &lag_polynomial(theta, 1, 1.0),
            &lag_polynomial(seasonal_theta, self.seasonal.period.max(1), 1.0),
        )
    }
}

/// `1 + sign * (c_1 B^step + c_2 B^{2 step} + ...)`
fn lag_polynomial(coefficients: &[f64], step: usize, sign: f64) -> Vec<f64> {
    let mut poly = vec![0.0; coefficients.len() * step + 1];
    poly[0] = 1.0;
    for (i, c) in coefficients.iter().enumerate() {
        poly[(i + 1) * step] = sign * c;
    }
    poly
}

/// Coefficients unpacked from the optimiser's parameter vector
#[derive(Debug, Clone, Default)]
struct ArmaParams {
    intercept: f64,
    phi: Vec<f64>,
    theta: Vec<f64>,
    seasonal_phi: Vec<f64>,
    seasonal_theta: Vec<f64>,
}

impl ArmaParams {
    fn unpack(spec: &ArimaSpec, params: &[f64]) -> Self {
        let mut rest = params;
        let mut take = |n: usize| {
            let (head, tail) = rest.split_at(n);
            rest = tail;
            head.to_vec()
        };

        let intercept = if spec.with_intercept { take(1)[0] } else { 0.0 };
        Self {
            intercept,
            phi: take(spec.order.p),
            theta: take(spec.order.q),
            seasonal_phi: take(spec.seasonal.p),
            seasonal_theta: take(spec.seasonal.q),
        }
    }
}

/// One-step residuals of the ARMA recursion on the demeaned differenced series
///
/// Residuals before `start` are zero; `start` is the highest AR lag.
fn arma_residuals(centered: &[f64], ar: &[f64], ma: &[f64]) -> (Vec<f64>, usize) {
    let start = ar.len().saturating_sub(1);
    let mut residuals = vec![0.0; centered.len()];

    for t in start..centered.len() {
        let mut pred = 0.0;
        for k in 1..ar.len() {
            pred += ar[k] * centered[t - k];
        }
        for k in 1..ma.len() {
            if t >= k {
                pred += ma[k] * residuals[t - k];
            }
        }
        residuals[t] = centered[t] - pred;
    }

    (residuals, start)
}

/// Fitted seasonal ARIMA model
#[derive(Debug, Clone)]
pub struct TrainedArima {
    name: String,
    spec: ArimaSpec,
    intercept: f64,
    ar: Vec<f64>,
    ma: Vec<f64>,
    history: Vec<f64>,
    centered: Vec<f64>,
    residuals: Vec<f64>,
    sigma2: f64,
    aic: f64,
}

impl TrainedArima {
    /// Fit `spec` to `series` by conditional sum of squares
    pub fn fit(name: &str, spec: ArimaSpec, series: &[f64]) -> Result<Self> {
        let differenced = apply_difference(series, &spec.differencing());
        let k = spec.num_params();
        let max_ar_lag = spec.order.p + spec.seasonal.p * spec.seasonal.period;
        let effective = differenced.len().saturating_sub(max_ar_lag);

        if effective < k + 2 {
            return Err(ForecastError::model(
                name,
                format!(
                    "{} needs more history: {} usable points after differencing for {} parameters",
                    spec.label(),
                    effective,
                    k
                ),
            ));
        }

        let level = mean(&differenced);
        let mut initial = Vec::with_capacity(k);
        let mut bounds = Vec::with_capacity(k);
        if spec.with_intercept {
            initial.push(level);
            bounds.push((f64::NEG_INFINITY, f64::INFINITY));
        }
        for count in [spec.order.p, spec.order.q, spec.seasonal.p, spec.seasonal.q] {
            for i in 0..count {
                initial.push(0.1 / (i + 1) as f64);
                bounds.push((-COEFFICIENT_BOUND, COEFFICIENT_BOUND));
            }
        }

        let css = |params: &[f64]| {
            let p = ArmaParams::unpack(&spec, params);
            let centered: Vec<f64> = differenced.iter().map(|w| w - p.intercept).collect();
            let (residuals, start) = arma_residuals(
                &centered,
                &spec.ar_lags(&p.phi, &p.seasonal_phi),
                &spec.ma_lags(&p.theta, &p.seasonal_theta),
            );
            residuals[start..].iter().map(|e| e * e).sum::<f64>()
        };

        let config = NelderMeadConfig {
            max_iter: 2000,
            tolerance: 1e-8,
            ..Default::default()
        };
        let fitted = nelder_mead(css, &initial, Some(&bounds), &config);
        let params = ArmaParams::unpack(&spec, &fitted.point);

        let ar = spec.ar_lags(&params.phi, &params.seasonal_phi);
        let ma = spec.ma_lags(&params.theta, &params.seasonal_theta);
        let centered: Vec<f64> = differenced.iter().map(|w| w - params.intercept).collect();
        let (residuals, start) = arma_residuals(&centered, &ar, &ma);

        let n_eff = (centered.len() - start) as f64;
        let sse: f64 = residuals[start..].iter().map(|e| e * e).sum();
        let sigma2 = (sse / n_eff).max(MIN_VARIANCE);
        let log_likelihood = -0.5 * n_eff * (1.0 + sigma2.ln() + (2.0 * std::f64::consts::PI).ln());
        let aic = -2.0 * log_likelihood + 2.0 * (k + 1) as f64;

        Ok(Self {
            name: name.to_string(),
            spec,
            intercept: params.intercept,
            ar,
            ma,
            history: series.to_vec(),
            centered,
            residuals,
            sigma2,
            aic,
        })
    }

    /// Akaike information criterion of the fit
    pub fn aic(&self) -> f64 {
        self.aic
    }

    /// Residual variance
    pub fn sigma2(&self) -> f64 {
        self.sigma2
    }

    pub fn spec(&self) -> &ArimaSpec {
        &self.spec
    }
}

impl TrainedForecastModel for TrainedArima {
    fn forecast(&self, horizons: usize) -> Result<ForecastResult> {
        let mut centered = self.centered.clone();
        let mut residuals = self.residuals.clone();

        for _ in 0..horizons {
            let t = centered.len();
            let mut pred = 0.0;
            for k in 1..self.ar.len() {
                if t >= k {
                    pred += self.ar[k] * centered[t - k];
                }
            }
            for k in 1..self.ma.len() {
                if t >= k {
                    pred += self.ma[k] * residuals[t - k];
                }
            }
            centered.push(pred);
            // Future shocks are zero in expectation
            residuals.push(0.0);
        }

        let differenced: Vec<f64> = centered[self.centered.len()..]
            .iter()
            .map(|u| u + self.intercept)
            .collect();
        let values = integrate(&self.history, &differenced, &self.spec.differencing())?;

        ForecastResult::new(values, horizons)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
