//! Bayesian ridge regression over lagged weekly values
//!
//! Evidence maximisation follows MacKay: the noise precision `alpha` and the
//! weight precision `lambda` are re-estimated from the effective number of
//! well-determined parameters until the coefficients settle.

use crate::error::{ForecastError, Result};
use crate::models::lagged::{OneStepRegressor, TrainedLagModel};
use crate::models::{ForecastModel, TrainedForecastModel};
use demand_math::stats::{mean, population_variance};
use nalgebra::{DMatrix, DVector};
use tracing::debug;

/// Gamma hyper-prior shape/rate on both precisions
const HYPER_PRIOR: f64 = 1e-6;

/// Bayesian ridge over the previous `lags` weeks
#[derive(Debug, Clone)]
pub struct BayesianRegression {
    name: String,
    lags: usize,
    max_iter: usize,
    tol: f64,
}

impl BayesianRegression {
    pub fn new(lags: usize) -> Self {
        Self {
            name: "Bayesian Regression".to_string(),
            lags,
            max_iter: 300,
            tol: 1e-3,
        }
    }

    pub fn lags(&self) -> usize {
        self.lags
    }
}

/// Fitted linear model `y = intercept + coef · x`
#[derive(Debug, Clone)]
pub struct BayesianRidge {
    coef: Vec<f64>,
    intercept: f64,
    /// Noise precision
    alpha: f64,
    /// Weight precision
    lambda: f64,
}

impl BayesianRidge {
    /// Fit on design rows `x` and targets `y`
    pub fn fit(x: &[Vec<f64>], y: &[f64], max_iter: usize, tol: f64) -> Result<Self> {
        let n = y.len();
        let p = x.first().map_or(0, |row| row.len());
        if n == 0 || p == 0 || x.len() != n {
            return Err(ForecastError::InvalidParameter(format!(
                "Bayesian ridge needs a non-empty design matrix, got {} rows for {} targets",
                x.len(),
                n
            )));
        }

        let x_offset: Vec<f64> = (0..p)
            .map(|j| x.iter().map(|row| row[j]).sum::<f64>() / n as f64)
            .collect();
        let y_offset = mean(y);

        let xc = DMatrix::from_fn(n, p, |i, j| x[i][j] - x_offset[j]);
        let yc = DVector::from_iterator(n, y.iter().map(|v| v - y_offset));

        let xtx = xc.transpose() * &xc;
        let xty = xc.transpose() * &yc;
        let eigenvalues: Vec<f64> = xtx
            .clone()
            .symmetric_eigen()
            .eigenvalues
            .iter()
            .map(|e| e.max(0.0))
            .collect();

        let mut alpha = 1.0 / (population_variance(y) + f64::EPSILON);
        let mut lambda = 1.0;
        let mut coef = DVector::zeros(p);

        for iter in 0..max_iter {
            let next = Self::solve(&xtx, &xty, lambda / alpha)?;
            let rss = (&yc - &xc * &next).norm_squared();
            let gamma: f64 = eigenvalues
                .iter()
                .map(|e| alpha * e / (lambda + alpha * e))
                .sum();
            lambda = (gamma + 2.0 * HYPER_PRIOR) / (next.norm_squared() + 2.0 * HYPER_PRIOR);
            alpha = (n as f64 - gamma + 2.0 * HYPER_PRIOR) / (rss + 2.0 * HYPER_PRIOR);

            let change = (&coef - &next).abs().sum();
            coef = next;
            if iter > 0 && change < tol {
                debug!(iterations = iter + 1, "Bayesian ridge converged");
                break;
            }
        }
        let coef = Self::solve(&xtx, &xty, lambda / alpha)?;

        let intercept = y_offset
            - x_offset
                .iter()
                .zip(coef.iter())
                .map(|(m, c)| m * c)
                .sum::<f64>();

        Ok(Self {
            coef: coef.iter().copied().collect(),
            intercept,
            alpha,
            lambda,
        })
    }

    /// `(XᵀX + ridge I)⁻¹ Xᵀy`
    fn solve(xtx: &DMatrix<f64>, xty: &DVector<f64>, ridge: f64) -> Result<DVector<f64>> {
        let p = xtx.nrows();
        let system = xtx + DMatrix::identity(p, p) * ridge;
        system
            .cholesky()
            .map(|chol| chol.solve(xty))
            .ok_or_else(|| {
                ForecastError::model(
                    "Bayesian Regression",
                    "normal equations are not positive definite",
                )
            })
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coef
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Estimated noise and weight precisions
    pub fn precisions(&self) -> (f64, f64) {
        (self.alpha, self.lambda)
    }
}

impl OneStepRegressor for BayesianRidge {
    fn predict_one(&self, features: &[f64]) -> f64 {
        self.intercept + self.coef.iter().zip(features).map(|(c, x)| c * x).sum::<f64>()
    }
}

impl ForecastModel for BayesianRegression {
    fn name(&self) -> &str {
        &self.name
    }

    fn train(&self, train: &[f64]) -> Result<Box<dyn TrainedForecastModel>> {
        let fitted = TrainedLagModel::fit(&self.name, train, self.lags, |x, y| {
            BayesianRidge::fit(x, y, self.max_iter, self.tol)
        })?;
        Ok(Box::new(fitted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_recovers_linear_relation() {
        let x: Vec<Vec<f64>> = (0..50).map(|i| vec![i as f64, (i % 7) as f64]).collect();
        let y: Vec<f64> = x.iter().map(|r| 3.0 + 2.0 * r[0] - 1.5 * r[1]).collect();

        let model = BayesianRidge::fit(&x, &y, 300, 1e-3).unwrap();
        assert_approx_eq!(model.coefficients()[0], 2.0, 1e-3);
        assert_approx_eq!(model.coefficients()[1], -1.5, 1e-3);
        assert_approx_eq!(model.intercept(), 3.0, 1e-2);
        assert_approx_eq!(model.predict_one(&[10.0, 2.0]), 20.0, 1e-2);
    }

    #[test]
    fn test_constant_target() {
        let x: Vec<Vec<f64>> = (0..20).map(|i| vec![i as f64]).collect();
        let model = BayesianRidge::fit(&x, &[5.0; 20], 300, 1e-3).unwrap();
        assert_approx_eq!(model.predict_one(&[100.0]), 5.0, 1e-6);
    }

    #[test]
    fn test_forecast_is_deterministic() {
        let train: Vec<f64> = (0..60).map(|i| 10.0 + ((i * 5) % 13) as f64).collect();
        let model = BayesianRegression::new(13);
        let a = model.fit_forecast(&train, 8).unwrap();
        let b = model.fit_forecast(&train, 8).unwrap();
        assert_eq!(a.values().len(), 8);
        assert_eq!(a, b);
    }
}
