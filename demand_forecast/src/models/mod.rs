//! Forecasting models for weekly demand series
//!
//! Every model is a [`ForecastModel`]: it trains on the values of a training
//! window and produces a point forecast for a requested number of weeks.
//! Models are registered in a fixed order in a [`ModelRegistry`]; the
//! evaluator drives them uniformly through the trait object.

use crate::config::ModelSettings;
use crate::error::{ForecastError, Result};
use std::fmt::Debug;

/// Forecast result containing predicted values
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastResult {
    /// Forecasted values
    values: Vec<f64>,
    /// Number of periods forecasted
    horizons: usize,
}

impl ForecastResult {
    /// Create a new forecast result
    pub fn new(values: Vec<f64>, horizons: usize) -> Result<Self> {
        if values.len() != horizons {
            return Err(ForecastError::ValidationError(format!(
                "Values length ({}) doesn't match horizons ({})",
                values.len(),
                horizons
            )));
        }

        Ok(Self { values, horizons })
    }

    /// Get the forecasted values
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Get the number of periods forecasted
    pub fn horizons(&self) -> usize {
        self.horizons
    }

    /// Consume the result, returning the values
    pub fn into_values(self) -> Vec<f64> {
        self.values
    }

    /// Clip every value at zero; demand cannot be negative
    pub fn clip_non_negative(mut self) -> Self {
        for v in &mut self.values {
            *v = v.max(0.0);
        }
        self
    }
}

/// Trained forecast model
pub trait TrainedForecastModel: Debug {
    /// Generate forecast for future periods
    fn forecast(&self, horizons: usize) -> Result<ForecastResult>;

    /// Name of the model
    fn name(&self) -> &str;
}

/// Forecast model that can be trained on a weekly series
pub trait ForecastModel: Debug + Send + Sync {
    /// Get the name of the model
    fn name(&self) -> &str;

    /// Train the model on the training window
    fn train(&self, train: &[f64]) -> Result<Box<dyn TrainedForecastModel>>;

    /// Train on `train` and forecast `horizons` non-negative values
    fn fit_forecast(&self, train: &[f64], horizons: usize) -> Result<ForecastResult> {
        if train.is_empty() {
            return Err(ForecastError::model(self.name(), "empty training series"));
        }

        let forecast = self.train(train)?.forecast(horizons)?;
        if forecast.horizons() != horizons {
            return Err(ForecastError::model(
                self.name(),
                format!("produced {} values for horizon {}", forecast.horizons(), horizons),
            ));
        }
        if forecast.values().iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::model(self.name(), "produced non-finite values"));
        }

        Ok(forecast.clip_non_negative())
    }
}

/// Ordered collection of models evaluated together
#[derive(Debug, Default)]
pub struct ModelRegistry {
    models: Vec<Box<dyn ForecastModel>>,
}

impl ModelRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// The five dashboard models, in display order
    pub fn standard(settings: &ModelSettings) -> Self {
        Self::new()
            .with_model(auto_arima::AutoArima::new())
            .with_model(sarima::SeasonalArima::new(settings.seasonal_period))
            .with_model(holt_winters::HoltWinters::new(settings.seasonal_period))
            .with_model(bayesian::BayesianRegression::new(settings.bayesian_lags))
            .with_model(gradient_boosting::GradientBoosting::new(
                settings.boosting.clone(),
            ))
    }

    /// Append a model; evaluation follows registration order
    pub fn with_model<M: ForecastModel + 'static>(mut self, model: M) -> Self {
        self.register(Box::new(model));
        self
    }

    pub fn register(&mut self, model: Box<dyn ForecastModel>) {
        self.models.push(model);
    }

    /// Registered models, in order
    pub fn iter(&self) -> impl Iterator<Item = &dyn ForecastModel> {
        self.models.iter().map(|m| m.as_ref())
    }

    /// Registered model names, in order
    pub fn names(&self) -> Vec<&str> {
        self.iter().map(|m| m.name()).collect()
    }

    /// Look up a model by name
    pub fn get(&self, name: &str) -> Option<&dyn ForecastModel> {
        self.iter().find(|m| m.name() == name)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

pub mod arima;
pub mod auto_arima;
pub mod bayesian;
pub mod gradient_boosting;
pub mod holt_winters;
pub mod lagged;
pub mod sarima;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forecast_result_validation() {
        assert!(ForecastResult::new(vec![1.0, 2.0], 3).is_err());
        let result = ForecastResult::new(vec![-1.0, 2.0], 2).unwrap();
        assert_eq!(result.clip_non_negative().values(), &[0.0, 2.0]);
    }

    #[test]
    fn test_standard_registry_order() {
        let registry = ModelRegistry::standard(&ModelSettings::default());
        assert_eq!(
            registry.names(),
            vec![
                "Auto ARIMA",
                "Seasonal ARIMA",
                "Holt-Winters",
                "Bayesian Regression",
                "Gradient Boosting"
            ]
        );
        assert!(registry.get("Holt-Winters").is_some());
        assert!(registry.get("Prophet").is_none());
    }
}
