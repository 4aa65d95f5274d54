//! Multi-model evaluation on one train/test partition

use crate::error::{ForecastError, Result};
use crate::metrics::{evaluate_forecast, AccuracyMetrics};
use crate::models::{ForecastModel, ModelRegistry};
use crate::weekly::{TrainTestSplit, WeeklySeries};
use serde::Serialize;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Forecast and accuracy of one model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelOutcome {
    pub name: String,
    /// Predictions aligned with the test dates
    pub forecast: WeeklySeries,
    pub metrics: AccuracyMetrics,
}

/// A model that produced no usable forecast
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelFailure {
    pub name: String,
    pub reason: String,
}

/// Results of every registered model, in registration order
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct EvaluationReport {
    outcomes: Vec<ModelOutcome>,
    failures: Vec<ModelFailure>,
}

impl EvaluationReport {
    pub fn outcomes(&self) -> &[ModelOutcome] {
        &self.outcomes
    }

    pub fn failures(&self) -> &[ModelFailure] {
        &self.failures
    }

    /// Outcome of a model by name
    pub fn get(&self, name: &str) -> Option<&ModelOutcome> {
        self.outcomes.iter().find(|o| o.name == name)
    }

    /// Names of the models that produced a forecast
    pub fn model_names(&self) -> Vec<&str> {
        self.outcomes.iter().map(|o| o.name.as_str()).collect()
    }

    /// `(model, MAPE)` pairs in registration order
    pub fn mape(&self) -> Vec<(&str, Option<f64>)> {
        self.outcomes.iter().map(|o| (o.name.as_str(), o.metrics.mape)).collect()
    }

    pub fn rmse(&self) -> Vec<(&str, f64)> {
        self.outcomes.iter().map(|o| (o.name.as_str(), o.metrics.rmse)).collect()
    }

    pub fn bias(&self) -> Vec<(&str, f64)> {
        self.outcomes.iter().map(|o| (o.name.as_str(), o.metrics.bias)).collect()
    }

    pub fn mad(&self) -> Vec<(&str, f64)> {
        self.outcomes.iter().map(|o| (o.name.as_str(), o.metrics.mad)).collect()
    }
}

/// Fit one model and score it against the test window
fn evaluate_one(model: &dyn ForecastModel, split: &TrainTestSplit) -> Result<ModelOutcome> {
    let horizon = split.test.len();
    let forecast = model.fit_forecast(split.train.values(), horizon)?;
    let forecast = split.test.with_values(forecast.into_values())?;
    let metrics = evaluate_forecast(split.test.values(), forecast.values())?;

    Ok(ModelOutcome {
        name: model.name().to_string(),
        forecast,
        metrics,
    })
}

/// Run every registered model on the same partition
///
/// A model that fails is recorded in [`EvaluationReport::failures`] and the
/// rest are still scored. The partition itself must be non-degenerate.
pub fn evaluate_models(
    registry: &ModelRegistry,
    split: &TrainTestSplit,
) -> Result<EvaluationReport> {
    if split.is_degenerate() {
        return Err(ForecastError::ValidationError(format!(
            "Cannot evaluate on an empty partition (train {} weeks, test {} weeks)",
            split.train.len(),
            split.test.len()
        )));
    }

    let mut report = EvaluationReport::default();
    for model in registry.iter() {
        let started = Instant::now();
        match evaluate_one(model, split) {
            Ok(outcome) => {
                debug!(
                    model = model.name(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    metrics = %outcome.metrics,
                    "Model evaluated"
                );
                report.outcomes.push(outcome);
            }
            Err(e) => {
                warn!(model = model.name(), error = %e, "Model failed, excluded from results");
                report.failures.push(ModelFailure {
                    name: model.name().to_string(),
                    reason: e.to_string(),
                });
            }
        }
    }

    info!(
        succeeded = report.outcomes.len(),
        failed = report.failures.len(),
        train_weeks = split.train.len(),
        test_weeks = split.test.len(),
        "Evaluation finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ForecastResult, TrainedForecastModel};
    use chrono::NaiveDate;

    #[derive(Debug)]
    struct Constant(f64);

    impl TrainedForecastModel for Constant {
        fn forecast(&self, horizons: usize) -> Result<ForecastResult> {
            ForecastResult::new(vec![self.0; horizons], horizons)
        }

        fn name(&self) -> &str {
            "constant"
        }
    }

    #[derive(Debug)]
    struct Fixed(&'static str, f64);

    impl ForecastModel for Fixed {
        fn name(&self) -> &str {
            self.0
        }

        fn train(&self, _train: &[f64]) -> Result<Box<dyn TrainedForecastModel>> {
            Ok(Box::new(Constant(self.1)))
        }
    }

    #[derive(Debug)]
    struct Broken;

    impl ForecastModel for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        fn train(&self, _train: &[f64]) -> Result<Box<dyn TrainedForecastModel>> {
            Err(ForecastError::model("broken", "always fails"))
        }
    }

    fn split() -> TrainTestSplit {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let series = WeeklySeries::from_values(start, vec![5.0, 5.0, 5.0, 4.0, 6.0]);
        series.split_at(start + chrono::Duration::weeks(3))
    }

    #[test]
    fn test_failures_are_isolated() {
        let registry = ModelRegistry::new()
            .with_model(Fixed("five", 5.0))
            .with_model(Broken)
            .with_model(Fixed("minus", -1.0));

        let report = evaluate_models(&registry, &split()).unwrap();
        assert_eq!(report.model_names(), vec!["five", "minus"]);
        assert_eq!(report.failures().len(), 1);
        assert_eq!(report.failures()[0].name, "broken");

        // Negative forecasts are clipped to zero
        let minus = report.get("minus").unwrap();
        assert_eq!(minus.forecast.values(), &[0.0, 0.0]);
        assert_eq!(minus.forecast.dates(), split().test.dates());
        assert_eq!(report.get("five").unwrap().metrics.mad, 1.0);
    }

    #[test]
    fn test_degenerate_split_is_rejected() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let series = WeeklySeries::from_values(start, vec![1.0, 2.0]);
        let registry = ModelRegistry::new().with_model(Fixed("five", 5.0));
        assert!(evaluate_models(&registry, &series.split_at(start)).is_err());
    }
}
