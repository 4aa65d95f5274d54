//! Seasonal ARIMA with a fixed (1,1,1)(1,1,1,s) order

use crate::error::{ForecastError, Result};
use crate::models::arima::{ArimaOrder, ArimaSpec, SeasonalOrder, TrainedArima};
use crate::models::{ForecastModel, TrainedForecastModel};
use tracing::{debug, info};

/// Seasonal ARIMA(1,1,1)(1,1,1,period) without a constant
///
/// With fewer than two full seasons of training data the seasonal part is
/// dropped and a plain ARIMA(1,1,1) is fitted instead. The same happens when
/// the seasonal fit runs out of usable points after differencing. A very
/// short series ends up with a random walk.
#[derive(Debug, Clone)]
pub struct SeasonalArima {
    name: String,
    order: ArimaOrder,
    seasonal: SeasonalOrder,
}

impl SeasonalArima {
    pub fn new(period: usize) -> Self {
        Self {
            name: "Seasonal ARIMA".to_string(),
            order: ArimaOrder::new(1, 1, 1),
            seasonal: SeasonalOrder::new(1, 1, 1, period),
        }
    }

    pub fn period(&self) -> usize {
        self.seasonal.period
    }

    /// ARIMA(1,1,1), or a random walk when even that cannot be estimated
    fn non_seasonal(&self, train: &[f64]) -> Result<TrainedArima> {
        let spec = ArimaSpec::new(self.order, SeasonalOrder::none(), false);
        TrainedArima::fit(&self.name, spec, train).or_else(|e| {
            debug!(error = %e, "Falling back to ARIMA(0,1,0)");
            let walk = ArimaSpec::new(ArimaOrder::new(0, 1, 0), SeasonalOrder::none(), false);
            TrainedArima::fit(&self.name, walk, train)
        })
    }
}

impl ForecastModel for SeasonalArima {
    fn name(&self) -> &str {
        &self.name
    }

    fn train(&self, train: &[f64]) -> Result<Box<dyn TrainedForecastModel>> {
        if train.len() < 2 * self.period() {
            info!(
                points = train.len(),
                period = self.period(),
                "Too little history for a seasonal fit, using ARIMA(1,1,1)"
            );
            return Ok(Box::new(self.non_seasonal(train)?));
        }

        let spec = ArimaSpec::new(self.order, self.seasonal, false);
        match TrainedArima::fit(&self.name, spec, train) {
            Ok(fit) => {
                debug!(order = %spec.label(), aic = fit.aic(), "Seasonal ARIMA fitted");
                Ok(Box::new(fit))
            }
            Err(ForecastError::ModelError { reason, .. }) => {
                info!(%reason, "Seasonal fit not possible, retrying without the seasonal part");
                Ok(Box::new(self.non_seasonal(train)?))
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seasonal(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 20.0 + 8.0 * ((i % 13) as f64 / 13.0 * std::f64::consts::TAU).cos())
            .collect()
    }

    #[test]
    fn test_seasonal_fit() {
        let model = SeasonalArima::new(13);
        let forecast = model.fit_forecast(&seasonal(78), 13).unwrap();
        assert_eq!(forecast.horizons(), 13);
        assert!(forecast.values().iter().all(|v| v.is_finite() && *v >= 0.0));
    }

    #[test]
    fn test_short_history_degrades() {
        let model = SeasonalArima::new(13);
        // Below two seasons
        assert_eq!(model.fit_forecast(&seasonal(20), 4).unwrap().horizons(), 4);
        // Two seasons, but too few points remain after seasonal differencing
        assert_eq!(model.fit_forecast(&seasonal(27), 4).unwrap().horizons(), 4);
        // Random walk
        let forecast = model.fit_forecast(&[3.0, 5.0, 4.0], 2).unwrap();
        assert_eq!(forecast.values(), &[4.0, 4.0]);
    }
}
