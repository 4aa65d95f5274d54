use demand_forecast::config::ModelSettings;
use demand_forecast::models::auto_arima::AutoArima;
use demand_forecast::models::bayesian::BayesianRegression;
use demand_forecast::models::gradient_boosting::{BoostingSettings, GradientBoosting};
use demand_forecast::models::holt_winters::HoltWinters;
use demand_forecast::models::sarima::SeasonalArima;
use demand_forecast::models::{ForecastModel, ModelRegistry};
use rstest::rstest;

/// Two years of weekly demand with a 13-week cycle, a mild trend and some zero weeks
fn weekly_demand(weeks: usize) -> Vec<f64> {
    (0..weeks)
        .map(|i| {
            let season = 12.0 * ((i % 13) as f64 / 13.0 * std::f64::consts::TAU).sin();
            let noise = ((i * 37) % 11) as f64 - 5.0;
            let value = 40.0 + 0.2 * i as f64 + season + noise;
            if i % 9 == 4 {
                0.0
            } else {
                value.max(0.0)
            }
        })
        .collect()
}

fn quick_boosting() -> BoostingSettings {
    BoostingSettings {
        n_estimators: 60,
        ..Default::default()
    }
}

fn all_models() -> Vec<Box<dyn ForecastModel>> {
    vec![
        Box::new(AutoArima::new()),
        Box::new(SeasonalArima::new(13)),
        Box::new(HoltWinters::new(13)),
        Box::new(BayesianRegression::new(13)),
        Box::new(GradientBoosting::new(quick_boosting())),
    ]
}

#[test]
fn test_every_model_returns_horizon_non_negative_values() {
    let train = weekly_demand(90);
    for model in all_models() {
        let forecast = model.fit_forecast(&train, 14).unwrap();
        assert_eq!(forecast.values().len(), 14, "{}", model.name());
        assert!(
            forecast.values().iter().all(|v| v.is_finite() && *v >= 0.0),
            "{} produced {:?}",
            model.name(),
            forecast.values()
        );
    }
}

#[rstest]
#[case(1)]
#[case(2)]
#[case(5)]
#[case(20)]
#[case(30)]
fn test_short_history_never_crashes(#[case] weeks: usize) {
    let train = weekly_demand(weeks);
    for model in all_models() {
        let result = model.fit_forecast(&train, 4);
        if weeks >= 5 {
            let forecast = result.unwrap_or_else(|e| panic!("{} failed: {}", model.name(), e));
            assert_eq!(forecast.horizons(), 4);
        } else if let Ok(forecast) = result {
            assert_eq!(forecast.horizons(), 4);
        }
    }
}

#[test]
fn test_lag_models_are_deterministic() {
    let train = weekly_demand(90);
    let bayesian = BayesianRegression::new(13);
    let boosting = GradientBoosting::new(quick_boosting());

    assert_eq!(
        bayesian.fit_forecast(&train, 10).unwrap(),
        bayesian.fit_forecast(&train, 10).unwrap()
    );
    assert_eq!(
        boosting.fit_forecast(&train, 10).unwrap(),
        boosting.fit_forecast(&train, 10).unwrap()
    );
}

#[test]
fn test_zero_horizon() {
    let train = weekly_demand(40);
    for model in all_models() {
        let forecast = model.fit_forecast(&train, 0).unwrap();
        assert!(forecast.values().is_empty());
    }
}

#[test]
fn test_empty_training_series_is_an_error() {
    for model in all_models() {
        assert!(model.fit_forecast(&[], 3).is_err());
    }
}

#[test]
fn test_standard_registry_uses_settings() {
    let settings = ModelSettings {
        seasonal_period: 4,
        ..Default::default()
    };
    let registry = ModelRegistry::standard(&settings);
    assert_eq!(registry.len(), 5);

    let train = weekly_demand(12);
    for model in registry.iter() {
        assert_eq!(model.fit_forecast(&train, 3).unwrap().horizons(), 3);
    }
}
