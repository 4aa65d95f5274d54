use assert_approx_eq::assert_approx_eq;
use demand_forecast::metrics::{
    evaluate_forecast, forecast_bias, mean_absolute_deviation, mean_absolute_percentage_error,
    root_mean_squared_error,
};
use demand_forecast::selector::select_best_model;

#[test]
fn test_regression_metrics() {
    let actual = vec![10.0, 20.0, 30.0, 40.0, 50.0];
    let predicted = vec![12.0, 18.0, 33.0, 37.0, 52.0];

    // Test RMSE
    let rmse = root_mean_squared_error(&actual, &predicted).unwrap();
    assert_approx_eq!(rmse, 2.45, 0.01);

    // Test MAD
    let mad = mean_absolute_deviation(&actual, &predicted).unwrap();
    assert_approx_eq!(mad, 2.4, 1e-9);

    // Test Bias: residuals -2, 2, -3, 3, -2
    let bias = forecast_bias(&actual, &predicted).unwrap();
    assert_approx_eq!(bias, -0.4, 1e-9);

    // Test MAPE
    let mape = mean_absolute_percentage_error(&actual, &predicted).unwrap().unwrap();
    assert!(mape > 0.0 && mape < 15.0);
}

#[test]
fn test_mape_excludes_zero_actuals() {
    // |10-8|/10 = 0.2, |20-22|/20 = 0.1, mean 0.15
    let mape = mean_absolute_percentage_error(&[0.0, 10.0, 20.0], &[5.0, 8.0, 22.0]).unwrap();
    assert_approx_eq!(mape.unwrap(), 15.0, 1e-9);
}

#[test]
fn test_metrics_are_non_negative() {
    let actual = [0.0, 3.0, 0.0, 7.0];
    let forecast = [1.0, 1.0, 4.0, 9.0];
    let metrics = evaluate_forecast(&actual, &forecast).unwrap();

    assert!(metrics.rmse >= 0.0);
    assert!(metrics.mad >= 0.0);
    assert!(metrics.bias < 0.0);
    assert!(metrics.mape.unwrap() >= 0.0);
}

#[test]
fn test_selector_picks_minimum_mape() {
    let mape = vec![("A", Some(12.0)), ("B", Some(9.5)), ("C", Some(9.5))];
    assert_eq!(select_best_model(mape), Some("B"));
}
