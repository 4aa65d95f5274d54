use demand_forecast::error::ForecastError;
use demand_math::MathError;
use std::io;

#[test]
fn test_error_conversion() {
    // Test IO error conversion
    let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
    let forecast_error = ForecastError::from(io_error);

    match forecast_error {
        ForecastError::IoError(_) => {}
        _ => panic!("Expected IoError variant"),
    }

    // Test math error conversion
    let math_error = MathError::InsufficientData("need 3 points".to_string());
    match ForecastError::from(math_error) {
        ForecastError::MathError(inner) => {
            assert_eq!(inner, MathError::InsufficientData("need 3 points".to_string()))
        }
        _ => panic!("Expected MathError variant"),
    }

    // Test JSON error conversion
    let json_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    assert!(matches!(
        ForecastError::from(json_error),
        ForecastError::JsonError(_)
    ));
}

#[test]
fn test_error_display() {
    let error = ForecastError::InvalidParameter("learning_rate must be in (0, 1]".to_string());
    assert_eq!(
        format!("{}", error),
        "Invalid parameter: learning_rate must be in (0, 1]"
    );

    let error = ForecastError::ModelError {
        model: "Holt-Winters".to_string(),
        reason: "produced non-finite values".to_string(),
    };
    assert_eq!(
        error.to_string(),
        "Model 'Holt-Winters' failed: produced non-finite values"
    );
}

#[test]
fn test_insufficient_history_guides_operator() {
    let error = ForecastError::InsufficientHistory {
        non_zero_weeks: 4,
        required: 13,
    };
    let message = error.to_string();

    assert!(error.is_usage_condition());
    assert!(message.contains("4 non-zero training weeks"));
    assert!(message.contains("at least 13"));
    assert!(message.contains("Select more locations"));

    assert!(!ForecastError::DataError("x".to_string()).is_usage_condition());
}
