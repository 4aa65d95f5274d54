//! Error types for the demand_forecast crate

use polars::prelude::PolarsError;
use thiserror::Error;

/// Custom error types for the demand_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Error related to data loading or column extraction
    #[error("Data error: {0}")]
    DataError(String),

    /// A model could not produce a forecast
    #[error("Model '{model}' failed: {reason}")]
    ModelError { model: String, reason: String },

    /// Error related to input validation
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Not enough history to fit the models; a usage condition, not a fault
    #[error(
        "Not enough sales history: {non_zero_weeks} non-zero training weeks, need at least {required}. \
         Select more locations or choose a later split date."
    )]
    InsufficientHistory {
        non_zero_weeks: usize,
        required: usize,
    },

    /// Error from the numeric building blocks
    #[error("Math error: {0}")]
    MathError(#[from] demand_math::MathError),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error writing CSV output
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// Error reading or writing JSON
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Error from Polars operations
    #[error("Polars error: {0}")]
    PolarsError(String),
}

impl ForecastError {
    /// Whether the error is an operator-facing usage condition rather than a fault
    pub fn is_usage_condition(&self) -> bool {
        matches!(self, ForecastError::InsufficientHistory { .. })
    }

    pub(crate) fn model(model: &str, reason: impl Into<String>) -> Self {
        ForecastError::ModelError {
            model: model.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<PolarsError> for ForecastError {
    fn from(err: PolarsError) -> Self {
        ForecastError::PolarsError(err.to_string())
    }
}
