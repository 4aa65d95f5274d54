//! # Demand Math
//!
//! Numeric building blocks for weekly demand forecasting.
//! This crate provides the small pieces of numerical machinery the forecasting
//! models share: descriptive statistics, differencing and integration,
//! lagged feature construction and a derivative-free minimiser.

use thiserror::Error;

pub mod diff;
pub mod lags;
pub mod optimization;
pub mod stats;

/// Errors that can occur in numeric calculations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Result type for numeric operations
pub type Result<T> = std::result::Result<T, MathError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = MathError::InsufficientData("need 3 points".to_string());
        assert_eq!(
            err.to_string(),
            "Insufficient data for calculation: need 3 points"
        );
    }
}
