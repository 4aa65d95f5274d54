//! Dashboard configuration
//!
//! Every field has a default, so a JSON file only needs the keys it changes.

use crate::data::{SalesFilter, ValueField};
use crate::error::{ForecastError, Result};
use crate::models::gradient_boosting::BoostingSettings;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Minimum non-zero training weeks before any model is fitted
pub const DEFAULT_MIN_NONZERO_WEEKS: usize = 13;
/// Weeks per season for the seasonal models
pub const DEFAULT_SEASONAL_PERIOD: usize = 13;

/// Model hyper-parameters
#[derive(Debug, Clone, PartialEq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    /// Season length used by Seasonal ARIMA and Holt-Winters
    pub seasonal_period: usize,
    /// Lagged weeks fed to the Bayesian ridge
    pub bayesian_lags: usize,
    pub boosting: BoostingSettings,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            seasonal_period: DEFAULT_SEASONAL_PERIOD,
            bayesian_lags: 13,
            boosting: BoostingSettings::default(),
        }
    }
}

/// Top-level configuration of a dashboard session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Sales CSV export
    pub data_path: PathBuf,
    /// Shipping plants offered by default
    pub locations: Vec<String>,
    /// Shipment-method prefixes offered by default
    pub shipment_methods: Vec<String>,
    pub value_field: ValueField,
    pub min_nonzero_weeks: usize,
    pub models: ModelSettings,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("masked_sales_df.csv"),
            locations: vec!["2".to_string(), "9".to_string(), "15".to_string()],
            shipment_methods: vec!["WILL CALL".to_string(), "UPS GROUND".to_string()],
            value_field: ValueField::Quantity,
            min_nonzero_weeks: DEFAULT_MIN_NONZERO_WEEKS,
            models: ModelSettings::default(),
        }
    }
}

impl DashboardConfig {
    /// Read a configuration from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the settings are usable
    pub fn validate(&self) -> Result<()> {
        if self.min_nonzero_weeks == 0 {
            return Err(ForecastError::InvalidParameter(
                "min_nonzero_weeks must be positive".to_string(),
            ));
        }
        if self.models.bayesian_lags == 0 || self.models.boosting.lags == 0 {
            return Err(ForecastError::InvalidParameter(
                "Lag counts must be positive".to_string(),
            ));
        }
        self.models.boosting.validate()
    }

    /// Filter built from the configured locations and shipment methods
    pub fn default_filter(&self) -> SalesFilter {
        SalesFilter::new(self.locations.clone(), self.shipment_methods.clone())
    }
}
