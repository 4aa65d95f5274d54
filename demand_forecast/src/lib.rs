//! # Demand Forecast
//!
//! A Rust library for weekly SKU demand forecasting and model comparison.
//!
//! ## Features
//!
//! - Sales record loading (CSV via Polars) with location and shipment filters
//! - Demand pattern classification (ADI / CV²: smooth, intermittent, erratic, lumpy)
//! - Monday-anchored weekly aggregation and train/test partitioning
//! - Forecasting models (Auto ARIMA, Seasonal ARIMA, Holt-Winters, Bayesian ridge,
//!   gradient-boosted trees)
//! - Holdout scoring (RMSE, MAPE, Bias, MAD) and best-model selection
//! - Memoised pipeline runs and CSV / JSON export
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use demand_forecast::config::DashboardConfig;
//! use demand_forecast::session::DashboardSession;
//!
//! # fn main() -> demand_forecast::error::Result<()> {
//! // Load the configured sales export
//! let mut session = DashboardSession::open(DashboardConfig::default())?;
//!
//! // Pick a SKU and evaluate every model on the default split
//! session.select_product("PRODUCT_7");
//! let outcome = session.run()?;
//!
//! for model in outcome.report.outcomes() {
//!     println!("{}: {}", model.name, model.metrics);
//! }
//! println!("Best model: {:?}", outcome.best_model);
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod data;
pub mod demand;
pub mod error;
pub mod evaluator;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod report;
pub mod selector;
pub mod session;
pub mod weekly;

// Re-export commonly used types
pub use crate::config::DashboardConfig;
pub use crate::data::{DataLoader, SalesFilter, SalesRecord, SalesTable, ValueField};
pub use crate::demand::{determine_demand_type, DemandType};
pub use crate::error::ForecastError;
pub use crate::evaluator::{evaluate_models, EvaluationReport};
pub use crate::metrics::AccuracyMetrics;
pub use crate::models::{ForecastModel, ForecastResult, ModelRegistry};
pub use crate::pipeline::{run_pipeline, ForecastPipeline, PipelineOutcome, PipelineRequest};
pub use crate::selector::select_best_model;
pub use crate::session::DashboardSession;
pub use crate::weekly::{aggregate_weekly, TrainTestSplit, WeeklySeries};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
