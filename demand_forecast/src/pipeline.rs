//! Forecast evaluation pipeline for one SKU
//!
//! filter → classify → aggregate → split → check history → evaluate → select.
//! Every check runs before the first model is fitted.

use crate::cache::{CacheBackend, CacheKey, MemoryCache};
use crate::config::{DashboardConfig, ModelSettings};
use crate::data::{ProductInfo, SalesFilter, SalesTable, ValueField};
use crate::demand::{determine_demand_type, display_name, DemandType};
use crate::error::{ForecastError, Result};
use crate::evaluator::{evaluate_models, EvaluationReport, ModelOutcome};
use crate::models::ModelRegistry;
use crate::selector::best_of_report;
use crate::weekly::{aggregate_weekly, SplitBounds, TrainTestSplit, WeeklySeries};
use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info};

pub use crate::config::DEFAULT_MIN_NONZERO_WEEKS as MIN_NONZERO_WEEKS;

/// What the operator asked for
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct PipelineRequest {
    pub product: String,
    pub value_field: ValueField,
    /// `None` selects the default split 90 days before the last week
    pub split_date: Option<NaiveDate>,
    pub filter: SalesFilter,
}

impl PipelineRequest {
    pub fn new(product: &str, value_field: ValueField, filter: SalesFilter) -> Self {
        Self {
            product: product.to_string(),
            value_field,
            split_date: None,
            filter,
        }
    }

    pub fn with_split_date(mut self, split_date: NaiveDate) -> Self {
        self.split_date = Some(split_date);
        self
    }
}

/// Everything produced for one request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineOutcome {
    pub product: String,
    /// SKU decorated with its demand type
    pub display_name: String,
    pub demand_type: Option<DemandType>,
    pub product_info: Option<ProductInfo>,
    pub value_field: ValueField,
    pub bounds: SplitBounds,
    pub split: TrainTestSplit,
    pub report: EvaluationReport,
    /// Model with the lowest MAPE, if any model had one
    pub best_model: Option<String>,
}

impl PipelineOutcome {
    /// Outcome of the selected model
    pub fn best_outcome(&self) -> Option<&ModelOutcome> {
        self.best_model.as_deref().and_then(|name| self.report.get(name))
    }
}

/// Fail with [`ForecastError::InsufficientHistory`] unless the partition can be fitted
pub fn check_history(split: &TrainTestSplit, min_nonzero_weeks: usize) -> Result<()> {
    let non_zero_weeks = split.train.non_zero_count();
    if split.is_degenerate() || non_zero_weeks < min_nonzero_weeks {
        return Err(ForecastError::InsufficientHistory {
            non_zero_weeks,
            required: min_nonzero_weeks,
        });
    }
    Ok(())
}

/// Run the pipeline without caching
pub fn run_pipeline(
    table: &SalesTable,
    request: &PipelineRequest,
    registry: &ModelRegistry,
    min_nonzero_weeks: usize,
) -> Result<PipelineOutcome> {
    let filtered = request.filter.apply(table);
    let demand_type = determine_demand_type(&filtered, request.value_field)
        .get(&request.product)
        .copied();

    let series = aggregate_weekly(&filtered, &request.product, request.value_field);
    let Some(bounds) = series.split_bounds() else {
        info!(product = %request.product, "No weekly history after filtering");
        return Err(ForecastError::InsufficientHistory {
            non_zero_weeks: 0,
            required: min_nonzero_weeks,
        });
    };

    let split_date = request.split_date.unwrap_or(bounds.default);
    let split = series.split_at(split_date);
    debug!(
        product = %request.product,
        %split_date,
        train_weeks = split.train.len(),
        test_weeks = split.test.len(),
        "Series partitioned"
    );
    check_history(&split, min_nonzero_weeks)?;

    let report = evaluate_models(registry, &split)?;
    let best_model = best_of_report(&report).map(str::to_string);
    info!(
        product = %request.product,
        field = %request.value_field,
        best = best_model.as_deref().unwrap_or("none"),
        "Pipeline finished"
    );

    Ok(PipelineOutcome {
        product: request.product.clone(),
        display_name: display_name(&request.product, demand_type),
        demand_type,
        product_info: filtered.product_info(&request.product),
        value_field: request.value_field,
        bounds,
        split,
        report,
        best_model,
    })
}

/// Weekly series for a request, without fitting anything
pub fn weekly_series(table: &SalesTable, request: &PipelineRequest) -> WeeklySeries {
    aggregate_weekly(&request.filter.apply(table), &request.product, request.value_field)
}

/// Pipeline with a fixed model set and a memoising cache
#[derive(Debug)]
pub struct ForecastPipeline {
    registry: ModelRegistry,
    settings: ModelSettings,
    min_nonzero_weeks: usize,
    cache: Box<dyn CacheBackend<PipelineOutcome>>,
}

impl ForecastPipeline {
    /// The standard model set with an in-memory cache
    pub fn new(config: &DashboardConfig) -> Self {
        Self {
            registry: ModelRegistry::standard(&config.models),
            settings: config.models.clone(),
            min_nonzero_weeks: config.min_nonzero_weeks,
            cache: Box::new(MemoryCache::new()),
        }
    }

    /// Replace the cache backend
    pub fn with_cache<C: CacheBackend<PipelineOutcome> + 'static>(mut self, cache: C) -> Self {
        self.cache = Box::new(cache);
        self
    }

    /// Replace the model set
    pub fn with_registry(mut self, registry: ModelRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn cache(&self) -> &dyn CacheBackend<PipelineOutcome> {
        self.cache.as_ref()
    }

    fn cache_key(&self, table: &SalesTable, request: &PipelineRequest) -> CacheKey {
        CacheKey::builder("run_pipeline")
            .with(request)
            .with(&self.registry.names())
            .with(&self.settings)
            .with(&self.min_nonzero_weeks)
            .with(&table.fingerprint())
            .finish()
    }

    /// Run the pipeline, reusing a cached outcome for identical inputs
    ///
    /// Errors are not cached.
    pub fn run(&self, table: &SalesTable, request: &PipelineRequest) -> Result<PipelineOutcome> {
        let key = self.cache_key(table, request);
        if let Some(outcome) = self.cache.get(&key) {
            debug!(product = %request.product, key = key.value(), "Pipeline cache hit");
            return Ok(outcome);
        }

        let outcome = run_pipeline(table, request, &self.registry, self.min_nonzero_weeks)?;
        self.cache.insert(key, outcome.clone());
        Ok(outcome)
    }
}
