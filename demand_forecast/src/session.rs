//! Operator session state
//!
//! A [`DashboardSession`] owns the loaded table and the operator's current
//! choices. It is passed explicitly to whatever drives it; nothing in the
//! library reads global state.

use crate::config::DashboardConfig;
use crate::data::{DataLoader, SalesFilter, SalesTable, ValueField};
use crate::demand::{determine_demand_type, display_name, DemandType};
use crate::error::{ForecastError, Result};
use crate::evaluator::ModelOutcome;
use crate::pipeline::{weekly_series, ForecastPipeline, PipelineOutcome, PipelineRequest};
use crate::weekly::SplitBounds;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::info;

/// SKU entry for a product picker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductChoice {
    pub product: String,
    pub demand_type: Option<DemandType>,
    /// `"<SKU> (<demand type>)"`
    pub label: String,
}

/// Loaded data plus the operator's current selections
#[derive(Debug)]
pub struct DashboardSession {
    config: DashboardConfig,
    table: SalesTable,
    pipeline: ForecastPipeline,
    filter: SalesFilter,
    value_field: ValueField,
    product: Option<String>,
    split_date: Option<NaiveDate>,
    /// Model shown in the results view; `None` follows the best model
    selected_model: Option<String>,
}

impl DashboardSession {
    /// Start a session over an already loaded table
    pub fn new(config: DashboardConfig, table: SalesTable) -> Self {
        let pipeline = ForecastPipeline::new(&config);
        Self::with_pipeline(config, table, pipeline)
    }

    /// Start a session with a custom pipeline (model set or cache backend)
    pub fn with_pipeline(
        config: DashboardConfig,
        table: SalesTable,
        pipeline: ForecastPipeline,
    ) -> Self {
        Self {
            filter: config.default_filter(),
            value_field: config.value_field,
            config,
            table,
            pipeline,
            product: None,
            split_date: None,
            selected_model: None,
        }
    }

    /// Load the configured CSV and start a session
    pub fn open(config: DashboardConfig) -> Result<Self> {
        config.validate()?;
        let table = DataLoader::from_csv(&config.data_path)?;
        info!(rows = table.len(), "Session opened");
        Ok(Self::new(config, table))
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn table(&self) -> &SalesTable {
        &self.table
    }

    pub fn filter(&self) -> &SalesFilter {
        &self.filter
    }

    pub fn value_field(&self) -> ValueField {
        self.value_field
    }

    pub fn product(&self) -> Option<&str> {
        self.product.as_deref()
    }

    pub fn split_date(&self) -> Option<NaiveDate> {
        self.split_date
    }

    pub fn set_filter(&mut self, filter: SalesFilter) {
        self.filter = filter;
    }

    pub fn set_value_field(&mut self, field: ValueField) {
        self.value_field = field;
    }

    /// Choose a SKU; the split date and model choice are reset
    pub fn select_product(&mut self, product: &str) {
        self.product = Some(product.to_string());
        self.split_date = None;
        self.selected_model = None;
    }

    /// Override the split date; `None` restores the default
    pub fn set_split_date(&mut self, date: Option<NaiveDate>) {
        self.split_date = date;
    }

    /// Show a specific model in the results view; `None` follows the best model
    pub fn select_model(&mut self, model: Option<&str>) {
        self.selected_model = model.map(str::to_string);
    }

    /// Products remaining after the current filter, labelled with their demand type
    pub fn product_choices(&self) -> Vec<ProductChoice> {
        let filtered = self.filter.apply(&self.table);
        let types = determine_demand_type(&filtered, self.value_field);
        filtered
            .products()
            .into_iter()
            .map(|product| {
                let demand_type = types.get(&product).copied();
                ProductChoice {
                    label: display_name(&product, demand_type),
                    demand_type,
                    product,
                }
            })
            .collect()
    }

    /// Demand type of every product under the current filter
    pub fn demand_types(&self) -> BTreeMap<String, DemandType> {
        determine_demand_type(&self.filter.apply(&self.table), self.value_field)
    }

    fn request(&self) -> Result<PipelineRequest> {
        let product = self.product.as_deref().ok_or_else(|| {
            ForecastError::InvalidParameter("No product selected".to_string())
        })?;
        let mut request = PipelineRequest::new(product, self.value_field, self.filter.clone());
        request.split_date = self.split_date;
        Ok(request)
    }

    /// Split-date range for the selected product under the current filter
    pub fn split_bounds(&self) -> Result<Option<SplitBounds>> {
        Ok(weekly_series(&self.table, &self.request()?).split_bounds())
    }

    /// Run the pipeline for the current selections
    pub fn run(&self) -> Result<PipelineOutcome> {
        self.pipeline.run(&self.table, &self.request()?)
    }

    /// Outcome shown in the results view: the operator's model or the best one
    pub fn displayed_model<'a>(&self, outcome: &'a PipelineOutcome) -> Option<&'a ModelOutcome> {
        match &self.selected_model {
            Some(name) => outcome.report.get(name),
            None => outcome.best_outcome(),
        }
    }
}
