//! Sales record loading and filtering

use crate::error::{ForecastError, Result};
use chrono::{NaiveDate, NaiveDateTime};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::collections::HashSet;
use std::fmt;
use std::fs::File;
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

/// Column holding the product identifier (SKU)
pub const PRODUCT_COLUMN: &str = "PRODUCT";
/// Column holding the product category
pub const CATEGORY_COLUMN: &str = "PROD_CAT";
/// Column holding the product description
pub const DESCRIPTION_COLUMN: &str = "PRODUCT_DESCRIPTION";
/// Column holding the shipping plant (location) code
pub const LOCATION_COLUMN: &str = "SHIPPING_PLANT";
/// Column holding the shipment method
pub const SHIPMENT_COLUMN: &str = "SHIP_VIA_TYPE";
/// Column holding the order date
pub const ORDER_DATE_COLUMN: &str = "ORDER_DATE";
/// Column holding the ordered quantity
pub const QUANTITY_COLUMN: &str = "QUANTITY";
/// Column holding the total sales amount
pub const TOTAL_SALES_COLUMN: &str = "TOTAL_SALES";

/// Which numeric field of a sales record is aggregated and forecast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ValueField {
    /// Units ordered
    #[default]
    #[serde(rename = "QUANTITY")]
    Quantity,
    /// Sales amount
    #[serde(rename = "TOTAL_SALES")]
    TotalSales,
}

impl ValueField {
    /// Column name the field is read from
    pub fn column(&self) -> &'static str {
        match self {
            ValueField::Quantity => QUANTITY_COLUMN,
            ValueField::TotalSales => TOTAL_SALES_COLUMN,
        }
    }
}

impl fmt::Display for ValueField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for ValueField {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            QUANTITY_COLUMN => Ok(ValueField::Quantity),
            TOTAL_SALES_COLUMN => Ok(ValueField::TotalSales),
            other => Err(ForecastError::InvalidParameter(format!(
                "Unknown value field '{}', expected QUANTITY or TOTAL_SALES",
                other
            ))),
        }
    }
}

/// One transaction line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesRecord {
    /// Product identifier (SKU)
    pub product: String,
    /// Product category
    pub category: Option<String>,
    /// Product description
    pub description: Option<String>,
    /// Shipping plant code, normalised (`2.0` becomes `"2"`)
    pub location: Option<String>,
    /// Shipment method
    pub shipment_method: Option<String>,
    /// Order date; `None` when the source value could not be parsed
    pub order_date: Option<NaiveDate>,
    /// Units ordered
    pub quantity: f64,
    /// Sales amount
    pub total_sales: f64,
}

impl SalesRecord {
    /// Create a record with only the fields the pipeline needs
    pub fn new(product: &str, order_date: NaiveDate, quantity: f64, total_sales: f64) -> Self {
        Self {
            product: product.to_string(),
            category: None,
            description: None,
            location: None,
            shipment_method: None,
            order_date: Some(order_date),
            quantity,
            total_sales,
        }
    }

    /// Set the shipping plant code
    pub fn with_location(mut self, location: &str) -> Self {
        self.location = normalize_location(location);
        self
    }

    /// Set the shipment method
    pub fn with_shipment_method(mut self, method: &str) -> Self {
        self.shipment_method = Some(method.to_string());
        self
    }

    /// Set category and description
    pub fn with_product_info(mut self, category: &str, description: &str) -> Self {
        self.category = Some(category.to_string());
        self.description = Some(description.to_string());
        self
    }

    /// Value of the selected numeric field
    pub fn value(&self, field: ValueField) -> f64 {
        match field {
            ValueField::Quantity => self.quantity,
            ValueField::TotalSales => self.total_sales,
        }
    }

    fn hash_into<H: Hasher>(&self, state: &mut H) {
        self.product.hash(state);
        self.category.hash(state);
        self.description.hash(state);
        self.location.hash(state);
        self.shipment_method.hash(state);
        self.order_date.hash(state);
        self.quantity.to_bits().hash(state);
        self.total_sales.to_bits().hash(state);
    }
}

/// Category and description of a product
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductInfo {
    pub category: Option<String>,
    pub description: Option<String>,
}

/// Location and shipment-method restrictions chosen by the operator
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SalesFilter {
    /// Allowed shipping plant codes (exact match)
    pub locations: Vec<String>,
    /// Allowed shipment-method prefixes
    pub shipment_methods: Vec<String>,
}

impl SalesFilter {
    pub fn new(locations: Vec<String>, shipment_methods: Vec<String>) -> Self {
        Self {
            locations,
            shipment_methods,
        }
    }

    /// Restrict a table to the allowed locations and shipment methods
    ///
    /// Rows with a missing location or a missing order date are dropped.
    pub fn apply(&self, table: &SalesTable) -> SalesTable {
        let filtered = table
            .filter_locations(&self.locations)
            .filter_shipment_methods(&self.shipment_methods);
        let records: Vec<SalesRecord> = filtered
            .records
            .into_iter()
            .filter(|r| r.order_date.is_some())
            .collect();

        debug!(
            before = table.len(),
            after = records.len(),
            "Applied sales filter"
        );
        SalesTable::new(records)
    }
}

/// Immutable collection of sales records
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SalesTable {
    records: Vec<SalesRecord>,
}

impl SalesTable {
    pub fn new(records: Vec<SalesRecord>) -> Self {
        Self { records }
    }

    /// All records, in load order
    pub fn records(&self) -> &[SalesRecord] {
        &self.records
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Keep rows whose location is one of `codes`; rows without a location are dropped
    pub fn filter_locations<S: AsRef<str>>(&self, codes: &[S]) -> SalesTable {
        let allowed: HashSet<&str> = codes.iter().map(|c| c.as_ref().trim()).collect();
        self.retain(|r| {
            r.location
                .as_deref()
                .map(|loc| allowed.contains(loc))
                .unwrap_or(false)
        })
    }

    /// Keep rows whose shipment method starts with one of `prefixes`
    pub fn filter_shipment_methods<S: AsRef<str>>(&self, prefixes: &[S]) -> SalesTable {
        self.retain(|r| {
            r.shipment_method
                .as_deref()
                .map(|method| prefixes.iter().any(|p| method.starts_with(p.as_ref())))
                .unwrap_or(false)
        })
    }

    fn retain<F: Fn(&SalesRecord) -> bool>(&self, keep: F) -> SalesTable {
        SalesTable::new(self.records.iter().filter(|r| keep(r)).cloned().collect())
    }

    /// Distinct product identifiers in order of first appearance
    pub fn products(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.records
            .iter()
            .filter(|r| seen.insert(r.product.as_str()))
            .map(|r| r.product.clone())
            .collect()
    }

    /// Records belonging to one product
    pub fn product_records<'a>(
        &'a self,
        product: &'a str,
    ) -> impl Iterator<Item = &'a SalesRecord> {
        self.records.iter().filter(move |r| r.product == product)
    }

    /// Category and description of the first record for `product`
    pub fn product_info(&self, product: &str) -> Option<ProductInfo> {
        self.product_records(product).next().map(|r| ProductInfo {
            category: r.category.clone(),
            description: r.description.clone(),
        })
    }

    /// Stable hash of the full table content, used as a cache key component
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.records.len().hash(&mut hasher);
        for record in &self.records {
            record.hash_into(&mut hasher);
        }
        hasher.finish()
    }
}

/// Data loader for sales CSV exports
#[derive(Debug)]
pub struct DataLoader;

impl DataLoader {
    /// Load sales records from a CSV file
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<SalesTable> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let df = CsvReader::new(file)
            .infer_schema(None)
            .has_header(true)
            .finish()?;

        let table = Self::from_dataframe(df)?;
        info!(path = %path.display(), rows = table.len(), "Loaded sales data");
        Ok(table)
    }

    /// Convert an existing DataFrame into sales records
    ///
    /// Every expected column must be present. Unparseable order dates become `None`.
    pub fn from_dataframe(df: DataFrame) -> Result<SalesTable> {
        let products = Self::text_column(&df, PRODUCT_COLUMN)?;
        let categories = Self::text_column(&df, CATEGORY_COLUMN)?;
        let descriptions = Self::text_column(&df, DESCRIPTION_COLUMN)?;
        let locations = Self::text_column(&df, LOCATION_COLUMN)?;
        let shipments = Self::text_column(&df, SHIPMENT_COLUMN)?;
        let dates = Self::text_column(&df, ORDER_DATE_COLUMN)?;
        let quantities = Self::numeric_column(&df, QUANTITY_COLUMN)?;
        let sales = Self::numeric_column(&df, TOTAL_SALES_COLUMN)?;

        let mut records = Vec::with_capacity(df.height());
        let mut unparsed_dates = 0usize;
        for i in 0..df.height() {
            let Some(product) = products[i].clone() else {
                continue;
            };
            let order_date = dates[i].as_deref().and_then(parse_order_date);
            if order_date.is_none() {
                unparsed_dates += 1;
            }

            records.push(SalesRecord {
                product,
                category: categories[i].clone(),
                description: descriptions[i].clone(),
                location: locations[i].as_deref().and_then(normalize_location),
                shipment_method: shipments[i].clone(),
                order_date,
                quantity: quantities[i].unwrap_or(0.0),
                total_sales: sales[i].unwrap_or(0.0),
            });
        }

        if unparsed_dates > 0 {
            debug!(count = unparsed_dates, "Rows with missing or unparseable order date");
        }

        Ok(SalesTable::new(records))
    }

    fn column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Series> {
        df.column(name).map_err(|e| {
            ForecastError::DataError(format!("Column '{}' not found: {}", name, e))
        })
    }

    /// Helper method to get a column as optional strings
    fn text_column(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
        let col = Self::column(df, name)?.cast(&DataType::Utf8)?;
        let values = col
            .utf8()?
            .into_iter()
            .map(|v| v.map(|s| s.to_string()))
            .collect();
        Ok(values)
    }

    /// Helper method to get a column as optional f64 values
    fn numeric_column(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
        let col = Self::column(df, name)?.cast(&DataType::Float64)?;
        let values = col.f64()?.into_iter().collect();
        Ok(values)
    }
}

/// Render a plant code the way operators type it
///
/// Numeric codes are truncated to an integer (`"2.0"` and `"2.5"` both become
/// `"2"`); anything else is kept as written.
pub fn normalize_location(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() => Some(format!("{}", v.trunc() as i64)),
        Ok(v) if v.is_nan() => None,
        _ => Some(trimmed.to_string()),
    }
}

/// Parse an order date; returns `None` for anything unparseable
pub fn parse_order_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .or_else(|_| {
            NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S").map(|dt| dt.date())
        })
        .or_else(|_| NaiveDate::parse_from_str(trimmed, "%m/%d/%Y"))
        .ok()
        .or_else(|| {
            trimmed
                .get(..10)
                .and_then(|head| NaiveDate::parse_from_str(head, "%Y-%m-%d").ok())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample_table() -> SalesTable {
        SalesTable::new(vec![
            SalesRecord::new("P1", date(2023, 1, 2), 5.0, 50.0)
                .with_location("2")
                .with_shipment_method("WILL CALL"),
            SalesRecord::new("P2", date(2023, 1, 3), 1.0, 10.0)
                .with_location("9.0")
                .with_shipment_method("UPS GROUND 2DAY"),
            SalesRecord::new("P1", date(2023, 1, 4), 2.0, 20.0)
                .with_location("15")
                .with_shipment_method("FEDEX"),
            SalesRecord::new("P3", date(2023, 1, 5), 2.0, 20.0).with_shipment_method("WILL CALL"),
        ])
    }

    #[test]
    fn test_normalize_location() {
        assert_eq!(normalize_location("2.0"), Some("2".to_string()));
        assert_eq!(normalize_location(" 15 "), Some("15".to_string()));
        assert_eq!(normalize_location("WH-A"), Some("WH-A".to_string()));
        assert_eq!(normalize_location(""), None);
        assert_eq!(normalize_location("NaN"), None);
        assert_eq!(normalize_location("2.5"), Some("2".to_string()));
        assert_eq!(normalize_location("-9.7"), Some("-9".to_string()));
    }

    #[test]
    fn test_parse_order_date() {
        assert_eq!(parse_order_date("2023-03-01"), Some(date(2023, 3, 1)));
        assert_eq!(parse_order_date("2023-03-01 10:15:00"), Some(date(2023, 3, 1)));
        assert_eq!(parse_order_date("03/01/2023"), Some(date(2023, 3, 1)));
        assert_eq!(parse_order_date("not a date"), None);
    }

    #[test]
    fn test_value_field_parsing() {
        assert_eq!("quantity".parse::<ValueField>().unwrap(), ValueField::Quantity);
        assert_eq!("TOTAL_SALES".parse::<ValueField>().unwrap(), ValueField::TotalSales);
        assert!("revenue".parse::<ValueField>().is_err());
        assert_eq!(ValueField::TotalSales.to_string(), "TOTAL_SALES");
    }

    #[test]
    fn test_filters() {
        let table = sample_table();

        let by_location = table.filter_locations(&["2", "9"]);
        assert_eq!(by_location.len(), 2);

        let by_method = table.filter_shipment_methods(&["WILL CALL", "UPS GROUND"]);
        assert_eq!(by_method.len(), 3);

        let filter = SalesFilter::new(
            vec!["2".into(), "9".into(), "15".into()],
            vec!["WILL CALL".into(), "UPS GROUND".into()],
        );
        let filtered = filter.apply(&table);
        assert_eq!(filtered.products(), vec!["P1".to_string(), "P2".to_string()]);
    }

    #[test]
    fn test_filter_drops_missing_dates() {
        let mut record = SalesRecord::new("P1", date(2023, 1, 2), 1.0, 1.0)
            .with_location("2")
            .with_shipment_method("WILL CALL");
        record.order_date = None;
        let table = SalesTable::new(vec![record]);

        let filter = SalesFilter::new(vec!["2".into()], vec!["WILL CALL".into()]);
        assert!(filter.apply(&table).is_empty());
    }

    #[test]
    fn test_fingerprint_tracks_content() {
        let table = sample_table();
        assert_eq!(table.fingerprint(), sample_table().fingerprint());

        let smaller = table.filter_locations(&["2"]);
        assert_ne!(table.fingerprint(), smaller.fingerprint());
    }
}
