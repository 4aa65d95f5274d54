//! Demand pattern classification (ADI / CV² quadrants)
//!
//! Products are placed in one of four demand quadrants by their average
//! demand interval and squared coefficient of variation, with a guard label
//! for products whose history is too thin to trust.

use crate::data::{SalesTable, ValueField};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::collections::BTreeMap;
use std::fmt;

/// ADI boundary between regular and intermittent demand
pub const ADI_THRESHOLD: f64 = 1.32;
/// CV² boundary between stable and volatile demand size
pub const CV2_THRESHOLD: f64 = 0.49;
/// Products with fewer non-zero rows than this are labelled `NA`
pub const MIN_NON_ZERO_ROWS: usize = 13;

/// Demand pattern label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DemandType {
    /// Too few non-zero observations
    #[serde(rename = "NA")]
    NotApplicable,
    Smooth,
    Intermittent,
    Erratic,
    Lumpy,
    Unknown,
}

impl DemandType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DemandType::NotApplicable => "NA",
            DemandType::Smooth => "smooth",
            DemandType::Intermittent => "intermittent",
            DemandType::Erratic => "erratic",
            DemandType::Lumpy => "lumpy",
            DemandType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for DemandType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Intermittency statistics of one product
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DemandStats {
    /// Average demand interval: rows per non-zero row
    pub adi: f64,
    /// Squared coefficient of variation, population standard deviation
    pub cv2: f64,
    /// Rows with a positive value
    pub non_zero_count: usize,
}

impl DemandStats {
    /// Compute the statistics over one product's values
    ///
    /// CV² is 0 when the mean is exactly 0 and whenever the ratio is undefined
    /// (empty input or non-finite values).
    pub fn from_values(values: &[f64]) -> Self {
        let non_zero_count = values.iter().filter(|v| **v > 0.0).count();
        let adi = values.len() as f64 / non_zero_count.max(1) as f64;

        let mean = values.iter().mean();
        let cv2 = if mean == 0.0 {
            0.0
        } else {
            let ratio = values.iter().population_std_dev() / mean;
            let cv2 = ratio * ratio;
            if cv2.is_nan() {
                0.0
            } else {
                cv2
            }
        };

        Self {
            adi,
            cv2,
            non_zero_count,
        }
    }

    /// Label for these statistics; the first matching rule wins
    pub fn classify(&self) -> DemandType {
        let regular = self.adi <= ADI_THRESHOLD;
        let stable = self.cv2 <= CV2_THRESHOLD;

        if self.non_zero_count < MIN_NON_ZERO_ROWS {
            DemandType::NotApplicable
        } else if regular && stable {
            DemandType::Smooth
        } else if self.adi > ADI_THRESHOLD && stable {
            DemandType::Intermittent
        } else if regular && self.cv2 > CV2_THRESHOLD {
            DemandType::Erratic
        } else if self.adi > ADI_THRESHOLD && self.cv2 > CV2_THRESHOLD {
            DemandType::Lumpy
        } else {
            DemandType::Unknown
        }
    }
}

/// ADI / CV² statistics for every product in the table
pub fn demand_stats(table: &SalesTable, field: ValueField) -> BTreeMap<String, DemandStats> {
    let mut grouped: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for record in table.records() {
        grouped
            .entry(record.product.clone())
            .or_default()
            .push(record.value(field));
    }

    grouped
        .into_iter()
        .map(|(product, values)| (product, DemandStats::from_values(&values)))
        .collect()
}

/// Demand type for every product in the table
pub fn determine_demand_type(
    table: &SalesTable,
    field: ValueField,
) -> BTreeMap<String, DemandType> {
    demand_stats(table, field)
        .into_iter()
        .map(|(product, stats)| (product, stats.classify()))
        .collect()
}

/// SKU label decorated with its demand type, e.g. `PRODUCT_7 (lumpy)`
pub fn display_name(product: &str, demand_type: Option<DemandType>) -> String {
    match demand_type {
        Some(kind) => format!("{} ({})", product, kind),
        None => product.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_constant_values_have_zero_cv2() {
        let stats = DemandStats::from_values(&[4.0; 20]);
        assert_eq!(stats.cv2, 0.0);
        assert_eq!(stats.adi, 1.0);
        assert_eq!(stats.non_zero_count, 20);

        let zeros = DemandStats::from_values(&[0.0; 20]);
        assert_eq!(zeros.cv2, 0.0);
        assert_eq!(zeros.adi, 20.0);
    }

    #[test]
    fn test_population_std_is_used() {
        // population std of [1, 3] is 1, mean 2 -> cv2 = 0.25
        let stats = DemandStats::from_values(&[1.0, 3.0]);
        assert_approx_eq!(stats.cv2, 0.25);
    }

    #[test]
    fn test_empty_values() {
        let stats = DemandStats::from_values(&[]);
        assert_eq!(stats.cv2, 0.0);
        assert_eq!(stats.adi, 0.0);
        assert_eq!(stats.classify(), DemandType::NotApplicable);
    }

    #[test]
    fn test_display_name() {
        assert_eq!(display_name("P1", Some(DemandType::Lumpy)), "P1 (lumpy)");
        assert_eq!(display_name("P1", Some(DemandType::NotApplicable)), "P1 (NA)");
        assert_eq!(display_name("P1", None), "P1");
    }
}
