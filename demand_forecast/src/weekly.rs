//! Weekly demand series: aggregation and train/test partitioning
//!
//! Records are bucketed into weeks that end on Monday. A date belongs to the
//! Monday on or after it, so a Monday order closes its own week and a
//! Tuesday order lands in the following Monday's bucket.

use crate::data::{SalesTable, ValueField};
use crate::error::{ForecastError, Result};
use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Days before the last week used as the default split point
pub const DEFAULT_TEST_DAYS: i64 = 90;

/// Week-ending (Monday) label for a date
pub fn week_ending(date: NaiveDate) -> NaiveDate {
    let offset = (7 - date.weekday().num_days_from_monday()) % 7;
    date + Duration::days(offset as i64)
}

/// Ordered, gap-free weekly series for one product and one value field
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct WeeklySeries {
    dates: Vec<NaiveDate>,
    values: Vec<f64>,
}

impl WeeklySeries {
    /// Create a series from aligned dates and values
    ///
    /// Dates must be strictly increasing and exactly seven days apart.
    pub fn new(dates: Vec<NaiveDate>, values: Vec<f64>) -> Result<Self> {
        if dates.len() != values.len() {
            return Err(ForecastError::ValidationError(format!(
                "Dates length ({}) doesn't match values length ({})",
                dates.len(),
                values.len()
            )));
        }
        if let Some(pair) = dates.windows(2).find(|w| w[1] - w[0] != Duration::days(7)) {
            return Err(ForecastError::ValidationError(format!(
                "Weekly series dates must be 7 days apart, found {} then {}",
                pair[0], pair[1]
            )));
        }

        Ok(Self { dates, values })
    }

    /// Consecutive weeks starting at `start`
    pub fn from_values(start: NaiveDate, values: Vec<f64>) -> Self {
        let dates = (0..values.len())
            .map(|i| start + Duration::weeks(i as i64))
            .collect();
        Self { dates, values }
    }

    /// Week-ending dates
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Weekly values
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Iterate over `(date, value)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.dates.iter().copied().zip(self.values.iter().copied())
    }

    /// Number of weeks
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the series is empty
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    /// Weeks whose value is non-zero
    pub fn non_zero_count(&self) -> usize {
        self.values.iter().filter(|v| **v != 0.0).count()
    }

    /// Same dates with replacement values
    pub fn with_values(&self, values: Vec<f64>) -> Result<Self> {
        Self::new(self.dates.clone(), values)
    }

    /// Partition at `split_date`: train is strictly before it, test is on or after it
    pub fn split_at(&self, split_date: NaiveDate) -> TrainTestSplit {
        let cut = self.dates.partition_point(|d| *d < split_date);
        TrainTestSplit {
            split_date,
            train: WeeklySeries {
                dates: self.dates[..cut].to_vec(),
                values: self.values[..cut].to_vec(),
            },
            test: WeeklySeries {
                dates: self.dates[cut..].to_vec(),
                values: self.values[cut..].to_vec(),
            },
        }
    }

    /// Admissible split range and default split date, `None` for an empty series
    pub fn split_bounds(&self) -> Option<SplitBounds> {
        let first = self.first_date()?;
        let last = self.last_date()?;
        let default = (last - Duration::days(DEFAULT_TEST_DAYS)).max(first);
        Some(SplitBounds {
            first,
            last,
            default,
        })
    }
}

/// Range the split date may be chosen from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SplitBounds {
    pub first: NaiveDate,
    pub last: NaiveDate,
    /// 90 days before the last week, clamped to the first week
    pub default: NaiveDate,
}

/// Disjoint, date-ordered train and test partitions of one series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainTestSplit {
    pub split_date: NaiveDate,
    pub train: WeeklySeries,
    pub test: WeeklySeries,
}

impl TrainTestSplit {
    /// Either side has no points
    pub fn is_degenerate(&self) -> bool {
        self.train.is_empty() || self.test.is_empty()
    }
}

/// Aggregate one product's records into a Monday-anchored weekly series
///
/// Rows without an order date are ignored. Every week between the first and
/// last observed week is present; weeks without orders hold 0.
pub fn aggregate_weekly(table: &SalesTable, product: &str, field: ValueField) -> WeeklySeries {
    let mut buckets: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for record in table.product_records(product) {
        if let Some(date) = record.order_date {
            *buckets.entry(week_ending(date)).or_insert(0.0) += record.value(field);
        }
    }

    let (Some(&first), Some(&last)) = (buckets.keys().next(), buckets.keys().next_back()) else {
        debug!(product, "No dated records for product");
        return WeeklySeries::default();
    };

    let weeks = ((last - first).num_days() / 7 + 1) as usize;
    let dates: Vec<NaiveDate> = (0..weeks)
        .map(|i| first + Duration::weeks(i as i64))
        .collect();
    let values = dates
        .iter()
        .map(|d| buckets.get(d).copied().unwrap_or(0.0))
        .collect();

    debug!(product, weeks, field = %field, "Aggregated weekly series");
    WeeklySeries { dates, values }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::SalesRecord;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_week_ending_is_monday_on_or_after() {
        // 2024-01-01 is a Monday
        assert_eq!(week_ending(date(2024, 1, 1)), date(2024, 1, 1));
        assert_eq!(week_ending(date(2024, 1, 2)), date(2024, 1, 8));
        assert_eq!(week_ending(date(2024, 1, 7)), date(2024, 1, 8));
    }

    #[test]
    fn test_aggregate_sums_and_fills_gaps() {
        let table = SalesTable::new(vec![
            SalesRecord::new("A", date(2024, 1, 2), 3.0, 30.0),
            SalesRecord::new("A", date(2024, 1, 5), 2.0, 20.0),
            SalesRecord::new("B", date(2024, 1, 5), 9.0, 90.0),
            SalesRecord::new("A", date(2024, 1, 29), 4.0, 40.0),
        ]);

        let series = aggregate_weekly(&table, "A", ValueField::Quantity);
        assert_eq!(series.first_date(), Some(date(2024, 1, 8)));
        assert_eq!(series.last_date(), Some(date(2024, 1, 29)));
        assert_eq!(series.values(), &[5.0, 0.0, 0.0, 4.0]);

        let sales = aggregate_weekly(&table, "A", ValueField::TotalSales);
        assert_eq!(sales.values(), &[50.0, 0.0, 0.0, 40.0]);
    }

    #[test]
    fn test_unknown_product_is_empty() {
        let table = SalesTable::new(vec![SalesRecord::new("A", date(2024, 1, 2), 1.0, 1.0)]);
        assert!(aggregate_weekly(&table, "Z", ValueField::Quantity).is_empty());
    }

    #[test]
    fn test_new_rejects_irregular_dates() {
        let dates = vec![date(2024, 1, 1), date(2024, 1, 9)];
        assert!(WeeklySeries::new(dates, vec![1.0, 2.0]).is_err());
        assert!(WeeklySeries::new(vec![date(2024, 1, 1)], vec![]).is_err());
    }

    #[test]
    fn test_split_bounds_default() {
        let series = WeeklySeries::from_values(date(2024, 1, 1), vec![1.0; 30]);
        let bounds = series.split_bounds().unwrap();
        assert_eq!(bounds.last, date(2024, 1, 1) + Duration::weeks(29));
        assert_eq!(bounds.default, bounds.last - Duration::days(90));

        let short = WeeklySeries::from_values(date(2024, 1, 1), vec![1.0; 3]);
        assert_eq!(short.split_bounds().unwrap().default, date(2024, 1, 1));
        assert!(WeeklySeries::default().split_bounds().is_none());
    }

    #[test]
    fn test_split_partitions_series_at_any_date() {
        let start = date(2024, 1, 1);
        let values: Vec<f64> = (0..20).map(|i| (i * 3 % 7) as f64).collect();
        let series = WeeklySeries::from_values(start, values);
        let last = series.last_date().unwrap();

        // Every third day, so mid-week dates are covered
        let mut split = start - Duration::days(30);
        while split <= last + Duration::days(30) {
            let parts = series.split_at(split);

            let dates: Vec<NaiveDate> = parts
                .train
                .dates()
                .iter()
                .chain(parts.test.dates())
                .copied()
                .collect();
            let values: Vec<f64> = parts
                .train
                .values()
                .iter()
                .chain(parts.test.values())
                .copied()
                .collect();
            assert_eq!(dates, series.dates(), "split at {}", split);
            assert_eq!(values, series.values(), "split at {}", split);

            assert!(parts.train.dates().iter().all(|d| *d < split));
            assert!(parts.test.dates().iter().all(|d| *d >= split));

            split += Duration::days(3);
        }
    }

    #[test]
    fn test_split_outside_range_empties_one_side() {
        let series = WeeklySeries::from_values(date(2024, 1, 1), vec![2.0; 10]);

        let early = series.split_at(date(2023, 12, 1));
        assert!(early.train.is_empty());
        assert_eq!(early.test, series);
        assert!(early.is_degenerate());

        let late = series.split_at(series.last_date().unwrap() + Duration::days(1));
        assert!(late.test.is_empty());
        assert_eq!(late.train, series);
        assert!(late.is_degenerate());

        // The first week itself belongs to test
        let at_first = series.split_at(date(2024, 1, 1));
        assert!(at_first.train.is_empty());
        assert_eq!(at_first.test.len(), 10);
    }
}
