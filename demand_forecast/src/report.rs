//! Metrics and results tables, with CSV and JSON export

use crate::error::Result;
use crate::evaluator::ModelOutcome;
use crate::pipeline::PipelineOutcome;
use chrono::NaiveDate;
use serde::Serialize;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// One row of the metrics table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsRow {
    #[serde(rename = "Model")]
    pub model: String,
    #[serde(rename = "RMSE")]
    pub rmse: f64,
    /// Empty when every actual was zero
    #[serde(rename = "MAPE")]
    pub mape: Option<f64>,
    #[serde(rename = "Bias")]
    pub bias: f64,
    #[serde(rename = "MAD")]
    pub mad: f64,
    #[serde(rename = "Best")]
    pub best: bool,
}

/// One row of the actual-versus-forecast table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRow {
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Actual")]
    pub actual: f64,
    #[serde(rename = "Forecast")]
    pub forecast: f64,
}

/// Model name as shown in a picker, marking the best model
pub fn model_display_name(model: &str, best_model: Option<&str>) -> String {
    if best_model == Some(model) {
        format!("{} (Best Model)", model)
    } else {
        model.to_string()
    }
}

/// Metrics of every successful model, in registration order
pub fn metrics_rows(outcome: &PipelineOutcome) -> Vec<MetricsRow> {
    outcome
        .report
        .outcomes()
        .iter()
        .map(|o| MetricsRow {
            model: o.name.clone(),
            rmse: o.metrics.rmse,
            mape: o.metrics.mape,
            bias: o.metrics.bias,
            mad: o.metrics.mad,
            best: outcome.best_model.as_deref() == Some(o.name.as_str()),
        })
        .collect()
}

/// Test actuals next to one model's forecast
pub fn result_rows(outcome: &PipelineOutcome, model: &ModelOutcome) -> Vec<ResultRow> {
    outcome
        .split
        .test
        .iter()
        .zip(model.forecast.values())
        .map(|((date, actual), forecast)| ResultRow {
            date,
            actual,
            forecast: *forecast,
        })
        .collect()
}

fn write_rows<W: Write, T: Serialize>(writer: W, rows: &[T]) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    for row in rows {
        csv.serialize(row)?;
    }
    csv.flush()?;
    Ok(())
}

/// Write the metrics table as CSV
pub fn write_metrics_csv<W: Write>(outcome: &PipelineOutcome, writer: W) -> Result<()> {
    write_rows(writer, &metrics_rows(outcome))
}

/// Write the results table of `model` as CSV
pub fn write_results_csv<W: Write>(
    outcome: &PipelineOutcome,
    model: &ModelOutcome,
    writer: W,
) -> Result<()> {
    write_rows(writer, &result_rows(outcome, model))
}

/// Files written by [`export_csv`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFiles {
    pub metrics: PathBuf,
    /// Absent when no model produced a forecast
    pub results: Option<PathBuf>,
}

/// Write `metrics_<sku>.csv` and `results_<sku>.csv` into `dir`
///
/// The results table holds `model`, or the best model when `model` is `None`.
pub fn export_csv<P: AsRef<Path>>(
    outcome: &PipelineOutcome,
    model: Option<&ModelOutcome>,
    dir: P,
) -> Result<ExportedFiles> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;
    let stem = sanitize(&outcome.product);

    let metrics = dir.join(format!("metrics_{}.csv", stem));
    write_metrics_csv(outcome, File::create(&metrics)?)?;

    let results = match model.or_else(|| outcome.best_outcome()) {
        Some(model) => {
            let path = dir.join(format!("results_{}.csv", stem));
            write_results_csv(outcome, model, File::create(&path)?)?;
            Some(path)
        }
        None => None,
    };

    info!(dir = %dir.display(), product = %outcome.product, "Exported tables");
    Ok(ExportedFiles { metrics, results })
}

/// Full outcome as pretty-printed JSON
pub fn to_json(outcome: &PipelineOutcome) -> Result<String> {
    Ok(serde_json::to_string_pretty(outcome)?)
}

/// Write the full outcome as JSON to `path`
pub fn write_json<P: AsRef<Path>>(outcome: &PipelineOutcome, path: P) -> Result<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, outcome)?;
    Ok(())
}

/// File-name-safe version of a SKU
fn sanitize(product: &str) -> String {
    product
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_display_name() {
        assert_eq!(
            model_display_name("Holt-Winters", Some("Holt-Winters")),
            "Holt-Winters (Best Model)"
        );
        assert_eq!(model_display_name("Holt-Winters", Some("Auto ARIMA")), "Holt-Winters");
        assert_eq!(model_display_name("Holt-Winters", None), "Holt-Winters");
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("SKU 12/A"), "SKU_12_A");
    }

    #[test]
    fn test_metrics_csv_header() {
        let mut buffer = Vec::new();
        write_rows(
            &mut buffer,
            &[MetricsRow {
                model: "A".to_string(),
                rmse: 1.5,
                mape: None,
                bias: 0.0,
                mad: 1.0,
                best: false,
            }],
        )
        .unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(text, "Model,RMSE,MAPE,Bias,MAD,Best\nA,1.5,,0.0,1.0,false\n");
    }
}
