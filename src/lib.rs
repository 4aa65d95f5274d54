//! # Demand Dashboard
//!
//! `demand_dashboard` renders the outputs of the `demand_forecast` pipeline as
//! plain-text tables for the command-line front end.
//!
//! ## Example
//!
//! ```
//! use demand_dashboard::format_metric;
//!
//! assert_eq!(format_metric(Some(12.3456)), "12.35");
//! assert_eq!(format_metric(None), "n/a");
//! ```

use demand_forecast::evaluator::ModelOutcome;
use demand_forecast::pipeline::PipelineOutcome;
use demand_forecast::report::{metrics_rows, model_display_name, result_rows};
use demand_forecast::session::ProductChoice;
use std::fmt::Write;

/// Formats a metric with two decimals, `n/a` when it is undefined.
///
/// # Examples
///
/// ```
/// use demand_dashboard::format_metric;
///
/// assert_eq!(format_metric(Some(-0.5)), "-0.50");
/// ```
pub fn format_metric(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.2}", v),
        None => "n/a".to_string(),
    }
}

/// Renders the per-model metrics table; the displayed model is marked with `>`.
pub fn render_metrics_table(outcome: &PipelineOutcome, displayed: Option<&str>) -> String {
    let rows = metrics_rows(outcome);
    let width = rows
        .iter()
        .map(|r| model_display_name(&r.model, outcome.best_model.as_deref()).len())
        .max()
        .unwrap_or(5)
        .max(5);

    let mut out = String::new();
    let _ = writeln!(
        out,
        "  {:<width$}  {:>10}  {:>10}  {:>10}  {:>10}",
        "Model",
        "RMSE",
        "MAPE (%)",
        "Bias",
        "MAD",
        width = width
    );
    for row in rows {
        let marker = if displayed == Some(row.model.as_str()) { '>' } else { ' ' };
        let _ = writeln!(
            out,
            "{} {:<width$}  {:>10}  {:>10}  {:>10}  {:>10}",
            marker,
            model_display_name(&row.model, outcome.best_model.as_deref()),
            format_metric(Some(row.rmse)),
            format_metric(row.mape),
            format_metric(Some(row.bias)),
            format_metric(Some(row.mad)),
            width = width
        );
    }
    for failure in outcome.report.failures() {
        let _ = writeln!(
            out,
            "  {:<width$}  failed: {}",
            failure.name,
            failure.reason,
            width = width
        );
    }
    out
}

/// Renders test actuals next to one model's forecast.
pub fn render_results_table(outcome: &PipelineOutcome, model: &ModelOutcome) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:<12}  {:>10}  {:>10}", "Date", "Actual", "Forecast");
    for row in result_rows(outcome, model) {
        let _ = writeln!(
            out,
            "{:<12}  {:>10.2}  {:>10.2}",
            row.date.to_string(),
            row.actual,
            row.forecast
        );
    }
    out
}

/// Renders the SKU picker, one labelled product per line.
pub fn render_products(choices: &[ProductChoice]) -> String {
    choices.iter().fold(String::new(), |mut out, choice| {
        let _ = writeln!(out, "{}", choice.label);
        out
    })
}
