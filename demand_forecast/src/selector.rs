//! Best-model selection by minimum MAPE

use crate::evaluator::EvaluationReport;

/// Name of the model with the lowest MAPE
///
/// Ties go to the model registered first. Models without a MAPE (every
/// actual was zero) are not eligible; `None` when no model is.
pub fn select_best_model<'a, I>(mape: I) -> Option<&'a str>
where
    I: IntoIterator<Item = (&'a str, Option<f64>)>,
{
    let mut best: Option<(&str, f64)> = None;
    for (name, value) in mape {
        let Some(value) = value.filter(|v| !v.is_nan()) else {
            continue;
        };
        if best.map_or(true, |(_, current)| value < current) {
            best = Some((name, value));
        }
    }
    best.map(|(name, _)| name)
}

/// Best model of an evaluation report
pub fn best_of_report(report: &EvaluationReport) -> Option<&str> {
    select_best_model(report.mape())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimum_wins_and_first_breaks_ties() {
        let mape = vec![("A", Some(12.0)), ("B", Some(9.5)), ("C", Some(9.5))];
        assert_eq!(select_best_model(mape), Some("B"));
    }

    #[test]
    fn test_undefined_mape_is_skipped() {
        let mape = vec![("A", None), ("B", Some(30.0))];
        assert_eq!(select_best_model(mape), Some("B"));
        assert_eq!(select_best_model(vec![("A", None)]), None);
        assert_eq!(select_best_model(Vec::<(&str, Option<f64>)>::new()), None);
    }
}
