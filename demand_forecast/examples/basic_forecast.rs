use chrono::{Duration, NaiveDate};
use demand_forecast::config::DashboardConfig;
use demand_forecast::data::{SalesRecord, SalesTable, ValueField};
use demand_forecast::demand::determine_demand_type;
use demand_forecast::pipeline::{ForecastPipeline, PipelineRequest};
use demand_forecast::report::model_display_name;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Demand Forecast: Basic Forecasting Example");
    println!("==========================================\n");

    // Create sample data
    println!("Creating sample sales data...");
    let table = create_sample_sales();
    println!("Sample data created: {} order lines\n", table.len());

    let config = DashboardConfig::default();
    let filter = config.default_filter();

    // Classify demand for every product
    println!("Demand types:");
    for (product, kind) in determine_demand_type(&filter.apply(&table), ValueField::Quantity) {
        println!("  {}: {}", product, kind);
    }

    // Evaluate every model for one SKU on the default split
    println!("\nEvaluating models for SKU-100...");
    let pipeline = ForecastPipeline::new(&config);
    let request = PipelineRequest::new("SKU-100", ValueField::Quantity, filter);
    let outcome = pipeline.run(&table, &request)?;

    println!(
        "Split at {}: {} training weeks, {} test weeks\n",
        outcome.split.split_date,
        outcome.split.train.len(),
        outcome.split.test.len()
    );

    for model in outcome.report.outcomes() {
        println!(
            "{:<32} {}",
            model_display_name(&model.name, outcome.best_model.as_deref()),
            model.metrics
        );
    }
    for failure in outcome.report.failures() {
        println!("{:<32} failed: {}", failure.name, failure.reason);
    }

    if let Some(best) = outcome.best_outcome() {
        println!("\nActual vs forecast ({}):", best.name);
        for ((date, actual), forecast) in outcome.split.test.iter().zip(best.forecast.values()) {
            println!("  {}  {:>8.1}  {:>8.1}", date, actual, forecast);
        }
    }

    Ok(())
}

/// Two years of weekly orders with a quarterly cycle across two plants
fn create_sample_sales() -> SalesTable {
    let start = NaiveDate::from_ymd_opt(2022, 1, 4).unwrap_or_default();
    let mut records = Vec::new();

    for week in 0..104i64 {
        let phase = (week % 13) as f64 / 13.0 * std::f64::consts::TAU;
        let quantity = (30.0 + 10.0 * phase.sin() + 0.1 * week as f64).round();
        records.push(
            SalesRecord::new("SKU-100", start + Duration::weeks(week), quantity, quantity * 4.2)
                .with_location("2")
                .with_shipment_method("WILL CALL")
                .with_product_info("Hardware", "Anchor bolt"),
        );

        // A slow mover ordered every fourth week
        if week % 4 == 0 {
            let ordered = start + Duration::weeks(week) + Duration::days(2);
            records.push(
                SalesRecord::new("SKU-200", ordered, 3.0, 90.0)
                    .with_location("15")
                    .with_shipment_method("UPS GROUND"),
            );
        }
    }

    SalesTable::new(records)
}
