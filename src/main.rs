use std::path::PathBuf;

use anyhow::{bail, Context};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use demand_dashboard::{render_metrics_table, render_products, render_results_table};
use demand_forecast::config::DashboardConfig;
use demand_forecast::data::ValueField;
use demand_forecast::report::{export_csv, write_json};
use demand_forecast::session::DashboardSession;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "demand_dashboard")]
#[command(about = "Weekly SKU demand forecast evaluation", long_about = None)]
struct Cli {
    /// JSON configuration file; flags below override its fields
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Sales CSV export
    #[arg(long, global = true)]
    data: Option<PathBuf>,
    /// Allowed shipping plant codes
    #[arg(long, global = true, value_delimiter = ',')]
    locations: Option<Vec<String>>,
    /// Allowed shipment-method prefixes
    #[arg(long, global = true, value_delimiter = ',')]
    shipment: Option<Vec<String>>,
    /// QUANTITY or TOTAL_SALES
    #[arg(long, global = true)]
    value_field: Option<ValueField>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List products under the current filters with their demand type
    Products,
    /// Evaluate every model for one SKU
    Evaluate {
        #[arg(long)]
        sku: String,
        /// Train on weeks before this date (YYYY-MM-DD); defaults to 90 days before the last week
        #[arg(long)]
        split_date: Option<NaiveDate>,
        /// Model whose forecast is shown; defaults to the best model
        #[arg(long)]
        model: Option<String>,
        /// Directory to write the metrics and results CSV files into
        #[arg(long)]
        export: Option<PathBuf>,
        /// File to write the full outcome to as JSON
        #[arg(long)]
        json: Option<PathBuf>,
    },
}

fn load_config(cli: &Cli) -> anyhow::Result<DashboardConfig> {
    let mut config = match &cli.config {
        Some(path) => DashboardConfig::from_json_file(path)
            .with_context(|| format!("failed to read config {}", path.display()))?,
        None => DashboardConfig::default(),
    };

    if let Some(data) = &cli.data {
        config.data_path = data.clone();
    }
    if let Some(locations) = &cli.locations {
        config.locations = locations.clone();
    }
    if let Some(shipment) = &cli.shipment {
        config.shipment_methods = shipment.clone();
    }
    if let Some(field) = cli.value_field {
        config.value_field = field;
    }
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let path = config.data_path.clone();
    let mut session = DashboardSession::open(config)
        .with_context(|| format!("failed to load sales data from {}", path.display()))?;

    match cli.command {
        Commands::Products => {
            print!("{}", render_products(&session.product_choices()));
        }
        Commands::Evaluate {
            sku,
            split_date,
            model,
            export,
            json,
        } => {
            session.select_product(&sku);
            session.set_split_date(split_date);
            session.select_model(model.as_deref());

            let outcome = match session.run() {
                Ok(outcome) => outcome,
                Err(e) if e.is_usage_condition() => {
                    eprintln!("{}", e);
                    std::process::exit(2);
                }
                Err(e) => return Err(e).context("forecast evaluation failed"),
            };

            println!("Forecast accuracy metrics for product {}", outcome.display_name);
            println!(
                "Split at {} ({} training weeks, {} test weeks)\n",
                outcome.split.split_date,
                outcome.split.train.len(),
                outcome.split.test.len()
            );

            let displayed = session.displayed_model(&outcome);
            if let (Some(name), None) = (model.as_deref(), displayed) {
                bail!("model '{}' produced no forecast", name);
            }
            print!(
                "{}",
                render_metrics_table(&outcome, displayed.map(|m| m.name.as_str()))
            );

            if let Some(shown) = displayed {
                println!("\nForecasting results for product {} ({})", outcome.product, shown.name);
                print!("{}", render_results_table(&outcome, shown));
            }

            if let Some(dir) = export {
                let files = export_csv(&outcome, displayed, &dir)
                    .with_context(|| format!("failed to export tables to {}", dir.display()))?;
                info!(metrics = %files.metrics.display(), "Tables exported");
            }
            if let Some(path) = json {
                write_json(&outcome, &path)
                    .with_context(|| format!("failed to write {}", path.display()))?;
                info!(path = %path.display(), "Outcome written as JSON");
            }
        }
    }

    Ok(())
}
