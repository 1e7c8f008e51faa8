mod schema;
mod models;
mod loader;
mod cleaner;
mod joiner;
mod persister;
mod queries;
mod reporter;
mod pipeline;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info, warn};

use crate::pipeline::PipelineContext;
use crate::reporter::ChartOutcome;

#[derive(Parser)]
#[command(name = "bi-pipeline")]
struct Args {
    /// Directory holding the olist_*.csv inputs
    #[arg(long, env = "DATA_DIR", default_value = ".")]
    data_dir: PathBuf,

    #[arg(long, env = "DATABASE_URL", default_value = "ecommerce_analysis.db")]
    database_url: String,

    /// Where the chart images are written
    #[arg(long, env = "OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Abort when the stored row count differs from the rows written
    #[arg(long)]
    strict_verification: bool,

    /// Query and chart an existing store without reloading the CSVs
    #[arg(long)]
    skip_etl: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let ctx = PipelineContext {
        data_dir: args.data_dir,
        database_url: args.database_url,
        output_dir: args.output_dir,
        strict_verification: args.strict_verification,
        skip_etl: args.skip_etl,
    };

    let summary = match pipeline::run(&ctx) {
        Ok(summary) => summary,
        Err(e) => {
            error!("Pipeline halted: {}", e);
            return Err(e.into());
        }
    };

    if let Some(etl) = &summary.etl {
        info!(
            "ETL finished: {} orders read, {} delivered, {} fact rows ({} duplicates dropped), {} persisted",
            etl.cleaning.total,
            etl.cleaning.delivered,
            etl.fact_rows,
            etl.duplicates_removed,
            etl.persisted.written
        );
    }

    let failed_queries = [
        summary.analysis.monthly_revenue.is_failed(),
        summary.analysis.mean_delivery.is_failed(),
        summary.analysis.top_categories.is_failed(),
        summary.analysis.top_cities.is_failed(),
    ]
    .iter()
    .filter(|failed| **failed)
    .count();
    if failed_queries > 0 {
        warn!("{} of 4 queries failed", failed_queries);
    }

    for chart in [&summary.revenue_chart, &summary.categories_chart] {
        match chart {
            ChartOutcome::Saved(path) => info!("Chart available at {}", path.display()),
            ChartOutcome::Skipped(reason) => info!("Chart skipped: {}", reason),
            ChartOutcome::Failed(e) => warn!("Chart not produced: {}", e),
        }
    }

    info!("Pipeline completed");
    Ok(())
}
