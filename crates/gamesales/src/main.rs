use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use comfy_table::Table;
use gamesales_core::{config::PipelineConfig, context::ExecutionContext, pipeline, pipeline::RunSummary};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Game sales batch ETL: builds the sales fact table and its aggregated views", long_about = None)]
struct Cli {
    /// TOML file with pipeline settings
    #[arg(long)]
    config: Option<PathBuf>,
    /// Directory holding games.csv, sales.csv, customers.csv and stores.csv
    #[arg(long)]
    input_dir: Option<PathBuf>,
    /// Directory receiving the Parquet outputs
    #[arg(long)]
    output_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    let cli = Cli::parse();
    let config = resolve_config(&cli)?;

    let ctx = ExecutionContext::start(config);
    let summary = pipeline::run(&ctx).context("pipeline run failed")?;
    ctx.finish();

    info!(summary = %serde_json::to_string(&summary)?, "run summary");
    print_summary(&summary);
    Ok(())
}

fn resolve_config(cli: &Cli) -> Result<PipelineConfig> {
    dotenvy::dotenv().ok();

    let mut config = match &cli.config {
        Some(path) => PipelineConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => PipelineConfig::default(),
    };

    if let Ok(dir) = env::var("GAMESALES_INPUT_DIR") {
        config.input_dir = PathBuf::from(dir);
    }
    if let Ok(dir) = env::var("GAMESALES_OUTPUT_DIR") {
        config.output_dir = PathBuf::from(dir);
    }
    if let Some(dir) = &cli.input_dir {
        config.input_dir = dir.clone();
    }
    if let Some(dir) = &cli.output_dir {
        config.output_dir = dir.clone();
    }

    Ok(config)
}

fn print_summary(summary: &RunSummary) {
    println!(
        "Sources: {} games, {} sales, {} customers, {} stores",
        summary.sources.games,
        summary.sources.sales,
        summary.sources.customers,
        summary.sources.stores
    );
    println!("Enriched sales: {}", summary.enriched_sales);
    if summary.unresolved_store_sales > 0 {
        println!(
            "Store sales without a matching store: {}",
            summary.unresolved_store_sales
        );
    }

    let mut table = Table::new();
    table.set_header(vec!["Table", "Rows", "Bytes", "Path"]);
    for output in &summary.outputs {
        table.add_row(vec![
            output.table.to_string(),
            output.rows.to_string(),
            output.bytes.to_string(),
            output.path.display().to_string(),
        ]);
    }
    println!("{table}");
}
