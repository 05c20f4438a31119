mod common;

use anyhow::Result;
use polars::prelude::*;

use gamesales_core::config::PipelineConfig;
use gamesales_core::context::ExecutionContext;
use gamesales_core::error::PipelineError;
use gamesales_core::persistence::read_table;
use gamesales_core::pipeline::{self, build_fact_table};
use gamesales_core::tables::OutputTable;

use common::{approx_eq, write_sources, CUSTOMERS_CSV, GAMES_CSV, SALES_CSV, STORES_CSV};

const SCENARIO_GAMES: &str = "\
game_id,title,genre,platform,publisher,age_rating,release_date,base_price
10,X,RPG,PC,Studio A,PEGI 16,2023-11-01,59.99
";
const SCENARIO_SALES: &str = "\
sale_id,sale_date,game_id,quantity,unit_price,discount_percentage,total_amount,sales_channel,store_id,customer_id
1,2024-03-15,10,1,59.99,0,59.99,online,,100
";
const SCENARIO_CUSTOMERS: &str = "\
customer_id,segment,loyalty_status,age_group,country
100,core,gold,18-25,US
";
const SCENARIO_STORES: &str = "\
store_id,store_name,country
1,Downtown Paris,FR
";

#[test]
fn single_online_sale_flows_through_every_output() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let input_dir = dir.path().join("raw");
    let output_dir = dir.path().join("processed");
    write_sources(
        &input_dir,
        SCENARIO_GAMES,
        SCENARIO_SALES,
        SCENARIO_CUSTOMERS,
        SCENARIO_STORES,
    );

    let config = PipelineConfig::new(&input_dir, &output_dir);
    let ctx = ExecutionContext::start(config.clone());
    let summary = pipeline::run(&ctx)?;
    ctx.finish();

    assert_eq!(summary.outputs.len(), 6);
    assert_eq!(summary.enriched_sales, 1);
    assert_eq!(summary.unresolved_store_sales, 0);

    let full = read_table(&config.output_path(OutputTable::GameSalesFull))?;
    assert_eq!(full.height(), 1);
    assert_eq!(full.column("store_name")?.str()?.get(0), Some("Online"));
    assert_eq!(full.column("sale_country")?.str()?.get(0), Some("US"));

    let monthly = read_table(&config.output_path(OutputTable::MonthlyPlatformSales))?;
    assert_eq!(monthly.height(), 1);
    assert_eq!(monthly.column("month")?.str()?.get(0), Some("2024-03"));
    assert_eq!(monthly.column("platform")?.str()?.get(0), Some("PC"));
    assert_eq!(monthly.column("num_sales")?.i64()?.get(0), Some(1));
    let revenue = monthly.column("total_revenue")?.f64()?.get(0).expect("revenue");
    assert!(approx_eq(revenue, 59.99));

    for table in OutputTable::views() {
        assert!(config.output_path(table).exists(), "{} missing", table.table_name());
    }
    Ok(())
}

#[test]
fn rerunning_on_unchanged_input_reproduces_every_table() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let input_dir = dir.path().join("raw");
    let output_dir = dir.path().join("processed");
    write_sources(&input_dir, GAMES_CSV, SALES_CSV, CUSTOMERS_CSV, STORES_CSV);
    let config = PipelineConfig::new(&input_dir, &output_dir);

    let ctx = ExecutionContext::start(config.clone());
    pipeline::run(&ctx)?;
    ctx.finish();

    let mut tables = vec![OutputTable::GameSalesFull];
    tables.extend(OutputTable::views());
    let first: Vec<DataFrame> = tables
        .iter()
        .map(|table| read_table(&config.output_path(*table)))
        .collect::<Result<_, _>>()?;

    let ctx = ExecutionContext::start(config.clone());
    pipeline::run(&ctx)?;
    ctx.finish();

    for (table, before) in tables.iter().zip(&first) {
        let after = read_table(&config.output_path(*table))?;
        assert!(
            before.equals_missing(&after),
            "{} changed between runs",
            table.table_name()
        );
    }
    Ok(())
}

#[test]
fn missing_source_aborts_before_any_output() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let input_dir = dir.path().join("raw");
    let output_dir = dir.path().join("processed");
    std::fs::create_dir_all(&input_dir)?;
    std::fs::write(input_dir.join("games.csv"), GAMES_CSV)?;

    let ctx = ExecutionContext::start(PipelineConfig::new(&input_dir, &output_dir));
    let err = pipeline::run(&ctx).unwrap_err();

    match err {
        PipelineError::SourceNotFound { source_name, .. } => assert_eq!(source_name, "sales"),
        other => panic!("unexpected error: {other}"),
    }
    assert!(!output_dir.exists());
    assert!(!ctx.is_completed());
    Ok(())
}

#[test]
fn mismatched_join_key_types_are_schema_errors() {
    let games = "\
game_id,title,genre,platform,publisher,age_rating,release_date,base_price
G10,X,RPG,PC,Studio A,PEGI 16,2023-11-01,59.99
";
    let raw = common::raw_tables(games, SALES_CSV, CUSTOMERS_CSV, STORES_CSV);
    let err = build_fact_table(&raw).unwrap_err();
    assert!(err.is_schema_mismatch(), "unexpected error: {err}");
}

#[test]
fn output_dir_blocked_by_a_file_is_a_write_failure() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let input_dir = dir.path().join("raw");
    let output_dir = dir.path().join("processed");
    write_sources(&input_dir, GAMES_CSV, SALES_CSV, CUSTOMERS_CSV, STORES_CSV);
    std::fs::write(&output_dir, "not a directory")?;

    let ctx = ExecutionContext::start(PipelineConfig::new(&input_dir, &output_dir));
    let err = pipeline::run(&ctx).unwrap_err();

    match err {
        PipelineError::WriteFailure { table, path, .. } => {
            assert_eq!(table, "game_sales_full");
            assert_eq!(path, output_dir);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(output_dir.is_file());
    Ok(())
}
