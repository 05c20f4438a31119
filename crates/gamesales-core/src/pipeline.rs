use std::path::PathBuf;

use chrono::{DateTime, Utc};
use polars::prelude::*;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::context::ExecutionContext;
use crate::denormalize::{denormalize, unresolved_store_sales};
use crate::enrichment::enrich_sales;
use crate::error::{PipelineError, Result};
use crate::ingestion::{ensure_output_dir, load_sources, SourceCounts};
use crate::persistence::write_table;
use crate::tables::{customers, games, require_matching_key, sales, stores, OutputTable, RawTables};
use crate::views::{all_views, ViewFn};

const ENRICHMENT: &str = "enrichment";
const DENORMALIZATION: &str = "denormalization";

/// Enriched sales and the fact table built from them.
#[derive(Debug, Clone)]
pub struct FactTable {
    pub enriched_sales: DataFrame,
    pub full_sales: DataFrame,
    /// Store sales whose `store_id` matched no store.
    pub unresolved_store_sales: usize,
}

/// Everything a run produces, before persistence.
#[derive(Debug, Clone)]
pub struct Outputs {
    pub fact: FactTable,
    pub views: Vec<(OutputTable, DataFrame)>,
}

impl Outputs {
    pub fn view(&self, table: OutputTable) -> Option<&DataFrame> {
        self.views
            .iter()
            .find(|(candidate, _)| *candidate == table)
            .map(|(_, df)| df)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OutputSummary {
    pub table: &'static str,
    pub path: PathBuf,
    pub rows: usize,
    pub bytes: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub sources: SourceCounts,
    pub enriched_sales: usize,
    pub unresolved_store_sales: usize,
    pub outputs: Vec<OutputSummary>,
}

pub fn build_fact_table(raw: &RawTables) -> Result<FactTable> {
    require_matching_key(&raw.sales, sales::GAME_ID, &raw.games, games::GAME_ID, ENRICHMENT)?;
    require_matching_key(
        &raw.sales,
        sales::CUSTOMER_ID,
        &raw.customers,
        customers::CUSTOMER_ID,
        DENORMALIZATION,
    )?;
    require_matching_key(
        &raw.sales,
        sales::STORE_ID,
        &raw.stores,
        stores::STORE_ID,
        DENORMALIZATION,
    )?;

    let enriched_sales = enrich_sales(raw.sales.clone().lazy(), raw.games.clone().lazy())
        .collect()
        .map_err(|err| PipelineError::from_polars(ENRICHMENT, err))?;
    info!(rows = enriched_sales.height(), "sales enrichment complete");

    let full_sales = denormalize(
        enriched_sales.clone().lazy(),
        raw.games.clone().lazy(),
        raw.customers.clone().lazy(),
        raw.stores.clone().lazy(),
    )
    .collect()
    .map_err(|err| PipelineError::from_polars(DENORMALIZATION, err))?;
    info!(rows = full_sales.height(), "denormalization complete");

    let unresolved = unresolved_store_sales(&full_sales)
        .map_err(|err| PipelineError::from_polars(DENORMALIZATION, err))?;
    if unresolved > 0 {
        warn!(
            rows = unresolved,
            "store sales without a matching store carry null store_name and sale_country"
        );
    }

    Ok(FactTable {
        enriched_sales,
        full_sales,
        unresolved_store_sales: unresolved,
    })
}

pub fn compute_view(table: OutputTable, build: ViewFn, full_sales: &DataFrame) -> Result<DataFrame> {
    let view = build(full_sales.clone().lazy())
        .collect()
        .map_err(|err| PipelineError::from_polars(table.table_name(), err))?;
    info!(view = table.table_name(), rows = view.height(), "view computed");
    Ok(view)
}

/// Runs every transformation in memory without touching the filesystem.
pub fn transform(raw: &RawTables) -> Result<Outputs> {
    let fact = build_fact_table(raw)?;
    let mut views = Vec::with_capacity(OutputTable::views().len());
    for (table, build) in all_views() {
        views.push((table, compute_view(table, build, &fact.full_sales)?));
    }
    Ok(Outputs { fact, views })
}

/// Executes the full batch: ingest, build and persist the fact table, then
/// compute and persist each view. The first failure aborts the run; outputs
/// already written stay on disk.
pub fn run(ctx: &ExecutionContext) -> Result<RunSummary> {
    let _guard = ctx.span().enter();
    let config = ctx.config();

    let raw = load_sources(config)?;
    ensure_output_dir(&config.output_dir)?;
    let sources = SourceCounts::of(&raw);

    let mut fact = build_fact_table(&raw)?;
    let mut outputs = Vec::with_capacity(OutputTable::views().len() + 1);

    let fact_path = config.output_path(OutputTable::GameSalesFull);
    let bytes = write_table(&mut fact.full_sales, &fact_path, OutputTable::GameSalesFull)?;
    info!(path = %fact_path.display(), "fact table saved");
    outputs.push(OutputSummary {
        table: OutputTable::GameSalesFull.table_name(),
        path: fact_path,
        rows: fact.full_sales.height(),
        bytes,
    });

    for (table, build) in all_views() {
        let mut view = compute_view(table, build, &fact.full_sales)?;
        let path = config.output_path(table);
        let bytes = write_table(&mut view, &path, table)?;
        info!(view = table.table_name(), path = %path.display(), "view saved");
        outputs.push(OutputSummary {
            table: table.table_name(),
            path,
            rows: view.height(),
            bytes,
        });
    }

    info!(outputs = outputs.len(), "all transformations and views completed");
    Ok(RunSummary {
        run_id: ctx.run_id(),
        started_at: ctx.started_at(),
        sources,
        enriched_sales: fact.enriched_sales.height(),
        unresolved_store_sales: fact.unresolved_store_sales,
        outputs,
    })
}
