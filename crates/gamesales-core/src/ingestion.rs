use std::fs;
use std::io::Cursor;
use std::path::Path;

use polars::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::tables::{require_columns, sales, stores, OutputTable, RawTables, Source};

const STAGE: &str = "ingestion";

/// Row counts of the raw extracts, reported once ingestion finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SourceCounts {
    pub games: usize,
    pub sales: usize,
    pub customers: usize,
    pub stores: usize,
}

impl SourceCounts {
    pub fn of(tables: &RawTables) -> Self {
        Self {
            games: tables.games.height(),
            sales: tables.sales.height(),
            customers: tables.customers.height(),
            stores: tables.stores.height(),
        }
    }
}

/// Parses a headered CSV, inferring column types from the first `infer_schema_length` rows.
pub fn read_csv_bytes(bytes: Vec<u8>, infer_schema_length: Option<usize>) -> PolarsResult<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(infer_schema_length)
        .map_parse_options(|options| options.with_try_parse_dates(true))
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()
}

/// Parses one extract and checks it carries the columns downstream joins consume.
pub fn parse_source(
    source: Source,
    bytes: Vec<u8>,
    infer_schema_length: Option<usize>,
) -> Result<DataFrame> {
    let df = read_csv_bytes(bytes, infer_schema_length)
        .map_err(|err| PipelineError::from_polars(STAGE, err))?;
    require_columns(&df, source.required_columns(), STAGE)?;

    let df = match source {
        Source::Sales => normalize_sale_date(df),
        _ => Ok(df),
    }
    .map_err(|err| PipelineError::from_polars(STAGE, err))?;

    debug!(source = source.name(), schema = ?df.schema(), "parsed source");
    Ok(df)
}

pub fn read_source(
    source: Source,
    path: &Path,
    infer_schema_length: Option<usize>,
) -> Result<DataFrame> {
    debug!(source = source.name(), path = %path.display(), "reading source");
    let bytes = fs::read(path).map_err(|err| PipelineError::SourceNotFound {
        source_name: source.name(),
        path: path.to_path_buf(),
        reason: err.to_string(),
    })?;
    parse_source(source, bytes, infer_schema_length)
}

/// Reads all four extracts. Every file is read before anything is returned, so a
/// missing source aborts the run before any output exists.
pub fn load_sources(config: &PipelineConfig) -> Result<RawTables> {
    let read = |source: Source| {
        read_source(source, &config.source_path(source), config.infer_schema_length)
    };

    let games = read(Source::Games)?;
    let sales = read(Source::Sales)?;
    let customers = read(Source::Customers)?;
    let stores = read(Source::Stores)?;

    assemble(games, sales, customers, stores)
}

/// Bundles parsed extracts, reconciling the store key when one side of it was
/// inferred without any values to infer from.
pub fn assemble(
    games: DataFrame,
    sales: DataFrame,
    customers: DataFrame,
    stores: DataFrame,
) -> Result<RawTables> {
    let (sales, stores) = align_key(sales, stores, sales::STORE_ID, stores::STORE_ID)
        .map_err(|err| PipelineError::from_polars(STAGE, err))?;

    let tables = RawTables {
        games,
        sales,
        customers,
        stores,
    };

    let counts = SourceCounts::of(&tables);
    info!(
        games = counts.games,
        sales = counts.sales,
        customers = counts.customers,
        stores = counts.stores,
        "sources loaded"
    );
    Ok(tables)
}

/// Creates the output directory if absent. A failure here is reported against
/// the fact table, the first output the run would write.
pub fn ensure_output_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|err| PipelineError::WriteFailure {
        table: OutputTable::GameSalesFull.table_name(),
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;
    debug!(path = %path.display(), "output directory ready");
    Ok(())
}

fn normalize_sale_date(df: DataFrame) -> PolarsResult<DataFrame> {
    if df.column(sales::SALE_DATE)?.dtype() != &DataType::String {
        return Ok(df);
    }
    df.lazy()
        .with_column(
            col(sales::SALE_DATE)
                .str()
                .to_date(StrptimeOptions::default()),
        )
        .collect()
}

// An all-null column is inferred as String, which would make a join on it
// fail against an integer key on the other side.
fn align_key(
    mut left: DataFrame,
    mut right: DataFrame,
    left_key: &str,
    right_key: &str,
) -> PolarsResult<(DataFrame, DataFrame)> {
    let left_col = left.column(left_key)?.clone();
    let right_col = right.column(right_key)?.clone();
    if left_col.dtype() == right_col.dtype() {
        return Ok((left, right));
    }

    if left_col.null_count() == left_col.len() {
        left.with_column(left_col.cast(right_col.dtype())?)?;
    } else if right_col.null_count() == right_col.len() {
        right.with_column(right_col.cast(left_col.dtype())?)?;
    }
    Ok((left, right))
}
