use std::fs::File;
use std::path::Path;

use polars::io::parquet::write::{ParquetCompression, ParquetWriter, StatisticsOptions};
use polars::prelude::*;
use tracing::debug;

use crate::error::{PipelineError, Result};
use crate::tables::OutputTable;

/// Writes `df` as Parquet at `path`, replacing whatever was there. Returns the
/// number of bytes written.
pub fn write_table(df: &mut DataFrame, path: &Path, table: OutputTable) -> Result<u64> {
    let write_failure = |message: String| PipelineError::WriteFailure {
        table: table.table_name(),
        path: path.to_path_buf(),
        message,
    };

    let file = File::create(path).map_err(|err| write_failure(err.to_string()))?;
    let bytes = ParquetWriter::new(file)
        .with_compression(ParquetCompression::Zstd(None))
        .with_statistics(StatisticsOptions::default())
        .finish(df)
        .map_err(|err| write_failure(err.to_string()))?;

    debug!(
        table = table.table_name(),
        path = %path.display(),
        rows = df.height(),
        bytes,
        "table written"
    );
    Ok(bytes)
}

pub fn read_table(path: &Path) -> Result<DataFrame> {
    let file = File::open(path)?;
    ParquetReader::new(file)
        .finish()
        .map_err(|err| PipelineError::from_polars("read", err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::df;

    #[test]
    fn rewriting_a_table_replaces_previous_content() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("genre_trends.parquet");

        let mut first = df![
            "genre" => ["RPG", "Action", "Puzzle"],
            "num_sales" => [3i64, 2, 1],
        ]
        .expect("first");
        write_table(&mut first, &path, OutputTable::GenreTrends).expect("first write");

        let mut second = df![
            "genre" => ["RPG"],
            "num_sales" => [7i64],
        ]
        .expect("second");
        write_table(&mut second, &path, OutputTable::GenreTrends).expect("second write");

        let read_back = read_table(&path).expect("read");
        assert!(read_back.equals_missing(&second));
    }

    #[test]
    fn unwritable_destination_is_a_write_failure() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("missing_dir").join("game_performance.parquet");
        let mut df = df!["game_id" => [1i64]].expect("df");

        let err = write_table(&mut df, &path, OutputTable::GamePerformance).unwrap_err();
        match err {
            PipelineError::WriteFailure { table, .. } => assert_eq!(table, "game_performance"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
