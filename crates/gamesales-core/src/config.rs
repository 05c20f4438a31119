use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{PipelineError, Result};
use crate::tables::{OutputTable, Source};

pub const DEFAULT_INPUT_DIR: &str = "/data";
pub const DEFAULT_OUTPUT_DIR: &str = "/data/processed";
pub const DEFAULT_INFER_SCHEMA_LENGTH: usize = 100;

/// File names of the raw extracts, relative to the input directory.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SourceFiles {
    pub games: String,
    pub sales: String,
    pub customers: String,
    pub stores: String,
}

impl Default for SourceFiles {
    fn default() -> Self {
        Self {
            games: "games.csv".to_string(),
            sales: "sales.csv".to_string(),
            customers: "customers.csv".to_string(),
            stores: "stores.csv".to_string(),
        }
    }
}

impl SourceFiles {
    pub fn file_name(&self, source: Source) -> &str {
        match source {
            Source::Games => &self.games,
            Source::Sales => &self.sales,
            Source::Customers => &self.customers,
            Source::Stores => &self.stores,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub sources: SourceFiles,
    /// Rows sampled when inferring CSV column types; `None` scans the whole file.
    pub infer_schema_length: Option<usize>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from(DEFAULT_INPUT_DIR),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            sources: SourceFiles::default(),
            infer_schema_length: Some(DEFAULT_INFER_SCHEMA_LENGTH),
        }
    }
}

impl PipelineConfig {
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            ..Self::default()
        }
    }

    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        toml::from_str::<PipelineConfig>(toml_str)
            .map_err(|err| PipelineError::Config(err.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|err| {
            PipelineError::Config(format!("failed to read {}: {err}", path.display()))
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn source_path(&self, source: Source) -> PathBuf {
        self.input_dir.join(self.sources.file_name(source))
    }

    pub fn output_path(&self, table: OutputTable) -> PathBuf {
        self.output_dir
            .join(format!("{}.parquet", table.table_name()))
    }
}
