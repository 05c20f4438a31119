// crates/gamesales-core/src/error.rs

use std::path::PathBuf;

use polars::prelude::PolarsError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("source {source_name} not readable at {path}: {reason}")]
    SourceNotFound {
        source_name: &'static str,
        path: PathBuf,
        reason: String,
    },

    #[error("{stage} schema mismatch: {message}")]
    SchemaMismatch { stage: &'static str, message: String },

    #[error("failed to write {table} to {path}: {message}")]
    WriteFailure {
        table: &'static str,
        path: PathBuf,
        message: String,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("{stage} polars operation failed: {source}")]
    Polars {
        stage: &'static str,
        #[source]
        source: PolarsError,
    },

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// Sorts an engine error into the schema bucket or the generic one.
    pub fn from_polars(stage: &'static str, err: PolarsError) -> Self {
        match err {
            PolarsError::ColumnNotFound(msg)
            | PolarsError::SchemaMismatch(msg)
            | PolarsError::SchemaFieldNotFound(msg)
            | PolarsError::InvalidOperation(msg) => PipelineError::SchemaMismatch {
                stage,
                message: msg.to_string(),
            },
            PolarsError::Context { error, .. } => Self::from_polars(stage, *error),
            other => PipelineError::Polars {
                stage,
                source: other,
            },
        }
    }

    pub fn is_schema_mismatch(&self) -> bool {
        matches!(self, PipelineError::SchemaMismatch { .. })
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
