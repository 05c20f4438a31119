pub mod config;
pub mod context;
pub mod denormalize;
pub mod enrichment;
pub mod error;
pub mod ingestion;
pub mod persistence;
pub mod pipeline;
pub mod tables;
pub mod views;
