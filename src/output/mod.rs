//! Output module for harvested records
//!
//! This module handles:
//! - Appending records to delimited files (or stdout)
//! - Tallying and reporting run statistics

pub mod stats;
mod writer;

pub use stats::RunSummary;
pub use writer::{write_records, Destination, RecordWriter, RowFormat};

use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write delimited output: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;
