//! greyharvest: a metadata harvester for the allcatsrgrey.org.uk grey-literature archive
//!
//! This crate walks the archive's listing pages, extracts per-document metadata,
//! optionally resolves and downloads the underlying files, and appends the results
//! to a delimited text file.

pub mod config;
pub mod crawler;
pub mod output;
pub mod record;

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Extraction setup failed: {0}")]
    Extract(#[from] crawler::ExtractError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("URL list not found: {}", .0.display())]
    MissingUrlList(PathBuf),
}

/// Result type alias for harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::{Config, Method};
pub use crawler::{Coordinator, Plan};
pub use record::{Record, RunCounter};
