//! Configuration module for greyharvest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! A configuration file is optional: every value has a default, and command-line
//! flags are applied on top before validation.
//!
//! # Example
//!
//! ```no_run
//! use greyharvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("greyharvest.toml")).unwrap();
//! println!("Items per page: {}", config.crawler.items_per_page);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, LineTerminator, Method, OutputConfig, SiteConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, load_url_list};
pub use validation::validate;
