//! Crawler module for page fetching and record harvesting
//!
//! This module contains the core harvesting logic, including:
//! - HTTP fetching with warning-and-skip on unavailable pages
//! - Record extraction from listing, article and detail pages
//! - Seed discovery and pagination walking
//! - Download resolution
//! - Overall run coordination

mod coordinator;
mod discovery;
mod extractor;
mod fetcher;
mod resolver;
mod walker;

pub use coordinator::{run_harvest, Coordinator, Plan};
pub use discovery::{catalogue_counter, catalogue_page_url, discover_seeds, PageRange};
pub use extractor::{clean_text, DetailPage, ExtractError, Extractor};
pub use fetcher::{build_http_client, fetch_page, fetch_url, FetchResult, Page};
pub use resolver::{
    clean_url, download_file, resolve_download_target, resolve_final_url, DownloadOutcome,
    DownloadRewrite,
};
pub use walker::{StopReason, WalkOptions, WalkOutcome, Walker};
