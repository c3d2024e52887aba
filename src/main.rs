//! greyharvest main entry point
//!
//! This is the command-line interface for the allcatsrgrey.org.uk metadata harvester.

use anyhow::Context;
use clap::Parser;
use greyharvest::config::{load_config_with_hash, load_url_list, validate, Config, Method};
use greyharvest::crawler::{catalogue_page_url, Coordinator, PageRange};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// greyharvest: a grey-literature metadata harvester
///
/// Walks the allcatsrgrey.org.uk catalogue or its article archive, extracts
/// document metadata, and appends it as tab-separated rows to a file (or stdout).
/// Optionally downloads the documents themselves.
#[derive(Parser, Debug)]
#[command(name = "greyharvest")]
#[command(version)]
#[command(about = "Harvests document metadata from allcatsrgrey.org.uk", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (all settings have defaults)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Delimited output file, appended to if it exists ("-" or omitted: stdout)
    #[arg(long, value_name = "PATH")]
    csv: Option<PathBuf>,

    /// How seed URLs are found
    #[arg(long, value_enum, default_value_t = Method::Catalogue)]
    method: Method,

    /// Walk this single article chain instead of discovering seeds
    #[arg(long, value_name = "URL")]
    url: Option<String>,

    /// First catalogue page to fetch
    #[arg(long)]
    start_page: Option<u32>,

    /// Last catalogue page to fetch (0 = all)
    #[arg(long)]
    end_page: Option<u32>,

    /// Catalogue entries per listing page
    #[arg(long)]
    items_per_page: Option<u32>,

    /// Seconds to pause between URL groups
    #[arg(long, value_name = "SECONDS")]
    sleep: Option<u64>,

    /// Download the documents
    #[arg(long)]
    download: bool,

    /// Directory downloaded documents are saved to
    #[arg(long, value_name = "DIR")]
    download_dir: Option<PathBuf>,

    /// Pre-fetched category URL list used by the category method
    #[arg(long, value_name = "FILE")]
    category_urls: Option<PathBuf>,

    /// Catalogue method: record listing rows only, without detail pages
    #[arg(long)]
    listing_only: bool,

    /// Validate the configuration and show what would be harvested, without fetching
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Cli {
    /// Applies command-line overrides on top of the file configuration
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(csv) = &self.csv {
            config.output.csv_path = Some(csv.clone());
        }
        if let Some(page) = self.start_page {
            config.crawler.start_page = page;
        }
        if let Some(page) = self.end_page {
            config.crawler.end_page = page;
        }
        if let Some(n) = self.items_per_page {
            config.crawler.items_per_page = n;
        }
        if let Some(secs) = self.sleep {
            config.crawler.sleep_seconds = secs;
        }
        if self.download {
            config.output.download = true;
        }
        if let Some(dir) = &self.download_dir {
            config.output.download_dir = dir.clone();
        }
        if let Some(path) = &self.category_urls {
            config.site.category_urls_file = path.clone();
        }
        if self.listing_only {
            config.crawler.fetch_details = false;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    cli.apply_overrides(&mut config);
    validate(&config).context("Invalid configuration")?;

    if cli.dry_run {
        handle_dry_run(&config, cli.method, cli.url.as_deref())
    } else {
        handle_harvest(config, cli.method, cli.url.as_deref()).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Logs go to stderr; stdout may be carrying the harvested rows.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("greyharvest=info,warn"),
            1 => EnvFilter::new("greyharvest=debug,info"),
            2 => EnvFilter::new("greyharvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows the resolved settings and what would be walked
fn handle_dry_run(config: &Config, method: Method, url: Option<&str>) -> anyhow::Result<()> {
    println!("=== greyharvest Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Sleep between groups: {}s", config.crawler.sleep_seconds);
    println!("  Timeout: {}s", config.crawler.timeout_seconds);
    println!("  User agent: {}", config.crawler.user_agent);
    println!("  Resolve redirects: {}", config.crawler.resolve_redirects);
    println!("  Fetch detail pages: {}", config.crawler.fetch_details);

    println!("\nOutput:");
    match &config.output.csv_path {
        Some(path) => println!("  File: {}", path.display()),
        None => println!("  File: stdout"),
    }
    println!("  Download: {}", config.output.download);
    if config.output.download {
        println!("  Download dir: {}", config.output.download_dir.display());
    }

    println!();
    if let Some(url) = url {
        println!("Would walk a single article chain from {}", url);
        return Ok(());
    }

    match method {
        Method::Catalogue => {
            let range = PageRange::from_config(&config.crawler, &config.site);
            let per_page = config.crawler.items_per_page;
            println!(
                "Would walk catalogue pages {} to {} ({} per page{})",
                range.start,
                range.end,
                per_page,
                if range.open_ended {
                    ", stopping at the first empty page"
                } else {
                    ""
                }
            );
            println!(
                "  First: {}",
                catalogue_page_url(&config.site.catalogue_url, range.start, per_page)
            );
        }
        Method::Archive => {
            println!("Would discover seeds from archive page {}", config.site.archive_url);
        }
        Method::Region => {
            println!("Would discover seeds from region menu on {}", config.site.region_url);
        }
        Method::Category => {
            let seeds = load_url_list(&config.site.category_urls_file)?;
            println!(
                "Would walk {} category URLs from {}",
                seeds.len(),
                config.site.category_urls_file.display()
            );
        }
    }

    println!("\n✓ Configuration is valid");
    Ok(())
}

/// Handles the main harvest operation
async fn handle_harvest(config: Config, method: Method, url: Option<&str>) -> anyhow::Result<()> {
    tracing::info!("Starting {} harvest", method.as_str());

    let coordinator = Coordinator::new(config).context("Failed to set up harvester")?;
    let plan = coordinator
        .plan(method, url)
        .await
        .context("Failed to plan harvest")?;

    match coordinator.run(&plan).await {
        Ok(summary) => {
            tracing::info!(
                "Harvest completed: {} records written",
                summary.records_written
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Harvest failed: {}", e);
            Err(e.into())
        }
    }
}
