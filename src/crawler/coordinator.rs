//! Harvest coordinator - main run orchestration
//!
//! This module drives a complete run:
//! - Building the HTTP client, extractor and walker
//! - Resolving the plan (catalogue pages or seed URLs)
//! - Walking each URL group in order and flushing its records to the output
//! - Pausing between groups
//! - Tallying and logging the run summary

use crate::config::{Config, Method};
use crate::crawler::discovery::{
    catalogue_counter, catalogue_page_url, discover_seeds, PageRange,
};
use crate::crawler::extractor::Extractor;
use crate::crawler::fetcher::build_http_client;
use crate::crawler::walker::{StopReason, WalkOptions, WalkOutcome, Walker};
use crate::output::{Destination, RecordWriter, RowFormat, RunSummary};
use crate::record::{RunCounter, Schema};
use crate::Result;
use std::time::Duration;

/// What a run walks
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan {
    /// Numbered catalogue listing pages
    Catalogue(PageRange),

    /// Article chains, one per seed URL
    Documents { seeds: Vec<String> },
}

impl Plan {
    /// Output columns for this plan
    pub fn schema(&self, fetch_details: bool) -> Schema {
        match self {
            Plan::Catalogue(_) if fetch_details => Schema::CATALOGUE,
            Plan::Catalogue(_) => Schema::LISTING,
            Plan::Documents { .. } => Schema::DOCUMENTS,
        }
    }

    /// Number of URL groups the plan walks (an upper bound for open-ended catalogues)
    pub fn group_count(&self) -> usize {
        match self {
            Plan::Catalogue(range) => range.len() as usize,
            Plan::Documents { seeds } => seeds.len(),
        }
    }
}

/// Main harvest coordinator structure
#[derive(Debug)]
pub struct Coordinator {
    config: Config,
    walker: Walker,
}

impl Coordinator {
    /// Creates a coordinator for a validated configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to plan and run
    /// * `Err(HarvestError)` - The HTTP client or the selectors could not be built
    pub fn new(config: Config) -> Result<Self> {
        let client = build_http_client(&config.crawler)?;
        let extractor = Extractor::new()?;
        let walker = Walker::new(client, extractor, WalkOptions::from(&config));

        Ok(Self { config, walker })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Resolves what the run will walk
    ///
    /// A `url` override walks that single article chain whatever the method.
    /// Archive and region discovery fetch their discovery page here.
    pub async fn plan(&self, method: Method, url: Option<&str>) -> Result<Plan> {
        if let Some(url) = url {
            return Ok(Plan::Documents {
                seeds: vec![url.to_string()],
            });
        }

        match method {
            Method::Catalogue => Ok(Plan::Catalogue(PageRange::from_config(
                &self.config.crawler,
                &self.config.site,
            ))),
            _ => {
                let seeds = discover_seeds(
                    self.walker.client(),
                    self.walker.extractor(),
                    &self.config,
                    method,
                )
                .await?;
                Ok(Plan::Documents { seeds })
            }
        }
    }

    /// Runs the plan, flushing each group's records as soon as it is walked
    ///
    /// Only output failures abort the run; everything below the group level ends up
    /// in the records themselves.
    pub async fn run(&self, plan: &Plan) -> Result<RunSummary> {
        let mut writer = RecordWriter::new(
            plan.schema(self.config.crawler.fetch_details),
            Destination::from_option(self.config.output.csv_path.as_deref()),
            RowFormat::from(&self.config.output),
        );
        let mut summary = RunSummary::new();

        tracing::info!("Starting harvest of {} URL groups", plan.group_count());

        match plan {
            Plan::Catalogue(range) => self.run_catalogue(range, &mut writer, &mut summary).await?,
            Plan::Documents { seeds } => {
                self.run_documents(seeds, &mut writer, &mut summary).await?
            }
        }

        summary.finish();
        summary.log();
        Ok(summary)
    }

    async fn run_catalogue(
        &self,
        range: &PageRange,
        writer: &mut RecordWriter,
        summary: &mut RunSummary,
    ) -> Result<()> {
        let per_page = self.config.crawler.items_per_page;

        for page in range.pages() {
            tracing::info!("============= Processing page {}", page);
            let url = catalogue_page_url(&self.config.site.catalogue_url, page, per_page);
            let outcome = self
                .walker
                .catalogue_page(&url, catalogue_counter(page, per_page))
                .await;

            let exhausted = outcome.records.is_empty() && outcome.stop == StopReason::Exhausted;
            self.flush(writer, summary, &outcome)?;

            if exhausted && range.open_ended {
                tracing::info!("No listing rows on page {}, catalogue finished", page);
                break;
            }

            if page < range.end {
                self.pause().await;
            }
        }

        Ok(())
    }

    async fn run_documents(
        &self,
        seeds: &[String],
        writer: &mut RecordWriter,
        summary: &mut RunSummary,
    ) -> Result<()> {
        let mut counter = RunCounter::new();

        for (i, seed) in seeds.iter().enumerate() {
            tracing::info!(
                "============= Processing {} ({}/{})",
                seed,
                i + 1,
                seeds.len()
            );
            let outcome = self.walker.walk(seed, counter).await;
            counter = outcome.counter;
            self.flush(writer, summary, &outcome)?;

            if i + 1 < seeds.len() {
                self.pause().await;
            }
        }

        Ok(())
    }

    fn flush(
        &self,
        writer: &mut RecordWriter,
        summary: &mut RunSummary,
        outcome: &WalkOutcome,
    ) -> Result<()> {
        writer.write(&outcome.records)?;

        summary.record_group(&outcome.records);
        summary.pages_visited += outcome.pages_visited;
        summary.downloads_saved += outcome.downloads_saved;
        summary.downloads_failed += outcome.downloads_failed;
        if outcome.cut_short() {
            summary.groups_cut_short += 1;
        }
        Ok(())
    }

    async fn pause(&self) {
        let secs = self.config.crawler.sleep_seconds;
        if secs > 0 {
            tracing::debug!("Sleeping {} seconds", secs);
            tokio::time::sleep(Duration::from_secs(secs)).await;
        }
    }
}

/// Plans and runs a complete harvest
///
/// # Example
///
/// ```no_run
/// use greyharvest::config::{load_config, Method};
/// use greyharvest::crawler::run_harvest;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("greyharvest.toml"))?;
/// let summary = run_harvest(config, Method::Archive, None).await?;
/// println!("{} records", summary.records_written);
/// # Ok(())
/// # }
/// ```
pub async fn run_harvest(config: Config, method: Method, url: Option<&str>) -> Result<RunSummary> {
    let coordinator = Coordinator::new(config)?;
    let plan = coordinator.plan(method, url).await?;
    coordinator.run(&plan).await
}
