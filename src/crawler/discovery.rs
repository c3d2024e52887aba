//! Seed discovery
//!
//! Works out which URL groups a run walks: numbered catalogue pages, or the seed
//! pages of an article walk found on the archive sidebar, the region menu, or a
//! pre-fetched category list.

use crate::config::{load_url_list, Config, CrawlerConfig, Method, SiteConfig};
use crate::crawler::extractor::Extractor;
use crate::crawler::fetcher::fetch_page;
use crate::record::RunCounter;
use crate::Result;
use reqwest::Client;

/// Inclusive range of catalogue listing pages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRange {
    pub start: u32,
    pub end: u32,

    /// End page was derived from the catalogue size; stop at the first empty page
    pub open_ended: bool,
}

impl PageRange {
    /// Resolves the configured page range; an end page of 0 means "all pages"
    pub fn from_config(crawler: &CrawlerConfig, site: &SiteConfig) -> Self {
        if crawler.end_page == 0 {
            Self {
                start: crawler.start_page,
                end: (site.total_items / crawler.items_per_page.max(1)).saturating_add(1),
                open_ended: true,
            }
        } else {
            Self {
                start: crawler.start_page,
                end: crawler.end_page,
                open_ended: false,
            }
        }
    }

    pub fn pages(&self) -> std::ops::RangeInclusive<u32> {
        self.start..=self.end
    }

    pub fn len(&self) -> u32 {
        if self.end < self.start {
            return 0;
        }
        self.end.saturating_sub(self.start).saturating_add(1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Listing URL for one catalogue page
pub fn catalogue_page_url(template: &str, page: u32, per_page: u32) -> String {
    template
        .replace("{page}", &page.to_string())
        .replace("{per-page}", &per_page.to_string())
}

/// Counter for the first record of a catalogue page
pub fn catalogue_counter(page: u32, per_page: u32) -> RunCounter {
    RunCounter::starting_at(u64::from(page.saturating_sub(1)) * u64::from(per_page) + 1)
}

/// Finds the seed URLs of an article walk
///
/// An unavailable discovery page yields no seeds (after a warning); a missing
/// category list is a configuration error.
pub async fn discover_seeds(
    client: &Client,
    extractor: &Extractor,
    config: &Config,
    method: Method,
) -> Result<Vec<String>> {
    let seeds = match method {
        Method::Catalogue => Vec::new(),
        Method::Archive => {
            let Some(page) = fetch_page(client, &config.site.archive_url).await else {
                tracing::warn!("Archive page unavailable: {}", config.site.archive_url);
                return Ok(Vec::new());
            };
            extractor.archive_links(&page)
        }
        Method::Region => {
            let Some(page) = fetch_page(client, &config.site.region_url).await else {
                tracing::warn!("Region page unavailable: {}", config.site.region_url);
                return Ok(Vec::new());
            };
            extractor.region_links(&page)
        }
        Method::Category => load_url_list(&config.site.category_urls_file)?,
    };

    tracing::info!("Discovered {} {} seed URLs", seeds.len(), method.as_str());
    Ok(seeds)
}
