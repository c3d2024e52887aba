//! Pagination walker
//!
//! Walks one URL group at a time and returns everything it collected, including
//! the running counter, so nothing outlives the group except what the caller keeps.
//!
//! Two group shapes exist:
//! - an article chain: fetch, extract articles, follow the "previous" cursor until
//!   there is none, the next page is unreachable, or the cursor returns to a page
//!   already visited
//! - a catalogue listing page: extract listing rows and enrich each one from its
//!   detail page

use crate::config::Config;
use crate::crawler::extractor::Extractor;
use crate::crawler::fetcher::fetch_page;
use crate::crawler::resolver::{
    clean_url, download_file, resolve_download_target, resolve_final_url, DownloadOutcome,
    DownloadRewrite,
};
use crate::record::{fields, Record, RunCounter};
use reqwest::Client;
use std::collections::HashSet;
use std::path::PathBuf;

/// Per-run switches for the walker
#[derive(Debug, Clone)]
pub struct WalkOptions {
    /// Record the final URL of article links after redirects
    pub resolve_redirects: bool,

    /// Enrich catalogue rows from their detail pages
    pub fetch_details: bool,

    /// Download documents into `download_dir`
    pub download: bool,
    pub download_dir: PathBuf,

    pub rewrite: DownloadRewrite,
}

impl From<&Config> for WalkOptions {
    fn from(config: &Config) -> Self {
        Self {
            resolve_redirects: config.crawler.resolve_redirects,
            fetch_details: config.crawler.fetch_details,
            download: config.output.download,
            download_dir: config.output.download_dir.clone(),
            rewrite: DownloadRewrite::from(&config.site),
        }
    }
}

/// Why a walk ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// No further cursor link
    Exhausted,

    /// The page at this URL could not be fetched
    Unreachable(String),

    /// The cursor pointed back at this already visited URL
    CycleDetected(String),
}

/// Everything one walk produced
#[derive(Debug, Clone)]
pub struct WalkOutcome {
    /// Records in page order
    pub records: Vec<Record>,

    /// Counter positioned after the last record
    pub counter: RunCounter,

    pub pages_visited: u64,
    pub downloads_saved: u64,
    pub downloads_failed: u64,
    pub stop: StopReason,
}

impl WalkOutcome {
    fn new(counter: RunCounter) -> Self {
        Self {
            records: Vec::new(),
            counter,
            pages_visited: 0,
            downloads_saved: 0,
            downloads_failed: 0,
            stop: StopReason::Exhausted,
        }
    }

    /// True when the walk ended on anything other than exhaustion
    pub fn cut_short(&self) -> bool {
        self.stop != StopReason::Exhausted
    }

    fn push(&mut self, mut record: Record) {
        record.set_index(self.counter.next_index());
        self.records.push(record);
    }

    fn tally(&mut self, outcome: &DownloadOutcome) {
        if outcome.is_saved() {
            self.downloads_saved += 1;
        } else {
            self.downloads_failed += 1;
        }
    }
}

/// Sequential walker over archive pages
#[derive(Debug)]
pub struct Walker {
    client: Client,
    extractor: Extractor,
    options: WalkOptions,
}

impl Walker {
    pub fn new(client: Client, extractor: Extractor, options: WalkOptions) -> Self {
        Self {
            client,
            extractor,
            options,
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn extractor(&self) -> &Extractor {
        &self.extractor
    }

    /// Walks an article chain starting at `seed`
    ///
    /// Records already collected are kept whatever ends the walk.
    pub async fn walk(&self, seed: &str, counter: RunCounter) -> WalkOutcome {
        let mut outcome = WalkOutcome::new(counter);
        let mut visited = HashSet::new();
        let mut next = Some(seed.trim().to_string());

        while let Some(url) = next.take() {
            if !visited.insert(url.clone()) {
                tracing::warn!("Cursor loops back to {}, stopping walk", url);
                outcome.stop = StopReason::CycleDetected(url);
                break;
            }

            tracing::info!("----- Processing page {}", url);
            let Some(page) = fetch_page(&self.client, &url).await else {
                tracing::warn!("No page for {}, stopping walk", url);
                outcome.stop = StopReason::Unreachable(url);
                break;
            };
            outcome.pages_visited += 1;

            let articles = self.extractor.extract_articles(&page);
            next = self.extractor.find_cursor(&page);
            drop(page);

            for article in articles {
                let record = self.finish_article(article, &mut outcome).await;
                outcome.push(record);
            }

            if let Some(cursor) = &next {
                tracing::debug!("Following cursor to {}", cursor);
            }
        }

        tracing::info!("{} items processed", outcome.records.len());
        outcome
    }

    async fn finish_article(&self, mut record: Record, outcome: &mut WalkOutcome) -> Record {
        let Some(link) = record.get(fields::URL).map(str::to_string) else {
            return record;
        };

        let url = if self.options.resolve_redirects {
            match resolve_final_url(&self.client, &link).await {
                Ok(url) => url,
                Err(e) => {
                    tracing::warn!("Could not resolve {}: {}", link, e);
                    record.push_error(format!("Redirect resolution failed for {}: {}", link, e));
                    clean_url(&link)
                }
            }
        } else {
            clean_url(&link)
        };
        record.set(fields::URL, url.as_str());

        if self.options.download {
            let downloaded = download_file(&self.client, &url, &self.options.download_dir).await;
            outcome.tally(&downloaded);
            record.set(fields::DOWNLOAD, downloaded.to_string());
        }

        record
    }

    /// Processes one catalogue listing page
    ///
    /// Every listing row yields a record; rows whose detail page is unavailable keep
    /// their listing fields and gain an Error.
    pub async fn catalogue_page(&self, url: &str, counter: RunCounter) -> WalkOutcome {
        let mut outcome = WalkOutcome::new(counter);

        let Some(page) = fetch_page(&self.client, url).await else {
            tracing::warn!("No listing page for {}", url);
            outcome.stop = StopReason::Unreachable(url.to_string());
            return outcome;
        };
        outcome.pages_visited += 1;
        let rows = self.extractor.extract_listing_rows(&page);
        drop(page);

        tracing::info!("Found {} listing rows on {}", rows.len(), url);

        for row in rows {
            let record = if self.options.fetch_details {
                self.enrich_row(row, &mut outcome).await
            } else {
                row
            };
            outcome.push(record);
        }

        outcome
    }

    async fn enrich_row(&self, mut row: Record, outcome: &mut WalkOutcome) -> Record {
        let Some(detail_url) = row.get(fields::URL).map(str::to_string) else {
            return row;
        };

        let Some(page) = fetch_page(&self.client, &detail_url).await else {
            row.push_error(format!("Page not found: {}", detail_url));
            return row;
        };
        outcome.pages_visited += 1;
        let detail = self.extractor.extract_detail(&page);
        drop(page);

        row.overlay(detail.record);

        if let Some(candidate) = detail.download_link {
            let download = if self.options.download {
                let target = resolve_download_target(
                    &self.client,
                    &self.extractor,
                    &self.options.rewrite,
                    &candidate,
                )
                .await;
                let downloaded =
                    download_file(&self.client, &target, &self.options.download_dir).await;
                outcome.tally(&downloaded);
                downloaded.to_string()
            } else {
                candidate
            };
            row.set(fields::DOWNLOAD, download);
        }

        row
    }
}
