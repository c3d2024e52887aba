use clap::ValueEnum;
use serde::Deserialize;
use std::path::PathBuf;

/// Main configuration structure for greyharvest
///
/// Every section has defaults matching the archive's current layout, so an empty
/// (or absent) configuration file is valid.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub site: SiteConfig,
    pub crawler: CrawlerConfig,
    pub output: OutputConfig,
}

/// Seed URLs and site-specific layout knowledge
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SiteConfig {
    /// Catalogue listing template; `{page}` and `{per-page}` are substituted
    pub catalogue_url: String,

    /// Page whose sidebar links to the monthly archive pages
    pub archive_url: String,

    /// Page whose menu links to the regional collections
    pub region_url: String,

    /// Pre-fetched list of category URLs, one per line
    pub category_urls_file: PathBuf,

    /// Path prefix of download links that point at an indirection page
    pub broken_download_path: String,

    /// Replacement prefix that reaches the indirection page
    pub fixed_download_path: String,

    /// Approximate catalogue size, used when no end page is given
    pub total_items: u32,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            catalogue_url: "https://allcatsrgrey.org.uk/wp/find-grey-literature/?searchby=title&searchbox&weblib_orderby=barcode&weblib_order=ASC&pagenum={page}&per_page={per-page}".to_string(),
            archive_url: "https://allcatsrgrey.org.uk/wp/wpfb-file/cervical_screening_standards_data_report_2018_to_2019-pdf/#wpfb-cat-127".to_string(),
            region_url: "https://allcatsrgrey.org.uk/wp/find-grey-literature/".to_string(),
            category_urls_file: PathBuf::from("./category-urls.txt"),
            broken_download_path: "/wp/download/".to_string(),
            fixed_download_path: "/wp/downloads/".to_string(),
            total_items: 18961,
        }
    }
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Pause between URL groups (seconds)
    pub sleep_seconds: u64,

    /// Catalogue entries requested per listing page
    pub items_per_page: u32,

    /// First catalogue page to fetch
    pub start_page: u32,

    /// Last catalogue page to fetch (0 = all)
    pub end_page: u32,

    /// Request timeout (seconds)
    pub timeout_seconds: u64,

    /// User-Agent header sent with every request
    pub user_agent: String,

    /// Follow redirects on article links to record their final URL
    pub resolve_redirects: bool,

    /// Fetch each catalogue entry's detail page
    pub fetch_details: bool,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            sleep_seconds: 3,
            items_per_page: 100,
            start_page: 1,
            end_page: 0,
            timeout_seconds: 30,
            user_agent: concat!("greyharvest/", env!("CARGO_PKG_VERSION")).to_string(),
            resolve_redirects: true,
            fetch_details: true,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Delimited output file; `None` or `-` writes to stdout
    pub csv_path: Option<PathBuf>,

    /// Column delimiter, a single ASCII character
    pub delimiter: String,

    /// Row terminator
    pub line_terminator: LineTerminator,

    /// Directory downloaded documents are saved to
    pub download_dir: PathBuf,

    /// Download the documents themselves
    pub download: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            csv_path: None,
            delimiter: "\t".to_string(),
            line_terminator: LineTerminator::Crlf,
            download_dir: PathBuf::from("docs"),
            download: false,
        }
    }
}

impl OutputConfig {
    /// Returns the delimiter as a byte; validation guarantees a single ASCII char
    pub fn delimiter_byte(&self) -> u8 {
        self.delimiter.as_bytes().first().copied().unwrap_or(b'\t')
    }
}

/// Explicit row terminator for delimited output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineTerminator {
    Crlf,
    Lf,
}

/// How seed URLs are discovered
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Method {
    /// Numbered catalogue listing pages, with per-document detail pages
    Catalogue,
    /// Monthly archive pages linked from the archive sidebar
    Archive,
    /// Regional collections linked from the site menu
    Region,
    /// Category pages from a pre-fetched URL list
    Category,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Catalogue => "catalogue",
            Method::Archive => "archive",
            Method::Region => "region",
            Method::Category => "category",
        }
    }
}
