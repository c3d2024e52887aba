//! Download resolution and retrieval
//!
//! Catalogue download links under the broken `/wp/download/` path do not point at
//! the file: the corrected `/wp/downloads/` path leads to an indirection page whose
//! download button holds the real link. This module rewrites and follows such links,
//! downloads the final target, and reports the outcome as a [`DownloadOutcome`] whose
//! text goes into the record's Download field.

use crate::config::SiteConfig;
use crate::crawler::extractor::Extractor;
use crate::crawler::fetcher::fetch_page;
use reqwest::Client;
use std::fmt;
use std::path::{Path, PathBuf};
use url::Url;

/// Suffix some article links carry to make the site open them in a new tab
const NEW_TAB_MARKER: &str = "#new_tab";

/// Path rewrite for links that need one level of indirection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRewrite {
    pub broken_prefix: String,
    pub fixed_prefix: String,
}

impl From<&SiteConfig> for DownloadRewrite {
    fn from(site: &SiteConfig) -> Self {
        Self {
            broken_prefix: site.broken_download_path.clone(),
            fixed_prefix: site.fixed_download_path.clone(),
        }
    }
}

impl DownloadRewrite {
    /// Rewrites `candidate` when its path starts with the broken prefix
    ///
    /// Returns `None` for links that are already direct.
    pub fn rewrite(&self, candidate: &str) -> Option<String> {
        let mut url = Url::parse(candidate.trim()).ok()?;
        let rest = url.path().strip_prefix(&self.broken_prefix)?.to_string();
        url.set_path(&format!("{}{}", self.fixed_prefix, rest));
        Some(url.to_string())
    }
}

/// Result of a download attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// The file exists on disk after the download
    Saved(PathBuf),

    /// The download ran but no file appeared
    Missing { url: String },

    /// Nothing to download
    BlankUrl,

    /// The download itself failed
    Failed { url: String, reason: String },
}

impl DownloadOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, DownloadOutcome::Saved(_))
    }
}

impl fmt::Display for DownloadOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DownloadOutcome::Saved(path) => write!(f, "{}", path.display()),
            DownloadOutcome::Missing { url } => write!(f, "Warning: file not downloaded: {}", url),
            DownloadOutcome::BlankUrl => write!(f, "Warning: Blank URL provided"),
            DownloadOutcome::Failed { url, reason } => {
                write!(f, "Error downloading {}: {}", url, reason)
            }
        }
    }
}

/// Strips whitespace and the new-tab marker from a scraped link
pub fn clean_url(url: &str) -> String {
    let url = url.trim();
    url.strip_suffix(NEW_TAB_MARKER).unwrap_or(url).to_string()
}

/// Follows redirects with a HEAD request and returns the cleaned final URL
pub async fn resolve_final_url(client: &Client, url: &str) -> Result<String, reqwest::Error> {
    let response = client.head(url).send().await?;
    Ok(clean_url(response.url().as_str()))
}

/// Finds the real download target for a catalogue download link
///
/// Links under the broken prefix are rewritten and the indirection page is fetched
/// for its download button. When the page is unavailable or has no button, the
/// rewritten link is used. Other links are returned unchanged without any request.
pub async fn resolve_download_target(
    client: &Client,
    extractor: &Extractor,
    rewrite: &DownloadRewrite,
    candidate: &str,
) -> String {
    let Some(corrected) = rewrite.rewrite(candidate) else {
        return candidate.trim().to_string();
    };

    tracing::debug!("Resolving download indirection {} -> {}", candidate, corrected);
    match fetch_page(client, &corrected).await {
        Some(page) => extractor.find_download_button(&page).unwrap_or(corrected),
        None => corrected,
    }
}

/// Local file name for a download: the URL's final path segment, verbatim
pub fn target_file_name(url: &str) -> Option<String> {
    let name = match Url::parse(url) {
        Ok(parsed) => parsed.path_segments()?.last()?.to_string(),
        Err(_) => url.rsplit('/').next()?.to_string(),
    };
    (!name.is_empty()).then_some(name)
}

/// Downloads `url` into `dir`
///
/// A non-success HTTP status writes nothing and is reported as
/// [`DownloadOutcome::Missing`], even when an earlier run left a file with the same
/// name; transport and filesystem failures are [`DownloadOutcome::Failed`]. Existing
/// files with the same name are overwritten by a successful download.
pub async fn download_file(client: &Client, url: &str, dir: &Path) -> DownloadOutcome {
    let url = clean_url(url);
    if url.is_empty() {
        return DownloadOutcome::BlankUrl;
    }

    let Some(name) = target_file_name(&url) else {
        return DownloadOutcome::Missing { url };
    };
    let destination = dir.join(name);

    let written = match fetch_to_file(client, &url, dir, &destination).await {
        Ok(written) => written,
        Err(reason) => return DownloadOutcome::Failed { url, reason },
    };

    if written && destination.is_file() {
        tracing::info!("Downloaded {} to {}", url, destination.display());
        DownloadOutcome::Saved(destination)
    } else {
        tracing::warn!("File not downloaded: {}", url);
        DownloadOutcome::Missing { url }
    }
}

async fn fetch_to_file(
    client: &Client,
    url: &str,
    dir: &Path,
    destination: &Path,
) -> Result<bool, String> {
    let response = client.get(url).send().await.map_err(|e| e.to_string())?;

    let status = response.status();
    if !status.is_success() {
        tracing::warn!("Status {} downloading {}", status.as_u16(), url);
        return Ok(false);
    }

    let bytes = response.bytes().await.map_err(|e| e.to_string())?;
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| e.to_string())?;
    tokio::fs::write(destination, &bytes)
        .await
        .map_err(|e| e.to_string())?;
    Ok(true)
}
