//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the harvester:
//! - Building the HTTP client with the configured user agent and timeout
//! - GET requests for listing, detail and indirection pages
//! - Error classification
//!
//! There is no retry and no cache: a page that cannot be fetched is reported as
//! unavailable and the caller decides what that means.

use crate::config::CrawlerConfig;
use reqwest::{redirect::Policy, Client, StatusCode};
use scraper::Html;
use std::time::Duration;
use url::Url;

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchResult {
    /// Successfully fetched the page
    Success {
        /// Final URL after redirects
        final_url: String,
        /// HTTP status code
        status_code: u16,
        /// Page body content
        body: String,
    },

    /// Server answered with anything other than 200
    HttpError {
        /// The HTTP status code
        status_code: u16,
    },

    /// Network error (connection refused, timeout, unreadable body, etc.)
    NetworkError {
        /// Error description
        error: String,
    },
}

/// A fetched and parsed HTML page
pub struct Page {
    /// Final URL after redirects, used to resolve relative links
    pub url: Url,
    document: Html,
}

impl Page {
    /// Parses `body` as an HTML document located at `url`
    pub fn parse(url: Url, body: &str) -> Self {
        Self {
            url,
            document: Html::parse_document(body),
        }
    }

    pub fn document(&self) -> &Html {
        &self.document
    }
}

impl std::fmt::Debug for Page {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Page").field("url", &self.url.as_str()).finish()
    }
}

/// Builds an HTTP client with proper configuration
///
/// Redirects are followed, up to 10 hops.
///
/// # Example
///
/// ```no_run
/// use greyharvest::config::CrawlerConfig;
/// use greyharvest::crawler::build_http_client;
///
/// let client = build_http_client(&CrawlerConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &CrawlerConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(Duration::from_secs(config.timeout_seconds))
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL and classifies the outcome
///
/// | Condition | Result |
/// |-----------|--------|
/// | HTTP 200 | Success |
/// | Any other status | HttpError |
/// | Timeout / connect failure / body read failure | NetworkError |
pub async fn fetch_url(client: &Client, url: &str) -> FetchResult {
    match client.get(url).send().await {
        Ok(response) => {
            let status = response.status();
            let final_url = response.url().to_string();

            if status != StatusCode::OK {
                return FetchResult::HttpError {
                    status_code: status.as_u16(),
                };
            }

            match response.text().await {
                Ok(body) => FetchResult::Success {
                    final_url,
                    status_code: status.as_u16(),
                    body,
                },
                Err(e) => FetchResult::NetworkError {
                    error: e.to_string(),
                },
            }
        }
        Err(e) => {
            let error = if e.is_timeout() {
                "Request timeout".to_string()
            } else if e.is_connect() {
                "Connection refused".to_string()
            } else {
                e.to_string()
            };
            FetchResult::NetworkError { error }
        }
    }
}

/// Fetches and parses a page
///
/// Returns `None` (after logging a warning) when the page is unavailable for any
/// reason: non-200 status, transport failure, or an unparseable URL.
pub async fn fetch_page(client: &Client, url: &str) -> Option<Page> {
    match fetch_url(client, url).await {
        FetchResult::Success {
            final_url, body, ..
        } => {
            let page_url = match Url::parse(&final_url) {
                Ok(u) => u,
                Err(e) => {
                    tracing::warn!("Unusable URL {}: {}", final_url, e);
                    return None;
                }
            };
            Some(Page::parse(page_url, &body))
        }
        FetchResult::HttpError { status_code } => {
            tracing::warn!("Status {} for {}", status_code, url);
            None
        }
        FetchResult::NetworkError { error } => {
            tracing::warn!("{} for {}", error, url);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client() -> Client {
        build_http_client(&CrawlerConfig::default()).unwrap()
    }

    #[test]
    fn test_build_http_client() {
        assert!(build_http_client(&CrawlerConfig::default()).is_ok());
    }

    #[tokio::test]
    async fn test_fetch_page_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/list"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("<html><head><title>List</title></head></html>"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let page = fetch_page(&client(), &format!("{}/list", server.uri()))
            .await
            .unwrap();
        assert_eq!(page.url.path(), "/list");
    }

    #[tokio::test]
    async fn test_fetch_page_non_200_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gone"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let url = format!("{}/gone", server.uri());
        assert!(fetch_page(&client(), &url).await.is_none());
        assert!(matches!(
            fetch_url(&client(), &url).await,
            FetchResult::HttpError { status_code: 404 }
        ));
    }

    #[tokio::test]
    async fn test_fetch_page_unreachable_is_none() {
        let server = MockServer::start().await;
        let url = format!("{}/list", server.uri());
        drop(server);

        assert!(fetch_page(&client(), &url).await.is_none());
    }

    #[tokio::test]
    async fn test_no_cache_between_fetches() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/same"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<p>x</p>"))
            .expect(2)
            .mount(&server)
            .await;

        let url = format!("{}/same", server.uri());
        let client = client();
        assert!(fetch_page(&client, &url).await.is_some());
        assert!(fetch_page(&client, &url).await.is_some());
    }
}
