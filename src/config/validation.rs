use crate::config::types::{Config, CrawlerConfig, OutputConfig, SiteConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_site_config(&config.site)?;
    validate_crawler_config(&config.crawler)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates seed URLs and download path rewriting
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    for placeholder in ["{page}", "{per-page}"] {
        if !config.catalogue_url.contains(placeholder) {
            return Err(ConfigError::Validation(format!(
                "catalogue-url must contain the {} placeholder",
                placeholder
            )));
        }
    }

    validate_url("catalogue-url", &config.catalogue_url)?;
    validate_url("archive-url", &config.archive_url)?;
    validate_url("region-url", &config.region_url)?;

    validate_download_path("broken-download-path", &config.broken_download_path)?;
    validate_download_path("fixed-download-path", &config.fixed_download_path)?;

    if config.total_items < 1 {
        return Err(ConfigError::Validation(
            "total-items must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.items_per_page < 1 {
        return Err(ConfigError::Validation(format!(
            "items-per-page must be >= 1, got {}",
            config.items_per_page
        )));
    }

    if config.start_page < 1 {
        return Err(ConfigError::Validation(format!(
            "start-page must be >= 1, got {}",
            config.start_page
        )));
    }

    // end-page 0 means "all pages"
    if config.end_page != 0 && config.end_page < config.start_page {
        return Err(ConfigError::Validation(format!(
            "end-page ({}) must not be before start-page ({})",
            config.end_page, config.start_page
        )));
    }

    if config.timeout_seconds < 1 {
        return Err(ConfigError::Validation(
            "timeout-seconds must be >= 1".to_string(),
        ));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    let delimiter = config.delimiter.as_bytes();
    if delimiter.len() != 1 || !delimiter[0].is_ascii() {
        return Err(ConfigError::Validation(format!(
            "delimiter must be a single ASCII character, got {:?}",
            config.delimiter
        )));
    }

    if matches!(delimiter[0], b'"' | b'\r' | b'\n') {
        return Err(ConfigError::Validation(format!(
            "delimiter cannot be a quote or line break, got {:?}",
            config.delimiter
        )));
    }

    if config.download_dir.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "download-dir cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_url(name: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", name, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https",
            name, value
        )));
    }

    Ok(())
}

fn validate_download_path(name: &str, value: &str) -> Result<(), ConfigError> {
    if value.len() < 2 || !value.starts_with('/') || !value.ends_with('/') {
        return Err(ConfigError::Validation(format!(
            "{} must start and end with '/', got '{}'",
            name, value
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_catalogue_url_needs_placeholders() {
        let mut config = Config::default();
        config.site.catalogue_url = "https://example.com/list?pagenum={page}".to_string();
        let err = validate(&config).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("{per-page}"));
    }

    #[test]
    fn test_invalid_seed_url() {
        let mut config = Config::default();
        config.site.region_url = "not a url".to_string();
        assert!(matches!(
            validate(&config).unwrap_err(),
            ConfigError::InvalidUrl(_)
        ));

        config.site.region_url = "ftp://example.com/".to_string();
        assert!(matches!(
            validate(&config).unwrap_err(),
            ConfigError::InvalidUrl(_)
        ));
    }

    #[test]
    fn test_items_per_page_zero() {
        let mut config = Config::default();
        config.crawler.items_per_page = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_page_range() {
        let mut config = Config::default();
        config.crawler.start_page = 3;
        config.crawler.end_page = 0;
        assert!(validate(&config).is_ok());

        config.crawler.end_page = 2;
        assert!(validate(&config).is_err());

        config.crawler.end_page = 3;
        assert!(validate(&config).is_ok());

        config.crawler.start_page = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_validate_delimiter() {
        let mut config = Config::default();
        config.output.delimiter = ",".to_string();
        assert!(validate(&config).is_ok());

        config.output.delimiter = "".to_string();
        assert!(validate(&config).is_err());

        config.output.delimiter = "::".to_string();
        assert!(validate(&config).is_err());

        config.output.delimiter = "\u{a0}".to_string();
        assert!(validate(&config).is_err());

        config.output.delimiter = "\"".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_validate_download_path() {
        assert!(validate_download_path("p", "/wp/download/").is_ok());
        assert!(validate_download_path("p", "/").is_err());
        assert!(validate_download_path("p", "wp/download/").is_err());
        assert!(validate_download_path("p", "/wp/download").is_err());
    }
}
