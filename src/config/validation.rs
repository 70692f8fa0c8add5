//! Configuration validation
//!
//! All checks run before any browser is launched, so a bad configuration
//! fails fast instead of mid-scrape.

use crate::config::types::Config;
use crate::ConfigError;
use url::Url;

/// Validates a parsed configuration
///
/// # Checks
///
/// * At least one target URL, each parseable and http(s)
/// * `max-pages-per-subcategory` is at least 1
/// * Viewport dimensions are non-zero
/// * Database path is non-empty
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.scraper.urls.is_empty() {
        return Err(ConfigError::Validation(
            "scraper.urls must contain at least one URL".to_string(),
        ));
    }

    for raw in &config.scraper.urls {
        let url = Url::parse(raw).map_err(|e| {
            ConfigError::InvalidUrl(format!("{}: {}", raw, e))
        })?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::InvalidUrl(format!(
                "{}: only http and https URLs are supported",
                raw
            )));
        }
    }

    if config.scraper.max_pages_per_subcategory == 0 {
        return Err(ConfigError::Validation(
            "scraper.max-pages-per-subcategory must be at least 1".to_string(),
        ));
    }

    if config.browser.viewport.width == 0 || config.browser.viewport.height == 0 {
        return Err(ConfigError::Validation(
            "browser.viewport dimensions must be non-zero".to_string(),
        ));
    }

    if config.output.database_path.trim().is_empty() {
        return Err(ConfigError::Validation(
            "output.database-path must not be empty".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::{BrowserSettings, OutputConfig, ScraperConfig, Viewport};

    fn valid_config() -> Config {
        Config {
            scraper: ScraperConfig {
                urls: vec!["https://shop.example.com/fruit".to_string()],
                max_pages_per_subcategory: 5,
                settle_ms: 1500,
                excluded_link_texts: vec!["All".to_string()],
            },
            browser: BrowserSettings {
                headless: true,
                viewport: Viewport {
                    width: 1920,
                    height: 1080,
                },
            },
            output: OutputConfig {
                database_path: "./shelfline.db".to_string(),
            },
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(validate(&valid_config()).is_ok());
    }

    #[test]
    fn test_empty_urls_rejected() {
        let mut config = valid_config();
        config.scraper.urls.clear();
        assert!(matches!(
            validate(&config),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_malformed_url_rejected() {
        let mut config = valid_config();
        config.scraper.urls = vec!["not a url".to_string()];
        assert!(matches!(
            validate(&config),
            Err(ConfigError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_non_http_scheme_rejected() {
        let mut config = valid_config();
        config.scraper.urls = vec!["ftp://shop.example.com/fruit".to_string()];
        assert!(matches!(
            validate(&config),
            Err(ConfigError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_zero_page_bound_rejected() {
        let mut config = valid_config();
        config.scraper.max_pages_per_subcategory = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_zero_viewport_rejected() {
        let mut config = valid_config();
        config.browser.viewport.width = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_empty_database_path_rejected() {
        let mut config = valid_config();
        config.output.database_path = "  ".to_string();
        assert!(validate(&config).is_err());
    }
}
