use serde::Deserialize;

/// Main configuration structure for Shelfline
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub scraper: ScraperConfig,
    pub browser: BrowserSettings,
    pub output: OutputConfig,
}

/// Scraper behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ScraperConfig {
    /// Ordered list of top-level category URLs to scrape
    pub urls: Vec<String>,

    /// Maximum number of pagination cycles per subcategory (the initial
    /// page counts as one cycle)
    #[serde(rename = "max-pages-per-subcategory", default = "default_max_pages")]
    pub max_pages_per_subcategory: u32,

    /// Time to wait after navigation and after each load-more click
    /// (milliseconds)
    #[serde(rename = "settle-ms", default = "default_settle_ms")]
    pub settle_ms: u64,

    /// Subcategory links whose text contains any of these fragments
    /// (case-insensitive) are skipped
    #[serde(rename = "excluded-link-texts", default = "default_exclusions")]
    pub excluded_link_texts: Vec<String>,
}

/// Browser launch settings, copied read-only into every worker task
#[derive(Debug, Clone, Deserialize)]
pub struct BrowserSettings {
    #[serde(default = "default_headless")]
    pub headless: bool,

    pub viewport: Viewport,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

fn default_max_pages() -> u32 {
    5
}

fn default_settle_ms() -> u64 {
    1500
}

fn default_exclusions() -> Vec<String> {
    vec!["All".to_string()]
}

fn default_headless() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_applied() {
        let toml_str = r#"
[scraper]
urls = ["https://shop.example.com/fruit"]

[browser]
[browser.viewport]
width = 1280
height = 800

[output]
database-path = "./test.db"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.scraper.max_pages_per_subcategory, 5);
        assert_eq!(config.scraper.settle_ms, 1500);
        assert_eq!(config.scraper.excluded_link_texts, vec!["All".to_string()]);
        assert!(config.browser.headless);
    }
}
