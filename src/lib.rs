//! Shelfline: a grocery shelf scraper
//!
//! This crate drives a pool of isolated headless-browser workers over a set
//! of grocery category pages, paginates each subcategory to exhaustion,
//! extracts structured product records, and persists them to SQLite through
//! an upsert-oriented repository while emitting a deterministic sequence of
//! lifecycle events.

pub mod config;
pub mod events;
pub mod navigator;
pub mod output;
pub mod scraper;
pub mod storage;

use thiserror::Error;

/// Main error type for Shelfline operations
#[derive(Debug, Error)]
pub enum ShelfError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Navigator error: {0}")]
    Navigator(#[from] navigator::NavigatorError),

    #[error("Repository error: {0}")]
    Repository(#[from] storage::RepositoryError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Worker for {url} failed: {message}")]
    Worker { url: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Shelfline operations
pub type Result<T> = std::result::Result<T, ShelfError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use events::{EventBus, LifecycleEvent};
pub use scraper::{Orchestrator, ProductRecord, ScrapeSummary, SubcategoryLink};
