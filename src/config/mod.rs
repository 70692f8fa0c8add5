//! Configuration loading and validation
//!
//! Configuration is read from a TOML file and validated before any browser
//! is launched. A SHA-256 hash of the file content is recorded with each
//! scrape run so stored data can be traced back to the exact settings that
//! produced it.

mod parser;
mod types;
mod validation;

pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use types::{BrowserSettings, Config, OutputConfig, ScraperConfig, Viewport};
pub use validation::validate;
