//! Reporting on scraped data
//!
//! Statistics loaded from the repository (for the `--stats` mode) and a
//! progress logger that subscribes to the lifecycle event bus.

mod progress;
mod stats;

pub use progress::register_progress_logger;
pub use stats::{load_statistics, print_statistics, ScrapeStatistics};
