//! Scraping core
//!
//! This module contains the concurrent multi-URL scraping pipeline:
//! - Record extraction from listing pages (fail-soft per element)
//! - Load-more pagination bounded by a page limit
//! - Isolated per-URL workers, one browser each
//! - The orchestrator: fan-out, settle-all fan-in, and deterministic
//!   lifecycle event sequencing

mod extractor;
mod orchestrator;
mod paginator;
pub mod selectors;
mod worker;

pub use extractor::{
    absolutize, category_name_from_url, classify_secondary, clean_subcategory_name,
    extract_products, extract_subcategory_links, filter_excluded, ProductRecord, SubcategoryLink,
};
pub use orchestrator::{Orchestrator, ScrapeSummary};
pub use paginator::Paginator;
pub use worker::{run_worker, CategoryInfo, SubcategoryScrape, WorkerResult, WorkerTask};
