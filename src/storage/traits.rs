//! Repository trait and error types

use thiserror::Error;

use crate::scraper::ProductRecord;
use crate::storage::{RunRecord, RunStatus, StoredProduct};

/// Errors that can occur during repository operations
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Upsert-oriented persistence interface consumed by the orchestrator
///
/// Categories and subcategories are keyed by URL, products by name within
/// their subcategory; repeated scrapes update rows in place.
pub trait Repository {
    // ===== Run tracking =====

    /// Creates a new scrape run, returning its ID
    fn create_run(&mut self, config_hash: &str) -> RepositoryResult<i64>;

    /// Marks a run finished with the given status
    fn complete_run(&mut self, run_id: i64, status: RunStatus) -> RepositoryResult<()>;

    /// Gets the most recent run
    fn latest_run(&self) -> RepositoryResult<Option<RunRecord>>;

    // ===== Upserts =====

    /// Inserts or updates a category, returning its ID
    fn upsert_category(&mut self, run_id: i64, name: &str, url: &str) -> RepositoryResult<i64>;

    /// Inserts or updates a subcategory under a category, returning its ID
    fn upsert_subcategory(
        &mut self,
        category_id: i64,
        name: &str,
        url: &str,
    ) -> RepositoryResult<i64>;

    /// Inserts or updates a batch of products under a subcategory,
    /// returning how many rows were written
    fn upsert_products(
        &mut self,
        subcategory_id: i64,
        products: &[ProductRecord],
    ) -> RepositoryResult<usize>;

    // ===== Queries =====

    /// All products stored for a subcategory
    fn products_for_subcategory(
        &self,
        subcategory_id: i64,
    ) -> RepositoryResult<Vec<StoredProduct>>;

    /// Product counts per category name, sorted by name
    fn category_totals(&self) -> RepositoryResult<Vec<(String, u64)>>;

    fn count_categories(&self) -> RepositoryResult<u64>;

    fn count_subcategories(&self) -> RepositoryResult<u64>;

    fn count_products(&self) -> RepositoryResult<u64>;
}
