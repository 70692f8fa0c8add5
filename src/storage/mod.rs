//! Storage module for persisting scraped listings
//!
//! Persistence is upsert-oriented: re-running a scrape updates existing
//! categories, subcategories and products in place instead of duplicating
//! them. Run tracking records when a scrape happened and with which
//! configuration.

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteRepository;
pub use traits::{Repository, RepositoryError, RepositoryResult};

/// A persisted product row
#[derive(Debug, Clone)]
pub struct StoredProduct {
    pub id: i64,
    pub subcategory_id: i64,
    pub name: String,
    pub price_text: Option<String>,
    pub price_value: Option<f64>,
    pub brand: Option<String>,
    pub link: Option<String>,
    pub image: Option<String>,
    pub description: String,
    pub price_per_kilo: Option<String>,
    pub discount: Option<String>,
    pub category_name: String,
}

/// A scrape run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: RunStatus,
}

/// Status of a scrape run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// Parses a raw display price into a numeric value
///
/// The site renders prices like "1,99 €" or "12,50 €/kg": currency marker
/// and unit suffix are stripped and the decimal comma normalized. Returns
/// `None` for text that carries no parseable number.
pub fn parse_price_value(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.replace(',', ".").parse::<f64>().ok()
}
