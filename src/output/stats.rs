//! Statistics generation from the scrape database

use crate::storage::{Repository, RunRecord};
use crate::Result;

/// Scrape statistics summary
#[derive(Debug, Clone)]
pub struct ScrapeStatistics {
    pub total_categories: u64,
    pub total_subcategories: u64,
    pub total_products: u64,
    /// Product counts per category name, sorted by name
    pub per_category: Vec<(String, u64)>,
    pub latest_run: Option<RunRecord>,
}

/// Loads statistics from the repository
pub fn load_statistics(repository: &dyn Repository) -> Result<ScrapeStatistics> {
    Ok(ScrapeStatistics {
        total_categories: repository.count_categories()?,
        total_subcategories: repository.count_subcategories()?,
        total_products: repository.count_products()?,
        per_category: repository.category_totals()?,
        latest_run: repository.latest_run()?,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &ScrapeStatistics) {
    println!("=== Scrape Statistics ===\n");

    println!("Overview:");
    println!("  Categories: {}", stats.total_categories);
    println!("  Subcategories: {}", stats.total_subcategories);
    println!("  Products: {}", stats.total_products);
    println!();

    if !stats.per_category.is_empty() {
        println!("Products by Category:");
        for (name, count) in &stats.per_category {
            let percentage = if stats.total_products > 0 {
                (*count as f64 / stats.total_products as f64) * 100.0
            } else {
                0.0
            };
            println!("  {}: {} ({:.1}%)", name, count, percentage);
        }
        println!();
    }

    match &stats.latest_run {
        Some(run) => {
            println!(
                "Latest run: #{} started {} ({:?})",
                run.id, run.started_at, run.status
            );
            if let Some(finished) = &run.finished_at {
                println!("  finished {}", finished);
            }
        }
        None => println!("No runs recorded yet."),
    }
}
