//! Worker: one top-level URL, end to end, in isolation
//!
//! A worker acquires its own browser, discovers subcategories, paginates
//! each one in sequence, and reports a structured result. Errors never
//! escape the worker boundary as panics or propagated errors: every failure
//! mode becomes either an empty subcategory bucket or a failed
//! [`WorkerResult`]. The browser is released on every exit path.

use std::sync::Arc;
use url::Url;

use crate::config::BrowserSettings;
use crate::navigator::{NavigatorFactory, PageNavigator};
use crate::scraper::extractor::{self, ProductRecord};
use crate::scraper::paginator::Paginator;
use crate::ShelfError;

/// Immutable input to one worker, built once by the orchestrator
#[derive(Debug, Clone)]
pub struct WorkerTask {
    pub url: String,
    pub url_index: usize,
    pub total_urls: usize,
    pub browser: BrowserSettings,
    pub max_pages: u32,
    pub settle_ms: u64,
    pub excluded_link_texts: Vec<String>,
}

/// Everything one worker scraped for its URL
#[derive(Debug, Clone)]
pub struct CategoryInfo {
    pub name: String,
    pub subcategories: Vec<SubcategoryScrape>,
}

/// One subcategory's accumulated products
#[derive(Debug, Clone)]
pub struct SubcategoryScrape {
    pub name: String,
    pub url: String,
    pub products: Vec<ProductRecord>,
}

/// Outcome of one worker
///
/// Exactly one of `category` or `error` is meaningful, gated by `success`.
#[derive(Debug, Clone)]
pub struct WorkerResult {
    pub success: bool,
    pub url: String,
    pub url_index: usize,
    pub category: Option<CategoryInfo>,
    pub error: Option<String>,
}

impl WorkerResult {
    pub fn succeeded(url: String, url_index: usize, category: CategoryInfo) -> Self {
        Self {
            success: true,
            url,
            url_index,
            category: Some(category),
            error: None,
        }
    }

    pub fn failed(url: String, url_index: usize, error: String) -> Self {
        Self {
            success: false,
            url,
            url_index,
            category: None,
            error: Some(error),
        }
    }
}

/// Processes one top-level URL with a dedicated browser
///
/// Never returns an error: browser acquisition and navigation failures are
/// converted into a failed result.
pub async fn run_worker(task: WorkerTask, factory: Arc<dyn NavigatorFactory>) -> WorkerResult {
    tracing::info!(
        "[{}/{}] Scraping {}",
        task.url_index + 1,
        task.total_urls,
        task.url
    );

    let mut navigator = match factory.open(&task.browser).await {
        Ok(navigator) => navigator,
        Err(e) => {
            tracing::error!("Browser launch failed for {}: {}", task.url, e);
            return WorkerResult::failed(task.url, task.url_index, e.to_string());
        }
    };

    let outcome = scrape_category(navigator.as_ref(), &task).await;

    // Release the browser before reporting, on success and failure alike.
    if let Err(e) = navigator.close().await {
        tracing::warn!("Failed to release browser for {}: {}", task.url, e);
    }

    match outcome {
        Ok(category) => {
            tracing::info!(
                "[{}/{}] Finished {}: {} subcategories",
                task.url_index + 1,
                task.total_urls,
                task.url,
                category.subcategories.len()
            );
            WorkerResult::succeeded(task.url, task.url_index, category)
        }
        Err(e) => {
            tracing::error!("Worker for {} failed: {}", task.url, e);
            WorkerResult::failed(task.url, task.url_index, e.to_string())
        }
    }
}

/// Scrapes the category page: discover subcategories, paginate each in
/// sequence
///
/// Subcategories share the worker's single browser and must not race on the
/// same page, so they run strictly one after another. A subcategory whose
/// pagination fails is recorded with an empty product list; the rest
/// continue.
async fn scrape_category(
    navigator: &dyn PageNavigator,
    task: &WorkerTask,
) -> Result<CategoryInfo, ShelfError> {
    let base = Url::parse(&task.url)?;

    navigator.navigate(&task.url).await?;
    navigator.wait(task.settle_ms).await;

    let links = extractor::extract_subcategory_links(navigator, &base).await?;
    let links = extractor::filter_excluded(links, &task.excluded_link_texts);
    tracing::debug!("{} subcategories after filtering on {}", links.len(), task.url);

    let mut subcategories = Vec::with_capacity(links.len());
    for link in links {
        let name = extractor::clean_subcategory_name(&link.text);
        let paginator = Paginator::new(navigator, task.max_pages, task.settle_ms);

        let products = match paginator.collect_products(&link.href, &name).await {
            Ok(products) => products,
            Err(e) => {
                tracing::warn!("Subcategory {} ({}) failed: {}", name, link.href, e);
                Vec::new()
            }
        };

        subcategories.push(SubcategoryScrape {
            name,
            url: link.href,
            products,
        });
    }

    Ok(CategoryInfo {
        name: extractor::category_name_from_url(&task.url),
        subcategories,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Viewport;
    use crate::navigator::scripted::{
        ScriptedFactory, ScriptedLink, ScriptedPage, ScriptedTile,
    };
    use std::collections::HashMap;

    const CATEGORY_URL: &str = "https://shop.example.com/categories/fresh-fruit";

    fn settings() -> BrowserSettings {
        BrowserSettings {
            headless: true,
            viewport: Viewport {
                width: 1280,
                height: 800,
            },
        }
    }

    fn task() -> WorkerTask {
        WorkerTask {
            url: CATEGORY_URL.to_string(),
            url_index: 0,
            total_urls: 1,
            browser: settings(),
            max_pages: 5,
            settle_ms: 0,
            excluded_link_texts: vec!["All".to_string()],
        }
    }

    fn listing(names: &[&str]) -> ScriptedPage {
        ScriptedPage {
            tile_batches: vec![names.iter().map(|n| ScriptedTile::named(n)).collect()],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_worker_scrapes_filtered_subcategories_in_order() {
        let mut pages = HashMap::new();
        pages.insert(
            CATEGORY_URL.to_string(),
            ScriptedPage {
                subcategories: vec![
                    ScriptedLink::new("Citrus 12", "/fruit/citrus"),
                    ScriptedLink::new("All fruit", "/fruit/all"),
                    ScriptedLink::new("Berries", "/fruit/berries"),
                ],
                ..Default::default()
            },
        );
        pages.insert(
            "https://shop.example.com/fruit/citrus".to_string(),
            listing(&["Lemon", "Lime"]),
        );
        pages.insert(
            "https://shop.example.com/fruit/berries".to_string(),
            listing(&["Blueberry"]),
        );
        let factory = Arc::new(ScriptedFactory::new(pages));

        let result = run_worker(task(), factory.clone()).await;

        assert!(result.success);
        let category = result.category.unwrap();
        assert_eq!(category.name, "Fresh Fruit");
        let names: Vec<_> = category
            .subcategories
            .iter()
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(names, vec!["Citrus", "Berries"]);
        assert_eq!(category.subcategories[0].products.len(), 2);
        assert_eq!(category.subcategories[1].products.len(), 1);
        assert!(factory.all_closed());
    }

    #[tokio::test]
    async fn test_failed_subcategory_recorded_empty_rest_continue() {
        let mut pages = HashMap::new();
        pages.insert(
            CATEGORY_URL.to_string(),
            ScriptedPage {
                subcategories: vec![
                    ScriptedLink::new("Citrus", "/fruit/citrus"),
                    ScriptedLink::new("Berries", "/fruit/berries"),
                ],
                ..Default::default()
            },
        );
        pages.insert(
            "https://shop.example.com/fruit/citrus".to_string(),
            ScriptedPage {
                fail_navigation: true,
                ..Default::default()
            },
        );
        pages.insert(
            "https://shop.example.com/fruit/berries".to_string(),
            listing(&["Blueberry"]),
        );
        let factory = Arc::new(ScriptedFactory::new(pages));

        let result = run_worker(task(), factory).await;

        assert!(result.success);
        let category = result.category.unwrap();
        assert_eq!(category.subcategories.len(), 2);
        assert!(category.subcategories[0].products.is_empty());
        assert_eq!(category.subcategories[1].products.len(), 1);
    }

    #[tokio::test]
    async fn test_launch_failure_reports_failed_result() {
        let factory = Arc::new(ScriptedFactory::new(HashMap::new()));
        factory.fail_next_open();

        let result = run_worker(task(), factory.clone()).await;

        assert!(!result.success);
        assert!(result.category.is_none());
        assert!(result.error.unwrap().contains("launch"));
        assert_eq!(factory.opened_count(), 0);
    }

    #[tokio::test]
    async fn test_browser_released_when_top_level_navigation_fails() {
        let mut pages = HashMap::new();
        pages.insert(
            CATEGORY_URL.to_string(),
            ScriptedPage {
                fail_navigation: true,
                ..Default::default()
            },
        );
        let factory = Arc::new(ScriptedFactory::new(pages));

        let result = run_worker(task(), factory.clone()).await;

        assert!(!result.success);
        assert!(result.error.is_some());
        assert_eq!(factory.opened_count(), 1);
        assert!(factory.all_closed());
    }
}
