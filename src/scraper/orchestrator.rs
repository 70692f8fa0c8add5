//! Scrape orchestration: fan-out, fan-in, event sequencing
//!
//! The orchestrator launches one worker per configured URL, waits for every
//! worker with settle-all semantics (one worker's failure never cancels or
//! blocks the others), then walks the outcomes in original URL order,
//! persisting through the repository and publishing the lifecycle event
//! sequence. Workers run in parallel, but event emission happens in a
//! single post-collection pass, so the event order is deterministic and
//! replayable regardless of completion order.

use chrono::Utc;
use std::sync::{Arc, Mutex};

use crate::config::Config;
use crate::events::{EventBus, LifecycleEvent};
use crate::navigator::NavigatorFactory;
use crate::scraper::extractor::category_name_from_url;
use crate::scraper::worker::{run_worker, WorkerResult, WorkerTask};
use crate::storage::Repository;
use crate::storage::RunStatus;
use crate::Result;

/// Aggregate outcome of one orchestrated scrape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrapeSummary {
    pub total_urls: usize,
    pub successful_urls: usize,
    pub total_products: usize,
}

/// Coordinates workers, persistence, and event emission
pub struct Orchestrator {
    config: Arc<Config>,
    config_hash: String,
    repository: Arc<Mutex<dyn Repository + Send>>,
    factory: Arc<dyn NavigatorFactory>,
    bus: EventBus,
}

impl Orchestrator {
    pub fn new(
        config: Config,
        config_hash: String,
        repository: Arc<Mutex<dyn Repository + Send>>,
        factory: Arc<dyn NavigatorFactory>,
        bus: EventBus,
    ) -> Self {
        Self {
            config: Arc::new(config),
            config_hash,
            repository,
            factory,
            bus,
        }
    }

    /// Runs the full scrape
    ///
    /// Returns an error only when the run itself cannot be recorded; every
    /// per-URL failure is reported through results and events instead. The
    /// `all_finished` event is emitted once all URLs have been processed,
    /// so its absence signals catastrophic failure.
    pub async fn run(&self) -> Result<ScrapeSummary> {
        let urls = &self.config.scraper.urls;
        let run_id = self
            .repository
            .lock()
            .unwrap()
            .create_run(&self.config_hash)?;
        tracing::info!("Starting scrape run {} over {} URL(s)", run_id, urls.len());

        let results = self.run_workers().await;

        let mut summary = ScrapeSummary {
            total_urls: urls.len(),
            successful_urls: 0,
            total_products: 0,
        };

        // Single sequential pass in input order; workers completed in
        // whatever order the browser let them.
        for result in results {
            if result.success {
                summary.successful_urls += 1;
            }
            summary.total_products += self.process_result(run_id, result);
        }

        self.bus.publish(&LifecycleEvent::AllFinished {
            total_urls: summary.total_urls,
            successful_urls: summary.successful_urls,
            total_products: summary.total_products,
            timestamp: Utc::now(),
        });

        self.repository
            .lock()
            .unwrap()
            .complete_run(run_id, RunStatus::Completed)?;
        tracing::info!(
            "Scrape run {} finished: {}/{} URLs succeeded, {} products",
            run_id,
            summary.successful_urls,
            summary.total_urls,
            summary.total_products
        );
        Ok(summary)
    }

    /// Launches every worker and settles all of them
    ///
    /// A panicked or aborted worker task is converted into a failed
    /// result; results come back in input order.
    async fn run_workers(&self) -> Vec<WorkerResult> {
        let urls = &self.config.scraper.urls;
        let mut handles = Vec::with_capacity(urls.len());

        for (url_index, url) in urls.iter().enumerate() {
            let task = WorkerTask {
                url: url.clone(),
                url_index,
                total_urls: urls.len(),
                browser: self.config.browser.clone(),
                max_pages: self.config.scraper.max_pages_per_subcategory,
                settle_ms: self.config.scraper.settle_ms,
                excluded_link_texts: self.config.scraper.excluded_link_texts.clone(),
            };
            let factory = Arc::clone(&self.factory);
            handles.push((url.clone(), url_index, tokio::spawn(run_worker(task, factory))));
        }

        let mut results = Vec::with_capacity(handles.len());
        for (url, url_index, handle) in handles {
            match handle.await {
                Ok(result) => results.push(result),
                Err(e) => {
                    tracing::error!("Worker task for {} did not complete: {}", url, e);
                    results.push(WorkerResult::failed(
                        url,
                        url_index,
                        format!("worker task did not complete: {}", e),
                    ));
                }
            }
        }
        results
    }

    /// Emits the event sequence for one worker outcome and persists its
    /// data; returns the number of products counted for this URL
    ///
    /// Every URL yields exactly one category_started/category_finished
    /// pair, whatever the outcome.
    fn process_result(&self, run_id: i64, result: WorkerResult) -> usize {
        let category_name = category_name_from_url(&result.url);

        self.bus.publish(&LifecycleEvent::CategoryStarted {
            url: result.url.clone(),
            url_index: result.url_index,
            category_name: category_name.clone(),
            timestamp: Utc::now(),
        });

        let category = match (result.success, result.category.as_ref()) {
            (true, Some(category)) if !category.subcategories.is_empty() => category,
            _ => {
                // Failed worker or empty category: close the pair
                // symmetrically and move on.
                self.bus.publish(&LifecycleEvent::CategoryFinished {
                    url: result.url.clone(),
                    url_index: result.url_index,
                    category_id: None,
                    total_products: 0,
                    total_subcategories: 0,
                    success: result.success,
                    error: result.error.clone(),
                    timestamp: Utc::now(),
                });
                return 0;
            }
        };

        let category_id = match self
            .repository
            .lock()
            .unwrap()
            .upsert_category(run_id, &category_name, &result.url)
        {
            Ok(id) => id,
            Err(e) => {
                tracing::error!("Failed to persist category {}: {}", category_name, e);
                self.bus.publish(&LifecycleEvent::CategoryFinished {
                    url: result.url.clone(),
                    url_index: result.url_index,
                    category_id: None,
                    total_products: 0,
                    total_subcategories: category.subcategories.len(),
                    success: false,
                    error: Some(e.to_string()),
                    timestamp: Utc::now(),
                });
                return 0;
            }
        };

        let mut total_products = 0;
        let mut persist_failures = 0usize;
        for subcategory in &category.subcategories {
            self.bus.publish(&LifecycleEvent::SubcategoryStarted {
                url: result.url.clone(),
                url_index: result.url_index,
                category_id,
                subcategory_name: subcategory.name.clone(),
                subcategory_url: subcategory.url.clone(),
                timestamp: Utc::now(),
            });

            let persisted = {
                let mut repository = self.repository.lock().unwrap();
                repository
                    .upsert_subcategory(category_id, &subcategory.name, &subcategory.url)
                    .and_then(|subcategory_id| {
                        repository.upsert_products(subcategory_id, &subcategory.products)?;
                        Ok(subcategory_id)
                    })
            };

            // A persistence failure is confined to this subcategory; the
            // rest still proceed.
            let (subcategory_id, success, error) = match persisted {
                Ok(id) => (Some(id), true, None),
                Err(e) => {
                    tracing::error!(
                        "Failed to persist subcategory {}: {}",
                        subcategory.name,
                        e
                    );
                    persist_failures += 1;
                    (None, false, Some(e.to_string()))
                }
            };
            total_products += subcategory.products.len();

            self.bus.publish(&LifecycleEvent::SubcategoryFinished {
                url: result.url.clone(),
                url_index: result.url_index,
                category_id,
                subcategory_id,
                subcategory_name: subcategory.name.clone(),
                products: subcategory.products.clone(),
                success,
                error,
                timestamp: Utc::now(),
            });
        }

        // The category succeeds only if every subcategory persisted.
        let error = (persist_failures > 0).then(|| {
            format!(
                "{} of {} subcategories failed to persist",
                persist_failures,
                category.subcategories.len()
            )
        });
        self.bus.publish(&LifecycleEvent::CategoryFinished {
            url: result.url.clone(),
            url_index: result.url_index,
            category_id: Some(category_id),
            total_products,
            total_subcategories: category.subcategories.len(),
            success: persist_failures == 0,
            error,
            timestamp: Utc::now(),
        });

        total_products
    }
}
