//! Load-more pagination
//!
//! Drives one subcategory listing to exhaustion: extract the tiles
//! currently present, click the load-more control, settle, repeat. The
//! listing DOM is append-only under load-more, so each cycle consumes only
//! the tiles beyond the ones already extracted. A page bound caps the
//! number of cycles as a safety valve against a control that never
//! disappears.

use url::Url;

use crate::navigator::PageNavigator;
use crate::scraper::extractor::{self, ProductRecord};
use crate::scraper::selectors;
use crate::ShelfError;

/// Pagination phases
///
/// `Loading -> Extracted -> {LoadedMore -> Loading, Done}`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PaginatorPhase {
    Loading,
    Extracted,
    LoadedMore,
    Done,
}

/// Paginates one listing URL and accumulates its product records
pub struct Paginator<'a> {
    navigator: &'a dyn PageNavigator,
    /// Maximum extraction cycles; the initial page counts as one
    max_pages: u32,
    /// Settle time after navigation and after each load-more click
    settle_ms: u64,
}

impl<'a> Paginator<'a> {
    pub fn new(navigator: &'a dyn PageNavigator, max_pages: u32, settle_ms: u64) -> Self {
        Self {
            navigator,
            max_pages,
            settle_ms,
        }
    }

    /// Runs the listing at `url` to exhaustion and returns every record
    /// accumulated across all cycles, labelled with `category`
    ///
    /// Navigation failure is fatal for this listing; a failed load-more
    /// click only ends pagination.
    pub async fn collect_products(
        &self,
        url: &str,
        category: &str,
    ) -> Result<Vec<ProductRecord>, ShelfError> {
        let base = Url::parse(url)?;

        self.navigator.navigate(url).await?;
        self.navigator.wait(self.settle_ms).await;

        let mut phase = PaginatorPhase::Loading;
        let mut products: Vec<ProductRecord> = Vec::new();
        let mut pages = 0u32;

        while phase != PaginatorPhase::Done {
            match phase {
                PaginatorPhase::Loading => {
                    let extracted =
                        extractor::extract_products(self.navigator, category, &base).await?;
                    // Append-only DOM: everything before `products.len()`
                    // was consumed in an earlier cycle.
                    if extracted.len() > products.len() {
                        products.extend_from_slice(&extracted[products.len()..]);
                    }
                    pages += 1;
                    phase = PaginatorPhase::Extracted;
                }

                PaginatorPhase::Extracted => {
                    if pages >= self.max_pages {
                        tracing::debug!(
                            "Page bound {} reached for {}, stopping pagination",
                            self.max_pages,
                            url
                        );
                        phase = PaginatorPhase::Done;
                        continue;
                    }

                    let visible = self
                        .navigator
                        .is_visible(selectors::LOAD_MORE)
                        .await
                        .unwrap_or(false);
                    if !visible {
                        phase = PaginatorPhase::Done;
                        continue;
                    }

                    // The control can disappear between the visibility check
                    // and the click; that just means we are done.
                    match self.navigator.click(selectors::LOAD_MORE).await {
                        Ok(()) => phase = PaginatorPhase::LoadedMore,
                        Err(e) => {
                            tracing::debug!("Load-more click failed for {}: {}", url, e);
                            phase = PaginatorPhase::Done;
                        }
                    }
                }

                PaginatorPhase::LoadedMore => {
                    self.navigator.wait(self.settle_ms).await;
                    phase = PaginatorPhase::Loading;
                }

                PaginatorPhase::Done => unreachable!(),
            }
        }

        tracing::debug!(
            "Collected {} products over {} page(s) from {}",
            products.len(),
            pages,
            url
        );
        Ok(products)
    }
}
