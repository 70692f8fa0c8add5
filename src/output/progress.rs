//! Progress logging over the event bus

use crate::events::{EventBus, LifecycleEvent, Subscription};

/// Registers a handler that logs every lifecycle event
///
/// The returned subscription keeps the logger alive; drop it to stop
/// logging.
pub fn register_progress_logger(bus: &EventBus) -> Subscription {
    bus.subscribe(|event| match event {
        LifecycleEvent::CategoryStarted {
            url_index,
            category_name,
            ..
        } => {
            tracing::info!("[{}] Category started: {}", url_index, category_name);
        }
        LifecycleEvent::SubcategoryStarted {
            subcategory_name, ..
        } => {
            tracing::info!("  Subcategory started: {}", subcategory_name);
        }
        LifecycleEvent::SubcategoryFinished {
            subcategory_name,
            products,
            success,
            error,
            ..
        } => {
            if *success {
                tracing::info!(
                    "  Subcategory finished: {} ({} products)",
                    subcategory_name,
                    products.len()
                );
            } else {
                tracing::warn!(
                    "  Subcategory failed: {} ({})",
                    subcategory_name,
                    error.as_deref().unwrap_or("unknown error")
                );
            }
        }
        LifecycleEvent::CategoryFinished {
            url_index,
            total_products,
            total_subcategories,
            success,
            error,
            ..
        } => {
            if *success {
                tracing::info!(
                    "[{}] Category finished: {} products in {} subcategories",
                    url_index,
                    total_products,
                    total_subcategories
                );
            } else {
                tracing::warn!(
                    "[{}] Category failed: {}",
                    url_index,
                    error.as_deref().unwrap_or("unknown error")
                );
            }
        }
        LifecycleEvent::AllFinished {
            total_urls,
            successful_urls,
            total_products,
            ..
        } => {
            tracing::info!(
                "All finished: {}/{} URLs succeeded, {} products total",
                successful_urls,
                total_urls,
                total_products
            );
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_logger_registers_and_unregisters() {
        let bus = EventBus::new();
        let subscription = register_progress_logger(&bus);
        assert_eq!(bus.handler_count(), 1);

        // Must not panic on any variant.
        bus.publish(&LifecycleEvent::AllFinished {
            total_urls: 0,
            successful_urls: 0,
            total_products: 0,
            timestamp: Utc::now(),
        });

        drop(subscription);
        assert_eq!(bus.handler_count(), 0);
    }
}
