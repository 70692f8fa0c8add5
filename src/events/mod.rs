//! Lifecycle events and the in-process event bus
//!
//! The orchestrator turns every worker outcome into a deterministic
//! sequence of [`LifecycleEvent`]s and publishes them on an [`EventBus`].
//! The bus is an explicit, dependency-injected object rather than
//! process-wide state; tests build an isolated bus per case. Handlers run
//! synchronously in registration order, so a slow handler delays the
//! events that follow it in the same pass.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::scraper::ProductRecord;

/// Event emitted while processing scrape results
///
/// Events are ephemeral: the core never persists them. Identifiers assigned
/// by the repository (`category_id`, `subcategory_id`) are carried so a
/// handler can correlate events for the same URL.
#[derive(Debug, Clone)]
pub enum LifecycleEvent {
    CategoryStarted {
        url: String,
        url_index: usize,
        category_name: String,
        timestamp: DateTime<Utc>,
    },
    SubcategoryStarted {
        url: String,
        url_index: usize,
        category_id: i64,
        subcategory_name: String,
        subcategory_url: String,
        timestamp: DateTime<Utc>,
    },
    SubcategoryFinished {
        url: String,
        url_index: usize,
        category_id: i64,
        subcategory_id: Option<i64>,
        subcategory_name: String,
        products: Vec<ProductRecord>,
        success: bool,
        error: Option<String>,
        timestamp: DateTime<Utc>,
    },
    CategoryFinished {
        url: String,
        url_index: usize,
        category_id: Option<i64>,
        total_products: usize,
        total_subcategories: usize,
        success: bool,
        error: Option<String>,
        timestamp: DateTime<Utc>,
    },
    AllFinished {
        total_urls: usize,
        successful_urls: usize,
        total_products: usize,
        timestamp: DateTime<Utc>,
    },
}

impl LifecycleEvent {
    /// Short name for logging
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CategoryStarted { .. } => "category_started",
            Self::SubcategoryStarted { .. } => "subcategory_started",
            Self::SubcategoryFinished { .. } => "subcategory_finished",
            Self::CategoryFinished { .. } => "category_finished",
            Self::AllFinished { .. } => "all_finished",
        }
    }
}

type Handler = Arc<dyn Fn(&LifecycleEvent) + Send + Sync>;

struct Registry {
    handlers: Vec<(u64, Handler)>,
}

/// In-process publish-subscribe channel for lifecycle events
///
/// Cloning the bus clones a reference to the same handler set.
#[derive(Clone)]
pub struct EventBus {
    registry: Arc<Mutex<Registry>>,
    next_id: Arc<AtomicU64>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(Mutex::new(Registry {
                handlers: Vec::new(),
            })),
            next_id: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Registers a handler, returning a disposer guard
    ///
    /// The handler is removed when the returned [`Subscription`] is dropped.
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&LifecycleEvent) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.registry
            .lock()
            .unwrap()
            .handlers
            .push((id, Arc::new(handler)));
        Subscription {
            id,
            registry: Arc::clone(&self.registry),
        }
    }

    /// Delivers an event to every registered handler, in registration order
    ///
    /// The handler set is snapshotted before invocation, so a handler may
    /// subscribe, unsubscribe, or publish from inside its callback. Handlers
    /// registered during a publish only see subsequent events.
    pub fn publish(&self, event: &LifecycleEvent) {
        let handlers: Vec<Handler> = self
            .registry
            .lock()
            .unwrap()
            .handlers
            .iter()
            .map(|(_, handler)| Arc::clone(handler))
            .collect();
        for handler in handlers {
            handler(event);
        }
    }

    /// Number of registered handlers
    pub fn handler_count(&self) -> usize {
        self.registry.lock().unwrap().handlers.len()
    }
}

/// Disposer for a registered handler
///
/// Dropping the subscription unregisters the handler. Call [`forget`] to
/// keep the handler alive for the lifetime of the bus instead.
///
/// [`forget`]: Subscription::forget
pub struct Subscription {
    id: u64,
    registry: Arc<Mutex<Registry>>,
}

impl Subscription {
    /// Leaves the handler registered permanently
    pub fn forget(self) {
        std::mem::forget(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.registry
            .lock()
            .unwrap()
            .handlers
            .retain(|(id, _)| *id != self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_event() -> LifecycleEvent {
        LifecycleEvent::AllFinished {
            total_urls: 1,
            successful_urls: 1,
            total_products: 0,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_publish_reaches_all_handlers() {
        let bus = EventBus::new();
        let seen_a = Arc::new(Mutex::new(0));
        let seen_b = Arc::new(Mutex::new(0));

        let a = Arc::clone(&seen_a);
        let _sub_a = bus.subscribe(move |_| *a.lock().unwrap() += 1);
        let b = Arc::clone(&seen_b);
        let _sub_b = bus.subscribe(move |_| *b.lock().unwrap() += 1);

        bus.publish(&test_event());
        bus.publish(&test_event());

        assert_eq!(*seen_a.lock().unwrap(), 2);
        assert_eq!(*seen_b.lock().unwrap(), 2);
    }

    #[test]
    fn test_handlers_invoked_in_registration_order() {
        let bus = EventBus::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for label in ["first", "second", "third"] {
            let order = Arc::clone(&order);
            bus.subscribe(move |_| order.lock().unwrap().push(label))
                .forget();
        }

        bus.publish(&test_event());
        assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_dropped_subscription_stops_delivery() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(0));

        let s = Arc::clone(&seen);
        let sub = bus.subscribe(move |_| *s.lock().unwrap() += 1);

        bus.publish(&test_event());
        drop(sub);
        bus.publish(&test_event());

        assert_eq!(*seen.lock().unwrap(), 1);
        assert_eq!(bus.handler_count(), 0);
    }

    #[test]
    fn test_handler_may_subscribe_during_publish() {
        let bus = EventBus::new();
        let late_seen = Arc::new(Mutex::new(0));

        let inner_bus = bus.clone();
        let late = Arc::clone(&late_seen);
        bus.subscribe(move |_| {
            let late = Arc::clone(&late);
            inner_bus
                .subscribe(move |_| *late.lock().unwrap() += 1)
                .forget();
        })
        .forget();

        // The handler registered mid-publish must not deadlock the bus and
        // only sees events published after its registration.
        bus.publish(&test_event());
        assert_eq!(*late_seen.lock().unwrap(), 0);
        bus.publish(&test_event());
        assert_eq!(*late_seen.lock().unwrap(), 1);
    }

    #[test]
    fn test_handler_may_drop_subscription_during_publish() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(0));

        let s = Arc::clone(&seen);
        let sub = bus.subscribe(move |_| *s.lock().unwrap() += 1);

        let slot = Arc::new(Mutex::new(Some(sub)));
        let slot_in_handler = Arc::clone(&slot);
        bus.subscribe(move |_| {
            slot_in_handler.lock().unwrap().take();
        })
        .forget();

        bus.publish(&test_event());
        assert_eq!(*seen.lock().unwrap(), 1);
        bus.publish(&test_event());
        assert_eq!(*seen.lock().unwrap(), 1);
    }

    #[test]
    fn test_isolated_buses_do_not_share_handlers() {
        let bus_a = EventBus::new();
        let bus_b = EventBus::new();

        let seen = Arc::new(Mutex::new(0));
        let s = Arc::clone(&seen);
        bus_a.subscribe(move |_| *s.lock().unwrap() += 1).forget();

        bus_b.publish(&test_event());
        assert_eq!(*seen.lock().unwrap(), 0);
    }
}
