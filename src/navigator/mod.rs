//! Page navigation capability
//!
//! The scraping core never talks to a browser directly. It depends on the
//! [`PageNavigator`] trait: navigate, wait, locate elements by selector,
//! read text/attributes, click. The production implementation drives a
//! dedicated Chromium instance over CDP; the scripted implementation
//! replays pages described as plain data and backs the test suite.

mod chromium;
pub mod scripted;

pub use chromium::{ChromiumFactory, ChromiumNavigator};

use async_trait::async_trait;
use thiserror::Error;

use crate::config::BrowserSettings;

/// Errors raised by browser interaction
#[derive(Debug, Error)]
pub enum NavigatorError {
    #[error("Failed to launch browser: {0}")]
    Launch(String),

    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("No element matched selector: {0}")]
    ElementNotFound(String),

    #[error("Element handle is no longer valid")]
    StaleElement,

    #[error("Interaction with {selector} failed: {message}")]
    Interaction { selector: String, message: String },

    #[error("Browser error: {0}")]
    Browser(String),
}

/// Result type alias for navigator operations
pub type NavigatorResult<T> = std::result::Result<T, NavigatorError>;

/// Opaque handle to a located element
///
/// Handles are only meaningful to the navigator that produced them and stay
/// valid until the next navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementHandle(pub(crate) u64);

/// Capability interface over one browser page
///
/// Every method is a potential suspension point; nothing else in the
/// scraping core suspends. Each worker owns exactly one navigator, but the
/// worker task itself moves across threads, so implementations must be
/// `Send + Sync`.
#[async_trait]
pub trait PageNavigator: Send + Sync {
    /// Navigates the page to the given URL
    async fn navigate(&self, url: &str) -> NavigatorResult<()>;

    /// Waits for the given number of milliseconds
    async fn wait(&self, ms: u64);

    /// Locates all elements matching a selector, in document order
    async fn locate_all(&self, selector: &str) -> NavigatorResult<Vec<ElementHandle>>;

    /// Locates the first element matching a selector
    async fn locate_first(&self, selector: &str) -> NavigatorResult<Option<ElementHandle>>;

    /// Locates elements matching a selector within a previously located
    /// element
    async fn locate_within(
        &self,
        element: ElementHandle,
        selector: &str,
    ) -> NavigatorResult<Vec<ElementHandle>>;

    /// Clicks the first element matching a selector
    async fn click(&self, selector: &str) -> NavigatorResult<()>;

    /// Returns whether any element matching the selector is currently
    /// present and visible
    async fn is_visible(&self, selector: &str) -> NavigatorResult<bool>;

    /// Reads the trimmed text content of an element
    ///
    /// Returns `None` for elements without text rather than failing.
    async fn read_text(&self, element: ElementHandle) -> NavigatorResult<Option<String>>;

    /// Reads an attribute value from an element
    async fn read_attribute(
        &self,
        element: ElementHandle,
        name: &str,
    ) -> NavigatorResult<Option<String>>;

    /// Releases the underlying browser resources
    ///
    /// Workers call this on every exit path. Implementations must tolerate
    /// being called after a failed navigation.
    async fn close(&mut self) -> NavigatorResult<()>;
}

/// Produces one navigator (one isolated browser) per call
///
/// The orchestrator hands a factory to every worker; each worker acquires
/// its own navigator so browser state is never shared across tasks.
#[async_trait]
pub trait NavigatorFactory: Send + Sync {
    async fn open(&self, settings: &BrowserSettings) -> NavigatorResult<Box<dyn PageNavigator>>;
}
