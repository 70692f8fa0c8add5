//! Chromium-backed navigator
//!
//! Each [`ChromiumNavigator`] owns a dedicated browser process and a single
//! page. The CDP event handler runs on its own task for the lifetime of the
//! navigator. chromiumoxide pages have no Drop cleanup, so the explicit
//! async [`PageNavigator::close`] is the release path; workers call it on
//! every exit.

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::element::Element;
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::sync::{MappedMutexGuard, Mutex, MutexGuard};
use tokio::task::JoinHandle;

use crate::config::BrowserSettings;
use crate::navigator::{
    ElementHandle, NavigatorError, NavigatorFactory, NavigatorResult, PageNavigator,
};

/// Navigator driving one Chromium instance over CDP
pub struct ChromiumNavigator {
    browser: Option<Browser>,
    page: Option<Page>,
    handler_task: JoinHandle<()>,
    // Located elements, indexed by handle. Cleared on navigation since CDP
    // object ids do not survive a page load.
    elements: Mutex<Vec<Element>>,
}

impl ChromiumNavigator {
    /// Launches a browser with the given settings and opens a blank page
    pub async fn launch(settings: &BrowserSettings) -> NavigatorResult<Self> {
        let mut builder = BrowserConfig::builder()
            .window_size(settings.viewport.width, settings.viewport.height);
        if !settings.headless {
            builder = builder.with_head();
        }
        let config = builder.build().map_err(NavigatorError::Launch)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| NavigatorError::Launch(e.to_string()))?;

        // Drive the CDP message loop until the connection closes.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| NavigatorError::Launch(e.to_string()))?;

        Ok(Self {
            browser: Some(browser),
            page: Some(page),
            handler_task,
            elements: Mutex::new(Vec::new()),
        })
    }

    fn page(&self) -> NavigatorResult<&Page> {
        self.page
            .as_ref()
            .ok_or_else(|| NavigatorError::Browser("page already closed".to_string()))
    }

    async fn store_elements(&self, found: Vec<Element>) -> Vec<ElementHandle> {
        let mut elements = self.elements.lock().await;
        let mut handles = Vec::with_capacity(found.len());
        for element in found {
            handles.push(ElementHandle(elements.len() as u64));
            elements.push(element);
        }
        handles
    }

    async fn element(&self, handle: ElementHandle) -> NavigatorResult<MappedMutexGuard<'_, Element>> {
        let elements = self.elements.lock().await;
        MutexGuard::try_map(elements, |elements| elements.get_mut(handle.0 as usize))
            .map_err(|_| NavigatorError::StaleElement)
    }
}

#[async_trait]
impl PageNavigator for ChromiumNavigator {
    async fn navigate(&self, url: &str) -> NavigatorResult<()> {
        self.elements.lock().await.clear();
        let page = self.page()?;
        page.goto(url)
            .await
            .map_err(|e| NavigatorError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        page.wait_for_navigation()
            .await
            .map_err(|e| NavigatorError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        Ok(())
    }

    async fn wait(&self, ms: u64) {
        tokio::time::sleep(std::time::Duration::from_millis(ms)).await;
    }

    async fn locate_all(&self, selector: &str) -> NavigatorResult<Vec<ElementHandle>> {
        let found = self
            .page()?
            .find_elements(selector)
            .await
            .unwrap_or_default();
        Ok(self.store_elements(found).await)
    }

    async fn locate_first(&self, selector: &str) -> NavigatorResult<Option<ElementHandle>> {
        match self.page()?.find_element(selector).await {
            Ok(element) => Ok(self.store_elements(vec![element]).await.pop()),
            Err(_) => Ok(None),
        }
    }

    async fn locate_within(
        &self,
        element: ElementHandle,
        selector: &str,
    ) -> NavigatorResult<Vec<ElementHandle>> {
        let found = {
            let parent = self.element(element).await?;
            parent.find_elements(selector).await.unwrap_or_default()
        };
        Ok(self.store_elements(found).await)
    }

    async fn click(&self, selector: &str) -> NavigatorResult<()> {
        let element = self
            .page()?
            .find_element(selector)
            .await
            .map_err(|_| NavigatorError::ElementNotFound(selector.to_string()))?;
        element
            .click()
            .await
            .map_err(|e| NavigatorError::Interaction {
                selector: selector.to_string(),
                message: e.to_string(),
            })?;
        Ok(())
    }

    async fn is_visible(&self, selector: &str) -> NavigatorResult<bool> {
        // Presence in the DOM is the visibility test; the target site hides
        // the load-more control by removing it.
        Ok(self.page()?.find_element(selector).await.is_ok())
    }

    async fn read_text(&self, element: ElementHandle) -> NavigatorResult<Option<String>> {
        let element = self.element(element).await?;
        let text = element
            .inner_text()
            .await
            .map_err(|e| NavigatorError::Browser(e.to_string()))?;
        Ok(text
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty()))
    }

    async fn read_attribute(
        &self,
        element: ElementHandle,
        name: &str,
    ) -> NavigatorResult<Option<String>> {
        let element = self.element(element).await?;
        element
            .attribute(name)
            .await
            .map_err(|e| NavigatorError::Browser(e.to_string()))
    }

    async fn close(&mut self) -> NavigatorResult<()> {
        self.elements.lock().await.clear();

        if let Some(page) = self.page.take() {
            if let Err(e) = page.close().await {
                tracing::warn!("Failed to close page: {}", e);
            }
        }

        if let Some(mut browser) = self.browser.take() {
            if let Err(e) = browser.close().await {
                tracing::warn!("Failed to close browser: {}", e);
            }
            let _ = browser.wait().await;
        }

        self.handler_task.abort();
        Ok(())
    }
}

/// Factory launching one dedicated Chromium instance per worker
#[derive(Debug, Default, Clone, Copy)]
pub struct ChromiumFactory;

#[async_trait]
impl NavigatorFactory for ChromiumFactory {
    async fn open(&self, settings: &BrowserSettings) -> NavigatorResult<Box<dyn PageNavigator>> {
        let navigator = ChromiumNavigator::launch(settings).await?;
        Ok(Box::new(navigator))
    }
}
