//! Scripted in-memory navigator
//!
//! Replays pages described as plain data: subcategory links, product tiles
//! revealed in batches per load-more click, and injectable failures. This
//! is the navigator the test suite runs against, the same way an HTTP
//! crawler would test against a mock server.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::config::BrowserSettings;
use crate::navigator::{
    ElementHandle, NavigatorError, NavigatorFactory, NavigatorResult, PageNavigator,
};
use crate::scraper::selectors;

/// One product tile as the scripted page renders it
#[derive(Debug, Clone, Default)]
pub struct ScriptedTile {
    /// Title text; `None` models a malformed tile
    pub title: Option<String>,
    /// Ordered descriptive fragments (price, brand, description tail)
    pub fragments: Vec<String>,
    /// The single secondary fragment (price-per-unit or discount)
    pub secondary: Option<String>,
    pub link: Option<String>,
    pub image: Option<String>,
}

impl ScriptedTile {
    pub fn named(title: &str) -> Self {
        Self {
            title: Some(title.to_string()),
            ..Self::default()
        }
    }
}

/// One subcategory link element; missing text or href models a malformed
/// element
#[derive(Debug, Clone)]
pub struct ScriptedLink {
    pub text: Option<String>,
    pub href: Option<String>,
}

impl ScriptedLink {
    pub fn new(text: &str, href: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            href: Some(href.to_string()),
        }
    }
}

/// A page the scripted navigator can serve
#[derive(Debug, Clone, Default)]
pub struct ScriptedPage {
    pub subcategories: Vec<ScriptedLink>,
    /// Batch `i` appears after `i` load-more clicks; the DOM is append-only
    pub tile_batches: Vec<Vec<ScriptedTile>>,
    /// Keep the load-more control visible forever (pagination bound tests)
    pub load_more_always_visible: bool,
    /// Fail `navigate` for this page
    pub fail_navigation: bool,
    /// Fail the load-more click once this many clicks have happened
    pub fail_click_at: Option<u32>,
}

#[derive(Debug, Clone)]
enum Node {
    Link(usize),
    Tile(usize),
    Title(usize),
    Fragment(usize, usize),
    Secondary(usize),
    Anchor(usize),
    Image(usize),
}

struct Session {
    current: Option<ScriptedPage>,
    clicks: u32,
    nodes: Vec<Node>,
}

/// Navigator that serves scripted pages
pub struct ScriptedNavigator {
    pages: Arc<HashMap<String, ScriptedPage>>,
    session: Mutex<Session>,
    closed: Arc<AtomicBool>,
}

impl ScriptedNavigator {
    pub fn new(pages: Arc<HashMap<String, ScriptedPage>>) -> Self {
        Self {
            pages,
            session: Mutex::new(Session {
                current: None,
                clicks: 0,
                nodes: Vec::new(),
            }),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Flag flipped by [`PageNavigator::close`]; tests assert release on
    /// every exit path through this
    pub fn closed_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.closed)
    }

    fn push_node(session: &mut Session, node: Node) -> ElementHandle {
        session.nodes.push(node);
        ElementHandle(session.nodes.len() as u64 - 1)
    }

    fn visible_tiles(page: &ScriptedPage, clicks: u32) -> Vec<(usize, ScriptedTile)> {
        let revealed = (clicks as usize + 1).min(page.tile_batches.len().max(1));
        page.tile_batches
            .iter()
            .take(revealed)
            .flatten()
            .cloned()
            .enumerate()
            .collect()
    }

    fn load_more_visible(page: &ScriptedPage, clicks: u32) -> bool {
        page.load_more_always_visible || (clicks as usize + 1) < page.tile_batches.len()
    }
}

#[async_trait]
impl PageNavigator for ScriptedNavigator {
    async fn navigate(&self, url: &str) -> NavigatorResult<()> {
        let mut session = self.session.lock().unwrap();
        session.nodes.clear();
        session.clicks = 0;

        match self.pages.get(url) {
            Some(page) if page.fail_navigation => Err(NavigatorError::Navigation {
                url: url.to_string(),
                message: "scripted navigation failure".to_string(),
            }),
            Some(page) => {
                session.current = Some(page.clone());
                Ok(())
            }
            None => Err(NavigatorError::Navigation {
                url: url.to_string(),
                message: "no scripted page for URL".to_string(),
            }),
        }
    }

    async fn wait(&self, _ms: u64) {
        // Scripted pages settle instantly.
    }

    async fn locate_all(&self, selector: &str) -> NavigatorResult<Vec<ElementHandle>> {
        let mut session = self.session.lock().unwrap();
        let Some(page) = session.current.clone() else {
            return Ok(Vec::new());
        };

        let handles = match selector {
            selectors::SUBCATEGORY_LINKS => (0..page.subcategories.len())
                .map(|i| Self::push_node(&mut session, Node::Link(i)))
                .collect(),
            selectors::PRODUCT_TILE => Self::visible_tiles(&page, session.clicks)
                .into_iter()
                .map(|(i, _)| Self::push_node(&mut session, Node::Tile(i)))
                .collect(),
            _ => Vec::new(),
        };
        Ok(handles)
    }

    async fn locate_first(&self, selector: &str) -> NavigatorResult<Option<ElementHandle>> {
        Ok(self.locate_all(selector).await?.into_iter().next())
    }

    async fn locate_within(
        &self,
        element: ElementHandle,
        selector: &str,
    ) -> NavigatorResult<Vec<ElementHandle>> {
        let mut session = self.session.lock().unwrap();
        let node = session
            .nodes
            .get(element.0 as usize)
            .cloned()
            .ok_or(NavigatorError::StaleElement)?;
        let Node::Tile(tile_index) = node else {
            return Ok(Vec::new());
        };
        let Some(page) = session.current.clone() else {
            return Ok(Vec::new());
        };
        let tiles = Self::visible_tiles(&page, session.clicks);
        let Some((_, tile)) = tiles.into_iter().find(|(i, _)| *i == tile_index) else {
            return Err(NavigatorError::StaleElement);
        };

        let handles = match selector {
            selectors::PRODUCT_TITLE => {
                vec![Self::push_node(&mut session, Node::Title(tile_index))]
            }
            selectors::PRODUCT_TEXT => (0..tile.fragments.len())
                .map(|j| Self::push_node(&mut session, Node::Fragment(tile_index, j)))
                .collect(),
            selectors::PRODUCT_SECONDARY => match tile.secondary {
                Some(_) => vec![Self::push_node(&mut session, Node::Secondary(tile_index))],
                None => Vec::new(),
            },
            selectors::PRODUCT_ANCHOR => match tile.link {
                Some(_) => vec![Self::push_node(&mut session, Node::Anchor(tile_index))],
                None => Vec::new(),
            },
            selectors::PRODUCT_IMAGE => match tile.image {
                Some(_) => vec![Self::push_node(&mut session, Node::Image(tile_index))],
                None => Vec::new(),
            },
            _ => Vec::new(),
        };
        Ok(handles)
    }

    async fn click(&self, selector: &str) -> NavigatorResult<()> {
        let mut session = self.session.lock().unwrap();
        if selector != selectors::LOAD_MORE {
            return Err(NavigatorError::ElementNotFound(selector.to_string()));
        }
        let Some(page) = session.current.clone() else {
            return Err(NavigatorError::ElementNotFound(selector.to_string()));
        };
        if page.fail_click_at == Some(session.clicks) {
            return Err(NavigatorError::Interaction {
                selector: selector.to_string(),
                message: "scripted click failure".to_string(),
            });
        }
        if !Self::load_more_visible(&page, session.clicks) {
            return Err(NavigatorError::ElementNotFound(selector.to_string()));
        }
        session.clicks += 1;
        Ok(())
    }

    async fn is_visible(&self, selector: &str) -> NavigatorResult<bool> {
        let session = self.session.lock().unwrap();
        if selector != selectors::LOAD_MORE {
            return Ok(false);
        }
        Ok(session
            .current
            .as_ref()
            .map(|page| Self::load_more_visible(page, session.clicks))
            .unwrap_or(false))
    }

    async fn read_text(&self, element: ElementHandle) -> NavigatorResult<Option<String>> {
        let session = self.session.lock().unwrap();
        let node = session
            .nodes
            .get(element.0 as usize)
            .ok_or(NavigatorError::StaleElement)?;
        let Some(page) = session.current.as_ref() else {
            return Ok(None);
        };
        let tiles: Vec<ScriptedTile> = Self::visible_tiles(page, session.clicks)
            .into_iter()
            .map(|(_, t)| t)
            .collect();

        let text = match node {
            Node::Link(i) => page.subcategories.get(*i).and_then(|l| l.text.clone()),
            Node::Title(i) => tiles.get(*i).and_then(|t| t.title.clone()),
            Node::Fragment(i, j) => tiles.get(*i).and_then(|t| t.fragments.get(*j).cloned()),
            Node::Secondary(i) => tiles.get(*i).and_then(|t| t.secondary.clone()),
            _ => None,
        };
        Ok(text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()))
    }

    async fn read_attribute(
        &self,
        element: ElementHandle,
        name: &str,
    ) -> NavigatorResult<Option<String>> {
        let session = self.session.lock().unwrap();
        let node = session
            .nodes
            .get(element.0 as usize)
            .ok_or(NavigatorError::StaleElement)?;
        let Some(page) = session.current.as_ref() else {
            return Ok(None);
        };
        let tiles: Vec<ScriptedTile> = Self::visible_tiles(page, session.clicks)
            .into_iter()
            .map(|(_, t)| t)
            .collect();

        let value = match (node, name) {
            (Node::Link(i), "href") => page.subcategories.get(*i).and_then(|l| l.href.clone()),
            (Node::Anchor(i), "href") => tiles.get(*i).and_then(|t| t.link.clone()),
            (Node::Image(i), "src") => tiles.get(*i).and_then(|t| t.image.clone()),
            _ => None,
        };
        Ok(value)
    }

    async fn close(&mut self) -> NavigatorResult<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Factory serving scripted navigators over a shared page set
pub struct ScriptedFactory {
    pages: Arc<HashMap<String, ScriptedPage>>,
    fail_next_open: AtomicBool,
    spawned: Mutex<Vec<Arc<AtomicBool>>>,
}

impl ScriptedFactory {
    pub fn new(pages: HashMap<String, ScriptedPage>) -> Self {
        Self {
            pages: Arc::new(pages),
            fail_next_open: AtomicBool::new(false),
            spawned: Mutex::new(Vec::new()),
        }
    }

    /// Makes the next `open` call fail, modelling a browser launch error
    pub fn fail_next_open(&self) {
        self.fail_next_open.store(true, Ordering::SeqCst);
    }

    /// Number of navigators handed out so far
    pub fn opened_count(&self) -> usize {
        self.spawned.lock().unwrap().len()
    }

    /// Whether every navigator handed out has been closed
    pub fn all_closed(&self) -> bool {
        self.spawned
            .lock()
            .unwrap()
            .iter()
            .all(|flag| flag.load(Ordering::SeqCst))
    }
}

#[async_trait]
impl NavigatorFactory for ScriptedFactory {
    async fn open(&self, _settings: &BrowserSettings) -> NavigatorResult<Box<dyn PageNavigator>> {
        if self.fail_next_open.swap(false, Ordering::SeqCst) {
            return Err(NavigatorError::Launch(
                "scripted launch failure".to_string(),
            ));
        }
        let navigator = ScriptedNavigator::new(Arc::clone(&self.pages));
        self.spawned.lock().unwrap().push(navigator.closed_flag());
        Ok(Box::new(navigator))
    }
}
