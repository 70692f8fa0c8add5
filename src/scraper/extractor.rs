//! Record extraction from listing pages
//!
//! Pure data-shaping over the navigator: subcategory link discovery and
//! product tile extraction. Extraction is fail-soft per element - a
//! malformed link or tile is logged and skipped, never aborting the rest of
//! the batch. Each extraction step returns an `Option`, and absent values
//! are filtered out at the end.

use url::Url;

use crate::navigator::{ElementHandle, NavigatorResult, PageNavigator};
use crate::scraper::selectors;

/// A discovered subcategory link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubcategoryLink {
    pub text: String,
    /// Absolute URL
    pub href: String,
}

/// One extracted product listing
///
/// `price` and `discount` keep their raw display text; numeric parsing is a
/// persistence-layer concern. `price_per_kilo` and `discount` are mutually
/// exclusive: the one secondary tile fragment is classified as exactly one
/// of them.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductRecord {
    pub name: String,
    pub price: Option<String>,
    pub brand: Option<String>,
    pub link: Option<String>,
    pub image: Option<String>,
    pub description: String,
    pub price_per_kilo: Option<String>,
    pub discount: Option<String>,
    pub category: String,
}

/// Extracts subcategory links from the current page
///
/// Elements missing either text or href are skipped silently; relative
/// hrefs are resolved against `base`.
pub async fn extract_subcategory_links(
    navigator: &dyn PageNavigator,
    base: &Url,
) -> NavigatorResult<Vec<SubcategoryLink>> {
    let elements = navigator.locate_all(selectors::SUBCATEGORY_LINKS).await?;
    let mut links = Vec::new();

    for element in elements {
        match extract_link(navigator, element, base).await {
            Ok(Some(link)) => links.push(link),
            Ok(None) => {}
            Err(e) => {
                tracing::debug!("Skipping malformed subcategory link: {}", e);
            }
        }
    }

    Ok(links)
}

async fn extract_link(
    navigator: &dyn PageNavigator,
    element: ElementHandle,
    base: &Url,
) -> NavigatorResult<Option<SubcategoryLink>> {
    let Some(text) = navigator.read_text(element).await? else {
        return Ok(None);
    };
    let Some(href) = navigator.read_attribute(element, "href").await? else {
        return Ok(None);
    };
    Ok(absolutize(&href, base).map(|href| SubcategoryLink { text, href }))
}

/// Drops links whose text contains any exclusion fragment
/// (case-insensitive), e.g. an "All products" pseudo-category
pub fn filter_excluded(links: Vec<SubcategoryLink>, exclusions: &[String]) -> Vec<SubcategoryLink> {
    links
        .into_iter()
        .filter(|link| {
            let text = link.text.to_lowercase();
            !exclusions
                .iter()
                .any(|fragment| text.contains(&fragment.to_lowercase()))
        })
        .collect()
}

/// Extracts all product tiles currently present on the page
///
/// Tiles without a title, and tiles whose extraction errors, produce
/// nothing; sibling tiles are unaffected.
pub async fn extract_products(
    navigator: &dyn PageNavigator,
    category: &str,
    base: &Url,
) -> NavigatorResult<Vec<ProductRecord>> {
    let tiles = navigator.locate_all(selectors::PRODUCT_TILE).await?;
    let mut products = Vec::new();

    for tile in tiles {
        match extract_tile(navigator, tile, category, base).await {
            Ok(Some(product)) => products.push(product),
            Ok(None) => {
                tracing::debug!("Skipping product tile without a title");
            }
            Err(e) => {
                tracing::debug!("Skipping product tile: {}", e);
            }
        }
    }

    Ok(products)
}

async fn extract_tile(
    navigator: &dyn PageNavigator,
    tile: ElementHandle,
    category: &str,
    base: &Url,
) -> NavigatorResult<Option<ProductRecord>> {
    let title = match first_text(navigator, tile, selectors::PRODUCT_TITLE).await? {
        Some(title) => title,
        None => return Ok(None),
    };

    let mut fragments = Vec::new();
    for element in navigator.locate_within(tile, selectors::PRODUCT_TEXT).await? {
        if let Some(text) = navigator.read_text(element).await? {
            fragments.push(text);
        }
    }
    let price = fragments.first().cloned();
    let brand = fragments.get(1).cloned();
    let description = fragments.get(2..).unwrap_or_default().join(" ");

    let secondary = first_text(navigator, tile, selectors::PRODUCT_SECONDARY).await?;
    let (price_per_kilo, discount) = match secondary {
        Some(fragment) => classify_secondary(&fragment),
        None => (None, None),
    };

    let link = first_attribute(navigator, tile, selectors::PRODUCT_ANCHOR, "href")
        .await?
        .and_then(|href| absolutize(&href, base));
    let image = first_attribute(navigator, tile, selectors::PRODUCT_IMAGE, "src")
        .await?
        .and_then(|src| absolutize(&src, base));

    Ok(Some(ProductRecord {
        name: title,
        price,
        brand,
        link,
        image,
        description,
        price_per_kilo,
        discount,
        category: category.to_string(),
    }))
}

async fn first_text(
    navigator: &dyn PageNavigator,
    scope: ElementHandle,
    selector: &str,
) -> NavigatorResult<Option<String>> {
    match navigator.locate_within(scope, selector).await?.first() {
        Some(&element) => navigator.read_text(element).await,
        None => Ok(None),
    }
}

async fn first_attribute(
    navigator: &dyn PageNavigator,
    scope: ElementHandle,
    selector: &str,
    name: &str,
) -> NavigatorResult<Option<String>> {
    match navigator.locate_within(scope, selector).await?.first() {
        Some(&element) => navigator.read_attribute(element, name).await,
        None => Ok(None),
    }
}

/// Classifies the single secondary tile fragment
///
/// A fragment containing the currency marker is a price-per-unit; anything
/// else is a discount tag. Exactly one side of the pair is populated. This
/// is a convention of the target site's markup, not a general rule.
pub fn classify_secondary(fragment: &str) -> (Option<String>, Option<String>) {
    let fragment = fragment.trim();
    if fragment.is_empty() {
        return (None, None);
    }
    if fragment.contains(selectors::CURRENCY_MARKER) {
        (Some(fragment.to_string()), None)
    } else {
        (None, Some(fragment.to_string()))
    }
}

/// Resolves an href to an absolute http(s) URL, joining relative ones
/// against `base`
pub fn absolutize(href: &str, base: &Url) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    match base.join(href) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => Some(url.to_string()),
        _ => None,
    }
}

/// Strips trailing item-count suffixes from a subcategory display name
///
/// The site renders names like "Fresh Fruit 128" or "Dairy (42)"; the
/// stored name is the bare label.
pub fn clean_subcategory_name(name: &str) -> String {
    let mut name = name.trim();

    // Parenthesized count, e.g. "Dairy (42)"
    if let (Some(open), true) = (name.rfind('('), name.ends_with(')')) {
        let inner = &name[open + 1..name.len() - 1];
        if !inner.is_empty() && inner.chars().all(|c| c.is_ascii_digit()) {
            name = name[..open].trim_end();
        }
    }

    // Bare trailing digits, e.g. "Fresh Fruit 128"
    let trimmed = name.trim_end_matches(|c: char| c.is_ascii_digit());
    if trimmed.len() < name.len() && trimmed.ends_with(char::is_whitespace) {
        name = trimmed.trim_end();
    }

    name.to_string()
}

/// Derives a display category name from a category URL
///
/// Takes the last non-empty path segment and title-cases its words, so
/// `https://shop.example.com/categories/fresh-fruit` becomes "Fresh Fruit".
pub fn category_name_from_url(url: &str) -> String {
    let slug = Url::parse(url)
        .ok()
        .and_then(|parsed| {
            parsed
                .path_segments()?
                .filter(|segment| !segment.is_empty())
                .last()
                .map(str::to_string)
        })
        .unwrap_or_default();

    if slug.is_empty() {
        return "Unknown".to_string();
    }

    slug.split(['-', '_'])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
