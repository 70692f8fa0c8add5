//! Site-specific selectors and markers
//!
//! All DOM selectors for the target grocery site live here. Everything else
//! in the scraper goes through these constants, so a markup change on the
//! site touches exactly one file.

/// Subcategory navigation links on a category page
pub const SUBCATEGORY_LINKS: &str = "nav.category-menu a.subcategory-link";

/// One product tile in the listing grid
pub const PRODUCT_TILE: &str = "div.product-list article.product-tile";

/// Title element inside a product tile
pub const PRODUCT_TITLE: &str = ".product-title";

/// Ordered descriptive text fragments inside a tile (price, brand,
/// description tail)
pub const PRODUCT_TEXT: &str = ".product-details span";

/// The single secondary fragment: either a price-per-unit or a discount tag
pub const PRODUCT_SECONDARY: &str = ".product-badge";

/// First anchor inside a tile, pointing at the product detail page
pub const PRODUCT_ANCHOR: &str = "a";

/// First image inside a tile
pub const PRODUCT_IMAGE: &str = "img";

/// The "load more" affordance at the bottom of a listing
pub const LOAD_MORE: &str = "button.load-more";

/// Currency marker used to classify the secondary fragment: fragments
/// containing it are a price-per-unit, all others are a discount tag
pub const CURRENCY_MARKER: &str = "€";
