//! Domain types for the Shopify Admin REST API.
//!
//! These types are what the accessor layer hands to route handlers: raw JSON
//! bodies stay inside `rest::conversions`, and anything that reaches a
//! handler has ids, titles, and prices already validated.

use rust_decimal::Decimal;
use serde::Serialize;

// =============================================================================
// Pricing
// =============================================================================

/// Derived pricing for a product, computed across its variants.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Pricing {
    /// Lowest variant price.
    pub sale_price: Option<Decimal>,
    /// Highest compare-at price, falling back to the highest price.
    pub full_price: Option<Decimal>,
    /// Display string like `"33% off"`; present only when
    /// `full_price > sale_price > 0`.
    pub discount: Option<String>,
}

// =============================================================================
// Products & Variants
// =============================================================================

/// A purchasable variant of a product.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Variant {
    /// Shopify variant ID.
    pub id: u64,
    /// Variant title (e.g., "Black / 42").
    pub title: String,
    /// Size label: the first non-empty of `option1` and the title.
    pub size: Option<String>,
    /// Units in stock; negative means oversold.
    pub inventory_quantity: i64,
    /// Current selling price.
    pub price: Option<Decimal>,
    /// Pre-discount price, when the variant is on sale.
    pub compare_at_price: Option<Decimal>,
}

/// A product with its variants and derived pricing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Product {
    /// Shopify product ID.
    pub id: u64,
    /// Product title.
    pub title: String,
    /// Description as HTML (`body_html`).
    pub description_html: String,
    /// Brand / vendor name.
    pub vendor: String,
    /// Image URLs in display order.
    pub images: Vec<String>,
    /// Variants in display order.
    pub variants: Vec<Variant>,
    /// Derived sale/full/discount pricing.
    pub pricing: Pricing,
}

impl Product {
    /// First image URL, if the product has any images.
    #[must_use]
    pub fn thumbnail(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }
}

// =============================================================================
// Collections
// =============================================================================

/// The two platform-native collection subtypes.
///
/// Custom collections are hand-curated; smart collections are rule-based.
/// They live behind different Admin API endpoints but are presented as one
/// logical listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionKind {
    /// Hand-curated collection (`custom_collections` endpoint).
    Custom,
    /// Rule-based collection (`smart_collections` endpoint).
    Smart,
}

impl CollectionKind {
    /// Lowercase tag used in API responses and query parameters.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Custom => "custom",
            Self::Smart => "smart",
        }
    }
}

impl std::fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CollectionKind {
    type Err = UnknownCollectionKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "custom" => Ok(Self::Custom),
            "smart" => Ok(Self::Smart),
            other => Err(UnknownCollectionKind(other.to_string())),
        }
    }
}

/// Error for collection-kind strings other than `custom`/`smart`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown collection kind: {0}")]
pub struct UnknownCollectionKind(pub String);

/// A product collection, tagged with its subtype.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Collection {
    /// Shopify collection ID.
    pub id: u64,
    /// Collection title.
    pub title: String,
    /// Description as HTML (`body_html`).
    pub body_html: Option<String>,
    /// Collection image URL.
    pub image: Option<String>,
    /// Which endpoint this collection came from.
    pub kind: CollectionKind,
}

// =============================================================================
// Write results
// =============================================================================

/// A draft order created to reserve a sale before checkout.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DraftOrder {
    /// Shopify draft order ID.
    pub id: u64,
    /// Lifecycle status (e.g., "open").
    pub status: Option<String>,
    /// Customer-facing invoice URL for completing payment.
    pub invoice_url: Option<String>,
}

/// A registered webhook subscription.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Webhook {
    /// Shopify webhook ID.
    pub id: u64,
    /// Subscribed topic (e.g., "orders/create").
    pub topic: String,
    /// Callback URL receiving deliveries.
    pub address: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_kind_round_trip() {
        for kind in [CollectionKind::Custom, CollectionKind::Smart] {
            let parsed: CollectionKind = kind.as_str().parse().expect("tag parses back");
            assert_eq!(parsed, kind);
        }
    }

    #[test]
    fn test_collection_kind_rejects_all() {
        // "all" is a listing filter, not a subtype; callers expand it into
        // two queries instead.
        assert!("all".parse::<CollectionKind>().is_err());
    }

    #[test]
    fn test_thumbnail_is_first_image() {
        let product = Product {
            id: 1,
            title: "Watch".to_string(),
            description_html: String::new(),
            vendor: String::new(),
            images: vec!["a.jpg".to_string(), "b.jpg".to_string()],
            variants: vec![],
            pricing: Pricing::default(),
        };
        assert_eq!(product.thumbnail(), Some("a.jpg"));

        let bare = Product {
            images: vec![],
            ..product
        };
        assert_eq!(bare.thumbnail(), None);
    }
}
