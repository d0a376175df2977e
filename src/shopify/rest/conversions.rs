//! Conversion of raw Admin API JSON into domain types.
//!
//! Admin REST responses wrap every resource in a single-key envelope
//! (`{"products": [...]}`, `{"product": {...}}`). The functions here unwrap
//! that envelope and convert entry by entry, so one malformed entry costs a
//! warning instead of the whole page.

use rust_decimal::Decimal;
use serde_json::Value;
use tracing::warn;

use crate::shopify::types::{
    Collection, CollectionKind, DraftOrder, Pricing, Product, Variant, Webhook,
};

// =============================================================================
// Envelopes
// =============================================================================

pub(super) fn products_from_listing(body: &Value) -> Vec<Product> {
    let Some(entries) = body.get("products").and_then(Value::as_array) else {
        warn!("Listing body missing `products` array");
        return Vec::new();
    };
    entries.iter().filter_map(convert_product).collect()
}

pub(super) fn product_from_detail(body: &Value) -> Option<Product> {
    let Some(entry) = body.get("product") else {
        warn!("Detail body missing `product` object");
        return None;
    };
    convert_product(entry)
}

pub(super) fn collections_from_listing(body: &Value, kind: CollectionKind) -> Vec<Collection> {
    let key = match kind {
        CollectionKind::Custom => "custom_collections",
        CollectionKind::Smart => "smart_collections",
    };
    let Some(entries) = body.get(key).and_then(Value::as_array) else {
        warn!(envelope = key, "Listing body missing collections array");
        return Vec::new();
    };
    entries
        .iter()
        .filter_map(|entry| convert_collection(entry, kind))
        .collect()
}

pub(super) fn collection_from_detail(body: &Value, kind: CollectionKind) -> Option<Collection> {
    let key = match kind {
        CollectionKind::Custom => "custom_collection",
        CollectionKind::Smart => "smart_collection",
    };
    let Some(entry) = body.get(key) else {
        warn!(envelope = key, "Detail body missing collection object");
        return None;
    };
    convert_collection(entry, kind)
}

pub(super) fn draft_order_from_response(body: &Value) -> Option<DraftOrder> {
    let entry = body.get("draft_order")?;
    let Some(id) = id_of(entry) else {
        warn!("Draft order response missing id");
        return None;
    };
    Some(DraftOrder {
        id,
        status: str_of(entry, "status").map(str::to_string),
        invoice_url: str_of(entry, "invoice_url").map(str::to_string),
    })
}

pub(super) fn webhook_from_response(body: &Value) -> Option<Webhook> {
    let entry = body.get("webhook")?;
    let Some(id) = id_of(entry) else {
        warn!("Webhook response missing id");
        return None;
    };
    Some(Webhook {
        id,
        topic: str_of(entry, "topic").unwrap_or_default().to_string(),
        address: str_of(entry, "address").unwrap_or_default().to_string(),
    })
}

// =============================================================================
// Entries
// =============================================================================

fn convert_product(entry: &Value) -> Option<Product> {
    let id = id_of(entry);
    let title = str_of(entry, "title").filter(|t| !t.is_empty());
    let (Some(id), Some(title)) = (id, title) else {
        warn!(id = ?entry.get("id"), "Skipping product entry missing id or title");
        return None;
    };

    let images = entry
        .get("images")
        .and_then(Value::as_array)
        .map(|images| {
            images
                .iter()
                .filter_map(|image| str_of(image, "src").map(str::to_string))
                .collect()
        })
        .unwrap_or_default();

    let variants: Vec<Variant> = entry
        .get("variants")
        .and_then(Value::as_array)
        .map(|variants| variants.iter().filter_map(convert_variant).collect())
        .unwrap_or_default();

    let pricing = derive_pricing(&variants);

    Some(Product {
        id,
        title: title.to_string(),
        description_html: str_of(entry, "body_html").unwrap_or_default().to_string(),
        vendor: str_of(entry, "vendor").unwrap_or_default().to_string(),
        images,
        variants,
        pricing,
    })
}

fn convert_variant(entry: &Value) -> Option<Variant> {
    let id = id_of(entry);
    let title = str_of(entry, "title").filter(|t| !t.is_empty());
    let (Some(id), Some(title)) = (id, title) else {
        warn!(id = ?entry.get("id"), "Skipping variant entry missing id or title");
        return None;
    };

    Some(Variant {
        id,
        title: title.to_string(),
        size: str_of(entry, "option1").map(str::to_string),
        inventory_quantity: entry
            .get("inventory_quantity")
            .and_then(Value::as_i64)
            .unwrap_or(0),
        price: decimal_of(entry, "price"),
        compare_at_price: decimal_of(entry, "compare_at_price"),
    })
}

fn convert_collection(entry: &Value, kind: CollectionKind) -> Option<Collection> {
    let id = id_of(entry);
    let title = str_of(entry, "title").filter(|t| !t.is_empty());
    let (Some(id), Some(title)) = (id, title) else {
        warn!(id = ?entry.get("id"), "Skipping collection entry missing id or title");
        return None;
    };

    Some(Collection {
        id,
        title: title.to_string(),
        body_html: str_of(entry, "body_html").map(str::to_string),
        image: entry
            .get("image")
            .and_then(|image| str_of(image, "src"))
            .map(str::to_string),
        kind,
    })
}

// =============================================================================
// Pricing
// =============================================================================

/// Derive listing prices from variant data.
///
/// The sale price is the cheapest variant price. The full price is the
/// highest compare-at price when any variant carries one, otherwise the
/// highest variant price. A discount label is attached only when the full
/// price genuinely exceeds a positive sale price.
pub(super) fn derive_pricing(variants: &[Variant]) -> Pricing {
    let sale_price = variants.iter().filter_map(|v| v.price).min();
    let full_price = variants
        .iter()
        .filter_map(|v| v.compare_at_price)
        .max()
        .or_else(|| variants.iter().filter_map(|v| v.price).max());

    let discount = match (sale_price, full_price) {
        (Some(sale), Some(full)) if full > sale && sale > Decimal::ZERO => {
            let percent = ((full - sale) / full * Decimal::ONE_HUNDRED).round();
            Some(format!("{percent}% off"))
        }
        _ => None,
    };

    Pricing {
        sale_price,
        full_price,
        discount,
    }
}

// =============================================================================
// Field helpers
// =============================================================================

fn id_of(entry: &Value) -> Option<u64> {
    entry.get("id")?.as_u64()
}

fn str_of<'a>(entry: &'a Value, key: &str) -> Option<&'a str> {
    entry.get(key)?.as_str()
}

/// Money fields arrive as strings (`"80.00"`); accept bare numbers too.
fn decimal_of(entry: &Value, key: &str) -> Option<Decimal> {
    match entry.get(key)? {
        Value::String(raw) => raw.trim().parse().ok(),
        Value::Number(raw) => raw.to_string().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn variant(price: Option<&str>, compare_at: Option<&str>) -> Variant {
        Variant {
            id: 1,
            title: "Default".to_string(),
            size: None,
            inventory_quantity: 0,
            price: price.map(|p| p.parse().unwrap()),
            compare_at_price: compare_at.map(|p| p.parse().unwrap()),
        }
    }

    #[test]
    fn test_pricing_discount_from_compare_at() {
        let variants = vec![
            variant(Some("80.00"), Some("120.00")),
            variant(Some("100.00"), Some("120.00")),
        ];
        let pricing = derive_pricing(&variants);
        assert_eq!(pricing.sale_price, Some("80.00".parse().unwrap()));
        assert_eq!(pricing.full_price, Some("120.00".parse().unwrap()));
        assert_eq!(pricing.discount.as_deref(), Some("33% off"));
    }

    #[test]
    fn test_pricing_without_compare_at_has_no_discount() {
        let variants = vec![variant(Some("50.00"), None)];
        let pricing = derive_pricing(&variants);
        assert_eq!(pricing.sale_price, pricing.full_price);
        assert_eq!(pricing.discount, None);
    }

    #[test]
    fn test_pricing_ignores_compare_at_below_price() {
        let variants = vec![variant(Some("100.00"), Some("90.00"))];
        let pricing = derive_pricing(&variants);
        assert_eq!(pricing.full_price, Some("90.00".parse().unwrap()));
        assert_eq!(pricing.discount, None);
    }

    #[test]
    fn test_pricing_rounds_half_to_even() {
        // (40 - 39) / 40 * 100 = 2.5, which rounds down to the even digit.
        let variants = vec![variant(Some("39.00"), Some("40.00"))];
        let pricing = derive_pricing(&variants);
        assert_eq!(pricing.discount.as_deref(), Some("2% off"));
    }

    #[test]
    fn test_pricing_empty_variants() {
        let pricing = derive_pricing(&[]);
        assert_eq!(pricing.sale_price, None);
        assert_eq!(pricing.full_price, None);
        assert_eq!(pricing.discount, None);
    }

    #[test]
    fn test_listing_skips_entries_missing_id_or_title() {
        let body = json!({
            "products": [
                {"id": 1, "title": "Keeps"},
                {"title": "No id"},
                {"id": 3, "title": ""},
                {"id": 4},
            ]
        });
        let products = products_from_listing(&body);
        assert_eq!(products.len(), 1);
        assert_eq!(products.first().map(|p| p.id), Some(1));
    }

    #[test]
    fn test_listing_missing_envelope_is_empty() {
        assert!(products_from_listing(&json!({"errors": "Not Found"})).is_empty());
    }

    #[test]
    fn test_product_detail_conversion() {
        let body = json!({
            "product": {
                "id": 42,
                "title": "Opal Ring",
                "body_html": "<p>Hand set.</p>",
                "vendor": "Opaline",
                "images": [{"src": "https://cdn.example/a.jpg"}, {"src": "https://cdn.example/b.jpg"}],
                "variants": [
                    {
                        "id": 7,
                        "title": "Size 6",
                        "option1": "6",
                        "inventory_quantity": 3,
                        "price": "80.00",
                        "compare_at_price": "120.00"
                    },
                    {"id": 8, "title": "Size 7", "option1": "7", "price": "100.00", "compare_at_price": "120.00"}
                ]
            }
        });

        let product = product_from_detail(&body).unwrap();
        assert_eq!(product.id, 42);
        assert_eq!(product.vendor, "Opaline");
        assert_eq!(product.images.len(), 2);
        assert_eq!(product.variants.len(), 2);
        assert_eq!(
            product.variants.first().and_then(|v| v.size.as_deref()),
            Some("6")
        );
        // Missing inventory_quantity defaults to zero.
        assert_eq!(product.variants.get(1).map(|v| v.inventory_quantity), Some(0));
        assert_eq!(product.pricing.discount.as_deref(), Some("33% off"));
    }

    #[test]
    fn test_detail_missing_envelope_is_none() {
        assert!(product_from_detail(&json!({})).is_none());
    }

    #[test]
    fn test_collection_conversion_tags_kind() {
        let body = json!({
            "smart_collections": [
                {"id": 9, "title": "New Arrivals", "image": {"src": "https://cdn.example/c.jpg"}}
            ]
        });
        let collections = collections_from_listing(&body, CollectionKind::Smart);
        assert_eq!(collections.len(), 1);
        let collection = collections.first().unwrap();
        assert_eq!(collection.kind, CollectionKind::Smart);
        assert_eq!(collection.image.as_deref(), Some("https://cdn.example/c.jpg"));
    }

    #[test]
    fn test_collection_detail_uses_singular_envelope() {
        let body = json!({
            "custom_collection": {"id": 5, "title": "Featured"}
        });
        let collection = collection_from_detail(&body, CollectionKind::Custom).unwrap();
        assert_eq!(collection.id, 5);
        assert_eq!(collection.kind, CollectionKind::Custom);
        assert!(collection_from_detail(&body, CollectionKind::Smart).is_none());
    }

    #[test]
    fn test_draft_order_and_webhook_envelopes() {
        let order = draft_order_from_response(&json!({
            "draft_order": {"id": 11, "status": "open", "invoice_url": "https://checkout.example/i/11"}
        }))
        .unwrap();
        assert_eq!(order.id, 11);
        assert_eq!(order.status.as_deref(), Some("open"));

        let webhook = webhook_from_response(&json!({
            "webhook": {"id": 12, "topic": "products/update", "address": "https://api.example/hooks"}
        }))
        .unwrap();
        assert_eq!(webhook.topic, "products/update");

        assert!(draft_order_from_response(&json!({"draft_order": {"status": "open"}})).is_none());
        assert!(webhook_from_response(&json!({})).is_none());
    }

    #[test]
    fn test_decimal_accepts_strings_and_numbers() {
        let entry = json!({"price": "19.90", "compare_at_price": 25});
        assert_eq!(decimal_of(&entry, "price"), Some("19.90".parse().unwrap()));
        assert_eq!(
            decimal_of(&entry, "compare_at_price"),
            Some("25".parse().unwrap())
        );
        assert_eq!(decimal_of(&entry, "missing"), None);
    }
}
