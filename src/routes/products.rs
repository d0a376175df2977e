//! Product listing and detail handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::AppError;
use crate::shopify::{Product, Variant};
use crate::state::AppState;

/// Served when a product carries no images.
pub const PLACEHOLDER_IMAGE: &str = "/images/placeholder.jpg";

/// Default page size for catalog listings.
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Pagination query parameters.
#[derive(Debug, Deserialize)]
pub struct ListingQuery {
    pub limit: Option<u32>,
    pub since_id: Option<u64>,
}

/// Product summary for listing responses.
#[derive(Debug, Clone, Serialize)]
pub struct ProductSummary {
    pub id: String,
    pub title: String,
    pub thumbnail: String,
    pub price: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount: Option<String>,
}

/// Variant view for product detail responses.
#[derive(Debug, Clone, Serialize)]
pub struct VariantView {
    pub id: String,
    pub title: String,
    pub size: String,
    pub inventory_quantity: i64,
    pub price: String,
    pub compare_at_price: String,
}

/// Product detail response.
#[derive(Debug, Serialize)]
pub struct ProductDetail {
    pub id: String,
    pub title: String,
    pub description: String,
    pub brand: String,
    pub thumbnail: String,
    pub images: Vec<String>,
    pub variants: Vec<VariantView>,
    pub full_price: String,
    pub sale_price: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount: Option<String>,
}

// =============================================================================
// Type Conversions
// =============================================================================

/// Format an optional decimal amount as a dollar price string.
fn dollars(amount: Option<Decimal>) -> Option<String> {
    amount.map(|a| format!("${a}"))
}

impl From<&Product> for ProductSummary {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.to_string(),
            title: product.title.clone(),
            thumbnail: product
                .thumbnail()
                .unwrap_or(PLACEHOLDER_IMAGE)
                .to_string(),
            price: dollars(product.pricing.sale_price).unwrap_or_else(|| "N/A".to_string()),
            discount: product.pricing.discount.clone(),
        }
    }
}

impl From<&Variant> for VariantView {
    fn from(variant: &Variant) -> Self {
        Self {
            id: variant.id.to_string(),
            title: variant.title.clone(),
            size: variant.size.clone().unwrap_or_default(),
            inventory_quantity: variant.inventory_quantity,
            price: dollars(variant.price).unwrap_or_default(),
            compare_at_price: dollars(variant.compare_at_price).unwrap_or_default(),
        }
    }
}

impl From<&Product> for ProductDetail {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.to_string(),
            title: product.title.clone(),
            description: product.description_html.clone(),
            brand: product.vendor.clone(),
            thumbnail: product
                .thumbnail()
                .unwrap_or(PLACEHOLDER_IMAGE)
                .to_string(),
            images: product.images.clone(),
            variants: product.variants.iter().map(VariantView::from).collect(),
            full_price: dollars(product.pricing.full_price).unwrap_or_else(|| "N/A".to_string()),
            sale_price: dollars(product.pricing.sale_price).unwrap_or_else(|| "N/A".to_string()),
            discount: product.pricing.discount.clone(),
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Product listing handler.
///
/// An unreachable platform collapses to an empty list, matching the client's
/// error contract; the page renders empty rather than failing.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ListingQuery>,
) -> Json<Vec<ProductSummary>> {
    let products = state
        .shopify()
        .list_products(query.limit.unwrap_or(DEFAULT_PAGE_SIZE), query.since_id)
        .await;

    Json(products.iter().map(ProductSummary::from).collect())
}

/// Product detail handler.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(product_id): Path<u64>,
) -> Result<Json<ProductDetail>, AppError> {
    let product = state
        .shopify()
        .get_product_details(product_id)
        .await
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

    Ok(Json(ProductDetail::from(&product)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::shopify::Pricing;

    use super::*;

    fn product() -> Product {
        Product {
            id: 42,
            title: "Opal Ring".to_string(),
            description_html: "<p>Hand set.</p>".to_string(),
            vendor: "Opaline".to_string(),
            images: vec!["https://cdn.example/a.jpg".to_string()],
            variants: vec![Variant {
                id: 7,
                title: "Size 6".to_string(),
                size: Some("6".to_string()),
                inventory_quantity: 3,
                price: Some("80.00".parse().unwrap()),
                compare_at_price: Some("120.00".parse().unwrap()),
            }],
            pricing: Pricing {
                sale_price: Some("80.00".parse().unwrap()),
                full_price: Some("120.00".parse().unwrap()),
                discount: Some("33% off".to_string()),
            },
        }
    }

    #[test]
    fn test_summary_formats_price_and_discount() {
        let summary = ProductSummary::from(&product());
        assert_eq!(summary.id, "42");
        assert_eq!(summary.price, "$80.00");
        assert_eq!(summary.thumbnail, "https://cdn.example/a.jpg");
        assert_eq!(summary.discount.as_deref(), Some("33% off"));
    }

    #[test]
    fn test_summary_falls_back_without_pricing() {
        let mut bare = product();
        bare.images.clear();
        bare.pricing = Pricing::default();

        let summary = ProductSummary::from(&bare);
        assert_eq!(summary.price, "N/A");
        assert_eq!(summary.thumbnail, PLACEHOLDER_IMAGE);
        assert_eq!(summary.discount, None);
    }

    #[test]
    fn test_detail_shapes_variants() {
        let detail = ProductDetail::from(&product());
        assert_eq!(detail.brand, "Opaline");
        assert_eq!(detail.full_price, "$120.00");
        assert_eq!(detail.sale_price, "$80.00");

        let variant = detail.variants.first().unwrap();
        assert_eq!(variant.id, "7");
        assert_eq!(variant.size, "6");
        assert_eq!(variant.price, "$80.00");
        assert_eq!(variant.compare_at_price, "$120.00");
    }

    #[test]
    fn test_detail_empty_prices_serialize_as_empty_strings() {
        let mut bare = product();
        bare.variants = vec![Variant {
            id: 8,
            title: "Default".to_string(),
            size: None,
            inventory_quantity: 0,
            price: None,
            compare_at_price: None,
        }];

        let detail = ProductDetail::from(&bare);
        let variant = detail.variants.first().unwrap();
        assert_eq!(variant.size, "");
        assert_eq!(variant.price, "");
        assert_eq!(variant.compare_at_price, "");
    }
}
