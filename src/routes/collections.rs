//! Collection listing and detail handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::AppError;
use crate::shopify::{Collection, CollectionKind, ShopifyClient};
use crate::state::AppState;

use super::products::{DEFAULT_PAGE_SIZE, ProductSummary};

/// How many products each collection carries in the listing response.
const PREVIEW_PRODUCT_LIMIT: u32 = 5;

/// Collection query parameters.
#[derive(Debug, Deserialize)]
pub struct CollectionsQuery {
    pub limit: Option<u32>,
    pub since_id: Option<u64>,
    pub collection_type: Option<String>,
}

/// Collection view with its products, for listing and detail responses.
#[derive(Debug, Serialize)]
pub struct CollectionView {
    pub id: String,
    pub title: String,
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub products: Vec<ProductSummary>,
}

impl CollectionView {
    fn new(collection: &Collection, products: Vec<ProductSummary>) -> Self {
        Self {
            id: collection.id.to_string(),
            title: collection.title.clone(),
            kind: collection.kind.as_str().to_string(),
            description: collection.body_html.clone(),
            image: collection.image.clone(),
            products,
        }
    }
}

/// Interpret the `collection_type` parameter. `all` and absence both mean
/// no subtype filter.
fn subtype_filter(raw: Option<&str>) -> Result<Option<CollectionKind>, AppError> {
    match raw {
        None => Ok(None),
        Some(raw) if raw.eq_ignore_ascii_case("all") => Ok(None),
        Some(raw) => raw
            .parse::<CollectionKind>()
            .map(Some)
            .map_err(|_| AppError::BadRequest(format!("Unknown collection type: {raw}"))),
    }
}

async fn preview_products(shopify: &ShopifyClient, collection_id: u64) -> Vec<ProductSummary> {
    shopify
        .list_collection_products(collection_id, PREVIEW_PRODUCT_LIMIT)
        .await
        .iter()
        .map(ProductSummary::from)
        .collect()
}

// =============================================================================
// Handlers
// =============================================================================

/// Collection listing handler, each entry with a short product preview.
///
/// The preview costs one upstream call per collection; the response cache
/// absorbs the fan-out on repeat visits.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<CollectionsQuery>,
) -> Result<Json<Vec<CollectionView>>, AppError> {
    let kind = subtype_filter(query.collection_type.as_deref())?;
    let collections = state
        .shopify()
        .list_collections(query.limit.unwrap_or(DEFAULT_PAGE_SIZE), query.since_id, kind)
        .await;

    let mut views = Vec::with_capacity(collections.len());
    for collection in &collections {
        let products = preview_products(state.shopify(), collection.id).await;
        views.push(CollectionView::new(collection, products));
    }

    Ok(Json(views))
}

/// Collection detail handler.
///
/// Without an explicit subtype the custom endpoint is tried first, then
/// smart, mirroring the order collections are listed in.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(collection_id): Path<u64>,
    Query(query): Query<CollectionsQuery>,
) -> Result<Json<CollectionView>, AppError> {
    let collection = match subtype_filter(query.collection_type.as_deref())? {
        Some(kind) => state.shopify().get_collection_details(collection_id, kind).await,
        None => {
            match state
                .shopify()
                .get_collection_details(collection_id, CollectionKind::Custom)
                .await
            {
                Some(collection) => Some(collection),
                None => {
                    state
                        .shopify()
                        .get_collection_details(collection_id, CollectionKind::Smart)
                        .await
                }
            }
        }
    };
    let collection = collection.ok_or_else(|| AppError::NotFound("Collection".to_string()))?;

    let products = state
        .shopify()
        .list_collection_products(collection_id, query.limit.unwrap_or(DEFAULT_PAGE_SIZE))
        .await;

    Ok(Json(CollectionView::new(
        &collection,
        products.iter().map(ProductSummary::from).collect(),
    )))
}
