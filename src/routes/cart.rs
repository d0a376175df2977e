//! Checkout handler backed by Shopify draft orders.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::error::AppError;
use crate::state::AppState;

/// Checkout request body.
#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub variant_id: u64,
    pub email: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

const fn default_quantity() -> u32 {
    1
}

/// Checkout response: the created draft order, including the invoice URL the
/// customer completes payment on.
#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_url: Option<String>,
}

/// Create a draft order for a single variant.
///
/// Writes are never cached and never retried past the engine's budget; a
/// collapsed result maps to 502 so the frontend can tell "platform down"
/// from its own mistakes.
#[instrument(skip(state, request), fields(variant_id = request.variant_id))]
pub async fn checkout(
    State(state): State<AppState>,
    Json(request): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<CheckoutResponse>), AppError> {
    if request.email.trim().is_empty() {
        return Err(AppError::BadRequest("Missing email".to_string()));
    }
    if request.quantity == 0 {
        return Err(AppError::BadRequest(
            "Quantity must be at least 1".to_string(),
        ));
    }

    let order = state
        .shopify()
        .create_draft_order(request.variant_id, request.email.trim(), request.quantity)
        .await
        .ok_or_else(|| AppError::Upstream("draft order creation failed".to_string()))?;

    info!(order_id = order.id, "Draft order created");

    Ok((
        StatusCode::CREATED,
        Json(CheckoutResponse {
            id: order.id.to_string(),
            status: order.status,
            invoice_url: order.invoice_url,
        }),
    ))
}
