//! Inbound Shopify webhook handler.
//!
//! Verification runs over the raw request bytes, so the handler takes
//! `Bytes` rather than a JSON extractor; parsing the body first would break
//! the signature.

use axum::{Json, body::Bytes, extract::State, http::HeaderMap};
use serde_json::{Value, json};
use tracing::{info, instrument};

use crate::error::AppError;
use crate::shopify::verify_webhook_signature;
use crate::state::AppState;

/// Signature header on every Shopify webhook delivery.
const SHOPIFY_HMAC_HEADER: &str = "x-shopify-hmac-sha256";

/// Topic header, e.g. `products/update`.
const SHOPIFY_TOPIC_HEADER: &str = "x-shopify-topic";

/// Verify and acknowledge a webhook delivery.
///
/// Shopify retries non-200 responses, so this only rejects deliveries that
/// fail verification; processing stays cheap enough to answer inline.
#[instrument(skip(state, headers, body))]
pub async fn shopify(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    let provided = headers
        .get(SHOPIFY_HMAC_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    let secret = state.config().shopify.webhook_secret.as_ref();
    if !verify_webhook_signature(secret, &body, provided) {
        return Err(AppError::Unauthorized(
            "Invalid webhook signature".to_string(),
        ));
    }

    let topic = headers
        .get(SHOPIFY_TOPIC_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown");
    info!(topic, body_bytes = body.len(), "Webhook delivery verified");

    // Catalog changes outdate cached reads; drop them rather than serving
    // stale bodies for up to a full TTL.
    if topic.starts_with("products/") || topic.starts_with("collections/") {
        state.shopify().invalidate_cached_responses();
    }

    Ok(Json(json!({})))
}
