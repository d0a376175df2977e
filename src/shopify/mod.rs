//! Shopify Admin REST API client.
//!
//! # Architecture
//!
//! - Plain REST against `/admin/api/{version}/{resource}.json` - Shopify is
//!   source of truth, NO local sync
//! - In-memory caching via `moka` for GET responses (5 minute TTL, bounded)
//! - Rate-limit awareness: bucket state mirrored from the
//!   `X-Shopify-Shop-Api-Call-Limit` header, minimum inter-request spacing,
//!   retry with exponential backoff
//! - Remote failures collapse to empty results at the accessor layer; route
//!   handlers decide what "empty" means for the end user
//!
//! # Example
//!
//! ```rust,ignore
//! use opaline_storefront::shopify::ShopifyClient;
//!
//! let client = ShopifyClient::new(&config.shopify)?;
//!
//! // List a page of products
//! let products = client.list_products(50, None).await;
//!
//! // Fetch one product; None covers both "absent" and "unreachable"
//! let product = client.get_product_details(632_910_392).await;
//! ```

pub mod rest;
pub mod types;
pub mod webhook;

pub use rest::{ClientTuning, ShopifyClient};
pub use types::*;
pub use webhook::verify_webhook_signature;

use thiserror::Error;

/// Errors that can occur when constructing or driving the Admin API client.
///
/// Ordinary remote failures (timeouts, 5xx, 404) never surface here; the
/// request engine collapses them into empty results. This type covers the
/// conditions that must abort instead: misconfiguration at construction and
/// transport-level setup failures.
#[derive(Debug, Error)]
pub enum ShopifyError {
    /// No Admin API access token was supplied.
    #[error("Missing Admin API access token")]
    MissingAccessToken,

    /// The access token cannot be sent as an HTTP header.
    #[error("Access token is not a valid header value: {0}")]
    InvalidAccessToken(#[from] reqwest::header::InvalidHeaderValue),

    /// Building the HTTP client failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shopify_error_display() {
        let err = ShopifyError::MissingAccessToken;
        assert_eq!(err.to_string(), "Missing Admin API access token");
    }

    #[test]
    fn test_invalid_token_display() {
        let invalid = reqwest::header::HeaderValue::from_str("to\nken")
            .expect_err("control characters are invalid in header values");
        let err = ShopifyError::from(invalid);
        assert!(err.to_string().starts_with("Access token is not a valid"));
    }
}
