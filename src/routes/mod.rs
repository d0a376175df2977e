//! HTTP route handlers for the storefront API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                          - Health check
//!
//! # Catalog
//! GET  /api/v1/products                 - Product listing
//! GET  /api/v1/products/{id}            - Product detail
//! GET  /api/v1/collections              - Collection listing (with previews)
//! GET  /api/v1/collections/{id}         - Collection detail
//!
//! # Checkout
//! POST /api/v1/cart/checkout            - Create a draft order
//!
//! # Forms (rate limited)
//! POST /api/v1/contact                  - Contact form submission
//! POST /api/v1/privacy-request          - Privacy request submission
//!
//! # Social login (X OAuth2)
//! GET  /api/v1/auth/x/authorize         - Redirect to the provider
//! POST /api/v1/auth/x                   - Code exchange (SPA-driven)
//! GET  /api/v1/auth/x/callback          - Provider redirect (server-driven)
//! GET  /api/v1/auth/x/user/{user_id}    - Collect a parked profile
//!
//! # Webhooks
//! POST /api/v1/webhooks/shopify         - Signed Shopify delivery
//! ```

pub mod auth;
pub mod cart;
pub mod collections;
pub mod contact;
pub mod products;
pub mod webhooks;

use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::form_rate_limiter;
use crate::state::AppState;

/// Health check handler.
pub async fn health() -> &'static str {
    "OK"
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{product_id}", get(products::show))
}

/// Create the collection routes router.
pub fn collection_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(collections::index))
        .route("/{collection_id}", get(collections::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new().route("/checkout", post(cart::checkout))
}

/// Create the form routes router, wrapped in the per-IP rate limiter.
pub fn form_routes() -> Router<AppState> {
    Router::new()
        .route("/contact", post(contact::submit_contact))
        .route("/privacy-request", post(contact::submit_privacy_request))
        .layer(form_rate_limiter())
}

/// Create the social login routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/x", post(auth::exchange))
        .route("/x/authorize", get(auth::authorize))
        .route("/x/callback", get(auth::callback))
        .route("/x/user/{user_id}", get(auth::user_profile))
}

/// Create the webhook routes router.
pub fn webhook_routes() -> Router<AppState> {
    Router::new().route("/shopify", post(webhooks::shopify))
}

/// Create all `/api/v1` routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Catalog
        .nest("/products", product_routes())
        .nest("/collections", collection_routes())
        // Checkout
        .nest("/cart", cart_routes())
        // Forms (rate limited)
        .merge(form_routes())
        // Social login
        .nest("/auth", auth_routes())
        // Webhooks
        .nest("/webhooks", webhook_routes())
}
