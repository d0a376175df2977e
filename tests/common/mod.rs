//! Shared fixtures for the integration suites: an in-process stand-in for
//! the Shopify Admin API, plus client and configuration builders pointed at
//! it. Everything binds ephemeral loopback ports, so the suites run without
//! any external services.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use secrecy::SecretString;
use serde_json::{Value, json};

use opaline_storefront::config::{AppConfig, ShopifyConfig};
use opaline_storefront::shopify::{ClientTuning, ShopifyClient};

/// Admin API version the fixtures are pinned to. Mock routes live under
/// `/admin/api/{API_VERSION}/`.
pub const API_VERSION: &str = "2026-01";

/// Serve a router on an ephemeral loopback port, returning its address.
///
/// The server task is detached; it dies with the test process.
pub async fn serve(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind an ephemeral port");
    let addr = listener.local_addr().expect("listener has a local address");
    tokio::spawn(async move {
        axum::serve(listener, router)
            .await
            .expect("serve test router");
    });
    addr
}

/// Route path under the mock's Admin API prefix.
pub fn admin_path(resource: &str) -> String {
    format!("/admin/api/{API_VERSION}/{resource}")
}

/// Admin API configuration pointed at an in-process mock server.
pub fn shopify_config(admin_api: SocketAddr) -> ShopifyConfig {
    ShopifyConfig {
        store: format!("http://{admin_api}"),
        api_version: API_VERSION.to_string(),
        access_token: SecretString::from("shpat_test_token"),
        webhook_secret: None,
        cache_ttl: Duration::from_secs(300),
    }
}

/// Application configuration for route tests: Shopify pointed at the mock,
/// optional services disabled.
pub fn app_config(admin_api: SocketAddr) -> AppConfig {
    AppConfig {
        host: "127.0.0.1".parse().expect("loopback parses"),
        port: 0,
        frontend_url: "http://localhost:5173".to_string(),
        allowed_origins: vec!["http://localhost:5173".to_string()],
        shopify: shopify_config(admin_api),
        email: None,
        x_auth: None,
        sentry_dsn: None,
    }
}

/// Client tuning with production semantics but millisecond pacing, so the
/// retry and throttle paths run in test time.
pub fn fast_tuning() -> ClientTuning {
    ClientTuning {
        cache_ttl: Duration::from_secs(300),
        cache_capacity: 64,
        request_timeout: Duration::from_secs(2),
        max_attempts: 3,
        base_backoff: Duration::from_millis(10),
        max_backoff: Duration::from_millis(40),
        min_request_interval: Duration::from_millis(1),
        low_water_mark: 5,
        bucket_size: 40,
    }
}

/// Admin API client wired to the mock server with fast tuning.
pub fn admin_client(admin_api: SocketAddr) -> ShopifyClient {
    admin_client_with(admin_api, fast_tuning())
}

/// Admin API client wired to the mock server with explicit tuning.
pub fn admin_client_with(admin_api: SocketAddr, tuning: ClientTuning) -> ShopifyClient {
    ShopifyClient::with_tuning(&shopify_config(admin_api), tuning).expect("build admin client")
}

/// One product entry as the Admin API would list it, with a single variant
/// priced `price` against an optional `compare_at` price.
pub fn product_entry(id: u64, title: &str, price: &str, compare_at: Option<&str>) -> Value {
    json!({
        "id": id,
        "title": title,
        "body_html": format!("<p>{title} in recycled silver.</p>"),
        "vendor": "Opaline",
        "images": [{"src": format!("https://cdn.example/products/{id}.jpg")}],
        "variants": [{
            "id": id * 10,
            "title": "One Size",
            "option1": "One Size",
            "inventory_quantity": 4,
            "price": price,
            "compare_at_price": compare_at,
        }],
    })
}

/// One collection entry as the Admin API would list it.
pub fn collection_entry(id: u64, title: &str) -> Value {
    json!({
        "id": id,
        "title": title,
        "body_html": format!("<p>{title}.</p>"),
        "image": {"src": format!("https://cdn.example/collections/{id}.jpg")},
    })
}
