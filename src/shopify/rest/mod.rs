//! Shopify Admin REST API client implementation.
//!
//! One `ShopifyClient` is shared by every request-handling task. It owns the
//! response cache (`moka`, bounded, TTL), the rate-limit budget mirrored from
//! `X-Shopify-Shop-Api-Call-Limit`, and the throttle clock enforcing minimum
//! inter-request spacing. All scheduling decisions happen under a short
//! `tokio::sync::Mutex` hold; network calls and sleeps happen outside it.
//!
//! Remote failures never escape the engine: after the retry budget is spent,
//! accessors collapse to empty vectors or `None` and the route layer decides
//! what that means for the end user.

mod cache;
mod conversions;

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue, RETRY_AFTER};
use reqwest::{Method, StatusCode};
use secrecy::ExposeSecret;
use serde_json::{Value, json};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, instrument, warn};

use crate::config::ShopifyConfig;

use super::ShopifyError;
use super::types::{Collection, CollectionKind, DraftOrder, Product, Variant, Webhook};
use cache::{CacheKey, CachedResponse};

/// Access-token header sent on every Admin API request.
const ACCESS_TOKEN_HEADER: &str = "x-shopify-access-token";

/// Rate-limit usage header, formatted `"used/total"`.
const CALL_LIMIT_HEADER: &str = "x-shopify-shop-api-call-limit";

/// Hard page-size ceiling imposed by the Admin API.
const MAX_PAGE_SIZE: u32 = 250;

// =============================================================================
// Tuning
// =============================================================================

/// Scheduling and cache knobs for the Admin API client.
///
/// The defaults mirror production behavior; tests shrink the durations to
/// keep suites fast.
#[derive(Debug, Clone)]
pub struct ClientTuning {
    /// How long cached GET responses stay valid.
    pub cache_ttl: Duration,
    /// Maximum number of cached responses.
    pub cache_capacity: u64,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// Total attempts per call, including the first.
    pub max_attempts: u32,
    /// Backoff for attempt 0; doubles each attempt.
    pub base_backoff: Duration,
    /// Ceiling for computed backoff (server-directed `Retry-After` is
    /// honored verbatim and not capped).
    pub max_backoff: Duration,
    /// Minimum spacing between outbound requests.
    pub min_request_interval: Duration,
    /// Remaining-credit level that triggers a defensive pause.
    pub low_water_mark: u32,
    /// Advertised bucket ceiling assumed until a usage header arrives.
    pub bucket_size: u32,
}

impl Default for ClientTuning {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(300),
            cache_capacity: 1024,
            request_timeout: Duration::from_secs(10),
            max_attempts: 3,
            base_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(8),
            min_request_interval: Duration::from_millis(500),
            low_water_mark: 5,
            bucket_size: 40,
        }
    }
}

impl ClientTuning {
    /// Exponential backoff for the given zero-based attempt, capped at
    /// `max_backoff`.
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.base_backoff.saturating_mul(factor).min(self.max_backoff)
    }
}

// =============================================================================
// Internal state
// =============================================================================

/// Outcome of a fetch after caching, retries, and error collapsing.
#[derive(Debug, Clone)]
pub(crate) enum FetchOutcome {
    /// Successful response with a decoded JSON body.
    Body(Arc<Value>),
    /// The resource does not exist upstream (HTTP 404).
    NotFound,
    /// The platform stayed unreachable or failing for the whole retry budget.
    Unavailable,
}

/// Best-effort mirror of the platform's leaky bucket, plus the throttle
/// clock. Protected by one mutex; critical sections are a few loads/stores.
struct RateBudget {
    bucket_size: u32,
    bucket_remaining: u32,
    /// Earliest instant the next request may be sent.
    next_slot: Option<Instant>,
}

/// Result of one wire attempt, before retry bookkeeping.
enum Attempt {
    Success(Value),
    NotFound,
    /// 429 with an optional server-directed wait.
    Throttled(Option<Duration>),
    /// Network error, unexpected status, or undecodable body (already logged).
    Transient,
}

// =============================================================================
// ShopifyClient
// =============================================================================

/// Client for the Shopify Admin REST API.
///
/// Cheap to clone; all clones share the cache, rate-limit budget, and
/// throttle clock.
#[derive(Clone)]
pub struct ShopifyClient {
    inner: Arc<ShopifyClientInner>,
}

struct ShopifyClientInner {
    http: reqwest::Client,
    base_url: String,
    api_version: String,
    cache: Cache<CacheKey, CachedResponse>,
    budget: Mutex<RateBudget>,
    tuning: ClientTuning,
}

impl ShopifyClient {
    /// Create a client with default tuning, honoring the configured cache
    /// TTL.
    ///
    /// # Errors
    ///
    /// Fails fast when the access token is missing/empty, cannot be sent as
    /// a header, or the HTTP client cannot be built. Startup should abort on
    /// any of these.
    pub fn new(config: &ShopifyConfig) -> Result<Self, ShopifyError> {
        let tuning = ClientTuning {
            cache_ttl: config.cache_ttl,
            ..ClientTuning::default()
        };
        Self::with_tuning(config, tuning)
    }

    /// Create a client with explicit tuning.
    ///
    /// # Errors
    ///
    /// Same conditions as [`ShopifyClient::new`].
    pub fn with_tuning(config: &ShopifyConfig, tuning: ClientTuning) -> Result<Self, ShopifyError> {
        let token = config.access_token.expose_secret().trim();
        if token.is_empty() {
            return Err(ShopifyError::MissingAccessToken);
        }

        let mut token_value = HeaderValue::from_str(token)?;
        token_value.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(ACCESS_TOKEN_HEADER, token_value);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .timeout(tuning.request_timeout)
            .default_headers(headers)
            .build()?;

        let cache = Cache::builder()
            .max_capacity(tuning.cache_capacity)
            .time_to_live(tuning.cache_ttl)
            .build();

        // A full URL is accepted so tests can point at a local server;
        // production config passes a bare store domain.
        let base_url = if config.store.starts_with("http://") || config.store.starts_with("https://")
        {
            config.store.trim_end_matches('/').to_string()
        } else {
            format!("https://{}", config.store)
        };

        Ok(Self {
            inner: Arc::new(ShopifyClientInner {
                http,
                base_url,
                api_version: config.api_version.clone(),
                cache,
                budget: Mutex::new(RateBudget {
                    bucket_size: tuning.bucket_size,
                    bucket_remaining: tuning.bucket_size,
                    next_slot: None,
                }),
                tuning,
            }),
        })
    }

    /// Drop every cached response.
    ///
    /// Called when a webhook reports catalog changes, so the next read
    /// re-fetches instead of serving a stale body for up to a full TTL.
    pub fn invalidate_cached_responses(&self) {
        self.inner.cache.invalidate_all();
    }

    // =========================================================================
    // Request engine
    // =========================================================================

    /// Execute one Admin API call through the cache, throttle, and retry
    /// engine.
    ///
    /// Only GETs consult or populate the cache; mutating calls always hit
    /// the wire. 404s and exhausted transient failures are cached (for GETs)
    /// so a TTL-window replay behaves like the original fetch. A call that
    /// burns every attempt on 429s gives up uncached.
    #[instrument(skip(self, body), fields(method = %method, endpoint))]
    async fn request_json(
        &self,
        method: Method,
        endpoint: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> FetchOutcome {
        let cacheable = method == Method::GET;
        let key = CacheKey::new(&method, endpoint, query);

        if cacheable && let Some(hit) = self.inner.cache.get(&key).await {
            debug!("Cache hit");
            return hit.into_outcome();
        }

        let url = format!(
            "{}/admin/api/{}/{endpoint}",
            self.inner.base_url, self.inner.api_version
        );
        let tuning = &self.inner.tuning;

        for attempt in 0..tuning.max_attempts {
            let last = attempt + 1 == tuning.max_attempts;

            // Defensive pause when the mirrored budget is nearly spent,
            // independent of any throttling by the server.
            if let Some(pause) = self.low_water_pause(attempt).await {
                warn!(
                    pause_ms = u64::try_from(pause.as_millis()).unwrap_or(u64::MAX),
                    attempt, "Rate budget low, backing off"
                );
                tokio::time::sleep(pause).await;
            }

            // Reserve a send slot under the lock, wait for it outside.
            let slot = self.reserve_send_slot().await;
            tokio::time::sleep_until(slot).await;

            match self.attempt_request(&method, &url, query, body).await {
                Attempt::Success(value) => {
                    let outcome = FetchOutcome::Body(Arc::new(value));
                    if cacheable {
                        self.inner
                            .cache
                            .insert(key, CachedResponse::from(&outcome))
                            .await;
                    }
                    return outcome;
                }
                Attempt::NotFound => {
                    debug!(attempt, "Resource missing upstream");
                    if cacheable {
                        self.inner.cache.insert(key, CachedResponse::NotFound).await;
                    }
                    return FetchOutcome::NotFound;
                }
                Attempt::Throttled(server_wait) => {
                    let wait = server_wait.unwrap_or_else(|| tuning.delay_for_attempt(attempt));
                    warn!(
                        wait_ms = u64::try_from(wait.as_millis()).unwrap_or(u64::MAX),
                        attempt, "Throttled by Admin API, waiting"
                    );
                    tokio::time::sleep(wait).await;
                }
                Attempt::Transient => {
                    if last {
                        if cacheable {
                            self.inner
                                .cache
                                .insert(key, CachedResponse::Unavailable)
                                .await;
                        }
                        return FetchOutcome::Unavailable;
                    }
                    tokio::time::sleep(tuning.delay_for_attempt(attempt)).await;
                }
            }
        }

        // Every attempt ended in a 429. Give up quietly without caching so
        // the next caller retries as soon as it arrives.
        FetchOutcome::Unavailable
    }

    /// One wire attempt: send, mirror the usage header, classify the status.
    async fn attempt_request(
        &self,
        method: &Method,
        url: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Attempt {
        let mut request = self.inner.http.request(method.clone(), url);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(json_body) = body {
            request = request.json(json_body);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(error) => {
                warn!(error = %error, "Admin API request failed");
                return Attempt::Transient;
            }
        };

        self.record_call_limit(response.headers()).await;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Attempt::Throttled(retry_after(response.headers()));
        }
        if status == StatusCode::NOT_FOUND {
            return Attempt::NotFound;
        }
        if !status.is_success() {
            warn!(status = %status, "Admin API returned non-success status");
            return Attempt::Transient;
        }

        // Read as text first so decode failures can log a body snippet.
        let text = match response.text().await {
            Ok(text) => text,
            Err(error) => {
                warn!(error = %error, "Failed to read Admin API response body");
                return Attempt::Transient;
            }
        };
        match serde_json::from_str::<Value>(&text) {
            Ok(value) => Attempt::Success(value),
            Err(error) => {
                warn!(
                    error = %error,
                    body = %text.chars().take(500).collect::<String>(),
                    "Failed to decode Admin API body"
                );
                Attempt::Transient
            }
        }
    }

    /// Reserve the next send slot, pushing the shared clock forward by the
    /// minimum spacing. Returns the instant this caller may transmit.
    async fn reserve_send_slot(&self) -> Instant {
        let mut budget = self.inner.budget.lock().await;
        let now = Instant::now();
        let slot = match budget.next_slot {
            Some(next) if next > now => next,
            _ => now,
        };
        budget.next_slot = Some(slot + self.inner.tuning.min_request_interval);
        slot
    }

    /// Backoff to apply before this attempt when remaining credits are under
    /// the low-water mark; `None` when there is headroom.
    async fn low_water_pause(&self, attempt: u32) -> Option<Duration> {
        let budget = self.inner.budget.lock().await;
        if budget.bucket_remaining < self.inner.tuning.low_water_mark {
            drop(budget);
            Some(self.inner.tuning.delay_for_attempt(attempt))
        } else {
            None
        }
    }

    /// Mirror `"used/total"` from the usage header into the shared budget.
    /// Absent or malformed headers leave the state unchanged.
    async fn record_call_limit(&self, headers: &HeaderMap) {
        let Some(raw) = headers.get(CALL_LIMIT_HEADER).and_then(|v| v.to_str().ok()) else {
            return;
        };
        if let Some((used, total)) = parse_call_limit(raw) {
            let mut budget = self.inner.budget.lock().await;
            budget.bucket_size = total;
            budget.bucket_remaining = total.saturating_sub(used);
        }
    }

    /// Snapshot of (remaining, size) for logging and tests.
    pub async fn rate_budget(&self) -> (u32, u32) {
        let budget = self.inner.budget.lock().await;
        (budget.bucket_remaining, budget.bucket_size)
    }

    // =========================================================================
    // Product Methods
    // =========================================================================

    /// List one page of products.
    ///
    /// `limit` is capped at 250. Returns an empty vector when the platform
    /// is unreachable; entries missing an id or title are skipped with a
    /// warning.
    #[instrument(skip(self))]
    pub async fn list_products(&self, limit: u32, since_id: Option<u64>) -> Vec<Product> {
        let mut query = vec![("limit", limit.min(MAX_PAGE_SIZE).to_string())];
        if let Some(id) = since_id {
            query.push(("since_id", id.to_string()));
        }

        match self
            .request_json(Method::GET, "products.json", &query, None)
            .await
        {
            FetchOutcome::Body(body) => conversions::products_from_listing(&body),
            FetchOutcome::NotFound | FetchOutcome::Unavailable => Vec::new(),
        }
    }

    /// Fetch a single product with variants and derived pricing.
    ///
    /// `None` covers both "absent upstream" and "platform unreachable";
    /// callers decide which of those deserves a 404.
    #[instrument(skip(self))]
    pub async fn get_product_details(&self, product_id: u64) -> Option<Product> {
        let endpoint = format!("products/{product_id}.json");
        match self.request_json(Method::GET, &endpoint, &[], None).await {
            FetchOutcome::Body(body) => conversions::product_from_detail(&body),
            FetchOutcome::NotFound | FetchOutcome::Unavailable => None,
        }
    }

    /// List a product's variants, in display order.
    ///
    /// Derived from [`ShopifyClient::get_product_details`], so it shares the
    /// same cache entry.
    #[instrument(skip(self))]
    pub async fn list_variants(&self, product_id: u64) -> Vec<Variant> {
        self.get_product_details(product_id)
            .await
            .map(|product| product.variants)
            .unwrap_or_default()
    }

    // =========================================================================
    // Collection Methods
    // =========================================================================

    /// List collections, each tagged with its subtype.
    ///
    /// With `kind = None` both endpoints are queried and concatenated: all
    /// custom collections first, then all smart collections, never
    /// interleaved.
    #[instrument(skip(self))]
    pub async fn list_collections(
        &self,
        limit: u32,
        since_id: Option<u64>,
        kind: Option<CollectionKind>,
    ) -> Vec<Collection> {
        match kind {
            Some(kind) => self.list_collections_of_kind(limit, since_id, kind).await,
            None => {
                let mut all = self
                    .list_collections_of_kind(limit, since_id, CollectionKind::Custom)
                    .await;
                all.extend(
                    self.list_collections_of_kind(limit, since_id, CollectionKind::Smart)
                        .await,
                );
                all
            }
        }
    }

    async fn list_collections_of_kind(
        &self,
        limit: u32,
        since_id: Option<u64>,
        kind: CollectionKind,
    ) -> Vec<Collection> {
        let mut query = vec![("limit", limit.min(MAX_PAGE_SIZE).to_string())];
        if let Some(id) = since_id {
            query.push(("since_id", id.to_string()));
        }

        let endpoint = match kind {
            CollectionKind::Custom => "custom_collections.json",
            CollectionKind::Smart => "smart_collections.json",
        };

        match self.request_json(Method::GET, endpoint, &query, None).await {
            FetchOutcome::Body(body) => conversions::collections_from_listing(&body, kind),
            FetchOutcome::NotFound | FetchOutcome::Unavailable => Vec::new(),
        }
    }

    /// Fetch a single collection of a known subtype.
    ///
    /// Callers that do not know the subtype try `Custom` first and fall back
    /// to `Smart` on `None`.
    #[instrument(skip(self))]
    pub async fn get_collection_details(
        &self,
        collection_id: u64,
        kind: CollectionKind,
    ) -> Option<Collection> {
        let endpoint = match kind {
            CollectionKind::Custom => format!("custom_collections/{collection_id}.json"),
            CollectionKind::Smart => format!("smart_collections/{collection_id}.json"),
        };

        match self.request_json(Method::GET, &endpoint, &[], None).await {
            FetchOutcome::Body(body) => conversions::collection_from_detail(&body, kind),
            FetchOutcome::NotFound | FetchOutcome::Unavailable => None,
        }
    }

    /// List one page of a collection's products. `limit` is capped at 250.
    #[instrument(skip(self))]
    pub async fn list_collection_products(&self, collection_id: u64, limit: u32) -> Vec<Product> {
        let endpoint = format!("collections/{collection_id}/products.json");
        let query = vec![("limit", limit.min(MAX_PAGE_SIZE).to_string())];

        match self.request_json(Method::GET, &endpoint, &query, None).await {
            FetchOutcome::Body(body) => conversions::products_from_listing(&body),
            FetchOutcome::NotFound | FetchOutcome::Unavailable => Vec::new(),
        }
    }

    // =========================================================================
    // Write Methods
    // =========================================================================

    /// Create a draft order reserving `quantity` of a variant for `email`.
    ///
    /// Never cached. `None` means the platform rejected the write or stayed
    /// unreachable; the caller maps that to a gateway error.
    #[instrument(skip(self, email))]
    pub async fn create_draft_order(
        &self,
        variant_id: u64,
        email: &str,
        quantity: u32,
    ) -> Option<DraftOrder> {
        let payload = json!({
            "draft_order": {
                "line_items": [{
                    "variant_id": variant_id,
                    "quantity": quantity,
                }],
                "email": email,
                "use_customer_default_address": true,
            }
        });

        match self
            .request_json(Method::POST, "draft_orders.json", &[], Some(&payload))
            .await
        {
            FetchOutcome::Body(body) => conversions::draft_order_from_response(&body),
            FetchOutcome::NotFound | FetchOutcome::Unavailable => None,
        }
    }

    /// Register a webhook subscription. Never cached.
    #[instrument(skip(self))]
    pub async fn create_webhook(&self, topic: &str, callback_url: &str) -> Option<Webhook> {
        let payload = json!({
            "webhook": {
                "topic": topic,
                "address": callback_url,
                "format": "json",
            }
        });

        match self
            .request_json(Method::POST, "webhooks.json", &[], Some(&payload))
            .await
        {
            FetchOutcome::Body(body) => conversions::webhook_from_response(&body),
            FetchOutcome::NotFound | FetchOutcome::Unavailable => None,
        }
    }
}

// =============================================================================
// Header parsing
// =============================================================================

/// Parse `"used/total"` into `(used, total)`.
fn parse_call_limit(raw: &str) -> Option<(u32, u32)> {
    let (used, total) = raw.split_once('/')?;
    Some((used.trim().parse().ok()?, total.trim().parse().ok()?))
}

/// Server-directed wait from a 429's `Retry-After` header, in whole seconds.
fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    fn test_config(token: &str) -> ShopifyConfig {
        ShopifyConfig {
            store: "test.myshopify.com".to_string(),
            api_version: "2026-01".to_string(),
            access_token: SecretString::from(token),
            webhook_secret: None,
            cache_ttl: Duration::from_secs(300),
        }
    }

    #[test]
    fn test_parse_call_limit() {
        assert_eq!(parse_call_limit("32/40"), Some((32, 40)));
        assert_eq!(parse_call_limit(" 1 / 80 "), Some((1, 80)));
        assert_eq!(parse_call_limit("garbage"), None);
        assert_eq!(parse_call_limit("a/b"), None);
        assert_eq!(parse_call_limit(""), None);
    }

    #[test]
    fn test_retry_after_header() {
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from_static("2"));
        assert_eq!(retry_after(&headers), Some(Duration::from_secs(2)));

        headers.insert(RETRY_AFTER, HeaderValue::from_static("soon"));
        assert_eq!(retry_after(&headers), None);

        assert_eq!(retry_after(&HeaderMap::new()), None);
    }

    #[test]
    fn test_delay_for_attempt_doubles_and_caps() {
        let tuning = ClientTuning::default();
        assert_eq!(tuning.delay_for_attempt(0), Duration::from_secs(1));
        assert_eq!(tuning.delay_for_attempt(1), Duration::from_secs(2));
        assert_eq!(tuning.delay_for_attempt(2), Duration::from_secs(4));
        // Beyond the configured attempts the cap binds.
        assert_eq!(tuning.delay_for_attempt(10), Duration::from_secs(8));
    }

    #[test]
    fn test_missing_access_token_fails_construction() {
        let config = test_config("");
        assert!(matches!(
            ShopifyClient::new(&config),
            Err(ShopifyError::MissingAccessToken)
        ));

        let config = test_config("   ");
        assert!(matches!(
            ShopifyClient::new(&config),
            Err(ShopifyError::MissingAccessToken)
        ));
    }

    #[test]
    fn test_base_url_accepts_domain_or_full_url() {
        let client = ShopifyClient::new(&test_config("shpat_token")).unwrap();
        assert_eq!(client.inner.base_url, "https://test.myshopify.com");

        let mut config = test_config("shpat_token");
        config.store = "http://127.0.0.1:9000/".to_string();
        let client = ShopifyClient::new(&config).unwrap();
        assert_eq!(client.inner.base_url, "http://127.0.0.1:9000");
    }

    #[tokio::test]
    async fn test_reserve_send_slot_spaces_requests() {
        let tuning = ClientTuning {
            min_request_interval: Duration::from_millis(50),
            ..ClientTuning::default()
        };
        let client = ShopifyClient::with_tuning(&test_config("shpat_token"), tuning).unwrap();

        let first = client.reserve_send_slot().await;
        let second = client.reserve_send_slot().await;
        let third = client.reserve_send_slot().await;

        assert!(second >= first + Duration::from_millis(50));
        assert!(third >= second + Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_record_call_limit_updates_budget() {
        let client = ShopifyClient::new(&test_config("shpat_token")).unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(CALL_LIMIT_HEADER, HeaderValue::from_static("35/40"));
        client.record_call_limit(&headers).await;
        assert_eq!(client.rate_budget().await, (5, 40));

        // Malformed header leaves the budget untouched.
        headers.insert(CALL_LIMIT_HEADER, HeaderValue::from_static("nonsense"));
        client.record_call_limit(&headers).await;
        assert_eq!(client.rate_budget().await, (5, 40));
    }

    #[tokio::test]
    async fn test_low_water_pause_kicks_in_under_mark() {
        let client = ShopifyClient::new(&test_config("shpat_token")).unwrap();

        // Fresh client starts at full budget: no pause.
        assert_eq!(client.low_water_pause(0).await, None);

        let mut headers = HeaderMap::new();
        headers.insert(CALL_LIMIT_HEADER, HeaderValue::from_static("38/40"));
        client.record_call_limit(&headers).await;

        assert_eq!(client.low_water_pause(0).await, Some(Duration::from_secs(1)));
        assert_eq!(client.low_water_pause(1).await, Some(Duration::from_secs(2)));
    }
}
