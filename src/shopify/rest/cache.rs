//! Cache types for Admin API responses.

use std::sync::Arc;

use reqwest::Method;
use serde_json::Value;

use super::FetchOutcome;

/// Cache key: one entry per (method, endpoint path, serialized query).
///
/// The request body is deliberately absent. Only GETs are ever cached, so
/// keying by body would just make entries for mutating calls collide less
/// obviously; the engine instead refuses to cache non-GET traffic at all.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct CacheKey {
    method: Method,
    path: String,
    query: String,
}

impl CacheKey {
    pub fn new(method: &Method, path: &str, query: &[(&str, String)]) -> Self {
        let query = query
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        Self {
            method: method.clone(),
            path: path.to_string(),
            query,
        }
    }
}

/// Cached fetch outcomes.
///
/// 404s and final-attempt transient failures are stored alongside real
/// bodies so a TTL-window replay behaves exactly like the fetch it shadows.
#[derive(Debug, Clone)]
pub enum CachedResponse {
    Body(Arc<Value>),
    NotFound,
    Unavailable,
}

impl CachedResponse {
    pub fn into_outcome(self) -> FetchOutcome {
        match self {
            Self::Body(body) => FetchOutcome::Body(body),
            Self::NotFound => FetchOutcome::NotFound,
            Self::Unavailable => FetchOutcome::Unavailable,
        }
    }
}

impl From<&FetchOutcome> for CachedResponse {
    fn from(outcome: &FetchOutcome) -> Self {
        match outcome {
            FetchOutcome::Body(body) => Self::Body(Arc::clone(body)),
            FetchOutcome::NotFound => Self::NotFound,
            FetchOutcome::Unavailable => Self::Unavailable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_distinguishes_query() {
        let base = CacheKey::new(&Method::GET, "products.json", &[("limit", "10".to_string())]);
        let other = CacheKey::new(&Method::GET, "products.json", &[("limit", "20".to_string())]);
        assert_ne!(base, other);
    }

    #[test]
    fn test_cache_key_distinguishes_method() {
        let get = CacheKey::new(&Method::GET, "webhooks.json", &[]);
        let post = CacheKey::new(&Method::POST, "webhooks.json", &[]);
        assert_ne!(get, post);
    }

    #[test]
    fn test_cache_key_equal_for_same_request() {
        let query = [("limit", "10".to_string()), ("since_id", "5".to_string())];
        let a = CacheKey::new(&Method::GET, "products.json", &query);
        let b = CacheKey::new(&Method::GET, "products.json", &query);
        assert_eq!(a, b);
    }
}
