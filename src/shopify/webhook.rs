//! Inbound webhook signature verification.
//!
//! Shopify signs webhook deliveries with HMAC-SHA256 over the exact raw
//! request body and sends the digest base64-encoded in
//! `X-Shopify-Hmac-Sha256`. Verification must therefore run on the bytes as
//! received, before any JSON parsing touches them.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use tracing::warn;

type HmacSha256 = Hmac<Sha256>;

/// Check a webhook delivery's signature against the shared secret.
///
/// Returns `false` when no secret is configured, when the header is not
/// valid base64, or when the digest does not match. The comparison is
/// constant time.
#[must_use]
pub fn verify_webhook_signature(
    secret: Option<&SecretString>,
    raw_body: &[u8],
    provided_signature: &str,
) -> bool {
    let Some(secret) = secret else {
        warn!("Webhook secret not configured, rejecting delivery");
        return false;
    };

    let Ok(expected) = BASE64.decode(provided_signature.trim()) else {
        warn!("Webhook signature header is not valid base64");
        return false;
    };

    let Ok(mut mac) = HmacSha256::new_from_slice(secret.expose_secret().as_bytes()) else {
        return false;
    };
    mac.update(raw_body);
    mac.verify_slice(&expected).is_ok()
}
