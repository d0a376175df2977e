//! X (Twitter) OAuth 2.0 login exchange.
//!
//! The SPA never sees the client secret: it sends the authorization code
//! here, and this service performs the code-to-token exchange (HTTP Basic)
//! and the profile fetch server-side. Profiles collected on the provider
//! redirect are parked in memory, keyed by the provider user id, until the
//! SPA picks them up.

use std::collections::HashMap;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::StatusCode;
use reqwest::header::AUTHORIZATION;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{instrument, warn};

use crate::config::XAuthConfig;

const AUTHORIZE_URL: &str = "https://api.x.com/2/oauth2/authorize";
const TOKEN_URL: &str = "https://api.x.com/2/oauth2/token";
const PROFILE_URL: &str = "https://api.x.com/2/users/me";
const SCOPE: &str = "users.read follows.write";

// Fixed state/challenge placeholders; the SPA checks state equality and the
// plain-method verifier must equal the challenge sent on authorize.
const STATE: &str = "state";
const CODE_CHALLENGE: &str = "challenge";

/// Errors that can occur during the OAuth exchange.
#[derive(Debug, Error)]
pub enum XAuthError {
    /// The identity provider could not be reached.
    #[error("identity provider request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider rejected the code-to-token exchange.
    #[error("token exchange failed with status {status}: {message}")]
    TokenExchange { status: StatusCode, message: String },

    /// The provider rejected the profile fetch.
    #[error("profile fetch failed with status {status}: {message}")]
    ProfileFetch { status: StatusCode, message: String },

    /// The provider returned a body that is not valid JSON.
    #[error("failed to parse provider response: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Client for the X OAuth 2.0 login flow.
///
/// Cheap to clone; all clones share the HTTP client and the parked-profile
/// store.
#[derive(Clone)]
pub struct XAuthClient {
    inner: Arc<XAuthClientInner>,
}

struct XAuthClientInner {
    http: reqwest::Client,
    client_id: String,
    client_secret: SecretString,
    /// Profiles collected on the provider redirect, keyed by the provider
    /// user id, awaiting pickup by the SPA. Never persisted.
    profiles: RwLock<HashMap<String, Value>>,
}

impl XAuthClient {
    /// Create a client from OAuth configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built.
    pub fn new(config: &XAuthConfig) -> Result<Self, XAuthError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()?;

        Ok(Self {
            inner: Arc::new(XAuthClientInner {
                http,
                client_id: config.client_id.clone(),
                client_secret: config.client_secret.clone(),
                profiles: RwLock::new(HashMap::new()),
            }),
        })
    }

    /// Provider authorization URL for the given landing point.
    #[must_use]
    pub fn authorize_url(&self, redirect_uri: &str) -> String {
        format!(
            "{AUTHORIZE_URL}?response_type=code&client_id={}&redirect_uri={}&scope={}&state={STATE}&code_challenge={CODE_CHALLENGE}&code_challenge_method=plain",
            urlencoding::encode(&self.inner.client_id),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(SCOPE),
        )
    }

    /// Exchange an authorization code for a token, then fetch the user's
    /// profile. Returns the profile's `data` object.
    ///
    /// # Errors
    ///
    /// Returns error when the provider is unreachable, rejects the exchange
    /// or fetch, or answers with an undecodable body.
    #[instrument(skip(self, code))]
    pub async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<Value, XAuthError> {
        let basic = BASE64.encode(format!(
            "{}:{}",
            self.inner.client_id,
            self.inner.client_secret.expose_secret()
        ));
        let form = [
            ("code", code),
            ("grant_type", "authorization_code"),
            ("client_id", self.inner.client_id.as_str()),
            ("redirect_uri", redirect_uri),
            ("code_verifier", CODE_CHALLENGE),
        ];

        let response = self
            .inner
            .http
            .post(TOKEN_URL)
            .header(AUTHORIZATION, format!("Basic {basic}"))
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            warn!(status = %status, "Token exchange rejected");
            return Err(XAuthError::TokenExchange {
                status,
                message: text,
            });
        }

        let token: Value = serde_json::from_str(&text)?;
        let Some(access_token) = token.get("access_token").and_then(Value::as_str) else {
            return Err(XAuthError::TokenExchange {
                status,
                message: "response missing access_token".to_string(),
            });
        };

        self.fetch_profile(access_token).await
    }

    /// Fetch the authenticated user's profile with a bearer token.
    async fn fetch_profile(&self, access_token: &str) -> Result<Value, XAuthError> {
        let response = self
            .inner
            .http
            .get(PROFILE_URL)
            .query(&[("user.fields", "username,name,profile_image_url")])
            .bearer_auth(access_token)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            warn!(status = %status, "Profile fetch rejected");
            return Err(XAuthError::ProfileFetch {
                status,
                message: text,
            });
        }

        let profile: Value = serde_json::from_str(&text)?;
        profile
            .get("data")
            .cloned()
            .ok_or(XAuthError::ProfileFetch {
                status,
                message: "response missing data object".to_string(),
            })
    }

    /// Park a profile for later pickup, keyed by the provider user id.
    /// Returns the id, or `None` when the profile carries none.
    pub async fn remember_profile(&self, profile: &Value) -> Option<String> {
        let user_id = profile.get("id").and_then(Value::as_str)?.to_string();
        let mut profiles = self.inner.profiles.write().await;
        profiles.insert(user_id.clone(), profile.clone());
        Some(user_id)
    }

    /// Look up a parked profile by provider user id.
    pub async fn profile_for(&self, user_id: &str) -> Option<Value> {
        self.inner.profiles.read().await.get(user_id).cloned()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn test_client() -> XAuthClient {
        let config = XAuthConfig {
            client_id: "client-id".to_string(),
            client_secret: SecretString::from("client-secret"),
            callback_url: None,
        };
        XAuthClient::new(&config).unwrap()
    }

    #[test]
    fn test_authorize_url_encodes_parameters() {
        let url = test_client().authorize_url("https://shop.example/auth/callback");
        assert!(url.starts_with("https://api.x.com/2/oauth2/authorize?response_type=code"));
        assert!(url.contains("redirect_uri=https%3A%2F%2Fshop.example%2Fauth%2Fcallback"));
        assert!(url.contains("scope=users.read%20follows.write"));
        assert!(url.contains("code_challenge_method=plain"));
    }

    #[tokio::test]
    async fn test_profile_store_round_trip() {
        let client = test_client();
        let profile = json!({"id": "2244994945", "username": "opaline", "name": "Opaline"});

        let user_id = client.remember_profile(&profile).await.unwrap();
        assert_eq!(user_id, "2244994945");
        assert_eq!(client.profile_for("2244994945").await, Some(profile));
        assert_eq!(client.profile_for("unknown").await, None);
    }

    #[tokio::test]
    async fn test_remember_profile_requires_id() {
        let client = test_client();
        assert!(
            client
                .remember_profile(&json!({"username": "anon"}))
                .await
                .is_none()
        );
    }
}
