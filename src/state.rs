//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::services::email::EmailService;
use crate::services::x_auth::{XAuthClient, XAuthError};
use crate::shopify::{ShopifyClient, ShopifyError};

/// Error constructing shared state from configuration.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("shopify client: {0}")]
    Shopify(#[from] ShopifyError),
    #[error("email service: {0}")]
    Email(#[from] lettre::transport::smtp::Error),
    #[error("x auth client: {0}")]
    XAuth(#[from] XAuthError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the Shopify client and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AppConfig,
    shopify: ShopifyClient,
    email: Option<EmailService>,
    x_auth: Option<XAuthClient>,
}

impl AppState {
    /// Create application state, constructing every configured service.
    ///
    /// The email service and social login are optional; endpoints backed by
    /// an absent service answer 503.
    ///
    /// # Errors
    ///
    /// Returns an error when the Shopify client or a configured service
    /// cannot be built. Startup aborts on any of these.
    pub fn new(config: AppConfig) -> Result<Self, StateError> {
        let shopify = ShopifyClient::new(&config.shopify)?;
        let email = config.email.as_ref().map(EmailService::new).transpose()?;
        let x_auth = config.x_auth.as_ref().map(XAuthClient::new).transpose()?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                shopify,
                email,
                x_auth,
            }),
        })
    }

    /// Create application state around an already-built Shopify client.
    #[must_use]
    pub fn with_shopify(config: AppConfig, shopify: ShopifyClient) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                shopify,
                email: None,
                x_auth: None,
            }),
        }
    }

    /// Get a reference to the application configuration.
    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    /// Get a reference to the Shopify Admin API client.
    #[must_use]
    pub fn shopify(&self) -> &ShopifyClient {
        &self.inner.shopify
    }

    /// Get the email service, when configured.
    #[must_use]
    pub fn email(&self) -> Option<&EmailService> {
        self.inner.email.as_ref()
    }

    /// Get the social login client, when configured.
    #[must_use]
    pub fn x_auth(&self) -> Option<&XAuthClient> {
        self.inner.x_auth.as_ref()
    }
}
