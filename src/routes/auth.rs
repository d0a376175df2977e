//! X (Twitter) social login handlers.
//!
//! Two flows share the same exchange:
//! - SPA-driven: the frontend lands on the provider redirect itself and
//!   POSTs the code here for a synchronous profile response.
//! - Server-driven: the provider redirects straight to `callback`, which
//!   parks the profile and bounces the browser to the frontend's
//!   auth-complete page with the user id to collect it by.

use axum::{
    Json,
    extract::{Path, Query, State},
    response::Redirect,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::{instrument, warn};

use crate::error::AppError;
use crate::services::x_auth::XAuthClient;
use crate::state::AppState;

/// Query parameters for the authorize redirect.
#[derive(Debug, Deserialize)]
pub struct AuthorizeQuery {
    pub redirect_uri: String,
}

/// SPA-driven code exchange body.
#[derive(Debug, Deserialize)]
pub struct ExchangeRequest {
    pub code: String,
    pub redirect_uri: String,
}

/// Query parameters on the provider redirect.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

fn x_auth_client(state: &AppState) -> Result<&XAuthClient, AppError> {
    state.x_auth().ok_or_else(|| {
        AppError::ServiceUnavailable("Social login is not configured".to_string())
    })
}

// =============================================================================
// Handlers
// =============================================================================

/// Redirect the browser to the provider's authorization page.
#[instrument(skip(state))]
pub async fn authorize(
    State(state): State<AppState>,
    Query(query): Query<AuthorizeQuery>,
) -> Result<Redirect, AppError> {
    if query.redirect_uri.trim().is_empty() {
        return Err(AppError::BadRequest("Missing redirect_uri".to_string()));
    }
    let x_auth = x_auth_client(&state)?;
    Ok(Redirect::temporary(&x_auth.authorize_url(&query.redirect_uri)))
}

/// Exchange an authorization code for the user's profile (SPA-driven flow).
#[instrument(skip(state, request))]
pub async fn exchange(
    State(state): State<AppState>,
    Json(request): Json<ExchangeRequest>,
) -> Result<Json<Value>, AppError> {
    if request.code.trim().is_empty() || request.redirect_uri.trim().is_empty() {
        return Err(AppError::BadRequest(
            "Missing code or redirect_uri".to_string(),
        ));
    }

    let x_auth = x_auth_client(&state)?;
    let profile = x_auth
        .exchange_code(&request.code, &request.redirect_uri)
        .await?;
    Ok(Json(profile))
}

/// Provider redirect target (server-driven flow). Exchanges the code, parks
/// the profile, and sends the browser to the frontend's auth-complete page.
#[instrument(skip(state, query))]
pub async fn callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> Result<Redirect, AppError> {
    let x_auth = x_auth_client(&state)?;
    let frontend = state.config().frontend_url.trim_end_matches('/').to_string();

    if let Some(error) = query.error {
        warn!(%error, "Provider reported an authorization error");
        return Ok(Redirect::temporary(&format!(
            "{frontend}/auth-complete?error={}",
            urlencoding::encode(&error)
        )));
    }

    let Some(code) = query.code.as_deref().filter(|c| !c.trim().is_empty()) else {
        return Err(AppError::BadRequest("Missing code".to_string()));
    };

    // The exchange must repeat the redirect_uri registered for this route.
    let callback_url = state
        .config()
        .x_auth
        .as_ref()
        .and_then(|x| x.callback_url.clone())
        .ok_or_else(|| {
            AppError::BadRequest(
                "Server-side callback is not configured; use the code exchange endpoint"
                    .to_string(),
            )
        })?;

    let profile = x_auth.exchange_code(code, &callback_url).await?;
    let user_id = x_auth
        .remember_profile(&profile)
        .await
        .ok_or_else(|| AppError::Internal("provider profile missing id".to_string()))?;

    Ok(Redirect::temporary(&format!(
        "{frontend}/auth-complete?user_id={}",
        urlencoding::encode(&user_id)
    )))
}

/// Return a profile parked by the callback flow.
#[instrument(skip(state))]
pub async fn user_profile(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let x_auth = x_auth_client(&state)?;
    let profile = x_auth
        .profile_for(&user_id)
        .await
        .ok_or_else(|| AppError::NotFound("User".to_string()))?;
    Ok(Json(profile))
}
