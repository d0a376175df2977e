//! Contact and privacy-request form handlers.
//!
//! Both forms accept the submission first and deliver email afterwards in a
//! detached task. A failed send is logged and never turns a 201 into an
//! error; the reference id in the response is the customer's handle for
//! following up.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use crate::error::AppError;
use crate::services::email::submission_reference;
use crate::state::AppState;

/// Contact form body.
#[derive(Debug, Deserialize)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub message: String,
}

/// Privacy request body.
#[derive(Debug, Deserialize)]
pub struct PrivacyRequestForm {
    pub email: String,
    pub request_type: String,
    pub details: Option<String>,
}

/// Acknowledgement response for form submissions.
#[derive(Debug, Serialize)]
pub struct SubmissionResponse {
    pub message: String,
}

fn require_field(value: &str, name: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::BadRequest(format!("Missing {name}")));
    }
    Ok(())
}

fn require_email(value: &str) -> Result<(), AppError> {
    if !value.contains('@') {
        return Err(AppError::BadRequest("Invalid email address".to_string()));
    }
    Ok(())
}

// =============================================================================
// Handlers
// =============================================================================

/// Contact form handler: confirmation to the submitter, notification to the
/// shop inbox.
#[instrument(skip(state, form))]
pub async fn submit_contact(
    State(state): State<AppState>,
    Json(form): Json<ContactForm>,
) -> Result<(StatusCode, Json<SubmissionResponse>), AppError> {
    let Some(email_service) = state.email() else {
        return Err(AppError::ServiceUnavailable(
            "Contact form is temporarily unavailable".to_string(),
        ));
    };

    require_field(&form.name, "name")?;
    require_field(&form.message, "message")?;
    require_field(&form.email, "email")?;
    require_email(&form.email)?;

    let reference = submission_reference("CON");
    info!(%reference, "Processing contact form submission");

    let service = email_service.clone();
    let ContactForm {
        name,
        email,
        message,
    } = form;
    let task_reference = reference.clone();
    tokio::spawn(async move {
        if let Err(err) = service
            .send_contact_confirmation(&email, &name, &message, &task_reference)
            .await
        {
            error!(error = %err, "Failed to send contact confirmation");
        }
        if let Err(err) = service
            .send_contact_notification(&name, &email, &message, &task_reference)
            .await
        {
            error!(error = %err, "Failed to send contact notification");
        }
    });

    Ok((
        StatusCode::CREATED,
        Json(SubmissionResponse {
            message: format!(
                "Contact request {reference} submitted successfully. We'll get back to you soon!"
            ),
        }),
    ))
}

/// Privacy request handler: notifies the shop inbox.
#[instrument(skip(state, form))]
pub async fn submit_privacy_request(
    State(state): State<AppState>,
    Json(form): Json<PrivacyRequestForm>,
) -> Result<(StatusCode, Json<SubmissionResponse>), AppError> {
    let Some(email_service) = state.email() else {
        return Err(AppError::ServiceUnavailable(
            "Privacy requests are temporarily unavailable".to_string(),
        ));
    };

    require_field(&form.request_type, "request_type")?;
    require_field(&form.email, "email")?;
    require_email(&form.email)?;

    let reference = submission_reference("PRV");
    info!(%reference, request_type = %form.request_type, "Processing privacy request");

    let service = email_service.clone();
    let PrivacyRequestForm {
        email,
        request_type,
        details,
    } = form;
    let task_reference = reference.clone();
    tokio::spawn(async move {
        if let Err(err) = service
            .send_privacy_request_notice(&email, &request_type, details.as_deref(), &task_reference)
            .await
        {
            error!(error = %err, "Failed to send privacy request notice");
        }
    });

    Ok((
        StatusCode::CREATED,
        Json(SubmissionResponse {
            message: format!(
                "Privacy request {reference} received. We'll process it within 30 days."
            ),
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_field_rejects_blank() {
        assert!(require_field("Ada", "name").is_ok());
        assert!(require_field("   ", "name").is_err());
        assert!(require_field("", "name").is_err());
    }

    #[test]
    fn test_require_email_wants_at_sign() {
        assert!(require_email("ada@example.com").is_ok());
        assert!(require_email("not-an-address").is_err());
    }
}
