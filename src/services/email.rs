//! Email service for contact and privacy-request notifications.
//!
//! Uses SMTP via lettre for delivery with Askama HTML templates. Callers
//! treat delivery as fire-and-forget: a failed send is logged, never
//! surfaced to the form submitter.

use askama::Template;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use crate::config::EmailConfig;

/// HTML template for the contact confirmation sent to the submitter.
#[derive(Template)]
#[template(path = "email/contact_confirmation.html")]
struct ContactConfirmationHtml<'a> {
    name: &'a str,
    reference: &'a str,
    message: &'a str,
}

/// Plain text template for the contact confirmation.
#[derive(Template)]
#[template(path = "email/contact_confirmation.txt")]
struct ContactConfirmationText<'a> {
    name: &'a str,
    reference: &'a str,
    message: &'a str,
}

/// HTML template for the contact notification sent to the shop inbox.
#[derive(Template)]
#[template(path = "email/contact_notification.html")]
struct ContactNotificationHtml<'a> {
    name: &'a str,
    email: &'a str,
    message: &'a str,
    reference: &'a str,
}

/// Plain text template for the contact notification.
#[derive(Template)]
#[template(path = "email/contact_notification.txt")]
struct ContactNotificationText<'a> {
    name: &'a str,
    email: &'a str,
    message: &'a str,
    reference: &'a str,
}

/// HTML template for the privacy-request notice sent to the shop inbox.
#[derive(Template)]
#[template(path = "email/privacy_request.html")]
struct PrivacyRequestHtml<'a> {
    email: &'a str,
    request_type: &'a str,
    details: Option<&'a str>,
    reference: &'a str,
}

/// Plain text template for the privacy-request notice.
#[derive(Template)]
#[template(path = "email/privacy_request.txt")]
struct PrivacyRequestText<'a> {
    email: &'a str,
    request_type: &'a str,
    details: Option<&'a str>,
    reference: &'a str,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// Email service for transactional storefront mail.
#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_mailbox: String,
    admin_address: String,
}

impl EmailService {
    /// Create a new email service from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the SMTP relay cannot be configured.
    pub fn new(config: &EmailConfig) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from_mailbox: format!("{} <{}>", config.from_name, config.from_address),
            admin_address: config.admin_address.clone(),
        })
    }

    /// Send the confirmation email for a contact submission.
    ///
    /// # Errors
    ///
    /// Returns error if the email fails to send or a template fails to
    /// render.
    pub async fn send_contact_confirmation(
        &self,
        to: &str,
        name: &str,
        message: &str,
        reference: &str,
    ) -> Result<(), EmailError> {
        let html = ContactConfirmationHtml {
            name,
            reference,
            message,
        }
        .render()?;
        let text = ContactConfirmationText {
            name,
            reference,
            message,
        }
        .render()?;

        self.send_multipart_email(
            to,
            &format!("Your Contact Request #{reference} Has Been Received"),
            &text,
            &html,
        )
        .await
    }

    /// Notify the shop inbox about a contact submission.
    ///
    /// # Errors
    ///
    /// Returns error if the email fails to send or a template fails to
    /// render.
    pub async fn send_contact_notification(
        &self,
        name: &str,
        email: &str,
        message: &str,
        reference: &str,
    ) -> Result<(), EmailError> {
        let html = ContactNotificationHtml {
            name,
            email,
            message,
            reference,
        }
        .render()?;
        let text = ContactNotificationText {
            name,
            email,
            message,
            reference,
        }
        .render()?;

        self.send_multipart_email(
            &self.admin_address,
            &format!("New Contact Form Submission #{reference}"),
            &text,
            &html,
        )
        .await
    }

    /// Notify the shop inbox about a privacy request.
    ///
    /// # Errors
    ///
    /// Returns error if the email fails to send or a template fails to
    /// render.
    pub async fn send_privacy_request_notice(
        &self,
        email: &str,
        request_type: &str,
        details: Option<&str>,
        reference: &str,
    ) -> Result<(), EmailError> {
        let html = PrivacyRequestHtml {
            email,
            request_type,
            details,
            reference,
        }
        .render()?;
        let text = PrivacyRequestText {
            email,
            request_type,
            details,
            reference,
        }
        .render()?;

        self.send_multipart_email(
            &self.admin_address,
            &format!("New Privacy Request #{reference}"),
            &text,
            &html,
        )
        .await
    }

    /// Send a multipart email with both plain text and HTML versions.
    async fn send_multipart_email(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), EmailError> {
        let email = Message::builder()
            .from(
                self.from_mailbox
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(self.from_mailbox.clone()))?,
            )
            .to(to
                .parse()
                .map_err(|_| EmailError::InvalidAddress(to.to_string()))?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body.to_string()),
                    ),
            )?;

        self.mailer.send(email).await?;

        tracing::info!(to = %to, subject = %subject, "Email sent successfully");
        Ok(())
    }
}

/// Reference id for a form submission, e.g. `CON-1A2B3C4D`.
#[must_use]
pub fn submission_reference(prefix: &str) -> String {
    let tail = uuid::Uuid::new_v4().simple().to_string();
    let short = tail.get(..8).unwrap_or(&tail);
    format!("{prefix}-{}", short.to_uppercase())
}
