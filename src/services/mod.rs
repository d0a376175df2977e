//! Collaborating services for the storefront API.
//!
//! # Services
//!
//! - `email` - Transactional email delivery via SMTP
//! - `x_auth` - X (Twitter) OAuth 2.0 login exchange

pub mod email;
pub mod x_auth;

pub use email::{EmailError, EmailService};
pub use x_auth::{XAuthClient, XAuthError};
