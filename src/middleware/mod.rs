//! HTTP middleware for the storefront API.
//!
//! # Middleware
//!
//! - `rate_limit` - Per-IP rate limiting for the public form endpoints
//! - `request_id` - Request ID generation and propagation

pub mod rate_limit;
pub mod request_id;

pub use rate_limit::form_rate_limiter;
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
