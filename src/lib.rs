//! Opaline storefront backend.
//!
//! A JSON API for a headless luxury-goods shop: proxies the Shopify Admin
//! REST API behind a caching, rate-limit-aware client, forwards contact and
//! privacy-request forms by email, and hosts the X (Twitter) social login
//! exchange. The React frontend is served separately and consumes this API
//! under `/api/v1`.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod shopify;
pub mod state;
