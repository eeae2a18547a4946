//! API clients for the two remote services.
//!
//! This module provides the resilient request layer shared by both sides of
//! the sync, plus the two concrete clients built on top of it.
//!
//! # Overview
//!
//! The main types in this module are:
//!
//! - [`Transport`]: one-call-at-a-time HTTP transport with timeout and
//!   bounded retry for timeout-class failures
//! - [`HttpResponse`]: parsed response with rate-limit header access
//! - [`distributor::DistributorClient`]: SOAP client for the distributor's
//!   web ordering service, with token lifecycle management
//! - [`storefront::ShopifyClient`]: REST client for the Shopify Admin API,
//!   with adaptive rate throttling
//!
//! # Retry Behavior
//!
//! Responsibilities are layered:
//!
//! - **Transport** retries timeouts (3 attempts, 5 s apart) and propagates
//!   every other network failure immediately.
//! - **Distributor client** handles in-band token expiry: re-authenticate
//!   once, replay the operation once, never loop.
//! - **Shopify client** handles 429 responses (honoring `Retry-After`, else
//!   exponential backoff) and adapts an inter-call delay to the reported
//!   quota usage.

pub mod distributor;
mod errors;
mod http_response;
pub mod storefront;
mod transport;

pub use errors::{
    AuthenticationFailedError, DistributorError, StorefrontError, TokenLimitExceededError,
    TransportError, UnexpectedStatusError, ValidationRejectedError,
};
pub use http_response::{ApiCallLimit, HttpResponse};
pub use transport::{Transport, TransportPolicy};

// Re-export the concrete clients at the clients module level
pub use distributor::DistributorClient;
pub use storefront::{ProductHandle, RateGovernor, RatePolicy, ShopifyClient};
