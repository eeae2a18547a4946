//! # stock-sync
//!
//! A scheduled batch job that synchronizes product inventory from a
//! wholesale distributor's SOAP web service into a Shopify store.
//!
//! ## Overview
//!
//! One run does the following, strictly sequentially:
//!
//! 1. Authenticates against the distributor and lists its product codes
//! 2. Fetches per-product stock levels and barcodes
//! 3. Maps distributor barcodes onto Shopify SKUs via a static table
//! 4. Looks up each mapped product and pushes its new inventory level
//! 5. Hands a run-statistics record to a notification sink
//!
//! The interesting machinery is the resilient request layer both clients
//! share:
//!
//! - Type-safe configuration via [`config::SyncConfig`] with validated,
//!   secret-masking newtypes
//! - A transport wrapper with per-call timeout and bounded retry for
//!   timeout-class failures ([`clients::Transport`])
//! - Authentication token lifecycle management with an attempt circuit
//!   breaker and transparent renew-and-replay-once handling of in-band
//!   expiry signals ([`clients::DistributorClient`])
//! - Adaptive rate throttling driven by Shopify's call-limit headers,
//!   plus bounded 429 retry honoring `Retry-After`
//!   ([`clients::ShopifyClient`])
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use stock_sync::clients::{DistributorClient, ShopifyClient};
//! use stock_sync::config::SyncConfig;
//! use stock_sync::mapping::SkuMapping;
//! use stock_sync::report::{LogSink, NotificationSink};
//! use stock_sync::sync::StockSync;
//!
//! let config = SyncConfig::from_file("data/credentials.json")?;
//! let mapping = SkuMapping::from_file("data/sku_barcodes.json")?;
//!
//! let sync = StockSync::new(
//!     DistributorClient::new(config.distributor.clone()),
//!     ShopifyClient::new(config.shopify.clone()),
//!     mapping,
//! );
//!
//! let (outcome, stats) = sync.run().await;
//! LogSink.notify(outcome, &stats);
//! ```
//!
//! ## Design Principles
//!
//! - **No global state**: tokens, attempt counters and rate state are
//!   owned by their client instance
//! - **Fail-fast validation**: all configuration newtypes validate on
//!   construction
//! - **Isolated failures**: a per-product failure is logged and skipped;
//!   only the token circuit breaker aborts a run
//! - **Bounded retries everywhere**: no unbounded loops, no recursion

pub mod clients;
pub mod config;
pub mod error;
pub mod logging;
pub mod mapping;
pub mod report;
pub mod sync;

// Re-export public types at crate root for convenience
pub use config::{AccessToken, Password, ServiceUrl, ShopDomain, SyncConfig, Username};
pub use error::ConfigError;

// Re-export client types
pub use clients::{
    ApiCallLimit, DistributorClient, DistributorError, HttpResponse, ProductHandle, RateGovernor,
    RatePolicy, ShopifyClient, StorefrontError, TokenLimitExceededError, Transport,
    TransportError, TransportPolicy,
};
pub use clients::distributor::{ProductData, MAX_TOKEN_ATTEMPTS};

// Re-export run types
pub use mapping::SkuMapping;
pub use report::{LogSink, NotificationSink, RunOutcome, RunStats};
pub use sync::{StockSync, SyncPolicy};
