//! Shopify-side client: REST operations and adaptive rate throttling.

mod client;
mod rate_limit;

pub use client::{ProductHandle, ShopifyClient};
pub use rate_limit::{RateGovernor, RatePolicy};
