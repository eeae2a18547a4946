//! Distributor-side client: SOAP operations and token lifecycle.

mod client;
mod soap;
mod token;

pub use client::{DistributorClient, ProductData};
pub use token::MAX_TOKEN_ATTEMPTS;
