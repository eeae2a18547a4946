//! Configuration types for the stock sync job.
//!
//! # Overview
//!
//! The main types in this module are:
//!
//! - [`SyncConfig`]: The full configuration for one run, loaded once at startup
//! - [`DistributorCredentials`]: SOAP endpoint and account for the distributor
//! - [`ShopifyCredentials`]: Shop domain, access token and location for Shopify
//! - Validated newtypes ([`ShopDomain`], [`AccessToken`], [`ServiceUrl`],
//!   [`Username`], [`Password`]) that reject invalid values on construction
//!   and mask secrets in debug output
//!
//! # Example
//!
//! ```rust
//! use stock_sync::config::SyncConfig;
//!
//! let config: SyncConfig = serde_json::from_str(r#"{
//!     "distributor": {
//!         "base_url": "https://services.example.com/ordering.asmx",
//!         "username": "account",
//!         "password": "secret"
//!     },
//!     "shopify": {
//!         "shop_url": "my-store",
//!         "access_token": "shpat_example",
//!         "location_id": 655441491
//!     }
//! }"#).unwrap();
//!
//! assert_eq!(config.shopify.shop_url.as_ref(), "my-store.myshopify.com");
//! ```

mod newtypes;

pub use newtypes::{AccessToken, Password, ServiceUrl, ShopDomain, Username};

use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;

/// Default Shopify Admin API version used when the credentials file does not
/// pin one.
pub const DEFAULT_API_VERSION: &str = "2023-04";

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

/// Credentials and endpoint for the distributor's SOAP web service.
///
/// Immutable for the process lifetime; loaded once at client construction.
#[derive(Clone, Debug, Deserialize)]
pub struct DistributorCredentials {
    /// Full URL of the SOAP endpoint.
    pub base_url: ServiceUrl,
    /// Web ordering account username.
    pub username: Username,
    /// Web ordering account password. Masked in debug output.
    pub password: Password,
}

/// Credentials for the Shopify Admin API.
///
/// Immutable for the process lifetime; loaded once at client construction.
#[derive(Clone, Debug, Deserialize)]
pub struct ShopifyCredentials {
    /// The shop domain, normalized to `shop.myshopify.com`.
    pub shop_url: ShopDomain,
    /// Admin API access token. Masked in debug output.
    pub access_token: AccessToken,
    /// Location whose inventory levels this job maintains.
    pub location_id: u64,
    /// Admin API version path segment.
    #[serde(default = "default_api_version")]
    pub api_version: String,
}

/// Full configuration for one sync run.
///
/// Loaded once from a JSON credentials file before the run starts. All
/// values are immutable for the process lifetime.
#[derive(Clone, Debug, Deserialize)]
pub struct SyncConfig {
    /// Distributor SOAP service section.
    pub distributor: DistributorCredentials,
    /// Shopify Admin API section.
    pub shopify: ShopifyCredentials,
}

impl SyncConfig {
    /// Loads configuration from a JSON credentials file.
    ///
    /// The file layout mirrors the sections above:
    ///
    /// ```json
    /// {
    ///     "distributor": { "base_url": "...", "username": "...", "password": "..." },
    ///     "shopify": { "shop_url": "...", "access_token": "...", "location_id": 0 }
    /// }
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::CredentialsFileUnreadable`] if the file cannot
    /// be read, or [`ConfigError::CredentialsFileInvalid`] if it cannot be
    /// parsed or a field fails validation.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents =
            std::fs::read_to_string(path).map_err(|source| ConfigError::CredentialsFileUnreadable {
                path: path.display().to_string(),
                source,
            })?;

        serde_json::from_str(&contents).map_err(|source| ConfigError::CredentialsFileInvalid {
            path: path.display().to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"{
        "distributor": {
            "base_url": "https://services.example.com/ordering.asmx",
            "username": "account",
            "password": "secret"
        },
        "shopify": {
            "shop_url": "test-shop",
            "access_token": "shpat_test",
            "location_id": 655441491
        }
    }"#;

    #[test]
    fn test_parses_valid_config() {
        let config: SyncConfig = serde_json::from_str(VALID).unwrap();
        assert_eq!(config.shopify.shop_url.as_ref(), "test-shop.myshopify.com");
        assert_eq!(config.shopify.location_id, 655_441_491);
        assert_eq!(config.shopify.api_version, DEFAULT_API_VERSION);
        assert_eq!(config.distributor.username.as_ref(), "account");
    }

    #[test]
    fn test_api_version_override() {
        let mut value: serde_json::Value = serde_json::from_str(VALID).unwrap();
        value["shopify"]["api_version"] = serde_json::json!("2024-01");
        let config: SyncConfig = serde_json::from_value(value).unwrap();
        assert_eq!(config.shopify.api_version, "2024-01");
    }

    #[test]
    fn test_rejects_empty_password() {
        let mut value: serde_json::Value = serde_json::from_str(VALID).unwrap();
        value["distributor"]["password"] = serde_json::json!("");
        assert!(serde_json::from_value::<SyncConfig>(value).is_err());
    }

    #[test]
    fn test_debug_masks_secrets() {
        let config: SyncConfig = serde_json::from_str(VALID).unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("secret"));
        assert!(!debug.contains("shpat_test"));
    }

    #[test]
    fn test_from_file_missing_path() {
        let result = SyncConfig::from_file("/nonexistent/credentials.json");
        assert!(matches!(
            result,
            Err(ConfigError::CredentialsFileUnreadable { .. })
        ));
    }
}
