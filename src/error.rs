//! Error types for configuration loading and validation.
//!
//! This module contains error types used when constructing the sync job's
//! configuration. API-call errors live in [`crate::clients::errors`].
//!
//! # Error Handling
//!
//! All configuration constructors return `Result<T, ConfigError>` to enable
//! fail-fast validation. Error messages are designed to be clear and actionable.
//!
//! # Example
//!
//! ```rust
//! use stock_sync::{AccessToken, ConfigError};
//!
//! let result = AccessToken::new("");
//! assert!(matches!(result, Err(ConfigError::EmptyAccessToken)));
//! ```

use thiserror::Error;

/// Errors that can occur while loading or validating configuration.
///
/// Each variant provides a clear, actionable error message. Credential
/// values never appear in these messages.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Shopify access token cannot be empty.
    #[error("Access token cannot be empty. Please provide a valid Shopify Admin API access token.")]
    EmptyAccessToken,

    /// Distributor username cannot be empty.
    #[error("Distributor username cannot be empty.")]
    EmptyUsername,

    /// Distributor password cannot be empty.
    #[error("Distributor password cannot be empty.")]
    EmptyPassword,

    /// Shop domain is invalid.
    #[error("Invalid shop domain '{domain}'. Expected format: 'shop-name' or 'shop-name.myshopify.com'.")]
    InvalidShopDomain {
        /// The invalid domain that was provided.
        domain: String,
    },

    /// Distributor service URL is invalid.
    #[error("Invalid service URL '{url}'. Please provide a full URL with scheme (e.g., 'https://services.example.com/ordering.asmx').")]
    InvalidServiceUrl {
        /// The invalid URL that was provided.
        url: String,
    },

    /// The credentials file could not be read.
    #[error("Failed to read credentials file '{path}': {source}")]
    CredentialsFileUnreadable {
        /// Path that was attempted.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The credentials file could not be parsed.
    #[error("Failed to parse credentials file '{path}': {source}")]
    CredentialsFileInvalid {
        /// Path that was attempted.
        path: String,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_access_token_error_message() {
        let error = ConfigError::EmptyAccessToken;
        let message = error.to_string();
        assert!(message.contains("Access token cannot be empty"));
    }

    #[test]
    fn test_invalid_shop_domain_error_message() {
        let error = ConfigError::InvalidShopDomain {
            domain: "bad domain!".to_string(),
        };
        let message = error.to_string();
        assert!(message.contains("bad domain!"));
        assert!(message.contains("Expected format"));
    }

    #[test]
    fn test_invalid_service_url_error_message() {
        let error = ConfigError::InvalidServiceUrl {
            url: "not-a-url".to_string(),
        };
        assert!(error.to_string().contains("not-a-url"));
    }

    #[test]
    fn test_error_implements_std_error() {
        let error = ConfigError::EmptyUsername;
        let _: &dyn std::error::Error = &error;
    }
}
