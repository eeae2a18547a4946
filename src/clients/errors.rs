//! Error types shared by the distributor and Shopify clients.
//!
//! # Error Handling
//!
//! Each failure scenario gets its own type so callers can branch on exactly
//! what went wrong:
//!
//! - [`TransportError`]: timeouts and network failures below the HTTP layer
//! - [`TokenLimitExceededError`]: the token circuit breaker tripped (fatal
//!   for the whole run)
//! - [`AuthenticationFailedError`]: one token acquisition failed
//! - [`UnexpectedStatusError`]: a non-success HTTP status that is terminal
//!   for the operation
//! - [`ValidationRejectedError`]: Shopify rejected an inventory update (422)
//! - [`DistributorError`] / [`StorefrontError`]: unified per-client enums
//!
//! Not-found outcomes are not errors; lookups return `Ok(None)`.
//!
//! # Example
//!
//! ```rust,ignore
//! match distributor.get_stock("A1").await {
//!     Ok(Some(stock)) => println!("stock: {stock}"),
//!     Ok(None) => println!("no usable stock figure"),
//!     Err(DistributorError::TokenLimitExceeded(e)) => {
//!         // fatal: stop the run
//!         eprintln!("{e}");
//!     }
//!     Err(e) => eprintln!("operation failed: {e}"),
//! }
//! ```

use thiserror::Error;

/// Maximum number of characters of a response body kept in error messages.
const BODY_EXCERPT_LEN: usize = 200;

/// Truncates a response body for inclusion in an error message.
#[must_use]
pub(crate) fn body_excerpt(body: &str) -> String {
    if body.len() <= BODY_EXCERPT_LEN {
        return body.to_string();
    }
    let cut = body
        .char_indices()
        .take_while(|(i, _)| *i <= BODY_EXCERPT_LEN)
        .last()
        .map_or(0, |(i, _)| i);
    format!("{}... (truncated)", &body[..cut])
}

/// Transport-level failures, below HTTP status handling.
///
/// The transport wrapper retries timeout-class failures a bounded number of
/// times before surfacing [`TransportError::Timeout`]; every other failure
/// (DNS, connection reset, TLS) propagates immediately as
/// [`TransportError::Network`].
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request timed out on every allowed attempt.
    #[error("request timed out after {attempts} attempts")]
    Timeout {
        /// Number of attempts that were made.
        attempts: u32,
    },

    /// A non-timeout network failure. Not retried.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// Error returned when the token acquisition circuit breaker has tripped.
///
/// Once the per-run attempt ceiling is reached, every further acquisition
/// fails with this error before any network I/O. This is fatal for the
/// whole run: the job stops processing, reports, and exits.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("token generation limit of {limit} exceeded")]
pub struct TokenLimitExceededError {
    /// The attempt ceiling that was reached.
    pub limit: u32,
}

/// Error returned when a single token acquisition fails.
///
/// Covers network failure, a non-200 status, malformed XML, and a missing
/// or empty token field in an otherwise well-formed response.
#[derive(Debug, Error)]
#[error("authentication failed: {reason}")]
pub struct AuthenticationFailedError {
    /// Human-readable description of what went wrong.
    pub reason: String,
}

/// Error returned when an operation receives a status code that is terminal
/// for that operation.
#[derive(Debug, Error)]
#[error("{operation} failed with status {code}: {body}")]
pub struct UnexpectedStatusError {
    /// The operation that was being performed.
    pub operation: &'static str,
    /// The HTTP status code of the response.
    pub code: u16,
    /// A truncated excerpt of the response body.
    pub body: String,
}

/// Error returned when Shopify rejects an inventory update as invalid.
///
/// A 422 means inventory tracking is disabled for the variant (or the
/// payload is otherwise unprocessable). The update will never succeed by
/// retrying, so this is terminal for the item while the run continues.
#[derive(Debug, Error)]
#[error("inventory update rejected for item {inventory_item_id}: {message}")]
pub struct ValidationRejectedError {
    /// The inventory item whose update was rejected.
    pub inventory_item_id: u64,
    /// The serialized error body returned by Shopify.
    pub message: String,
}

/// Unified error type for distributor client operations.
#[derive(Debug, Error)]
pub enum DistributorError {
    /// Transport-level failure (timeout after retries, or network error).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The token circuit breaker tripped. Fatal for the run.
    #[error(transparent)]
    TokenLimitExceeded(#[from] TokenLimitExceededError),

    /// Token acquisition or renewal failed.
    #[error(transparent)]
    AuthenticationFailed(#[from] AuthenticationFailedError),

    /// The service answered with a non-success status.
    #[error(transparent)]
    Status(#[from] UnexpectedStatusError),
}

impl DistributorError {
    /// Returns `true` if this error should abort the whole run.
    ///
    /// Only the token ceiling is run-aborting; everything else is isolated
    /// to the product code being processed.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::TokenLimitExceeded(_))
    }
}

/// Unified error type for Shopify client operations.
#[derive(Debug, Error)]
pub enum StorefrontError {
    /// Transport-level failure (timeout after retries, or network error).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Shopify rejected the update as unprocessable (422). Terminal for the
    /// item, not retried.
    #[error(transparent)]
    ValidationRejected(#[from] ValidationRejectedError),

    /// The API answered with a non-success status after any applicable
    /// rate-limit retries.
    #[error(transparent)]
    Status(#[from] UnexpectedStatusError),
}
