//! SOAP client for the distributor's web ordering service.
//!
//! This module provides the [`DistributorClient`] type for the read side of
//! the sync: listing product codes and fetching per-product stock and
//! barcode data, with transparent authentication token management.
//!
//! # Token Renewal
//!
//! The service can invalidate a token at any time and signals it in-band: a
//! transport-successful (200) response whose header carries a "call
//! authentication first" error. Every authenticated operation handles this
//! with a bounded protocol: invalidate the held token, acquire a fresh one,
//! and replay the operation exactly once. A second expiry signal after a
//! fresh token surfaces as [`AuthenticationFailedError`] instead of looping.

use crate::clients::errors::{
    body_excerpt, AuthenticationFailedError, DistributorError, UnexpectedStatusError,
};
use crate::clients::transport::{Transport, TransportPolicy};
use crate::config::DistributorCredentials;

use super::soap;
use super::token::TokenState;

/// Price and barcode fields returned by `GetProductData`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProductData {
    /// Manufacturer's suggested retail price, as reported by the service.
    pub msrp: String,
    /// Barcode used to map the product onto a storefront SKU.
    pub barcode: String,
}

/// SOAP client for the distributor web ordering service.
///
/// Owns the authentication token and its attempt counter for the whole
/// run; state is per-instance, never global. Operations take `&mut self`
/// because the token may be replaced mid-call.
///
/// # Example
///
/// ```rust,ignore
/// let mut client = DistributorClient::new(config.distributor.clone());
///
/// let codes = client.list_product_codes().await?;
/// for code in &codes {
///     if let Some(stock) = client.get_stock(code).await? {
///         println!("{code}: {stock}");
///     }
/// }
/// ```
#[derive(Debug)]
pub struct DistributorClient {
    transport: Transport,
    credentials: DistributorCredentials,
    token: TokenState,
}

impl DistributorClient {
    /// Creates a client with the default transport policy.
    #[must_use]
    pub fn new(credentials: DistributorCredentials) -> Self {
        Self::with_policy(credentials, TransportPolicy::default())
    }

    /// Creates a client with a custom transport policy.
    #[must_use]
    pub fn with_policy(credentials: DistributorCredentials, policy: TransportPolicy) -> Self {
        Self {
            transport: Transport::new(policy),
            credentials,
            token: TokenState::new(),
        }
    }

    /// Returns how many token acquisitions this client has performed.
    #[must_use]
    pub const fn token_attempts(&self) -> u32 {
        self.token.attempts()
    }

    /// Fetches all product codes available from the distributor.
    ///
    /// A response without a usable payload yields an empty list, not an
    /// error.
    ///
    /// # Errors
    ///
    /// Returns [`DistributorError`] on transport failure, authentication
    /// failure, a tripped token circuit breaker, or a non-success status.
    pub async fn list_product_codes(&mut self) -> Result<Vec<String>, DistributorError> {
        let body = self
            .dispatch("GetProductCodes", soap::product_codes_envelope)
            .await?;
        let codes = soap::parse_product_codes(&body);
        tracing::info!(count = codes.len(), "retrieved product codes");
        Ok(codes)
    }

    /// Fetches the current stock level for one product code.
    ///
    /// Returns `Ok(None)` when the response carries no usable stock figure
    /// (missing element or non-numeric value); that is a logged data error,
    /// not a failure of the operation.
    ///
    /// # Errors
    ///
    /// Returns [`DistributorError`] on transport failure, authentication
    /// failure, a tripped token circuit breaker, or a non-success status.
    pub async fn get_stock(&mut self, code: &str) -> Result<Option<i64>, DistributorError> {
        tracing::info!(product_code = code, "retrieving stock level");
        let body = self
            .dispatch("GetProductStock", |token| {
                soap::product_stock_envelope(token, code)
            })
            .await?;
        let stock = soap::parse_stock(&body, code);
        if let Some(stock) = stock {
            tracing::info!(product_code = code, stock, "retrieved stock level");
        }
        Ok(stock)
    }

    /// Fetches price and barcode data for one product code.
    ///
    /// Returns `Ok(None)` when the response carries no complete product
    /// record; that is a logged data error, not a failure of the operation.
    ///
    /// # Errors
    ///
    /// Returns [`DistributorError`] on transport failure, authentication
    /// failure, a tripped token circuit breaker, or a non-success status.
    pub async fn get_product_data(
        &mut self,
        code: &str,
    ) -> Result<Option<ProductData>, DistributorError> {
        tracing::info!(product_code = code, "retrieving price and barcode");
        let body = self
            .dispatch("GetProductData", |token| {
                soap::product_data_envelope(token, code)
            })
            .await?;
        Ok(soap::parse_product_data(&body, code))
    }

    /// Sends one authenticated operation, applying the renew-and-replay
    /// protocol.
    ///
    /// The envelope is rebuilt from the current token on each pass so a
    /// renewed token is actually used by the replay.
    async fn dispatch<F>(
        &mut self,
        operation: &'static str,
        build_envelope: F,
    ) -> Result<String, DistributorError>
    where
        F: Fn(&str) -> String,
    {
        let url = self.credentials.base_url.as_ref().to_string();
        let mut renewed = false;

        loop {
            let token = match self.token.current() {
                Some(token) => token.to_string(),
                None => self.authenticate().await?,
            };
            let envelope = build_envelope(&token);

            let response = self
                .transport
                .send(operation, |http| {
                    http.post(&url)
                        .header("content-type", "text/xml")
                        .body(envelope.clone())
                })
                .await?;

            if !response.is_ok() {
                tracing::error!(operation, code = response.code, "request failed");
                return Err(UnexpectedStatusError {
                    operation,
                    code: response.code,
                    body: body_excerpt(&response.body),
                }
                .into());
            }

            if soap::auth_required(&response.body) {
                if renewed {
                    tracing::error!(
                        operation,
                        "fresh token still rejected, giving up on this operation"
                    );
                    return Err(AuthenticationFailedError {
                        reason: "token renewal did not clear the authentication error".to_string(),
                    }
                    .into());
                }
                tracing::warn!(operation, "authentication token expired, will refresh and retry");
                renewed = true;
                self.token.invalidate();
                continue;
            }

            return Ok(response.body);
        }
    }

    /// Acquires a fresh authentication token.
    ///
    /// Counts against the per-run attempt ceiling before any network I/O.
    /// Any failure mode of the acquisition itself - network error, non-200
    /// status, malformed XML, empty token field - maps to
    /// [`AuthenticationFailedError`].
    async fn authenticate(&mut self) -> Result<String, DistributorError> {
        let attempt = self.token.begin_attempt().map_err(|err| {
            tracing::error!(limit = err.limit, "token generation limit exceeded");
            err
        })?;
        tracing::info!(
            attempt,
            limit = self.token.limit(),
            "starting authentication token retrieval"
        );

        let envelope = soap::authentication_envelope(
            self.credentials.username.as_ref(),
            self.credentials.password.as_ref(),
        );
        let url = self.credentials.base_url.as_ref().to_string();

        let response = self
            .transport
            .send("GetAuthenticationToken", |http| {
                http.post(&url)
                    .header("content-type", "text/xml")
                    .body(envelope.clone())
            })
            .await
            .map_err(|err| AuthenticationFailedError {
                reason: format!("transport failure: {err}"),
            })?;

        if !response.is_ok() {
            tracing::error!(code = response.code, "authentication request failed");
            return Err(AuthenticationFailedError {
                reason: format!("authentication request failed with status {}", response.code),
            }
            .into());
        }

        let Some(token) = soap::parse_auth_token(&response.body) else {
            tracing::error!("authentication token not found in response");
            return Err(AuthenticationFailedError {
                reason: "authentication token not found in response".to_string(),
            }
            .into());
        };

        tracing::info!("authentication token retrieved successfully");
        self.token.store(token.clone());
        Ok(token)
    }
}
