//! REST client for the Shopify Admin API.
//!
//! This module provides the [`ShopifyClient`] type for the write side of
//! the sync: looking up a product by SKU and setting inventory levels,
//! with adaptive throttling and bounded 429 retry.
//!
//! # Rate Limiting
//!
//! Every request is paced by the owned [`RateGovernor`] and feeds the
//! response's call-limit header back into it. An explicit 429 is retried
//! up to the policy's attempt budget, honoring a numeric `Retry-After`
//! hint when the server provides one and doubling from 1 s toward a 16 s
//! ceiling otherwise. When the budget is exhausted the last response is
//! returned to the operation layer rather than raised, so the caller sees
//! an ordinary non-success status.

use std::time::Duration;

use crate::clients::errors::{
    body_excerpt, StorefrontError, UnexpectedStatusError, ValidationRejectedError,
};
use crate::clients::http_response::HttpResponse;
use crate::clients::transport::{Transport, TransportPolicy};
use crate::config::ShopifyCredentials;

use super::rate_limit::{RateGovernor, RatePolicy};

/// Identifiers needed to update one product's inventory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProductHandle {
    /// The product's ID.
    pub product_id: u64,
    /// The inventory item ID of the product's first variant.
    pub inventory_item_id: u64,
}

/// REST client for the Shopify Admin API.
///
/// Owns its rate-governor state for the whole run; state is per-instance,
/// never global. Operations take `&mut self` because every call adapts the
/// inter-call delay.
///
/// # Example
///
/// ```rust,ignore
/// let mut client = ShopifyClient::new(config.shopify.clone());
///
/// if let Some(handle) = client.find_by_sku("SKU-1").await? {
///     client.set_inventory(handle.inventory_item_id, 42, handle.product_id).await?;
/// }
/// ```
#[derive(Debug)]
pub struct ShopifyClient {
    transport: Transport,
    credentials: ShopifyCredentials,
    governor: RateGovernor,
    base_path: String,
}

impl ShopifyClient {
    /// Creates a client with the default transport and throttling policies.
    #[must_use]
    pub fn new(credentials: ShopifyCredentials) -> Self {
        Self::with_policies(credentials, TransportPolicy::default(), RatePolicy::default())
    }

    /// Creates a client with custom policies.
    #[must_use]
    pub fn with_policies(
        credentials: ShopifyCredentials,
        transport: TransportPolicy,
        rate: RatePolicy,
    ) -> Self {
        let host = format!("https://{}", credentials.shop_url.as_ref());
        Self::with_api_host(credentials, host, transport, rate)
    }

    /// Creates a client that sends requests to an explicit host instead of
    /// the shop domain. Used for proxy setups and tests.
    #[must_use]
    pub fn with_api_host(
        credentials: ShopifyCredentials,
        api_host: impl Into<String>,
        transport: TransportPolicy,
        rate: RatePolicy,
    ) -> Self {
        let base_path = format!("{}/admin/api/{}", api_host.into(), credentials.api_version);
        Self {
            transport: Transport::new(transport),
            credentials,
            governor: RateGovernor::new(rate),
            base_path,
        }
    }

    /// Returns the base path requests are sent under.
    #[must_use]
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Returns the current inter-call delay of the owned governor.
    #[must_use]
    pub const fn current_delay(&self) -> Duration {
        self.governor.current_delay()
    }

    /// Finds a product and its first variant's inventory item by SKU.
    ///
    /// A 404 or an empty product list is a normal "not found" outcome and
    /// returns `Ok(None)`; a response body without the expected fields is
    /// logged and also yields `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns [`StorefrontError`] on transport failure or a non-success
    /// status other than 404.
    pub async fn find_by_sku(&mut self, sku: &str) -> Result<Option<ProductHandle>, StorefrontError> {
        let response = self
            .request(
                "find_product_by_sku",
                reqwest::Method::GET,
                "products.json",
                &[("sku", sku)],
                None,
            )
            .await?;

        if response.code == 404 {
            tracing::info!(sku, "product not found");
            return Ok(None);
        }
        if !response.is_ok() {
            return Err(UnexpectedStatusError {
                operation: "find_product_by_sku",
                code: response.code,
                body: body_excerpt(&response.body),
            }
            .into());
        }

        Ok(Self::parse_product_handle(&response.body, sku))
    }

    /// Sets the available quantity for an inventory item at the configured
    /// location.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationRejectedError`] on a 422 (inventory tracking is
    /// disabled for the variant; retrying cannot succeed), and
    /// [`StorefrontError`] for transport failures or any other non-success
    /// status, including a 429 that survived the retry budget.
    pub async fn set_inventory(
        &mut self,
        inventory_item_id: u64,
        available: i64,
        product_id: u64,
    ) -> Result<(), StorefrontError> {
        let payload = serde_json::json!({
            "location_id": self.credentials.location_id,
            "inventory_item_id": inventory_item_id,
            "available": available,
        });

        let response = self
            .request(
                "set_inventory_level",
                reqwest::Method::POST,
                "inventory_levels/set.json",
                &[],
                Some(payload),
            )
            .await?;

        if response.is_ok() {
            tracing::info!(product_id, inventory_item_id, available, "inventory level updated");
            return Ok(());
        }

        if response.code == 422 {
            tracing::error!(
                product_id,
                inventory_item_id,
                "inventory update rejected as unprocessable"
            );
            return Err(ValidationRejectedError {
                inventory_item_id,
                message: body_excerpt(&response.body),
            }
            .into());
        }

        tracing::error!(
            product_id,
            code = response.code,
            "failed to update inventory level"
        );
        Err(UnexpectedStatusError {
            operation: "set_inventory_level",
            code: response.code,
            body: body_excerpt(&response.body),
        }
        .into())
    }

    /// Sends one request through the governor and the 429 retry policy.
    async fn request(
        &mut self,
        operation: &'static str,
        method: reqwest::Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<serde_json::Value>,
    ) -> Result<HttpResponse, StorefrontError> {
        let url = format!("{}/{}", self.base_path, path);
        let policy = *self.governor.policy();
        let mut backoff = policy.backoff_start;
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            self.governor.pace().await;

            let result = self
                .transport
                .send(operation, |http| {
                    let mut request = http
                        .request(method.clone(), &url)
                        .header("X-Shopify-Access-Token", self.credentials.access_token.as_ref())
                        .header("Accept", "application/json");
                    if !query.is_empty() {
                        request = request.query(query);
                    }
                    if let Some(body) = &body {
                        request = request.json(body);
                    }
                    request
                })
                .await;

            match result {
                Ok(response) => {
                    self.governor.observe(response.api_call_limit).await;

                    if response.code != 429 {
                        return Ok(response);
                    }
                    if attempt >= policy.rate_limit_attempts {
                        tracing::error!(
                            operation,
                            attempts = attempt,
                            "rate limited on every attempt, giving up"
                        );
                        return Ok(response);
                    }

                    // Prefer the server's hint over the exponential default.
                    let delay = response
                        .retry_request_after
                        .map_or(backoff, Duration::from_secs_f64);
                    tracing::warn!(
                        operation,
                        attempt,
                        max_attempts = policy.rate_limit_attempts,
                        delay_secs = delay.as_secs_f64(),
                        "rate limit exceeded, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    if response.retry_request_after.is_none() {
                        backoff = (backoff * 2).min(policy.backoff_cap);
                    }
                }
                Err(err) => {
                    if attempt >= policy.rate_limit_attempts {
                        return Err(err.into());
                    }
                    tracing::warn!(
                        operation,
                        attempt,
                        max_attempts = policy.rate_limit_attempts,
                        error = %err,
                        "transport failure, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                    backoff = (backoff * 2).min(policy.backoff_cap);
                }
            }
        }
    }

    /// Pulls the product and inventory item IDs out of a products listing.
    fn parse_product_handle(body: &str, sku: &str) -> Option<ProductHandle> {
        let parsed: serde_json::Value = match serde_json::from_str(body) {
            Ok(parsed) => parsed,
            Err(err) => {
                tracing::error!(sku, error = %err, "products response is not valid JSON");
                return None;
            }
        };

        let Some(product) = parsed["products"].get(0) else {
            tracing::info!(sku, "product not found");
            return None;
        };

        let product_id = product["id"].as_u64();
        let inventory_item_id = product["variants"][0]["inventory_item_id"].as_u64();
        match (product_id, inventory_item_id) {
            (Some(product_id), Some(inventory_item_id)) => Some(ProductHandle {
                product_id,
                inventory_item_id,
            }),
            _ => {
                tracing::error!(sku, "products response is missing id fields");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_product_handle_reads_ids() {
        let body = r#"{"products":[{"id":123,"variants":[{"inventory_item_id":456,"inventory_quantity":9}]}]}"#;
        let handle = ShopifyClient::parse_product_handle(body, "SKU-1").unwrap();
        assert_eq!(handle.product_id, 123);
        assert_eq!(handle.inventory_item_id, 456);
    }

    #[test]
    fn test_parse_product_handle_empty_list_is_none() {
        assert!(ShopifyClient::parse_product_handle(r#"{"products":[]}"#, "SKU-1").is_none());
    }

    #[test]
    fn test_parse_product_handle_malformed_is_none() {
        assert!(ShopifyClient::parse_product_handle("not json", "SKU-1").is_none());
        assert!(
            ShopifyClient::parse_product_handle(r#"{"products":[{"id":1}]}"#, "SKU-1").is_none()
        );
    }
}
