//! The sync run: drives both clients over every product code.
//!
//! Execution is strictly sequential: one product code is fully processed
//! (distributor lookup, mapping, store update) before the next begins.
//! Per-code failures are logged and isolated; they never abort the batch.
//! The only run-aborting condition is the distributor's token circuit
//! breaker tripping, which means no further call can ever authenticate.

use std::time::Duration;

use chrono::Utc;
use thiserror::Error;

use crate::clients::{DistributorClient, DistributorError, ShopifyClient, StorefrontError};
use crate::mapping::SkuMapping;
use crate::report::{RunOutcome, RunStats};

/// Orchestration policy.
///
/// The default implements the production policy; tests compress the retry
/// delay so a failed-update retry completes in milliseconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SyncPolicy {
    /// Delay before the single retry of a failed inventory update.
    pub update_retry_delay: Duration,
}

impl Default for SyncPolicy {
    fn default() -> Self {
        Self {
            update_retry_delay: Duration::from_secs(60),
        }
    }
}

/// Failure of one product code's processing.
#[derive(Debug, Error)]
enum CodeError {
    #[error(transparent)]
    Distributor(#[from] DistributorError),
    #[error(transparent)]
    Storefront(#[from] StorefrontError),
}

impl CodeError {
    /// Returns `true` if the failure should abort the whole run.
    const fn is_fatal(&self) -> bool {
        matches!(self, Self::Distributor(err) if err.is_fatal())
    }
}

/// What happened to one product code.
enum CodeOutcome {
    /// The store's inventory level was updated.
    Updated,
    /// The product record was incomplete; counted as an error.
    NoProductData,
    /// The store does not carry the mapped SKU; counted as an error.
    NotInStore,
    /// The barcode has no entry in the mapping table.
    UnmappedBarcode,
    /// The distributor reported no usable stock figure.
    NoStockFigure,
}

/// One full sync run over the distributor's catalog.
///
/// Owns both clients and the mapping table for the duration of the run.
///
/// # Example
///
/// ```rust,ignore
/// let mut sync = StockSync::new(distributor, shopify, mapping);
/// let (outcome, stats) = sync.run().await;
/// sink.notify(outcome, &stats);
/// ```
#[derive(Debug)]
pub struct StockSync {
    distributor: DistributorClient,
    shopify: ShopifyClient,
    mapping: SkuMapping,
    policy: SyncPolicy,
}

impl StockSync {
    /// Creates a run with the default orchestration policy.
    #[must_use]
    pub fn new(distributor: DistributorClient, shopify: ShopifyClient, mapping: SkuMapping) -> Self {
        Self::with_policy(distributor, shopify, mapping, SyncPolicy::default())
    }

    /// Creates a run with a custom orchestration policy.
    #[must_use]
    pub fn with_policy(
        distributor: DistributorClient,
        shopify: ShopifyClient,
        mapping: SkuMapping,
        policy: SyncPolicy,
    ) -> Self {
        Self {
            distributor,
            shopify,
            mapping,
            policy,
        }
    }

    /// Runs the sync to completion and returns the outcome with its stats.
    ///
    /// Never panics and never propagates per-code failures; everything the
    /// caller needs to report is in the returned record.
    pub async fn run(mut self) -> (RunOutcome, RunStats) {
        let started_at = Utc::now();
        tracing::info!(mapped_products = self.mapping.len(), "starting stock update");

        let mut skus_processed = 0;
        let mut products_updated = 0;
        let mut errors = 0;
        let mut warnings = 0;

        let finish = |outcome: RunOutcome, skus, updated, errors, warnings| {
            let stats = RunStats {
                started_at,
                finished_at: Utc::now(),
                skus_processed: skus,
                products_updated: updated,
                errors,
                warnings,
            };
            (outcome, stats)
        };

        let codes = match self.distributor.list_product_codes().await {
            Ok(codes) => codes,
            Err(err) if err.is_fatal() => {
                tracing::error!(error = %err, "cannot authenticate, stopping run");
                return finish(RunOutcome::TokenLimitExceeded, 0, 0, 1, 0);
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to retrieve product codes");
                return finish(RunOutcome::Completed, 0, 0, 1, 0);
            }
        };
        tracing::info!(count = codes.len(), "retrieved product codes to process");

        for code in &codes {
            skus_processed += 1;
            match self.process_code(code).await {
                Ok(CodeOutcome::Updated) => products_updated += 1,
                Ok(CodeOutcome::UnmappedBarcode | CodeOutcome::NoStockFigure) => warnings += 1,
                Ok(CodeOutcome::NoProductData | CodeOutcome::NotInStore) => errors += 1,
                Err(err) if err.is_fatal() => {
                    errors += 1;
                    tracing::error!(product_code = %code, error = %err, "cannot authenticate, stopping run");
                    return finish(
                        RunOutcome::TokenLimitExceeded,
                        skus_processed,
                        products_updated,
                        errors,
                        warnings,
                    );
                }
                Err(err) => {
                    errors += 1;
                    tracing::error!(product_code = %code, error = %err, "processing error, continuing with next code");
                }
            }
        }

        finish(
            RunOutcome::Completed,
            skus_processed,
            products_updated,
            errors,
            warnings,
        )
    }

    /// Processes one product code end to end.
    async fn process_code(&mut self, code: &str) -> Result<CodeOutcome, CodeError> {
        let stock = self.distributor.get_stock(code).await?;

        let Some(data) = self.distributor.get_product_data(code).await? else {
            return Ok(CodeOutcome::NoProductData);
        };

        let Some(sku) = self.mapping.sku_for_barcode(&data.barcode) else {
            tracing::warn!(
                product_code = code,
                barcode = data.barcode,
                "barcode not found in product dictionary"
            );
            return Ok(CodeOutcome::UnmappedBarcode);
        };
        let sku = sku.to_string();

        let Some(handle) = self.shopify.find_by_sku(&sku).await? else {
            tracing::error!(
                product_code = code,
                sku,
                barcode = data.barcode,
                "failed to find product and inventory ids"
            );
            return Ok(CodeOutcome::NotInStore);
        };

        let Some(stock) = stock else {
            tracing::warn!(
                product_code = code,
                sku,
                "no usable stock figure, skipping update"
            );
            return Ok(CodeOutcome::NoStockFigure);
        };

        if let Err(err) = self
            .shopify
            .set_inventory(handle.inventory_item_id, stock, handle.product_id)
            .await
        {
            if matches!(err, StorefrontError::ValidationRejected(_)) {
                return Err(err.into());
            }
            tracing::info!(
                product_id = handle.product_id,
                delay_secs = self.policy.update_retry_delay.as_secs_f64(),
                error = %err,
                "update failed, retrying once after delay"
            );
            tokio::time::sleep(self.policy.update_retry_delay).await;
            self.shopify
                .set_inventory(handle.inventory_item_id, stock, handle.product_id)
                .await?;
        }

        Ok(CodeOutcome::Updated)
    }
}
