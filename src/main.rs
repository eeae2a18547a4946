//! Binary entry point for one scheduled sync run.

use std::process::ExitCode;

use stock_sync::clients::{DistributorClient, ShopifyClient};
use stock_sync::config::SyncConfig;
use stock_sync::mapping::SkuMapping;
use stock_sync::report::{LogSink, NotificationSink, RunOutcome};
use stock_sync::sync::StockSync;
use stock_sync::logging;

/// Returns an environment override or the default path.
fn path_from_env(var: &str, default: &str) -> String {
    std::env::var(var).unwrap_or_else(|_| default.to_string())
}

#[tokio::main]
async fn main() -> ExitCode {
    let log_dir = path_from_env("STOCK_SYNC_LOG_DIR", "logs");
    let _guard = logging::init(&log_dir);

    if let Err(err) = logging::clean_old_logs(&log_dir, logging::DEFAULT_RETENTION_DAYS) {
        tracing::warn!(error = %err, "logs cleanup failed");
    }

    let credentials_path = path_from_env("STOCK_SYNC_CREDENTIALS", "data/credentials.json");
    let config = match SyncConfig::from_file(&credentials_path) {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(error = %err, "cannot load configuration");
            return ExitCode::FAILURE;
        }
    };

    let mapping_path = path_from_env("STOCK_SYNC_MAPPING", "data/sku_barcodes.json");
    let mapping = match SkuMapping::from_file(&mapping_path) {
        Ok(mapping) => mapping,
        Err(err) => {
            tracing::error!(error = %err, "cannot load SKU mapping table");
            return ExitCode::FAILURE;
        }
    };
    if mapping.is_empty() {
        tracing::warn!(path = mapping_path, "mapping table is empty, nothing will be updated");
    }

    let sync = StockSync::new(
        DistributorClient::new(config.distributor.clone()),
        ShopifyClient::new(config.shopify.clone()),
        mapping,
    );

    let (outcome, stats) = sync.run().await;
    LogSink.notify(outcome, &stats);

    match outcome {
        RunOutcome::Completed => ExitCode::SUCCESS,
        RunOutcome::TokenLimitExceeded => ExitCode::FAILURE,
    }
}
