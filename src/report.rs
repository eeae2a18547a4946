//! Run statistics and the notification seam.
//!
//! The job produces one [`RunStats`] record per run and hands it to a
//! [`NotificationSink`] on both the success and the abort path. Delivery
//! (email, chat, dashboards) lives behind the trait; the crate ships a
//! tracing-backed sink for environments without an external reporter.

use chrono::{DateTime, Utc};

/// How a run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    /// The run processed every product code it could.
    Completed,
    /// The token circuit breaker tripped and the run stopped early.
    TokenLimitExceeded,
}

/// Aggregated statistics for one sync run.
#[derive(Clone, Debug, serde::Serialize)]
pub struct RunStats {
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the run finished (normally or by abort).
    pub finished_at: DateTime<Utc>,
    /// Product codes iterated.
    pub skus_processed: usize,
    /// Inventory levels actually updated in the store.
    pub products_updated: usize,
    /// Per-code failures that were logged and skipped.
    pub errors: usize,
    /// Data oddities that were logged and skipped (unmapped barcodes,
    /// missing stock figures).
    pub warnings: usize,
}

impl RunStats {
    /// Returns how long the run took.
    #[must_use]
    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

/// Consumer of the end-of-run statistics record.
///
/// Implementations must not panic; the record is delivered on both the
/// success and the abort path.
pub trait NotificationSink {
    /// Delivers the end-of-run report.
    fn notify(&self, outcome: RunOutcome, stats: &RunStats);
}

/// Notification sink that writes the report to the log.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn notify(&self, outcome: RunOutcome, stats: &RunStats) {
        let duration_secs = stats.duration().num_seconds();
        match outcome {
            RunOutcome::Completed => {
                tracing::info!(
                    skus_processed = stats.skus_processed,
                    products_updated = stats.products_updated,
                    errors = stats.errors,
                    warnings = stats.warnings,
                    duration_secs,
                    "stock update completed"
                );
            }
            RunOutcome::TokenLimitExceeded => {
                tracing::error!(
                    skus_processed = stats.skus_processed,
                    products_updated = stats.products_updated,
                    errors = stats.errors,
                    warnings = stats.warnings,
                    duration_secs,
                    "stock update stopped: token generation limit exceeded"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_is_finish_minus_start() {
        let started_at = Utc::now();
        let stats = RunStats {
            started_at,
            finished_at: started_at + chrono::Duration::seconds(90),
            skus_processed: 10,
            products_updated: 4,
            errors: 1,
            warnings: 2,
        };
        assert_eq!(stats.duration().num_seconds(), 90);
    }

    #[test]
    fn test_stats_serialize_for_external_reporters() {
        let now = Utc::now();
        let stats = RunStats {
            started_at: now,
            finished_at: now,
            skus_processed: 1,
            products_updated: 1,
            errors: 0,
            warnings: 0,
        };
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["products_updated"], 1);
    }

    #[test]
    fn test_log_sink_accepts_both_outcomes() {
        let now = Utc::now();
        let stats = RunStats {
            started_at: now,
            finished_at: now,
            skus_processed: 0,
            products_updated: 0,
            errors: 0,
            warnings: 0,
        };
        LogSink.notify(RunOutcome::Completed, &stats);
        LogSink.notify(RunOutcome::TokenLimitExceeded, &stats);
    }
}
