//! Logging setup and log-file retention.
//!
//! The binary logs to the console and to a daily-rolling file under a logs
//! directory. Old rolled files are swept at startup: anything whose date
//! suffix is past the retention period is deleted.

use std::path::Path;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// File name prefix the rolling appender writes under.
const LOG_FILE_PREFIX: &str = "stock-sync.log";

/// Default number of days rolled log files are kept.
pub const DEFAULT_RETENTION_DAYS: i64 = 60;

/// Initializes tracing with a console layer and a daily-rolling file layer.
///
/// `RUST_LOG` overrides the default `stock_sync=info` filter. The returned
/// guard must stay alive for the duration of the process so buffered log
/// lines are flushed on exit.
pub fn init(log_dir: impl AsRef<Path>) -> tracing_appender::non_blocking::WorkerGuard {
    let file_appender = tracing_appender::rolling::daily(log_dir.as_ref(), LOG_FILE_PREFIX);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stock_sync=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false),
        )
        .init();

    guard
}

/// Summary of one retention sweep.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CleanupSummary {
    /// Number of files deleted.
    pub files_deleted: usize,
    /// Total bytes freed.
    pub bytes_freed: u64,
}

/// Deletes rolled log files older than the retention period.
///
/// The rolling appender names files `stock-sync.log.YYYY-MM-DD`; files
/// whose suffix does not parse as a date are left alone with a warning.
/// A missing logs directory is treated as nothing to clean.
///
/// # Errors
///
/// Returns an [`std::io::Error`] if the directory listing itself fails.
pub fn clean_old_logs(
    log_dir: impl AsRef<Path>,
    retention_days: i64,
) -> std::io::Result<CleanupSummary> {
    let log_dir = log_dir.as_ref();
    if !log_dir.exists() {
        return Ok(CleanupSummary::default());
    }

    tracing::info!(retention_days, "starting logs cleanup");
    let today = chrono::Utc::now().date_naive();
    let mut summary = CleanupSummary::default();

    for entry in std::fs::read_dir(log_dir)? {
        let entry = entry?;
        let file_name = entry.file_name();
        let Some(name) = file_name.to_str() else {
            continue;
        };
        let Some(suffix) = name.strip_prefix(LOG_FILE_PREFIX).and_then(|s| s.strip_prefix('.'))
        else {
            continue;
        };

        let Ok(file_date) = chrono::NaiveDate::parse_from_str(suffix, "%Y-%m-%d") else {
            tracing::warn!(file = name, "could not extract date from log file name");
            continue;
        };

        let age_days = (today - file_date).num_days();
        if age_days <= retention_days {
            continue;
        }

        let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
        match std::fs::remove_file(entry.path()) {
            Ok(()) => {
                summary.files_deleted += 1;
                summary.bytes_freed += size;
                tracing::info!(file = name, age_days, size_bytes = size, "deleted log file");
            }
            Err(err) => {
                tracing::warn!(file = name, error = %err, "failed to delete log file");
            }
        }
    }

    if summary.files_deleted > 0 {
        tracing::info!(
            files_deleted = summary.files_deleted,
            bytes_freed = summary.bytes_freed,
            "logs cleanup completed"
        );
    }
    Ok(summary)
}
