//! Logging and observability
//!
//! This module provides structured logging with support for:
//! - Configurable log levels
//! - Human-readable or JSON console output (JSON by default in the cloud)
//! - Local JSON file logging with rotation
//!
//! # Example
//!
//! ```no_run
//! use ferry::logging::init_logging;
//! use ferry::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config, false).expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! ```

pub mod structured;

pub use structured::{init_logging, parse_log_level, LoggingGuard};

/// Log the start of a sync run
///
/// # Example
///
/// ```no_run
/// use ferry::log_sync_start;
///
/// log_sync_start!("sale.order", "proj.erp.sale_order", "[-inf, now)");
/// ```
#[macro_export]
macro_rules! log_sync_start {
    ($model:expr, $table:expr, $window:expr) => {
        tracing::info!(
            model = %$model,
            table = %$table,
            window = %$window,
            "Starting sync"
        );
    };
}

/// Log a record the sink rejected
///
/// # Example
///
/// ```no_run
/// use ferry::log_record_failure;
///
/// log_record_failure!(42, "no such field: x_studio_note");
/// ```
#[macro_export]
macro_rules! log_record_failure {
    ($id:expr, $reason:expr) => {
        tracing::error!(
            record_id = %$id,
            reason = %$reason,
            "Failed to insert record"
        );
    };
}

/// Log progress after a batch
///
/// # Example
///
/// ```no_run
/// use ferry::log_batch_progress;
///
/// log_batch_progress!(3, 100, 1000, 998);
/// ```
#[macro_export]
macro_rules! log_batch_progress {
    ($batch:expr, $max_batches:expr, $fetched:expr, $inserted:expr) => {
        tracing::info!(
            batch = $batch,
            max_batches = $max_batches,
            fetched = $fetched,
            inserted = $inserted,
            "Processed batch"
        );
    };
}

/// Log a retry attempt
///
/// # Example
///
/// ```no_run
/// use ferry::log_retry_attempt;
///
/// log_retry_attempt!(2, 3, "Connection timeout");
/// ```
#[macro_export]
macro_rules! log_retry_attempt {
    ($attempt:expr, $max_attempts:expr, $reason:expr) => {
        tracing::warn!(
            attempt = $attempt,
            max_attempts = $max_attempts,
            reason = %$reason,
            "Retrying request"
        );
    };
}
