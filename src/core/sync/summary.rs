//! Sync summary and reporting
//!
//! This module defines structures for tracking and reporting sync results.

use crate::core::sync::batch::BatchResult;
use crate::core::transform::CreateTableStatement;
use crate::domain::FerryError;
use std::time::Duration;

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunOutcome {
    /// The window was exhausted
    #[default]
    Completed,
    /// Stopped after the maximum number of batches
    SafetyLimitReached,
    /// Destination table does not exist; nothing was fetched
    SchemaMissing,
    /// Stopped between batches on a shutdown signal
    Interrupted,
}

impl std::fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunOutcome::Completed => write!(f, "completed"),
            RunOutcome::SafetyLimitReached => write!(f, "safety_limit_reached"),
            RunOutcome::SchemaMissing => write!(f, "schema_missing"),
            RunOutcome::Interrupted => write!(f, "interrupted"),
        }
    }
}

/// Summary of a sync run
#[derive(Debug, Clone, Default)]
pub struct SyncSummary {
    /// Records returned by the source
    pub fetched: usize,

    /// Records accepted by the sink
    pub inserted: usize,

    /// Records the sink rejected
    pub failed: usize,

    /// Records already present in the sink
    pub skipped: usize,

    /// Records deleted from the source
    pub deleted: usize,

    /// Records whose deletion failed
    pub delete_failed: usize,

    /// Non-empty batches processed
    pub batches: usize,

    /// Duration of the run
    pub duration: Duration,

    /// How the run ended
    pub outcome: RunOutcome,

    /// Whether writes were skipped
    pub dry_run: bool,

    /// Remediation DDL when the table is missing
    pub create_table: Option<CreateTableStatement>,

    /// Errors encountered during the run
    pub errors: Vec<SyncError>,
}

impl SyncSummary {
    /// Create a new empty sync summary
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the duration
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Add an error
    pub fn add_error(&mut self, error: SyncError) {
        self.errors.push(error);
    }

    /// Fold one batch into the totals
    pub fn record_batch(&mut self, batch: &BatchResult) {
        self.batches += 1;
        self.fetched += batch.fetched;
        self.inserted += batch.inserted;
        self.failed += batch.failed;
        self.skipped += batch.skipped;
        self.deleted += batch.deleted;
        self.delete_failed += batch.delete_failed;
        for failure in &batch.failures {
            self.add_error(
                SyncError::new(SyncErrorType::Insert, failure.reason.clone())
                    .with_context(format!("id={}", failure.id)),
            );
        }
        if batch.delete_failed > 0 {
            self.add_error(SyncError::new(
                SyncErrorType::Delete,
                format!("{} record(s) could not be deleted from the source", batch.delete_failed),
            ));
        }
    }

    /// Check if the sync had no record-level failures
    pub fn is_successful(&self) -> bool {
        self.failed == 0 && self.delete_failed == 0
    }

    /// Get success rate as a percentage of the records attempted
    pub fn success_rate(&self) -> f64 {
        let attempted = self.inserted + self.failed;
        if attempted == 0 {
            return 100.0;
        }
        (self.inserted as f64 / attempted as f64) * 100.0
    }

    /// Log the summary
    pub fn log_summary(&self) {
        tracing::info!(
            outcome = %self.outcome,
            fetched = self.fetched,
            inserted = self.inserted,
            failed = self.failed,
            skipped = self.skipped,
            deleted = self.deleted,
            delete_failed = self.delete_failed,
            batches = self.batches,
            dry_run = self.dry_run,
            duration_secs = self.duration.as_secs(),
            success_rate = format!("{:.2}%", self.success_rate()),
            "Sync finished"
        );

        if !self.errors.is_empty() {
            tracing::warn!(
                error_count = self.errors.len(),
                "Sync finished with errors"
            );
        }
    }
}

/// Type of sync error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncErrorType {
    /// Connection error (source or sink)
    Connection,
    /// Authentication error
    Authentication,
    /// Source call error
    Source,
    /// Per-record insert rejection
    Insert,
    /// Source deletion failure
    Delete,
    /// Checkpoint persistence error
    Checkpoint,
    /// Sink call error
    Sink,
    /// Unknown error
    Unknown,
}

/// Sync error with context
#[derive(Debug, Clone)]
pub struct SyncError {
    /// Type of error
    pub error_type: SyncErrorType,

    /// Error message
    pub message: String,

    /// Optional context (e.g. record id)
    pub context: Option<String>,
}

impl SyncError {
    /// Create a new sync error
    pub fn new(error_type: SyncErrorType, message: String) -> Self {
        Self {
            error_type,
            message,
            context: None,
        }
    }

    /// Add context to the error
    pub fn with_context(mut self, context: String) -> Self {
        self.context = Some(context);
        self
    }
}

impl From<&FerryError> for SyncError {
    fn from(error: &FerryError) -> Self {
        let error_type = match error {
            FerryError::Authentication(_) => SyncErrorType::Authentication,
            FerryError::Connection(_) => SyncErrorType::Connection,
            FerryError::Checkpoint(_) => SyncErrorType::Checkpoint,
            e if e.is_connectivity() => SyncErrorType::Connection,
            FerryError::Source(_) => SyncErrorType::Source,
            FerryError::Sink(_) => SyncErrorType::Sink,
            _ => SyncErrorType::Unknown,
        };
        SyncError::new(error_type, error.to_string())
    }
}
