//! Batch processing for record syncs
//!
//! One fetched batch goes through dedup, sanitization, a single bulk insert
//! and, when enabled, deletion of the records that made it into the sink.

use crate::adapters::traits::{InsertRow, RecordSource, TableSink};
use crate::core::sync::dedup::ExistingIdSet;
use crate::core::transform::sanitize;
use crate::domain::ids::{InsertId, ModelName, RecordId, TableId};
use crate::domain::record::Record;
use crate::domain::Result;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Configuration for batch processing
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Model being synced
    pub model: ModelName,
    /// Destination table
    pub table: TableId,
    /// Delete records from the source once they are in the sink
    pub delete_after_sync: bool,
    /// Skip every write (insert, delete)
    pub dry_run: bool,
}

impl BatchConfig {
    /// Create a new batch configuration
    pub fn new(model: ModelName, table: TableId, delete_after_sync: bool, dry_run: bool) -> Self {
        Self {
            model,
            table,
            delete_after_sync,
            dry_run,
        }
    }
}

/// A record that could not be synced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFailure {
    /// Record id
    pub id: RecordId,
    /// Reason reported by the sink or source
    pub reason: String,
}

/// Result of processing a batch
#[derive(Debug, Clone, Default)]
pub struct BatchResult {
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
    /// Latest `create_date` seen in the batch
    pub latest_create_date: Option<DateTime<Utc>>,
    /// Id of the last record in fetch order
    pub last_id: Option<RecordId>,
    /// Per-record failures
    pub failures: Vec<RecordFailure>,
}

impl BatchResult {
    /// Create a new empty batch result
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetched records that are still in the source
    pub fn remaining_in_source(&self) -> usize {
        self.fetched.saturating_sub(self.deleted)
    }
}

/// Batch processor for fetched records
pub struct BatchProcessor {
    source: Arc<dyn RecordSource>,
    sink: Arc<dyn TableSink>,
    config: BatchConfig,
}

impl BatchProcessor {
    /// Create a new batch processor
    pub fn new(source: Arc<dyn RecordSource>, sink: Arc<dyn TableSink>, config: BatchConfig) -> Self {
        Self {
            source,
            sink,
            config,
        }
    }

    /// Process a batch of records
    ///
    /// This method:
    /// 1. Drops records whose id is already in the sink
    /// 2. Sanitizes the rest
    /// 3. Inserts them in one call, keyed by `{model}_{id}`
    /// 4. Partitions the per-row results
    /// 5. Deletes only the inserted records from the source, when enabled
    /// 6. Adds the inserted ids to `existing`
    ///
    /// # Errors
    ///
    /// Returns an error only when the insert call fails as a whole. Per-row
    /// rejections and delete failures are reported in the result.
    pub async fn process_batch(
        &self,
        records: Vec<Record>,
        existing: &mut ExistingIdSet,
    ) -> Result<BatchResult> {
        let mut result = BatchResult::new();
        result.fetched = records.len();
        result.latest_create_date = records.iter().map(|r| r.create_date).max();
        result.last_id = records.last().map(|r| r.id);

        if records.is_empty() {
            tracing::debug!("No records to process in batch");
            return Ok(result);
        }

        let (pending, duplicates): (Vec<Record>, Vec<Record>) =
            records.into_iter().partition(|r| !existing.contains(&r.id));
        result.skipped = duplicates.len();

        if result.skipped > 0 {
            tracing::debug!(
                model = %self.config.model,
                skipped = result.skipped,
                "Skipped records already in the sink"
            );
        }

        if pending.is_empty() {
            return Ok(result);
        }

        let ids: Vec<RecordId> = pending.iter().map(|r| r.id).collect();
        let rows: Vec<InsertRow> = pending
            .iter()
            .map(|record| InsertRow {
                insert_id: InsertId::for_record(&self.config.model, record.id),
                json: sanitize(record).into_json(),
            })
            .collect();

        if self.config.dry_run {
            tracing::info!(
                model = %self.config.model,
                rows = rows.len(),
                "Dry run: skipping insert"
            );
            result.inserted = rows.len();
            for id in &ids {
                existing.insert(*id);
            }
            return Ok(result);
        }

        let insert = self.sink.insert_rows(&self.config.table, rows).await?;

        let mut succeeded = Vec::with_capacity(ids.len());
        for (index, id) in ids.iter().enumerate() {
            match insert.failure_at(index) {
                Some(failure) => {
                    crate::log_record_failure!(id, &failure.reason);
                    result.failures.push(RecordFailure {
                        id: *id,
                        reason: failure.reason.clone(),
                    });
                }
                None => succeeded.push(*id),
            }
        }
        result.inserted = succeeded.len();
        result.failed = result.failures.len();

        for id in &succeeded {
            existing.insert(*id);
        }

        if self.config.delete_after_sync && !succeeded.is_empty() {
            self.delete_synced(&succeeded, &mut result).await;
        }

        Ok(result)
    }

    async fn delete_synced(&self, ids: &[RecordId], result: &mut BatchResult) {
        match self.source.unlink(&self.config.model, ids).await {
            Ok(()) => {
                result.deleted += ids.len();
                tracing::info!(
                    model = %self.config.model,
                    deleted = ids.len(),
                    "Deleted synced records from source"
                );
            }
            Err(e) => {
                result.delete_failed += ids.len();
                tracing::error!(
                    model = %self.config.model,
                    ids = ?ids.iter().map(|id| id.value()).collect::<Vec<_>>(),
                    error = %e,
                    "Failed to delete synced records from source"
                );
            }
        }
    }
}
