//! Sync coordinator - main orchestrator for a sync run
//!
//! Drives one run through `INIT -> TABLE_CHECK -> WINDOW_COMPUTE ->
//! BATCH_LOOP -> DONE`, with `SCHEMA_MISSING` as a non-error early stop when
//! the destination table does not exist.

use crate::adapters::traits::{RecordSource, TableSink};
use crate::config::FerryConfig;
use crate::core::state::{Checkpoint, CheckpointStore, SyncStatus};
use crate::core::sync::batch::{BatchConfig, BatchProcessor};
use crate::core::sync::cursor::BatchCursor;
use crate::core::sync::dedup::{load_existing_ids, ExistingIdLookup, ExistingIdSet};
use crate::core::sync::summary::{RunOutcome, SyncError, SyncSummary};
use crate::core::sync::window::{SyncWindow, WindowSettings};
use crate::core::transform::create_table_statement;
use crate::domain::ids::{ModelName, TableId};
use crate::domain::{FerryError, Result};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;

/// Settings for one sync run, resolved from configuration
#[derive(Debug, Clone)]
pub struct SyncSettings {
    /// Source model
    pub model: ModelName,
    /// Destination table
    pub table: TableId,
    /// Window shaping
    pub window: WindowSettings,
    /// Records per fetch
    pub batch_limit: usize,
    /// Batches per run before a controlled stop
    pub max_batches: usize,
    /// Delete synced records from the source
    pub delete_after_sync: bool,
    /// Skip every write
    pub dry_run: bool,
}

impl SyncSettings {
    /// Resolves settings from a validated configuration
    pub fn from_config(config: &FerryConfig) -> Result<Self> {
        Ok(Self {
            model: config.model_name().map_err(FerryError::Configuration)?,
            table: config.table_id().map_err(FerryError::Configuration)?,
            window: WindowSettings {
                lookback_days: config.sync.lookback_days,
                buffer_minutes: config.sync.buffer_minutes,
                mode: config.sync.mode,
            },
            batch_limit: config.sync.batch_limit,
            max_batches: config.sync.max_batches,
            delete_after_sync: config.sync.delete_after_sync,
            dry_run: config.application.dry_run,
        })
    }
}

/// Mutable state of one run
///
/// Owned by a single `execute_sync` call and dropped when it returns.
pub struct RunContext {
    /// Checkpoint as loaded and advanced
    pub checkpoint: Checkpoint,
    /// Ids already in the sink
    pub existing: ExistingIdSet,
    /// Pagination state
    pub cursor: BatchCursor,
    /// Totals so far
    pub summary: SyncSummary,
}

/// Sync coordinator
pub struct SyncCoordinator {
    source: Arc<dyn RecordSource>,
    sink: Arc<dyn TableSink>,
    checkpoints: CheckpointStore,
    settings: SyncSettings,
    batch_processor: BatchProcessor,
    shutdown: Option<watch::Receiver<bool>>,
}

impl SyncCoordinator {
    /// Create a new sync coordinator
    pub fn new(
        source: Arc<dyn RecordSource>,
        sink: Arc<dyn TableSink>,
        checkpoints: CheckpointStore,
        settings: SyncSettings,
    ) -> Self {
        let batch_processor = BatchProcessor::new(
            source.clone(),
            sink.clone(),
            BatchConfig::new(
                settings.model.clone(),
                settings.table.clone(),
                settings.delete_after_sync,
                settings.dry_run,
            ),
        );

        Self {
            source,
            sink,
            checkpoints,
            settings,
            batch_processor,
            shutdown: None,
        }
    }

    /// Observe a shutdown signal between batches
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Execute a sync run with the window ending now
    pub async fn execute_sync(&self) -> Result<SyncSummary> {
        self.execute_sync_at(Utc::now()).await
    }

    /// Execute a sync run with the window ending at `now`
    ///
    /// # Errors
    ///
    /// Returns an error when a source or sink call fails as a whole. The
    /// checkpoint is not advanced for the batch in flight and is saved with
    /// status `failed`.
    pub async fn execute_sync_at(&self, now: DateTime<Utc>) -> Result<SyncSummary> {
        let start_time = Instant::now();
        let mut summary = SyncSummary::new();
        summary.dry_run = self.settings.dry_run;

        // INIT
        let mut checkpoint = self.checkpoints.load().await;
        self.source.authenticate().await?;

        // TABLE_CHECK
        if !self.sink.table_exists(&self.settings.table).await? {
            return Ok(self.schema_missing(summary, start_time).await);
        }

        // WINDOW_COMPUTE
        let window = SyncWindow::resolve(&self.settings.window, &checkpoint, now);
        crate::log_sync_start!(self.settings.model, self.settings.table, window);

        if checkpoint.model.is_none() {
            checkpoint.model = Some(self.settings.model.clone());
        }
        checkpoint.mark_started();
        self.persist(&checkpoint).await;

        if window.is_empty() {
            tracing::info!(window = %window, "Sync window is empty");
            checkpoint.mark_finished(SyncStatus::Completed);
            self.persist(&checkpoint).await;
            summary.log_summary();
            return Ok(summary.with_duration(start_time.elapsed()));
        }

        let existing = match load_existing_ids(self.sink.as_ref(), &self.settings.table, &window).await
        {
            Ok(ExistingIdLookup::Loaded(ids)) => ids,
            Ok(ExistingIdLookup::TableAbsent) => {
                checkpoint.mark_finished(SyncStatus::Stopped);
                self.persist(&checkpoint).await;
                return Ok(self.schema_missing(summary, start_time).await);
            }
            Err(e) => return Err(self.fail(checkpoint, e).await),
        };

        let mut ctx = RunContext {
            checkpoint,
            existing,
            cursor: BatchCursor::new(self.settings.model.clone(), window, self.settings.batch_limit),
            summary,
        };

        // BATCH_LOOP
        let outcome = match self.batch_loop(&mut ctx).await {
            Ok(outcome) => outcome,
            Err(e) => return Err(self.fail(ctx.checkpoint, e).await),
        };

        // DONE
        let status = match outcome {
            RunOutcome::Completed | RunOutcome::SchemaMissing => SyncStatus::Completed,
            RunOutcome::SafetyLimitReached => SyncStatus::Stopped,
            RunOutcome::Interrupted => SyncStatus::Interrupted,
        };
        ctx.checkpoint.mark_finished(status);
        self.persist(&ctx.checkpoint).await;

        let mut summary = ctx.summary.with_duration(start_time.elapsed());
        summary.outcome = outcome;
        summary.log_summary();

        Ok(summary)
    }

    async fn batch_loop(&self, ctx: &mut RunContext) -> Result<RunOutcome> {
        loop {
            if self.shutdown_requested() {
                tracing::warn!(
                    batches = ctx.summary.batches,
                    "Shutdown requested, stopping between batches"
                );
                return Ok(RunOutcome::Interrupted);
            }

            let Some(records) = ctx.cursor.next_batch(self.source.as_ref()).await? else {
                tracing::info!(batches = ctx.summary.batches, "Sync window exhausted");
                return Ok(RunOutcome::Completed);
            };

            let batch = self
                .batch_processor
                .process_batch(records, &mut ctx.existing)
                .await?;
            ctx.summary.record_batch(&batch);
            ctx.cursor.advance(batch.remaining_in_source());

            if let (Some(latest), Some(last_id)) = (batch.latest_create_date, batch.last_id) {
                ctx.checkpoint.advance(latest, last_id, batch.inserted as u64);
                if !self.settings.dry_run {
                    if let Err(e) = self.checkpoints.checkpoint_batch(&ctx.checkpoint).await {
                        tracing::warn!(error = %e, "Failed to checkpoint batch");
                        ctx.summary.add_error(SyncError::from(&e));
                    }
                }
            }

            crate::log_batch_progress!(
                ctx.summary.batches,
                self.settings.max_batches,
                batch.fetched,
                batch.inserted
            );

            if ctx.summary.batches >= self.settings.max_batches {
                tracing::warn!(
                    max_batches = self.settings.max_batches,
                    "Batch limit reached, stopping; the next run resumes from the checkpoint"
                );
                return Ok(RunOutcome::SafetyLimitReached);
            }
        }
    }

    async fn schema_missing(&self, mut summary: SyncSummary, start_time: Instant) -> SyncSummary {
        tracing::warn!(
            table = %self.settings.table,
            "Destination table does not exist, nothing will be synced"
        );

        match self.source.fields_get(&self.settings.model).await {
            Ok(fields) => {
                let statement = create_table_statement(&self.settings.table, &fields);
                tracing::info!(
                    table = %self.settings.table,
                    columns = fields.len(),
                    "Create the table with the generated statement, then rerun"
                );
                summary.create_table = Some(statement);
            }
            Err(e) => {
                tracing::error!(
                    model = %self.settings.model,
                    error = %e,
                    "Failed to read field metadata for the create table statement"
                );
                summary.add_error(SyncError::from(&e));
            }
        }

        summary.outcome = RunOutcome::SchemaMissing;
        let summary = summary.with_duration(start_time.elapsed());
        summary.log_summary();
        summary
    }

    async fn fail(&self, mut checkpoint: Checkpoint, error: FerryError) -> FerryError {
        tracing::error!(error = %error, "Sync failed");
        checkpoint.mark_finished(SyncStatus::Failed);
        self.persist(&checkpoint).await;
        error
    }

    // Checkpoint writes outside the batch loop are best effort
    async fn persist(&self, checkpoint: &Checkpoint) {
        if self.settings.dry_run {
            return;
        }
        if let Err(e) = self.checkpoints.save(checkpoint).await {
            tracing::warn!(
                location = %self.checkpoints.location(),
                error = %e,
                "Failed to save checkpoint"
            );
        }
    }

    fn shutdown_requested(&self) -> bool {
        self.shutdown
            .as_ref()
            .map(|rx| *rx.borrow())
            .unwrap_or(false)
    }
}
