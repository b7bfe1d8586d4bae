//! Sync orchestration and batch processing
//!
//! This module provides the core sync logic for Ferry, including:
//! - Window resolution from lookback and checkpoint
//! - Offset-paginated batch fetching
//! - Existing-ID dedup against the sink
//! - Batch processing (sanitize, insert, delete)
//! - Coordination and the run summary

pub mod batch;
pub mod coordinator;
pub mod cursor;
pub mod dedup;
pub mod summary;
pub mod window;

pub use batch::{BatchConfig, BatchProcessor, BatchResult, RecordFailure};
pub use coordinator::{RunContext, SyncCoordinator, SyncSettings};
pub use cursor::{fetch_batch, BatchCursor};
pub use dedup::{load_existing_ids, ExistingIdLookup, ExistingIdSet};
pub use summary::{RunOutcome, SyncError, SyncErrorType, SyncSummary};
pub use window::{SyncWindow, WindowSettings};
