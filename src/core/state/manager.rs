//! Checkpoint store
//!
//! This module provides the CheckpointStore for loading and saving the
//! checkpoint document through a pluggable storage backend.

use crate::adapters::traits::CheckpointStorage;
use crate::core::state::checkpoint::Checkpoint;
use crate::domain::{FerryError, Result};
use std::sync::Arc;

/// Checkpoint store
///
/// Wraps a storage backend and owns the JSON encoding of the checkpoint.
/// Loading never fails: a missing or unreadable document yields the zero
/// checkpoint.
pub struct CheckpointStore {
    /// Storage backend
    storage: Arc<dyn CheckpointStorage>,
}

impl CheckpointStore {
    /// Create a new CheckpointStore with a storage backend
    pub fn new(storage: Arc<dyn CheckpointStorage>) -> Self {
        Self { storage }
    }

    /// Human-readable location of the checkpoint document
    pub fn location(&self) -> String {
        self.storage.location()
    }

    /// Load the checkpoint
    ///
    /// Missing, unreadable or corrupt documents are logged and replaced by
    /// the zero checkpoint.
    pub async fn load(&self) -> Checkpoint {
        let bytes = match self.storage.read().await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                tracing::info!(
                    location = %self.location(),
                    "No checkpoint found, starting from the beginning"
                );
                return Checkpoint::default();
            }
            Err(e) => {
                tracing::warn!(
                    location = %self.location(),
                    error = %e,
                    "Failed to read checkpoint, starting from the beginning"
                );
                return Checkpoint::default();
            }
        };

        match serde_json::from_slice::<Checkpoint>(&bytes) {
            Ok(checkpoint) => {
                tracing::info!(
                    location = %self.location(),
                    last_sync_timestamp = ?checkpoint.last_sync_timestamp,
                    last_processed_id = ?checkpoint.last_processed_id,
                    "Loaded checkpoint"
                );
                checkpoint
            }
            Err(e) => {
                tracing::warn!(
                    location = %self.location(),
                    error = %e,
                    "Checkpoint is corrupt, starting from the beginning"
                );
                Checkpoint::default()
            }
        }
    }

    /// Save the checkpoint
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be encoded or written.
    pub async fn save(&self, checkpoint: &Checkpoint) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(checkpoint)?;
        self.storage
            .write(&bytes)
            .await
            .map_err(|e| FerryError::Checkpoint(format!("{}: {e}", self.location())))
    }

    /// Checkpoint a committed batch
    ///
    /// Same as `save`, with batch-level logging.
    pub async fn checkpoint_batch(&self, checkpoint: &Checkpoint) -> Result<()> {
        tracing::info!(
            last_sync_timestamp = ?checkpoint.last_sync_timestamp,
            last_processed_id = ?checkpoint.last_processed_id,
            records_synced_count = checkpoint.records_synced_count,
            "Checkpointing batch"
        );

        self.save(checkpoint).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::checkpoint::{CheckpointBuilder, SyncStatus};
    use crate::domain::ids::{ModelName, RecordId};
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryStorage {
        content: Mutex<Option<Vec<u8>>>,
        fail_reads: bool,
    }

    #[async_trait]
    impl CheckpointStorage for MemoryStorage {
        async fn read(&self) -> Result<Option<Vec<u8>>> {
            if self.fail_reads {
                return Err(FerryError::Connection("storage unreachable".to_string()));
            }
            Ok(self.content.lock().unwrap().clone())
        }

        async fn write(&self, bytes: &[u8]) -> Result<()> {
            *self.content.lock().unwrap() = Some(bytes.to_vec());
            Ok(())
        }

        fn location(&self) -> String {
            "memory://checkpoint".to_string()
        }
    }

    #[tokio::test]
    async fn test_load_missing_returns_zero() {
        let store = CheckpointStore::new(Arc::new(MemoryStorage::default()));
        assert!(store.load().await.is_zero());
    }

    #[tokio::test]
    async fn test_load_corrupt_returns_zero() {
        let storage = MemoryStorage::default();
        *storage.content.lock().unwrap() = Some(b"{not json".to_vec());
        let store = CheckpointStore::new(Arc::new(storage));
        assert!(store.load().await.is_zero());
    }

    #[tokio::test]
    async fn test_load_read_error_returns_zero() {
        let storage = MemoryStorage {
            fail_reads: true,
            ..Default::default()
        };
        let store = CheckpointStore::new(Arc::new(storage));
        assert!(store.load().await.is_zero());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let store = CheckpointStore::new(Arc::new(MemoryStorage::default()));
        let checkpoint = CheckpointBuilder::new(ModelName::new("sale.order").unwrap())
            .last_sync_timestamp(Utc.with_ymd_and_hms(2025, 2, 2, 2, 2, 2).unwrap())
            .last_processed_id(RecordId::new(9))
            .last_run_status(SyncStatus::Completed)
            .build();

        store.checkpoint_batch(&checkpoint).await.unwrap();
        assert_eq!(store.load().await, checkpoint);
    }
}
