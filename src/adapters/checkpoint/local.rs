//! Local file checkpoint storage

use crate::adapters::traits::CheckpointStorage;
use crate::domain::{FerryError, Result};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Checkpoint document on the local filesystem
///
/// Writes go to a sibling temp file that is renamed over the target, so a
/// crash mid-write leaves the previous document intact.
pub struct LocalFileStorage {
    path: PathBuf,
}

impl LocalFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl CheckpointStorage for LocalFileStorage {
    async fn read(&self) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(FerryError::Checkpoint(format!(
                "Failed to read {}: {e}",
                self.path.display()
            ))),
        }
    }

    async fn write(&self, bytes: &[u8]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let temp = self.temp_path();
        tokio::fs::write(&temp, bytes).await?;
        tokio::fs::rename(&temp, &self.path).await?;

        tracing::debug!(path = %self.path.display(), bytes = bytes.len(), "Wrote checkpoint");
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_reads_as_none() {
        let dir = TempDir::new().unwrap();
        let storage = LocalFileStorage::new(dir.path().join("sync_state_sale_order.json"));
        assert!(storage.read().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let dir = TempDir::new().unwrap();
        let storage = LocalFileStorage::new(dir.path().join("state/sync_state_sale_order.json"));

        storage.write(br#"{"last_processed_id": 1}"#).await.unwrap();
        storage.write(br#"{"last_processed_id": 2}"#).await.unwrap();

        let bytes = storage.read().await.unwrap().unwrap();
        assert_eq!(bytes, br#"{"last_processed_id": 2}"#.to_vec());
        assert!(!dir.path().join("state/sync_state_sale_order.json.tmp").exists());
    }

    #[test]
    fn test_location_is_path() {
        let storage = LocalFileStorage::new("sync_state_sale_order.json");
        assert_eq!(storage.location(), "sync_state_sale_order.json");
        assert_eq!(storage.path(), Path::new("sync_state_sale_order.json"));
    }
}
