//! Checkpoint model for tracking sync progress
//!
//! This module defines the checkpoint document persisted between runs. It is a
//! small JSON object keyed by nothing: one document per model and table pair,
//! located by configuration.

use crate::domain::ids::{ModelName, RecordId};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Status of the last sync run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    /// No run has been recorded
    #[default]
    NotStarted,
    /// A run is in progress (or crashed mid-run)
    InProgress,
    /// The run drained its window
    Completed,
    /// The run stopped at the batch safety limit
    Stopped,
    /// The run aborted on a fatal error
    Failed,
    /// The run was interrupted by a signal
    Interrupted,
}

impl std::fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SyncStatus::NotStarted => "not_started",
            SyncStatus::InProgress => "in_progress",
            SyncStatus::Completed => "completed",
            SyncStatus::Stopped => "stopped",
            SyncStatus::Failed => "failed",
            SyncStatus::Interrupted => "interrupted",
        };
        write!(f, "{s}")
    }
}

/// Checkpoint for resuming incremental syncs
///
/// The zero value (no timestamp) means "sync from the beginning of the
/// window". Documents written as `{"last_synced": "<iso>"}` by older
/// deployments are read as `last_sync_timestamp`.
///
/// # Examples
///
/// ```
/// use ferry::core::state::{CheckpointBuilder, SyncStatus};
/// use ferry::domain::ids::ModelName;
///
/// let checkpoint = CheckpointBuilder::new(ModelName::new("sale.order").unwrap())
///     .records_synced_count(100)
///     .build();
///
/// assert_eq!(checkpoint.records_synced_count, 100);
/// assert_eq!(checkpoint.last_run_status, SyncStatus::NotStarted);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Model this checkpoint tracks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<ModelName>,

    /// `create_date` of the newest record committed to the sink
    #[serde(
        default,
        alias = "last_synced",
        deserialize_with = "deserialize_lenient_timestamp"
    )]
    pub last_sync_timestamp: Option<DateTime<Utc>>,

    /// Id of the last record in the last committed batch
    #[serde(default)]
    pub last_processed_id: Option<RecordId>,

    /// Total rows inserted across all runs
    #[serde(default)]
    pub records_synced_count: u64,

    /// When the last run started
    #[serde(default)]
    pub last_run_started_at: Option<DateTime<Utc>>,

    /// When the last run finished (None while in progress)
    #[serde(default)]
    pub last_run_completed_at: Option<DateTime<Utc>>,

    /// Status of the last run
    #[serde(default)]
    pub last_run_status: SyncStatus,
}

impl Checkpoint {
    /// Whether no batch has ever been committed
    pub fn is_zero(&self) -> bool {
        self.last_sync_timestamp.is_none()
    }

    /// Mark a run as started
    pub fn mark_started(&mut self) {
        self.last_run_started_at = Some(Utc::now());
        self.last_run_completed_at = None;
        self.last_run_status = SyncStatus::InProgress;
    }

    /// Mark a run as finished with the given terminal status
    pub fn mark_finished(&mut self, status: SyncStatus) {
        self.last_run_completed_at = Some(Utc::now());
        self.last_run_status = status;
    }

    /// Advance past a committed batch
    ///
    /// The timestamp never moves backwards, so a full resync of older records
    /// keeps the high-water mark of earlier runs.
    pub fn advance(&mut self, batch_latest: DateTime<Utc>, last_id: RecordId, inserted: u64) {
        let next = match self.last_sync_timestamp {
            Some(current) if current > batch_latest => current,
            _ => batch_latest,
        };
        self.last_sync_timestamp = Some(next);
        self.last_processed_id = Some(last_id);
        self.records_synced_count += inserted;
    }

    /// Duration of the last run if it finished
    pub fn last_run_duration(&self) -> Option<chrono::Duration> {
        match (self.last_run_started_at, self.last_run_completed_at) {
            (Some(started), Some(completed)) => Some(completed - started),
            _ => None,
        }
    }
}

/// Accepts RFC 3339 and offset-less ISO 8601 timestamps, the latter as UTC
fn deserialize_lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    let Some(raw) = raw else {
        return Ok(None);
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(Some(dt.with_timezone(&Utc)));
    }

    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(&raw, "%Y-%m-%d %H:%M:%S%.f"))
        .map(|naive| Some(Utc.from_utc_datetime(&naive)))
        .map_err(|e| serde::de::Error::custom(format!("invalid timestamp '{raw}': {e}")))
}

/// Builder for creating Checkpoint instances
pub struct CheckpointBuilder {
    model: ModelName,
    last_sync_timestamp: Option<DateTime<Utc>>,
    last_processed_id: Option<RecordId>,
    records_synced_count: u64,
    last_run_status: SyncStatus,
}

impl CheckpointBuilder {
    /// Create a new CheckpointBuilder for a model
    pub fn new(model: ModelName) -> Self {
        Self {
            model,
            last_sync_timestamp: None,
            last_processed_id: None,
            records_synced_count: 0,
            last_run_status: SyncStatus::NotStarted,
        }
    }

    /// Set the last sync timestamp
    pub fn last_sync_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.last_sync_timestamp = Some(timestamp);
        self
    }

    /// Set the last processed record id
    pub fn last_processed_id(mut self, id: RecordId) -> Self {
        self.last_processed_id = Some(id);
        self
    }

    /// Set the records synced count
    pub fn records_synced_count(mut self, count: u64) -> Self {
        self.records_synced_count = count;
        self
    }

    /// Set the last run status
    pub fn last_run_status(mut self, status: SyncStatus) -> Self {
        self.last_run_status = status;
        self
    }

    /// Build the Checkpoint instance
    pub fn build(self) -> Checkpoint {
        Checkpoint {
            model: Some(self.model),
            last_sync_timestamp: self.last_sync_timestamp,
            last_processed_id: self.last_processed_id,
            records_synced_count: self.records_synced_count,
            last_run_started_at: None,
            last_run_completed_at: None,
            last_run_status: self.last_run_status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> ModelName {
        ModelName::new("sale.order").unwrap()
    }

    #[test]
    fn test_zero_value() {
        let checkpoint = Checkpoint::default();
        assert!(checkpoint.is_zero());
        assert_eq!(checkpoint.last_run_status, SyncStatus::NotStarted);
        assert_eq!(checkpoint.records_synced_count, 0);
    }

    #[test]
    fn test_mark_started_and_finished() {
        let mut checkpoint = CheckpointBuilder::new(model()).build();
        checkpoint.mark_started();
        assert_eq!(checkpoint.last_run_status, SyncStatus::InProgress);
        assert!(checkpoint.last_run_completed_at.is_none());
        assert!(checkpoint.last_run_duration().is_none());

        checkpoint.mark_finished(SyncStatus::Completed);
        assert_eq!(checkpoint.last_run_status, SyncStatus::Completed);
        assert!(checkpoint.last_run_duration().is_some());
    }

    #[test]
    fn test_advance() {
        let mut checkpoint = CheckpointBuilder::new(model()).build();
        let ts = Utc.with_ymd_and_hms(2025, 1, 10, 12, 0, 0).unwrap();

        checkpoint.advance(ts, RecordId::new(5), 3);
        assert_eq!(checkpoint.last_sync_timestamp, Some(ts));
        assert_eq!(checkpoint.last_processed_id, Some(RecordId::new(5)));
        assert_eq!(checkpoint.records_synced_count, 3);
    }

    #[test]
    fn test_advance_never_moves_backwards() {
        let later = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let earlier = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let mut checkpoint = CheckpointBuilder::new(model())
            .last_sync_timestamp(later)
            .build();

        checkpoint.advance(earlier, RecordId::new(2), 1);
        assert_eq!(checkpoint.last_sync_timestamp, Some(later));
        assert_eq!(checkpoint.records_synced_count, 1);
    }

    #[test]
    fn test_legacy_document() {
        let checkpoint: Checkpoint =
            serde_json::from_str(r#"{"last_synced": "2024-05-01T12:30:00.123456"}"#).unwrap();
        assert_eq!(
            checkpoint.last_sync_timestamp.map(|t| t.timestamp()),
            Some(Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap().timestamp())
        );
        assert!(checkpoint.model.is_none());
        assert_eq!(checkpoint.last_run_status, SyncStatus::NotStarted);
    }

    #[test]
    fn test_invalid_timestamp_rejected() {
        let result = serde_json::from_str::<Checkpoint>(r#"{"last_sync_timestamp": "soon"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_serialization_round_trip() {
        let ts = Utc.with_ymd_and_hms(2025, 3, 3, 3, 3, 3).unwrap();
        let checkpoint = CheckpointBuilder::new(model())
            .last_sync_timestamp(ts)
            .last_processed_id(RecordId::new(77))
            .records_synced_count(10)
            .last_run_status(SyncStatus::Stopped)
            .build();

        let json = serde_json::to_string(&checkpoint).unwrap();
        assert!(json.contains(r#""last_run_status":"stopped""#));
        assert!(json.contains(r#""model":"sale.order""#));

        let back: Checkpoint = serde_json::from_str(&json).unwrap();
        assert_eq!(back, checkpoint);
    }
}
