//! In-memory collaborators for sync integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use ferry::adapters::traits::{
    BulkInsertFailure, BulkInsertResult, CheckpointStorage, InsertRow, RecordSource, SearchQuery,
    TableSink,
};
use ferry::config::SyncMode;
use ferry::core::state::CheckpointStore;
use ferry::core::sync::{SyncCoordinator, SyncSettings, WindowSettings};
use ferry::domain::record::format_odoo_datetime;
use ferry::domain::{FerryError, ModelName, Record, RecordId, Result, SinkError, SourceError, TableId};
use serde_json::json;
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};

pub const MODEL: &str = "sale.order";
pub const TABLE: &str = "acme.erp.sale_order";

/// Fixed "now" for deterministic windows
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
}

/// A record created `minutes_ago` before [`now`]
pub fn record(id: i64, minutes_ago: i64) -> Record {
    record_at(id, now() - Duration::minutes(minutes_ago))
}

pub fn record_at(id: i64, create_date: DateTime<Utc>) -> Record {
    Record::from_json(json!({
        "id": id,
        "create_date": format_odoo_datetime(&create_date),
        "name": format!("SO{id:05}"),
        "amount_total": 100.5,
        "partner_id": [7, "Azure Interior"],
        "note": false,
    }))
    .unwrap()
}

pub fn settings() -> SyncSettings {
    SyncSettings {
        model: ModelName::new(MODEL).unwrap(),
        table: TableId::parse(TABLE).unwrap(),
        window: WindowSettings {
            lookback_days: -1,
            buffer_minutes: 2,
            mode: SyncMode::Incremental,
        },
        batch_limit: 1000,
        max_batches: 100,
        delete_after_sync: false,
        dry_run: false,
    }
}

pub fn coordinator(
    source: &Arc<MockSource>,
    sink: &Arc<MockSink>,
    storage: &Arc<MemoryCheckpointStorage>,
    settings: SyncSettings,
) -> SyncCoordinator {
    SyncCoordinator::new(
        source.clone(),
        sink.clone(),
        CheckpointStore::new(storage.clone()),
        settings,
    )
}

/// Odoo stand-in holding records in memory
#[derive(Default)]
pub struct MockSource {
    records: Mutex<Vec<Record>>,
    pub queries: Mutex<Vec<SearchQuery>>,
    pub unlinked: Mutex<Vec<RecordId>>,
    pub fields_get_calls: Mutex<usize>,
    pub reject_login: bool,
    pub fail_unlink: bool,
    pub fail_search_after: Option<usize>,
}

impl MockSource {
    pub fn with_records(records: Vec<Record>) -> Self {
        Self {
            records: Mutex::new(records),
            ..Default::default()
        }
    }

    pub fn search_calls(&self) -> usize {
        self.queries.lock().unwrap().len()
    }

    pub fn remaining_ids(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self
            .records
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.id.value())
            .collect();
        ids.sort_unstable();
        ids
    }

    pub fn add(&self, record: Record) {
        self.records.lock().unwrap().push(record);
    }
}

#[async_trait]
impl RecordSource for MockSource {
    async fn authenticate(&self) -> Result<()> {
        if self.reject_login {
            return Err(SourceError::AuthenticationFailed("Access Denied".to_string()).into());
        }
        Ok(())
    }

    async fn search_read(&self, _model: &ModelName, query: &SearchQuery) -> Result<Vec<Record>> {
        let calls = {
            let mut queries = self.queries.lock().unwrap();
            queries.push(query.clone());
            queries.len()
        };
        if let Some(limit) = self.fail_search_after {
            if calls > limit {
                return Err(SourceError::ConnectionFailed("connection reset".to_string()).into());
            }
        }

        let mut matching: Vec<Record> = self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| query.window.contains(&r.create_date))
            .cloned()
            .collect();
        matching.sort_by(|a, b| (a.create_date, a.id).cmp(&(b.create_date, b.id)));

        Ok(matching
            .into_iter()
            .skip(query.offset)
            .take(query.limit)
            .collect())
    }

    async fn unlink(&self, _model: &ModelName, ids: &[RecordId]) -> Result<()> {
        if self.fail_unlink {
            return Err(SourceError::DeleteFailed("Record is locked".to_string()).into());
        }
        let doomed: HashSet<RecordId> = ids.iter().copied().collect();
        self.records.lock().unwrap().retain(|r| !doomed.contains(&r.id));
        self.unlinked.lock().unwrap().extend_from_slice(ids);
        Ok(())
    }

    async fn fields_get(&self, _model: &ModelName) -> Result<BTreeMap<String, String>> {
        *self.fields_get_calls.lock().unwrap() += 1;
        Ok(BTreeMap::from([
            ("id".to_string(), "integer".to_string()),
            ("create_date".to_string(), "datetime".to_string()),
            ("name".to_string(), "char".to_string()),
            ("amount_total".to_string(), "monetary".to_string()),
            ("partner_id".to_string(), "many2one".to_string()),
        ]))
    }

    fn describe(&self) -> String {
        "mock odoo".to_string()
    }
}

/// Warehouse stand-in
///
/// `rows == None` means the table does not exist. Rows with an insert id
/// already stored are accepted but not duplicated, like streaming insert
/// deduplication.
pub struct MockSink {
    rows: Mutex<Option<Vec<(String, serde_json::Map<String, serde_json::Value>)>>>,
    pub reject_ids: HashSet<i64>,
    pub insert_calls: Mutex<usize>,
    pub queries: Mutex<Vec<String>>,
    pub fail_inserts: bool,
}

impl MockSink {
    pub fn empty_table() -> Self {
        Self::with_table(Some(Vec::new()))
    }

    pub fn missing_table() -> Self {
        Self::with_table(None)
    }

    fn with_table(rows: Option<Vec<(String, serde_json::Map<String, serde_json::Value>)>>) -> Self {
        Self {
            rows: Mutex::new(rows),
            reject_ids: HashSet::new(),
            insert_calls: Mutex::new(0),
            queries: Mutex::new(Vec::new()),
            fail_inserts: false,
        }
    }

    /// Seeds the table with already-synced ids
    pub fn with_existing(ids: &[i64]) -> Self {
        let rows = ids
            .iter()
            .map(|id| {
                let mut json = serde_json::Map::new();
                json.insert("id".to_string(), json!(id));
                (format!("{MODEL}_{id}"), json)
            })
            .collect();
        Self::with_table(Some(rows))
    }

    /// Stored ids in insertion order
    pub fn stored_ids(&self) -> Vec<i64> {
        self
            .rows
            .lock()
            .unwrap()
            .as_ref()
            .map(|rows| {
                rows.iter()
                    .filter_map(|(_, json)| json.get("id").and_then(|v| v.as_i64()))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn stored_row(&self, id: i64) -> Option<serde_json::Map<String, serde_json::Value>> {
        self.rows.lock().unwrap().as_ref().and_then(|rows| {
            rows.iter()
                .find(|(_, json)| json.get("id").and_then(|v| v.as_i64()) == Some(id))
                .map(|(_, json)| json.clone())
        })
    }

    pub fn insert_calls(&self) -> usize {
        *self.insert_calls.lock().unwrap()
    }
}

#[async_trait]
impl TableSink for MockSink {
    async fn table_exists(&self, _table: &TableId) -> Result<bool> {
        Ok(self.rows.lock().unwrap().is_some())
    }

    async fn query(&self, sql: &str) -> Result<Vec<Vec<serde_json::Value>>> {
        self.queries.lock().unwrap().push(sql.to_string());
        let rows = self.rows.lock().unwrap();
        let Some(rows) = rows.as_ref() else {
            return Err(SinkError::TableNotFound(TABLE.to_string()).into());
        };
        // ids come back as strings, like the REST API
        Ok(rows
            .iter()
            .filter_map(|(_, json)| json.get("id"))
            .map(|id| vec![json!(id.to_string())])
            .collect())
    }

    async fn insert_rows(&self, _table: &TableId, rows: Vec<InsertRow>) -> Result<BulkInsertResult> {
        *self.insert_calls.lock().unwrap() += 1;
        if self.fail_inserts {
            return Err(FerryError::from(SinkError::ServerError {
                status: 503,
                message: "backend unavailable".to_string(),
            }));
        }

        let mut stored = self.rows.lock().unwrap();
        let Some(table) = stored.as_mut() else {
            return Err(SinkError::TableNotFound(TABLE.to_string()).into());
        };

        let mut result = BulkInsertResult {
            attempted: rows.len(),
            failures: Vec::new(),
        };
        for (index, row) in rows.into_iter().enumerate() {
            let id = row.json.get("id").and_then(|v| v.as_i64()).unwrap_or_default();
            if self.reject_ids.contains(&id) {
                result.failures.push(BulkInsertFailure {
                    index,
                    insert_id: row.insert_id,
                    reason: "amount_total - invalid: Cannot convert value".to_string(),
                });
                continue;
            }
            let key = row.insert_id.as_str().to_string();
            if !table.iter().any(|(existing, _)| *existing == key) {
                table.push((key, row.json));
            }
        }
        Ok(result)
    }
}

/// Checkpoint storage in memory
#[derive(Default)]
pub struct MemoryCheckpointStorage {
    pub content: Mutex<Option<Vec<u8>>>,
    pub writes: Mutex<usize>,
    pub fail_writes: bool,
}

impl MemoryCheckpointStorage {
    pub fn with_document(document: serde_json::Value) -> Self {
        Self {
            content: Mutex::new(Some(serde_json::to_vec(&document).unwrap())),
            ..Default::default()
        }
    }

    pub fn document(&self) -> Option<serde_json::Value> {
        self.content
            .lock()
            .unwrap()
            .as_ref()
            .map(|bytes| serde_json::from_slice(bytes).unwrap())
    }

    pub fn writes(&self) -> usize {
        *self.writes.lock().unwrap()
    }
}

#[async_trait]
impl CheckpointStorage for MemoryCheckpointStorage {
    async fn read(&self) -> Result<Option<Vec<u8>>> {
        Ok(self.content.lock().unwrap().clone())
    }

    async fn write(&self, bytes: &[u8]) -> Result<()> {
        if self.fail_writes {
            return Err(FerryError::Io("disk full".to_string()));
        }
        *self.content.lock().unwrap() = Some(bytes.to_vec());
        *self.writes.lock().unwrap() += 1;
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}
