//! Collaborator abstraction traits
//!
//! This module defines the traits that the record source, table sink and
//! checkpoint storage adapters must implement to work with Ferry.

use crate::core::sync::window::SyncWindow;
use crate::domain::ids::{InsertId, ModelName, RecordId, TableId};
use crate::domain::record::{format_odoo_datetime, Record};
use crate::domain::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;

/// Fetch ordering: `create_date` first, `id` as tiebreaker
pub const FETCH_ORDER: &str = "create_date asc, id asc";

/// A paginated, ordered range query against the record source
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    /// Half-open `create_date` window
    pub window: SyncWindow,

    /// Number of matching records to skip
    pub offset: usize,

    /// Maximum number of records to return
    pub limit: usize,
}

impl SearchQuery {
    /// Builds the Odoo search domain for the window
    ///
    /// `create_date >= start AND create_date < end`; the lower bound is
    /// omitted when the window is unbounded.
    pub fn domain(&self) -> serde_json::Value {
        let mut clauses = Vec::with_capacity(2);
        if let Some(start) = self.window.start {
            clauses.push(serde_json::json!([
                "create_date",
                ">=",
                format_odoo_datetime(&start)
            ]));
        }
        clauses.push(serde_json::json!([
            "create_date",
            "<",
            format_odoo_datetime(&self.window.end)
        ]));
        serde_json::Value::Array(clauses)
    }

    /// Sort order for the query
    pub fn order(&self) -> &'static str {
        FETCH_ORDER
    }
}

/// Record source trait
///
/// Implemented by the ERP adapter. All calls are awaited in sequence by the
/// sync loop.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Authenticate against the source
    ///
    /// # Errors
    ///
    /// Returns an authentication error if the credentials are rejected.
    async fn authenticate(&self) -> Result<()>;

    /// Read one page of records matching the query, in `FETCH_ORDER`
    async fn search_read(&self, model: &ModelName, query: &SearchQuery) -> Result<Vec<Record>>;

    /// Delete records by id
    async fn unlink(&self, model: &ModelName, ids: &[RecordId]) -> Result<()>;

    /// Field metadata for a model: field name to field type
    async fn fields_get(&self, model: &ModelName) -> Result<BTreeMap<String, String>>;

    /// Human-readable description of the source
    fn describe(&self) -> String;
}

/// A row ready for insertion, with its idempotency key
#[derive(Debug, Clone)]
pub struct InsertRow {
    /// Deduplication key the warehouse uses for retried inserts
    pub insert_id: InsertId,

    /// Row payload
    pub json: serde_json::Map<String, serde_json::Value>,
}

/// Result of a bulk insert operation
#[derive(Debug, Clone, Default)]
pub struct BulkInsertResult {
    /// Number of rows sent in the request
    pub attempted: usize,

    /// Details of rows the warehouse rejected
    pub failures: Vec<BulkInsertFailure>,
}

impl BulkInsertResult {
    /// Number of rows accepted
    pub fn success_count(&self) -> usize {
        self.attempted.saturating_sub(self.failures.len())
    }

    /// Number of rows rejected
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    /// Looks up the failure for a row index, if any
    pub fn failure_at(&self, index: usize) -> Option<&BulkInsertFailure> {
        self.failures.iter().find(|f| f.index == index)
    }
}

/// Details of a rejected row
#[derive(Debug, Clone)]
pub struct BulkInsertFailure {
    /// Position of the row in the request
    pub index: usize,

    /// Insert id of the rejected row
    pub insert_id: InsertId,

    /// Error message reported by the warehouse
    pub reason: String,
}

/// Table sink trait
///
/// Implemented by the warehouse adapter.
#[async_trait]
pub trait TableSink: Send + Sync {
    /// Check whether the table exists
    async fn table_exists(&self, table: &TableId) -> Result<bool>;

    /// Run a read query and return every result row as a list of cell values
    ///
    /// Implementations page through results until exhausted.
    async fn query(&self, sql: &str) -> Result<Vec<Vec<serde_json::Value>>>;

    /// Insert rows in a single request
    ///
    /// A returned error means the whole request failed; per-row rejections
    /// are reported in the result.
    async fn insert_rows(&self, table: &TableId, rows: Vec<InsertRow>) -> Result<BulkInsertResult>;
}

/// Checkpoint storage trait
///
/// Reads and writes the raw checkpoint document.
#[async_trait]
pub trait CheckpointStorage: Send + Sync {
    /// Read the document, `None` if it does not exist
    async fn read(&self) -> Result<Option<Vec<u8>>>;

    /// Replace the document
    async fn write(&self, bytes: &[u8]) -> Result<()>;

    /// Human-readable location, e.g. a path or `gs://bucket/key`
    fn location(&self) -> String;
}
