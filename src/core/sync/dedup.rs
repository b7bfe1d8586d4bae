//! Existing-ID index
//!
//! Loads the primary keys already present in the destination table for the
//! run's window, so records that were synced before are skipped rather than
//! inserted again.

use crate::adapters::traits::TableSink;
use crate::core::sync::window::SyncWindow;
use crate::domain::errors::{FerryError, SinkError};
use crate::domain::ids::{RecordId, TableId};
use crate::domain::record::format_odoo_datetime;
use crate::domain::Result;
use std::collections::HashSet;

/// Primary keys known to be in the sink
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExistingIdSet(HashSet<RecordId>);

impl ExistingIdSet {
    /// Whether the id is already in the sink
    pub fn contains(&self, id: &RecordId) -> bool {
        self.0.contains(id)
    }

    /// Records an id as present
    pub fn insert(&mut self, id: RecordId) -> bool {
        self.0.insert(id)
    }

    /// Number of known ids
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<RecordId> for ExistingIdSet {
    fn from_iter<I: IntoIterator<Item = RecordId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Outcome of loading the index
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExistingIdLookup {
    /// The destination table does not exist
    TableAbsent,
    /// The table exists; these ids are already present
    Loaded(ExistingIdSet),
}

/// Builds the id query for a window
///
/// An unbounded window scans the whole table. `create_date` holds the source's `YYYY-MM-DD HH:MM:SS` text, which sorts
/// chronologically, so string comparison bounds the scan.
pub fn existing_ids_sql(table: &TableId, window: &SyncWindow) -> String {
    let mut sql = format!("SELECT id FROM {}", table.quoted());
    if let Some(start) = window.start {
        sql.push_str(&format!(
            " WHERE create_date >= '{}' AND create_date < '{}'",
            format_odoo_datetime(&start),
            format_odoo_datetime(&window.end)
        ));
    }
    sql
}

/// Loads the ids already present in the sink for the window
///
/// Returns `TableAbsent` when the sink reports the table missing, as distinct
/// from an empty `Loaded` set.
pub async fn load_existing_ids(
    sink: &dyn TableSink,
    table: &TableId,
    window: &SyncWindow,
) -> Result<ExistingIdLookup> {
    let sql = existing_ids_sql(table, window);
    tracing::debug!(sql = %sql, "Loading existing ids");

    let rows = match sink.query(&sql).await {
        Ok(rows) => rows,
        Err(FerryError::Sink(SinkError::TableNotFound(_))) => {
            return Ok(ExistingIdLookup::TableAbsent);
        }
        Err(e) => return Err(e),
    };

    let mut ids = ExistingIdSet::default();
    let mut unparseable = 0usize;
    for row in &rows {
        match row.first().and_then(parse_id_cell) {
            Some(id) => {
                ids.insert(id);
            }
            None => unparseable += 1,
        }
    }

    if unparseable > 0 {
        tracing::warn!(
            table = %table,
            unparseable,
            "Ignored id cells that are not integers"
        );
    }

    tracing::info!(table = %table, existing_ids = ids.len(), "Loaded existing ids");
    Ok(ExistingIdLookup::Loaded(ids))
}

// BigQuery returns INT64 cells as strings
fn parse_id_cell(cell: &serde_json::Value) -> Option<RecordId> {
    match cell {
        serde_json::Value::Number(n) => n.as_i64().map(RecordId::new),
        serde_json::Value::String(s) => s.trim().parse::<i64>().ok().map(RecordId::new),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::traits::{BulkInsertResult, InsertRow};
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    struct QuerySink {
        result: std::result::Result<Vec<Vec<serde_json::Value>>, String>,
    }

    #[async_trait]
    impl TableSink for QuerySink {
        async fn table_exists(&self, _table: &TableId) -> Result<bool> {
            Ok(self.result.is_ok())
        }

        async fn query(&self, _sql: &str) -> Result<Vec<Vec<serde_json::Value>>> {
            self.result
                .clone()
                .map_err(|t| SinkError::TableNotFound(t).into())
        }

        async fn insert_rows(
            &self,
            _table: &TableId,
            _rows: Vec<InsertRow>,
        ) -> Result<BulkInsertResult> {
            Ok(BulkInsertResult::default())
        }
    }

    fn table() -> TableId {
        TableId::parse("proj.erp.sale_order").unwrap()
    }

    #[test]
    fn test_sql_bounded_window() {
        let window = SyncWindow {
            start: Some(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()),
            end: Utc.with_ymd_and_hms(2025, 1, 8, 0, 0, 0).unwrap(),
        };
        assert_eq!(
            existing_ids_sql(&table(), &window),
            "SELECT id FROM `proj.erp.sale_order` WHERE create_date >= '2025-01-01 00:00:00' AND create_date < '2025-01-08 00:00:00'"
        );
    }

    #[test]
    fn test_sql_unbounded_window_scans_whole_table() {
        let window = SyncWindow {
            start: None,
            end: Utc.with_ymd_and_hms(2025, 1, 8, 0, 0, 0).unwrap(),
        };
        assert_eq!(
            existing_ids_sql(&table(), &window),
            "SELECT id FROM `proj.erp.sale_order`"
        );
    }

    #[tokio::test]
    async fn test_load_existing_ids() {
        let sink = QuerySink {
            result: Ok(vec![vec![json!("2")], vec![json!(5)], vec![json!(null)]]),
        };
        let window = SyncWindow {
            start: None,
            end: Utc::now(),
        };

        let lookup = load_existing_ids(&sink, &table(), &window).await.unwrap();
        let ExistingIdLookup::Loaded(ids) = lookup else {
            panic!("expected loaded ids");
        };
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&RecordId::new(2)));
        assert!(ids.contains(&RecordId::new(5)));
    }

    #[tokio::test]
    async fn test_table_absent_distinct_from_empty() {
        let window = SyncWindow {
            start: None,
            end: Utc::now(),
        };

        let missing = QuerySink {
            result: Err("proj.erp.sale_order".to_string()),
        };
        assert_eq!(
            load_existing_ids(&missing, &table(), &window).await.unwrap(),
            ExistingIdLookup::TableAbsent
        );

        let empty = QuerySink { result: Ok(vec![]) };
        assert_eq!(
            load_existing_ids(&empty, &table(), &window).await.unwrap(),
            ExistingIdLookup::Loaded(ExistingIdSet::default())
        );
    }
}
