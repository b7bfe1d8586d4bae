//! Batch fetching
//!
//! Offset-paginated reads against the record source, wrapped in a cursor the
//! coordinator pulls from one batch at a time.

use crate::adapters::traits::{RecordSource, SearchQuery};
use crate::core::sync::window::SyncWindow;
use crate::domain::ids::{ModelName, RecordId};
use crate::domain::record::Record;
use crate::domain::Result;
use chrono::{DateTime, Utc};

/// Fetches one page of records ordered by `create_date asc, id asc`
///
/// An empty result means the window is exhausted.
pub async fn fetch_batch(
    source: &dyn RecordSource,
    model: &ModelName,
    window: &SyncWindow,
    offset: usize,
    limit: usize,
) -> Result<Vec<Record>> {
    let query = SearchQuery {
        window: *window,
        offset,
        limit,
    };
    source.search_read(model, &query).await
}

/// Cursor over the batches of one window
///
/// The caller moves the offset with [`BatchCursor::advance`] by the number of
/// fetched records still in the source, so records this job deletes do not
/// shift later pages. Records created inside the window by someone else
/// mid-run still can.
#[derive(Debug, Clone)]
pub struct BatchCursor {
    model: ModelName,
    window: SyncWindow,
    offset: usize,
    limit: usize,
    last_key: Option<(DateTime<Utc>, RecordId)>,
    exhausted: bool,
}

impl BatchCursor {
    /// Creates a cursor at offset zero
    pub fn new(model: ModelName, window: SyncWindow, limit: usize) -> Self {
        Self {
            model,
            window,
            offset: 0,
            limit,
            last_key: None,
            exhausted: false,
        }
    }

    /// Offset of the next fetch
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Whether an empty page has been seen
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Fetches the next batch, `None` once the window is exhausted
    ///
    /// Does not move the offset. Logs a warning when the source returns
    /// records that do not sort after the previous batch.
    pub async fn next_batch(&mut self, source: &dyn RecordSource) -> Result<Option<Vec<Record>>> {
        if self.exhausted {
            return Ok(None);
        }

        let batch = fetch_batch(source, &self.model, &self.window, self.offset, self.limit).await?;
        if batch.is_empty() {
            self.exhausted = true;
            return Ok(None);
        }

        self.check_ordering(&batch);
        if let Some(last) = batch.last() {
            self.last_key = Some((last.create_date, last.id));
        }

        Ok(Some(batch))
    }

    /// Skips past `remaining` records of the last batch
    ///
    /// `remaining` is the batch size minus the records deleted from the
    /// source after it was fetched.
    pub fn advance(&mut self, remaining: usize) {
        self.offset += remaining;
    }

    fn check_ordering(&self, batch: &[Record]) {
        let mut previous = self.last_key;
        for record in batch {
            let key = (record.create_date, record.id);
            if let Some(prev) = previous {
                if key <= prev {
                    tracing::warn!(
                        model = %self.model,
                        record_id = %record.id,
                        create_date = %record.create_date,
                        previous_id = %prev.1,
                        previous_create_date = %prev.0,
                        offset = self.offset,
                        "Source returned records out of order; offset pagination may skip or repeat records"
                    );
                    return;
                }
            }
            previous = Some(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use serde_json::json;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    struct PagedSource {
        records: Vec<Record>,
        queries: Mutex<Vec<SearchQuery>>,
    }

    #[async_trait]
    impl RecordSource for PagedSource {
        async fn authenticate(&self) -> Result<()> {
            Ok(())
        }

        async fn search_read(&self, _model: &ModelName, query: &SearchQuery) -> Result<Vec<Record>> {
            self.queries.lock().unwrap().push(query.clone());
            Ok(self
                .records
                .iter()
                .skip(query.offset)
                .take(query.limit)
                .cloned()
                .collect())
        }

        async fn unlink(&self, _model: &ModelName, _ids: &[RecordId]) -> Result<()> {
            Ok(())
        }

        async fn fields_get(&self, _model: &ModelName) -> Result<BTreeMap<String, String>> {
            Ok(BTreeMap::new())
        }

        fn describe(&self) -> String {
            "paged".to_string()
        }
    }

    fn record(id: i64, create_date: &str) -> Record {
        Record::from_json(json!({"id": id, "create_date": create_date})).unwrap()
    }

    fn window() -> SyncWindow {
        SyncWindow {
            start: None,
            end: Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_cursor_pages_until_empty() {
        let source = PagedSource {
            records: (1..=5)
                .map(|i| record(i, &format!("2025-01-0{i} 00:00:00")))
                .collect(),
            queries: Mutex::new(Vec::new()),
        };
        let mut cursor = BatchCursor::new(ModelName::new("sale.order").unwrap(), window(), 2);

        let mut seen = Vec::new();
        while let Some(batch) = cursor.next_batch(&source).await.unwrap() {
            cursor.advance(batch.len());
            seen.extend(batch.into_iter().map(|r| r.id.value()));
        }

        assert_eq!(seen, vec![1, 2, 3, 4, 5]);
        assert!(cursor.is_exhausted());
        assert_eq!(cursor.offset(), 5);

        let offsets: Vec<usize> = source
            .queries
            .lock()
            .unwrap()
            .iter()
            .map(|q| q.offset)
            .collect();
        assert_eq!(offsets, vec![0, 2, 4, 5]);

        // Exhausted cursors don't query again
        assert!(cursor.next_batch(&source).await.unwrap().is_none());
        assert_eq!(source.queries.lock().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_cursor_stays_put_when_batch_is_removed() {
        let source = PagedSource {
            records: (1..=3)
                .map(|i| record(i, &format!("2025-01-0{i} 00:00:00")))
                .collect(),
            queries: Mutex::new(Vec::new()),
        };
        let mut cursor = BatchCursor::new(ModelName::new("sale.order").unwrap(), window(), 2);

        let first = cursor.next_batch(&source).await.unwrap().unwrap();
        assert_eq!(first.len(), 2);
        cursor.advance(0);
        assert_eq!(cursor.offset(), 0);

        cursor.advance(1);
        cursor.next_batch(&source).await.unwrap();
        let offsets: Vec<usize> = source
            .queries
            .lock()
            .unwrap()
            .iter()
            .map(|q| q.offset)
            .collect();
        assert_eq!(offsets, vec![0, 1]);
    }

    #[tokio::test]
    async fn test_cursor_tolerates_out_of_order_source() {
        let source = PagedSource {
            records: vec![
                record(2, "2025-01-02 00:00:00"),
                record(1, "2025-01-01 00:00:00"),
            ],
            queries: Mutex::new(Vec::new()),
        };
        let mut cursor = BatchCursor::new(ModelName::new("sale.order").unwrap(), window(), 10);

        let batch = cursor.next_batch(&source).await.unwrap().unwrap();
        assert_eq!(batch.len(), 2);
    }
}
