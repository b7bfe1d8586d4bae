//! Google Cloud REST API models
//!
//! Request and response bodies for the BigQuery v2 API and the metadata
//! server token endpoint. Field names follow the APIs' camelCase.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `jobs.query` request
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    pub query: String,
    pub use_legacy_sql: bool,
    pub max_results: u32,
    pub timeout_ms: u64,
}

/// `jobs.query` and `jobs.getQueryResults` response
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    #[serde(default)]
    pub job_complete: bool,
    #[serde(default)]
    pub job_reference: Option<JobReference>,
    #[serde(default)]
    pub rows: Vec<TableRow>,
    #[serde(default)]
    pub page_token: Option<String>,
}

/// Identifies a query job
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobReference {
    pub project_id: String,
    pub job_id: String,
    #[serde(default)]
    pub location: Option<String>,
}

/// One result row: `{"f": [{"v": ...}, ...]}`
#[derive(Debug, Clone, Deserialize)]
pub struct TableRow {
    #[serde(default)]
    pub f: Vec<TableCell>,
}

/// One result cell
#[derive(Debug, Clone, Deserialize)]
pub struct TableCell {
    #[serde(default)]
    pub v: Value,
}

impl TableRow {
    /// Cell values in column order
    pub fn into_values(self) -> Vec<Value> {
        self.f.into_iter().map(|cell| cell.v).collect()
    }
}

/// `tabledata.insertAll` request
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertAllRequest {
    pub skip_invalid_rows: bool,
    pub ignore_unknown_values: bool,
    pub rows: Vec<InsertAllRow>,
}

/// One row of an insert request
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertAllRow {
    pub insert_id: String,
    pub json: serde_json::Map<String, Value>,
}

/// `tabledata.insertAll` response
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertAllResponse {
    #[serde(default)]
    pub insert_errors: Vec<RowInsertErrors>,
}

/// Errors for one rejected row
#[derive(Debug, Clone, Deserialize)]
pub struct RowInsertErrors {
    pub index: usize,
    #[serde(default)]
    pub errors: Vec<ErrorProto>,
}

/// A single error detail
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorProto {
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub message: String,
}

impl RowInsertErrors {
    /// `location - reason: message` for every detail, joined
    pub fn describe(&self) -> String {
        if self.errors.is_empty() {
            return "unknown error".to_string();
        }
        self.errors
            .iter()
            .map(|e| {
                let location = if e.location.is_empty() { "unknown" } else { &e.location };
                format!("{location} - {}: {}", e.reason, e.message)
            })
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Error envelope of Google APIs
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

/// Body of an error envelope
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub code: u16,
    #[serde(default)]
    pub message: String,
}

/// Metadata server token answer
#[derive(Debug, Clone, Deserialize)]
pub struct MetadataToken {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: u64,
}

/// Extracts the API error message from a response body, or returns it as-is
pub fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorResponse>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_response_rows() {
        let response: QueryResponse = serde_json::from_value(json!({
            "kind": "bigquery#queryResponse",
            "jobComplete": true,
            "jobReference": {"projectId": "proj", "jobId": "job_1", "location": "EU"},
            "rows": [{"f": [{"v": "1"}]}, {"f": [{"v": "2"}]}],
            "pageToken": "next"
        }))
        .unwrap();

        assert!(response.job_complete);
        assert_eq!(response.page_token.as_deref(), Some("next"));
        let values: Vec<Vec<Value>> = response.rows.into_iter().map(TableRow::into_values).collect();
        assert_eq!(values, vec![vec![json!("1")], vec![json!("2")]]);
    }

    #[test]
    fn test_insert_errors_describe() {
        let response: InsertAllResponse = serde_json::from_value(json!({
            "insertErrors": [{
                "index": 2,
                "errors": [{"reason": "invalid", "location": "amount_total", "message": "Cannot convert value to floating point"}]
            }]
        }))
        .unwrap();

        assert_eq!(response.insert_errors[0].index, 2);
        assert_eq!(
            response.insert_errors[0].describe(),
            "amount_total - invalid: Cannot convert value to floating point"
        );
    }

    #[test]
    fn test_error_message() {
        let body = r#"{"error": {"code": 404, "message": "Not found: Table proj:erp.x", "status": "NOT_FOUND"}}"#;
        assert_eq!(error_message(body), "Not found: Table proj:erp.x");
        assert_eq!(error_message("plain text"), "plain text");
    }
}
