//! BigQuery table sink
//!
//! REST client for the BigQuery v2 API: `tables.get` for the existence probe,
//! `jobs.query` plus `jobs.getQueryResults` for reads, and
//! `tabledata.insertAll` for streaming inserts keyed by insert id.

use super::auth::TokenProvider;
use super::models::{
    error_message, InsertAllRequest, InsertAllResponse, InsertAllRow, QueryRequest, QueryResponse,
    TableRow,
};
use crate::adapters::retry::retry_request;
use crate::adapters::traits::{BulkInsertFailure, BulkInsertResult, InsertRow, TableSink};
use crate::config::{BigQueryConfig, RetryConfig};
use crate::domain::errors::{FerryError, SinkError};
use crate::domain::ids::TableId;
use crate::domain::Result;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

// Server-side wait per query call before falling back to polling
const QUERY_TIMEOUT_MS: u64 = 10_000;

/// Which call failed, for error classification
#[derive(Debug, Clone, Copy)]
enum Call {
    Table,
    Query,
    Insert,
}

/// BigQuery REST client
pub struct BigQueryClient {
    api_base_url: String,
    project: String,
    client: Client,
    auth: Arc<TokenProvider>,
    retry: RetryConfig,
    page_size: u32,
}

impl BigQueryClient {
    /// Create a new client
    ///
    /// Queries run as jobs in `project`, normally the destination table's
    /// project.
    pub fn new(
        config: &BigQueryConfig,
        project: impl Into<String>,
        client: Client,
        auth: Arc<TokenProvider>,
    ) -> Self {
        Self {
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            project: project.into(),
            client,
            auth,
            retry: config.retry.clone(),
            page_size: config.query_page_size,
        }
    }

    fn table_url(&self, table: &TableId) -> String {
        format!(
            "{}/projects/{}/datasets/{}/tables/{}",
            self.api_base_url,
            table.project(),
            table.dataset(),
            table.table()
        )
    }

    async fn send(&self, request: RequestBuilder, call: Call) -> Result<Response> {
        let token = self.auth.token().await?;
        let resp = request.bearer_auth(token).send().await.map_err(|e| {
            if e.is_timeout() {
                SinkError::Timeout(e.to_string())
            } else {
                SinkError::ConnectionFailed(e.to_string())
            }
        })?;

        if resp.status().is_success() {
            return Ok(resp);
        }

        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        Err(classify(status, &body, call).into())
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder, call: Call) -> Result<T> {
        self.send(request, call)
            .await?
            .json::<T>()
            .await
            .map_err(|e| SinkError::DeserializationFailed(e.to_string()).into())
    }

    async fn run_query(&self, sql: &str) -> Result<QueryResponse> {
        let url = format!("{}/projects/{}/queries", self.api_base_url, self.project);
        let body = QueryRequest {
            query: sql.to_string(),
            use_legacy_sql: false,
            max_results: self.page_size,
            timeout_ms: QUERY_TIMEOUT_MS,
        };

        retry_request(&self.retry, || async {
            self.send_json(self.client.post(&url).json(&body), Call::Query)
                .await
        })
        .await
    }

    async fn query_results(
        &self,
        project_id: &str,
        job_id: &str,
        location: Option<&str>,
        page_token: Option<&str>,
    ) -> Result<QueryResponse> {
        let url = format!("{}/projects/{project_id}/queries/{job_id}", self.api_base_url);
        let mut params: Vec<(&str, String)> = vec![
            ("maxResults", self.page_size.to_string()),
            ("timeoutMs", QUERY_TIMEOUT_MS.to_string()),
        ];
        if let Some(location) = location {
            params.push(("location", location.to_string()));
        }
        if let Some(token) = page_token {
            params.push(("pageToken", token.to_string()));
        }

        retry_request(&self.retry, || async {
            self.send_json(self.client.get(&url).query(&params), Call::Query)
                .await
        })
        .await
    }
}

fn classify(status: StatusCode, body: &str, call: Call) -> SinkError {
    let message = error_message(body);
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => SinkError::AuthenticationFailed(message),
        StatusCode::NOT_FOUND => SinkError::TableNotFound(message),
        s if s.is_server_error() => SinkError::ServerError {
            status: s.as_u16(),
            message,
        },
        s => match call {
            Call::Insert => SinkError::InsertFailed(format!("{s}: {message}")),
            Call::Table | Call::Query => SinkError::QueryFailed(format!("{s}: {message}")),
        },
    }
}

#[async_trait]
impl TableSink for BigQueryClient {
    async fn table_exists(&self, table: &TableId) -> Result<bool> {
        let url = self.table_url(table);
        let result = retry_request(&self.retry, || async {
            self.send(self.client.get(&url), Call::Table).await
        })
        .await;

        match result {
            Ok(_) => {
                tracing::info!(table = %table, "Destination table found");
                Ok(true)
            }
            Err(FerryError::Sink(SinkError::TableNotFound(_))) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn query(&self, sql: &str) -> Result<Vec<Vec<Value>>> {
        let mut response = self.run_query(sql).await?;
        let mut rows: Vec<Vec<Value>> = Vec::new();

        loop {
            let page_token = response.page_token.take();
            let complete = response.job_complete;
            rows.extend(response.rows.drain(..).map(TableRow::into_values));

            if complete && page_token.is_none() {
                break;
            }

            let job = response.job_reference.take().ok_or_else(|| {
                FerryError::from(SinkError::DeserializationFailed(
                    "Query response has no job reference".to_string(),
                ))
            })?;

            tracing::debug!(job_id = %job.job_id, rows = rows.len(), "Fetching next query page");
            response = self
                .query_results(
                    &job.project_id,
                    &job.job_id,
                    job.location.as_deref(),
                    page_token.as_deref(),
                )
                .await?;
            if response.job_reference.is_none() {
                response.job_reference = Some(job);
            }
        }

        Ok(rows)
    }

    async fn insert_rows(&self, table: &TableId, rows: Vec<InsertRow>) -> Result<BulkInsertResult> {
        let attempted = rows.len();
        if attempted == 0 {
            return Ok(BulkInsertResult::default());
        }

        let insert_ids: Vec<_> = rows.iter().map(|r| r.insert_id.clone()).collect();
        let url = format!("{}/insertAll", self.table_url(table));
        let body = InsertAllRequest {
            skip_invalid_rows: true,
            ignore_unknown_values: false,
            rows: rows
                .into_iter()
                .map(|row| InsertAllRow {
                    insert_id: row.insert_id.as_str().to_string(),
                    json: row.json,
                })
                .collect(),
        };

        let response: InsertAllResponse = retry_request(&self.retry, || async {
            self.send_json(self.client.post(&url).json(&body), Call::Insert)
                .await
        })
        .await?;

        let mut result = BulkInsertResult {
            attempted,
            failures: Vec::with_capacity(response.insert_errors.len()),
        };
        for row_errors in &response.insert_errors {
            let Some(insert_id) = insert_ids.get(row_errors.index) else {
                tracing::warn!(index = row_errors.index, "Insert error for unknown row index");
                continue;
            };
            result.failures.push(BulkInsertFailure {
                index: row_errors.index,
                insert_id: insert_id.clone(),
                reason: row_errors.describe(),
            });
        }

        tracing::info!(
            table = %table,
            attempted,
            inserted = result.success_count(),
            failed = result.failure_count(),
            "Inserted rows"
        );

        Ok(result)
    }
}
