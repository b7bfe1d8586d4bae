//! Odoo JSON-RPC client
//!
//! Talks to `POST {url}/jsonrpc` using the `common` service for login and
//! `object.execute_kw` for model methods. The user id from the first
//! successful login is reused for every later call.

use super::models::{FieldInfo, RpcRequest, RpcResponse};
use crate::adapters::retry::retry_request;
use crate::adapters::traits::{RecordSource, SearchQuery};
use crate::config::{OdooConfig, RetryConfig, SecretString};
use crate::domain::errors::{FerryError, SourceError};
use crate::domain::ids::{ModelName, RecordId};
use crate::domain::record::Record;
use crate::domain::Result;
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use secrecy::ExposeSecret;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

/// Odoo record source
///
/// # Example
///
/// ```no_run
/// use ferry::adapters::odoo::OdooClient;
/// use ferry::adapters::traits::RecordSource;
/// use ferry::config::{secret_string, OdooConfig};
///
/// # async fn example() -> ferry::domain::Result<()> {
/// let config = OdooConfig {
///     url: "https://erp.example.com".to_string(),
///     database: "production".to_string(),
///     username: "sync@example.com".to_string(),
///     password: Some(secret_string("api-key".to_string())),
///     ..Default::default()
/// };
///
/// let client = OdooClient::new(&config)?;
/// client.authenticate().await?;
/// # Ok(())
/// # }
/// ```
pub struct OdooClient {
    endpoint: String,
    database: String,
    username: String,
    password: SecretString,
    client: Client,
    retry: RetryConfig,
    uid: Mutex<Option<i64>>,
    next_id: AtomicU64,
}

impl OdooClient {
    /// Create a new client from configuration
    ///
    /// # Errors
    ///
    /// Returns a configuration error when no password is set or the HTTP
    /// client cannot be built.
    pub fn new(config: &OdooConfig) -> Result<Self> {
        let password = config
            .password
            .clone()
            .ok_or_else(|| FerryError::Configuration("odoo.password is not set".to_string()))?;

        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| FerryError::Configuration(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            endpoint: format!("{}/jsonrpc", config.url.trim_end_matches('/')),
            database: config.database.clone(),
            username: config.username.clone(),
            password,
            client,
            retry: config.retry.clone(),
            uid: Mutex::new(None),
            next_id: AtomicU64::new(1),
        })
    }

    fn password(&self) -> &str {
        self.password.expose_secret().as_ref()
    }

    /// Invoke a service method, retrying transient failures
    async fn call(&self, service: &str, method: &str, args: Vec<Value>) -> Result<Value> {
        retry_request(&self.retry, || async {
            self.send(service, method, args.clone()).await
        })
        .await
    }

    async fn send(&self, service: &str, method: &str, args: Vec<Value>) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = RpcRequest::call(id, service, method, args);

        let resp = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SourceError::Timeout(e.to_string())
                } else {
                    SourceError::ConnectionFailed(e.to_string())
                }
            })?;

        let status = resp.status();
        if status.is_server_error() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SourceError::ServerError {
                status: status.as_u16(),
                message: body,
            }
            .into());
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SourceError::ClientError {
                status: status.as_u16(),
                message: body,
            }
            .into());
        }

        let response: RpcResponse = resp
            .json()
            .await
            .map_err(|e| SourceError::InvalidResponse(e.to_string()))?;

        if let Some(error) = response.error {
            if error.is_access_denied() {
                return Err(SourceError::AuthenticationFailed(error.describe()).into());
            }
            return Err(SourceError::Rpc {
                method: format!("{service}.{method}"),
                message: error.describe(),
            }
            .into());
        }

        response.result.ok_or_else(|| {
            FerryError::from(SourceError::InvalidResponse(format!(
                "{service}.{method} returned no result"
            )))
        })
    }

    /// Log in and cache the user id
    async fn login(&self) -> Result<i64> {
        let result = self
            .call(
                "common",
                "authenticate",
                vec![
                    json!(self.database),
                    json!(self.username),
                    json!(self.password()),
                    json!({}),
                ],
            )
            .await?;

        match result.as_i64() {
            Some(uid) => {
                tracing::info!(
                    endpoint = %self.endpoint,
                    database = %self.database,
                    uid,
                    "Authenticated with Odoo"
                );
                Ok(uid)
            }
            None => Err(SourceError::AuthenticationFailed(format!(
                "Odoo rejected the credentials of '{}' on database '{}'",
                self.username, self.database
            ))
            .into()),
        }
    }

    async fn uid(&self) -> Result<i64> {
        let mut guard = self.uid.lock().await;
        if let Some(uid) = *guard {
            return Ok(uid);
        }
        let uid = self.login().await?;
        *guard = Some(uid);
        Ok(uid)
    }

    /// Call a model method through `object.execute_kw`
    pub async fn execute_kw(
        &self,
        model: &ModelName,
        method: &str,
        args: Value,
        kwargs: Value,
    ) -> Result<Value> {
        let uid = self.uid().await?;
        self.call(
            "object",
            "execute_kw",
            vec![
                json!(self.database),
                json!(uid),
                json!(self.password()),
                json!(model.as_str()),
                json!(method),
                args,
                kwargs,
            ],
        )
        .await
    }
}

#[async_trait]
impl RecordSource for OdooClient {
    async fn authenticate(&self) -> Result<()> {
        self.uid().await.map(|_| ())
    }

    async fn search_read(&self, model: &ModelName, query: &SearchQuery) -> Result<Vec<Record>> {
        tracing::debug!(
            model = %model,
            offset = query.offset,
            limit = query.limit,
            "Fetching records"
        );

        let result = self
            .execute_kw(
                model,
                "search_read",
                json!([query.domain()]),
                json!({
                    "offset": query.offset,
                    "limit": query.limit,
                    "order": query.order(),
                }),
            )
            .await?;

        let Value::Array(rows) = result else {
            return Err(SourceError::InvalidResponse(
                "search_read did not return a list".to_string(),
            )
            .into());
        };

        rows.into_iter()
            .map(|row| {
                Record::from_json(row)
                    .map_err(|e| FerryError::from(SourceError::InvalidResponse(e)))
            })
            .collect()
    }

    async fn unlink(&self, model: &ModelName, ids: &[RecordId]) -> Result<()> {
        let ids: Vec<i64> = ids.iter().map(|id| id.value()).collect();
        self.execute_kw(model, "unlink", json!([ids]), json!({}))
            .await
            .map(|_| ())
            .map_err(|e| match e {
                FerryError::Source(SourceError::Rpc { message, .. }) => {
                    SourceError::DeleteFailed(message).into()
                }
                other => other,
            })
    }

    async fn fields_get(&self, model: &ModelName) -> Result<BTreeMap<String, String>> {
        let result = self
            .execute_kw(
                model,
                "fields_get",
                json!([]),
                json!({"attributes": ["string", "type"]}),
            )
            .await?;

        let fields: BTreeMap<String, FieldInfo> = serde_json::from_value(result)
            .map_err(|e| SourceError::InvalidResponse(format!("fields_get: {e}")))?;

        Ok(fields
            .into_iter()
            .map(|(name, info)| (name, info.field_type))
            .collect())
    }

    fn describe(&self) -> String {
        format!("Odoo {} (database {})", self.endpoint, self.database)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::secret_string;
    use crate::core::sync::window::SyncWindow;
    use chrono::{TimeZone, Utc};
    use mockito::Matcher;

    fn config(url: &str) -> OdooConfig {
        OdooConfig {
            url: url.to_string(),
            database: "prod".to_string(),
            username: "sync".to_string(),
            password: Some(secret_string("secret".to_string())),
            retry: RetryConfig {
                max_retries: 0,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    async fn mock_login(server: &mut mockito::ServerGuard, uid: Value) -> mockito::Mock {
        server
            .mock("POST", "/jsonrpc")
            .match_body(Matcher::PartialJson(json!({
                "params": {"service": "common", "method": "authenticate"}
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({"jsonrpc": "2.0", "id": 1, "result": uid}).to_string())
            .create_async()
            .await
    }

    #[test]
    fn test_new_requires_password() {
        let mut cfg = config("http://localhost:8069");
        cfg.password = None;
        assert!(OdooClient::new(&cfg).is_err());
    }

    #[tokio::test]
    async fn test_authenticate_caches_uid() {
        let mut server = mockito::Server::new_async().await;
        let login = server
            .mock("POST", "/jsonrpc")
            .match_body(Matcher::PartialJson(json!({
                "params": {"service": "common", "method": "authenticate"}
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({"jsonrpc": "2.0", "id": 1, "result": 7}).to_string())
            .expect(1)
            .create_async()
            .await;

        let client = OdooClient::new(&config(&server.url())).unwrap();
        client.authenticate().await.unwrap();
        client.authenticate().await.unwrap();

        login.assert_async().await;
    }

    #[tokio::test]
    async fn test_authenticate_rejected() {
        let mut server = mockito::Server::new_async().await;
        let _login = mock_login(&mut server, json!(false)).await;

        let client = OdooClient::new(&config(&server.url())).unwrap();
        let err = client.authenticate().await.unwrap_err();

        assert!(matches!(
            err,
            FerryError::Source(SourceError::AuthenticationFailed(_))
        ));
        assert!(err.is_connectivity());
    }

    #[tokio::test]
    async fn test_search_read_sends_window_and_paging() {
        let mut server = mockito::Server::new_async().await;
        let _login = mock_login(&mut server, json!(7)).await;
        let search = server
            .mock("POST", "/jsonrpc")
            .match_body(Matcher::PartialJson(json!({
                "params": {
                    "service": "object",
                    "method": "execute_kw",
                    "args": [
                        "prod", 7, "secret", "sale.order", "search_read",
                        [[
                            ["create_date", ">=", "2025-01-01 00:00:00"],
                            ["create_date", "<", "2025-01-02 00:00:00"]
                        ]],
                        {"offset": 10, "limit": 2, "order": "create_date asc, id asc"}
                    ]
                }
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({"jsonrpc": "2.0", "id": 2, "result": [
                    {"id": 11, "create_date": "2025-01-01 08:00:00", "name": "SO011", "partner_id": [3, "Azure Interior"]},
                    {"id": 12, "create_date": "2025-01-01 09:00:00", "name": "SO012", "partner_id": false}
                ]})
                .to_string(),
            )
            .create_async()
            .await;

        let client = OdooClient::new(&config(&server.url())).unwrap();
        let query = SearchQuery {
            window: SyncWindow {
                start: Some(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()),
                end: Utc.with_ymd_and_hms(2025, 1, 2, 0, 0, 0).unwrap(),
            },
            offset: 10,
            limit: 2,
        };
        let records = client
            .search_read(&ModelName::new("sale.order").unwrap(), &query)
            .await
            .unwrap();

        search.assert_async().await;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, RecordId::new(11));
    }

    #[tokio::test]
    async fn test_rpc_error_is_reported() {
        let mut server = mockito::Server::new_async().await;
        let _login = mock_login(&mut server, json!(7)).await;
        let _unlink = server
            .mock("POST", "/jsonrpc")
            .match_body(Matcher::PartialJson(json!({
                "params": {"method": "execute_kw"}
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({"jsonrpc": "2.0", "id": 2, "error": {
                    "code": 200,
                    "message": "Odoo Server Error",
                    "data": {"name": "odoo.exceptions.UserError", "message": "Cannot delete a confirmed order"}
                }})
                .to_string(),
            )
            .create_async()
            .await;

        let client = OdooClient::new(&config(&server.url())).unwrap();
        let err = client
            .unlink(&ModelName::new("sale.order").unwrap(), &[RecordId::new(1)])
            .await
            .unwrap_err();

        match err {
            FerryError::Source(SourceError::DeleteFailed(message)) => {
                assert_eq!(message, "Cannot delete a confirmed order")
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_fields_get() {
        let mut server = mockito::Server::new_async().await;
        let _login = mock_login(&mut server, json!(7)).await;
        let _fields = server
            .mock("POST", "/jsonrpc")
            .match_body(Matcher::PartialJson(json!({
                "params": {"args": [
                    "prod", 7, "secret", "sale.order", "fields_get",
                    [], {"attributes": ["string", "type"]}
                ]}
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({"jsonrpc": "2.0", "id": 2, "result": {
                    "amount_total": {"string": "Total", "type": "monetary"},
                    "name": {"string": "Order Reference", "type": "char"}
                }})
                .to_string(),
            )
            .create_async()
            .await;

        let client = OdooClient::new(&config(&server.url())).unwrap();
        let fields = client
            .fields_get(&ModelName::new("sale.order").unwrap())
            .await
            .unwrap();

        assert_eq!(fields.get("amount_total").map(String::as_str), Some("monetary"));
        assert_eq!(fields.get("name").map(String::as_str), Some("char"));
    }

    #[tokio::test]
    async fn test_server_error_status() {
        let mut server = mockito::Server::new_async().await;
        let _login = server
            .mock("POST", "/jsonrpc")
            .with_status(502)
            .with_body("bad gateway")
            .create_async()
            .await;

        let client = OdooClient::new(&config(&server.url())).unwrap();
        let err = client.authenticate().await.unwrap_err();
        assert!(matches!(
            err,
            FerryError::Source(SourceError::ServerError { status: 502, .. })
        ));
    }
}
