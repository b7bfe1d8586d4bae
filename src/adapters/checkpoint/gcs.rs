//! Cloud Storage checkpoint storage
//!
//! Reads and writes one object through the Cloud Storage JSON API
//! (`alt=media` download, `uploadType=media` upload).

use crate::adapters::gcp::auth::TokenProvider;
use crate::adapters::gcp::models::error_message;
use crate::adapters::retry::retry_request;
use crate::adapters::traits::CheckpointStorage;
use crate::config::RetryConfig;
use crate::domain::{FerryError, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use url::Url;

/// Checkpoint document stored as a GCS object
pub struct GcsStorage {
    api_base_url: String,
    bucket: String,
    object: String,
    client: Client,
    auth: Arc<TokenProvider>,
    retry: RetryConfig,
}

impl GcsStorage {
    pub fn new(
        api_base_url: &str,
        bucket: impl Into<String>,
        object: impl Into<String>,
        client: Client,
        auth: Arc<TokenProvider>,
        retry: RetryConfig,
    ) -> Self {
        Self {
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            bucket: bucket.into(),
            object: object.into(),
            client,
            auth,
            retry,
        }
    }

    /// `{base}/storage/v1/b/{bucket}/o/{object}` with the object name encoded
    fn download_url(&self) -> Result<Url> {
        let mut url = self.parse_base()?;
        url.path_segments_mut()
            .map_err(|_| FerryError::Configuration("Invalid storage API base URL".to_string()))?
            .extend(["storage", "v1", "b", self.bucket.as_str(), "o", self.object.as_str()]);
        url.query_pairs_mut().append_pair("alt", "media");
        Ok(url)
    }

    fn upload_url(&self) -> Result<Url> {
        let mut url = self.parse_base()?;
        url.path_segments_mut()
            .map_err(|_| FerryError::Configuration("Invalid storage API base URL".to_string()))?
            .extend(["upload", "storage", "v1", "b", self.bucket.as_str(), "o"]);
        url.query_pairs_mut()
            .append_pair("uploadType", "media")
            .append_pair("name", &self.object);
        Ok(url)
    }

    fn parse_base(&self) -> Result<Url> {
        Url::parse(&self.api_base_url).map_err(|e| {
            FerryError::Configuration(format!(
                "Invalid storage API base URL '{}': {e}",
                self.api_base_url
            ))
        })
    }
}

fn storage_error(status: StatusCode, body: &str) -> FerryError {
    let message = error_message(body);
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => FerryError::Authentication(message),
        s if s.is_server_error() => FerryError::Connection(format!("Cloud Storage {s}: {message}")),
        s => FerryError::Checkpoint(format!("Cloud Storage {s}: {message}")),
    }
}

fn send_error(e: reqwest::Error) -> FerryError {
    FerryError::Connection(format!("Cloud Storage unreachable: {e}"))
}

#[async_trait]
impl CheckpointStorage for GcsStorage {
    async fn read(&self) -> Result<Option<Vec<u8>>> {
        let url = self.download_url()?;

        retry_request(&self.retry, || async {
            let token = self.auth.token().await?;
            let resp = self
                .client
                .get(url.clone())
                .bearer_auth(token)
                .send()
                .await
                .map_err(send_error)?;

            let status = resp.status();
            if status == StatusCode::NOT_FOUND {
                return Ok(None);
            }
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                return Err(storage_error(status, &body));
            }

            let bytes = resp.bytes().await.map_err(send_error)?;
            Ok(Some(bytes.to_vec()))
        })
        .await
    }

    async fn write(&self, bytes: &[u8]) -> Result<()> {
        let url = self.upload_url()?;

        retry_request(&self.retry, || async {
            let token = self.auth.token().await?;
            let resp = self
                .client
                .post(url.clone())
                .bearer_auth(token)
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(bytes.to_vec())
                .send()
                .await
                .map_err(send_error)?;

            let status = resp.status();
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                return Err(storage_error(status, &body));
            }
            Ok(())
        })
        .await?;

        tracing::debug!(location = %self.location(), bytes = bytes.len(), "Uploaded checkpoint");
        Ok(())
    }

    fn location(&self) -> String {
        format!("gs://{}/{}", self.bucket, self.object)
    }
}
