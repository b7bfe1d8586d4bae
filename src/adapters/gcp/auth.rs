//! Access tokens for Google Cloud REST calls
//!
//! Either a static bearer token from configuration, or a token from the GCE
//! metadata server cached until shortly before it expires.

use super::models::MetadataToken;
use crate::config::{is_present, BigQueryConfig, RunEnvironment, SecretString};
use crate::domain::{FerryError, Result};
use reqwest::Client;
use secrecy::ExposeSecret;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

// Refresh this long before the reported expiry
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Token with its local expiry
pub struct CachedToken {
    value: String,
    expires_at: Instant,
}

/// Source of bearer tokens
pub enum TokenProvider {
    /// Token supplied by the operator
    Static(SecretString),
    /// Token fetched from the metadata server
    MetadataServer {
        url: String,
        client: Client,
        cached: Mutex<Option<CachedToken>>,
    },
}

impl TokenProvider {
    /// Picks the provider for the environment
    ///
    /// A configured token always wins. Without one, cloud mode asks the
    /// metadata server.
    pub fn from_config(
        config: &BigQueryConfig,
        environment: RunEnvironment,
        client: Client,
    ) -> Result<Self> {
        if let Some(token) = config
            .access_token
            .as_ref()
            .filter(|t| is_present(Some(*t)))
        {
            return Ok(TokenProvider::Static(token.clone()));
        }

        match environment {
            RunEnvironment::Cloud => Ok(TokenProvider::metadata_server(
                config.metadata_token_url.clone(),
                client,
            )),
            RunEnvironment::Local => Err(FerryError::Configuration(
                "No access token configured; set GOOGLE_OAUTH_ACCESS_TOKEN".to_string(),
            )),
        }
    }

    /// Metadata server provider for `url`
    pub fn metadata_server(url: String, client: Client) -> Self {
        TokenProvider::MetadataServer {
            url,
            client,
            cached: Mutex::new(None),
        }
    }

    /// Returns a valid bearer token
    ///
    /// # Errors
    ///
    /// Returns an authentication error when the metadata server cannot be
    /// reached or answers with an error.
    pub async fn token(&self) -> Result<String> {
        match self {
            TokenProvider::Static(token) => {
                let value: &str = token.expose_secret().as_ref();
                Ok(value.to_string())
            }
            TokenProvider::MetadataServer {
                url,
                client,
                cached,
            } => {
                let mut guard = cached.lock().await;
                if let Some(token) = guard.as_ref() {
                    if Instant::now() < token.expires_at {
                        return Ok(token.value.clone());
                    }
                }

                let fresh = fetch_metadata_token(client, url).await?;
                let lifetime = Duration::from_secs(fresh.expires_in).saturating_sub(EXPIRY_MARGIN);
                let value = fresh.access_token;
                *guard = Some(CachedToken {
                    value: value.clone(),
                    expires_at: Instant::now() + lifetime,
                });
                Ok(value)
            }
        }
    }
}

async fn fetch_metadata_token(client: &Client, url: &str) -> Result<MetadataToken> {
    let resp = client
        .get(url)
        .header("Metadata-Flavor", "Google")
        .send()
        .await
        .map_err(|e| FerryError::Authentication(format!("Metadata server unreachable: {e}")))?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        return Err(FerryError::Authentication(format!(
            "Metadata server returned {status}: {body}"
        )));
    }

    let token: MetadataToken = resp
        .json()
        .await
        .map_err(|e| FerryError::Authentication(format!("Invalid metadata token response: {e}")))?;

    tracing::debug!(expires_in = token.expires_in, "Fetched access token from metadata server");
    Ok(token)
}
