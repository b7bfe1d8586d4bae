//! Configuration schema types
//!
//! This module defines the configuration structure for Ferry. Every section
//! has defaults so a deployment can be configured from environment variables
//! alone.

use crate::config::secret::is_present;
use crate::config::SecretString;
use crate::domain::ids::{ModelName, TableId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Where the job runs
///
/// `cloud` enables metadata-server credentials, GCS checkpoints and JSON
/// console logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RunEnvironment {
    /// Developer machine or plain VM
    #[default]
    Local,
    /// Managed GCP runtime (Cloud Run, GCE, GKE)
    Cloud,
}

impl FromStr for RunEnvironment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "cloud" => Ok(Self::Cloud),
            other => Err(format!(
                "Invalid environment '{other}'. Must be one of: local, cloud"
            )),
        }
    }
}

/// Sync mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SyncMode {
    /// Window derived from lookback only
    Full,
    /// Checkpoint raises the window start
    #[default]
    Incremental,
}

impl FromStr for SyncMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "full" => Ok(Self::Full),
            "incremental" => Ok(Self::Incremental),
            other => Err(format!(
                "Invalid sync mode '{other}'. Must be one of: full, incremental"
            )),
        }
    }
}

impl fmt::Display for SyncMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncMode::Full => write!(f, "full"),
            SyncMode::Incremental => write!(f, "incremental"),
        }
    }
}

/// Main Ferry configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FerryConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Odoo connection
    #[serde(default)]
    pub odoo: OdooConfig,

    /// BigQuery destination
    #[serde(default)]
    pub bigquery: BigQueryConfig,

    /// Sync window and batching
    #[serde(default)]
    pub sync: SyncConfig,

    /// Checkpoint location
    #[serde(default)]
    pub checkpoint: CheckpointConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl FerryConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.odoo.validate()?;
        self.bigquery.validate(self.application.environment)?;
        self.sync.validate()?;
        self.checkpoint.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    /// Parsed source model name
    pub fn model_name(&self) -> Result<ModelName, String> {
        ModelName::new(self.odoo.model.clone())
    }

    /// Parsed destination table id
    pub fn table_id(&self) -> Result<TableId, String> {
        TableId::parse(&self.bigquery.table_id)
    }

    /// Whether the checkpoint lives in GCS rather than a local file
    pub fn uses_gcs_checkpoint(&self) -> bool {
        self.application.environment == RunEnvironment::Cloud && self.checkpoint.bucket.is_some()
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Dry run mode (fetch and sanitize, but don't write anywhere)
    #[serde(default)]
    pub dry_run: bool,

    /// Runtime environment (local or cloud)
    #[serde(default)]
    pub environment: RunEnvironment,
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            dry_run: false,
            environment: RunEnvironment::default(),
        }
    }
}

/// Retry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retry attempts
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// Initial delay in milliseconds
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Maximum delay in milliseconds
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Backoff multiplier
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
}

impl RetryConfig {
    fn validate(&self, section: &str) -> Result<(), String> {
        if self.max_retries > 10 {
            return Err(format!(
                "{section}.retry.max_retries must be <= 10, got {}",
                self.max_retries
            ));
        }
        if self.backoff_multiplier < 1.0 {
            return Err(format!(
                "{section}.retry.backoff_multiplier must be >= 1.0, got {}",
                self.backoff_multiplier
            ));
        }
        Ok(())
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
        }
    }
}

/// Odoo server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OdooConfig {
    /// Base URL of the Odoo server
    #[serde(default)]
    pub url: String,

    /// Database name
    #[serde(default)]
    pub database: String,

    /// Login of the integration user
    #[serde(default)]
    pub username: String,

    /// Password or API key
    /// Stored securely in memory and automatically zeroized on drop
    #[serde(default)]
    pub password: Option<SecretString>,

    /// Technical name of the model to sync
    #[serde(default = "default_model")]
    pub model: String,

    /// Timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Retry configuration
    #[serde(default)]
    pub retry: RetryConfig,
}

impl OdooConfig {
    fn validate(&self) -> Result<(), String> {
        if self.url.is_empty() {
            return Err("odoo.url cannot be empty".to_string());
        }
        if !self.url.starts_with("http://") && !self.url.starts_with("https://") {
            return Err("odoo.url must start with http:// or https://".to_string());
        }
        if self.database.trim().is_empty() {
            return Err("odoo.database cannot be empty".to_string());
        }
        if self.username.trim().is_empty() {
            return Err("odoo.username cannot be empty".to_string());
        }
        if !is_present(self.password.as_ref()) {
            return Err("odoo.password cannot be empty".to_string());
        }
        ModelName::new(self.model.clone()).map_err(|e| format!("odoo.model: {e}"))?;
        if self.timeout_seconds == 0 {
            return Err("odoo.timeout_seconds must be > 0".to_string());
        }
        self.retry.validate("odoo")?;
        Ok(())
    }
}

impl Default for OdooConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            database: String::new(),
            username: String::new(),
            password: None,
            model: default_model(),
            timeout_seconds: default_timeout_seconds(),
            retry: RetryConfig::default(),
        }
    }
}

/// BigQuery destination configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BigQueryConfig {
    /// Destination table, `project.dataset.table`
    #[serde(default)]
    pub table_id: String,

    /// BigQuery REST API base URL
    #[serde(default = "default_bigquery_api_base_url")]
    pub api_base_url: String,

    /// Static OAuth2 access token (required outside GCP)
    /// Stored securely in memory and automatically zeroized on drop
    #[serde(default)]
    pub access_token: Option<SecretString>,

    /// Metadata server token endpoint used in cloud mode
    #[serde(default = "default_metadata_token_url")]
    pub metadata_token_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Rows per page when reading query results
    #[serde(default = "default_query_page_size")]
    pub query_page_size: u32,

    /// Retry configuration
    #[serde(default)]
    pub retry: RetryConfig,
}

impl BigQueryConfig {
    fn validate(&self, environment: RunEnvironment) -> Result<(), String> {
        TableId::parse(&self.table_id).map_err(|e| format!("bigquery.table_id: {e}"))?;

        if !self.api_base_url.starts_with("http://") && !self.api_base_url.starts_with("https://")
        {
            return Err("bigquery.api_base_url must start with http:// or https://".to_string());
        }

        if environment == RunEnvironment::Local && !is_present(self.access_token.as_ref()) {
            return Err(
                "bigquery.access_token is required when environment = 'local' \
                (set GOOGLE_OAUTH_ACCESS_TOKEN, e.g. from `gcloud auth print-access-token`)"
                    .to_string(),
            );
        }

        if self.timeout_seconds == 0 {
            return Err("bigquery.timeout_seconds must be > 0".to_string());
        }
        if self.query_page_size == 0 {
            return Err("bigquery.query_page_size must be > 0".to_string());
        }
        self.retry.validate("bigquery")?;
        Ok(())
    }
}

impl Default for BigQueryConfig {
    fn default() -> Self {
        Self {
            table_id: String::new(),
            api_base_url: default_bigquery_api_base_url(),
            access_token: None,
            metadata_token_url: default_metadata_token_url(),
            timeout_seconds: default_timeout_seconds(),
            query_page_size: default_query_page_size(),
            retry: RetryConfig::default(),
        }
    }
}

/// Sync window and batching configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Sync mode (full or incremental)
    #[serde(default)]
    pub mode: SyncMode,

    /// Records per batch
    #[serde(default = "default_batch_limit")]
    pub batch_limit: usize,

    /// Clock-skew buffer subtracted from the window start
    #[serde(default = "default_buffer_minutes")]
    pub buffer_minutes: i64,

    /// Days of history to sync; -1 means everything
    #[serde(default = "default_lookback_days")]
    pub lookback_days: i64,

    /// Delete records from Odoo once they are in BigQuery
    #[serde(default)]
    pub delete_after_sync: bool,

    /// Batches per run before stopping
    #[serde(default = "default_max_batches")]
    pub max_batches: usize,
}

/// Longest bounded lookback; use -1 for all history
pub const MAX_LOOKBACK_DAYS: i64 = 36_500;

/// Largest start buffer, one week
pub const MAX_BUFFER_MINUTES: i64 = 10_080;

impl SyncConfig {
    fn validate(&self) -> Result<(), String> {
        if !(1..=10_000).contains(&self.batch_limit) {
            return Err(format!(
                "sync.batch_limit must be between 1 and 10000, got {}",
                self.batch_limit
            ));
        }
        if !(0..=MAX_BUFFER_MINUTES).contains(&self.buffer_minutes) {
            return Err(format!(
                "sync.buffer_minutes must be between 0 and {MAX_BUFFER_MINUTES}, got {}",
                self.buffer_minutes
            ));
        }
        if !(-1..=MAX_LOOKBACK_DAYS).contains(&self.lookback_days) {
            return Err(format!(
                "sync.lookback_days must be -1 (all history) or between 0 and {MAX_LOOKBACK_DAYS}, got {}",
                self.lookback_days
            ));
        }
        if self.max_batches == 0 {
            return Err("sync.max_batches must be >= 1".to_string());
        }
        Ok(())
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            mode: SyncMode::default(),
            batch_limit: default_batch_limit(),
            buffer_minutes: default_buffer_minutes(),
            lookback_days: default_lookback_days(),
            delete_after_sync: false,
            max_batches: default_max_batches(),
        }
    }
}

/// Checkpoint location configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointConfig {
    /// GCS bucket holding the checkpoint in cloud mode
    #[serde(default)]
    pub bucket: Option<String>,

    /// File name (or object key); defaults to `sync_state_{model}.json`
    #[serde(default)]
    pub file_name: Option<String>,

    /// Cloud Storage JSON API base URL
    #[serde(default = "default_storage_api_base_url")]
    pub storage_api_base_url: String,
}

impl CheckpointConfig {
    fn validate(&self) -> Result<(), String> {
        if let Some(bucket) = &self.bucket {
            if bucket.trim().is_empty() {
                return Err("checkpoint.bucket cannot be blank".to_string());
            }
        }
        if let Some(name) = &self.file_name {
            if name.trim().is_empty() {
                return Err("checkpoint.file_name cannot be blank".to_string());
            }
        }
        Ok(())
    }

    /// Checkpoint file name for a model
    pub fn resolved_file_name(&self, model: &ModelName) -> String {
        self.file_name
            .clone()
            .unwrap_or_else(|| format!("sync_state_{}.json", model.file_stem()))
    }
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self {
            bucket: None,
            file_name: None,
            storage_api_base_url: default_storage_api_base_url(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable local file logging
    #[serde(default)]
    pub local_enabled: bool,

    /// Local log directory
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation strategy (daily, hourly, never)
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,

    /// Emit console logs as JSON; defaults to on in cloud mode
    #[serde(default)]
    pub json_console: Option<bool>,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }
        if self.local_enabled && self.local_path.trim().is_empty() {
            return Err("logging.local_path cannot be empty when local logging is enabled".to_string());
        }
        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
            json_console: None,
        }
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_model() -> String {
    "sale.order".to_string()
}

fn default_timeout_seconds() -> u64 {
    60
}

fn default_max_retries() -> usize {
    3
}

fn default_initial_delay_ms() -> u64 {
    1000
}

fn default_max_delay_ms() -> u64 {
    30000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_bigquery_api_base_url() -> String {
    "https://bigquery.googleapis.com/bigquery/v2".to_string()
}

fn default_metadata_token_url() -> String {
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token"
        .to_string()
}

fn default_query_page_size() -> u32 {
    10_000
}

fn default_batch_limit() -> usize {
    1000
}

fn default_buffer_minutes() -> i64 {
    2
}

fn default_lookback_days() -> i64 {
    -1
}

fn default_max_batches() -> usize {
    100
}

fn default_storage_api_base_url() -> String {
    "https://storage.googleapis.com".to_string()
}

fn default_local_path() -> String {
    "./logs".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}
