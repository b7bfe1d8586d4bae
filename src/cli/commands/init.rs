//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use crate::cli::{EXIT_CONFIG, EXIT_FATAL, EXIT_OK};
use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "ferry.toml")]
    pub output: String,

    /// Include every option with comments
    #[arg(long)]
    pub with_examples: bool,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing Ferry configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(EXIT_CONFIG);
        }

        let config_content = if self.with_examples {
            Self::generate_config_with_examples()
        } else {
            Self::generate_minimal_config()
        };

        match fs::write(&self.output, config_content) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your Odoo server and BigQuery table", self.output);
                println!("  2. Create a .env file with your credentials:");
                println!("     - ODOO_PASSWORD");
                println!("     - GOOGLE_OAUTH_ACCESS_TOKEN (local runs, e.g. `gcloud auth print-access-token`)");
                println!("  3. Validate configuration: ferry validate-config");
                println!("  4. Preview a run: ferry sync --dry-run");
                println!("  5. Run the sync: ferry sync");
                println!();
                Ok(EXIT_OK)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {e}");
                Ok(EXIT_FATAL)
            }
        }
    }

    /// Generate minimal configuration
    fn generate_minimal_config() -> String {
        r#"# Ferry Configuration File
# Odoo to BigQuery sync tool

[application]
log_level = "info"
environment = "local"  # local | cloud

[odoo]
url = "https://erp.example.com"
database = "production"
username = "bigquery-sync@example.com"
password = "${ODOO_PASSWORD}"
model = "sale.order"

[bigquery]
table_id = "my-project.erp.sale_order"
access_token = "${GOOGLE_OAUTH_ACCESS_TOKEN}"

[sync]
mode = "incremental"
batch_limit = 1000
lookback_days = -1
buffer_minutes = 2
delete_after_sync = false
max_batches = 100
"#
        .to_string()
    }

    /// Generate configuration with examples and comments
    fn generate_config_with_examples() -> String {
        r#"# Ferry Configuration File
# Odoo to BigQuery sync tool
#
# This file contains all configuration options with examples and explanations.
# Every setting can also come from the environment (ODOO_URL, ODOO_DB,
# ODOO_USERNAME, ODOO_PASSWORD, ODOO_MODEL, BQ_TABLE_ID, BATCH_LIMIT,
# LOOKBACK_DAYS, BUFFER_MINUTES, DELETE_SYNCED_RECORDS, ENVIRONMENT,
# GCS_BUCKET, STATE_FILE, FERRY_*), which takes precedence over this file.

# ============================================================================
# Application Settings
# ============================================================================
[application]
# Log level (trace, debug, info, warn, error)
log_level = "info"

# Dry run mode: fetch and sanitize, but insert, delete and checkpoint nothing
dry_run = false

# Runtime environment: "local" or "cloud"
# - local: static access token, local checkpoint file, text console logs
# - cloud: metadata server token, GCS checkpoint (if bucket set), JSON logs
environment = "local"

# ============================================================================
# Odoo Source
# ============================================================================
[odoo]
# Base URL of the Odoo server (JSON-RPC is served at /jsonrpc)
url = "https://erp.example.com"

# Odoo database name
database = "production"

# Login of the sync user
username = "bigquery-sync@example.com"

# Password or API key (use environment variable)
password = "${ODOO_PASSWORD}"

# Model to sync
model = "sale.order"

# Request timeout in seconds
timeout_seconds = 60

# Retry settings for transient failures (connection errors, timeouts, 5xx)
[odoo.retry]
max_retries = 3
initial_delay_ms = 1000
max_delay_ms = 30000
backoff_multiplier = 2.0

# ============================================================================
# BigQuery Destination
# ============================================================================
[bigquery]
# Destination table: project.dataset.table
# The table must exist; if it does not, `ferry sync` prints a CREATE TABLE
# statement derived from the model's fields and stops.
table_id = "my-project.erp.sale_order"

# OAuth2 access token, required when environment = "local"
access_token = "${GOOGLE_OAUTH_ACCESS_TOKEN}"

# Request timeout in seconds
timeout_seconds = 60

# Rows per page when reading existing ids
query_page_size = 10000

[bigquery.retry]
max_retries = 3
initial_delay_ms = 1000
max_delay_ms = 30000
backoff_multiplier = 2.0

# ============================================================================
# Sync Settings
# ============================================================================
[sync]
# Sync mode: "full" or "incremental"
# - incremental: the checkpoint raises the window start
# - full: window from lookback_days only
mode = "incremental"

# Records per batch (1-10000)
batch_limit = 1000

# Days of history to sync; -1 syncs everything
lookback_days = -1

# Clock-skew buffer subtracted from the window start
buffer_minutes = 2

# Delete records from Odoo once they are confirmed in BigQuery
delete_after_sync = false

# Batches per run before stopping; the next run continues from the checkpoint
max_batches = 100

# ============================================================================
# Checkpoint
# ============================================================================
[checkpoint]
# GCS bucket for the checkpoint (used when environment = "cloud")
# bucket = "my-ferry-state"

# File name or object key (default: sync_state_{model}.json)
# file_name = "sync_state_sale_order.json"

# ============================================================================
# Logging Configuration
# ============================================================================
[logging]
# Enable JSON file logging
local_enabled = false

# Log directory
local_path = "./logs"

# Log rotation (daily, hourly, never)
local_rotation = "daily"

# JSON console output (defaults to true in cloud mode)
# json_console = true
"#
        .to_string()
    }
}
