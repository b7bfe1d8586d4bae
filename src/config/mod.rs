//! Configuration management for Ferry.
//!
//! This module provides TOML-based configuration loading, environment
//! overrides and validation.
//!
//! # Overview
//!
//! Ferry reads an optional TOML file with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - Default values for every setting
//! - Environment variable overrides using the deployment names
//!   (`ODOO_URL`, `BQ_TABLE_ID`, `LOOKBACK_DAYS`, ...)
//! - Validation before anything connects
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use ferry::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("ferry.toml", false)?;
//!
//! println!("Odoo URL: {}", config.odoo.url);
//! println!("Model: {}", config.odoo.model);
//! println!("Table: {}", config.bigquery.table_id);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - Log level, dry run, runtime environment
//! - [`OdooConfig`] - Odoo connection, credentials and model
//! - [`BigQueryConfig`] - Destination table and credentials
//! - [`SyncConfig`] - Window, batch size, deletion, safety limit
//! - [`CheckpointConfig`] - Local file name or GCS bucket
//! - [`LoggingConfig`] - Console and file logging
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! environment = "cloud"
//!
//! [odoo]
//! url = "https://erp.example.com"
//! database = "production"
//! username = "bigquery-sync@example.com"
//! password = "${ODOO_PASSWORD}"
//! model = "sale.order"
//!
//! [bigquery]
//! table_id = "acme-analytics.erp.sale_order"
//!
//! [sync]
//! lookback_days = 7
//! delete_after_sync = false
//!
//! [checkpoint]
//! bucket = "acme-ferry-state"
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::{load_config, DEFAULT_CONFIG_PATH};
pub use schema::{
    ApplicationConfig, BigQueryConfig, CheckpointConfig, FerryConfig, LoggingConfig, OdooConfig,
    RetryConfig, RunEnvironment, SyncConfig, SyncMode,
};
pub use secret::{is_present, secret_string, SecretString, SecretValue};
