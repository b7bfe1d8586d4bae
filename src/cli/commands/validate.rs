//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the Ferry configuration without connecting to anything.

use crate::cli::{ConfigSource, EXIT_CONFIG, EXIT_OK};
use crate::config::load_config;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, source: &ConfigSource) -> anyhow::Result<i32> {
        tracing::info!(config_path = %source.path().display(), "Validating configuration");

        if source.path().exists() {
            println!("🔍 Validating configuration file: {}", source.path().display());
        } else {
            println!("🔍 Validating configuration from defaults and environment");
        }
        println!();

        let config = match load_config(source.path(), source.required) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Configuration validation failed");
                println!("   Error: {e}");
                println!();
                return Ok(EXIT_CONFIG);
            }
        };

        println!("✅ Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Environment: {:?}", config.application.environment);
        println!("  Log Level: {}", config.application.log_level);
        println!("  Dry Run: {}", config.application.dry_run);
        println!("  Odoo Server: {}", config.odoo.url);
        println!("  Odoo Database: {}", config.odoo.database);
        println!("  Odoo User: {}", config.odoo.username);
        println!("  Model: {}", config.odoo.model);
        println!("  BigQuery Table: {}", config.bigquery.table_id);
        println!("  Sync Mode: {}", config.sync.mode);
        println!("  Batch Limit: {}", config.sync.batch_limit);
        println!("  Max Batches: {}", config.sync.max_batches);
        println!(
            "  Lookback Days: {}",
            if config.sync.lookback_days < 0 {
                "all history".to_string()
            } else {
                config.sync.lookback_days.to_string()
            }
        );
        println!("  Buffer Minutes: {}", config.sync.buffer_minutes);
        println!("  Delete After Sync: {}", config.sync.delete_after_sync);
        if config.uses_gcs_checkpoint() {
            println!(
                "  Checkpoint Bucket: {}",
                config.checkpoint.bucket.as_deref().unwrap_or_default()
            );
        }
        if let Ok(model) = config.model_name() {
            println!(
                "  Checkpoint File: {}",
                config.checkpoint.resolved_file_name(&model)
            );
        }
        println!();

        Ok(EXIT_OK)
    }
}
