//! Status command implementation
//!
//! Shows the checkpoint of the configured model.

use crate::adapters::factory::create_collaborators;
use crate::cli::{ConfigSource, EXIT_CONFIG, EXIT_OK};
use crate::config::load_config;
use crate::core::state::Checkpoint;
use crate::domain::record::format_odoo_datetime;
use clap::Args;

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Print the raw checkpoint document as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatusArgs {
    /// Execute the status command
    pub async fn execute(&self, source: &ConfigSource) -> anyhow::Result<i32> {
        tracing::info!("Checking sync status");

        let config = match load_config(source.path(), source.required) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Failed to load configuration");
                println!("   Error: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        let collaborators = match create_collaborators(&config) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Failed to set up checkpoint storage");
                println!("   Error: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        let store = collaborators.checkpoints;
        let checkpoint = store.load().await;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&checkpoint)?);
            return Ok(EXIT_OK);
        }

        println!("📊 Sync Status");
        println!();
        println!("  Model: {}", config.odoo.model);
        println!("  Table: {}", config.bigquery.table_id);
        println!("  Checkpoint: {}", store.location());
        println!();

        if checkpoint.is_zero() && checkpoint.last_run_started_at.is_none() {
            println!("No sync history found.");
            println!("Run 'ferry sync' to start syncing records.");
            return Ok(EXIT_OK);
        }

        for line in describe(&checkpoint) {
            println!("  {line}");
        }
        println!();

        Ok(EXIT_OK)
    }
}

/// Human-readable lines for a checkpoint
pub fn describe(checkpoint: &Checkpoint) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(model) = &checkpoint.model {
        lines.push(format!("Checkpoint model: {model}"));
    }
    lines.push(format!(
        "Last synced create_date: {}",
        checkpoint
            .last_sync_timestamp
            .as_ref()
            .map(format_odoo_datetime)
            .unwrap_or_else(|| "-".to_string())
    ));
    lines.push(format!(
        "Last processed id: {}",
        checkpoint
            .last_processed_id
            .as_ref()
            .map(|id| id.to_string())
            .unwrap_or_else(|| "-".to_string())
    ));
    lines.push(format!("Records synced: {}", checkpoint.records_synced_count));
    lines.push(format!("Last run status: {}", checkpoint.last_run_status));
    if let Some(started) = checkpoint.last_run_started_at {
        lines.push(format!("Last run started: {}", started.to_rfc3339()));
    }
    if let Some(completed) = checkpoint.last_run_completed_at {
        lines.push(format!("Last run completed: {}", completed.to_rfc3339()));
    }
    if let Some(duration) = checkpoint.last_run_duration() {
        lines.push(format!("Last run duration: {}s", duration.num_seconds()));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::{CheckpointBuilder, SyncStatus};
    use crate::domain::ids::{ModelName, RecordId};
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_describe_checkpoint() {
        let checkpoint = CheckpointBuilder::new(ModelName::new("sale.order").unwrap())
            .last_sync_timestamp(Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap())
            .last_processed_id(RecordId::new(42))
            .records_synced_count(1500)
            .last_run_status(SyncStatus::Completed)
            .build();

        let lines = describe(&checkpoint);
        assert!(lines.contains(&"Checkpoint model: sale.order".to_string()));
        assert!(lines.contains(&"Last synced create_date: 2025-03-01 12:00:00".to_string()));
        assert!(lines.contains(&"Last processed id: 42".to_string()));
        assert!(lines.contains(&"Records synced: 1500".to_string()));
    }
}
