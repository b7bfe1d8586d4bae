//! Sync command implementation
//!
//! Runs one sync of the configured Odoo model into BigQuery.

use crate::adapters::factory::create_collaborators;
use crate::cli::{ConfigSource, EXIT_CONFIG, EXIT_CONNECTION, EXIT_FATAL, EXIT_INTERRUPTED, EXIT_OK};
use crate::config::{load_config, FerryConfig, SyncMode};
use crate::core::sync::{RunOutcome, SyncCoordinator, SyncSettings, SyncSummary};
use crate::domain::FerryError;
use clap::Args;
use tokio::sync::watch;

// Failures listed individually before truncating
const MAX_LISTED_ERRORS: usize = 10;

/// Arguments for the sync command
#[derive(Args, Debug, Default)]
pub struct SyncArgs {
    /// Fetch, dedup and sanitize without writing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Override the Odoo model to sync
    #[arg(long)]
    pub model: Option<String>,

    /// Override lookback days (-1 syncs all history)
    #[arg(long, allow_negative_numbers = true)]
    pub lookback_days: Option<i64>,

    /// Ignore the checkpoint when computing the window
    #[arg(long)]
    pub full: bool,
}

impl SyncArgs {
    /// Applies command-line overrides to a loaded configuration
    pub fn apply_overrides(&self, config: &mut FerryConfig) {
        if let Some(model) = &self.model {
            tracing::info!(model = %model, "Overriding model from CLI");
            config.odoo.model = model.clone();
        }
        if let Some(days) = self.lookback_days {
            tracing::info!(lookback_days = days, "Overriding lookback days from CLI");
            config.sync.lookback_days = days;
        }
        if self.full {
            tracing::info!("Forcing full sync from CLI");
            config.sync.mode = SyncMode::Full;
        }
        if self.dry_run {
            tracing::info!("Enabling dry-run mode from CLI");
            config.application.dry_run = true;
        }
    }

    /// Execute the sync command
    pub async fn execute(
        &self,
        source: &ConfigSource,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!("Starting sync command");

        let mut config = match load_config(source.path(), source.required) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load configuration");
                eprintln!("Failed to load configuration: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        self.apply_overrides(&mut config);
        if let Err(e) = config.validate() {
            tracing::error!(error = %e, "Configuration validation failed");
            eprintln!("Configuration validation failed: {e}");
            return Ok(EXIT_CONFIG);
        }

        if config.application.dry_run {
            tracing::info!("Dry run mode enabled - nothing will be written");
            println!("🔍 DRY RUN MODE - No rows inserted, no records deleted, no checkpoint written");
            println!();
        }

        let settings = SyncSettings::from_config(&config)?;
        let collaborators = match create_collaborators(&config) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Failed to initialize sync");
                eprintln!("Failed to initialize sync: {e}");
                return Ok(exit_code_for_error(&e));
            }
        };

        let coordinator = SyncCoordinator::new(
            collaborators.source,
            collaborators.sink,
            collaborators.checkpoints,
            settings,
        )
        .with_shutdown(shutdown_signal);

        println!("🚀 Syncing {} into {}", config.odoo.model, config.bigquery.table_id);
        println!();

        let summary = match coordinator.execute_sync().await {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "Sync failed");
                eprintln!("Sync failed: {e}");
                return Ok(exit_code_for_error(&e));
            }
        };

        print_summary(&summary);
        Ok(exit_code_for_outcome(&summary))
    }
}

/// Exit code for a run that returned a summary
pub fn exit_code_for_outcome(summary: &SyncSummary) -> i32 {
    match summary.outcome {
        RunOutcome::Interrupted => EXIT_INTERRUPTED,
        RunOutcome::Completed | RunOutcome::SafetyLimitReached | RunOutcome::SchemaMissing => {
            EXIT_OK
        }
    }
}

/// Exit code for a run that failed
pub fn exit_code_for_error(error: &FerryError) -> i32 {
    if error.is_connectivity() {
        EXIT_CONNECTION
    } else if matches!(error, FerryError::Configuration(_)) {
        EXIT_CONFIG
    } else {
        EXIT_FATAL
    }
}

fn print_summary(summary: &SyncSummary) {
    if let Some(statement) = &summary.create_table {
        println!("⚠️  Destination table does not exist. Create it with:");
        println!();
        println!("{}", statement.formatted);
        println!();
        println!("One-line version:");
        println!("{}", statement.one_line);
        println!();
    } else if summary.outcome == RunOutcome::SchemaMissing {
        println!("⚠️  Destination table does not exist and its schema could not be derived.");
        println!();
    }

    println!("📊 Sync Summary:");
    println!("  Outcome: {}", summary.outcome);
    println!("  Batches: {}", summary.batches);
    println!("  Fetched: {}", summary.fetched);
    println!("  Inserted: {}", summary.inserted);
    println!("  Failed: {}", summary.failed);
    println!("  Skipped (already synced): {}", summary.skipped);
    println!("  Deleted: {}", summary.deleted);
    println!("  Delete failures: {}", summary.delete_failed);
    println!("  Duration: {:.2}s", summary.duration.as_secs_f64());
    println!("  Success Rate: {:.2}%", summary.success_rate());
    println!();

    if !summary.errors.is_empty() {
        println!("⚠️  Errors encountered:");
        for error in summary.errors.iter().take(MAX_LISTED_ERRORS) {
            println!("  - {:?}: {}", error.error_type, error.message);
            if let Some(context) = &error.context {
                println!("    Context: {context}");
            }
        }
        if summary.errors.len() > MAX_LISTED_ERRORS {
            println!("  ... and {} more", summary.errors.len() - MAX_LISTED_ERRORS);
        }
        println!();
    }

    match summary.outcome {
        RunOutcome::Interrupted => {
            println!("⚠️  Sync interrupted gracefully. Progress saved.");
            println!("   Run the same command to resume from the checkpoint.");
        }
        RunOutcome::SafetyLimitReached => {
            println!("⏸️  Batch limit reached. The next run continues from the checkpoint.");
        }
        RunOutcome::SchemaMissing => {
            println!("ℹ️  No records were synced.");
        }
        RunOutcome::Completed if summary.is_successful() => {
            println!("✅ Sync completed successfully!");
        }
        RunOutcome::Completed => {
            println!("⚠️  Sync completed with failures (see log for record details)");
        }
    }
}
