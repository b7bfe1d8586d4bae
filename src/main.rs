// Ferry - Odoo to BigQuery sync tool
// Copyright (c) 2025 Ferry Contributors
// Licensed under the MIT License

use clap::Parser;
use ferry::cli::{Cli, Commands, ConfigSource, EXIT_FATAL};
use ferry::config::{load_config, LoggingConfig, RunEnvironment};
use ferry::logging::init_logging;
use std::process;
use tokio::sync::watch;

#[tokio::main]
async fn main() {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let source = cli.config_source();

    // Logging settings come from the configuration when it loads; commands
    // report configuration errors themselves.
    let (log_level, logging_config, cloud) = match load_config(source.path(), source.required) {
        Ok(config) => (
            cli.log_level
                .clone()
                .unwrap_or_else(|| config.application.log_level.clone()),
            config.logging.clone(),
            config.application.environment == RunEnvironment::Cloud,
        ),
        Err(_) => (
            cli.log_level.clone().unwrap_or_else(|| "info".to_string()),
            LoggingConfig::default(),
            false,
        ),
    };

    let guard = match init_logging(&log_level, &logging_config, cloud) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            process::exit(EXIT_FATAL);
        }
    };

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "Ferry - Odoo to BigQuery sync tool"
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(forward_shutdown_signal(shutdown_tx));

    let exit_code = match execute_command(&cli, &source, shutdown_rx).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "Command execution failed");
            eprintln!("Error: {e}");
            EXIT_FATAL
        }
    };

    // Flush the file writer before exiting
    drop(guard);
    process::exit(exit_code);
}

/// Execute the CLI command
async fn execute_command(
    cli: &Cli,
    source: &ConfigSource,
    shutdown_signal: watch::Receiver<bool>,
) -> anyhow::Result<i32> {
    match &cli.command {
        Commands::Sync(args) => args.execute(source, shutdown_signal).await,
        Commands::ValidateConfig(args) => args.execute(source).await,
        Commands::Status(args) => args.execute(source).await,
        Commands::Init(args) => args.execute().await,
    }
}

/// Flips the shutdown flag on SIGINT or SIGTERM
///
/// The coordinator checks the flag before each fetch, so the batch in flight
/// is finished and checkpointed first.
async fn forward_shutdown_signal(shutdown_tx: watch::Sender<bool>) {
    let signal = match termination().await {
        Ok(signal) => signal,
        Err(e) => {
            tracing::error!(error = %e, "Failed to install signal handlers");
            return;
        }
    };

    tracing::warn!(signal, "Shutdown requested, finishing the current batch");
    eprintln!("\nReceived {signal}, finishing the current batch...");
    let _ = shutdown_tx.send(true);
}

#[cfg(unix)]
async fn termination() -> std::io::Result<&'static str> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate())?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result.map(|_| "SIGINT"),
        _ = sigterm.recv() => Ok("SIGTERM"),
    }
}

#[cfg(not(unix))]
async fn termination() -> std::io::Result<&'static str> {
    tokio::signal::ctrl_c().await.map(|_| "Ctrl+C")
}
