//! Configuration loader with TOML parsing and environment variable overrides
//!
//! The TOML file is optional. Deployments that only set environment variables
//! (the usual container setup) get defaults plus their overrides.

use super::schema::{FerryConfig, RunEnvironment, SyncMode};
use super::secret::secret_string;
use crate::domain::errors::FerryError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Default configuration file name
pub const DEFAULT_CONFIG_PATH: &str = "ferry.toml";

/// Loads configuration from a TOML file and the environment
///
/// This function:
/// 1. Reads the TOML file, if it exists
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into FerryConfig
/// 4. Applies environment variable overrides
/// 5. Validates the configuration
///
/// A missing file is an error only when `required` is set, i.e. when the
/// path was given explicitly.
///
/// # Errors
///
/// Returns an error if:
/// - A required file does not exist or cannot be read
/// - TOML parsing fails
/// - A referenced environment variable is not set
/// - An override has an unparseable value
/// - Configuration validation fails
///
/// # Examples
///
/// ```no_run
/// use ferry::config::loader::load_config;
///
/// let config = load_config("ferry.toml", false).expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>, required: bool) -> Result<FerryConfig> {
    let mut config = read_config(path, required)?;

    apply_env_overrides(&mut config)?;

    config.validate().map_err(|e| {
        FerryError::Configuration(format!("Configuration validation failed: {e}"))
    })?;

    Ok(config)
}

/// Reads and parses the TOML file without overrides or validation
fn read_config(path: impl AsRef<Path>, required: bool) -> Result<FerryConfig> {
    let path = path.as_ref();

    if !path.exists() {
        if required {
            return Err(FerryError::Configuration(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }
        tracing::debug!(
            path = %path.display(),
            "No configuration file, using defaults and environment"
        );
        return Ok(FerryConfig::default());
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        FerryError::Configuration(format!(
            "Failed to read configuration file {}: {e}",
            path.display()
        ))
    })?;

    let contents = substitute_env_vars(&contents)?;

    toml::from_str(&contents)
        .map_err(|e| FerryError::Configuration(format!("Failed to parse TOML: {e}")))
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are left untouched.
///
/// # Errors
///
/// Returns an error listing every referenced variable that is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| FerryError::Other(format!("Invalid substitution pattern: {e}")))?;
    let mut lines = Vec::new();
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            lines.push(line.to_string());
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    processed_line = processed_line.replace(&format!("${{{var_name}}}"), &value);
                }
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        lines.push(processed_line);
    }

    if !missing_vars.is_empty() {
        return Err(FerryError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(lines.join("\n"))
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(name: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse::<T>().map_err(|e| {
        FerryError::Configuration(format!("Invalid value '{value}' for {name}: {e}"))
    })
}

fn parse_env_bool(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(FerryError::Configuration(format!(
            "Invalid value '{value}' for {name}: expected true or false"
        ))),
    }
}

/// Applies environment variable overrides
///
/// Deployment variable names (`ODOO_URL`, `BQ_TABLE_ID`, `LOOKBACK_DAYS`, ...)
/// are honoured as-is; Ferry-only settings use the `FERRY_` prefix.
fn apply_env_overrides(config: &mut FerryConfig) -> Result<()> {
    // Application overrides
    if let Some(val) = env_var("FERRY_LOG_LEVEL") {
        config.application.log_level = val.to_lowercase();
    }
    if let Some(val) = env_var("FERRY_DRY_RUN") {
        config.application.dry_run = parse_env_bool("FERRY_DRY_RUN", &val)?;
    }
    if let Some(val) = env_var("ENVIRONMENT") {
        config.application.environment = RunEnvironment::from_str(&val)
            .map_err(|e| FerryError::Configuration(format!("ENVIRONMENT: {e}")))?;
    }

    // Odoo overrides
    if let Some(val) = env_var("ODOO_URL") {
        config.odoo.url = val.trim_end_matches('/').to_string();
    }
    if let Some(val) = env_var("ODOO_DB") {
        config.odoo.database = val;
    }
    if let Some(val) = env_var("ODOO_USERNAME") {
        config.odoo.username = val;
    }
    if let Some(val) = env_var("ODOO_PASSWORD") {
        config.odoo.password = Some(secret_string(val));
    }
    if let Some(val) = env_var("ODOO_MODEL") {
        config.odoo.model = val;
    }

    // BigQuery overrides
    if let Some(val) = env_var("BQ_TABLE_ID") {
        config.bigquery.table_id = val;
    }
    if let Some(val) = env_var("GOOGLE_OAUTH_ACCESS_TOKEN") {
        config.bigquery.access_token = Some(secret_string(val));
    }

    // Sync overrides
    if let Some(val) = env_var("FERRY_SYNC_MODE") {
        config.sync.mode = SyncMode::from_str(&val)
            .map_err(|e| FerryError::Configuration(format!("FERRY_SYNC_MODE: {e}")))?;
    }
    if let Some(val) = env_var("BATCH_LIMIT") {
        config.sync.batch_limit = parse_env("BATCH_LIMIT", &val)?;
    }
    if let Some(val) = env_var("BUFFER_MINUTES") {
        config.sync.buffer_minutes = parse_env("BUFFER_MINUTES", &val)?;
    }
    if let Some(val) = env_var("LOOKBACK_DAYS") {
        config.sync.lookback_days = parse_env("LOOKBACK_DAYS", &val)?;
    }
    if let Some(val) = env_var("DELETE_SYNCED_RECORDS") {
        config.sync.delete_after_sync = parse_env_bool("DELETE_SYNCED_RECORDS", &val)?;
    }
    if let Some(val) = env_var("FERRY_MAX_BATCHES") {
        config.sync.max_batches = parse_env("FERRY_MAX_BATCHES", &val)?;
    }

    // Checkpoint overrides
    if let Some(val) = env_var("GCS_BUCKET") {
        config.checkpoint.bucket = Some(val);
    }
    if let Some(val) = env_var("STATE_FILE") {
        config.checkpoint.file_name = Some(val);
    }

    Ok(())
}
