//! Integration tests for logging functionality

use ferry::config::LoggingConfig;
use ferry::logging::{init_logging, parse_log_level};
use tempfile::TempDir;
use tracing::Level;

#[test]
fn test_logging_config_default() {
    let config = LoggingConfig::default();
    assert!(!config.local_enabled);
    assert_eq!(config.local_path, "./logs");
    assert_eq!(config.local_rotation, "daily");
    assert!(config.json_console.is_none());
}

#[test]
fn test_logging_config_from_toml() {
    let config: LoggingConfig = toml::from_str(
        r#"
local_enabled = true
local_path = "/var/log/ferry"
local_rotation = "hourly"
json_console = false
"#,
    )
    .unwrap();

    assert!(config.local_enabled);
    assert_eq!(config.local_path, "/var/log/ferry");
    assert_eq!(config.local_rotation, "hourly");
    assert_eq!(config.json_console, Some(false));
}

#[test]
fn test_parse_log_level_is_case_insensitive() {
    assert_eq!(parse_log_level("INFO").unwrap(), Level::INFO);
    assert_eq!(parse_log_level("Warn").unwrap(), Level::WARN);
    assert!(parse_log_level("verbose").is_err());
}

#[test]
fn test_invalid_level_is_rejected_before_init() {
    let config = LoggingConfig::default();
    let err = init_logging("chatty", &config, false).err().unwrap();
    assert!(err.to_string().contains("Invalid log level"));
}

// The only test in this binary that installs the global subscriber
#[test]
fn test_local_logging_creates_directory() {
    let temp_dir = TempDir::new().unwrap();
    let log_path = temp_dir.path().join("logs");

    let config = LoggingConfig {
        local_enabled: true,
        local_path: log_path.to_string_lossy().to_string(),
        local_rotation: "never".to_string(),
        json_console: Some(false),
    };

    assert!(!log_path.exists());

    let guard = init_logging("debug", &config, false).unwrap();
    tracing::info!(model = "sale.order", "Logging smoke test");
    drop(guard);

    assert!(log_path.is_dir());
}
