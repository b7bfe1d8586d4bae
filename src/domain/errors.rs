//! Domain error types
//!
//! This module defines the error hierarchy for Ferry. Errors are domain-specific
//! and don't expose third-party client types.

use thiserror::Error;

/// Main Ferry error type
///
/// This is the primary error type used throughout the application.
/// It wraps the source and sink error types and provides context for
/// deciding whether a failure is fatal for the run.
#[derive(Debug, Error)]
pub enum FerryError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Record source (Odoo) errors
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// Table sink (BigQuery) errors
    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),

    /// Checkpoint persistence errors
    #[error("Checkpoint error: {0}")]
    Checkpoint(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Authentication errors
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Network/connection errors
    #[error("Connection error: {0}")]
    Connection(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

impl FerryError {
    /// Whether the error comes from an unreachable or unauthorized collaborator
    ///
    /// These failures abort a run and map to the connection exit code.
    pub fn is_connectivity(&self) -> bool {
        match self {
            FerryError::Authentication(_) | FerryError::Connection(_) => true,
            FerryError::Source(e) => matches!(
                e,
                SourceError::ConnectionFailed(_)
                    | SourceError::AuthenticationFailed(_)
                    | SourceError::Timeout(_)
            ),
            FerryError::Sink(e) => matches!(
                e,
                SinkError::ConnectionFailed(_)
                    | SinkError::AuthenticationFailed(_)
                    | SinkError::Timeout(_)
            ),
            _ => false,
        }
    }
}

/// Record source errors
///
/// Errors that occur when talking to the Odoo RPC interface.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Failed to connect to the Odoo server
    #[error("Failed to connect to Odoo server: {0}")]
    ConnectionFailed(String),

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The server answered with an RPC error object
    #[error("RPC call {method} failed: {message}")]
    Rpc { method: String, message: String },

    /// Invalid response from server
    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),

    /// Server error (5xx)
    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    /// Client error (4xx)
    #[error("Client error: {status} - {message}")]
    ClientError { status: u16, message: String },

    /// Timeout
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// Deleting records failed
    #[error("Failed to delete records: {0}")]
    DeleteFailed(String),
}

/// Table sink errors
///
/// Errors that occur when talking to the warehouse.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Failed to connect to the warehouse
    #[error("Failed to connect to BigQuery: {0}")]
    ConnectionFailed(String),

    /// Authentication or authorization failed
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Table does not exist
    #[error("Table not found: {0}")]
    TableNotFound(String),

    /// Query failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// The insert request as a whole was rejected
    #[error("Insert failed: {0}")]
    InsertFailed(String),

    /// Server error (5xx)
    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    /// Timeout
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// Failed to deserialize response
    #[error("Failed to deserialize response: {0}")]
    DeserializationFailed(String),
}

// Conversion from std::io::Error
impl From<std::io::Error> for FerryError {
    fn from(err: std::io::Error) -> Self {
        FerryError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for FerryError {
    fn from(err: serde_json::Error) -> Self {
        FerryError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for FerryError {
    fn from(err: toml::de::Error) -> Self {
        FerryError::Configuration(format!("TOML parse error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ferry_error_display() {
        let err = FerryError::Configuration("Invalid config".to_string());
        assert_eq!(err.to_string(), "Configuration error: Invalid config");
    }

    #[test]
    fn test_source_error_conversion() {
        let source_err = SourceError::ConnectionFailed("Network error".to_string());
        let err: FerryError = source_err.into();
        assert!(matches!(err, FerryError::Source(_)));
        assert!(err.is_connectivity());
    }

    #[test]
    fn test_sink_error_conversion() {
        let sink_err = SinkError::TableNotFound("p.d.t".to_string());
        let err: FerryError = sink_err.into();
        assert!(matches!(err, FerryError::Sink(_)));
        assert!(!err.is_connectivity());
    }

    #[test]
    fn test_rpc_error_display() {
        let err = SourceError::Rpc {
            method: "search_read".to_string(),
            message: "Invalid field".to_string(),
        };
        assert_eq!(err.to_string(), "RPC call search_read failed: Invalid field");
    }

    #[test]
    fn test_auth_errors_are_connectivity() {
        assert!(FerryError::Authentication("nope".to_string()).is_connectivity());
        assert!(FerryError::from(SinkError::AuthenticationFailed("403".to_string()))
            .is_connectivity());
        assert!(!FerryError::Validation("bad".to_string()).is_connectivity());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let err: FerryError = io_err.into();
        assert!(matches!(err, FerryError::Io(_)));
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err: FerryError = json_err.into();
        assert!(matches!(err, FerryError::Serialization(_)));
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_err = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
        let err: FerryError = toml_err.into();
        assert!(matches!(err, FerryError::Configuration(_)));
        assert!(err.to_string().contains("TOML parse error"));
    }
}
