//! Domain models and types for Ferry.
//!
//! This module contains the core domain types shared by the sync engine and
//! the adapters.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`RecordId`], [`ModelName`], [`TableId`], [`InsertId`])
//! - **Source records** ([`Record`], [`FieldValue`])
//! - **Error types** ([`FerryError`], [`SourceError`], [`SinkError`])
//! - **Result type alias** ([`Result`])
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, FerryError>`]:
//!
//! ```rust
//! use ferry::domain::{ModelName, Result, FerryError};
//!
//! fn example() -> Result<ModelName> {
//!     ModelName::new("sale.order").map_err(FerryError::Validation)
//! }
//! ```

pub mod errors;
pub mod ids;
pub mod record;
pub mod result;

// Re-export commonly used types for convenience
pub use errors::{FerryError, SinkError, SourceError};
pub use ids::{InsertId, ModelName, RecordId, TableId};
pub use record::{FieldValue, Record};
pub use result::Result;
