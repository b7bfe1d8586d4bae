//! Data transformation logic
//!
//! This module converts source records into warehouse rows and renders the
//! table definition used when the destination table is missing:
//!
//! - **Sanitize**: one record to one row of strings, numbers and NULLs
//! - **Schema**: `CREATE TABLE` statement from source field metadata

pub mod sanitize;
pub mod schema;

pub use sanitize::{sanitize, sanitize_value, SanitizedRow, SanitizedValue};
pub use schema::{create_table_statement, ColumnType, CreateTableStatement};
