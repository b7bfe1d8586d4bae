//! Warehouse schema remediation
//!
//! When the destination table is missing, the sync stops and prints a
//! `CREATE TABLE` statement derived from the source model's field metadata.

use crate::domain::ids::TableId;
use std::collections::BTreeMap;
use std::fmt;

/// Warehouse column type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Float64,
    String,
}

impl ColumnType {
    /// Maps an Odoo field type to the column type its sanitized value needs
    ///
    /// Booleans, dates and relational fields are sanitized to text, so only
    /// numeric types get a numeric column.
    pub fn from_odoo_type(field_type: &str) -> Self {
        match field_type {
            "integer" => ColumnType::Integer,
            "float" | "monetary" => ColumnType::Float64,
            _ => ColumnType::String,
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnType::Integer => "INTEGER",
            ColumnType::Float64 => "FLOAT64",
            ColumnType::String => "STRING",
        };
        write!(f, "{name}")
    }
}

/// A rendered `CREATE TABLE` statement in two layouts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTableStatement {
    /// One column per line
    pub formatted: String,
    /// Single line, for copy-paste into a console
    pub one_line: String,
}

/// Builds the `CREATE TABLE` statement for a table from field metadata
///
/// `fields` maps field names to Odoo field types. `id` and `create_date` are
/// always emitted first.
pub fn create_table_statement(
    table: &TableId,
    fields: &BTreeMap<String, String>,
) -> CreateTableStatement {
    let columns = ordered_columns(fields);

    let body: Vec<String> = columns
        .iter()
        .map(|(name, ty)| format!("`{name}` {ty}"))
        .collect();

    let formatted = format!(
        "CREATE TABLE {} (\n  {}\n);",
        table.quoted(),
        body.join(",\n  ")
    );
    let one_line = format!("CREATE TABLE {} ({});", table.quoted(), body.join(", "));

    CreateTableStatement {
        formatted,
        one_line,
    }
}

fn ordered_columns(fields: &BTreeMap<String, String>) -> Vec<(String, ColumnType)> {
    let mut columns = vec![
        ("id".to_string(), ColumnType::Integer),
        ("create_date".to_string(), ColumnType::String),
    ];

    columns.extend(
        fields
            .iter()
            .filter(|(name, _)| name.as_str() != "id" && name.as_str() != "create_date")
            .map(|(name, ty)| (name.clone(), ColumnType::from_odoo_type(ty))),
    );

    columns
}
