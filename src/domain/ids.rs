//! Domain identifier types with validation
//!
//! This module provides newtype wrappers for the identifiers that flow between
//! the record source and the warehouse. Each type validates its format once at
//! construction so downstream code can rely on it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Source record identifier
///
/// Odoo primary keys are positive integers, unique within a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(i64);

impl RecordId {
    /// Creates a new RecordId
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw integer value
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for RecordId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Source model name newtype wrapper
///
/// Represents an Odoo model technical name such as `sale.order`.
///
/// # Examples
///
/// ```
/// use ferry::domain::ids::ModelName;
///
/// let model = ModelName::new("sale.order").unwrap();
/// assert_eq!(model.as_str(), "sale.order");
/// assert_eq!(model.file_stem(), "sale_order");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelName(String);

impl ModelName {
    /// Creates a new ModelName from a string
    ///
    /// # Returns
    ///
    /// Returns `Ok(ModelName)` if the name is non-empty and contains no whitespace
    pub fn new(name: impl Into<String>) -> Result<Self, String> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err("Model name cannot be empty".to_string());
        }
        if name.chars().any(char::is_whitespace) {
            return Err(format!("Model name cannot contain whitespace: '{name}'"));
        }
        Ok(Self(name))
    }

    /// Returns the model name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Model name with dots replaced by underscores, used for file names
    pub fn file_stem(&self) -> String {
        self.0.replace('.', "_")
    }
}

impl fmt::Display for ModelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ModelName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for ModelName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Fully qualified warehouse table identifier
///
/// Format: `{project}.{dataset}.{table}`
///
/// # Examples
///
/// ```
/// use ferry::domain::ids::TableId;
/// use std::str::FromStr;
///
/// let table = TableId::from_str("acme-prod.erp.sale_order").unwrap();
/// assert_eq!(table.project(), "acme-prod");
/// assert_eq!(table.dataset(), "erp");
/// assert_eq!(table.table(), "sale_order");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableId {
    project: String,
    dataset: String,
    table: String,
}

impl TableId {
    /// Parses a `project.dataset.table` string
    pub fn parse(id: &str) -> Result<Self, String> {
        let parts: Vec<&str> = id.trim().split('.').collect();
        if parts.len() != 3 || parts.iter().any(|p| p.trim().is_empty()) {
            return Err(format!(
                "Invalid table id format. Expected format: {{project}}.{{dataset}}.{{table}}, got: {id}"
            ));
        }

        Ok(Self {
            project: parts[0].to_string(),
            dataset: parts[1].to_string(),
            table: parts[2].to_string(),
        })
    }

    /// GCP project that owns the dataset
    pub fn project(&self) -> &str {
        &self.project
    }

    /// Dataset containing the table
    pub fn dataset(&self) -> &str {
        &self.dataset
    }

    /// Table name within the dataset
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Backtick-quoted form for use in SQL statements
    pub fn quoted(&self) -> String {
        format!("`{self}`")
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.project, self.dataset, self.table)
    }
}

impl FromStr for TableId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Idempotency key attached to every inserted row
///
/// Built as `{model}_{id}` so retried inserts of the same record collapse in
/// the warehouse.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InsertId(String);

impl InsertId {
    /// Builds the insert id for a record of the given model
    pub fn for_record(model: &ModelName, id: RecordId) -> Self {
        Self(format!("{}_{}", model.as_str(), id))
    }

    /// Returns the insert id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InsertId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
