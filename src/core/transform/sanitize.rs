//! Record sanitization
//!
//! Converts a source record into a warehouse row whose values are all plain
//! strings, numbers or NULL.

use crate::domain::record::{FieldValue, Record};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// A single warehouse-compatible value
#[derive(Debug, Clone, PartialEq)]
pub enum SanitizedValue {
    Null,
    Text(String),
    Number(serde_json::Number),
}

impl Serialize for SanitizedValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            SanitizedValue::Null => serializer.serialize_none(),
            SanitizedValue::Text(s) => serializer.serialize_str(s),
            SanitizedValue::Number(n) => n.serialize(serializer),
        }
    }
}

/// A sanitized row, keyed by field name
///
/// Carries exactly the field set of the record it was built from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SanitizedRow(BTreeMap<String, SanitizedValue>);

impl SanitizedRow {
    /// Looks up a value by field name
    pub fn get(&self, field: &str) -> Option<&SanitizedValue> {
        self.0.get(field)
    }

    /// Number of fields in the row
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the row has no fields
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over fields in name order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &SanitizedValue)> {
        self.0.iter()
    }

    /// Converts the row into a JSON object for the insert payload
    pub fn into_json(self) -> serde_json::Map<String, serde_json::Value> {
        self.0
            .into_iter()
            .map(|(k, v)| {
                let json = match v {
                    SanitizedValue::Null => serde_json::Value::Null,
                    SanitizedValue::Text(s) => serde_json::Value::String(s),
                    SanitizedValue::Number(n) => serde_json::Value::Number(n),
                };
                (k, json)
            })
            .collect()
    }
}

/// Sanitizes a full record
///
/// Total and deterministic: the same record always yields the same row.
///
/// # Examples
///
/// ```
/// use ferry::core::transform::{sanitize, SanitizedValue};
/// use ferry::domain::Record;
/// use serde_json::json;
///
/// let record = Record::from_json(json!({
///     "id": 1,
///     "create_date": "2025-01-01 00:00:00",
///     "is_locked": false,
///     "note": "  "
/// })).unwrap();
///
/// let row = sanitize(&record);
/// assert_eq!(row.get("is_locked"), Some(&SanitizedValue::Text("false".to_string())));
/// assert_eq!(row.get("note"), Some(&SanitizedValue::Null));
/// ```
pub fn sanitize(record: &Record) -> SanitizedRow {
    SanitizedRow(
        record
            .fields
            .iter()
            .map(|(name, value)| (name.clone(), sanitize_value(value)))
            .collect(),
    )
}

/// Sanitizes a single field value
///
/// Precedence: empty sentinel and blank strings become NULL, booleans become
/// `"true"`/`"false"`, empty collections become NULL, non-empty collections
/// become JSON text with sorted keys, other scalars pass through.
pub fn sanitize_value(value: &FieldValue) -> SanitizedValue {
    match value {
        FieldValue::Empty => SanitizedValue::Null,
        FieldValue::Text(s) if s.trim().is_empty() => SanitizedValue::Null,
        FieldValue::Text(s) => SanitizedValue::Text(s.clone()),
        FieldValue::Boolean(b) => SanitizedValue::Text(b.to_string()),
        FieldValue::Number(n) => SanitizedValue::Number(n.clone()),
        FieldValue::List(items) if items.is_empty() => SanitizedValue::Null,
        FieldValue::Object(map) if map.is_empty() => SanitizedValue::Null,
        FieldValue::List(_) | FieldValue::Object(_) => to_json_text(value),
    }
}

fn to_json_text(value: &FieldValue) -> SanitizedValue {
    // FieldValue serialization is infallible: map keys are strings and numbers
    // are already valid JSON numbers.
    match serde_json::to_string(value) {
        Ok(text) => SanitizedValue::Text(text),
        Err(_) => SanitizedValue::Null,
    }
}
