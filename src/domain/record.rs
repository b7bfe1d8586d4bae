//! Source record domain model
//!
//! This module defines the `Record` type fetched from the ERP and the closed
//! `FieldValue` variant each raw field value is converted to at the adapter
//! boundary.

use super::ids::RecordId;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// Timestamp layout used by Odoo for datetime fields and domain literals
pub const ODOO_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A single field value as delivered by the record source
///
/// Odoo encodes an unset field as `false` or `null`; relational fields arrive
/// as `[id, "label"]` pairs or id lists. `null` maps to `Empty`, while `false`
/// stays a `Boolean` because the two cannot be told apart without field
/// metadata.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// The source's empty sentinel
    Empty,
    Boolean(bool),
    Number(serde_json::Number),
    Text(String),
    /// Composite references and id lists
    List(Vec<FieldValue>),
    /// Nested objects, keys kept sorted
    Object(BTreeMap<String, FieldValue>),
}

impl FieldValue {
    /// Converts a raw JSON value into the closed variant
    pub fn from_json(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => FieldValue::Empty,
            serde_json::Value::Bool(b) => FieldValue::Boolean(b),
            serde_json::Value::Number(n) => FieldValue::Number(n),
            serde_json::Value::String(s) => FieldValue::Text(s),
            serde_json::Value::Array(items) => {
                FieldValue::List(items.into_iter().map(FieldValue::from_json).collect())
            }
            serde_json::Value::Object(map) => FieldValue::Object(
                map.into_iter()
                    .map(|(k, v)| (k, FieldValue::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Returns the text content, if this is a text value
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Empty => serializer.serialize_none(),
            FieldValue::Boolean(b) => serializer.serialize_bool(*b),
            FieldValue::Number(n) => n.serialize(serializer),
            FieldValue::Text(s) => serializer.serialize_str(s),
            FieldValue::List(items) => items.serialize(serializer),
            FieldValue::Object(map) => map.serialize(serializer),
        }
    }
}

/// A record fetched from the source
///
/// `fields` holds every field returned by the source, including `id` and
/// `create_date`, so the sanitized row carries the same field set.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Primary key, unique within the model
    pub id: RecordId,

    /// Creation timestamp, the ordering and windowing key
    pub create_date: DateTime<Utc>,

    /// All fields keyed by name
    pub fields: BTreeMap<String, FieldValue>,
}

impl Record {
    /// Builds a record from a raw JSON object returned by `search_read`
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not an object, or if `id` or
    /// `create_date` is missing or malformed.
    pub fn from_json(value: serde_json::Value) -> Result<Self, String> {
        let serde_json::Value::Object(map) = value else {
            return Err("record is not a JSON object".to_string());
        };

        let fields: BTreeMap<String, FieldValue> = map
            .into_iter()
            .map(|(k, v)| (k, FieldValue::from_json(v)))
            .collect();

        let id = match fields.get("id") {
            Some(FieldValue::Number(n)) => n
                .as_i64()
                .map(RecordId::new)
                .ok_or_else(|| format!("record id is not an integer: {n}"))?,
            other => return Err(format!("record is missing an integer id: {other:?}")),
        };

        let create_date = match fields.get("create_date").and_then(FieldValue::as_text) {
            Some(raw) => parse_odoo_datetime(raw)
                .ok_or_else(|| format!("record {id} has an unparseable create_date: {raw}"))?,
            None => return Err(format!("record {id} is missing create_date")),
        };

        Ok(Self {
            id,
            create_date,
            fields,
        })
    }
}

/// Parses an Odoo datetime string (UTC, `YYYY-MM-DD HH:MM:SS`)
///
/// Fractional seconds and RFC 3339 strings are accepted as well.
pub fn parse_odoo_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, ODOO_DATETIME_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .map(|naive| Utc.from_utc_datetime(&naive))
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|dt| dt.with_timezone(&Utc))
        })
}

/// Formats a timestamp the way Odoo expects in domain literals
pub fn format_odoo_datetime(ts: &DateTime<Utc>) -> String {
    ts.format(ODOO_DATETIME_FORMAT).to_string()
}
