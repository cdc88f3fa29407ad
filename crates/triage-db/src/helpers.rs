//! Row-to-entity parsing helpers.
//!
//! Every repo needs to convert `libsql::Row` (column-indexed) into typed entity
//! structs. These helpers isolate the parsing logic and handle the dual datetime
//! format issue (`SQLite`'s `datetime('now')` vs Rust's RFC 3339 output).

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use triage_core::payload::UnreadableTimestamp;

use crate::error::DatabaseError;

/// Current time at the millisecond precision that storage and the canonical
/// payload both use, so an in-memory entity equals its re-read row.
#[must_use]
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// Format a timestamp for a TEXT column.
#[must_use]
pub fn fmt_datetime(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Format an optional timestamp for a nullable TEXT column.
#[must_use]
pub fn fmt_optional_datetime(dt: Option<DateTime<Utc>>) -> Option<String> {
    dt.map(fmt_datetime)
}

/// Parse a required TEXT column as `DateTime<Utc>`.
///
/// Handles both RFC 3339 (`"2026-02-09T14:30:00.000Z"`) and `SQLite`'s default
/// format (`"2026-02-09 14:30:00"`).
///
/// # Errors
///
/// Returns `DatabaseError::Query` if the string cannot be parsed as either format.
pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>, DatabaseError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map(|naive| naive.and_utc())
        .map_err(|e| DatabaseError::Query(format!("Failed to parse datetime '{s}': {e}")))
}

/// Parse an optional TEXT column as `Option<DateTime<Utc>>`.
///
/// # Errors
///
/// Returns `DatabaseError::Query` if a non-empty string cannot be parsed.
pub fn parse_optional_datetime(s: Option<&str>) -> Result<Option<DateTime<Utc>>, DatabaseError> {
    match s {
        Some(s) if !s.is_empty() => Ok(Some(parse_datetime(s)?)),
        _ => Ok(None),
    }
}

/// Parse a TEXT column into a serde-deserializable enum.
///
/// Works with all triage-core enums that use `#[serde(rename_all = "snake_case")]`.
///
/// # Errors
///
/// Returns `DatabaseError::Query` if the string does not match any enum variant.
pub fn parse_enum<T: serde::de::DeserializeOwned>(s: &str) -> Result<T, DatabaseError> {
    serde_json::from_value(serde_json::Value::String(s.to_string()))
        .map_err(|e| DatabaseError::Query(format!("Failed to parse enum from '{s}': {e}")))
}

/// Read a nullable TEXT column as stored. An empty string stays `Some("")`.
///
/// `row.get::<String>(idx)` on a NULL column returns an error, not `""`.
/// You must use `get::<Option<String>>()` for nullable columns.
///
/// # Errors
///
/// Returns `DatabaseError` if the column read fails.
pub fn get_opt_string(row: &libsql::Row, idx: i32) -> Result<Option<String>, DatabaseError> {
    Ok(row.get::<Option<String>>(idx)?)
}

/// Trim an optional text input; blank becomes `None`. Writes go through this
/// so a stored nullable column is either NULL or non-empty.
#[must_use]
pub fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

/// Decodes timestamp columns for row parsers.
///
/// A strict reader fails on text that does not parse. A lenient reader, used
/// for audit snapshots, substitutes a placeholder (`None`, or the Unix epoch
/// for required columns) and records the raw text, which the payload then
/// projects as `null`.
#[derive(Debug, Default)]
pub(crate) struct DateReader {
    lenient: bool,
    unreadable: Vec<UnreadableTimestamp>,
}

impl DateReader {
    pub(crate) fn strict() -> Self {
        Self::default()
    }

    pub(crate) fn lenient() -> Self {
        Self {
            lenient: true,
            unreadable: Vec::new(),
        }
    }

    /// Read a NOT NULL timestamp column of row `(collection, key)`.
    pub(crate) fn required(
        &mut self,
        row: &libsql::Row,
        idx: i32,
        (collection, key): (&str, &str),
        field: &str,
    ) -> Result<DateTime<Utc>, DatabaseError> {
        let raw = row.get::<String>(idx)?;
        match parse_datetime(&raw) {
            Ok(at) => Ok(at),
            Err(_) if self.lenient => {
                self.record(collection, key, field, raw);
                Ok(DateTime::default())
            }
            Err(e) => Err(e),
        }
    }

    /// Read a nullable timestamp column of row `(collection, key)`.
    pub(crate) fn optional(
        &mut self,
        row: &libsql::Row,
        idx: i32,
        (collection, key): (&str, &str),
        field: &str,
    ) -> Result<Option<DateTime<Utc>>, DatabaseError> {
        let raw = row.get::<Option<String>>(idx)?;
        match parse_optional_datetime(raw.as_deref()) {
            Ok(at) => Ok(at),
            Err(_) if self.lenient => {
                self.record(collection, key, field, raw.unwrap_or_default());
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn record(&mut self, collection: &str, key: &str, field: &str, raw: String) {
        tracing::warn!(collection, key, field, raw = %raw, "stored timestamp does not parse");
        self.unreadable.push(UnreadableTimestamp {
            collection: collection.to_string(),
            key: key.to_string(),
            field: field.to_string(),
            raw,
        });
    }

    pub(crate) fn into_unreadable(self) -> Vec<UnreadableTimestamp> {
        self.unreadable
    }
}
