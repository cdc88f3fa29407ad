//! Deterministic canonical serialization for audit payloads.
//!
//! Turns a [`Value`] tree into one string whose bytes depend only on the
//! logical content:
//!
//! - Record keys are emitted in ordinal (byte-wise) order, never in insertion order.
//! - Sequences keep their given order. Callers needing order independence
//!   must sort before canonicalizing.
//! - `BigInt` values are emitted as quoted decimal strings.
//! - Dates are emitted as quoted `YYYY-MM-DDTHH:MM:SS.mmmZ`; an unknown date is `null`.
//!
//! Lists and records are shared, interior-mutable nodes, so a graph handed
//! to the canonicalizer may contain cycles. Cycles are detected by node
//! identity on the active path and reported as
//! [`SerializationError::Circular`]. The same node reached twice through
//! sibling branches is not a cycle.

use std::cell::{Ref, RefCell, RefMut};
use std::collections::HashSet;
use std::fmt::{self, Write as _};
use std::rc::Rc;

use chrono::{DateTime, SecondsFormat, Utc};
use thiserror::Error;

/// Errors raised while canonicalizing a value.
#[derive(Debug, Error)]
pub enum SerializationError {
    /// A list or record was re-entered while it was still being serialized.
    #[error("circular structure at {path}")]
    Circular { path: String },

    /// A string could not be JSON-escaped.
    #[error("failed to encode string: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// A shared, mutable list or record node.
///
/// Cloning a `Node` clones the handle, not the contents: both clones refer
/// to the same node and compare identical for cycle detection.
pub struct Node<T>(Rc<RefCell<T>>);

impl<T> Node<T> {
    #[must_use]
    pub fn new(inner: T) -> Self {
        Self(Rc::new(RefCell::new(inner)))
    }

    /// Borrow the node contents.
    ///
    /// # Panics
    ///
    /// Panics if the node is currently mutably borrowed.
    #[must_use]
    pub fn contents(&self) -> Ref<'_, T> {
        self.0.borrow()
    }

    /// Mutably borrow the node contents, e.g. to close a cycle in tests.
    ///
    /// # Panics
    ///
    /// Panics if the node is currently borrowed.
    #[must_use]
    pub fn contents_mut(&self) -> RefMut<'_, T> {
        self.0.borrow_mut()
    }

    /// Whether two handles point at the same node.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    fn identity(&self) -> usize {
        Rc::as_ptr(&self.0).cast::<()>() as usize
    }
}

impl<T> Clone for Node<T> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

// Contents are not printed: a cyclic graph would recurse forever.
impl<T> fmt::Debug for Node<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({:p})", Rc::as_ptr(&self.0))
    }
}

/// A keyed record. Holds at most one entry per key; insertion order is kept
/// for inspection but never affects canonical output.
#[derive(Debug, Clone, Default)]
pub struct Record {
    entries: Vec<(String, Value)>,
}

impl Record {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Insert or replace the value under `key`.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            self.entries.push((key, value));
        }
    }

    /// Builder form of [`Record::insert`].
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Any value reachable from the audited surface.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    /// Integers beyond `i64`, emitted as quoted strings.
    BigInt(i128),
    Text(String),
    /// `None` is an unknown or unparseable date.
    Date(Option<DateTime<Utc>>),
    List(Node<Vec<Value>>),
    Record(Node<Record>),
}

impl Value {
    #[must_use]
    pub fn list(items: impl IntoIterator<Item = Self>) -> Self {
        Self::List(Node::new(items.into_iter().collect()))
    }

    #[must_use]
    pub fn record(record: Record) -> Self {
        Self::Record(Node::new(record))
    }

    /// Parse a stored timestamp. Accepts RFC 3339 and `YYYY-MM-DD HH:MM:SS`;
    /// anything else becomes an unknown date rather than an error.
    #[must_use]
    pub fn parse_date(text: &str) -> Self {
        if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
            return Self::Date(Some(dt.with_timezone(&Utc)));
        }
        Self::Date(
            chrono::NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|naive| naive.and_utc()),
        )
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u8> for Value {
    fn from(v: u8) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<i128> for Value {
    fn from(v: i128) -> Self {
        Self::BigInt(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Self::Date(Some(v))
    }
}

impl From<Record> for Value {
    fn from(v: Record) -> Self {
        Self::record(v)
    }
}

impl From<Vec<Self>> for Value {
    fn from(v: Vec<Self>) -> Self {
        Self::List(Node::new(v))
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::Int(i)
                } else if let Some(u) = n.as_u64() {
                    Self::BigInt(i128::from(u))
                } else {
                    n.as_f64().map_or(Self::Null, Self::Float)
                }
            }
            serde_json::Value::String(s) => Self::Text(s),
            serde_json::Value::Array(items) => Self::list(items.into_iter().map(Self::from)),
            serde_json::Value::Object(map) => {
                let mut record = Record::new();
                for (k, v) in map {
                    record.insert(k, Self::from(v));
                }
                Self::record(record)
            }
        }
    }
}

/// Serialize `value` into its canonical string.
///
/// # Errors
///
/// Returns [`SerializationError::Circular`] if a list or record contains
/// itself, directly or through descendants.
pub fn canonicalize(value: &Value) -> Result<String, SerializationError> {
    let mut writer = CanonicalWriter::default();
    writer.write_value(value)?;
    Ok(writer.out)
}

#[derive(Default)]
struct CanonicalWriter {
    out: String,
    active: HashSet<usize>,
    path: Vec<String>,
}

impl CanonicalWriter {
    fn write_value(&mut self, value: &Value) -> Result<(), SerializationError> {
        match value {
            Value::Null | Value::Date(None) => self.out.push_str("null"),
            Value::Bool(b) => self.out.push_str(if *b { "true" } else { "false" }),
            Value::Int(i) => {
                let _ = write!(self.out, "{i}");
            }
            Value::Float(f) => match serde_json::Number::from_f64(*f) {
                Some(n) => {
                    let _ = write!(self.out, "{n}");
                }
                None => self.out.push_str("null"),
            },
            Value::BigInt(i) => {
                let _ = write!(self.out, "\"{i}\"");
            }
            Value::Text(s) => self.write_str(s)?,
            Value::Date(Some(dt)) => {
                let _ = write!(
                    self.out,
                    "\"{}\"",
                    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
                );
            }
            Value::List(node) => {
                self.enter(node.identity())?;
                self.out.push('[');
                for (idx, item) in node.contents().iter().enumerate() {
                    if idx > 0 {
                        self.out.push(',');
                    }
                    self.path.push(format!("[{idx}]"));
                    self.write_value(item)?;
                    self.path.pop();
                }
                self.out.push(']');
                self.leave(node.identity());
            }
            Value::Record(node) => {
                self.enter(node.identity())?;
                let record = node.contents();
                let mut entries: Vec<&(String, Value)> = record.entries.iter().collect();
                entries.sort_unstable_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));

                self.out.push('{');
                for (idx, (key, item)) in entries.into_iter().enumerate() {
                    if idx > 0 {
                        self.out.push(',');
                    }
                    self.write_str(key)?;
                    self.out.push(':');
                    self.path.push(format!(".{key}"));
                    self.write_value(item)?;
                    self.path.pop();
                }
                self.out.push('}');
                self.leave(node.identity());
            }
        }
        Ok(())
    }

    fn write_str(&mut self, s: &str) -> Result<(), SerializationError> {
        self.out.push_str(&serde_json::to_string(s)?);
        Ok(())
    }

    fn enter(&mut self, identity: usize) -> Result<(), SerializationError> {
        if self.active.insert(identity) {
            Ok(())
        } else {
            Err(SerializationError::Circular {
                path: format!("${}", self.path.concat()),
            })
        }
    }

    fn leave(&mut self, identity: usize) {
        self.active.remove(&identity);
    }
}
