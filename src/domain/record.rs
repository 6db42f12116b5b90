//! Record domain model
//!
//! A record is an opaque entity with a unique identifier and a mapping of
//! field name to value. Records are serialised flat, with the identifier
//! stored under `id` next to the fields.

use super::ids::RecordId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A single record flowing through the batch engine
///
/// # Examples
///
/// ```
/// use chunkwise::domain::{Record, RecordId};
/// use serde_json::json;
///
/// let mut record = Record::new(RecordId::new("acc-1").unwrap())
///     .with_field("name", json!("Acme"));
/// record.set_field("status", json!("processed"));
///
/// assert_eq!(record.field("status"), Some(&json!("processed")));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Unique identifier
    pub id: RecordId,

    /// Field values keyed by field name
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
}

impl Record {
    /// Creates a record with no fields
    pub fn new(id: RecordId) -> Self {
        Self {
            id,
            fields: BTreeMap::new(),
        }
    }

    /// Adds a field, builder style
    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    /// Returns a field value, if present
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Sets a field value, returning the previous value
    pub fn set_field(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.fields.insert(name.into(), value)
    }

    /// Returns true if the field is present and not null
    pub fn has_value(&self, name: &str) -> bool {
        self.fields.get(name).is_some_and(|v| !v.is_null())
    }
}
