//! Constant field assignment
//!
//! The stock transform: write a fixed set of field values into every record,
//! after checking that the fields the business rule depends on are present.

use super::RecordTransform;
use crate::domain::{ChunkwiseError, Record, Result};
use serde_json::Value;
use std::collections::BTreeMap;

/// Assigns constant values to fields of every record
///
/// Records missing one of the required fields (or holding `null` there) are
/// rejected before anything is written.
#[derive(Debug, Clone, Default)]
pub struct FieldAssignment {
    assignments: BTreeMap<String, Value>,
    required_fields: Vec<String>,
}

impl FieldAssignment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field assignment
    pub fn assign(mut self, field: impl Into<String>, value: Value) -> Self {
        self.assignments.insert(field.into(), value);
        self
    }

    /// Adds a field that must be present and non-null
    pub fn require(mut self, field: impl Into<String>) -> Self {
        self.required_fields.push(field.into());
        self
    }

    /// Builds an assignment from configuration values
    pub fn from_config(assignments: &BTreeMap<String, Value>, required_fields: &[String]) -> Self {
        Self {
            assignments: assignments.clone(),
            required_fields: required_fields.to_vec(),
        }
    }

    pub fn assignments(&self) -> &BTreeMap<String, Value> {
        &self.assignments
    }

    pub fn required_fields(&self) -> &[String] {
        &self.required_fields
    }
}

impl RecordTransform for FieldAssignment {
    fn apply(&self, record: &mut Record) -> Result<()> {
        let missing: Vec<&str> = self
            .required_fields
            .iter()
            .filter(|field| !record.has_value(field))
            .map(String::as_str)
            .collect();

        if !missing.is_empty() {
            return Err(ChunkwiseError::transform(
                record.id.as_str(),
                format!("missing required field(s): {}", missing.join(", ")),
            ));
        }

        for (field, value) in &self.assignments {
            record.set_field(field.clone(), value.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RecordId;
    use serde_json::json;

    fn record(name: Option<&str>) -> Record {
        let record = Record::new(RecordId::new("acc-1").unwrap());
        match name {
            Some(name) => record.with_field("name", json!(name)),
            None => record,
        }
    }

    #[test]
    fn test_assigns_constant_values() {
        let transform = FieldAssignment::new()
            .assign("status", json!("processed"))
            .assign("priority", json!(1));

        let mut record = record(Some("Acme"));
        transform.apply(&mut record).unwrap();

        assert_eq!(record.field("status"), Some(&json!("processed")));
        assert_eq!(record.field("priority"), Some(&json!(1)));
        assert_eq!(record.field("name"), Some(&json!("Acme")));
    }

    #[test]
    fn test_overwrites_existing_values() {
        let transform = FieldAssignment::new().assign("name", json!("Renamed"));

        let mut record = record(Some("Acme"));
        transform.apply(&mut record).unwrap();
        assert_eq!(record.field("name"), Some(&json!("Renamed")));
    }

    #[test]
    fn test_rejects_missing_required_field() {
        let transform = FieldAssignment::new()
            .assign("status", json!("processed"))
            .require("name");

        let mut record = record(None);
        let err = transform.apply(&mut record).unwrap_err();

        assert!(matches!(err, ChunkwiseError::RecordTransform { .. }));
        assert!(err.to_string().contains("name"));
        assert!(record.field("status").is_none());
    }

    #[test]
    fn test_null_counts_as_missing() {
        let transform = FieldAssignment::new().require("name");
        let mut record = Record::new(RecordId::new("acc-1").unwrap()).with_field("name", Value::Null);

        assert!(transform.apply(&mut record).is_err());
    }

    #[test]
    fn test_from_config() {
        let mut assignments = BTreeMap::new();
        assignments.insert("status".to_string(), json!("processed"));
        let transform = FieldAssignment::from_config(&assignments, &["name".to_string()]);

        assert_eq!(transform.assignments().len(), 1);
        assert_eq!(transform.required_fields(), ["name".to_string()]);
    }
}
