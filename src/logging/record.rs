//! Structured log records and their builder
//!
//! A [`LogRecordBuilder`] accumulates attributes through chained setters and
//! produces an immutable [`LogRecord`] snapshot on [`LogRecordBuilder::build`].
//! The builder is not reset by `build`: building twice yields two equal,
//! independent records, and any setter applied in between shows up only in
//! the second one.
//!
//! # Example
//!
//! ```
//! use chunkwise::logging::attributes::{Category, FunctionalArea, LogType, Severity};
//! use chunkwise::logging::context::FixedContext;
//! use chunkwise::logging::record::LogRecordBuilder;
//!
//! let context = FixedContext::new(Some("req-42"), 1_700_000_000_000);
//! let record = LogRecordBuilder::new(&context)
//!     .category(Category::Error)
//!     .log_type(LogType::Batch)
//!     .functional_area("Nightly Cleanup")
//!     .level(Severity::Error)
//!     .summary("Chunk 2 failed to commit")
//!     .related_objects(["acc-1", "acc-2", "acc-1", "bad id"])
//!     .build();
//!
//! assert_eq!(record.request_id(), Some("req-42"));
//! assert_eq!(record.related_objects().len(), 2);
//! assert!(record.issue_creation_suppressed());
//! ```

use super::attributes::{AttributeKey, Category, FunctionalArea, LogType, OpenValue, Severity};
use super::context::ExecutionContext;
use crate::domain::{RecordId, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

/// Immutable structured log record
///
/// Serialises as a flat JSON object of attribute name to value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogRecord {
    attributes: BTreeMap<String, Value>,
}

impl LogRecord {
    /// Returns any attribute by name
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// Returns a well-known attribute
    pub fn get_key(&self, key: AttributeKey) -> Option<&Value> {
        self.attributes.get(key.name())
    }

    /// All attributes in canonical name order
    pub fn attributes(&self) -> &BTreeMap<String, Value> {
        &self.attributes
    }

    fn str_attr(&self, key: AttributeKey) -> Option<&str> {
        self.get_key(key).and_then(Value::as_str)
    }

    pub fn category(&self) -> Option<Category> {
        self.str_attr(AttributeKey::Category)?.parse().ok()
    }

    pub fn log_type(&self) -> Option<OpenValue<LogType>> {
        self.str_attr(AttributeKey::Type).map(OpenValue::parse)
    }

    pub fn functional_area(&self) -> Option<OpenValue<FunctionalArea>> {
        self.str_attr(AttributeKey::FunctionalArea)
            .map(OpenValue::parse)
    }

    pub fn level(&self) -> Option<Severity> {
        self.str_attr(AttributeKey::Level)?.parse().ok()
    }

    pub fn summary(&self) -> Option<&str> {
        self.str_attr(AttributeKey::Summary)
    }

    pub fn details(&self) -> Option<&str> {
        self.str_attr(AttributeKey::Details)
    }

    pub fn stack_trace(&self) -> Option<&str> {
        self.str_attr(AttributeKey::StackTrace)
    }

    pub fn payload(&self) -> Option<&Value> {
        self.get_key(AttributeKey::Payload)
    }

    /// Creation time as epoch milliseconds
    pub fn timestamp_millis(&self) -> Option<i64> {
        self.get_key(AttributeKey::CreatedTimestamp)
            .and_then(Value::as_i64)
    }

    pub fn duration(&self) -> Option<Duration> {
        self.get_key(AttributeKey::Duration)
            .and_then(Value::as_u64)
            .map(Duration::from_millis)
    }

    pub fn request_id(&self) -> Option<&str> {
        self.str_attr(AttributeKey::RequestId)
    }

    pub fn related_object(&self) -> Option<&str> {
        self.str_attr(AttributeKey::RelatedObject)
    }

    /// Decodes the serialised related-object set
    ///
    /// Returns an empty list when the attribute is absent or was overwritten
    /// with something that is not a serialised set.
    pub fn related_objects(&self) -> Vec<RecordId> {
        self.str_attr(AttributeKey::RelatedObjects)
            .and_then(|raw| serde_json::from_str(raw).ok())
            .unwrap_or_default()
    }

    pub fn operation_name(&self) -> Option<&str> {
        self.str_attr(AttributeKey::OperationName)
    }

    pub fn user_id(&self) -> Option<&str> {
        self.str_attr(AttributeKey::UserId)
    }

    pub fn flow_name(&self) -> Option<&str> {
        self.str_attr(AttributeKey::FlowName)
    }

    /// True unless issue creation was explicitly requested
    pub fn issue_creation_suppressed(&self) -> bool {
        self.get_key(AttributeKey::DoNotCreateIssue)
            .and_then(Value::as_bool)
            .unwrap_or(true)
    }

    /// Serialises the record as a single JSON line
    pub fn to_json_line(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// A related-object reference that may be absent or malformed
///
/// Conversions from strings validate the identifier; anything that fails
/// validation becomes an empty reference, which setters ignore.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelatedObject(Option<RecordId>);

impl RelatedObject {
    pub fn id(&self) -> Option<&RecordId> {
        self.0.as_ref()
    }
}

impl From<RecordId> for RelatedObject {
    fn from(id: RecordId) -> Self {
        Self(Some(id))
    }
}

impl From<&RecordId> for RelatedObject {
    fn from(id: &RecordId) -> Self {
        Self(Some(id.clone()))
    }
}

impl From<&str> for RelatedObject {
    fn from(id: &str) -> Self {
        Self(RecordId::new(id).ok())
    }
}

impl From<String> for RelatedObject {
    fn from(id: String) -> Self {
        Self(RecordId::new(id).ok())
    }
}

impl<T: Into<RelatedObject>> From<Option<T>> for RelatedObject {
    fn from(id: Option<T>) -> Self {
        id.map(Into::into).unwrap_or(Self(None))
    }
}

/// Fluent builder for [`LogRecord`]
///
/// Construction seeds the creation timestamp, suppresses issue creation and
/// copies the ambient request id. A builder is meant to stay on one thread
/// for its whole lifecycle; start a new builder for each new record.
#[derive(Debug, Clone)]
pub struct LogRecordBuilder {
    attributes: BTreeMap<String, Value>,
}

impl LogRecordBuilder {
    /// Creates a builder seeded from the execution context
    pub fn new(context: &dyn ExecutionContext) -> Self {
        Self::with_defaults(context.now_millis(), context.request_id())
    }

    /// Creates a builder seeded with explicit defaults
    pub fn with_defaults(now_millis: i64, request_id: Option<String>) -> Self {
        let mut builder = Self {
            attributes: BTreeMap::new(),
        };
        builder
            .timestamp(now_millis)
            .set(AttributeKey::DoNotCreateIssue, Value::Bool(true));
        if let Some(request_id) = request_id {
            builder.request_id(request_id);
        }
        builder
    }

    fn set(&mut self, key: AttributeKey, value: Value) -> &mut Self {
        self.attributes.insert(key.name().to_string(), value);
        self
    }

    fn clear(&mut self, key: AttributeKey) -> &mut Self {
        self.attributes.remove(key.name());
        self
    }

    pub fn category(&mut self, category: Category) -> &mut Self {
        self.set(AttributeKey::Category, category.to_string().into())
    }

    /// Sets the type from a known value or free text
    pub fn log_type(&mut self, log_type: impl Into<OpenValue<LogType>>) -> &mut Self {
        let log_type = log_type.into();
        self.set(AttributeKey::Type, log_type.as_str().into())
    }

    /// Sets the functional area from a known value or free text
    pub fn functional_area(&mut self, area: impl Into<OpenValue<FunctionalArea>>) -> &mut Self {
        let area = area.into();
        self.set(AttributeKey::FunctionalArea, area.as_str().into())
    }

    pub fn level(&mut self, level: Severity) -> &mut Self {
        self.set(AttributeKey::Level, level.to_string().into())
    }

    pub fn summary(&mut self, summary: impl Into<String>) -> &mut Self {
        self.set(AttributeKey::Summary, Value::String(summary.into()))
    }

    pub fn details(&mut self, details: impl Into<String>) -> &mut Self {
        self.set(AttributeKey::Details, Value::String(details.into()))
    }

    pub fn stack_trace(&mut self, stack_trace: impl Into<String>) -> &mut Self {
        self.set(AttributeKey::StackTrace, Value::String(stack_trace.into()))
    }

    /// Fills details and stack trace from an error and its source chain
    pub fn error(&mut self, error: &dyn std::error::Error) -> &mut Self {
        let mut chain = Vec::new();
        let mut source = error.source();
        while let Some(cause) = source {
            chain.push(format!("caused by: {cause}"));
            source = cause.source();
        }

        self.details(error.to_string());
        if !chain.is_empty() {
            self.stack_trace(chain.join("\n"));
        }
        self
    }

    pub fn payload(&mut self, payload: Value) -> &mut Self {
        self.set(AttributeKey::Payload, payload)
    }

    /// Overrides the creation timestamp (epoch milliseconds)
    pub fn timestamp(&mut self, epoch_millis: i64) -> &mut Self {
        self.set(AttributeKey::CreatedTimestamp, epoch_millis.into())
    }

    pub fn duration(&mut self, duration: Duration) -> &mut Self {
        let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        self.set(AttributeKey::Duration, millis.into())
    }

    pub fn request_id(&mut self, request_id: impl Into<String>) -> &mut Self {
        self.set(AttributeKey::RequestId, Value::String(request_id.into()))
    }

    /// Links a single related record
    ///
    /// `None` and malformed identifiers leave the builder unchanged.
    pub fn related_object(&mut self, id: impl Into<RelatedObject>) -> &mut Self {
        match id.into().0 {
            Some(id) => self.set(AttributeKey::RelatedObject, Value::String(id.into_inner())),
            None => self,
        }
    }

    /// Links a set of related records
    ///
    /// Entries are deduplicated and malformed ones dropped. The surviving set
    /// is stored as a sorted JSON array string; an empty set removes the
    /// attribute entirely.
    pub fn related_objects<I, T>(&mut self, ids: I) -> &mut Self
    where
        I: IntoIterator<Item = T>,
        T: Into<RelatedObject>,
    {
        let ids: BTreeSet<RecordId> = ids.into_iter().filter_map(|id| id.into().0).collect();

        if ids.is_empty() {
            return self.clear(AttributeKey::RelatedObjects);
        }

        match serde_json::to_string(&ids) {
            Ok(serialized) => self.set(AttributeKey::RelatedObjects, Value::String(serialized)),
            Err(_) => self.clear(AttributeKey::RelatedObjects),
        }
    }

    pub fn operation_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.set(AttributeKey::OperationName, Value::String(name.into()))
    }

    pub fn user_id(&mut self, user_id: impl Into<String>) -> &mut Self {
        self.set(AttributeKey::UserId, Value::String(user_id.into()))
    }

    pub fn flow_name(&mut self, flow_name: impl Into<String>) -> &mut Self {
        self.set(AttributeKey::FlowName, Value::String(flow_name.into()))
    }

    /// Requests (or suppresses) downstream issue creation
    pub fn create_issue(&mut self, create: bool) -> &mut Self {
        self.set(AttributeKey::DoNotCreateIssue, Value::Bool(!create))
    }

    /// Sets any attribute, well-known slots included
    ///
    /// This bypasses the typed setters; whichever call comes last wins.
    pub fn attribute(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Returns a snapshot of the accumulated attributes
    pub fn build(&self) -> LogRecord {
        LogRecord {
            attributes: self.attributes.clone(),
        }
    }
}
