//! Well-known log record attributes and their value enums
//!
//! Every log record is an open attribute map. The slots listed in
//! [`AttributeKey`] always live under the same canonical name, whichever
//! setter wrote them.
//!
//! `type` and `functional_area` accept either a closed enum value or free
//! text. Both forms are held in an [`OpenValue`], which compares and
//! serialises through its string form.

use crate::domain::ChunkwiseError;
use serde::{Serialize, Serializer};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Canonical names of the well-known log record slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeKey {
    Category,
    Type,
    FunctionalArea,
    Level,
    Summary,
    Details,
    StackTrace,
    Payload,
    CreatedTimestamp,
    Duration,
    RequestId,
    RelatedObject,
    RelatedObjects,
    OperationName,
    UserId,
    FlowName,
    DoNotCreateIssue,
}

impl AttributeKey {
    /// All well-known keys
    pub const ALL: [AttributeKey; 17] = [
        Self::Category,
        Self::Type,
        Self::FunctionalArea,
        Self::Level,
        Self::Summary,
        Self::Details,
        Self::StackTrace,
        Self::Payload,
        Self::CreatedTimestamp,
        Self::Duration,
        Self::RequestId,
        Self::RelatedObject,
        Self::RelatedObjects,
        Self::OperationName,
        Self::UserId,
        Self::FlowName,
        Self::DoNotCreateIssue,
    ];

    /// Canonical attribute name
    pub const fn name(self) -> &'static str {
        match self {
            Self::Category => "category",
            Self::Type => "type",
            Self::FunctionalArea => "functional_area",
            Self::Level => "level",
            Self::Summary => "summary",
            Self::Details => "details",
            Self::StackTrace => "stack_trace",
            Self::Payload => "payload",
            Self::CreatedTimestamp => "created_timestamp",
            Self::Duration => "duration_ms",
            Self::RequestId => "request_id",
            Self::RelatedObject => "related_object",
            Self::RelatedObjects => "related_objects",
            Self::OperationName => "operation_name",
            Self::UserId => "user_id",
            Self::FlowName => "flow_name",
            Self::DoNotCreateIssue => "do_not_create_issue",
        }
    }

    /// Looks up a well-known key by its canonical name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|key| key.name() == name)
    }
}

impl fmt::Display for AttributeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A closed enum whose values have a fixed string form
pub trait KnownValue: Copy + Eq + Sized + 'static {
    /// Every variant
    const ALL: &'static [Self];

    /// String form used for storage and comparison
    fn as_str(&self) -> &'static str;

    /// Resolves a string to a variant, exact match only
    fn parse_known(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|v| v.as_str() == s)
    }
}

macro_rules! closed_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($(#[$vmeta:meta])* $variant:ident => $text:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl KnownValue for $name {
            const ALL: &'static [Self] = &[$(Self::$variant),+];

            fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ChunkwiseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse_known(s).ok_or_else(|| {
                    ChunkwiseError::Other(format!(
                        "Unknown {} '{}'",
                        stringify!($name),
                        s
                    ))
                })
            }
        }

        impl From<$name> for OpenValue<$name> {
            fn from(value: $name) -> Self {
                OpenValue::Known(value)
            }
        }
    };
}

closed_enum! {
    /// Broad classification of a log record
    Category {
        Error => "Error",
        Warning => "Warning",
        Event => "Event",
        Debug => "Debug",
        Integration => "Integration",
        Audit => "Audit",
    }
}

closed_enum! {
    /// Severity of a log record
    Severity {
        Debug => "DEBUG",
        Info => "INFO",
        Warning => "WARNING",
        Error => "ERROR",
        Critical => "CRITICAL",
    }
}

closed_enum! {
    /// Kind of component that produced a log record
    LogType {
        Backend => "Backend",
        Batch => "Batch",
        Integration => "Integration",
        Scheduler => "Scheduler",
        Frontend => "Frontend",
    }
}

closed_enum! {
    /// Business area a log record belongs to
    FunctionalArea {
        Records => "Records",
        Billing => "Billing",
        Integration => "Integration",
        Reporting => "Reporting",
        Security => "Security",
    }
}

impl Severity {
    /// Maps to the closest `tracing` level
    pub fn tracing_level(self) -> tracing::Level {
        match self {
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warning => tracing::Level::WARN,
            Self::Error | Self::Critical => tracing::Level::ERROR,
        }
    }
}

/// Either a known enum value or free text
///
/// Free text is accepted unvalidated for values that come from places the
/// enum cannot know about statically, such as user-defined workflows.
///
/// ```
/// use chunkwise::logging::attributes::{LogType, OpenValue};
///
/// let known: OpenValue<LogType> = LogType::Batch.into();
/// let free: OpenValue<LogType> = "Batch".into();
/// assert_eq!(known, free);
/// assert_eq!(OpenValue::<LogType>::from("Nightly Flow").as_str(), "Nightly Flow");
/// ```
#[derive(Debug, Clone)]
pub enum OpenValue<E> {
    Known(E),
    Freeform(String),
}

impl<E: KnownValue> OpenValue<E> {
    /// Resolves a string, preferring a known variant
    pub fn parse(s: &str) -> Self {
        E::parse_known(s)
            .map(Self::Known)
            .unwrap_or_else(|| Self::Freeform(s.to_string()))
    }

    /// Resolved string form
    pub fn as_str(&self) -> &str {
        match self {
            Self::Known(value) => value.as_str(),
            Self::Freeform(text) => text,
        }
    }

    /// The known variant, if the string form names one
    pub fn known(&self) -> Option<E> {
        match self {
            Self::Known(value) => Some(*value),
            Self::Freeform(text) => E::parse_known(text),
        }
    }
}

impl<E: KnownValue> PartialEq for OpenValue<E> {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl<E: KnownValue> Eq for OpenValue<E> {}

impl<E: KnownValue> Hash for OpenValue<E> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

impl<E: KnownValue> fmt::Display for OpenValue<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<E: KnownValue> Serialize for OpenValue<E> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<E> From<&str> for OpenValue<E> {
    fn from(text: &str) -> Self {
        Self::Freeform(text.to_string())
    }
}

impl<E> From<String> for OpenValue<E> {
    fn from(text: String) -> Self {
        Self::Freeform(text)
    }
}
