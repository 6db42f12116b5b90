//! Domain identifier types with validation
//!
//! Record identifiers are validated on construction so a `RecordId` value is
//! always well-formed. Anything that fails validation is reported as
//! [`ChunkwiseError::MalformedIdentifier`].

use crate::domain::errors::ChunkwiseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum length of a record identifier
pub const MAX_RECORD_ID_LEN: usize = 64;

/// Record identifier newtype wrapper
///
/// A valid identifier is 1 to 64 ASCII characters, starts with an
/// alphanumeric character and otherwise contains only alphanumerics,
/// `-`, `_`, `.` or `:`.
///
/// # Examples
///
/// ```
/// use chunkwise::domain::ids::RecordId;
/// use std::str::FromStr;
///
/// let id = RecordId::from_str("acc-0001").unwrap();
/// assert_eq!(id.as_str(), "acc-0001");
/// assert!(RecordId::new("not valid!").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RecordId(String);

impl RecordId {
    /// Creates a new RecordId, validating its format
    ///
    /// # Errors
    ///
    /// Returns `ChunkwiseError::MalformedIdentifier` if the identifier is
    /// empty, too long or contains characters outside the allowed set.
    pub fn new(id: impl Into<String>) -> Result<Self, ChunkwiseError> {
        let id = id.into();
        if Self::is_valid(&id) {
            Ok(Self(id))
        } else {
            Err(ChunkwiseError::MalformedIdentifier(format!(
                "'{id}' is not a valid record identifier"
            )))
        }
    }

    /// Checks an identifier string without allocating
    pub fn is_valid(id: &str) -> bool {
        let mut chars = id.chars();
        let Some(first) = chars.next() else {
            return false;
        };

        id.len() <= MAX_RECORD_ID_LEN
            && first.is_ascii_alphanumeric()
            && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':'))
    }

    /// Returns the record ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RecordId {
    type Err = ChunkwiseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for RecordId {
    type Error = ChunkwiseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RecordId> for String {
    fn from(id: RecordId) -> Self {
        id.0
    }
}

impl AsRef<str> for RecordId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("acc-0001" ; "dashed")]
    #[test_case("001Dn00000AbCdE" ; "alphanumeric")]
    #[test_case("orders:2024.07_1" ; "mixed separators")]
    #[test_case("7d44b88c-4199-4bad-97dc-d78268e01398" ; "uuid")]
    fn test_record_id_valid(id: &str) {
        let record_id = RecordId::new(id).unwrap();
        assert_eq!(record_id.as_str(), id);
    }

    #[test_case("" ; "empty")]
    #[test_case("   " ; "whitespace")]
    #[test_case("-leading" ; "leading separator")]
    #[test_case("has space" ; "inner space")]
    #[test_case("bad/slash" ; "slash")]
    #[test_case("ünïcode" ; "non ascii")]
    fn test_record_id_invalid(id: &str) {
        let err = RecordId::new(id).unwrap_err();
        assert!(matches!(err, ChunkwiseError::MalformedIdentifier(_)));
    }

    #[test]
    fn test_record_id_length_limit() {
        let max = "a".repeat(MAX_RECORD_ID_LEN);
        assert!(RecordId::new(max).is_ok());

        let too_long = "a".repeat(MAX_RECORD_ID_LEN + 1);
        assert!(RecordId::new(too_long).is_err());
    }

    #[test]
    fn test_record_id_display() {
        let id = RecordId::new("acc-1").unwrap();
        assert_eq!(format!("{}", id), "acc-1");
    }

    #[test]
    fn test_record_id_deserialize_validates() {
        let ok: RecordId = serde_json::from_str("\"acc-1\"").unwrap();
        assert_eq!(ok.as_str(), "acc-1");

        let bad = serde_json::from_str::<RecordId>("\"bad id\"");
        assert!(bad.is_err());
    }
}
