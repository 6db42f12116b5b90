//! Domain error types
//!
//! This module defines the error hierarchy for Chunkwise. All errors are
//! domain-specific and don't expose third-party types.
//!
//! Only [`ChunkwiseError::InvalidQuery`] is fatal to a job. Record and chunk
//! failures are contained by the batch engine and surface through the job
//! summary and the log backend.

use thiserror::Error;

/// Main Chunkwise error type
#[derive(Debug, Error)]
pub enum ChunkwiseError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The record selector could not be parsed or resolved by the source
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// A record identifier failed format validation
    #[error("Malformed identifier: {0}")]
    MalformedIdentifier(String),

    /// The per-record transform rejected a record
    #[error("Transform failed for record {record_id}: {message}")]
    RecordTransform { record_id: String, message: String },

    /// The bulk write of a chunk failed as a whole
    #[error("Commit failed for chunk {chunk_index}: {message}")]
    ChunkCommit { chunk_index: usize, message: String },

    /// A batch engine operation was called out of lifecycle order
    #[error("Invalid engine state: {0}")]
    InvalidState(String),

    /// Record source errors
    #[error("Source error: {0}")]
    Source(String),

    /// Record sink errors
    #[error("Sink error: {0}")]
    Sink(String),

    /// Log backend errors
    #[error("Log backend error: {0}")]
    LogBackend(String),

    /// Checkpoint persistence errors
    #[error("Checkpoint error: {0}")]
    Checkpoint(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

impl ChunkwiseError {
    /// Creates a record transform error for the given record
    pub fn transform(record_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RecordTransform {
            record_id: record_id.into(),
            message: message.into(),
        }
    }

    /// Returns true if this error must abort a job before any chunk runs
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::InvalidQuery(_) | Self::Configuration(_))
    }
}

impl From<std::io::Error> for ChunkwiseError {
    fn from(err: std::io::Error) -> Self {
        ChunkwiseError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for ChunkwiseError {
    fn from(err: serde_json::Error) -> Self {
        ChunkwiseError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for ChunkwiseError {
    fn from(err: toml::de::Error) -> Self {
        ChunkwiseError::Configuration(format!("TOML parse error: {err}"))
    }
}
