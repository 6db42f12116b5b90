//! Logging and observability
//!
//! Two concerns live here:
//! - Diagnostic logging through `tracing` ([`init_logging`] and the helper
//!   macros below)
//! - Structured log records ([`LogRecordBuilder`], [`LogRecord`]) handed to a
//!   [`LogBackend`] for storage
//!
//! # Example
//!
//! ```no_run
//! use chunkwise::logging::init_logging;
//! use chunkwise::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! ```

pub mod attributes;
pub mod backend;
pub mod context;
pub mod record;
pub mod structured;

pub use attributes::{AttributeKey, Category, FunctionalArea, LogType, OpenValue, Severity};
pub use backend::{
    FanoutLogBackend, JsonLinesLogBackend, LogBackend, MemoryLogBackend, TracingLogBackend,
};
pub use context::{ExecutionContext, FixedContext, SystemContext};
pub use record::{LogRecord, LogRecordBuilder, RelatedObject};
pub use structured::{init_logging, LoggingGuard};

/// Log the start of a chunk
///
/// ```no_run
/// use chunkwise::log_chunk_start;
///
/// log_chunk_start!("mark-processed", 3, 200);
/// ```
#[macro_export]
macro_rules! log_chunk_start {
    ($job:expr, $chunk_index:expr, $size:expr) => {
        tracing::debug!(
            job = %$job,
            chunk_index = $chunk_index,
            chunk_size = $size,
            "Executing chunk"
        );
    };
}

/// Log the outcome of a chunk
///
/// ```no_run
/// use chunkwise::log_chunk_complete;
///
/// log_chunk_complete!(3, 198, 2);
/// ```
#[macro_export]
macro_rules! log_chunk_complete {
    ($chunk_index:expr, $committed:expr, $failed:expr) => {
        tracing::info!(
            chunk_index = $chunk_index,
            committed = $committed,
            failed = $failed,
            "Chunk complete"
        );
    };
}

/// Log an error with context
///
/// ```no_run
/// use chunkwise::log_error_with_context;
/// use chunkwise::domain::ChunkwiseError;
///
/// let error = ChunkwiseError::Configuration("Invalid config".to_string());
/// log_error_with_context!(&error, "Failed to load configuration");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            "Error occurred"
        );
    };
}
