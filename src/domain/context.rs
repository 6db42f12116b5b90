//! Error context extension trait
//!
//! Works like `anyhow::Context` but keeps `ChunkwiseError` as the error type
//! throughout the library code.
//!
//! # Examples
//!
//! ```rust
//! use chunkwise::domain::Result;
//! use chunkwise::domain::context::ResultExt;
//!
//! fn read_file(path: &str) -> Result<String> {
//!     std::fs::read_to_string(path)
//!         .context(format!("Failed to read file: {}", path))
//! }
//! ```

use crate::domain::errors::ChunkwiseError;
use crate::domain::result::Result;

/// Extension trait for adding context to `Result` types
pub trait ResultExt<T> {
    /// Add context to an error (evaluated eagerly)
    fn context<C>(self, context: C) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static;

    /// Add context to an error, computing it only on failure
    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<ChunkwiseError>,
{
    fn context<C>(self, context: C) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static,
    {
        self.map_err(|e| {
            let base_error = e.into();
            ChunkwiseError::Other(format!("{context}: {base_error}"))
        })
    }

    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.map_err(|e| {
            let base_error = e.into();
            let context = f();
            ChunkwiseError::Other(format!("{context}: {base_error}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_context_wraps_message() {
        let result: Result<()> = Err(ChunkwiseError::Sink("disk full".to_string()));
        let err = result.context("Failed to commit chunk 3").unwrap_err();

        let msg = err.to_string();
        assert!(msg.contains("Failed to commit chunk 3"));
        assert!(msg.contains("disk full"));
    }

    #[test]
    fn test_with_context_lazy_evaluation() {
        let called = Arc::new(AtomicBool::new(false));
        let called_clone = called.clone();

        let result: Result<i32> = Ok(42);
        let with_context = result.with_context(|| {
            called_clone.store(true, Ordering::SeqCst);
            "expensive"
        });

        assert_eq!(with_context.unwrap(), 42);
        assert!(!called.load(Ordering::SeqCst));
    }

    #[test]
    fn test_context_chaining() {
        let result: Result<()> = Err(ChunkwiseError::Io("permission denied".to_string()));
        let err = result
            .context("Failed to open sink file")
            .context("Failed to commit chunk 1")
            .unwrap_err();

        let msg = err.to_string();
        assert!(msg.starts_with("Failed to commit chunk 1"));
        assert!(msg.contains("Failed to open sink file"));
        assert!(msg.contains("permission denied"));
    }

    #[test]
    fn test_io_error_with_context() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let result: std::result::Result<(), std::io::Error> = Err(io_error);
        let err = result.context("Failed to read chunkwise.toml").unwrap_err();

        assert!(err.to_string().contains("File not found"));
    }
}
