//! Result type alias for Chunkwise

use super::errors::ChunkwiseError;

/// Result type alias for Chunkwise operations
///
/// # Examples
///
/// ```
/// use chunkwise::domain::result::Result;
/// use chunkwise::domain::errors::ChunkwiseError;
///
/// fn failing_function() -> Result<()> {
///     Err(ChunkwiseError::InvalidQuery("empty selector".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, ChunkwiseError>;
