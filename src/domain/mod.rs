//! Domain models and types for Chunkwise.
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`RecordId`])
//! - **Records** ([`Record`]) processed by the batch engine
//! - **Error types** ([`ChunkwiseError`])
//! - **Result type alias** ([`Result`])
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, ChunkwiseError>`]:
//!
//! ```rust
//! use chunkwise::domain::{Result, RecordId};
//!
//! fn example() -> Result<()> {
//!     let id = RecordId::new("acc-1")?;
//!     assert_eq!(id.as_str(), "acc-1");
//!     Ok(())
//! }
//! ```

pub mod context;
pub mod errors;
pub mod ids;
pub mod record;
pub mod result;

pub use errors::ChunkwiseError;
pub use ids::RecordId;
pub use record::Record;
pub use result::Result;
