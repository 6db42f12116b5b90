//! Per-record transforms
//!
//! A transform mutates one record in place before it is committed. Returning
//! an error rejects that record only; the batch engine excludes it from the
//! chunk's commit set and keeps going.
//!
//! Closures of the right shape are transforms too:
//!
//! ```
//! use chunkwise::core::transform::RecordTransform;
//! use chunkwise::domain::{Record, RecordId, Result};
//! use serde_json::json;
//!
//! let uppercase_name = |record: &mut Record| -> Result<()> {
//!     if let Some(name) = record.field("name").and_then(|v| v.as_str()) {
//!         let upper = name.to_uppercase();
//!         record.set_field("name", json!(upper));
//!     }
//!     Ok(())
//! };
//!
//! let mut record = Record::new(RecordId::new("acc-1")?).with_field("name", json!("acme"));
//! uppercase_name.apply(&mut record)?;
//! assert_eq!(record.field("name"), Some(&json!("ACME")));
//! # Ok::<(), chunkwise::domain::ChunkwiseError>(())
//! ```

pub mod assign;

pub use assign::FieldAssignment;

use crate::domain::{Record, Result};

/// Business logic applied to each record of a chunk
///
/// Reject a record by returning `Err`. Release builds abort on panic, so a
/// panicking transform ends the whole process there; the engine only turns
/// a panic into a record failure when panics unwind.
pub trait RecordTransform: Send + Sync {
    /// Mutates the record in place, or rejects it
    fn apply(&self, record: &mut Record) -> Result<()>;
}

impl<F> RecordTransform for F
where
    F: Fn(&mut Record) -> Result<()> + Send + Sync,
{
    fn apply(&self, record: &mut Record) -> Result<()> {
        self(record)
    }
}
