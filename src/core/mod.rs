//! Core business logic for Chunkwise.
//!
//! This module contains the batch engine and everything it orchestrates.
//!
//! # Modules
//!
//! - [`batch`] - Chunked execution, commit and job summaries
//! - [`query`] - Record selector parsing and matching
//! - [`state`] - Job checkpoints for resumable runs
//! - [`transform`] - Per-record business logic
//!
//! # Job Workflow
//!
//! 1. **Start**: Resolve the query to a cursor, skipping records a previous
//!    unfinished run already consumed
//! 2. **Execute**: Pull a chunk and apply the transform to each record
//! 3. **Commit**: Bulk write the records that passed
//! 4. **Checkpoint**: Save progress after every chunk
//! 5. **Finish**: Log and publish the job summary
//!
//! # Example
//!
//! ```rust,no_run
//! use chunkwise::adapters::{JsonLinesSink, JsonLinesSource};
//! use chunkwise::core::batch::{BatchConfig, BatchEngine};
//! use chunkwise::core::query::Query;
//! use chunkwise::core::state::FileCheckpointStore;
//! use chunkwise::core::transform::FieldAssignment;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = BatchEngine::new(
//!     BatchConfig::new("mark-processed").with_resume(true),
//!     Arc::new(JsonLinesSource::new("data/source")),
//!     Arc::new(JsonLinesSink::new("data/committed.jsonl")?),
//!     Arc::new(FieldAssignment::new().assign("status", json!("processed"))),
//! )?
//! .with_checkpoint_store(Arc::new(FileCheckpointStore::new("state")?));
//!
//! let summary = engine.run(&Query::parse("accounts where status = 'open'")?)?;
//!
//! println!("Committed: {}", summary.records_committed);
//! println!("Failed: {}", summary.records_failed);
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod query;
pub mod state;
pub mod transform;
