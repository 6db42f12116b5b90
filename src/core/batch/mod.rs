//! Chunked batch execution
//!
//! [`BatchEngine`] drives a job; [`Chunk`], [`ChunkResult`] and
//! [`CommitResult`] are the values passed between its lifecycle steps, and
//! [`JobSummary`] is what a finished job reports.

pub mod chunk;
pub mod engine;
pub mod summary;

pub use chunk::{Chunk, ChunkResult, CommitResult, RecordFailure};
pub use engine::{
    BatchConfig, BatchEngine, JobState, DEFAULT_CHUNK_SIZE, MAX_CHUNK_SIZE, MIN_CHUNK_SIZE,
};
pub use summary::{JobError, JobErrorKind, JobSummary};
