//! Job state and checkpointing

pub mod checkpoint;
pub mod store;

pub use checkpoint::{JobCheckpoint, JobStatus};
pub use store::{CheckpointStore, FileCheckpointStore, MemoryCheckpointStore};
