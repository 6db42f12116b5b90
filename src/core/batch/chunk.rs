//! Chunk-level values passed between the engine's lifecycle steps

use crate::domain::{Record, RecordId};
use serde::Serialize;

/// A bounded run of records read from the cursor in one step
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    /// 1-based position of the chunk within the job
    pub index: usize,
    pub records: Vec<Record>,
}

impl Chunk {
    pub fn new(index: usize, records: Vec<Record>) -> Self {
        Self { index, records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// A record the transform rejected
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordFailure {
    pub record_id: RecordId,
    pub message: String,
}

/// Outcome of running the transform over one chunk
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkResult {
    pub chunk_index: usize,

    /// Records that passed the transform, in cursor order
    pub transformed: Vec<Record>,

    pub failures: Vec<RecordFailure>,
}

impl ChunkResult {
    pub fn new(chunk_index: usize) -> Self {
        Self {
            chunk_index,
            transformed: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// Number of records the chunk held before the transform ran
    pub fn records_read(&self) -> usize {
        self.transformed.len() + self.failures.len()
    }

    pub fn failed_count(&self) -> usize {
        self.failures.len()
    }

    /// True if no record survived the transform
    pub fn is_empty(&self) -> bool {
        self.transformed.is_empty()
    }
}

/// Outcome of the bulk commit of one chunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitResult {
    /// Nothing to commit; the sink was not called
    Skipped,
    /// The sink accepted the chunk
    Committed { count: usize },
    /// The sink rejected the chunk as a whole
    Failed { error: String },
}

impl CommitResult {
    /// Records the sink accepted
    pub fn committed_count(&self) -> usize {
        match self {
            Self::Committed { count } => *count,
            Self::Skipped | Self::Failed { .. } => 0,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_result_counts() {
        let mut result = ChunkResult::new(1);
        result
            .transformed
            .push(Record::new(RecordId::new("acc-1").unwrap()));
        result.failures.push(RecordFailure {
            record_id: RecordId::new("acc-2").unwrap(),
            message: "missing name".to_string(),
        });

        assert_eq!(result.records_read(), 2);
        assert_eq!(result.failed_count(), 1);
        assert!(!result.is_empty());
    }

    #[test]
    fn test_commit_result_counts() {
        assert_eq!(CommitResult::Skipped.committed_count(), 0);
        assert_eq!(CommitResult::Committed { count: 7 }.committed_count(), 7);

        let failed = CommitResult::Failed {
            error: "sink down".to_string(),
        };
        assert_eq!(failed.committed_count(), 0);
        assert!(failed.is_failed());
    }
}
