//! Job summary and reporting
//!
//! The summary is accumulated while a job runs and handed back from
//! `BatchEngine::finish`, so callers can see record and chunk failures
//! without scraping logs.

use super::chunk::RecordFailure;
use serde::Serialize;
use std::time::Duration;

/// Summary of one job run
#[derive(Debug, Clone, Serialize)]
pub struct JobSummary {
    pub job_name: String,

    /// Canonical query text, empty if the job never started
    pub query: String,

    pub chunks_processed: usize,
    pub chunks_committed: usize,

    /// Chunks whose records all failed the transform
    pub chunks_skipped: usize,
    pub chunks_failed: usize,

    pub records_read: usize,
    pub records_committed: usize,

    /// Records rejected by the transform
    pub records_failed: usize,

    /// Transformed records lost to a failed chunk commit
    pub records_uncommitted: usize,

    /// Records skipped because a previous run already consumed them
    pub records_resumed: u64,

    /// True if the job stopped early on a shutdown signal
    pub interrupted: bool,

    pub duration: Duration,

    pub record_failures: Vec<RecordFailure>,

    /// Chunk-level and job-level errors
    pub errors: Vec<JobError>,
}

impl JobSummary {
    pub fn new(job_name: impl Into<String>) -> Self {
        Self {
            job_name: job_name.into(),
            query: String::new(),
            chunks_processed: 0,
            chunks_committed: 0,
            chunks_skipped: 0,
            chunks_failed: 0,
            records_read: 0,
            records_committed: 0,
            records_failed: 0,
            records_uncommitted: 0,
            records_resumed: 0,
            interrupted: false,
            duration: Duration::from_secs(0),
            record_failures: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn add_error(&mut self, error: JobError) {
        self.errors.push(error);
    }

    /// True if a chunk commit or the cursor failed
    pub fn has_job_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// True if every record read was committed and the job ran to the end
    pub fn is_successful(&self) -> bool {
        !self.has_job_errors() && self.records_failed == 0 && !self.interrupted
    }

    /// Committed records as a percentage of records read
    pub fn success_rate(&self) -> f64 {
        if self.records_read == 0 {
            return 100.0;
        }
        (self.records_committed as f64 / self.records_read as f64) * 100.0
    }

    /// Human-readable one-line outcome
    pub fn headline(&self) -> String {
        let outcome = if self.interrupted {
            "interrupted"
        } else if self.is_successful() {
            "completed"
        } else {
            "completed with failures"
        };
        format!(
            "Job '{}' {outcome}: {} of {} record(s) committed in {} chunk(s)",
            self.job_name, self.records_committed, self.records_read, self.chunks_processed
        )
    }

    /// Log the summary
    pub fn log_summary(&self) {
        tracing::info!(
            job = %self.job_name,
            query = %self.query,
            chunks = self.chunks_processed,
            chunks_committed = self.chunks_committed,
            chunks_skipped = self.chunks_skipped,
            chunks_failed = self.chunks_failed,
            records_read = self.records_read,
            records_committed = self.records_committed,
            records_failed = self.records_failed,
            records_resumed = self.records_resumed,
            interrupted = self.interrupted,
            duration_ms = self.duration.as_millis() as u64,
            success_rate = format!("{:.2}%", self.success_rate()),
            "Job finished"
        );

        if !self.errors.is_empty() {
            tracing::warn!(error_count = self.errors.len(), "Job finished with errors");
            for error in &self.errors {
                tracing::warn!(
                    kind = ?error.kind,
                    chunk_index = ?error.chunk_index,
                    message = %error.message,
                    "Job error"
                );
            }
        }
    }
}

/// Type of job error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobErrorKind {
    /// The sink rejected a chunk's bulk write
    ChunkCommit,
    /// The cursor failed mid-job
    Source,
    /// The engine rejected a chunk it was handed, ending the job
    Engine,
}

/// Job error with context
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobError {
    pub kind: JobErrorKind,

    pub message: String,

    /// Chunk the error belongs to, if any
    pub chunk_index: Option<usize>,
}

impl JobError {
    pub fn new(kind: JobErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            chunk_index: None,
        }
    }

    pub fn chunk_commit(chunk_index: usize, message: impl Into<String>) -> Self {
        Self::new(JobErrorKind::ChunkCommit, message).with_chunk(chunk_index)
    }

    pub fn with_chunk(mut self, chunk_index: usize) -> Self {
        self.chunk_index = Some(chunk_index);
        self
    }
}
