//! Job checkpoint model
//!
//! A checkpoint records how far a job has read through its cursor and what
//! it has committed. It is saved after every chunk so an interrupted job can
//! skip the records it already consumed on the next run.

use crate::domain::RecordId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Job status enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Job was never started
    #[default]
    NotStarted,
    /// Job is in progress
    InProgress,
    /// Job finished (possibly with record or chunk failures)
    Completed,
    /// Job stopped early on a shutdown signal or a job-level error
    Interrupted,
}

/// Progress of one job over one query
///
/// # Examples
///
/// ```
/// use chunkwise::core::state::{JobCheckpoint, JobStatus};
///
/// let mut checkpoint = JobCheckpoint::new("mark-processed", "accounts");
/// checkpoint.mark_started();
/// checkpoint.record_chunk(200, 198, None);
///
/// assert_eq!(checkpoint.status, JobStatus::InProgress);
/// assert_eq!(checkpoint.records_consumed, 200);
/// assert!(checkpoint.is_resumable_for("mark-processed", "accounts"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobCheckpoint {
    /// Job name, also the storage key
    pub job_name: String,

    /// Canonical query text the progress refers to
    pub query: String,

    pub status: JobStatus,

    /// Records read from the cursor, committed or not
    pub records_consumed: u64,

    pub chunks_processed: u64,

    pub records_committed: u64,

    /// Last record of the most recent successfully committed chunk
    pub last_committed_record_id: Option<RecordId>,

    pub started_at: DateTime<Utc>,

    /// None while the job is still running
    pub completed_at: Option<DateTime<Utc>>,
}

impl JobCheckpoint {
    pub fn new(job_name: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            job_name: job_name.into(),
            query: query.into(),
            status: JobStatus::NotStarted,
            records_consumed: 0,
            chunks_processed: 0,
            records_committed: 0,
            last_committed_record_id: None,
            started_at: Utc::now(),
            completed_at: None,
        }
    }

    /// True if a later run of the same job and query may continue from here
    pub fn is_resumable_for(&self, job_name: &str, query: &str) -> bool {
        self.job_name == job_name
            && self.query == query
            && matches!(self.status, JobStatus::InProgress | JobStatus::Interrupted)
    }

    pub fn mark_started(&mut self) {
        self.started_at = Utc::now();
        self.status = JobStatus::InProgress;
        self.completed_at = None;
    }

    pub fn mark_completed(&mut self) {
        self.completed_at = Some(Utc::now());
        self.status = JobStatus::Completed;
    }

    pub fn mark_interrupted(&mut self) {
        self.completed_at = Some(Utc::now());
        self.status = JobStatus::Interrupted;
    }

    /// Advances the checkpoint past one chunk
    pub fn record_chunk(
        &mut self,
        consumed: usize,
        committed: usize,
        last_committed: Option<RecordId>,
    ) {
        self.records_consumed += consumed as u64;
        self.records_committed += committed as u64;
        self.chunks_processed += 1;
        if last_committed.is_some() {
            self.last_committed_record_id = last_committed;
        }
    }

    /// Duration of the last run if it has ended
    pub fn last_run_duration(&self) -> Option<chrono::Duration> {
        self.completed_at.map(|completed| completed - self.started_at)
    }
}
