//! Chunked batch engine
//!
//! The engine pulls bounded chunks from a cursor, runs the record transform
//! over each record and commits the survivors in one bulk write per chunk.
//!
//! Failures are contained at the smallest scope:
//!
//! - a record the transform rejects, or panics on, is excluded from its
//!   chunk's commit set
//! - a chunk the sink rejects is recorded as a chunk-level error and not retried
//! - a cursor read error ends the chunk loop and is recorded as a job-level error
//! - an engine error after `start` ends the chunk loop the same way
//!
//! Only a query the source cannot resolve aborts a job. Everything else ends
//! up in the [`JobSummary`] returned by [`BatchEngine::finish`], and chunk or
//! job-level failures are also published to the [`LogBackend`].

use super::chunk::{Chunk, ChunkResult, CommitResult, RecordFailure};
use super::summary::{JobError, JobErrorKind, JobSummary};
use crate::adapters::{RecordCursor, RecordSink, RecordSource};
use crate::core::query::Query;
use crate::core::state::{CheckpointStore, JobCheckpoint};
use crate::core::transform::RecordTransform;
use crate::domain::{ChunkwiseError, Record, RecordId, Result};
use crate::logging::{
    Category, ExecutionContext, FunctionalArea, LogBackend, LogRecordBuilder, LogType, OpenValue,
    Severity, SystemContext, TracingLogBackend,
};
use crate::{log_chunk_complete, log_chunk_start};
use serde_json::json;
use std::any::Any;
use std::fmt;
use std::mem;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;

/// Smallest allowed chunk size
pub const MIN_CHUNK_SIZE: usize = 1;

/// Largest allowed chunk size
pub const MAX_CHUNK_SIZE: usize = 2000;

/// Chunk size used when none is configured
pub const DEFAULT_CHUNK_SIZE: usize = 200;

/// Configuration for a batch job
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Job name, used for logs and as the checkpoint key
    pub job_name: String,
    /// Records per chunk (1-2000)
    pub chunk_size: usize,
    /// Continue from an unfinished checkpoint of the same job and query
    pub resume: bool,
    /// Functional area stamped on published log records
    pub functional_area: OpenValue<FunctionalArea>,
    /// Request issue creation for chunk-level failures
    pub create_issue_on_chunk_failure: bool,
}

impl BatchConfig {
    pub fn new(job_name: impl Into<String>) -> Self {
        Self {
            job_name: job_name.into(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            resume: false,
            functional_area: FunctionalArea::Records.into(),
            create_issue_on_chunk_failure: false,
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_resume(mut self, resume: bool) -> Self {
        self.resume = resume;
        self
    }

    pub fn with_functional_area(mut self, area: impl Into<OpenValue<FunctionalArea>>) -> Self {
        self.functional_area = area.into();
        self
    }

    pub fn with_issue_on_chunk_failure(mut self, create: bool) -> Self {
        self.create_issue_on_chunk_failure = create;
        self
    }

    /// Checks the chunk size range and job name
    pub fn validate(&self) -> Result<()> {
        if self.job_name.trim().is_empty() {
            return Err(ChunkwiseError::Configuration(
                "job name cannot be empty".to_string(),
            ));
        }
        if !(MIN_CHUNK_SIZE..=MAX_CHUNK_SIZE).contains(&self.chunk_size) {
            return Err(ChunkwiseError::Configuration(format!(
                "chunk size must be between {MIN_CHUNK_SIZE} and {MAX_CHUNK_SIZE}, got {}",
                self.chunk_size
            )));
        }
        Ok(())
    }
}

/// Lifecycle position of an engine
///
/// `Created -> Started -> {Executing(n) -> Committing(n)}* -> Finished`.
/// There is no failed state; a job always reaches `Finished`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Created,
    /// Cursor acquired
    Started,
    /// Chunk `n` transformed, commit pending
    Executing(usize),
    /// Chunk `n` committed (or its commit failed or was skipped)
    Committing(usize),
    Finished,
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => f.write_str("created"),
            Self::Started => f.write_str("started"),
            Self::Executing(n) => write!(f, "executing chunk {n}"),
            Self::Committing(n) => write!(f, "committing chunk {n}"),
            Self::Finished => f.write_str("finished"),
        }
    }
}

/// Drives one job through its lifecycle
///
/// The engine is synchronous. Hosts running inside an async runtime should
/// call [`BatchEngine::run`] from `tokio::task::spawn_blocking`.
///
/// # Examples
///
/// ```
/// use chunkwise::adapters::{InMemorySink, InMemorySource};
/// use chunkwise::core::batch::{BatchConfig, BatchEngine};
/// use chunkwise::core::query::Query;
/// use chunkwise::core::transform::FieldAssignment;
/// use chunkwise::domain::{Record, RecordId};
/// use serde_json::json;
/// use std::sync::Arc;
///
/// # fn example() -> chunkwise::domain::Result<()> {
/// let records = (1..=250)
///     .map(|i| RecordId::new(format!("acc-{i}")).map(Record::new))
///     .collect::<Result<Vec<_>, _>>()?;
/// let source = Arc::new(InMemorySource::new().with_collection("accounts", records));
/// let sink = Arc::new(InMemorySink::new());
/// let transform = Arc::new(FieldAssignment::new().assign("status", json!("processed")));
///
/// let engine = BatchEngine::new(BatchConfig::new("mark-processed"), source, sink.clone(), transform)?;
/// let summary = engine.run(&Query::parse("accounts")?)?;
///
/// assert_eq!(summary.chunks_processed, 2);
/// assert_eq!(sink.call_sizes(), vec![200, 50]);
/// # Ok(())
/// # }
/// # example().unwrap();
/// ```
pub struct BatchEngine {
    config: BatchConfig,
    source: Arc<dyn RecordSource>,
    sink: Arc<dyn RecordSink>,
    transform: Arc<dyn RecordTransform>,
    log_backend: Arc<dyn LogBackend>,
    context: Arc<dyn ExecutionContext>,
    checkpoints: Option<Arc<dyn CheckpointStore>>,
    shutdown_signal: Option<watch::Receiver<bool>>,
    state: JobState,
    next_chunk_index: usize,
    /// Records a cursor returned beyond the chunk size, served first
    carry_over: Vec<Record>,
    checkpoint: Option<JobCheckpoint>,
    summary: JobSummary,
    started_at: Instant,
}

impl BatchEngine {
    /// Create a new engine
    ///
    /// Log records go to a [`TracingLogBackend`] and carry a fresh
    /// [`SystemContext`] request id until replaced.
    ///
    /// # Errors
    ///
    /// Returns `ChunkwiseError::Configuration` if the batch configuration is
    /// invalid.
    pub fn new(
        config: BatchConfig,
        source: Arc<dyn RecordSource>,
        sink: Arc<dyn RecordSink>,
        transform: Arc<dyn RecordTransform>,
    ) -> Result<Self> {
        config.validate()?;
        let summary = JobSummary::new(config.job_name.clone());

        Ok(Self {
            config,
            source,
            sink,
            transform,
            log_backend: Arc::new(TracingLogBackend),
            context: Arc::new(SystemContext::new()),
            checkpoints: None,
            shutdown_signal: None,
            state: JobState::Created,
            next_chunk_index: 1,
            carry_over: Vec::new(),
            checkpoint: None,
            summary,
            started_at: Instant::now(),
        })
    }

    pub fn with_log_backend(mut self, backend: Arc<dyn LogBackend>) -> Self {
        self.log_backend = backend;
        self
    }

    pub fn with_context(mut self, context: Arc<dyn ExecutionContext>) -> Self {
        self.context = context;
        self
    }

    /// Saves a checkpoint after every chunk
    pub fn with_checkpoint_store(mut self, store: Arc<dyn CheckpointStore>) -> Self {
        self.checkpoints = Some(store);
        self
    }

    /// Stops between chunks once the signal turns `true`
    pub fn with_shutdown_signal(mut self, shutdown_signal: watch::Receiver<bool>) -> Self {
        self.shutdown_signal = Some(shutdown_signal);
        self
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Summary accumulated so far
    pub fn summary(&self) -> &JobSummary {
        &self.summary
    }

    /// Acquires the cursor for a query
    ///
    /// With `resume` enabled and an unfinished checkpoint for the same job
    /// and query, the records that run already consumed are skipped.
    ///
    /// # Errors
    ///
    /// Returns `ChunkwiseError::InvalidQuery` if the source cannot resolve
    /// the query, and `ChunkwiseError::InvalidState` if the engine was
    /// already started.
    pub fn start(&mut self, query: &Query) -> Result<Box<dyn RecordCursor>> {
        self.expect_state("start", |state| state == JobState::Created)?;

        let query_text = query.to_string();
        let mut cursor = self.source.open(query)?;

        let mut checkpoint = self
            .load_checkpoint()
            .filter(|checkpoint| {
                self.config.resume
                    && checkpoint.is_resumable_for(&self.config.job_name, &query_text)
            })
            .unwrap_or_else(|| {
                JobCheckpoint::new(self.config.job_name.clone(), query_text.clone())
            });

        if checkpoint.records_consumed > 0 {
            let skipped = cursor.skip(checkpoint.records_consumed)?;
            self.summary.records_resumed = skipped;
            tracing::info!(
                job = %self.config.job_name,
                records_skipped = skipped,
                chunks_already_processed = checkpoint.chunks_processed,
                "Resuming from checkpoint"
            );
        }

        checkpoint.mark_started();
        self.save_checkpoint(&checkpoint);
        self.checkpoint = Some(checkpoint);

        self.summary.query = query_text;
        self.started_at = Instant::now();
        self.state = JobState::Started;

        tracing::info!(
            job = %self.config.job_name,
            query = %self.summary.query,
            chunk_size = self.config.chunk_size,
            "Job started"
        );
        Ok(cursor)
    }

    /// Reads the next chunk from the cursor
    ///
    /// A cursor batch larger than the chunk size is split; the excess is
    /// kept and served before the cursor is read again. Returns `Ok(None)`
    /// once both are exhausted.
    pub fn next_chunk(&mut self, cursor: &mut dyn RecordCursor) -> Result<Option<Chunk>> {
        let chunk_size = self.config.chunk_size;
        if self.carry_over.is_empty() {
            match cursor.next_chunk(chunk_size)? {
                Some(records) if !records.is_empty() => self.carry_over = records,
                _ => return Ok(None),
            }
        }

        let rest = if self.carry_over.len() > chunk_size {
            tracing::debug!(
                returned = self.carry_over.len(),
                chunk_size,
                "Cursor returned more records than the chunk size, splitting"
            );
            self.carry_over.split_off(chunk_size)
        } else {
            Vec::new()
        };
        let records = mem::replace(&mut self.carry_over, rest);

        let chunk = Chunk::new(self.next_chunk_index, records);
        self.next_chunk_index += 1;
        Ok(Some(chunk))
    }

    /// Applies the transform to every record of a chunk
    ///
    /// Rejected records are listed in [`ChunkResult::failures`] and left out
    /// of the commit set; the remaining records are still processed. A
    /// transform that panics rejects the record it panicked on, as long as
    /// panics unwind (release builds abort instead).
    ///
    /// # Errors
    ///
    /// Only returns `ChunkwiseError::InvalidState`, when called before
    /// `start`, while a previous chunk awaits its commit, or with a chunk
    /// larger than the configured chunk size.
    pub fn execute_chunk(&mut self, chunk: Chunk) -> Result<ChunkResult> {
        self.expect_state("execute a chunk", |state| {
            matches!(state, JobState::Started | JobState::Committing(_))
        })?;
        if chunk.len() > self.config.chunk_size {
            return Err(ChunkwiseError::InvalidState(format!(
                "chunk {} holds {} records, the limit is {}",
                chunk.index,
                chunk.len(),
                self.config.chunk_size
            )));
        }

        self.state = JobState::Executing(chunk.index);
        log_chunk_start!(self.config.job_name, chunk.index, chunk.len());

        let mut result = ChunkResult::new(chunk.index);
        for mut record in chunk.records {
            let transform = &self.transform;
            let applied = panic::catch_unwind(AssertUnwindSafe(|| transform.apply(&mut record)))
                .unwrap_or_else(|payload| {
                    Err(ChunkwiseError::RecordTransform {
                        record_id: record.id.to_string(),
                        message: format!("transform panicked: {}", panic_message(&*payload)),
                    })
                });
            match applied {
                Ok(()) => result.transformed.push(record),
                Err(e) => {
                    tracing::warn!(
                        chunk_index = chunk.index,
                        record_id = %record.id,
                        error = %e,
                        "Record transform failed"
                    );
                    result.failures.push(RecordFailure {
                        record_id: record.id,
                        message: e.to_string(),
                    });
                }
            }
        }

        self.summary.records_read += result.records_read();
        self.summary.records_failed += result.failed_count();
        self.summary
            .record_failures
            .extend(result.failures.iter().cloned());

        if !result.failures.is_empty() {
            self.publish_record_failures(&result);
        }

        Ok(result)
    }

    /// Commits the transformed records of a chunk in one bulk write
    ///
    /// An empty commit set is skipped without calling the sink. A sink
    /// failure is recorded as a chunk-level error and returned as
    /// [`CommitResult::Failed`]; it is never retried.
    ///
    /// # Errors
    ///
    /// Only returns `ChunkwiseError::InvalidState`, when the result does not
    /// belong to the chunk that was just executed.
    pub fn commit(&mut self, result: ChunkResult) -> Result<CommitResult> {
        let chunk_index = result.chunk_index;
        self.expect_state("commit", |state| state == JobState::Executing(chunk_index))?;
        self.state = JobState::Committing(chunk_index);

        let records_read = result.records_read();
        let failed = result.failed_count();
        let last_record_id = result.transformed.last().map(|r| r.id.clone());

        let outcome = if result.is_empty() {
            tracing::debug!(chunk_index, "No records to commit, skipping bulk write");
            self.summary.chunks_skipped += 1;
            CommitResult::Skipped
        } else {
            let pending = result.transformed.len();
            match self.sink.write_bulk(result.transformed) {
                Ok(count) => {
                    self.summary.chunks_committed += 1;
                    self.summary.records_committed += count;
                    CommitResult::Committed { count }
                }
                Err(e) => {
                    let error = ChunkwiseError::ChunkCommit {
                        chunk_index,
                        message: e.to_string(),
                    };
                    tracing::error!(chunk_index, records = pending, error = %e, "Chunk commit failed");

                    self.summary.chunks_failed += 1;
                    self.summary.records_uncommitted += pending;
                    self.summary
                        .add_error(JobError::chunk_commit(chunk_index, e.to_string()));
                    self.publish_chunk_failure(chunk_index, pending, &error);

                    CommitResult::Failed {
                        error: e.to_string(),
                    }
                }
            }
        };

        self.summary.chunks_processed += 1;
        log_chunk_complete!(chunk_index, outcome.committed_count(), failed);

        let committed_through = match &outcome {
            CommitResult::Committed { .. } => last_record_id,
            _ => None,
        };
        if let Some(mut checkpoint) = self.checkpoint.take() {
            checkpoint.record_chunk(records_read, outcome.committed_count(), committed_through);
            self.save_checkpoint(&checkpoint);
            self.checkpoint = Some(checkpoint);
        }

        Ok(outcome)
    }

    /// Ends the job and returns its summary
    ///
    /// Consumes the engine, so it runs exactly once. Reachable from every
    /// state and never fails: checkpoint and log backend errors are logged
    /// as warnings.
    pub fn finish(mut self) -> JobSummary {
        if let JobState::Executing(chunk_index) = self.state {
            tracing::warn!(
                chunk_index,
                "Job finished with an executed chunk that was never committed"
            );
        }

        if self.state != JobState::Created {
            self.summary.duration = self.started_at.elapsed();
        }

        if let Some(mut checkpoint) = self.checkpoint.take() {
            let stopped_early = self.summary.interrupted
                || self
                    .summary
                    .errors
                    .iter()
                    .any(|error| error.kind != JobErrorKind::ChunkCommit);
            if stopped_early {
                checkpoint.mark_interrupted();
            } else {
                checkpoint.mark_completed();
            }
            self.save_checkpoint(&checkpoint);
        }

        self.state = JobState::Finished;
        self.summary.log_summary();
        self.publish_summary();

        self.summary
    }

    /// Drives the full lifecycle for a query
    ///
    /// Checks the shutdown signal before every chunk. When it is set, the job
    /// stops, is marked interrupted and still finishes normally; chunks that
    /// were committed stay committed.
    ///
    /// # Errors
    ///
    /// Returns an error only if the cursor cannot be acquired (for example
    /// `ChunkwiseError::InvalidQuery`). Once started, every failure is
    /// absorbed into the returned summary and the checkpoint is finished.
    pub fn run(mut self, query: &Query) -> Result<JobSummary> {
        let mut cursor = self.start(query)?;

        loop {
            if self.shutdown_requested() {
                tracing::info!(
                    job = %self.config.job_name,
                    chunks_processed = self.summary.chunks_processed,
                    "Shutdown signal received, stopping before next chunk"
                );
                self.summary.interrupted = true;
                break;
            }

            let chunk = match self.next_chunk(cursor.as_mut()) {
                Ok(Some(chunk)) => chunk,
                Ok(None) => break,
                Err(e) => {
                    self.record_stop(JobErrorKind::Source, "read", &e);
                    break;
                }
            };

            let committed = self
                .execute_chunk(chunk)
                .and_then(|result| self.commit(result));
            if let Err(e) = committed {
                self.record_stop(JobErrorKind::Engine, "execute_chunk", &e);
                break;
            }
        }

        Ok(self.finish())
    }

    fn expect_state(&self, operation: &str, allowed: impl Fn(JobState) -> bool) -> Result<()> {
        if allowed(self.state) {
            Ok(())
        } else {
            Err(ChunkwiseError::InvalidState(format!(
                "cannot {operation} while {}",
                self.state
            )))
        }
    }

    fn shutdown_requested(&self) -> bool {
        self.shutdown_signal
            .as_ref()
            .is_some_and(|signal| *signal.borrow())
    }

    /// Records the error that ends the chunk loop
    fn record_stop(&mut self, kind: JobErrorKind, operation: &str, error: &ChunkwiseError) {
        let cause = match kind {
            JobErrorKind::Source => "record source failed",
            _ => "engine error",
        };
        tracing::error!(job = %self.config.job_name, error = %error, "Job stopped: {cause}");
        self.summary
            .add_error(JobError::new(kind, error.to_string()));

        let mut builder = self.log_builder();
        builder
            .category(Category::Error)
            .level(Severity::Error)
            .summary(format!("Job '{}' stopped: {cause}", self.config.job_name))
            .error(error)
            .operation_name(operation)
            .create_issue(self.config.create_issue_on_chunk_failure);
        self.publish(&builder);
    }

    fn load_checkpoint(&self) -> Option<JobCheckpoint> {
        let store = self.checkpoints.as_ref()?;
        match store.load(&self.config.job_name) {
            Ok(checkpoint) => checkpoint,
            Err(e) => {
                tracing::warn!(job = %self.config.job_name, error = %e, "Failed to load checkpoint, starting fresh");
                None
            }
        }
    }

    fn save_checkpoint(&self, checkpoint: &JobCheckpoint) {
        if let Some(store) = &self.checkpoints {
            if let Err(e) = store.save(checkpoint) {
                tracing::warn!(job = %self.config.job_name, error = %e, "Failed to save checkpoint");
            }
        }
    }

    fn log_builder(&self) -> LogRecordBuilder {
        let mut builder = LogRecordBuilder::new(self.context.as_ref());
        builder
            .log_type(LogType::Batch)
            .functional_area(self.config.functional_area.clone())
            .flow_name(self.config.job_name.clone());
        builder
    }

    fn publish(&self, builder: &LogRecordBuilder) {
        if let Err(e) = self.log_backend.publish(builder.build()) {
            tracing::warn!(error = %e, "Failed to publish log record");
        }
    }

    fn publish_record_failures(&self, result: &ChunkResult) {
        let mut builder = self.log_builder();
        builder
            .category(Category::Warning)
            .level(Severity::Warning)
            .summary(format!(
                "{} record(s) failed transformation in chunk {}",
                result.failed_count(),
                result.chunk_index
            ))
            .details(
                result
                    .failures
                    .iter()
                    .map(|f| format!("{}: {}", f.record_id, f.message))
                    .collect::<Vec<_>>()
                    .join("\n"),
            )
            .operation_name("execute_chunk")
            .related_objects(result.failures.iter().map(|f| &f.record_id))
            .attribute("chunk_index", result.chunk_index);
        self.publish(&builder);
    }

    fn publish_chunk_failure(&self, chunk_index: usize, pending: usize, error: &ChunkwiseError) {
        let mut builder = self.log_builder();
        builder
            .category(Category::Error)
            .level(Severity::Error)
            .summary(format!(
                "Commit of chunk {chunk_index} failed, {pending} record(s) not committed"
            ))
            .error(error)
            .operation_name("commit")
            .attribute("chunk_index", chunk_index)
            .create_issue(self.config.create_issue_on_chunk_failure);
        self.publish(&builder);
    }

    fn publish_summary(&self) {
        let summary = &self.summary;
        let (category, level) = if summary.has_job_errors() {
            (Category::Error, Severity::Error)
        } else if summary.is_successful() {
            (Category::Event, Severity::Info)
        } else {
            (Category::Warning, Severity::Warning)
        };

        let mut builder = self.log_builder();
        builder
            .category(category)
            .level(level)
            .summary(summary.headline())
            .duration(summary.duration)
            .operation_name("finish")
            .payload(json!({
                "query": summary.query,
                "chunks_processed": summary.chunks_processed,
                "chunks_committed": summary.chunks_committed,
                "chunks_skipped": summary.chunks_skipped,
                "chunks_failed": summary.chunks_failed,
                "records_read": summary.records_read,
                "records_committed": summary.records_committed,
                "records_failed": summary.records_failed,
                "records_uncommitted": summary.records_uncommitted,
                "records_resumed": summary.records_resumed,
                "interrupted": summary.interrupted,
            }))
            .related_objects(
                summary
                    .record_failures
                    .iter()
                    .map(|failure| &failure.record_id)
                    .collect::<Vec<&RecordId>>(),
            );
        self.publish(&builder);
    }
}

/// Text of a panic payload raised with a string message
fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

impl fmt::Debug for BatchEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchEngine")
            .field("config", &self.config)
            .field("state", &self.state)
            .field("next_chunk_index", &self.next_chunk_index)
            .field("carry_over", &self.carry_over.len())
            .field("checkpointing", &self.checkpoints.is_some())
            .finish()
    }
}
