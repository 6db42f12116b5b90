//! Log record backends
//!
//! A backend receives finished [`LogRecord`] values and takes care of
//! storing them. Whether a record should open a downstream issue is decided
//! by the backend from the record's issue-creation flag.

use super::attributes::Severity;
use super::record::LogRecord;
use crate::domain::context::ResultExt;
use crate::domain::{ChunkwiseError, Result};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Destination for finished log records
pub trait LogBackend: Send + Sync {
    /// Hands a finished record to the backend
    fn publish(&self, record: LogRecord) -> Result<()>;
}

/// Emits log records as `tracing` events
///
/// The event level follows the record's severity (INFO when unset) and the
/// full record is attached as a JSON field.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogBackend;

impl LogBackend for TracingLogBackend {
    fn publish(&self, record: LogRecord) -> Result<()> {
        let json = record.to_json_line()?;
        let summary = record.summary().unwrap_or_default();
        let category = record.category().map(|c| c.to_string()).unwrap_or_default();

        match record.level().unwrap_or(Severity::Info) {
            Severity::Debug => {
                tracing::debug!(category = %category, record = %json, "{}", summary)
            }
            Severity::Info => {
                tracing::info!(category = %category, record = %json, "{}", summary)
            }
            Severity::Warning => {
                tracing::warn!(category = %category, record = %json, "{}", summary)
            }
            Severity::Error | Severity::Critical => {
                tracing::error!(category = %category, record = %json, "{}", summary)
            }
        }

        if !record.issue_creation_suppressed() {
            tracing::warn!(
                summary = %summary,
                request_id = record.request_id().unwrap_or_default(),
                "Issue creation requested for log record"
            );
        }

        Ok(())
    }
}

/// Appends log records to a JSON Lines file
pub struct JsonLinesLogBackend {
    log_path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonLinesLogBackend {
    /// Creates the backend, making sure the parent directory exists
    pub fn new(log_path: impl Into<PathBuf>) -> Result<Self> {
        let log_path = log_path.into();
        if let Some(parent) = log_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create log record directory: {}", parent.display())
                })?;
            }
        }

        Ok(Self {
            log_path,
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.log_path
    }
}

impl LogBackend for JsonLinesLogBackend {
    fn publish(&self, record: LogRecord) -> Result<()> {
        let mut line = record.to_json_line()?;
        line.push('\n');

        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| ChunkwiseError::LogBackend("log file lock poisoned".to_string()))?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .map_err(|e| {
                ChunkwiseError::LogBackend(format!(
                    "Failed to open {}: {e}",
                    self.log_path.display()
                ))
            })?;

        file.write_all(line.as_bytes())
            .map_err(|e| ChunkwiseError::LogBackend(format!("Failed to write record: {e}")))
    }
}

/// Keeps published records in memory
#[derive(Debug, Default)]
pub struct MemoryLogBackend {
    records: Mutex<Vec<LogRecord>>,
}

impl MemoryLogBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything published so far
    pub fn records(&self) -> Vec<LogRecord> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }
}

impl LogBackend for MemoryLogBackend {
    fn publish(&self, record: LogRecord) -> Result<()> {
        self.records
            .lock()
            .map_err(|_| ChunkwiseError::LogBackend("record buffer lock poisoned".to_string()))?
            .push(record);
        Ok(())
    }
}

/// Publishes every record to each inner backend in turn
///
/// All backends are attempted; the first failure is returned afterwards.
#[derive(Default)]
pub struct FanoutLogBackend {
    backends: Vec<Arc<dyn LogBackend>>,
}

impl FanoutLogBackend {
    pub fn new(backends: Vec<Arc<dyn LogBackend>>) -> Self {
        Self { backends }
    }

    pub fn push(&mut self, backend: Arc<dyn LogBackend>) {
        self.backends.push(backend);
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}

impl LogBackend for FanoutLogBackend {
    fn publish(&self, record: LogRecord) -> Result<()> {
        let mut first_error = None;
        for backend in &self.backends {
            if let Err(e) = backend.publish(record.clone()) {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::attributes::Category;
    use crate::logging::context::FixedContext;
    use crate::logging::record::LogRecordBuilder;
    use tempfile::tempdir;

    fn sample_record(summary: &str) -> LogRecord {
        LogRecordBuilder::new(&FixedContext::new(Some("req-1"), 1_000))
            .category(Category::Event)
            .summary(summary)
            .build()
    }

    struct FailingBackend;

    impl LogBackend for FailingBackend {
        fn publish(&self, _record: LogRecord) -> Result<()> {
            Err(ChunkwiseError::LogBackend("unavailable".to_string()))
        }
    }

    #[test]
    fn test_memory_backend_collects_records() {
        let backend = MemoryLogBackend::new();
        backend.publish(sample_record("one")).unwrap();
        backend.publish(sample_record("two")).unwrap();

        let records = backend.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].summary(), Some("two"));
    }

    #[test]
    fn test_json_lines_backend_appends() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("records.jsonl");
        let backend = JsonLinesLogBackend::new(&path).unwrap();

        backend.publish(sample_record("first")).unwrap();
        backend.publish(sample_record("second")).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let parsed: LogRecord = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(parsed.summary(), Some("second"));
        assert_eq!(parsed.request_id(), Some("req-1"));
    }

    #[test]
    fn test_tracing_backend_accepts_records() {
        let backend = TracingLogBackend;
        assert!(backend.publish(sample_record("traced")).is_ok());
    }

    #[test]
    fn test_fanout_tries_every_backend() {
        let memory = Arc::new(MemoryLogBackend::new());
        let fanout = FanoutLogBackend::new(vec![
            Arc::new(FailingBackend),
            memory.clone() as Arc<dyn LogBackend>,
        ]);

        let result = fanout.publish(sample_record("fanned"));
        assert!(result.is_err());
        assert_eq!(memory.records().len(), 1);
        assert_eq!(fanout.len(), 2);
    }
}
