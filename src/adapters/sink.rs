//! Record sinks
//!
//! A sink takes the successfully transformed records of one chunk in a single
//! bulk call. The call succeeds or fails as a whole; there is no per-record
//! result at this boundary.

use crate::domain::context::ResultExt;
use crate::domain::{ChunkwiseError, Record, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Commit target for transformed records
pub trait RecordSink: Send + Sync {
    /// Writes every record or none of them
    ///
    /// Never called with an empty collection. Returns the number of records
    /// written.
    fn write_bulk(&self, records: Vec<Record>) -> Result<usize>;
}

/// Keeps committed records in memory
#[derive(Debug, Default)]
pub struct InMemorySink {
    committed: Mutex<Vec<Record>>,
    call_sizes: Mutex<Vec<usize>>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every record committed so far, in commit order
    pub fn records(&self) -> Vec<Record> {
        self.committed
            .lock()
            .map(|committed| committed.clone())
            .unwrap_or_default()
    }

    /// Size of each `write_bulk` call, in call order
    pub fn call_sizes(&self) -> Vec<usize> {
        self.call_sizes
            .lock()
            .map(|sizes| sizes.clone())
            .unwrap_or_default()
    }
}

impl RecordSink for InMemorySink {
    fn write_bulk(&self, records: Vec<Record>) -> Result<usize> {
        let count = records.len();
        let mut committed = self
            .committed
            .lock()
            .map_err(|_| ChunkwiseError::Sink("sink lock poisoned".to_string()))?;
        let mut call_sizes = self
            .call_sizes
            .lock()
            .map_err(|_| ChunkwiseError::Sink("sink lock poisoned".to_string()))?;

        committed.extend(records);
        call_sizes.push(count);
        Ok(count)
    }
}

/// Appends committed records to a JSON Lines file
///
/// A chunk is serialised in full before the file is touched, then written
/// with a single append. If that append or its flush fails, the file is
/// truncated back to its length before the chunk, so a failed chunk leaves
/// no partial lines behind.
#[derive(Debug)]
pub struct JsonLinesSink {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonLinesSink {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create sink directory: {}", parent.display())
            })?;
        }
        Ok(Self {
            path,
            lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordSink for JsonLinesSink {
    fn write_bulk(&self, records: Vec<Record>) -> Result<usize> {
        let mut buffer = String::new();
        for record in &records {
            buffer.push_str(&serde_json::to_string(record)?);
            buffer.push('\n');
        }

        let _guard = self
            .lock
            .lock()
            .map_err(|_| ChunkwiseError::Sink("sink lock poisoned".to_string()))?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| {
                ChunkwiseError::Sink(format!("Failed to open {}: {e}", self.path.display()))
            })?;
        append_or_rollback(&mut file, buffer.as_bytes()).map_err(|e| {
            ChunkwiseError::Sink(format!("Failed to write {}: {e}", self.path.display()))
        })?;

        Ok(records.len())
    }
}

/// File-like target whose length can be read and cut back
trait Truncate: Write {
    fn current_len(&self) -> io::Result<u64>;
    fn truncate_to(&mut self, len: u64) -> io::Result<()>;
}

impl Truncate for File {
    fn current_len(&self) -> io::Result<u64> {
        Ok(self.metadata()?.len())
    }

    fn truncate_to(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)
    }
}

/// Appends `bytes` in full, or restores the previous length and returns the
/// write error
fn append_or_rollback<T: Truncate>(target: &mut T, bytes: &[u8]) -> io::Result<()> {
    let prev_len = target.current_len()?;
    let written = target.write_all(bytes).and_then(|_| target.flush());
    if let Err(e) = written {
        if let Err(rollback) = target.truncate_to(prev_len) {
            tracing::warn!(
                len = prev_len,
                error = %rollback,
                "Failed to truncate sink file after a failed write"
            );
        }
        return Err(e);
    }
    Ok(())
}

/// Accepts every chunk without writing anything
#[derive(Debug, Default)]
pub struct DryRunSink {
    records_seen: AtomicU64,
}

impl DryRunSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records_seen(&self) -> u64 {
        self.records_seen.load(Ordering::Relaxed)
    }
}

impl RecordSink for DryRunSink {
    fn write_bulk(&self, records: Vec<Record>) -> Result<usize> {
        let count = records.len();
        self.records_seen.fetch_add(count as u64, Ordering::Relaxed);
        tracing::info!(
            records = count,
            first = records.first().map(|r| r.id.as_str()).unwrap_or_default(),
            "Dry run: skipping bulk write"
        );
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RecordId;
    use serde_json::json;
    use tempfile::TempDir;

    fn records(ids: &[&str]) -> Vec<Record> {
        ids.iter()
            .map(|id| Record::new(RecordId::new(*id).unwrap()).with_field("status", json!("done")))
            .collect()
    }

    #[test]
    fn test_in_memory_sink() {
        let sink = InMemorySink::new();
        assert_eq!(sink.write_bulk(records(&["a", "b"])).unwrap(), 2);
        assert_eq!(sink.write_bulk(records(&["c"])).unwrap(), 1);

        assert_eq!(sink.records().len(), 3);
        assert_eq!(sink.call_sizes(), vec![2, 1]);
    }

    #[test]
    fn test_json_lines_sink_appends() {
        let dir = TempDir::new().unwrap();
        let sink = JsonLinesSink::new(dir.path().join("out").join("committed.jsonl")).unwrap();

        sink.write_bulk(records(&["a", "b"])).unwrap();
        sink.write_bulk(records(&["c"])).unwrap();

        let contents = fs::read_to_string(sink.path()).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);

        let last: Record = serde_json::from_str(lines[2]).unwrap();
        assert_eq!(last.id.as_str(), "c");
        assert_eq!(last.field("status"), Some(&json!("done")));
    }

    /// Accepts `budget` bytes, then fails every write
    struct ShortWriter {
        data: Vec<u8>,
        budget: usize,
    }

    impl Write for ShortWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.budget == 0 {
                return Err(io::Error::new(io::ErrorKind::Other, "disk full"));
            }
            let n = buf.len().min(self.budget);
            self.data.extend_from_slice(&buf[..n]);
            self.budget -= n;
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Truncate for ShortWriter {
        fn current_len(&self) -> io::Result<u64> {
            Ok(self.data.len() as u64)
        }

        fn truncate_to(&mut self, len: u64) -> io::Result<()> {
            self.data.truncate(len as usize);
            Ok(())
        }
    }

    #[test]
    fn test_failed_append_rolls_back_partial_chunk() {
        let mut target = ShortWriter {
            data: b"{\"id\":\"a\"}\n".to_vec(),
            budget: 5,
        };

        let err = append_or_rollback(&mut target, b"{\"id\":\"b\"}\n{\"id\":\"c\"}\n").unwrap_err();

        assert_eq!(err.to_string(), "disk full");
        assert_eq!(target.data, b"{\"id\":\"a\"}\n");
    }

    #[test]
    fn test_append_keeps_earlier_chunks() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("committed.jsonl");
        fs::write(&path, "first\n").unwrap();

        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        append_or_rollback(&mut file, b"second\n").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "first\nsecond\n");
    }

    #[test]
    fn test_dry_run_sink_counts() {
        let sink = DryRunSink::new();
        sink.write_bulk(records(&["a", "b", "c"])).unwrap();
        assert_eq!(sink.records_seen(), 3);
    }
}
