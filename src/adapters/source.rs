//! Record sources
//!
//! A source resolves a [`Query`] to a lazy cursor. The batch engine only ever
//! pulls bounded chunks from the cursor, so a source never has to hold the
//! full record set in memory.

use crate::core::query::Query;
use crate::domain::{ChunkwiseError, Record, Result};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};

/// Resolves queries to cursors
pub trait RecordSource: Send + Sync {
    /// Opens a cursor over every record the query selects
    ///
    /// # Errors
    ///
    /// Returns `ChunkwiseError::InvalidQuery` if the query names a collection
    /// the source does not know, or another error if the cursor cannot be
    /// constructed.
    fn open(&self, query: &Query) -> Result<Box<dyn RecordCursor>>;
}

/// Lazy, forward-only position in a record set
pub trait RecordCursor: Send {
    /// Reads up to `max` records
    ///
    /// Returns `Ok(None)` once the cursor is exhausted. A returned chunk is
    /// never empty.
    fn next_chunk(&mut self, max: usize) -> Result<Option<Vec<Record>>>;

    /// Discards up to `count` records, returning how many were discarded
    fn skip(&mut self, count: u64) -> Result<u64> {
        let mut skipped = 0u64;
        while skipped < count {
            let want = usize::try_from(count - skipped).unwrap_or(usize::MAX).min(1000);
            match self.next_chunk(want)? {
                Some(records) => skipped += records.len() as u64,
                None => break,
            }
        }
        Ok(skipped)
    }
}

/// Source backed by named in-memory collections
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    collections: HashMap<String, Vec<Record>>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) a collection
    pub fn with_collection(mut self, name: impl Into<String>, records: Vec<Record>) -> Self {
        self.collections.insert(name.into(), records);
        self
    }
}

impl RecordSource for InMemorySource {
    fn open(&self, query: &Query) -> Result<Box<dyn RecordCursor>> {
        let records = self.collections.get(&query.collection).ok_or_else(|| {
            ChunkwiseError::InvalidQuery(format!("unknown collection '{}'", query.collection))
        })?;

        Ok(Box::new(InMemoryCursor {
            records: records.clone().into_iter(),
            query: query.clone(),
        }))
    }
}

struct InMemoryCursor {
    records: std::vec::IntoIter<Record>,
    query: Query,
}

impl RecordCursor for InMemoryCursor {
    fn next_chunk(&mut self, max: usize) -> Result<Option<Vec<Record>>> {
        let query = &self.query;
        let chunk: Vec<Record> = self
            .records
            .by_ref()
            .filter(|record| query.matches(record))
            .take(max)
            .collect();

        Ok((!chunk.is_empty()).then_some(chunk))
    }
}

/// Source reading `<dir>/<collection>.jsonl` files
///
/// Each line holds one record as a flat JSON object with an `id` member.
/// Blank lines are ignored; lines that do not parse as a record are skipped
/// with a warning.
#[derive(Debug, Clone)]
pub struct JsonLinesSource {
    dir: PathBuf,
}

impl JsonLinesSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn collection_path(&self, collection: &str) -> PathBuf {
        self.dir.join(format!("{collection}.jsonl"))
    }
}

impl RecordSource for JsonLinesSource {
    fn open(&self, query: &Query) -> Result<Box<dyn RecordCursor>> {
        let path = self.collection_path(&query.collection);
        if !path.is_file() {
            return Err(ChunkwiseError::InvalidQuery(format!(
                "unknown collection '{}' (no file at {})",
                query.collection,
                path.display()
            )));
        }

        let file = File::open(&path).map_err(|e| {
            ChunkwiseError::Source(format!("Failed to open {}: {e}", path.display()))
        })?;

        tracing::debug!(path = %path.display(), query = %query, "Opened JSON Lines cursor");

        Ok(Box::new(JsonLinesCursor {
            lines: BufReader::new(file).lines(),
            query: query.clone(),
            path,
            line_number: 0,
        }))
    }
}

struct JsonLinesCursor {
    lines: Lines<BufReader<File>>,
    query: Query,
    path: PathBuf,
    line_number: usize,
}

impl RecordCursor for JsonLinesCursor {
    fn next_chunk(&mut self, max: usize) -> Result<Option<Vec<Record>>> {
        let mut chunk = Vec::new();

        while chunk.len() < max {
            let Some(line) = self.lines.next() else {
                break;
            };
            self.line_number += 1;

            let line = line.map_err(|e| {
                ChunkwiseError::Source(format!(
                    "Failed to read {} at line {}: {e}",
                    self.path.display(),
                    self.line_number
                ))
            })?;
            if line.trim().is_empty() {
                continue;
            }

            match serde_json::from_str::<Record>(&line) {
                Ok(record) if self.query.matches(&record) => chunk.push(record),
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(
                        path = %self.path.display(),
                        line = self.line_number,
                        error = %e,
                        "Skipping malformed record line"
                    );
                }
            }
        }

        Ok((!chunk.is_empty()).then_some(chunk))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RecordId;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn records(count: usize) -> Vec<Record> {
        (1..=count)
            .map(|i| {
                let status = if i % 2 == 0 { "open" } else { "closed" };
                Record::new(RecordId::new(format!("acc-{i}")).unwrap())
                    .with_field("status", json!(status))
            })
            .collect()
    }

    fn drain(cursor: &mut dyn RecordCursor, max: usize) -> Vec<usize> {
        let mut sizes = Vec::new();
        while let Some(chunk) = cursor.next_chunk(max).unwrap() {
            sizes.push(chunk.len());
        }
        sizes
    }

    #[test]
    fn test_in_memory_chunks() {
        let source = InMemorySource::new().with_collection("accounts", records(250));
        let mut cursor = source.open(&Query::parse("accounts").unwrap()).unwrap();

        assert_eq!(drain(cursor.as_mut(), 200), vec![200, 50]);
    }

    #[test]
    fn test_in_memory_filters() {
        let source = InMemorySource::new().with_collection("accounts", records(10));
        let mut cursor = source
            .open(&Query::parse("accounts where status = 'open'").unwrap())
            .unwrap();

        let chunk = cursor.next_chunk(100).unwrap().unwrap();
        assert_eq!(chunk.len(), 5);
        assert!(chunk.iter().all(|r| r.field("status") == Some(&json!("open"))));
        assert!(cursor.next_chunk(100).unwrap().is_none());
    }

    #[test]
    fn test_unknown_collection_is_invalid_query() {
        let source = InMemorySource::new();
        let err = source.open(&Query::parse("contacts").unwrap()).err().unwrap();
        assert!(matches!(err, ChunkwiseError::InvalidQuery(_)));
    }

    #[test]
    fn test_skip() {
        let source = InMemorySource::new().with_collection("accounts", records(25));
        let mut cursor = source.open(&Query::parse("accounts").unwrap()).unwrap();

        assert_eq!(cursor.skip(20).unwrap(), 20);
        let rest = cursor.next_chunk(10).unwrap().unwrap();
        assert_eq!(rest[0].id.as_str(), "acc-21");
        assert_eq!(rest.len(), 5);
        assert_eq!(cursor.skip(5).unwrap(), 0);
    }

    #[test]
    fn test_json_lines_source() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("accounts.jsonl"),
            concat!(
                "{\"id\":\"acc-1\",\"status\":\"open\"}\n",
                "\n",
                "not json\n",
                "{\"id\":\"bad id!\",\"status\":\"open\"}\n",
                "{\"id\":\"acc-2\",\"status\":\"closed\"}\n",
                "{\"id\":\"acc-3\",\"status\":\"open\"}\n",
            ),
        )
        .unwrap();

        let source = JsonLinesSource::new(dir.path());
        let mut cursor = source
            .open(&Query::parse("accounts where status = 'open'").unwrap())
            .unwrap();

        let chunk = cursor.next_chunk(10).unwrap().unwrap();
        let ids: Vec<&str> = chunk.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["acc-1", "acc-3"]);
        assert!(cursor.next_chunk(10).unwrap().is_none());
    }

    #[test]
    fn test_json_lines_missing_collection() {
        let dir = TempDir::new().unwrap();
        let source = JsonLinesSource::new(dir.path());

        let err = source.open(&Query::parse("accounts").unwrap()).err().unwrap();
        assert!(matches!(err, ChunkwiseError::InvalidQuery(_)));
    }
}
