//! Checkpoint persistence
//!
//! [`FileCheckpointStore`] keeps one JSON document per job in a directory;
//! [`MemoryCheckpointStore`] keeps them in a map.

use super::checkpoint::JobCheckpoint;
use crate::domain::context::ResultExt;
use crate::domain::{ChunkwiseError, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Storage for job checkpoints
pub trait CheckpointStore: Send + Sync {
    /// Loads the checkpoint of a job, if one was saved
    fn load(&self, job_name: &str) -> Result<Option<JobCheckpoint>>;

    /// Saves (replaces) the checkpoint of a job
    fn save(&self, checkpoint: &JobCheckpoint) -> Result<()>;
}

/// Stores each checkpoint as `<dir>/<job_name>.json`
///
/// Saves go through a temporary file and a rename so a crash mid-write never
/// leaves a truncated checkpoint behind.
#[derive(Debug, Clone)]
pub struct FileCheckpointStore {
    dir: PathBuf,
}

impl FileCheckpointStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).with_context(|| {
            format!("Failed to create checkpoint directory: {}", dir.display())
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, job_name: &str) -> PathBuf {
        let file_name: String = job_name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{file_name}.json"))
    }
}

impl CheckpointStore for FileCheckpointStore {
    fn load(&self, job_name: &str) -> Result<Option<JobCheckpoint>> {
        let path = self.path_for(job_name);
        if !path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&path).map_err(|e| {
            ChunkwiseError::Checkpoint(format!("Failed to read {}: {e}", path.display()))
        })?;
        let checkpoint = serde_json::from_str(&contents).map_err(|e| {
            ChunkwiseError::Checkpoint(format!("Corrupt checkpoint {}: {e}", path.display()))
        })?;
        Ok(Some(checkpoint))
    }

    fn save(&self, checkpoint: &JobCheckpoint) -> Result<()> {
        let path = self.path_for(&checkpoint.job_name);
        let tmp_path = path.with_extension("json.tmp");

        let contents = serde_json::to_string_pretty(checkpoint)?;
        fs::write(&tmp_path, contents).map_err(|e| {
            ChunkwiseError::Checkpoint(format!("Failed to write {}: {e}", tmp_path.display()))
        })?;
        fs::rename(&tmp_path, &path).map_err(|e| {
            ChunkwiseError::Checkpoint(format!("Failed to replace {}: {e}", path.display()))
        })?;

        tracing::debug!(
            job = %checkpoint.job_name,
            records_consumed = checkpoint.records_consumed,
            path = %path.display(),
            "Checkpoint saved"
        );
        Ok(())
    }
}

/// In-memory checkpoint store
#[derive(Debug, Default)]
pub struct MemoryCheckpointStore {
    checkpoints: Mutex<HashMap<String, JobCheckpoint>>,
}

impl MemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CheckpointStore for MemoryCheckpointStore {
    fn load(&self, job_name: &str) -> Result<Option<JobCheckpoint>> {
        let checkpoints = self
            .checkpoints
            .lock()
            .map_err(|_| ChunkwiseError::Checkpoint("checkpoint map lock poisoned".to_string()))?;
        Ok(checkpoints.get(job_name).cloned())
    }

    fn save(&self, checkpoint: &JobCheckpoint) -> Result<()> {
        self.checkpoints
            .lock()
            .map_err(|_| ChunkwiseError::Checkpoint("checkpoint map lock poisoned".to_string()))?
            .insert(checkpoint.job_name.clone(), checkpoint.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::checkpoint::JobStatus;
    use tempfile::tempdir;

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempdir().unwrap();
        let store = FileCheckpointStore::new(dir.path().join("state")).unwrap();

        assert!(store.load("mark-processed").unwrap().is_none());

        let mut checkpoint = JobCheckpoint::new("mark-processed", "accounts");
        checkpoint.mark_started();
        checkpoint.record_chunk(200, 199, None);
        store.save(&checkpoint).unwrap();

        let loaded = store.load("mark-processed").unwrap().unwrap();
        assert_eq!(loaded, checkpoint);
        assert_eq!(loaded.status, JobStatus::InProgress);
    }

    #[test]
    fn test_file_store_sanitizes_job_name() {
        let dir = tempdir().unwrap();
        let store = FileCheckpointStore::new(dir.path()).unwrap();

        let checkpoint = JobCheckpoint::new("nightly/../job", "accounts");
        store.save(&checkpoint).unwrap();

        assert!(dir.path().join("nightly____job.json").exists());
        assert!(store.load("nightly/../job").unwrap().is_some());
    }

    #[test]
    fn test_file_store_corrupt_checkpoint() {
        let dir = tempdir().unwrap();
        let store = FileCheckpointStore::new(dir.path()).unwrap();
        fs::write(dir.path().join("job.json"), "{not json").unwrap();

        let err = store.load("job").unwrap_err();
        assert!(matches!(err, ChunkwiseError::Checkpoint(_)));
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryCheckpointStore::new();
        let checkpoint = JobCheckpoint::new("job", "accounts");

        store.save(&checkpoint).unwrap();
        assert_eq!(store.load("job").unwrap(), Some(checkpoint));
        assert!(store.load("other").unwrap().is_none());
    }
}
