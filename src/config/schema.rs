//! Configuration schema types
//!
//! This module defines the configuration structure for Chunkwise.

use crate::core::batch::{BatchConfig, DEFAULT_CHUNK_SIZE, MAX_CHUNK_SIZE, MIN_CHUNK_SIZE};
use crate::core::query::Query;
use crate::core::transform::FieldAssignment;
use crate::domain::Result;
use crate::logging::{FunctionalArea, OpenValue};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Main Chunkwise configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkwiseConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// The job to run
    pub job: JobConfig,

    /// Where records are read from
    pub source: SourceConfig,

    /// Where committed records are written
    #[serde(default)]
    pub sink: SinkConfig,

    /// Checkpoint configuration
    #[serde(default)]
    pub state: StateConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ChunkwiseConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> std::result::Result<(), String> {
        self.application.validate()?;
        self.job.validate()?;
        self.source.validate()?;
        self.sink.validate()?;
        self.state.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    /// Batch engine settings for the configured job
    pub fn batch_config(&self) -> BatchConfig {
        BatchConfig::new(self.job.name.clone())
            .with_chunk_size(self.job.chunk_size)
            .with_resume(self.job.resume)
            .with_functional_area(self.logging.functional_area())
            .with_issue_on_chunk_failure(self.logging.create_issue_on_chunk_failure)
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Dry run mode (transform records but don't write them)
    #[serde(default)]
    pub dry_run: bool,
}

impl ApplicationConfig {
    fn validate(&self) -> std::result::Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            dry_run: false,
        }
    }
}

/// Job configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    /// Job name, also the checkpoint key
    pub name: String,

    /// Record selector, e.g. `accounts where status = 'open'`
    pub query: String,

    /// Records per chunk (1-2000)
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Continue an unfinished run of the same job and query
    #[serde(default = "default_true")]
    pub resume: bool,

    /// Fields a record must carry (non-null) to be processed
    #[serde(default)]
    pub required_fields: Vec<String>,

    /// Constant values written into every processed record
    #[serde(default)]
    pub assign: BTreeMap<String, Value>,
}

impl JobConfig {
    fn validate(&self) -> std::result::Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("job.name cannot be empty".to_string());
        }

        if !(MIN_CHUNK_SIZE..=MAX_CHUNK_SIZE).contains(&self.chunk_size) {
            return Err(format!(
                "job.chunk_size must be between {MIN_CHUNK_SIZE} and {MAX_CHUNK_SIZE}, got {}",
                self.chunk_size
            ));
        }

        Query::parse(&self.query).map_err(|e| format!("job.query: {e}"))?;

        if self.required_fields.iter().any(|f| f.trim().is_empty()) {
            return Err("job.required_fields cannot contain empty names".to_string());
        }

        if self.assign.keys().any(|k| k == "id") {
            return Err("job.assign cannot overwrite the record id".to_string());
        }

        Ok(())
    }

    /// Parses the configured query
    pub fn parsed_query(&self) -> Result<Query> {
        Query::parse(&self.query)
    }

    /// Builds the record transform the job applies
    pub fn transform(&self) -> FieldAssignment {
        FieldAssignment::from_config(&self.assign, &self.required_fields)
    }
}

/// Record source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Directory holding one `<collection>.jsonl` file per collection
    pub path: String,
}

impl SourceConfig {
    fn validate(&self) -> std::result::Result<(), String> {
        if self.path.trim().is_empty() {
            return Err("source.path cannot be empty".to_string());
        }
        Ok(())
    }
}

/// Record sink configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    /// JSON Lines file committed records are appended to
    #[serde(default = "default_sink_path")]
    pub path: String,
}

impl SinkConfig {
    fn validate(&self) -> std::result::Result<(), String> {
        if self.path.trim().is_empty() {
            return Err("sink.path cannot be empty".to_string());
        }
        Ok(())
    }
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            path: default_sink_path(),
        }
    }
}

/// Checkpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateConfig {
    /// Enable checkpointing
    #[serde(default = "default_true")]
    pub enable_checkpointing: bool,

    /// Directory holding `<job>.json` checkpoints
    #[serde(default = "default_state_path")]
    pub path: String,
}

impl StateConfig {
    fn validate(&self) -> std::result::Result<(), String> {
        if self.enable_checkpointing && self.path.trim().is_empty() {
            return Err("state.path cannot be empty when checkpointing is enabled".to_string());
        }
        Ok(())
    }
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            enable_checkpointing: true,
            path: default_state_path(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable local file logging
    #[serde(default)]
    pub local_enabled: bool,

    /// Local log directory
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation strategy (daily, hourly, never)
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,

    /// JSON Lines file for structured log records (none = tracing only)
    #[serde(default)]
    pub records_path: Option<String>,

    /// Functional area stamped on log records, known or free text
    #[serde(default = "default_functional_area")]
    pub functional_area: String,

    /// Request downstream issue creation for chunk failures
    #[serde(default = "default_true")]
    pub create_issue_on_chunk_failure: bool,
}

impl LoggingConfig {
    fn validate(&self) -> std::result::Result<(), String> {
        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }

        if self.local_enabled && self.local_path.trim().is_empty() {
            return Err("logging.local_path cannot be empty when local logging is enabled".to_string());
        }

        if let Some(path) = &self.records_path {
            if path.trim().is_empty() {
                return Err("logging.records_path cannot be empty when set".to_string());
            }
        }

        if self.functional_area.trim().is_empty() {
            return Err("logging.functional_area cannot be empty".to_string());
        }

        Ok(())
    }

    /// Functional area, resolved to a known value where possible
    pub fn functional_area(&self) -> OpenValue<FunctionalArea> {
        OpenValue::parse(&self.functional_area)
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
            records_path: None,
            functional_area: default_functional_area(),
            create_issue_on_chunk_failure: true,
        }
    }
}

// Default value functions

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_sink_path() -> String {
    "committed.jsonl".to_string()
}

fn default_state_path() -> String {
    "state".to_string()
}

fn default_local_path() -> String {
    "logs".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}

fn default_functional_area() -> String {
    FunctionalArea::Records.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn job() -> JobConfig {
        JobConfig {
            name: "mark-processed".to_string(),
            query: "accounts where status = 'open'".to_string(),
            chunk_size: 200,
            resume: true,
            required_fields: vec!["name".to_string()],
            assign: BTreeMap::from([("status".to_string(), json!("processed"))]),
        }
    }

    fn config() -> ChunkwiseConfig {
        ChunkwiseConfig {
            application: ApplicationConfig::default(),
            job: job(),
            source: SourceConfig {
                path: "data".to_string(),
            },
            sink: SinkConfig::default(),
            state: StateConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(config().validate().is_ok());
    }

    #[test]
    fn test_application_config_validation() {
        let mut config = ApplicationConfig::default();
        assert!(config.validate().is_ok());

        config.log_level = "verbose".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_job_config_validation() {
        let mut config = job();
        assert!(config.validate().is_ok());

        config.chunk_size = 0;
        assert!(config.validate().is_err());

        config.chunk_size = 2001;
        assert!(config.validate().is_err());

        config.chunk_size = 2000;
        config.query = "accounts where".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.starts_with("job.query"));

        config.query = "accounts".to_string();
        config.name = " ".to_string();
        assert!(config.validate().is_err());

        config.name = "job".to_string();
        config.assign.insert("id".to_string(), json!("x"));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_state_config_validation() {
        let mut config = StateConfig::default();
        config.path = String::new();
        assert!(config.validate().is_err());

        config.enable_checkpointing = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_logging_config_default() {
        let config = LoggingConfig::default();
        assert!(!config.local_enabled);
        assert_eq!(config.local_path, "logs");
        assert_eq!(config.local_rotation, "daily");
        assert!(config.records_path.is_none());
        assert_eq!(config.functional_area(), OpenValue::Known(FunctionalArea::Records));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_logging_config_validation() {
        let mut config = LoggingConfig::default();
        config.local_rotation = "size".to_string();
        assert!(config.validate().is_err());

        config.local_rotation = "hourly".to_string();
        config.records_path = Some(String::new());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_freeform_functional_area() {
        let config = LoggingConfig {
            functional_area: "Customer Onboarding".to_string(),
            ..LoggingConfig::default()
        };
        assert_eq!(config.functional_area().as_str(), "Customer Onboarding");
        assert!(config.functional_area().known().is_none());
    }

    #[test]
    fn test_batch_config() {
        let batch = config().batch_config();
        assert_eq!(batch.job_name, "mark-processed");
        assert_eq!(batch.chunk_size, 200);
        assert!(batch.resume);
        assert!(batch.create_issue_on_chunk_failure);
    }

    #[test]
    fn test_default_values() {
        assert_eq!(default_log_level(), "info");
        assert_eq!(default_chunk_size(), 200);
        assert_eq!(default_sink_path(), "committed.jsonl");
        assert_eq!(default_state_path(), "state");
        assert_eq!(default_functional_area(), "Records");
    }
}
