//! Integration tests for configuration loading and running a configured job
//!
//! Tests that touch CHUNKWISE_* variables hold ENV_MUTEX so they do not
//! interfere with each other.

use chunkwise::cli::commands::run::{exit_code, run_job};
use chunkwise::config::load_config;
use chunkwise::core::state::{CheckpointStore, FileCheckpointStore, JobStatus};
use chunkwise::domain::{ChunkwiseError, Record};
use chunkwise::logging::{FunctionalArea, LogRecord, OpenValue};
use serde_json::json;
use std::fs;
use std::path::Path;
use std::sync::Mutex;
use tempfile::TempDir;
use tokio::sync::watch;

// Mutex to serialize tests that modify environment variables
static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Helper function to clean up environment variables
fn cleanup_env_vars() {
    for name in [
        "CHUNKWISE_APPLICATION_DRY_RUN",
        "CHUNKWISE_JOB_CHUNK_SIZE",
        "CHUNKWISE_JOB_QUERY",
        "CHUNKWISE_JOB_RESUME",
        "CHUNKWISE_LOGGING_FUNCTIONAL_AREA",
        "CHUNKWISE_TEST_DATA_DIR",
    ] {
        std::env::remove_var(name);
    }
}

fn write_config(dir: &Path, body: &str) -> std::path::PathBuf {
    let path = dir.join("chunkwise.toml");
    fs::write(&path, body).unwrap();
    path
}

fn write_accounts(dir: &Path, count: usize) {
    let data_dir = dir.join("data");
    fs::create_dir_all(&data_dir).unwrap();
    let lines: Vec<String> = (1..=count)
        .map(|i| {
            let mut line = json!({
                "id": format!("acc-{i:03}"),
                "status": if i % 3 == 0 { "closed" } else { "open" },
            });
            // Every 10th record lacks the required name
            if i % 10 != 0 {
                line["name"] = json!(format!("Account {i}"));
            }
            line.to_string()
        })
        .collect();
    fs::write(data_dir.join("accounts.jsonl"), lines.join("\n")).unwrap();
}

fn job_config(dir: &Path) -> String {
    format!(
        r#"
[job]
name = "mark-processed"
query = "accounts where status = 'open'"
chunk_size = 25
required_fields = ["name"]

[job.assign]
status = "processed"

[source]
path = "{data}"

[sink]
path = "{sink}"

[state]
path = "{state}"

[logging]
records_path = "{records}"
functional_area = "Collections"
"#,
        data = dir.join("data").display(),
        sink = dir.join("out").join("committed.jsonl").display(),
        state = dir.join("state").display(),
        records = dir.join("logs").join("records.jsonl").display(),
    )
}

#[test]
fn test_env_overrides_apply_after_substitution() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    let dir = TempDir::new().unwrap();
    std::env::set_var("CHUNKWISE_TEST_DATA_DIR", "/srv/records");
    std::env::set_var("CHUNKWISE_JOB_CHUNK_SIZE", "500");
    std::env::set_var("CHUNKWISE_JOB_RESUME", "false");
    std::env::set_var("CHUNKWISE_LOGGING_FUNCTIONAL_AREA", "Billing");

    let path = write_config(
        dir.path(),
        r#"
[job]
name = "nightly"
query = "invoices"

[source]
path = "${CHUNKWISE_TEST_DATA_DIR}/invoices"
"#,
    );
    let config = load_config(&path).unwrap();
    cleanup_env_vars();

    assert_eq!(config.source.path, "/srv/records/invoices");
    assert_eq!(config.job.chunk_size, 500);
    assert!(!config.job.resume);
    assert_eq!(
        config.logging.functional_area(),
        OpenValue::Known(FunctionalArea::Billing)
    );
    assert_eq!(config.batch_config().chunk_size, 500);
}

#[test]
fn test_out_of_range_override_is_rejected() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    let dir = TempDir::new().unwrap();
    std::env::set_var("CHUNKWISE_JOB_CHUNK_SIZE", "2001");
    let path = write_config(
        dir.path(),
        "[job]\nname = \"nightly\"\nquery = \"invoices\"\n\n[source]\npath = \"data\"\n",
    );
    let result = load_config(&path);
    cleanup_env_vars();

    assert!(matches!(result, Err(ChunkwiseError::Configuration(_))));
}

#[test]
fn test_unparseable_override_is_rejected() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    let dir = TempDir::new().unwrap();
    std::env::set_var("CHUNKWISE_JOB_RESUME", "sometimes");
    let path = write_config(
        dir.path(),
        "[job]\nname = \"nightly\"\nquery = \"invoices\"\n\n[source]\npath = \"data\"\n",
    );
    let err = load_config(&path).unwrap_err();
    cleanup_env_vars();

    assert!(err.to_string().contains("CHUNKWISE_JOB_RESUME"));
}

#[test]
fn test_configured_job_runs_end_to_end() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    let dir = TempDir::new().unwrap();
    write_accounts(dir.path(), 90);
    let path = write_config(dir.path(), &job_config(dir.path()));
    let config = load_config(&path).unwrap();

    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let summary = run_job(&config, shutdown_rx).unwrap();

    // 60 open records, 6 of them without a name
    assert_eq!(summary.records_read, 60);
    assert_eq!(summary.records_failed, 6);
    assert_eq!(summary.records_committed, 54);
    assert_eq!(summary.chunks_processed, 3);
    assert_eq!(exit_code(&summary), 1);

    let committed = fs::read_to_string(dir.path().join("out").join("committed.jsonl")).unwrap();
    let committed: Vec<Record> = committed
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(committed.len(), 54);
    assert!(committed
        .iter()
        .all(|record| record.field("status") == Some(&json!("processed"))));

    let store = FileCheckpointStore::new(dir.path().join("state")).unwrap();
    let checkpoint = store.load("mark-processed").unwrap().unwrap();
    assert_eq!(checkpoint.status, JobStatus::Completed);
    assert_eq!(checkpoint.records_consumed, 60);
    assert_eq!(checkpoint.records_committed, 54);

    let log_records = fs::read_to_string(dir.path().join("logs").join("records.jsonl")).unwrap();
    let log_records: Vec<LogRecord> = log_records
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    let summary_record = log_records.last().unwrap();
    assert_eq!(summary_record.operation_name(), Some("finish"));
    assert_eq!(
        summary_record.functional_area(),
        Some(OpenValue::from("Collections"))
    );
    assert_eq!(summary_record.related_objects().len(), 6);
}

#[test]
fn test_dry_run_writes_nothing() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    let dir = TempDir::new().unwrap();
    write_accounts(dir.path(), 30);
    let path = write_config(dir.path(), &job_config(dir.path()));
    std::env::set_var("CHUNKWISE_APPLICATION_DRY_RUN", "true");
    let config = load_config(&path).unwrap();
    cleanup_env_vars();

    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let summary = run_job(&config, shutdown_rx).unwrap();

    assert_eq!(summary.records_read, 20);
    assert!(!dir.path().join("out").join("committed.jsonl").exists());
    assert!(!dir.path().join("state").join("mark-processed.json").exists());
}

#[test]
fn test_unknown_collection_is_fatal() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    let dir = TempDir::new().unwrap();
    write_accounts(dir.path(), 5);
    let path = write_config(dir.path(), &job_config(dir.path()));
    std::env::set_var("CHUNKWISE_JOB_QUERY", "invoices");
    let config = load_config(&path).unwrap();
    cleanup_env_vars();

    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let err = run_job(&config, shutdown_rx).unwrap_err();
    assert!(matches!(err, ChunkwiseError::InvalidQuery(_)));
    assert!(err.is_fatal());
}
