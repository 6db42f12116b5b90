//! Integration tests for structured log records
//!
//! These tests verify that:
//! - Records built with LogRecordBuilder reach a JSON Lines file intact
//! - Related-object lists are deduplicated and drop malformed identifiers
//! - A builder keeps accumulating after build()
//! - Open enumerations compare by their string form

use chunkwise::domain::{ChunkwiseError, RecordId};
use chunkwise::logging::{
    AttributeKey, Category, FixedContext, FunctionalArea, JsonLinesLogBackend, LogBackend,
    LogRecord, LogRecordBuilder, LogType, OpenValue, Severity,
};
use serde_json::json;
use std::time::Duration;
use tempfile::TempDir;
use test_case::test_case;

const NOW: i64 = 1_700_000_000_000;

fn builder() -> LogRecordBuilder {
    LogRecordBuilder::new(&FixedContext::new(Some("req-7"), NOW))
}

#[test]
fn test_record_round_trips_through_json_lines_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("records.jsonl");
    let backend = JsonLinesLogBackend::new(&path).unwrap();

    let error = ChunkwiseError::ChunkCommit {
        chunk_index: 4,
        message: "bulk write rejected".to_string(),
    };
    let mut first = builder();
    first
        .category(Category::Error)
        .level(Severity::Critical)
        .log_type(LogType::Batch)
        .functional_area("Collections")
        .summary("Commit of chunk 4 failed")
        .error(&error)
        .duration(Duration::from_millis(1500))
        .payload(json!({ "chunk_index": 4 }))
        .create_issue(true);
    backend.publish(first.build()).unwrap();

    let mut second = builder();
    second.category(Category::Event).summary("done");
    backend.publish(second.build()).unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 2);

    let record: LogRecord = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(record.category(), Some(Category::Error));
    assert_eq!(record.level(), Some(Severity::Critical));
    assert_eq!(record.log_type(), Some(OpenValue::Known(LogType::Batch)));
    assert_eq!(
        record.functional_area().map(|area| area.to_string()),
        Some("Collections".to_string())
    );
    assert!(record.details().unwrap().contains("chunk 4"));
    assert_eq!(record.duration(), Some(Duration::from_millis(1500)));
    assert_eq!(record.timestamp_millis(), Some(NOW));
    assert_eq!(record.request_id(), Some("req-7"));
    assert!(!record.issue_creation_suppressed());
    assert_eq!(record, first.build());

    let record: LogRecord = serde_json::from_str(lines[1]).unwrap();
    assert_eq!(record.summary(), Some("done"));
    assert!(record.issue_creation_suppressed());
}

#[test]
fn test_related_objects_keep_distinct_valid_ids() {
    let ids = ["acc-3", "acc-1", "acc-3", "bad id", "", "acc-2", "acc-1", "!!"];
    let record = builder().related_objects(ids).build();

    // 8 candidates, 3 malformed, 2 duplicates
    let related: Vec<String> = record
        .related_objects()
        .into_iter()
        .map(RecordId::into_inner)
        .collect();
    assert_eq!(related, vec!["acc-1", "acc-2", "acc-3"]);
}

#[test]
fn test_related_objects_without_valid_ids_are_absent() {
    let record = builder()
        .related_objects(vec!["acc-1".to_string()])
        .related_objects(vec!["not valid".to_string()])
        .build();

    assert!(record.get_key(AttributeKey::RelatedObjects).is_none());

    let record = builder()
        .related_objects(["acc-1"])
        .related_objects(None::<&str>)
        .build();
    assert!(record.get_key(AttributeKey::RelatedObjects).is_none());
    assert!(!record.to_json_line().unwrap().contains("related_objects"));
}

#[test]
fn test_builder_keeps_accumulating_after_build() {
    let mut builder = builder();
    builder.summary("chunk 1").attribute("chunk_index", 1);
    let first = builder.build();

    builder.summary("chunk 2").attribute("chunk_index", 2);
    let second = builder.build();

    assert_eq!(first.summary(), Some("chunk 1"));
    assert_eq!(first.get("chunk_index"), Some(&json!(1)));
    assert_eq!(second.summary(), Some("chunk 2"));
    assert_eq!(second.get("chunk_index"), Some(&json!(2)));
}

#[test_case("Batch", true ; "known variant")]
#[test_case("Nightly Reconciliation", false ; "freeform value")]
fn test_log_type_open_value(text: &str, known: bool) {
    let parsed = OpenValue::<LogType>::parse(text);
    let freeform: OpenValue<LogType> = text.into();

    assert_eq!(parsed, freeform);
    assert_eq!(parsed.known().is_some(), known);
    assert_eq!(builder().log_type(freeform).build().get("type"), Some(&json!(text)));
}

#[test_case(FunctionalArea::Records, "Records")]
#[test_case(FunctionalArea::Billing, "Billing")]
fn test_known_functional_area_equals_its_string(area: FunctionalArea, text: &str) {
    let known: OpenValue<FunctionalArea> = OpenValue::Known(area);
    assert_eq!(known, OpenValue::from(text));
    assert_eq!(known.as_str(), text);
}
