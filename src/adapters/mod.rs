//! Record sources and sinks for Chunkwise.
//!
//! - [`source`] - query resolution and lazy cursors ([`RecordSource`], [`RecordCursor`])
//! - [`sink`] - bulk commit targets ([`RecordSink`])
//!
//! # Design Pattern
//!
//! Adapters isolate the engine from where records live. Each side ships an
//! in-memory implementation for tests and embedding, plus a JSON Lines
//! implementation used by the CLI:
//!
//! ```rust
//! use chunkwise::adapters::{InMemorySink, InMemorySource, RecordSink, RecordSource};
//! use chunkwise::core::query::Query;
//! use chunkwise::domain::{Record, RecordId};
//!
//! # fn example() -> chunkwise::domain::Result<()> {
//! let source = InMemorySource::new()
//!     .with_collection("accounts", vec![Record::new(RecordId::new("acc-1")?)]);
//! let sink = InMemorySink::new();
//!
//! let mut cursor = source.open(&Query::parse("accounts")?)?;
//! while let Some(records) = cursor.next_chunk(200)? {
//!     sink.write_bulk(records)?;
//! }
//! assert_eq!(sink.records().len(), 1);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

pub mod sink;
pub mod source;

pub use sink::{DryRunSink, InMemorySink, JsonLinesSink, RecordSink};
pub use source::{InMemorySource, JsonLinesSource, RecordCursor, RecordSource};
