// Chunkwise - Chunked Batch Record Processor
// Copyright (c) 2025 Chunkwise Contributors
// Licensed under the MIT License

//! # Chunkwise - Chunked Batch Record Processor
//!
//! Chunkwise applies a record transform to every record matching a query,
//! committing the results in bounded chunks so that one bad record or one
//! failed write never sinks the whole job.
//!
//! ## Overview
//!
//! This library provides:
//! - **Chunking** records from a [`adapters::RecordSource`] cursor
//! - **Transforming** each record independently, isolating failures per record
//! - **Committing** each chunk with a single bulk write to a [`adapters::RecordSink`]
//! - **Checkpointing** progress so an interrupted job resumes where it stopped
//! - **Structured log records** built with [`logging::LogRecordBuilder`]
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Business logic (batch engine, query, transform, state)
//! - [`adapters`] - Record sources and sinks
//! - [`domain`] - Core domain types and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Diagnostic logging and structured log records
//!
//! ## Quick Start
//!
//! ```rust
//! use chunkwise::adapters::{InMemorySink, InMemorySource};
//! use chunkwise::core::batch::{BatchConfig, BatchEngine};
//! use chunkwise::core::query::Query;
//! use chunkwise::core::transform::FieldAssignment;
//! use chunkwise::domain::{Record, RecordId};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # fn main() -> chunkwise::domain::Result<()> {
//! let records = (1..=5)
//!     .map(|i| Record::new(RecordId::new(format!("acc-{i}")).unwrap()))
//!     .collect();
//! let source = Arc::new(InMemorySource::new().with_collection("accounts", records));
//! let sink = Arc::new(InMemorySink::new());
//! let transform = FieldAssignment::new().assign("status", json!("processed"));
//!
//! let engine = BatchEngine::new(
//!     BatchConfig::new("mark-processed").with_chunk_size(2),
//!     source,
//!     sink.clone(),
//!     Arc::new(transform),
//! )?;
//! let summary = engine.run(&Query::parse("accounts")?)?;
//!
//! assert_eq!(summary.chunks_processed, 3);
//! assert_eq!(sink.records().len(), 5);
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! All fallible operations return [`domain::Result`], carrying a
//! [`domain::ChunkwiseError`]. Record and chunk failures are not errors of
//! the job: they are collected in the [`core::batch::JobSummary`].

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
