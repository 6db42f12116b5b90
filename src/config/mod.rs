//! Configuration management for Chunkwise.
//!
//! This module provides TOML-based configuration loading, parsing, and validation.
//!
//! # Overview
//!
//! Chunkwise uses TOML configuration files with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `CHUNKWISE_<SECTION>_<KEY>` environment overrides
//! - Default values for optional settings
//! - Validation on load
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use chunkwise::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("chunkwise.toml")?;
//!
//! println!("Job: {}", config.job.name);
//! println!("Query: {}", config.job.query);
//! println!("Chunk size: {}", config.job.chunk_size);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - Log level and dry run
//! - [`JobConfig`] - Job name, query, chunk size, resume and field assignments
//! - [`SourceConfig`] - Directory of `<collection>.jsonl` files
//! - [`SinkConfig`] - JSON Lines file committed records go to
//! - [`StateConfig`] - Checkpointing
//! - [`LoggingConfig`] - Log files and log record settings
//!
//! # Example Configuration
//!
//! ```toml
//! [job]
//! name = "mark-processed"
//! query = "accounts where status = 'open'"
//! chunk_size = 200
//! required_fields = ["name"]
//!
//! [job.assign]
//! status = "processed"
//!
//! [source]
//! path = "${CHUNKWISE_DATA_DIR}/source"
//!
//! [sink]
//! path = "${CHUNKWISE_DATA_DIR}/committed.jsonl"
//! ```

pub mod loader;
pub mod schema;

// Re-export commonly used types
pub use loader::load_config;
pub use schema::{
    ApplicationConfig, ChunkwiseConfig, JobConfig, LoggingConfig, SinkConfig, SourceConfig,
    StateConfig,
};
