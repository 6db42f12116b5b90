//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the Chunkwise configuration file.

use crate::config::load_config;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("Validating configuration file: {config_path}");
        println!();

        // load_config validates, including the query syntax
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("Configuration is invalid");
                println!("   Error: {e}");
                return Ok(2); // Configuration error exit code
            }
        };

        println!("Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        println!("  Dry Run: {}", config.application.dry_run);
        println!("  Job: {}", config.job.name);
        println!("  Query: {}", config.job.query);
        println!("  Chunk Size: {}", config.job.chunk_size);
        println!("  Resume: {}", config.job.resume);
        if !config.job.required_fields.is_empty() {
            println!("  Required Fields: {}", config.job.required_fields.join(", "));
        }
        for (field, value) in &config.job.assign {
            println!("  Assign: {field} = {value}");
        }
        println!("  Source: {}", config.source.path);
        println!("  Sink: {}", config.sink.path);
        if config.state.enable_checkpointing {
            println!("  Checkpoints: {}", config.state.path);
        } else {
            println!("  Checkpoints: disabled");
        }
        if let Some(records_path) = &config.logging.records_path {
            println!("  Log Records: {records_path}");
        }
        println!();
        Ok(0)
    }
}
