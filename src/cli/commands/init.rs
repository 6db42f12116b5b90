//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "chunkwise.toml")]
    pub output: String,

    /// Include example values and comments
    #[arg(long)]
    pub with_examples: bool,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("Initializing Chunkwise configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(2); // Configuration error exit code
        }

        let contents = if self.with_examples {
            Self::generate_config_with_examples()
        } else {
            Self::generate_minimal_config()
        };

        fs::write(&self.output, contents)?;

        println!("Created configuration file: {}", self.output);
        println!();
        println!("Next steps:");
        println!("  1. Point [source] path at a directory of <collection>.jsonl files");
        println!("  2. Edit the [job] query and field assignments");
        println!("  3. Validate: chunkwise validate-config -c {}", self.output);
        println!("  4. Run:      chunkwise run -c {}", self.output);
        println!();

        Ok(0)
    }

    /// Generate configuration with examples and comments
    fn generate_config_with_examples() -> String {
        r#"# Chunkwise Configuration File
#
# Values of the form ${VAR_NAME} are replaced with environment variables.
# Every key can also be overridden with CHUNKWISE_<SECTION>_<KEY>,
# for example CHUNKWISE_JOB_CHUNK_SIZE=500.

[application]
# Log level (trace, debug, info, warn, error)
log_level = "info"

# Dry run mode (transform records but don't write them)
dry_run = false

[job]
# Job name, used for checkpoints and log records
name = "mark-processed"

# Records to process: "<collection>" or
# "<collection> where <field> = <value> [and ...]"
# Conditions compare with = or !=; strings take single quotes
query = "accounts where status = 'open'"

# Records per chunk (1-2000)
chunk_size = 200

# Continue after the last consumed record if an unfinished checkpoint exists
resume = true

# Records missing any of these fields are rejected
required_fields = ["name"]

# Fields written onto every record ("id" cannot be assigned)
[job.assign]
status = "processed"

[source]
# Directory containing <collection>.jsonl files
path = "data"

[sink]
# JSON Lines file committed chunks are appended to
path = "out/committed.jsonl"

[state]
# Persist progress after every chunk so interrupted jobs can resume
enable_checkpointing = true
path = "state"

[logging]
# Write tracing output to rolling files as well as the console
local_enabled = false
local_path = "logs"
# daily | hourly | never
local_rotation = "daily"

# Append structured log records as JSON Lines
# records_path = "logs/records.jsonl"

# Functional area attached to structured log records
functional_area = "Records"

# Ask the log consumer to open an issue when a chunk fails to commit
create_issue_on_chunk_failure = true
"#
        .to_string()
    }

    /// Generate minimal configuration
    fn generate_minimal_config() -> String {
        r#"[application]
log_level = "info"
dry_run = false

[job]
name = "mark-processed"
query = "accounts where status = 'open'"
chunk_size = 200
resume = true

[job.assign]
status = "processed"

[source]
path = "data"

[sink]
path = "out/committed.jsonl"

[state]
enable_checkpointing = true
path = "state"

[logging]
local_enabled = false
"#
        .to_string()
    }
}
