//! Status command implementation
//!
//! This module implements the `status` command for displaying the stored
//! checkpoint of the configured job.

use crate::config::load_config;
use crate::core::state::{CheckpointStore, FileCheckpointStore, JobStatus};
use clap::Args;

/// Arguments for the status command
#[derive(Args, Debug, Default)]
pub struct StatusArgs {
    /// Show the checkpoint of another job stored in the same directory
    #[arg(long)]
    pub job: Option<String>,
}

impl StatusArgs {
    /// Execute the status command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!("Checking job status");

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("Failed to load configuration file");
                println!("   Error: {}", e);
                return Ok(2); // Configuration error exit code
            }
        };

        if !config.state.enable_checkpointing {
            println!("Checkpointing is disabled; no job status is recorded.");
            return Ok(0);
        }

        let job_name = self.job.as_deref().unwrap_or(&config.job.name);

        let store = match FileCheckpointStore::new(&config.state.path) {
            Ok(s) => s,
            Err(e) => {
                println!("Failed to open checkpoint directory");
                println!("   Error: {}", e);
                return Ok(5); // Fatal error exit code
            }
        };

        let checkpoint = match store.load(job_name) {
            Ok(Some(checkpoint)) => checkpoint,
            Ok(None) => {
                println!("No run history found for job '{job_name}'.");
                println!("Run 'chunkwise run' to start the job.");
                return Ok(0);
            }
            Err(e) => {
                println!("Failed to load checkpoint");
                println!("   Error: {}", e);
                return Ok(5);
            }
        };

        let status = match checkpoint.status {
            JobStatus::NotStarted => "Not Started",
            JobStatus::InProgress => "In Progress",
            JobStatus::Completed => "Completed",
            JobStatus::Interrupted => "Interrupted",
        };

        println!("Job Status: {}", checkpoint.job_name);
        println!();
        println!("  Query: {}", checkpoint.query);
        println!("  Status: {status}");
        println!("  Chunks Processed: {}", checkpoint.chunks_processed);
        println!("  Records Consumed: {}", checkpoint.records_consumed);
        println!("  Records Committed: {}", checkpoint.records_committed);
        println!(
            "  Last Committed Record: {}",
            checkpoint
                .last_committed_record_id
                .as_ref()
                .map(|id| id.as_str())
                .unwrap_or("-")
        );
        println!(
            "  Started: {}",
            checkpoint.started_at.format("%Y-%m-%d %H:%M:%S")
        );
        match checkpoint.completed_at {
            Some(completed_at) => {
                println!("  Ended: {}", completed_at.format("%Y-%m-%d %H:%M:%S"))
            }
            None => println!("  Ended: -"),
        }

        if checkpoint.is_resumable_for(&config.job.name, &checkpoint.query) {
            println!();
            println!("The next run with resume enabled continues after record {}.", checkpoint.records_consumed);
        }
        println!();
        Ok(0)
    }
}
