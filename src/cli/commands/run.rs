//! Run command implementation
//!
//! This module implements the `run` command, which executes the configured
//! job against the JSON Lines source and sink.

use crate::adapters::{DryRunSink, JsonLinesSink, JsonLinesSource, RecordSink};
use crate::config::{load_config, ChunkwiseConfig};
use crate::core::batch::{BatchEngine, JobSummary};
use crate::core::state::FileCheckpointStore;
use crate::domain::{ChunkwiseError, Result};
use crate::log_error_with_context;
use crate::logging::{FanoutLogBackend, JsonLinesLogBackend, LogBackend, TracingLogBackend};
use clap::Args;
use std::sync::Arc;
use tokio::sync::watch;

/// Arguments for the run command
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Dry run mode - transform records without writing them
    #[arg(long)]
    pub dry_run: bool,

    /// Override the job query
    #[arg(long)]
    pub query: Option<String>,

    /// Override the chunk size (1-2000)
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Start from the beginning even if an unfinished checkpoint exists
    #[arg(long)]
    pub no_resume: bool,
}

impl RunArgs {
    /// Applies command-line overrides to a loaded configuration
    pub fn apply_overrides(&self, config: &mut ChunkwiseConfig) {
        if let Some(query) = &self.query {
            tracing::info!(query = %query, "Overriding job query from CLI");
            config.job.query = query.clone();
        }
        if let Some(chunk_size) = self.chunk_size {
            tracing::info!(chunk_size, "Overriding chunk size from CLI");
            config.job.chunk_size = chunk_size;
        }
        if self.no_resume {
            tracing::info!("Disabling resume from CLI");
            config.job.resume = false;
        }
        if self.dry_run {
            tracing::info!("Enabling dry-run mode from CLI");
            config.application.dry_run = true;
        }
    }

    /// Execute the run command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!("Starting run command");

        let mut config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Failed to load configuration: {e}");
                return Ok(2); // Configuration error exit code
            }
        };

        self.apply_overrides(&mut config);

        if let Err(e) = config.validate() {
            tracing::error!(error = %e, "Configuration validation failed");
            eprintln!("Configuration validation failed: {e}");
            return Ok(2);
        }

        if config.application.dry_run {
            tracing::info!("Dry run mode enabled - no records will be written");
            println!("DRY RUN MODE - No records will be written");
            println!();
        }

        println!("Job:        {}", config.job.name);
        println!("Query:      {}", config.job.query);
        println!("Chunk size: {}", config.job.chunk_size);
        println!();

        let summary = match tokio::task::spawn_blocking(move || run_job(&config, shutdown_signal))
            .await?
        {
            Ok(summary) => summary,
            Err(e) => {
                log_error_with_context!(e, "Job could not start");
                eprintln!("Job could not start: {e}");
                return Ok(5); // Fatal error exit code
            }
        };

        print_summary(&summary);

        let code = exit_code(&summary);
        match code {
            130 => {
                println!("Job interrupted gracefully. Progress saved.");
                println!("Run the same command to resume from checkpoint.");
                tracing::info!("Job interrupted by user signal");
            }
            0 => println!("Job completed successfully!"),
            _ => println!("Job completed with failures"),
        }

        Ok(code)
    }
}

/// Builds the engine described by a configuration and runs it to completion
///
/// # Errors
///
/// Returns an error if the sink, checkpoint store or log record file cannot
/// be prepared, or if the job cannot start (see [`BatchEngine::run`]).
pub fn run_job(
    config: &ChunkwiseConfig,
    shutdown_signal: watch::Receiver<bool>,
) -> Result<JobSummary> {
    let query = config.job.parsed_query()?;

    let source = Arc::new(JsonLinesSource::new(&config.source.path));
    let sink: Arc<dyn RecordSink> = if config.application.dry_run {
        Arc::new(DryRunSink::new())
    } else {
        Arc::new(JsonLinesSink::new(&config.sink.path)?)
    };

    let mut engine = BatchEngine::new(
        config.batch_config(),
        source,
        sink,
        Arc::new(config.job.transform()),
    )?
    .with_log_backend(log_backend(config)?)
    .with_shutdown_signal(shutdown_signal);

    if config.state.enable_checkpointing && !config.application.dry_run {
        let store = FileCheckpointStore::new(&config.state.path)?;
        engine = engine.with_checkpoint_store(Arc::new(store));
    }

    engine.run(&query)
}

fn log_backend(config: &ChunkwiseConfig) -> Result<Arc<dyn LogBackend>> {
    let tracing_backend: Arc<dyn LogBackend> = Arc::new(TracingLogBackend);
    let mut fanout = FanoutLogBackend::new(vec![tracing_backend]);
    if let Some(path) = &config.logging.records_path {
        let backend = JsonLinesLogBackend::new(path).map_err(|e| {
            ChunkwiseError::Configuration(format!("logging.records_path: {e}"))
        })?;
        fanout.push(Arc::new(backend));
    }
    Ok(Arc::new(fanout))
}

/// Maps a job summary to the process exit code
///
/// 0 when every record was committed, 1 when the job finished with record
/// or chunk failures, 130 when it was interrupted.
pub fn exit_code(summary: &JobSummary) -> i32 {
    if summary.interrupted {
        130 // SIGINT exit code (standard Unix convention)
    } else if summary.is_successful() {
        0
    } else {
        1 // Partial success
    }
}

fn print_summary(summary: &JobSummary) {
    println!();
    println!("Job Summary:");
    println!("  Chunks: {}", summary.chunks_processed);
    println!("  Records Read: {}", summary.records_read);
    println!("  Records Committed: {}", summary.records_committed);
    println!("  Records Failed: {}", summary.records_failed);
    if summary.records_resumed > 0 {
        println!("  Records Skipped (resume): {}", summary.records_resumed);
    }
    println!("  Duration: {:.2}s", summary.duration.as_secs_f64());
    println!("  Success Rate: {:.2}%", summary.success_rate());
    println!();

    if !summary.record_failures.is_empty() {
        println!("Rejected records:");
        for failure in summary.record_failures.iter().take(10) {
            println!("  - {}: {}", failure.record_id, failure.message);
        }
        if summary.record_failures.len() > 10 {
            println!("  ... and {} more", summary.record_failures.len() - 10);
        }
        println!();
    }

    if !summary.errors.is_empty() {
        println!("Errors encountered:");
        for error in &summary.errors {
            match error.chunk_index {
                Some(index) => println!("  - {:?} (chunk {index}): {}", error.kind, error.message),
                None => println!("  - {:?}: {}", error.kind, error.message),
            }
        }
        println!();
    }
}
