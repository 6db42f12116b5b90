//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for Chunkwise using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// Chunkwise - chunked batch record processor
#[derive(Parser, Debug)]
#[command(name = "chunkwise")]
#[command(version, about, long_about = None)]
#[command(author = "Chunkwise Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "chunkwise.toml", env = "CHUNKWISE_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "CHUNKWISE_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the configured job chunk by chunk
    Run(commands::run::RunArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Show the stored checkpoint of a job
    Status(commands::status::StatusArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_run() {
        let cli = Cli::parse_from(["chunkwise", "run"]);
        assert_eq!(cli.config, "chunkwise.toml");
        assert!(matches!(cli.command, Commands::Run(_)));
    }

    #[test]
    fn test_cli_parse_run_overrides() {
        let cli = Cli::parse_from([
            "chunkwise",
            "run",
            "--chunk-size",
            "50",
            "--query",
            "accounts where tier != 2",
            "--no-resume",
            "--dry-run",
        ]);
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.chunk_size, Some(50));
                assert_eq!(args.query.as_deref(), Some("accounts where tier != 2"));
                assert!(args.no_resume);
                assert!(args.dry_run);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_parse_with_config() {
        let cli = Cli::parse_from(["chunkwise", "--config", "custom.toml", "run"]);
        assert_eq!(cli.config, "custom.toml");
    }

    #[test]
    fn test_cli_parse_with_log_level() {
        let cli = Cli::parse_from(["chunkwise", "--log-level", "debug", "run"]);
        assert_eq!(cli.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_cli_parse_validate_config() {
        let cli = Cli::parse_from(["chunkwise", "validate-config"]);
        assert!(matches!(cli.command, Commands::ValidateConfig(_)));
    }

    #[test]
    fn test_cli_parse_status() {
        let cli = Cli::parse_from(["chunkwise", "status", "--job", "nightly"]);
        match cli.command {
            Commands::Status(args) => assert_eq!(args.job.as_deref(), Some("nightly")),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_parse_init() {
        let cli = Cli::parse_from(["chunkwise", "init", "--with-examples"]);
        match cli.command {
            Commands::Init(args) => {
                assert!(args.with_examples);
                assert_eq!(args.output, "chunkwise.toml");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
