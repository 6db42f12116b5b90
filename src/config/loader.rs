//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::ChunkwiseConfig;
use crate::domain::errors::ChunkwiseError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into ChunkwiseConfig
/// 4. Applies environment variable overrides (CHUNKWISE_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns `ChunkwiseError::Configuration` if:
/// - File cannot be read
/// - TOML parsing fails
/// - Environment variable substitution fails
/// - Configuration validation fails
///
/// # Examples
///
/// ```no_run
/// use chunkwise::config::loader::load_config;
///
/// let config = load_config("chunkwise.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<ChunkwiseConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ChunkwiseError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        ChunkwiseError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    let contents = substitute_env_vars(&contents)?;

    let mut config: ChunkwiseConfig = toml::from_str(&contents)
        .map_err(|e| ChunkwiseError::Configuration(format!("Failed to parse TOML: {}", e)))?;

    apply_env_overrides(&mut config)?;

    config.validate().map_err(|e| {
        ChunkwiseError::Configuration(format!("Configuration validation failed: {}", e))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are copied untouched.
///
/// # Errors
///
/// Returns an error naming every referenced variable that is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| ChunkwiseError::Configuration(format!("Invalid placeholder pattern: {e}")))?;
    let mut lines = Vec::new();
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            lines.push(line.to_string());
            continue;
        }

        let processed = re.replace_all(line, |cap: &regex::Captures<'_>| {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => value,
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                    cap[0].to_string()
                }
            }
        });
        lines.push(processed.into_owned());
    }

    if !missing_vars.is_empty() {
        return Err(ChunkwiseError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(lines.join("\n"))
}

fn env_parse<T: FromStr>(name: &str) -> Result<Option<T>> {
    match std::env::var(name) {
        Ok(val) => val.trim().parse().map(Some).map_err(|_| {
            ChunkwiseError::Configuration(format!("Invalid value '{val}' for {name}"))
        }),
        Err(_) => Ok(None),
    }
}

/// Applies environment variable overrides using CHUNKWISE_* prefix
///
/// Environment variables follow the pattern: CHUNKWISE_<SECTION>_<KEY>
/// For example: CHUNKWISE_JOB_CHUNK_SIZE, CHUNKWISE_SOURCE_PATH
///
/// # Errors
///
/// Returns an error if a numeric or boolean override does not parse
fn apply_env_overrides(config: &mut ChunkwiseConfig) -> Result<()> {
    // Application overrides
    if let Ok(val) = std::env::var("CHUNKWISE_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }
    if let Some(val) = env_parse("CHUNKWISE_APPLICATION_DRY_RUN")? {
        config.application.dry_run = val;
    }

    // Job overrides
    if let Ok(val) = std::env::var("CHUNKWISE_JOB_NAME") {
        config.job.name = val;
    }
    if let Ok(val) = std::env::var("CHUNKWISE_JOB_QUERY") {
        config.job.query = val;
    }
    if let Some(val) = env_parse("CHUNKWISE_JOB_CHUNK_SIZE")? {
        config.job.chunk_size = val;
    }
    if let Some(val) = env_parse("CHUNKWISE_JOB_RESUME")? {
        config.job.resume = val;
    }

    // Source and sink overrides
    if let Ok(val) = std::env::var("CHUNKWISE_SOURCE_PATH") {
        config.source.path = val;
    }
    if let Ok(val) = std::env::var("CHUNKWISE_SINK_PATH") {
        config.sink.path = val;
    }

    // State overrides
    if let Some(val) = env_parse("CHUNKWISE_STATE_ENABLE_CHECKPOINTING")? {
        config.state.enable_checkpointing = val;
    }
    if let Ok(val) = std::env::var("CHUNKWISE_STATE_PATH") {
        config.state.path = val;
    }

    // Logging overrides
    if let Some(val) = env_parse("CHUNKWISE_LOGGING_LOCAL_ENABLED")? {
        config.logging.local_enabled = val;
    }
    if let Ok(val) = std::env::var("CHUNKWISE_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
    if let Ok(val) = std::env::var("CHUNKWISE_LOGGING_LOCAL_ROTATION") {
        config.logging.local_rotation = val;
    }
    if let Ok(val) = std::env::var("CHUNKWISE_LOGGING_RECORDS_PATH") {
        config.logging.records_path = Some(val);
    }
    if let Ok(val) = std::env::var("CHUNKWISE_LOGGING_FUNCTIONAL_AREA") {
        config.logging.functional_area = val;
    }
    if let Some(val) = env_parse("CHUNKWISE_LOGGING_CREATE_ISSUE_ON_CHUNK_FAILURE")? {
        config.logging.create_issue_on_chunk_failure = val;
    }

    Ok(())
}
