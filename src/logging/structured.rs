//! Diagnostic logging setup using tracing
//!
//! The console layer is always installed. When `logging.local_enabled` is
//! set, a JSON layer writing to a rolling `chunkwise.log` is added next to
//! it. Structured log records are not routed through here; they go to the
//! [`LogBackend`](super::LogBackend) the engine is given.

use crate::config::LoggingConfig;
use crate::domain::{ChunkwiseError, Result};
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

const LOG_FILE_NAME: &str = "chunkwise.log";

const LEVELS: [(&str, Level); 5] = [
    ("trace", Level::TRACE),
    ("debug", Level::DEBUG),
    ("info", Level::INFO),
    ("warn", Level::WARN),
    ("error", Level::ERROR),
];

/// Keeps the file writer alive; logs buffered for the file are flushed on drop
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
    log_dir: Option<PathBuf>,
}

impl LoggingGuard {
    /// Directory of the rolling log file, if file logging is enabled
    pub fn log_dir(&self) -> Option<&Path> {
        self.log_dir.as_deref()
    }
}

/// Installs the global tracing subscriber
///
/// `RUST_LOG` takes precedence over `level` when set. Call once per process.
///
/// # Errors
///
/// Returns `ChunkwiseError::Configuration` for an unknown level or rotation,
/// an uncreatable log directory, or a subscriber that is already installed.
///
/// # Example
///
/// ```no_run
/// use chunkwise::logging::init_logging;
/// use chunkwise::config::LoggingConfig;
///
/// let config = LoggingConfig::default();
/// let _guard = init_logging("info", &config).expect("Failed to initialize logging");
/// ```
pub fn init_logging(level: &str, config: &LoggingConfig) -> Result<LoggingGuard> {
    let level = parse_log_level(level)?;
    let filter = || {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("chunkwise={}", level.as_str().to_ascii_lowercase()))
        })
    };

    let console: BoxedLayer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_names(true)
        .with_filter(filter())
        .boxed();
    let mut layers = vec![console];

    let mut guard = LoggingGuard {
        _file_guard: None,
        log_dir: None,
    };
    if config.local_enabled {
        let (layer, file_guard) = file_layer(config)?;
        layers.push(layer.with_filter(filter()).boxed());
        guard = LoggingGuard {
            _file_guard: Some(file_guard),
            log_dir: Some(PathBuf::from(&config.local_path)),
        };
    }

    tracing_subscriber::registry()
        .with(layers)
        .try_init()
        .map_err(|e| ChunkwiseError::Configuration(format!("Logging already initialized: {e}")))?;

    let log_dir = guard
        .log_dir()
        .map(|d| d.display().to_string())
        .unwrap_or_else(|| "-".to_string());
    tracing::info!(
        level = level.as_str(),
        log_dir = %log_dir,
        rotation = %config.local_rotation,
        log_records = config.records_path.as_deref().unwrap_or("-"),
        "Logging initialized"
    );

    Ok(guard)
}

/// JSON layer over a non-blocking rolling file in `local_path`
fn file_layer(config: &LoggingConfig) -> Result<(BoxedLayer, WorkerGuard)> {
    let rotation = parse_rotation(&config.local_rotation)?;
    std::fs::create_dir_all(&config.local_path).map_err(|e| {
        ChunkwiseError::Configuration(format!(
            "Failed to create log directory {}: {e}",
            config.local_path
        ))
    })?;

    let appender = RollingFileAppender::new(rotation, &config.local_path, LOG_FILE_NAME);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let layer = tracing_subscriber::fmt::layer()
        .json()
        .with_current_span(false)
        .with_thread_ids(true)
        .with_writer(writer)
        .boxed();
    Ok((layer, guard))
}

/// Parse a level name, ignoring case and surrounding whitespace
pub(crate) fn parse_log_level(level: &str) -> Result<Level> {
    let wanted = level.trim();
    LEVELS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(wanted))
        .map(|(_, level)| *level)
        .ok_or_else(|| {
            ChunkwiseError::Configuration(format!(
                "Invalid log level: {level}. Must be one of: trace, debug, info, warn, error"
            ))
        })
}

fn parse_rotation(rotation: &str) -> Result<Rotation> {
    match rotation {
        "daily" => Ok(Rotation::DAILY),
        "hourly" => Ok(Rotation::HOURLY),
        "never" => Ok(Rotation::NEVER),
        other => Err(ChunkwiseError::Configuration(format!(
            "Invalid log rotation '{other}'. Must be one of: daily, hourly, never"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use test_case::test_case;

    #[test_case("trace", Level::TRACE)]
    #[test_case("Debug", Level::DEBUG)]
    #[test_case(" info ", Level::INFO)]
    #[test_case("WARN", Level::WARN)]
    #[test_case("error", Level::ERROR)]
    fn test_parse_log_level(input: &str, expected: Level) {
        assert_eq!(parse_log_level(input).unwrap(), expected);
    }

    #[test]
    fn test_parse_log_level_invalid() {
        assert!(parse_log_level("verbose").is_err());
        assert!(parse_log_level("").is_err());
    }

    #[test]
    fn test_parse_rotation() {
        assert_eq!(parse_rotation("daily").unwrap(), Rotation::DAILY);
        assert_eq!(parse_rotation("hourly").unwrap(), Rotation::HOURLY);
        assert_eq!(parse_rotation("never").unwrap(), Rotation::NEVER);
        assert!(parse_rotation("weekly").is_err());
    }

    #[test]
    fn test_file_layer_creates_log_directory() {
        let dir = TempDir::new().unwrap();
        let log_dir = dir.path().join("logs").join("nested");
        let config = LoggingConfig {
            local_enabled: true,
            local_path: log_dir.to_string_lossy().into_owned(),
            local_rotation: "never".to_string(),
            ..LoggingConfig::default()
        };

        let (_layer, _guard) = file_layer(&config).unwrap();
        assert!(log_dir.is_dir());
    }

    #[test]
    fn test_file_layer_rejects_bad_rotation() {
        let dir = TempDir::new().unwrap();
        let config = LoggingConfig {
            local_enabled: true,
            local_path: dir.path().to_string_lossy().into_owned(),
            local_rotation: "weekly".to_string(),
            ..LoggingConfig::default()
        };

        assert!(matches!(
            file_layer(&config),
            Err(ChunkwiseError::Configuration(_))
        ));
    }
}
