//! Structured logging infrastructure for modgate

use crate::error::{ModgateError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan, writer::BoxMakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Output format of the fmt layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Multi-line, colored output for development.
    #[default]
    Pretty,
    /// Single-line output.
    Compact,
    /// Newline-delimited JSON for log shippers.
    Json,
}

/// Configuration for the logging system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "modgate_commands=debug"); `RUST_LOG` wins when set
    pub level: String,
    /// Output format
    pub format: LogFormat,
    /// Directory for daily-rolled log files; stdout when absent
    pub directory: Option<PathBuf>,
    /// File name prefix for rolled log files
    pub file_prefix: String,
    /// Whether to include span open/close events
    pub include_spans: bool,
    /// Whether to include target module information
    pub include_targets: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            directory: None,
            file_prefix: "modgate.log".to_string(),
            include_spans: false,
            include_targets: true,
        }
    }
}

/// Keeps the background log writer alive; drop it only at shutdown.
#[derive(Debug)]
pub struct LoggingGuard {
    _worker: Option<WorkerGuard>,
}

/// Initialize the tracing subscriber with the given configuration
pub fn init_logging(config: &LoggingConfig) -> Result<LoggingGuard> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| ModgateError::config_with_source("Invalid log level filter", e))?;

    let span_events = if config.include_spans {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let (writer, worker) = match &config.directory {
        Some(directory) => {
            std::fs::create_dir_all(directory)?;
            let appender = tracing_appender::rolling::daily(directory, &config.file_prefix);
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            (BoxMakeWriter::new(non_blocking), Some(guard))
        }
        None => (BoxMakeWriter::new(std::io::stdout), None),
    };
    let ansi = config.directory.is_none();

    let registry = tracing_subscriber::registry().with(env_filter);
    let installed = match config.format {
        LogFormat::Pretty => registry
            .with(
                fmt::layer()
                    .pretty()
                    .with_ansi(ansi)
                    .with_span_events(span_events)
                    .with_target(config.include_targets)
                    .with_writer(writer),
            )
            .try_init(),
        LogFormat::Compact => registry
            .with(
                fmt::layer()
                    .compact()
                    .with_ansi(ansi)
                    .with_span_events(span_events)
                    .with_target(config.include_targets)
                    .with_thread_ids(true)
                    .with_writer(writer),
            )
            .try_init(),
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_events(span_events)
                    .with_target(config.include_targets)
                    .with_writer(writer),
            )
            .try_init(),
    };
    installed.map_err(|e| ModgateError::config_with_source("Failed to install tracing subscriber", e))?;

    Ok(LoggingGuard { _worker: worker })
}
