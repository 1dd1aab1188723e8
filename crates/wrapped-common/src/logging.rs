//! Structured logging infrastructure for YouTube Wrapped

use crate::error::{Result, WrappedError};
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

/// Output format of the console or file layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Multi-line, human oriented output with colors
    Pretty,
    /// Single-line output
    #[default]
    Compact,
    /// Newline-delimited JSON
    Json,
}

/// Configuration for the logging system
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "wrapped_stats=trace")
    pub level: String,
    /// Output format
    pub format: LogFormat,
    /// Directory for daily-rotated log files; stderr when unset
    pub file_dir: Option<PathBuf>,
    /// File name prefix for rotated log files
    pub file_prefix: String,
    /// Whether to emit span open/close events
    pub include_spans: bool,
    /// Whether to include target module information
    pub include_targets: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
            file_dir: None,
            file_prefix: "yt-wrapped.log".to_string(),
            include_spans: false,
            include_targets: true,
        }
    }
}

impl LoggingConfig {
    /// Returns a copy with the level replaced when `verbosity` asks for more output.
    ///
    /// `1` maps to `debug`, `2` and above to `trace`.
    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        match verbosity {
            0 => {}
            1 => self.level = "debug".to_string(),
            _ => self.level = "trace".to_string(),
        }
        self
    }
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Initialize the tracing subscriber with the given configuration.
///
/// Console output goes to stderr so that stdout stays free for command
/// output. When a file directory is configured the returned guard must be
/// held for as long as logs should be flushed.
pub fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_new(&config.level)
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| WrappedError::config_with_source("Invalid log level filter", e))?;

    let span_events = if config.include_spans {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let (layer, guard): (BoxedLayer, Option<WorkerGuard>) = match &config.file_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, &config.file_prefix);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let base = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_span_events(span_events)
                .with_target(config.include_targets);
            let layer: BoxedLayer = match config.format {
                LogFormat::Json => Box::new(base.json()),
                LogFormat::Pretty => Box::new(base.pretty()),
                LogFormat::Compact => Box::new(base.compact()),
            };
            (layer, Some(guard))
        }
        None => {
            let base = fmt::layer()
                .with_writer(std::io::stderr)
                .with_span_events(span_events)
                .with_target(config.include_targets);
            let layer: BoxedLayer = match config.format {
                LogFormat::Json => Box::new(base.json()),
                LogFormat::Pretty => Box::new(base.pretty()),
                LogFormat::Compact => Box::new(base.compact()),
            };
            (layer, None)
        }
    };

    tracing_subscriber::registry()
        .with(layer)
        .with(env_filter)
        .try_init()
        .map_err(|e| WrappedError::config_with_source("Failed to install tracing subscriber", e))?;

    Ok(guard)
}
