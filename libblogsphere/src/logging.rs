//! Centralized logging configuration
//!
//! Provides consistent logging setup with support for:
//! - Text, JSON, and pretty-printed output
//! - Environment variable configuration
//! - A caller-supplied writer, so hosts without stderr (the browser) can
//!   route lines elsewhere
//!
//! # Examples
//!
//! ```no_run
//! use libblogsphere::logging::{LoggingConfig, LogFormat};
//!
//! let config = LoggingConfig::new(LogFormat::Json, "info".to_string(), false);
//! config.init();
//!
//! // Or use default settings (respects env vars)
//! libblogsphere::logging::init_default();
//! ```

use std::str::FromStr;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::{FormatTime, SystemTime};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable text output (no colors, for piping)
    Text,
    /// Machine-parseable JSON (one JSON object per line)
    Json,
    /// Pretty-printed with colors (for development)
    Pretty,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            _ => Err(format!(
                "Invalid log format: '{}'. Valid options: text, json, pretty",
                s
            )),
        }
    }
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Text => write!(f, "text"),
            LogFormat::Json => write!(f, "json"),
            LogFormat::Pretty => write!(f, "pretty"),
        }
    }
}

/// Configuration for logging initialization
pub struct LoggingConfig {
    pub format: LogFormat,
    pub level: String,
    pub verbose: bool,
    /// Prefix lines with the wall-clock time
    pub timestamps: bool,
}

/// Wall-clock timestamps that can be switched off
///
/// Targets without a system clock (wasm32 in the browser) panic on
/// `SystemTime::now`, so hosts there log without timestamps.
struct Timestamps(bool);

impl FormatTime for Timestamps {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        if self.0 {
            SystemTime.format_time(w)
        } else {
            Ok(())
        }
    }
}

impl LoggingConfig {
    /// Create a new logging configuration
    ///
    /// # Arguments
    ///
    /// * `format` - Log output format (text, json, or pretty)
    /// * `level` - Minimum log level (error, warn, info, debug, trace)
    /// * `verbose` - If true, defaults to debug level
    pub fn new(format: LogFormat, level: String, verbose: bool) -> Self {
        Self {
            format,
            level,
            verbose,
            timestamps: true,
        }
    }

    /// Drop the time prefix from every line
    pub fn without_timestamps(mut self) -> Self {
        self.timestamps = false;
        self
    }

    fn filter(&self) -> EnvFilter {
        let fallback = if self.verbose { "debug" } else { self.level.as_str() };
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
    }

    /// Initialize logging to stderr
    ///
    /// Returns `false` when a global subscriber was already installed.
    pub fn init(&self) -> bool {
        self.init_with_writer(std::io::stderr)
    }

    /// Initialize logging with a custom writer
    ///
    /// Returns `false` when a global subscriber was already installed.
    pub fn init_with_writer<W>(&self, writer: W) -> bool
    where
        W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
    {
        let filter = self.filter();

        let installed = match self.format {
            LogFormat::Json => tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .with_timer(Timestamps(self.timestamps))
                .with_writer(writer)
                .with_current_span(true)
                .with_span_list(true)
                .flatten_event(true)
                .with_target(true)
                .try_init(),
            LogFormat::Pretty => tracing_subscriber::fmt()
                .pretty()
                .with_env_filter(filter)
                .with_timer(Timestamps(self.timestamps))
                .with_writer(writer)
                .with_target(true)
                .with_line_number(true)
                .with_file(true)
                .try_init(),
            LogFormat::Text => tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_timer(Timestamps(self.timestamps))
                .with_writer(writer)
                .with_ansi(false)
                .with_target(false)
                .with_level(true)
                .try_init(),
        };

        installed.is_ok()
    }
}

/// Read format and level from `BLOGSPHERE_LOG_FORMAT` / `BLOGSPHERE_LOG_LEVEL`
pub fn config_from_env() -> LoggingConfig {
    let format = std::env::var("BLOGSPHERE_LOG_FORMAT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(LogFormat::Text);

    let level = std::env::var("BLOGSPHERE_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

    LoggingConfig::new(format, level, false)
}

/// Initialize logging with default settings
///
/// Falls back to text format with info level if the env vars are not set.
pub fn init_default() -> bool {
    config_from_env().init()
}
