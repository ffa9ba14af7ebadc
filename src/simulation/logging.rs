//! Logging and tracing configuration
//!
//! Diagnostic logging for the simulator. This is separate from the domain
//! [`EventLog`](crate::events::EventLog), although every event-log append is
//! mirrored here at `debug` level.

use std::io;
use tracing::{info, Level};
use tracing_appender::{non_blocking, non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Registry,
};

/// Error returned when the global subscriber cannot be installed
pub type LoggingInitError = Box<dyn std::error::Error + Send + Sync>;

/// Console output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One line per event, human readable
    #[default]
    Compact,
    /// One JSON object per event
    Json,
}

/// Daily rolling log file; always written as JSON
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFile {
    /// Directory holding the rolled files
    pub directory: String,
    /// File name prefix, the date is appended by the roller
    pub prefix: String,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Most verbose level emitted by this crate
    pub level: Level,
    /// Console format
    pub format: LogFormat,
    /// Optional rolling file next to the console output
    pub file: Option<LogFile>,
    /// Emit span open/close events (engine runs are instrumented)
    pub span_events: bool,
    /// ANSI colors on the console
    pub ansi: bool,
    /// Filter directive overriding both `level` and `RUST_LOG`
    pub directive: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: LogFormat::Compact,
            file: None,
            span_events: false,
            ansi: true,
            directive: None,
        }
    }
}

impl LoggingConfig {
    /// Create a new logging configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// INFO level: day closings and run milestones
    pub fn verbose() -> Self {
        Self::new().with_level(Level::INFO)
    }

    /// DEBUG level with span events: every job and every event-log line
    pub fn debug() -> Self {
        Self::new().with_level(Level::DEBUG).with_span_events()
    }

    /// Set the log level
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Switch the console to JSON
    pub fn json(mut self) -> Self {
        self.format = LogFormat::Json;
        self
    }

    /// Also write a daily rolling file under `directory`
    pub fn with_log_file(mut self, directory: impl Into<String>) -> Self {
        let prefix = self
            .file
            .take()
            .map_or_else(|| env!("CARGO_PKG_NAME").to_string(), |file| file.prefix);
        self.file = Some(LogFile { directory: directory.into(), prefix });
        self
    }

    /// Enable span events
    pub fn with_span_events(mut self) -> Self {
        self.span_events = true;
        self
    }

    /// Disable ANSI colors
    pub fn without_ansi(mut self) -> Self {
        self.ansi = false;
        self
    }

    /// Use a raw filter directive such as `print_farm_simulator::simulation=trace`
    pub fn with_directive(mut self, directive: impl Into<String>) -> Self {
        self.directive = Some(directive.into());
        self
    }

    fn fmt_span(&self) -> FmtSpan {
        if self.span_events {
            FmtSpan::NEW | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        }
    }

    fn filter(&self) -> Result<EnvFilter, LoggingInitError> {
        match &self.directive {
            Some(directive) => Ok(EnvFilter::try_new(directive)?),
            None => Ok(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                let target = env!("CARGO_PKG_NAME").replace('-', "_");
                EnvFilter::new(format!("{}={}", target, self.level))
            })),
        }
    }

    /// Install the global tracing subscriber.
    ///
    /// With a log file configured the returned guard flushes the file writer
    /// on drop; hold it until the program exits.
    pub fn init(self) -> Result<Option<WorkerGuard>, LoggingInitError> {
        let registry = Registry::default().with(self.filter()?);
        let span = self.fmt_span();

        let (file_layer, guard) = match &self.file {
            Some(file) => {
                let (writer, guard) = non_blocking(rolling::daily(&file.directory, &file.prefix));
                let layer = fmt::layer().json().with_writer(writer).with_span_events(span.clone());
                (Some(layer), Some(guard))
            }
            None => (None, None),
        };
        let registry = registry.with(file_layer);

        match self.format {
            LogFormat::Json => {
                let console = fmt::layer().json().with_writer(io::stderr).with_span_events(span);
                registry.with(console).try_init()?;
            }
            LogFormat::Compact => {
                let console = fmt::layer()
                    .compact()
                    .with_writer(io::stderr)
                    .with_ansi(self.ansi)
                    .with_span_events(span);
                registry.with(console).try_init()?;
            }
        }

        info!(level = %self.level, format = ?self.format, file = self.file.is_some(), "Logging initialized");
        Ok(guard)
    }
}

/// Structured engine event tagged with `component = "engine"`
#[macro_export]
macro_rules! sim_event {
    ($level:ident, $message:expr $(, $key:ident = $value:expr)* $(,)?) => {
        tracing::$level!(component = "engine", $($key = $value,)* "{}", $message)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LoggingConfig::new();
        assert_eq!(config.level, Level::INFO);
        assert_eq!(config.format, LogFormat::Compact);
        assert!(config.file.is_none());
        assert!(!config.span_events);
        assert!(config.ansi);
        assert!(config.directive.is_none());
    }

    #[test]
    fn test_presets() {
        assert_eq!(LoggingConfig::verbose().level, Level::INFO);

        let debug = LoggingConfig::debug();
        assert_eq!(debug.level, Level::DEBUG);
        assert_eq!(debug.fmt_span(), FmtSpan::NEW | FmtSpan::CLOSE);
    }

    #[test]
    fn test_file_output_keeps_package_prefix() {
        let config = LoggingConfig::new().json().with_log_file("run_logs").without_ansi();

        assert_eq!(config.format, LogFormat::Json);
        assert!(!config.ansi);
        assert_eq!(
            config.file,
            Some(LogFile { directory: "run_logs".to_string(), prefix: "print-farm-simulator".to_string() })
        );
    }

    #[test]
    fn test_directive_takes_precedence() {
        let config = LoggingConfig::new().with_directive("print_farm_simulator=trace");
        assert!(config.filter().is_ok());
        assert_eq!(config.directive.as_deref(), Some("print_farm_simulator=trace"));
    }
}
