//! Structured logging for the salesql server
//!
//! Features:
//! - Structured JSON logging for production
//! - Human-readable console logging for development
//! - File rotation with daily log files
//! - Request ID tracking (see the `ask` span in `query`)
//! - Configurable log levels per module

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::LoggingConfig;

/// Third-party crates kept quiet regardless of the configured level
const QUIET_CRATES: &[&str] = &["hyper=warn", "tokio=warn", "tower=warn", "h2=warn", "reqwest=warn"];

const LOG_FILE: &str = "salesql-server.log";

/// Log format configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable format for development
    Pretty,
    /// JSON format for production (structured logging)
    Json,
    /// Compact format for testing
    Compact,
}

impl LogFormat {
    /// Unknown values fall back to pretty
    pub fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "json" => LogFormat::Json,
            "compact" => LogFormat::Compact,
            _ => LogFormat::Pretty,
        }
    }
}

/// Log output configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOutput {
    /// Log to stdout only
    Stdout,
    /// Log to file only
    File,
    /// Log to both stdout and file
    Both,
}

impl LogOutput {
    /// Unknown values fall back to stdout
    pub fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "file" => LogOutput::File,
            "both" => LogOutput::Both,
            _ => LogOutput::Stdout,
        }
    }
}

fn build_filter(level: &str) -> EnvFilter {
    let mut filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
    for directive in QUIET_CRATES {
        if let Ok(directive) = directive.parse() {
            filter = filter.add_directive(directive);
        }
    }
    filter
}

/// Daily rolling file layer, ANSI colors off
fn file_layer<S>(directory: &str) -> Box<dyn Layer<S> + Send + Sync>
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    std::fs::create_dir_all(directory).ok();
    let file_appender = RollingFileAppender::new(Rotation::DAILY, directory, LOG_FILE);
    fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .boxed()
}

/// Initialize the global subscriber from the logging section of the config.
///
/// Examples:
/// ```bash
/// # Development: pretty console output at debug level
/// RUST_LOG=debug LOG_FORMAT=pretty cargo run -p salesql-server
///
/// # Production: JSON to file with info level
/// RUST_LOG=info LOG_FORMAT=json LOG_OUTPUT=file LOG_DIR=/var/log/salesql cargo run -p salesql-server
/// ```
pub fn init(config: &LoggingConfig) {
    let format = LogFormat::parse(&config.format);
    let output = LogOutput::parse(&config.output);
    let env_filter = build_filter(&config.level);

    let stdout_layer = match format {
        LogFormat::Pretty => fmt::layer()
            .pretty()
            .with_thread_ids(true)
            .with_target(true)
            .boxed(),
        LogFormat::Json => fmt::layer().json().with_current_span(true).boxed(),
        LogFormat::Compact => fmt::layer().compact().boxed(),
    };

    let registry = tracing_subscriber::registry().with(env_filter);
    match output {
        LogOutput::Stdout => registry.with(stdout_layer).init(),
        LogOutput::File => registry.with(file_layer(&config.directory)).init(),
        LogOutput::Both => registry
            .with(stdout_layer)
            .with(file_layer(&config.directory))
            .init(),
    }

    tracing::info!(
        format = ?format,
        output = ?output,
        level = %config.level,
        "Logging system initialized"
    );
    if output != LogOutput::Stdout {
        tracing::debug!(directory = %config.directory, "Writing log files");
    }
}

/// Helper macro for logging with structured fields
///
/// Usage:
/// ```rust,ignore
/// log_event!(
///     level: tracing::Level::INFO,
///     event: "question_answered",
///     rows: 20
/// );
/// ```
#[macro_export]
macro_rules! log_event {
    (level: $level:expr, event: $event:expr $(, $key:ident: $value:expr)* $(,)?) => {
        tracing::event!(
            $level,
            event = $event
            $(, $key = ?$value)*
        );
    };
}
