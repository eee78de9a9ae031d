//! Structured logging for the stockql server
//!
//! Features:
//! - Structured JSON logging for production
//! - Human-readable console logging for development
//! - File rotation with daily log files
//! - Request ID tracking (see `api::query_handler`)

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::Directive;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::LoggingConfig;

const LOG_FILE_NAME: &str = "stockql-server.log";

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
    pub fn parse(raw: &str) -> Self {
        match raw {
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
    pub fn parse(raw: &str) -> Self {
        match raw {
            "file" => LogOutput::File,
            "both" => LogOutput::Both,
            _ => LogOutput::Stdout,
        }
    }
}

fn env_filter(level: &str) -> EnvFilter {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));

    // Filter out noisy third-party crates
    ["hyper=warn", "tokio=warn", "runtime=warn", "tower=warn", "h2=warn", "reqwest=warn"]
        .iter()
        .filter_map(|d| d.parse::<Directive>().ok())
        .fold(filter, |f, directive| f.add_directive(directive))
}

/// Initialize the logging system
///
/// Examples:
/// ```bash
/// # Development: pretty console output at debug level
/// RUST_LOG=debug LOG_FORMAT=pretty cargo run
///
/// # Production: JSON to file with info level
/// RUST_LOG=info LOG_FORMAT=json LOG_OUTPUT=file LOG_DIR=/var/log/stockql cargo run
/// ```
pub fn init(config: &LoggingConfig) {
    let format = LogFormat::parse(&config.format);
    let output = LogOutput::parse(&config.output);
    let env_filter = env_filter(&config.level);

    match (output, format) {
        // Stdout only
        (LogOutput::Stdout, LogFormat::Pretty) => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty().with_thread_ids(true).with_target(true))
                .init();
        }
        (LogOutput::Stdout, LogFormat::Json) => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_current_span(true))
                .init();
        }
        (LogOutput::Stdout, LogFormat::Compact) => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().compact())
                .init();
        }
        // File only
        (LogOutput::File, _) => {
            std::fs::create_dir_all(&config.directory).ok();
            let file_appender =
                RollingFileAppender::new(Rotation::DAILY, &config.directory, LOG_FILE_NAME);

            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().with_writer(file_appender).with_ansi(false))
                .init();
        }
        // Both stdout and file - use boxed layers for dynamic dispatch
        (LogOutput::Both, format) => {
            std::fs::create_dir_all(&config.directory).ok();
            let file_appender =
                RollingFileAppender::new(Rotation::DAILY, &config.directory, LOG_FILE_NAME);

            let stdout_layer = match format {
                LogFormat::Pretty => fmt::layer()
                    .pretty()
                    .with_thread_ids(true)
                    .with_target(true)
                    .boxed(),
                LogFormat::Json => fmt::layer().json().with_current_span(true).boxed(),
                LogFormat::Compact => fmt::layer().compact().boxed(),
            };

            let file_layer = fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .boxed();

            tracing_subscriber::registry()
                .with(env_filter)
                .with(stdout_layer)
                .with(file_layer)
                .init();
        }
    }

    tracing::info!(format = ?format, output = ?output, level = %config.level, "logging initialized");
    if matches!(output, LogOutput::File | LogOutput::Both) {
        tracing::debug!(directory = %config.directory, "writing logs to file");
    }
}

/// Helper macro for logging with structured fields
///
/// Usage:
/// ```ignore
/// log_event!(
///     level: tracing::Level::INFO,
///     event: "query_executed",
///     rows: 100,
///     duration_secs: 0.004
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
