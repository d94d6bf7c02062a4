//! Structured logging for load test runs
//!
//! This module provides:
//! - Leveled, structured log entries with arbitrary fields
//! - Console and JSON output formats
//! - A run-wide correlation id attached to every entry
//! - Specialized loggers for requests, scenario progress and errors

use crate::error::{AppError, Result};
use crate::models::{Config, RequestSample, RunReport, ScenarioOutcome};
use crate::scenario::{format_duration, ScenarioSpec};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::{self, Write};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Log level enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
    /// Errors that end the run
    Fatal = 5,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Fatal => "FATAL",
        }
    }

    /// ANSI color code for console output
    pub fn color_code(&self) -> &'static str {
        match self {
            LogLevel::Trace => "\x1b[37m",
            LogLevel::Debug => "\x1b[36m",
            LogLevel::Info => "\x1b[32m",
            LogLevel::Warn => "\x1b[33m",
            LogLevel::Error => "\x1b[31m",
            LogLevel::Fatal => "\x1b[35m",
        }
    }

    pub fn reset_code() -> &'static str {
        "\x1b[0m"
    }
}

impl std::str::FromStr for LogLevel {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "TRACE" => Ok(LogLevel::Trace),
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARN" | "WARNING" => Ok(LogLevel::Warn),
            "ERROR" => Ok(LogLevel::Error),
            "FATAL" => Ok(LogLevel::Fatal),
            _ => Err(AppError::parse(format!("Invalid log level: {}", s))),
        }
    }
}

/// One structured log record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    /// Component that emitted the entry
    pub logger: String,
    pub correlation_id: Option<String>,
    pub fields: HashMap<String, serde_json::Value>,
    pub location: Option<LogLocation>,
}

/// Source code location information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogLocation {
    pub file: String,
    pub line: u32,
    pub module: Option<String>,
}

/// Log output format options
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LogFormat {
    /// Human-readable console format
    Console,
    /// One JSON object per line
    Json,
}

/// Context shared by clones of a logger
#[derive(Debug, Default)]
struct LogContext {
    run_id: Option<String>,
}

/// Logger with level filtering and multiple output formats
pub struct Logger {
    min_level: LogLevel,
    use_color: bool,
    include_location: bool,
    format: LogFormat,
    name: String,
    context: Arc<RwLock<LogContext>>,
}

impl Logger {
    pub fn new(name: String) -> Self {
        Self {
            min_level: LogLevel::Info,
            use_color: true,
            include_location: false,
            format: LogFormat::Console,
            name,
            context: Arc::new(RwLock::new(LogContext::default())),
        }
    }

    /// Create a logger whose level follows `--debug` / `--verbose`
    pub fn with_config(name: String, config: &Config) -> Self {
        let min_level = if config.debug {
            LogLevel::Debug
        } else if config.verbose {
            LogLevel::Info
        } else {
            LogLevel::Warn
        };

        Self {
            min_level,
            use_color: config.enable_color,
            include_location: config.debug,
            format: if config.debug { LogFormat::Json } else { LogFormat::Console },
            name,
            context: Arc::new(RwLock::new(LogContext::default())),
        }
    }

    pub fn set_format(&mut self, format: LogFormat) {
        self.format = format;
    }

    pub fn set_color(&mut self, use_color: bool) {
        self.use_color = use_color;
    }

    /// Attach the run id to every subsequent entry
    pub async fn set_run_id(&self, run_id: String) {
        self.context.write().await.run_id = Some(run_id);
    }

    pub fn log(&self, level: LogLevel, message: &str) -> LogEntryBuilder<'_> {
        LogEntryBuilder::new(self, level, message.to_string())
    }

    pub fn trace(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Trace, message)
    }

    pub fn debug(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Debug, message)
    }

    pub fn info(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Info, message)
    }

    pub fn warn(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Warn, message)
    }

    pub fn error(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Error, message)
    }

    pub fn fatal(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Fatal, message)
    }

    pub fn would_log(&self, level: LogLevel) -> bool {
        level >= self.min_level
    }

    /// Attach the run-wide context fields to `entry`
    async fn with_context(&self, mut entry: LogEntry) -> LogEntry {
        if let Some(run_id) = &self.context.read().await.run_id {
            entry.fields.insert("run_id".to_string(), serde_json::Value::String(run_id.clone()));
        }
        entry
    }

    async fn write_entry(&self, entry: LogEntry) {
        if !self.would_log(entry.level) {
            return;
        }

        let entry = self.with_context(entry).await;
        let output = self.render(&entry);

        // Warnings and errors go to stderr so they never mix with the summary
        if entry.level >= LogLevel::Warn {
            let _ = writeln!(io::stderr(), "{}", output);
        } else {
            let _ = writeln!(io::stdout(), "{}", output);
        }
    }

    fn render(&self, entry: &LogEntry) -> String {
        match self.format {
            LogFormat::Console => self.format_console(entry),
            LogFormat::Json => self.format_json(entry),
        }
    }

    fn format_console(&self, entry: &LogEntry) -> String {
        let timestamp = entry.timestamp.format("%Y-%m-%d %H:%M:%S%.3f");
        let level = if self.use_color {
            format!("{}{:>5}{}", entry.level.color_code(), entry.level.as_str(), LogLevel::reset_code())
        } else {
            format!("{:>5}", entry.level.as_str())
        };

        let mut output = format!("{} {} [{}] {}", timestamp, level, entry.logger, entry.message);

        if let Some(correlation_id) = &entry.correlation_id {
            output.push_str(&format!(" [{}]", correlation_id.get(..8).unwrap_or(correlation_id)));
        }

        if !entry.fields.is_empty() {
            let mut fields: Vec<String> = entry.fields.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
            fields.sort();
            output.push_str(&format!(" {{{}}}", fields.join(", ")));
        }

        if self.include_location {
            if let Some(location) = &entry.location {
                output.push_str(&format!(" @ {}:{}", location.file, location.line));
            }
        }

        output
    }

    fn format_json(&self, entry: &LogEntry) -> String {
        serde_json::to_string(entry).unwrap_or_else(|_| {
            format!("{{\"error\": \"Failed to serialize log entry\", \"message\": {:?}}}", entry.message)
        })
    }
}

/// Builder for a single log entry
pub struct LogEntryBuilder<'a> {
    logger: &'a Logger,
    entry: LogEntry,
}

impl<'a> LogEntryBuilder<'a> {
    fn new(logger: &'a Logger, level: LogLevel, message: String) -> Self {
        Self {
            logger,
            entry: LogEntry {
                timestamp: Utc::now(),
                level,
                message,
                logger: logger.name.clone(),
                correlation_id: None,
                fields: HashMap::new(),
                location: None,
            },
        }
    }

    pub fn correlation_id(mut self, id: &str) -> Self {
        self.entry.correlation_id = Some(id.to_string());
        self
    }

    pub fn field<T: Serialize>(mut self, key: &str, value: T) -> Self {
        if let Ok(json_value) = serde_json::to_value(value) {
            self.entry.fields.insert(key.to_string(), json_value);
        }
        self
    }

    pub fn location(mut self, file: &str, line: u32, module: Option<&str>) -> Self {
        self.entry.location = Some(LogLocation {
            file: file.to_string(),
            line,
            module: module.map(String::from),
        });
        self
    }

    /// Add the tags and timing of a request sample
    pub fn sample(self, sample: &RequestSample) -> Self {
        self.field("scenario", &sample.scenario)
            .field("books", sample.endpoint.tag())
            .field("status", sample.status_code)
            .field("duration_ms", sample.duration_ms())
    }

    pub fn error_info(self, error: &AppError) -> Self {
        self.field("error_category", error.category())
            .field("error_recoverable", error.is_recoverable())
            .field("error_exit_code", error.exit_code())
    }

    pub async fn log(self) {
        self.logger.write_entry(self.entry).await;
    }
}

/// Per-request logging for virtual users
pub struct RequestLogger {
    logger: Logger,
}

impl RequestLogger {
    pub fn new(config: &Config) -> Self {
        Self {
            logger: Logger::with_config("HTTP".to_string(), config),
        }
    }

    /// Log one request; successful ones only show up at debug level
    pub async fn log_http_request(&self, url: &str, sample: &RequestSample) {
        let success = !sample.is_failed();
        let level = if success { LogLevel::Debug } else { LogLevel::Info };
        if !self.logger.would_log(level) {
            return;
        }

        let outcome = match (&sample.error_message, sample.has_response()) {
            (Some(error), false) => format!("FAILED ({})", error),
            _ => sample.status_code.to_string(),
        };
        let message = format!("GET {} -> {} in {:.1}ms", url, outcome, sample.duration_ms());

        self.logger
            .log(level, &message)
            .field("url", url)
            .field("method", "GET")
            .field("success", success)
            .sample(sample)
            .log()
            .await;
    }
}

/// Scenario lifecycle and run summary logging
pub struct RunLogger {
    logger: Logger,
}

impl RunLogger {
    pub fn new(config: &Config) -> Self {
        Self {
            logger: Logger::with_config("RUN".to_string(), config),
        }
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    pub async fn log_scenario_start(&self, spec: &ScenarioSpec) {
        self.logger
            .info(&format!(
                "Scenario '{}' starting: {} VUs x {} iterations (max {})",
                spec.name,
                spec.vus,
                spec.iterations,
                format_duration(spec.max_duration)
            ))
            .field("scenario", &spec.name)
            .field("executor", spec.executor.as_str())
            .field("exec", spec.exec.as_str())
            .field("vus", spec.vus)
            .field("iterations", spec.iterations)
            .log()
            .await;
    }

    pub async fn log_scenario_complete(&self, outcome: &ScenarioOutcome) {
        let level = if outcome.is_complete() { LogLevel::Info } else { LogLevel::Warn };
        self.logger
            .log(
                level,
                &format!(
                    "Scenario '{}' stopped ({:?}): {}/{} iterations complete, {} interrupted in {:.1}s",
                    outcome.name,
                    outcome.stop_reason,
                    outcome.completed_iterations,
                    outcome.planned_iterations,
                    outcome.interrupted_iterations,
                    outcome.duration_ms / 1000.0
                ),
            )
            .field("scenario", &outcome.name)
            .field("completed_iterations", outcome.completed_iterations)
            .field("interrupted_iterations", outcome.interrupted_iterations)
            .field("dropped_iterations", outcome.dropped_iterations())
            .field("stop_reason", outcome.stop_reason)
            .log()
            .await;
    }

    pub async fn log_run_summary(&self, report: &RunReport) {
        let level = if report.thresholds_passed() { LogLevel::Info } else { LogLevel::Warn };
        self.logger
            .log(
                level,
                &format!(
                    "Plan '{}' finished: {} requests, {:.2}% failed, {} of {} thresholds crossed",
                    report.plan,
                    report.totals.http_reqs,
                    report.totals.failed_rate() * 100.0,
                    report.failed_thresholds().len(),
                    report.thresholds.len()
                ),
            )
            .field("plan", &report.plan)
            .field("http_reqs", report.totals.http_reqs)
            .field("failed_reqs", report.totals.failed_reqs)
            .field("iterations", report.totals.iterations)
            .field("duration_ms", report.duration_ms)
            .field("interrupted", report.interrupted)
            .log()
            .await;
    }
}

/// Error event logger with context
pub struct ErrorEventLogger {
    logger: Logger,
}

impl ErrorEventLogger {
    pub fn new(config: &Config) -> Self {
        Self {
            logger: Logger::with_config("ERR".to_string(), config),
        }
    }

    pub async fn log_error(&self, error: &AppError, context: Option<&str>) {
        let message = match context {
            Some(ctx) => format!("{}: {}", ctx, error),
            None => error.to_string(),
        };

        let mut builder = self.logger.error(&message).error_info(error);
        if let Some(ctx) = context {
            builder = builder.field("context", ctx);
        }
        builder.log().await;
    }
}

/// Creates loggers that share one run id
pub struct LoggerFactory {
    config: Config,
    run_id: String,
}

impl LoggerFactory {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            run_id: Uuid::new_v4().to_string(),
        }
    }

    pub async fn create_logger(&self, name: &str) -> Logger {
        let logger = Logger::with_config(name.to_string(), &self.config);
        logger.set_run_id(self.run_id.clone()).await;
        logger
    }

    pub async fn create_request_logger(&self) -> RequestLogger {
        let logger = RequestLogger::new(&self.config);
        logger.logger.set_run_id(self.run_id.clone()).await;
        logger
    }

    pub async fn create_run_logger(&self) -> RunLogger {
        let logger = RunLogger::new(&self.config);
        logger.logger.set_run_id(self.run_id.clone()).await;
        logger
    }

    pub async fn create_error_logger(&self) -> ErrorEventLogger {
        let logger = ErrorEventLogger::new(&self.config);
        logger.logger.set_run_id(self.run_id.clone()).await;
        logger
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }
}

/// Convenience macros for logging with location information
#[macro_export]
macro_rules! log_debug {
    ($logger:expr, $($arg:tt)*) => {
        $logger.debug(&format!($($arg)*))
            .location(file!(), line!(), Some(module_path!()))
            .log()
            .await
    };
}

#[macro_export]
macro_rules! log_info {
    ($logger:expr, $($arg:tt)*) => {
        $logger.info(&format!($($arg)*))
            .location(file!(), line!(), Some(module_path!()))
            .log()
            .await
    };
}

#[macro_export]
macro_rules! log_warn {
    ($logger:expr, $($arg:tt)*) => {
        $logger.warn(&format!($($arg)*))
            .location(file!(), line!(), Some(module_path!()))
            .log()
            .await
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Endpoint;
    use std::str::FromStr;
    use std::time::Duration;

    #[test]
    fn test_log_level_parsing() {
        assert_eq!(LogLevel::from_str("DEBUG").unwrap(), LogLevel::Debug);
        assert_eq!(LogLevel::from_str("info").unwrap(), LogLevel::Info);
        assert_eq!(LogLevel::from_str("warning").unwrap(), LogLevel::Warn);
        assert!(LogLevel::from_str("loud").is_err());
    }

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::Trace < LogLevel::Debug);
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Warn < LogLevel::Error);
        assert!(LogLevel::Error < LogLevel::Fatal);
    }

    #[test]
    fn test_level_follows_config() {
        let logger = Logger::with_config("TEST".to_string(), &Config::default());
        assert_eq!(logger.min_level, LogLevel::Warn);
        assert_eq!(logger.format, LogFormat::Console);

        let config = Config {
            verbose: true,
            ..Default::default()
        };
        let logger = Logger::with_config("TEST".to_string(), &config);
        assert_eq!(logger.min_level, LogLevel::Info);

        let config = Config {
            debug: true,
            enable_color: false,
            ..Default::default()
        };
        let logger = Logger::with_config("TEST".to_string(), &config);
        assert_eq!(logger.min_level, LogLevel::Debug);
        assert_eq!(logger.format, LogFormat::Json);
        assert!(!logger.use_color);
        assert!(logger.include_location);
    }

    #[test]
    fn test_console_format_contains_fields() {
        let mut logger = Logger::new("HTTP".to_string());
        logger.set_color(false);
        let sample = RequestSample::completed("warmup", Endpoint::ListBooks, 200, Duration::from_millis(12));
        let builder = logger.info("GET /books").sample(&sample).correlation_id("0123456789abcdef");

        let output = logger.format_console(&builder.entry);
        assert!(output.contains(" INFO [HTTP] GET /books [01234567]"));
        assert!(output.contains("books=\"list-books\""));
        assert!(output.contains("status=200"));
    }

    #[test]
    fn test_json_format_round_trips() {
        let mut logger = Logger::new("RUN".to_string());
        logger.set_format(LogFormat::Json);
        let builder = logger.warn("threshold crossed").field("selector", "http_req_duration{books:new-books}");

        let json = logger.render(&builder.entry);
        let parsed: LogEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.level, LogLevel::Warn);
        assert_eq!(parsed.fields["selector"], "http_req_duration{books:new-books}");
    }

    #[tokio::test]
    async fn test_factory_shares_run_id() {
        let factory = LoggerFactory::new(Config::default());
        let logger = factory.create_logger("TEST").await;
        assert_eq!(logger.context.read().await.run_id.as_deref(), Some(factory.run_id()));

        let run_logger = factory.create_run_logger().await;
        assert_eq!(run_logger.logger().context.read().await.run_id.as_deref(), Some(factory.run_id()));

        let request_logger = factory.create_request_logger().await;
        assert_eq!(request_logger.logger.context.read().await.run_id.as_deref(), Some(factory.run_id()));

        let error_logger = factory.create_error_logger().await;
        assert_eq!(error_logger.logger.context.read().await.run_id.as_deref(), Some(factory.run_id()));
    }

    #[tokio::test]
    async fn test_error_event_carries_run_id() {
        let factory = LoggerFactory::new(Config::default());
        let error_logger = factory.create_error_logger().await;

        let error = AppError::io("disk full");
        let builder = error_logger.logger.error("export failed").error_info(&error);
        let entry = error_logger.logger.with_context(builder.entry).await;

        assert_eq!(entry.fields["run_id"], factory.run_id());
        assert_eq!(entry.fields["error_exit_code"], 5);
    }
}
