//! Error handling for the books load tester

use thiserror::Error;

/// Custom error types for the books load tester
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Validation errors (scenario values, thresholds, URLs)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Parsing errors (durations, threshold expressions, JSON)
    #[error("Parsing error: {0}")]
    Parse(String),

    /// Network setup errors
    #[error("Network error: {0}")]
    Network(String),

    /// HTTP request errors
    #[error("HTTP request error: {0}")]
    HttpRequest(String),

    /// Timeout errors
    #[error("Timeout error: {0}")]
    Timeout(String),

    /// I/O errors (summary export, .env files)
    #[error("I/O error: {0}")]
    Io(String),

    /// Scenario execution errors
    #[error("Execution error: {0}")]
    Execution(String),

    /// One or more thresholds were crossed at the end of the run
    #[error("Thresholds crossed: {0}")]
    ThresholdsCrossed(String),

    /// The run was stopped by the user before completion
    #[error("Run interrupted: {0}")]
    Interrupted(String),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation(message.into())
    }

    /// Create a new parsing error
    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::Parse(message.into())
    }

    /// Create a new network error
    pub fn network<S: Into<String>>(message: S) -> Self {
        Self::Network(message.into())
    }

    /// Create a new HTTP request error
    pub fn http_request<S: Into<String>>(message: S) -> Self {
        Self::HttpRequest(message.into())
    }

    /// Create a new timeout error
    pub fn timeout<S: Into<String>>(message: S) -> Self {
        Self::Timeout(message.into())
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        Self::Io(message.into())
    }

    /// Create a new execution error
    pub fn execution<S: Into<String>>(message: S) -> Self {
        Self::Execution(message.into())
    }

    /// Create a new thresholds-crossed error
    pub fn thresholds_crossed<S: Into<String>>(message: S) -> Self {
        Self::ThresholdsCrossed(message.into())
    }

    /// Create a new interrupted error
    pub fn interrupted<S: Into<String>>(message: S) -> Self {
        Self::Interrupted(message.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }

    /// Get error category for logging and reporting
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG",
            Self::Validation(_) => "VALIDATION",
            Self::Parse(_) => "PARSE",
            Self::Network(_) => "NETWORK",
            Self::HttpRequest(_) => "HTTP",
            Self::Timeout(_) => "TIMEOUT",
            Self::Io(_) => "IO",
            Self::Execution(_) => "EXECUTION",
            Self::ThresholdsCrossed(_) => "THRESHOLDS",
            Self::Interrupted(_) => "INTERRUPTED",
            Self::Internal(_) => "INTERNAL",
        }
    }

    /// Check if error is transient (re-running might succeed)
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::HttpRequest(_) | Self::Timeout(_))
    }

    /// Get user-friendly error message with suggestions
    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::Config(msg) => {
                format!("Configuration problem: {}\n\nSuggestion: Check your .env file, BASE_URL and command line arguments.", msg)
            }
            Self::Validation(msg) => {
                format!("Invalid input: {}\n\nSuggestion: Check the scenario values (vus, iterations, max duration) and the base URL format.", msg)
            }
            Self::Parse(msg) => {
                format!("Failed to parse value: {}\n\nSuggestion: Durations look like 30s, 5m or 1m30s; thresholds look like p(99) < 1000.", msg)
            }
            Self::Network(msg) => {
                format!("Network setup failed: {}\n\nSuggestion: Check that the books service is reachable at the configured base URL.", msg)
            }
            Self::HttpRequest(msg) => {
                format!("HTTP request failed: {}\n\nSuggestion: The books service may be down or rejecting requests.", msg)
            }
            Self::Timeout(msg) => {
                format!("Request timed out: {}\n\nSuggestion: Increase --timeout or reduce the number of virtual users.", msg)
            }
            Self::Io(msg) => {
                format!("File operation failed: {}\n\nSuggestion: Check the --summary-export path and its permissions.", msg)
            }
            Self::Execution(msg) => {
                format!("Scenario execution failed: {}\n\nSuggestion: Re-run with --debug for detailed logs.", msg)
            }
            Self::ThresholdsCrossed(msg) => {
                format!("Some thresholds have failed: {}\n\nThe service did not meet its latency targets under this load.", msg)
            }
            Self::Interrupted(msg) => {
                format!("Run interrupted: {}\n\nPartial results were reported above.", msg)
            }
            Self::Internal(msg) => {
                format!("Internal error: {}\n\nThis is likely a bug. Please report this issue with the error details.", msg)
            }
        }
    }

    /// Get exit code for this error type
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Validation(_) | Self::Parse(_) => 1,
            Self::Network(_) | Self::HttpRequest(_) => 2,
            Self::Timeout(_) => 3,
            Self::Io(_) => 5,
            Self::Execution(_) => 6,
            Self::ThresholdsCrossed(_) => 99,
            Self::Interrupted(_) => 105,
            Self::Internal(_) => 100,
        }
    }

    /// Format error for console display with color coding
    pub fn format_for_console(&self, use_color: bool) -> String {
        let category = self.category();
        let message = self.to_string();

        if use_color {
            use colored::Colorize;
            match self {
                Self::Config(_) | Self::Validation(_) | Self::Parse(_) => {
                    format!("[{}] {}", category.red().bold(), message.red())
                }
                Self::Network(_) | Self::HttpRequest(_) => {
                    format!("[{}] {}", category.yellow().bold(), message.yellow())
                }
                Self::Timeout(_) | Self::Interrupted(_) => {
                    format!("[{}] {}", category.blue().bold(), message.blue())
                }
                Self::Io(_) | Self::Execution(_) => {
                    format!("[{}] {}", category.cyan().bold(), message.cyan())
                }
                Self::ThresholdsCrossed(_) => {
                    format!("[{}] {}", category.magenta().bold(), message.magenta())
                }
                Self::Internal(_) => {
                    format!("[{}] {}", category.bright_red().bold(), message.bright_red())
                }
            }
        } else {
            format!("[{}] {}", category, message)
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::io(error.to_string())
    }
}

impl From<url::ParseError> for AppError {
    fn from(error: url::ParseError) -> Self {
        Self::parse(format!("URL parse error: {}", error))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::parse(format!("JSON parse error: {}", error))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::timeout(error.to_string())
        } else if error.is_connect() || error.is_builder() {
            Self::network(error.to_string())
        } else {
            Self::http_request(error.to_string())
        }
    }
}

impl From<dotenv::Error> for AppError {
    fn from(error: dotenv::Error) -> Self {
        Self::config(format!("Environment file error: {}", error))
    }
}

impl From<std::num::ParseIntError> for AppError {
    fn from(error: std::num::ParseIntError) -> Self {
        Self::parse(format!("Integer parse error: {}", error))
    }
}

impl From<std::num::ParseFloatError> for AppError {
    fn from(error: std::num::ParseFloatError) -> Self {
        Self::parse(format!("Float parse error: {}", error))
    }
}

impl From<std::str::ParseBoolError> for AppError {
    fn from(error: std::str::ParseBoolError) -> Self {
        Self::parse(format!("Boolean parse error: {}", error))
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(error: tokio::task::JoinError) -> Self {
        Self::execution(format!("Virtual user task failed: {}", error))
    }
}

// Anyhow integration
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::internal(error.to_string())
    }
}

/// Custom Result type for the application
pub type Result<T> = std::result::Result<T, AppError>;

/// Error reporter for user feedback on the terminal
pub struct ErrorReporter {
    pub use_color: bool,
    pub verbose: bool,
}

impl ErrorReporter {
    pub fn new(use_color: bool, verbose: bool) -> Self {
        Self { use_color, verbose }
    }

    /// Report an error to the user
    pub fn report_error(&self, error: &AppError) {
        eprintln!("{}", error.format_for_console(self.use_color));

        if self.verbose {
            eprintln!();
            eprintln!("{}", error.user_friendly_message());

            if error.is_recoverable() {
                eprintln!();
                if self.use_color {
                    use colored::Colorize;
                    eprintln!("{}", "This error might be temporary. You can try running the command again.".green());
                } else {
                    eprintln!("This error might be temporary. You can try running the command again.");
                }
            }
        }
    }
}

impl Default for ErrorReporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}
