//! Books Load Tester
//!
//! Load-testing scenarios for the books service. Virtual users issue GET
//! requests against `/books` and `/new-books`, every response is checked
//! for a 200 status, and per-endpoint latency percentiles are compared
//! against thresholds once the run completes.

pub mod checks;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod executor;
pub mod logging;
pub mod models;
pub mod output;
pub mod requests;
pub mod scenario;
pub mod stats;
pub mod types;

// Re-export commonly used types
pub use error::{AppError, Result};
pub use models::{Config, RequestSample, RunReport, TrendStats};
pub use scenario::{ScenarioSpec, TestPlan};
pub use stats::{MetricsCollector, MetricsSnapshot, Threshold};
pub use output::{OutputFormatter, ColoredFormatter, PlainFormatter, OutputFormatterFactory};

/// Application version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const PKG_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
pub const BUILD_TIME: &str = env!("BUILD_TIME");
pub const GIT_COMMIT: &str = env!("GIT_COMMIT");

/// Long version string shown by `--version`
pub fn version_info() -> String {
    format!("{} {} ({} built {})", PKG_NAME, VERSION, GIT_COMMIT, BUILD_TIME)
}

/// Default configuration values
pub mod defaults {
    use std::time::Duration;

    pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
    pub const DEFAULT_PLAN: &str = "warmup";
    /// Per-request timeout, matching the usual load-tool default of one minute
    pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
    pub const DEFAULT_ENABLE_COLOR: bool = true;

    pub const WARMUP_VUS: u32 = 10;
    pub const WARMUP_ITERATIONS: u32 = 20;
    pub const WARMUP_MAX_DURATION: &str = "30s";

    pub const MAIN_VUS: u32 = 100;
    pub const MAIN_ITERATIONS: u32 = 500;
    pub const MAIN_MAX_DURATION: &str = "5m";

    /// Latency bound applied to every tagged endpoint
    pub const LATENCY_THRESHOLD: &str = "p(99) < 1000";

    pub const MAX_VUS: u32 = 10_000;
    pub const MAX_REQUEST_TIMEOUT_SECS: u64 = 600;
}
