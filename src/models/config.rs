//! Configuration data model and validation

use crate::scenario::{parse_duration, TestPlan};
use crate::stats::Threshold;
use crate::types::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the books service
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Name of the built-in plan to run (warmup or main)
    #[serde(default = "default_plan")]
    pub plan: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_seconds: u64,

    /// Replaces the VU count of every scenario in the plan
    #[serde(default)]
    pub vus: Option<u32>,

    /// Replaces the per-VU iteration count of every scenario in the plan
    #[serde(default)]
    pub iterations: Option<u32>,

    /// Replaces the max duration of every scenario in the plan (e.g. "45s")
    #[serde(default)]
    pub max_duration: Option<String>,

    /// Extra thresholds in `SELECTOR=EXPR[;EXPR]` form, added to the plan's own
    #[serde(default)]
    pub thresholds: Vec<String>,

    /// Write the end-of-test summary as JSON to this path
    #[serde(default)]
    pub summary_export: Option<PathBuf>,

    /// Enable colored terminal output
    #[serde(default = "default_enable_color")]
    pub enable_color: bool,

    /// Enable verbose output
    #[serde(default)]
    pub verbose: bool,

    /// Enable debug output
    #[serde(default)]
    pub debug: bool,

    /// Suppress the end-of-test summary
    #[serde(default)]
    pub quiet: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            plan: default_plan(),
            request_timeout_seconds: default_request_timeout_secs(),
            vus: None,
            iterations: None,
            max_duration: None,
            thresholds: Vec::new(),
            summary_export: None,
            enable_color: default_enable_color(),
            verbose: false,
            debug: false,
            quiet: false,
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Get request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    /// Parsed max duration override, if any
    pub fn max_duration_override(&self) -> Result<Option<Duration>> {
        self.max_duration.as_deref().map(parse_duration).transpose()
    }

    /// Validate the configuration and return any errors
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(AppError::config("Base URL cannot be empty"));
        }

        let parsed = url::Url::parse(&self.base_url)
            .map_err(|e| AppError::config(format!("Invalid base URL '{}': {}", self.base_url, e)))?;

        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(AppError::config(format!(
                "Base URL must use http or https: {}",
                self.base_url
            )));
        }

        if parsed.host_str().is_none() {
            return Err(AppError::config(format!("Base URL must have a host: {}", self.base_url)));
        }

        if !TestPlan::available().contains(&self.plan.as_str()) {
            return Err(AppError::config(format!(
                "Unknown plan '{}'. Available plans: {}",
                self.plan,
                TestPlan::available().join(", ")
            )));
        }

        if self.request_timeout_seconds == 0 {
            return Err(AppError::config("Request timeout must be greater than 0"));
        }

        if self.request_timeout_seconds > crate::defaults::MAX_REQUEST_TIMEOUT_SECS {
            return Err(AppError::config(format!(
                "Request timeout cannot exceed {} seconds",
                crate::defaults::MAX_REQUEST_TIMEOUT_SECS
            )));
        }

        if let Some(vus) = self.vus {
            if vus == 0 {
                return Err(AppError::config("VU count must be greater than 0"));
            }
            if vus > crate::defaults::MAX_VUS {
                return Err(AppError::config(format!(
                    "VU count cannot exceed {}",
                    crate::defaults::MAX_VUS
                )));
            }
        }

        if self.iterations == Some(0) {
            return Err(AppError::config("Iteration count must be greater than 0"));
        }

        self.max_duration_override()
            .map_err(|e| AppError::config(format!("Invalid max duration: {}", e)))?;

        self.extra_thresholds()
            .map_err(|e| AppError::config(format!("Invalid threshold: {}", e)))?;

        Ok(())
    }

    /// Parsed `--threshold` values
    pub fn extra_thresholds(&self) -> Result<Vec<Threshold>> {
        self.thresholds.iter().map(|t| Threshold::from_assignment(t)).collect()
    }

    /// Resolve the selected plan with any scenario overrides applied
    pub fn build_plan(&self) -> Result<TestPlan> {
        let plan = TestPlan::by_name(&self.plan)?
            .with_overrides(self.vus, self.iterations, self.max_duration_override()?)
            .with_thresholds(self.extra_thresholds()?);
        plan.validate()?;
        Ok(plan)
    }

    /// Merge environment variables into this configuration
    pub fn merge_from_env(&mut self) -> Result<()> {
        // An empty BASE_URL falls back to the default
        if let Ok(base_url) = std::env::var("BASE_URL") {
            let base_url = base_url.trim();
            if !base_url.is_empty() {
                self.base_url = base_url.to_string();
            }
        }

        if let Ok(plan) = std::env::var("LOAD_PLAN") {
            let plan = plan.trim();
            if !plan.is_empty() {
                self.plan = plan.to_string();
            }
        }

        if let Ok(timeout) = std::env::var("REQUEST_TIMEOUT_SECONDS") {
            self.request_timeout_seconds = timeout.trim().parse().map_err(|e| {
                AppError::config(format!("Invalid REQUEST_TIMEOUT_SECONDS value '{}': {}", timeout, e))
            })?;
        }

        if let Ok(enable_color) = std::env::var("ENABLE_COLOR") {
            self.enable_color = enable_color.trim().parse().map_err(|e| {
                AppError::config(format!("Invalid ENABLE_COLOR value '{}': {}", enable_color, e))
            })?;
        }

        Ok(())
    }
}

// Default value functions for serde
fn default_base_url() -> String {
    crate::defaults::DEFAULT_BASE_URL.to_string()
}

fn default_plan() -> String {
    crate::defaults::DEFAULT_PLAN.to_string()
}

fn default_request_timeout_secs() -> u64 {
    crate::defaults::DEFAULT_REQUEST_TIMEOUT.as_secs()
}

fn default_enable_color() -> bool {
    crate::defaults::DEFAULT_ENABLE_COLOR
}
