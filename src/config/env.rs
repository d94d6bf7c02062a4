//! Environment variable handling and .env file management

use crate::error::{AppError, Result};
use crate::scenario::TestPlan;
use std::path::Path;

/// Environment variable configuration manager
pub struct EnvManager;

impl EnvManager {
    /// Load .env from the current directory if it exists
    ///
    /// Variables already set in the process environment win over the file.
    pub fn load_env_file(debug: bool) -> Result<()> {
        Self::load_env_file_from(Path::new(".env"), debug)
    }

    pub fn load_env_file_from(path: &Path, debug: bool) -> Result<()> {
        if path.exists() {
            dotenv::from_path(path)
                .map_err(|e| AppError::config(format!("Failed to load {}: {}", path.display(), e)))?;

            if debug {
                eprintln!("Loaded configuration from {}", path.display());
            }
        } else if debug {
            eprintln!("No {} file found, using defaults and CLI arguments", path.display());
        }

        Ok(())
    }

    /// Validate an environment variable value before it is merged
    pub fn validate_env_var(key: &str, value: &str) -> Result<()> {
        match key {
            "BASE_URL" => {
                let value = value.trim();
                if !value.is_empty() {
                    url::Url::parse(value)
                        .map_err(|e| AppError::config(format!("Invalid BASE_URL value '{}': {}", value, e)))?;
                }
            }
            "LOAD_PLAN" => {
                let value = value.trim();
                if !value.is_empty() && !TestPlan::available().contains(&value) {
                    return Err(AppError::config(format!(
                        "LOAD_PLAN must be one of {}, got: {}",
                        TestPlan::available().join(", "),
                        value
                    )));
                }
            }
            "REQUEST_TIMEOUT_SECONDS" => {
                let timeout: u64 = value.trim().parse().map_err(|e| {
                    AppError::config(format!("Invalid REQUEST_TIMEOUT_SECONDS value '{}': {}", value, e))
                })?;
                let max = crate::defaults::MAX_REQUEST_TIMEOUT_SECS;
                if timeout == 0 || timeout > max {
                    return Err(AppError::config(format!(
                        "REQUEST_TIMEOUT_SECONDS must be between 1 and {}, got: {}",
                        max, timeout
                    )));
                }
            }
            "ENABLE_COLOR" => {
                value
                    .trim()
                    .parse::<bool>()
                    .map_err(|e| AppError::config(format!("Invalid ENABLE_COLOR value '{}': {}", value, e)))?;
            }
            _ => {}
        }

        Ok(())
    }

    /// Supported variables as (name, description, example)
    pub fn get_supported_env_vars() -> Vec<(&'static str, &'static str, &'static str)> {
        vec![
            ("BASE_URL", "Base URL of the books service", "http://localhost:8080"),
            ("LOAD_PLAN", "Plan to run (warmup, main)", "warmup"),
            ("REQUEST_TIMEOUT_SECONDS", "Per-request timeout in seconds", "60"),
            ("ENABLE_COLOR", "Enable colored output", "true"),
        ]
    }

    pub fn display_env_help() -> String {
        let mut help = String::new();
        help.push_str("Supported Environment Variables:\n\n");

        for (var, description, example) in Self::get_supported_env_vars() {
            help.push_str(&format!("  {:<24} {}\n", var, description));
            help.push_str(&format!("  {:<24} Example: {}\n\n", "", example));
        }

        help.push_str("Configuration Priority (highest to lowest):\n");
        help.push_str("  1. Command-line arguments\n");
        help.push_str("  2. Environment variables\n");
        help.push_str("  3. .env file values\n");
        help.push_str("  4. Default values\n");

        help
    }
}
