//! Configuration validation utilities and rules
//!
//! `Config::validate` rejects configurations that cannot run. The checks
//! here only produce warnings about ones that can run but probably
//! should not.

use crate::{
    error::{AppError, Result},
    models::Config,
    scenario::TestPlan,
    types::{Endpoint, BOOKS_TAG_KEY},
};
use colored::*;

/// Configuration validator with advanced validation rules
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration and collect non-fatal warnings
    pub fn validate_comprehensive(config: &Config) -> Result<Vec<ValidationWarning>> {
        config.validate()?;

        let plan = config.build_plan()?;

        let mut warnings = Vec::new();
        warnings.extend(Self::validate_base_url(&config.base_url)?);
        warnings.extend(Self::validate_load_settings(config, &plan));
        warnings.extend(Self::validate_thresholds(&plan));
        Ok(warnings)
    }

    fn validate_base_url(base_url: &str) -> Result<Vec<ValidationWarning>> {
        let parsed = url::Url::parse(base_url)
            .map_err(|e| AppError::config(format!("Invalid base URL '{}': {}", base_url, e)))?;
        let mut warnings = Vec::new();

        let is_local = match parsed.host() {
            Some(url::Host::Domain(domain)) => {
                domain == "localhost" || domain == "host.docker.internal" || domain.ends_with(".local")
            }
            Some(url::Host::Ipv4(ip)) => ip.is_loopback() || ip.is_private(),
            Some(url::Host::Ipv6(ip)) => ip.is_loopback(),
            None => false,
        };

        if parsed.scheme() == "http" && !is_local {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Warning,
                format!("Base URL '{}' uses plain HTTP to a non-local host", base_url),
            ));
        }

        if !parsed.path().is_empty() && parsed.path() != "/" {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Info,
                format!(
                    "Base URL '{}' includes path '{}'; requests go to {}",
                    base_url,
                    parsed.path(),
                    Endpoint::ListBooks.url(base_url)
                ),
            ));
        }

        if parsed.query().is_some() {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Warning,
                format!("Base URL '{}' has a query string, which is not forwarded to the endpoints", base_url),
            ));
        }

        Ok(warnings)
    }

    fn validate_load_settings(config: &Config, plan: &TestPlan) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        let total_vus: u32 = plan.scenarios.iter().map(|s| s.vus).sum();
        if total_vus > 1000 {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Warning,
                format!("Plan '{}' runs {} concurrent VUs; the load generator may become the bottleneck", plan.name, total_vus),
            ));
        }

        let total_requests = plan.total_requests();
        if total_requests > 1_000_000 {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Warning,
                format!("Plan '{}' issues up to {} requests, which may take a long time", plan.name, total_requests),
            ));
        } else if total_requests > 100_000 {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Info,
                format!("Plan '{}' issues up to {} requests", plan.name, total_requests),
            ));
        }

        let timeout = config.request_timeout();
        if timeout.as_secs() < 2 {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Info,
                format!("Request timeout of {}s will count slow responses as failures", timeout.as_secs()),
            ));
        }

        warnings
    }

    /// Thresholds filtering on a `books` tag no request ever carries
    fn validate_thresholds(plan: &TestPlan) -> Vec<ValidationWarning> {
        plan.thresholds
            .iter()
            .filter_map(|threshold| {
                let tag = threshold.tags.get(BOOKS_TAG_KEY)?;
                if Endpoint::from_tag(tag).is_some() {
                    return None;
                }
                Some(ValidationWarning::new(
                    ValidationLevel::Warning,
                    format!(
                        "Threshold '{}' selects unknown endpoint tag '{}'; it will always pass with no data",
                        threshold.selector(),
                        tag
                    ),
                ))
            })
            .collect()
    }
}

/// Validation warning levels
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationLevel {
    Info,
    Warning,
}

impl ValidationLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
        }
    }

    pub fn color(&self) -> Color {
        match self {
            Self::Info => Color::Blue,
            Self::Warning => Color::Yellow,
        }
    }
}

/// Configuration validation warning
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub level: ValidationLevel,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(level: ValidationLevel, message: String) -> Self {
        Self { level, message }
    }

    pub fn format(&self, use_color: bool) -> String {
        let label = format!("[{}]", self.level.as_str());
        if use_color {
            format!("{} {}", label.color(self.level.color()).bold(), self.message)
        } else {
            format!("{} {}", label, self.message)
        }
    }
}

/// Convenience function for comprehensive configuration validation
pub fn validate_config(config: &Config) -> Result<Vec<ValidationWarning>> {
    ConfigValidator::validate_comprehensive(config)
}
