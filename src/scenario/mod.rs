//! Scenario definitions and the built-in test plans
//!
//! A plan groups scenarios that start together and run concurrently,
//! plus the thresholds evaluated once all of them have stopped.

pub mod duration;

pub use duration::{format_duration, parse_duration};

use crate::{
    defaults,
    error::{AppError, Result},
    stats::{Aggregation, MetricName, Operator, Threshold, ThresholdCondition},
    types::{Endpoint, ExecTarget, ExecutorKind, BOOKS_TAG_KEY},
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

/// One scenario: how many VUs, how many iterations each, and what they run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioSpec {
    pub name: String,
    pub executor: ExecutorKind,
    pub exec: ExecTarget,
    pub vus: u32,
    /// Iterations per VU
    pub iterations: u32,
    /// Hard wall-clock cap for the whole scenario
    #[serde(with = "duration::serde_literal")]
    pub max_duration: Duration,
}

impl ScenarioSpec {
    pub fn new(name: &str, exec: ExecTarget, vus: u32, iterations: u32, max_duration: Duration) -> Self {
        Self {
            name: name.to_string(),
            executor: ExecutorKind::PerVuIterations,
            exec,
            vus,
            iterations,
            max_duration,
        }
    }

    /// Planned iterations across all VUs
    pub fn total_iterations(&self) -> u64 {
        self.vus as u64 * self.iterations as u64
    }

    /// Planned requests across all VUs
    pub fn total_requests(&self) -> u64 {
        self.total_iterations() * self.exec.endpoints().len() as u64
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::validation("Scenario name cannot be empty"));
        }
        if self.vus == 0 {
            return Err(AppError::validation(format!("Scenario '{}' needs at least 1 VU", self.name)));
        }
        if self.iterations == 0 {
            return Err(AppError::validation(format!(
                "Scenario '{}' needs at least 1 iteration per VU",
                self.name
            )));
        }
        if self.max_duration.is_zero() {
            return Err(AppError::validation(format!(
                "Scenario '{}' max duration must be greater than 0",
                self.name
            )));
        }
        Ok(())
    }
}

/// A named set of scenarios and thresholds
#[derive(Debug, Clone)]
pub struct TestPlan {
    pub name: String,
    pub scenarios: Vec<ScenarioSpec>,
    pub thresholds: Vec<Threshold>,
}

impl TestPlan {
    /// Names accepted by [`TestPlan::by_name`]
    pub fn available() -> &'static [&'static str] {
        &["warmup", "main"]
    }

    /// Low-load run priming connections and caches: one scenario hitting both endpoints
    pub fn warmup() -> Result<Self> {
        Ok(Self {
            name: "warmup".to_string(),
            scenarios: vec![ScenarioSpec::new(
                "warmup",
                ExecTarget::Default,
                defaults::WARMUP_VUS,
                defaults::WARMUP_ITERATIONS,
                parse_duration(defaults::WARMUP_MAX_DURATION)?,
            )],
            thresholds: Self::latency_thresholds(),
        })
    }

    /// Full-load run: one scenario per endpoint, concurrently
    pub fn main() -> Result<Self> {
        let max_duration = parse_duration(defaults::MAIN_MAX_DURATION)?;
        Ok(Self {
            name: "main".to_string(),
            scenarios: vec![
                ScenarioSpec::new(
                    "list_books",
                    ExecTarget::ListBooks,
                    defaults::MAIN_VUS,
                    defaults::MAIN_ITERATIONS,
                    max_duration,
                ),
                ScenarioSpec::new(
                    "new_books",
                    ExecTarget::NewBooks,
                    defaults::MAIN_VUS,
                    defaults::MAIN_ITERATIONS,
                    max_duration,
                ),
            ],
            thresholds: Self::latency_thresholds(),
        })
    }

    pub fn by_name(name: &str) -> Result<Self> {
        match name {
            "warmup" => Self::warmup(),
            "main" => Self::main(),
            other => Err(AppError::config(format!(
                "Unknown plan '{}'. Available plans: {}",
                other,
                Self::available().join(", ")
            ))),
        }
    }

    /// `p(99) < 1000` on the request duration of every endpoint tag
    fn latency_thresholds() -> Vec<Threshold> {
        Endpoint::ALL
            .iter()
            .map(|endpoint| {
                Threshold::new(MetricName::HttpReqDuration)
                    .with_tag(BOOKS_TAG_KEY, endpoint.tag())
                    .with_condition(ThresholdCondition::new(Aggregation::Percentile(99.0), Operator::Lt, 1000.0))
            })
            .collect()
    }

    /// Replace VUs, iterations and max duration of every scenario
    pub fn with_overrides(mut self, vus: Option<u32>, iterations: Option<u32>, max_duration: Option<Duration>) -> Self {
        for scenario in &mut self.scenarios {
            if let Some(vus) = vus {
                scenario.vus = vus;
            }
            if let Some(iterations) = iterations {
                scenario.iterations = iterations;
            }
            if let Some(max_duration) = max_duration {
                scenario.max_duration = max_duration;
            }
        }
        self
    }

    pub fn with_thresholds(mut self, thresholds: Vec<Threshold>) -> Self {
        self.thresholds.extend(thresholds);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.scenarios.is_empty() {
            return Err(AppError::validation(format!("Plan '{}' has no scenarios", self.name)));
        }

        let mut names = HashSet::new();
        for scenario in &self.scenarios {
            scenario.validate()?;
            if !names.insert(scenario.name.as_str()) {
                return Err(AppError::validation(format!(
                    "Duplicate scenario name '{}' in plan '{}'",
                    scenario.name, self.name
                )));
            }
        }

        for threshold in &self.thresholds {
            threshold.validate()?;
        }

        Ok(())
    }

    pub fn total_iterations(&self) -> u64 {
        self.scenarios.iter().map(|s| s.total_iterations()).sum()
    }

    pub fn total_requests(&self) -> u64 {
        self.scenarios.iter().map(|s| s.total_requests()).sum()
    }

    /// Longest scenario cap, i.e. the worst-case run time
    pub fn max_duration(&self) -> Duration {
        self.scenarios.iter().map(|s| s.max_duration).max().unwrap_or_default()
    }
}
