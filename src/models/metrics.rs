//! Request samples, check results and run report data models

use crate::error::{AppError, Result};
use crate::types::{Endpoint, RequestStatus, BOOKS_TAG_KEY};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// One HTTP request issued by a virtual user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestSample {
    /// Scenario that issued the request
    pub scenario: String,

    /// Endpoint requested
    pub endpoint: Endpoint,

    /// HTTP status code, 0 when no response was received
    pub status_code: u16,

    /// Request outcome
    pub status: RequestStatus,

    /// Time from sending the request until the body was read
    pub duration: Duration,

    /// When the request completed
    pub timestamp: DateTime<Utc>,

    /// Transport error, if any
    pub error_message: Option<String>,
}

impl RequestSample {
    /// A request that produced a response
    pub fn completed(scenario: &str, endpoint: Endpoint, status_code: u16, duration: Duration) -> Self {
        Self {
            scenario: scenario.to_string(),
            endpoint,
            status_code,
            status: RequestStatus::Completed,
            duration,
            timestamp: Utc::now(),
            error_message: None,
        }
    }

    /// A request that failed before a response arrived
    pub fn failed(scenario: &str, endpoint: Endpoint, duration: Duration, error_message: String) -> Self {
        Self {
            scenario: scenario.to_string(),
            endpoint,
            status_code: 0,
            status: RequestStatus::Failed,
            duration,
            timestamp: Utc::now(),
            error_message: Some(error_message),
        }
    }

    /// A request that exceeded the request timeout
    pub fn timeout(scenario: &str, endpoint: Endpoint, timeout: Duration) -> Self {
        Self {
            scenario: scenario.to_string(),
            endpoint,
            status_code: 0,
            status: RequestStatus::Timeout,
            duration: timeout,
            timestamp: Utc::now(),
            error_message: Some(format!("Request timed out after {:.1}s", timeout.as_secs_f64())),
        }
    }

    /// Whether a response was received at all
    pub fn has_response(&self) -> bool {
        matches!(self.status, RequestStatus::Completed)
    }

    /// Whether the request counts as failed for `http_req_failed`
    pub fn is_failed(&self) -> bool {
        !self.has_response() || self.status_code != 200
    }

    pub fn duration_ms(&self) -> f64 {
        self.duration.as_secs_f64() * 1000.0
    }

    /// Tags attached to this sample, used by threshold selectors
    pub fn tags(&self) -> BTreeMap<&'static str, String> {
        let mut tags = BTreeMap::new();
        tags.insert(BOOKS_TAG_KEY, self.endpoint.tag().to_string());
        tags.insert("scenario", self.scenario.clone());
        tags.insert("status", self.status_code.to_string());
        tags.insert("method", "GET".to_string());
        tags
    }
}

/// Result of evaluating one named check against one response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckRecord {
    pub name: String,
    pub scenario: String,
    pub endpoint: Endpoint,
    pub passed: bool,
}

impl CheckRecord {
    pub fn tags(&self) -> BTreeMap<&'static str, String> {
        let mut tags = BTreeMap::new();
        tags.insert(BOOKS_TAG_KEY, self.endpoint.tag().to_string());
        tags.insert("scenario", self.scenario.clone());
        tags.insert("check", self.name.clone());
        tags
    }
}

/// Aggregated pass/fail counts of a check for one endpoint tag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckOutcome {
    pub name: String,
    pub tag: String,
    pub passes: u64,
    pub fails: u64,
}

impl CheckOutcome {
    pub fn total(&self) -> u64 {
        self.passes + self.fails
    }

    /// Passing fraction in 0.0..=1.0
    pub fn pass_rate(&self) -> f64 {
        if self.total() == 0 {
            0.0
        } else {
            self.passes as f64 / self.total() as f64
        }
    }

    pub fn all_passed(&self) -> bool {
        self.fails == 0
    }
}

/// Trend statistics over request durations, all values in milliseconds
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrendStats {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub avg: f64,
    pub med: f64,
    pub p90: f64,
    pub p95: f64,
    pub p99: f64,
}

impl TrendStats {
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Per-endpoint request summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointSummary {
    pub tag: String,
    pub path: String,
    pub http_reqs: u64,
    pub failed_reqs: u64,
    pub http_req_duration: TrendStats,
}

impl EndpointSummary {
    pub fn failed_rate(&self) -> f64 {
        if self.http_reqs == 0 {
            0.0
        } else {
            self.failed_reqs as f64 / self.http_reqs as f64
        }
    }
}

/// Why a scenario stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Every VU finished its iterations
    Completed,
    /// The scenario hit its max duration
    MaxDuration,
    /// The run was interrupted by the user
    Interrupted,
}

/// Result of running one scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioOutcome {
    pub name: String,
    pub exec: String,
    pub vus: u32,
    pub planned_iterations: u64,
    pub completed_iterations: u64,
    pub interrupted_iterations: u64,
    pub duration_ms: f64,
    pub stop_reason: StopReason,
}

impl ScenarioOutcome {
    /// Iterations that never started because the scenario stopped early
    pub fn dropped_iterations(&self) -> u64 {
        self.planned_iterations
            .saturating_sub(self.completed_iterations + self.interrupted_iterations)
    }

    pub fn is_complete(&self) -> bool {
        self.completed_iterations == self.planned_iterations
    }
}

/// Result of evaluating one threshold expression
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdOutcome {
    /// Metric selector, e.g. `http_req_duration{books:list-books}`
    pub selector: String,
    /// Expression as written, e.g. `p(99) < 1000`
    pub expression: String,
    /// Aggregated value the expression was evaluated against
    pub observed: Option<f64>,
    pub passed: bool,
}

/// Totals across every request of the run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestTotals {
    pub http_reqs: u64,
    pub failed_reqs: u64,
    pub iterations: u64,
    pub interrupted_iterations: u64,
    pub http_req_duration: TrendStats,
}

impl RequestTotals {
    pub fn failed_rate(&self) -> f64 {
        if self.http_reqs == 0 {
            0.0
        } else {
            self.failed_reqs as f64 / self.http_reqs as f64
        }
    }
}

/// Everything produced by one plan run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: String,
    pub plan: String,
    pub base_url: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub duration_ms: f64,
    pub interrupted: bool,
    pub scenarios: Vec<ScenarioOutcome>,
    pub checks: Vec<CheckOutcome>,
    pub thresholds: Vec<ThresholdOutcome>,
    pub endpoints: BTreeMap<String, EndpointSummary>,
    pub totals: RequestTotals,
}

impl RunReport {
    /// True when no threshold was crossed
    pub fn thresholds_passed(&self) -> bool {
        self.thresholds.iter().all(|t| t.passed)
    }

    pub fn failed_thresholds(&self) -> Vec<&ThresholdOutcome> {
        self.thresholds.iter().filter(|t| !t.passed).collect()
    }

    /// Overall check pass rate in 0.0..=1.0
    pub fn checks_pass_rate(&self) -> f64 {
        let passes: u64 = self.checks.iter().map(|c| c.passes).sum();
        let total: u64 = self.checks.iter().map(|c| c.total()).sum();
        if total == 0 {
            0.0
        } else {
            passes as f64 / total as f64
        }
    }

    pub fn check(&self, name: &str, tag: &str) -> Option<&CheckOutcome> {
        self.checks.iter().find(|c| c.name == name && c.tag == tag)
    }

    pub fn scenario(&self, name: &str) -> Option<&ScenarioOutcome> {
        self.scenarios.iter().find(|s| s.name == name)
    }

    /// Outcome of the run as a whole.
    ///
    /// An interrupt wins over crossed thresholds. Failed checks never fail
    /// the run.
    pub fn outcome(&self) -> Result<()> {
        if self.interrupted {
            return Err(AppError::interrupted(format!(
                "Run of plan '{}' was interrupted; the summary covers completed requests only",
                self.plan
            )));
        }

        let failed = self.failed_thresholds();
        if !failed.is_empty() {
            let names: Vec<String> = failed
                .iter()
                .map(|t| format!("{} '{}'", t.selector, t.expression))
                .collect();
            return Err(AppError::thresholds_crossed(format!(
                "Thresholds on metrics have been crossed: {}",
                names.join(", ")
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completed_sample() {
        let sample = RequestSample::completed("warmup", Endpoint::ListBooks, 200, Duration::from_millis(42));
        assert!(sample.has_response());
        assert!(!sample.is_failed());
        assert_eq!(sample.duration_ms(), 42.0);

        let tags = sample.tags();
        assert_eq!(tags.get("books").map(String::as_str), Some("list-books"));
        assert_eq!(tags.get("scenario").map(String::as_str), Some("warmup"));
        assert_eq!(tags.get("status").map(String::as_str), Some("200"));
    }

    #[test]
    fn test_non_200_sample_is_failed() {
        let sample = RequestSample::completed("warmup", Endpoint::NewBooks, 503, Duration::from_millis(5));
        assert!(sample.has_response());
        assert!(sample.is_failed());
    }

    #[test]
    fn test_transport_failure_has_status_zero() {
        let sample = RequestSample::failed(
            "warmup",
            Endpoint::NewBooks,
            Duration::from_millis(3),
            "connection refused".to_string(),
        );
        assert_eq!(sample.status_code, 0);
        assert!(!sample.has_response());
        assert!(sample.is_failed());

        let sample = RequestSample::timeout("warmup", Endpoint::NewBooks, Duration::from_secs(60));
        assert_eq!(sample.status, RequestStatus::Timeout);
        assert!(sample.error_message.unwrap().contains("60.0s"));
    }

    #[test]
    fn test_check_outcome_rates() {
        let outcome = CheckOutcome {
            name: "status was 200".to_string(),
            tag: "list-books".to_string(),
            passes: 3,
            fails: 1,
        };
        assert_eq!(outcome.total(), 4);
        assert_eq!(outcome.pass_rate(), 0.75);
        assert!(!outcome.all_passed());
    }

    #[test]
    fn test_scenario_outcome_dropped_iterations() {
        let outcome = ScenarioOutcome {
            name: "warmup".to_string(),
            exec: "default".to_string(),
            vus: 10,
            planned_iterations: 200,
            completed_iterations: 150,
            interrupted_iterations: 10,
            duration_ms: 30_000.0,
            stop_reason: StopReason::MaxDuration,
        };
        assert_eq!(outcome.dropped_iterations(), 40);
        assert!(!outcome.is_complete());
    }

    #[test]
    fn test_passing_run_succeeds_despite_failed_checks() {
        let report = crate::output::test_report();
        assert!(report.checks.iter().any(|c| c.fails > 0));
        assert!(report.outcome().is_ok());
    }

    #[test]
    fn test_crossed_threshold_exits_99() {
        let mut report = crate::output::test_report();
        report.thresholds[1].observed = Some(1500.0);
        report.thresholds[1].passed = false;

        let err = report.outcome().unwrap_err();
        assert!(matches!(err, AppError::ThresholdsCrossed(_)));
        assert_eq!(err.exit_code(), 99);
        assert!(err.to_string().contains("http_req_duration{books:new-books} 'p(99) < 1000'"));
    }

    #[test]
    fn test_interrupt_wins_over_crossed_thresholds() {
        let mut report = crate::output::test_report();
        report.interrupted = true;
        report.thresholds[0].passed = false;

        let err = report.outcome().unwrap_err();
        assert!(matches!(err, AppError::Interrupted(_)));
        assert_eq!(err.exit_code(), 105);
    }
}
