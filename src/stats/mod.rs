//! Metric collection and aggregation for load test runs
//!
//! Virtual users append request samples, check results and completed
//! iterations to a shared [`MetricsCollector`]. Once a run stops, a
//! [`MetricsSnapshot`] is taken and everything reported at the end of the
//! test (trends, check rates, thresholds) is computed from it.

pub mod threshold;

pub use threshold::{Aggregation, MetricKind, MetricName, Operator, Threshold, ThresholdCondition};

use crate::{
    models::{CheckOutcome, CheckRecord, EndpointSummary, RequestSample, RequestTotals, TrendStats},
    types::Endpoint,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Calculate a percentile over sorted values using linear interpolation
/// between the closest ranks
pub fn percentile(sorted_values: &[f64], percentile: f64) -> f64 {
    if sorted_values.is_empty() {
        return 0.0;
    }

    let index = (percentile / 100.0) * (sorted_values.len() as f64 - 1.0);
    let lower_index = index.floor() as usize;
    let upper_index = index.ceil() as usize;

    if lower_index == upper_index {
        sorted_values[lower_index]
    } else {
        let lower_value = sorted_values[lower_index];
        let upper_value = sorted_values[upper_index];
        let weight = index - lower_index as f64;
        lower_value + weight * (upper_value - lower_value)
    }
}

impl TrendStats {
    /// Aggregate raw millisecond values
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        Self {
            count: sorted.len(),
            min: sorted[0],
            max: sorted[sorted.len() - 1],
            avg: sorted.iter().sum::<f64>() / sorted.len() as f64,
            med: percentile(&sorted, 50.0),
            p90: percentile(&sorted, 90.0),
            p95: percentile(&sorted, 95.0),
            p99: percentile(&sorted, 99.0),
        }
    }
}

#[derive(Debug, Default)]
struct MetricsStore {
    samples: Vec<RequestSample>,
    checks: Vec<CheckRecord>,
    iterations: BTreeMap<String, u64>,
}

/// Shared, append-only metric sink for all virtual users of a run
#[derive(Clone)]
pub struct MetricsCollector {
    store: Arc<RwLock<MetricsStore>>,
    started: Instant,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(MetricsStore::default())),
            started: Instant::now(),
        }
    }

    pub async fn record_request(&self, sample: RequestSample) {
        self.store.write().await.samples.push(sample);
    }

    pub async fn record_check(&self, record: CheckRecord) {
        self.store.write().await.checks.push(record);
    }

    pub async fn record_iteration(&self, scenario: &str) {
        let mut store = self.store.write().await;
        *store.iterations.entry(scenario.to_string()).or_insert(0) += 1;
    }

    /// Completed iterations of one scenario so far
    pub async fn completed_iterations(&self, scenario: &str) -> u64 {
        self.store.read().await.iterations.get(scenario).copied().unwrap_or(0)
    }

    pub async fn request_count(&self) -> usize {
        self.store.read().await.samples.len()
    }

    /// Copy of everything recorded so far
    pub async fn snapshot(&self) -> MetricsSnapshot {
        let store = self.store.read().await;
        MetricsSnapshot {
            samples: store.samples.clone(),
            checks: store.checks.clone(),
            iterations: store.iterations.clone(),
            elapsed: self.started.elapsed(),
        }
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of a run's metrics
#[derive(Debug, Clone, Default)]
pub struct MetricsSnapshot {
    pub samples: Vec<RequestSample>,
    pub checks: Vec<CheckRecord>,
    pub iterations: BTreeMap<String, u64>,
    pub elapsed: Duration,
}

fn tags_match(tags: &BTreeMap<&'static str, String>, filter: &BTreeMap<String, String>) -> bool {
    filter
        .iter()
        .all(|(key, value)| tags.get(key.as_str()).map_or(false, |v| v == value))
}

impl MetricsSnapshot {
    fn matching_samples<'a>(
        &'a self,
        filter: &'a BTreeMap<String, String>,
    ) -> impl Iterator<Item = &'a RequestSample> + 'a {
        self.samples.iter().filter(move |s| tags_match(&s.tags(), filter))
    }

    /// Durations of requests that received a response, in milliseconds
    pub fn durations_ms(&self, filter: &BTreeMap<String, String>) -> Vec<f64> {
        self.matching_samples(filter)
            .filter(|s| s.has_response())
            .map(|s| s.duration_ms())
            .collect()
    }

    pub fn trend(&self, filter: &BTreeMap<String, String>) -> TrendStats {
        TrendStats::from_values(&self.durations_ms(filter))
    }

    pub fn request_count(&self, filter: &BTreeMap<String, String>) -> u64 {
        self.matching_samples(filter).count() as u64
    }

    pub fn failed_count(&self, filter: &BTreeMap<String, String>) -> u64 {
        self.matching_samples(filter).filter(|s| s.is_failed()).count() as u64
    }

    /// Passing and failing check counts
    pub fn check_counts(&self, filter: &BTreeMap<String, String>) -> (u64, u64) {
        self.checks
            .iter()
            .filter(|c| tags_match(&c.tags(), filter))
            .fold((0, 0), |(passes, fails), c| {
                if c.passed {
                    (passes + 1, fails)
                } else {
                    (passes, fails + 1)
                }
            })
    }

    /// Completed iterations; only the `scenario` tag applies to iterations
    pub fn iteration_count(&self, filter: &BTreeMap<String, String>) -> u64 {
        if filter.keys().any(|k| k != "scenario") {
            return 0;
        }
        match filter.get("scenario") {
            Some(scenario) => self.iterations.get(scenario).copied().unwrap_or(0),
            None => self.iterations.values().sum(),
        }
    }

    /// Per-check, per-endpoint pass/fail counts in a stable order
    pub fn check_outcomes(&self) -> Vec<CheckOutcome> {
        let mut grouped: BTreeMap<(String, Endpoint), (u64, u64)> = BTreeMap::new();
        for record in &self.checks {
            let entry = grouped.entry((record.name.clone(), record.endpoint)).or_insert((0, 0));
            if record.passed {
                entry.0 += 1;
            } else {
                entry.1 += 1;
            }
        }

        grouped
            .into_iter()
            .map(|((name, endpoint), (passes, fails))| CheckOutcome {
                name,
                tag: endpoint.tag().to_string(),
                passes,
                fails,
            })
            .collect()
    }

    /// Summary for every endpoint that received at least one request
    pub fn endpoint_summaries(&self) -> BTreeMap<String, EndpointSummary> {
        Endpoint::ALL
            .iter()
            .filter_map(|endpoint| {
                let filter = BTreeMap::from([(
                    crate::types::BOOKS_TAG_KEY.to_string(),
                    endpoint.tag().to_string(),
                )]);
                let http_reqs = self.request_count(&filter);
                (http_reqs > 0).then(|| {
                    (
                        endpoint.tag().to_string(),
                        EndpointSummary {
                            tag: endpoint.tag().to_string(),
                            path: endpoint.path().to_string(),
                            http_reqs,
                            failed_reqs: self.failed_count(&filter),
                            http_req_duration: self.trend(&filter),
                        },
                    )
                })
            })
            .collect()
    }

    pub fn totals(&self, interrupted_iterations: u64) -> RequestTotals {
        let all = BTreeMap::new();
        RequestTotals {
            http_reqs: self.request_count(&all),
            failed_reqs: self.failed_count(&all),
            iterations: self.iteration_count(&all),
            interrupted_iterations,
            http_req_duration: self.trend(&all),
        }
    }
}
