//! Scenario execution engine
//!
//! This module contains:
//! - The per-VU-iterations executor: every VU is a task running a fixed
//!   number of iterations back to back, under a wall-clock cap
//! - The plan runner, which starts all scenarios of a plan together,
//!   waits for them, and evaluates thresholds into a [`RunReport`]

use crate::{
    client::HttpClient,
    error::{AppError, Result},
    logging::{RequestLogger, RunLogger},
    models::{Config, RunReport, ScenarioOutcome, StopReason},
    requests,
    scenario::{ScenarioSpec, TestPlan},
    stats::MetricsCollector,
    types::ExecutorKind,
};
use async_trait::async_trait;
use chrono::Utc;
use futures::future::join_all;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinSet;
use uuid::Uuid;

/// Everything a virtual user needs to issue and record requests
#[derive(Clone)]
pub struct ExecutionContext {
    pub client: Arc<dyn HttpClient>,
    pub base_url: String,
    pub request_timeout: Duration,
    pub metrics: MetricsCollector,
    pub request_logger: Arc<RequestLogger>,
}

/// Scheduling strategy for one scenario
#[async_trait]
pub trait ScenarioExecutor: Send + Sync {
    /// Run the scenario until it completes, hits its max duration, or
    /// `shutdown` flips to true
    async fn run(
        &self,
        spec: &ScenarioSpec,
        ctx: &ExecutionContext,
        shutdown: watch::Receiver<bool>,
    ) -> Result<ScenarioOutcome>;
}

/// Executor for a scenario's configured kind
pub fn executor_for(kind: ExecutorKind) -> Box<dyn ScenarioExecutor> {
    match kind {
        ExecutorKind::PerVuIterations => Box::new(PerVuIterationsExecutor),
    }
}

/// Each VU runs `iterations` iterations sequentially
pub struct PerVuIterationsExecutor;

#[async_trait]
impl ScenarioExecutor for PerVuIterationsExecutor {
    async fn run(
        &self,
        spec: &ScenarioSpec,
        ctx: &ExecutionContext,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<ScenarioOutcome> {
        let start = Instant::now();
        let started_iterations = Arc::new(AtomicU64::new(0));

        let mut vus = JoinSet::new();
        for _ in 0..spec.vus {
            let ctx = ctx.clone();
            let started_iterations = started_iterations.clone();
            let scenario = spec.name.clone();
            let exec = spec.exec;
            let iterations = spec.iterations;

            vus.spawn(async move {
                for _ in 0..iterations {
                    started_iterations.fetch_add(1, Ordering::SeqCst);
                    requests::run_iteration(&ctx, &scenario, exec).await;
                    ctx.metrics.record_iteration(&scenario).await;
                }
            });
        }

        let deadline = tokio::time::sleep(spec.max_duration);
        tokio::pin!(deadline);
        let mut listening = true;

        let interrupted_before_start = *shutdown.borrow();
        let stop_reason = if interrupted_before_start {
            StopReason::Interrupted
        } else {
            loop {
                tokio::select! {
                    joined = vus.join_next() => match joined {
                        None => break StopReason::Completed,
                        Some(Err(e)) if e.is_panic() => {
                            vus.abort_all();
                            return Err(AppError::execution(format!(
                                "A virtual user of scenario '{}' panicked: {}",
                                spec.name, e
                            )));
                        }
                        Some(_) => {}
                    },
                    _ = &mut deadline => break StopReason::MaxDuration,
                    changed = shutdown.changed(), if listening => match changed {
                        Ok(()) => {
                            let interrupted = *shutdown.borrow();
                            if interrupted {
                                break StopReason::Interrupted;
                            }
                        }
                        // Sender gone: no interrupt can arrive any more
                        Err(_) => listening = false,
                    },
                }
            }
        };

        if stop_reason != StopReason::Completed {
            vus.abort_all();
            while vus.join_next().await.is_some() {}
        }

        let completed_iterations = ctx.metrics.completed_iterations(&spec.name).await;
        let interrupted_iterations = started_iterations
            .load(Ordering::SeqCst)
            .saturating_sub(completed_iterations);

        Ok(ScenarioOutcome {
            name: spec.name.clone(),
            exec: spec.exec.as_str().to_string(),
            vus: spec.vus,
            planned_iterations: spec.total_iterations(),
            completed_iterations,
            interrupted_iterations,
            duration_ms: start.elapsed().as_secs_f64() * 1000.0,
            stop_reason,
        })
    }
}

/// Runs every scenario of a plan concurrently and builds the report
pub struct PlanRunner {
    client: Arc<dyn HttpClient>,
    base_url: String,
    request_timeout: Duration,
    request_logger: Arc<RequestLogger>,
    run_logger: Arc<RunLogger>,
    run_id: String,
}

impl PlanRunner {
    pub fn new(client: Arc<dyn HttpClient>, base_url: &str, request_timeout: Duration) -> Self {
        let config = Config::default();
        Self {
            client,
            base_url: base_url.to_string(),
            request_timeout,
            request_logger: Arc::new(RequestLogger::new(&config)),
            run_logger: Arc::new(RunLogger::new(&config)),
            run_id: Uuid::new_v4().to_string(),
        }
    }

    pub fn with_loggers(mut self, request_logger: RequestLogger, run_logger: RunLogger) -> Self {
        self.request_logger = Arc::new(request_logger);
        self.run_logger = Arc::new(run_logger);
        self
    }

    pub fn with_run_id(mut self, run_id: &str) -> Self {
        self.run_id = run_id.to_string();
        self
    }

    pub async fn run(&self, plan: &TestPlan, shutdown: watch::Receiver<bool>) -> Result<RunReport> {
        plan.validate()?;

        let started_at = Utc::now();
        let start = Instant::now();
        let ctx = ExecutionContext {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            request_timeout: self.request_timeout,
            metrics: MetricsCollector::new(),
            request_logger: self.request_logger.clone(),
        };

        let runs = plan.scenarios.iter().map(|spec| {
            let ctx = &ctx;
            let shutdown = shutdown.clone();
            async move {
                self.run_logger.log_scenario_start(spec).await;
                let outcome = executor_for(spec.executor).run(spec, ctx, shutdown).await?;
                self.run_logger.log_scenario_complete(&outcome).await;
                Ok::<_, AppError>(outcome)
            }
        });
        let scenarios = join_all(runs).await.into_iter().collect::<Result<Vec<_>>>()?;

        let snapshot = ctx.metrics.snapshot().await;
        let thresholds = plan
            .thresholds
            .iter()
            .flat_map(|threshold| threshold.evaluate(&snapshot))
            .collect();
        let interrupted_iterations = scenarios.iter().map(|s| s.interrupted_iterations).sum();

        let report = RunReport {
            run_id: self.run_id.clone(),
            plan: plan.name.clone(),
            base_url: self.base_url.clone(),
            started_at,
            completed_at: Utc::now(),
            duration_ms: start.elapsed().as_secs_f64() * 1000.0,
            interrupted: scenarios.iter().any(|s| s.stop_reason == StopReason::Interrupted),
            checks: snapshot.check_outcomes(),
            endpoints: snapshot.endpoint_summaries(),
            totals: snapshot.totals(interrupted_iterations),
            thresholds,
            scenarios,
        };

        self.run_logger.log_run_summary(&report).await;
        Ok(report)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::client::HttpResponse;
    use std::sync::Mutex;

    /// Client answering every path with a fixed status, optionally after a delay
    pub struct StaticClient {
        books_status: u16,
        new_books_status: u16,
        delay: Option<Duration>,
        urls: Mutex<Vec<String>>,
    }

    impl StaticClient {
        pub fn new(books_status: u16, new_books_status: u16) -> Arc<Self> {
            Arc::new(Self {
                books_status,
                new_books_status,
                delay: None,
                urls: Mutex::new(Vec::new()),
            })
        }

        pub fn slow(status: u16, delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                books_status: status,
                new_books_status: status,
                delay: Some(delay),
                urls: Mutex::new(Vec::new()),
            })
        }

        pub fn requested_urls(&self) -> Vec<String> {
            self.urls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl HttpClient for StaticClient {
        async fn get(&self, url: &str) -> Result<HttpResponse> {
            self.urls.lock().unwrap().push(url.to_string());
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            let status_code = if url.ends_with("/new-books") {
                self.new_books_status
            } else {
                self.books_status
            };
            Ok(HttpResponse { status_code, body_size: 2 })
        }
    }

    pub fn context_with(client: Arc<StaticClient>) -> ExecutionContext {
        ExecutionContext {
            client,
            base_url: "http://books.test".to_string(),
            request_timeout: Duration::from_secs(5),
            metrics: MetricsCollector::new(),
            request_logger: Arc::new(RequestLogger::new(&Config::default())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{context_with, StaticClient};
    use super::*;
    use crate::stats::{Aggregation, MetricName, Operator, Threshold, ThresholdCondition};
    use crate::types::ExecTarget;

    fn spec(vus: u32, iterations: u32, max_duration: Duration) -> ScenarioSpec {
        ScenarioSpec::new("warmup", ExecTarget::Default, vus, iterations, max_duration)
    }

    #[tokio::test]
    async fn test_all_iterations_complete_despite_failed_checks() {
        let ctx = context_with(StaticClient::new(500, 404));
        let (_tx, rx) = watch::channel(false);

        let outcome = PerVuIterationsExecutor
            .run(&spec(3, 4, Duration::from_secs(10)), &ctx, rx)
            .await
            .unwrap();

        assert_eq!(outcome.stop_reason, StopReason::Completed);
        assert_eq!(outcome.planned_iterations, 12);
        assert_eq!(outcome.completed_iterations, 12);
        assert_eq!(outcome.interrupted_iterations, 0);
        assert!(outcome.is_complete());

        let snapshot = ctx.metrics.snapshot().await;
        assert_eq!(snapshot.samples.len(), 24);
        let outcomes = snapshot.check_outcomes();
        assert!(outcomes.iter().all(|c| c.passes == 0 && c.fails == 12));
    }

    #[tokio::test]
    async fn test_max_duration_stops_scenario() {
        let ctx = context_with(StaticClient::slow(200, Duration::from_millis(50)));
        let (_tx, rx) = watch::channel(false);

        let outcome = PerVuIterationsExecutor
            .run(&spec(2, 1000, Duration::from_millis(300)), &ctx, rx)
            .await
            .unwrap();

        assert_eq!(outcome.stop_reason, StopReason::MaxDuration);
        assert!(outcome.completed_iterations > 0);
        assert!(outcome.completed_iterations < outcome.planned_iterations);
        assert!(outcome.interrupted_iterations <= 2);
        assert!(outcome.completed_iterations + outcome.interrupted_iterations <= outcome.planned_iterations);
        assert!(outcome.duration_ms < 2000.0);
    }

    #[tokio::test]
    async fn test_shutdown_signal_interrupts() {
        let ctx = context_with(StaticClient::slow(200, Duration::from_millis(50)));
        let (tx, rx) = watch::channel(false);

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(150)).await;
            let _ = tx.send(true);
        });

        let outcome = PerVuIterationsExecutor
            .run(&spec(2, 1000, Duration::from_secs(30)), &ctx, rx)
            .await
            .unwrap();
        assert_eq!(outcome.stop_reason, StopReason::Interrupted);
        assert!(!outcome.is_complete());
    }

    #[tokio::test]
    async fn test_dropped_shutdown_sender_does_not_stop_run() {
        let ctx = context_with(StaticClient::new(200, 200));
        let (tx, rx) = watch::channel(false);
        drop(tx);

        let outcome = PerVuIterationsExecutor
            .run(&spec(2, 3, Duration::from_secs(10)), &ctx, rx)
            .await
            .unwrap();
        assert_eq!(outcome.stop_reason, StopReason::Completed);
        assert_eq!(outcome.completed_iterations, 6);
    }

    #[tokio::test]
    async fn test_plan_runner_runs_every_scenario() {
        let client = StaticClient::slow(200, Duration::from_millis(20));
        let plan = TestPlan::main()
            .unwrap()
            .with_overrides(Some(2), Some(5), None);
        let (_tx, rx) = watch::channel(false);

        let report = PlanRunner::new(client.clone(), "http://books.test", Duration::from_secs(5))
            .with_run_id("run-42")
            .run(&plan, rx)
            .await
            .unwrap();

        assert_eq!(report.run_id, "run-42");
        assert_eq!(report.plan, "main");
        assert_eq!(report.scenarios.len(), 2);
        assert_eq!(report.scenario("list_books").unwrap().completed_iterations, 10);
        assert_eq!(report.scenario("new_books").unwrap().completed_iterations, 10);
        assert_eq!(report.endpoints["list-books"].http_reqs, 10);
        assert_eq!(report.endpoints["new-books"].http_reqs, 10);
        assert_eq!(report.totals.iterations, 20);
        assert_eq!(report.thresholds.len(), 2);
        assert!(report.thresholds_passed());
        assert!(!report.interrupted);
        assert_eq!(client.requested_urls().len(), 20);
    }

    #[tokio::test]
    async fn test_interrupted_plan_still_evaluates_thresholds() {
        let client = StaticClient::slow(200, Duration::from_millis(50));
        let plan = TestPlan::main()
            .unwrap()
            .with_overrides(Some(2), Some(1000), None);
        let (tx, rx) = watch::channel(false);

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            let _ = tx.send(true);
        });

        let report = PlanRunner::new(client, "http://books.test", Duration::from_secs(5))
            .run(&plan, rx)
            .await
            .unwrap();

        assert!(report.interrupted);
        assert!(report
            .scenarios
            .iter()
            .all(|s| s.stop_reason == StopReason::Interrupted));
        assert_eq!(report.thresholds.len(), 2);
        assert!(report.thresholds.iter().all(|t| t.observed.is_some() && t.passed));
        assert!(report.totals.http_reqs > 0);
        assert_eq!(report.outcome().unwrap_err().exit_code(), 105);
    }

    #[tokio::test]
    async fn test_plan_runner_reports_crossed_threshold() {
        let client = StaticClient::slow(200, Duration::from_millis(30));
        let strict = Threshold::new(MetricName::HttpReqDuration)
            .with_tag("books", "list-books")
            .with_condition(ThresholdCondition::new(Aggregation::Percentile(99.0), Operator::Lt, 10.0));
        let plan = TestPlan::warmup()
            .unwrap()
            .with_overrides(Some(1), Some(2), None)
            .with_thresholds(vec![strict]);
        let (_tx, rx) = watch::channel(false);

        let report = PlanRunner::new(client, "http://books.test", Duration::from_secs(5))
            .run(&plan, rx)
            .await
            .unwrap();

        assert!(!report.thresholds_passed());
        let failed = report.failed_thresholds();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].selector, "http_req_duration{books:list-books}");
        assert!(failed[0].observed.unwrap() >= 30.0);
    }
}
