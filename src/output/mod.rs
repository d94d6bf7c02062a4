//! Output formatting and display system
//!
//! Renders plan banners and the end-of-test summary as colored or plain
//! text, and exports the summary as JSON.

mod colored;
pub mod export;
mod formatter;

pub use self::colored::{ColorScheme, ColoredFormatter, PerformanceLevel};
pub use export::export_json;
pub use formatter::{
    format_duration_ms, format_observed, format_rate, Alignment, Column, FormattingOptions, OutputFormatter,
    PlainFormatter, RowData, TableFormat,
};

use crate::{error::Result, models::RunReport, scenario::TestPlan};

/// Output formatting factory for creating appropriate formatters
pub struct OutputFormatterFactory;

impl OutputFormatterFactory {
    /// Create a formatter based on color support and preferences
    pub fn create_formatter(enable_color: bool, verbose: bool) -> Box<dyn OutputFormatter> {
        let options = FormattingOptions {
            enable_color,
            verbose_mode: verbose,
            table_borders: true,
            max_width: 120,
        };

        if enable_color {
            Box::new(ColoredFormatter::new(options))
        } else {
            Box::new(PlainFormatter::new(options))
        }
    }

    /// Plain text formatter for scripts and logs
    pub fn create_plain_formatter() -> Box<dyn OutputFormatter> {
        Self::create_formatter(false, true)
    }
}

/// Main output coordinator that handles all result display
pub struct OutputCoordinator {
    formatter: Box<dyn OutputFormatter>,
}

impl OutputCoordinator {
    pub fn new(formatter: Box<dyn OutputFormatter>) -> Self {
        Self { formatter }
    }

    /// Banner printed before a plan starts
    pub fn display_plan(&self, plan: &TestPlan, base_url: &str) -> Result<String> {
        let mut output = self.formatter.format_header(&format!("Load test plan: {}", plan.name))?;
        output.push_str("\n\n");
        output.push_str(&self.formatter.format_plan(plan, base_url)?);
        Ok(output)
    }

    /// Every built-in plan, for `--list-plans`
    pub fn display_plans(&self, base_url: &str) -> Result<String> {
        let mut sections = vec![self.formatter.format_header("Available plans")?];
        for name in TestPlan::available() {
            sections.push(self.formatter.format_plan(&TestPlan::by_name(name)?, base_url)?);
        }
        Ok(sections.join("\n\n"))
    }

    /// End-of-test summary
    pub fn display_report(&self, report: &RunReport) -> Result<String> {
        self.formatter.format_summary(report)
    }
}

/// Summary of a finished warmup run shared by the output tests
#[cfg(test)]
pub(crate) fn test_report() -> RunReport {
    use crate::models::{
        CheckOutcome, EndpointSummary, RequestTotals, ScenarioOutcome, StopReason, ThresholdOutcome, TrendStats,
    };
    use std::collections::BTreeMap;

    let trend = |avg: f64, p99: f64| TrendStats {
        count: 200,
        min: avg / 2.0,
        max: p99 * 1.2,
        avg,
        med: avg,
        p90: p99 * 0.8,
        p95: p99 * 0.9,
        p99,
    };
    let check = |tag: &str, passes: u64, fails: u64| CheckOutcome {
        name: "status was 200".to_string(),
        tag: tag.to_string(),
        passes,
        fails,
    };
    let threshold = |tag: &str, observed: f64| ThresholdOutcome {
        selector: format!("http_req_duration{{books:{}}}", tag),
        expression: "p(99) < 1000".to_string(),
        observed: Some(observed),
        passed: observed < 1000.0,
    };

    let mut endpoints = BTreeMap::new();
    endpoints.insert(
        "list-books".to_string(),
        EndpointSummary {
            tag: "list-books".to_string(),
            path: "/books".to_string(),
            http_reqs: 200,
            failed_reqs: 0,
            http_req_duration: trend(12.0, 45.0),
        },
    );
    endpoints.insert(
        "new-books".to_string(),
        EndpointSummary {
            tag: "new-books".to_string(),
            path: "/new-books".to_string(),
            http_reqs: 200,
            failed_reqs: 10,
            http_req_duration: trend(20.0, 80.0),
        },
    );

    let started_at = chrono::Utc::now();
    RunReport {
        run_id: "3f2b7c1e-0000-4000-8000-000000000000".to_string(),
        plan: "warmup".to_string(),
        base_url: "http://localhost:8080".to_string(),
        started_at,
        completed_at: started_at + chrono::Duration::milliseconds(3200),
        duration_ms: 3200.0,
        interrupted: false,
        scenarios: vec![ScenarioOutcome {
            name: "warmup".to_string(),
            exec: "default".to_string(),
            vus: 10,
            planned_iterations: 200,
            completed_iterations: 200,
            interrupted_iterations: 0,
            duration_ms: 3200.0,
            stop_reason: StopReason::Completed,
        }],
        checks: vec![check("list-books", 200, 0), check("new-books", 190, 10)],
        thresholds: vec![threshold("list-books", 45.0), threshold("new-books", 80.0)],
        endpoints,
        totals: RequestTotals {
            http_reqs: 400,
            failed_reqs: 10,
            iterations: 200,
            interrupted_iterations: 0,
            http_req_duration: TrendStats {
                count: 400,
                ..trend(16.0, 78.0)
            },
        },
    }
}
