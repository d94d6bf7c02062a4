//! Core formatting traits and the plain text implementation
//!
//! The end-of-test summary is built from sections (scenarios, checks,
//! thresholds, metrics), each rendered by an [`OutputFormatter`].

use crate::{
    error::{AppError, Result},
    models::{CheckOutcome, EndpointSummary, RunReport, ScenarioOutcome, StopReason, ThresholdOutcome, TrendStats},
    scenario::{format_duration, TestPlan},
};
use std::fmt::Write as _;

/// Main trait for output formatting
pub trait OutputFormatter {
    /// Format a header section
    fn format_header(&self, title: &str) -> Result<String>;

    /// Describe a plan before it runs (or for `--list-plans`)
    fn format_plan(&self, plan: &TestPlan, base_url: &str) -> Result<String>;

    /// Progress of every scenario
    fn format_scenarios(&self, scenarios: &[ScenarioOutcome]) -> Result<String>;

    /// Check pass/fail counts per tag
    fn format_checks(&self, checks: &[CheckOutcome]) -> Result<String>;

    /// Threshold results with observed values
    fn format_thresholds(&self, thresholds: &[ThresholdOutcome]) -> Result<String>;

    /// Per-endpoint trends and run totals
    fn format_metrics(&self, report: &RunReport) -> Result<String>;

    fn format_error(&self, error: &str) -> Result<String>;

    fn format_warning(&self, warning: &str) -> Result<String>;

    fn format_success(&self, message: &str) -> Result<String>;

    /// Full end-of-test summary
    fn format_summary(&self, report: &RunReport) -> Result<String> {
        let mut sections = vec![
            self.format_header(&format!("Summary: plan '{}' against {}", report.plan, report.base_url))?,
            self.format_scenarios(&report.scenarios)?,
            self.format_checks(&report.checks)?,
            self.format_thresholds(&report.thresholds)?,
            self.format_metrics(report)?,
        ];

        if report.interrupted {
            sections.push(self.format_warning("Run was interrupted; results are partial")?);
        }

        let failed = report.failed_thresholds();
        if failed.is_empty() {
            sections.push(self.format_success("All thresholds passed")?);
        } else {
            sections.push(self.format_error(&format!("{} of {} thresholds crossed", failed.len(), report.thresholds.len()))?);
        }

        Ok(sections.join("\n\n"))
    }
}

/// Configuration options for formatting
#[derive(Debug, Clone)]
pub struct FormattingOptions {
    pub enable_color: bool,
    /// Show every trend statistic instead of avg/p(95)/p(99) only
    pub verbose_mode: bool,
    pub table_borders: bool,
    pub max_width: usize,
}

impl Default for FormattingOptions {
    fn default() -> Self {
        Self {
            enable_color: true,
            verbose_mode: false,
            table_borders: true,
            max_width: 120,
        }
    }
}

/// Table formatting configuration
#[derive(Debug, Clone)]
pub struct TableFormat {
    pub columns: Vec<Column>,
    pub show_borders: bool,
    pub show_header: bool,
    pub min_column_width: usize,
    pub max_column_width: usize,
}

/// Column definition for table formatting
#[derive(Debug, Clone)]
pub struct Column {
    pub header: String,
    pub alignment: Alignment,
    pub min_width: usize,
    pub max_width: usize,
}

impl Column {
    fn left(header: &str, min_width: usize, max_width: usize) -> Self {
        Self {
            header: header.to_string(),
            alignment: Alignment::Left,
            min_width,
            max_width,
        }
    }

    fn right(header: &str, width: usize) -> Self {
        Self {
            header: header.to_string(),
            alignment: Alignment::Right,
            min_width: width,
            max_width: width.max(12),
        }
    }
}

/// Text alignment options
#[derive(Debug, Clone)]
pub enum Alignment {
    Left,
    Right,
    Center,
}

/// Row data for table formatting
pub type RowData = Vec<String>;

pub(crate) fn fmt_err(e: std::fmt::Error) -> AppError {
    AppError::internal(format!("Failed to format output: {}", e))
}

/// Human-readable milliseconds: µs below 1ms, seconds above 1s
pub fn format_duration_ms(duration_ms: f64) -> String {
    if duration_ms < 1.0 {
        format!("{:.2}µs", duration_ms * 1000.0)
    } else if duration_ms < 1000.0 {
        format!("{:.2}ms", duration_ms)
    } else if duration_ms < 60000.0 {
        format!("{:.2}s", duration_ms / 1000.0)
    } else {
        let minutes = (duration_ms / 60000.0) as u32;
        let seconds = (duration_ms % 60000.0) / 1000.0;
        format!("{}m{:.1}s", minutes, seconds)
    }
}

/// Percentage of a 0.0..=1.0 fraction
pub fn format_rate(rate: f64) -> String {
    format!("{:.2}%", rate * 100.0)
}

/// Observed threshold value in the unit of its metric
pub fn format_observed(outcome: &ThresholdOutcome) -> String {
    match outcome.observed {
        None => "no data".to_string(),
        Some(value) if outcome.selector.starts_with("http_req_duration") => format_duration_ms(value),
        Some(value) if outcome.selector.starts_with("http_req_failed") || outcome.selector.starts_with("checks") => {
            format_rate(value)
        }
        Some(value) => format!("{}", (value * 1000.0).round() / 1000.0),
    }
}

pub(crate) fn stop_reason_label(reason: StopReason) -> &'static str {
    match reason {
        StopReason::Completed => "completed",
        StopReason::MaxDuration => "max duration reached",
        StopReason::Interrupted => "interrupted",
    }
}

pub(crate) fn check_label(check: &CheckOutcome) -> String {
    format!("{} {{books:{}}}", check.name, check.tag)
}

/// Plan banner lines shared by both formatters
pub(crate) fn plan_lines(plan: &TestPlan, base_url: &str) -> Vec<String> {
    let max_vus: u32 = plan.scenarios.iter().map(|s| s.vus).sum();
    let mut lines = vec![
        format!("     plan: {}", plan.name),
        format!(" base url: {}", base_url),
        format!(
            "scenarios: {} scenario{}, {} max VUs, {} max duration",
            plan.scenarios.len(),
            if plan.scenarios.len() == 1 { "" } else { "s" },
            max_vus,
            format_duration(plan.max_duration())
        ),
    ];
    for scenario in &plan.scenarios {
        lines.push(format!(
            "           * {}: {} iterations for each of {} VUs (maxDuration: {}, exec: {})",
            scenario.name,
            scenario.iterations,
            scenario.vus,
            format_duration(scenario.max_duration),
            scenario.exec.as_str()
        ));
    }
    for threshold in &plan.thresholds {
        lines.push(format!("threshold: {}", threshold));
    }
    lines
}

/// Plain text formatter implementation
pub struct PlainFormatter {
    options: FormattingOptions,
}

impl PlainFormatter {
    pub fn new(options: FormattingOptions) -> Self {
        Self { options }
    }

    /// Create a table with the given format and data
    fn create_table(&self, format: &TableFormat, rows: &[RowData]) -> String {
        if rows.is_empty() {
            return String::new();
        }

        let column_widths = self.calculate_column_widths(format, rows);
        let mut output = String::new();

        if format.show_header && !format.columns.is_empty() {
            if format.show_borders {
                output.push_str(&self.create_horizontal_border(&column_widths));
                output.push('\n');
            }

            let headers: Vec<String> = format.columns.iter().map(|c| c.header.clone()).collect();
            output.push_str(&self.create_row(&headers, &column_widths, format));
            output.push('\n');

            if format.show_borders {
                output.push_str(&self.create_horizontal_border(&column_widths));
                output.push('\n');
            }
        }

        for row in rows {
            output.push_str(&self.create_row(row, &column_widths, format));
            output.push('\n');
        }

        if format.show_borders {
            output.push_str(&self.create_horizontal_border(&column_widths));
        }

        output.trim_end().to_string()
    }

    fn calculate_column_widths(&self, format: &TableFormat, rows: &[RowData]) -> Vec<usize> {
        let num_columns = format
            .columns
            .len()
            .max(rows.iter().map(|r| r.len()).max().unwrap_or(0));

        (0..num_columns)
            .map(|col_idx| {
                let column = format.columns.get(col_idx);
                let mut width = column
                    .map(|c| c.min_width.max(c.header.chars().count()))
                    .unwrap_or(format.min_column_width);

                for row in rows {
                    if let Some(cell) = row.get(col_idx) {
                        width = width.max(cell.chars().count());
                    }
                }

                width.min(column.map(|c| c.max_width).unwrap_or(format.max_column_width))
            })
            .collect()
    }

    fn create_row(&self, data: &[String], widths: &[usize], format: &TableFormat) -> String {
        let mut row = String::new();
        if format.show_borders {
            row.push('|');
        }

        for (idx, (cell, &width)) in data.iter().zip(widths.iter()).enumerate() {
            let alignment = format.columns.get(idx).map(|c| &c.alignment).unwrap_or(&Alignment::Left);
            let padded_cell = self.align_text(cell, width, alignment);

            if format.show_borders {
                row.push(' ');
                row.push_str(&padded_cell);
                row.push_str(" |");
            } else {
                row.push_str(&padded_cell);
                row.push_str("  ");
            }
        }

        row.trim_end().to_string()
    }

    fn create_horizontal_border(&self, widths: &[usize]) -> String {
        let mut border = String::new();
        if !widths.is_empty() {
            border.push('+');
            for &width in widths {
                border.push_str(&"-".repeat(width + 2));
                border.push('+');
            }
        }
        border
    }

    fn align_text(&self, text: &str, width: usize, alignment: &Alignment) -> String {
        let len = text.chars().count();
        if len >= width {
            return text.chars().take(width).collect();
        }

        let padding = width - len;
        match alignment {
            Alignment::Left => format!("{}{}", text, " ".repeat(padding)),
            Alignment::Right => format!("{}{}", " ".repeat(padding), text),
            Alignment::Center => {
                let left_pad = padding / 2;
                format!("{}{}{}", " ".repeat(left_pad), text, " ".repeat(padding - left_pad))
            }
        }
    }

    fn trend_table(&self, endpoints: &[&EndpointSummary], total: Option<(&str, &TrendStats, u64, u64)>) -> String {
        let mut columns = vec![
            Column::left("Endpoint", 10, 30),
            Column::right("Reqs", 6),
            Column::right("Failed", 8),
            Column::right("avg", 9),
        ];
        if self.options.verbose_mode {
            columns.extend([Column::right("min", 9), Column::right("med", 9), Column::right("max", 9), Column::right("p(90)", 9)]);
        }
        columns.extend([Column::right("p(95)", 9), Column::right("p(99)", 9)]);

        let trend_cells = |trend: &TrendStats| -> Vec<String> {
            if trend.is_empty() {
                let blanks = if self.options.verbose_mode { 7 } else { 3 };
                return vec!["-".to_string(); blanks];
            }
            let mut cells = vec![format_duration_ms(trend.avg)];
            if self.options.verbose_mode {
                cells.extend([
                    format_duration_ms(trend.min),
                    format_duration_ms(trend.med),
                    format_duration_ms(trend.max),
                    format_duration_ms(trend.p90),
                ]);
            }
            cells.extend([format_duration_ms(trend.p95), format_duration_ms(trend.p99)]);
            cells
        };

        let mut rows: Vec<RowData> = endpoints
            .iter()
            .map(|endpoint| {
                let mut row = vec![
                    format!("GET {}", endpoint.path),
                    endpoint.http_reqs.to_string(),
                    endpoint.failed_reqs.to_string(),
                ];
                row.extend(trend_cells(&endpoint.http_req_duration));
                row
            })
            .collect();

        if let Some((label, trend, reqs, failed)) = total {
            let mut row = vec![label.to_string(), reqs.to_string(), failed.to_string()];
            row.extend(trend_cells(trend));
            rows.push(row);
        }

        let format = TableFormat {
            columns,
            show_borders: self.options.table_borders,
            show_header: true,
            min_column_width: 6,
            max_column_width: self.options.max_width / 4,
        };
        self.create_table(&format, &rows)
    }
}

impl OutputFormatter for PlainFormatter {
    fn format_header(&self, title: &str) -> Result<String> {
        let mut output = String::new();
        let border = "=".repeat(title.chars().count() + 4);
        writeln!(output, "{}", border).map_err(fmt_err)?;
        writeln!(output, "  {}  ", title).map_err(fmt_err)?;
        write!(output, "{}", border).map_err(fmt_err)?;
        Ok(output)
    }

    fn format_plan(&self, plan: &TestPlan, base_url: &str) -> Result<String> {
        Ok(plan_lines(plan, base_url).join("\n"))
    }

    fn format_scenarios(&self, scenarios: &[ScenarioOutcome]) -> Result<String> {
        let mut output = String::from("Scenarios:");
        for scenario in scenarios {
            write!(
                output,
                "\n  {} [{}]: {}/{} iterations complete, {} interrupted, {} VUs, {}",
                scenario.name,
                stop_reason_label(scenario.stop_reason),
                scenario.completed_iterations,
                scenario.planned_iterations,
                scenario.interrupted_iterations,
                scenario.vus,
                format_duration_ms(scenario.duration_ms)
            )
            .map_err(fmt_err)?;
        }
        Ok(output)
    }

    fn format_checks(&self, checks: &[CheckOutcome]) -> Result<String> {
        let mut output = String::from("Checks:");
        if checks.is_empty() {
            output.push_str("\n  (no checks recorded)");
        }
        for check in checks {
            write!(
                output,
                "\n  {} {}: {} passed, {} failed ({})",
                if check.all_passed() { "✓" } else { "✗" },
                check_label(check),
                check.passes,
                check.fails,
                format_rate(check.pass_rate())
            )
            .map_err(fmt_err)?;
        }
        Ok(output)
    }

    fn format_thresholds(&self, thresholds: &[ThresholdOutcome]) -> Result<String> {
        let mut output = String::from("Thresholds:");
        if thresholds.is_empty() {
            output.push_str("\n  (none)");
        }
        for threshold in thresholds {
            write!(
                output,
                "\n  {} {}: {} (observed: {})",
                if threshold.passed { "✓" } else { "✗" },
                threshold.selector,
                threshold.expression,
                format_observed(threshold)
            )
            .map_err(fmt_err)?;
        }
        Ok(output)
    }

    fn format_metrics(&self, report: &RunReport) -> Result<String> {
        let mut output = String::from("http_req_duration:\n");
        let endpoints: Vec<&EndpointSummary> = report.endpoints.values().collect();
        let totals = &report.totals;
        output.push_str(&self.trend_table(
            &endpoints,
            Some(("total", &totals.http_req_duration, totals.http_reqs, totals.failed_reqs)),
        ));

        write!(
            output,
            "\n\nhttp_reqs: {}\nhttp_req_failed: {} ({} of {})\niterations: {} ({} interrupted)\nchecks: {}",
            totals.http_reqs,
            format_rate(totals.failed_rate()),
            totals.failed_reqs,
            totals.http_reqs,
            totals.iterations,
            totals.interrupted_iterations,
            format_rate(report.checks_pass_rate())
        )
        .map_err(fmt_err)?;
        Ok(output)
    }

    fn format_error(&self, error: &str) -> Result<String> {
        Ok(format!("ERROR: {}", error))
    }

    fn format_warning(&self, warning: &str) -> Result<String> {
        Ok(format!("WARNING: {}", warning))
    }

    fn format_success(&self, message: &str) -> Result<String> {
        Ok(format!("OK: {}", message))
    }
}
