//! Colored formatter implementation with terminal color support
//!
//! Latencies are colored by [`PerformanceLevel`], check and threshold
//! marks by pass/fail, and trends are printed one line per endpoint.

use crate::{
    error::Result,
    models::{CheckOutcome, RunReport, ScenarioOutcome, StopReason, ThresholdOutcome, TrendStats},
    scenario::TestPlan,
};
use super::formatter::{
    check_label, fmt_err, format_duration_ms, format_observed, format_rate, plan_lines, stop_reason_label,
    FormattingOptions, OutputFormatter,
};
use colored::*;
use std::fmt::Write as _;

/// Performance level classification for color coding
#[derive(Debug, Clone, PartialEq)]
pub enum PerformanceLevel {
    Excellent,  // < 50ms
    Good,       // 50-100ms
    Fair,       // 100-300ms
    Poor,       // 300-1000ms
    VeryPoor,   // >= 1000ms, over the default latency bound
}

impl PerformanceLevel {
    /// Determine performance level from response time in milliseconds
    pub fn from_response_time(time_ms: f64) -> Self {
        if time_ms < 50.0 {
            Self::Excellent
        } else if time_ms < 100.0 {
            Self::Good
        } else if time_ms < 300.0 {
            Self::Fair
        } else if time_ms < 1000.0 {
            Self::Poor
        } else {
            Self::VeryPoor
        }
    }

    pub fn color(&self) -> Color {
        match self {
            Self::Excellent => Color::Green,
            Self::Good => Color::Cyan,
            Self::Fair => Color::Yellow,
            Self::Poor => Color::Magenta,
            Self::VeryPoor => Color::Red,
        }
    }
}

/// Color scheme configuration
#[derive(Debug, Clone)]
pub struct ColorScheme {
    pub header: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub info: Color,
    pub muted: Color,
    pub border: Color,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            header: Color::Blue,
            success: Color::Green,
            warning: Color::Yellow,
            error: Color::Red,
            info: Color::Cyan,
            muted: Color::BrightBlack,
            border: Color::BrightBlack,
        }
    }
}

/// Colored formatter implementation
pub struct ColoredFormatter {
    options: FormattingOptions,
    color_scheme: ColorScheme,
}

impl ColoredFormatter {
    pub fn new(options: FormattingOptions) -> Self {
        Self {
            options,
            color_scheme: ColorScheme::default(),
        }
    }

    pub fn with_color_scheme(options: FormattingOptions, color_scheme: ColorScheme) -> Self {
        Self { options, color_scheme }
    }

    /// Whether the environment allows ANSI colors
    ///
    /// `NO_COLOR` disables colors, `FORCE_COLOR` enables them even on a
    /// dumb terminal.
    pub fn supports_color() -> bool {
        color_support_from(
            std::env::var("NO_COLOR").ok(),
            std::env::var("FORCE_COLOR").ok(),
            std::env::var("TERM").ok(),
        )
    }

    /// Enable or disable colors at runtime
    pub fn set_colors_enabled(&mut self, enabled: bool) {
        self.options.enable_color = enabled && Self::supports_color();
    }

    fn colorize(&self, text: &str, color: Color) -> ColoredString {
        if self.options.enable_color {
            text.color(color)
        } else {
            text.normal()
        }
    }

    fn bold(&self, text: &str) -> ColoredString {
        if self.options.enable_color {
            text.bold()
        } else {
            text.normal()
        }
    }

    fn dimmed(&self, text: &str) -> ColoredString {
        if self.options.enable_color {
            text.dimmed()
        } else {
            text.normal()
        }
    }

    fn mark(&self, passed: bool) -> ColoredString {
        if passed {
            self.colorize("✓", self.color_scheme.success)
        } else {
            self.colorize("✗", self.color_scheme.error)
        }
    }

    fn format_duration_colored(&self, duration_ms: f64) -> ColoredString {
        let performance = PerformanceLevel::from_response_time(duration_ms);
        self.colorize(&format_duration_ms(duration_ms), performance.color())
    }

    /// Pass rates: green at 100%, yellow from 95%, red below
    fn format_rate_colored(&self, rate: f64) -> ColoredString {
        let color = if rate >= 1.0 {
            self.color_scheme.success
        } else if rate >= 0.95 {
            self.color_scheme.warning
        } else {
            self.color_scheme.error
        };
        self.colorize(&format_rate(rate), color)
    }

    fn create_section_header(&self, title: &str) -> String {
        if self.options.enable_color {
            title.bold().color(self.color_scheme.header).to_string()
        } else {
            title.to_string()
        }
    }

    /// Name padded with dots to a fixed column, k6 style
    fn dotted(&self, name: &str, width: usize) -> String {
        let dots = width.saturating_sub(name.chars().count() + 1).max(1);
        format!("{} {}", name, self.dimmed(&".".repeat(dots)))
    }

    fn trend_line(&self, trend: &TrendStats) -> String {
        if trend.is_empty() {
            return self.dimmed("no responses").to_string();
        }

        let mut parts = vec![("avg", trend.avg)];
        if self.options.verbose_mode {
            parts.extend([("min", trend.min), ("med", trend.med), ("max", trend.max), ("p(90)", trend.p90)]);
        }
        parts.extend([("p(95)", trend.p95), ("p(99)", trend.p99)]);

        parts
            .into_iter()
            .map(|(label, value)| format!("{}={}", label, self.format_duration_colored(value)))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Color decision from the raw environment values
fn color_support_from(no_color: Option<String>, force_color: Option<String>, term: Option<String>) -> bool {
    if no_color.is_some() {
        return false;
    }
    if force_color.is_some_and(|v| v != "0") {
        return true;
    }
    term.map(|term| term != "dumb").unwrap_or(true)
}

impl OutputFormatter for ColoredFormatter {
    fn format_header(&self, title: &str) -> Result<String> {
        let mut output = String::new();
        let border = "═".repeat(title.chars().count() + 4);

        writeln!(output, "{}", self.colorize(&border, self.color_scheme.border)).map_err(fmt_err)?;
        writeln!(output, "  {}  ", self.create_section_header(title)).map_err(fmt_err)?;
        write!(output, "{}", self.colorize(&border, self.color_scheme.border)).map_err(fmt_err)?;

        Ok(output)
    }

    fn format_plan(&self, plan: &TestPlan, base_url: &str) -> Result<String> {
        let lines = plan_lines(plan, base_url);
        let mut output = String::new();
        for (idx, line) in lines.iter().enumerate() {
            if idx > 0 {
                output.push('\n');
            }
            match line.split_once(": ") {
                Some((label, rest)) if !label.trim_start().starts_with('*') => {
                    write!(output, "{}: {}", self.dimmed(label), self.colorize(rest, self.color_scheme.info))
                        .map_err(fmt_err)?;
                }
                _ => output.push_str(line),
            }
        }
        Ok(output)
    }

    fn format_scenarios(&self, scenarios: &[ScenarioOutcome]) -> Result<String> {
        let mut output = self.create_section_header("Scenarios");
        for scenario in scenarios {
            let reason_color = match scenario.stop_reason {
                StopReason::Completed => self.color_scheme.success,
                StopReason::MaxDuration => self.color_scheme.warning,
                StopReason::Interrupted => self.color_scheme.error,
            };
            write!(
                output,
                "\n  {} {}/{} iterations, {} interrupted, {} VUs, {} [{}]",
                self.dotted(&scenario.name, 24),
                scenario.completed_iterations,
                scenario.planned_iterations,
                scenario.interrupted_iterations,
                scenario.vus,
                format_duration_ms(scenario.duration_ms),
                self.colorize(stop_reason_label(scenario.stop_reason), reason_color)
            )
            .map_err(fmt_err)?;
        }
        Ok(output)
    }

    fn format_checks(&self, checks: &[CheckOutcome]) -> Result<String> {
        let mut output = self.create_section_header("Checks");
        if checks.is_empty() {
            write!(output, "\n  {}", self.dimmed("no checks recorded")).map_err(fmt_err)?;
        }
        for check in checks {
            write!(
                output,
                "\n  {} {} {} ✓ {} ✗ {}",
                self.mark(check.all_passed()),
                self.dotted(&check_label(check), 44),
                self.format_rate_colored(check.pass_rate()),
                check.passes,
                check.fails
            )
            .map_err(fmt_err)?;
        }
        Ok(output)
    }

    fn format_thresholds(&self, thresholds: &[ThresholdOutcome]) -> Result<String> {
        let mut output = self.create_section_header("Thresholds");
        if thresholds.is_empty() {
            write!(output, "\n  {}", self.dimmed("none")).map_err(fmt_err)?;
        }
        for threshold in thresholds {
            let observed = format_observed(threshold);
            let observed = if threshold.observed.is_none() {
                self.dimmed(&observed)
            } else if threshold.passed {
                self.colorize(&observed, self.color_scheme.success)
            } else {
                self.colorize(&observed, self.color_scheme.error)
            };
            write!(
                output,
                "\n  {} {} '{}' observed {}",
                self.mark(threshold.passed),
                self.bold(&threshold.selector),
                threshold.expression,
                observed
            )
            .map_err(fmt_err)?;
        }
        Ok(output)
    }

    fn format_metrics(&self, report: &RunReport) -> Result<String> {
        let mut output = self.create_section_header("Metrics");
        let totals = &report.totals;

        write!(
            output,
            "\n  {} {}",
            self.dotted("http_req_duration", 44),
            self.trend_line(&totals.http_req_duration)
        )
        .map_err(fmt_err)?;
        for endpoint in report.endpoints.values() {
            write!(
                output,
                "\n    {} {}",
                self.dotted(&format!("{{books:{}}}", endpoint.tag), 42),
                self.trend_line(&endpoint.http_req_duration)
            )
            .map_err(fmt_err)?;
        }

        let failed_color = if totals.failed_reqs == 0 {
            self.color_scheme.success
        } else {
            self.color_scheme.error
        };
        write!(
            output,
            "\n  {} {} {} of {}",
            self.dotted("http_req_failed", 44),
            self.colorize(&format_rate(totals.failed_rate()), failed_color),
            totals.failed_reqs,
            totals.http_reqs
        )
        .map_err(fmt_err)?;
        write!(output, "\n  {} {}", self.dotted("http_reqs", 44), totals.http_reqs).map_err(fmt_err)?;
        write!(
            output,
            "\n  {} {} ({} interrupted)",
            self.dotted("iterations", 44),
            totals.iterations,
            totals.interrupted_iterations
        )
        .map_err(fmt_err)?;
        write!(
            output,
            "\n  {} {}",
            self.dotted("checks", 44),
            self.format_rate_colored(report.checks_pass_rate())
        )
        .map_err(fmt_err)?;

        Ok(output)
    }

    fn format_error(&self, error: &str) -> Result<String> {
        Ok(format!("{} {}", self.colorize("✗", self.color_scheme.error), self.colorize(error, self.color_scheme.error)))
    }

    fn format_warning(&self, warning: &str) -> Result<String> {
        Ok(format!("{} {}", self.colorize("!", self.color_scheme.warning), self.colorize(warning, self.color_scheme.warning)))
    }

    fn format_success(&self, message: &str) -> Result<String> {
        Ok(format!("{} {}", self.colorize("✓", self.color_scheme.success), self.colorize(message, self.color_scheme.success)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::test_report;

    fn uncolored() -> ColoredFormatter {
        ColoredFormatter::new(FormattingOptions {
            enable_color: false,
            ..Default::default()
        })
    }

    #[test]
    fn test_performance_levels() {
        assert_eq!(PerformanceLevel::from_response_time(10.0), PerformanceLevel::Excellent);
        assert_eq!(PerformanceLevel::from_response_time(75.0), PerformanceLevel::Good);
        assert_eq!(PerformanceLevel::from_response_time(999.9), PerformanceLevel::Poor);
        assert_eq!(PerformanceLevel::from_response_time(1000.0), PerformanceLevel::VeryPoor);
    }

    #[test]
    fn test_color_support_from_environment() {
        assert!(color_support_from(None, None, None));
        assert!(color_support_from(None, None, Some("xterm-256color".to_string())));
        assert!(!color_support_from(None, None, Some("dumb".to_string())));
        assert!(!color_support_from(Some(String::new()), Some("1".to_string()), None));
        assert!(color_support_from(None, Some("1".to_string()), Some("dumb".to_string())));
        assert!(!color_support_from(None, Some("0".to_string()), Some("dumb".to_string())));
    }

    #[test]
    fn test_summary_without_colors_has_no_escape_codes() {
        let output = uncolored().format_summary(&test_report()).unwrap();
        assert!(!output.contains("\x1b["));
        assert!(output.contains("✗ status was 200 {books:new-books}"));
        assert!(output.contains("http_req_failed"));
        assert!(output.contains("2.50% 10 of 400"));
        assert!(output.contains("{books:list-books}"));
    }

    #[test]
    fn test_verbose_trend_line_includes_every_statistic() {
        let formatter = ColoredFormatter::new(FormattingOptions {
            enable_color: false,
            verbose_mode: true,
            ..Default::default()
        });
        let line = formatter.trend_line(&test_report().totals.http_req_duration);
        for label in ["avg=", "min=", "med=", "max=", "p(90)=", "p(95)=", "p(99)="] {
            assert!(line.contains(label), "missing {} in {}", label, line);
        }
        assert!(!uncolored().trend_line(&test_report().totals.http_req_duration).contains("min="));
    }

    #[test]
    fn test_missing_observation_is_reported() {
        let mut report = test_report();
        report.thresholds[1].observed = None;
        let output = uncolored().format_thresholds(&report.thresholds).unwrap();
        assert!(output.contains("observed no data"));
    }
}
