//! Pass/fail bounds on aggregated metrics
//!
//! A threshold couples a metric selector such as
//! `http_req_duration{books: "list-books"}` with one or more conditions
//! such as `p(99) < 1000`. Thresholds are evaluated once, after every
//! scenario of a plan has stopped.

use crate::{
    error::{AppError, Result},
    models::ThresholdOutcome,
    stats::{percentile, MetricsSnapshot},
};
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Built-in metrics that thresholds can reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricName {
    /// Request duration trend in milliseconds
    HttpReqDuration,
    /// Number of requests
    HttpReqs,
    /// Fraction of requests without a 200 response
    HttpReqFailed,
    /// Fraction of passing checks
    Checks,
    /// Number of completed iterations
    Iterations,
}

/// How a metric aggregates its samples
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Trend,
    Counter,
    Rate,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::HttpReqDuration => "http_req_duration",
            MetricName::HttpReqs => "http_reqs",
            MetricName::HttpReqFailed => "http_req_failed",
            MetricName::Checks => "checks",
            MetricName::Iterations => "iterations",
        }
    }

    pub fn kind(&self) -> MetricKind {
        match self {
            MetricName::HttpReqDuration => MetricKind::Trend,
            MetricName::HttpReqs | MetricName::Iterations => MetricKind::Counter,
            MetricName::HttpReqFailed | MetricName::Checks => MetricKind::Rate,
        }
    }
}

impl FromStr for MetricName {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "http_req_duration" => Ok(MetricName::HttpReqDuration),
            "http_reqs" => Ok(MetricName::HttpReqs),
            "http_req_failed" => Ok(MetricName::HttpReqFailed),
            "checks" => Ok(MetricName::Checks),
            "iterations" => Ok(MetricName::Iterations),
            other => Err(AppError::parse(format!("Unknown metric '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Aggregation {
    Avg,
    Min,
    Max,
    Med,
    Percentile(f64),
    Count,
    Rate,
}

impl Aggregation {
    fn supported_by(&self, kind: MetricKind) -> bool {
        match kind {
            MetricKind::Trend => !matches!(self, Aggregation::Rate),
            MetricKind::Counter => matches!(self, Aggregation::Count | Aggregation::Rate),
            MetricKind::Rate => matches!(self, Aggregation::Rate),
        }
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Aggregation::Avg => write!(f, "avg"),
            Aggregation::Min => write!(f, "min"),
            Aggregation::Max => write!(f, "max"),
            Aggregation::Med => write!(f, "med"),
            Aggregation::Percentile(p) => write!(f, "p({})", p),
            Aggregation::Count => write!(f, "count"),
            Aggregation::Rate => write!(f, "rate"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl Operator {
    pub fn apply(&self, observed: f64, bound: f64) -> bool {
        match self {
            Operator::Lt => observed < bound,
            Operator::Le => observed <= bound,
            Operator::Gt => observed > bound,
            Operator::Ge => observed >= bound,
            Operator::Eq => observed == bound,
            Operator::Ne => observed != bound,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
            Operator::Eq => "==",
            Operator::Ne => "!=",
        }
    }
}

impl FromStr for Operator {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "<" => Ok(Operator::Lt),
            "<=" => Ok(Operator::Le),
            ">" => Ok(Operator::Gt),
            ">=" => Ok(Operator::Ge),
            "==" => Ok(Operator::Eq),
            "!=" => Ok(Operator::Ne),
            other => Err(AppError::parse(format!("Unknown operator '{}'", other))),
        }
    }
}

/// One `<aggregation> <operator> <value>` expression
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdCondition {
    pub aggregation: Aggregation,
    pub operator: Operator,
    pub value: f64,
}

impl ThresholdCondition {
    pub fn new(aggregation: Aggregation, operator: Operator, value: f64) -> Self {
        Self { aggregation, operator, value }
    }
}

impl fmt::Display for ThresholdCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.aggregation, self.operator.as_str(), self.value)
    }
}

impl FromStr for ThresholdCondition {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        let pattern = Regex::new(
            r"^(avg|min|max|med|count|rate|p\(\s*(\d+(?:\.\d+)?)\s*\))\s*(<=|>=|==|!=|<|>)\s*(-?\d+(?:\.\d+)?)$",
        )
        .map_err(|e| AppError::internal(format!("Invalid threshold pattern: {}", e)))?;

        let expression = s.trim();
        let captures = pattern
            .captures(expression)
            .ok_or_else(|| AppError::parse(format!("Invalid threshold expression '{}'", expression)))?;

        let aggregation = match &captures[1] {
            "avg" => Aggregation::Avg,
            "min" => Aggregation::Min,
            "max" => Aggregation::Max,
            "med" => Aggregation::Med,
            "count" => Aggregation::Count,
            "rate" => Aggregation::Rate,
            _ => {
                let p: f64 = captures[2].parse()?;
                if p > 100.0 {
                    return Err(AppError::parse(format!(
                        "Percentile must be between 0 and 100 in '{}'",
                        expression
                    )));
                }
                Aggregation::Percentile(p)
            }
        };

        let operator: Operator = captures[3].parse()?;
        let value: f64 = captures[4].parse()?;

        Ok(Self::new(aggregation, operator, value))
    }
}

/// A metric selector with the conditions it must satisfy
#[derive(Debug, Clone, PartialEq)]
pub struct Threshold {
    pub metric: MetricName,
    pub tags: BTreeMap<String, String>,
    pub conditions: Vec<ThresholdCondition>,
}

impl Threshold {
    pub fn new(metric: MetricName) -> Self {
        Self {
            metric,
            tags: BTreeMap::new(),
            conditions: Vec::new(),
        }
    }

    pub fn with_tag(mut self, key: &str, value: &str) -> Self {
        self.tags.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_condition(mut self, condition: ThresholdCondition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Parse a selector like `http_req_duration{books: "list-books"}` and its expressions
    pub fn parse(selector: &str, expressions: &[&str]) -> Result<Self> {
        let pattern = Regex::new(r"^([a-z_]+)\s*(?:\{(.*)\})?$")
            .map_err(|e| AppError::internal(format!("Invalid selector pattern: {}", e)))?;

        let selector = selector.trim();
        let captures = pattern
            .captures(selector)
            .ok_or_else(|| AppError::parse(format!("Invalid metric selector '{}'", selector)))?;

        let mut threshold = Threshold::new(captures[1].parse()?);

        if let Some(body) = captures.get(2) {
            for pair in body.as_str().split(',').filter(|p| !p.trim().is_empty()) {
                let (key, value) = pair.split_once(':').ok_or_else(|| {
                    AppError::parse(format!("Tag filter '{}' must look like key: \"value\"", pair.trim()))
                })?;
                let key = key.trim().trim_matches(|c| c == '"' || c == '\'');
                let value = value.trim().trim_matches(|c| c == '"' || c == '\'');
                if key.is_empty() || value.is_empty() {
                    return Err(AppError::parse(format!("Empty tag filter in '{}'", selector)));
                }
                threshold = threshold.with_tag(key, value);
            }
        }

        for expression in expressions {
            threshold = threshold.with_condition(expression.parse()?);
        }

        threshold.validate()?;
        Ok(threshold)
    }

    /// Parse the command-line form `SELECTOR=EXPR[;EXPR...]`
    pub fn from_assignment(assignment: &str) -> Result<Self> {
        let (selector, expressions) = assignment.split_once('=').ok_or_else(|| {
            AppError::parse(format!(
                "Threshold '{}' must look like metric{{tag:value}}=expression",
                assignment
            ))
        })?;
        let expressions: Vec<&str> = expressions.split(';').collect();
        Self::parse(selector, &expressions)
    }

    /// Check every condition aggregates the metric in a supported way
    pub fn validate(&self) -> Result<()> {
        if self.conditions.is_empty() {
            return Err(AppError::validation(format!(
                "Threshold on {} has no expressions",
                self.selector()
            )));
        }

        for condition in &self.conditions {
            if !condition.aggregation.supported_by(self.metric.kind()) {
                return Err(AppError::validation(format!(
                    "Aggregation '{}' is not available for metric {}",
                    condition.aggregation,
                    self.metric.as_str()
                )));
            }
        }

        Ok(())
    }

    /// Canonical selector text, e.g. `http_req_duration{books:list-books}`
    pub fn selector(&self) -> String {
        if self.tags.is_empty() {
            return self.metric.as_str().to_string();
        }
        let tags: Vec<String> = self.tags.iter().map(|(k, v)| format!("{}:{}", k, v)).collect();
        format!("{}{{{}}}", self.metric.as_str(), tags.join(","))
    }

    /// Evaluate every condition against the recorded metrics
    pub fn evaluate(&self, snapshot: &MetricsSnapshot) -> Vec<ThresholdOutcome> {
        let selector = self.selector();
        self.conditions
            .iter()
            .map(|condition| {
                let observed = self.observe(condition.aggregation, snapshot);
                // Nothing recorded means nothing crossed the bound
                let passed = observed.map_or(true, |value| condition.operator.apply(value, condition.value));
                ThresholdOutcome {
                    selector: selector.clone(),
                    expression: condition.to_string(),
                    observed,
                    passed,
                }
            })
            .collect()
    }

    fn observe(&self, aggregation: Aggregation, snapshot: &MetricsSnapshot) -> Option<f64> {
        match self.metric {
            MetricName::HttpReqDuration => {
                let mut values = snapshot.durations_ms(&self.tags);
                if values.is_empty() {
                    return None;
                }
                values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
                let value = match aggregation {
                    Aggregation::Avg => values.iter().sum::<f64>() / values.len() as f64,
                    Aggregation::Min => values[0],
                    Aggregation::Max => values[values.len() - 1],
                    Aggregation::Med => percentile(&values, 50.0),
                    Aggregation::Percentile(p) => percentile(&values, p),
                    Aggregation::Count => values.len() as f64,
                    Aggregation::Rate => return None,
                };
                Some(value)
            }
            MetricName::HttpReqs | MetricName::Iterations => {
                let count = if self.metric == MetricName::HttpReqs {
                    snapshot.request_count(&self.tags)
                } else {
                    snapshot.iteration_count(&self.tags)
                };
                match aggregation {
                    Aggregation::Count => Some(count as f64),
                    Aggregation::Rate => {
                        let secs = snapshot.elapsed.as_secs_f64();
                        (secs > 0.0).then(|| count as f64 / secs)
                    }
                    _ => None,
                }
            }
            MetricName::HttpReqFailed => {
                let total = snapshot.request_count(&self.tags);
                (total > 0).then(|| snapshot.failed_count(&self.tags) as f64 / total as f64)
            }
            MetricName::Checks => {
                let (passes, fails) = snapshot.check_counts(&self.tags);
                let total = passes + fails;
                (total > 0).then(|| passes as f64 / total as f64)
            }
        }
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let conditions: Vec<String> = self.conditions.iter().map(|c| c.to_string()).collect();
        write!(f, "{}: [{}]", self.selector(), conditions.join(", "))
    }
}
