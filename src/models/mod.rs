//! Data models for the books load tester

pub mod config;
pub mod metrics;

pub use config::Config;
pub use metrics::{
    CheckOutcome, CheckRecord, EndpointSummary, RequestSample, RequestTotals, RunReport,
    ScenarioOutcome, StopReason, ThresholdOutcome, TrendStats,
};
