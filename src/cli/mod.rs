//! Command-line interface module with topic help

pub mod help;

pub use help::{HelpSystem, HELP_TOPICS};

use crate::output::ColoredFormatter;
use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// Books Load Tester - load-testing scenarios for the books service
#[derive(Parser, Debug, Clone)]
#[command(name = "blt")]
#[command(about, long_about = None)]
#[command(disable_version_flag = true)]
pub struct Cli {
    /// Plan to run (warmup, main)
    #[arg(short, long, value_name = "NAME")]
    pub plan: Option<String>,

    /// Base URL of the books service
    #[arg(short, long, value_name = "URL")]
    pub base_url: Option<String>,

    /// Replace the VU count of every scenario
    #[arg(long, value_name = "N")]
    pub vus: Option<u32>,

    /// Replace the per-VU iteration count of every scenario
    #[arg(long, value_name = "N")]
    pub iterations: Option<u32>,

    /// Replace the max duration of every scenario (e.g. 30s, 1m30s)
    #[arg(long, value_name = "DURATION", value_parser = parse_duration_literal)]
    pub max_duration: Option<String>,

    /// Per-request timeout in seconds
    #[arg(short, long, value_name = "SECONDS", value_parser = parse_timeout)]
    pub timeout: Option<u64>,

    /// Extra threshold as SELECTOR=EXPR[;EXPR] (can be used multiple times)
    #[arg(long = "threshold", value_name = "SELECTOR=EXPR", action = ArgAction::Append)]
    pub thresholds: Vec<String>,

    /// Write the end-of-test summary as JSON to this path
    #[arg(long, value_name = "PATH")]
    pub summary_export: Option<PathBuf>,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Enable verbose output
    #[arg(long)]
    pub verbose: bool,

    /// Enable debug output
    #[arg(long)]
    pub debug: bool,

    /// Do not print the end-of-test summary
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// List the built-in plans and exit
    #[arg(long)]
    pub list_plans: bool,

    /// Show help for specific topic (plans, config, thresholds, examples)
    #[arg(long, value_name = "TOPIC")]
    pub help_topic: Option<String>,

    /// Print version information
    #[arg(short = 'V', long)]
    pub version: bool,
}

impl Cli {
    pub fn should_show_topic_help(&self) -> bool {
        self.help_topic.is_some()
    }

    /// Check if colors should be enabled
    pub fn use_colors(&self) -> bool {
        !self.no_color && ColoredFormatter::supports_color()
    }

    /// Display help for the specified topic or main help
    pub fn display_help(&self) -> String {
        let help_system = HelpSystem::new();
        let use_colors = self.use_colors();

        match &self.help_topic {
            Some(topic) => help_system.display_topic_help(topic, use_colors).unwrap_or_else(|| {
                format!(
                    "Unknown help topic: '{}'\n\nAvailable topics: {}\n\n{}",
                    topic,
                    HELP_TOPICS.join(", "),
                    help_system.display_main_help(use_colors)
                )
            }),
            None => help_system.display_main_help(use_colors),
        }
    }
}

/// Validate a duration literal, keeping it as written
fn parse_duration_literal(s: &str) -> Result<String, String> {
    crate::scenario::parse_duration(s)
        .map(|_| s.to_string())
        .map_err(|e| e.to_string())
}

/// Parse a request timeout in whole seconds
fn parse_timeout(s: &str) -> Result<u64, String> {
    if s.starts_with('+') || s.starts_with("0x") || s.starts_with("0X") {
        return Err(format!("Invalid timeout: {}", s));
    }

    let max = crate::defaults::MAX_REQUEST_TIMEOUT_SECS;
    s.parse::<u64>()
        .map_err(|_| format!("Invalid timeout: {}", s))
        .and_then(|secs| {
            if secs == 0 {
                Err("Timeout must be greater than 0".to_string())
            } else if secs > max {
                Err(format!("Timeout cannot exceed {} seconds", max))
            } else {
                Ok(secs)
            }
        })
}
