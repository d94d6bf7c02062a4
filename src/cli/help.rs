//! Command-line help system with examples and topic pages

use crate::{
    config::env::EnvManager,
    scenario::{format_duration, TestPlan},
};
use colored::*;

/// Topics accepted by `--help-topic`
pub const HELP_TOPICS: &[&str] = &["plans", "config", "thresholds", "examples"];

/// Help text for the CLI application
pub struct HelpSystem;

impl HelpSystem {
    pub fn new() -> Self {
        Self
    }

    /// Main help: usage, options, examples, environment
    pub fn display_main_help(&self, use_colors: bool) -> String {
        [
            self.format_header(use_colors),
            self.format_usage_section(use_colors),
            self.format_options_section(use_colors),
            self.format_examples_section(use_colors),
            self.format_environment_section(use_colors),
            self.format_footer(use_colors),
        ]
        .join("\n")
    }

    /// Help for a single topic, `None` for unknown topics
    pub fn display_topic_help(&self, topic: &str, use_colors: bool) -> Option<String> {
        match topic.to_lowercase().as_str() {
            "plans" | "plan" | "scenarios" => Some(self.format_plans_help(use_colors)),
            "config" | "configuration" | "env" => Some(self.format_configuration_help(use_colors)),
            "thresholds" | "threshold" => Some(self.format_thresholds_help(use_colors)),
            "examples" => Some(self.format_examples_section(use_colors)),
            _ => None,
        }
    }

    fn section(&self, title: &str, use_colors: bool) -> String {
        if use_colors {
            title.bright_green().bold().to_string()
        } else {
            title.to_string()
        }
    }

    fn format_header(&self, use_colors: bool) -> String {
        let title = "Books Load Tester";
        let subtitle = "Load-testing scenarios for the books service";
        let version = crate::VERSION;

        if use_colors {
            format!("{}\n{}\nVersion: {}\n", title.bright_cyan().bold(), subtitle.bright_blue(), version.green())
        } else {
            format!("{}\n{}\nVersion: {}\n", title, subtitle, version)
        }
    }

    fn format_usage_section(&self, use_colors: bool) -> String {
        let patterns = [
            "blt [OPTIONS]",
            "blt --plan main --base-url <URL> [OPTIONS]",
            "blt --list-plans",
            "blt --help-topic <TOPIC>",
        ];

        let mut usage = format!("{}\n", self.section("USAGE:", use_colors));
        for pattern in patterns {
            if use_colors {
                usage.push_str(&format!("  {}\n", pattern.bright_white()));
            } else {
                usage.push_str(&format!("  {}\n", pattern));
            }
        }
        usage
    }

    fn format_options_section(&self, use_colors: bool) -> String {
        let options = [
            OptionHelp {
                short: Some("p"),
                long: "plan",
                value: "<NAME>",
                description: "Plan to run: warmup or main (default: warmup)",
                example: Some("--plan main"),
            },
            OptionHelp {
                short: Some("b"),
                long: "base-url",
                value: "<URL>",
                description: "Base URL of the books service (default: http://localhost:8080)",
                example: Some("--base-url http://host.docker.internal:8080"),
            },
            OptionHelp {
                short: None,
                long: "vus",
                value: "<N>",
                description: "Replace the VU count of every scenario",
                example: None,
            },
            OptionHelp {
                short: None,
                long: "iterations",
                value: "<N>",
                description: "Replace the per-VU iteration count of every scenario",
                example: None,
            },
            OptionHelp {
                short: None,
                long: "max-duration",
                value: "<DURATION>",
                description: "Replace the max duration of every scenario",
                example: Some("--max-duration 1m30s"),
            },
            OptionHelp {
                short: Some("t"),
                long: "timeout",
                value: "<SECONDS>",
                description: "Per-request timeout in seconds (default: 60)",
                example: None,
            },
            OptionHelp {
                short: None,
                long: "threshold",
                value: "<SELECTOR=EXPR>",
                description: "Add a threshold (repeatable)",
                example: Some("--threshold 'http_req_failed=rate<0.01'"),
            },
            OptionHelp {
                short: None,
                long: "summary-export",
                value: "<PATH>",
                description: "Write the end-of-test summary as JSON",
                example: Some("--summary-export results/summary.json"),
            },
            OptionHelp {
                short: None,
                long: "list-plans",
                value: "",
                description: "Show the built-in plans and exit",
                example: None,
            },
            OptionHelp {
                short: Some("q"),
                long: "quiet",
                value: "",
                description: "Do not print the end-of-test summary",
                example: None,
            },
            OptionHelp {
                short: None,
                long: "verbose",
                value: "",
                description: "Log failed requests and show every trend statistic",
                example: None,
            },
            OptionHelp {
                short: None,
                long: "debug",
                value: "",
                description: "Log every request as JSON",
                example: None,
            },
            OptionHelp {
                short: None,
                long: "no-color",
                value: "",
                description: "Disable colored output",
                example: None,
            },
        ];

        let mut output = format!("{}\n", self.section("OPTIONS:", use_colors));
        for option in options {
            output.push_str(&option.format(use_colors));
            output.push('\n');
        }
        output
    }

    fn format_examples_section(&self, use_colors: bool) -> String {
        let examples = [
            ExampleHelp {
                title: "Warm up a local service",
                command: "blt",
                description: "10 VUs x 20 iterations against http://localhost:8080",
            },
            ExampleHelp {
                title: "Full load against a containerized service",
                command: "BASE_URL=http://host.docker.internal:8080 blt --plan main",
                description: "100 VUs per endpoint, 500 iterations each, 5m cap",
            },
            ExampleHelp {
                title: "Smoke run in CI",
                command: "blt --plan main --vus 2 --iterations 5 --summary-export summary.json",
                description: "Small load with a JSON summary; exit code 99 when a threshold is crossed",
            },
            ExampleHelp {
                title: "Stricter latency bound",
                command: "blt --threshold 'http_req_duration{books:new-books}=p(95)<250'",
                description: "Adds a p(95) bound on /new-books to the built-in thresholds",
            },
        ];

        let mut output = format!("{}\n", self.section("EXAMPLES:", use_colors));
        for example in examples {
            output.push_str(&example.format(use_colors));
            output.push('\n');
        }
        output
    }

    fn format_environment_section(&self, use_colors: bool) -> String {
        let mut output = format!("{}\n", self.section("ENVIRONMENT VARIABLES:", use_colors));
        output.push_str("Configuration priority: CLI arguments > Environment variables (.env) > Defaults\n\n");

        for (var_name, description, _example) in EnvManager::get_supported_env_vars() {
            if use_colors {
                output.push_str(&format!("  {}: {}\n", var_name.bright_yellow().bold(), description.white()));
            } else {
                output.push_str(&format!("  {}: {}\n", var_name, description));
            }
        }
        output
    }

    fn format_footer(&self, use_colors: bool) -> String {
        let mut footer = format!("{}\n", self.section("ADDITIONAL HELP:", use_colors));
        let topics = [
            ("--help-topic plans", "Built-in plans and their scenarios"),
            ("--help-topic config", "Configuration sources and limits"),
            ("--help-topic thresholds", "Threshold syntax and exit codes"),
            ("--help-topic examples", "Usage examples"),
        ];

        for (command, description) in topics {
            if use_colors {
                footer.push_str(&format!("  {}: {}\n", command.bright_yellow(), description.white()));
            } else {
                footer.push_str(&format!("  {}: {}\n", command, description));
            }
        }
        footer
    }

    fn format_plans_help(&self, use_colors: bool) -> String {
        let mut help = format!("{}\n\n", self.section("PLANS:", use_colors));

        for name in TestPlan::available() {
            let Ok(plan) = TestPlan::by_name(name) else {
                continue;
            };
            help.push_str(&format!("{}\n", if use_colors { plan.name.bright_cyan().bold().to_string() } else { plan.name.clone() }));
            for scenario in &plan.scenarios {
                help.push_str(&format!(
                    "  {}: {} VUs x {} iterations, exec {}, max duration {}\n",
                    scenario.name,
                    scenario.vus,
                    scenario.iterations,
                    scenario.exec.as_str(),
                    format_duration(scenario.max_duration)
                ));
            }
            for threshold in &plan.thresholds {
                help.push_str(&format!("  threshold {}\n", threshold));
            }
            help.push('\n');
        }

        help.push_str("Scenarios in a plan run concurrently. Every VU runs its iterations back to back;\n");
        help.push_str("a scenario stops early when its max duration elapses.\n");
        help
    }

    fn format_configuration_help(&self, use_colors: bool) -> String {
        let mut help = format!("{}\n\n", self.section("CONFIGURATION REFERENCE:", use_colors));

        help.push_str("CONFIGURATION PRIORITY (highest to lowest):\n");
        help.push_str("1. Command-line arguments\n");
        help.push_str("2. Environment variables\n");
        help.push_str("3. .env file in the working directory\n");
        help.push_str("4. Default values\n\n");

        help.push_str("PARAMETER LIMITS:\n");
        help.push_str(&format!("- VUs: 1-{}\n", crate::defaults::MAX_VUS));
        help.push_str(&format!("- Request timeout: 1-{} seconds\n", crate::defaults::MAX_REQUEST_TIMEOUT_SECS));
        help.push_str("- Durations: combinations of h, m, s and ms, e.g. 30s, 5m, 1m30s\n");
        help.push_str("- Base URL: http or https; an empty BASE_URL falls back to the default\n\n");

        help.push_str(&EnvManager::display_env_help());
        help
    }

    fn format_thresholds_help(&self, use_colors: bool) -> String {
        let mut help = format!("{}\n\n", self.section("THRESHOLDS:", use_colors));

        help.push_str("Syntax: METRIC[{TAG:VALUE,...}]=EXPR[;EXPR...]\n");
        help.push_str("   EXPR: AGGREGATION OPERATOR NUMBER, e.g. p(99)<1000\n\n");

        help.push_str("METRICS AND AGGREGATIONS:\n");
        help.push_str("  http_req_duration  avg, min, med, max, p(N), count   (milliseconds)\n");
        help.push_str("  http_req_failed    rate                              (non-200 or no response)\n");
        help.push_str("  http_reqs          count, rate                       (rate per second)\n");
        help.push_str("  iterations         count, rate\n");
        help.push_str("  checks             rate                              (passing fraction)\n\n");

        help.push_str("TAGS: books (list-books, new-books), scenario, status, method\n\n");

        help.push_str("A threshold with no matching samples passes.\n\n");

        help.push_str("EXIT CODES:\n");
        help.push_str("  0    every threshold passed (failed checks do not change this)\n");
        help.push_str("  99   at least one threshold was crossed\n");
        help.push_str("  1    invalid configuration\n");
        help.push_str("  2    HTTP client setup failed\n");
        help.push_str("  5    summary export failed\n");
        help.push_str("  105  interrupted by Ctrl-C\n");
        help
    }
}

impl Default for HelpSystem {
    fn default() -> Self {
        Self::new()
    }
}

/// Helper struct for formatting options
struct OptionHelp {
    short: Option<&'static str>,
    long: &'static str,
    value: &'static str,
    description: &'static str,
    example: Option<&'static str>,
}

impl OptionHelp {
    fn format(&self, use_colors: bool) -> String {
        let mut option_str = String::new();

        if let Some(short) = self.short {
            if use_colors {
                option_str.push_str(&format!("  {}, ", format!("-{}", short).bright_cyan()));
            } else {
                option_str.push_str(&format!("  -{}, ", short));
            }
        } else {
            option_str.push_str("      ");
        }

        let long_with_value = if self.value.is_empty() {
            format!("--{}", self.long)
        } else {
            format!("--{} {}", self.long, self.value)
        };

        if use_colors {
            option_str.push_str(&format!("{:<30} {}", long_with_value.bright_cyan(), self.description.white()));
        } else {
            option_str.push_str(&format!("{:<30} {}", long_with_value, self.description));
        }

        if let Some(example) = self.example {
            if use_colors {
                option_str.push_str(&format!(
                    "\n{}{}",
                    " ".repeat(36),
                    format!("Example: {}", example).bright_blue().italic()
                ));
            } else {
                option_str.push_str(&format!("\n{}Example: {}", " ".repeat(36), example));
            }
        }

        option_str
    }
}

/// Helper struct for formatting examples
struct ExampleHelp {
    title: &'static str,
    command: &'static str,
    description: &'static str,
}

impl ExampleHelp {
    fn format(&self, use_colors: bool) -> String {
        if use_colors {
            format!(
                "  {}:\n    {}\n    {}\n",
                self.title.bright_yellow().bold(),
                self.command.bright_white(),
                self.description.bright_blue().italic()
            )
        } else {
            format!("  {}:\n    {}\n    {}\n", self.title, self.command, self.description)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_main_help_display() {
        let plain_help = HelpSystem::new().display_main_help(false);

        assert!(plain_help.contains("Books Load Tester"));
        assert!(plain_help.contains("USAGE:"));
        assert!(plain_help.contains("OPTIONS:"));
        assert!(plain_help.contains("--threshold <SELECTOR=EXPR>"));
        assert!(plain_help.contains("EXAMPLES:"));
        assert!(plain_help.contains("BASE_URL: Base URL of the books service"));
    }

    #[test]
    fn test_every_topic_has_help() {
        let help = HelpSystem::new();
        for topic in HELP_TOPICS {
            assert!(help.display_topic_help(topic, false).is_some(), "no help for {}", topic);
        }
        assert!(help.display_topic_help("metrics", false).is_none());
    }

    #[test]
    fn test_plans_topic_describes_both_plans() {
        let help = HelpSystem::new().display_topic_help("plans", false).unwrap();
        assert!(help.contains("warmup: 10 VUs x 20 iterations, exec default, max duration 30s"));
        assert!(help.contains("list_books: 100 VUs x 500 iterations, exec list_books, max duration 5m"));
        assert!(help.contains("threshold http_req_duration{books:list-books}: [p(99) < 1000]"));
    }

    #[test]
    fn test_thresholds_topic_lists_exit_codes() {
        let help = HelpSystem::new().display_topic_help("THRESHOLDS", false).unwrap();
        assert!(help.contains("99   at least one threshold was crossed"));
        assert!(help.contains("105  interrupted by Ctrl-C"));
    }
}
