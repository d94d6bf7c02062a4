//! Configuration parsing from CLI arguments and environment variables

use crate::{
    cli::Cli,
    config::env::EnvManager,
    error::Result,
    models::Config,
};

/// Configuration parser that combines CLI arguments with environment variables
pub struct ConfigParser {
    cli: Cli,
}

impl ConfigParser {
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Build the configuration: defaults, then .env and the environment, then CLI
    pub fn parse(&self) -> Result<Config> {
        let mut config = Config::default();

        EnvManager::load_env_file(self.cli.debug)?;
        config.merge_from_env()?;

        self.apply_cli_overrides(&mut config);

        config.validate()?;

        Ok(config)
    }

    /// Apply CLI argument overrides to configuration
    fn apply_cli_overrides(&self, config: &mut Config) {
        if let Some(ref base_url) = self.cli.base_url {
            config.base_url = base_url.clone();
        }

        if let Some(ref plan) = self.cli.plan {
            config.plan = plan.clone();
        }

        if let Some(timeout) = self.cli.timeout {
            config.request_timeout_seconds = timeout;
        }

        if self.cli.vus.is_some() {
            config.vus = self.cli.vus;
        }
        if self.cli.iterations.is_some() {
            config.iterations = self.cli.iterations;
        }
        if let Some(ref max_duration) = self.cli.max_duration {
            config.max_duration = Some(max_duration.clone());
        }

        config.thresholds.extend(self.cli.thresholds.iter().cloned());

        if let Some(ref path) = self.cli.summary_export {
            config.summary_export = Some(path.clone());
        }

        if self.cli.no_color {
            config.enable_color = false;
        }

        // CLI-only flags
        config.verbose = self.cli.verbose;
        config.debug = self.cli.debug;
        config.quiet = self.cli.quiet;

        if config.debug {
            eprintln!("Applied CLI overrides to configuration");
            eprintln!("{}", display_config_summary(config));
        }
    }
}

/// Convenience function to load complete configuration from CLI arguments
pub fn load_config(cli: Cli) -> Result<Config> {
    ConfigParser::new(cli).parse()
}

/// Configuration summary for debug output
pub fn display_config_summary(config: &Config) -> String {
    let mut summary = vec![
        format!("Base URL: {}", config.base_url),
        format!("Plan: {}", config.plan),
        format!("Request Timeout: {}s", config.request_timeout_seconds),
    ];

    if let Some(vus) = config.vus {
        summary.push(format!("VUs Override: {}", vus));
    }
    if let Some(iterations) = config.iterations {
        summary.push(format!("Iterations Override: {}", iterations));
    }
    if let Some(ref max_duration) = config.max_duration {
        summary.push(format!("Max Duration Override: {}", max_duration));
    }
    if !config.thresholds.is_empty() {
        summary.push(format!("Extra Thresholds: {}", config.thresholds.join(", ")));
    }
    if let Some(ref path) = config.summary_export {
        summary.push(format!("Summary Export: {}", path.display()));
    }

    summary.push(format!("Color Output: {}", config.enable_color));
    summary.push(format!("Verbose: {}", config.verbose));
    summary.push(format!("Debug: {}", config.debug));

    summary.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::path::PathBuf;

    fn overridden(args: &[&str], mut config: Config) -> Config {
        let mut argv = vec!["blt"];
        argv.extend_from_slice(args);
        ConfigParser::new(Cli::parse_from(argv)).apply_cli_overrides(&mut config);
        config
    }

    #[test]
    fn test_cli_overrides() {
        let config = overridden(
            &[
                "--plan", "main",
                "--base-url", "http://host.docker.internal:8080",
                "--timeout", "5",
                "--vus", "3",
                "--iterations", "4",
                "--max-duration", "45s",
                "--summary-export", "out/summary.json",
                "--no-color",
                "--verbose",
            ],
            Config::default(),
        );

        assert_eq!(config.plan, "main");
        assert_eq!(config.base_url, "http://host.docker.internal:8080");
        assert_eq!(config.request_timeout_seconds, 5);
        assert_eq!(config.vus, Some(3));
        assert_eq!(config.iterations, Some(4));
        assert_eq!(config.max_duration.as_deref(), Some("45s"));
        assert_eq!(config.summary_export, Some(PathBuf::from("out/summary.json")));
        assert!(!config.enable_color);
        assert!(config.verbose);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_cli_wins_over_environment_values() {
        // Values as merge_from_env would leave them
        let from_env = Config {
            base_url: "http://from-env:8080".to_string(),
            plan: "main".to_string(),
            request_timeout_seconds: 30,
            ..Default::default()
        };

        let config = overridden(&["--base-url", "http://from-cli:8080"], from_env.clone());
        assert_eq!(config.base_url, "http://from-cli:8080");
        assert_eq!(config.plan, "main");
        assert_eq!(config.request_timeout_seconds, 30);

        let config = overridden(&[], from_env);
        assert_eq!(config.base_url, "http://from-env:8080");
    }

    #[test]
    fn test_thresholds_accumulate() {
        let config = overridden(
            &[
                "--threshold", "http_req_failed=rate<0.01",
                "--threshold", "http_req_duration{books:list-books}=p(95)<200;avg<100",
            ],
            Config::default(),
        );
        assert_eq!(config.thresholds.len(), 2);
        assert_eq!(config.build_plan().unwrap().thresholds.len(), 4);
    }

    #[test]
    fn test_config_summary() {
        let config = Config {
            vus: Some(7),
            ..Default::default()
        };
        let summary = display_config_summary(&config);
        assert!(summary.contains("Base URL: http://localhost:8080"));
        assert!(summary.contains("Plan: warmup"));
        assert!(summary.contains("VUs Override: 7"));
        assert!(!summary.contains("Iterations Override"));
    }
}
