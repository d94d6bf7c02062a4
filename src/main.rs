//! Books Load Tester - Main CLI Application
//!
//! Runs the warmup or main load plan against the books service and
//! exits non-zero when a threshold is crossed.

use books_load_tester::{
    cli::Cli,
    client::BooksClient,
    config::{display_config_summary, load_config, validate_config, ValidationLevel},
    error::{AppError, ErrorReporter, Result},
    executor::PlanRunner,
    log_debug, log_info, log_warn,
    logging::LoggerFactory,
    models::Config,
    output::{export_json, OutputCoordinator, OutputFormatterFactory},
    version_info,
};
use clap::Parser;
use std::process;
use std::sync::Arc;
use tokio::sync::watch;

#[tokio::main]
async fn main() {
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panic: {}", panic_info);
        process::exit(100);
    }));

    let cli = Cli::parse();
    let reporter = ErrorReporter::new(cli.use_colors(), cli.verbose);

    if let Err(e) = run_application(cli).await {
        reporter.report_error(&e);
        print_error_suggestions(&e);
        process::exit(e.exit_code());
    }
}

/// Main application logic
async fn run_application(cli: Cli) -> Result<()> {
    if cli.version {
        println!("{}", version_info());
        return Ok(());
    }

    if cli.should_show_topic_help() {
        println!("{}", cli.display_help());
        return Ok(());
    }

    let mut config = load_config(cli.clone())?;
    // NO_COLOR, FORCE_COLOR and TERM apply to the logs as well as the summary
    config.enable_color &= cli.use_colors();
    let coordinator = OutputCoordinator::new(OutputFormatterFactory::create_formatter(
        config.enable_color,
        config.verbose,
    ));

    if cli.list_plans {
        println!("{}", coordinator.display_plans(&config.base_url)?);
        return Ok(());
    }

    let factory = LoggerFactory::new(config.clone());
    let result = run_plan(&config, &factory, &coordinator).await;

    if let Err(ref e) = result {
        if config.debug {
            factory.create_error_logger().await.log_error(e, Some("run")).await;
        }
    }

    result
}

async fn run_plan(config: &Config, factory: &LoggerFactory, coordinator: &OutputCoordinator) -> Result<()> {
    let logger = factory.create_logger("MAIN").await;
    log_debug!(logger, "Configuration:\n{}", display_config_summary(config));

    for warning in validate_config(config)? {
        match warning.level {
            ValidationLevel::Info => log_info!(logger, "{}", warning.message),
            ValidationLevel::Warning => log_warn!(logger, "{}", warning.message),
        }
    }

    let plan = config.build_plan()?;
    if !config.quiet {
        println!("{}\n", coordinator.display_plan(&plan, &config.base_url)?);
    }

    let client = Arc::new(BooksClient::new(config.request_timeout())?);
    let shutdown = spawn_interrupt_watcher();

    let runner = PlanRunner::new(client, &config.base_url, config.request_timeout())
        .with_loggers(factory.create_request_logger().await, factory.create_run_logger().await)
        .with_run_id(factory.run_id());
    let report = runner.run(&plan, shutdown).await?;

    if !config.quiet {
        println!("{}", coordinator.display_report(&report)?);
    }

    if let Some(ref path) = config.summary_export {
        export_json(&report, path)?;
        log_info!(logger, "Summary written to {}", path.display());
    }

    report.outcome()
}

/// Flip the shutdown flag on the first Ctrl-C
fn spawn_interrupt_watcher() -> watch::Receiver<bool> {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(true);
        }
    });
    shutdown_rx
}

/// Print helpful suggestions for common errors
fn print_error_suggestions(error: &AppError) {
    match error {
        AppError::Config(_) | AppError::Validation(_) | AppError::Parse(_) => {
            eprintln!();
            eprintln!("Configuration help:");
            eprintln!("  - Check your .env file format");
            eprintln!("  - BASE_URL must start with http:// or https://");
            eprintln!("  - Available plans: warmup, main (see --list-plans)");
            eprintln!("  - Threshold syntax: see --help-topic thresholds");
        }
        AppError::Network(_) | AppError::HttpRequest(_) => {
            eprintln!();
            eprintln!("Network troubleshooting:");
            eprintln!("  - Check the books service is running at the base URL");
            eprintln!("  - From inside a container, try --base-url http://host.docker.internal:8080");
        }
        AppError::Io(_) => {
            eprintln!();
            eprintln!("Check that the --summary-export path is writable");
        }
        _ => {}
    }
}
