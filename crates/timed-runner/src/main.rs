//! Timed task runner entry point.
//!
//! Polls the configured tasks from a single loop against the host monotonic
//! clock, the same way a firmware main loop polls them against `micros()`.

mod report;
mod runner;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use timed_common::clock::MonotonicClock;
use timed_common::config::RunnerConfig;
use tracing::{info, warn};

/// Timed task runner command-line arguments.
#[derive(Parser, Debug)]
#[command(
    name = "timed-runner",
    about = "Cooperative timed task runner - polls configured tasks and reports deadline misses",
    version,
    long_about = None
)]
struct Args {
    /// Path to a runner configuration file (TOML).
    #[arg(long, short = 'c', value_name = "FILE")]
    config: Option<PathBuf>,

    /// How long to run (e.g. "10s", "500ms"); overrides the config file.
    #[arg(long, value_parser = humantime::parse_duration)]
    run_for: Option<Duration>,

    /// Maximum loop passes (0 = unlimited).
    #[arg(long, default_value = "0")]
    max_polls: u64,

    /// Starting value of the microsecond counter; overrides the config file.
    #[arg(long, value_name = "MICROS")]
    clock_offset: Option<u32>,

    /// Stop as soon as a task misses its deadline.
    #[arg(long)]
    stop_on_error: bool,

    /// Print the run summary as JSON.
    #[arg(long)]
    json: bool,

    /// Print the effective configuration as TOML and exit.
    #[arg(long)]
    dump_config: bool,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, short = 'l', default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    init_logging(&args.log_level);

    info!(version = env!("CARGO_PKG_VERSION"), "Starting timed task runner");

    // Load configuration
    let mut config = load_config(&args)?;
    apply_overrides(&mut config, &args);

    if args.dump_config {
        print!("{}", config.to_toml().context("Failed to serialize config")?);
        return Ok(());
    }

    info!(
        tasks = config.tasks.len(),
        run_for = %humantime::format_duration(config.run_for),
        clock_offset_us = config.clock_offset_us,
        "Configuration loaded"
    );

    let clock = MonotonicClock::with_offset(config.clock_offset_us);
    let summary = runner::run(&clock, &config, args.max_polls)?;

    if args.json {
        println!("{}", summary.to_json().context("Failed to serialize summary")?);
    } else {
        print!("{}", summary.to_text());
    }

    if summary.any_error() {
        warn!("One or more tasks missed a deadline");
    }
    info!(
        polls = summary.polls,
        elapsed_ms = summary.elapsed.as_millis(),
        stop_reason = %summary.stop_reason,
        "Runner finished"
    );

    Ok(())
}

/// Initialize logging with the specified log level.
fn init_logging(level: &str) {
    let filter = format!(
        "timed_runner={},timed_task={},timed_common={}",
        level, level, level
    );

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&filter)),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

/// Load configuration from file or use defaults.
///
/// Resolution priority (first existing file wins):
/// 1. Command-line `--config` argument
/// 2. `TIMED_CONFIG_PATH` environment variable
/// 3. `config/default.toml` (local development)
/// 4. Built-in defaults
fn load_config(args: &Args) -> Result<RunnerConfig> {
    // 1. Command-line argument (highest priority)
    if let Some(config_path) = &args.config {
        info!(?config_path, "Loading config from command-line argument");
        return RunnerConfig::from_file(config_path)
            .with_context(|| format!("Failed to load config from {:?}", config_path));
    }

    // 2. Environment variable
    if let Ok(env_path) = std::env::var("TIMED_CONFIG_PATH") {
        let config_path = PathBuf::from(&env_path);
        if config_path.exists() {
            info!(?config_path, "Loading config from TIMED_CONFIG_PATH");
            return RunnerConfig::from_file(&config_path).with_context(|| {
                format!("Failed to load config from TIMED_CONFIG_PATH={:?}", env_path)
            });
        }
        warn!(
            path = %env_path,
            "TIMED_CONFIG_PATH set but file does not exist, checking other locations"
        );
    }

    // 3. Local development path
    let local_path = PathBuf::from("config/default.toml");
    if local_path.exists() {
        info!(?local_path, "Loading config from local path");
        return RunnerConfig::from_file(&local_path)
            .with_context(|| format!("Failed to load config from {:?}", local_path));
    }

    // 4. Built-in defaults
    info!("No config file found, using built-in defaults");
    Ok(RunnerConfig::default())
}

/// Apply command-line overrides on top of the loaded configuration.
fn apply_overrides(config: &mut RunnerConfig, args: &Args) {
    if let Some(run_for) = args.run_for {
        config.run_for = run_for;
    }
    if let Some(offset) = args.clock_offset {
        config.clock_offset_us = offset;
    }
    if args.stop_on_error {
        config.stop_on_error = true;
    }
}
