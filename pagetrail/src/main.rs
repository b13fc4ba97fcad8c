//! pagetrail - behavioral telemetry collector CLI
//!
//! This tool provides commands for:
//! - Checking tracker configuration
//! - Replaying a scripted page session against a collector endpoint
//!
//! Uses XDG Base Directory specification for file locations:
//! - Config: $XDG_CONFIG_HOME/pagetrail/config.toml (~/.config/pagetrail/config.toml)
//! - Logs: $XDG_STATE_HOME/pagetrail/ (~/.local/state/pagetrail/)

mod console;
mod scenario;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pagetrail_core::logging::LoggingGuard;
use pagetrail_core::{Config, Host, Tracker, TrackerOptions, Transports};

use crate::console::{ConsoleBeacon, OfflinePost};
use crate::scenario::Scenario;

/// Endpoint used by dry runs when none is configured
const DRY_RUN_ENDPOINT: &str = "http://localhost/dry-run";

#[derive(Parser)]
#[command(name = "pagetrail")]
#[command(about = "Collect behavioral telemetry from scripted page sessions")]
#[command(version)]
struct Args {
    /// Write logs to the state directory (always on in debug mode)
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show tracker configuration and readiness
    Status,

    /// Replay a scenario file
    Replay {
        /// Path to the scenario JSON
        scenario: PathBuf,

        /// Collector endpoint (overrides config and scenario)
        #[arg(short, long)]
        endpoint: Option<String>,

        /// Print records as JSON lines instead of sending them
        #[arg(long)]
        dry_run: bool,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::load().context("failed to load configuration")?;

    match args.command {
        Command::Status => {
            let debug = config.tracker.debug.unwrap_or(false);
            let _log_guard = init_logging(&config, args.verbose, debug)?;
            cmd_status(&config)
        }
        Command::Replay {
            scenario,
            endpoint,
            dry_run,
        } => cmd_replay(&config, args.verbose, &scenario, endpoint, dry_run),
    }
}

/// Install file logging when asked to, or when the tracker runs in debug mode.
fn init_logging(config: &Config, verbose: bool, debug: bool) -> Result<Option<LoggingGuard>> {
    if !verbose && !debug {
        return Ok(None);
    }
    let guard = pagetrail_core::logging::init(&config.logging, debug)
        .context("failed to initialize logging")?;
    Ok(Some(guard))
}

fn cmd_status(config: &Config) -> Result<()> {
    println!("Pagetrail Tracker Configuration");
    println!("===============================");
    println!();
    println!("Config file:     {}", Config::config_path().display());

    let options = &config.tracker;
    println!(
        "Endpoint:        {}",
        options.endpoint.as_deref().unwrap_or("<not set>")
    );

    println!();
    match options.resolve() {
        Ok(tracker) => {
            println!("Debug:           {}", tracker.debug);
            println!("Track clicks:    {}", tracker.track_clicks);
            println!("Track scroll:    {}", tracker.track_scroll);
            println!("Track forms:     {}", tracker.track_forms);
            println!("Scroll debounce: {}ms", tracker.scroll_debounce.as_millis());
            println!("Initial check:   {}ms", tracker.initial_check_delay.as_millis());
            println!("Timeout:         {}s", tracker.timeout.as_secs());
            println!();
            println!("Status: Ready to collect");
        }
        Err(e) => {
            println!("Status: Not ready ({})", e);
            println!();
            println!("Set an endpoint in config.toml:");
            println!();
            println!("  [tracker]");
            println!("  endpoint = \"https://collector.example/e\"");
        }
    }

    Ok(())
}

fn cmd_replay(
    config: &Config,
    verbose: bool,
    path: &Path,
    endpoint: Option<String>,
    dry_run: bool,
) -> Result<()> {
    let scenario = Scenario::load(path)?;

    let mut options = config.tracker.merged_with(&scenario.options);
    if endpoint.is_some() {
        options = options.merged_with(&TrackerOptions {
            endpoint,
            ..Default::default()
        });
    }
    if dry_run && options.endpoint.is_none() {
        options.endpoint = Some(DRY_RUN_ENDPOINT.to_string());
    }

    let _log_guard = init_logging(config, verbose, options.debug.unwrap_or(false))?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to create runtime")?;

    runtime.block_on(async {
        let layout = scenario.layout();
        let mut host = Host::new(Arc::new(scenario.environment.clone()), layout.clone());
        if dry_run {
            host = host.with_transports(Transports {
                beacon: Some(Arc::new(ConsoleBeacon)),
                fallback: Arc::new(OfflinePost),
            });
        }

        let tracker = Tracker::init(&options, host).context("failed to start tracker")?;
        let performed = crate::scenario::replay(&scenario.steps, &tracker, &layout).await?;
        tracker.shutdown().await;

        let stats = tracker.stats();
        eprintln!("Replayed {} step(s)", performed);
        eprintln!("  Beacons:    {}", stats.beacons);
        eprintln!("  Fallback:   {}", stats.fallback_posts);
        eprintln!("  Failures:   {}", stats.fallback_failures);
        if let Some(observer) = tracker.scroll_observer() {
            eprintln!("  Sections:   {}", observer.viewed_sections().join(", "));
        }
        Ok::<(), anyhow::Error>(())
    })
}
