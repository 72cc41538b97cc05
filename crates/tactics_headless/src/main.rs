//! Headless tactics battle runner.
//!
//! Plays scenarios without a client, for AI testing, balance batches and
//! CI determinism checks.
//!
//! # Usage
//!
//! ```bash
//! # Play one battle, events on stdout
//! cargo run -p tactics_headless -- run --scenario scenarios/skirmish.ron
//!
//! # Run a batch balance test
//! cargo run -p tactics_headless -- batch --scenario scenarios/skirmish.ron --count 1000 --output results/batch.json
//!
//! # Check a scenario
//! cargo run -p tactics_headless -- validate --scenario scenarios/skirmish.ron
//! ```
//!
//! Logs go to stderr. `RUST_LOG` overrides the level picked by `--verbose`.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use tactics_headless::{
    batch::{run_batch, BatchConfig},
    error::Result,
    runner::{HeadlessConfig, HeadlessRunner},
    scenario::{load_scenario, validate_scenario},
};

#[derive(Parser)]
#[command(name = "tactics_headless")]
#[command(about = "Headless tactics battle runner for AI testing and balance batches")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play one battle and print its events as JSON lines
    Run {
        /// Scenario RON file
        #[arg(short, long)]
        scenario: PathBuf,

        /// Override the scenario's AI seed
        #[arg(long)]
        seed: Option<u64>,

        /// Override the scenario's turn cap
        #[arg(long)]
        max_turns: Option<u32>,
    },

    /// Play many seeds in parallel and print a JSON summary
    Batch {
        /// Scenario RON file
        #[arg(short, long)]
        scenario: PathBuf,

        /// Number of battles to play
        #[arg(short, long, default_value = "100")]
        count: u32,

        /// Starting random seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Override the scenario's turn cap
        #[arg(long)]
        max_turns: Option<u32>,

        /// Also write the summary to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Parse a scenario and build its battle
    Validate {
        /// Scenario RON file
        #[arg(short, long)]
        scenario: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs to stderr; stdout carries JSON
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(filter)
        .init();

    let outcome = match cli.command {
        Commands::Run {
            scenario,
            seed,
            max_turns,
        } => cmd_run(&scenario, seed, max_turns),
        Commands::Batch {
            scenario,
            count,
            seed,
            max_turns,
            output,
        } => cmd_batch(&scenario, count, seed, max_turns, output),
        Commands::Validate { scenario } => cmd_validate(&scenario),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            ExitCode::FAILURE
        }
    }
}

/// Play a single battle
fn cmd_run(path: &Path, seed: Option<u64>, max_turns: Option<u32>) -> Result<()> {
    let scenario = load_scenario(path)?;
    let runner = HeadlessRunner::with_config(HeadlessConfig { seed, max_turns });
    let stdout = std::io::stdout();
    let summary = runner.run(&scenario, stdout.lock())?;

    match summary.winner {
        Some(faction) => tracing::info!(faction, turns = summary.turns, "victory"),
        None => tracing::info!(turns = summary.turns, "draw"),
    }
    Ok(())
}

/// Run a batch of battles for balance testing
fn cmd_batch(path: &Path, count: u32, seed: u64, max_turns: Option<u32>, output: Option<PathBuf>) -> Result<()> {
    use std::time::Instant;

    let scenario = load_scenario(path)?;
    let mut config = BatchConfig::new(count).with_seed(seed);
    if let Some(max_turns) = max_turns {
        config = config.with_max_turns(max_turns);
    }

    let start = Instant::now();
    let summary = run_batch(&scenario, &config);
    tracing::info!(
        elapsed_ms = start.elapsed().as_millis() as u64,
        games = summary.total_games,
        "batch finished"
    );

    if let Some(output) = output {
        summary.save(&output)?;
        tracing::info!(path = %output.display(), "summary written");
    }

    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, &summary)?;
    writeln!(stdout)?;
    Ok(())
}

/// Check a scenario file
fn cmd_validate(path: &Path) -> Result<()> {
    let report = validate_scenario(path)?;
    tracing::info!(
        name = %report.name,
        width = report.width,
        height = report.height,
        units = report.units,
        factions = report.factions,
        "scenario is valid"
    );
    Ok(())
}
