//! Headless capture-the-flag runner.
//!
//! # Usage
//!
//! ```bash
//! # Play one scenario and print its metrics
//! cargo run -p ctf_headless -- run --scenario duel
//!
//! # Play every scenario in a directory
//! cargo run -p ctf_headless -- batch --scenarios scenarios/ --output results/
//!
//! # Print the route between two cells
//! cargo run -p ctf_headless -- path --scenario solo --from 0,0 --to 5,2
//!
//! # Check that repeated runs agree
//! cargo run -p ctf_headless -- verify --scenario duel --runs 5
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ctf_core::grid::Cell;
use ctf_core::pathfinding::find_path_with_fallback;
use ctf_headless::{
    ascii::{render_arena, render_path},
    batch::{resolve_scenario, run_batch, scenario_is_deterministic, BatchConfig},
    game_runner::run_game_observed,
};

#[derive(Parser)]
#[command(name = "ctf_headless")]
#[command(about = "Headless capture-the-flag runner for AI testing and CI")]
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
    /// Play a single match
    Run {
        /// Scenario file or built-in name (duel, solo)
        #[arg(short, long, default_value = "duel")]
        scenario: String,

        /// Write metrics JSON here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the arena every N ticks (0 = never)
        #[arg(long, default_value = "0")]
        show_every: u64,
    },

    /// Play a batch of scenarios in parallel
    Batch {
        /// Directory of scenario files (default: the built-in scenarios)
        #[arg(short, long)]
        scenarios: Option<PathBuf>,

        /// Maximum parallel matches (0 = auto)
        #[arg(short, long, default_value = "0")]
        parallel: u32,

        /// Output directory for results
        #[arg(short, long, default_value = "results")]
        output: PathBuf,

        /// Override every scenario's tick limit
        #[arg(long)]
        max_ticks: Option<u64>,
    },

    /// Print the route the AI would plan between two cells
    Path {
        /// Scenario file or built-in name
        #[arg(short, long, default_value = "duel")]
        scenario: String,

        /// Start cell as "x,y"
        #[arg(long, value_parser = parse_cell)]
        from: Cell,

        /// Goal cell as "x,y"
        #[arg(long, value_parser = parse_cell)]
        to: Cell,
    },

    /// Verify determinism by playing the same scenario several times
    Verify {
        /// Scenario file or built-in name
        #[arg(short, long, default_value = "duel")]
        scenario: String,

        /// Number of verification runs
        #[arg(short, long, default_value = "5")]
        runs: u32,
    },
}

fn parse_cell(s: &str) -> Result<Cell, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected x,y but got '{s}'"))?;
    let x = x.trim().parse().map_err(|e| format!("bad x '{x}': {e}"))?;
    let y = y.trim().parse().map_err(|e| format!("bad y '{y}': {e}"))?;
    Ok(Cell::new(x, y))
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(
            log_level,
        ))
        .init();

    let result = match cli.command {
        Commands::Run {
            scenario,
            output,
            show_every,
        } => cmd_run(&scenario, output, show_every),
        Commands::Batch {
            scenarios,
            parallel,
            output,
            max_ticks,
        } => cmd_batch(scenarios, parallel, output, max_ticks),
        Commands::Path { scenario, from, to } => cmd_path(&scenario, from, to),
        Commands::Verify { scenario, runs } => cmd_verify(&scenario, runs),
    };

    match result {
        Ok(code) => code,
        Err(message) => {
            tracing::error!(error = %message, "Command failed");
            eprintln!("FATAL: {message}");
            ExitCode::FAILURE
        }
    }
}

/// Play a single match.
fn cmd_run(name: &str, output: Option<PathBuf>, show_every: u64) -> Result<ExitCode, String> {
    let scenario = resolve_scenario(name).map_err(|e| e.to_string())?;

    let result = run_game_observed(&scenario, |arena, _| {
        if show_every > 0 && arena.tick_count() % show_every == 0 {
            eprintln!("tick {}\n{}\n", arena.tick_count(), render_arena(arena));
        }
    })
    .map_err(|e| e.to_string())?;

    let json = result.metrics.to_json().map_err(|e| e.to_string())?;
    match output {
        Some(path) => {
            std::fs::write(&path, json).map_err(|e| e.to_string())?;
            tracing::info!(path = %path.display(), "Metrics written");
        }
        None => println!("{json}"),
    }
    Ok(ExitCode::SUCCESS)
}

/// Play a batch of scenarios.
fn cmd_batch(
    scenarios: Option<PathBuf>,
    parallel: u32,
    output: PathBuf,
    max_ticks: Option<u64>,
) -> Result<ExitCode, String> {
    let mut config = match &scenarios {
        Some(dir) => BatchConfig::from_dir(dir).map_err(|e| e.to_string())?,
        None => BatchConfig::default(),
    };
    config.parallel_games = parallel;
    config.output_dir = output.clone();
    config.max_ticks = max_ticks;

    tracing::info!(
        scenarios = config.scenarios.len(),
        parallel,
        output = %output.display(),
        max_ticks = ?max_ticks,
        "Batch configuration"
    );

    std::fs::create_dir_all(&output)
        .map_err(|e| format!("cannot create output directory '{}': {e}", output.display()))?;

    let results = run_batch(config);
    let results_path = output.join("batch_results.json");
    results
        .save(&results_path)
        .map_err(|e| format!("failed to save results: {e}"))?;

    eprintln!("\n{}", "=".repeat(50));
    eprintln!("BATCH COMPLETE");
    eprintln!("{}", "=".repeat(50));
    eprintln!("Matches played: {}", results.games.len());
    if !results.errors.is_empty() {
        eprintln!("Matches FAILED: {}", results.errors.len());
    }
    eprintln!("Duration: {:.1}s", results.duration_seconds);
    eprintln!("Draws: {}", results.summary.draws);
    eprintln!("\nWin Rates:");
    for (tank, rate) in &results.summary.win_rates {
        eprintln!("  {}: {:.1}%", tank, rate * 100.0);
    }
    for error in results.errors.iter().take(10) {
        eprintln!("  {} ({}): {}", error.game_index, error.scenario, error.message);
    }
    eprintln!("\nResults saved to: {}", results_path.display());

    Ok(if results.errors.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Print a planned route.
fn cmd_path(name: &str, from: Cell, to: Cell) -> Result<ExitCode, String> {
    let scenario = resolve_scenario(name).map_err(|e| e.to_string())?;
    let grid = scenario.map.obstacle_grid();
    let (path, policy) = find_path_with_fallback(&grid, from, to);

    match policy {
        Some(policy) => {
            println!("{}", render_path(&grid, from, &path));
            println!("length: {} ({policy:?})", path.len());
            Ok(ExitCode::SUCCESS)
        }
        None => {
            println!("no route from {from:?} to {to:?}");
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Play the same scenario several times and compare.
fn cmd_verify(name: &str, runs: u32) -> Result<ExitCode, String> {
    let scenario = resolve_scenario(name).map_err(|e| e.to_string())?;
    tracing::info!(scenario = %scenario.name, runs, "Verifying determinism");

    if scenario_is_deterministic(&scenario, runs)? {
        eprintln!("PASS: {runs} runs of '{}' are identical", scenario.name);
        Ok(ExitCode::SUCCESS)
    } else {
        eprintln!("FAIL: '{}' is non-deterministic", scenario.name);
        Ok(ExitCode::FAILURE)
    }
}
