//! Batch match runner.
//!
//! Plays many scenarios in parallel using rayon and aggregates their
//! metrics.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::game_runner::run_game;
use crate::metrics::{BatchSummary, GameMetrics};
use crate::scenario::{Scenario, ScenarioError};

/// Configuration for a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Scenario files or built-in names (`duel`, `solo`).
    pub scenarios: Vec<String>,
    /// Maximum parallel matches (0 = use rayon default).
    pub parallel_games: u32,
    /// Output directory for results.
    pub output_dir: PathBuf,
    /// Overrides every scenario's tick limit when set.
    pub max_ticks: Option<u64>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            scenarios: vec!["duel".to_string(), "solo".to_string()],
            parallel_games: 0,
            output_dir: PathBuf::from("results"),
            max_ticks: None,
        }
    }
}

impl BatchConfig {
    /// Config for an explicit list of scenarios.
    pub fn new<I, S>(scenarios: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            scenarios: scenarios.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Config covering every `.ron` file in `dir`, in file name order.
    pub fn from_dir(dir: &Path) -> std::io::Result<Self> {
        let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().is_some_and(|ext| ext == "ron"))
            .collect();
        files.sort();
        Ok(Self::new(files.iter().map(|p| p.display().to_string())))
    }

    /// Set output directory.
    pub fn with_output(mut self, dir: PathBuf) -> Self {
        self.output_dir = dir;
        self
    }

    /// Cap every match at `ticks`.
    pub fn with_max_ticks(mut self, ticks: u64) -> Self {
        self.max_ticks = Some(ticks);
        self
    }
}

/// Results from a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResults {
    /// Configuration used.
    pub config: BatchConfig,
    /// Individual match metrics.
    pub games: Vec<GameMetrics>,
    /// Aggregate summary.
    pub summary: BatchSummary,
    /// Total runtime.
    pub duration_seconds: f64,
    /// Errors encountered.
    pub errors: Vec<BatchError>,
}

impl BatchResults {
    /// Save results to a JSON file.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Load results from a JSON file.
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(std::io::Error::other)
    }
}

/// A match that could not be played.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchError {
    /// Index into [`BatchConfig::scenarios`].
    pub game_index: u32,
    /// Scenario name or path.
    pub scenario: String,
    /// Error message.
    pub message: String,
}

/// Progress tracking for batch runs.
#[derive(Debug)]
pub struct BatchProgress {
    /// Total matches.
    pub total: u32,
    completed: AtomicU32,
    start_time: Instant,
    wins: Mutex<HashMap<String, u32>>,
}

impl BatchProgress {
    /// Create a new progress tracker.
    pub fn new(total: u32) -> Self {
        Self {
            total,
            completed: AtomicU32::new(0),
            start_time: Instant::now(),
            wins: Mutex::new(HashMap::new()),
        }
    }

    /// Record a completed match.
    pub fn record_completion(&self, winner: Option<&str>) {
        self.completed.fetch_add(1, Ordering::Relaxed);
        if let Some(w) = winner {
            if let Ok(mut wins) = self.wins.lock() {
                *wins.entry(w.to_string()).or_insert(0) += 1;
            }
        }
    }

    /// Completed matches so far.
    pub fn current(&self) -> u32 {
        self.completed.load(Ordering::Relaxed)
    }

    /// Completion percentage.
    pub fn percentage(&self) -> f64 {
        f64::from(self.current()) / f64::from(self.total.max(1)) * 100.0
    }

    /// Estimated time remaining.
    pub fn eta(&self) -> Duration {
        let completed = self.current();
        if completed == 0 {
            return Duration::from_secs(0);
        }
        let per_game = self.start_time.elapsed().as_secs_f64() / f64::from(completed);
        let remaining = self.total.saturating_sub(completed);
        Duration::from_secs_f64(per_game * f64::from(remaining))
    }

    /// Win rates among completed matches.
    pub fn current_win_rates(&self) -> HashMap<String, f64> {
        let completed = self.current();
        if completed == 0 {
            return HashMap::new();
        }
        self.wins
            .lock()
            .map(|wins| {
                wins.iter()
                    .map(|(k, &v)| (k.clone(), f64::from(v) / f64::from(completed)))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Resolve a built-in scenario name or load a scenario file.
pub fn resolve_scenario(name: &str) -> Result<Scenario, ScenarioError> {
    match name {
        "duel" => Ok(Scenario::duel()),
        "solo" => Ok(Scenario::solo()),
        path => Scenario::load(path),
    }
}

fn run_single_game(name: &str, config: &BatchConfig) -> Result<GameMetrics, String> {
    let mut scenario = resolve_scenario(name).map_err(|e| e.to_string())?;
    if let Some(ticks) = config.max_ticks {
        scenario.max_ticks = ticks;
    }
    let result = run_game(&scenario).map_err(|e| e.to_string())?;
    Ok(result.metrics)
}

/// Run a batch of matches.
pub fn run_batch(config: BatchConfig) -> BatchResults {
    let start = Instant::now();
    let total = config.scenarios.len() as u32;
    let progress = BatchProgress::new(total);

    info!(matches = total, "Starting batch run");

    if config.parallel_games > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(config.parallel_games as usize)
            .build_global()
            .ok(); // Ignore if already set
    }

    let results: Vec<Result<GameMetrics, BatchError>> = config
        .scenarios
        .par_iter()
        .enumerate()
        .map(|(i, name)| match run_single_game(name, &config) {
            Ok(metrics) => {
                let winner = metrics.winner.map(|w| w.to_string());
                progress.record_completion(winner.as_deref());
                debug!(
                    completed = progress.current(),
                    total,
                    eta_s = progress.eta().as_secs(),
                    scenario = %name,
                    "Batch progress"
                );
                Ok(metrics)
            }
            Err(message) => {
                warn!(game = i, scenario = %name, error = %message, "Match failed");
                Err(BatchError {
                    game_index: i as u32,
                    scenario: name.clone(),
                    message,
                })
            }
        })
        .collect();

    let mut games = Vec::new();
    let mut errors = Vec::new();
    for result in results {
        match result {
            Ok(metrics) => games.push(metrics),
            Err(error) => errors.push(error),
        }
    }

    let summary = BatchSummary::from_games(&games);
    let duration_seconds = start.elapsed().as_secs_f64();

    info!(
        games = games.len(),
        errors = errors.len(),
        duration_s = duration_seconds,
        "Batch complete"
    );

    BatchResults {
        config,
        games,
        summary,
        duration_seconds,
        errors,
    }
}

/// Play `scenario` `runs` times and check every run ends in the same state.
pub fn scenario_is_deterministic(scenario: &Scenario, runs: u32) -> Result<bool, String> {
    let mut first: Option<GameMetrics> = None;
    for run in 0..runs {
        let metrics = run_game(scenario).map_err(|e| e.to_string())?.metrics;
        match &first {
            None => first = Some(metrics),
            Some(reference) => {
                if metrics != *reference {
                    warn!(
                        run,
                        expected = reference.final_state_hash,
                        actual = metrics.final_state_hash,
                        "Run diverged"
                    );
                    return Ok(false);
                }
            }
        }
    }
    Ok(true)
}
