//! Scenario loading and configuration.
//!
//! A scenario bundles a map, the tanks the AI drives, match limits and the
//! tuning of both the AI and the arena.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use ctf_core::config::AiConfig;
use ctf_core::error::GameError;
use ctf_core::map::{GameMap, StartPosition};

use crate::config::ArenaConfig;

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// File not found.
    #[error("Scenario file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read scenario file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// The embedded map is inconsistent.
    #[error("Invalid map: {0}")]
    InvalidMap(#[from] GameError),
    /// An AI slot names a tank the map does not spawn.
    #[error("AI tank {index} does not exist (map has {tanks} tanks)")]
    UnknownAiTank {
        /// Requested tank index.
        index: usize,
        /// Tanks on the map.
        tanks: usize,
    },
    /// Match limits are zero.
    #[error("Scenario '{0}' needs positive max_ticks and rounds_to_win")]
    InvalidLimits(String),
}

fn default_max_ticks() -> u64 {
    // Five minutes at 50 ticks per second.
    15_000
}

fn default_rounds_to_win() -> u32 {
    1
}

/// A complete scenario configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Map to play on.
    pub map: GameMap,
    /// Indices of the tanks driven by the AI; the rest stand still.
    pub ai_tanks: Vec<usize>,
    /// Tick limit; the match is decided on score when reached.
    #[serde(default = "default_max_ticks")]
    pub max_ticks: u64,
    /// Captures needed to win the match.
    #[serde(default = "default_rounds_to_win")]
    pub rounds_to_win: u32,
    /// AI tuning.
    #[serde(default)]
    pub ai: AiConfig,
    /// Arena tuning.
    #[serde(default)]
    pub arena: ArenaConfig,
}

impl Default for Scenario {
    fn default() -> Self {
        Self::duel()
    }
}

impl Scenario {
    /// Load a scenario from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Load from a RON string (useful for embedded scenarios).
    pub fn from_ron_str(ron: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = ron::from_str(ron)?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Check the map and the AI slots.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        self.map.validate()?;
        let tanks = self.map.start_positions.len();
        if let Some(&index) = self.ai_tanks.iter().find(|&&i| i >= tanks) {
            return Err(ScenarioError::UnknownAiTank { index, tanks });
        }
        if self.max_ticks == 0 || self.rounds_to_win == 0 {
            return Err(ScenarioError::InvalidLimits(self.name.clone()));
        }
        Ok(())
    }

    /// Two AI tanks on a small symmetric map; the flag sits in a ring of wood.
    #[must_use]
    pub fn duel() -> Self {
        let map = GameMap::from_ascii(
            "Duel",
            &[
                "###########",
                "#.........#",
                "#....w....#",
                "#...w.w...#",
                "#....w....#",
                "#.........#",
                "###########",
            ],
            vec![
                StartPosition::new(1.5, 1.5, -90.0),
                StartPosition::new(9.5, 5.5, 90.0),
            ],
            (5.5, 3.5),
        );
        Self {
            name: "Duel".to_string(),
            description: "Two AI tanks race for a flag walled in by wood".to_string(),
            map,
            ai_tanks: vec![0, 1],
            max_ticks: default_max_ticks(),
            rounds_to_win: 3,
            ai: AiConfig::default(),
            arena: ArenaConfig::default(),
        }
    }

    /// A single AI tank against a stationary opponent on an open field.
    #[must_use]
    pub fn solo() -> Self {
        let map = GameMap::from_ascii(
            "Field",
            &["........", "........", "........", "........"],
            vec![
                StartPosition::new(0.5, 0.5, -90.0),
                StartPosition::new(7.5, 3.5, 90.0),
            ],
            (5.5, 2.5),
        );
        Self {
            name: "Solo".to_string(),
            description: "One AI tank fetches the flag unopposed".to_string(),
            map,
            ai_tanks: vec![0],
            max_ticks: 5_000,
            rounds_to_win: 1,
            ai: AiConfig::default(),
            arena: ArenaConfig::default(),
        }
    }
}
