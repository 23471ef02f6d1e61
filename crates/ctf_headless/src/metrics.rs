//! Match metrics collection.
//!
//! Per-tank counters are accumulated by the arena as events happen; the
//! runner snapshots them into a [`GameMetrics`] when the match ends.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use ctf_core::world::TankId;

/// Running counters for one tank.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TankStats {
    /// Tank identifier.
    pub tank: TankId,
    /// Whether the AI drove this tank.
    pub ai_controlled: bool,
    /// Score using the classic rules: +1 box, +5 kill, +10 carrier kill, +100 capture.
    pub score: u32,
    /// Bullets fired.
    pub shots: u32,
    /// Enemy tanks destroyed.
    pub kills: u32,
    /// Times destroyed.
    pub deaths: u32,
    /// Wooden boxes destroyed.
    pub boxes_destroyed: u32,
    /// Times the flag was picked up.
    pub flag_grabs: u32,
    /// Flags brought home.
    pub captures: u32,
}

impl TankStats {
    /// Fresh counters for `tank`.
    #[must_use]
    pub fn new(tank: TankId, ai_controlled: bool) -> Self {
        Self {
            tank,
            ai_controlled,
            ..Default::default()
        }
    }
}

/// A finished round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundOutcome {
    /// Tick at which the flag was brought home.
    pub tick: u64,
    /// Tank that captured the flag.
    pub winner: TankId,
}

/// Complete metrics for a single match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameMetrics {
    /// Scenario name.
    pub scenario: String,
    /// Map name.
    pub map: String,
    /// Total match duration in ticks.
    pub duration_ticks: u64,
    /// Match winner (None = draw).
    pub winner: Option<TankId>,
    /// How the match ended.
    pub win_condition: String,
    /// Rounds played to completion.
    pub rounds: Vec<RoundOutcome>,
    /// Per-tank counters, in tank order.
    pub tanks: Vec<TankStats>,
    /// Final arena state hash (for determinism validation).
    pub final_state_hash: u64,
}

impl GameMetrics {
    /// Create a new metrics record.
    #[must_use]
    pub fn new(scenario: impl Into<String>, map: impl Into<String>) -> Self {
        Self {
            scenario: scenario.into(),
            map: map.into(),
            ..Default::default()
        }
    }

    /// Finalize the match with its outcome.
    pub fn finalize(&mut self, duration: u64, winner: Option<TankId>, condition: &str) {
        self.duration_ticks = duration;
        self.winner = winner;
        self.win_condition = condition.to_string();
    }

    /// Rounds won by `tank`.
    #[must_use]
    pub fn rounds_won(&self, tank: TankId) -> usize {
        self.rounds.iter().filter(|r| r.winner == tank).count()
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Summary statistics across multiple matches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Total matches played.
    pub total_games: u32,
    /// Matches won per tank (keyed by display name).
    pub wins_by_tank: BTreeMap<String, u32>,
    /// Win rates per tank.
    pub win_rates: BTreeMap<String, f64>,
    /// Average match duration in ticks.
    pub avg_duration_ticks: f64,
    /// Shortest match.
    pub min_duration_ticks: u64,
    /// Longest match.
    pub max_duration_ticks: u64,
    /// Draws count.
    pub draws: u32,
    /// Total bullets fired across all matches.
    pub total_shots: u64,
    /// Total boxes destroyed across all matches.
    pub total_boxes_destroyed: u64,
}

impl BatchSummary {
    /// Calculate summary from a list of match metrics.
    #[must_use]
    pub fn from_games(games: &[GameMetrics]) -> Self {
        if games.is_empty() {
            return Self::default();
        }

        let mut summary = Self {
            total_games: games.len() as u32,
            min_duration_ticks: u64::MAX,
            ..Default::default()
        };

        let mut duration_sum = 0u64;
        for game in games {
            duration_sum += game.duration_ticks;
            summary.min_duration_ticks = summary.min_duration_ticks.min(game.duration_ticks);
            summary.max_duration_ticks = summary.max_duration_ticks.max(game.duration_ticks);

            match game.winner {
                Some(winner) => *summary.wins_by_tank.entry(winner.to_string()).or_default() += 1,
                None => summary.draws += 1,
            }

            for tank in &game.tanks {
                summary.total_shots += u64::from(tank.shots);
                summary.total_boxes_destroyed += u64::from(tank.boxes_destroyed);
            }
        }

        summary.avg_duration_ticks = duration_sum as f64 / games.len() as f64;
        summary.win_rates = summary
            .wins_by_tank
            .iter()
            .map(|(tank, &wins)| (tank.clone(), f64::from(wins) / games.len() as f64))
            .collect();
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game(winner: Option<u32>, duration: u64) -> GameMetrics {
        let mut metrics = GameMetrics::new("test", "arena");
        let mut stats = TankStats::new(TankId(0), true);
        stats.shots = 3;
        metrics.tanks.push(stats);
        metrics.finalize(duration, winner.map(TankId), "capture");
        metrics
    }

    #[test]
    fn test_summary_counts_wins_and_draws() {
        let games = [game(Some(1), 100), game(Some(1), 300), game(None, 200)];
        let summary = BatchSummary::from_games(&games);

        assert_eq!(summary.total_games, 3);
        assert_eq!(summary.wins_by_tank["tank-1"], 2);
        assert_eq!(summary.draws, 1);
        assert_eq!(summary.min_duration_ticks, 100);
        assert_eq!(summary.max_duration_ticks, 300);
        assert!((summary.avg_duration_ticks - 200.0).abs() < 1e-9);
        assert!((summary.win_rates["tank-1"] - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(summary.total_shots, 9);
    }

    #[test]
    fn test_empty_summary() {
        assert_eq!(BatchSummary::from_games(&[]), BatchSummary::default());
    }

    #[test]
    fn test_metrics_json_roundtrip() {
        let mut metrics = game(Some(0), 42);
        metrics.rounds.push(RoundOutcome {
            tick: 42,
            winner: TankId(0),
        });
        let json = metrics.to_json().unwrap();
        let loaded: GameMetrics = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded, metrics);
        assert_eq!(loaded.rounds_won(TankId(0)), 1);
    }
}
