//! Match execution for headless testing.
//!
//! Plays a [`Scenario`] in an [`Arena`] until a tank has captured the flag
//! `rounds_to_win` times or the tick limit is reached.
//!
//! - The loop is bounded by `max_ticks`
//! - Progress is logged at regular intervals
//! - Slow ticks are reported

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use ctf_core::error::Result;
use ctf_core::world::TankId;

use crate::arena::{Arena, ArenaEvent};
use crate::metrics::{GameMetrics, RoundOutcome, TankStats};
use crate::scenario::Scenario;

/// Progress logging interval (ticks).
const PROGRESS_LOG_INTERVAL: u64 = 1000;

/// Ticks taking longer than this are logged as slow (ms).
const SLOW_TICK_THRESHOLD_MS: u128 = 50;

/// Result of running a match.
#[derive(Debug, Clone)]
pub struct GameResult {
    /// Collected metrics.
    pub metrics: GameMetrics,
    /// Arena state hash after the last tick.
    pub final_state_hash: u64,
}

/// Run a complete match.
pub fn run_game(scenario: &Scenario) -> Result<GameResult> {
    run_game_observed(scenario, |_, _| {})
}

/// Run a complete match, calling `observe` after every tick.
pub fn run_game_observed<F>(scenario: &Scenario, mut observe: F) -> Result<GameResult>
where
    F: FnMut(&Arena, &[ArenaEvent]),
{
    let game_start = Instant::now();
    info!(
        scenario = %scenario.name,
        map = %scenario.map.name,
        max_ticks = scenario.max_ticks,
        rounds_to_win = scenario.rounds_to_win,
        "Starting match"
    );

    let mut arena = Arena::new(
        &scenario.map,
        &scenario.ai_tanks,
        &scenario.ai,
        scenario.arena.clone(),
    )?;
    let mut metrics = GameMetrics::new(&scenario.name, &scenario.map.name);

    let mut winner: Option<TankId> = None;
    let mut last_progress_log = Instant::now();

    while arena.tick_count() < scenario.max_ticks {
        let tick_start = Instant::now();
        let events = arena.tick();
        let tick = arena.tick_count();

        let elapsed = tick_start.elapsed().as_millis();
        if elapsed > SLOW_TICK_THRESHOLD_MS {
            warn!(
                tick,
                duration_ms = elapsed,
                threshold_ms = SLOW_TICK_THRESHOLD_MS,
                "Slow tick detected"
            );
        }

        for event in &events {
            if let ArenaEvent::RoundWon(tank) = *event {
                metrics.rounds.push(RoundOutcome { tick, winner: tank });
                if metrics.rounds_won(tank) >= scenario.rounds_to_win as usize {
                    winner = Some(tank);
                }
            }
        }
        observe(&arena, &events);

        if winner.is_some() {
            break;
        }

        if tick % PROGRESS_LOG_INTERVAL == 0 || last_progress_log.elapsed() > Duration::from_secs(5)
        {
            debug!(
                tick,
                max_ticks = scenario.max_ticks,
                progress_pct = (tick as f64 / scenario.max_ticks as f64 * 100.0) as u32,
                rounds = metrics.rounds.len(),
                bullets = arena.bullets().len(),
                elapsed_ms = game_start.elapsed().as_millis(),
                "Match progress"
            );
            last_progress_log = Instant::now();
        }
    }

    metrics.tanks = arena.stats();
    let condition = if winner.is_some() {
        "captures"
    } else {
        winner = leader_on_score(&metrics.tanks);
        if winner.is_some() {
            "score"
        } else {
            "timeout"
        }
    };
    let final_state_hash = arena.state_hash();
    metrics.finalize(arena.tick_count(), winner, condition);
    metrics.final_state_hash = final_state_hash;

    info!(
        scenario = %scenario.name,
        duration_ticks = metrics.duration_ticks,
        duration_ms = game_start.elapsed().as_millis(),
        winner = ?metrics.winner,
        win_condition = %metrics.win_condition,
        rounds = metrics.rounds.len(),
        "Match complete"
    );

    Ok(GameResult {
        metrics,
        final_state_hash,
    })
}

/// Tank with the strictly highest score, if any.
fn leader_on_score(tanks: &[TankStats]) -> Option<TankId> {
    let best = tanks.iter().map(|t| t.score).max()?;
    let mut leaders = tanks.iter().filter(|t| t.score == best);
    match (leaders.next(), leaders.next()) {
        (Some(leader), None) if best > 0 => Some(leader.tank),
        _ => None,
    }
}
