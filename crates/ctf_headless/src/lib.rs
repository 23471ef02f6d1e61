//! Headless capture-the-flag runner for AI testing and CI verification.
//!
//! Plays the tank AI from `ctf_core` in a small deterministic arena without
//! graphics. This enables:
//!
//! - **AI testing**: Scenarios check that tanks find, fetch and return the flag
//! - **CI verification**: Repeated runs must end in the same state hash
//! - **Batch comparison**: Many scenarios in parallel, summarized as JSON
//!
//! Logs go to stderr; metrics are written as JSON.
//!
//! # Example
//!
//! ```bash
//! # Play the built-in duel
//! cargo run -p ctf_headless -- run --scenario duel
//!
//! # Play every scenario in a directory
//! cargo run -p ctf_headless -- batch --scenarios scenarios/ --output results/
//!
//! # Show the route the AI would take
//! cargo run -p ctf_headless -- path --scenario duel --from 1,1 --to 5,3
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod arena;
pub mod ascii;
pub mod batch;
pub mod config;
pub mod game_runner;
pub mod metrics;
pub mod raycast;
pub mod scenario;

pub use arena::{Arena, ArenaEvent, ArenaTank, Bullet};
pub use batch::{run_batch, scenario_is_deterministic, BatchConfig, BatchResults};
pub use config::ArenaConfig;
pub use game_runner::{run_game, run_game_observed, GameResult};
pub use metrics::{BatchSummary, GameMetrics, RoundOutcome, TankStats};
pub use scenario::{Scenario, ScenarioError};
