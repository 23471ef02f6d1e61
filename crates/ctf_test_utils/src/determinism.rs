//! Determinism testing utilities.
//!
//! Provides a harness for verifying that a match produces identical results
//! given identical inputs.
//!
//! # Testing Strategy
//!
//! Replays and batch comparisons rely on a match being reproducible.
//! Sources of non-determinism include:
//!
//! - **HashMap iteration order**: Rust's default hasher is randomized.
//!   Route search breaks ties by neighbour order, never by map iteration.
//!
//! - **System randomness**: No calls to `rand()` anywhere in the tick.
//!
//! - **Floating-point**: Positions are `f64`; hashes use the bit pattern, so
//!   any drift in operation order shows up as a mismatch.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of ticks simulated.
    pub ticks: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic match).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the runs were deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Match is non-deterministic!\n\
                 Runs: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a simulation multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run the simulation
/// * `ticks` - Number of ticks to simulate per run
/// * `setup` - Function to create initial state
/// * `step` - Function to advance the state by one tick
/// * `hash` - Function to compute the state hash
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    ticks: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for _ in 0..ticks {
            step(&mut state);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        ticks,
    }
}

/// Step two copies side by side, returning the first tick where they differ.
///
/// `None` if both runs hash identically throughout.
pub fn find_first_divergence<S, Setup, Step, HashFn>(
    ticks: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> Option<u64>
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut first = setup();
    let mut second = setup();

    if hash(&first) != hash(&second) {
        return Some(0);
    }

    for tick in 1..=ticks {
        step(&mut first);
        step(&mut second);

        if hash(&first) != hash(&second) {
            return Some(tick);
        }
    }

    None
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Hash a sequence of floats by bit pattern.
pub fn hash_f64s(values: impl IntoIterator<Item = f64>) -> u64 {
    let mut hasher = DefaultHasher::new();
    for value in values {
        value.to_bits().hash(&mut hasher);
    }
    hasher.finish()
}

/// Proptest strategies for grid and heading properties.
pub mod strategies {
    use ctf_core::grid::{Cell, ObstacleGrid, ObstacleKind};
    use proptest::prelude::*;

    /// Grid dimensions between 1 and `max` on each axis.
    pub fn arb_dimensions(max: u32) -> impl Strategy<Value = (u32, u32)> {
        (1..=max, 1..=max)
    }

    /// A cell inside a `width` x `height` grid.
    pub fn arb_cell(width: u32, height: u32) -> impl Strategy<Value = Cell> {
        (0..width as i32, 0..height as i32).prop_map(|(x, y)| Cell::new(x, y))
    }

    /// Any obstacle class, biased toward open ground.
    pub fn arb_obstacle_kind() -> impl Strategy<Value = ObstacleKind> {
        prop_oneof![
            6 => Just(ObstacleKind::None),
            2 => Just(ObstacleKind::Rock),
            1 => Just(ObstacleKind::Wood),
            1 => Just(ObstacleKind::Metal),
        ]
    }

    /// Random obstacle grid with two random cells, all within bounds.
    pub fn arb_grid_with_endpoints(max: u32) -> impl Strategy<Value = (ObstacleGrid, Cell, Cell)> {
        arb_dimensions(max).prop_flat_map(|(width, height)| {
            let cells = (width * height) as usize;
            (
                proptest::collection::vec(arb_obstacle_kind(), cells),
                arb_cell(width, height),
                arb_cell(width, height),
            )
                .prop_map(move |(kinds, start, goal)| {
                    let mut grid = ObstacleGrid::new(width, height);
                    for (i, kind) in kinds.into_iter().enumerate() {
                        let cell = Cell::new((i as u32 % width) as i32, (i as u32 / width) as i32);
                        grid.set(cell, kind);
                    }
                    (grid, start, goal)
                })
        })
    }

    /// Angle in radians, spanning several turns either side of zero.
    pub fn arb_angle() -> impl Strategy<Value = f64> {
        -20.0f64..20.0f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_determinism_simple() {
        let result = verify_determinism(3, 10, || 0u64, |n| *n += 3, compute_hash);
        result.assert_deterministic();
        assert_eq!(result.unique_hashes().len(), 1);
    }

    #[test]
    fn test_find_divergence_none_for_pure_step() {
        assert_eq!(
            find_first_divergence(20, || 1.5f64, |x| *x *= 1.01, |x| hash_f64s([*x])),
            None
        );
    }

    #[test]
    #[should_panic(expected = "non-deterministic")]
    fn test_assert_deterministic_panics() {
        DeterminismResult {
            is_deterministic: false,
            hashes: vec![1, 2],
            ticks: 1,
        }
        .assert_deterministic();
    }

    #[test]
    fn test_hash_f64s_distinguishes_signed_zero() {
        assert_ne!(hash_f64s([0.0]), hash_f64s([-0.0]));
    }
}
