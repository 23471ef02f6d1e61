//! Property-based checks for route search, heading math and steering.

use std::collections::{HashMap, VecDeque};
use std::f64::consts::{FRAC_PI_2, TAU};

use ctf_core::config::AiConfig;
use ctf_core::grid::{is_traversable, neighbors, Cell, ObstacleGrid, TraversabilityPolicy};
use ctf_core::math::{periodic_difference, Vec2};
use ctf_core::pathfinding::find_shortest_path;
use ctf_core::steering::{AgentState, SteeringPhase, Suspension};
use ctf_core::world::Flag;
use ctf_test_utils::determinism::strategies::{arb_angle, arb_cell, arb_grid_with_endpoints};
use ctf_test_utils::fixtures::{open_grid, ScriptedTank, TankCommand};
use proptest::prelude::*;

const STRICT: TraversabilityPolicy = TraversabilityPolicy::GrassAndWoodOnly;

/// Reference hop count from `start` to `goal`, if reachable.
fn hop_distance(grid: &ObstacleGrid, start: Cell, goal: Cell) -> Option<usize> {
    let mut distance = HashMap::from([(start, 0usize)]);
    let mut frontier = VecDeque::from([start]);
    while let Some(current) = frontier.pop_front() {
        let hops = distance[&current];
        if current == goal {
            return Some(hops);
        }
        for next in neighbors(grid, current, STRICT) {
            distance.entry(next).or_insert_with(|| {
                frontier.push_back(next);
                hops + 1
            });
        }
    }
    None
}

fn assert_route(grid: &ObstacleGrid, start: Cell, path: &VecDeque<Cell>) {
    let mut previous = start;
    for &cell in path {
        assert!(previous.is_adjacent(cell), "{previous:?} -> {cell:?}");
        assert!(is_traversable(grid, cell, STRICT), "{cell:?}");
        previous = cell;
    }
}

proptest! {
    /// Open grids always yield a Manhattan-length route of adjacent steps.
    #[test]
    fn prop_open_grid_path_is_manhattan(
        (width, height, start, goal) in (1u32..12, 1u32..12).prop_flat_map(|(w, h)| {
            (Just(w), Just(h), arb_cell(w, h), arb_cell(w, h))
        })
    ) {
        let grid = open_grid(width, height);
        let path = find_shortest_path(&grid, start, goal, STRICT);

        prop_assert_eq!(path.len() as u32, start.manhattan_distance(goal));
        if start != goal {
            prop_assert_eq!(path.back().copied(), Some(goal));
        }
        assert_route(&grid, start, &path);
    }

    /// With obstacles the route is as short as a reference search finds.
    #[test]
    fn prop_path_is_shortest((grid, start, goal) in arb_grid_with_endpoints(10)) {
        let path = find_shortest_path(&grid, start, goal, STRICT);

        match hop_distance(&grid, start, goal) {
            Some(hops) => {
                prop_assert_eq!(path.len(), hops);
                if hops > 0 {
                    prop_assert_eq!(path.back().copied(), Some(goal));
                }
                assert_route(&grid, start, &path);
            }
            None => prop_assert!(path.is_empty()),
        }
    }

    /// Identical inputs give identical routes.
    #[test]
    fn prop_path_is_reproducible((grid, start, goal) in arb_grid_with_endpoints(8)) {
        prop_assert_eq!(
            find_shortest_path(&grid, start, goal, STRICT),
            find_shortest_path(&grid, start, goal, STRICT)
        );
    }

    /// Periodic difference stays in `[0, 2π)` and differs from `a - b` by whole turns.
    #[test]
    fn prop_periodic_difference_range(a in arb_angle(), b in arb_angle()) {
        let diff = periodic_difference(a, b);
        prop_assert!((0.0..TAU).contains(&diff), "{diff}");

        let turns = (a - b - diff) / TAU;
        prop_assert!((turns - turns.round()).abs() < 1e-9);
    }

    #[test]
    fn prop_periodic_difference_of_self_is_zero(a in arb_angle()) {
        prop_assert_eq!(periodic_difference(a, a), 0.0);
    }

    /// Within the heading tolerance the tank never turns before driving.
    #[test]
    fn prop_small_heading_error_skips_turn(
        error_degrees in -2.9f64..2.9,
        turns in -2i32..3,
    ) {
        let map = open_grid(5, 5);
        let flag = Flag::at(Vec2::new(4.5, 2.5));
        let facing = -FRAC_PI_2 + error_degrees.to_radians() + f64::from(turns) * TAU;
        let mut tank = ScriptedTank::new(0, Vec2::new(2.5, 2.5), facing);
        let mut state = AgentState::new(tank.position);
        let config = AiConfig::default();

        state.step(&mut tank, &map, Some(&flag), &config);
        let outcome = state.step(&mut tank, &map, Some(&flag), &config);

        prop_assert_eq!(outcome, Suspension::Driving);
        prop_assert_eq!(tank.count(TankCommand::TurnLeft), 0);
        prop_assert_eq!(tank.count(TankCommand::TurnRight), 0);
        prop_assert_eq!(tank.count(TankCommand::StopMoving), 0);
        prop_assert_eq!(tank.count(TankCommand::Accelerate), 1);
    }

    /// Outside the tolerance the tank turns the way that shrinks the error.
    #[test]
    fn prop_large_heading_error_turns_toward_target(error_degrees in 3.5f64..175.0, sign in prop::bool::ANY) {
        let map = open_grid(5, 5);
        let flag = Flag::at(Vec2::new(4.5, 2.5));
        let error = if sign { error_degrees } else { -error_degrees };
        let mut tank = ScriptedTank::new(0, Vec2::new(2.5, 2.5), -FRAC_PI_2 + error.to_radians());
        let mut state = AgentState::new(tank.position);
        let config = AiConfig::default();

        state.step(&mut tank, &map, Some(&flag), &config);
        let outcome = state.step(&mut tank, &map, Some(&flag), &config);

        prop_assert_eq!(outcome, Suspension::Turning);
        let is_rotating = matches!(state.phase, SteeringPhase::Rotating { .. });
        prop_assert!(is_rotating);
        if sign {
            prop_assert_eq!(tank.count(TankCommand::TurnLeft), 1);
        } else {
            prop_assert_eq!(tank.count(TankCommand::TurnRight), 1);
        }
    }
}
