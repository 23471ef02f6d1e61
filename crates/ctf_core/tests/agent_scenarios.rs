//! End-to-end agent behaviour against scripted collaborators.

use ctf_core::agent::{Agent, AgentContext};
use ctf_core::combat::maybe_shoot;
use ctf_core::config::AiConfig;
use ctf_core::grid::{Cell, ObstacleKind, ObstacleMap, TraversabilityPolicy};
use ctf_core::math::Vec2;
use ctf_core::pathfinding::{find_path_with_fallback, find_shortest_path};
use ctf_core::steering::{AgentState, SteeringPhase, Suspension};
use ctf_core::target::{resolve_goal, FlagBinding};
use ctf_core::world::{Flag, HitTarget, SceneObject, TankControls, TankId};
use ctf_test_utils::fixtures::{
    duel_map, grid_from_ascii, open_grid, ScriptedTank, ScriptedWorld, TankCommand,
};

/// Hull angle that faces +x.
const FACING_EAST: f64 = -std::f64::consts::FRAC_PI_2;

/// Drive `tank` with `agent` until `done` holds or `max_ticks` elapse.
fn run_until<M: ObstacleMap>(
    agent: &mut Agent,
    tank: &mut ScriptedTank,
    map: &M,
    flag: &Flag,
    max_ticks: u32,
    done: impl Fn(&ScriptedTank) -> bool,
) -> Option<u32> {
    let mut world = ScriptedWorld::empty();
    for tick in 0..max_ticks {
        if done(tank) {
            return Some(tick);
        }
        let mut ctx = AgentContext {
            tank: &mut *tank,
            world: &mut world,
            map,
            flag: Some(flag),
            tanks: &[TankId(0)],
        };
        agent.decide(&mut ctx);
        tank.advance(0.1, 0.04);
    }
    None
}

#[test]
fn test_open_grid_corner_to_corner() {
    let grid = open_grid(5, 5);
    let path = find_shortest_path(
        &grid,
        Cell::new(0, 0),
        Cell::new(4, 4),
        TraversabilityPolicy::GrassAndWoodOnly,
    );
    assert_eq!(path.len(), 8);
    assert_eq!(path.back(), Some(&Cell::new(4, 4)));
}

#[test]
fn test_goal_switches_to_home_when_carrying() {
    let flag = Flag::at(Vec2::new(2.5, 2.5));
    let mut tank = ScriptedTank::new(1, Vec2::new(0.5, 4.5), 0.0);

    assert_eq!(resolve_goal(&tank, Some(&flag)), Some(Cell::new(2, 2)));
    tank.carrying_flag = true;
    assert_eq!(resolve_goal(&tank, Some(&flag)), Some(Cell::new(0, 4)));
}

#[test]
fn test_fires_once_at_wood_in_range() {
    let mut tank = ScriptedTank::new(0, Vec2::new(1.5, 1.5), 0.0);
    let mut world = ScriptedWorld::hitting(HitTarget::Obstacle(ObstacleKind::Wood), 3.0);
    let map = open_grid(8, 8);

    let shot = maybe_shoot(&mut tank, &mut world, &map, &AiConfig::default());

    assert!(shot.is_some());
    assert_eq!(tank.count(TankCommand::Fire), 1);
    assert_eq!(tank.cooldown, 50);
    assert_eq!(world.spawned.len(), 1);
    assert_eq!(world.rays.borrow().len(), 1);
}

#[test]
fn test_reloading_tank_holds_fire() {
    let mut tank = ScriptedTank::new(0, Vec2::new(1.5, 1.5), 0.0);
    tank.cooldown = 10;
    let mut world = ScriptedWorld::hitting(HitTarget::Obstacle(ObstacleKind::Wood), 3.0);
    let map = open_grid(8, 8);

    assert!(maybe_shoot(&mut tank, &mut world, &map, &AiConfig::default()).is_none());
    assert_eq!(tank.count(TankCommand::Fire), 0);
    assert_eq!(tank.cooldown, 10);
    assert!(world.spawned.is_empty());
    assert!(world.rays.borrow().is_empty());
}

#[test]
fn test_enclosed_goal_has_no_route() {
    let grid = grid_from_ascii(&[".....", ".###.", ".#.#.", ".###.", "....."]);
    let (path, policy) = find_path_with_fallback(&grid, Cell::new(0, 0), Cell::new(2, 2));
    assert!(path.is_empty());
    assert_eq!(policy, None);
}

#[test]
fn test_metal_ring_needs_relaxed_policy() {
    let grid = grid_from_ascii(&[".....", ".mmm.", ".m.m.", ".mmm.", "....."]);
    let strict = find_shortest_path(
        &grid,
        Cell::new(0, 0),
        Cell::new(2, 2),
        TraversabilityPolicy::GrassAndWoodOnly,
    );
    assert!(strict.is_empty());

    let (path, policy) = find_path_with_fallback(&grid, Cell::new(0, 0), Cell::new(2, 2));
    assert_eq!(path.len(), 4);
    assert_eq!(policy, Some(TraversabilityPolicy::GrassWoodAndMetal));
}

#[test]
fn test_waypoints_only_consumed_on_arrival() {
    let map = open_grid(5, 1);
    let flag = Flag::at(Vec2::new(4.5, 0.5));
    let config = AiConfig::default();
    let mut tank = ScriptedTank::new(0, Vec2::new(0.5, 0.5), FACING_EAST);
    let mut state = AgentState::new(tank.position);

    assert_eq!(
        state.step(&mut tank, &map, Some(&flag), &config),
        Suspension::WaypointSelected
    );
    assert_eq!(state.path.len(), 3);

    let mut drive_ticks = 0;
    loop {
        let outcome = state.step(&mut tank, &map, Some(&flag), &config);
        tank.advance(0.1, 0.0);
        if outcome == Suspension::WaypointSelected {
            break;
        }
        assert_eq!(outcome, Suspension::Driving);
        assert_eq!(state.path.len(), 3, "consumed early at tick {drive_ticks}");
        drive_ticks += 1;
        assert!(drive_ticks < 100, "never arrived");
    }

    assert_eq!(state.path.len(), 2);
    assert_eq!(state.grid_cell, Cell::new(1, 0));
    assert!(drive_ticks >= 10);
}

#[test]
fn test_cloned_state_resumes_identically() {
    let map = open_grid(6, 6);
    let flag = Flag::at(Vec2::new(5.5, 3.5));
    let config = AiConfig::default();
    let mut tank = ScriptedTank::new(0, Vec2::new(0.5, 0.5), 0.0);
    let mut state = AgentState::new(tank.position);

    for _ in 0..40 {
        state.step(&mut tank, &map, Some(&flag), &config);
        tank.advance(0.1, 0.04);
    }

    let mut twin_tank = tank.clone();
    let mut twin_state = state.clone();
    for _ in 0..40 {
        let a = state.step(&mut tank, &map, Some(&flag), &config);
        let b = twin_state.step(&mut twin_tank, &map, Some(&flag), &config);
        assert_eq!(a, b);
        tank.advance(0.1, 0.04);
        twin_tank.advance(0.1, 0.04);
    }
    assert_eq!(state, twin_state);
    assert_eq!(tank.log, twin_tank.log);
}

#[test]
fn test_agent_reaches_flag_then_returns_home() {
    let map = open_grid(6, 6);
    let flag = Flag::at(Vec2::new(4.5, 3.5));
    let mut tank = ScriptedTank::new(0, Vec2::new(0.5, 0.5), 0.0);
    let mut agent = Agent::new(TankId(0), tank.position, AiConfig::default());

    let reached = run_until(&mut agent, &mut tank, &map, &flag, 3_000, |t| {
        Cell::from_position(t.position) == flag.cell()
    });
    assert!(reached.is_some(), "stuck at {:?}", tank.position);

    tank.carrying_flag = true;
    let home = tank.home;
    let returned = run_until(&mut agent, &mut tank, &map, &flag, 3_000, |t| {
        Cell::from_position(t.position) == home
    });
    assert!(returned.is_some(), "stuck at {:?}", tank.position);
}

#[test]
fn test_agent_routes_around_rock() {
    let map = duel_map();
    let flag = Flag::at(map.flag_position());
    let start = map.start_positions[0].position();
    let mut tank = ScriptedTank::new(0, start, 0.0);
    let mut agent = Agent::new(TankId(0), start, AiConfig::default());

    let reached = run_until(&mut agent, &mut tank, &map, &flag, 5_000, |t| {
        Cell::from_position(t.position) == flag.cell()
    });
    assert!(reached.is_some(), "stuck at {:?}", tank.position);
}

#[test]
fn test_idle_until_flag_exists() {
    let map = open_grid(4, 4);
    let mut tank = ScriptedTank::new(0, Vec2::new(0.5, 0.5), 0.0);
    let mut world = ScriptedWorld::empty();
    let mut agent = Agent::new(TankId(0), tank.position, AiConfig::default());

    for _ in 0..5 {
        let mut ctx = AgentContext {
            tank: &mut tank,
            world: &mut world,
            map: &map,
            flag: None,
            tanks: &[],
        };
        agent.decide(&mut ctx);
    }

    assert_eq!(agent.last_suspension(), Some(Suspension::NoGoal));
    assert_eq!(agent.state().phase, SteeringPhase::Plan);
    assert!(tank.log.is_empty());
}

#[test]
fn test_flag_binding_resolves_once_present() {
    let mut binding = FlagBinding::default();
    let mut objects = vec![
        SceneObject::Base(Vec2::new(0.5, 0.5)),
        SceneObject::Tank(TankId(0)),
    ];
    assert!(binding.resolve(&objects).is_none());

    objects.push(SceneObject::Flag(Flag::at(Vec2::new(3.5, 3.5))));
    let flag = binding.resolve(&objects).copied();
    assert_eq!(flag.map(|f| f.cell()), Some(Cell::new(3, 3)));
    assert!(binding.is_bound());

    let tank = ScriptedTank::new(0, Vec2::new(0.5, 0.5), 0.0);
    assert_eq!(resolve_goal(&tank, flag.as_ref()), Some(Cell::new(3, 3)));
    assert_eq!(tank.id(), TankId(0));
}
