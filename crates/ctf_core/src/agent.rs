//! Per-tank decision cycle: scan for a shot, then advance the steering.

use crate::combat::maybe_shoot;
use crate::config::AiConfig;
use crate::grid::ObstacleMap;
use crate::math::Vec2;
use crate::steering::{AgentState, Suspension};
use crate::world::{Flag, PhysicsWorld, TankControls, TankId};

/// Collaborators borrowed for one decision.
///
/// The game loop builds one of these per AI tank per tick. The agent mutates
/// only `tank` (and hands projectiles to `world`); everything else is read.
pub struct AgentContext<'a> {
    /// The controlled tank.
    pub tank: &'a mut dyn TankControls,
    /// Ray casts and projectile spawning.
    pub world: &'a mut dyn PhysicsWorld,
    /// Current obstacle layer.
    pub map: &'a dyn ObstacleMap,
    /// The round's flag, once it exists.
    pub flag: Option<&'a Flag>,
    /// Every tank in the match.
    pub tanks: &'a [TankId],
}

/// Computer player for a single tank.
#[derive(Debug, Clone)]
pub struct Agent {
    tank: TankId,
    config: AiConfig,
    state: AgentState,
    last_suspension: Option<Suspension>,
}

impl Agent {
    /// Agent for `tank`, which currently stands at `position`.
    #[must_use]
    pub fn new(tank: TankId, position: Vec2, config: AiConfig) -> Self {
        Self {
            tank,
            config,
            state: AgentState::new(position),
            last_suspension: None,
        }
    }

    /// Tank this agent drives.
    #[must_use]
    pub const fn tank(&self) -> TankId {
        self.tank
    }

    /// Planning state.
    #[must_use]
    pub const fn state(&self) -> &AgentState {
        &self.state
    }

    /// Where the previous call to [`Agent::decide`] suspended.
    #[must_use]
    pub const fn last_suspension(&self) -> Option<Suspension> {
        self.last_suspension
    }

    /// Tuning in effect.
    #[must_use]
    pub const fn config(&self) -> &AiConfig {
        &self.config
    }

    /// Discard the route and steering phase after a respawn or round reset.
    pub fn reset(&mut self, position: Vec2) {
        tracing::debug!(tank = %self.tank, "Agent reset");
        self.state = AgentState::new(position);
        self.last_suspension = None;
    }

    /// Run one tick: maybe fire, then one steering step.
    pub fn decide(&mut self, ctx: &mut AgentContext<'_>) {
        debug_assert_eq!(ctx.tank.id(), self.tank, "agent driven with foreign tank");

        maybe_shoot(&mut *ctx.tank, &mut *ctx.world, ctx.map, &self.config);

        let suspension = self
            .state
            .step(&mut *ctx.tank, ctx.map, ctx.flag, &self.config);
        self.last_suspension = Some(suspension);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{Cell, ObstacleGrid, ObstacleKind};
    use crate::steering::SteeringPhase;
    use crate::world::{HitTarget, Projectile, RayHit};

    struct Hull {
        position: Vec2,
        angle: f64,
        cooldown: u32,
        accelerating: bool,
    }

    impl TankControls for Hull {
        fn id(&self) -> TankId {
            TankId(2)
        }
        fn position(&self) -> Vec2 {
            self.position
        }
        fn angle(&self) -> f64 {
            self.angle
        }
        fn accelerate(&mut self) {
            self.accelerating = true;
        }
        fn decelerate(&mut self) {}
        fn turn_left(&mut self) {}
        fn turn_right(&mut self) {}
        fn stop_moving(&mut self) {
            self.accelerating = false;
        }
        fn stop_turning(&mut self) {}
        fn cooldown_ticks(&self) -> u32 {
            self.cooldown
        }
        fn set_cooldown_ticks(&mut self, ticks: u32) {
            self.cooldown = ticks;
        }
        fn carries_flag(&self) -> bool {
            false
        }
        fn home_cell(&self) -> Cell {
            Cell::new(0, 0)
        }
    }

    #[derive(Default)]
    struct Range {
        wood_ahead: bool,
        spawned: Vec<Projectile>,
    }

    impl PhysicsWorld for Range {
        fn ray_cast_first(&self, _start: Vec2, end: Vec2, _ignore: Option<TankId>) -> Option<RayHit> {
            self.wood_ahead.then_some(RayHit {
                target: HitTarget::Obstacle(ObstacleKind::Wood),
                point: end,
            })
        }
        fn spawn_projectile(&mut self, projectile: Projectile) {
            self.spawned.push(projectile);
        }
    }

    #[test]
    fn test_decide_shoots_then_steers() {
        let map = ObstacleGrid::new(4, 1);
        let flag = Flag::at(Vec2::new(3.5, 0.5));
        let mut hull = Hull {
            position: Vec2::new(0.5, 0.5),
            angle: -std::f64::consts::FRAC_PI_2,
            cooldown: 0,
            accelerating: false,
        };
        let mut range = Range {
            wood_ahead: true,
            ..Range::default()
        };
        let tanks = [TankId(2)];
        let mut agent = Agent::new(TankId(2), hull.position, AiConfig::default());

        for _ in 0..2 {
            let mut ctx = AgentContext {
                tank: &mut hull,
                world: &mut range,
                map: &map,
                flag: Some(&flag),
                tanks: &tanks,
            };
            agent.decide(&mut ctx);
        }

        assert_eq!(range.spawned.len(), 1);
        assert_eq!(hull.cooldown, 50);
        assert!(hull.accelerating);
        assert_eq!(agent.last_suspension(), Some(Suspension::Driving));
    }

    #[test]
    fn test_reset_discards_plan() {
        let map = ObstacleGrid::new(4, 1);
        let flag = Flag::at(Vec2::new(3.5, 0.5));
        let mut hull = Hull {
            position: Vec2::new(0.5, 0.5),
            angle: 0.0,
            cooldown: 5,
            accelerating: false,
        };
        let mut range = Range::default();
        let mut agent = Agent::new(TankId(2), hull.position, AiConfig::default());

        let mut ctx = AgentContext {
            tank: &mut hull,
            world: &mut range,
            map: &map,
            flag: Some(&flag),
            tanks: &[],
        };
        agent.decide(&mut ctx);
        assert!(!agent.state().path.is_empty());

        agent.reset(Vec2::new(2.5, 0.5));
        assert!(agent.state().path.is_empty());
        assert_eq!(agent.state().phase, SteeringPhase::Plan);
        assert_eq!(agent.state().grid_cell, Cell::new(2, 0));
        assert_eq!(agent.last_suspension(), None);
    }
}
