//! Waypoint-following controller advanced one step per tick.
//!
//! The controller cycles through three phases:
//!
//! 1. **Plan** - search a route to the current goal (wood-permissive first,
//!    then allowing metal), pop the first cell and aim at its centre.
//! 2. **Turn** - rotate in place until the hull faces the waypoint within the
//!    heading tolerance.
//! 3. **Drive** - accelerate until the distance to the waypoint starts to
//!    grow, then record the new grid cell and plan again.
//!
//! Each call to [`AgentState::step`] performs the work up to the next
//! suspension point and returns. Suspension points are: after a waypoint is
//! chosen, while no route exists, while the heading is off, and while the
//! tank is still closing on the waypoint. Phase changes that do not suspend
//! (already facing the waypoint, finishing a turn, arriving) continue within
//! the same call.
//!
//! The route is recomputed from scratch every cycle, so boxes destroyed or
//! pushed mid-traversal are picked up at the next waypoint.

use serde::{Deserialize, Serialize};

use crate::config::AiConfig;
use crate::grid::{Cell, ObstacleMap};
use crate::math::{bearing_to, periodic_difference, Vec2};
use crate::pathfinding::{find_path_with_fallback, Path};
use crate::target::resolve_goal;
use crate::world::{Flag, TankControls};

/// Cursor of the steering cycle.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum SteeringPhase {
    /// Waiting to compute a route.
    #[default]
    Plan,
    /// Waypoint chosen; heading not yet checked.
    Turn {
        /// Centre of the next cell.
        waypoint: Vec2,
    },
    /// Rotating in place toward `target_angle`.
    Rotating {
        /// Centre of the next cell.
        waypoint: Vec2,
        /// Bearing fixed when the turn started.
        target_angle: f64,
    },
    /// Driving toward the waypoint.
    Drive {
        /// Centre of the next cell.
        waypoint: Vec2,
        /// Distance measured on the previous tick.
        last_distance: f64,
    },
}

/// Where a step suspended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Suspension {
    /// The flag is not known yet.
    NoGoal,
    /// Neither policy found a route; retry next tick.
    NoRoute,
    /// A new waypoint was taken from the route.
    WaypointSelected,
    /// Still rotating toward the waypoint.
    Turning,
    /// Still closing on the waypoint.
    Driving,
}

/// Per-agent planning state.
///
/// Discarded wholesale when the tank respawns or the round resets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentState {
    /// Grid cell recorded at spawn and after every arrival.
    pub grid_cell: Cell,
    /// Waypoints remaining after the current one.
    pub path: Path,
    /// Position in the steering cycle.
    pub phase: SteeringPhase,
}

/// Whether a periodic heading error counts as "facing".
#[must_use]
pub fn within_tolerance(diff: f64, tolerance: f64) -> bool {
    diff <= tolerance || diff >= std::f64::consts::TAU - tolerance
}

impl AgentState {
    /// Fresh state for a tank standing at `position`.
    #[must_use]
    pub fn new(position: Vec2) -> Self {
        Self {
            grid_cell: Cell::from_position(position),
            path: Path::new(),
            phase: SteeringPhase::Plan,
        }
    }

    /// Advance the cycle to its next suspension point.
    pub fn step<T, M>(
        &mut self,
        tank: &mut T,
        map: &M,
        flag: Option<&Flag>,
        config: &AiConfig,
    ) -> Suspension
    where
        T: TankControls + ?Sized,
        M: ObstacleMap + ?Sized,
    {
        match self.phase {
            SteeringPhase::Plan => self.plan(tank, map, flag, config),
            SteeringPhase::Turn { waypoint } => self.start_turn(tank, waypoint, config),
            SteeringPhase::Rotating {
                waypoint,
                target_angle,
            } => {
                let diff = periodic_difference(tank.angle(), target_angle);
                if within_tolerance(diff, config.heading_tolerance()) {
                    self.start_drive(tank, waypoint)
                } else {
                    Suspension::Turning
                }
            }
            SteeringPhase::Drive {
                waypoint,
                last_distance,
            } => {
                let distance = tank.position().distance(waypoint);
                if distance > last_distance {
                    self.grid_cell = Cell::from_position(tank.position());
                    tracing::trace!(tank = %tank.id(), cell = ?self.grid_cell, "Arrived");
                    self.phase = SteeringPhase::Plan;
                    self.plan(tank, map, flag, config)
                } else {
                    self.phase = SteeringPhase::Drive {
                        waypoint,
                        last_distance: distance,
                    };
                    Suspension::Driving
                }
            }
        }
    }

    fn plan<T, M>(
        &mut self,
        tank: &mut T,
        map: &M,
        flag: Option<&Flag>,
        config: &AiConfig,
    ) -> Suspension
    where
        T: TankControls + ?Sized,
        M: ObstacleMap + ?Sized,
    {
        let Some(goal) = resolve_goal(&*tank, flag) else {
            tracing::debug!(tank = %tank.id(), "No flag to chase yet");
            return Suspension::NoGoal;
        };

        let (mut path, policy) = find_path_with_fallback(map, self.grid_cell, goal);
        let Some(next) = path.pop_front() else {
            self.path.clear();
            tracing::debug!(tank = %tank.id(), from = ?self.grid_cell, ?goal, "No route");
            return Suspension::NoRoute;
        };

        let waypoint = next.offset_position(config.waypoint_center_offset);
        tracing::trace!(
            tank = %tank.id(),
            ?next,
            remaining = path.len(),
            ?policy,
            "Waypoint selected"
        );
        self.path = path;
        self.phase = SteeringPhase::Turn { waypoint };
        Suspension::WaypointSelected
    }

    fn start_turn<T>(&mut self, tank: &mut T, waypoint: Vec2, config: &AiConfig) -> Suspension
    where
        T: TankControls + ?Sized,
    {
        let target_angle = bearing_to(tank.position(), waypoint);
        let diff = periodic_difference(tank.angle(), target_angle);

        if within_tolerance(diff, config.heading_tolerance()) {
            return self.start_drive(tank, waypoint);
        }

        tank.stop_moving();
        if diff >= std::f64::consts::PI {
            tank.turn_right();
        } else {
            tank.turn_left();
        }
        tracing::trace!(tank = %tank.id(), target_angle, diff, "Turning");
        self.phase = SteeringPhase::Rotating {
            waypoint,
            target_angle,
        };
        Suspension::Turning
    }

    fn start_drive<T>(&mut self, tank: &mut T, waypoint: Vec2) -> Suspension
    where
        T: TankControls + ?Sized,
    {
        tank.stop_turning();
        let last_distance = tank.position().distance(waypoint);
        tank.accelerate();
        tracing::trace!(tank = %tank.id(), last_distance, "Driving");
        self.phase = SteeringPhase::Drive {
            waypoint,
            last_distance,
        };
        Suspension::Driving
    }
}
