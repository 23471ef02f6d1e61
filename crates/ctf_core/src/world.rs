//! Interfaces the AI consumes from the surrounding game.
//!
//! The physics engine, the tanks' actuation surface and the flag are owned
//! elsewhere. The AI reads shared world state through these traits and only
//! ever mutates the tank it controls.

use serde::{Deserialize, Serialize};

use crate::grid::{Cell, ObstacleKind};
use crate::math::{forward, Vec2};

/// Stable identifier of a tank within a match.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct TankId(pub u32);

impl std::fmt::Display for TankId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "tank-{}", self.0)
    }
}

/// What a ray cast struck first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HitTarget {
    /// A tank body.
    Tank(TankId),
    /// A box of the given class.
    Obstacle(ObstacleKind),
    /// A bullet in flight.
    Projectile,
    /// The map edge.
    Boundary,
}

/// First intersection reported by [`PhysicsWorld::ray_cast_first`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RayHit {
    /// Owner of the struck shape.
    pub target: HitTarget,
    /// Intersection point.
    pub point: Vec2,
}

/// Bullet about to enter the world.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    /// Tank that fired it.
    pub owner: TankId,
    /// Spawn position.
    pub position: Vec2,
    /// Travel angle (body convention, moves along `angle + π/2`).
    pub angle: f64,
}

impl Projectile {
    /// Distance ahead of the hull at which bullets appear.
    pub const MUZZLE_OFFSET: f64 = 0.4;

    /// Bullet fired by a hull at `position` facing `angle`.
    #[must_use]
    pub fn from_muzzle(owner: TankId, position: Vec2, angle: f64) -> Self {
        Self {
            owner,
            position: position + forward(angle) * Self::MUZZLE_OFFSET,
            angle,
        }
    }
}

/// The flag contested by every tank.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Flag {
    /// Current position; follows the carrier while held.
    pub position: Vec2,
    /// Whether a tank currently holds it.
    pub carried: bool,
}

impl Flag {
    /// Flag resting at `position`.
    #[must_use]
    pub const fn at(position: Vec2) -> Self {
        Self {
            position,
            carried: false,
        }
    }

    /// Cell the flag currently occupies.
    #[must_use]
    pub fn cell(&self) -> Cell {
        Cell::from_position(self.position)
    }
}

/// Actuation surface of a tank.
///
/// Angles grow when the tank turns right; the hull moves along
/// `angle + π/2`.
pub trait TankControls {
    /// Identifier of this tank.
    fn id(&self) -> TankId;

    /// Body position.
    fn position(&self) -> Vec2;

    /// Body angle in radians.
    fn angle(&self) -> f64;

    /// Start driving forward.
    fn accelerate(&mut self);

    /// Start driving backward.
    fn decelerate(&mut self);

    /// Start rotating toward decreasing angle.
    fn turn_left(&mut self);

    /// Start rotating toward increasing angle.
    fn turn_right(&mut self);

    /// Cancel linear motion.
    fn stop_moving(&mut self);

    /// Cancel rotation.
    fn stop_turning(&mut self);

    /// Ticks until the tank may fire again.
    fn cooldown_ticks(&self) -> u32;

    /// Overwrite the reload counter.
    fn set_cooldown_ticks(&mut self, ticks: u32);

    /// Whether this tank holds the flag.
    fn carries_flag(&self) -> bool;

    /// Base cell, fixed at spawn.
    fn home_cell(&self) -> Cell;

    /// Build the projectile this tank would fire now.
    fn fire(&mut self) -> Projectile {
        Projectile::from_muzzle(self.id(), self.position(), self.angle())
    }
}

/// Queries and commands the AI issues against the physics world.
pub trait PhysicsWorld {
    /// First shape crossed by the segment `start..end`, skipping `ignore`.
    fn ray_cast_first(&self, start: Vec2, end: Vec2, ignore: Option<TankId>) -> Option<RayHit>;

    /// Add a fired projectile to the simulation.
    fn spawn_projectile(&mut self, projectile: Projectile);
}

/// Heterogeneous game object as seen by the flag lookup.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SceneObject {
    /// A base marker.
    Base(Vec2),
    /// A tank body.
    Tank(TankId),
    /// A box.
    Obstacle(Cell, ObstacleKind),
    /// The flag.
    Flag(Flag),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_projectile_spawns_ahead() {
        let shot = Projectile::from_muzzle(TankId(1), Vec2::new(2.0, 2.0), 0.0);
        assert!((shot.position.x - 2.0).abs() < 1e-9);
        assert!((shot.position.y - 2.4).abs() < 1e-9);
    }

    #[test]
    fn test_flag_cell_truncates() {
        assert_eq!(Flag::at(Vec2::new(2.7, 2.2)).cell(), Cell::new(2, 2));
    }
}
