//! Opportunistic firing: shoot whatever destructible thing is straight ahead.
//!
//! The scanner casts one ray along the hull's heading, from just in front of
//! the tank to the far edge of the map. It fires when the first thing struck
//! is an enemy tank or a wooden box and the gun has reloaded. Metal, rock,
//! bullets and the boundary never trigger a shot.

use crate::config::AiConfig;
use crate::grid::ObstacleMap;
use crate::math::{forward, Vec2};
use crate::world::{HitTarget, PhysicsWorld, Projectile, RayHit, TankControls, TankId};

/// Segment scanned for targets: from the muzzle out to the map's far edge.
#[must_use]
pub fn scan_segment(
    position: Vec2,
    angle: f64,
    map_width: u32,
    map_height: u32,
    muzzle_offset: f64,
) -> (Vec2, Vec2) {
    let heading = forward(angle);
    let start = position + heading * muzzle_offset;
    let end = position + heading.scale(f64::from(map_width), f64::from(map_height));
    (start, end)
}

/// Whether a ray hit is worth a bullet.
#[must_use]
pub fn is_shootable(hit: &RayHit, shooter: TankId) -> bool {
    match hit.target {
        HitTarget::Obstacle(kind) => kind.is_destructible(),
        HitTarget::Tank(id) => id != shooter,
        HitTarget::Projectile | HitTarget::Boundary => false,
    }
}

/// Fire at a shootable target directly ahead, if reloaded.
///
/// On a shot the projectile is handed to the world and the tank's cooldown is
/// reset to [`AiConfig::reload_ticks`]. Returns the projectile that was fired.
pub fn maybe_shoot<T, W, M>(
    tank: &mut T,
    world: &mut W,
    map: &M,
    config: &AiConfig,
) -> Option<Projectile>
where
    T: TankControls + ?Sized,
    W: PhysicsWorld + ?Sized,
    M: ObstacleMap + ?Sized,
{
    if tank.cooldown_ticks() != 0 {
        return None;
    }

    let (start, end) = scan_segment(
        tank.position(),
        tank.angle(),
        map.width(),
        map.height(),
        config.muzzle_offset,
    );
    let hit = world.ray_cast_first(start, end, Some(tank.id()))?;

    if !is_shootable(&hit, tank.id()) {
        return None;
    }

    let projectile = tank.fire();
    world.spawn_projectile(projectile);
    tank.set_cooldown_ticks(config.reload_ticks);

    tracing::debug!(tank = %tank.id(), target = ?hit.target, "Fired");
    Some(projectile)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{Cell, ObstacleGrid, ObstacleKind};

    struct Gun {
        cooldown: u32,
        fired: u32,
    }

    impl TankControls for Gun {
        fn id(&self) -> TankId {
            TankId(0)
        }
        fn position(&self) -> Vec2 {
            Vec2::new(1.5, 1.5)
        }
        fn angle(&self) -> f64 {
            0.0
        }
        fn accelerate(&mut self) {}
        fn decelerate(&mut self) {}
        fn turn_left(&mut self) {}
        fn turn_right(&mut self) {}
        fn stop_moving(&mut self) {}
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
            Cell::new(1, 1)
        }
        fn fire(&mut self) -> Projectile {
            self.fired += 1;
            Projectile::from_muzzle(self.id(), self.position(), self.angle())
        }
    }

    struct FixedHit {
        hit: Option<HitTarget>,
        spawned: Vec<Projectile>,
    }

    impl PhysicsWorld for FixedHit {
        fn ray_cast_first(&self, _start: Vec2, _end: Vec2, _ignore: Option<TankId>) -> Option<RayHit> {
            self.hit.map(|target| RayHit {
                target,
                point: Vec2::new(1.5, 4.5),
            })
        }
        fn spawn_projectile(&mut self, projectile: Projectile) {
            self.spawned.push(projectile);
        }
    }

    fn world(hit: Option<HitTarget>) -> FixedHit {
        FixedHit {
            hit,
            spawned: Vec::new(),
        }
    }

    #[test]
    fn test_fires_at_wood_when_reloaded() {
        let mut gun = Gun { cooldown: 0, fired: 0 };
        let mut world = world(Some(HitTarget::Obstacle(ObstacleKind::Wood)));
        let map = ObstacleGrid::new(8, 8);

        let shot = maybe_shoot(&mut gun, &mut world, &map, &AiConfig::default());

        assert!(shot.is_some());
        assert_eq!(gun.fired, 1);
        assert_eq!(gun.cooldown, 50);
        assert_eq!(world.spawned.len(), 1);
    }

    #[test]
    fn test_holds_fire_while_reloading() {
        let mut gun = Gun { cooldown: 10, fired: 0 };
        let mut world = world(Some(HitTarget::Obstacle(ObstacleKind::Wood)));
        let map = ObstacleGrid::new(8, 8);

        assert!(maybe_shoot(&mut gun, &mut world, &map, &AiConfig::default()).is_none());
        assert_eq!(gun.fired, 0);
        assert_eq!(gun.cooldown, 10);
        assert!(world.spawned.is_empty());
    }

    #[test]
    fn test_fires_at_enemy_tank() {
        let mut gun = Gun { cooldown: 0, fired: 0 };
        let mut world = world(Some(HitTarget::Tank(TankId(3))));
        let map = ObstacleGrid::new(8, 8);
        assert!(maybe_shoot(&mut gun, &mut world, &map, &AiConfig::default()).is_some());
    }

    #[test]
    fn test_ignores_indestructible_and_misses() {
        let map = ObstacleGrid::new(8, 8);
        for hit in [
            Some(HitTarget::Obstacle(ObstacleKind::Metal)),
            Some(HitTarget::Obstacle(ObstacleKind::Rock)),
            Some(HitTarget::Projectile),
            Some(HitTarget::Boundary),
            Some(HitTarget::Tank(TankId(0))),
            None,
        ] {
            let mut gun = Gun { cooldown: 0, fired: 0 };
            let mut world = world(hit);
            assert!(maybe_shoot(&mut gun, &mut world, &map, &AiConfig::default()).is_none());
            assert_eq!(gun.cooldown, 0, "{hit:?}");
        }
    }

    #[test]
    fn test_scan_segment_reaches_far_edge() {
        let (start, end) = scan_segment(Vec2::new(1.0, 1.0), 0.0, 10, 6, 0.4);
        assert!((start.x - 1.0).abs() < 1e-9);
        assert!((start.y - 1.4).abs() < 1e-9);
        assert!((end.x - 1.0).abs() < 1e-9);
        assert!((end.y - 7.0).abs() < 1e-9);
    }
}
