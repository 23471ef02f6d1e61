//! Arena tuning: tank kinematics, bullets and match rules.

use serde::{Deserialize, Serialize};

/// Physical constants of the headless arena.
///
/// Speeds are in map units (tiles) per second; the arena advances
/// `1 / tick_rate` seconds per tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    /// Simulation ticks per second.
    pub tick_rate: u32,
    /// Velocities pick up accelerations only every this many ticks.
    pub velocity_update_interval: u32,
    /// Linear and angular acceleration per velocity update.
    pub acceleration: f64,
    /// Speed cap (linear and angular) without the flag.
    pub normal_max_speed: f64,
    /// Speed cap multiplier while carrying the flag.
    pub flag_speed_factor: f64,
    /// Radius used for hull-versus-box collisions.
    pub hull_radius: f64,
    /// Radius of a tank as seen by rays and bullets.
    pub tank_radius: f64,
    /// Radius of a bullet.
    pub bullet_radius: f64,
    /// Bullet speed.
    pub bullet_speed: f64,
    /// Ticks after a (re)spawn during which a tank takes no damage.
    pub spawn_protection_ticks: u32,
    /// Hit points of a fresh tank.
    pub hit_points: u32,
    /// Damage dealt by one bullet.
    pub bullet_damage: u32,
    /// Distance at which a tank picks up a free flag.
    pub grab_radius: f64,
    /// Distance to its spawn at which a flag carrier scores.
    pub win_radius: f64,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            tick_rate: 50,
            velocity_update_interval: 3,
            acceleration: 0.4,
            normal_max_speed: 2.0,
            flag_speed_factor: 0.5,
            hull_radius: 0.3,
            tank_radius: 0.4,
            bullet_radius: 0.1,
            bullet_speed: 3.0,
            spawn_protection_ticks: 100,
            hit_points: 100,
            bullet_damage: 50,
            grab_radius: 0.5,
            win_radius: 0.2,
        }
    }
}

impl ArenaConfig {
    /// Seconds simulated per tick.
    #[must_use]
    pub fn tick_seconds(&self) -> f64 {
        1.0 / f64::from(self.tick_rate.max(1))
    }

    /// Speed cap while carrying the flag.
    #[must_use]
    pub fn flag_max_speed(&self) -> f64 {
        self.normal_max_speed * self.flag_speed_factor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ArenaConfig::default();
        assert!((config.tick_seconds() - 0.02).abs() < 1e-12);
        assert!((config.flag_max_speed() - 1.0).abs() < 1e-12);
        assert_eq!(config.bullet_damage * 2, config.hit_points);
    }

    #[test]
    fn test_partial_ron_uses_defaults() {
        let config: ArenaConfig = ron::from_str("(bullet_speed: 4.0)").unwrap();
        assert!((config.bullet_speed - 4.0).abs() < 1e-12);
        assert_eq!(config.tick_rate, 50);
    }
}
