//! Continuous-space vector math and periodic angle helpers.
//!
//! Positions are expressed in map units (one unit per tile) using the
//! physics engine's axis convention. Angles are radians.

use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

/// 2D vector in physics coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
}

impl Vec2 {
    /// Zero vector.
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// Create a new vector.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Unit vector pointing along `angle`.
    #[must_use]
    pub fn from_angle(angle: f64) -> Self {
        Self::new(angle.cos(), angle.sin())
    }

    /// Euclidean length.
    #[must_use]
    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Euclidean distance to `other`.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        (self - other).length()
    }

    /// Counter-clockwise perpendicular `(-y, x)`.
    #[must_use]
    pub const fn perpendicular(self) -> Self {
        Self::new(-self.y, self.x)
    }

    /// Angle of the vector, `atan2(y, x)`.
    #[must_use]
    pub fn angle(self) -> f64 {
        self.y.atan2(self.x)
    }

    /// Component-wise scale.
    #[must_use]
    pub fn scale(self, sx: f64, sy: f64) -> Self {
        Self::new(self.x * sx, self.y * sy)
    }
}

impl std::ops::Add for Vec2 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl std::ops::Mul<f64> for Vec2 {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self::Output {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl From<(f64, f64)> for Vec2 {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

/// Bearing a body must hold to face `target` from `from`.
///
/// Bodies move along `angle + π/2` in physics space, so the bearing is the
/// angle of the perpendicular of `from - target` rather than the direct
/// `atan2` of `target - from`.
#[must_use]
pub fn bearing_to(from: Vec2, target: Vec2) -> f64 {
    (from - target).perpendicular().angle()
}

/// Forward direction of a body rotated by `angle`.
#[must_use]
pub fn forward(angle: f64) -> Vec2 {
    Vec2::from_angle(angle + std::f64::consts::FRAC_PI_2)
}

/// Periodic difference `a - b` normalised into `[0, 2π)`.
#[must_use]
pub fn periodic_difference(a: f64, b: f64) -> f64 {
    let diff = (a.rem_euclid(TAU) - b.rem_euclid(TAU)).rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs
    if diff >= TAU {
        0.0
    } else {
        diff
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    const EPS: f64 = 1e-9;

    #[test]
    fn test_distance() {
        let a = Vec2::new(3.0, 0.0);
        let b = Vec2::new(0.0, 4.0);
        assert!((a.distance(b) - 5.0).abs() < EPS);
    }

    #[test]
    fn test_perpendicular() {
        assert_eq!(Vec2::new(1.0, 2.0).perpendicular(), Vec2::new(-2.0, 1.0));
    }

    #[test]
    fn test_bearing_matches_forward_vector() {
        let from = Vec2::new(2.5, 2.5);
        for target in [
            Vec2::new(3.5, 2.5),
            Vec2::new(2.5, 3.5),
            Vec2::new(1.5, 2.5),
            Vec2::new(2.5, 1.5),
            Vec2::new(4.0, 0.0),
        ] {
            let bearing = bearing_to(from, target);
            let heading = forward(bearing);
            let wanted = target - from;
            let wanted = wanted * (1.0 / wanted.length());
            assert!((heading.x - wanted.x).abs() < EPS, "{target:?}");
            assert!((heading.y - wanted.y).abs() < EPS, "{target:?}");
        }
    }

    #[test]
    fn test_bearing_east_is_minus_half_pi() {
        let bearing = bearing_to(Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0));
        assert!((bearing + FRAC_PI_2).abs() < EPS);
    }

    #[test]
    fn test_periodic_difference_wraps() {
        assert!(periodic_difference(1.0, 1.0).abs() < EPS);
        assert!((periodic_difference(0.0, FRAC_PI_2) - 3.0 * FRAC_PI_2).abs() < EPS);
        assert!((periodic_difference(FRAC_PI_2, 0.0) - FRAC_PI_2).abs() < EPS);
        assert!((periodic_difference(-PI, PI)).abs() < EPS);
        assert!((periodic_difference(5.0 * TAU + 0.25, 0.0) - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_periodic_difference_tiny_negative_stays_in_range() {
        let diff = periodic_difference(0.0, 1e-18);
        assert!((0.0..TAU).contains(&diff));
    }
}
