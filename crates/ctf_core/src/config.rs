//! Tunable constants for the tank AI.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Heading tolerance, a bit more than a tank turns in one tick.
pub const DEFAULT_HEADING_TOLERANCE_DEGREES: f64 = 3.0;

/// Ticks a tank waits between shots.
pub const DEFAULT_RELOAD_TICKS: u32 = 50;

/// AI tuning parameters.
///
/// Loaded from RON by the headless runner; every field falls back to its
/// default when omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// Heading error accepted as "facing the waypoint".
    pub heading_tolerance_degrees: f64,
    /// Cooldown applied after the AI fires.
    pub reload_ticks: u32,
    /// Distance ahead of the hull where the scanning ray starts.
    pub muzzle_offset: f64,
    /// Offset from a cell's corner to the steering waypoint.
    pub waypoint_center_offset: f64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            heading_tolerance_degrees: DEFAULT_HEADING_TOLERANCE_DEGREES,
            reload_ticks: DEFAULT_RELOAD_TICKS,
            muzzle_offset: 0.4,
            waypoint_center_offset: 0.5,
        }
    }
}

impl AiConfig {
    /// Parse a configuration from a RON string.
    pub fn from_ron_str(ron: &str) -> Result<Self> {
        Ok(ron::from_str(ron)?)
    }

    /// Heading tolerance in radians.
    #[must_use]
    pub fn heading_tolerance(&self) -> f64 {
        self.heading_tolerance_degrees.to_radians()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AiConfig::default();
        assert_eq!(config.reload_ticks, 50);
        assert!((config.heading_tolerance() - 3.0_f64.to_radians()).abs() < 1e-12);
    }

    #[test]
    fn test_partial_ron_uses_defaults() {
        let config = AiConfig::from_ron_str("(reload_ticks: 20)").unwrap();
        assert_eq!(config.reload_ticks, 20);
        assert_eq!(config.muzzle_offset, 0.4);
    }

    #[test]
    fn test_bad_ron_is_error() {
        assert!(AiConfig::from_ron_str("(reload_ticks: \"soon\")").is_err());
    }
}
