//! # CTF Core
//!
//! Decision engine for computer-controlled tanks in a tile-based
//! capture-the-flag game.
//!
//! This crate contains **only** the AI and the data it reasons over:
//! - No rendering
//! - No IO
//! - No physics integration (consumed through [`world`] traits)
//!
//! ## Crate Structure
//!
//! - [`grid`] - Obstacle classification and traversability policies
//! - [`pathfinding`] - Breadth-first route search
//! - [`target`] - Goal selection (flag or home base)
//! - [`combat`] - Ray-cast target acquisition and firing
//! - [`steering`] - Turn/drive state machine stepped once per tick
//! - [`agent`] - Per-tank decision cycle
//! - [`world`] - Interfaces to the physics world, tanks and flag
//! - [`map`] - Map blueprints

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod agent;
pub mod combat;
pub mod config;
pub mod error;
pub mod grid;
pub mod map;
pub mod math;
pub mod pathfinding;
pub mod steering;
pub mod target;
pub mod world;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::agent::{Agent, AgentContext};
    pub use crate::config::AiConfig;
    pub use crate::error::{GameError, Result};
    pub use crate::grid::{
        is_traversable, Cell, ObstacleGrid, ObstacleKind, ObstacleMap, TraversabilityPolicy,
    };
    pub use crate::map::{GameMap, StartPosition};
    pub use crate::math::{periodic_difference, Vec2};
    pub use crate::pathfinding::{find_path_with_fallback, find_shortest_path, Path};
    pub use crate::steering::{AgentState, SteeringPhase, Suspension};
    pub use crate::target::resolve_goal;
    pub use crate::world::{
        Flag, HitTarget, PhysicsWorld, Projectile, RayHit, SceneObject, TankControls, TankId,
    };
}
