//! Test fixtures and helpers.
//!
//! Scripted stand-ins for the collaborators the AI consumes, plus
//! pre-built grids for consistent testing.

use std::cell::RefCell;

use ctf_core::grid::{Cell, ObstacleGrid, ObstacleKind};
use ctf_core::map::{GameMap, StartPosition};
use ctf_core::math::{forward, Vec2};
use ctf_core::world::{HitTarget, PhysicsWorld, Projectile, RayHit, TankControls, TankId};

/// Fully open grid.
#[must_use]
pub fn open_grid(width: u32, height: u32) -> ObstacleGrid {
    ObstacleGrid::new(width, height)
}

/// Grid from ASCII rows: `.` grass, `#` rock, `w` wood, `m` metal.
///
/// # Panics
///
/// Panics if `rows` is empty or ragged.
#[must_use]
pub fn grid_from_ascii(rows: &[&str]) -> ObstacleGrid {
    assert!(!rows.is_empty(), "grid needs at least one row");
    let width = rows[0].len();
    let mut grid = ObstacleGrid::new(width as u32, rows.len() as u32);
    for (y, row) in rows.iter().enumerate() {
        assert_eq!(row.len(), width, "row {y} is ragged");
        for (x, c) in row.chars().enumerate() {
            let kind = match c {
                '.' => ObstacleKind::None,
                'w' => ObstacleKind::Wood,
                'm' => ObstacleKind::Metal,
                _ => ObstacleKind::Rock,
            };
            grid.set(Cell::new(x as i32, y as i32), kind);
        }
    }
    grid
}

/// Small two-tank map with a wooden wall between the bases and the flag.
#[must_use]
pub fn duel_map() -> GameMap {
    GameMap::from_ascii(
        "duel",
        &[
            "#########",
            "#...w...#",
            "#.#.w.#.#",
            "#...w...#",
            "#########",
        ],
        vec![
            StartPosition::new(1.5, 1.5, 0.0),
            StartPosition::new(7.5, 3.5, 180.0),
        ],
        (4.5, 2.5),
    )
}

/// Actuation calls issued to a [`ScriptedTank`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TankCommand {
    /// `accelerate`
    Accelerate,
    /// `decelerate`
    Decelerate,
    /// `turn_left`
    TurnLeft,
    /// `turn_right`
    TurnRight,
    /// `stop_moving`
    StopMoving,
    /// `stop_turning`
    StopTurning,
    /// `fire`
    Fire,
}

/// Tank that records every command and moves with simple kinematics.
#[derive(Debug, Clone)]
pub struct ScriptedTank {
    /// Identifier.
    pub id: TankId,
    /// Body position.
    pub position: Vec2,
    /// Body angle.
    pub angle: f64,
    /// Reload counter.
    pub cooldown: u32,
    /// Whether the tank holds the flag.
    pub carrying_flag: bool,
    /// Base cell.
    pub home: Cell,
    /// Linear direction: 1 forward, -1 backward, 0 still.
    pub drive: i8,
    /// Angular direction: 1 right (angle up), -1 left, 0 none.
    pub spin: i8,
    /// Every command received, in order.
    pub log: Vec<TankCommand>,
}

impl ScriptedTank {
    /// Tank standing at `position` facing `angle`; home is the starting cell.
    #[must_use]
    pub fn new(id: u32, position: Vec2, angle: f64) -> Self {
        Self {
            id: TankId(id),
            position,
            angle,
            cooldown: 0,
            carrying_flag: false,
            home: Cell::from_position(position),
            drive: 0,
            spin: 0,
            log: Vec::new(),
        }
    }

    /// Integrate one tick with fixed linear and angular speeds.
    pub fn advance(&mut self, speed: f64, turn_rate: f64) {
        self.angle += f64::from(self.spin) * turn_rate;
        self.position = self.position + forward(self.angle) * (f64::from(self.drive) * speed);
    }

    /// Number of times `command` was issued.
    #[must_use]
    pub fn count(&self, command: TankCommand) -> usize {
        self.log.iter().filter(|&&c| c == command).count()
    }
}

impl TankControls for ScriptedTank {
    fn id(&self) -> TankId {
        self.id
    }

    fn position(&self) -> Vec2 {
        self.position
    }

    fn angle(&self) -> f64 {
        self.angle
    }

    fn accelerate(&mut self) {
        self.drive = 1;
        self.log.push(TankCommand::Accelerate);
    }

    fn decelerate(&mut self) {
        self.drive = -1;
        self.log.push(TankCommand::Decelerate);
    }

    fn turn_left(&mut self) {
        self.spin = -1;
        self.log.push(TankCommand::TurnLeft);
    }

    fn turn_right(&mut self) {
        self.spin = 1;
        self.log.push(TankCommand::TurnRight);
    }

    fn stop_moving(&mut self) {
        self.drive = 0;
        self.log.push(TankCommand::StopMoving);
    }

    fn stop_turning(&mut self) {
        self.spin = 0;
        self.log.push(TankCommand::StopTurning);
    }

    fn cooldown_ticks(&self) -> u32 {
        self.cooldown
    }

    fn set_cooldown_ticks(&mut self, ticks: u32) {
        self.cooldown = ticks;
    }

    fn carries_flag(&self) -> bool {
        self.carrying_flag
    }

    fn home_cell(&self) -> Cell {
        self.home
    }

    fn fire(&mut self) -> Projectile {
        self.log.push(TankCommand::Fire);
        Projectile::from_muzzle(self.id, self.position, self.angle)
    }
}

/// Physics world that answers every ray cast with a preset hit.
#[derive(Debug, Default)]
pub struct ScriptedWorld {
    /// Target reported by every ray cast, at `hit_distance` from the ray start.
    pub hit: Option<HitTarget>,
    /// Distance along the ray at which `hit` is reported.
    pub hit_distance: f64,
    /// Projectiles handed over by the AI.
    pub spawned: Vec<Projectile>,
    /// Segments queried, in order.
    pub rays: RefCell<Vec<(Vec2, Vec2)>>,
}

impl ScriptedWorld {
    /// World whose rays strike `target` at `distance`.
    #[must_use]
    pub fn hitting(target: HitTarget, distance: f64) -> Self {
        Self {
            hit: Some(target),
            hit_distance: distance,
            ..Self::default()
        }
    }

    /// World whose rays strike nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }
}

impl PhysicsWorld for ScriptedWorld {
    fn ray_cast_first(&self, start: Vec2, end: Vec2, _ignore: Option<TankId>) -> Option<RayHit> {
        self.rays.borrow_mut().push((start, end));
        let target = self.hit?;
        let direction = end - start;
        let length = direction.length();
        if length <= 0.0 || self.hit_distance > length {
            return None;
        }
        Some(RayHit {
            target,
            point: start + direction * (self.hit_distance / length),
        })
    }

    fn spawn_projectile(&mut self, projectile: Projectile) {
        tracing::trace!(owner = %projectile.owner, "Scripted projectile");
        self.spawned.push(projectile);
    }
}
