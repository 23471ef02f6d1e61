//! Headless capture-the-flag arena.
//!
//! A small deterministic stand-in for the physics engine the AI normally
//! drives. Each tick runs the classic game loop:
//!
//! 1. Every `velocity_update_interval` ticks, tanks fold their accelerations
//!    into their velocities (clamped to the current speed cap).
//! 2. Tanks rotate and move; hulls collide with boxes and the map edge and
//!    shove wooden or metal boxes into free cells other than the flag's.
//! 3. Bullets fly; they destroy wood, stop at other boxes and damage tanks
//!    whose spawn protection has run out. Two hits destroy a tank.
//! 4. Per-tank bookkeeping: the flag follows its carrier, reload and
//!    protection counters run down.
//! 5. Every AI tank takes one decision.
//! 6. Tanks grab a free flag within reach; a carrier back at its spawn wins
//!    the round and everything resets.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use ctf_core::agent::{Agent, AgentContext};
use ctf_core::config::AiConfig;
use ctf_core::error::Result;
use ctf_core::grid::{Cell, ObstacleGrid, ObstacleKind, ObstacleMap};
use ctf_core::map::{GameMap, StartPosition};
use ctf_core::math::{forward, Vec2};
use ctf_core::world::{
    Flag, HitTarget, PhysicsWorld, Projectile, RayHit, SceneObject, TankControls, TankId,
};
use ctf_core::target::FlagBinding;

use crate::config::ArenaConfig;
use crate::metrics::TankStats;
use crate::raycast::{cells_along, segment_boundary, segment_cell, segment_circle};

/// Something notable that happened during a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArenaEvent {
    /// A bullet destroyed a wooden box.
    BoxDestroyed {
        /// Tank that fired.
        by: TankId,
        /// Cell the box occupied.
        cell: Cell,
    },
    /// A bullet damaged a tank that survived.
    TankHit {
        /// Tank that was hit.
        victim: TankId,
        /// Tank that fired.
        by: TankId,
    },
    /// A tank was destroyed and respawned.
    TankDestroyed {
        /// Tank that was destroyed.
        victim: TankId,
        /// Tank that fired.
        by: TankId,
        /// Whether the victim was carrying the flag.
        had_flag: bool,
    },
    /// A tank picked up the flag.
    FlagGrabbed(TankId),
    /// A flag carrier reached its spawn; the round was reset.
    RoundWon(TankId),
}

/// A bullet in flight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bullet {
    /// Tank that fired it.
    pub owner: TankId,
    /// Current position.
    pub position: Vec2,
    /// Travel angle (body convention).
    pub angle: f64,
}

impl From<Projectile> for Bullet {
    fn from(projectile: Projectile) -> Self {
        Self {
            owner: projectile.owner,
            position: projectile.position,
            angle: projectile.angle,
        }
    }
}

/// A tank body with the classic kinematics.
#[derive(Debug, Clone)]
pub struct ArenaTank {
    id: TankId,
    start: StartPosition,
    position: Vec2,
    angle: f64,
    acceleration: f64,
    velocity: f64,
    angular_acceleration: f64,
    angular_velocity: f64,
    max_speed: f64,
    acceleration_step: f64,
    cooldown: u32,
    protection: u32,
    hp: u32,
    carrying_flag: bool,
    stats: TankStats,
}

impl ArenaTank {
    /// Tank spawned at `start`.
    #[must_use]
    pub fn new(id: TankId, start: StartPosition, ai_controlled: bool, config: &ArenaConfig) -> Self {
        Self {
            id,
            start,
            position: start.position(),
            angle: start.orientation_degrees.to_radians(),
            acceleration: 0.0,
            velocity: 0.0,
            angular_acceleration: 0.0,
            angular_velocity: 0.0,
            max_speed: config.normal_max_speed,
            acceleration_step: config.acceleration,
            cooldown: 0,
            protection: config.spawn_protection_ticks,
            hp: config.hit_points,
            carrying_flag: false,
            stats: TankStats::new(id, ai_controlled),
        }
    }

    /// Spawn point.
    #[must_use]
    pub const fn start(&self) -> StartPosition {
        self.start
    }

    /// Remaining hit points.
    #[must_use]
    pub const fn hp(&self) -> u32 {
        self.hp
    }

    /// Ticks of spawn protection left.
    #[must_use]
    pub const fn protection(&self) -> u32 {
        self.protection
    }

    /// Linear velocity along the hull's forward direction.
    #[must_use]
    pub const fn velocity(&self) -> f64 {
        self.velocity
    }

    /// Angular velocity.
    #[must_use]
    pub const fn angular_velocity(&self) -> f64 {
        self.angular_velocity
    }

    /// Current speed cap.
    #[must_use]
    pub const fn max_speed(&self) -> f64 {
        self.max_speed
    }

    /// Running counters.
    #[must_use]
    pub const fn stats(&self) -> &TankStats {
        &self.stats
    }

    fn update_velocity(&mut self) {
        self.velocity = (self.velocity + self.acceleration).clamp(-self.max_speed, self.max_speed);
        self.angular_velocity = (self.angular_velocity + self.angular_acceleration)
            .clamp(-self.max_speed, self.max_speed);
    }

    fn respawn(&mut self, config: &ArenaConfig) {
        self.position = self.start.position();
        self.angle = self.start.orientation_degrees.to_radians();
        self.hp = config.hit_points;
        self.protection = config.spawn_protection_ticks;
        self.carrying_flag = false;
        self.max_speed = config.normal_max_speed;
        self.stop_moving();
        self.stop_turning();
    }
}

impl TankControls for ArenaTank {
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
        self.acceleration = self.acceleration_step;
    }

    fn decelerate(&mut self) {
        self.acceleration = -self.acceleration_step;
    }

    fn turn_left(&mut self) {
        self.angular_acceleration = -self.acceleration_step;
    }

    fn turn_right(&mut self) {
        self.angular_acceleration = self.acceleration_step;
    }

    fn stop_moving(&mut self) {
        self.velocity = 0.0;
        self.acceleration = 0.0;
    }

    fn stop_turning(&mut self) {
        self.angular_velocity = 0.0;
        self.angular_acceleration = 0.0;
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
        self.start.cell()
    }

    fn fire(&mut self) -> Projectile {
        self.stats.shots += 1;
        Projectile::from_muzzle(self.id, self.position, self.angle)
    }
}

/// What stopped a hull from moving.
enum Blocker {
    Edge,
    Box(Cell, ObstacleKind),
}

/// The arena: map, tanks, their agents, bullets and the flag.
#[derive(Debug, Clone)]
pub struct Arena {
    config: ArenaConfig,
    map: GameMap,
    grid: ObstacleGrid,
    tanks: Vec<ArenaTank>,
    agents: Vec<Option<Agent>>,
    bullets: Vec<Bullet>,
    flag: Flag,
    flag_binding: FlagBinding,
    tick: u64,
    update_countdown: u32,
}

impl Arena {
    /// Build an arena for `map`. Tanks whose index appears in `ai_tanks` are
    /// driven by an [`Agent`]; the rest stand still.
    pub fn new(
        map: &GameMap,
        ai_tanks: &[usize],
        ai_config: &AiConfig,
        config: ArenaConfig,
    ) -> Result<Self> {
        map.validate()?;

        let tanks: Vec<ArenaTank> = map
            .start_positions
            .iter()
            .enumerate()
            .map(|(i, &start)| {
                ArenaTank::new(TankId(i as u32), start, ai_tanks.contains(&i), &config)
            })
            .collect();
        let agents = tanks
            .iter()
            .map(|tank| {
                tank.stats
                    .ai_controlled
                    .then(|| Agent::new(tank.id, tank.position, ai_config.clone()))
            })
            .collect();

        tracing::debug!(
            map = %map.name,
            tanks = tanks.len(),
            ai = ai_tanks.len(),
            "Arena created"
        );

        Ok(Self {
            grid: map.obstacle_grid(),
            flag: Flag::at(map.flag_position()),
            flag_binding: FlagBinding::default(),
            map: map.clone(),
            config,
            tanks,
            agents,
            bullets: Vec::new(),
            tick: 0,
            update_countdown: 0,
        })
    }

    /// Ticks simulated so far.
    #[must_use]
    pub const fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Current obstacle layer.
    #[must_use]
    pub const fn grid(&self) -> &ObstacleGrid {
        &self.grid
    }

    /// All tanks, indexed by [`TankId`].
    #[must_use]
    pub fn tanks(&self) -> &[ArenaTank] {
        &self.tanks
    }

    /// Mutable access to one tank, for scripting tests and human control.
    pub fn tank_mut(&mut self, id: TankId) -> Option<&mut ArenaTank> {
        self.tanks.get_mut(id.0 as usize)
    }

    /// Agent driving `id`, if the tank is AI controlled.
    #[must_use]
    pub fn agent(&self, id: TankId) -> Option<&Agent> {
        self.agents.get(id.0 as usize).and_then(Option::as_ref)
    }

    /// Bullets in flight.
    #[must_use]
    pub fn bullets(&self) -> &[Bullet] {
        &self.bullets
    }

    /// The flag.
    #[must_use]
    pub const fn flag(&self) -> &Flag {
        &self.flag
    }

    /// Arena tuning.
    #[must_use]
    pub const fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// Snapshot of every tank's counters.
    #[must_use]
    pub fn stats(&self) -> Vec<TankStats> {
        self.tanks.iter().map(|t| t.stats.clone()).collect()
    }

    /// Advance one tick.
    pub fn tick(&mut self) -> Vec<ArenaEvent> {
        let mut events = Vec::new();
        let dt = self.config.tick_seconds();

        if self.update_countdown == 0 {
            for tank in &mut self.tanks {
                tank.update_velocity();
            }
            self.update_countdown = self.config.velocity_update_interval.saturating_sub(1);
        } else {
            self.update_countdown -= 1;
        }

        for index in 0..self.tanks.len() {
            self.move_tank(index, dt);
        }
        self.move_bullets(dt, &mut events);

        for tank in &mut self.tanks {
            if tank.carrying_flag {
                self.flag.position = tank.position;
            } else {
                tank.max_speed = self.config.normal_max_speed;
            }
            tank.cooldown = tank.cooldown.saturating_sub(1);
            tank.protection = tank.protection.saturating_sub(1);
        }

        self.run_agents();

        for index in 0..self.tanks.len() {
            self.try_grab_flag(index, &mut events);
            if self.has_won(index) {
                let winner = self.tanks[index].id;
                tracing::info!(tick = self.tick, %winner, "Round won");
                events.push(ArenaEvent::RoundWon(winner));
                self.reset_round();
                break;
            }
        }

        self.tick += 1;
        events
    }

    /// Put every tank back on its spawn, reset the agents and respawn the flag.
    pub fn reset_round(&mut self) {
        for tank in &mut self.tanks {
            tank.respawn(&self.config);
        }
        for (tank, agent) in self.tanks.iter().zip(self.agents.iter_mut()) {
            if let Some(agent) = agent {
                agent.reset(tank.position);
            }
        }
        self.flag = Flag::at(self.map.flag_position());
        self.flag_binding.clear();
    }

    /// Every object on the field: bases, tanks, the flag, then boxes in row order.
    #[must_use]
    pub fn scene_objects(&self) -> Vec<SceneObject> {
        let mut objects: Vec<SceneObject> = self
            .tanks
            .iter()
            .map(|t| SceneObject::Base(t.start.position()))
            .collect();
        objects.extend(self.tanks.iter().map(|t| SceneObject::Tank(t.id)));
        objects.push(SceneObject::Flag(self.flag));
        for y in 0..self.grid.height() as i32 {
            for x in 0..self.grid.width() as i32 {
                let cell = Cell::new(x, y);
                let kind = self.grid.obstacle_at(cell);
                if kind != ObstacleKind::None {
                    objects.push(SceneObject::Obstacle(cell, kind));
                }
            }
        }
        objects
    }

    /// Deterministic hash of the arena state.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.tick.hash(&mut hasher);
        for tank in &self.tanks {
            tank.position.x.to_bits().hash(&mut hasher);
            tank.position.y.to_bits().hash(&mut hasher);
            tank.angle.to_bits().hash(&mut hasher);
            tank.velocity.to_bits().hash(&mut hasher);
            tank.hp.hash(&mut hasher);
            tank.stats.hash(&mut hasher);
        }
        for bullet in &self.bullets {
            bullet.position.x.to_bits().hash(&mut hasher);
            bullet.position.y.to_bits().hash(&mut hasher);
        }
        self.flag.position.x.to_bits().hash(&mut hasher);
        self.flag.position.y.to_bits().hash(&mut hasher);
        self.flag.carried.hash(&mut hasher);
        self.grid.hash(&mut hasher);
        hasher.finish()
    }

    fn run_agents(&mut self) {
        let bodies: Vec<(TankId, Vec2)> = self.tanks.iter().map(|t| (t.id, t.position)).collect();
        let ids: Vec<TankId> = bodies.iter().map(|&(id, _)| id).collect();
        let scene = self.scene_objects();
        let flag = self.flag_binding.resolve(&scene).copied();

        for (tank, agent) in self.tanks.iter_mut().zip(self.agents.iter_mut()) {
            let Some(agent) = agent else {
                continue;
            };
            let mut view = WorldView {
                grid: &self.grid,
                bodies: &bodies,
                bullets: &mut self.bullets,
                config: &self.config,
            };
            let mut ctx = AgentContext {
                tank,
                world: &mut view,
                map: &self.grid,
                flag: flag.as_ref(),
                tanks: &ids,
            };
            agent.decide(&mut ctx);
        }
    }

    fn move_tank(&mut self, index: usize, dt: f64) {
        let tank = &mut self.tanks[index];
        tank.angle += tank.angular_velocity * dt;
        let step = forward(tank.angle) * (tank.velocity * dt);
        if step.length() < f64::EPSILON {
            return;
        }
        let target = tank.position + step;

        let moved = match self.blocker(target) {
            None => true,
            Some(Blocker::Box(cell, kind)) if kind.is_movable() => {
                self.push_box(cell, kind, step, index) && self.blocker(target).is_none()
            }
            Some(_) => false,
        };

        let tank = &mut self.tanks[index];
        if moved {
            tank.position = target;
        } else {
            // A blocked body loses its momentum.
            tank.velocity = 0.0;
        }
    }

    fn blocker(&self, position: Vec2) -> Option<Blocker> {
        let r = self.config.hull_radius;
        let width = f64::from(self.grid.width());
        let height = f64::from(self.grid.height());
        if position.x - r < 0.0
            || position.y - r < 0.0
            || position.x + r > width
            || position.y + r > height
        {
            return Some(Blocker::Edge);
        }

        for (dx, dy) in [(-r, -r), (r, -r), (-r, r), (r, r)] {
            let cell = Cell::from_position(position + Vec2::new(dx, dy));
            let kind = self.grid.obstacle_at(cell);
            if kind.blocks_movement() {
                return Some(Blocker::Box(cell, kind));
            }
        }
        None
    }

    /// Shove a box one cell along the dominant axis of `step`.
    fn push_box(&mut self, cell: Cell, kind: ObstacleKind, step: Vec2, pusher: usize) -> bool {
        let (dx, dy) = if step.x.abs() >= step.y.abs() {
            (step.x.signum() as i32, 0)
        } else {
            (0, step.y.signum() as i32)
        };
        let destination = Cell::new(cell.x + dx, cell.y + dy);

        // A box on the flag's cell would put it out of reach for the round.
        if self.grid.obstacle_at(destination) != ObstacleKind::None
            || destination == self.flag.cell()
        {
            return false;
        }
        let occupied = self
            .tanks
            .iter()
            .enumerate()
            .any(|(i, t)| i != pusher && Cell::from_position(t.position) == destination);
        if occupied {
            return false;
        }

        self.grid.set(cell, ObstacleKind::None);
        self.grid.set(destination, kind);
        tracing::trace!(from = ?cell, to = ?destination, ?kind, "Box pushed");
        true
    }

    fn move_bullets(&mut self, dt: f64, events: &mut Vec<ArenaEvent>) {
        let travel = self.config.bullet_speed * dt;
        let bullets = std::mem::take(&mut self.bullets);
        let mut survivors = Vec::with_capacity(bullets.len());

        for mut bullet in bullets {
            bullet.position = bullet.position + forward(bullet.angle) * travel;

            let cell = Cell::from_position(bullet.position);
            if !self.inside(bullet.position) {
                continue;
            }

            let kind = self.grid.obstacle_at(cell);
            if kind != ObstacleKind::None {
                if kind.is_destructible() {
                    self.destroy_box(cell, bullet.owner, events);
                }
                continue;
            }

            let reach = self.config.tank_radius + self.config.bullet_radius;
            let victim = self
                .tanks
                .iter()
                .position(|t| t.id != bullet.owner && t.position.distance(bullet.position) < reach);
            if let Some(victim) = victim {
                self.damage(victim, bullet.owner, events);
                continue;
            }

            survivors.push(bullet);
        }

        let contact = 2.0 * self.config.bullet_radius;
        let mut removed = vec![false; survivors.len()];
        for i in 0..survivors.len() {
            if removed[i] {
                continue;
            }
            for j in (i + 1)..survivors.len() {
                if !removed[j] && survivors[i].position.distance(survivors[j].position) < contact {
                    removed[i] = true;
                    removed[j] = true;
                    break;
                }
            }
        }

        self.bullets = survivors
            .into_iter()
            .zip(removed)
            .filter_map(|(bullet, gone)| (!gone).then_some(bullet))
            .collect();
    }

    fn inside(&self, position: Vec2) -> bool {
        position.x >= 0.0
            && position.y >= 0.0
            && position.x < f64::from(self.grid.width())
            && position.y < f64::from(self.grid.height())
    }

    fn destroy_box(&mut self, cell: Cell, by: TankId, events: &mut Vec<ArenaEvent>) {
        self.grid.set(cell, ObstacleKind::None);
        if let Some(shooter) = self.tanks.get_mut(by.0 as usize) {
            shooter.stats.boxes_destroyed += 1;
            shooter.stats.score += 1;
        }
        tracing::debug!(tick = self.tick, %by, ?cell, "Box destroyed");
        events.push(ArenaEvent::BoxDestroyed { by, cell });
    }

    fn damage(&mut self, victim: usize, by: TankId, events: &mut Vec<ArenaEvent>) {
        let config = &self.config;
        let tank = &mut self.tanks[victim];
        if tank.protection > 0 {
            return;
        }
        tank.hp = tank.hp.saturating_sub(config.bullet_damage);
        let victim_id = tank.id;
        if tank.hp > 0 {
            events.push(ArenaEvent::TankHit {
                victim: victim_id,
                by,
            });
            return;
        }

        let had_flag = tank.carrying_flag;
        tank.stats.deaths += 1;
        tank.respawn(config);
        let spawn = tank.position;
        if had_flag {
            self.flag.carried = false;
        }
        if let Some(Some(agent)) = self.agents.get_mut(victim) {
            agent.reset(spawn);
        }
        if let Some(shooter) = self.tanks.get_mut(by.0 as usize) {
            shooter.stats.kills += 1;
            shooter.stats.score += if had_flag { 10 } else { 5 };
        }

        tracing::info!(tick = self.tick, victim = %victim_id, %by, had_flag, "Tank destroyed");
        events.push(ArenaEvent::TankDestroyed {
            victim: victim_id,
            by,
            had_flag,
        });
    }

    fn try_grab_flag(&mut self, index: usize, events: &mut Vec<ArenaEvent>) {
        if self.flag.carried {
            return;
        }
        let tank = &mut self.tanks[index];
        if self.flag.position.distance(tank.position) < self.config.grab_radius {
            tank.carrying_flag = true;
            tank.max_speed = self.config.flag_max_speed();
            tank.stats.flag_grabs += 1;
            self.flag.carried = true;
            tracing::debug!(tick = self.tick, tank = %tank.id, "Flag grabbed");
            events.push(ArenaEvent::FlagGrabbed(tank.id));
        }
    }

    fn has_won(&mut self, index: usize) -> bool {
        let tank = &mut self.tanks[index];
        if tank.carrying_flag
            && tank.start.position().distance(tank.position) < self.config.win_radius
        {
            tank.stats.score += 100;
            tank.stats.captures += 1;
            return true;
        }
        false
    }
}

impl PhysicsWorld for Arena {
    fn ray_cast_first(&self, start: Vec2, end: Vec2, ignore: Option<TankId>) -> Option<RayHit> {
        let bodies: Vec<(TankId, Vec2)> = self.tanks.iter().map(|t| (t.id, t.position)).collect();
        ray_cast(&self.grid, &bodies, &self.bullets, &self.config, start, end, ignore)
    }

    fn spawn_projectile(&mut self, projectile: Projectile) {
        self.bullets.push(projectile.into());
    }
}

/// Borrowed view of the arena handed to agents while tanks are mutably borrowed.
struct WorldView<'a> {
    grid: &'a ObstacleGrid,
    bodies: &'a [(TankId, Vec2)],
    bullets: &'a mut Vec<Bullet>,
    config: &'a ArenaConfig,
}

impl PhysicsWorld for WorldView<'_> {
    fn ray_cast_first(&self, start: Vec2, end: Vec2, ignore: Option<TankId>) -> Option<RayHit> {
        ray_cast(self.grid, self.bodies, self.bullets, self.config, start, end, ignore)
    }

    fn spawn_projectile(&mut self, projectile: Projectile) {
        self.bullets.push(projectile.into());
    }
}

/// First shape crossed by `start..end`: boxes, tank discs, bullets or the edge.
fn ray_cast(
    grid: &ObstacleGrid,
    bodies: &[(TankId, Vec2)],
    bullets: &[Bullet],
    config: &ArenaConfig,
    start: Vec2,
    end: Vec2,
    ignore: Option<TankId>,
) -> Option<RayHit> {
    let mut best: Option<(f64, HitTarget)> = None;
    let mut consider = |t: Option<f64>, target: HitTarget| {
        if let Some(t) = t {
            if best.map_or(true, |(best_t, _)| t < best_t) {
                best = Some((t, target));
            }
        }
    };

    for cell in cells_along(start, end) {
        if !grid.in_bounds(cell) {
            continue;
        }
        let kind = grid.obstacle_at(cell);
        if kind != ObstacleKind::None {
            consider(segment_cell(start, end, cell), HitTarget::Obstacle(kind));
        }
    }
    for &(id, position) in bodies {
        if Some(id) != ignore {
            consider(
                segment_circle(start, end, position, config.tank_radius),
                HitTarget::Tank(id),
            );
        }
    }
    for bullet in bullets {
        consider(
            segment_circle(start, end, bullet.position, config.bullet_radius),
            HitTarget::Projectile,
        );
    }
    consider(
        segment_boundary(
            start,
            end,
            f64::from(grid.width()),
            f64::from(grid.height()),
        ),
        HitTarget::Boundary,
    );

    best.map(|(t, target)| RayHit {
        target,
        point: start + (end - start) * t,
    })
}
