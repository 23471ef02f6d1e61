//! Map blueprint: dimensions, box layer, start positions and flag spawn.

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::grid::{Cell, ObstacleGrid, ObstacleKind, ObstacleMap};
use crate::math::Vec2;

/// Fewest tanks a map may declare.
pub const MIN_TANKS: usize = 2;

/// Most tanks a map may declare.
pub const MAX_TANKS: usize = 6;

/// Spawn point and base of one tank.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StartPosition {
    /// X position in map units.
    pub x: f64,
    /// Y position in map units.
    pub y: f64,
    /// Initial hull orientation in degrees.
    pub orientation_degrees: f64,
}

impl StartPosition {
    /// Create a start position.
    #[must_use]
    pub const fn new(x: f64, y: f64, orientation_degrees: f64) -> Self {
        Self {
            x,
            y,
            orientation_degrees,
        }
    }

    /// Position as a vector.
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    /// Base cell of the tank spawned here.
    #[must_use]
    pub fn cell(&self) -> Cell {
        Cell::from_position(self.position())
    }
}

/// A playable map.
///
/// `boxes` is indexed `boxes[y][x]` and holds raw obstacle codes
/// (see [`ObstacleKind::from_code`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameMap {
    /// Display name.
    pub name: String,
    /// Width in cells.
    pub width: u32,
    /// Height in cells.
    pub height: u32,
    /// Obstacle codes, row-major.
    pub boxes: Vec<Vec<u8>>,
    /// One entry per tank, in player order.
    pub start_positions: Vec<StartPosition>,
    /// Flag spawn position.
    pub flag_position: (f64, f64),
}

impl GameMap {
    /// Parse a map from RON and validate it.
    pub fn from_ron_str(ron: &str) -> Result<Self> {
        let map: Self = ron::from_str(ron)?;
        map.validate()?;
        Ok(map)
    }

    /// Check the map is internally consistent.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(GameError::InvalidDimensions {
                name: self.name.clone(),
                width: self.width,
                height: self.height,
            });
        }

        if self.boxes.len() != self.height as usize {
            return Err(GameError::RowCount {
                name: self.name.clone(),
                found: self.boxes.len(),
                expected: self.height as usize,
            });
        }

        for (y, row) in self.boxes.iter().enumerate() {
            if row.len() != self.width as usize {
                return Err(GameError::RaggedRow {
                    name: self.name.clone(),
                    row: y,
                    found: row.len(),
                    expected: self.width as usize,
                });
            }
            if let Some((x, &code)) = row
                .iter()
                .enumerate()
                .find(|(_, &code)| ObstacleKind::from_code(code).is_none())
            {
                return Err(GameError::UnknownObstacle { code, x, y });
            }
        }

        let count = self.start_positions.len();
        if !(MIN_TANKS..=MAX_TANKS).contains(&count) {
            return Err(GameError::StartPositionCount {
                name: self.name.clone(),
                count,
            });
        }

        for (i, start) in self.start_positions.iter().enumerate() {
            self.check_inside(&format!("Start position {i}"), start.position())?;
        }
        self.check_inside("Flag", self.flag_position())?;

        Ok(())
    }

    fn check_inside(&self, what: &str, position: Vec2) -> Result<()> {
        let inside = position.x >= 0.0
            && position.y >= 0.0
            && position.x < f64::from(self.width)
            && position.y < f64::from(self.height);
        if inside {
            Ok(())
        } else {
            Err(GameError::OutOfBounds {
                what: what.to_string(),
                x: position.x,
                y: position.y,
            })
        }
    }

    /// Flag spawn as a vector.
    #[must_use]
    pub fn flag_position(&self) -> Vec2 {
        self.flag_position.into()
    }

    /// Copy of the obstacle layer as a mutable grid.
    #[must_use]
    pub fn obstacle_grid(&self) -> ObstacleGrid {
        let mut grid = ObstacleGrid::new(self.width.max(1), self.height.max(1));
        for (y, row) in self.boxes.iter().enumerate() {
            for (x, &code) in row.iter().enumerate() {
                let kind = ObstacleKind::from_code(code).unwrap_or(ObstacleKind::Rock);
                grid.set(Cell::new(x as i32, y as i32), kind);
            }
        }
        grid
    }

    /// Build a map from ASCII rows: `.` grass, `#` rock, `w` wood, `m` metal.
    ///
    /// Unknown characters are read as rock.
    #[must_use]
    pub fn from_ascii(
        name: &str,
        rows: &[&str],
        start_positions: Vec<StartPosition>,
        flag_position: (f64, f64),
    ) -> Self {
        let boxes: Vec<Vec<u8>> = rows
            .iter()
            .map(|row| {
                row.chars()
                    .map(|c| match c {
                        '.' => ObstacleKind::None,
                        'w' => ObstacleKind::Wood,
                        'm' => ObstacleKind::Metal,
                        _ => ObstacleKind::Rock,
                    })
                    .map(ObstacleKind::code)
                    .collect()
            })
            .collect();
        Self {
            name: name.to_string(),
            width: boxes.first().map_or(0, |row| row.len() as u32),
            height: boxes.len() as u32,
            boxes,
            start_positions,
            flag_position,
        }
    }
}

impl ObstacleMap for GameMap {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn obstacle_at(&self, cell: Cell) -> ObstacleKind {
        if !self.in_bounds(cell) {
            return ObstacleKind::Rock;
        }
        self.boxes
            .get(cell.y as usize)
            .and_then(|row| row.get(cell.x as usize))
            .and_then(|&code| ObstacleKind::from_code(code))
            .unwrap_or(ObstacleKind::Rock)
    }
}
