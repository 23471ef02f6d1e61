//! Grid model over the map's obstacle layer.
//!
//! Answers "may the search step onto this cell" under a
//! [`TraversabilityPolicy`]. Lookups outside the map are rejected by the
//! bounds check before the obstacle layer is consulted.

use serde::{Deserialize, Serialize};

use crate::math::Vec2;

/// Integer grid coordinate.
///
/// Signed so that neighbour candidates left of or above the map are
/// representable and rejected by the bounds check instead of wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Cell {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

impl Cell {
    /// Create a new cell.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Cell containing a continuous position (truncates toward zero).
    #[must_use]
    pub fn from_position(position: Vec2) -> Self {
        Self::new(position.x as i32, position.y as i32)
    }

    /// Upper-left corner of the cell offset by `offset` on both axes.
    #[must_use]
    pub fn offset_position(self, offset: f64) -> Vec2 {
        Vec2::new(f64::from(self.x) + offset, f64::from(self.y) + offset)
    }

    /// Manhattan distance to `other`.
    #[must_use]
    pub const fn manhattan_distance(self, other: Self) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// Whether `other` is one cardinal step away.
    #[must_use]
    pub const fn is_adjacent(self, other: Self) -> bool {
        self.manhattan_distance(other) == 1
    }
}

impl From<(i32, i32)> for Cell {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

/// Obstacle classification of a map cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ObstacleKind {
    /// Open grass.
    #[default]
    None,
    /// Impassable rock, also used for the map boundary.
    Rock,
    /// Destructible wooden box.
    Wood,
    /// Indestructible but movable metal box.
    Metal,
}

impl ObstacleKind {
    /// Decode a map file box code.
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::None),
            1 => Some(Self::Rock),
            2 => Some(Self::Wood),
            3 => Some(Self::Metal),
            _ => None,
        }
    }

    /// Map file box code.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Rock => 1,
            Self::Wood => 2,
            Self::Metal => 3,
        }
    }

    /// Whether bullets destroy this obstacle.
    #[must_use]
    pub const fn is_destructible(self) -> bool {
        matches!(self, Self::Wood)
    }

    /// Whether a tank body cannot occupy the cell.
    #[must_use]
    pub const fn blocks_movement(self) -> bool {
        !matches!(self, Self::None)
    }

    /// Whether a tank can shove this box into a free neighbouring cell.
    #[must_use]
    pub const fn is_movable(self) -> bool {
        matches!(self, Self::Wood | Self::Metal)
    }
}

/// Which obstacle classes the search treats as passable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TraversabilityPolicy {
    /// Grass and wooden boxes (wood can be shot away).
    #[default]
    GrassAndWoodOnly,
    /// Grass, wooden and metal boxes (metal can be pushed).
    GrassWoodAndMetal,
}

impl TraversabilityPolicy {
    /// Whether an in-bounds cell of `kind` is passable under this policy.
    #[must_use]
    pub const fn permits(self, kind: ObstacleKind) -> bool {
        match kind {
            ObstacleKind::None | ObstacleKind::Wood => true,
            ObstacleKind::Metal => matches!(self, Self::GrassWoodAndMetal),
            ObstacleKind::Rock => false,
        }
    }
}

/// Read-only view of a map's obstacle layer.
pub trait ObstacleMap {
    /// Width in cells.
    fn width(&self) -> u32;

    /// Height in cells.
    fn height(&self) -> u32;

    /// Obstacle at an in-bounds cell. Implementations return
    /// [`ObstacleKind::Rock`] for cells outside the map.
    fn obstacle_at(&self, cell: Cell) -> ObstacleKind;

    /// Whether `cell` lies inside `[0, width-1] x [0, height-1]`.
    fn in_bounds(&self, cell: Cell) -> bool {
        cell.x >= 0
            && cell.y >= 0
            && (cell.x as u32) < self.width()
            && (cell.y as u32) < self.height()
    }
}

/// Cardinal neighbour offsets in enumeration order: +x, +y, -x, -y.
pub const NEIGHBOR_OFFSETS: [(i32, i32); 4] = [(1, 0), (0, 1), (-1, 0), (0, -1)];

/// Whether the search may step onto `cell` under `policy`.
#[must_use]
pub fn is_traversable<M: ObstacleMap + ?Sized>(
    map: &M,
    cell: Cell,
    policy: TraversabilityPolicy,
) -> bool {
    map.in_bounds(cell) && policy.permits(map.obstacle_at(cell))
}

/// Traversable cardinal neighbours of `cell`, in [`NEIGHBOR_OFFSETS`] order.
pub fn neighbors<M: ObstacleMap + ?Sized>(
    map: &M,
    cell: Cell,
    policy: TraversabilityPolicy,
) -> impl Iterator<Item = Cell> + '_ {
    NEIGHBOR_OFFSETS
        .into_iter()
        .map(move |(dx, dy)| Cell::new(cell.x + dx, cell.y + dy))
        .filter(move |&candidate| is_traversable(map, candidate, policy))
}

/// Dense obstacle grid stored in row-major order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObstacleGrid {
    width: u32,
    height: u32,
    cells: Vec<ObstacleKind>,
}

impl ObstacleGrid {
    /// Create an open grid.
    ///
    /// # Panics
    ///
    /// Panics if `width` or `height` is zero.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        assert!(width > 0, "ObstacleGrid width must be positive");
        assert!(height > 0, "ObstacleGrid height must be positive");
        Self {
            width,
            height,
            cells: vec![ObstacleKind::None; (width as usize) * (height as usize)],
        }
    }

    #[inline]
    fn index(&self, cell: Cell) -> Option<usize> {
        self.in_bounds(cell)
            .then(|| (cell.y as usize) * (self.width as usize) + (cell.x as usize))
    }

    /// Set the obstacle at `cell`. Returns `false` if out of bounds.
    pub fn set(&mut self, cell: Cell, kind: ObstacleKind) -> bool {
        match self.index(cell) {
            Some(index) => {
                self.cells[index] = kind;
                true
            }
            None => false,
        }
    }

    /// Count cells of a given kind.
    #[must_use]
    pub fn count(&self, kind: ObstacleKind) -> usize {
        self.cells.iter().filter(|&&c| c == kind).count()
    }
}

impl ObstacleMap for ObstacleGrid {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn obstacle_at(&self, cell: Cell) -> ObstacleKind {
        self.index(cell)
            .map_or(ObstacleKind::Rock, |index| self.cells[index])
    }
}
