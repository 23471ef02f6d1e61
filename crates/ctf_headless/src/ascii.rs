//! ASCII rendering of arenas and routes for terminal review.

use ctf_core::grid::{Cell, ObstacleKind, ObstacleMap};
use ctf_core::pathfinding::Path;
use ctf_core::world::TankControls;

use crate::arena::Arena;

/// Character for an obstacle cell.
fn obstacle_char(kind: ObstacleKind) -> char {
    match kind {
        ObstacleKind::None => '.',
        ObstacleKind::Rock => '#',
        ObstacleKind::Wood => 'w',
        ObstacleKind::Metal => 'm',
    }
}

/// Render the obstacle layer of `map` as rows of characters.
pub fn render_grid<M: ObstacleMap + ?Sized>(map: &M) -> Vec<Vec<char>> {
    (0..map.height() as i32)
        .map(|y| {
            (0..map.width() as i32)
                .map(|x| obstacle_char(map.obstacle_at(Cell::new(x, y))))
                .collect()
        })
        .collect()
}

fn put(rows: &mut [Vec<char>], cell: Cell, c: char) {
    if cell.x < 0 || cell.y < 0 {
        return;
    }
    if let Some(slot) = rows
        .get_mut(cell.y as usize)
        .and_then(|row| row.get_mut(cell.x as usize))
    {
        *slot = c;
    }
}

fn join(rows: &[Vec<char>]) -> String {
    rows.iter()
        .map(|row| row.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Draw a route: `S` start, `*` waypoints, `G` goal.
pub fn render_path<M: ObstacleMap + ?Sized>(map: &M, start: Cell, path: &Path) -> String {
    let mut rows = render_grid(map);
    for &cell in path {
        put(&mut rows, cell, '*');
    }
    if let Some(&goal) = path.back() {
        put(&mut rows, goal, 'G');
    }
    put(&mut rows, start, 'S');
    join(&rows)
}

/// Draw the arena: tanks by index digit, `F` for a free flag, `o` bullets.
pub fn render_arena(arena: &Arena) -> String {
    let mut rows = render_grid(arena.grid());
    for bullet in arena.bullets() {
        put(&mut rows, Cell::from_position(bullet.position), 'o');
    }
    if !arena.flag().carried {
        put(&mut rows, arena.flag().cell(), 'F');
    }
    for (i, tank) in arena.tanks().iter().enumerate() {
        let c = char::from_digit(i as u32 % 10, 10).unwrap_or('T');
        put(&mut rows, Cell::from_position(tank.position()), c);
    }
    join(&rows)
}
