//! Segment intersection tests used by the arena's ray casts.
//!
//! All functions return the parametric distance `t` in `[0, 1]` along the
//! segment `start + t * (end - start)` of the first contact, if any.

use ctf_core::grid::Cell;
use ctf_core::math::Vec2;

/// First contact of the segment with the unit square of `cell`.
#[must_use]
pub fn segment_cell(start: Vec2, end: Vec2, cell: Cell) -> Option<f64> {
    let min = Vec2::new(f64::from(cell.x), f64::from(cell.y));
    segment_aabb(start, end, min, min + Vec2::new(1.0, 1.0))
}

/// Slab test against an axis-aligned box.
#[must_use]
pub fn segment_aabb(start: Vec2, end: Vec2, min: Vec2, max: Vec2) -> Option<f64> {
    let delta = end - start;
    let mut t_enter = 0.0_f64;
    let mut t_exit = 1.0_f64;

    for (origin, direction, low, high) in [
        (start.x, delta.x, min.x, max.x),
        (start.y, delta.y, min.y, max.y),
    ] {
        if direction.abs() < f64::EPSILON {
            if origin < low || origin > high {
                return None;
            }
            continue;
        }
        let a = (low - origin) / direction;
        let b = (high - origin) / direction;
        let (near, far) = if a < b { (a, b) } else { (b, a) };
        t_enter = t_enter.max(near);
        t_exit = t_exit.min(far);
        if t_enter > t_exit {
            return None;
        }
    }

    Some(t_enter)
}

/// First contact of the segment with a disc.
#[must_use]
pub fn segment_circle(start: Vec2, end: Vec2, center: Vec2, radius: f64) -> Option<f64> {
    let delta = end - start;
    let offset = start - center;
    let a = delta.x * delta.x + delta.y * delta.y;
    let c = offset.x * offset.x + offset.y * offset.y - radius * radius;

    if c <= 0.0 {
        return Some(0.0);
    }
    if a < f64::EPSILON {
        return None;
    }

    let b = 2.0 * (offset.x * delta.x + offset.y * delta.y);
    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return None;
    }
    let t = (-b - discriminant.sqrt()) / (2.0 * a);
    (0.0..=1.0).contains(&t).then_some(t)
}

/// Where the segment leaves the `width` x `height` map, if it does.
#[must_use]
pub fn segment_boundary(start: Vec2, end: Vec2, width: f64, height: f64) -> Option<f64> {
    let inside = |p: Vec2| p.x >= 0.0 && p.y >= 0.0 && p.x <= width && p.y <= height;
    if !inside(start) {
        return Some(0.0);
    }
    if inside(end) {
        return None;
    }

    let delta = end - start;
    let mut t_exit = 1.0_f64;
    for (origin, direction, high) in [(start.x, delta.x, width), (start.y, delta.y, height)] {
        if direction > 0.0 {
            t_exit = t_exit.min((high - origin) / direction);
        } else if direction < 0.0 {
            t_exit = t_exit.min(-origin / direction);
        }
    }
    Some(t_exit.max(0.0))
}

/// Cells whose squares the segment may touch, in no particular order.
pub fn cells_along(start: Vec2, end: Vec2) -> impl Iterator<Item = Cell> {
    let min_x = start.x.min(end.x).floor() as i32;
    let max_x = start.x.max(end.x).floor() as i32;
    let min_y = start.y.min(end.y).floor() as i32;
    let max_y = start.y.max(end.y).floor() as i32;
    (min_y..=max_y).flat_map(move |y| (min_x..=max_x).map(move |x| Cell::new(x, y)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_segment_cell_hit_and_miss() {
        let start = Vec2::new(0.5, 0.5);
        let end = Vec2::new(4.5, 0.5);
        let t = segment_cell(start, end, Cell::new(2, 0)).unwrap();
        assert!((t - 0.375).abs() < EPS);
        assert!(segment_cell(start, end, Cell::new(2, 1)).is_none());
    }

    #[test]
    fn test_segment_circle() {
        let t = segment_circle(
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(5.0, 0.0),
            1.0,
        )
        .unwrap();
        assert!((t - 0.4).abs() < EPS);
        assert!(segment_circle(
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(5.0, 2.0),
            1.0
        )
        .is_none());
    }

    #[test]
    fn test_segment_boundary_exit() {
        let t = segment_boundary(Vec2::new(1.0, 1.0), Vec2::new(1.0, 9.0), 4.0, 5.0).unwrap();
        assert!((t - 0.5).abs() < EPS);
        assert!(segment_boundary(Vec2::new(1.0, 1.0), Vec2::new(2.0, 2.0), 4.0, 5.0).is_none());
    }

    #[test]
    fn test_cells_along_covers_bounding_box() {
        let cells: Vec<Cell> = cells_along(Vec2::new(0.5, 0.5), Vec2::new(1.5, 2.5)).collect();
        assert_eq!(cells.len(), 6);
        assert!(cells.contains(&Cell::new(1, 2)));
    }
}
