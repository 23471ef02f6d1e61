//! Grid-based pathfinding using breadth-first search.
//!
//! Every step costs the same, so a plain BFS over the 4-connected grid gives
//! a shortest route. Neighbours are enumerated in a fixed order (+x, +y, -x,
//! -y), which makes the chosen path reproducible for identical map state.
//! Ties between equally short routes go to whichever was discovered first.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::grid::{neighbors, Cell, ObstacleMap, TraversabilityPolicy};

/// Remaining waypoints, front first.
pub type Path = VecDeque<Cell>;

/// Find a shortest route from `start` to `goal`.
///
/// The returned path excludes `start` and ends at `goal`. An empty path means
/// either that no route exists under `policy` or that `start == goal`; neither
/// is an error.
#[must_use]
pub fn find_shortest_path<M: ObstacleMap + ?Sized>(
    map: &M,
    start: Cell,
    goal: Cell,
    policy: TraversabilityPolicy,
) -> Path {
    let mut frontier: VecDeque<Cell> = VecDeque::new();
    let mut visited: HashSet<Cell> = HashSet::new();
    let mut paths: HashMap<Cell, Vec<Cell>> = HashMap::new();

    frontier.push_back(start);
    paths.insert(start, vec![start]);

    let mut expanded = 0usize;

    while let Some(current) = frontier.pop_front() {
        expanded += 1;

        if current == goal {
            let mut route: Path = paths.remove(&current).unwrap_or_default().into();
            route.pop_front();
            tracing::trace!(
                ?start,
                ?goal,
                ?policy,
                expanded,
                length = route.len(),
                "Path found"
            );
            return route;
        }

        let parent_path = paths.get(&current).cloned().unwrap_or_default();

        for neighbor in neighbors(map, current, policy) {
            if !visited.insert(neighbor) {
                continue;
            }

            let mut path = parent_path.clone();
            path.push(neighbor);
            paths.insert(neighbor, path);
            frontier.push_back(neighbor);
        }
    }

    tracing::trace!(?start, ?goal, ?policy, expanded, "No path");
    Path::new()
}

/// Search with the wood-permissive policy, then retry allowing metal.
///
/// Returns the path together with the policy that produced it, or an empty
/// path and `None` when neither policy reaches `goal`.
#[must_use]
pub fn find_path_with_fallback<M: ObstacleMap + ?Sized>(
    map: &M,
    start: Cell,
    goal: Cell,
) -> (Path, Option<TraversabilityPolicy>) {
    for policy in [
        TraversabilityPolicy::GrassAndWoodOnly,
        TraversabilityPolicy::GrassWoodAndMetal,
    ] {
        let path = find_shortest_path(map, start, goal, policy);
        if !path.is_empty() {
            return (path, Some(policy));
        }
    }
    (Path::new(), None)
}
