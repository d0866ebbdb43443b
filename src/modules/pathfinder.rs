use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

use tracing::{debug, trace};

use crate::modules::grid::{Coordinate, GridWorld, NEIGHBOR_OFFSETS};

/// Cells from (excluding) the start to (including) the goal.
pub type Path = Vec<Coordinate>;

/// A successful search.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Route {
    pub steps: Path,
    /// g-score of the goal; equals `steps.len()` under unit edge cost.
    pub cost: u32,
    /// Nodes closed before the goal was popped.
    pub expanded: usize,
}

impl Route {
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn goal(&self) -> Option<Coordinate> {
        self.steps.last().copied()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct OpenEntry {
    f_score: u32,
    g_score: u32,
    seq: u64,
    at: Coordinate,
}

// BinaryHeap is a max-heap; order reversed so the smallest (f, g, seq) pops first.
impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        (other.f_score, other.g_score, other.seq).cmp(&(self.f_score, self.g_score, self.seq))
    }
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

pub fn walkable_neighbors<W: GridWorld + ?Sized>(
    world: &W,
    at: Coordinate,
) -> impl Iterator<Item = Coordinate> + '_ {
    NEIGHBOR_OFFSETS
        .into_iter()
        .filter_map(move |(dx, dy)| at.offset(dx, dy))
        .filter(move |next| world.is_walkable(*next))
}

/// A* from `start` to `goal` over the 4-connected grid graph.
///
/// Returns `None` when the goal is unreachable, blocked, or equal to the start.
/// Ties on f-score go to the lower g-score, then to the earlier insertion, so a
/// fixed world always yields the same path.
pub fn find_path<W: GridWorld + ?Sized>(
    world: &W,
    start: Coordinate,
    goal: Coordinate,
) -> Option<Route> {
    if start == goal || !world.is_walkable(goal) {
        trace!(%start, %goal, "search skipped");
        return None;
    }

    let mut open = BinaryHeap::new();
    let mut came_from: HashMap<Coordinate, Coordinate> = HashMap::new();
    let mut g_score: HashMap<Coordinate, u32> = HashMap::new();
    let mut closed: HashSet<Coordinate> = HashSet::new();
    let mut seq = 0u64;

    g_score.insert(start, 0);
    open.push(OpenEntry {
        f_score: start.manhattan(goal),
        g_score: 0,
        seq,
        at: start,
    });

    while let Some(current) = open.pop() {
        if current.at == goal {
            let steps = reconstruct_path(&came_from, goal);
            debug!(
                %start,
                %goal,
                cost = current.g_score,
                expanded = closed.len(),
                "path found"
            );
            return Some(Route {
                steps,
                cost: current.g_score,
                expanded: closed.len(),
            });
        }

        // Stale duplicate of an already finalized node.
        if !closed.insert(current.at) {
            continue;
        }

        for neighbor in walkable_neighbors(world, current.at) {
            if closed.contains(&neighbor) {
                continue;
            }

            let tentative = current.g_score + 1;
            let improves = g_score.get(&neighbor).is_none_or(|&known| tentative < known);
            if improves {
                came_from.insert(neighbor, current.at);
                g_score.insert(neighbor, tentative);
                seq += 1;
                open.push(OpenEntry {
                    f_score: tentative.saturating_add(neighbor.manhattan(goal)),
                    g_score: tentative,
                    seq,
                    at: neighbor,
                });
            }
        }
    }

    debug!(%start, %goal, expanded = closed.len(), "no path");
    None
}

fn reconstruct_path(came_from: &HashMap<Coordinate, Coordinate>, goal: Coordinate) -> Path {
    let mut path = vec![goal];
    let mut current = goal;
    while let Some(&prev) = came_from.get(&current) {
        path.push(prev);
        current = prev;
    }
    // The walk ends on the start, which has no came-from link.
    path.pop();
    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;
    use crate::modules::grid::Grid;

    fn open_grid(width: u32, height: u32) -> Grid {
        Grid::new(width, height).unwrap()
    }

    fn bfs_distance(grid: &Grid, start: Coordinate, goal: Coordinate) -> Option<usize> {
        let mut seen = HashSet::from([start]);
        let mut queue = VecDeque::from([(start, 0usize)]);
        while let Some((at, dist)) = queue.pop_front() {
            if at == goal {
                return Some(dist);
            }
            for next in walkable_neighbors(grid, at) {
                if seen.insert(next) {
                    queue.push_back((next, dist + 1));
                }
            }
        }
        None
    }

    fn assert_valid_walk(grid: &Grid, start: Coordinate, route: &Route) {
        let mut prev = start;
        for step in &route.steps {
            assert!(grid.is_walkable(*step), "{} is not walkable", step);
            assert_eq!(prev.manhattan(*step), 1, "{} -> {} is not a unit move", prev, step);
            prev = *step;
        }
        assert_ne!(route.steps.first(), Some(&start));
    }

    #[test]
    fn open_grid_corner_to_corner() {
        let grid = open_grid(5, 5);
        let start = Coordinate::new(0, 0);
        let route = find_path(&grid, start, Coordinate::new(4, 4)).expect("path");

        assert_eq!(route.len(), 8);
        assert_eq!(route.cost, 8);
        assert_eq!(route.goal(), Some(Coordinate::new(4, 4)));
        assert_valid_walk(&grid, start, &route);
    }

    #[test]
    fn open_grid_paths_match_manhattan_distance() {
        let grid = open_grid(6, 4);
        for sx in 0..6 {
            for sy in 0..4 {
                for gx in 0..6 {
                    for gy in 0..4 {
                        let start = Coordinate::new(sx, sy);
                        let goal = Coordinate::new(gx, gy);
                        match find_path(&grid, start, goal) {
                            Some(route) => {
                                assert_eq!(route.len() as u32, start.manhattan(goal));
                                assert_valid_walk(&grid, start, &route);
                            }
                            None => assert_eq!(start, goal),
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn detours_through_the_gap_in_a_wall() {
        let mut grid = open_grid(3, 3);
        grid.add_barrier(Coordinate::new(1, 0)).unwrap();
        grid.add_barrier(Coordinate::new(1, 1)).unwrap();

        let route = find_path(&grid, Coordinate::new(0, 0), Coordinate::new(2, 0)).expect("path");

        assert_eq!(
            route.steps,
            vec![
                Coordinate::new(0, 1),
                Coordinate::new(0, 2),
                Coordinate::new(1, 2),
                Coordinate::new(2, 2),
                Coordinate::new(2, 1),
                Coordinate::new(2, 0),
            ]
        );
        assert_eq!(route.cost, 6);
    }

    #[test]
    fn enclosed_goal_is_not_found() {
        let mut grid = open_grid(5, 5);
        for at in [(1, 2), (3, 2), (2, 1), (2, 3)] {
            grid.add_barrier(at.into()).unwrap();
        }

        assert!(find_path(&grid, Coordinate::new(0, 0), Coordinate::new(2, 2)).is_none());
    }

    #[test]
    fn start_equal_to_goal_is_not_found() {
        let grid = open_grid(3, 3);
        assert!(find_path(&grid, Coordinate::new(1, 1), Coordinate::new(1, 1)).is_none());
    }

    #[test]
    fn goals_outside_or_on_barriers_are_not_found() {
        let mut grid = open_grid(3, 3);
        grid.add_barrier(Coordinate::new(2, 2)).unwrap();

        assert!(find_path(&grid, Coordinate::new(0, 0), Coordinate::new(2, 2)).is_none());
        assert!(find_path(&grid, Coordinate::new(0, 0), Coordinate::new(7, 0)).is_none());
    }

    #[test]
    fn starts_at_the_edge_of_the_coordinate_range_are_not_found() {
        let grid = open_grid(3, 3);
        let goal = Coordinate::new(0, 0);

        assert!(find_path(&grid, Coordinate::new(i32::MAX, 0), goal).is_none());
        assert!(find_path(&grid, Coordinate::new(i32::MIN, i32::MIN), goal).is_none());
        assert!(find_path(&grid, Coordinate::new(i32::MAX, i32::MAX), goal).is_none());
        assert_eq!(
            walkable_neighbors(&grid, Coordinate::new(i32::MIN, i32::MIN)).count(),
            0
        );
    }

    #[test]
    fn matches_bfs_on_walled_grids() {
        // Deterministic pseudo-random barrier layouts, cross-checked against BFS.
        let mut state: u64 = 0x9e37_79b9_7f4a_7c15;
        let mut next = move || {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            state
        };

        for _ in 0..40 {
            let mut grid = open_grid(7, 6);
            for x in 0..7 {
                for y in 0..6 {
                    if (x, y) != (0, 0) && next() % 100 < 30 {
                        grid.add_barrier(Coordinate::new(x, y)).unwrap();
                    }
                }
            }

            let start = Coordinate::new(0, 0);
            for x in 0..7 {
                for y in 0..6 {
                    let goal = Coordinate::new(x, y);
                    if goal == start {
                        continue;
                    }
                    let expected = bfs_distance(&grid, start, goal);
                    let found = find_path(&grid, start, goal);
                    match (expected, found) {
                        (Some(dist), Some(route)) => {
                            assert_eq!(route.len(), dist, "suboptimal path to {}", goal);
                            assert!(route.len() as u32 >= start.manhattan(goal));
                            assert_valid_walk(&grid, start, &route);
                        }
                        (None, None) => {}
                        (expected, found) => {
                            panic!("bfs={:?} astar={:?} for goal {}", expected, found, goal)
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn repeated_searches_are_deterministic() {
        let mut grid = open_grid(8, 8);
        grid.add_barrier(Coordinate::new(3, 3)).unwrap();
        grid.add_barrier(Coordinate::new(4, 3)).unwrap();

        let first = find_path(&grid, Coordinate::new(0, 0), Coordinate::new(7, 7));
        let second = find_path(&grid, Coordinate::new(0, 0), Coordinate::new(7, 7));
        assert_eq!(first, second);
    }

    #[test]
    fn lower_g_wins_on_equal_f() {
        let low = OpenEntry {
            f_score: 5,
            g_score: 1,
            seq: 9,
            at: Coordinate::new(0, 0),
        };
        let high = OpenEntry {
            f_score: 5,
            g_score: 3,
            seq: 1,
            at: Coordinate::new(1, 0),
        };
        let mut heap = BinaryHeap::from([high, low]);
        assert_eq!(heap.pop(), Some(low));
    }
}
