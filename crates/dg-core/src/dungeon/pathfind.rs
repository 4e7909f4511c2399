//! Jump point search on a 4-connected grid
//!
//! A* over jump points: straight runs are skipped until a cell with a
//! forced neighbour (or the goal) is reached. Moving vertically also probes
//! both horizontal directions at each step, which is what keeps the search
//! complete without diagonal moves.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use hashbrown::{HashMap, HashSet};

use crate::geometry::Point;

/// Open-list entry
#[derive(Clone, Copy, Eq, PartialEq)]
struct JumpNode {
    pos: Point,
    g_cost: i32,
    f_cost: i32,
}

impl Ord for JumpNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap behavior
        other
            .f_cost
            .cmp(&self.f_cost)
            .then_with(|| other.g_cost.cmp(&self.g_cost))
            .then_with(|| other.pos.cmp(&self.pos))
    }
}

impl PartialOrd for JumpNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

struct JumpSearch<F> {
    walkable: F,
    goal: Point,
}

impl<F: Fn(Point) -> bool> JumpSearch<F> {
    fn open(&self, x: i32, y: i32) -> bool {
        (self.walkable)(Point::new(x, y))
    }

    /// Walk from `from` in (dx, dy) until a jump point, a blocked cell or the goal
    fn jump(&self, from: Point, dx: i32, dy: i32) -> Option<Point> {
        let (mut x, mut y) = (from.x, from.y);
        loop {
            if !self.open(x, y) {
                return None;
            }
            let here = Point::new(x, y);
            if here == self.goal {
                return Some(here);
            }
            if dx != 0 {
                if (self.open(x, y - 1) && !self.open(x - dx, y - 1))
                    || (self.open(x, y + 1) && !self.open(x - dx, y + 1))
                {
                    return Some(here);
                }
            } else {
                if (self.open(x - 1, y) && !self.open(x - 1, y - dy))
                    || (self.open(x + 1, y) && !self.open(x + 1, y - dy))
                {
                    return Some(here);
                }
                if self.jump(Point::new(x + 1, y), 1, 0).is_some()
                    || self.jump(Point::new(x - 1, y), -1, 0).is_some()
                {
                    return Some(here);
                }
            }
            x += dx;
            y += dy;
        }
    }

    /// Pruned successor directions for a node reached from `parent`
    fn directions(&self, pos: Point, parent: Option<Point>) -> Vec<(i32, i32)> {
        let Some(parent) = parent else {
            return [(0, -1), (0, 1), (1, 0), (-1, 0)]
                .into_iter()
                .filter(|&(dx, dy)| self.open(pos.x + dx, pos.y + dy))
                .collect();
        };
        let dx = (pos.x - parent.x).signum();
        let dy = (pos.y - parent.y).signum();
        let candidates = if dx != 0 {
            [(0, -1), (0, 1), (dx, 0)]
        } else {
            [(-1, 0), (1, 0), (0, dy)]
        };
        candidates
            .into_iter()
            .filter(|&(cx, cy)| self.open(pos.x + cx, pos.y + cy))
            .collect()
    }
}

/// Shortest 4-connected path from `start` to `end`, both included.
///
/// Returns an empty path when either end is blocked or no route exists.
/// `is_walkable` must be false outside some finite area.
pub fn jps_path(start: Point, end: Point, is_walkable: impl Fn(Point) -> bool) -> Vec<Point> {
    if !is_walkable(start) || !is_walkable(end) {
        return Vec::new();
    }
    if start == end {
        return vec![start];
    }

    let search = JumpSearch {
        walkable: is_walkable,
        goal: end,
    };
    let mut open_set = BinaryHeap::new();
    let mut g_scores: HashMap<Point, i32> = HashMap::new();
    let mut came_from: HashMap<Point, Point> = HashMap::new();
    let mut closed: HashSet<Point> = HashSet::new();

    g_scores.insert(start, 0);
    open_set.push(JumpNode {
        pos: start,
        g_cost: 0,
        f_cost: start.manhattan_distance(end),
    });

    while let Some(current) = open_set.pop() {
        if current.pos == end {
            return expand(&came_from, start, end);
        }
        if !closed.insert(current.pos) {
            continue;
        }

        let parent = came_from.get(&current.pos).copied();
        for (dx, dy) in search.directions(current.pos, parent) {
            let next = Point::new(current.pos.x + dx, current.pos.y + dy);
            let Some(jump_point) = search.jump(next, dx, dy) else {
                continue;
            };
            if closed.contains(&jump_point) {
                continue;
            }
            let tentative = current.g_cost + current.pos.manhattan_distance(jump_point);
            if g_scores
                .get(&jump_point)
                .is_none_or(|&known| tentative < known)
            {
                g_scores.insert(jump_point, tentative);
                came_from.insert(jump_point, current.pos);
                open_set.push(JumpNode {
                    pos: jump_point,
                    g_cost: tentative,
                    f_cost: tentative + jump_point.manhattan_distance(end),
                });
            }
        }
    }

    Vec::new()
}

/// Rebuild the tile path by filling in the straight runs between jump points
fn expand(came_from: &HashMap<Point, Point>, start: Point, end: Point) -> Vec<Point> {
    let mut jump_points = vec![end];
    let mut current = end;
    while current != start {
        match came_from.get(&current) {
            Some(&prev) => {
                jump_points.push(prev);
                current = prev;
            }
            None => return Vec::new(),
        }
    }
    jump_points.reverse();

    let mut path = vec![start];
    for pair in jump_points.windows(2) {
        let (from, to) = (pair[0], pair[1]);
        let step = Point::new((to.x - from.x).signum(), (to.y - from.y).signum());
        let mut p = from;
        while p != to {
            p = p + step;
            path.push(p);
        }
    }
    path
}
