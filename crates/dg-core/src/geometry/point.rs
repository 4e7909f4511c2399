//! Integer grid coordinates

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Mul, Sub};

use serde::{Deserialize, Serialize};

/// A position (or offset) on the tile grid. Screen orientation: y grows downwards.
///
/// Points order row-major, top row first, so ordered collections of points
/// iterate the same way a map is scanned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const ZERO: Point = Point { x: 0, y: 0 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub const fn manhattan_distance(&self, other: Point) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    /// Turn a direction vector 90 degrees counter-clockwise (as seen on screen)
    pub const fn rotate_left(&self) -> Point {
        Point::new(self.y, -self.x)
    }

    /// Turn a direction vector 90 degrees clockwise (as seen on screen)
    pub const fn rotate_right(&self) -> Point {
        Point::new(-self.y, self.x)
    }

    /// Integer division of both components
    pub const fn div(&self, by: i32) -> Point {
        Point::new(self.x / by, self.y / by)
    }

    /// The four orthogonal neighbours, in N, S, E, W order
    pub fn neighbors_4(&self) -> [Point; 4] {
        [
            Point::new(self.x, self.y - 1),
            Point::new(self.x, self.y + 1),
            Point::new(self.x + 1, self.y),
            Point::new(self.x - 1, self.y),
        ]
    }

    /// All eight surrounding cells, row by row
    pub fn neighbors_8(&self) -> [Point; 8] {
        [
            Point::new(self.x - 1, self.y - 1),
            Point::new(self.x, self.y - 1),
            Point::new(self.x + 1, self.y - 1),
            Point::new(self.x - 1, self.y),
            Point::new(self.x + 1, self.y),
            Point::new(self.x - 1, self.y + 1),
            Point::new(self.x, self.y + 1),
            Point::new(self.x + 1, self.y + 1),
        ]
    }
}

/// Manhattan distance between two points
pub const fn manhattan_distance(a: Point, b: Point) -> i32 {
    a.manhattan_distance(b)
}

impl Ord for Point {
    fn cmp(&self, other: &Self) -> Ordering {
        self.y.cmp(&other.y).then(self.x.cmp(&other.x))
    }
}

impl PartialOrd for Point {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, other: Point) -> Point {
        Point::new(self.x + other.x, self.y + other.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, other: Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }
}

impl Mul<i32> for Point {
    type Output = Point;

    fn mul(self, factor: i32) -> Point {
        Point::new(self.x * factor, self.y * factor)
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Point::new(x, y)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_row_major_order() {
        let points: BTreeSet<Point> = [Point::new(5, 0), Point::new(0, 1), Point::new(1, 0)]
            .into_iter()
            .collect();
        let ordered: Vec<_> = points.into_iter().collect();
        assert_eq!(
            ordered,
            vec![Point::new(1, 0), Point::new(5, 0), Point::new(0, 1)]
        );
    }

    #[test]
    fn test_rotate_left_right_inverse() {
        let east = Point::new(1, 0);
        assert_eq!(east.rotate_right(), Point::new(0, 1));
        assert_eq!(east.rotate_left(), Point::new(0, -1));
        assert_eq!(east.rotate_left().rotate_right(), east);
    }

    #[test]
    fn test_manhattan() {
        assert_eq!(manhattan_distance(Point::new(1, 1), Point::new(4, -3)), 7);
    }

    #[test]
    fn test_arithmetic() {
        let p = Point::new(2, 3) + Point::new(1, -1);
        assert_eq!(p, Point::new(3, 2));
        assert_eq!(p - Point::new(3, 2), Point::ZERO);
        assert_eq!(Point::new(1, -2) * 3, Point::new(3, -6));
        assert_eq!(Point::new(7, 9).div(2), Point::new(3, 4));
    }
}
