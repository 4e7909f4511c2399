//! Axis-aligned rectangles with an exclusive upper corner

use serde::{Deserialize, Serialize};

use super::{CompassDirection, Point};
use crate::rng::GameRng;

/// A rectangle covering `min.x..max.x` by `min.y..max.y`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rect {
    pub min: Point,
    pub max: Point,
}

impl Rect {
    /// Create a new rectangle from its top-left cell and exclusive bottom-right corner
    pub const fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self {
            min: Point::new(x1, y1),
            max: Point::new(x2, y2),
        }
    }

    pub const fn width(&self) -> i32 {
        self.max.x - self.min.x
    }

    pub const fn height(&self) -> i32 {
        self.max.y - self.min.y
    }

    /// Width and height as a point
    pub const fn size(&self) -> Point {
        Point::new(self.width(), self.height())
    }

    pub const fn area(&self) -> i32 {
        self.width() * self.height()
    }

    pub const fn is_empty(&self) -> bool {
        self.width() <= 0 || self.height() <= 0
    }

    pub const fn contains(&self, p: Point) -> bool {
        p.x >= self.min.x && p.x < self.max.x && p.y >= self.min.y && p.y < self.max.y
    }

    pub const fn center(&self) -> Point {
        Point::new(
            (self.min.x + self.max.x - 1) / 2,
            (self.min.y + self.max.y - 1) / 2,
        )
    }

    /// Check if `p` is one of the four corner cells of this rectangle
    pub const fn is_on_corner(&self, p: Point) -> bool {
        let left_or_right = p.x == self.min.x || p.x == self.max.x - 1;
        let top_or_bottom = p.y == self.min.y || p.y == self.max.y - 1;
        left_or_right && top_or_bottom
    }

    /// Grow (or shrink, with negative values) each side independently
    pub const fn shift(&self, left: i32, top: i32, right: i32, bottom: i32) -> Rect {
        Rect::new(
            self.min.x - left,
            self.min.y - top,
            self.max.x + right,
            self.max.y + bottom,
        )
    }

    /// Translate the whole rectangle
    pub fn translated(&self, by: Point) -> Rect {
        Rect {
            min: self.min + by,
            max: self.max + by,
        }
    }

    /// Iterate every cell, row by row
    pub fn points(&self) -> impl Iterator<Item = Point> + '_ {
        (self.min.y..self.max.y)
            .flat_map(move |y| (self.min.x..self.max.x).map(move |x| Point::new(x, y)))
    }

    /// A random cell along one edge of the rectangle.
    ///
    /// Corner cells are avoided when the edge is long enough to have an inner cell.
    /// Diagonal directions pick the matching corner.
    pub fn random_point_on_edge(&self, rng: &mut GameRng, side: CompassDirection) -> Point {
        let last_x = self.max.x - 1;
        let last_y = self.max.y - 1;
        match side {
            CompassDirection::North => Point::new(self.random_along(rng, true), self.min.y),
            CompassDirection::South => Point::new(self.random_along(rng, true), last_y),
            CompassDirection::East => Point::new(last_x, self.random_along(rng, false)),
            CompassDirection::West => Point::new(self.min.x, self.random_along(rng, false)),
            CompassDirection::NorthEast => Point::new(last_x, self.min.y),
            CompassDirection::SouthEast => Point::new(last_x, last_y),
            CompassDirection::SouthWest => Point::new(self.min.x, last_y),
            CompassDirection::NorthWest => self.min,
        }
    }

    fn random_along(&self, rng: &mut GameRng, horizontal: bool) -> i32 {
        let (start, len) = if horizontal {
            (self.min.x, self.width())
        } else {
            (self.min.y, self.height())
        };
        if len > 2 {
            start + 1 + rng.rn2(len - 2)
        } else {
            start + rng.rn2(len)
        }
    }
}
