//! Quarter-turn rotations as fixed integer matrices

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use super::{CompassDirection, Point};

/// Rotation of a room template around its local origin.
///
/// Applying the matrix `m` to `p` gives `(x*m[0][0] + y*m[0][1], x*m[1][0] + y*m[1][1])`.
/// With y pointing down, `R90` turns east into south.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumIter,
)]
pub enum Rotation {
    #[default]
    R0,
    R90,
    R180,
    R270,
}

pub type Matrix = [[i32; 2]; 2];

const IDENTITY: Matrix = [[1, 0], [0, 1]];
const QUARTER: Matrix = [[0, -1], [1, 0]];
const HALF: Matrix = [[-1, 0], [0, -1]];
const THREE_QUARTER: Matrix = [[0, 1], [-1, 0]];

const fn mul(p: Point, m: &Matrix) -> Point {
    Point::new(p.x * m[0][0] + p.y * m[0][1], p.x * m[1][0] + p.y * m[1][1])
}

impl Rotation {
    /// Rotation for a number of clockwise quarter turns (wraps mod 4)
    pub const fn from_count(count: usize) -> Rotation {
        match count % 4 {
            0 => Rotation::R0,
            1 => Rotation::R90,
            2 => Rotation::R180,
            _ => Rotation::R270,
        }
    }

    pub const fn count(&self) -> usize {
        match self {
            Rotation::R0 => 0,
            Rotation::R90 => 1,
            Rotation::R180 => 2,
            Rotation::R270 => 3,
        }
    }

    /// Offset added to a stored connection direction
    pub const fn degrees(&self) -> i32 {
        self.count() as i32 * 90
    }

    pub const fn matrix(&self) -> Matrix {
        match self {
            Rotation::R0 => IDENTITY,
            Rotation::R90 => QUARTER,
            Rotation::R180 => HALF,
            Rotation::R270 => THREE_QUARTER,
        }
    }

    pub const fn inverse_matrix(&self) -> Matrix {
        match self {
            Rotation::R0 => IDENTITY,
            Rotation::R90 => THREE_QUARTER,
            Rotation::R180 => HALF,
            Rotation::R270 => QUARTER,
        }
    }

    /// Rotate a local point
    pub const fn apply(&self, p: Point) -> Point {
        mul(p, &self.matrix())
    }

    /// Undo [`Rotation::apply`]
    pub const fn unapply(&self, p: Point) -> Point {
        mul(p, &self.inverse_matrix())
    }

    /// Effective direction of something facing `dir` before rotation
    pub const fn rotate_direction(&self, dir: CompassDirection) -> CompassDirection {
        dir.rotated_by(self.degrees())
    }
}
