//! Compass directions

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use super::Point;

/// One of the eight compass directions, stored as clockwise degrees from north
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display,
    EnumIter,
)]
pub enum CompassDirection {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

/// Orthogonal directions in N, S, E, W order
pub const CARDINALS: [CompassDirection; 4] = [
    CompassDirection::North,
    CompassDirection::South,
    CompassDirection::East,
    CompassDirection::West,
];

impl CompassDirection {
    pub const fn degrees(&self) -> i32 {
        match self {
            CompassDirection::North => 0,
            CompassDirection::NorthEast => 45,
            CompassDirection::East => 90,
            CompassDirection::SouthEast => 135,
            CompassDirection::South => 180,
            CompassDirection::SouthWest => 225,
            CompassDirection::West => 270,
            CompassDirection::NorthWest => 315,
        }
    }

    /// Direction for an angle in degrees; the angle is taken mod 360 and
    /// rounded down to the nearest multiple of 45.
    pub const fn from_degrees(degrees: i32) -> CompassDirection {
        match degrees.rem_euclid(360) / 45 {
            0 => CompassDirection::North,
            1 => CompassDirection::NorthEast,
            2 => CompassDirection::East,
            3 => CompassDirection::SouthEast,
            4 => CompassDirection::South,
            5 => CompassDirection::SouthWest,
            6 => CompassDirection::West,
            _ => CompassDirection::NorthWest,
        }
    }

    pub const fn opposite(&self) -> CompassDirection {
        self.rotated_by(180)
    }

    /// Rotate clockwise by `degrees`
    pub const fn rotated_by(&self, degrees: i32) -> CompassDirection {
        CompassDirection::from_degrees(self.degrees() + degrees)
    }

    pub const fn is_cardinal(&self) -> bool {
        self.degrees() % 90 == 0
    }

    /// Unit step in screen coordinates (north is -y)
    pub const fn to_point(&self) -> Point {
        match self {
            CompassDirection::North => Point::new(0, -1),
            CompassDirection::NorthEast => Point::new(1, -1),
            CompassDirection::East => Point::new(1, 0),
            CompassDirection::SouthEast => Point::new(1, 1),
            CompassDirection::South => Point::new(0, 1),
            CompassDirection::SouthWest => Point::new(-1, 1),
            CompassDirection::West => Point::new(-1, 0),
            CompassDirection::NorthWest => Point::new(-1, -1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_opposites() {
        for dir in CompassDirection::iter() {
            assert_eq!(dir.opposite().opposite(), dir);
            assert_eq!(dir.to_point() + dir.opposite().to_point(), Point::ZERO);
        }
        assert_eq!(CompassDirection::North.opposite(), CompassDirection::South);
        assert_eq!(CompassDirection::East.opposite(), CompassDirection::West);
    }

    #[test]
    fn test_degrees_round_trip() {
        for dir in CompassDirection::iter() {
            assert_eq!(CompassDirection::from_degrees(dir.degrees()), dir);
            assert_eq!(CompassDirection::from_degrees(dir.degrees() + 360), dir);
            assert_eq!(CompassDirection::from_degrees(dir.degrees() - 360), dir);
        }
    }

    #[test]
    fn test_quarter_turns() {
        assert_eq!(CompassDirection::East.rotated_by(90), CompassDirection::South);
        assert_eq!(CompassDirection::West.rotated_by(270), CompassDirection::South);
        assert_eq!(CompassDirection::North.rotated_by(-90), CompassDirection::West);
    }

    #[test]
    fn test_cardinals() {
        assert!(CARDINALS.iter().all(|d| d.is_cardinal()));
        assert!(!CompassDirection::NorthEast.is_cardinal());
    }
}
