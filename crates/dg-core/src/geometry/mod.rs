//! Grid geometry
//!
//! Integer points, half-open rectangles, compass directions and the four
//! quarter-turn rotations used to place room templates.

mod direction;
mod point;
mod rect;
mod rotation;

pub use direction::{CARDINALS, CompassDirection};
pub use point::{Point, manhattan_distance};
pub use rect::Rect;
pub use rotation::{Matrix, Rotation};
