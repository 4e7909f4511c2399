//! Tile kinds

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

/// What occupies one grid cell
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumIter,
)]
#[repr(u8)]
pub enum DungeonTile {
    #[default]
    Wall = 0,
    Door = 1,
    Room = 2,
    Corridor = 3,
    StairsUp = 4,
    StairsDown = 5,
}

impl DungeonTile {
    /// Anything but solid rock
    pub const fn is_walkable(&self) -> bool {
        !matches!(self, DungeonTile::Wall)
    }

    /// Open floor: room or corridor, but not doors or stairs
    pub const fn is_empty_space(&self) -> bool {
        matches!(self, DungeonTile::Room | DungeonTile::Corridor)
    }

    /// Get the ASCII symbol for this tile
    pub const fn symbol(&self) -> char {
        match self {
            DungeonTile::Wall => '#',
            DungeonTile::Door => '+',
            DungeonTile::Room => '.',
            DungeonTile::Corridor => '.',
            DungeonTile::StairsUp => '<',
            DungeonTile::StairsDown => '>',
        }
    }
}
