//! Dungeon map model
//!
//! Contains the tile grid, rooms and their connection points, the region
//! bookkeeping used while merging carved areas, and grid pathfinding.

mod map;
mod pathfind;
mod region;
mod room;
mod tile;

pub use map::{DungeonMap, PlacementPolicy};
pub use pathfind::jps_path;
pub use region::{Region, RegionId, RegionSet};
pub use room::{DungeonRoom, RoomConnection, RoomId};
pub use tile::DungeonTile;
