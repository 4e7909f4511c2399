//! Connected areas tracked while a level is being stitched together
//!
//! Every carved floor tile belongs to exactly one live region. Merging two
//! regions through a connector tile replaces both with a `Merged` node, so
//! the final region is a binary tree recording how the level was joined.

use std::collections::{BTreeMap, BTreeSet};

use hashbrown::HashMap;

use super::{DungeonMap, RoomId};
use crate::geometry::Point;

/// Key of a live region in a [`RegionSet`]
pub type RegionId = usize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Region {
    /// A room registered on the map
    Room(RoomId),
    /// Maze-carved corridor tiles
    Corridor(BTreeSet<Point>),
    /// Two regions joined through a single connector tile
    Merged {
        parts: Box<(Region, Region)>,
        connector: Point,
    },
}

impl Region {
    /// All floor tiles of the region in map coordinates, connectors included
    pub fn floor_tiles(&self, map: &DungeonMap) -> Vec<Point> {
        match self {
            Region::Room(id) => map
                .room(*id)
                .map(|room| room.absolute_floor_tiles())
                .unwrap_or_default(),
            Region::Corridor(tiles) => tiles.iter().copied().collect(),
            Region::Merged { parts, connector } => {
                let mut tiles = parts.0.floor_tiles(map);
                tiles.extend(parts.1.floor_tiles(map));
                tiles.push(*connector);
                tiles
            }
        }
    }

    /// Connector tiles of the merge tree, root first
    pub fn connectors(&self) -> Vec<Point> {
        let mut out = Vec::new();
        self.collect_connectors(&mut out);
        out
    }

    fn collect_connectors(&self, out: &mut Vec<Point>) {
        if let Region::Merged { parts, connector } = self {
            out.push(*connector);
            parts.0.collect_connectors(out);
            parts.1.collect_connectors(out);
        }
    }

    /// Rooms contained anywhere in this region
    pub fn room_ids(&self) -> Vec<RoomId> {
        match self {
            Region::Room(id) => vec![*id],
            Region::Corridor(_) => Vec::new(),
            Region::Merged { parts, .. } => {
                let mut ids = parts.0.room_ids();
                ids.extend(parts.1.room_ids());
                ids
            }
        }
    }

    /// The room, if this region is exactly one room
    pub fn as_room(&self) -> Option<RoomId> {
        match self {
            Region::Room(id) => Some(*id),
            _ => None,
        }
    }
}

struct Entry {
    region: Region,
    tiles: Vec<Point>,
}

/// Arena of live regions plus a tile lookup
#[derive(Default)]
pub struct RegionSet {
    entries: BTreeMap<RegionId, Entry>,
    lookup: HashMap<Point, RegionId>,
    next_id: RegionId,
}

impl RegionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a region; its tiles are read once and cached
    pub fn add(&mut self, region: Region, map: &DungeonMap) -> RegionId {
        let tiles = region.floor_tiles(map);
        self.insert(region, tiles)
    }

    fn insert(&mut self, region: Region, tiles: Vec<Point>) -> RegionId {
        let id = self.next_id;
        self.next_id += 1;
        for &p in &tiles {
            self.lookup.insert(p, id);
        }
        self.entries.insert(id, Entry { region, tiles });
        id
    }

    pub fn region_at(&self, p: Point) -> Option<RegionId> {
        self.lookup.get(&p).copied()
    }

    pub fn get(&self, id: RegionId) -> Option<&Region> {
        self.entries.get(&id).map(|e| &e.region)
    }

    pub fn tiles(&self, id: RegionId) -> &[Point] {
        self.entries.get(&id).map_or(&[], |e| e.tiles.as_slice())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Live region ids in ascending order
    pub fn ids(&self) -> Vec<RegionId> {
        self.entries.keys().copied().collect()
    }

    /// Replace `a` and `b` with one merged region joined at `connector`.
    ///
    /// Returns `None` if either id is unknown or both are the same region.
    pub fn merge(&mut self, a: RegionId, b: RegionId, connector: Point) -> Option<RegionId> {
        if a == b || !self.entries.contains_key(&a) || !self.entries.contains_key(&b) {
            return None;
        }
        let first = self.entries.remove(&a)?;
        let second = self.entries.remove(&b)?;
        let mut tiles = first.tiles;
        tiles.extend(second.tiles);
        tiles.push(connector);
        let merged = Region::Merged {
            parts: Box::new((first.region, second.region)),
            connector,
        };
        Some(self.insert(merged, tiles))
    }

    /// Drop a region and forget its tiles
    pub fn remove(&mut self, id: RegionId) -> Option<Region> {
        let entry = self.entries.remove(&id)?;
        for p in &entry.tiles {
            if self.lookup.get(p) == Some(&id) {
                self.lookup.remove(p);
            }
        }
        Some(entry.region)
    }
}
