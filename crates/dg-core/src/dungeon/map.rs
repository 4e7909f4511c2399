//! The dungeon tile grid and its room registry

use std::fmt;

use tracing::{debug, trace};

use super::pathfind::jps_path;
use super::{DungeonRoom, DungeonTile, RoomId};
use crate::geometry::{CARDINALS, CompassDirection, Point};
use crate::rng::GameRng;

/// How strictly [`DungeonMap::can_place_room`] guards a room's surroundings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlacementPolicy {
    /// Floor must be inside the map and on solid rock
    Permissive,
    /// As `Permissive`, and no floor tile may touch the map edge
    EdgeBuffer,
    /// As `EdgeBuffer`, and all eight neighbours of every floor tile must be rock
    Isolated,
}

type Pattern = [[DungeonTile; 3]; 3];

const W: DungeonTile = DungeonTile::Wall;
const R: DungeonTile = DungeonTile::Room;

/// A floor nook under a wall, and a solid wall block above a floor row
const STAIR_PATTERNS: [Pattern; 2] = [[[W, W, W], [W, R, W], [R, R, R]], [[W, W, W], [W, W, W], [R, R, R]]];

const STAIR_SPACING: i32 = 5;

/// A `width` x `height` grid of tiles plus the rooms carved into it
#[derive(Debug, Clone, PartialEq)]
pub struct DungeonMap {
    width: i32,
    height: i32,
    tiles: Vec<DungeonTile>,
    rooms: Vec<DungeonRoom>,
    first_room: Option<RoomId>,
    last_room: Option<RoomId>,
    stairs_up: Option<Point>,
    stairs_down: Option<Point>,
}

impl DungeonMap {
    /// Create a map of solid rock
    pub fn new(width: i32, height: i32) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        Self {
            width,
            height,
            tiles: vec![DungeonTile::Wall; (width * height) as usize],
            rooms: Vec::new(),
            first_room: None,
            last_room: None,
            stairs_up: None,
            stairs_down: None,
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn size(&self) -> (i32, i32) {
        (self.width, self.height)
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= 0 && p.x < self.width && p.y >= 0 && p.y < self.height
    }

    fn index(&self, p: Point) -> Option<usize> {
        self.contains(p)
            .then(|| (p.x + p.y * self.width) as usize)
    }

    // ------------------------------------------------------------------
    // Tile access
    // ------------------------------------------------------------------

    pub fn tile(&self, x: i32, y: i32) -> Option<DungeonTile> {
        self.tile_at(Point::new(x, y))
    }

    pub fn tile_at(&self, p: Point) -> Option<DungeonTile> {
        self.index(p).map(|i| self.tiles[i])
    }

    /// Every tile, row by row
    pub fn tiles(&self) -> &[DungeonTile] {
        &self.tiles
    }

    /// Writes outside the map are ignored
    pub fn set_tile(&mut self, p: Point, tile: DungeonTile) {
        if let Some(i) = self.index(p) {
            self.tiles[i] = tile;
        }
    }

    pub fn set_wall(&mut self, p: Point) {
        self.set_tile(p, DungeonTile::Wall);
    }

    pub fn set_corridor(&mut self, p: Point) {
        self.set_tile(p, DungeonTile::Corridor);
    }

    pub fn set_room(&mut self, p: Point) {
        self.set_tile(p, DungeonTile::Room);
    }

    pub fn set_door(&mut self, p: Point) {
        self.set_tile(p, DungeonTile::Door);
    }

    pub fn set_stairs_up(&mut self, p: Point) {
        self.set_tile(p, DungeonTile::StairsUp);
        self.stairs_up = Some(p);
    }

    pub fn set_stairs_down(&mut self, p: Point) {
        self.set_tile(p, DungeonTile::StairsDown);
        self.stairs_down = Some(p);
    }

    pub fn stairs_up(&self) -> Option<Point> {
        self.stairs_up
    }

    pub fn stairs_down(&self) -> Option<Point> {
        self.stairs_down
    }

    /// Inside the map and not rock
    pub fn is_walkable(&self, p: Point) -> bool {
        self.tile_at(p).is_some_and(|t| t.is_walkable())
    }

    /// Rock; false outside the map
    pub fn is_wall_at(&self, p: Point) -> bool {
        self.tile_at(p) == Some(DungeonTile::Wall)
    }

    pub fn is_door_at(&self, p: Point) -> bool {
        self.tile_at(p) == Some(DungeonTile::Door)
    }

    pub fn is_corridor(&self, p: Point) -> bool {
        self.tile_at(p) == Some(DungeonTile::Corridor)
    }

    /// Room floor or corridor
    pub fn is_empty_space(&self, p: Point) -> bool {
        self.tile_at(p).is_some_and(|t| t.is_empty_space())
    }

    pub fn cardinal_neighbours(&self, p: Point) -> Vec<Point> {
        p.neighbors_4()
            .into_iter()
            .filter(|&n| self.contains(n))
            .collect()
    }

    pub fn all_neighbours(&self, p: Point) -> Vec<Point> {
        p.neighbors_8()
            .into_iter()
            .filter(|&n| self.contains(n))
            .collect()
    }

    // ------------------------------------------------------------------
    // Rooms
    // ------------------------------------------------------------------

    /// Register a room, give it the next id and stamp its floor
    pub fn add_room_and_set_tiles(&mut self, mut room: DungeonRoom) -> RoomId {
        let id = self.rooms.len();
        room.set_id(id);
        for p in room.absolute_floor_tiles() {
            self.set_room(p);
        }
        self.rooms.push(room);
        id
    }

    pub fn all_rooms(&self) -> &[DungeonRoom] {
        &self.rooms
    }

    pub fn room(&self, id: RoomId) -> Option<&DungeonRoom> {
        self.rooms.get(id)
    }

    pub fn room_mut(&mut self, id: RoomId) -> Option<&mut DungeonRoom> {
        self.rooms.get_mut(id)
    }

    /// The room whose floor or doors cover `p`
    pub fn room_at(&self, p: Point) -> Option<RoomId> {
        self.rooms.iter().position(|room| room.contains(p))
    }

    /// Rooms owning the open tiles around `p`, without duplicates
    pub fn adjacent_rooms(&self, p: Point) -> Vec<RoomId> {
        let mut ids: Vec<RoomId> = p
            .neighbors_8()
            .into_iter()
            .filter(|&n| self.is_empty_space(n))
            .filter_map(|n| self.room_at(n))
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    pub fn random_room(&self, rng: &mut GameRng) -> Option<RoomId> {
        (!self.rooms.is_empty()).then(|| rng.index(self.rooms.len()))
    }

    pub fn set_first_and_last_rooms(&mut self, first: RoomId, last: RoomId) {
        self.first_room = Some(first);
        self.last_room = Some(last);
    }

    pub fn first_and_last_room(&self) -> Option<(&DungeonRoom, &DungeonRoom)> {
        let first = self.room(self.first_room?)?;
        let last = self.room(self.last_room?)?;
        Some((first, last))
    }

    /// Keep only the rooms accepted by `keep`. Ids are reassigned in order and
    /// connection links to dropped rooms are forgotten.
    pub fn retain_rooms(&mut self, keep: impl Fn(&DungeonRoom) -> bool) {
        let mut remap = vec![None; self.rooms.len()];
        let mut kept = Vec::new();
        for (old_id, room) in std::mem::take(&mut self.rooms).into_iter().enumerate() {
            if keep(&room) {
                remap[old_id] = Some(kept.len());
                kept.push(room);
            }
        }
        for (new_id, room) in kept.iter_mut().enumerate() {
            room.set_id(new_id);
            let links: Vec<(Point, RoomId)> = room
                .connected_rooms()
                .iter()
                .map(|(&pos, &other)| (pos, other))
                .collect();
            room.clear_connected_rooms();
            for (pos, other) in links {
                if let Some(Some(other)) = remap.get(other) {
                    room.add_connected_room(pos, *other);
                }
            }
        }
        self.rooms = kept;
        self.first_room = self.first_room.and_then(|id| remap.get(id).copied().flatten());
        self.last_room = self.last_room.and_then(|id| remap.get(id).copied().flatten());
    }

    pub fn smallest_and_biggest_room(&self) -> Option<(&DungeonRoom, &DungeonRoom)> {
        let smallest = self.rooms.iter().min_by_key(|r| r.floor_tile_count())?;
        let biggest = self.rooms.iter().max_by_key(|r| r.floor_tile_count())?;
        Some((smallest, biggest))
    }

    // ------------------------------------------------------------------
    // Placement
    // ------------------------------------------------------------------

    /// Check if `room`, at its current rotation and offset, can be stamped here
    pub fn can_place_room(&self, room: &DungeonRoom, policy: PlacementPolicy) -> bool {
        room.absolute_floor_tiles().into_iter().all(|tile| {
            if !self.is_wall_at(tile) {
                return false;
            }
            match policy {
                PlacementPolicy::Permissive => true,
                PlacementPolicy::EdgeBuffer => {
                    tile.neighbors_8().into_iter().all(|n| self.contains(n))
                }
                PlacementPolicy::Isolated => {
                    tile.neighbors_8().into_iter().all(|n| self.is_wall_at(n))
                }
            }
        })
    }

    /// Edge-buffer placement, the default for docking templates
    pub fn can_place_room_default(&self, room: &DungeonRoom) -> bool {
        self.can_place_room(room, PlacementPolicy::EdgeBuffer)
    }

    // ------------------------------------------------------------------
    // Doors
    // ------------------------------------------------------------------

    /// A rock tile with open floor on two opposite sides and rock on the
    /// other two. Returns `North` for a north/south passage, `East` for east/west.
    pub fn could_be_a_door(&self, p: Point) -> Option<CompassDirection> {
        if !self.is_wall_at(p) {
            return None;
        }
        let open = |d: CompassDirection| self.is_empty_space(p + d.to_point());
        let rock = |d: CompassDirection| self.is_wall_at(p + d.to_point());
        use CompassDirection::{East, North, South, West};
        if open(North) && open(South) && rock(East) && rock(West) {
            return Some(North);
        }
        if open(East) && open(West) && rock(North) && rock(South) {
            return Some(East);
        }
        None
    }

    /// Place a door only where [`DungeonMap::could_be_a_door`] holds
    pub fn place_door_if_valid(&mut self, p: Point) -> bool {
        if self.could_be_a_door(p).is_none() {
            return false;
        }
        self.set_door(p);
        true
    }

    /// Put a door at `p` between the two rooms on either side along `axis`
    /// and record the link on both rooms. Nothing happens unless both sides
    /// belong to a room.
    pub fn add_door_and_connect(&mut self, p: Point, axis: CompassDirection) -> bool {
        let one = self.room_at(p + axis.to_point());
        let two = self.room_at(p + axis.opposite().to_point());
        let (Some(one), Some(two)) = (one, two) else {
            return false;
        };
        if let Some(room) = self.rooms.get_mut(one) {
            let local = room.to_relative_position(p);
            room.add_connected_room(local, two);
        }
        if let Some(room) = self.rooms.get_mut(two) {
            let local = room.to_relative_position(p);
            room.add_connected_room(local, one);
        }
        self.set_door(p);
        true
    }

    /// Open extra doors through single walls between rooms, but only where
    /// walking around would take more than `min_path_distance` tiles.
    /// Candidates are visited in random order and each passes with `spawn_chance`.
    pub fn add_more_doors(
        &mut self,
        rng: &mut GameRng,
        min_path_distance: usize,
        spawn_chance: f64,
    ) -> usize {
        let mut added = 0;
        for p in self.random_order(rng) {
            let Some(axis) = self.could_be_a_door(p) else {
                continue;
            };
            if !rng.chance(spawn_chance) {
                continue;
            }
            let one = p + axis.to_point();
            let two = p + axis.opposite().to_point();
            let detour = self.jps_path(one, two);
            if (detour.is_empty() || detour.len() > min_path_distance)
                && self.add_door_and_connect(p, axis)
            {
                trace!(?p, detour = detour.len(), "extra door");
                added += 1;
            }
        }
        debug!(added, "added extra doors");
        added
    }

    /// Open every used connection point. With `place_door` the opening is a
    /// door where the wall has a door shape, otherwise a corridor tile.
    /// Returns how many tiles were opened.
    pub fn connect_rooms_on_map(&mut self, place_door: bool) -> usize {
        let openings: Vec<Point> = self
            .rooms
            .iter()
            .flat_map(|room| room.used_absolute_door_tiles())
            .collect();
        let mut opened = 0;
        for p in openings {
            if !self.is_wall_at(p) {
                continue;
            }
            if place_door && self.could_be_a_door(p).is_some() {
                self.set_door(p);
                for room in &mut self.rooms {
                    if room.has_wall_tile(p) {
                        room.set_door(p);
                    }
                }
            } else {
                if place_door {
                    debug!(?p, "connection is not door shaped, opening a corridor");
                }
                self.set_corridor(p);
            }
            opened += 1;
        }
        opened
    }

    /// Carve a corridor tile, but only into rock. Crossing the wall of one of
    /// `crossing_rooms` makes a door instead.
    pub fn set_corridor_selective(&mut self, p: Point, crossing_rooms: &[RoomId]) {
        if !self.is_wall_at(p) {
            return;
        }
        let crossed = crossing_rooms
            .iter()
            .find(|&&id| self.room(id).is_some_and(|room| room.has_wall_tile(p)))
            .copied();
        match crossed.and_then(|id| self.rooms.get_mut(id)) {
            Some(room) => {
                room.set_door(p);
                self.set_door(p);
            }
            None => self.set_corridor(p),
        }
    }

    // ------------------------------------------------------------------
    // Dead ends
    // ------------------------------------------------------------------

    /// A corridor or door tile with rock on three sides. Returns the way out.
    pub fn is_dead_end(&self, p: Point) -> Option<CompassDirection> {
        let tile = self.tile_at(p)?;
        if !matches!(tile, DungeonTile::Corridor | DungeonTile::Door) {
            return None;
        }
        let walls = CARDINALS
            .iter()
            .filter(|d| self.is_wall_at(p + d.to_point()))
            .count();
        if walls != 3 {
            return None;
        }
        CARDINALS
            .into_iter()
            .find(|d| self.is_walkable(p + d.to_point()))
    }

    /// Wall up dead ends, following each one back until it reaches a junction.
    /// Repeats until no dead end is left. Returns the number of tiles filled.
    pub fn fill_dead_ends(&mut self) -> usize {
        let mut filled = 0;
        loop {
            let dead_ends: Vec<Point> = self
                .points()
                .filter(|&p| self.is_dead_end(p).is_some())
                .collect();
            if dead_ends.is_empty() {
                break;
            }
            for start in dead_ends {
                let mut pos = start;
                while let Some(way_out) = self.is_dead_end(pos) {
                    self.set_wall(pos);
                    filled += 1;
                    pos = pos + way_out.to_point();
                }
            }
        }
        debug!(filled, "filled dead ends");
        filled
    }

    // ------------------------------------------------------------------
    // Reshaping
    // ------------------------------------------------------------------

    /// Shrink the grid to the carved area plus a one-tile rock margin.
    /// Room offsets and stairs move with the content.
    pub fn trim(&mut self) {
        let open_row = |y: i32| (0..self.width).any(|x| self.is_walkable(Point::new(x, y)));
        let open_col = |x: i32| (0..self.height).any(|y| self.is_walkable(Point::new(x, y)));

        let (Some(first_y), Some(last_y)) = (
            (0..self.height).find(|&y| open_row(y)),
            (0..self.height).rev().find(|&y| open_row(y)),
        ) else {
            return;
        };
        let (Some(first_x), Some(last_x)) = (
            (0..self.width).find(|&x| open_col(x)),
            (0..self.width).rev().find(|&x| open_col(x)),
        ) else {
            return;
        };

        let left = (first_x - 1).max(0);
        let top = (first_y - 1).max(0);
        let right = (self.width - 1 - last_x - 1).max(0);
        let bottom = (self.height - 1 - last_y - 1).max(0);
        if left == 0 && top == 0 && right == 0 && bottom == 0 {
            return;
        }

        let new_width = self.width - left - right;
        let new_height = self.height - top - bottom;
        debug!(
            from = ?self.size(),
            to = ?(new_width, new_height),
            "trimming map"
        );
        self.reframe(new_width, new_height, Point::new(-left, -top));
    }

    /// Surround the map with one extra ring of rock
    pub fn add_border(&mut self) {
        self.reframe(self.width + 2, self.height + 2, Point::new(1, 1));
    }

    /// Copy the tiles into a new grid, moving everything by `shift`
    fn reframe(&mut self, width: i32, height: i32, shift: Point) {
        let mut resized = DungeonMap::new(width, height);
        for p in self.points() {
            if let Some(tile) = self.tile_at(p) {
                resized.set_tile(p + shift, tile);
            }
        }
        self.width = resized.width;
        self.height = resized.height;
        self.tiles = resized.tiles;
        for room in &mut self.rooms {
            let offset = room.position_offset();
            room.set_position_offset(offset + shift);
        }
        self.stairs_up = self.stairs_up.map(|p| p + shift);
        self.stairs_down = self.stairs_down.map(|p| p + shift);
    }

    // ------------------------------------------------------------------
    // Traversal and search
    // ------------------------------------------------------------------

    /// Every position, row by row
    pub fn points(&self) -> impl Iterator<Item = Point> + use<> {
        let (width, height) = (self.width, self.height);
        (0..height).flat_map(move |y| (0..width).map(move |x| Point::new(x, y)))
    }

    fn random_order(&self, rng: &mut GameRng) -> Vec<Point> {
        rng.perm((self.width * self.height) as usize)
            .into_iter()
            .map(|i| Point::new(i as i32 % self.width, i as i32 / self.width))
            .collect()
    }

    /// Visit every position once, in random order
    pub fn traverse_tiles_randomly(&self, rng: &mut GameRng, mut visit: impl FnMut(Point)) {
        for p in self.random_order(rng) {
            visit(p);
        }
    }

    /// A random position accepted by `filter`
    pub fn random_filtered(
        &self,
        rng: &mut GameRng,
        filter: impl Fn(Point) -> bool,
    ) -> Option<Point> {
        self.random_order(rng).into_iter().find(|&p| filter(p))
    }

    /// Shortest walkable path, both ends included; empty if there is none
    pub fn jps_path(&self, start: Point, end: Point) -> Vec<Point> {
        jps_path(start, end, |p| self.is_walkable(p))
    }

    /// Spots suited for stairs: a floor nook or a solid wall block backing
    /// onto a floor row, in any orientation. Spots next to decorated template
    /// rooms are skipped and results keep some distance from each other.
    pub fn potential_stair_positions(&self) -> Vec<Point> {
        let rotated: Vec<Pattern> = STAIR_PATTERNS
            .iter()
            .flat_map(|&pattern| {
                let mut variants = vec![pattern];
                for _ in 0..3 {
                    let last = variants[variants.len() - 1];
                    variants.push(rotate_pattern(last));
                }
                variants
            })
            .collect();

        let mut result: Vec<Point> = Vec::new();
        for x in 0..self.width - 2 {
            for y in 0..self.height - 2 {
                if !rotated.iter().any(|pattern| self.matches_pattern(x, y, pattern)) {
                    continue;
                }
                let spot = Point::new(x + 1, y + 1);
                let decorated = self
                    .adjacent_rooms(spot)
                    .into_iter()
                    .filter_map(|id| self.room(id))
                    .any(|room| room.has_decorated_template());
                if decorated {
                    continue;
                }
                if result
                    .iter()
                    .any(|other| other.manhattan_distance(spot) < STAIR_SPACING)
                {
                    continue;
                }
                result.push(spot);
            }
        }
        result
    }

    fn matches_pattern(&self, x: i32, y: i32, pattern: &Pattern) -> bool {
        pattern.iter().enumerate().all(|(row, tiles)| {
            tiles.iter().enumerate().all(|(col, &want)| {
                self.tile(x + col as i32, y + row as i32) == Some(want)
            })
        })
    }

    // ------------------------------------------------------------------
    // Statistics
    // ------------------------------------------------------------------

    /// Room floor and corridor tiles
    pub fn walkable_tile_count(&self) -> usize {
        self.tiles.iter().filter(|t| t.is_empty_space()).count()
    }

    pub fn wall_tile_count(&self) -> usize {
        self.tiles
            .iter()
            .filter(|&&t| t == DungeonTile::Wall)
            .count()
    }

    /// Human-readable summary lines
    pub fn meta_info(&self) -> Vec<String> {
        let total = self.tiles.len();
        let walkable = self.walkable_tile_count();
        let walls = self.wall_tile_count();
        let percent = |n: usize| {
            if total == 0 {
                0.0
            } else {
                n as f64 / total as f64 * 100.0
            }
        };
        let (smallest, biggest) = self
            .smallest_and_biggest_room()
            .map_or((0, 0), |(s, b)| (s.floor_tile_count(), b.floor_tile_count()));
        vec![
            format!("Dimensions: {} x {}", self.width, self.height),
            format!("Total tiles: {total}"),
            format!("Walkable tiles: {walkable} ({:.2}%)", percent(walkable)),
            format!("Wall tiles: {walls} ({:.2}%)", percent(walls)),
            format!("Rooms: {}", self.rooms.len()),
            format!("Smallest room: {smallest} tiles"),
            format!("Biggest room: {biggest} tiles"),
        ]
    }

    /// Draw the map with a custom symbol per position
    pub fn render_with(&self, symbol: impl Fn(Point, DungeonTile) -> char) -> String {
        let mut out = String::with_capacity(((self.width + 1) * self.height) as usize);
        for y in 0..self.height {
            for x in 0..self.width {
                let p = Point::new(x, y);
                let tile = self.tile_at(p).unwrap_or_default();
                out.push(symbol(p, tile));
            }
            out.push('\n');
        }
        out
    }

    /// Draw the map with used-but-unopened connection points shown as `X`
    pub fn render_planned_doors(&self) -> String {
        let planned: Vec<Point> = self
            .rooms
            .iter()
            .flat_map(|room| room.used_absolute_door_tiles())
            .collect();
        self.render_with(|p, tile| {
            if planned.contains(&p) {
                'X'
            } else {
                tile.symbol()
            }
        })
    }
}

/// Rotate a 3x3 pattern a quarter turn clockwise
fn rotate_pattern(pattern: Pattern) -> Pattern {
    let mut out = pattern;
    for (row, tiles) in out.iter_mut().enumerate() {
        for (col, tile) in tiles.iter_mut().enumerate() {
            *tile = pattern[2 - col][row];
        }
    }
    out
}

impl fmt::Display for DungeonMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render_with(|_, tile| tile.symbol()))
    }
}
