//! Rooms and their connection points
//!
//! A room keeps its shape in local coordinates. Placing it on a map only
//! changes its rotation and offset; `to_absolute_position` maps a local point
//! to `offset + rotation * local`.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::geometry::{CompassDirection, Point, Rect, Rotation};
use crate::rng::GameRng;

/// Index of a room in its map's room list
pub type RoomId = usize;

/// A potential doorway on a room
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoomConnection {
    /// Facing before the room is rotated
    pub outward_direction: CompassDirection,
    /// Pairing group: 0 only pairs with 0, other ids only with themselves
    pub connection_id: i32,
}

impl RoomConnection {
    pub const fn new(outward_direction: CompassDirection, connection_id: i32) -> Self {
        Self {
            outward_direction,
            connection_id,
        }
    }

    /// Check if two connections may be joined by one door
    pub const fn is_compatible_with(&self, other: &RoomConnection) -> bool {
        self.connection_id == other.connection_id
    }
}

/// A room instance, either carved from a rectangle or cloned from a template
#[derive(Debug, Clone, PartialEq)]
pub struct DungeonRoom {
    id: RoomId,
    template_name: String,
    decoration_level_name: String,
    offset: Point,
    rotation: Rotation,
    floor_tiles: BTreeSet<Point>,
    wall_tiles: BTreeSet<Point>,
    doors: BTreeSet<Point>,
    available_connections: BTreeMap<Point, RoomConnection>,
    connected_rooms: BTreeMap<Point, RoomId>,
    poi_positions: Vec<Point>,
    slot_id: i32,
    plugs_into_slot_id: i32,
    lit: bool,
    /// Local bounding box of the floor
    bounds: Rect,
}

impl DungeonRoom {
    /// An empty template; fill it in with the `with_*` builders
    pub fn from_template(name: impl Into<String>) -> Self {
        Self {
            id: 0,
            template_name: name.into(),
            decoration_level_name: String::new(),
            offset: Point::ZERO,
            rotation: Rotation::R0,
            floor_tiles: BTreeSet::new(),
            wall_tiles: BTreeSet::new(),
            doors: BTreeSet::new(),
            available_connections: BTreeMap::new(),
            connected_rooms: BTreeMap::new(),
            poi_positions: Vec::new(),
            slot_id: 0,
            plugs_into_slot_id: 0,
            lit: false,
            bounds: Rect::default(),
        }
    }

    /// A rectangular room in map coordinates, ringed by walls, with one
    /// connection point on each side at a random spot just outside the floor.
    pub fn from_rect(rng: &mut GameRng, bounds: Rect) -> Self {
        let mut connections = BTreeMap::new();
        for side in [
            CompassDirection::North,
            CompassDirection::South,
            CompassDirection::East,
            CompassDirection::West,
        ] {
            let pos = bounds.random_point_on_edge(rng, side) + side.to_point();
            connections.insert(pos, RoomConnection::new(side, 0));
        }
        Self::from_template(String::new())
            .with_floor_tiles(bounds.points())
            .with_wall_tiles(wall_ring(bounds))
            .with_connections(connections)
    }

    /// A rectangular template of `width` x `height` floor tiles with id-0
    /// connections in the middle of each side
    pub fn rect_template(name: impl Into<String>, width: i32, height: i32) -> Self {
        let bounds = Rect::new(0, 0, width, height);
        let connections = [
            (Point::new(width / 2, -1), CompassDirection::North),
            (Point::new(width / 2, height), CompassDirection::South),
            (Point::new(width, height / 2), CompassDirection::East),
            (Point::new(-1, height / 2), CompassDirection::West),
        ]
        .into_iter()
        .map(|(pos, dir)| (pos, RoomConnection::new(dir, 0)));
        Self::from_template(name)
            .with_floor_tiles(bounds.points())
            .with_wall_tiles(wall_ring(bounds))
            .with_connections(connections)
    }

    pub fn with_floor_tiles(mut self, tiles: impl IntoIterator<Item = Point>) -> Self {
        self.floor_tiles = tiles.into_iter().collect();
        self.bounds = bounding_rect(self.floor_tiles.iter().copied());
        self
    }

    pub fn with_wall_tiles(mut self, tiles: impl IntoIterator<Item = Point>) -> Self {
        self.wall_tiles = tiles.into_iter().collect();
        self
    }

    pub fn with_connections(
        mut self,
        connections: impl IntoIterator<Item = (Point, RoomConnection)>,
    ) -> Self {
        self.available_connections = connections.into_iter().collect();
        self
    }

    pub fn with_poi_positions(mut self, points: impl IntoIterator<Item = Point>) -> Self {
        self.poi_positions = points.into_iter().collect();
        self
    }

    pub fn with_slot_id(mut self, slot_id: i32) -> Self {
        self.slot_id = slot_id;
        self
    }

    pub fn with_plugs_into_slot_id(mut self, slot_id: i32) -> Self {
        self.plugs_into_slot_id = slot_id;
        self
    }

    pub fn with_decoration_level_name(mut self, name: impl Into<String>) -> Self {
        self.decoration_level_name = name.into();
        self
    }

    /// A fresh copy of a template: same shape and metadata, no connections used, no doors
    pub fn instantiate(&self) -> Self {
        Self {
            connected_rooms: BTreeMap::new(),
            doors: BTreeSet::new(),
            ..self.clone()
        }
    }

    pub fn id(&self) -> RoomId {
        self.id
    }

    pub fn set_id(&mut self, id: RoomId) {
        self.id = id;
    }

    pub fn template_name(&self) -> &str {
        &self.template_name
    }

    pub fn decoration_level_name(&self) -> &str {
        &self.decoration_level_name
    }

    pub fn set_decoration_level_name(&mut self, name: impl Into<String>) {
        self.decoration_level_name = name.into();
    }

    /// Rooms from a template that has been decorated are left alone by stair placement
    pub fn has_decorated_template(&self) -> bool {
        !self.template_name.is_empty() && !self.decoration_level_name.is_empty()
    }

    pub fn slot_id(&self) -> i32 {
        self.slot_id
    }

    pub fn plugs_into_slot_id(&self) -> i32 {
        self.plugs_into_slot_id
    }

    pub fn is_lit(&self) -> bool {
        self.lit
    }

    pub fn set_lit(&mut self, lit: bool) {
        self.lit = lit;
    }

    pub fn floor_tile_count(&self) -> usize {
        self.floor_tiles.len()
    }

    // ------------------------------------------------------------------
    // Transform
    // ------------------------------------------------------------------

    /// Install one of the four quarter-turn rotations (counted clockwise)
    pub fn set_rotation_count(&mut self, count: usize) {
        self.rotation = Rotation::from_count(count);
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    pub fn set_position_offset(&mut self, offset: Point) {
        self.offset = offset;
    }

    pub fn position_offset(&self) -> Point {
        self.offset
    }

    pub fn to_absolute_position(&self, relative: Point) -> Point {
        self.offset + self.rotation.apply(relative)
    }

    pub fn to_relative_position(&self, absolute: Point) -> Point {
        self.rotation.unapply(absolute - self.offset)
    }

    /// A local point rotated but not translated
    pub fn rotated_relative_position(&self, relative: Point) -> Point {
        self.rotation.apply(relative)
    }

    // ------------------------------------------------------------------
    // Tiles
    // ------------------------------------------------------------------

    /// Floor tiles in map coordinates, in local row-major order
    pub fn absolute_floor_tiles(&self) -> Vec<Point> {
        self.floor_tiles
            .iter()
            .map(|&p| self.to_absolute_position(p))
            .collect()
    }

    /// Floor, wall and door tiles in map coordinates
    pub fn absolute_room_tiles(&self) -> Vec<Point> {
        self.floor_tiles
            .iter()
            .chain(self.wall_tiles.iter())
            .chain(self.doors.iter())
            .map(|&p| self.to_absolute_position(p))
            .collect()
    }

    pub fn absolute_poi_positions(&self) -> Vec<Point> {
        self.poi_positions
            .iter()
            .map(|&p| self.to_absolute_position(p))
            .collect()
    }

    /// Wall tiles in map coordinates
    pub fn walls(&self) -> Vec<Point> {
        self.wall_tiles
            .iter()
            .map(|&p| self.to_absolute_position(p))
            .collect()
    }

    /// Door tiles in map coordinates
    pub fn doors(&self) -> Vec<Point> {
        self.doors
            .iter()
            .map(|&p| self.to_absolute_position(p))
            .collect()
    }

    /// Floor or door
    pub fn contains(&self, absolute: Point) -> bool {
        let relative = self.to_relative_position(absolute);
        self.floor_tiles.contains(&relative) || self.doors.contains(&relative)
    }

    pub fn contains_including_walls(&self, absolute: Point) -> bool {
        self.contains(absolute) || self.has_wall_tile(absolute)
    }

    pub fn floor_contains(&self, absolute: Point) -> bool {
        self.floor_tiles
            .contains(&self.to_relative_position(absolute))
    }

    pub fn has_wall_tile(&self, absolute: Point) -> bool {
        self.wall_tiles
            .contains(&self.to_relative_position(absolute))
    }

    /// Turn one of this room's wall tiles into a door
    pub fn set_door(&mut self, absolute: Point) {
        let relative = self.to_relative_position(absolute);
        self.wall_tiles.remove(&relative);
        self.doors.insert(relative);
    }

    // ------------------------------------------------------------------
    // Connections
    // ------------------------------------------------------------------

    pub fn available_connections(&self) -> &BTreeMap<Point, RoomConnection> {
        &self.available_connections
    }

    /// Used connection points (local) and the room on the other side
    pub fn connected_rooms(&self) -> &BTreeMap<Point, RoomId> {
        &self.connected_rooms
    }

    pub fn is_connection_free(&self, relative: Point) -> bool {
        self.available_connections.contains_key(&relative)
            && !self.connected_rooms.contains_key(&relative)
    }

    /// Every unused connection, keyed by local position, with its direction
    /// as it faces after the current rotation
    pub fn free_connections_with_rotated_direction(&self) -> BTreeMap<Point, RoomConnection> {
        self.available_connections
            .iter()
            .filter(|(pos, _)| !self.connected_rooms.contains_key(pos))
            .map(|(&pos, conn)| {
                let rotated = RoomConnection::new(
                    self.rotation.rotate_direction(conn.outward_direction),
                    conn.connection_id,
                );
                (pos, rotated)
            })
            .collect()
    }

    /// First free connection (row-major) that faces the opposite way of `other`
    /// under the current rotation and shares its id
    pub fn has_matching_connection(&self, other: &RoomConnection) -> Option<Point> {
        let needed = other.outward_direction.opposite();
        self.available_connections
            .iter()
            .filter(|(pos, _)| !self.connected_rooms.contains_key(pos))
            .find(|(_, conn)| {
                self.rotation.rotate_direction(conn.outward_direction) == needed
                    && conn.is_compatible_with(other)
            })
            .map(|(&pos, _)| pos)
    }

    pub fn add_connected_room(&mut self, relative: Point, room: RoomId) {
        self.connected_rooms.insert(relative, room);
    }

    pub fn clear_connected_rooms(&mut self) {
        self.connected_rooms.clear();
    }

    /// Used connection points in map coordinates
    pub fn used_absolute_door_tiles(&self) -> Vec<Point> {
        self.available_connections
            .keys()
            .filter(|pos| self.connected_rooms.contains_key(pos))
            .map(|&pos| self.to_absolute_position(pos))
            .collect()
    }

    /// Rooms made only of id-0 connections can be placed without a partner
    pub fn has_only_zero_id_connections(&self) -> bool {
        self.available_connections
            .values()
            .all(|conn| conn.connection_id == 0)
    }

    pub fn is_connector_position(&self, absolute: Point) -> bool {
        self.available_connections
            .contains_key(&self.to_relative_position(absolute))
    }

    // ------------------------------------------------------------------
    // Bounds
    // ------------------------------------------------------------------

    /// Local bounding box of the floor
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Local bounding box of floor and connection points
    pub fn relative_bounding_rect_including_connectors(&self) -> Rect {
        bounding_rect(
            self.floor_tiles
                .iter()
                .chain(self.available_connections.keys())
                .copied(),
        )
    }

    /// Check if `absolute` is a corner cell of the floor's bounding box
    pub fn is_corner_position(&self, absolute: Point) -> bool {
        self.bounds.is_on_corner(self.to_relative_position(absolute))
    }

    /// Which outer wall corner (diagonal direction) `absolute` sits on, if any
    pub fn wall_corner_at(&self, absolute: Point) -> Option<CompassDirection> {
        let p = self.to_relative_position(absolute);
        let b = self.bounds;
        let left = p.x == b.min.x - 1;
        let right = p.x == b.max.x;
        let top = p.y == b.min.y - 1;
        let bottom = p.y == b.max.y;
        match (left, right, top, bottom) {
            (true, _, true, _) => Some(CompassDirection::NorthWest),
            (_, true, true, _) => Some(CompassDirection::NorthEast),
            (true, _, _, true) => Some(CompassDirection::SouthWest),
            (_, true, _, true) => Some(CompassDirection::SouthEast),
            _ => None,
        }
    }

    /// Center of the floor's bounding box in map coordinates
    pub fn center(&self) -> Point {
        self.to_absolute_position(self.bounds.center())
    }

    /// A random spot on the wall ring, off the corners, on the given side
    pub fn random_connector_position(&self, rng: &mut GameRng, side: CompassDirection) -> Point {
        let local = self.bounds.random_point_on_edge(rng, side) + side.to_point();
        self.to_absolute_position(local)
    }

    pub fn random_absolute_floor_position(&self, rng: &mut GameRng) -> Option<Point> {
        let tiles = self.absolute_floor_tiles();
        rng.choose(&tiles).copied()
    }

    /// Random floor tile accepted by `is_free`, trying tiles in random order
    pub fn random_absolute_floor_position_with_filter(
        &self,
        rng: &mut GameRng,
        is_free: impl Fn(Point) -> bool,
    ) -> Option<Point> {
        let tiles = self.absolute_floor_tiles();
        rng.perm(tiles.len())
            .into_iter()
            .map(|i| tiles[i])
            .find(|&p| is_free(p))
    }

    /// Local shape drawn as text: `.` floor, `+` free connection, `=` used connection
    pub fn local_preview(&self) -> String {
        let bounds = self.relative_bounding_rect_including_connectors();
        let mut out = String::new();
        for y in bounds.min.y..bounds.max.y {
            for x in bounds.min.x..bounds.max.x {
                let p = Point::new(x, y);
                let c = if self.floor_tiles.contains(&p) {
                    '.'
                } else if self.connected_rooms.contains_key(&p) {
                    '='
                } else if self.available_connections.contains_key(&p) {
                    '+'
                } else {
                    ' '
                };
                out.push(c);
            }
            out.push('\n');
        }
        out
    }
}

/// Cells directly around `bounds`, corners included
fn wall_ring(bounds: Rect) -> Vec<Point> {
    bounds
        .shift(1, 1, 1, 1)
        .points()
        .filter(|&p| !bounds.contains(p))
        .collect()
}

fn bounding_rect(points: impl Iterator<Item = Point>) -> Rect {
    let mut acc: Option<(Point, Point)> = None;
    for p in points {
        acc = Some(match acc {
            None => (p, p),
            Some((lo, hi)) => (
                Point::new(lo.x.min(p.x), lo.y.min(p.y)),
                Point::new(hi.x.max(p.x), hi.y.max(p.y)),
            ),
        });
    }
    match acc {
        Some((lo, hi)) => Rect::new(lo.x, lo.y, hi.x + 1, hi.y + 1),
        None => Rect::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corridor_piece() -> DungeonRoom {
        // 3x1 floor, open to the east and west
        DungeonRoom::from_template("hall")
            .with_floor_tiles([Point::new(0, 0), Point::new(1, 0), Point::new(2, 0)])
            .with_connections([
                (
                    Point::new(3, 0),
                    RoomConnection::new(CompassDirection::East, 0),
                ),
                (
                    Point::new(-1, 0),
                    RoomConnection::new(CompassDirection::West, 2),
                ),
            ])
    }

    #[test]
    fn test_compatibility_rules() {
        let zero = RoomConnection::new(CompassDirection::North, 0);
        let key = RoomConnection::new(CompassDirection::South, 4);
        assert!(zero.is_compatible_with(&RoomConnection::new(CompassDirection::East, 0)));
        assert!(!zero.is_compatible_with(&key));
        assert!(key.is_compatible_with(&RoomConnection::new(CompassDirection::West, 4)));
        assert!(!key.is_compatible_with(&RoomConnection::new(CompassDirection::West, 5)));
    }

    #[test]
    fn test_rect_room_shape() {
        let mut rng = GameRng::new(42);
        let room = DungeonRoom::from_rect(&mut rng, Rect::new(2, 2, 6, 5));
        assert_eq!(room.floor_tile_count(), 12);
        // 6x5 ring minus the 4x3 floor
        assert_eq!(room.walls().len(), 30 - 12);
        assert_eq!(room.available_connections().len(), 4);
        for (pos, conn) in room.available_connections() {
            assert!(room.has_wall_tile(*pos));
            assert!(room.wall_corner_at(*pos).is_none());
            let inside = *pos + conn.outward_direction.opposite().to_point();
            assert!(room.floor_contains(inside));
        }
    }

    #[test]
    fn test_rotation_changes_absolute_tiles() {
        let mut room = corridor_piece();
        room.set_position_offset(Point::new(10, 10));
        assert_eq!(room.to_absolute_position(Point::new(2, 0)), Point::new(12, 10));
        room.set_rotation_count(1);
        assert_eq!(room.to_absolute_position(Point::new(2, 0)), Point::new(10, 12));
        assert_eq!(room.to_relative_position(Point::new(10, 12)), Point::new(2, 0));
    }

    #[test]
    fn test_free_connections_are_rotated() {
        let mut room = corridor_piece();
        room.set_rotation_count(1);
        let free = room.free_connections_with_rotated_direction();
        assert_eq!(
            free[&Point::new(3, 0)].outward_direction,
            CompassDirection::South
        );
        assert_eq!(
            free[&Point::new(-1, 0)].outward_direction,
            CompassDirection::North
        );

        room.add_connected_room(Point::new(3, 0), 7);
        let free = room.free_connections_with_rotated_direction();
        assert_eq!(free.len(), 1);
        assert!(!room.is_connection_free(Point::new(3, 0)));
    }

    #[test]
    fn test_matching_connection() {
        let mut room = corridor_piece();
        let facing_east = RoomConnection::new(CompassDirection::East, 0);
        // our west connection has id 2, so only the east one could match, and it faces the wrong way
        assert_eq!(room.has_matching_connection(&facing_east), None);

        room.set_rotation_count(2);
        // rotated 180: the id-0 connection at (3,0) now faces west
        assert_eq!(
            room.has_matching_connection(&facing_east),
            Some(Point::new(3, 0))
        );

        let keyed = RoomConnection::new(CompassDirection::West, 2);
        room.set_rotation_count(0);
        assert_eq!(room.has_matching_connection(&keyed), None);
        room.set_rotation_count(2);
        assert_eq!(room.has_matching_connection(&keyed), Some(Point::new(-1, 0)));
    }

    #[test]
    fn test_instantiate_resets_usage() {
        let mut room = DungeonRoom::rect_template("box", 5, 5).with_slot_id(3);
        room.add_connected_room(Point::new(2, -1), 1);
        room.set_door(Point::new(2, -1));
        let copy = room.instantiate();
        assert!(copy.connected_rooms().is_empty());
        assert!(copy.doors().is_empty());
        assert_eq!(copy.slot_id(), 3);
        assert_eq!(copy.template_name(), "box");
        assert_eq!(copy.floor_tile_count(), 25);
    }

    #[test]
    fn test_bounding_rect_including_connectors() {
        let room = DungeonRoom::rect_template("box", 5, 5);
        assert_eq!(
            room.relative_bounding_rect_including_connectors(),
            Rect::new(-1, -1, 6, 6)
        );
        assert_eq!(room.bounds(), Rect::new(0, 0, 5, 5));
        assert!(room.has_only_zero_id_connections());
        assert!(!corridor_piece().has_only_zero_id_connections());
    }

    #[test]
    fn test_set_door_moves_wall() {
        let mut room = DungeonRoom::rect_template("box", 3, 3);
        let door = Point::new(1, -1);
        assert!(room.has_wall_tile(door));
        room.set_door(door);
        assert!(!room.has_wall_tile(door));
        assert!(room.contains(door));
        assert!(room.contains_including_walls(Point::new(-1, -1)));
    }

    #[test]
    fn test_corners() {
        let mut room = DungeonRoom::rect_template("box", 4, 3);
        room.set_position_offset(Point::new(5, 5));
        assert!(room.is_corner_position(Point::new(5, 5)));
        assert!(room.is_corner_position(Point::new(8, 7)));
        assert!(!room.is_corner_position(Point::new(6, 5)));
        assert_eq!(
            room.wall_corner_at(Point::new(4, 4)),
            Some(CompassDirection::NorthWest)
        );
        assert_eq!(
            room.wall_corner_at(Point::new(9, 8)),
            Some(CompassDirection::SouthEast)
        );
    }

    #[test]
    fn test_random_floor_with_filter() {
        let mut rng = GameRng::new(42);
        let room = DungeonRoom::rect_template("box", 3, 3);
        let pick = room.random_absolute_floor_position_with_filter(&mut rng, |p| p.x == 2);
        assert_eq!(pick.map(|p| p.x), Some(2));
        assert!(
            room.random_absolute_floor_position_with_filter(&mut rng, |_| false)
                .is_none()
        );
    }

    #[test]
    fn test_local_preview() {
        let room = DungeonRoom::rect_template("box", 3, 1);
        assert_eq!(room.local_preview(), "  +  \n+...+\n  +  \n");
    }
}
