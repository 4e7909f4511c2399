//! Classic Rogue layout
//!
//! One room per grid cell. Rooms are joined only to their grid neighbours:
//! first along a random spanning tree, then along optional extra edges.

use std::collections::BTreeSet;

use tracing::{debug, trace, warn};

use super::{DungeonGenerator, GeneratedDungeon, GenerationReport, GeneratorKind};
use crate::config::RogueConfig;
use crate::dungeon::{DungeonMap, DungeonRoom, DungeonTile, PlacementPolicy, RoomId};
use crate::error::GenerationError;
use crate::geometry::{CompassDirection, Point, Rect};
use crate::rng::GameRng;

const MIN_ROOM_SIZE: i32 = 3;
/// Rock between two neighbouring cells
const CELL_GAP: i32 = 3;

/// Cell sizes for a map split into `divisions`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct GridLayout {
    divisions: Point,
    min_room: Point,
    max_room: Point,
}

impl GridLayout {
    fn new(width: i32, height: i32, divisions: Point) -> Self {
        let divisions = Point::new(divisions.x.max(1), divisions.y.max(1));
        let fit = |size: i32, div: i32| ((size - 2 - (div - 1) * CELL_GAP) / div).max(4);
        Self {
            divisions,
            min_room: Point::new(MIN_ROOM_SIZE, MIN_ROOM_SIZE),
            max_room: Point::new(fit(width, divisions.x), fit(height, divisions.y)),
        }
    }

    fn room_count(&self) -> usize {
        (self.divisions.x * self.divisions.y) as usize
    }

    fn cell(&self, index: usize) -> Point {
        let index = index as i32;
        Point::new(index % self.divisions.x, index / self.divisions.x)
    }

    /// Top-left corner of a cell's area
    fn cell_origin(&self, index: usize) -> Point {
        let cell = self.cell(index);
        Point::new(
            cell.x * (self.max_room.x + CELL_GAP) + 1,
            cell.y * (self.max_room.y + CELL_GAP) + 1,
        )
    }

    /// Smallest map that holds every cell plus a rock border
    fn footprint(&self) -> Point {
        Point::new(
            self.divisions.x * (self.max_room.x + CELL_GAP) - 1,
            self.divisions.y * (self.max_room.y + CELL_GAP) - 1,
        )
    }

    /// Grid neighbours: left, right, up, down
    fn adjacent(&self, index: usize) -> Vec<usize> {
        let cell = self.cell(index);
        let across = self.divisions.x as usize;
        let mut out = Vec::with_capacity(4);
        if cell.x > 0 {
            out.push(index - 1);
        }
        if cell.x < self.divisions.x - 1 {
            out.push(index + 1);
        }
        if cell.y > 0 {
            out.push(index - across);
        }
        if cell.y < self.divisions.y - 1 {
            out.push(index + across);
        }
        out
    }
}

/// Room graph over the grid
#[derive(Debug, Clone, PartialEq, Eq)]
struct ConnectionPlan {
    edges: Vec<(RoomId, RoomId)>,
    /// Edges beyond the spanning tree start here
    extra_from: usize,
    first_room: RoomId,
    last_room: RoomId,
}

#[derive(Debug, Clone)]
pub struct RogueGenerator {
    config: RogueConfig,
}

impl RogueGenerator {
    pub fn new(config: RogueConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RogueConfig {
        &self.config
    }

    fn place_rooms(&self, map: &mut DungeonMap, layout: &GridLayout, rng: &mut GameRng) {
        let (min, max) = (layout.min_room, layout.max_room);
        for index in 0..layout.room_count() {
            let size = Point::new(
                rng.rn2(max.x - min.x) + 1 + min.x,
                rng.rn2(max.y - min.y) + 1 + min.y,
            );
            let space_left = max - size;
            let mut top_left = Point::ZERO;
            if space_left.x > 0 {
                top_left.x = rng.rn2(space_left.x);
            }
            if space_left.y > 0 {
                top_left.y = rng.rn2(space_left.y);
            }
            let origin = layout.cell_origin(index) + top_left;
            let bounds = Rect::new(origin.x, origin.y, origin.x + size.x, origin.y + size.y);

            let room = DungeonRoom::from_rect(rng, bounds);
            if !map.can_place_room(&room, PlacementPolicy::Permissive) {
                warn!(index, ?bounds, "grid room overlaps or leaves the map");
            }
            let id = map.add_room_and_set_tiles(room);
            if rng.chance(self.config.room_lit_chance) {
                if let Some(room) = map.room_mut(id) {
                    room.set_lit(true);
                }
            }
            trace!(index, ?bounds, "placed grid room");
        }
    }

    fn connect_rooms(&self, layout: &GridLayout, rng: &mut GameRng) -> ConnectionPlan {
        let count = layout.room_count();
        let first_room = rng.index(count);
        let mut connected = BTreeSet::from([first_room]);
        let mut edges = Vec::new();
        let mut last_room = first_room;

        while connected.len() < count {
            let pick = rng.index(connected.len());
            let Some(&from) = connected.iter().nth(pick) else {
                break;
            };
            for to in layout.adjacent(from) {
                if connected.insert(to) {
                    edges.push((from, to));
                    last_room = to;
                }
            }
        }

        let extra_from = edges.len();
        for _ in 0..self.config.additional_room_connections {
            let from = rng.index(count);
            let neighbours = layout.adjacent(from);
            for i in rng.perm(neighbours.len()) {
                let to = neighbours[i];
                let known = edges
                    .iter()
                    .any(|&(a, b)| (a, b) == (from, to) || (a, b) == (to, from));
                if !known {
                    edges.push((from, to));
                }
            }
        }

        ConnectionPlan {
            edges,
            extra_from,
            first_room,
            last_room,
        }
    }

    fn create_corridor(
        &self,
        map: &mut DungeonMap,
        layout: &GridLayout,
        (a, b): (RoomId, RoomId),
        rng: &mut GameRng,
    ) {
        let (near, far) = (a.min(b), a.max(b));
        let same_row = layout.cell(near).y == layout.cell(far).y;
        let (exit, entry) = if same_row {
            (CompassDirection::East, CompassDirection::West)
        } else {
            (CompassDirection::South, CompassDirection::North)
        };
        let (Some(start), Some(end)) = (
            map.room(near).map(|r| r.random_connector_position(rng, exit)),
            map.room(far).map(|r| r.random_connector_position(rng, entry)),
        ) else {
            return;
        };
        let rooms = [near, far];

        // run along the main axis, switching lanes at `meet`
        let along = |p: Point| if same_row { p.x } else { p.y };
        let across = |p: Point| if same_row { p.y } else { p.x };
        let at = |main: i32, cross: i32| {
            if same_row {
                Point::new(main, cross)
            } else {
                Point::new(cross, main)
            }
        };

        let (low, high) = (along(start).min(along(end)), along(start).max(along(end)));
        let meet = if high - low > 3 {
            rng.rn2(high - low - 2) + low + 1
        } else {
            (low + high) / 2
        };
        for main in low..=high {
            let lane = if main <= meet { across(start) } else { across(end) };
            map.set_corridor_selective(at(main, lane), &rooms);
        }
        let (lane_low, lane_high) = (
            across(start).min(across(end)),
            across(start).max(across(end)),
        );
        for cross in lane_low..=lane_high {
            map.set_corridor_selective(at(meet, cross), &rooms);
        }
    }

    fn place_stairs(&self, map: &mut DungeonMap, rng: &mut GameRng) {
        let Some((first, last)) = map.first_and_last_room() else {
            return;
        };
        let up = first.random_absolute_floor_position(rng);
        let down = last.random_absolute_floor_position_with_filter(rng, |p| Some(p) != up);
        if let Some(up) = up {
            map.set_stairs_up(up);
        }
        if let Some(down) = down {
            map.set_stairs_down(down);
        }
    }

    fn door_count(map: &DungeonMap) -> usize {
        map.tiles()
            .iter()
            .filter(|&&t| t == DungeonTile::Door)
            .count()
    }
}

impl DungeonGenerator for RogueGenerator {
    fn kind(&self) -> GeneratorKind {
        GeneratorKind::Rogue
    }

    fn generate(
        &mut self,
        width: i32,
        height: i32,
        rng: &mut GameRng,
    ) -> Result<GeneratedDungeon, GenerationError> {
        let layout = GridLayout::new(width, height, self.config.grid_divisions);
        let needed = layout.footprint();
        if width < needed.x || height < needed.y {
            return Err(GenerationError::MapTooSmall {
                width,
                height,
                min_width: needed.x,
                min_height: needed.y,
            });
        }

        let mut map = DungeonMap::new(width, height);
        self.place_rooms(&mut map, &layout, rng);
        let plan = self.connect_rooms(&layout, rng);
        debug!(
            edges = plan.edges.len(),
            first = plan.first_room,
            last = plan.last_room,
            "planned grid connections"
        );
        map.set_first_and_last_rooms(plan.first_room, plan.last_room);

        for &edge in &plan.edges[..plan.extra_from] {
            self.create_corridor(&mut map, &layout, edge, rng);
        }
        let tree_doors = Self::door_count(&map);
        for &edge in &plan.edges[plan.extra_from..] {
            self.create_corridor(&mut map, &layout, edge, rng);
        }
        let extra_doors = Self::door_count(&map) - tree_doors;
        self.place_stairs(&mut map, rng);

        let mut report = GenerationReport::new(GeneratorKind::Rogue);
        report.requested_rooms = layout.room_count();
        report.placed_rooms = map.all_rooms().len();
        report.required_doors = tree_doors;
        report.optional_doors = extra_doors;
        Ok(GeneratedDungeon { map, report })
    }
}
