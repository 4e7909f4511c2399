//! Rooms and mazes
//!
//! Scatter isolated odd-sized rooms, fill the remaining rock with winding
//! maze corridors, then join every room and maze through single-tile
//! connectors until one region is left.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, trace, warn};

use super::{DungeonGenerator, GeneratedDungeon, GenerationReport, GeneratorKind};
use crate::config::MegaDungeonConfig;
use crate::dungeon::{DungeonMap, DungeonRoom, PlacementPolicy, Region, RegionId, RegionSet};
use crate::error::GenerationError;
use crate::geometry::{CompassDirection, Point, Rect};
use crate::rng::GameRng;

/// Connector tiles between pairs of regions, in both directions
type ConnectorTable = BTreeMap<RegionId, BTreeMap<RegionId, Vec<Point>>>;

#[derive(Debug, Clone)]
pub struct MegaDungeonGenerator {
    config: MegaDungeonConfig,
}

impl MegaDungeonGenerator {
    pub fn new(config: MegaDungeonConfig) -> Self {
        Self { config }
    }

    /// A generator with every setting drawn from `rng`
    pub fn randomized(rng: &mut GameRng) -> Self {
        Self::new(MegaDungeonConfig::randomized(rng))
    }

    pub fn config(&self) -> &MegaDungeonConfig {
        &self.config
    }
}

impl DungeonGenerator for MegaDungeonGenerator {
    fn kind(&self) -> GeneratorKind {
        GeneratorKind::Mega
    }

    fn generate(
        &mut self,
        width: i32,
        height: i32,
        rng: &mut GameRng,
    ) -> Result<GeneratedDungeon, GenerationError> {
        let width = if width % 2 == 0 { width - 1 } else { width };
        let height = if height % 2 == 0 { height - 1 } else { height };

        let mut carver = Carver::new(DungeonMap::new(width, height), &self.config);
        carver.add_rooms(rng);
        carver.add_corridors(rng);
        carver.connect_regions(rng);
        let (required_doors, optional_doors) = carver.place_doors();
        let discarded_regions = carver.discard_unreachable();

        let mut map = carver.map;
        if self.config.remove_dead_ends {
            map.fill_dead_ends();
        }

        let mut report = GenerationReport::new(GeneratorKind::Mega);
        report.placed_rooms = map.all_rooms().len();
        report.requested_rooms = report.placed_rooms;
        report.required_doors = required_doors;
        report.optional_doors = optional_doors;
        report.discarded_regions = discarded_regions;
        Ok(GeneratedDungeon { map, report })
    }
}

/// Working state of one generation run
struct Carver<'a> {
    map: DungeonMap,
    config: &'a MegaDungeonConfig,
    regions: RegionSet,
    /// Region of each room, indexed by room id
    room_regions: Vec<RegionId>,
    main_region: Option<RegionId>,
    required: Vec<Point>,
    optional: Vec<Point>,
}

impl<'a> Carver<'a> {
    fn new(map: DungeonMap, config: &'a MegaDungeonConfig) -> Self {
        Self {
            map,
            config,
            regions: RegionSet::new(),
            room_regions: Vec::new(),
            main_region: None,
            required: Vec::new(),
            optional: Vec::new(),
        }
    }

    fn add_room(&mut self, room: DungeonRoom) {
        let id = self.map.add_room_and_set_tiles(room);
        let region = self.regions.add(Region::Room(id), &self.map);
        self.room_regions.push(region);
    }

    fn add_rooms(&mut self, rng: &mut GameRng) {
        let min = self.config.min_room_size;
        for _ in 0..self.config.room_tries {
            let base = rng.rn2(5) + min;
            let size = make_odd_for_size(rng, min, base);
            let aspect = rng.random_float() * self.config.room_ratio_interval + 1.0;
            let (mut room_width, mut room_height) = (size, size);
            let stretched = make_odd_for_size(rng, min, (size as f64 * aspect) as i32);
            if rng.coin() {
                room_width = stretched;
            } else {
                room_height = stretched;
            }

            let x = rng.rn2((self.map.width() - room_width - 1).max(2)) + 1;
            let y = rng.rn2((self.map.height() - room_height - 1).max(2)) + 1;
            let x = make_odd(rng, x);
            let y = make_odd(rng, y);

            let room = DungeonRoom::from_rect(rng, Rect::new(x, y, x + room_width, y + room_height));
            if !self.map.can_place_room(&room, PlacementPolicy::Isolated) {
                continue;
            }
            trace!(x, y, room_width, room_height, "placed room");
            self.add_room(room);
        }
        debug!(rooms = self.map.all_rooms().len(), "scattered rooms");
    }

    fn add_corridors(&mut self, rng: &mut GameRng) {
        let mut mazes = 0;
        while let Some(start) = find_empty_spot(&self.map, rng) {
            let tiles = fill_maze(&mut self.map, start, self.config.straight_passage_chance, rng);
            self.regions.add(Region::Corridor(tiles), &self.map);
            mazes += 1;
        }
        debug!(mazes, "carved mazes");
    }

    /// Both regions on either side of `a`/`b`, if they differ. A room's
    /// corner tile never counts, a door there would sit at a diagonal.
    fn different_regions(&self, a: Point, b: Point) -> Option<(RegionId, RegionId)> {
        if !self.map.contains(a) || !self.map.contains(b) {
            return None;
        }
        if self.map.is_wall_at(a) || self.map.is_wall_at(b) {
            return None;
        }
        let first = self.regions.region_at(a)?;
        let second = self.regions.region_at(b)?;
        if first == second {
            return None;
        }
        for (region, p) in [(first, a), (second, b)] {
            let corner = self
                .regions
                .get(region)
                .and_then(Region::as_room)
                .and_then(|id| self.map.room(id))
                .is_some_and(|room| room.is_corner_position(p));
            if corner {
                return None;
            }
        }
        Some((first, second))
    }

    /// A rock tile separating two different regions along one axis while
    /// the other axis stays rock
    fn connecting_regions(&self, p: Point) -> Option<(RegionId, RegionId)> {
        if !self.map.is_wall_at(p) {
            return None;
        }
        let at = |d: CompassDirection| p + d.to_point();
        use CompassDirection::{East, North, South, West};
        if self.map.is_wall_at(at(East)) && self.map.is_wall_at(at(West)) {
            if let Some(pair) = self.different_regions(at(North), at(South)) {
                return Some(pair);
            }
        }
        if self.map.is_wall_at(at(North)) && self.map.is_wall_at(at(South)) {
            return self.different_regions(at(East), at(West));
        }
        None
    }

    fn connectors(&self) -> ConnectorTable {
        let mut table = ConnectorTable::new();
        for p in self.map.points() {
            if let Some((a, b)) = self.connecting_regions(p) {
                table.entry(a).or_default().entry(b).or_default().push(p);
                table.entry(b).or_default().entry(a).or_default().push(p);
            }
        }
        table
    }

    fn pick_main_region(&self, rng: &mut GameRng) -> Option<RegionId> {
        match self.map.random_room(rng) {
            Some(room) => self.room_regions.get(room).copied(),
            None => {
                let ids = self.regions.ids();
                rng.choose(&ids).copied()
            }
        }
    }

    /// Merge regions into the main one, one random connector at a time,
    /// sometimes opening an extra connector for a loop
    fn connect_regions(&mut self, rng: &mut GameRng) {
        let Some(mut main) = self.pick_main_region(rng) else {
            return;
        };
        let mut all_connections: Vec<Point> = Vec::new();

        while self.regions.len() > 1 {
            let table = self.connectors();
            let Some(neighbours) = table.get(&main) else {
                break;
            };
            let candidates: Vec<(RegionId, Point)> = neighbours
                .iter()
                .flat_map(|(&other, tiles)| tiles.iter().map(move |&p| (other, p)))
                .collect();
            let Some(&(other, connector)) = rng.choose(&candidates) else {
                break;
            };
            self.required.push(connector);
            all_connections.push(connector);

            if rng.chance(self.config.imperfect_connect_chance) && self.regions.len() > 2 {
                let mut extra = self.spaced_connector(neighbours, &all_connections, rng);
                let mut tries = 5;
                while let Some(pos) = extra {
                    if pos.manhattan_distance(connector) >= self.config.door_distance || tries == 0 {
                        break;
                    }
                    extra = self.spaced_connector(neighbours, &all_connections, rng);
                    tries -= 1;
                }
                if let Some(pos) = extra {
                    if keeps_distance(&all_connections, pos, self.config.door_distance) {
                        trace!(?pos, "optional connector");
                        all_connections.push(pos);
                        self.optional.push(pos);
                    }
                }
            }

            trace!(main, other, ?connector, "merging regions");
            match self.regions.merge(main, other, connector) {
                Some(merged) => main = merged,
                None => break,
            }
        }
        self.main_region = Some(main);
        debug!(
            required = self.required.len(),
            optional = self.optional.len(),
            remaining = self.regions.len(),
            "connected regions"
        );
    }

    /// A random connector of the main region that keeps the door distance
    /// from every connection chosen so far
    fn spaced_connector(
        &self,
        neighbours: &BTreeMap<RegionId, Vec<Point>>,
        chosen: &[Point],
        rng: &mut GameRng,
    ) -> Option<Point> {
        let spaced: Vec<Point> = neighbours
            .values()
            .flatten()
            .copied()
            .filter(|&p| keeps_distance(chosen, p, self.config.door_distance))
            .collect();
        rng.choose(&spaced).copied()
    }

    /// Doors at every required connector, then at optional ones that keep
    /// their distance from doors already placed
    fn place_doors(&mut self) -> (usize, usize) {
        let mut placed: Vec<Point> = Vec::new();
        let mut required_doors = 0;
        for &connector in &self.required {
            if self.map.place_door_if_valid(connector) {
                required_doors += 1;
            } else {
                warn!(?connector, "connector is not door shaped, opening a corridor");
                self.map.set_corridor(connector);
            }
            placed.push(connector);
        }
        let mut optional_doors = 0;
        for &connector in &self.optional {
            if keeps_distance(&placed, connector, self.config.door_distance)
                && self.map.place_door_if_valid(connector)
            {
                placed.push(connector);
                optional_doors += 1;
            }
        }
        (required_doors, optional_doors)
    }

    /// Wall in every region the main region never reached. Returns how many
    /// regions were removed.
    fn discard_unreachable(&mut self) -> usize {
        let orphans: Vec<RegionId> = self
            .regions
            .ids()
            .into_iter()
            .filter(|&id| Some(id) != self.main_region)
            .collect();
        if orphans.is_empty() {
            return 0;
        }
        let mut dropped_rooms = BTreeSet::new();
        for &id in &orphans {
            for &p in self.regions.tiles(id) {
                self.map.set_wall(p);
            }
            if let Some(region) = self.regions.remove(id) {
                dropped_rooms.extend(region.room_ids());
            }
        }
        self.map.retain_rooms(|room| !dropped_rooms.contains(&room.id()));
        warn!(
            regions = orphans.len(),
            rooms = dropped_rooms.len(),
            "walled in unreachable regions"
        );
        orphans.len()
    }
}

fn keeps_distance(others: &[Point], p: Point, min_distance: i32) -> bool {
    others
        .iter()
        .all(|other| other.manhattan_distance(p) >= min_distance)
}

/// Make `value` odd, rounding up when rounding down would drop below `min`
fn make_odd_for_size(rng: &mut GameRng, min: i32, value: i32) -> i32 {
    if value % 2 != 0 {
        return value;
    }
    if value - 1 < min || rng.coin() {
        value + 1
    } else {
        value - 1
    }
}

fn make_odd(rng: &mut GameRng, value: i32) -> i32 {
    if value % 2 != 0 {
        return value;
    }
    if rng.coin() { value + 1 } else { value - 1 }
}

/// A random interior rock tile surrounded by rock on all eight sides
fn find_empty_spot(map: &DungeonMap, rng: &mut GameRng) -> Option<Point> {
    map.random_filtered(rng, |p| {
        p.x >= 1
            && p.y >= 1
            && p.x < map.width() - 1
            && p.y < map.height() - 1
            && map.is_wall_at(p)
            && p.neighbors_8().into_iter().all(|n| map.is_wall_at(n))
    })
}

/// Check if carving from `from` into `to` keeps the new tile apart from
/// every other open tile: `to`, the tile beyond it and the tiles flanking
/// both must all be rock
fn is_free_for_carving(map: &DungeonMap, from: Point, to: Point) -> bool {
    let dir = to - from;
    let behind = to + dir;
    let left = dir.rotate_left();
    let right = dir.rotate_right();
    [
        to,
        behind,
        to + left,
        to + right,
        behind + left,
        behind + right,
    ]
    .into_iter()
    .all(|p| map.is_wall_at(p))
}

/// Depth-first maze walk from `start`, preferring to keep going straight
/// with `straight_chance`. Returns the carved tiles.
fn fill_maze(
    map: &mut DungeonMap,
    start: Point,
    straight_chance: f64,
    rng: &mut GameRng,
) -> BTreeSet<Point> {
    let mut carved = BTreeSet::new();
    let mut open = vec![start];
    map.set_corridor(start);
    carved.insert(start);
    let mut prev_dir = CompassDirection::East.to_point();

    let (width, height) = map.size();
    let interior = |p: &Point| p.x > 0 && p.y > 0 && p.x < width - 1 && p.y < height - 1;

    while let Some(pos) = open.pop() {
        let neighbours: Vec<Point> = pos.neighbors_4().into_iter().filter(interior).collect();
        let order = rng.perm(neighbours.len());

        let mut next = None;
        if rng.chance(straight_chance) {
            let ahead = pos + prev_dir;
            if is_free_for_carving(map, pos, ahead) {
                next = Some(ahead);
            }
        }
        if next.is_none() {
            next = order
                .into_iter()
                .map(|i| neighbours[i])
                .find(|&n| is_free_for_carving(map, pos, n));
        }

        if let Some(next) = next {
            map.set_corridor(next);
            carved.insert(next);
            open.push(pos);
            open.push(next);
            prev_dir = next - pos;
        }
    }
    carved
}
