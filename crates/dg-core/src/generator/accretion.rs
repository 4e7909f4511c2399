//! Template docking
//!
//! Rooms grow outward from a first room: each new room is a template clone
//! that is rotated until one of its free connections faces a free connection
//! of a placed room, then shifted so both connection points share one tile.

use std::collections::BTreeSet;

use tracing::{debug, trace, warn};

use super::{DungeonGenerator, GeneratedDungeon, GenerationReport, GeneratorKind};
use crate::config::{AccretionConfig, TemplateRules};
use crate::dungeon::{DungeonMap, DungeonRoom, DungeonTile, PlacementPolicy, RoomId};
use crate::error::GenerationError;
use crate::geometry::Point;
use crate::rng::GameRng;

/// Where a candidate room docks onto an existing one
struct Docking {
    existing: RoomId,
    /// Connection point on the existing room, local coordinates
    existing_connection: Point,
    /// Connection point on the new room, local coordinates
    new_connection: Point,
}

/// Builds levels by docking room templates onto each other
#[derive(Debug, Clone)]
pub struct AccretionGenerator {
    templates: Vec<DungeonRoom>,
    config: AccretionConfig,
    rules: TemplateRules,
    placed_templates: BTreeSet<String>,
}

impl AccretionGenerator {
    pub fn new(templates: Vec<DungeonRoom>, config: AccretionConfig, rules: TemplateRules) -> Self {
        Self {
            templates,
            config,
            rules,
            placed_templates: BTreeSet::new(),
        }
    }

    pub fn set_level_rules(&mut self, rules: TemplateRules) {
        self.rules = rules;
    }

    pub fn set_room_count(&mut self, max_room_count: usize) {
        self.config.max_room_count = max_room_count;
    }

    pub fn config(&self) -> &AccretionConfig {
        &self.config
    }

    pub fn rules(&self) -> &TemplateRules {
        &self.rules
    }

    /// Templates usable on this level: not forbidden, and either named with
    /// the level's prefix or explicitly required
    fn templates_for_level(&self) -> Vec<&DungeonRoom> {
        self.templates
            .iter()
            .filter(|t| !self.rules.is_forbidden(t.template_name()))
            .filter(|t| {
                t.template_name().starts_with(&self.rules.template_prefix)
                    || self.rules.is_required(t.template_name())
            })
            .collect()
    }

    fn first_room(&self, rng: &mut GameRng) -> Result<DungeonRoom, GenerationError> {
        let eligible = self.templates_for_level();
        if eligible.is_empty() {
            return Err(GenerationError::EmptyTemplateSet);
        }
        let standalone: Vec<&DungeonRoom> = eligible
            .into_iter()
            .filter(|t| t.has_only_zero_id_connections())
            .collect();
        rng.choose(&standalone)
            .map(|t| t.instantiate())
            .ok_or(GenerationError::NoStandaloneTemplate)
    }

    /// Pick a template that plugs into `slot_id`. Required templates that are
    /// still missing come first, then templates opening the slot a missing
    /// one needs, then anything for the slot except required templates that
    /// are already on the map.
    fn room_for_slot(
        &self,
        slot_id: i32,
        rng: &mut GameRng,
    ) -> Result<DungeonRoom, GenerationError> {
        let eligible = self.templates_for_level();
        let missing: BTreeSet<&str> = self
            .rules
            .require_templates
            .iter()
            .map(String::as_str)
            .filter(|name| !self.placed_templates.contains(*name))
            .collect();

        let mut matching: Vec<&DungeonRoom> = Vec::new();
        if !missing.is_empty() {
            let mut missing_slots = BTreeSet::new();
            for template in &eligible {
                if !missing.contains(template.template_name()) {
                    continue;
                }
                if template.plugs_into_slot_id() == slot_id {
                    matching.push(template);
                } else {
                    missing_slots.insert(template.plugs_into_slot_id());
                }
            }
            if matching.is_empty() {
                matching = eligible
                    .iter()
                    .copied()
                    .filter(|t| {
                        missing_slots.contains(&t.slot_id()) && t.plugs_into_slot_id() == slot_id
                    })
                    .collect();
            }
        }
        if matching.is_empty() {
            matching = eligible
                .iter()
                .copied()
                .filter(|t| t.plugs_into_slot_id() == slot_id)
                .filter(|t| {
                    !(self.placed_templates.contains(t.template_name())
                        && self.rules.is_required(t.template_name()))
                })
                .collect();
        }

        match rng.choose(&matching) {
            Some(template) => Ok(template.instantiate()),
            None => Err(GenerationError::NoTemplateForSlot {
                slot_id,
                available: eligible
                    .iter()
                    .map(|t| (t.template_name().to_string(), t.plugs_into_slot_id()))
                    .collect(),
            }),
        }
    }

    /// Try every rotation of `candidate` against every free connection of
    /// `existing`. On success the candidate is left rotated and positioned.
    fn try_connect_to(
        &self,
        map: &DungeonMap,
        candidate: &mut DungeonRoom,
        existing: RoomId,
        rng: &mut GameRng,
    ) -> Option<Docking> {
        let existing_room = map.room(existing)?;
        let free = existing_room.free_connections_with_rotated_direction();
        for rotation in rng.perm(4) {
            candidate.set_rotation_count(rotation);
            for (&existing_connection, connection) in &free {
                let Some(new_connection) = candidate.has_matching_connection(connection) else {
                    continue;
                };
                let door = existing_room.to_absolute_position(existing_connection);
                let rotated = candidate.rotated_relative_position(new_connection);
                candidate.set_position_offset(door - rotated);
                trace!(
                    template = candidate.template_name(),
                    existing,
                    ?door,
                    rotation,
                    "trying docking position"
                );
                if map.can_place_room(candidate, PlacementPolicy::EdgeBuffer) {
                    return Some(Docking {
                        existing,
                        existing_connection,
                        new_connection,
                    });
                }
            }
        }
        None
    }

    fn build(
        &mut self,
        width: i32,
        height: i32,
        rng: &mut GameRng,
    ) -> Result<GeneratedDungeon, GenerationError> {
        self.placed_templates.clear();
        let mut report = GenerationReport::new(GeneratorKind::Accretion);
        report.requested_rooms = self.config.max_room_count;
        let mut map = DungeonMap::new(width, height);

        let mut first = self.first_room(rng)?;
        let size = first.relative_bounding_rect_including_connectors().size();
        first.set_position_offset(Point::new(width - size.x, height - size.y).div(2));
        if !map.can_place_room(&first, PlacementPolicy::EdgeBuffer) {
            return Err(GenerationError::FirstRoomDoesNotFit {
                template: first.template_name().to_string(),
                width,
                height,
            });
        }
        debug!(
            template = first.template_name(),
            offset = ?first.position_offset(),
            "placed first room"
        );
        self.placed_templates.insert(first.template_name().to_string());
        map.add_room_and_set_tiles(first);

        let mut attempts = 0;
        let mut slot_id = 0;
        while map.all_rooms().len() < self.config.max_room_count
            && attempts < self.config.retry_budget
        {
            let mut candidate = self.room_for_slot(slot_id, rng)?;
            let docking = (0..map.all_rooms().len())
                .find_map(|existing| self.try_connect_to(&map, &mut candidate, existing, rng));
            if let Some(docking) = docking {
                let new_id = map.all_rooms().len();
                candidate.add_connected_room(docking.new_connection, docking.existing);
                if let Some(existing) = map.room_mut(docking.existing) {
                    existing.add_connected_room(docking.existing_connection, new_id);
                }
                debug!(
                    template = candidate.template_name(),
                    id = new_id,
                    docked_to = docking.existing,
                    "placed room"
                );
                slot_id = candidate.slot_id();
                self.placed_templates
                    .insert(candidate.template_name().to_string());
                map.add_room_and_set_tiles(candidate);
                attempts = 0;
            }
            attempts += 1;
        }

        report.placed_rooms = map.all_rooms().len();
        if report.is_shortfall() {
            warn!(
                placed = report.placed_rooms,
                requested = report.requested_rooms,
                "could not place all rooms"
            );
        }

        map.trim();
        map.connect_rooms_on_map(!self.rules.no_doors);
        report.required_doors = map
            .tiles()
            .iter()
            .filter(|&&t| t == DungeonTile::Door)
            .count();
        if !self.rules.no_doors {
            report.optional_doors = map.add_more_doors(
                rng,
                self.config.min_door_path_distance,
                self.config.extra_door_chance,
            );
        }
        let last = map.all_rooms().len() - 1;
        map.set_first_and_last_rooms(0, last);

        Ok(GeneratedDungeon { map, report })
    }
}

impl DungeonGenerator for AccretionGenerator {
    fn kind(&self) -> GeneratorKind {
        GeneratorKind::Accretion
    }

    fn generate(
        &mut self,
        width: i32,
        height: i32,
        rng: &mut GameRng,
    ) -> Result<GeneratedDungeon, GenerationError> {
        self.build(width, height, rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dungeon::RoomConnection;
    use crate::geometry::{CompassDirection, Rect};

    fn config(max_room_count: usize) -> AccretionConfig {
        AccretionConfig {
            max_room_count,
            ..AccretionConfig::default()
        }
    }

    fn boxes() -> Vec<DungeonRoom> {
        vec![
            DungeonRoom::rect_template("small", 3, 3),
            DungeonRoom::rect_template("wide", 5, 3),
            DungeonRoom::rect_template("tall", 3, 5),
        ]
    }

    fn generate(
        templates: Vec<DungeonRoom>,
        config: AccretionConfig,
        rules: TemplateRules,
        size: i32,
        seed: u64,
    ) -> Result<GeneratedDungeon, GenerationError> {
        let mut rng = GameRng::new(seed);
        AccretionGenerator::new(templates, config, rules).generate(size, size, &mut rng)
    }

    fn door_count(map: &DungeonMap) -> usize {
        map.tiles().iter().filter(|&&t| t == DungeonTile::Door).count()
    }

    #[test]
    fn test_single_room() {
        let result = generate(
            vec![DungeonRoom::rect_template("box", 5, 5)],
            config(1),
            TemplateRules::default(),
            20,
            42,
        )
        .unwrap();
        let map = &result.map;
        assert_eq!(map.all_rooms().len(), 1);
        assert_eq!(door_count(map), 0);
        assert_eq!(map.stairs_up(), None);
        assert_eq!(map.stairs_down(), None);
        assert_eq!(map.size(), (7, 7));
        assert_eq!(map.walkable_tile_count(), 25);
        assert!(!result.report.is_shortfall());
    }

    #[test]
    fn test_places_requested_rooms() {
        let result = generate(boxes(), config(6), TemplateRules::default(), 60, 42).unwrap();
        let map = &result.map;
        assert_eq!(map.all_rooms().len(), 6);
        assert_eq!(result.report.placed_rooms, 6);

        // every link is recorded on both rooms
        for room in map.all_rooms() {
            for (&pos, &other) in room.connected_rooms() {
                let door = room.to_absolute_position(pos);
                let partner = map.room(other).unwrap();
                assert!(partner.connected_rooms().values().any(|&id| id == room.id()));
                assert!(partner.used_absolute_door_tiles().contains(&door));
            }
        }
    }

    #[test]
    fn test_rooms_are_reachable() {
        let result = generate(boxes(), config(6), TemplateRules::default(), 60, 7).unwrap();
        let map = &result.map;
        let start = map.all_rooms()[0].absolute_floor_tiles()[0];
        for room in &map.all_rooms()[1..] {
            let goal = room.absolute_floor_tiles()[0];
            assert!(!map.jps_path(start, goal).is_empty());
        }
    }

    #[test]
    fn test_docking_openings_join_two_open_tiles() {
        let result = generate(boxes(), config(6), TemplateRules::default(), 60, 42).unwrap();
        let map = &result.map;
        for room in map.all_rooms() {
            for door in room.used_absolute_door_tiles() {
                assert!(map.is_walkable(door));
                let vertical = map.is_walkable(door + CompassDirection::North.to_point())
                    && map.is_walkable(door + CompassDirection::South.to_point());
                let horizontal = map.is_walkable(door + CompassDirection::East.to_point())
                    && map.is_walkable(door + CompassDirection::West.to_point());
                assert!(vertical || horizontal);
            }
        }
    }

    #[test]
    fn test_no_doors_rule_opens_corridors() {
        let result = generate(
            boxes(),
            config(4),
            TemplateRules::default().with_no_doors(),
            60,
            42,
        )
        .unwrap();
        let map = &result.map;
        assert_eq!(door_count(map), 0);
        assert_eq!(result.report.optional_doors, 0);
        assert!(map.tiles().contains(&DungeonTile::Corridor));
    }

    #[test]
    fn test_deterministic() {
        let a = generate(boxes(), config(6), TemplateRules::default(), 60, 99).unwrap();
        let b = generate(boxes(), config(6), TemplateRules::default(), 60, 99).unwrap();
        assert_eq!(a.map.to_string(), b.map.to_string());
        assert_eq!(a.report, b.report);
    }

    #[test]
    fn test_slot_ids_chain_templates() {
        let templates = vec![
            DungeonRoom::rect_template("hall", 3, 3).with_slot_id(1),
            DungeonRoom::rect_template("cell", 3, 3).with_plugs_into_slot_id(1),
        ];
        let result = generate(templates, config(5), TemplateRules::default(), 60, 42).unwrap();
        let names: Vec<&str> = result.map.all_rooms()[1..]
            .iter()
            .map(|r| r.template_name())
            .collect();
        assert_eq!(names, vec!["hall", "cell", "hall", "cell"]);
    }

    #[test]
    fn test_required_template_is_placed_once() {
        let templates = vec![
            DungeonRoom::rect_template("plain", 3, 3),
            DungeonRoom::rect_template("shrine", 3, 3),
        ];
        let rules = TemplateRules {
            require_templates: ["shrine".to_string()].into(),
            ..TemplateRules::default()
        };
        let result = generate(templates, config(5), rules, 60, 42).unwrap();
        let shrines = result
            .map
            .all_rooms()
            .iter()
            .filter(|r| r.template_name() == "shrine")
            .count();
        assert_eq!(shrines, 1);
    }

    #[test]
    fn test_forbidden_and_prefix_filter() {
        let templates = vec![
            DungeonRoom::rect_template("crypt_a", 3, 3),
            DungeonRoom::rect_template("crypt_b", 5, 3),
            DungeonRoom::rect_template("cave_a", 3, 5),
        ];
        let rules = TemplateRules {
            template_prefix: "crypt_".to_string(),
            ..TemplateRules::default()
        }
        .with_forbidden("crypt_b");
        let result = generate(templates, config(4), rules, 60, 42).unwrap();
        assert!(
            result
                .map
                .all_rooms()
                .iter()
                .all(|r| r.template_name() == "crypt_a")
        );
    }

    #[test]
    fn test_missing_slot_is_an_error() {
        let templates = vec![DungeonRoom::rect_template("lonely", 3, 3).with_slot_id(2)];
        let err = generate(templates, config(3), TemplateRules::default(), 40, 42).unwrap_err();
        assert_eq!(
            err,
            GenerationError::NoTemplateForSlot {
                slot_id: 2,
                available: vec![("lonely".to_string(), 0)],
            }
        );
    }

    #[test]
    fn test_no_standalone_template() {
        let keyed = DungeonRoom::from_template("keyed")
            .with_floor_tiles(Rect::new(0, 0, 3, 3).points())
            .with_connections([(
                Point::new(3, 1),
                RoomConnection::new(CompassDirection::East, 5),
            )]);
        let err = generate(vec![keyed], config(2), TemplateRules::default(), 20, 42).unwrap_err();
        assert_eq!(err, GenerationError::NoStandaloneTemplate);
    }

    #[test]
    fn test_everything_forbidden() {
        let rules = TemplateRules::default().with_forbidden("box");
        let err = generate(
            vec![DungeonRoom::rect_template("box", 3, 3)],
            config(2),
            rules,
            20,
            42,
        )
        .unwrap_err();
        assert_eq!(err, GenerationError::EmptyTemplateSet);
    }

    #[test]
    fn test_first_room_too_big() {
        let err = generate(
            vec![DungeonRoom::rect_template("hall", 10, 10)],
            config(2),
            TemplateRules::default(),
            8,
            42,
        )
        .unwrap_err();
        assert!(matches!(err, GenerationError::FirstRoomDoesNotFit { .. }));
    }

    #[test]
    fn test_shortfall_when_map_is_full() {
        let result = generate(
            vec![DungeonRoom::rect_template("box", 5, 5)],
            config(10),
            TemplateRules::default(),
            9,
            42,
        )
        .unwrap();
        assert_eq!(result.map.all_rooms().len(), 1);
        assert!(result.report.is_shortfall());
    }
}
