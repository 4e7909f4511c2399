//! Whole-level checks run against every generator
//!
//! Layout, connectivity and door shape of finished maps.

use std::collections::{BTreeSet, VecDeque};

use dg_core::dungeon::{DungeonMap, DungeonRoom, DungeonTile};
use dg_core::generator::{
    AccretionGenerator, MegaDungeonGenerator, RogueGenerator, VaultGenerator,
};
use dg_core::geometry::{CompassDirection, Point};
use dg_core::{
    AccretionConfig, DungeonGenerator, GameRng, GeneratedDungeon, GeneratorKind,
    MegaDungeonConfig, RogueConfig, TemplateRules, VaultConfig,
};

// ============================================================================
// Helpers
// ============================================================================

fn templates() -> Vec<DungeonRoom> {
    vec![
        DungeonRoom::rect_template("small", 3, 3),
        DungeonRoom::rect_template("wide", 7, 3),
        DungeonRoom::rect_template("tall", 3, 7),
        DungeonRoom::rect_template("hall", 5, 5),
    ]
}

fn generator(kind: GeneratorKind) -> Box<dyn DungeonGenerator> {
    match kind {
        GeneratorKind::Accretion => Box::new(AccretionGenerator::new(
            templates(),
            AccretionConfig {
                max_room_count: 8,
                ..AccretionConfig::default()
            },
            TemplateRules::default(),
        )),
        GeneratorKind::Mega => Box::new(MegaDungeonGenerator::new(MegaDungeonConfig::default())),
        GeneratorKind::Rogue => Box::new(RogueGenerator::new(RogueConfig {
            additional_room_connections: 2,
            ..RogueConfig::default()
        })),
        GeneratorKind::Vault => Box::new(VaultGenerator::new(VaultConfig::default())),
    }
}

fn generate(kind: GeneratorKind, seed: u64) -> GeneratedDungeon {
    let mut rng = GameRng::new(seed);
    generator(kind).generate(80, 25, &mut rng).unwrap()
}

const ROOM_GENERATORS: [GeneratorKind; 3] = [
    GeneratorKind::Accretion,
    GeneratorKind::Mega,
    GeneratorKind::Rogue,
];

fn flood_fill(map: &DungeonMap, start: Point) -> BTreeSet<Point> {
    let mut seen = BTreeSet::from([start]);
    let mut queue = VecDeque::from([start]);
    while let Some(p) = queue.pop_front() {
        for n in p.neighbors_4() {
            if map.is_walkable(n) && seen.insert(n) {
                queue.push_back(n);
            }
        }
    }
    seen
}

fn walkable(map: &DungeonMap) -> Vec<Point> {
    map.points().filter(|&p| map.is_walkable(p)).collect()
}

// ============================================================================
// Determinism
// ============================================================================

#[test]
fn test_same_seed_same_map() {
    for kind in [
        GeneratorKind::Accretion,
        GeneratorKind::Mega,
        GeneratorKind::Rogue,
        GeneratorKind::Vault,
    ] {
        let a = generate(kind, 42);
        let b = generate(kind, 42);
        assert_eq!(a.map, b.map, "{kind}");
        assert_eq!(a.report, b.report, "{kind}");
        assert_eq!(a.report.generator, kind);
    }
}

#[test]
fn test_different_seeds_differ() {
    for kind in ROOM_GENERATORS {
        let a = generate(kind, 1);
        let b = generate(kind, 2);
        assert_ne!(a.map.to_string(), b.map.to_string(), "{kind}");
    }
}

// ============================================================================
// Layout invariants
// ============================================================================

#[test]
fn test_rooms_never_overlap() {
    for kind in ROOM_GENERATORS {
        for seed in [3, 42] {
            let result = generate(kind, seed);
            let mut claimed = BTreeSet::new();
            for room in result.map.all_rooms() {
                for p in room.absolute_floor_tiles() {
                    assert!(claimed.insert(p), "{kind} seed {seed}: {p} claimed twice");
                }
            }
        }
    }
}

#[test]
fn test_room_floors_are_open() {
    for kind in ROOM_GENERATORS {
        let result = generate(kind, 42);
        let map = &result.map;
        for room in map.all_rooms() {
            for p in room.absolute_floor_tiles() {
                assert!(map.is_walkable(p), "{kind}: floor {p} is rock");
            }
        }
    }
}

#[test]
fn test_border_is_rock() {
    for kind in ROOM_GENERATORS {
        for seed in [3, 42] {
            let result = generate(kind, seed);
            let map = &result.map;
            let (width, height) = map.size();
            let border = map
                .points()
                .filter(|p| p.x == 0 || p.y == 0 || p.x == width - 1 || p.y == height - 1);
            for p in border {
                assert!(map.is_wall_at(p), "{kind} seed {seed}: open border at {p}");
            }
        }
    }
}

#[test]
fn test_everything_is_connected() {
    for kind in ROOM_GENERATORS {
        for seed in [3, 42, 1234] {
            let result = generate(kind, seed);
            let open = walkable(&result.map);
            assert!(!open.is_empty());
            let reached = flood_fill(&result.map, open[0]);
            assert_eq!(reached.len(), open.len(), "{kind} seed {seed}");
        }
    }
}

#[test]
fn test_doors_join_opposite_open_tiles() {
    let open = |map: &DungeonMap, p: Point, d: CompassDirection| map.is_walkable(p + d.to_point());
    for kind in ROOM_GENERATORS {
        let result = generate(kind, 42);
        let map = &result.map;
        for p in map.points().filter(|&p| map.is_door_at(p)) {
            let vertical =
                open(map, p, CompassDirection::North) && open(map, p, CompassDirection::South);
            let horizontal =
                open(map, p, CompassDirection::East) && open(map, p, CompassDirection::West);
            assert!(vertical || horizontal, "{kind}: door at {p} leads nowhere");
        }
    }
}

#[test]
fn test_report_matches_map() {
    for kind in ROOM_GENERATORS {
        let result = generate(kind, 42);
        assert_eq!(result.report.placed_rooms, result.map.all_rooms().len(), "{kind}");
    }
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_single_template_single_room() {
    let mut rng = GameRng::new(42);
    let mut generator = AccretionGenerator::new(
        vec![DungeonRoom::rect_template("box", 5, 5)],
        AccretionConfig {
            max_room_count: 1,
            ..AccretionConfig::default()
        },
        TemplateRules::default(),
    );
    let result = generator.generate(30, 30, &mut rng).unwrap();
    let map = &result.map;
    assert_eq!(map.all_rooms().len(), 1);
    assert!(!map.tiles().contains(&DungeonTile::Door));
    assert_eq!(map.stairs_up(), None);
    assert_eq!(map.stairs_down(), None);
}

#[test]
fn test_maze_fills_empty_level() {
    let mut rng = GameRng::new(42);
    let mut generator = MegaDungeonGenerator::new(MegaDungeonConfig {
        room_tries: 0,
        remove_dead_ends: false,
        ..MegaDungeonConfig::default()
    });
    let result = generator.generate(21, 21, &mut rng).unwrap();
    let map = &result.map;
    assert!(map.all_rooms().is_empty());
    assert!(!map.tiles().contains(&DungeonTile::Room));
    assert!(!map.tiles().contains(&DungeonTile::Door));

    let open = walkable(map);
    assert!(open.iter().all(|p| p.x > 0 && p.y > 0 && p.x < 20 && p.y < 20));
    assert!(open.iter().all(|&p| map.is_corridor(p)));
    assert_eq!(flood_fill(map, open[0]).len(), open.len());
}

#[test]
fn test_rogue_stairs_are_reachable() {
    let result = generate(GeneratorKind::Rogue, 42);
    let map = &result.map;
    let up = map.stairs_up().unwrap();
    let down = map.stairs_down().unwrap();
    assert!(flood_fill(map, up).contains(&down));
}

#[test]
fn test_vault_carves_a_corridor_only() {
    let result = generate(GeneratorKind::Vault, 42);
    let map = &result.map;
    assert!(map.all_rooms().is_empty());
    assert!(
        map.tiles()
            .iter()
            .all(|&t| matches!(t, DungeonTile::Wall | DungeonTile::Corridor))
    );
    let open = walkable(map);
    assert_eq!(flood_fill(map, open[0]).len(), open.len());
}
