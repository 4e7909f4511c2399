//! Property tests for geometry and rectangle rooms

use dg_core::GameRng;
use dg_core::dungeon::DungeonRoom;
use dg_core::geometry::{CompassDirection, Point, Rect, Rotation};
use proptest::prelude::*;

const SIDES: [CompassDirection; 4] = [
    CompassDirection::North,
    CompassDirection::East,
    CompassDirection::South,
    CompassDirection::West,
];

proptest! {
    #[test]
    fn prop_rotation_round_trip(x in -100i32..100, y in -100i32..100, count in 0usize..4) {
        let p = Point::new(x, y);
        let rotation = Rotation::from_count(count);
        prop_assert_eq!(rotation.unapply(rotation.apply(p)), p);
        prop_assert_eq!(rotation.apply(rotation.unapply(p)), p);
    }

    #[test]
    fn prop_quarter_turns_compose(x in -100i32..100, y in -100i32..100) {
        let p = Point::new(x, y);
        let quarter = Rotation::from_count(1);
        let twice = quarter.apply(quarter.apply(p));
        prop_assert_eq!(twice, Rotation::from_count(2).apply(p));
        prop_assert_eq!(p.rotate_left().rotate_right(), p);
        prop_assert_eq!(
            quarter.apply(p).manhattan_distance(Point::ZERO),
            p.manhattan_distance(Point::ZERO)
        );
    }

    #[test]
    fn prop_rect_room_shape(
        x in 1i32..30,
        y in 1i32..30,
        w in 1i32..12,
        h in 1i32..12,
        seed in any::<u64>()
    ) {
        let mut rng = GameRng::new(seed);
        let room = DungeonRoom::from_rect(&mut rng, Rect::new(x, y, x + w, y + h));

        prop_assert_eq!(room.floor_tile_count(), (w * h) as usize);
        prop_assert_eq!(room.walls().len(), (2 * (w + h) + 4) as usize);
        prop_assert_eq!(room.available_connections().len(), 4);
        for p in room.absolute_floor_tiles() {
            prop_assert!(!room.has_wall_tile(p));
        }

        for side in SIDES {
            let connector = room.random_connector_position(&mut rng, side);
            prop_assert!(room.has_wall_tile(connector));
            prop_assert!(room.wall_corner_at(connector).is_none());
            prop_assert!(room.floor_contains(connector - side.to_point()));
        }
    }
}
