//! Vault corridor carving
//!
//! Only the corridor skeleton exists so far: two start locations joined by
//! an L-shaped passage. No rooms are placed.

use tracing::debug;

use super::{DungeonGenerator, GeneratedDungeon, GenerationReport, GeneratorKind};
use crate::config::VaultConfig;
use crate::dungeon::DungeonMap;
use crate::error::GenerationError;
use crate::geometry::Point;
use crate::rng::GameRng;

#[derive(Debug, Clone)]
pub struct VaultGenerator {
    config: VaultConfig,
}

impl VaultGenerator {
    pub fn new(config: VaultConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    /// Smallest side that leaves room for an inner start location
    fn min_side(&self) -> i32 {
        2 * self.config.margin() + 1
    }

    /// A corridor start and the direction it would head in.
    ///
    /// Each axis independently starts on the border, or at least `margin`
    /// tiles away from it.
    fn choose_start_location(&self, width: i32, height: i32, rng: &mut GameRng) -> (Point, Point) {
        let margin = self.config.margin();
        let (x, dx) = Self::choose_axis(rng, width, margin);
        let (y, dy) = Self::choose_axis(rng, height, margin);
        (Point::new(x, y), Point::new(dx, dy))
    }

    fn choose_axis(rng: &mut GameRng, size: i32, margin: i32) -> (i32, i32) {
        if rng.coin() {
            if rng.coin() { (0, 1) } else { (size - 1, -1) }
        } else {
            let at = rng.rn2(size - 2 * margin) + margin;
            (at, if at < size / 2 { 1 } else { -1 })
        }
    }
}

/// Carve an L-shaped corridor from `from` to `to`, including both ends
fn carve_corridor_between(map: &mut DungeonMap, from: Point, to: Point) {
    map.set_corridor(from);
    map.set_corridor(to);
    let delta = to - from;
    let step = Point::new(delta.x.signum(), delta.y.signum());
    let mut at = from;
    let horizontal_first = delta.x > delta.y;
    for horizontal in [horizontal_first, !horizontal_first] {
        if horizontal {
            while at.x != to.x {
                at.x += step.x;
                map.set_corridor(at);
            }
        } else {
            while at.y != to.y {
                at.y += step.y;
                map.set_corridor(at);
            }
        }
    }
}

impl DungeonGenerator for VaultGenerator {
    fn kind(&self) -> GeneratorKind {
        GeneratorKind::Vault
    }

    fn generate(
        &mut self,
        width: i32,
        height: i32,
        rng: &mut GameRng,
    ) -> Result<GeneratedDungeon, GenerationError> {
        let min = self.min_side();
        if width < min || height < min {
            return Err(GenerationError::MapTooSmall {
                width,
                height,
                min_width: min,
                min_height: min,
            });
        }

        let mut map = DungeonMap::new(width, height);
        let (start, heading) = self.choose_start_location(width, height, rng);
        let (end, _) = self.choose_start_location(width, height, rng);
        debug!(?start, ?heading, ?end, "carving vault corridor");
        carve_corridor_between(&mut map, start, end);

        Ok(GeneratedDungeon {
            map,
            report: GenerationReport::new(GeneratorKind::Vault),
        })
    }
}
