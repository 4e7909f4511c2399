//! Level layout generators
//!
//! Each generator turns a seeded [`GameRng`] into a carved [`DungeonMap`]
//! plus a [`GenerationReport`] describing how close it got to its target.

mod accretion;
mod mega;
mod rogue;
mod vault;

pub use accretion::AccretionGenerator;
pub use mega::MegaDungeonGenerator;
pub use rogue::RogueGenerator;
pub use vault::VaultGenerator;

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::dungeon::DungeonMap;
use crate::error::GenerationError;
use crate::rng::GameRng;

/// Which algorithm produced a map
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter, EnumString,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum GeneratorKind {
    Accretion,
    Mega,
    Rogue,
    Vault,
}

/// Outcome counters for one generation run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationReport {
    pub generator: GeneratorKind,
    /// Rooms the generator aimed for
    pub requested_rooms: usize,
    pub placed_rooms: usize,
    pub required_doors: usize,
    pub optional_doors: usize,
    /// Regions walled back in because nothing could reach them
    pub discarded_regions: usize,
}

impl GenerationReport {
    pub fn new(generator: GeneratorKind) -> Self {
        Self {
            generator,
            requested_rooms: 0,
            placed_rooms: 0,
            required_doors: 0,
            optional_doors: 0,
            discarded_regions: 0,
        }
    }

    /// Fewer rooms than requested
    pub fn is_shortfall(&self) -> bool {
        self.placed_rooms < self.requested_rooms
    }
}

impl fmt::Display for GenerationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}/{} rooms, {} required doors, {} optional doors",
            self.generator,
            self.placed_rooms,
            self.requested_rooms,
            self.required_doors,
            self.optional_doors
        )?;
        if self.discarded_regions > 0 {
            write!(f, ", {} unreachable regions removed", self.discarded_regions)?;
        }
        Ok(())
    }
}

/// A finished map and what it took to build it
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedDungeon {
    pub map: DungeonMap,
    pub report: GenerationReport,
}

/// Common entry point of all generators
pub trait DungeonGenerator {
    fn kind(&self) -> GeneratorKind;

    /// Build a map of at most `width` x `height` tiles
    fn generate(
        &mut self,
        width: i32,
        height: i32,
        rng: &mut GameRng,
    ) -> Result<GeneratedDungeon, GenerationError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_kind_names() {
        assert_eq!(GeneratorKind::Mega.to_string(), "mega");
        assert_eq!(GeneratorKind::from_str("rogue"), Ok(GeneratorKind::Rogue));
        assert!(GeneratorKind::from_str("cave").is_err());
    }

    #[test]
    fn test_report_shortfall() {
        let mut report = GenerationReport::new(GeneratorKind::Accretion);
        assert!(!report.is_shortfall());
        report.requested_rooms = 5;
        report.placed_rooms = 3;
        assert!(report.is_shortfall());
        assert_eq!(
            report.to_string(),
            "accretion: 3/5 rooms, 0 required doors, 0 optional doors"
        );
    }

    #[test]
    fn test_report_mentions_discarded_regions() {
        let mut report = GenerationReport::new(GeneratorKind::Mega);
        report.discarded_regions = 2;
        assert!(report.to_string().ends_with("2 unreachable regions removed"));
    }
}
