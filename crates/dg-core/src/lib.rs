//! dg-core: dungeon layout generation for roguelikes
//!
//! This crate turns a seeded random source into a carved tile grid:
//! walls, room floors, corridors, doors and stairs. It performs no I/O.
//!
//! Four generators share the same map model:
//! - [`generator::AccretionGenerator`] docks hand-authored room templates onto each other
//! - [`generator::MegaDungeonGenerator`] scatters rooms, fills the gaps with mazes and merges regions
//! - [`generator::RogueGenerator`] lays out one room per grid cell, classic Rogue style
//! - [`generator::VaultGenerator`] carves a single corridor

pub mod config;
pub mod dungeon;
pub mod generator;
pub mod geometry;

mod error;
mod rng;

pub use config::{AccretionConfig, MegaDungeonConfig, RogueConfig, TemplateRules, VaultConfig};
pub use error::GenerationError;
pub use rng::GameRng;
pub use generator::{DungeonGenerator, GeneratedDungeon, GenerationReport, GeneratorKind};
