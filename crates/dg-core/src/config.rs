//! Generator settings
//!
//! Every struct here deserializes with missing fields filled from its
//! `Default`, so a config file only needs to name what it changes.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::geometry::Point;
use crate::rng::GameRng;

/// Settings for the template docking generator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccretionConfig {
    /// Stop once this many rooms are on the map
    pub max_room_count: usize,
    /// Consecutive attempts without a placement before giving up
    pub retry_budget: usize,
    /// Extra doors are only opened where walking around takes longer than this
    pub min_door_path_distance: usize,
    pub extra_door_chance: f64,
}

impl Default for AccretionConfig {
    fn default() -> Self {
        Self {
            max_room_count: 12,
            retry_budget: 100,
            min_door_path_distance: 10,
            extra_door_chance: 0.8,
        }
    }
}

/// Settings for the rooms-and-mazes generator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MegaDungeonConfig {
    /// Number of random rooms attempted before the maze is dug
    pub room_tries: usize,
    pub min_room_size: i32,
    /// How often the maze keeps going in the same direction
    pub straight_passage_chance: f64,
    /// How often a merge also opens a second, redundant connector
    pub imperfect_connect_chance: f64,
    /// Rooms get an aspect ratio in `1.0..1.0 + interval`
    pub room_ratio_interval: f64,
    /// Minimum manhattan distance between two doors
    pub door_distance: i32,
    pub remove_dead_ends: bool,
}

impl Default for MegaDungeonConfig {
    fn default() -> Self {
        Self {
            room_tries: 200,
            min_room_size: 3,
            straight_passage_chance: 0.5,
            imperfect_connect_chance: 0.3,
            room_ratio_interval: 0.25,
            door_distance: 4,
            remove_dead_ends: true,
        }
    }
}

impl MegaDungeonConfig {
    /// A config with every knob drawn at random
    pub fn randomized(rng: &mut GameRng) -> Self {
        let room_tries = rng.rn2(2500) as usize + 16;
        let min_room_size = rng.rn2(6) + 2;
        let straight_passage_chance = rng.random_float();
        let imperfect_connect_chance = rng.random_float();
        let door_distance = rng.rn2(6) + 2;
        let room_ratio_interval = rng.random_float() * 0.5;
        Self {
            room_tries,
            min_room_size,
            straight_passage_chance,
            imperfect_connect_chance,
            room_ratio_interval,
            door_distance,
            remove_dead_ends: true,
        }
    }
}

/// Settings for the classic grid generator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RogueConfig {
    /// Cells across and down; one room per cell
    pub grid_divisions: Point,
    pub room_lit_chance: f64,
    /// Extra corridors beyond the spanning tree
    pub additional_room_connections: usize,
}

impl Default for RogueConfig {
    fn default() -> Self {
        Self {
            grid_divisions: Point::new(3, 3),
            room_lit_chance: 0.5,
            additional_room_connections: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    pub min_room_size: i32,
    pub min_corridor_width: i32,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            min_room_size: 3,
            min_corridor_width: 2,
        }
    }
}

impl VaultConfig {
    /// Distance a corridor start keeps from the border when not on it
    pub fn margin(&self) -> i32 {
        self.min_room_size + self.min_corridor_width
    }
}

/// Which templates a level must contain or may not contain
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateRules {
    pub require_templates: BTreeSet<String>,
    pub forbid_templates: BTreeSet<String>,
    pub template_prefix: String,
    /// Open used connections as corridors instead of doors
    pub no_doors: bool,
}

impl TemplateRules {
    /// Rules for dungeon level `level`. Templates required on that level
    /// become required, templates required anywhere else become forbidden.
    pub fn for_level(
        required_by_level: &BTreeMap<i32, Vec<String>>,
        level: i32,
        template_prefix: impl Into<String>,
    ) -> Self {
        let mut rules = Self {
            template_prefix: template_prefix.into(),
            ..Self::default()
        };
        for (&on_level, names) in required_by_level {
            let target = if on_level == level {
                &mut rules.require_templates
            } else {
                &mut rules.forbid_templates
            };
            target.extend(names.iter().cloned());
        }
        rules
    }

    pub fn with_no_doors(mut self) -> Self {
        self.no_doors = true;
        self
    }

    pub fn with_forbidden(mut self, template: impl Into<String>) -> Self {
        self.forbid_templates.insert(template.into());
        self
    }

    pub fn is_required(&self, template: &str) -> bool {
        self.require_templates.contains(template)
    }

    pub fn is_forbidden(&self, template: &str) -> bool {
        self.forbid_templates.contains(template)
    }
}
