//! Generation errors
//!
//! Search exhaustion is not an error: generators return what they managed to
//! place and flag the shortfall in their report. These variants cover inputs
//! that can never produce a level.

use thiserror::Error;

/// Errors surfaced by the dungeon generators
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    #[error("template set is empty once forbidden templates are removed")]
    EmptyTemplateSet,

    #[error("no template has only id-0 connections, cannot pick a first room")]
    NoStandaloneTemplate,

    #[error("no template plugs into slot {slot_id} (available: {})", format_available(.available))]
    NoTemplateForSlot {
        slot_id: i32,
        available: Vec<(String, i32)>,
    },

    #[error("first room '{template}' does not fit on a {width}x{height} map")]
    FirstRoomDoesNotFit {
        template: String,
        width: i32,
        height: i32,
    },

    #[error("map of {width}x{height} is too small, need at least {min_width}x{min_height}")]
    MapTooSmall {
        width: i32,
        height: i32,
        min_width: i32,
        min_height: i32,
    },
}

fn format_available(available: &[(String, i32)]) -> String {
    if available.is_empty() {
        return "none".to_string();
    }
    available
        .iter()
        .map(|(name, slot)| format!("{name} -> slot {slot}"))
        .collect::<Vec<_>>()
        .join(", ")
}
