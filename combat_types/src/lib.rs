//! combat_types - identifiers and enums shared by the encounter crates

pub mod types;

pub use types::{
    ActionSlot, AttackAttributes, CombatantId, Element, EncounterKind, Endstate, EventKind, Side,
    StatusCategory, StatusId,
};
