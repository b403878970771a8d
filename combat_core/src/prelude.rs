//! Prelude module for convenient imports
//!
//! ```rust
//! use combat_core::prelude::*;
//! ```

// Core types
pub use crate::combatant::Combatant;
pub use crate::stat_block::{StatBlock, StatFlags};

// Threat
pub use crate::aggro::AggroTracker;

// Content
pub use crate::hit::{DamageModifier, Hit, HitboxTiming, Skill};
pub use crate::hook::{HookCommand, HookContext, HookDefinition, HookError, HookOwner};
pub use crate::status::{StatusCatalog, StatusDefinition, StatusStack};

// Combat
pub use crate::combat::{calculate_hit, commit_hit, resolve_hit, HitOutcome, HitRequest};

// Config
pub use crate::config::{CombatConstants, DamageConstants, StatusConstants};

// Re-exports from combat_types
pub use combat_types::{
    ActionSlot, AttackAttributes, CombatantId, Element, EventKind, Side, StatusCategory, StatusId,
};
