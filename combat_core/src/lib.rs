//! combat_core - per-combatant combat state and hit resolution
//!
//! This library provides:
//! - StatBlock: HP/MP, offense/defense, resistances, speed and flags
//! - AggroTracker: threat shares keyed by attacker
//! - HookRegistry / StatusRegistry: content callbacks and the statuses that install them
//! - Hit / Skill: immutable damage, heal and status definitions
//! - Combat resolution: turning a hit into damage, aggro and status rolls
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use combat_core::prelude::*;
//!
//! let hero = Combatant::new(CombatantId(0), "hero", Side::Ally,
//!     StatBlock::new(100, 20).with_physical(10.0, 2.0));
//! let mut slime = Combatant::new(CombatantId(1), "slime", Side::Enemy,
//!     StatBlock::new(40, 0));
//!
//! let slash = Arc::new(Hit::new(3.0, AttackAttributes::PHYSICAL));
//! let outcome = resolve_hit(Some(&hero), &slash, &mut slime,
//!     &DamageConstants::default(), &mut rand::thread_rng());
//! println!("Dealt {} damage!", outcome.hp_lost());
//! ```

pub mod aggro;
pub mod combat;
pub mod combatant;
pub mod config;
pub mod hit;
pub mod hook;
pub mod prelude;
pub mod stat_block;
pub mod status;

use thiserror::Error;

// Core API
pub use aggro::AggroTracker;
pub use combat::{HitCalculation, HitOutcome};
pub use combatant::Combatant;
pub use hit::{DamageModifier, Hit, Skill};
pub use stat_block::{StatBlock, StatFlags};
pub use status::{StatusCatalog, StatusDefinition, StatusStack};

// Configuration
pub use config::{CombatConstants, ConfigError};

/// Invalid content definitions (hits, skills, statuses)
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("Invalid hit: {0}")]
    InvalidHit(String),

    #[error("Invalid skill '{id}': {reason}")]
    InvalidSkill { id: String, reason: String },

    #[error("Invalid status '{id}': {reason}")]
    InvalidStatus { id: String, reason: String },

    #[error("Skill '{skill}' references unknown status '{status}'")]
    UnknownStatus { skill: String, status: String },
}
