//! Read-only views handed out through the encounter handle

use super::state::Phase;
use crate::hitbox::HitboxId;
use crate::turn::{EntryId, TurnEntry};
use combat_core::combat::HitOutcome;
use combat_core::hook::ActionAvailability;
use combat_core::Combatant;
use combat_types::{CombatantId, EncounterKind, Endstate, Side, StatusId};
use serde::Serialize;

/// The active entry waiting on action selection
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TurnPrompt {
    pub round: u32,
    pub entry: EntryId,
    pub combatant: CombatantId,
    pub priority: bool,
    pub actions: ActionAvailability,
}

/// What happened when a skill was used
#[derive(Debug, Clone)]
pub enum SkillReport {
    /// Instant skill; one outcome per target that could be hit
    Resolved(Vec<HitOutcome>),
    /// The hit lands when the hitbox turns active
    Placed(HitboxId),
}

#[derive(Debug, Clone, Serialize)]
pub struct CombatantSnapshot {
    pub id: CombatantId,
    pub name: String,
    pub side: Side,
    pub hp: i64,
    pub max_hp: i64,
    pub mp: i64,
    pub max_mp: i64,
    /// Status id and stack count
    pub statuses: Vec<(StatusId, usize)>,
    pub top_aggro: Vec<CombatantId>,
    pub incapacitated: bool,
    pub withdrawn: bool,
}

impl CombatantSnapshot {
    pub fn has_status(&self, id: &StatusId) -> bool {
        self.statuses.iter().any(|(status, _)| status == id)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EncounterSnapshot {
    pub kind: EncounterKind,
    pub area: String,
    pub round: u32,
    pub phase: Phase,
    pub endstate: Option<Endstate>,
    pub active_entry: Option<EntryId>,
    pub order: Vec<TurnEntry>,
    pub combatants: Vec<CombatantSnapshot>,
}

impl EncounterSnapshot {
    pub fn combatant(&self, id: CombatantId) -> Option<&CombatantSnapshot> {
        self.combatants.iter().find(|c| c.id == id)
    }
}

/// Everything an encounter hands back once its task finishes
#[derive(Debug)]
pub struct EncounterOutcome {
    pub endstate: Endstate,
    pub kind: EncounterKind,
    pub area: String,
    pub rounds: u32,
    pub combatants: Vec<Combatant>,
}

impl EncounterOutcome {
    pub fn combatant(&self, id: CombatantId) -> Option<&Combatant> {
        self.combatants.iter().find(|c| c.id == id)
    }
}
