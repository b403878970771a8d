use combat_core::hook::ActionAvailability;
use combat_types::{CombatantId, Side};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a turn entry; also its creation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(pub u64);

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entry#{}", self.0)
    }
}

/// One scheduled opportunity for a combatant to act in a round
///
/// Several entries may exist for the same combatant (a regular entry plus a
/// priority entry). `side` and `speed` are copied from the combatant so the
/// scheduler can sort without the roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnEntry {
    pub id: EntryId,
    pub combatant: CombatantId,
    pub side: Side,
    pub speed: i32,
    pub is_priority: bool,
    pub is_active: bool,
    pub is_completed: bool,
    pub actions: ActionAvailability,
}

impl TurnEntry {
    pub fn new(
        id: EntryId,
        combatant: CombatantId,
        side: Side,
        speed: i32,
        is_priority: bool,
    ) -> Self {
        TurnEntry {
            id,
            combatant,
            side,
            speed,
            is_priority,
            is_active: false,
            is_completed: false,
            actions: ActionAvailability::default(),
        }
    }

    /// Start-of-round reset
    pub fn reset(&mut self) {
        self.actions.reset();
        self.is_active = false;
        self.is_completed = false;
    }

    pub fn is_pending(&self) -> bool {
        !self.is_active && !self.is_completed
    }
}
