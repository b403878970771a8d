//! Event payloads handed to hooks

use crate::combat::HitOutcome;
use crate::hit::{DamageModifier, Hit};
use combat_types::{ActionSlot, CombatantId, StatusId};
use serde::{Deserialize, Serialize};

/// Per-round action budget of a turn entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionAvailability {
    pub primary: bool,
    pub auxiliary: bool,
    pub movement: bool,
}

impl Default for ActionAvailability {
    fn default() -> Self {
        ActionAvailability {
            primary: true,
            auxiliary: true,
            movement: true,
        }
    }
}

impl ActionAvailability {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_available(&self, slot: ActionSlot) -> bool {
        match slot {
            ActionSlot::Primary => self.primary,
            ActionSlot::Auxiliary => self.auxiliary,
            ActionSlot::Movement => self.movement,
        }
    }

    /// Spend a slot. Returns false if it was already spent.
    pub fn consume(&mut self, slot: ActionSlot) -> bool {
        let flag = match slot {
            ActionSlot::Primary => &mut self.primary,
            ActionSlot::Auxiliary => &mut self.auxiliary,
            ActionSlot::Movement => &mut self.movement,
        };
        std::mem::replace(flag, false)
    }

    pub fn all_spent(&self) -> bool {
        !(self.primary || self.auxiliary || self.movement)
    }
}

/// Data relevant to the event being raised
pub enum EventBundle<'a> {
    /// `RoundStart` / `RoundEnd`
    Round { round: u32 },
    /// `TurnStart` / `TurnEnd`; hooks may spend the acting entry's actions
    Turn {
        round: u32,
        priority: bool,
        actions: &'a mut ActionAvailability,
    },
    /// `BeforeAttack` / `BeforeDefend` (no outcome yet) and `AfterAttack` / `AfterDefend`
    Attack {
        attacker: Option<CombatantId>,
        defender: CombatantId,
        hit: &'a Hit,
        outcome: Option<&'a HitOutcome>,
    },
    /// `CollectAttackerModifiers` / `CollectDefenderModifiers`
    Modifiers {
        attacker: Option<CombatantId>,
        defender: CombatantId,
        hit: &'a Hit,
        modifiers: &'a mut Vec<DamageModifier>,
    },
    /// `OnApply` / `OnRemove` / `StatusApplied` / `StatusRemoved`
    Status {
        id: &'a StatusId,
        stacks: usize,
        inflicter: Option<CombatantId>,
    },
    /// `Incapacitation`
    Incapacitation { by: Option<CombatantId> },
}

impl EventBundle<'_> {
    /// Push a damage modifier if this is a collection event
    pub fn add_modifier(&mut self, modifier: DamageModifier) -> bool {
        match self {
            EventBundle::Modifiers { modifiers, .. } => {
                modifiers.push(modifier);
                true
            }
            _ => false,
        }
    }

    /// The turn's action budget if this is a turn event
    pub fn actions_mut(&mut self) -> Option<&mut ActionAvailability> {
        match self {
            EventBundle::Turn { actions, .. } => Some(&mut **actions),
            _ => None,
        }
    }

    /// Record the mutable part of the payload
    pub(crate) fn checkpoint(&self) -> PayloadCheckpoint {
        match self {
            EventBundle::Turn { actions, .. } => PayloadCheckpoint::Actions(**actions),
            EventBundle::Modifiers { modifiers, .. } => {
                PayloadCheckpoint::Modifiers(modifiers.len())
            }
            _ => PayloadCheckpoint::Fixed,
        }
    }

    /// Undo whatever a hook wrote since `checkpoint`
    pub(crate) fn restore(&mut self, checkpoint: PayloadCheckpoint) {
        match (self, checkpoint) {
            (EventBundle::Turn { actions, .. }, PayloadCheckpoint::Actions(saved)) => {
                **actions = saved;
            }
            (EventBundle::Modifiers { modifiers, .. }, PayloadCheckpoint::Modifiers(len)) => {
                modifiers.truncate(len);
            }
            _ => {}
        }
    }
}

/// Snapshot of a payload taken before each hook runs
#[derive(Debug, Clone, Copy)]
pub(crate) enum PayloadCheckpoint {
    Actions(ActionAvailability),
    Modifiers(usize),
    /// Payload has nothing a hook can write
    Fixed,
}
