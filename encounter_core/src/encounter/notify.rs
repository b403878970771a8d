//! Fire-and-forget notifications for visual services

use crate::hitbox::HitboxId;
use crate::turn::EntryId;
use combat_types::{CombatantId, EncounterKind, Endstate, StatusId};
use tokio::sync::broadcast;

/// Something observable happened in the encounter
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    EncounterStarted {
        kind: EncounterKind,
        combatants: usize,
    },
    RoundStarted {
        round: u32,
    },
    TurnStarted {
        round: u32,
        entry: EntryId,
        combatant: CombatantId,
        priority: bool,
    },
    /// The entry's combatant was blocked and the turn auto-completed
    TurnSkipped {
        round: u32,
        entry: EntryId,
        combatant: CombatantId,
    },
    TurnEnded {
        round: u32,
        entry: EntryId,
        combatant: CombatantId,
    },
    RoundEnded {
        round: u32,
    },
    HitPlaced {
        hitbox: HitboxId,
        user: CombatantId,
        skill: String,
        targets: Vec<CombatantId>,
    },
    HitExecuted {
        attacker: Option<CombatantId>,
        defender: CombatantId,
        damage: i64,
        hp_after: i64,
    },
    HitboxExpired {
        hitbox: HitboxId,
    },
    StatusApplied {
        target: CombatantId,
        status: StatusId,
        stacks: usize,
    },
    StatusRemoved {
        target: CombatantId,
        status: StatusId,
    },
    Incapacitated {
        combatant: CombatantId,
    },
    Revived {
        combatant: CombatantId,
    },
    EncounterClosed {
        endstate: Endstate,
        rounds: u32,
    },
}

/// Broadcast channel for notifications
///
/// Publishing never blocks and never fails; with no subscribers the
/// notification is dropped, and slow subscribers see `Lagged`.
#[derive(Debug, Clone)]
pub struct NotificationBus {
    sender: broadcast::Sender<Notification>,
}

impl NotificationBus {
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        NotificationBus { sender }
    }

    pub fn publish(&self, notification: Notification) {
        if self.sender.send(notification).is_err() {
            // No subscribers - normal, not an error
            tracing::trace!(target: "encounter::notify", "No notification subscribers");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }
}
