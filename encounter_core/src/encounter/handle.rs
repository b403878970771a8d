//! Cloneable façade for issuing commands to a live encounter.
//!
//! Every method is one round trip to the encounter task; requests are
//! handled in the order they arrive.
use std::sync::Arc;

use combat_core::combat::HitOutcome;
use combat_core::hit::Hit;
use combat_core::status::{ApplyOutcome, StatusStack};
use combat_types::{ActionSlot, CombatantId, Side, StatusId};
use tokio::sync::{broadcast, mpsc, oneshot};

use super::notify::{Notification, NotificationBus};
use super::snapshot::{EncounterSnapshot, SkillReport, TurnPrompt};
use super::worker::Command;
use crate::turn::EntryId;
use crate::{EncounterError, Result};

/// Client-facing handle to interact with an encounter
#[derive(Clone)]
pub struct EncounterHandle {
    command_tx: mpsc::Sender<Command>,
    bus: NotificationBus,
}

impl EncounterHandle {
    pub(crate) fn new(command_tx: mpsc::Sender<Command>, bus: NotificationBus) -> Self {
        Self { command_tx, bus }
    }

    async fn request<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(build(reply_tx))
            .await
            .map_err(|_| EncounterError::CommandChannelClosed)?;

        reply_rx.await.map_err(EncounterError::ReplyChannelClosed)
    }

    /// Wait until an entry is active and awaiting action selection
    ///
    /// Returns `None` once the encounter has closed.
    pub async fn wait_turn(&self) -> Result<Option<TurnPrompt>> {
        match self.request(|reply| Command::WaitTurn { reply }).await {
            // The task exits right after closing
            Err(EncounterError::CommandChannelClosed | EncounterError::ReplyChannelClosed(_)) => {
                Ok(None)
            }
            other => other,
        }
    }

    /// Finish the active entry's turn; the round loop resumes
    pub async fn complete_turn(&self, entry: EntryId) -> Result<()> {
        self.request(|reply| Command::CompleteTurn { entry, reply })
            .await?
    }

    /// Spend an action slot without a skill, e.g. after the world moved the combatant
    pub async fn consume_action(&self, entry: EntryId, slot: ActionSlot) -> Result<()> {
        self.request(|reply| Command::ConsumeAction { entry, slot, reply })
            .await?
    }

    pub async fn use_skill(
        &self,
        entry: EntryId,
        skill: impl Into<String>,
        targets: Vec<CombatantId>,
    ) -> Result<SkillReport> {
        let skill = skill.into();
        self.request(|reply| Command::UseSkill {
            entry,
            skill,
            targets,
            reply,
        })
        .await?
    }

    /// Resolve a hit outside of a skill (traps, scripted damage, heals)
    pub async fn resolve_hit(
        &self,
        attacker: Option<CombatantId>,
        hit: Arc<Hit>,
        defender: CombatantId,
    ) -> Result<HitOutcome> {
        self.request(|reply| Command::ResolveHit {
            attacker,
            hit,
            defender,
            reply,
        })
        .await?
    }

    /// Apply `count` stacks of a catalogued status
    pub async fn apply_status(
        &self,
        target: CombatantId,
        status: impl Into<StatusId>,
        stack: StatusStack,
        count: u32,
    ) -> Result<ApplyOutcome> {
        let status = status.into();
        self.request(|reply| Command::ApplyStatus {
            target,
            status,
            stack,
            count,
            reply,
        })
        .await?
    }

    pub async fn remove_status(
        &self,
        target: CombatantId,
        status: impl Into<StatusId>,
    ) -> Result<bool> {
        let status = status.into();
        self.request(|reply| Command::RemoveStatus {
            target,
            status,
            reply,
        })
        .await?
    }

    pub async fn grant_priority(&self, side: Side) -> Result<usize> {
        self.request(|reply| Command::GrantPriority { side, reply })
            .await?
    }

    pub async fn revoke_priority(&self, side: Side) -> Result<usize> {
        self.request(|reply| Command::RevokePriority { side, reply })
            .await?
    }

    pub async fn withdraw(&self, combatant: CombatantId) -> Result<usize> {
        self.request(|reply| Command::Withdraw { combatant, reply })
            .await?
    }

    /// Close the encounter as a flee; combatant state is kept
    pub async fn flee(&self) -> Result<()> {
        self.request(|reply| Command::Flee { reply }).await?
    }

    /// Query a read-only view of the encounter
    pub async fn snapshot(&self) -> Result<EncounterSnapshot> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    /// Subscribe to encounter notifications
    ///
    /// Delivery is best-effort: a slow receiver gets `Lagged` and the
    /// encounter never waits on it.
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.bus.subscribe()
    }

    /// Whether the encounter task is still accepting commands
    pub fn is_closed(&self) -> bool {
        self.command_tx.is_closed()
    }
}
