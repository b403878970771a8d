//! Encounter worker that owns the authoritative [`EncounterState`].
//!
//! Drives the round loop and suspends on the active entry until action
//! selection completes it. Commands from [`EncounterHandle`](super::EncounterHandle)
//! and hitbox timelines are serviced while suspended and between rounds.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use combat_core::combat::HitOutcome;
use combat_core::hit::{Hit, Skill};
use combat_core::status::{ApplyOutcome, StatusStack};
use combat_types::{ActionSlot, CombatantId, Endstate, Side, StatusId};
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinSet;
use tracing::{debug, trace, warn};

use super::notify::{Notification, NotificationBus};
use super::snapshot::{EncounterOutcome, EncounterSnapshot, SkillReport, TurnPrompt};
use super::state::{EncounterState, SkillUse};
use crate::hitbox::{self, HitboxId, HitboxPhase};
use crate::turn::EntryId;
use crate::Result;

/// Commands that can be sent to the encounter worker
pub(crate) enum Command {
    /// Reply with the active turn, waiting for one if needed. `None` once closed.
    WaitTurn {
        reply: oneshot::Sender<Option<TurnPrompt>>,
    },
    CompleteTurn {
        entry: EntryId,
        reply: oneshot::Sender<Result<()>>,
    },
    ConsumeAction {
        entry: EntryId,
        slot: ActionSlot,
        reply: oneshot::Sender<Result<()>>,
    },
    UseSkill {
        entry: EntryId,
        skill: String,
        targets: Vec<CombatantId>,
        reply: oneshot::Sender<Result<SkillReport>>,
    },
    ResolveHit {
        attacker: Option<CombatantId>,
        hit: Arc<Hit>,
        defender: CombatantId,
        reply: oneshot::Sender<Result<HitOutcome>>,
    },
    ApplyStatus {
        target: CombatantId,
        status: StatusId,
        stack: StatusStack,
        count: u32,
        reply: oneshot::Sender<Result<ApplyOutcome>>,
    },
    RemoveStatus {
        target: CombatantId,
        status: StatusId,
        reply: oneshot::Sender<Result<bool>>,
    },
    GrantPriority {
        side: Side,
        reply: oneshot::Sender<Result<usize>>,
    },
    RevokePriority {
        side: Side,
        reply: oneshot::Sender<Result<usize>>,
    },
    Withdraw {
        combatant: CombatantId,
        reply: oneshot::Sender<Result<usize>>,
    },
    Flee {
        reply: oneshot::Sender<Result<()>>,
    },
    Snapshot {
        reply: oneshot::Sender<EncounterSnapshot>,
    },
    /// Sent by hitbox timelines
    Hitbox { id: HitboxId, phase: HitboxPhase },
}

/// A placed skill waiting for its hitbox to become active
struct PlacedHitbox {
    user: CombatantId,
    skill: Arc<Skill>,
    targets: Vec<CombatantId>,
}

fn send_reply<T>(reply: oneshot::Sender<T>, value: T, command: &'static str) {
    if reply.send(value).is_err() {
        debug!(target: "encounter::worker", command, "Reply channel closed (caller dropped)");
    }
}

pub(crate) struct EncounterWorker {
    state: EncounterState,
    command_rx: mpsc::Receiver<Command>,
    /// Weak so the channel closes once every handle is gone
    hitbox_tx: mpsc::WeakSender<Command>,
    hitbox_tasks: JoinSet<()>,
    hitboxes: BTreeMap<HitboxId, PlacedHitbox>,
    next_hitbox: u64,
    tick: Duration,
    turn_waiters: Vec<oneshot::Sender<Option<TurnPrompt>>>,
    bus: NotificationBus,
}

impl EncounterWorker {
    pub fn new(
        state: EncounterState,
        command_rx: mpsc::Receiver<Command>,
        hitbox_tx: mpsc::WeakSender<Command>,
        tick: Duration,
        bus: NotificationBus,
    ) -> Self {
        EncounterWorker {
            state,
            command_rx,
            hitbox_tx,
            hitbox_tasks: JoinSet::new(),
            hitboxes: BTreeMap::new(),
            next_hitbox: 0,
            tick,
            turn_waiters: Vec::new(),
            bus,
        }
    }

    /// Main loop. Runs until an endstate is reached.
    pub async fn run(mut self) -> EncounterOutcome {
        self.state.start();

        while self.state.is_active() {
            self.drain_commands();
            if !self.state.is_active() {
                break;
            }
            if !self.state.has_entries() {
                // Nobody can act; only commands can move the encounter on
                self.service_one().await;
                continue;
            }

            self.state.begin_round();
            while let Some(entry) = self.state.next_pending() {
                if let Some(prompt) = self.state.start_turn(entry) {
                    self.notify_waiters(Some(prompt));
                    self.wait_for_completion(entry).await;
                    if !self.state.is_active() {
                        break;
                    }
                    self.state.end_turn(entry);
                }
                if !self.state.is_active() {
                    break;
                }
            }
            if !self.state.is_active() {
                break;
            }

            self.state.end_round();
            tokio::task::yield_now().await;
        }

        self.shutdown()
    }

    /// Suspend until `entry` is completed or the encounter closes
    async fn wait_for_completion(&mut self, entry: EntryId) {
        while self.state.is_active() && !self.state.turn_done(entry) {
            tokio::select! {
                cmd = self.command_rx.recv() => match cmd {
                    Some(cmd) => self.handle_command(cmd),
                    None => self.abandon(),
                },
                Some(joined) = self.hitbox_tasks.join_next(), if !self.hitbox_tasks.is_empty() => {
                    if let Err(err) = joined {
                        warn!(target: "encounter::worker", error = %err, "Hitbox task failed");
                    }
                }
            }
        }
    }

    async fn service_one(&mut self) {
        match self.command_rx.recv().await {
            Some(cmd) => self.handle_command(cmd),
            None => self.abandon(),
        }
    }

    /// Handle whatever queued up while the round loop was busy
    fn drain_commands(&mut self) {
        while self.state.is_active() {
            match self.command_rx.try_recv() {
                Ok(cmd) => self.handle_command(cmd),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => self.abandon(),
            }
        }
    }

    /// Every handle was dropped mid-encounter
    fn abandon(&mut self) {
        warn!(target: "encounter::worker", "All encounter handles dropped, closing as flee");
        self.state.finish(Endstate::Flee);
    }

    fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::WaitTurn { reply } => match self.state.current_prompt() {
                Some(prompt) => send_reply(reply, Some(prompt), "WaitTurn"),
                None if !self.state.is_active() => send_reply(reply, None, "WaitTurn"),
                None => self.turn_waiters.push(reply),
            },
            Command::CompleteTurn { entry, reply } => {
                send_reply(reply, self.state.complete_turn(entry), "CompleteTurn");
            }
            Command::ConsumeAction { entry, slot, reply } => {
                send_reply(reply, self.state.consume_action(entry, slot), "ConsumeAction");
            }
            Command::UseSkill {
                entry,
                skill,
                targets,
                reply,
            } => {
                let result = self
                    .state
                    .use_skill(entry, &skill, targets)
                    .map(|used| self.dispatch_skill(used));
                send_reply(reply, result, "UseSkill");
            }
            Command::ResolveHit {
                attacker,
                hit,
                defender,
                reply,
            } => {
                send_reply(reply, self.state.resolve_hit(attacker, &hit, defender), "ResolveHit");
            }
            Command::ApplyStatus {
                target,
                status,
                stack,
                count,
                reply,
            } => {
                let result = self.state.apply_status(target, &status, stack, count);
                send_reply(reply, result, "ApplyStatus");
            }
            Command::RemoveStatus {
                target,
                status,
                reply,
            } => {
                send_reply(reply, self.state.remove_status(target, &status), "RemoveStatus");
            }
            Command::GrantPriority { side, reply } => {
                send_reply(reply, self.state.grant_priority(side), "GrantPriority");
            }
            Command::RevokePriority { side, reply } => {
                send_reply(reply, self.state.revoke_priority(side), "RevokePriority");
            }
            Command::Withdraw { combatant, reply } => {
                send_reply(reply, self.state.withdraw(combatant), "Withdraw");
            }
            Command::Flee { reply } => {
                send_reply(reply, self.state.flee(), "Flee");
            }
            Command::Snapshot { reply } => {
                send_reply(reply, self.state.snapshot(), "Snapshot");
            }
            Command::Hitbox { id, phase } => self.on_hitbox(id, phase),
        }
    }

    fn dispatch_skill(&mut self, used: SkillUse) -> SkillReport {
        match used {
            SkillUse::Resolved(outcomes) => SkillReport::Resolved(outcomes),
            SkillUse::Deferred {
                user,
                skill,
                targets,
                timing,
            } => {
                let id = HitboxId(self.next_hitbox);
                self.next_hitbox += 1;

                let sender = match self.hitbox_tx.upgrade() {
                    Some(sender) => sender,
                    None => {
                        // Channel is closing; land the hit now rather than never
                        let outcomes = self.state.execute_skill(user, &skill, &targets);
                        return SkillReport::Resolved(outcomes);
                    }
                };
                hitbox::spawn_timeline(&mut self.hitbox_tasks, id, timing, self.tick, sender);

                debug!(
                    target: "encounter::worker",
                    hitbox = %id,
                    skill = %skill.id,
                    %user,
                    "Hitbox placed"
                );
                self.bus.publish(Notification::HitPlaced {
                    hitbox: id,
                    user,
                    skill: skill.id.clone(),
                    targets: targets.clone(),
                });
                self.hitboxes.insert(
                    id,
                    PlacedHitbox {
                        user,
                        skill,
                        targets,
                    },
                );
                SkillReport::Placed(id)
            }
        }
    }

    fn on_hitbox(&mut self, id: HitboxId, phase: HitboxPhase) {
        match phase {
            HitboxPhase::Active => {
                let (user, skill, targets) = match self.hitboxes.get(&id) {
                    Some(placed) => (
                        placed.user,
                        Arc::clone(&placed.skill),
                        placed.targets.clone(),
                    ),
                    None => return,
                };
                if self.state.is_active() {
                    self.state.execute_skill(user, &skill, &targets);
                }
            }
            HitboxPhase::Lingering => {
                trace!(target: "encounter::worker", hitbox = %id, "Hitbox lingering");
            }
            HitboxPhase::Expired => {
                if self.hitboxes.remove(&id).is_some() {
                    self.bus.publish(Notification::HitboxExpired { hitbox: id });
                }
            }
        }
    }

    fn notify_waiters(&mut self, prompt: Option<TurnPrompt>) {
        for waiter in self.turn_waiters.drain(..) {
            send_reply(waiter, prompt, "WaitTurn");
        }
    }

    fn shutdown(mut self) -> EncounterOutcome {
        self.hitbox_tasks.abort_all();
        if !self.hitboxes.is_empty() {
            debug!(
                target: "encounter::worker",
                pending = self.hitboxes.len(),
                "Discarding placed hitboxes"
            );
        }
        self.hitboxes.clear();
        self.notify_waiters(None);
        self.state.into_outcome()
    }
}
