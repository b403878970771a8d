//! Encounter state machine - rounds, turns, resolution and the end condition
//!
//! Everything here is synchronous; the worker task decides when to call it
//! and owns the only suspension point (waiting for the active entry).

use super::notify::{Notification, NotificationBus};
use super::snapshot::{CombatantSnapshot, EncounterSnapshot, TurnPrompt};
use super::{EncounterOutcome, EncounterSetup};
use crate::config::EncounterConfig;
use crate::roster::Roster;
use crate::turn::{EntryId, TurnScheduler};
use crate::{EncounterError, Result};
use combat_core::aggro::AggroTracker;
use combat_core::combat::{calculate_hit, commit_hit, HitOutcome, HitRequest};
use combat_core::hit::{Hit, HitboxTiming, Skill};
use combat_core::hook::{EventBundle, HookCommand};
use combat_core::status::{ApplyOutcome, StatusCatalog, StatusDefinition, StatusStack};
use combat_core::CombatConstants;
use combat_types::{ActionSlot, CombatantId, EncounterKind, Endstate, EventKind, Side, StatusId};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Where the round loop currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Inactive,
    RoundStart,
    Turn,
    RoundEnd,
}

/// Result of a validated skill use
pub(crate) enum SkillUse {
    Resolved(Vec<HitOutcome>),
    /// Costs are paid; the hit lands when the hitbox becomes active
    Deferred {
        user: CombatantId,
        skill: Arc<Skill>,
        targets: Vec<CombatantId>,
        timing: HitboxTiming,
    },
}

pub(crate) struct EncounterState {
    kind: EncounterKind,
    area: String,
    round: u32,
    phase: Phase,
    endstate: Option<Endstate>,
    roster: Roster,
    scheduler: TurnScheduler,
    constants: Arc<CombatConstants>,
    catalog: StatusCatalog,
    config: EncounterConfig,
    rng: ChaCha8Rng,
    bus: NotificationBus,
}

impl EncounterState {
    /// Validate the setup; the encounter stays `Inactive` until [`start`](Self::start)
    pub fn new(
        setup: EncounterSetup,
        config: EncounterConfig,
        constants: Arc<CombatConstants>,
        catalog: &StatusCatalog,
        bus: NotificationBus,
    ) -> Result<Self> {
        for combatant in &setup.combatants {
            for skill in combatant.skills() {
                catalog.check_skill(skill)?;
            }
        }

        let mut catalog = catalog.clone();
        catalog.ensure_builtins(&constants.status);

        let mut roster = Roster::new(setup.combatants)?;
        for combatant in roster.iter_mut() {
            combatant.aggro = AggroTracker::with_constants(&constants.aggro);
        }

        Ok(EncounterState {
            kind: setup.kind,
            area: setup.area,
            round: 0,
            phase: Phase::Inactive,
            endstate: None,
            roster,
            scheduler: TurnScheduler::new(),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            constants,
            catalog,
            config,
            bus,
        })
    }

    pub fn start(&mut self) {
        self.round = 0;
        self.endstate = None;
        self.phase = Phase::RoundStart;

        let order: Vec<(CombatantId, Side, i32)> = self
            .roster
            .iter()
            .map(|c| (c.id, c.side, c.stats.speed))
            .collect();
        self.scheduler = TurnScheduler::build_initial_order(order);
        if let Some(side) = self.kind.priority_side() {
            self.scheduler.grant_priority(side);
        }

        // Combatants entering at 0 HP start incapacitated
        let downed: Vec<CombatantId> = self
            .roster
            .iter()
            .filter(|c| c.stats.is_depleted() && !c.is_incapacitated(&self.constants.status))
            .map(|c| c.id)
            .collect();
        for id in downed {
            self.incapacitate(id, None, 0);
        }

        info!(
            target: "encounter::state",
            kind = ?self.kind,
            area = %self.area,
            combatants = self.roster.len(),
            "Encounter started"
        );
        self.bus.publish(Notification::EncounterStarted {
            kind: self.kind,
            combatants: self.roster.len(),
        });
    }

    pub fn is_active(&self) -> bool {
        self.phase != Phase::Inactive
    }

    fn ensure_active(&self) -> Result<()> {
        if self.is_active() {
            Ok(())
        } else {
            Err(EncounterError::NotActive)
        }
    }

    pub fn has_entries(&self) -> bool {
        !self.scheduler.is_empty()
    }

    // ---- round loop ----

    /// Advance the round counter, raise `RoundStart` and reset the order
    pub fn begin_round(&mut self) {
        self.round += 1;
        self.phase = Phase::RoundStart;
        debug!(target: "encounter::state", round = self.round, "Round started");
        self.bus.publish(Notification::RoundStarted { round: self.round });

        self.raise_all(EventKind::RoundStart);

        for combatant in self.roster.iter() {
            self.scheduler.update_speed(combatant.id, combatant.stats.speed);
        }
        self.scheduler.reset();
        self.phase = Phase::Turn;
    }

    pub fn next_pending(&self) -> Option<EntryId> {
        self.scheduler.next_pending()
    }

    /// Raise `TurnStart` and activate the entry
    ///
    /// Returns the prompt for action selection, or `None` when the combatant
    /// is blocked and the turn was completed on the spot.
    pub fn start_turn(&mut self, id: EntryId) -> Option<TurnPrompt> {
        let round = self.round;
        let (combatant_id, priority, hp_before, commands) = {
            let entry = self.scheduler.get_mut(id)?;
            let combatant_id = entry.combatant;
            let priority = entry.is_priority;
            let mut event = EventBundle::Turn {
                round,
                priority,
                actions: &mut entry.actions,
            };
            let (hp_before, commands) = match self.roster.get_mut(combatant_id) {
                Some(combatant) => {
                    let hp_before = combatant.stats.hp();
                    (Some(hp_before), combatant.raise(EventKind::TurnStart, &mut event))
                }
                None => (None, Vec::new()),
            };
            (combatant_id, priority, hp_before, commands)
        };
        self.scheduler.activate(id);
        if let Some(before) = hp_before {
            self.settle_hp(combatant_id, before, 0);
        }
        self.run_commands(commands, 1);

        let blocked = self
            .roster
            .get(combatant_id)
            .map_or(true, |c| c.is_blocked(&self.constants.status));
        if blocked {
            debug!(
                target: "encounter::state",
                round,
                entry = %id,
                combatant = %combatant_id,
                "Turn skipped, combatant blocked"
            );
            self.bus.publish(Notification::TurnSkipped {
                round,
                entry: id,
                combatant: combatant_id,
            });
            self.end_turn(id);
            return None;
        }

        debug!(
            target: "encounter::state",
            round,
            entry = %id,
            combatant = %combatant_id,
            "Turn started"
        );
        self.bus.publish(Notification::TurnStarted {
            round,
            entry: id,
            combatant: combatant_id,
            priority,
        });
        self.current_prompt()
    }

    /// The prompt for the active entry, if a turn is waiting on action selection
    pub fn current_prompt(&self) -> Option<TurnPrompt> {
        if self.phase != Phase::Turn {
            return None;
        }
        self.scheduler
            .active()
            .filter(|e| !e.is_completed)
            .map(|e| TurnPrompt {
                round: self.round,
                entry: e.id,
                combatant: e.combatant,
                priority: e.is_priority,
                actions: e.actions,
            })
    }

    /// Whether the worker can stop waiting on `id`
    pub fn turn_done(&self, id: EntryId) -> bool {
        self.scheduler.get(id).map_or(true, |e| e.is_completed)
    }

    /// Complete the active entry on behalf of action selection
    pub fn complete_turn(&mut self, id: EntryId) -> Result<()> {
        self.ensure_active()?;
        let entry = self
            .scheduler
            .get(id)
            .ok_or(EncounterError::UnknownEntry(id))?;
        if !entry.is_active || entry.is_completed {
            return Err(EncounterError::EntryNotActive(id));
        }
        self.scheduler.complete(id);
        Ok(())
    }

    /// Raise `TurnEnd`, then mark the entry completed and inactive
    pub fn end_turn(&mut self, id: EntryId) {
        let round = self.round;
        let (combatant_id, hp_before, commands) = {
            let entry = match self.scheduler.get_mut(id) {
                Some(entry) => entry,
                // Withdrawn or revoked mid-turn
                None => return,
            };
            let combatant_id = entry.combatant;
            let mut event = EventBundle::Turn {
                round,
                priority: entry.is_priority,
                actions: &mut entry.actions,
            };
            let (hp_before, commands) = match self.roster.get_mut(combatant_id) {
                Some(combatant) => {
                    let hp_before = combatant.stats.hp();
                    (Some(hp_before), combatant.raise(EventKind::TurnEnd, &mut event))
                }
                None => (None, Vec::new()),
            };
            (combatant_id, hp_before, commands)
        };
        self.scheduler.complete(id);
        self.scheduler.deactivate(id);
        self.scheduler.sort();
        if let Some(before) = hp_before {
            self.settle_hp(combatant_id, before, 0);
        }
        self.run_commands(commands, 1);

        self.bus.publish(Notification::TurnEnded {
            round,
            entry: id,
            combatant: combatant_id,
        });
    }

    /// Raise `RoundEnd`, tick durations and cooldowns, prune aggro, then
    /// evaluate the end condition
    pub fn end_round(&mut self) -> Option<Endstate> {
        self.phase = Phase::RoundEnd;
        self.raise_all(EventKind::RoundEnd);

        for id in self.roster.active_ids() {
            let expired = match self.roster.get_mut(id) {
                Some(combatant) => {
                    combatant.tick_cooldowns();
                    let pruned = combatant.aggro.prune();
                    if !pruned.is_empty() {
                        debug!(
                            target: "encounter::state",
                            combatant = %id,
                            pruned = pruned.len(),
                            "Aggro pruned"
                        );
                    }
                    combatant.statuses.tick()
                }
                None => continue,
            };
            for status in expired {
                if let Err(err) = self.remove_status_at(id, &status, 1) {
                    warn!(
                        target: "encounter::state",
                        combatant = %id,
                        %status,
                        error = %err,
                        "Failed to expire status"
                    );
                }
            }
        }

        if !self.config.priority_persists {
            let removed = self.scheduler.revoke_all_priority();
            debug!(target: "encounter::state", removed, "Priority entries expired");
        }

        debug!(target: "encounter::state", round = self.round, "Round ended");
        self.bus.publish(Notification::RoundEnded { round: self.round });

        let endstate = self.evaluate_end();
        if let Some(endstate) = endstate {
            self.finish(endstate);
        } else {
            self.phase = Phase::RoundStart;
        }
        endstate
    }

    /// One side fully incapacitated loses; both wiped counts as defeat
    pub fn evaluate_end(&self) -> Option<Endstate> {
        let allies_down = self.side_wiped(Side::Ally);
        let enemies_down = self.side_wiped(Side::Enemy);
        match (allies_down, enemies_down) {
            (true, _) => Some(Endstate::Defeat),
            (false, true) => Some(Endstate::Victory),
            (false, false) => None,
        }
    }

    fn side_wiped(&self, side: Side) -> bool {
        let mut members = self.roster.side_members(side).peekable();
        members.peek().is_some() && members.all(|c| c.is_incapacitated(&self.constants.status))
    }

    pub fn flee(&mut self) -> Result<()> {
        self.ensure_active()?;
        self.finish(Endstate::Flee);
        Ok(())
    }

    /// Leave `Active`. Victory and defeat reset every combatant.
    pub fn finish(&mut self, endstate: Endstate) {
        if !self.is_active() {
            return;
        }
        if endstate.resets_combatants() {
            for combatant in self.roster.iter_mut() {
                combatant.reset_after_encounter();
            }
        }
        self.phase = Phase::Inactive;
        self.endstate = Some(endstate);

        info!(
            target: "encounter::state",
            ?endstate,
            rounds = self.round,
            "Encounter closed"
        );
        self.bus.publish(Notification::EncounterClosed {
            endstate,
            rounds: self.round,
        });
    }

    pub fn into_outcome(self) -> EncounterOutcome {
        EncounterOutcome {
            // An encounter dropped before closing counts as fled
            endstate: self.endstate.unwrap_or(Endstate::Flee),
            kind: self.kind,
            area: self.area,
            rounds: self.round,
            combatants: self.roster.into_combatants(),
        }
    }

    // ---- action selection ----

    fn active_entry(&self, id: EntryId) -> Result<&crate::turn::TurnEntry> {
        let entry = self
            .scheduler
            .get(id)
            .ok_or(EncounterError::UnknownEntry(id))?;
        if !entry.is_active || entry.is_completed {
            return Err(EncounterError::EntryNotActive(id));
        }
        Ok(entry)
    }

    /// Spend one action slot of the active entry (e.g. the world reporting movement)
    pub fn consume_action(&mut self, id: EntryId, slot: ActionSlot) -> Result<()> {
        self.ensure_active()?;
        self.active_entry(id)?;
        let consumed = self
            .scheduler
            .get_mut(id)
            .map_or(false, |e| e.actions.consume(slot));
        if consumed {
            Ok(())
        } else {
            Err(EncounterError::SlotSpent(slot))
        }
    }

    /// Validate and pay for a skill, then resolve it or hand back a hitbox to place
    pub fn use_skill(
        &mut self,
        id: EntryId,
        skill_id: &str,
        targets: Vec<CombatantId>,
    ) -> Result<SkillUse> {
        self.ensure_active()?;
        let entry = self.active_entry(id)?;
        let user_id = entry.combatant;
        let actions = entry.actions;

        let user = self.roster.require(user_id)?;
        let skill = user
            .skill(skill_id)
            .cloned()
            .ok_or_else(|| EncounterError::UnknownSkill {
                combatant: user_id,
                skill: skill_id.to_string(),
            })?;
        if !actions.is_available(skill.slot) {
            return Err(EncounterError::SlotSpent(skill.slot));
        }
        let rounds = user.cooldown(&skill.id);
        if rounds > 0 {
            return Err(EncounterError::OnCooldown {
                skill: skill.id.clone(),
                rounds,
            });
        }
        if user.stats.mp() < skill.mp_cost {
            return Err(EncounterError::InsufficientMp {
                needed: skill.mp_cost,
                available: user.stats.mp(),
            });
        }
        for target in &targets {
            self.roster.require(*target)?;
        }

        let user = self.roster.require_mut(user_id)?;
        user.stats.spend_mp(skill.mp_cost);
        user.start_cooldown(&skill);
        if let Some(entry) = self.scheduler.get_mut(id) {
            entry.actions.consume(skill.slot);
        }
        debug!(
            target: "encounter::state",
            user = %user_id,
            skill = %skill.id,
            targets = targets.len(),
            "Skill used"
        );

        let timing = skill.timing;
        match timing {
            None => Ok(SkillUse::Resolved(self.execute_skill(user_id, &skill, &targets))),
            Some(timing) => Ok(SkillUse::Deferred {
                user: user_id,
                skill,
                targets,
                timing,
            }),
        }
    }

    /// Land a skill's hit on every target, then run its effect
    pub fn execute_skill(
        &mut self,
        user: CombatantId,
        skill: &Skill,
        targets: &[CombatantId],
    ) -> Vec<HitOutcome> {
        let mut outcomes = Vec::with_capacity(targets.len());
        for &target in targets {
            match self.resolve_hit_at(Some(user), &skill.hit, target, 0) {
                Ok(outcome) => outcomes.push(outcome),
                Err(err) => warn!(
                    target: "encounter::state",
                    skill = %skill.id,
                    %target,
                    error = %err,
                    "Skill hit failed"
                ),
            }
        }
        if let Some(effect) = skill.effect() {
            let commands = effect(user, targets);
            self.run_commands(commands, 1);
        }
        outcomes
    }

    pub fn grant_priority(&mut self, side: Side) -> Result<usize> {
        self.ensure_active()?;
        Ok(self.scheduler.grant_priority(side))
    }

    pub fn revoke_priority(&mut self, side: Side) -> Result<usize> {
        self.ensure_active()?;
        Ok(self.scheduler.revoke_priority(side))
    }

    /// Take a combatant out of the turn order for the rest of the encounter
    pub fn withdraw(&mut self, combatant: CombatantId) -> Result<usize> {
        self.ensure_active()?;
        self.roster.withdraw(combatant)?;
        let removed = self.scheduler.withdraw(combatant);
        debug!(target: "encounter::state", %combatant, removed, "Combatant withdrawn");
        Ok(removed)
    }

    // ---- resolution ----

    pub fn resolve_hit(
        &mut self,
        attacker: Option<CombatantId>,
        hit: &Arc<Hit>,
        defender: CombatantId,
    ) -> Result<HitOutcome> {
        self.ensure_active()?;
        hit.validate()?;
        self.resolve_hit_at(attacker, hit, defender, 0)
    }

    pub fn apply_status(
        &mut self,
        target: CombatantId,
        status: &StatusId,
        stack: StatusStack,
        count: u32,
    ) -> Result<ApplyOutcome> {
        self.ensure_active()?;
        let definition = self
            .catalog
            .get(status)
            .cloned()
            .ok_or_else(|| EncounterError::UnknownStatus(status.clone()))?;
        self.apply_status_at(target, &definition, stack, count, 0)
    }

    pub fn remove_status(&mut self, target: CombatantId, status: &StatusId) -> Result<bool> {
        self.ensure_active()?;
        self.remove_status_at(target, status, 0)
    }

    /// Raise on one combatant, then settle any HP its hooks wrote directly
    fn raise_on(
        &mut self,
        id: CombatantId,
        kind: EventKind,
        event: &mut EventBundle<'_>,
        depth: u32,
    ) -> Vec<HookCommand> {
        let (before, commands) = match self.roster.get_mut(id) {
            Some(combatant) => {
                let before = combatant.stats.hp();
                (before, combatant.raise(kind, event))
            }
            None => return Vec::new(),
        };
        self.settle_hp(id, before, depth);
        commands
    }

    fn raise_all(&mut self, kind: EventKind) {
        let round = self.round;
        for id in self.roster.active_ids() {
            let commands = self.raise_on(id, kind, &mut EventBundle::Round { round }, 0);
            self.run_commands(commands, 1);
        }
    }

    /// Run the incapacitation and revival checks for HP that changed
    /// outside of a hit or an `AdjustHp` command
    fn settle_hp(&mut self, id: CombatantId, before: i64, depth: u32) {
        let after = match self.roster.get(id) {
            Some(combatant) => combatant.stats.hp(),
            None => return,
        };
        if after != before {
            self.after_hp_change(id, before, after, None, depth + 1);
        }
    }

    /// Full hit pipeline with hooks at every phase boundary
    fn resolve_hit_at(
        &mut self,
        attacker: Option<CombatantId>,
        hit: &Arc<Hit>,
        defender: CombatantId,
        depth: u32,
    ) -> Result<HitOutcome> {
        self.roster.require(defender)?;
        if let Some(id) = attacker {
            self.roster.require(id)?;
        }

        let mut commands = Vec::new();
        {
            let mut event = EventBundle::Attack {
                attacker,
                defender,
                hit: hit.as_ref(),
                outcome: None,
            };
            if let Some(id) = attacker {
                commands.extend(self.raise_on(id, EventKind::BeforeAttack, &mut event, depth));
            }
            commands.extend(self.raise_on(defender, EventKind::BeforeDefend, &mut event, depth));
        }

        let mut modifiers = Vec::new();
        {
            let mut event = EventBundle::Modifiers {
                attacker,
                defender,
                hit: hit.as_ref(),
                modifiers: &mut modifiers,
            };
            if let Some(id) = attacker {
                let kind = EventKind::CollectAttackerModifiers;
                commands.extend(self.raise_on(id, kind, &mut event, depth));
            }
            let kind = EventKind::CollectDefenderModifiers;
            commands.extend(self.raise_on(defender, kind, &mut event, depth));
        }

        let calculation = {
            let defender_ref = self.roster.require(defender)?;
            let attacker_ref = attacker.and_then(|id| self.roster.get(id));
            calculate_hit(
                &HitRequest::new(attacker_ref, hit, defender_ref),
                modifiers,
                &self.constants.damage,
                &mut self.rng,
            )
        };
        let outcome = commit_hit(calculation, self.roster.require_mut(defender)?);

        debug!(
            target: "encounter::state",
            attacker = ?attacker,
            %defender,
            damage = outcome.calculation.damage,
            hp = outcome.hp_after,
            "Hit resolved"
        );
        self.bus.publish(Notification::HitExecuted {
            attacker,
            defender,
            damage: outcome.calculation.damage,
            hp_after: outcome.hp_after,
        });

        for id in &outcome.calculation.statuses {
            let definition = match self.catalog.get(id) {
                Some(definition) => Arc::clone(definition),
                None => {
                    warn!(
                        target: "encounter::state",
                        status = %id,
                        "Rolled status is not in the catalog"
                    );
                    continue;
                }
            };
            let mut stack = definition.default_stack().with_source(Arc::clone(hit));
            if let Some(attacker) = attacker {
                stack = stack.from_inflicter(attacker);
            }
            if let Err(err) = self.apply_status_at(defender, &definition, stack, 1, depth) {
                warn!(
                    target: "encounter::state",
                    status = %id,
                    error = %err,
                    "Failed to apply rolled status"
                );
            }
        }

        self.after_hp_change(defender, outcome.hp_before, outcome.hp_after, attacker, depth);

        {
            let mut event = EventBundle::Attack {
                attacker,
                defender,
                hit: hit.as_ref(),
                outcome: Some(&outcome),
            };
            if let Some(id) = attacker {
                commands.extend(self.raise_on(id, EventKind::AfterAttack, &mut event, depth));
            }
            commands.extend(self.raise_on(defender, EventKind::AfterDefend, &mut event, depth));
        }

        self.run_commands(commands, depth + 1);
        Ok(outcome)
    }

    fn apply_status_at(
        &mut self,
        target: CombatantId,
        definition: &Arc<StatusDefinition>,
        stack: StatusStack,
        count: u32,
        depth: u32,
    ) -> Result<ApplyOutcome> {
        let combatant = self.roster.require_mut(target)?;
        let hp_before = combatant.stats.hp();
        let (outcome, commands) = combatant.apply_status(definition, stack, count);
        let stacks = combatant.statuses.stack_count(&definition.id);

        if outcome != ApplyOutcome::Refused {
            self.bus.publish(Notification::StatusApplied {
                target,
                status: definition.id.clone(),
                stacks,
            });
        }
        self.settle_hp(target, hp_before, depth);
        self.run_commands(commands, depth + 1);
        Ok(outcome)
    }

    fn remove_status_at(
        &mut self,
        target: CombatantId,
        status: &StatusId,
        depth: u32,
    ) -> Result<bool> {
        let combatant = self.roster.require_mut(target)?;
        let hp_before = combatant.stats.hp();
        let commands = match combatant.remove_status(status) {
            Some(commands) => commands,
            None => return Ok(false),
        };
        self.bus.publish(Notification::StatusRemoved {
            target,
            status: status.clone(),
        });
        self.settle_hp(target, hp_before, depth);
        self.run_commands(commands, depth + 1);
        Ok(true)
    }

    fn adjust_hp_at(&mut self, target: CombatantId, damage: i64, depth: u32) -> Result<()> {
        let stats = &mut self.roster.require_mut(target)?.stats;
        let before = stats.hp();
        stats.apply_damage(damage);
        let after = stats.hp();
        self.after_hp_change(target, before, after, None, depth);
        Ok(())
    }

    fn after_hp_change(
        &mut self,
        target: CombatantId,
        before: i64,
        after: i64,
        by: Option<CombatantId>,
        depth: u32,
    ) {
        if depth > self.constants.status.max_hook_chain_depth {
            warn!(
                target: "encounter::state",
                %target,
                depth,
                "Hook chain too deep, skipping HP transition"
            );
            return;
        }
        if before > 0 && after == 0 {
            self.incapacitate(target, by, depth);
        } else if before == 0 && after > 0 {
            self.revive(target, depth);
        }
    }

    fn incapacitate(&mut self, target: CombatantId, by: Option<CombatantId>, depth: u32) {
        let definition = match self.catalog.get(&self.constants.status.incapacitation) {
            Some(definition) => Arc::clone(definition),
            None => {
                debug_assert!(false, "incapacitation status missing from catalog");
                return;
            }
        };
        let mut stack = StatusStack::permanent();
        if let Some(by) = by {
            stack = stack.from_inflicter(by);
        }
        if let Err(err) = self.apply_status_at(target, &definition, stack, 1, depth) {
            warn!(target: "encounter::state", %target, error = %err, "Failed to incapacitate");
            return;
        }

        let mut event = EventBundle::Incapacitation { by };
        let commands = self.raise_on(target, EventKind::Incapacitation, &mut event, depth);
        debug!(target: "encounter::state", %target, by = ?by, "Combatant incapacitated");
        self.bus.publish(Notification::Incapacitated { combatant: target });
        self.run_commands(commands, depth + 1);
    }

    fn revive(&mut self, target: CombatantId, depth: u32) {
        let id = self.constants.status.incapacitation.clone();
        match self.remove_status_at(target, &id, depth) {
            Ok(true) => {
                debug!(target: "encounter::state", %target, "Combatant revived");
                self.bus.publish(Notification::Revived { combatant: target });
            }
            Ok(false) => {}
            Err(err) => {
                warn!(target: "encounter::state", %target, error = %err, "Failed to revive")
            }
        }
    }

    /// Execute deferred hook commands, dropping chains past the depth limit
    fn run_commands(&mut self, commands: Vec<HookCommand>, depth: u32) {
        if commands.is_empty() {
            return;
        }
        if depth > self.constants.status.max_hook_chain_depth {
            warn!(
                target: "encounter::state",
                depth,
                dropped = commands.len(),
                "Hook chain too deep, dropping commands"
            );
            return;
        }

        for command in commands {
            let result = match command {
                HookCommand::AdjustHp { target, damage } => {
                    self.adjust_hp_at(target, damage, depth)
                }
                HookCommand::ResolveHit {
                    attacker,
                    hit,
                    defender,
                } => self.resolve_hit_at(attacker, &hit, defender, depth).map(|_| ()),
                HookCommand::ApplyStatus {
                    target,
                    status,
                    stack,
                } => self.apply_status_at(target, &status, stack, 1, depth).map(|_| ()),
                HookCommand::RemoveStatus { target, id } => {
                    self.remove_status_at(target, &id, depth).map(|_| ())
                }
            };
            if let Err(err) = result {
                warn!(target: "encounter::state", error = %err, "Hook command failed");
            }
        }
    }

    // ---- queries ----

    pub fn snapshot(&self) -> EncounterSnapshot {
        let status_constants = &self.constants.status;
        EncounterSnapshot {
            kind: self.kind,
            area: self.area.clone(),
            round: self.round,
            phase: self.phase,
            endstate: self.endstate,
            active_entry: self.scheduler.active().map(|e| e.id),
            order: self.scheduler.entries().to_vec(),
            combatants: self
                .roster
                .iter()
                .map(|c| CombatantSnapshot {
                    id: c.id,
                    name: c.name.clone(),
                    side: c.side,
                    hp: c.stats.hp(),
                    max_hp: c.stats.max_hp,
                    mp: c.stats.mp(),
                    max_mp: c.stats.max_mp,
                    statuses: c
                        .statuses
                        .iter()
                        .map(|a| (a.definition.id.clone(), a.stacks.len()))
                        .collect(),
                    top_aggro: c.aggro.top_shares(),
                    incapacitated: c.is_incapacitated(status_constants),
                    withdrawn: self.roster.is_withdrawn(c.id),
                })
                .collect(),
        }
    }
}
