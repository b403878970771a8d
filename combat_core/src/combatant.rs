//! Combatant - a data-composed participant of an encounter

use crate::aggro::AggroTracker;
use crate::config::StatusConstants;
use crate::hit::Skill;
use crate::hook::{EventBundle, HookCommand, HookDefinition, HookOwner, HookRegistry, HookTarget};
use crate::stat_block::StatBlock;
use crate::status::{ApplyOutcome, StatusDefinition, StatusRegistry, StatusStack};
use combat_types::{CombatantId, EventKind, Side, StatusId};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Stat block plus the per-combatant aggro, status and hook state
///
/// Combatants are never destroyed mid-encounter; reaching 0 HP is expressed
/// through the incapacitation status.
#[derive(Debug, Clone)]
pub struct Combatant {
    pub id: CombatantId,
    pub name: String,
    pub side: Side,
    pub stats: StatBlock,
    pub aggro: AggroTracker,
    pub statuses: StatusRegistry,
    pub hooks: HookRegistry,
    skills: Vec<Arc<Skill>>,
    /// Rounds left per skill id
    cooldowns: BTreeMap<String, u32>,
}

impl Combatant {
    pub fn new(id: CombatantId, name: impl Into<String>, side: Side, stats: StatBlock) -> Self {
        Combatant {
            id,
            name: name.into(),
            side,
            stats,
            aggro: AggroTracker::new(),
            statuses: StatusRegistry::new(),
            hooks: HookRegistry::new(),
            skills: Vec::new(),
            cooldowns: BTreeMap::new(),
        }
    }

    pub fn with_skill(mut self, skill: Arc<Skill>) -> Self {
        self.skills.push(skill);
        self
    }

    /// Install a hook that lives as long as the combatant
    pub fn with_hook(mut self, hook: HookDefinition) -> Self {
        self.hooks.install(HookOwner::Innate, hook);
        self
    }

    pub fn with_aggro(mut self, aggro: AggroTracker) -> Self {
        self.aggro = aggro;
        self
    }

    pub fn skills(&self) -> &[Arc<Skill>] {
        &self.skills
    }

    pub fn skill(&self, id: &str) -> Option<&Arc<Skill>> {
        self.skills.iter().find(|s| s.id == id)
    }

    // ---- hooks ----

    /// Raise `kind` on every hook installed on this combatant
    pub fn raise(&mut self, kind: EventKind, event: &mut EventBundle<'_>) -> Vec<HookCommand> {
        self.raise_for(kind, event, None)
    }

    fn raise_for(
        &mut self,
        kind: EventKind,
        event: &mut EventBundle<'_>,
        only: Option<&HookOwner>,
    ) -> Vec<HookCommand> {
        let target = HookTarget {
            owner: self.id,
            side: self.side,
            stats: &mut self.stats,
            statuses: &self.statuses,
        };
        self.hooks.raise(kind, target, event, only)
    }

    // ---- statuses ----

    pub fn has_status(&self, id: &StatusId) -> bool {
        self.statuses.contains(id)
    }

    /// Whether any active status prevents acting
    pub fn is_blocked(&self, constants: &StatusConstants) -> bool {
        self.statuses.ids().iter().any(|id| constants.is_blocking(id))
    }

    pub fn is_incapacitated(&self, constants: &StatusConstants) -> bool {
        self.statuses.contains(&constants.incapacitation)
    }

    /// Apply `count` stacks of a status
    ///
    /// Hooks are installed on first application. The status's own `OnApply`
    /// hooks fire on every accepted application, followed by `StatusApplied`
    /// on all hooks.
    pub fn apply_status(
        &mut self,
        definition: &Arc<StatusDefinition>,
        stack: StatusStack,
        count: u32,
    ) -> (ApplyOutcome, Vec<HookCommand>) {
        let inflicter = stack.inflicter;
        let outcome = self.statuses.insert(definition, stack, count);
        let owner = HookOwner::Status(definition.id.clone());

        match outcome {
            ApplyOutcome::Refused => {
                debug!(
                    target: "combat::status",
                    combatant = %self.id,
                    status = %definition.id,
                    "Status already present and not stackable"
                );
                return (outcome, Vec::new());
            }
            ApplyOutcome::Applied => {
                for hook in definition.hooks() {
                    self.hooks.install(owner.clone(), hook.clone());
                }
            }
            ApplyOutcome::Stacked(_) => {}
        }

        let stacks = self.statuses.stack_count(&definition.id);
        let mut event = EventBundle::Status {
            id: &definition.id,
            stacks,
            inflicter,
        };
        let mut commands = self.raise_for(EventKind::OnApply, &mut event, Some(&owner));
        commands.extend(self.raise(EventKind::StatusApplied, &mut event));

        debug!(
            target: "combat::status",
            combatant = %self.id,
            status = %definition.id,
            stacks,
            "Status applied"
        );
        (outcome, commands)
    }

    /// Remove a status entirely. Returns `None` if it was not active.
    pub fn remove_status(&mut self, id: &StatusId) -> Option<Vec<HookCommand>> {
        let (stacks, inflicter) = {
            let active = self.statuses.get(id)?;
            (
                active.stacks.len(),
                active.stacks.first().and_then(|s| s.inflicter),
            )
        };
        let owner = HookOwner::Status(id.clone());

        let mut event = EventBundle::Status {
            id,
            stacks,
            inflicter,
        };
        let mut commands = self.raise_for(EventKind::OnRemove, &mut event, Some(&owner));
        self.hooks.uninstall(&owner);
        self.statuses.remove(id);

        let mut event = EventBundle::Status {
            id,
            stacks: 0,
            inflicter,
        };
        commands.extend(self.raise(EventKind::StatusRemoved, &mut event));

        debug!(target: "combat::status", combatant = %self.id, status = %id, "Status removed");
        Some(commands)
    }

    /// Count status durations down one round, removing statuses that ran out
    pub fn tick_statuses(&mut self) -> Vec<HookCommand> {
        let expired = self.statuses.tick();
        expired
            .iter()
            .filter_map(|id| self.remove_status(id))
            .flatten()
            .collect()
    }

    pub fn clear_statuses(&mut self) -> Vec<HookCommand> {
        self.statuses
            .ids()
            .iter()
            .filter_map(|id| self.remove_status(id))
            .flatten()
            .collect()
    }

    // ---- cooldowns ----

    pub fn cooldown(&self, skill_id: &str) -> u32 {
        self.cooldowns.get(skill_id).copied().unwrap_or(0)
    }

    pub fn start_cooldown(&mut self, skill: &Skill) {
        if skill.cooldown > 0 {
            self.cooldowns.insert(skill.id.clone(), skill.cooldown);
        }
    }

    pub fn tick_cooldowns(&mut self) {
        self.cooldowns.retain(|_, rounds| {
            *rounds = rounds.saturating_sub(1);
            *rounds > 0
        });
    }

    pub fn reset_cooldowns(&mut self) {
        self.cooldowns.clear();
    }

    /// Post-encounter reset after victory or defeat
    ///
    /// Statuses are cleared (hook commands from `OnRemove` are discarded),
    /// cooldowns reset, MP refilled and aggro forgotten. HP is left as is.
    pub fn reset_after_encounter(&mut self) {
        let discarded = self.clear_statuses();
        if !discarded.is_empty() {
            debug!(
                target: "combat::status",
                combatant = %self.id,
                count = discarded.len(),
                "Discarding hook commands raised during reset"
            );
        }
        self.reset_cooldowns();
        self.stats.restore_resources();
        self.aggro.clear();
    }
}
