//! Context handed to a hook callback

use super::{EventBundle, HookCommand, HookOwner};
use crate::stat_block::StatBlock;
use crate::status::{StatusRegistry, StatusStack};
use combat_types::{CombatantId, EventKind, Side};

/// Everything a hook may see or touch while it runs
///
/// `stats` belongs to the combatant the hook is installed on. Effects on
/// anyone else go through [`HookContext::push`].
pub struct HookContext<'a, 'b> {
    pub kind: EventKind,
    pub owner: CombatantId,
    pub side: Side,
    pub stats: &'a mut StatBlock,
    pub statuses: &'a StatusRegistry,
    pub event: &'a mut EventBundle<'b>,
    /// What installed the running hook
    pub source: &'a HookOwner,
    pub(super) commands: &'a mut Vec<HookCommand>,
}

impl HookContext<'_, '_> {
    /// Queue a command for the encounter to run after this raise
    pub fn push(&mut self, command: HookCommand) {
        self.commands.push(command);
    }

    /// Stacks of the status that installed the running hook (empty for innate hooks)
    pub fn stacks(&self) -> &[StatusStack] {
        match self.source {
            HookOwner::Status(id) => self.statuses.stacks(id),
            HookOwner::Innate => &[],
        }
    }
}
