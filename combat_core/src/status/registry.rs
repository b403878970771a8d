//! Per-combatant registry of active statuses

use super::{ActiveStatus, ApplyOutcome, StatusDefinition, StatusStack};
use combat_types::StatusId;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Active statuses of one combatant, iterated in id order
#[derive(Debug, Clone, Default)]
pub struct StatusRegistry {
    active: BTreeMap<StatusId, ActiveStatus>,
}

impl StatusRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `count` stacks of a status
    ///
    /// Hook installation is left to the caller, driven by the returned outcome.
    pub fn insert(
        &mut self,
        definition: &Arc<StatusDefinition>,
        stack: StatusStack,
        count: u32,
    ) -> ApplyOutcome {
        let count = count.max(1) as usize;

        if let Some(active) = self.active.get_mut(&definition.id) {
            if !active.definition.stackable {
                return ApplyOutcome::Refused;
            }
            active
                .stacks
                .extend(std::iter::repeat(stack).take(count));
            return ApplyOutcome::Stacked(active.stacks.len());
        }

        let stacks = if definition.stackable {
            std::iter::repeat(stack).take(count).collect()
        } else {
            vec![stack]
        };
        self.active.insert(
            definition.id.clone(),
            ActiveStatus {
                definition: Arc::clone(definition),
                stacks,
            },
        );
        ApplyOutcome::Applied
    }

    pub fn remove(&mut self, id: &StatusId) -> Option<ActiveStatus> {
        self.active.remove(id)
    }

    pub fn contains(&self, id: &StatusId) -> bool {
        self.active.contains_key(id)
    }

    pub fn get(&self, id: &StatusId) -> Option<&ActiveStatus> {
        self.active.get(id)
    }

    pub fn stacks(&self, id: &StatusId) -> &[StatusStack] {
        self.active
            .get(id)
            .map(|a| a.stacks.as_slice())
            .unwrap_or(&[])
    }

    pub fn stack_count(&self, id: &StatusId) -> usize {
        self.stacks(id).len()
    }

    pub fn ids(&self) -> Vec<StatusId> {
        self.active.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActiveStatus> {
        self.active.values()
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Count every stack down one round, dropping spent stacks
    ///
    /// Returns the statuses left without stacks; they stay registered so the
    /// caller can remove them through the normal path (firing `OnRemove`).
    pub fn tick(&mut self) -> Vec<StatusId> {
        let mut expired = Vec::new();
        for (id, active) in self.active.iter_mut() {
            active.stacks.retain_mut(|stack| !stack.tick());
            if active.stacks.is_empty() {
                expired.push(id.clone());
            }
        }
        expired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use combat_types::{CombatantId, StatusCategory};

    fn poison() -> Arc<StatusDefinition> {
        StatusDefinition::new("poison", StatusCategory::Ailment)
            .stackable(true)
            .build()
            .unwrap()
    }

    fn stun() -> Arc<StatusDefinition> {
        StatusDefinition::new("stun", StatusCategory::Impairment)
            .build()
            .unwrap()
    }

    #[test]
    fn test_stackable_adds_stacks() {
        let mut registry = StatusRegistry::new();
        let poison = poison();
        assert_eq!(
            registry.insert(&poison, StatusStack::new(Some(3)), 1),
            ApplyOutcome::Applied
        );
        assert_eq!(
            registry.insert(&poison, StatusStack::new(Some(3)), 2),
            ApplyOutcome::Stacked(3)
        );
        assert_eq!(registry.stack_count(&StatusId::from("poison")), 3);
    }

    #[test]
    fn test_non_stackable_refuses_duplicate() {
        let mut registry = StatusRegistry::new();
        let stun = stun();
        assert_eq!(
            registry.insert(&stun, StatusStack::new(Some(1)), 3),
            ApplyOutcome::Applied
        );
        assert_eq!(registry.stack_count(&stun.id), 1);
        assert_eq!(
            registry.insert(&stun, StatusStack::new(Some(1)), 1),
            ApplyOutcome::Refused
        );
    }

    #[test]
    fn test_tick_expires_stacks() {
        let mut registry = StatusRegistry::new();
        let poison = poison();
        let stun = stun();
        registry.insert(&poison, StatusStack::new(Some(1)), 1);
        registry.insert(&poison, StatusStack::new(Some(2)), 1);
        registry.insert(&stun, StatusStack::permanent(), 1);

        assert!(registry.tick().is_empty());
        assert_eq!(registry.stack_count(&poison.id), 1);

        assert_eq!(registry.tick(), vec![StatusId::from("poison")]);
        // Expired statuses stay until removed explicitly
        assert!(registry.contains(&poison.id));
        assert!(registry.contains(&stun.id));
    }

    #[test]
    fn test_stack_keeps_inflicter() {
        let mut registry = StatusRegistry::new();
        let poison = poison();
        registry.insert(
            &poison,
            StatusStack::new(Some(2)).from_inflicter(CombatantId(4)),
            1,
        );
        assert_eq!(registry.stacks(&poison.id)[0].inflicter, Some(CombatantId(4)));
        assert!(registry.stacks(&StatusId::from("missing")).is_empty());
    }
}
