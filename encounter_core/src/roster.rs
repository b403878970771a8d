//! Combatants owned by a running encounter

use crate::{EncounterError, Result};
use combat_core::Combatant;
use combat_types::{CombatantId, Side};
use std::collections::{BTreeMap, BTreeSet};

/// Every combatant of an encounter, iterated in id order
///
/// Withdrawn combatants stay in the roster (they are handed back when the
/// encounter closes) but no longer receive events or count towards the end
/// condition.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    combatants: BTreeMap<CombatantId, Combatant>,
    withdrawn: BTreeSet<CombatantId>,
}

impl Roster {
    pub fn new(combatants: Vec<Combatant>) -> Result<Self> {
        let mut roster = Roster::default();
        for combatant in combatants {
            let id = combatant.id;
            if roster.combatants.insert(id, combatant).is_some() {
                return Err(EncounterError::DuplicateCombatant(id));
            }
        }
        Ok(roster)
    }

    pub fn get(&self, id: CombatantId) -> Option<&Combatant> {
        self.combatants.get(&id)
    }

    pub fn get_mut(&mut self, id: CombatantId) -> Option<&mut Combatant> {
        self.combatants.get_mut(&id)
    }

    pub fn require(&self, id: CombatantId) -> Result<&Combatant> {
        self.get(id).ok_or(EncounterError::UnknownCombatant(id))
    }

    pub fn require_mut(&mut self, id: CombatantId) -> Result<&mut Combatant> {
        self.get_mut(id).ok_or(EncounterError::UnknownCombatant(id))
    }

    pub fn contains(&self, id: CombatantId) -> bool {
        self.combatants.contains_key(&id)
    }

    /// Ids of combatants still taking part, in id order
    pub fn active_ids(&self) -> Vec<CombatantId> {
        self.combatants
            .keys()
            .filter(|id| !self.withdrawn.contains(id))
            .copied()
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Combatant> {
        self.combatants.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Combatant> {
        self.combatants.values_mut()
    }

    /// Combatants of `side` still taking part
    pub fn side_members(&self, side: Side) -> impl Iterator<Item = &Combatant> {
        self.combatants
            .values()
            .filter(move |c| c.side == side && !self.withdrawn.contains(&c.id))
    }

    pub fn withdraw(&mut self, id: CombatantId) -> Result<bool> {
        if !self.contains(id) {
            return Err(EncounterError::UnknownCombatant(id));
        }
        Ok(self.withdrawn.insert(id))
    }

    pub fn is_withdrawn(&self, id: CombatantId) -> bool {
        self.withdrawn.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.combatants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.combatants.is_empty()
    }

    pub fn into_combatants(self) -> Vec<Combatant> {
        self.combatants.into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use combat_core::StatBlock;

    fn combatant(id: u32, side: Side) -> Combatant {
        Combatant::new(CombatantId(id), format!("c{}", id), side, StatBlock::new(10, 0))
    }

    #[test]
    fn test_rejects_duplicate_ids() {
        let result = Roster::new(vec![combatant(1, Side::Ally), combatant(1, Side::Enemy)]);
        assert!(matches!(result, Err(EncounterError::DuplicateCombatant(CombatantId(1)))));
    }

    #[test]
    fn test_withdrawn_leave_side() {
        let mut roster = Roster::new(vec![
            combatant(1, Side::Ally),
            combatant(2, Side::Enemy),
            combatant(3, Side::Enemy),
        ])
        .unwrap();

        assert!(roster.withdraw(CombatantId(2)).unwrap());
        assert!(!roster.withdraw(CombatantId(2)).unwrap());
        assert!(roster.withdraw(CombatantId(9)).is_err());

        assert_eq!(roster.side_members(Side::Enemy).count(), 1);
        assert_eq!(roster.active_ids(), vec![CombatantId(1), CombatantId(3)]);
        assert_eq!(roster.into_combatants().len(), 3);
    }
}
