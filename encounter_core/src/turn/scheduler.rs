//! Priority-aware turn order for one encounter

use super::entry::{EntryId, TurnEntry};
use combat_types::{CombatantId, Side};
use std::cmp::Ordering;
use tracing::debug;

/// Ordered turn entries of an encounter
///
/// Sort order:
/// 1. Incomplete entries before completed ones
/// 2. Priority entries before regular ones
/// 3. Higher speed first
/// 4. Side declaration order, then combatant id, then creation order
#[derive(Debug, Clone, Default)]
pub struct TurnScheduler {
    entries: Vec<TurnEntry>,
    next_id: u64,
}

impl TurnScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// One regular entry per combatant, sorted
    pub fn build_initial_order<I>(combatants: I) -> Self
    where
        I: IntoIterator<Item = (CombatantId, Side, i32)>,
    {
        let mut scheduler = Self::new();
        for (combatant, side, speed) in combatants {
            scheduler.push(combatant, side, speed, false);
        }
        scheduler.sort();
        scheduler
    }

    fn push(
        &mut self,
        combatant: CombatantId,
        side: Side,
        speed: i32,
        is_priority: bool,
    ) -> EntryId {
        let id = EntryId(self.next_id);
        self.next_id += 1;
        self.entries
            .push(TurnEntry::new(id, combatant, side, speed, is_priority));
        id
    }

    /// Add a priority entry for every combatant of `side` lacking one
    ///
    /// Returns the number of entries added.
    pub fn grant_priority(&mut self, side: Side) -> usize {
        let mut candidates: Vec<(CombatantId, i32)> = Vec::new();
        for entry in self.entries.iter().filter(|e| e.side == side) {
            if !candidates.iter().any(|(id, _)| *id == entry.combatant) {
                candidates.push((entry.combatant, entry.speed));
            }
        }
        candidates.retain(|(id, _)| !self.has_priority(*id));
        candidates.sort_by_key(|(id, _)| *id);

        for &(combatant, speed) in &candidates {
            self.push(combatant, side, speed, true);
        }
        if !candidates.is_empty() {
            self.sort();
        }
        debug!(target: "encounter::turn", %side, added = candidates.len(), "Priority granted");
        candidates.len()
    }

    /// Remove the priority entries of `side`. Returns how many were removed.
    pub fn revoke_priority(&mut self, side: Side) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| !(e.is_priority && e.side == side));
        before - self.entries.len()
    }

    /// Remove every priority entry
    pub fn revoke_all_priority(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| !e.is_priority);
        before - self.entries.len()
    }

    pub fn has_priority(&self, combatant: CombatantId) -> bool {
        self.entries
            .iter()
            .any(|e| e.combatant == combatant && e.is_priority)
    }

    pub fn sort(&mut self) {
        self.entries.sort_by(compare_entries);
    }

    /// Restore every entry's action flags, clear completion and re-sort
    pub fn reset(&mut self) {
        for entry in &mut self.entries {
            entry.reset();
        }
        self.sort();
    }

    /// Refresh the cached speed of a combatant's entries
    pub fn update_speed(&mut self, combatant: CombatantId, speed: i32) {
        for entry in self.entries.iter_mut().filter(|e| e.combatant == combatant) {
            entry.speed = speed;
        }
    }

    /// First entry in order that is neither active nor completed
    pub fn next_pending(&self) -> Option<EntryId> {
        self.entries.iter().find(|e| e.is_pending()).map(|e| e.id)
    }

    pub fn activate(&mut self, id: EntryId) -> bool {
        debug_assert!(
            self.active().map_or(true, |e| e.id == id),
            "another entry is already active"
        );
        match self.get_mut(id) {
            Some(entry) if !entry.is_completed => {
                entry.is_active = true;
                true
            }
            _ => false,
        }
    }

    /// Mark an entry completed. Returns false if it was missing or already completed.
    pub fn complete(&mut self, id: EntryId) -> bool {
        match self.get_mut(id) {
            Some(entry) if !entry.is_completed => {
                entry.is_completed = true;
                true
            }
            _ => false,
        }
    }

    pub fn deactivate(&mut self, id: EntryId) {
        if let Some(entry) = self.get_mut(id) {
            entry.is_active = false;
        }
    }

    /// Remove every entry of a combatant. Returns how many were removed.
    pub fn withdraw(&mut self, combatant: CombatantId) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| e.combatant != combatant);
        before - self.entries.len()
    }

    pub fn active(&self) -> Option<&TurnEntry> {
        self.entries.iter().find(|e| e.is_active)
    }

    pub fn get(&self, id: EntryId) -> Option<&TurnEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn get_mut(&mut self, id: EntryId) -> Option<&mut TurnEntry> {
        self.entries.iter_mut().find(|e| e.id == id)
    }

    pub fn contains(&self, id: EntryId) -> bool {
        self.get(id).is_some()
    }

    pub fn entries(&self) -> &[TurnEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn compare_entries(a: &TurnEntry, b: &TurnEntry) -> Ordering {
    a.is_completed
        .cmp(&b.is_completed)
        .then_with(|| b.is_priority.cmp(&a.is_priority))
        .then_with(|| b.speed.cmp(&a.speed))
        .then_with(|| a.side.cmp(&b.side))
        .then_with(|| a.combatant.cmp(&b.combatant))
        .then_with(|| a.id.cmp(&b.id))
}
