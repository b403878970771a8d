//! Aggro - threat accumulated against a combatant, keyed by attacker

use crate::config::AggroConstants;
use combat_types::CombatantId;
use std::collections::BTreeMap;

/// Threat shares generated by attackers against one combatant
///
/// Shares are never negative. A share is pruned once it drops under
/// `prune_fraction` of the tracker's total.
#[derive(Debug, Clone)]
pub struct AggroTracker {
    shares: BTreeMap<CombatantId, f64>,
    prune_fraction: f64,
    top_window: f64,
}

impl Default for AggroTracker {
    fn default() -> Self {
        Self::with_constants(&AggroConstants::default())
    }
}

impl AggroTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_constants(constants: &AggroConstants) -> Self {
        AggroTracker {
            shares: BTreeMap::new(),
            prune_fraction: constants.prune_fraction,
            top_window: constants.top_window,
        }
    }

    /// Add threat for an attacker, creating the share if needed
    pub fn insert(&mut self, attacker: CombatantId, amount: f64) {
        if !amount.is_finite() {
            return;
        }
        let share = self.shares.entry(attacker).or_insert(0.0);
        *share = (*share + amount).max(0.0);
    }

    /// Scale an existing share; absent attackers are ignored
    pub fn modify(&mut self, attacker: CombatantId, multiplier: f64) {
        if !multiplier.is_finite() {
            return;
        }
        if let Some(share) = self.shares.get_mut(&attacker) {
            *share = (*share * multiplier).max(0.0);
        }
    }

    /// Remove an attacker's share if it is negligible. Returns true if removed.
    pub fn prune_if_negligible(&mut self, attacker: CombatantId) -> bool {
        let Some(share) = self.shares.get(&attacker).copied() else {
            return false;
        };
        if self.is_negligible(share, self.total()) {
            self.shares.remove(&attacker);
            true
        } else {
            false
        }
    }

    /// Prune every negligible share against the current total
    pub fn prune(&mut self) -> Vec<CombatantId> {
        let total = self.total();
        let removed: Vec<CombatantId> = self
            .shares
            .iter()
            .filter(|(_, share)| self.is_negligible(**share, total))
            .map(|(id, _)| *id)
            .collect();
        for id in &removed {
            self.shares.remove(id);
        }
        removed
    }

    /// Attackers whose share is within `top_window` of the largest share
    pub fn top_shares(&self) -> Vec<CombatantId> {
        let Some(max) = self.shares.values().copied().reduce(f64::max) else {
            return Vec::new();
        };
        let floor = max * (1.0 - self.top_window);
        self.shares
            .iter()
            .filter(|(_, share)| **share >= floor)
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn remove(&mut self, attacker: CombatantId) -> Option<f64> {
        self.shares.remove(&attacker)
    }

    pub fn share(&self, attacker: CombatantId) -> Option<f64> {
        self.shares.get(&attacker).copied()
    }

    pub fn total(&self) -> f64 {
        self.shares.values().sum()
    }

    pub fn len(&self) -> usize {
        self.shares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shares.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (CombatantId, f64)> + '_ {
        self.shares.iter().map(|(id, share)| (*id, *share))
    }

    pub fn clear(&mut self) {
        self.shares.clear();
    }

    fn is_negligible(&self, share: f64, total: f64) -> bool {
        if total <= 0.0 {
            return true;
        }
        share / total < self.prune_fraction
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const A: CombatantId = CombatantId(1);
    const B: CombatantId = CombatantId(2);
    const C: CombatantId = CombatantId(3);

    #[test]
    fn test_insert_accumulates() {
        let mut tracker = AggroTracker::new();
        tracker.insert(A, 2.0);
        tracker.insert(A, 3.0);
        assert_eq!(tracker.share(A), Some(5.0));
    }

    #[test]
    fn test_negligible_share_is_pruned() {
        let mut tracker = AggroTracker::new();
        tracker.insert(A, 1.0);
        tracker.insert(B, 0.01);

        // 0.01 / 1.01 is under 5%
        let removed = tracker.prune();
        assert_eq!(removed, vec![B]);
        assert_eq!(tracker.share(B), None);
        assert_eq!(tracker.share(A), Some(1.0));
    }

    #[test]
    fn test_prune_if_negligible_single() {
        let mut tracker = AggroTracker::new();
        tracker.insert(A, 1.0);
        tracker.insert(B, 0.5);
        assert!(!tracker.prune_if_negligible(B));
        tracker.modify(B, 0.01);
        assert!(tracker.prune_if_negligible(B));
        assert!(!tracker.prune_if_negligible(C));
    }

    #[test]
    fn test_modify_absent_is_noop() {
        let mut tracker = AggroTracker::new();
        tracker.modify(A, 10.0);
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_negative_amounts_floor_at_zero() {
        let mut tracker = AggroTracker::new();
        tracker.insert(A, 1.0);
        tracker.insert(A, -5.0);
        assert_eq!(tracker.share(A), Some(0.0));
        tracker.insert(B, 1.0);
        tracker.modify(B, -2.0);
        assert_eq!(tracker.share(B), Some(0.0));
    }

    #[test]
    fn test_top_shares_within_window() {
        let mut tracker = AggroTracker::new();
        tracker.insert(A, 100.0);
        tracker.insert(B, 91.0);
        tracker.insert(C, 89.0);

        assert_eq!(tracker.top_shares(), vec![A, B]);
    }

    #[test]
    fn test_top_shares_empty() {
        let tracker = AggroTracker::new();
        assert!(tracker.top_shares().is_empty());
    }

    #[test]
    fn test_custom_thresholds() {
        let mut tracker = AggroTracker::with_constants(&AggroConstants {
            prune_fraction: 0.3,
            top_window: 0.0,
        });
        tracker.insert(A, 3.0);
        tracker.insert(B, 2.0);
        tracker.insert(C, 3.0);
        assert_eq!(tracker.top_shares(), vec![A, C]);
        // 2 / 8 = 25% < 30%
        assert_eq!(tracker.prune(), vec![B]);
    }

    proptest! {
        #[test]
        fn shares_never_negative(
            ops in prop::collection::vec((0u32..4, -100.0f64..100.0, any::<bool>()), 0..40),
        ) {
            let mut tracker = AggroTracker::new();
            for (id, value, scale) in ops {
                if scale {
                    tracker.modify(CombatantId(id), value);
                } else {
                    tracker.insert(CombatantId(id), value);
                }
                prop_assert!(tracker.iter().all(|(_, share)| share >= 0.0));
            }
        }

        #[test]
        fn pruned_tracker_has_no_negligible_share(
            amounts in prop::collection::vec(0.0f64..1000.0, 1..10),
        ) {
            let mut tracker = AggroTracker::new();
            for (i, amount) in amounts.iter().enumerate() {
                tracker.insert(CombatantId(i as u32), *amount);
            }
            let total_before = tracker.total();
            tracker.prune();
            for (_, share) in tracker.iter() {
                prop_assert!(share / total_before >= 0.05);
            }
        }
    }
}
