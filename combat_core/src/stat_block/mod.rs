//! StatBlock - per-combatant numeric state

use bitflags::bitflags;
use combat_types::{AttackAttributes, Element};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

bitflags! {
    /// Boolean traits of a combatant
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct StatFlags: u32 {
        const FLYING           = 1 << 0;
        const UNDEAD           = 1 << 1;
        const CONSTRUCT        = 1 << 2;
        const BOSS             = 1 << 3;
        const KNOCKBACK_IMMUNE = 1 << 4;
    }
}

/// Numeric state of one combatant
///
/// HP and MP are always kept within `[0, max]`; every mutation goes through
/// the clamping helpers below.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatBlock {
    pub max_hp: i64,
    hp: i64,
    pub max_mp: i64,
    mp: i64,

    pub physical_attack: f64,
    pub physical_defense: f64,
    pub magical_attack: f64,
    pub magical_defense: f64,

    /// Turn order speed (higher acts first)
    pub speed: i32,

    /// Elemental resistance in percent (100 = immune, negative = weakness)
    #[serde(default)]
    pub resistances: HashMap<Element, f64>,

    #[serde(default)]
    pub flags: StatFlags,
}

impl StatBlock {
    /// Create a stat block at full HP and MP
    pub fn new(max_hp: i64, max_mp: i64) -> Self {
        let max_hp = max_hp.max(0);
        let max_mp = max_mp.max(0);
        StatBlock {
            max_hp,
            hp: max_hp,
            max_mp,
            mp: max_mp,
            ..Default::default()
        }
    }

    pub fn with_physical(mut self, attack: f64, defense: f64) -> Self {
        self.physical_attack = attack;
        self.physical_defense = defense;
        self
    }

    pub fn with_magical(mut self, attack: f64, defense: f64) -> Self {
        self.magical_attack = attack;
        self.magical_defense = defense;
        self
    }

    pub fn with_speed(mut self, speed: i32) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_resistance(mut self, element: Element, percent: f64) -> Self {
        self.resistances.insert(element, percent);
        self
    }

    pub fn with_flags(mut self, flags: StatFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn hp(&self) -> i64 {
        self.hp
    }

    pub fn mp(&self) -> i64 {
        self.mp
    }

    /// Set HP directly (clamped)
    pub fn set_hp(&mut self, hp: i64) {
        self.hp = hp.clamp(0, self.max_hp);
    }

    /// Set MP directly (clamped)
    pub fn set_mp(&mut self, mp: i64) {
        self.mp = mp.clamp(0, self.max_mp);
    }

    /// Attack stat used against the given attributes
    pub fn offense(&self, attributes: AttackAttributes) -> f64 {
        if attributes.is_physical() {
            self.physical_attack
        } else {
            self.magical_attack
        }
    }

    /// Defense stat used against the given attributes
    pub fn defense(&self, attributes: AttackAttributes) -> f64 {
        if attributes.is_physical() {
            self.physical_defense
        } else {
            self.magical_defense
        }
    }

    pub fn resistance(&self, element: Element) -> f64 {
        self.resistances.get(&element).copied().unwrap_or(0.0)
    }

    /// Apply sign-encoded damage (negative heals)
    ///
    /// Returns the HP change actually applied, which is negative for damage.
    pub fn apply_damage(&mut self, damage: i64) -> i64 {
        let before = self.hp;
        self.hp = before.saturating_sub(damage).clamp(0, self.max_hp);
        self.hp - before
    }

    /// Spend MP if enough is available
    pub fn spend_mp(&mut self, cost: i64) -> bool {
        if cost < 0 || cost > self.mp {
            return false;
        }
        self.mp -= cost;
        true
    }

    pub fn restore_mp(&mut self, amount: i64) {
        self.set_mp(self.mp.saturating_add(amount));
    }

    /// Refill MP (end of encounter reset)
    pub fn restore_resources(&mut self) {
        self.mp = self.max_mp;
    }

    pub fn is_depleted(&self) -> bool {
        self.hp == 0
    }

    pub fn hp_percent(&self) -> f64 {
        if self.max_hp <= 0 {
            return 0.0;
        }
        self.hp as f64 / self.max_hp as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_new_starts_full() {
        let stats = StatBlock::new(120, 30);
        assert_eq!(stats.hp(), 120);
        assert_eq!(stats.mp(), 30);
        assert!(!stats.is_depleted());
    }

    #[test]
    fn test_damage_clamps_at_zero() {
        let mut stats = StatBlock::new(50, 0);
        let applied = stats.apply_damage(80);
        assert_eq!(applied, -50);
        assert_eq!(stats.hp(), 0);
        assert!(stats.is_depleted());
    }

    #[test]
    fn test_heal_clamps_at_max() {
        let mut stats = StatBlock::new(50, 0);
        stats.apply_damage(10);
        let applied = stats.apply_damage(-100);
        assert_eq!(applied, 10);
        assert_eq!(stats.hp(), 50);
    }

    #[test]
    fn test_stat_pair_selection() {
        let stats = StatBlock::new(10, 0)
            .with_physical(10.0, 2.0)
            .with_magical(4.0, 8.0);
        assert!((stats.offense(AttackAttributes::PHYSICAL) - 10.0).abs() < f64::EPSILON);
        assert!((stats.defense(AttackAttributes::PHYSICAL) - 2.0).abs() < f64::EPSILON);
        assert!((stats.offense(AttackAttributes::FIRE) - 4.0).abs() < f64::EPSILON);
        assert!((stats.defense(AttackAttributes::MAGICAL) - 8.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_spend_and_restore_mp() {
        let mut stats = StatBlock::new(10, 20);
        assert!(stats.spend_mp(15));
        assert!(!stats.spend_mp(10));
        assert_eq!(stats.mp(), 5);
        stats.restore_resources();
        assert_eq!(stats.mp(), 20);
    }

    proptest! {
        #[test]
        fn hp_stays_within_bounds(
            max_hp in 0i64..10_000,
            hits in prop::collection::vec(-20_000i64..20_000, 0..20),
        ) {
            let mut stats = StatBlock::new(max_hp, 0);
            for damage in hits {
                stats.apply_damage(damage);
                prop_assert!(stats.hp() >= 0);
                prop_assert!(stats.hp() <= stats.max_hp);
            }
        }

        #[test]
        fn mp_stays_within_bounds(
            max_mp in 0i64..500,
            changes in prop::collection::vec(-1_000i64..1_000, 0..20),
        ) {
            let mut stats = StatBlock::new(1, max_mp);
            for change in changes {
                if change < 0 {
                    stats.spend_mp(-change);
                } else {
                    stats.restore_mp(change);
                }
                prop_assert!(stats.mp() >= 0 && stats.mp() <= stats.max_mp);
            }
        }
    }
}
