//! Hit calculation and outcome records

use crate::hit::{DamageModifier, Hit};
use combat_types::{CombatantId, StatusId};
use std::sync::Arc;

/// Transient record of one resolution, before it touches the defender
#[derive(Debug, Clone, PartialEq)]
pub struct HitCalculation {
    pub attacker: Option<CombatantId>,
    pub defender: CombatantId,
    pub hit: Arc<Hit>,
    /// Collected hook modifiers followed by elemental resistance multipliers
    pub modifiers: Vec<DamageModifier>,
    /// Statuses whose roll succeeded, in id order
    pub statuses: Vec<StatusId>,
    /// Sign-encoded damage (negative heals)
    pub damage: i64,
    pub aggro: f64,
}

impl HitCalculation {
    pub fn is_heal(&self) -> bool {
        self.damage < 0
    }
}

/// What committing a calculation did to the defender
#[derive(Debug, Clone, PartialEq)]
pub struct HitOutcome {
    pub calculation: HitCalculation,
    pub hp_before: i64,
    pub hp_after: i64,
    /// HP went from above zero to zero
    pub incapacitated: bool,
    /// HP went from zero to above zero
    pub revived: bool,
}

impl HitOutcome {
    /// HP actually lost (positive) or gained (negative) after clamping
    pub fn hp_lost(&self) -> i64 {
        self.hp_before - self.hp_after
    }
}
