//! Hits and skills - immutable damage/heal/status definitions

mod skill;

pub use skill::{HitboxTiming, Skill, SkillEffectFn};

use crate::ContentError;
use combat_types::{AttackAttributes, StatusId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Damage/heal definition used by a skill or a damage-over-time tick
///
/// A negative `modifier` heals. Status chances are percentages in `[0, 100]`
/// and are rolled in id order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    pub modifier: f64,
    #[serde(default)]
    pub aggro_modifier: f64,
    pub attributes: AttackAttributes,
    #[serde(default)]
    pub statuses: BTreeMap<StatusId, f64>,
}

impl Hit {
    pub fn new(modifier: f64, attributes: AttackAttributes) -> Self {
        Hit {
            modifier,
            aggro_modifier: 0.0,
            attributes,
            statuses: BTreeMap::new(),
        }
    }

    pub fn with_aggro(mut self, aggro_modifier: f64) -> Self {
        self.aggro_modifier = aggro_modifier;
        self
    }

    pub fn with_status(mut self, id: impl Into<StatusId>, chance: f64) -> Self {
        self.statuses.insert(id.into(), chance);
        self
    }

    pub fn is_heal(&self) -> bool {
        self.modifier < 0.0
    }

    pub fn validate(&self) -> Result<(), ContentError> {
        if !self.modifier.is_finite() || !self.aggro_modifier.is_finite() {
            return Err(ContentError::InvalidHit(
                "modifiers must be finite".to_string(),
            ));
        }
        for (id, chance) in &self.statuses {
            if !(0.0..=100.0).contains(chance) {
                return Err(ContentError::InvalidHit(format!(
                    "chance for '{}' out of range: {}",
                    id, chance
                )));
            }
        }
        Ok(())
    }
}

/// Adjustment to a damage value, applied in collection order
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DamageModifier {
    Multiplier(f64),
    Flat(i64),
}

impl DamageModifier {
    /// Apply to a damage value, rounding to the nearest integer
    pub fn apply(&self, damage: i64) -> i64 {
        match *self {
            // float -> int casts saturate
            DamageModifier::Multiplier(factor) => (damage as f64 * factor).round() as i64,
            DamageModifier::Flat(amount) => damage.saturating_add(amount),
        }
    }
}
