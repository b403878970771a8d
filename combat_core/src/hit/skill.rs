use super::Hit;
use crate::hook::HookCommand;
use crate::ContentError;
use combat_types::{ActionSlot, CombatantId};
use std::fmt;
use std::sync::Arc;

/// Extra effect run when a skill lands: `(user, targets) -> commands`
pub type SkillEffectFn = Arc<dyn Fn(CombatantId, &[CombatantId]) -> Vec<HookCommand> + Send + Sync>;

/// Delay/active/linger phases of a placed hitbox, in ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HitboxTiming {
    pub delay_ticks: u32,
    pub active_ticks: u32,
    pub linger_ticks: u32,
}

impl HitboxTiming {
    pub fn new(delay_ticks: u32, active_ticks: u32, linger_ticks: u32) -> Self {
        HitboxTiming {
            delay_ticks,
            active_ticks,
            linger_ticks,
        }
    }

    pub fn total_ticks(&self) -> u32 {
        self.delay_ticks
            .saturating_add(self.active_ticks)
            .saturating_add(self.linger_ticks)
    }
}

/// A usable ability: costs, the slot it spends and the hit it delivers
#[derive(Clone)]
pub struct Skill {
    pub id: String,
    pub name: String,
    pub mp_cost: i64,
    /// Rounds before the skill can be used again
    pub cooldown: u32,
    pub slot: ActionSlot,
    pub hit: Arc<Hit>,
    /// `None` resolves immediately on use
    pub timing: Option<HitboxTiming>,
    effect: Option<SkillEffectFn>,
}

impl Skill {
    pub fn new(id: impl Into<String>, hit: Hit) -> Self {
        let id = id.into();
        Skill {
            name: id.clone(),
            id,
            mp_cost: 0,
            cooldown: 0,
            slot: ActionSlot::Primary,
            hit: Arc::new(hit),
            timing: None,
            effect: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_cost(mut self, mp_cost: i64) -> Self {
        self.mp_cost = mp_cost;
        self
    }

    pub fn with_cooldown(mut self, rounds: u32) -> Self {
        self.cooldown = rounds;
        self
    }

    pub fn with_slot(mut self, slot: ActionSlot) -> Self {
        self.slot = slot;
        self
    }

    pub fn with_timing(mut self, timing: HitboxTiming) -> Self {
        self.timing = Some(timing);
        self
    }

    pub fn with_effect<F>(mut self, effect: F) -> Self
    where
        F: Fn(CombatantId, &[CombatantId]) -> Vec<HookCommand> + Send + Sync + 'static,
    {
        self.effect = Some(Arc::new(effect));
        self
    }

    pub fn effect(&self) -> Option<&SkillEffectFn> {
        self.effect.as_ref()
    }

    /// Check the definition and wrap it for sharing
    pub fn build(self) -> Result<Arc<Self>, ContentError> {
        let invalid = |reason: &str| ContentError::InvalidSkill {
            id: self.id.clone(),
            reason: reason.to_string(),
        };
        if self.id.is_empty() {
            return Err(invalid("empty id"));
        }
        if self.mp_cost < 0 {
            return Err(invalid("negative mp cost"));
        }
        if matches!(self.timing, Some(t) if t.active_ticks == 0) {
            return Err(invalid("hitbox must be active for at least one tick"));
        }
        self.hit.validate()?;
        Ok(Arc::new(self))
    }
}

impl fmt::Debug for Skill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Skill")
            .field("id", &self.id)
            .field("mp_cost", &self.mp_cost)
            .field("cooldown", &self.cooldown)
            .field("slot", &self.slot)
            .field("hit", &self.hit)
            .field("timing", &self.timing)
            .field("has_effect", &self.effect.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use combat_types::AttackAttributes;

    #[test]
    fn test_build_rejects_bad_skills() {
        let hit = || Hit::new(10.0, AttackAttributes::PHYSICAL);
        assert!(Skill::new("", hit()).build().is_err());
        assert!(Skill::new("slash", hit()).with_cost(-1).build().is_err());
        assert!(Skill::new("slam", hit())
            .with_timing(HitboxTiming::new(2, 0, 1))
            .build()
            .is_err());

        let bad_hit = Hit::new(10.0, AttackAttributes::PHYSICAL).with_status("stun", -5.0);
        assert!(matches!(
            Skill::new("bash", bad_hit).build(),
            Err(ContentError::InvalidHit(_))
        ));
    }

    #[test]
    fn test_effect_produces_commands() {
        let skill = Skill::new("drain", Hit::new(5.0, AttackAttributes::DARK))
            .with_effect(|user, _targets| {
                vec![HookCommand::AdjustHp {
                    target: user,
                    damage: -5,
                }]
            })
            .build()
            .unwrap();

        let effect = skill.effect().unwrap();
        let commands = effect(CombatantId(2), &[CombatantId(5)]);
        assert!(matches!(
            commands.as_slice(),
            [HookCommand::AdjustHp { target: CombatantId(2), damage: -5 }]
        ));
        assert_eq!(skill.slot, ActionSlot::Primary);
    }

    #[test]
    fn test_timing_total() {
        assert_eq!(HitboxTiming::new(2, 3, 1).total_ticks(), 6);
    }
}
