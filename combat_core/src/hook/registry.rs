//! Per-combatant hook registry

use std::panic::{self, AssertUnwindSafe};

use super::{EventBundle, HookCommand, HookContext, HookDefinition, HookError, HookOwner};
use crate::stat_block::StatBlock;
use crate::status::StatusRegistry;
use combat_types::{CombatantId, EventKind, Side};
use tracing::{error, trace, warn};

/// A hook together with whatever installed it
#[derive(Debug, Clone)]
pub struct InstalledHook {
    pub owner: HookOwner,
    pub definition: HookDefinition,
}

/// The combatant a raise is running against
pub struct HookTarget<'a> {
    pub owner: CombatantId,
    pub side: Side,
    pub stats: &'a mut StatBlock,
    pub statuses: &'a StatusRegistry,
}

/// Hooks installed on one combatant
///
/// Invocation order between hooks of the same kind is not part of the
/// contract. A hook that errors or panics is logged and treated as a no-op:
/// its queued commands are dropped and the owner's stats are restored.
#[derive(Debug, Clone, Default)]
pub struct HookRegistry {
    hooks: Vec<InstalledHook>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn install(&mut self, owner: HookOwner, definition: HookDefinition) {
        self.hooks.push(InstalledHook { owner, definition });
    }

    /// Uninstall every hook the owner installed. Returns how many were removed.
    pub fn uninstall(&mut self, owner: &HookOwner) -> usize {
        let before = self.hooks.len();
        self.hooks.retain(|h| h.owner != *owner);
        before - self.hooks.len()
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &InstalledHook> {
        self.hooks.iter()
    }

    /// Number of installed hooks listening to `kind`
    pub fn count_for(&self, kind: EventKind) -> usize {
        self.hooks.iter().filter(|h| h.definition.kind == kind).count()
    }

    /// Invoke every hook tagged `kind`, optionally only those installed by `only`
    pub fn raise(
        &self,
        kind: EventKind,
        mut target: HookTarget<'_>,
        event: &mut EventBundle<'_>,
        only: Option<&HookOwner>,
    ) -> Vec<HookCommand> {
        let mut commands = Vec::new();

        for installed in self
            .hooks
            .iter()
            .filter(|h| h.definition.kind == kind)
            .filter(|h| only.map_or(true, |owner| h.owner == *owner))
        {
            let checkpoint = commands.len();
            let stats_before = target.stats.clone();
            let payload_before = event.checkpoint();

            let mut ctx = HookContext {
                kind,
                owner: target.owner,
                side: target.side,
                stats: &mut *target.stats,
                statuses: target.statuses,
                event: &mut *event,
                source: &installed.owner,
                commands: &mut commands,
            };
            let callback = installed.definition.callback();
            let result = panic::catch_unwind(AssertUnwindSafe(|| callback(&mut ctx)))
                .unwrap_or_else(|payload| Err(HookError::Panicked(panic_message(payload))));

            match result {
                Ok(()) => trace!(
                    target: "combat::hooks",
                    hook = %installed.definition.id,
                    kind = %kind,
                    owner = %target.owner,
                    "Hook ran"
                ),
                Err(err) => {
                    commands.truncate(checkpoint);
                    *target.stats = stats_before;
                    event.restore(payload_before);
                    match err {
                        HookError::Panicked(_) => error!(
                            target: "combat::hooks",
                            hook = %installed.definition.id,
                            kind = %kind,
                            owner = %target.owner,
                            error = %err,
                            "Hook panicked, treating as no-op"
                        ),
                        HookError::Failed(_) => warn!(
                            target: "combat::hooks",
                            hook = %installed.definition.id,
                            kind = %kind,
                            owner = %target.owner,
                            error = %err,
                            "Hook failed, treating as no-op"
                        ),
                    }
                }
            }
        }

        commands
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hit::DamageModifier;
    use combat_types::{ActionSlot, StatusId};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn raise(
        registry: &HookRegistry,
        kind: EventKind,
        stats: &mut StatBlock,
        event: &mut EventBundle<'_>,
    ) -> Vec<HookCommand> {
        let statuses = StatusRegistry::new();
        let target = HookTarget {
            owner: CombatantId(7),
            side: Side::Ally,
            stats,
            statuses: &statuses,
        };
        registry.raise(kind, target, event, None)
    }

    fn counting_hook(id: &str, kind: EventKind, counter: &Arc<AtomicUsize>) -> HookDefinition {
        let counter = Arc::clone(counter);
        HookDefinition::new(id, kind, move |_ctx| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }

    #[test]
    fn test_only_matching_kind_fires() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut registry = HookRegistry::new();
        registry.install(HookOwner::Innate, counting_hook("a", EventKind::RoundStart, &counter));
        registry.install(HookOwner::Innate, counting_hook("b", EventKind::RoundStart, &counter));
        registry.install(HookOwner::Innate, counting_hook("c", EventKind::TurnEnd, &counter));

        let mut stats = StatBlock::new(10, 0);
        raise(&registry, EventKind::RoundStart, &mut stats, &mut EventBundle::Round { round: 1 });
        assert_eq!(counter.load(Ordering::SeqCst), 2);
        assert_eq!(registry.count_for(EventKind::TurnEnd), 1);
    }

    #[test]
    fn test_uninstall_by_owner() {
        let counter = Arc::new(AtomicUsize::new(0));
        let owner = HookOwner::Status(StatusId::from("regen"));
        let mut registry = HookRegistry::new();
        registry.install(owner.clone(), counting_hook("a", EventKind::RoundEnd, &counter));
        registry.install(owner.clone(), counting_hook("b", EventKind::TurnEnd, &counter));
        registry.install(HookOwner::Innate, counting_hook("c", EventKind::RoundEnd, &counter));

        assert_eq!(registry.uninstall(&owner), 2);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.uninstall(&owner), 0);
    }

    #[test]
    fn test_hook_mutates_owner_and_payload() {
        let mut registry = HookRegistry::new();
        registry.install(
            HookOwner::Innate,
            HookDefinition::new("drain", EventKind::CollectDefenderModifiers, |ctx| {
                ctx.stats.apply_damage(3);
                ctx.event.add_modifier(DamageModifier::Multiplier(0.5));
                Ok(())
            }),
        );

        let hit = crate::hit::Hit::new(10.0, combat_types::AttackAttributes::PHYSICAL);
        let mut modifiers = Vec::new();
        let mut stats = StatBlock::new(10, 0);
        let mut event = EventBundle::Modifiers {
            attacker: None,
            defender: CombatantId(7),
            hit: &hit,
            modifiers: &mut modifiers,
        };
        raise(&registry, EventKind::CollectDefenderModifiers, &mut stats, &mut event);

        assert_eq!(stats.hp(), 7);
        assert_eq!(modifiers, vec![DamageModifier::Multiplier(0.5)]);
    }

    #[test]
    fn test_failing_hook_is_isolated() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut registry = HookRegistry::new();
        registry.install(
            HookOwner::Innate,
            HookDefinition::new("broken", EventKind::TurnStart, |ctx| {
                ctx.stats.apply_damage(5);
                ctx.push(HookCommand::AdjustHp {
                    target: CombatantId(1),
                    damage: 100,
                });
                Err(HookError::Failed("bad data".to_string()))
            }),
        );
        registry.install(
            HookOwner::Innate,
            HookDefinition::new("panicky", EventKind::TurnStart, |_ctx| {
                panic!("boom");
            }),
        );
        registry.install(HookOwner::Innate, counting_hook("fine", EventKind::TurnStart, &counter));

        let mut stats = StatBlock::new(10, 0);
        let mut actions = crate::hook::ActionAvailability::default();
        let mut event = EventBundle::Turn {
            round: 1,
            priority: false,
            actions: &mut actions,
        };
        let commands = raise(&registry, EventKind::TurnStart, &mut stats, &mut event);

        assert!(commands.is_empty());
        assert_eq!(stats.hp(), 10);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failed_hook_leaves_modifiers_untouched() {
        let mut registry = HookRegistry::new();
        registry.install(
            HookOwner::Innate,
            HookDefinition::new("armor", EventKind::CollectDefenderModifiers, |ctx| {
                ctx.event.add_modifier(DamageModifier::Flat(-2));
                Ok(())
            }),
        );
        registry.install(
            HookOwner::Innate,
            HookDefinition::new("nullify", EventKind::CollectDefenderModifiers, |ctx| {
                ctx.event.add_modifier(DamageModifier::Multiplier(0.0));
                Err(HookError::Failed("missing table".to_string()))
            }),
        );
        registry.install(
            HookOwner::Innate,
            HookDefinition::new("shatter", EventKind::CollectDefenderModifiers, |ctx| {
                ctx.event.add_modifier(DamageModifier::Multiplier(0.0));
                panic!("shatter");
            }),
        );

        let hit = crate::hit::Hit::new(10.0, combat_types::AttackAttributes::PHYSICAL);
        let mut modifiers = Vec::new();
        let mut stats = StatBlock::new(10, 0);
        let mut event = EventBundle::Modifiers {
            attacker: None,
            defender: CombatantId(7),
            hit: &hit,
            modifiers: &mut modifiers,
        };
        raise(&registry, EventKind::CollectDefenderModifiers, &mut stats, &mut event);

        assert_eq!(modifiers, vec![DamageModifier::Flat(-2)]);
    }

    #[test]
    fn test_failed_hook_keeps_actions() {
        let mut registry = HookRegistry::new();
        registry.install(
            HookOwner::Innate,
            HookDefinition::new("root", EventKind::TurnStart, |ctx| {
                if let Some(actions) = ctx.event.actions_mut() {
                    actions.consume(ActionSlot::Movement);
                }
                Ok(())
            }),
        );
        registry.install(
            HookOwner::Innate,
            HookDefinition::new("daze", EventKind::TurnStart, |ctx| {
                if let Some(actions) = ctx.event.actions_mut() {
                    actions.consume(ActionSlot::Primary);
                    actions.consume(ActionSlot::Auxiliary);
                }
                Err(HookError::Failed("bad roll".to_string()))
            }),
        );

        let mut stats = StatBlock::new(10, 0);
        let mut actions = crate::hook::ActionAvailability::default();
        let mut event = EventBundle::Turn {
            round: 1,
            priority: false,
            actions: &mut actions,
        };
        raise(&registry, EventKind::TurnStart, &mut stats, &mut event);

        assert!(actions.primary);
        assert!(actions.auxiliary);
        assert!(!actions.movement);
    }

    #[test]
    fn test_filter_by_owner() {
        let counter = Arc::new(AtomicUsize::new(0));
        let owner = HookOwner::Status(StatusId::from("shield"));
        let mut registry = HookRegistry::new();
        registry.install(owner.clone(), counting_hook("a", EventKind::OnApply, &counter));
        registry.install(
            HookOwner::Status(StatusId::from("other")),
            counting_hook("b", EventKind::OnApply, &counter),
        );

        let statuses = StatusRegistry::new();
        let mut stats = StatBlock::new(10, 0);
        let id = StatusId::from("shield");
        let target = HookTarget {
            owner: CombatantId(0),
            side: Side::Enemy,
            stats: &mut stats,
            statuses: &statuses,
        };
        let mut event = EventBundle::Status {
            id: &id,
            stacks: 1,
            inflicter: None,
        };
        registry.raise(EventKind::OnApply, target, &mut event, Some(&owner));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
