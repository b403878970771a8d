//! Status effects - named, stackable timed effects that bundle hooks

mod catalog;
mod registry;

pub use catalog::StatusCatalog;
pub use registry::StatusRegistry;

use crate::hit::Hit;
use crate::hook::HookDefinition;
use crate::ContentError;
use combat_types::{CombatantId, EventKind, StatusCategory, StatusId};
use std::collections::HashSet;
use std::sync::Arc;

/// Immutable definition of a status, shared by every combatant it lands on
#[derive(Debug, Clone)]
pub struct StatusDefinition {
    pub id: StatusId,
    pub name: String,
    pub category: StatusCategory,
    /// Stackable statuses gain a new stack per application; others refuse duplicates
    pub stackable: bool,
    /// Duration in rounds for stacks applied by a hit roll (`None` = until removed)
    pub default_duration: Option<u32>,
    hooks: Vec<HookDefinition>,
}

impl StatusDefinition {
    pub fn new(id: impl Into<StatusId>, category: StatusCategory) -> Self {
        let id = id.into();
        StatusDefinition {
            name: id.to_string(),
            id,
            category,
            stackable: false,
            default_duration: None,
            hooks: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn stackable(mut self, stackable: bool) -> Self {
        self.stackable = stackable;
        self
    }

    pub fn with_duration(mut self, rounds: Option<u32>) -> Self {
        self.default_duration = rounds;
        self
    }

    pub fn with_hook(mut self, hook: HookDefinition) -> Self {
        self.hooks.push(hook);
        self
    }

    pub fn hooks(&self) -> &[HookDefinition] {
        &self.hooks
    }

    pub fn hooks_for(&self, kind: EventKind) -> impl Iterator<Item = &HookDefinition> {
        self.hooks.iter().filter(move |h| h.kind == kind)
    }

    /// Check the definition and wrap it for sharing
    pub fn build(self) -> Result<Arc<Self>, ContentError> {
        if self.id.as_str().is_empty() {
            return Err(ContentError::InvalidStatus {
                id: self.id.to_string(),
                reason: "empty id".to_string(),
            });
        }
        if self.default_duration == Some(0) {
            return Err(ContentError::InvalidStatus {
                id: self.id.to_string(),
                reason: "duration must be at least one round".to_string(),
            });
        }
        let mut seen = HashSet::new();
        for hook in &self.hooks {
            if !seen.insert(hook.id.as_str()) {
                return Err(ContentError::InvalidStatus {
                    id: self.id.to_string(),
                    reason: format!("duplicate hook id '{}'", hook.id),
                });
            }
        }
        Ok(Arc::new(self))
    }

    /// A fresh stack using this status's default duration
    pub fn default_stack(&self) -> StatusStack {
        StatusStack::new(self.default_duration)
    }
}

/// One application of a status
#[derive(Debug, Clone, Default)]
pub struct StatusStack {
    pub inflicter: Option<CombatantId>,
    /// Rounds left (`None` = permanent until removed)
    pub remaining: Option<u32>,
    /// Hit to replay for damage-over-time ticks
    pub source: Option<Arc<Hit>>,
}

impl StatusStack {
    pub fn new(remaining: Option<u32>) -> Self {
        StatusStack {
            inflicter: None,
            remaining,
            source: None,
        }
    }

    pub fn permanent() -> Self {
        Self::new(None)
    }

    pub fn from_inflicter(mut self, inflicter: CombatantId) -> Self {
        self.inflicter = Some(inflicter);
        self
    }

    pub fn with_source(mut self, hit: Arc<Hit>) -> Self {
        self.source = Some(hit);
        self
    }

    /// Count down one round. Returns true once the stack has run out.
    pub fn tick(&mut self) -> bool {
        match &mut self.remaining {
            Some(rounds) => {
                *rounds = rounds.saturating_sub(1);
                *rounds == 0
            }
            None => false,
        }
    }
}

/// A status active on a combatant
#[derive(Debug, Clone)]
pub struct ActiveStatus {
    pub definition: Arc<StatusDefinition>,
    pub stacks: Vec<StatusStack>,
}

/// Result of trying to register a status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// First application; hooks were installed
    Applied,
    /// Added to an existing stackable status; holds the new stack count
    Stacked(usize),
    /// Non-stackable status already present
    Refused,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_rejects_duplicate_hooks() {
        let result = StatusDefinition::new("burn", StatusCategory::Ailment)
            .with_hook(HookDefinition::new("tick", EventKind::RoundStart, |_| Ok(())))
            .with_hook(HookDefinition::new("tick", EventKind::RoundEnd, |_| Ok(())))
            .build();
        assert!(matches!(result, Err(ContentError::InvalidStatus { .. })));
    }

    #[test]
    fn test_build_rejects_zero_duration() {
        let result = StatusDefinition::new("stun", StatusCategory::Impairment)
            .with_duration(Some(0))
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_hooks_for_kind() {
        let status = StatusDefinition::new("regen", StatusCategory::Beneficial)
            .with_hook(HookDefinition::new("heal", EventKind::RoundStart, |_| Ok(())))
            .with_hook(HookDefinition::new("announce", EventKind::OnApply, |_| Ok(())))
            .build()
            .unwrap();
        assert_eq!(status.hooks_for(EventKind::RoundStart).count(), 1);
        assert_eq!(status.hooks_for(EventKind::TurnEnd).count(), 0);
        assert_eq!(status.name, "regen");
    }

    #[test]
    fn test_stack_tick() {
        let mut stack = StatusStack::new(Some(2));
        assert!(!stack.tick());
        assert!(stack.tick());
        let mut permanent = StatusStack::permanent();
        assert!(!permanent.tick());
    }
}
