//! Hooks - content-defined callbacks bound to combat events
//!
//! A hook is installed into a combatant's [`HookRegistry`] either innately or
//! by a status. When the encounter raises an [`EventKind`] for that combatant,
//! every installed hook tagged with that kind runs with a [`HookContext`]
//! carrying the event payload.
//!
//! Hooks only mutate their owner directly. Anything that touches another
//! combatant (resolving a hit, applying a status elsewhere) is pushed as a
//! [`HookCommand`] and executed by the encounter after the raise completes.

mod context;
mod event;
mod registry;

pub use context::HookContext;
pub use event::{ActionAvailability, EventBundle};
pub use registry::{HookRegistry, HookTarget, InstalledHook};

use crate::hit::Hit;
use crate::status::{StatusDefinition, StatusStack};
use combat_types::{CombatantId, EventKind, StatusId};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Failure reported by (or caught around) a hook callback
#[derive(Debug, Error)]
pub enum HookError {
    #[error("hook failed: {0}")]
    Failed(String),
    #[error("hook panicked: {0}")]
    Panicked(String),
}

pub type HookResult = Result<(), HookError>;

/// Callback stored by a hook
pub type HookFn = Arc<dyn Fn(&mut HookContext<'_, '_>) -> HookResult + Send + Sync>;

/// A named callback tagged with the event kind it reacts to
#[derive(Clone)]
pub struct HookDefinition {
    pub id: String,
    pub kind: EventKind,
    callback: HookFn,
}

impl HookDefinition {
    pub fn new<F>(id: impl Into<String>, kind: EventKind, callback: F) -> Self
    where
        F: Fn(&mut HookContext<'_, '_>) -> HookResult + Send + Sync + 'static,
    {
        HookDefinition {
            id: id.into(),
            kind,
            callback: Arc::new(callback),
        }
    }

    pub(crate) fn callback(&self) -> &HookFn {
        &self.callback
    }
}

impl fmt::Debug for HookDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookDefinition")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// What installed a hook; used to uninstall everything a status brought in
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HookOwner {
    Innate,
    Status(StatusId),
}

/// Deferred effect requested by a hook or a skill effect
#[derive(Debug, Clone)]
pub enum HookCommand {
    /// Sign-encoded HP change (negative heals), bypassing the resolver
    AdjustHp { target: CombatantId, damage: i64 },
    /// Run a full hit resolution, e.g. a damage-over-time tick
    ResolveHit {
        attacker: Option<CombatantId>,
        hit: Arc<Hit>,
        defender: CombatantId,
    },
    ApplyStatus {
        target: CombatantId,
        status: Arc<StatusDefinition>,
        stack: StatusStack,
    },
    RemoveStatus { target: CombatantId, id: StatusId },
}
