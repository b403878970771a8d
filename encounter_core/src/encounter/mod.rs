//! Encounter runtime: state machine, worker task and client handle

mod handle;
mod notify;
mod session;
mod snapshot;
mod state;
mod worker;

pub use handle::EncounterHandle;
pub use notify::{Notification, NotificationBus};
pub use session::{spawn_encounter, EncounterSession, EncounterSetup};
pub use snapshot::{CombatantSnapshot, EncounterOutcome, EncounterSnapshot, SkillReport, TurnPrompt};
pub use state::Phase;

pub(crate) use worker::Command;
