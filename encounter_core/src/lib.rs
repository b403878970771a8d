//! encounter_core - turn scheduling and the encounter state machine
//!
//! An encounter runs as one tokio task that owns every combatant. Action
//! selection talks to it through an [`EncounterHandle`]; visual services
//! listen to best-effort [`Notification`]s.
//!
//! ```rust,ignore
//! use encounter_core::{EncounterConfig, EncounterSession, EncounterSetup};
//!
//! let mut session = EncounterSession::new(constants, catalog);
//! let handle = session.start(EncounterSetup::new(kind, "forest", combatants),
//!     EncounterConfig::default())?;
//!
//! while let Some(turn) = handle.wait_turn().await? {
//!     handle.use_skill(turn.entry, "slash", vec![target]).await?;
//!     handle.complete_turn(turn.entry).await?;
//! }
//! let outcome = session.finish().await?;
//! ```

pub mod config;
pub mod encounter;
pub mod hitbox;
pub mod roster;
pub mod turn;

pub use config::EncounterConfig;
pub use encounter::{
    spawn_encounter, CombatantSnapshot, EncounterHandle, EncounterOutcome, EncounterSession,
    EncounterSetup, EncounterSnapshot, Notification, NotificationBus, Phase, SkillReport,
    TurnPrompt,
};
pub use hitbox::{HitboxId, HitboxPhase};
pub use roster::Roster;
pub use turn::{EntryId, TurnEntry, TurnScheduler};

use combat_core::{ConfigError, ContentError};
use combat_types::{ActionSlot, CombatantId, StatusId};
use thiserror::Error;
use tokio::sync::oneshot;

pub type Result<T> = std::result::Result<T, EncounterError>;

#[derive(Debug, Error)]
pub enum EncounterError {
    #[error("encounter is not active")]
    NotActive,

    #[error("an encounter is already live in this session")]
    AlreadyActive,

    #[error("no live encounter in this session")]
    NoLiveEncounter,

    #[error("unknown combatant {0}")]
    UnknownCombatant(CombatantId),

    #[error("combatant {0} appears more than once")]
    DuplicateCombatant(CombatantId),

    #[error("unknown turn entry {0}")]
    UnknownEntry(EntryId),

    #[error("turn entry {0} is not the active entry")]
    EntryNotActive(EntryId),

    #[error("combatant {combatant} has no skill '{skill}'")]
    UnknownSkill { combatant: CombatantId, skill: String },

    #[error("unknown status '{0}'")]
    UnknownStatus(StatusId),

    #[error("{0:?} action already spent this round")]
    SlotSpent(ActionSlot),

    #[error("skill '{skill}' is on cooldown for {rounds} more round(s)")]
    OnCooldown { skill: String, rounds: u32 },

    #[error("not enough MP: need {needed}, have {available}")]
    InsufficientMp { needed: i64, available: i64 },

    #[error(transparent)]
    Content(#[from] ContentError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("encounter command channel closed")]
    CommandChannelClosed,

    #[error("encounter reply channel closed")]
    ReplyChannelClosed(#[source] oneshot::error::RecvError),

    #[error("encounter task join failed")]
    Join(#[source] tokio::task::JoinError),
}
