//! Session owning at most one live encounter

use std::sync::Arc;
use std::time::Duration;

use combat_core::status::StatusCatalog;
use combat_core::{Combatant, CombatConstants};
use combat_types::EncounterKind;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;

use super::handle::EncounterHandle;
use super::notify::NotificationBus;
use super::snapshot::EncounterOutcome;
use super::state::EncounterState;
use super::worker::EncounterWorker;
use crate::config::EncounterConfig;
use crate::{EncounterError, Result};

/// Everything needed to open an encounter
#[derive(Debug)]
pub struct EncounterSetup {
    pub kind: EncounterKind,
    pub area: String,
    pub combatants: Vec<Combatant>,
}

impl EncounterSetup {
    pub fn new(kind: EncounterKind, area: impl Into<String>, combatants: Vec<Combatant>) -> Self {
        EncounterSetup {
            kind,
            area: area.into(),
            combatants,
        }
    }
}

/// Spawn an encounter task on the current runtime
///
/// The task ends when the encounter reaches an endstate or every handle is
/// dropped, and yields the combatants back through the join handle.
pub fn spawn_encounter(
    setup: EncounterSetup,
    config: EncounterConfig,
    constants: Arc<CombatConstants>,
    catalog: &StatusCatalog,
) -> Result<(EncounterHandle, JoinHandle<EncounterOutcome>)> {
    let bus = NotificationBus::with_capacity(config.notification_capacity);
    let (command_tx, command_rx) = mpsc::channel(config.command_capacity.max(1));
    let tick = Duration::from_millis(constants.hitbox_tick_ms);

    let state = EncounterState::new(setup, config, constants, catalog, bus.clone())?;
    let worker = EncounterWorker::new(state, command_rx, command_tx.downgrade(), tick, bus.clone());
    let task = tokio::spawn(worker.run());

    Ok((EncounterHandle::new(command_tx, bus), task))
}

/// Owns the shared combat content and the live encounter, if any
pub struct EncounterSession {
    constants: Arc<CombatConstants>,
    catalog: Arc<StatusCatalog>,
    live: Option<(EncounterHandle, JoinHandle<EncounterOutcome>)>,
}

impl EncounterSession {
    pub fn new(constants: Arc<CombatConstants>, catalog: Arc<StatusCatalog>) -> Self {
        EncounterSession {
            constants,
            catalog,
            live: None,
        }
    }

    pub fn constants(&self) -> &CombatConstants {
        &self.constants
    }

    pub fn catalog(&self) -> &StatusCatalog {
        &self.catalog
    }

    /// Open a new encounter
    ///
    /// Fails while another one is live; an encounter counts as live until its
    /// outcome is collected with [`finish`](Self::finish).
    pub fn start(
        &mut self,
        setup: EncounterSetup,
        config: EncounterConfig,
    ) -> Result<EncounterHandle> {
        if self.live.is_some() {
            return Err(EncounterError::AlreadyActive);
        }

        info!(
            target: "encounter::session",
            kind = ?setup.kind,
            area = %setup.area,
            "Opening encounter"
        );
        let (handle, task) =
            spawn_encounter(setup, config, Arc::clone(&self.constants), &self.catalog)?;
        self.live = Some((handle.clone(), task));
        Ok(handle)
    }

    pub fn is_live(&self) -> bool {
        self.live.is_some()
    }

    pub fn handle(&self) -> Option<&EncounterHandle> {
        self.live.as_ref().map(|(handle, _)| handle)
    }

    /// Wait for the live encounter to close and take its outcome
    pub async fn finish(&mut self) -> Result<EncounterOutcome> {
        let (handle, task) = self.live.take().ok_or(EncounterError::NoLiveEncounter)?;
        // The session's own handle must not keep the encounter alive
        drop(handle);
        task.await.map_err(EncounterError::Join)
    }
}
