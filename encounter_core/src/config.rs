//! Per-encounter options

use serde::{Deserialize, Serialize};

/// Options for a single encounter
///
/// Game-wide balance numbers live in `combat_core::CombatConstants`; this only
/// covers how one encounter runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncounterConfig {
    /// Seed for the encounter's RNG; equal seeds replay equal outcomes
    #[serde(default)]
    pub seed: u64,
    /// Keep priority entries across rounds (false drops them at round end)
    #[serde(default = "default_priority_persists")]
    pub priority_persists: bool,
    #[serde(default = "default_notification_capacity")]
    pub notification_capacity: usize,
    #[serde(default = "default_command_capacity")]
    pub command_capacity: usize,
}

fn default_priority_persists() -> bool {
    true
}

fn default_notification_capacity() -> usize {
    128
}

fn default_command_capacity() -> usize {
    32
}

impl Default for EncounterConfig {
    fn default() -> Self {
        EncounterConfig {
            seed: 0,
            priority_persists: default_priority_persists(),
            notification_capacity: default_notification_capacity(),
            command_capacity: default_command_capacity(),
        }
    }
}

impl EncounterConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_priority_persists(mut self, persists: bool) -> Self {
        self.priority_persists = persists;
        self
    }
}
