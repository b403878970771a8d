//! Tunable combat constants

use combat_types::{Side, StatusId};
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::ConfigError;

/// Tunable combat constants
///
/// Owned by the encounter and passed by reference into resolution; there is no
/// process-wide instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatConstants {
    #[serde(default)]
    pub damage: DamageConstants,
    #[serde(default)]
    pub aggro: AggroConstants,
    #[serde(default)]
    pub status: StatusConstants,
    /// Length of one hitbox timeline tick in milliseconds
    #[serde(default = "default_hitbox_tick_ms")]
    pub hitbox_tick_ms: u64,
}

impl Default for CombatConstants {
    fn default() -> Self {
        CombatConstants {
            damage: DamageConstants::default(),
            aggro: AggroConstants::default(),
            status: StatusConstants::default(),
            hitbox_tick_ms: default_hitbox_tick_ms(),
        }
    }
}

impl CombatConstants {
    /// Load constants from a TOML file
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let constants: CombatConstants = super::load_toml(path)?;
        constants.validate()?;
        Ok(constants)
    }

    /// Parse constants from a TOML string
    pub fn parse(toml: &str) -> Result<Self, ConfigError> {
        let constants: CombatConstants = super::parse_toml(toml)?;
        constants.validate()?;
        Ok(constants)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for side in Side::all() {
            let divisor = self.damage.divisor(*side);
            if !(divisor.is_finite() && divisor > 0.0) {
                return Err(ConfigError::ValidationError(format!(
                    "damage divisor for {side} must be positive, got {divisor}"
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.aggro.prune_fraction) {
            return Err(ConfigError::ValidationError(format!(
                "aggro.prune_fraction must be within [0, 1], got {}",
                self.aggro.prune_fraction
            )));
        }
        if !(0.0..=1.0).contains(&self.aggro.top_window) {
            return Err(ConfigError::ValidationError(format!(
                "aggro.top_window must be within [0, 1], got {}",
                self.aggro.top_window
            )));
        }
        if self.hitbox_tick_ms == 0 {
            return Err(ConfigError::ValidationError(
                "hitbox_tick_ms must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_hitbox_tick_ms() -> u64 {
    50
}

/// Post-formula damage scale-down, keyed by the defender's side
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DamageConstants {
    #[serde(default = "default_divisor")]
    pub ally_divisor: f64,
    #[serde(default = "default_divisor")]
    pub enemy_divisor: f64,
    #[serde(default = "default_divisor")]
    pub neutral_divisor: f64,
}

impl Default for DamageConstants {
    fn default() -> Self {
        DamageConstants {
            ally_divisor: 1.0,
            enemy_divisor: 1.0,
            neutral_divisor: 1.0,
        }
    }
}

impl DamageConstants {
    pub fn divisor(&self, defender: Side) -> f64 {
        match defender {
            Side::Ally => self.ally_divisor,
            Side::Enemy => self.enemy_divisor,
            Side::Neutral => self.neutral_divisor,
        }
    }
}

fn default_divisor() -> f64 {
    1.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggroConstants {
    /// Shares below this fraction of the tracker total are pruned
    #[serde(default = "default_prune_fraction")]
    pub prune_fraction: f64,
    /// Shares within this fraction of the maximum count as "top"
    #[serde(default = "default_top_window")]
    pub top_window: f64,
}

impl Default for AggroConstants {
    fn default() -> Self {
        AggroConstants {
            prune_fraction: 0.05,
            top_window: 0.10,
        }
    }
}

fn default_prune_fraction() -> f64 {
    0.05
}
fn default_top_window() -> f64 {
    0.10
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusConstants {
    /// Statuses that skip their holder's turn
    #[serde(default = "default_blocking")]
    pub blocking: Vec<StatusId>,
    /// Status applied when HP reaches zero
    #[serde(default = "default_incapacitation")]
    pub incapacitation: StatusId,
    /// How deep hook commands may cascade into further hook raises
    #[serde(default = "default_max_hook_chain_depth")]
    pub max_hook_chain_depth: u32,
}

impl Default for StatusConstants {
    fn default() -> Self {
        StatusConstants {
            blocking: default_blocking(),
            incapacitation: default_incapacitation(),
            max_hook_chain_depth: default_max_hook_chain_depth(),
        }
    }
}

impl StatusConstants {
    pub fn is_blocking(&self, id: &StatusId) -> bool {
        *id == self.incapacitation || self.blocking.contains(id)
    }
}

fn default_blocking() -> Vec<StatusId> {
    [
        "stun",
        "grab",
        "freeze",
        "sleep",
        "charm",
        "confusion",
        "fear",
        "terrify",
        "time_stop",
        "incapacitated",
    ]
    .into_iter()
    .map(StatusId::from)
    .collect()
}

fn default_incapacitation() -> StatusId {
    StatusId::from("incapacitated")
}

fn default_max_hook_chain_depth() -> u32 {
    8
}
