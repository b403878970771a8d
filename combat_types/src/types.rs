use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a combatant within one encounter
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CombatantId(pub u32);

impl fmt::Display for CombatantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identifier of a status definition (e.g. "stun", "poison")
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusId(pub String);

impl StatusId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for StatusId {
    fn from(s: &str) -> Self {
        StatusId(s.to_string())
    }
}

impl From<String> for StatusId {
    fn from(s: String) -> Self {
        StatusId(s)
    }
}

impl fmt::Display for StatusId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which side a combatant fights for.
///
/// The discriminant order is also the tie-break order used by the turn scheduler.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Side {
    #[default]
    Ally = 0,
    Enemy = 1,
    Neutral = 2,
}

impl Side {
    pub fn all() -> &'static [Side] {
        &[Side::Ally, Side::Enemy, Side::Neutral]
    }

    /// The side this one fights against, if any
    pub fn opponent(&self) -> Option<Side> {
        match self {
            Side::Ally => Some(Side::Enemy),
            Side::Enemy => Some(Side::Ally),
            Side::Neutral => None,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Ally => write!(f, "Ally"),
            Side::Enemy => write!(f, "Enemy"),
            Side::Neutral => write!(f, "Neutral"),
        }
    }
}

bitflags! {
    /// Attributes carried by a hit
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct AttackAttributes: u32 {
        const PHYSICAL  = 1 << 0;
        const MAGICAL   = 1 << 1;
        const FIRE      = 1 << 2;
        const ICE       = 1 << 3;
        const LIGHTNING = 1 << 4;
        const EARTH     = 1 << 5;
        const WIND      = 1 << 6;
        const WATER     = 1 << 7;
        const LIGHT     = 1 << 8;
        const DARK      = 1 << 9;
        const SLASHING  = 1 << 10;
        const PIERCING  = 1 << 11;
        const BLUNT     = 1 << 12;
    }
}

impl AttackAttributes {
    /// Physical hits scale off physical attack/defense, everything else off magical
    pub fn is_physical(&self) -> bool {
        self.contains(AttackAttributes::PHYSICAL)
    }

    /// Elements present on this hit, in declaration order
    pub fn elements(&self) -> impl Iterator<Item = Element> + '_ {
        Element::all()
            .iter()
            .copied()
            .filter(move |e| self.contains(e.attribute()))
    }
}

/// Elemental affinities a stat block can resist
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Element {
    Fire,
    Ice,
    Lightning,
    Earth,
    Wind,
    Water,
    Light,
    Dark,
}

impl Element {
    pub fn all() -> &'static [Element] {
        &[
            Element::Fire,
            Element::Ice,
            Element::Lightning,
            Element::Earth,
            Element::Wind,
            Element::Water,
            Element::Light,
            Element::Dark,
        ]
    }

    pub fn attribute(&self) -> AttackAttributes {
        match self {
            Element::Fire => AttackAttributes::FIRE,
            Element::Ice => AttackAttributes::ICE,
            Element::Lightning => AttackAttributes::LIGHTNING,
            Element::Earth => AttackAttributes::EARTH,
            Element::Wind => AttackAttributes::WIND,
            Element::Water => AttackAttributes::WATER,
            Element::Light => AttackAttributes::LIGHT,
            Element::Dark => AttackAttributes::DARK,
        }
    }
}

/// Broad classification of a status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StatusCategory {
    /// Damage over time and similar harmful effects
    Ailment,
    /// Restricts what the holder can do (stun, sleep, ...)
    Impairment,
    Beneficial,
    #[default]
    Neutral,
}

/// Combat events hooks can subscribe to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    RoundStart,
    RoundEnd,
    TurnStart,
    TurnEnd,
    BeforeAttack,
    AfterAttack,
    BeforeDefend,
    AfterDefend,
    CollectAttackerModifiers,
    CollectDefenderModifiers,
    StatusApplied,
    StatusRemoved,
    Incapacitation,
    OnApply,
    OnRemove,
}

impl EventKind {
    pub fn all() -> &'static [EventKind] {
        &[
            EventKind::RoundStart,
            EventKind::RoundEnd,
            EventKind::TurnStart,
            EventKind::TurnEnd,
            EventKind::BeforeAttack,
            EventKind::AfterAttack,
            EventKind::BeforeDefend,
            EventKind::AfterDefend,
            EventKind::CollectAttackerModifiers,
            EventKind::CollectDefenderModifiers,
            EventKind::StatusApplied,
            EventKind::StatusRemoved,
            EventKind::Incapacitation,
            EventKind::OnApply,
            EventKind::OnRemove,
        ]
    }

    /// Kinds that only fire for the hooks of the status being applied/removed
    pub fn is_status_local(&self) -> bool {
        matches!(self, EventKind::OnApply | EventKind::OnRemove)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventKind::RoundStart => "round_start",
            EventKind::RoundEnd => "round_end",
            EventKind::TurnStart => "turn_start",
            EventKind::TurnEnd => "turn_end",
            EventKind::BeforeAttack => "before_attack",
            EventKind::AfterAttack => "after_attack",
            EventKind::BeforeDefend => "before_defend",
            EventKind::AfterDefend => "after_defend",
            EventKind::CollectAttackerModifiers => "collect_attacker_modifiers",
            EventKind::CollectDefenderModifiers => "collect_defender_modifiers",
            EventKind::StatusApplied => "status_applied",
            EventKind::StatusRemoved => "status_removed",
            EventKind::Incapacitation => "incapacitation",
            EventKind::OnApply => "on_apply",
            EventKind::OnRemove => "on_remove",
        };
        f.write_str(name)
    }
}

/// How the encounter was entered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EncounterKind {
    #[default]
    Normal,
    /// Allies ambushed the enemy and get priority turns
    Advantage,
    /// Enemies ambushed the party and get priority turns
    Disadvantage,
}

impl EncounterKind {
    pub fn priority_side(&self) -> Option<Side> {
        match self {
            EncounterKind::Normal => None,
            EncounterKind::Advantage => Some(Side::Ally),
            EncounterKind::Disadvantage => Some(Side::Enemy),
        }
    }
}

/// The three ways an encounter can end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Endstate {
    Victory,
    Defeat,
    Flee,
}

impl Endstate {
    /// Whether combatants are cleaned up (statuses cleared, resources restored)
    pub fn resets_combatants(&self) -> bool {
        !matches!(self, Endstate::Flee)
    }
}

impl fmt::Display for Endstate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endstate::Victory => write!(f, "Victory"),
            Endstate::Defeat => write!(f, "Defeat"),
            Endstate::Flee => write!(f, "Flee"),
        }
    }
}

/// Per-turn action budget slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ActionSlot {
    #[default]
    Primary,
    Auxiliary,
    Movement,
}
