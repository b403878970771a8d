//! Hit resolution - apply a Hit from an attacker to a defender

use super::result::{HitCalculation, HitOutcome};
use crate::combatant::Combatant;
use crate::config::DamageConstants;
use crate::hit::{DamageModifier, Hit};
use crate::stat_block::StatBlock;
use combat_types::{CombatantId, Side};
use rand::Rng;
use std::sync::Arc;

/// The (attacker, hit, defender) triple being resolved
///
/// A missing attacker (environmental damage, orphaned damage-over-time)
/// contributes zero attack and receives no aggro.
#[derive(Debug, Clone, Copy)]
pub struct HitRequest<'a> {
    pub attacker: Option<CombatantId>,
    pub attacker_stats: Option<&'a StatBlock>,
    pub defender: CombatantId,
    pub defender_side: Side,
    pub defender_stats: &'a StatBlock,
    pub hit: &'a Arc<Hit>,
}

impl<'a> HitRequest<'a> {
    pub fn new(
        attacker: Option<&'a Combatant>,
        hit: &'a Arc<Hit>,
        defender: &'a Combatant,
    ) -> Self {
        HitRequest {
            attacker: attacker.map(|a| a.id),
            attacker_stats: attacker.map(|a| &a.stats),
            defender: defender.id,
            defender_side: defender.side,
            defender_stats: &defender.stats,
            hit,
        }
    }
}

/// Compute damage, aggro and status rolls without touching anyone
///
/// 1. Physical hits use physical attack/defense, everything else magical
/// 2. `base = round(modifier * (1 + attack) / (1 + defense) / divisor)`
/// 3. Collected modifiers, then one multiplier per element on the hit
///    (`1 - resistance / 100`), rounding after each
/// 4. `aggro = aggro_modifier * damage^2`
/// 5. One uniform percentage roll per status, in id order
///
/// Only step 5 draws from `rng`.
pub fn calculate_hit(
    request: &HitRequest<'_>,
    collected: Vec<DamageModifier>,
    constants: &DamageConstants,
    rng: &mut impl Rng,
) -> HitCalculation {
    let hit = request.hit;
    let attributes = hit.attributes;

    let attack = request
        .attacker_stats
        .map(|stats| stats.offense(attributes))
        .unwrap_or(0.0);
    // Defense below -1 would flip the sign of the hit
    let defense = request.defender_stats.defense(attributes).max(-0.99);
    let divisor = constants.divisor(request.defender_side);

    let base = (hit.modifier * (1.0 + attack) / (1.0 + defense) / divisor).round() as i64;

    let mut modifiers = collected;
    modifiers.extend(attributes.elements().filter_map(|element| {
        let resistance = request.defender_stats.resistance(element);
        (resistance != 0.0).then(|| DamageModifier::Multiplier(1.0 - resistance / 100.0))
    }));

    let damage = modifiers
        .iter()
        .fold(base, |damage, modifier| modifier.apply(damage));

    let magnitude = damage as f64;
    let aggro = hit.aggro_modifier * magnitude * magnitude;

    let statuses = hit
        .statuses
        .iter()
        .filter(|(_, chance)| rng.gen_range(0.0..100.0) < **chance)
        .map(|(id, _)| id.clone())
        .collect();

    HitCalculation {
        attacker: request.attacker,
        defender: request.defender,
        hit: Arc::clone(hit),
        modifiers,
        statuses,
        damage,
        aggro,
    }
}

/// Apply a calculation to the defender's HP and aggro tracker
pub fn commit_hit(calculation: HitCalculation, defender: &mut Combatant) -> HitOutcome {
    debug_assert_eq!(calculation.defender, defender.id);

    let hp_before = defender.stats.hp();
    defender.stats.apply_damage(calculation.damage);
    let hp_after = defender.stats.hp();

    if let Some(attacker) = calculation.attacker {
        if calculation.aggro > 0.0 {
            defender.aggro.insert(attacker, calculation.aggro);
        }
    }

    HitOutcome {
        calculation,
        hp_before,
        hp_after,
        incapacitated: hp_before > 0 && hp_after == 0,
        revived: hp_before == 0 && hp_after > 0,
    }
}

/// Calculate and commit in one go, with no hook modifiers
pub fn resolve_hit(
    attacker: Option<&Combatant>,
    hit: &Arc<Hit>,
    defender: &mut Combatant,
    constants: &DamageConstants,
    rng: &mut impl Rng,
) -> HitOutcome {
    let calculation = calculate_hit(
        &HitRequest::new(attacker, hit, defender),
        Vec::new(),
        constants,
        rng,
    );
    commit_hit(calculation, defender)
}
