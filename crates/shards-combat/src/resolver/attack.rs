//! The strike pipeline shared by basic attacks and damaging abilities.

use serde::{Deserialize, Serialize};

use crate::config::CombatConfig;
use crate::dice::Dice;
use crate::entity::{Combatant, StanceFlags};

use super::modifiers_of;

/// Parameters of a single strike.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Strike {
    /// Base damage: attack power for basic attacks, scaled magnitude for abilities.
    pub base: f32,
    /// Multiplier on `base`.
    pub damage_multiplier: f32,
    /// Multiplier on the attacker's accuracy.
    pub accuracy_multiplier: f32,
    /// Added to the attacker's critical chance.
    pub critical_bonus: f32,
    /// Whether the strike may be critical.
    pub can_critical: bool,
    /// Whether a parrying defender may parry it.
    pub parryable: bool,
    /// Skip the defense subtraction (block still applies).
    pub ignores_defense: bool,
}

/// What a strike did.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum StrikeResult {
    /// The defender parried; the attacker eats a counter-hit.
    Parried {
        /// Counter-hit damage before mitigation
        counter_raw: f32,
        /// Counter-hit damage after mitigation
        counter_final: f32,
    },
    /// The defender evaded.
    Dodged,
    /// The attack missed.
    Miss,
    /// The attack landed.
    Landed {
        /// Whether it was a critical hit
        critical: bool,
        /// Damage before mitigation
        raw: f32,
        /// Damage after mitigation and block
        final_damage: f32,
        /// Whether a block reduced it
        blocked: bool,
    },
}

/// Rolls a strike from `attacker` against `defender`.
///
/// Rolls are consumed in a fixed order: parry (only against a parrying
/// defender and a parryable strike), dodge (only against a dodging defender),
/// hit, then critical (only on a hit that may be critical).
pub fn roll_strike(
    attacker: &Combatant,
    defender: &Combatant,
    strike: &Strike,
    config: &CombatConfig,
    dice: &mut dyn Dice,
) -> StrikeResult {
    let attacker_mods = modifiers_of(attacker, config);
    let defender_mods = modifiers_of(defender, config);

    if strike.parryable && defender.stance.contains(StanceFlags::PARRYING) {
        let chance = config.parry_chance(defender.stats().initiative);
        let roll = dice.d100();
        tracing::trace!(roll, chance, "parry roll");
        if percent(roll) <= chance {
            let counter_raw = stat(defender.stats().attack_power)
                * config.parry_counter_multiplier
                * defender_mods.attack;
            let (counter_final, _) = mitigate(counter_raw, attacker, false, config);
            return StrikeResult::Parried {
                counter_raw,
                counter_final,
            };
        }
    }

    if defender.stance.contains(StanceFlags::DODGING) {
        let evasion = stat(defender.stats().evasion) * defender_mods.agility;
        let roll = dice.d100();
        tracing::trace!(roll, evasion, "dodge roll");
        if percent(roll) <= evasion {
            return StrikeResult::Dodged;
        }
    }

    let accuracy = config.hit_chance_bounds.clamp(
        stat(attacker.stats().accuracy) * strike.accuracy_multiplier * attacker_mods.attack,
    );
    let roll = dice.d100();
    tracing::trace!(roll, accuracy, "hit roll");
    if percent(roll) > accuracy {
        return StrikeResult::Miss;
    }

    let critical = strike.can_critical && {
        let chance = (attacker.stats().critical_chance + strike.critical_bonus) * 100.0;
        let roll = dice.d100();
        tracing::trace!(roll, chance, "critical roll");
        percent(roll) <= chance
    };

    let critical_multiplier = if critical {
        attacker.stats().critical_multiplier
    } else {
        1.0
    };
    let raw = strike.base * strike.damage_multiplier * critical_multiplier * attacker_mods.attack;
    let (final_damage, blocked) = mitigate(raw, defender, strike.ignores_defense, config);

    StrikeResult::Landed {
        critical,
        raw,
        final_damage,
        blocked,
    }
}

/// Mitigates raw damage against a defender.
///
/// `max(minimum, raw - defense * mitigation)`, then multiplied by the block
/// factor if the defender is blocking. Returns the damage and whether a block
/// applied.
#[must_use]
pub fn mitigate(
    raw: f32,
    defender: &Combatant,
    ignores_defense: bool,
    config: &CombatConfig,
) -> (f32, bool) {
    let reduction = if ignores_defense {
        0.0
    } else {
        stat(defender.stats().defense)
            * modifiers_of(defender, config).defense
            * config.defense_mitigation
    };
    let mitigated = (raw - reduction).max(config.minimum_damage);
    if defender.stance.contains(StanceFlags::BLOCKING) {
        (mitigated * config.block_factor, true)
    } else {
        (mitigated, false)
    }
}

#[allow(clippy::cast_precision_loss)]
fn percent(roll: u32) -> f32 {
    roll as f32
}

#[allow(clippy::cast_precision_loss)]
pub(crate) fn stat(value: i32) -> f32 {
    value as f32
}
