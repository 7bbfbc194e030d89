//! Test helpers: scripted dice and combatant factories.
//!
//! [`ScriptedDice`] replays a fixed sequence of rolls so tests can force a
//! hit, a miss or a parry without searching for a seed. Once a queue runs dry
//! it falls back to the least eventful value: the highest face for rolls
//! (misses, no critical) and just under 1 for units (chances fail).

use std::collections::VecDeque;

use crate::config::CombatConfig;
use crate::dice::Dice;
use crate::entity::components::{Attribute, Attributes};
use crate::entity::{Combatant, CombatantId, TeamId};
use crate::session::Session;

// =============================================================================
// Scripted Dice
// =============================================================================

/// Dice that replay scripted values.
#[derive(Debug, Clone, Default)]
pub struct ScriptedDice {
    rolls: VecDeque<u32>,
    units: VecDeque<f32>,
}

impl ScriptedDice {
    /// Scripts both queues.
    pub fn new(rolls: impl IntoIterator<Item = u32>, units: impl IntoIterator<Item = f32>) -> Self {
        Self {
            rolls: rolls.into_iter().collect(),
            units: units.into_iter().collect(),
        }
    }

    /// Scripts die rolls only.
    pub fn rolls(rolls: impl IntoIterator<Item = u32>) -> Self {
        Self::new(rolls, std::iter::empty())
    }

    /// Scripts unit draws only.
    pub fn units(units: impl IntoIterator<Item = f32>) -> Self {
        Self::new(std::iter::empty(), units)
    }

    /// Scripted rolls not consumed yet.
    pub fn remaining_rolls(&self) -> usize {
        self.rolls.len()
    }
}

impl Dice for ScriptedDice {
    fn roll(&mut self, sides: u32) -> u32 {
        let sides = sides.max(1);
        self.rolls.pop_front().map_or(sides, |r| r.clamp(1, sides))
    }

    fn unit(&mut self) -> f32 {
        self.units.pop_front().unwrap_or(0.999)
    }
}

// =============================================================================
// Combatants
// =============================================================================

/// STR 16: attack power 13, everything else baseline.
pub fn warrior(team: u8) -> Combatant {
    Combatant::new("Warrior", TeamId::new(team))
        .with_attributes(Attributes::default().with(Attribute::Strength, 16))
}

/// All attributes 10: defense 10, attack power 10, initiative 10.
pub fn defender(team: u8) -> Combatant {
    Combatant::new("Defender", TeamId::new(team))
}

/// Player-controlled warrior (id 0) against a player-controlled defender (id 1).
///
/// Both initiative rolls are 10, so both score 20 and action speed alone
/// decides the order. `rolls` and `units` follow the initiative rolls.
pub fn scripted_duel(
    rolls: impl IntoIterator<Item = u32>,
    units: impl IntoIterator<Item = f32>,
) -> Session<ScriptedDice> {
    scripted_session(vec![warrior(0), defender(1)], rolls, units)
}

/// A session over `roster` whose initiative rolls are all 10.
pub fn scripted_session(
    roster: Vec<Combatant>,
    rolls: impl IntoIterator<Item = u32>,
    units: impl IntoIterator<Item = f32>,
) -> Session<ScriptedDice> {
    let initiative = std::iter::repeat(10).take(roster.len());
    let dice = ScriptedDice::new(initiative.chain(rolls), units);
    Session::with_dice(roster, CombatConfig::default(), dice).unwrap()
}

/// Shorthand for an id.
pub fn id(raw: u64) -> CombatantId {
    CombatantId::new(raw)
}

/// Current health of a combatant in a session.
pub fn health<D: Dice>(session: &Session<D>, raw: u64) -> f32 {
    session.combatant(id(raw)).map_or(0.0, |c| c.resources.health)
}

/// Asserts two floats are within `1e-3`.
#[track_caller]
pub fn assert_close(actual: f32, expected: f32) {
    assert!(
        (actual - expected).abs() < 1e-3,
        "expected {expected}, got {actual}"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_rolls_replay_then_fall_back() {
        let mut dice = ScriptedDice::new([3, 250], [0.25]);
        assert_eq!(dice.roll(20), 3);
        assert_eq!(dice.roll(100), 100);
        assert_eq!(dice.roll(6), 6);
        assert!((dice.unit() - 0.25).abs() < f32::EPSILON);
        assert!(!dice.chance(0.9));
        assert_eq!(dice.remaining_rolls(), 0);
    }
}
