//! Behavior weight tables.
//!
//! Every AI distribution is plain data: a list of `(action, weight)` pairs, the
//! chance to try an ability first, and a fallback for when nothing in the
//! table is affordable. Tables live on [`CombatConfig`](crate::config::CombatConfig)
//! so callers can retune or replace them without touching the resolver.

use serde::{Deserialize, Serialize};

use crate::config::probability;
use crate::error::ConfigError;
use crate::resolver::BasicAction;

use BasicAction::{Block, Dodge, Heavy, Light, Parry};

/// A weighted distribution over basic actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightTable {
    /// Relative weights. They need not sum to any particular value.
    pub weights: Vec<(BasicAction, f32)>,
    /// Probability of using a ready ability instead of drawing from the table.
    pub ability_chance: f32,
    /// Action taken when no weighted action is affordable.
    pub fallback: BasicAction,
}

impl WeightTable {
    /// Creates a table falling back to Block.
    #[must_use]
    pub fn new(weights: &[(BasicAction, f32)], ability_chance: f32) -> Self {
        Self {
            weights: weights.to_vec(),
            ability_chance,
            fallback: Block,
        }
    }

    /// Replaces the fallback action.
    #[must_use]
    pub const fn with_fallback(mut self, fallback: BasicAction) -> Self {
        self.fallback = fallback;
        self
    }

    /// Weight of one action, zero if absent.
    #[must_use]
    pub fn weight(&self, action: BasicAction) -> f32 {
        self.weights
            .iter()
            .filter(|(a, _)| *a == action)
            .map(|(_, w)| *w)
            .sum()
    }

    /// Total weight.
    #[must_use]
    pub fn total(&self) -> f32 {
        self.weights.iter().map(|(_, w)| *w).sum()
    }

    /// Checks weights and the ability chance.
    ///
    /// # Errors
    ///
    /// Returns an error for a negative or non-finite weight, a table whose
    /// weights sum to zero, or an ability chance outside `[0, 1]`.
    pub fn validate(&self, name: &'static str) -> Result<(), ConfigError> {
        if let Some((action, weight)) = self
            .weights
            .iter()
            .find(|(_, w)| !w.is_finite() || *w < 0.0)
        {
            return Err(ConfigError::OutOfRange {
                field: name,
                reason: format!("weight for {action} must be finite and non-negative, got {weight}"),
            });
        }
        if self.total() <= 0.0 {
            return Err(ConfigError::OutOfRange {
                field: name,
                reason: "weights sum to zero".into(),
            });
        }
        probability(name, self.ability_chance)
    }
}

/// The four concrete distributions the profiles draw from.
///
/// Tactical and Coward have no table of their own; their rules pick one of
/// these each round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorTables {
    /// Heavy-leaning offense.
    pub aggressive: WeightTable,
    /// Block and parry.
    pub defensive: WeightTable,
    /// Uniform over the five basic actions.
    pub balanced: WeightTable,
    /// Attacks only.
    pub berserker: WeightTable,
    /// Ability chance used by Tactical combatants whatever table is active.
    pub tactical_ability_chance: f32,
}

impl Default for BehaviorTables {
    fn default() -> Self {
        Self {
            aggressive: WeightTable::new(&[(Heavy, 60.0), (Light, 30.0), (Block, 10.0)], 0.2),
            defensive: WeightTable::new(
                &[(Block, 25.0), (Parry, 25.0), (Light, 30.0), (Heavy, 20.0)],
                0.15,
            ),
            balanced: WeightTable::new(
                &[
                    (Light, 20.0),
                    (Heavy, 20.0),
                    (Dodge, 20.0),
                    (Block, 20.0),
                    (Parry, 20.0),
                ],
                0.15,
            ),
            berserker: WeightTable::new(&[(Heavy, 80.0), (Light, 20.0)], 0.2).with_fallback(Light),
            tactical_ability_chance: 0.35,
        }
    }
}

impl BehaviorTables {
    /// Checks every table.
    ///
    /// # Errors
    ///
    /// Returns the first invalid table or chance.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.aggressive.validate("behaviors.aggressive")?;
        self.defensive.validate("behaviors.defensive")?;
        self.balanced.validate("behaviors.balanced")?;
        self.berserker.validate("behaviors.berserker")?;
        probability("behaviors.tactical_ability_chance", self.tactical_ability_chance)
    }
}

/// Health fractions at which profile rules switch tables.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileThresholds {
    /// Tactical turns defensive below this own health, aggressive below this
    /// opponent health.
    pub tactical_low: f32,
    /// Coward turns defensive below this own health.
    pub coward: f32,
    /// Self-targeted and healing abilities are considered only below this own health.
    pub support: f32,
}

impl Default for ProfileThresholds {
    fn default() -> Self {
        Self {
            tactical_low: 0.3,
            coward: 0.5,
            support: 0.5,
        }
    }
}

impl ProfileThresholds {
    /// Checks that every threshold is a fraction.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidProbability`] for a value outside `[0, 1]`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        probability("thresholds.tactical_low", self.tactical_low)?;
        probability("thresholds.coward", self.coward)?;
        probability("thresholds.support", self.support)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_tables_match_profiles() {
        let tables = BehaviorTables::default();
        assert!((tables.aggressive.weight(Heavy) / tables.aggressive.total() - 0.6).abs() < 1e-6);
        assert!(
            (tables.defensive.weight(Block) + tables.defensive.weight(Parry)
                - 0.5 * tables.defensive.total())
            .abs()
                < 1e-4
        );
        assert_eq!(tables.berserker.weight(Block), 0.0);
        assert_eq!(tables.berserker.weight(Dodge), 0.0);
        assert_eq!(tables.berserker.fallback, Light);
        for action in BasicAction::ALL {
            assert!((tables.balanced.weight(action) - 20.0).abs() < 1e-6);
        }
        assert_eq!(tables.validate(), Ok(()));
    }

    #[test]
    fn empty_table_is_invalid() {
        let table = WeightTable::new(&[(Light, 0.0)], 0.1);
        assert!(matches!(
            table.validate("behaviors.balanced"),
            Err(ConfigError::OutOfRange { .. })
        ));
    }

    #[test]
    fn thresholds_must_be_fractions() {
        let thresholds = ProfileThresholds {
            coward: 1.2,
            ..ProfileThresholds::default()
        };
        assert!(thresholds.validate().is_err());
    }
}
