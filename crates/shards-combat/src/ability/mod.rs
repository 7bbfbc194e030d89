//! Ability System.
//!
//! Abilities are named actions with a resource cost, a cooldown and an effect
//! template. Definitions are immutable reference data
//! ([`AbilityDefinition`]); runtime state (remaining cooldown, use count)
//! lives in the owning combatant's ability slots.
//!
//! - [`catalog`]: the class ability catalog
//! - [`activate`]: validation and resolution of an ability use
//!
//! # Magnitude
//!
//! Damage and healing scale with the summed modifiers of the scaling
//! attributes: `base × (1 + scaling_mod × scaling_factor)`, never below zero.
//!
//! # Example
//!
//! ```
//! use shards_combat::ability::{AbilityDefinition, TargetMode};
//! use shards_combat::entity::components::{Attribute, Attributes, ResourceKind};
//!
//! let fireball = AbilityDefinition::new("Fireball", ResourceKind::Mana, 30.0, 1, TargetMode::SingleEnemy)
//!     .with_damage(35.0)
//!     .scaling(&[Attribute::Intelligence], 0.2);
//!
//! let caster = Attributes::default().with(Attribute::Intelligence, 16);
//! // 35 * (1 + 3 * 0.2) = 56
//! assert!((fireball.damage_for(&caster) - 56.0).abs() < 1e-4);
//! ```

pub mod catalog;
mod system;

pub use catalog::{abilities_for, find, ClassKind};
pub use system::{activate, validate_use};
pub(crate) use system::select_targets;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::entity::components::{Attribute, Attributes, ResourceKind};
use crate::error::ConfigError;
use crate::status::StatusGrant;

/// Whom an ability may be aimed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetMode {
    /// The caster.
    SelfOnly,
    /// One living opponent.
    SingleEnemy,
    /// Every living opponent.
    AllEnemies,
}

impl fmt::Display for TargetMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SelfOnly => f.write_str("self"),
            Self::SingleEnemy => f.write_str("single enemy"),
            Self::AllEnemies => f.write_str("all enemies"),
        }
    }
}

/// A resource granted to the caster on use.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResourceGain {
    /// Pool restored.
    pub resource: ResourceKind,
    /// Amount restored.
    pub amount: f32,
}

/// Immutable definition of an ability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbilityDefinition {
    /// Unique name within a combatant's kit.
    pub name: String,
    /// Player-facing description.
    #[serde(default)]
    pub description: String,
    /// Pool the cost is paid from.
    pub resource: ResourceKind,
    /// Cost.
    pub cost: f32,
    /// Cooldown length in rounds. Negative values are rejected by [`validate`](Self::validate).
    pub cooldown: i32,
    /// Target mode.
    pub target: TargetMode,
    /// Base damage. Zero for non-damaging abilities.
    #[serde(default)]
    pub damage: f32,
    /// Base healing. On a damaging ability it heals the caster on a landed hit.
    #[serde(default)]
    pub healing: f32,
    /// Attributes whose modifiers are summed for scaling.
    #[serde(default)]
    pub scaling: Vec<Attribute>,
    /// Scaling factor.
    #[serde(default)]
    pub scaling_factor: f32,
    /// Status effect applied on use (or on a landed hit for damaging abilities).
    #[serde(default)]
    pub status: Option<StatusGrant>,
    /// Whether hits may be critical.
    #[serde(default = "default_true")]
    pub can_critical: bool,
    /// Whether hits skip the defense subtraction.
    #[serde(default)]
    pub ignores_defense: bool,
    /// Resource restored to the caster on use.
    #[serde(default)]
    pub restores: Option<ResourceGain>,
}

const fn default_true() -> bool {
    true
}

impl AbilityDefinition {
    /// Creates an ability with no effect.
    pub fn new(
        name: impl Into<String>,
        resource: ResourceKind,
        cost: f32,
        cooldown: i32,
        target: TargetMode,
    ) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            resource,
            cost,
            cooldown,
            target,
            damage: 0.0,
            healing: 0.0,
            scaling: Vec::new(),
            scaling_factor: 0.0,
            status: None,
            can_critical: true,
            ignores_defense: false,
            restores: None,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets base damage.
    #[must_use]
    pub fn with_damage(mut self, damage: f32) -> Self {
        self.damage = damage;
        self
    }

    /// Sets base healing.
    #[must_use]
    pub fn with_healing(mut self, healing: f32) -> Self {
        self.healing = healing;
        self
    }

    /// Sets scaling attributes and factor.
    #[must_use]
    pub fn scaling(mut self, attributes: &[Attribute], factor: f32) -> Self {
        self.scaling = attributes.to_vec();
        self.scaling_factor = factor;
        self
    }

    /// Sets the status effect.
    #[must_use]
    pub fn with_status(mut self, grant: StatusGrant) -> Self {
        self.status = Some(grant);
        self
    }

    /// Disables critical hits.
    #[must_use]
    pub fn never_critical(mut self) -> Self {
        self.can_critical = false;
        self
    }

    /// Skips the defense subtraction.
    #[must_use]
    pub fn ignoring_defense(mut self) -> Self {
        self.ignores_defense = true;
        self
    }

    /// Restores a resource to the caster on use.
    #[must_use]
    pub fn restoring(mut self, resource: ResourceKind, amount: f32) -> Self {
        self.restores = Some(ResourceGain { resource, amount });
        self
    }

    /// Returns true if the ability deals damage.
    #[must_use]
    pub fn is_damaging(&self) -> bool {
        self.damage > 0.0
    }

    /// Cooldown as an unsigned round count.
    #[must_use]
    pub fn cooldown_rounds(&self) -> u32 {
        u32::try_from(self.cooldown).unwrap_or(0)
    }

    /// `1 + scaling_mod × scaling_factor`, floored at zero.
    #[must_use]
    pub fn scale(&self, attributes: &Attributes) -> f32 {
        let scaling_mod: i32 = self.scaling.iter().map(|a| attributes.modifier(*a)).sum();
        #[allow(clippy::cast_precision_loss)]
        let scaling_mod = scaling_mod as f32;
        (1.0 + scaling_mod * self.scaling_factor).max(0.0)
    }

    /// Scaled damage for a caster.
    #[must_use]
    pub fn damage_for(&self, attributes: &Attributes) -> f32 {
        self.damage * self.scale(attributes)
    }

    /// Scaled healing for a caster.
    #[must_use]
    pub fn healing_for(&self, attributes: &Attributes) -> f32 {
        self.healing * self.scale(attributes)
    }

    /// Checks the definition for malformed values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MalformedAbility`] for an empty name, a negative
    /// or non-finite cost, a negative cooldown, or non-finite magnitudes.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let malformed = |reason: &str| ConfigError::MalformedAbility {
            name: self.name.clone(),
            reason: reason.to_string(),
        };
        if self.name.trim().is_empty() {
            return Err(malformed("name is empty"));
        }
        if !self.cost.is_finite() || self.cost < 0.0 {
            return Err(malformed("cost must be finite and non-negative"));
        }
        if self.cooldown < 0 {
            return Err(malformed("cooldown must not be negative"));
        }
        let magnitudes = [self.damage, self.healing, self.scaling_factor];
        if magnitudes.iter().any(|m| !m.is_finite() || *m < 0.0) {
            return Err(malformed("damage, healing and scaling must be finite and non-negative"));
        }
        if let Some(grant) = &self.status {
            if !grant.potency.is_finite() || grant.potency < 0.0 {
                return Err(malformed("status potency must be finite and non-negative"));
            }
        }
        if let Some(gain) = &self.restores {
            if !gain.amount.is_finite() || gain.amount < 0.0 {
                return Err(malformed("restored amount must be finite and non-negative"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod definition_tests {
        use super::*;

        #[test]
        fn scaling_sums_modifiers() {
            let whirlwind = AbilityDefinition::new(
                "Whirlwind Strike",
                ResourceKind::Stamina,
                40.0,
                3,
                TargetMode::AllEnemies,
            )
            .with_damage(25.0)
            .scaling(&[Attribute::Strength, Attribute::Dexterity], 0.15);
            let attrs = Attributes::default()
                .with(Attribute::Strength, 16)
                .with(Attribute::Dexterity, 14);
            // mods 3 + 2 = 5; 25 * (1 + 5 * 0.15) = 43.75
            assert!((whirlwind.damage_for(&attrs) - 43.75).abs() < 1e-4);
        }

        #[test]
        fn negative_scaling_never_flips_sign() {
            let bolt = AbilityDefinition::new("Bolt", ResourceKind::Mana, 10.0, 0, TargetMode::SingleEnemy)
                .with_damage(10.0)
                .scaling(&[Attribute::Intelligence], 1.0);
            let weak = Attributes::default().with(Attribute::Intelligence, 1);
            assert_eq!(bolt.damage_for(&weak), 0.0);
        }

        #[test]
        fn negative_cooldown_is_malformed() {
            let bad = AbilityDefinition::new("Bad", ResourceKind::Stamina, 5.0, -1, TargetMode::SelfOnly);
            assert!(matches!(
                bad.validate(),
                Err(ConfigError::MalformedAbility { .. })
            ));
            assert_eq!(bad.cooldown_rounds(), 0);
        }

        #[test]
        fn nan_cost_is_malformed() {
            let bad = AbilityDefinition::new("Bad", ResourceKind::Mana, f32::NAN, 1, TargetMode::SelfOnly);
            assert!(bad.validate().is_err());
        }

        #[test]
        fn definitions_deserialize_with_defaults() {
            let json = r#"{
                "name": "Jab",
                "resource": "Stamina",
                "cost": 5.0,
                "cooldown": 0,
                "target": "SingleEnemy",
                "damage": 8.0
            }"#;
            let jab: AbilityDefinition = serde_json::from_str(json).unwrap();
            assert!(jab.can_critical);
            assert!(jab.is_damaging());
            assert_eq!(jab.validate(), Ok(()));
        }
    }
}
