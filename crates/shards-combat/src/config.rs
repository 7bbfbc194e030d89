//! Tunable combat rules.
//!
//! [`CombatConfig`] carries every constant the resolver, status engine, AI and
//! session read. The defaults reproduce the standard rule set; callers may
//! deserialize their own values and must call [`CombatConfig::validate`]
//! (session creation does this for them).

use serde::{Deserialize, Serialize};

use crate::ai::{BehaviorTables, ProfileThresholds};
use crate::error::ConfigError;
use crate::resolver::BasicAction;
use crate::status::{StatusGrant, StatusKind};

/// A status effect an attack may inflict on hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnHitEffect {
    /// Effect to grant.
    pub grant: StatusGrant,
    /// Probability of applying it on a landed hit.
    pub chance: f32,
}

/// Rules of one basic action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionProfile {
    /// Stamina cost.
    pub stamina_cost: f32,
    /// Multiplier on the attacker's accuracy.
    pub accuracy_multiplier: f32,
    /// Multiplier on initiative when ordering the round.
    pub speed: f32,
    /// Multiplier on attack power. Zero for non-attacks.
    pub damage_multiplier: f32,
    /// Added to the attacker's critical chance.
    pub critical_bonus: f32,
    /// Whether a parrying defender may parry it.
    pub parryable: bool,
    /// Status inflicted on hit.
    pub on_hit: Option<OnHitEffect>,
}

impl ActionProfile {
    const fn stance(stamina_cost: f32, speed: f32) -> Self {
        Self {
            stamina_cost,
            accuracy_multiplier: 1.0,
            speed,
            damage_multiplier: 0.0,
            critical_bonus: 0.0,
            parryable: false,
            on_hit: None,
        }
    }
}

/// The basic action table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionTable {
    /// Light attack.
    pub light: ActionProfile,
    /// Heavy attack.
    pub heavy: ActionProfile,
    /// Dodge stance.
    pub dodge: ActionProfile,
    /// Block stance.
    pub block: ActionProfile,
    /// Parry stance.
    pub parry: ActionProfile,
}

impl Default for ActionTable {
    fn default() -> Self {
        Self {
            light: ActionProfile {
                stamina_cost: 15.0,
                accuracy_multiplier: 1.1,
                speed: 1.2,
                damage_multiplier: 1.0,
                critical_bonus: 0.05,
                parryable: true,
                on_hit: None,
            },
            heavy: ActionProfile {
                stamina_cost: 35.0,
                accuracy_multiplier: 0.8,
                speed: 0.7,
                damage_multiplier: 2.2,
                critical_bonus: 0.15,
                parryable: true,
                on_hit: Some(OnHitEffect {
                    grant: StatusGrant::new(StatusKind::Bleed, 5.0, 3),
                    chance: 0.3,
                }),
            },
            dodge: ActionProfile::stance(20.0, 1.5),
            block: ActionProfile::stance(10.0, 1.3),
            parry: ActionProfile::stance(25.0, 1.4),
        }
    }
}

impl ActionTable {
    /// Returns the profile of a basic action.
    #[must_use]
    pub const fn get(&self, action: BasicAction) -> &ActionProfile {
        match action {
            BasicAction::Light => &self.light,
            BasicAction::Heavy => &self.heavy,
            BasicAction::Dodge => &self.dodge,
            BasicAction::Block => &self.block,
            BasicAction::Parry => &self.parry,
        }
    }

    fn iter(&self) -> impl Iterator<Item = (BasicAction, &ActionProfile)> + '_ {
        BasicAction::ALL.into_iter().map(move |a| (a, self.get(a)))
    }
}

/// Inclusive bounds on any percentile chance, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChanceBounds {
    /// Lowest chance.
    pub min: f32,
    /// Highest chance.
    pub max: f32,
}

impl ChanceBounds {
    /// Clamps a chance into the bounds.
    #[must_use]
    pub fn clamp(&self, chance: f32) -> f32 {
        chance.clamp(self.min, self.max)
    }
}

impl Default for ChanceBounds {
    fn default() -> Self {
        Self { min: 5.0, max: 95.0 }
    }
}

/// Rules of a combat session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Basic action table.
    pub actions: ActionTable,
    /// Stamina restored to every living combatant at the end of a round.
    pub stamina_regen: f32,
    /// Damage multiplier against a blocking defender.
    pub block_factor: f32,
    /// Share of defense subtracted from raw damage.
    pub defense_mitigation: f32,
    /// Floor of mitigated damage.
    pub minimum_damage: f32,
    /// Bounds on hit and parry chances.
    pub hit_chance_bounds: ChanceBounds,
    /// Parry chance before initiative, in percent.
    pub parry_base: f32,
    /// Parry chance per point of initiative, in percent.
    pub parry_per_initiative: f32,
    /// Multiplier on the parrying defender's attack power for the counter-hit.
    pub parry_counter_multiplier: f32,
    /// Probability a flee attempt succeeds.
    pub flee_chance: f32,
    /// Sides of the die added to initiative.
    pub initiative_die: u32,
    /// Step used by buffs and debuffs with potency 0.
    pub buff_step: f32,
    /// Rounds after which the session ends in a draw. 0 means unbounded.
    pub max_rounds: u32,
    /// AI weight tables.
    pub behaviors: BehaviorTables,
    /// AI profile switch thresholds.
    pub thresholds: ProfileThresholds,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            actions: ActionTable::default(),
            stamina_regen: 10.0,
            block_factor: 0.4,
            defense_mitigation: 0.5,
            minimum_damage: 1.0,
            hit_chance_bounds: ChanceBounds::default(),
            parry_base: 30.0,
            parry_per_initiative: 2.0,
            parry_counter_multiplier: 1.0,
            flee_chance: 0.5,
            initiative_die: 20,
            buff_step: 0.25,
            max_rounds: 100,
            behaviors: BehaviorTables::default(),
            thresholds: ProfileThresholds::default(),
        }
    }
}

impl CombatConfig {
    /// Parry chance in percent for a defender with `initiative`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn parry_chance(&self, initiative: i32) -> f32 {
        self.hit_chance_bounds
            .clamp(self.parry_base + self.parry_per_initiative * initiative as f32)
    }

    /// Checks every value for range and consistency.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (action, profile) in self.actions.iter() {
            non_negative("actions.stamina_cost", profile.stamina_cost)?;
            non_negative("actions.accuracy_multiplier", profile.accuracy_multiplier)?;
            non_negative("actions.damage_multiplier", profile.damage_multiplier)?;
            probability("actions.critical_bonus", profile.critical_bonus)?;
            if !(profile.speed.is_finite() && profile.speed > 0.0) {
                return Err(ConfigError::OutOfRange {
                    field: "actions.speed",
                    reason: format!("{action} speed must be positive, got {}", profile.speed),
                });
            }
            if let Some(on_hit) = &profile.on_hit {
                probability("actions.on_hit.chance", on_hit.chance)?;
                non_negative("actions.on_hit.potency", on_hit.grant.potency)?;
            }
        }
        non_negative("stamina_regen", self.stamina_regen)?;
        probability("block_factor", self.block_factor)?;
        non_negative("defense_mitigation", self.defense_mitigation)?;
        non_negative("minimum_damage", self.minimum_damage)?;
        non_negative("parry_counter_multiplier", self.parry_counter_multiplier)?;
        probability("flee_chance", self.flee_chance)?;
        non_negative("buff_step", self.buff_step)?;

        let bounds = self.hit_chance_bounds;
        if !(0.0..=100.0).contains(&bounds.min)
            || !(0.0..=100.0).contains(&bounds.max)
            || bounds.min > bounds.max
        {
            return Err(ConfigError::OutOfRange {
                field: "hit_chance_bounds",
                reason: format!("expected 0 <= min <= max <= 100, got [{}, {}]", bounds.min, bounds.max),
            });
        }
        if self.initiative_die == 0 {
            return Err(ConfigError::OutOfRange {
                field: "initiative_die",
                reason: "the die needs at least one side".into(),
            });
        }

        self.behaviors.validate()?;
        self.thresholds.validate()
    }
}

pub(crate) fn probability(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidProbability { field, value })
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            reason: format!("expected a finite non-negative value, got {value}"),
        })
    }
}
