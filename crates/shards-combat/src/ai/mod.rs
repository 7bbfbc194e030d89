//! AI Policy Engine.
//!
//! Chooses the action of an AI-controlled combatant each round. A
//! [`BehaviorProfile`] selects one of the [`BehaviorTables`] through a few
//! health-fraction rules; the action is then a weighted draw over that table.
//!
//! # Profiles
//!
//! | Profile | Table |
//! |---|---|
//! | Aggressive | aggressive |
//! | Defensive | defensive |
//! | Balanced | balanced |
//! | Tactical | defensive when hurt, aggressive when the foe is hurt, else balanced |
//! | Berserker | berserker |
//! | Coward | defensive when hurt, else balanced |
//!
//! Any profile switches to Berserker once its own health fraction falls below
//! the controller's enrage threshold.
//!
//! # Determinism
//!
//! Every random choice goes through the supplied [`Dice`], so a seeded session
//! replays the same decisions.

mod weights;

pub use weights::{BehaviorTables, ProfileThresholds, WeightTable};

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ability::{validate_use, AbilityDefinition, TargetMode};
use crate::config::CombatConfig;
use crate::dice::Dice;
use crate::entity::{Combatant, CombatantId, ResourceKind};
use crate::resolver::{BasicAction, CombatAction, Target};

/// Default health fraction below which a controller enrages.
pub const DEFAULT_ENRAGE_THRESHOLD: f32 = 0.25;

/// How an AI combatant weighs its options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BehaviorProfile {
    /// Favors heavy attacks.
    Aggressive,
    /// Favors block and parry.
    Defensive,
    /// No preference.
    #[default]
    Balanced,
    /// Reacts to both combatants' health.
    Tactical,
    /// Attacks only.
    Berserker,
    /// Turns defensive when hurt.
    Coward,
}

impl fmt::Display for BehaviorProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Aggressive => "aggressive",
            Self::Defensive => "defensive",
            Self::Balanced => "balanced",
            Self::Tactical => "tactical",
            Self::Berserker => "berserker",
            Self::Coward => "coward",
        };
        f.write_str(name)
    }
}

/// Per-combatant AI settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AiController {
    /// Configured profile.
    pub profile: BehaviorProfile,
    /// Own health fraction below which the profile becomes Berserker.
    pub enrage_threshold: f32,
}

impl Default for AiController {
    fn default() -> Self {
        Self::new(BehaviorProfile::default())
    }
}

impl AiController {
    /// Creates a controller with the default enrage threshold.
    #[must_use]
    pub const fn new(profile: BehaviorProfile) -> Self {
        Self {
            profile,
            enrage_threshold: DEFAULT_ENRAGE_THRESHOLD,
        }
    }

    /// Replaces the enrage threshold.
    #[must_use]
    pub const fn with_enrage_threshold(mut self, threshold: f32) -> Self {
        self.enrage_threshold = threshold;
        self
    }

    /// The profile in effect given both sides' health fractions.
    ///
    /// Always one of Aggressive, Defensive, Balanced or Berserker.
    #[must_use]
    pub fn active_profile(
        &self,
        own_health: f32,
        opponent_health: f32,
        thresholds: &ProfileThresholds,
    ) -> BehaviorProfile {
        if own_health < self.enrage_threshold {
            return BehaviorProfile::Berserker;
        }
        match self.profile {
            BehaviorProfile::Tactical if own_health < thresholds.tactical_low => {
                BehaviorProfile::Defensive
            }
            BehaviorProfile::Tactical if opponent_health < thresholds.tactical_low => {
                BehaviorProfile::Aggressive
            }
            BehaviorProfile::Coward if own_health < thresholds.coward => BehaviorProfile::Defensive,
            BehaviorProfile::Tactical | BehaviorProfile::Coward => BehaviorProfile::Balanced,
            concrete => concrete,
        }
    }

    /// Chooses an action for `me` against `opponents`.
    ///
    /// The target is the living opponent with the lowest health fraction
    /// (lower id on ties). With the active table's ability chance the AI uses
    /// a ready, affordable ability; otherwise it draws a basic action among
    /// those it can pay for, or takes the table's fallback if it can pay for
    /// none. With no living opponent it blocks.
    pub fn choose_action(
        &self,
        me: &Combatant,
        opponents: &[&Combatant],
        config: &CombatConfig,
        dice: &mut dyn Dice,
    ) -> CombatAction {
        let Some(target) = weakest(opponents) else {
            return CombatAction::block();
        };

        let active = self.active_profile(
            me.health_fraction(),
            target.health_fraction(),
            &config.thresholds,
        );
        let table = table_for(&config.behaviors, active);
        let ability_chance = if self.profile == BehaviorProfile::Tactical {
            config.behaviors.tactical_ability_chance
        } else {
            table.ability_chance
        };

        let candidates = usable_abilities(me, config);
        if !candidates.is_empty() && dice.chance(ability_chance) {
            let index = dice.roll(u32::try_from(candidates.len()).unwrap_or(u32::MAX)) - 1;
            if let Some(ability) = usize::try_from(index).ok().and_then(|i| candidates.get(i)) {
                tracing::trace!(actor = %me.id(), ability = %ability.name, "ai chose ability");
                return ability_action(ability, target.id());
            }
        }

        let action = draw(table, me, config, dice);
        tracing::trace!(actor = %me.id(), profile = %active, %action, "ai chose basic action");
        if action.is_attack() {
            CombatAction::basic(action, Target::Enemy(target.id()))
        } else {
            CombatAction::basic(action, Target::Myself)
        }
    }
}

fn table_for(tables: &BehaviorTables, profile: BehaviorProfile) -> &WeightTable {
    match profile {
        BehaviorProfile::Aggressive => &tables.aggressive,
        BehaviorProfile::Defensive => &tables.defensive,
        BehaviorProfile::Berserker => &tables.berserker,
        BehaviorProfile::Balanced | BehaviorProfile::Tactical | BehaviorProfile::Coward => {
            &tables.balanced
        }
    }
}

/// The living opponent with the lowest health fraction, lower id on ties.
fn weakest<'a>(opponents: &[&'a Combatant]) -> Option<&'a Combatant> {
    opponents
        .iter()
        .copied()
        .filter(|c| c.is_alive())
        .min_by(|a, b| {
            a.health_fraction()
                .total_cmp(&b.health_fraction())
                .then(a.id().cmp(&b.id()))
        })
}

/// Abilities `me` could use this round, in name order.
fn usable_abilities<'a>(me: &'a Combatant, config: &CombatConfig) -> Vec<&'a AbilityDefinition> {
    let hurt = me.health_fraction() < config.thresholds.support;
    me.abilities()
        .filter_map(|slot| validate_use(me, &slot.definition.name).ok())
        .filter(|ability| {
            let supportive = ability.target == TargetMode::SelfOnly
                || (ability.healing > 0.0 && !ability.is_damaging());
            !supportive || hurt
        })
        .collect()
}

fn ability_action(ability: &AbilityDefinition, target: CombatantId) -> CombatAction {
    let target = match ability.target {
        TargetMode::SelfOnly => Target::Myself,
        TargetMode::SingleEnemy => Target::Enemy(target),
        TargetMode::AllEnemies => Target::AllEnemies,
    };
    CombatAction::ability(ability.name.clone(), target)
}

/// Weighted draw over the affordable entries of `table`.
fn draw(
    table: &WeightTable,
    me: &Combatant,
    config: &CombatConfig,
    dice: &mut dyn Dice,
) -> BasicAction {
    let affordable: Vec<(BasicAction, f32)> = table
        .weights
        .iter()
        .copied()
        .filter(|(action, weight)| {
            *weight > 0.0
                && me
                    .resources
                    .can_afford(ResourceKind::Stamina, config.actions.get(*action).stamina_cost)
        })
        .collect();
    let total: f32 = affordable.iter().map(|(_, w)| w).sum();
    let Some(&(last, _)) = affordable.last() else {
        return table.fallback;
    };

    let mut remaining = dice.unit() * total;
    for (action, weight) in &affordable {
        if remaining < *weight {
            return *action;
        }
        remaining -= weight;
    }
    last
}
