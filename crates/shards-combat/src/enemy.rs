//! Enemy templates.
//!
//! Reference data for non-player combatants: tier, base level, behavior,
//! base pools and attributes, enrage threshold and special abilities. A
//! template [`spawn`](EnemyTemplate::spawn)s an AI-controlled [`Combatant`]
//! scaled to a level.
//!
//! # Level scaling
//!
//! Attributes and pools are multiplied by `1 + 0.15 × (level − 1)` and
//! truncated. Wisdom is fixed at 10, charisma at 5 and mana at 50.
//!
//! # Example
//!
//! ```
//! use shards_combat::enemy::template;
//! use shards_combat::entity::TeamId;
//!
//! let wolf = template("corrupt_wolf").unwrap().spawn(3, TeamId::new(1));
//! assert_eq!(wolf.name, "Corrupt Wolf (Lv3)");
//! assert_eq!(wolf.resources.max_health, 78.0);
//! assert!(wolf.is_ai());
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ability::{AbilityDefinition, TargetMode};
use crate::ai::{AiController, BehaviorProfile};
use crate::dice::Dice;
use crate::entity::components::{Attribute, Attributes, ResourceKind, Resources};
use crate::entity::{Combatant, TeamId};
use crate::error::ConfigError;
use crate::status::{StatusGrant, StatusKind};

/// Difficulty tier of an enemy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EnemyTier {
    /// Common foes.
    Basic,
    /// Stronger regulars.
    Elite,
    /// Area bosses.
    MiniBoss,
    /// Story bosses.
    Boss,
    /// Shared raid bosses.
    WorldBoss,
}

impl EnemyTier {
    /// Largest level gap at which a template of this tier suits a player.
    #[must_use]
    pub const fn max_level_gap(self) -> u32 {
        match self {
            Self::Basic => 2,
            Self::Elite => 3,
            Self::MiniBoss => 5,
            Self::Boss | Self::WorldBoss => u32::MAX,
        }
    }
}

impl fmt::Display for EnemyTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Basic => "basic",
            Self::Elite => "elite",
            Self::MiniBoss => "mini boss",
            Self::Boss => "boss",
            Self::WorldBoss => "world boss",
        };
        f.write_str(name)
    }
}

/// Template for spawning enemies.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnemyTemplate {
    /// Lookup key.
    pub key: &'static str,
    /// Display name.
    pub name: &'static str,
    /// Difficulty tier.
    pub tier: EnemyTier,
    /// Level used when no other is given.
    pub level: u32,
    /// AI profile.
    pub behavior: BehaviorProfile,
    /// Max health at level 1.
    pub base_health: u32,
    /// Max stamina at level 1.
    pub base_stamina: u32,
    /// Strength at level 1.
    pub strength: i32,
    /// Dexterity at level 1.
    pub dexterity: i32,
    /// Constitution at level 1.
    pub constitution: i32,
    /// Intelligence at level 1.
    pub intelligence: i32,
    /// Health fraction below which the enemy enrages.
    pub enrage_threshold: f32,
    /// Keys of the special abilities the enemy knows.
    pub abilities: &'static [&'static str],
}

impl EnemyTemplate {
    /// Spawns an AI-controlled combatant of this template at `level` on `team`.
    ///
    /// Level 0 is treated as 1. Special abilities without a definition are skipped.
    #[must_use]
    pub fn spawn(&self, level: u32, team: TeamId) -> Combatant {
        let level = level.max(1);
        let attributes = Attributes {
            strength: scale(self.strength, level),
            dexterity: scale(self.dexterity, level),
            constitution: scale(self.constitution, level),
            intelligence: scale(self.intelligence, level),
            wisdom: 10,
            charisma: 5,
        };
        let health = scale_pool(self.base_health, level);
        let stamina = scale_pool(self.base_stamina, level);

        let mut enemy = Combatant::new(format!("{} (Lv{level})", self.name), team)
            .with_attributes(attributes)
            .with_resources(Resources::full(health, stamina, ENEMY_MANA))
            .with_level(level)
            .with_ai(
                AiController::new(self.behavior).with_enrage_threshold(self.enrage_threshold),
            )
            .with_abilities(self.abilities.iter().filter_map(|key| special_ability(key)));
        enemy.tier = Some(self.tier);
        enemy
    }

    /// Spawns at the template's own level.
    #[must_use]
    pub fn spawn_default(&self, team: TeamId) -> Combatant {
        self.spawn(self.level, team)
    }
}

const ENEMY_MANA: f32 = 50.0;

/// `value × (1 + 0.15 × (level − 1))`, truncated, in exact integer arithmetic.
fn scale(value: i32, level: u32) -> i32 {
    let percent = 100 + 15 * i64::from(level.saturating_sub(1));
    i32::try_from(i64::from(value) * percent / 100).unwrap_or(i32::MAX)
}

#[allow(clippy::cast_precision_loss)]
fn scale_pool(value: u32, level: u32) -> f32 {
    scale(i32::try_from(value).unwrap_or(i32::MAX), level).max(1) as f32
}

static TEMPLATES: [EnemyTemplate; 9] = [
    EnemyTemplate {
        key: "hollow_soldier",
        name: "Hollow Soldier",
        tier: EnemyTier::Basic,
        level: 1,
        behavior: BehaviorProfile::Balanced,
        base_health: 50,
        base_stamina: 80,
        strength: 10,
        dexterity: 8,
        constitution: 10,
        intelligence: 6,
        enrage_threshold: 0.25,
        abilities: &[],
    },
    EnemyTemplate {
        key: "corrupt_wolf",
        name: "Corrupt Wolf",
        tier: EnemyTier::Basic,
        level: 2,
        behavior: BehaviorProfile::Aggressive,
        base_health: 60,
        base_stamina: 100,
        strength: 12,
        dexterity: 14,
        constitution: 8,
        intelligence: 4,
        enrage_threshold: 0.25,
        abilities: &["bleed_bite"],
    },
    EnemyTemplate {
        key: "skeleton_warrior",
        name: "Skeleton Warrior",
        tier: EnemyTier::Basic,
        level: 3,
        behavior: BehaviorProfile::Defensive,
        base_health: 70,
        base_stamina: 70,
        strength: 11,
        dexterity: 10,
        constitution: 8,
        intelligence: 5,
        enrage_threshold: 0.25,
        abilities: &[],
    },
    EnemyTemplate {
        key: "dark_knight",
        name: "Dark Knight",
        tier: EnemyTier::Elite,
        level: 5,
        behavior: BehaviorProfile::Tactical,
        base_health: 150,
        base_stamina: 120,
        strength: 16,
        dexterity: 14,
        constitution: 15,
        intelligence: 10,
        enrage_threshold: 0.25,
        abilities: &["dark_wave", "shield_bash"],
    },
    EnemyTemplate {
        key: "frost_mage",
        name: "Frost Mage",
        tier: EnemyTier::Elite,
        level: 6,
        behavior: BehaviorProfile::Tactical,
        base_health: 100,
        base_stamina: 150,
        strength: 8,
        dexterity: 12,
        constitution: 10,
        intelligence: 18,
        enrage_threshold: 0.25,
        abilities: &["frost_bolt", "ice_shield", "freeze"],
    },
    EnemyTemplate {
        key: "corrupted_guardian",
        name: "Corrupted Guardian",
        tier: EnemyTier::MiniBoss,
        level: 8,
        behavior: BehaviorProfile::Defensive,
        base_health: 300,
        base_stamina: 150,
        strength: 18,
        dexterity: 10,
        constitution: 20,
        intelligence: 12,
        enrage_threshold: 0.3,
        abilities: &["ground_slam", "corrupted_aura", "regeneration"],
    },
    EnemyTemplate {
        key: "lord_of_cinders",
        name: "Lord of Cinders",
        tier: EnemyTier::Boss,
        level: 10,
        behavior: BehaviorProfile::Aggressive,
        base_health: 500,
        base_stamina: 200,
        strength: 22,
        dexterity: 16,
        constitution: 20,
        intelligence: 15,
        enrage_threshold: 0.15,
        abilities: &["flame_wave", "cinder_storm", "burning_blade"],
    },
    EnemyTemplate {
        key: "crystal_shard_guardian",
        name: "Crystal Shard Guardian",
        tier: EnemyTier::Boss,
        level: 12,
        behavior: BehaviorProfile::Tactical,
        base_health: 600,
        base_stamina: 250,
        strength: 20,
        dexterity: 18,
        constitution: 22,
        intelligence: 20,
        enrage_threshold: 0.1,
        abilities: &["crystal_spear", "shard_barrier"],
    },
    EnemyTemplate {
        key: "aetherfall_titan",
        name: "Aetherfall Titan",
        tier: EnemyTier::WorldBoss,
        level: 20,
        behavior: BehaviorProfile::Berserker,
        base_health: 2000,
        base_stamina: 500,
        strength: 30,
        dexterity: 15,
        constitution: 35,
        intelligence: 25,
        enrage_threshold: 0.1,
        abilities: &["titan_slam", "aether_beam", "earthquake"],
    },
];

/// Every template, weakest tier first.
#[must_use]
pub fn templates() -> &'static [EnemyTemplate] {
    &TEMPLATES
}

/// Looks up a template by key.
///
/// # Errors
///
/// Returns [`ConfigError::UnknownEnemy`] for an unknown key.
pub fn template(key: &str) -> Result<&'static EnemyTemplate, ConfigError> {
    TEMPLATES
        .iter()
        .find(|t| t.key == key)
        .ok_or_else(|| ConfigError::UnknownEnemy(key.to_string()))
}

/// Template keys, optionally restricted to one tier.
#[must_use]
pub fn list(tier: Option<EnemyTier>) -> Vec<&'static str> {
    TEMPLATES
        .iter()
        .filter(|t| tier.is_none_or(|tier| t.tier == tier))
        .map(|t| t.key)
        .collect()
}

/// Templates whose level suits a player of `player_level`.
///
/// Falls back to the hollow soldier when nothing matches.
#[must_use]
pub fn suitable_for(player_level: u32, tier: Option<EnemyTier>) -> Vec<&'static EnemyTemplate> {
    let suitable: Vec<_> = TEMPLATES
        .iter()
        .filter(|t| tier.is_none_or(|tier| t.tier == tier))
        .filter(|t| t.level.abs_diff(player_level) <= t.tier.max_level_gap())
        .collect();
    if suitable.is_empty() {
        vec![&TEMPLATES[0]]
    } else {
        suitable
    }
}

/// Picks a suitable template at random.
pub fn random_for_level(
    player_level: u32,
    tier: Option<EnemyTier>,
    dice: &mut dyn Dice,
) -> &'static EnemyTemplate {
    let suitable = suitable_for(player_level, tier);
    let sides = u32::try_from(suitable.len()).unwrap_or(u32::MAX);
    let index = usize::try_from(dice.roll(sides) - 1).unwrap_or(0);
    suitable.get(index).copied().unwrap_or(&TEMPLATES[0])
}

/// Definition of an enemy special ability by key.
///
/// Summons, phase changes and resurrection have no definition.
#[must_use]
pub fn special_ability(key: &str) -> Option<AbilityDefinition> {
    use Attribute::{Dexterity, Intelligence, Strength};
    use ResourceKind::{Mana, Stamina};
    use TargetMode::{AllEnemies, SelfOnly, SingleEnemy};

    let ability = match key {
        "bleed_bite" => AbilityDefinition::new("Bleed Bite", Stamina, 20.0, 2, SingleEnemy)
            .with_damage(12.0)
            .scaling(&[Strength], 0.1)
            .with_status(StatusGrant::new(StatusKind::Bleed, 4.0, 3)),
        "dark_wave" => AbilityDefinition::new("Dark Wave", Stamina, 35.0, 3, AllEnemies)
            .with_damage(22.0)
            .scaling(&[Strength], 0.15),
        "shield_bash" => AbilityDefinition::new("Shield Bash", Stamina, 30.0, 3, SingleEnemy)
            .with_damage(15.0)
            .scaling(&[Strength], 0.1)
            .with_status(StatusGrant::new(StatusKind::Stun, 0.0, 1)),
        "frost_bolt" => AbilityDefinition::new("Frost Bolt", Mana, 15.0, 1, SingleEnemy)
            .with_damage(25.0)
            .scaling(&[Intelligence], 0.2)
            .with_status(StatusGrant::new(StatusKind::Frost, 20.0, 2).refreshing())
            .ignoring_defense(),
        "ice_shield" => AbilityDefinition::new("Ice Shield", Mana, 20.0, 4, SelfOnly)
            .with_status(StatusGrant::new(StatusKind::DefenseBuff, 0.0, 3).refreshing())
            .never_critical(),
        "freeze" => AbilityDefinition::new("Freeze", Mana, 25.0, 5, SingleEnemy)
            .with_status(StatusGrant::new(StatusKind::Stun, 0.0, 1))
            .never_critical(),
        "ground_slam" => AbilityDefinition::new("Ground Slam", Stamina, 40.0, 3, AllEnemies)
            .with_damage(30.0)
            .scaling(&[Strength], 0.15),
        "corrupted_aura" => AbilityDefinition::new("Corrupted Aura", Mana, 20.0, 4, AllEnemies)
            .with_status(StatusGrant::new(StatusKind::Weakness, 0.0, 3).refreshing())
            .never_critical(),
        "regeneration" => AbilityDefinition::new("Regeneration", Stamina, 20.0, 5, SelfOnly)
            .with_status(StatusGrant::new(StatusKind::Regeneration, 10.0, 3).refreshing())
            .never_critical(),
        "flame_wave" => AbilityDefinition::new("Flame Wave", Stamina, 40.0, 3, AllEnemies)
            .with_damage(35.0)
            .scaling(&[Strength], 0.15)
            .with_status(StatusGrant::new(StatusKind::Burn, 6.0, 2)),
        "cinder_storm" => AbilityDefinition::new("Cinder Storm", Mana, 30.0, 5, AllEnemies)
            .with_damage(45.0)
            .scaling(&[Intelligence], 0.2)
            .ignoring_defense(),
        "burning_blade" => AbilityDefinition::new("Burning Blade", Stamina, 25.0, 2, SingleEnemy)
            .with_damage(30.0)
            .scaling(&[Strength], 0.2)
            .with_status(StatusGrant::new(StatusKind::Burn, 5.0, 3)),
        "crystal_spear" => AbilityDefinition::new("Crystal Spear", Stamina, 30.0, 2, SingleEnemy)
            .with_damage(40.0)
            .scaling(&[Dexterity], 0.2),
        "shard_barrier" => AbilityDefinition::new("Shard Barrier", Mana, 25.0, 4, SelfOnly)
            .with_status(StatusGrant::new(StatusKind::DefenseBuff, 50.0, 3).refreshing())
            .never_critical(),
        "titan_slam" => AbilityDefinition::new("Titan Slam", Stamina, 50.0, 3, SingleEnemy)
            .with_damage(70.0)
            .scaling(&[Strength], 0.2)
            .with_status(StatusGrant::new(StatusKind::Stun, 0.0, 1)),
        "aether_beam" => AbilityDefinition::new("Aether Beam", Mana, 40.0, 4, SingleEnemy)
            .with_damage(90.0)
            .scaling(&[Intelligence], 0.2)
            .ignoring_defense(),
        "earthquake" => AbilityDefinition::new("Earthquake", Stamina, 60.0, 5, AllEnemies)
            .with_damage(50.0)
            .scaling(&[Strength], 0.15),
        _ => return None,
    };
    Some(ability)
}
