//! Class ability catalog.
//!
//! Reference data: the six playable classes, their abilities and a recommended
//! starting build per class. Definitions are built fresh on each call; they
//! are cheap and callers usually hand them straight to a combatant.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{AbilityDefinition, TargetMode};
use crate::entity::components::{modifier, Attribute, Attributes, ResourceKind, Resources};
use crate::entity::{Combatant, TeamId};
use crate::status::{StatusGrant, StatusKind};

use Attribute::{Charisma, Constitution, Dexterity, Intelligence, Strength, Wisdom};
use ResourceKind::{Health, Mana, Stamina};
use TargetMode::{AllEnemies, SelfOnly, SingleEnemy};

/// A playable class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ClassKind {
    /// Stamina-based melee.
    Warrior,
    /// Mana-based caster.
    Sorcerer,
    /// Stamina-based striker.
    Rogue,
    /// Hybrid melee and support.
    Paladin,
    /// Mana-based attrition.
    Necromancer,
    /// Ranged hybrid.
    Ranger,
}

impl ClassKind {
    /// Every class.
    pub const ALL: [Self; 6] = [
        Self::Warrior,
        Self::Sorcerer,
        Self::Rogue,
        Self::Paladin,
        Self::Necromancer,
        Self::Ranger,
    ];

    /// The three attributes a class favors, most important first.
    #[must_use]
    pub const fn recommended_attributes(self) -> [Attribute; 3] {
        match self {
            Self::Warrior => [Strength, Constitution, Dexterity],
            Self::Sorcerer => [Intelligence, Wisdom, Constitution],
            Self::Rogue => [Dexterity, Charisma, Intelligence],
            Self::Paladin => [Strength, Charisma, Constitution],
            Self::Necromancer => [Intelligence, Wisdom, Charisma],
            Self::Ranger => [Dexterity, Wisdom, Constitution],
        }
    }

    /// Recommended build: 16, 14 and 13 in the favored attributes, 10 elsewhere.
    #[must_use]
    pub fn recommended_build(self) -> Attributes {
        self.recommended_attributes()
            .into_iter()
            .zip([16, 14, 13])
            .fold(Attributes::default(), |attrs, (attribute, value)| {
                attrs.with(attribute, value)
            })
    }

    /// Base health, stamina and mana before attribute adjustments.
    #[must_use]
    pub const fn base_pools(self) -> (f32, f32, f32) {
        match self {
            Self::Warrior => (120.0, 120.0, 50.0),
            Self::Sorcerer => (70.0, 70.0, 150.0),
            Self::Rogue => (90.0, 130.0, 60.0),
            Self::Paladin => (110.0, 100.0, 90.0),
            Self::Necromancer => (80.0, 80.0, 140.0),
            Self::Ranger => (95.0, 110.0, 80.0),
        }
    }

    /// Full resource pools for a class with the given attributes.
    ///
    /// Health gains 5 per CON modifier, stamina 3 per CON modifier, and mana
    /// 5 per INT plus 3 per WIS modifier.
    #[must_use]
    pub fn resources(self, attributes: &Attributes) -> Resources {
        let (health, stamina, mana) = self.base_pools();
        let con = pool_bonus(modifier(attributes.constitution));
        let int = pool_bonus(modifier(attributes.intelligence));
        let wis = pool_bonus(modifier(attributes.wisdom));
        Resources::full(
            (health + con * 5.0).max(1.0),
            (stamina + con * 3.0).max(1.0),
            (mana + int * 5.0 + wis * 3.0).max(0.0),
        )
    }

    /// A hero of this class with the recommended build and the class kit.
    #[must_use]
    pub fn hero(self, name: impl Into<String>, team: TeamId) -> Combatant {
        let attributes = self.recommended_build();
        Combatant::new(name, team)
            .with_resources(self.resources(&attributes))
            .with_attributes(attributes)
            .with_abilities(abilities_for(self))
    }
}

#[allow(clippy::cast_precision_loss)]
fn pool_bonus(modifier: i32) -> f32 {
    modifier as f32
}

impl fmt::Display for ClassKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Warrior => "warrior",
            Self::Sorcerer => "sorcerer",
            Self::Rogue => "rogue",
            Self::Paladin => "paladin",
            Self::Necromancer => "necromancer",
            Self::Ranger => "ranger",
        };
        f.write_str(name)
    }
}

impl FromStr for ClassKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|class| class.to_string().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown class `{s}`"))
    }
}

/// The ability kit of a class.
#[must_use]
pub fn abilities_for(class: ClassKind) -> Vec<AbilityDefinition> {
    match class {
        ClassKind::Warrior => warrior(),
        ClassKind::Sorcerer => sorcerer(),
        ClassKind::Rogue => rogue(),
        ClassKind::Paladin => paladin(),
        ClassKind::Necromancer => necromancer(),
        ClassKind::Ranger => ranger(),
    }
}

/// Looks up a class ability by name, case-insensitively.
#[must_use]
pub fn find(name: &str) -> Option<AbilityDefinition> {
    ClassKind::ALL
        .into_iter()
        .flat_map(abilities_for)
        .find(|ability| ability.name.eq_ignore_ascii_case(name))
}

fn warrior() -> Vec<AbilityDefinition> {
    vec![
        AbilityDefinition::new("Whirlwind Strike", Stamina, 40.0, 3, AllEnemies)
            .describe("Spin and strike every enemy")
            .with_damage(25.0)
            .scaling(&[Strength, Dexterity], 0.15),
        AbilityDefinition::new("Shield Bash", Stamina, 30.0, 2, SingleEnemy)
            .describe("Bash an enemy and stun them")
            .with_damage(20.0)
            .scaling(&[Strength], 0.12)
            .with_status(StatusGrant::new(StatusKind::Stun, 0.0, 1)),
        AbilityDefinition::new("Battle Cry", Stamina, 25.0, 4, SelfOnly)
            .describe("Raise your strength for three rounds")
            .with_status(StatusGrant::new(StatusKind::StrengthBuff, 0.0, 3).refreshing())
            .never_critical(),
        AbilityDefinition::new("Execute", Stamina, 50.0, 5, SingleEnemy)
            .describe("A massive finishing blow")
            .with_damage(60.0)
            .scaling(&[Strength], 0.2),
    ]
}

fn sorcerer() -> Vec<AbilityDefinition> {
    vec![
        AbilityDefinition::new("Fireball", Mana, 30.0, 1, SingleEnemy)
            .describe("Hurl a ball of fire that burns")
            .with_damage(35.0)
            .scaling(&[Intelligence], 0.2)
            .with_status(StatusGrant::new(StatusKind::Burn, 5.0, 3))
            .ignoring_defense(),
        AbilityDefinition::new("Ice Storm", Mana, 50.0, 4, AllEnemies)
            .describe("Freeze every enemy and slow them")
            .with_damage(25.0)
            .scaling(&[Intelligence, Wisdom], 0.18)
            .with_status(StatusGrant::new(StatusKind::Frost, 30.0, 2).refreshing())
            .ignoring_defense(),
        AbilityDefinition::new("Mana Shield", Mana, 40.0, 3, SelfOnly)
            .describe("Raise your defense for three rounds")
            .with_status(StatusGrant::new(StatusKind::DefenseBuff, 0.0, 3).refreshing())
            .never_critical(),
        AbilityDefinition::new("Lightning Bolt", Mana, 35.0, 2, SingleEnemy)
            .describe("Strike an enemy with lightning")
            .with_damage(45.0)
            .scaling(&[Intelligence], 0.22)
            .ignoring_defense(),
        AbilityDefinition::new("Arcane Regeneration", Mana, 45.0, 5, SelfOnly)
            .describe("Regenerate health over five rounds")
            .with_status(StatusGrant::new(StatusKind::Regeneration, 8.0, 5).refreshing())
            .never_critical(),
    ]
}

fn rogue() -> Vec<AbilityDefinition> {
    vec![
        AbilityDefinition::new("Backstab", Stamina, 35.0, 3, SingleEnemy)
            .describe("A precise strike at a weak point")
            .with_damage(40.0)
            .scaling(&[Dexterity, Strength], 0.25),
        AbilityDefinition::new("Poison Blade", Stamina, 25.0, 4, SingleEnemy)
            .describe("A poisoned cut")
            .with_damage(15.0)
            .scaling(&[Dexterity], 0.13)
            .with_status(StatusGrant::new(StatusKind::Poison, 7.0, 5)),
        AbilityDefinition::new("Fan of Knives", Stamina, 45.0, 4, AllEnemies)
            .describe("Throw knives at every enemy")
            .with_damage(20.0)
            .scaling(&[Dexterity], 0.16)
            .with_status(StatusGrant::new(StatusKind::Bleed, 4.0, 3)),
    ]
}

fn paladin() -> Vec<AbilityDefinition> {
    vec![
        AbilityDefinition::new("Divine Smite", Mana, 35.0, 2, SingleEnemy)
            .describe("Strike with holy power")
            .with_damage(40.0)
            .scaling(&[Strength, Charisma], 0.18),
        AbilityDefinition::new("Lay on Hands", Mana, 40.0, 4, SelfOnly)
            .describe("Heal yourself with divine light")
            .with_healing(50.0)
            .scaling(&[Charisma, Wisdom], 0.2)
            .never_critical(),
        AbilityDefinition::new("Holy Shield", Mana, 30.0, 5, SelfOnly)
            .describe("Raise your defense for four rounds")
            .with_status(StatusGrant::new(StatusKind::DefenseBuff, 0.0, 4).refreshing())
            .never_critical(),
        AbilityDefinition::new("Judgement", Mana, 60.0, 5, AllEnemies)
            .describe("Pass judgement on every enemy")
            .with_damage(30.0)
            .scaling(&[Strength, Charisma], 0.15)
            .ignoring_defense(),
    ]
}

fn necromancer() -> Vec<AbilityDefinition> {
    vec![
        AbilityDefinition::new("Death Bolt", Mana, 30.0, 1, SingleEnemy)
            .describe("A bolt of necrotic energy")
            .with_damage(35.0)
            .scaling(&[Intelligence], 0.2)
            .ignoring_defense(),
        AbilityDefinition::new("Life Drain", Mana, 40.0, 3, SingleEnemy)
            .describe("Drain life from an enemy")
            .with_damage(30.0)
            .with_healing(20.0)
            .scaling(&[Intelligence], 0.15),
        AbilityDefinition::new("Curse of Weakness", Mana, 35.0, 4, SingleEnemy)
            .describe("Weaken an enemy's attacks")
            .with_status(StatusGrant::new(StatusKind::Weakness, 0.0, 4).refreshing())
            .never_critical(),
        AbilityDefinition::new("Dark Ritual", Health, 30.0, 3, SelfOnly)
            .describe("Trade health for mana")
            .restoring(Mana, 30.0)
            .never_critical(),
        AbilityDefinition::new("Plague Cloud", Mana, 55.0, 5, AllEnemies)
            .describe("Poison every enemy")
            .with_damage(15.0)
            .scaling(&[Intelligence], 0.13)
            .with_status(StatusGrant::new(StatusKind::Poison, 8.0, 4)),
    ]
}

fn ranger() -> Vec<AbilityDefinition> {
    vec![
        AbilityDefinition::new("Precise Shot", Stamina, 25.0, 2, SingleEnemy)
            .describe("A carefully aimed shot")
            .with_damage(35.0)
            .scaling(&[Dexterity], 0.2),
        AbilityDefinition::new("Multi-Shot", Stamina, 40.0, 3, AllEnemies)
            .describe("Shoot every enemy")
            .with_damage(20.0)
            .scaling(&[Dexterity], 0.15),
        AbilityDefinition::new("Nature's Blessing", Mana, 35.0, 4, SelfOnly)
            .describe("Heal and regenerate")
            .with_healing(40.0)
            .scaling(&[Wisdom], 0.15)
            .with_status(StatusGrant::new(StatusKind::Regeneration, 5.0, 3).refreshing())
            .never_critical(),
        AbilityDefinition::new("Explosive Arrow", Stamina, 50.0, 5, AllEnemies)
            .describe("An arrow that bursts into flame")
            .with_damage(40.0)
            .scaling(&[Dexterity], 0.18)
            .with_status(StatusGrant::new(StatusKind::Burn, 6.0, 2)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_catalog_ability_is_well_formed() {
        for class in ClassKind::ALL {
            let kit = abilities_for(class);
            assert!(!kit.is_empty(), "{class} has no abilities");
            for ability in &kit {
                assert_eq!(ability.validate(), Ok(()), "{}", ability.name);
            }
            let mut names: Vec<_> = kit.iter().map(|a| a.name.as_str()).collect();
            names.sort_unstable();
            names.dedup();
            assert_eq!(names.len(), kit.len(), "{class} has duplicate names");
        }
    }

    #[test]
    fn find_is_case_insensitive() {
        let fireball = find("fireball").unwrap();
        assert_eq!(fireball.resource, ResourceKind::Mana);
        assert!(fireball.ignores_defense);
        assert!(find("Shadow Step").is_none());
    }

    #[test]
    fn class_names_round_trip() {
        for class in ClassKind::ALL {
            assert_eq!(class.to_string().parse::<ClassKind>(), Ok(class));
        }
        assert!("bard".parse::<ClassKind>().is_err());
    }

    #[test]
    fn hero_gets_class_pools_and_kit() {
        let warrior = ClassKind::Warrior.hero("Aldric", TeamId::new(0));
        // CON 14: +2 modifier -> 120 + 10 health, 120 + 6 stamina
        assert!((warrior.resources.max_health - 130.0).abs() < 1e-4);
        assert!((warrior.resources.max_stamina - 126.0).abs() < 1e-4);
        assert_eq!(warrior.attributes.strength, 16);
        assert!(warrior.ability("Execute").is_some());
        assert_eq!(warrior.stats().attack_power, 13);
    }
}
