//! Combatant model.
//!
//! This module provides the entity types acted upon each round:
//! - [`CombatantId`]: unique identifier assigned by the arena
//! - [`TeamId`]: side a combatant fights for
//! - [`Control`]: whether the caller or the AI declares actions
//! - [`Combatant`]: the mutable snapshot (stats, resources, effects, cooldowns)
//!
//! # Lifecycle
//!
//! A combatant is built by the caller from persisted character data, handed to
//! a session, mutated in memory for the session's lifetime and handed back for
//! storage. The engine never persists anything itself.
//!
//! # Example
//!
//! ```
//! use shards_combat::entity::{Combatant, TeamId};
//! use shards_combat::entity::components::{Attribute, Attributes};
//!
//! let warrior = Combatant::new("Aldric", TeamId::new(0))
//!     .with_attributes(Attributes::default().with(Attribute::Strength, 16));
//!
//! assert_eq!(warrior.stats().attack_power, 13);
//! assert!(warrior.is_alive());
//! ```

pub mod components;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::ability::AbilityDefinition;
use crate::ai::AiController;
use crate::enemy::EnemyTier;
use crate::error::ConfigError;
use crate::status::StatusEffect;

pub use components::{
    Attribute, Attributes, DerivedStats, Equipment, ResourceKind, Resources, StanceFlags,
};

/// Unique identifier for a combatant within a session.
///
/// Ids are assigned in spawn order, so the lower id is the combatant that
/// joined the session first. Ordering by id is the deterministic tie-break
/// used throughout the engine.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct CombatantId(u64);

impl CombatantId {
    /// Creates a new `CombatantId` from a raw value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw value of this identifier.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for CombatantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CombatantId({})", self.0)
    }
}

impl fmt::Display for CombatantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u64> for CombatantId {
    fn from(id: u64) -> Self {
        Self::new(id)
    }
}

/// The side a combatant fights for. Combatants on the same team never target
/// each other with hostile actions.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct TeamId(u8);

impl TeamId {
    /// Creates a new team id.
    #[must_use]
    pub const fn new(id: u8) -> Self {
        Self(id)
    }
}

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "team {}", self.0)
    }
}

/// Who declares a combatant's action each round.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum Control {
    /// The caller declares actions through the session.
    #[default]
    Player,
    /// The AI policy engine chooses actions.
    Ai(AiController),
}

/// An ability known by a combatant together with its runtime state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbilitySlot {
    /// Immutable reference data.
    pub definition: AbilityDefinition,
    /// Rounds until the ability can be used again. Never negative.
    pub cooldown: u32,
    /// Number of successful activations.
    pub times_used: u32,
}

impl AbilitySlot {
    /// Returns true if the ability is off cooldown.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        self.cooldown == 0
    }
}

/// A participant in combat.
///
/// # Invariants
///
/// - `0 <= resource <= max_resource` for every pool (all mutators clamp)
/// - a combatant with health `<= 0` is dead; it may not act or be targeted
/// - ability cooldowns are unsigned and therefore never negative
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Combatant {
    id: CombatantId,
    /// Display name.
    pub name: String,
    /// Side this combatant fights for.
    pub team: TeamId,
    /// Character level; feeds reward computation.
    pub level: u32,
    /// Enemy tier, if this combatant was spawned from an enemy template.
    pub tier: Option<EnemyTier>,
    /// Primary attributes.
    pub attributes: Attributes,
    /// Equipped items.
    pub equipment: Vec<Equipment>,
    /// Resource pools.
    pub resources: Resources,
    stats: DerivedStats,
    /// Active status effect instances, in application order.
    pub effects: Vec<StatusEffect>,
    abilities: BTreeMap<String, AbilitySlot>,
    /// Transient per-round flags.
    pub stance: StanceFlags,
    /// Declaration source.
    pub control: Control,
}

impl Combatant {
    /// Creates a player-controlled level 1 combatant with average attributes
    /// and default pools.
    pub fn new(name: impl Into<String>, team: TeamId) -> Self {
        let attributes = Attributes::default();
        Self {
            id: CombatantId::default(),
            name: name.into(),
            team,
            level: 1,
            tier: None,
            attributes,
            equipment: Vec::new(),
            resources: Resources::default(),
            stats: DerivedStats::compute(&attributes, &[]),
            effects: Vec::new(),
            abilities: BTreeMap::new(),
            stance: StanceFlags::empty(),
            control: Control::Player,
        }
    }

    /// Sets attributes and recomputes derived stats.
    #[must_use]
    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
        self.recompute_stats();
        self
    }

    /// Adds an equipped item and recomputes derived stats.
    #[must_use]
    pub fn with_equipment(mut self, item: Equipment) -> Self {
        self.equipment.push(item);
        self.recompute_stats();
        self
    }

    /// Replaces the resource pools.
    #[must_use]
    pub fn with_resources(mut self, resources: Resources) -> Self {
        self.resources = resources;
        self
    }

    /// Sets the level.
    #[must_use]
    pub fn with_level(mut self, level: u32) -> Self {
        self.level = level;
        self
    }

    /// Hands control to the AI.
    #[must_use]
    pub fn with_ai(mut self, controller: AiController) -> Self {
        self.control = Control::Ai(controller);
        self
    }

    /// Learns an ability. A second ability with the same name replaces the first.
    #[must_use]
    pub fn with_ability(mut self, definition: AbilityDefinition) -> Self {
        self.learn(definition);
        self
    }

    /// Learns several abilities.
    #[must_use]
    pub fn with_abilities(mut self, definitions: impl IntoIterator<Item = AbilityDefinition>) -> Self {
        for definition in definitions {
            self.learn(definition);
        }
        self
    }

    /// Learns an ability with no cooldown pending.
    pub fn learn(&mut self, definition: AbilityDefinition) {
        self.abilities.insert(
            definition.name.clone(),
            AbilitySlot {
                definition,
                cooldown: 0,
                times_used: 0,
            },
        );
    }

    /// Learns an ability, refusing malformed definitions and name clashes.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DuplicateAbility`] if the name is already known,
    /// or the definition's own validation error.
    pub fn try_learn(&mut self, definition: AbilityDefinition) -> Result<(), ConfigError> {
        definition.validate()?;
        if self.abilities.contains_key(&definition.name) {
            return Err(ConfigError::DuplicateAbility {
                combatant: self.name.clone(),
                ability: definition.name,
            });
        }
        self.learn(definition);
        Ok(())
    }

    /// Returns the combatant's id. Meaningful only once spawned into an arena.
    #[must_use]
    pub const fn id(&self) -> CombatantId {
        self.id
    }

    pub(crate) fn set_id(&mut self, id: CombatantId) {
        self.id = id;
    }

    /// Returns the derived combat stats.
    #[must_use]
    pub const fn stats(&self) -> &DerivedStats {
        &self.stats
    }

    /// Recomputes derived stats from attributes and equipment.
    pub fn recompute_stats(&mut self) {
        self.stats = DerivedStats::compute(&self.attributes, &self.equipment);
    }

    /// Returns true while health is above zero.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.resources.health > 0.0
    }

    /// Current health as a fraction of max health.
    #[must_use]
    pub fn health_fraction(&self) -> f32 {
        self.resources.health_fraction()
    }

    /// Returns true if the combatant is controlled by the AI.
    #[must_use]
    pub const fn is_ai(&self) -> bool {
        matches!(self.control, Control::Ai(_))
    }

    /// Returns true if `other` fights for a different team.
    #[must_use]
    pub fn is_hostile_to(&self, other: &Self) -> bool {
        self.team != other.team
    }

    /// Returns the ability slot for a name.
    #[must_use]
    pub fn ability(&self, name: &str) -> Option<&AbilitySlot> {
        self.abilities.get(name)
    }

    pub(crate) fn ability_mut(&mut self, name: &str) -> Option<&mut AbilitySlot> {
        self.abilities.get_mut(name)
    }

    /// Iterates known abilities in name order.
    pub fn abilities(&self) -> impl Iterator<Item = &AbilitySlot> + '_ {
        self.abilities.values()
    }

    /// Remaining cooldown of an ability, or `None` if unknown.
    #[must_use]
    pub fn cooldown(&self, name: &str) -> Option<u32> {
        self.abilities.get(name).map(|slot| slot.cooldown)
    }

    /// Decrements every ability cooldown by one, stopping at zero.
    pub fn tick_cooldowns(&mut self) {
        for slot in self.abilities.values_mut() {
            slot.cooldown = slot.cooldown.saturating_sub(1);
        }
    }

    /// Clears transient per-round flags.
    pub fn reset_stance(&mut self) {
        self.stance = StanceFlags::empty();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ability::{AbilityDefinition, TargetMode};

    fn strike() -> AbilityDefinition {
        AbilityDefinition::new("Strike", ResourceKind::Stamina, 10.0, 2, TargetMode::SingleEnemy)
            .with_damage(10.0)
    }

    mod id_tests {
        use super::*;

        #[test]
        fn ids_order_numerically() {
            assert!(CombatantId::new(1) < CombatantId::new(2));
            assert_eq!(CombatantId::from(7).as_u64(), 7);
            assert_eq!(format!("{}", CombatantId::new(3)), "#3");
        }
    }

    mod combatant_tests {
        use super::*;

        #[test]
        fn builder_recomputes_stats() {
            let c = Combatant::new("A", TeamId::new(0))
                .with_attributes(Attributes::default().with(Attribute::Strength, 16))
                .with_equipment(Equipment::weapon("Axe", 2));
            assert_eq!(c.stats().attack_power, 15);
        }

        #[test]
        fn death_is_health_at_or_below_zero() {
            let mut c = Combatant::new("A", TeamId::new(0));
            assert!(c.is_alive());
            c.resources.health = 0.0;
            assert!(!c.is_alive());
        }

        #[test]
        fn cooldowns_never_go_negative() {
            let mut c = Combatant::new("A", TeamId::new(0)).with_ability(strike());
            c.ability_mut("Strike").unwrap().cooldown = 1;
            c.tick_cooldowns();
            c.tick_cooldowns();
            assert_eq!(c.cooldown("Strike"), Some(0));
            assert!(c.ability("Strike").unwrap().is_ready());
        }

        #[test]
        fn hostility_is_by_team() {
            let a = Combatant::new("A", TeamId::new(0));
            let b = Combatant::new("B", TeamId::new(1));
            let c = Combatant::new("C", TeamId::new(0));
            assert!(a.is_hostile_to(&b));
            assert!(!a.is_hostile_to(&c));
        }

        #[test]
        fn duplicate_abilities_are_refused() {
            let mut c = Combatant::new("A", TeamId::new(0));
            assert_eq!(c.try_learn(strike()), Ok(()));
            assert_eq!(
                c.try_learn(strike()),
                Err(ConfigError::DuplicateAbility {
                    combatant: "A".into(),
                    ability: "Strike".into(),
                })
            );
            assert_eq!(c.abilities().count(), 1);
        }

        #[test]
        fn combatant_round_trips_through_json() {
            let c = Combatant::new("A", TeamId::new(0)).with_ability(strike());
            let json = serde_json::to_string(&c).unwrap();
            let back: Combatant = serde_json::from_str(&json).unwrap();
            assert_eq!(back, c);
        }
    }
}
