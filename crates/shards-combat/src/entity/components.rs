//! Component structs that make up a combatant.
//!
//! - [`Attributes`]: the six primary attributes and their modifiers
//! - [`Equipment`]: equipped items contributing flat attack/defense bonuses
//! - [`Resources`]: health, stamina and mana pools
//! - [`DerivedStats`]: combat stats recomputed from attributes + equipment
//! - [`StanceFlags`]: transient per-round flags
//!
//! Derived stats are never persisted. They are a pure function of
//! attributes and equipment and are recomputed at session start.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Attributes
// =============================================================================

/// One of the six primary attributes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Attribute {
    /// Strength (STR)
    Strength,
    /// Dexterity (DEX)
    Dexterity,
    /// Constitution (CON)
    Constitution,
    /// Intelligence (INT)
    Intelligence,
    /// Wisdom (WIS)
    Wisdom,
    /// Charisma (CHA)
    Charisma,
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Strength => write!(f, "STR"),
            Self::Dexterity => write!(f, "DEX"),
            Self::Constitution => write!(f, "CON"),
            Self::Intelligence => write!(f, "INT"),
            Self::Wisdom => write!(f, "WIS"),
            Self::Charisma => write!(f, "CHA"),
        }
    }
}

/// Returns the modifier for a raw attribute score: `floor((stat - 10) / 2)`.
///
/// # Example
///
/// ```
/// use shards_combat::entity::components::modifier;
///
/// assert_eq!(modifier(16), 3);
/// assert_eq!(modifier(10), 0);
/// assert_eq!(modifier(9), -1);
/// ```
#[must_use]
pub const fn modifier(stat: i32) -> i32 {
    (stat - 10).div_euclid(2)
}

/// The six primary attributes of a combatant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attributes {
    /// Strength
    pub strength: i32,
    /// Dexterity
    pub dexterity: i32,
    /// Constitution
    pub constitution: i32,
    /// Intelligence
    pub intelligence: i32,
    /// Wisdom
    pub wisdom: i32,
    /// Charisma
    pub charisma: i32,
}

impl Default for Attributes {
    fn default() -> Self {
        Self::uniform(10)
    }
}

impl Attributes {
    /// Creates attributes with every score set to `value`.
    #[must_use]
    pub const fn uniform(value: i32) -> Self {
        Self {
            strength: value,
            dexterity: value,
            constitution: value,
            intelligence: value,
            wisdom: value,
            charisma: value,
        }
    }

    /// Returns the raw score of an attribute.
    #[must_use]
    pub const fn get(&self, attribute: Attribute) -> i32 {
        match attribute {
            Attribute::Strength => self.strength,
            Attribute::Dexterity => self.dexterity,
            Attribute::Constitution => self.constitution,
            Attribute::Intelligence => self.intelligence,
            Attribute::Wisdom => self.wisdom,
            Attribute::Charisma => self.charisma,
        }
    }

    /// Returns the modifier of an attribute.
    #[must_use]
    pub const fn modifier(&self, attribute: Attribute) -> i32 {
        modifier(self.get(attribute))
    }

    /// Returns a copy with one attribute replaced.
    #[must_use]
    pub const fn with(mut self, attribute: Attribute, value: i32) -> Self {
        match attribute {
            Attribute::Strength => self.strength = value,
            Attribute::Dexterity => self.dexterity = value,
            Attribute::Constitution => self.constitution = value,
            Attribute::Intelligence => self.intelligence = value,
            Attribute::Wisdom => self.wisdom = value,
            Attribute::Charisma => self.charisma = value,
        }
        self
    }
}

// =============================================================================
// Equipment
// =============================================================================

/// An equipped item. Only its flat combat bonuses matter to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Equipment {
    /// Display name (for the caller; the engine ignores it).
    pub name: String,
    /// Bonus added to attack power (weapons).
    pub attack_bonus: i32,
    /// Bonus added to defense (armor).
    pub defense_bonus: i32,
}

impl Equipment {
    /// Creates a weapon with an attack bonus.
    pub fn weapon(name: impl Into<String>, attack_bonus: i32) -> Self {
        Self {
            name: name.into(),
            attack_bonus,
            defense_bonus: 0,
        }
    }

    /// Creates a piece of armor with a defense bonus.
    pub fn armor(name: impl Into<String>, defense_bonus: i32) -> Self {
        Self {
            name: name.into(),
            attack_bonus: 0,
            defense_bonus,
        }
    }
}

// =============================================================================
// Resources
// =============================================================================

/// A consumable resource pool.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    /// Health; reaching 0 means death.
    Health,
    /// Stamina; spent by basic actions and physical abilities.
    Stamina,
    /// Mana; spent by spells.
    Mana,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Health => write!(f, "health"),
            Self::Stamina => write!(f, "stamina"),
            Self::Mana => write!(f, "mana"),
        }
    }
}

/// Resource pools of a combatant.
///
/// # Invariant
///
/// Every current value stays within `[0, max]`. All mutators clamp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Resources {
    /// Current health
    pub health: f32,
    /// Maximum health
    pub max_health: f32,
    /// Current stamina
    pub stamina: f32,
    /// Maximum stamina
    pub max_stamina: f32,
    /// Current mana
    pub mana: f32,
    /// Maximum mana
    pub max_mana: f32,
}

impl Default for Resources {
    fn default() -> Self {
        Self::full(100.0, 100.0, 50.0)
    }
}

impl Resources {
    /// Creates full pools with the given maxima.
    #[must_use]
    pub const fn full(max_health: f32, max_stamina: f32, max_mana: f32) -> Self {
        Self {
            health: max_health,
            max_health,
            stamina: max_stamina,
            max_stamina,
            mana: max_mana,
            max_mana,
        }
    }

    /// Returns the current value of a pool.
    #[must_use]
    pub const fn current(&self, kind: ResourceKind) -> f32 {
        match kind {
            ResourceKind::Health => self.health,
            ResourceKind::Stamina => self.stamina,
            ResourceKind::Mana => self.mana,
        }
    }

    /// Returns the maximum of a pool.
    #[must_use]
    pub const fn max(&self, kind: ResourceKind) -> f32 {
        match kind {
            ResourceKind::Health => self.max_health,
            ResourceKind::Stamina => self.max_stamina,
            ResourceKind::Mana => self.max_mana,
        }
    }

    fn slot_mut(&mut self, kind: ResourceKind) -> (&mut f32, f32) {
        match kind {
            ResourceKind::Health => (&mut self.health, self.max_health),
            ResourceKind::Stamina => (&mut self.stamina, self.max_stamina),
            ResourceKind::Mana => (&mut self.mana, self.max_mana),
        }
    }

    /// Returns true if `amount` can be paid from the pool.
    ///
    /// Health costs must leave the payer alive, so they need strictly more
    /// health than the cost.
    #[must_use]
    pub fn can_afford(&self, kind: ResourceKind, amount: f32) -> bool {
        match kind {
            ResourceKind::Health => self.health > amount,
            _ => self.current(kind) >= amount,
        }
    }

    /// Subtracts `amount` from a pool, flooring at 0. Returns the amount removed.
    pub fn drain(&mut self, kind: ResourceKind, amount: f32) -> f32 {
        let (value, _) = self.slot_mut(kind);
        let removed = amount.max(0.0).min(*value);
        *value -= removed;
        removed
    }

    /// Adds `amount` to a pool, capping at its maximum. Returns the amount added.
    pub fn restore(&mut self, kind: ResourceKind, amount: f32) -> f32 {
        let (value, max) = self.slot_mut(kind);
        let added = amount.max(0.0).min((max - *value).max(0.0));
        *value += added;
        added
    }

    /// Current health as a fraction of maximum health, in `[0, 1]`.
    #[must_use]
    pub fn health_fraction(&self) -> f32 {
        if self.max_health <= 0.0 {
            0.0
        } else {
            (self.health / self.max_health).clamp(0.0, 1.0)
        }
    }

    /// Returns true if every pool is finite, every maximum positive, and
    /// every current value within `[0, max]`.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        [ResourceKind::Health, ResourceKind::Stamina, ResourceKind::Mana]
            .into_iter()
            .all(|kind| {
                let (current, max) = (self.current(kind), self.max(kind));
                current.is_finite() && max.is_finite() && max >= 0.0 && (0.0..=max).contains(&current)
            })
            && self.max_health > 0.0
    }
}

// =============================================================================
// Derived Stats
// =============================================================================

/// Combat stats derived from attributes and equipment.
///
/// | Stat | Formula | Clamp |
/// |---|---|---|
/// | attack_power | 10 + STR_mod + Σ weapon bonuses | ≥ 1 |
/// | defense | 10 + DEX_mod + Σ armor bonuses | ≥ 0 |
/// | accuracy | 60 + 3·DEX_mod + 2·STR_mod | ≥ 10 |
/// | evasion | 10 + 4·DEX_mod | ≥ 0 |
/// | critical_chance | 0.05 + 0.01·DEX_mod | [0.01, 0.5] |
/// | critical_multiplier | 1.5 + 0.1·STR_mod | ≥ 1.0 |
/// | initiative | 10 + DEX_mod | ≥ 1 |
/// | poise | 10 + CON_mod | ≥ 1 |
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivedStats {
    /// Base damage of basic attacks
    pub attack_power: i32,
    /// Damage mitigation (half is subtracted from incoming damage)
    pub defense: i32,
    /// Hit chance in percent before modifiers
    pub accuracy: i32,
    /// Dodge chance in percent when dodging
    pub evasion: i32,
    /// Probability of a critical hit
    pub critical_chance: f32,
    /// Damage multiplier applied on a critical hit
    pub critical_multiplier: f32,
    /// Base initiative score
    pub initiative: i32,
    /// Resistance to stagger
    pub poise: i32,
}

impl Default for DerivedStats {
    fn default() -> Self {
        Self::compute(&Attributes::default(), &[])
    }
}

impl DerivedStats {
    /// Computes derived stats from attributes and equipped items.
    #[must_use]
    pub fn compute(attributes: &Attributes, equipment: &[Equipment]) -> Self {
        let str_mod = attributes.modifier(Attribute::Strength);
        let dex_mod = attributes.modifier(Attribute::Dexterity);
        let con_mod = attributes.modifier(Attribute::Constitution);

        let attack_bonus: i32 = equipment.iter().map(|item| item.attack_bonus).sum();
        let defense_bonus: i32 = equipment.iter().map(|item| item.defense_bonus).sum();

        #[allow(clippy::cast_precision_loss)]
        let (dex_f, str_f) = (dex_mod as f32, str_mod as f32);

        Self {
            attack_power: (10 + str_mod + attack_bonus).max(1),
            defense: (10 + dex_mod + defense_bonus).max(0),
            accuracy: (60 + 3 * dex_mod + 2 * str_mod).max(10),
            evasion: (10 + 4 * dex_mod).max(0),
            critical_chance: (0.05 + 0.01 * dex_f).clamp(0.01, 0.5),
            critical_multiplier: (1.5 + 0.1 * str_f).max(1.0),
            initiative: (10 + dex_mod).max(1),
            poise: (10 + con_mod).max(1),
        }
    }
}

// =============================================================================
// Stance Flags
// =============================================================================

bitflags! {
    /// Transient per-round flags. Cleared at the end of every round.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct StanceFlags: u8 {
        /// Incoming damage is multiplied by the block factor.
        const BLOCKING = 1 << 0;
        /// Incoming attacks may be evaded with an evasion roll.
        const DODGING = 1 << 1;
        /// Incoming parryable attacks may be parried and countered.
        const PARRYING = 1 << 2;
        /// Set by a control effect; the combatant skips its turn.
        const STUNNED = 1 << 3;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod modifier_tests {
        use super::*;

        #[test]
        fn modifier_floors_toward_negative_infinity() {
            assert_eq!(modifier(16), 3);
            assert_eq!(modifier(17), 3);
            assert_eq!(modifier(11), 0);
            assert_eq!(modifier(9), -1);
            assert_eq!(modifier(8), -1);
            assert_eq!(modifier(7), -2);
            assert_eq!(modifier(1), -5);
        }

        #[test]
        fn attributes_expose_modifiers() {
            let attrs = Attributes::default().with(Attribute::Strength, 16);
            assert_eq!(attrs.modifier(Attribute::Strength), 3);
            assert_eq!(attrs.modifier(Attribute::Dexterity), 0);
        }
    }

    mod derived_stats_tests {
        use super::*;

        #[test]
        fn warrior_strength_16() {
            let attrs = Attributes::default().with(Attribute::Strength, 16);
            let stats = DerivedStats::compute(&attrs, &[]);
            assert_eq!(stats.attack_power, 13);
            assert_eq!(stats.defense, 10);
            assert_eq!(stats.accuracy, 66);
            assert_eq!(stats.evasion, 10);
            assert!((stats.critical_multiplier - 1.8).abs() < 1e-6);
            assert_eq!(stats.initiative, 10);
        }

        #[test]
        fn equipment_bonuses_are_summed() {
            let equipment = vec![
                Equipment::weapon("Longsword", 4),
                Equipment::weapon("Dagger", 1),
                Equipment::armor("Chainmail", 3),
            ];
            let stats = DerivedStats::compute(&Attributes::default(), &equipment);
            assert_eq!(stats.attack_power, 15);
            assert_eq!(stats.defense, 13);
        }

        #[test]
        fn clamps_apply_to_weak_attributes() {
            let stats = DerivedStats::compute(&Attributes::uniform(1), &[]);
            assert_eq!(stats.attack_power, 5);
            assert_eq!(stats.evasion, 0);
            assert_eq!(stats.accuracy, 35);
            assert!((stats.critical_chance - 0.01).abs() < 1e-6);
            assert!((stats.critical_multiplier - 1.0).abs() < 1e-6);
            assert_eq!(stats.initiative, 5);
        }

        #[test]
        fn critical_chance_is_capped() {
            let stats = DerivedStats::compute(&Attributes::uniform(200), &[]);
            assert!((stats.critical_chance - 0.5).abs() < 1e-6);
        }
    }

    mod resources_tests {
        use super::*;

        #[test]
        fn drain_floors_at_zero() {
            let mut res = Resources::full(50.0, 100.0, 0.0);
            assert!((res.drain(ResourceKind::Health, 80.0) - 50.0).abs() < 1e-6);
            assert_eq!(res.health, 0.0);
        }

        #[test]
        fn restore_caps_at_max() {
            let mut res = Resources::full(100.0, 100.0, 50.0);
            res.stamina = 95.0;
            assert!((res.restore(ResourceKind::Stamina, 10.0) - 5.0).abs() < 1e-6);
            assert_eq!(res.stamina, 100.0);
        }

        #[test]
        fn health_costs_must_leave_payer_alive() {
            let res = Resources::full(30.0, 100.0, 50.0);
            assert!(!res.can_afford(ResourceKind::Health, 30.0));
            assert!(res.can_afford(ResourceKind::Health, 29.0));
            assert!(res.can_afford(ResourceKind::Stamina, 100.0));
        }

        #[test]
        fn validity_checks_ranges() {
            let mut res = Resources::default();
            assert!(res.is_valid());
            res.stamina = res.max_stamina + 1.0;
            assert!(!res.is_valid());
            res.stamina = 0.0;
            res.max_health = 0.0;
            res.health = 0.0;
            assert!(!res.is_valid());
        }
    }

    #[test]
    fn stance_flags_serialize() {
        let flags = StanceFlags::BLOCKING | StanceFlags::STUNNED;
        let json = serde_json::to_string(&flags).unwrap();
        let back: StanceFlags = serde_json::from_str(&json).unwrap();
        assert_eq!(back, flags);
    }
}
