//! Per-session combatant storage.
//!
//! The Arena owns every combatant of one session. It provides:
//! - Combatant storage with deterministic iteration order (`BTreeMap`)
//! - Id assignment in spawn order
//! - Lookups that fail with the right [`ActionRejected`] reason
//!
//! # Determinism
//!
//! Ids are assigned monotonically and stored in a `BTreeMap`, so iterating the
//! arena always visits combatants in spawn order. Every "for each combatant"
//! step of a round goes through this order.
//!
//! # Example
//!
//! ```
//! use shards_combat::arena::Arena;
//! use shards_combat::entity::{Combatant, TeamId};
//!
//! let mut arena = Arena::new();
//! let hero = arena.spawn(Combatant::new("Hero", TeamId::new(0)));
//! let wolf = arena.spawn(Combatant::new("Wolf", TeamId::new(1)));
//!
//! let ids: Vec<_> = arena.ids().collect();
//! assert_eq!(ids, vec![hero, wolf]);
//! assert_eq!(arena.living_enemies_of(hero), vec![wolf]);
//! ```

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::entity::{Combatant, CombatantId, TeamId};
use crate::error::ActionRejected;

/// Container for the combatants of one session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Arena {
    /// Monotonically increasing id counter.
    next_id: u64,
    /// Combatant storage with deterministic iteration order.
    combatants: BTreeMap<CombatantId, Combatant>,
}

impl Arena {
    /// Creates an empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a combatant and assigns its id.
    ///
    /// Derived stats are recomputed on entry, so a snapshot loaded with stale
    /// stats starts the session with values matching its attributes.
    pub fn spawn(&mut self, mut combatant: Combatant) -> CombatantId {
        let id = CombatantId::new(self.next_id);
        self.next_id += 1;

        combatant.set_id(id);
        combatant.recompute_stats();
        self.combatants.insert(id, combatant);
        id
    }

    /// Returns a combatant by id.
    #[must_use]
    pub fn get(&self, id: CombatantId) -> Option<&Combatant> {
        self.combatants.get(&id)
    }

    /// Returns a mutable combatant by id.
    #[must_use]
    pub fn get_mut(&mut self, id: CombatantId) -> Option<&mut Combatant> {
        self.combatants.get_mut(&id)
    }

    /// Returns a combatant, or `UnknownCombatant`.
    ///
    /// # Errors
    ///
    /// Fails if no combatant has this id.
    pub fn require(&self, id: CombatantId) -> Result<&Combatant, ActionRejected> {
        self.get(id).ok_or(ActionRejected::UnknownCombatant(id))
    }

    /// Returns a living combatant, or the reason it cannot act.
    ///
    /// # Errors
    ///
    /// Fails with `UnknownCombatant` or `DeadActor`.
    pub fn require_alive(&self, id: CombatantId) -> Result<&Combatant, ActionRejected> {
        let combatant = self.require(id)?;
        if combatant.is_alive() {
            Ok(combatant)
        } else {
            Err(ActionRejected::DeadActor(id))
        }
    }

    /// Returns `target` if it is a living enemy of `actor`.
    ///
    /// # Errors
    ///
    /// Fails with `UnknownCombatant`, `DeadTarget`, or `InvalidTarget` when
    /// the target fights on the actor's side.
    pub fn require_hostile(
        &self,
        actor: &Combatant,
        target: CombatantId,
        action: &str,
    ) -> Result<&Combatant, ActionRejected> {
        let defender = self.require(target)?;
        if !defender.is_alive() {
            return Err(ActionRejected::DeadTarget(target));
        }
        if !actor.is_hostile_to(defender) {
            return Err(ActionRejected::InvalidTarget {
                target,
                action: action.to_string(),
            });
        }
        Ok(defender)
    }

    /// Iterates ids in deterministic order.
    pub fn ids(&self) -> impl Iterator<Item = CombatantId> + '_ {
        self.combatants.keys().copied()
    }

    /// Iterates combatants in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &Combatant> + '_ {
        self.combatants.values()
    }

    /// Iterates mutable combatants in deterministic order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Combatant> + '_ {
        self.combatants.values_mut()
    }

    /// Iterates living combatants in deterministic order.
    pub fn living(&self) -> impl Iterator<Item = &Combatant> + '_ {
        self.iter().filter(|c| c.is_alive())
    }

    /// Ids of the living enemies of `id`, in deterministic order.
    #[must_use]
    pub fn living_enemies_of(&self, id: CombatantId) -> Vec<CombatantId> {
        let Some(me) = self.get(id) else {
            return Vec::new();
        };
        self.living()
            .filter(|other| me.is_hostile_to(other))
            .map(Combatant::id)
            .collect()
    }

    /// Teams with at least one living member.
    #[must_use]
    pub fn teams_alive(&self) -> BTreeSet<TeamId> {
        self.living().map(|c| c.team).collect()
    }

    /// Every team present, living or not.
    #[must_use]
    pub fn teams(&self) -> BTreeSet<TeamId> {
        self.iter().map(|c| c.team).collect()
    }

    /// Number of combatants.
    #[must_use]
    pub fn len(&self) -> usize {
        self.combatants.len()
    }

    /// Returns true if the arena holds no combatants.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.combatants.is_empty()
    }

    /// Consumes the arena, returning combatants in id order.
    #[must_use]
    pub fn into_combatants(self) -> Vec<Combatant> {
        self.combatants.into_values().collect()
    }
}
