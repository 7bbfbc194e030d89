//! Outputs of the resolution phase.
//!
//! The resolver never mutates combatants. It emits two things:
//!
//! - [`CombatLogEntry`]: the append-only audit record of what happened,
//!   with a narrative-neutral [`EventTag`] that external narration keys off
//! - [`Delta`]: a requested state change, applied afterwards by
//!   [`crate::resolver::apply`]
//!
//! # Example
//!
//! ```
//! use shards_combat::entity::CombatantId;
//! use shards_combat::output::{CombatLogEntry, EventTag, LoggedAction, Outcome};
//! use shards_combat::resolver::BasicAction;
//!
//! let entry = CombatLogEntry::new(
//!     1,
//!     CombatantId::new(0),
//!     LoggedAction::Basic(BasicAction::Light),
//!     Outcome::Hit,
//!     EventTag::Strike,
//! )
//! .with_target(CombatantId::new(1))
//! .with_damage(13.0, 8.0);
//!
//! assert!(entry.outcome.is_damaging());
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::entity::{CombatantId, ResourceKind, StanceFlags};
use crate::resolver::BasicAction;
use crate::status::{StatusEffect, StatusKind};

// =============================================================================
// Log Entries
// =============================================================================

/// Result class of a logged action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// The attack landed.
    Hit,
    /// The attack landed as a critical hit.
    Critical,
    /// The attack missed.
    Miss,
    /// The defender evaded the attack.
    Dodged,
    /// The attack landed against a blocking defender.
    Blocked,
    /// The defender parried the attack.
    Parried,
    /// The action could not be performed (no cost paid, no effect).
    Rejected,
    /// A defensive stance was raised.
    Guard,
    /// A non-damaging effect took hold (buff, heal, status tick).
    Applied,
    /// The combatant lost its turn.
    Skipped,
    /// The combatant escaped; the session ends.
    Fled,
    /// The escape attempt failed.
    FleeFailed,
    /// The combatant's health reached zero.
    Defeated,
}

impl Outcome {
    /// Returns true for outcomes where damage reached the defender.
    #[must_use]
    pub const fn is_damaging(self) -> bool {
        matches!(self, Self::Hit | Self::Critical | Self::Blocked)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Hit => "hit",
            Self::Critical => "critical",
            Self::Miss => "miss",
            Self::Dodged => "dodged",
            Self::Blocked => "blocked",
            Self::Parried => "parried",
            Self::Rejected => "rejected",
            Self::Guard => "guard",
            Self::Applied => "applied",
            Self::Skipped => "skipped",
            Self::Fled => "fled",
            Self::FleeFailed => "flee failed",
            Self::Defeated => "defeated",
        };
        f.write_str(name)
    }
}

/// Narrative-neutral event tag for external narration to key off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTag {
    /// A regular hit.
    Strike,
    /// A critical hit.
    CriticalStrike,
    /// A miss.
    Whiff,
    /// A dodge.
    Evade,
    /// A parry.
    Deflect,
    /// Damage reduced by a block.
    Guarded,
    /// The counter-hit following a parry.
    Riposte,
    /// The actor could not pay for the action.
    Exhausted,
    /// The target was dead or otherwise invalid when the action resolved.
    InvalidTarget,
    /// The ability was unknown or still cooling down.
    Unavailable,
    /// A defensive stance was raised.
    StanceRaised,
    /// An ability was used.
    AbilityCast,
    /// Damage from a status effect.
    StatusDamage,
    /// Healing from a status effect.
    StatusHeal,
    /// One or more status effects wore off.
    StatusExpired,
    /// The turn was lost to a control effect.
    Stunned,
    /// A successful escape.
    Escape,
    /// A failed escape.
    EscapeFailed,
    /// A combatant fell.
    Defeated,
}

/// The action an entry records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoggedAction {
    /// One of the five basic actions.
    Basic(BasicAction),
    /// A named ability.
    Ability(String),
    /// An escape attempt.
    Flee,
    /// A counter-hit granted by a parry.
    Counter,
    /// A status effect ticking.
    StatusTick(StatusKind),
    /// Defeat bookkeeping.
    Defeat,
}

impl fmt::Display for LoggedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Basic(action) => write!(f, "{action}"),
            Self::Ability(name) => write!(f, "{name}"),
            Self::Flee => f.write_str("flee"),
            Self::Counter => f.write_str("counter"),
            Self::StatusTick(kind) => write!(f, "{kind}"),
            Self::Defeat => f.write_str("defeat"),
        }
    }
}

/// Resource paid for an action.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cost {
    /// Pool paid from.
    pub resource: ResourceKind,
    /// Amount paid.
    pub amount: f32,
}

/// One record of the append-only combat log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatLogEntry {
    /// Round number, starting at 1.
    pub round: u32,
    /// Acting combatant (or the credited source for status ticks).
    pub actor: CombatantId,
    /// Affected combatant, if any.
    pub target: Option<CombatantId>,
    /// What was done.
    pub action: LoggedAction,
    /// How it turned out.
    pub outcome: Outcome,
    /// True if the hit was critical (also when it was then blocked).
    #[serde(default)]
    pub critical: bool,
    /// Damage before mitigation.
    pub raw_damage: f32,
    /// Damage actually removed from health.
    pub final_damage: f32,
    /// Health restored.
    pub healing: f32,
    /// Resource paid, if any.
    pub cost: Option<Cost>,
    /// Status kinds applied by this action.
    pub effects_applied: Vec<StatusKind>,
    /// Status kinds removed by this action or tick.
    pub effects_removed: Vec<StatusKind>,
    /// Narrative-neutral tag.
    pub tag: EventTag,
}

impl CombatLogEntry {
    /// Creates an entry with no target, damage or cost.
    #[must_use]
    pub const fn new(
        round: u32,
        actor: CombatantId,
        action: LoggedAction,
        outcome: Outcome,
        tag: EventTag,
    ) -> Self {
        Self {
            round,
            actor,
            target: None,
            action,
            outcome,
            critical: false,
            raw_damage: 0.0,
            final_damage: 0.0,
            healing: 0.0,
            cost: None,
            effects_applied: Vec::new(),
            effects_removed: Vec::new(),
            tag,
        }
    }

    /// Sets the target.
    #[must_use]
    pub fn with_target(mut self, target: CombatantId) -> Self {
        self.target = Some(target);
        self
    }

    /// Sets raw and final damage.
    #[must_use]
    pub fn with_damage(mut self, raw: f32, final_damage: f32) -> Self {
        self.raw_damage = raw;
        self.final_damage = final_damage;
        self
    }

    /// Sets healing.
    #[must_use]
    pub fn with_healing(mut self, healing: f32) -> Self {
        self.healing = healing;
        self
    }

    /// Records the resource paid.
    #[must_use]
    pub fn with_cost(mut self, resource: ResourceKind, amount: f32) -> Self {
        self.cost = Some(Cost { resource, amount });
        self
    }

    /// Marks the hit as critical.
    #[must_use]
    pub fn critical(mut self, critical: bool) -> Self {
        self.critical = critical;
        self
    }
}

impl fmt::Display for CombatLogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[round {}] {} {}", self.round, self.actor, self.action)?;
        if let Some(target) = self.target {
            write!(f, " -> {target}")?;
        }
        write!(f, ": {}", self.outcome)?;
        if self.final_damage > 0.0 {
            write!(f, " ({:.1} damage)", self.final_damage)?;
        }
        if self.healing > 0.0 {
            write!(f, " (+{:.1} health)", self.healing)?;
        }
        for kind in &self.effects_applied {
            write!(f, " [+{kind}]")?;
        }
        for kind in &self.effects_removed {
            write!(f, " [-{kind}]")?;
        }
        Ok(())
    }
}

// =============================================================================
// Deltas
// =============================================================================

/// A requested change to combatant state.
///
/// Deltas are produced by the resolver and applied in order by
/// [`crate::resolver::apply`]. Every amount is non-negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Delta {
    /// Remove health.
    Damage {
        /// Combatant to damage
        target: CombatantId,
        /// Damage amount
        amount: f32,
        /// Combatant credited with the damage
        source: Option<CombatantId>,
    },
    /// Restore health, capped at max.
    Heal {
        /// Combatant to heal
        target: CombatantId,
        /// Healing amount
        amount: f32,
    },
    /// Pay a resource cost.
    Spend {
        /// Payer
        target: CombatantId,
        /// Pool
        resource: ResourceKind,
        /// Amount
        amount: f32,
    },
    /// Restore a resource, capped at max.
    Restore {
        /// Recipient
        target: CombatantId,
        /// Pool
        resource: ResourceKind,
        /// Amount
        amount: f32,
    },
    /// Raise stance flags for the rest of the round.
    Stance {
        /// Combatant
        target: CombatantId,
        /// Flags to set
        flags: StanceFlags,
    },
    /// Attach a status effect.
    ApplyStatus {
        /// Bearer
        target: CombatantId,
        /// Effect instance
        effect: StatusEffect,
        /// Refresh an existing instance of the same kind instead of stacking
        refresh: bool,
    },
    /// Put an ability on cooldown and count its use.
    StartCooldown {
        /// Owner
        target: CombatantId,
        /// Ability name
        ability: String,
        /// Cooldown length in rounds
        rounds: u32,
    },
}

impl Delta {
    /// Returns the combatant this delta changes.
    #[must_use]
    pub const fn target(&self) -> CombatantId {
        match self {
            Self::Damage { target, .. }
            | Self::Heal { target, .. }
            | Self::Spend { target, .. }
            | Self::Restore { target, .. }
            | Self::Stance { target, .. }
            | Self::ApplyStatus { target, .. }
            | Self::StartCooldown { target, .. } => *target,
        }
    }
}

/// Everything a single resolved action produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    /// Log entries, in the order events happened.
    pub entries: Vec<CombatLogEntry>,
    /// State changes, in the order they must be applied.
    pub deltas: Vec<Delta>,
}

impl Resolution {
    /// Creates an empty resolution.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolution consisting of a single entry and no state change.
    #[must_use]
    pub fn entry_only(entry: CombatLogEntry) -> Self {
        Self {
            entries: vec![entry],
            deltas: Vec::new(),
        }
    }

    /// Returns the first entry's outcome, if any.
    #[must_use]
    pub fn outcome(&self) -> Option<Outcome> {
        self.entries.first().map(|e| e.outcome)
    }
}
