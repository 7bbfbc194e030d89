//! Status Effect Engine.
//!
//! Status effects are timed modifiers attached to a combatant. They are
//! applied by attacks, abilities or external grants, ticked once at the start
//! of every round and removed the moment their duration reaches zero.
//!
//! # Kinds
//!
//! | Kind | Potency meaning | Applied |
//! |---|---|---|
//! | Bleed, Poison, Burn | true damage per round | on tick |
//! | Regeneration | healing per round | on tick |
//! | Stun | unused | on tick: skip this round |
//! | Frost | percent reduction of evasion and speed | read by the resolver |
//! | Weakness | percent reduction of damage and accuracy | read by the resolver |
//! | Strength buff | percent increase of damage and accuracy | read by the resolver |
//! | Defense buff | percent increase of defense | read by the resolver |
//!
//! Stat modifiers stack additively: two +25% strength buffs give x1.5.
//! A modifier with potency 0 uses the configured default step.
//!
//! # Example
//!
//! ```
//! use shards_combat::entity::{Combatant, TeamId};
//! use shards_combat::status::{self, StatusEffect, StatusKind};
//!
//! let mut target = Combatant::new("Target", TeamId::new(1));
//! status::apply(&mut target.effects, StatusEffect::new(StatusKind::Bleed, 5.0, 3), false);
//!
//! let (report, _entries) = status::tick(&mut target, 1);
//! assert!((report.damage - 5.0).abs() < 1e-6);
//! assert_eq!(target.effects[0].duration, 2);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::entity::{Combatant, CombatantId, ResourceKind, StanceFlags};
use crate::output::{CombatLogEntry, EventTag, LoggedAction, Outcome};

/// Lower bound of any combined stat multiplier.
pub const MIN_MULTIPLIER: f32 = 0.1;

// =============================================================================
// Types
// =============================================================================

/// The nine status effect kinds.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StatusKind {
    /// Damage over time.
    Bleed,
    /// Damage over time.
    Poison,
    /// Damage over time.
    Burn,
    /// Evasion and speed debuff.
    Frost,
    /// Skip-turn control.
    Stun,
    /// Attack debuff.
    Weakness,
    /// Attack buff.
    StrengthBuff,
    /// Defense buff.
    DefenseBuff,
    /// Heal over time.
    Regeneration,
}

impl StatusKind {
    /// Returns true for kinds that deal damage on tick.
    #[must_use]
    pub const fn is_damage_over_time(self) -> bool {
        matches!(self, Self::Bleed | Self::Poison | Self::Burn)
    }

    /// Returns true for kinds the resolver reads as stat multipliers.
    #[must_use]
    pub const fn is_stat_modifier(self) -> bool {
        matches!(
            self,
            Self::Frost | Self::Weakness | Self::StrengthBuff | Self::DefenseBuff
        )
    }
}

impl fmt::Display for StatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bleed => "bleed",
            Self::Poison => "poison",
            Self::Burn => "burn",
            Self::Frost => "frost",
            Self::Stun => "stun",
            Self::Weakness => "weakness",
            Self::StrengthBuff => "strength buff",
            Self::DefenseBuff => "defense buff",
            Self::Regeneration => "regeneration",
        };
        f.write_str(name)
    }
}

/// An active status effect on a combatant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusEffect {
    /// Effect kind.
    pub kind: StatusKind,
    /// Rounds remaining. An instance is removed when this reaches 0.
    pub duration: u32,
    /// Magnitude; meaning depends on `kind`.
    pub potency: f32,
    /// Combatant that applied the effect, if any.
    pub source: Option<CombatantId>,
}

impl StatusEffect {
    /// Creates an effect with no source.
    #[must_use]
    pub const fn new(kind: StatusKind, potency: f32, duration: u32) -> Self {
        Self {
            kind,
            duration,
            potency,
            source: None,
        }
    }

    /// Attributes the effect to a source combatant.
    #[must_use]
    pub const fn from_source(mut self, source: CombatantId) -> Self {
        self.source = Some(source);
        self
    }

    /// The additive multiplier step this effect contributes, signed.
    ///
    /// Zero for kinds that are not stat modifiers.
    #[must_use]
    pub fn step(&self, default_step: f32) -> f32 {
        let magnitude = if self.potency > 0.0 {
            self.potency / 100.0
        } else {
            default_step
        };
        match self.kind {
            StatusKind::StrengthBuff | StatusKind::DefenseBuff => magnitude,
            StatusKind::Weakness | StatusKind::Frost => -magnitude,
            _ => 0.0,
        }
    }
}

/// Reference data describing a status effect a source can grant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusGrant {
    /// Effect kind.
    pub kind: StatusKind,
    /// Magnitude.
    pub potency: f32,
    /// Duration in rounds.
    pub duration: u32,
    /// Refresh an existing instance of the same kind instead of stacking.
    #[serde(default)]
    pub refresh: bool,
}

impl StatusGrant {
    /// Creates a stacking grant.
    #[must_use]
    pub const fn new(kind: StatusKind, potency: f32, duration: u32) -> Self {
        Self {
            kind,
            potency,
            duration,
            refresh: false,
        }
    }

    /// Marks the grant as refresh-on-reapply.
    #[must_use]
    pub const fn refreshing(mut self) -> Self {
        self.refresh = true;
        self
    }

    /// Instantiates the effect, attributed to `source`.
    #[must_use]
    pub fn instantiate(&self, source: CombatantId) -> StatusEffect {
        StatusEffect::new(self.kind, self.potency, self.duration).from_source(source)
    }
}

// =============================================================================
// Application
// =============================================================================

/// Adds an effect to a list of active effects.
///
/// With `refresh`, an existing instance of the same kind takes the maximum of
/// its and the new duration and potency, and no new instance is added.
/// Effects with zero duration are ignored.
pub fn apply(effects: &mut Vec<StatusEffect>, effect: StatusEffect, refresh: bool) {
    if effect.duration == 0 {
        return;
    }
    if refresh {
        if let Some(existing) = effects.iter_mut().find(|e| e.kind == effect.kind) {
            existing.duration = existing.duration.max(effect.duration);
            existing.potency = existing.potency.max(effect.potency);
            existing.source = effect.source.or(existing.source);
            return;
        }
    }
    effects.push(effect);
}

/// Removes every instance of a kind. Returns how many were removed.
pub fn remove(effects: &mut Vec<StatusEffect>, kind: StatusKind) -> usize {
    let before = effects.len();
    effects.retain(|e| e.kind != kind);
    before - effects.len()
}

/// Returns true if any instance of `kind` is active.
#[must_use]
pub fn has(effects: &[StatusEffect], kind: StatusKind) -> bool {
    effects.iter().any(|e| e.kind == kind)
}

// =============================================================================
// Multipliers
// =============================================================================

/// Stat multipliers derived from active effects, read by the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatusModifiers {
    /// Outgoing damage and accuracy (strength buff, weakness).
    pub attack: f32,
    /// Defense (defense buff).
    pub defense: f32,
    /// Evasion and action speed (frost).
    pub agility: f32,
}

impl Default for StatusModifiers {
    fn default() -> Self {
        Self {
            attack: 1.0,
            defense: 1.0,
            agility: 1.0,
        }
    }
}

impl StatusModifiers {
    /// Combines active effects into multipliers.
    ///
    /// Each multiplier is `max(0.1, 1 + Σ steps)` over the effects that feed it.
    #[must_use]
    pub fn from_effects(effects: &[StatusEffect], default_step: f32) -> Self {
        let mut attack = 0.0;
        let mut defense = 0.0;
        let mut agility = 0.0;
        for effect in effects.iter().filter(|e| e.kind.is_stat_modifier()) {
            let step = effect.step(default_step);
            match effect.kind {
                StatusKind::StrengthBuff | StatusKind::Weakness => attack += step,
                StatusKind::DefenseBuff => defense += step,
                StatusKind::Frost => agility += step,
                _ => {}
            }
        }
        Self {
            attack: combine(attack),
            defense: combine(defense),
            agility: combine(agility),
        }
    }
}

fn combine(sum: f32) -> f32 {
    (1.0 + sum).max(MIN_MULTIPLIER)
}

// =============================================================================
// Tick
// =============================================================================

/// Summary of one combatant's status tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickReport {
    /// Total damage dealt by damage-over-time effects.
    pub damage: f32,
    /// Total healing from regeneration.
    pub healing: f32,
    /// True if a control effect makes the combatant skip this round.
    pub stunned: bool,
    /// Kinds of the instances that expired this tick.
    pub expired: Vec<StatusKind>,
}

/// Ticks every active effect of a combatant once.
///
/// For each instance in application order: apply its per-round effect, then
/// decrement its duration, then remove it if the duration reached 0.
/// Damage over time is true damage (no mitigation) and floors health at 0.
/// Once health reaches 0 the remaining instances neither damage nor heal;
/// they only count down.
/// Returns the report and one log entry per effect that did something.
pub fn tick(combatant: &mut Combatant, round: u32) -> (TickReport, Vec<CombatLogEntry>) {
    let mut report = TickReport::default();
    let mut entries = Vec::new();
    let id = combatant.id();

    for effect in &mut combatant.effects {
        let alive = combatant.resources.health > 0.0;
        match effect.kind {
            _ if !alive => {}
            kind if kind.is_damage_over_time() => {
                let dealt = combatant.resources.drain(ResourceKind::Health, effect.potency);
                report.damage += dealt;
                entries.push(
                    CombatLogEntry::new(
                        round,
                        effect.source.unwrap_or(id),
                        LoggedAction::StatusTick(kind),
                        Outcome::Applied,
                        EventTag::StatusDamage,
                    )
                    .with_target(id)
                    .with_damage(effect.potency, dealt),
                );
            }
            StatusKind::Regeneration => {
                let healed = combatant.resources.restore(ResourceKind::Health, effect.potency);
                report.healing += healed;
                entries.push(
                    CombatLogEntry::new(
                        round,
                        id,
                        LoggedAction::StatusTick(StatusKind::Regeneration),
                        Outcome::Applied,
                        EventTag::StatusHeal,
                    )
                    .with_target(id)
                    .with_healing(healed),
                );
            }
            StatusKind::Stun => {
                report.stunned = true;
                combatant.stance.insert(StanceFlags::STUNNED);
            }
            _ => {}
        }
        effect.duration = effect.duration.saturating_sub(1);
    }

    let mut expired = Vec::new();
    combatant.effects.retain(|e| {
        if e.duration == 0 {
            expired.push(e.kind);
            false
        } else {
            true
        }
    });

    if !expired.is_empty() {
        tracing::trace!(combatant = %id, ?expired, "status effects expired");
        let mut entry = CombatLogEntry::new(
            round,
            id,
            LoggedAction::StatusTick(expired[0]),
            Outcome::Applied,
            EventTag::StatusExpired,
        )
        .with_target(id);
        entry.effects_removed.clone_from(&expired);
        entries.push(entry);
    }
    report.expired = expired;

    (report, entries)
}
