//! Action Resolver.
//!
//! Given an actor, a declared [`CombatAction`] and the current arena, the
//! resolver computes what happens and returns a [`Resolution`]: log entries
//! plus the [`Delta`](crate::output::Delta)s that realize them. It never
//! mutates state; [`apply()`] does that afterwards.
//!
//! # Resolution order for an attack
//!
//! 1. Cost check. An actor that cannot pay gets a `Rejected` entry and pays nothing.
//! 2. Parry (parryable attacks against a parrying defender).
//! 3. Dodge (`d100 <= evasion` against a dodging defender).
//! 4. Hit (`d100 <= accuracy`, adjusted and clamped).
//! 5. Critical (`d100 <= critical chance`).
//! 6. Damage: raw, mitigated by defense, then reduced by block.
//! 7. On-hit status effects.
//!
//! # Invariants
//!
//! - The resolver is pure: same arena, action and dice stream, same resolution
//! - Attacking a dead or friendly target is an error, not a log entry
//! - Insufficient resources are never an error

mod apply;
mod attack;

pub use apply::apply;
pub(crate) use apply::defeat_entry;
pub use attack::{mitigate, roll_strike, Strike, StrikeResult};

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ability;
use crate::arena::Arena;
use crate::config::CombatConfig;
use crate::dice::Dice;
use crate::entity::{CombatantId, ResourceKind, StanceFlags};
use crate::error::ActionRejected;
use crate::output::{CombatLogEntry, Delta, EventTag, LoggedAction, Outcome, Resolution};
use crate::status::StatusModifiers;

// =============================================================================
// Declared Actions
// =============================================================================

/// The five basic actions.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BasicAction {
    /// Fast, accurate, cheap attack.
    Light,
    /// Slow, strong attack that may cause bleeding.
    Heavy,
    /// Evade incoming attacks this round.
    Dodge,
    /// Reduce incoming damage this round.
    Block,
    /// Negate and counter an incoming attack this round.
    Parry,
}

impl BasicAction {
    /// Every basic action, in declaration order.
    pub const ALL: [Self; 5] = [Self::Light, Self::Heavy, Self::Dodge, Self::Block, Self::Parry];

    /// Returns true for Light and Heavy.
    #[must_use]
    pub const fn is_attack(self) -> bool {
        matches!(self, Self::Light | Self::Heavy)
    }

    /// The stance flag a defensive action raises.
    #[must_use]
    pub const fn stance(self) -> Option<StanceFlags> {
        match self {
            Self::Dodge => Some(StanceFlags::DODGING),
            Self::Block => Some(StanceFlags::BLOCKING),
            Self::Parry => Some(StanceFlags::PARRYING),
            Self::Light | Self::Heavy => None,
        }
    }
}

impl fmt::Display for BasicAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Light => "light",
            Self::Heavy => "heavy",
            Self::Dodge => "dodge",
            Self::Block => "block",
            Self::Parry => "parry",
        };
        f.write_str(name)
    }
}

/// Whom an action is aimed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Target {
    /// A single opponent.
    Enemy(CombatantId),
    /// The actor itself.
    Myself,
    /// Every living opponent.
    AllEnemies,
}

/// What an action does.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    /// One of the five basic actions.
    Basic(BasicAction),
    /// A named ability known by the actor.
    Ability(String),
    /// Attempt to escape the session.
    Flee,
}

/// An action declared for one round.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CombatAction {
    /// What to do.
    pub kind: ActionKind,
    /// Whom to do it to.
    pub target: Target,
}

impl CombatAction {
    /// Light attack against `target`.
    #[must_use]
    pub const fn light(target: CombatantId) -> Self {
        Self::basic(BasicAction::Light, Target::Enemy(target))
    }

    /// Heavy attack against `target`.
    #[must_use]
    pub const fn heavy(target: CombatantId) -> Self {
        Self::basic(BasicAction::Heavy, Target::Enemy(target))
    }

    /// Dodge stance.
    #[must_use]
    pub const fn dodge() -> Self {
        Self::basic(BasicAction::Dodge, Target::Myself)
    }

    /// Block stance.
    #[must_use]
    pub const fn block() -> Self {
        Self::basic(BasicAction::Block, Target::Myself)
    }

    /// Parry stance.
    #[must_use]
    pub const fn parry() -> Self {
        Self::basic(BasicAction::Parry, Target::Myself)
    }

    /// A basic action with an explicit target.
    #[must_use]
    pub const fn basic(action: BasicAction, target: Target) -> Self {
        Self {
            kind: ActionKind::Basic(action),
            target,
        }
    }

    /// A named ability.
    #[must_use]
    pub fn ability(name: impl Into<String>, target: Target) -> Self {
        Self {
            kind: ActionKind::Ability(name.into()),
            target,
        }
    }

    /// An escape attempt.
    #[must_use]
    pub const fn flee() -> Self {
        Self {
            kind: ActionKind::Flee,
            target: Target::Myself,
        }
    }

    /// The log representation of this action.
    #[must_use]
    pub fn logged(&self) -> LoggedAction {
        match &self.kind {
            ActionKind::Basic(action) => LoggedAction::Basic(*action),
            ActionKind::Ability(name) => LoggedAction::Ability(name.clone()),
            ActionKind::Flee => LoggedAction::Flee,
        }
    }

    /// Speed multiplier used to order the round.
    #[must_use]
    pub fn speed(&self, config: &CombatConfig) -> f32 {
        match &self.kind {
            ActionKind::Basic(action) => config.actions.get(*action).speed,
            ActionKind::Ability(_) | ActionKind::Flee => 1.0,
        }
    }
}

// =============================================================================
// Resolution
// =============================================================================

/// Everything the resolver reads besides the arena.
pub struct ResolveContext<'a> {
    /// Current round number.
    pub round: u32,
    /// Rules.
    pub config: &'a CombatConfig,
    /// Randomness.
    pub dice: &'a mut dyn Dice,
}

/// Resolves one declared action.
///
/// # Errors
///
/// Returns [`ActionRejected`] if the actor is missing or dead, or the target
/// is missing, dead, friendly or does not fit the action. An actor that cannot
/// pay is not an error: the resolution carries a `Rejected` entry instead.
pub fn resolve(
    arena: &Arena,
    actor: CombatantId,
    action: &CombatAction,
    ctx: &mut ResolveContext<'_>,
) -> Result<Resolution, ActionRejected> {
    let attacker = arena.require_alive(actor)?;
    tracing::trace!(round = ctx.round, actor = %actor, action = %action.logged(), "resolving");

    match &action.kind {
        ActionKind::Basic(basic) if basic.is_attack() => {
            resolve_attack(arena, actor, *basic, action.target, ctx)
        }
        ActionKind::Basic(basic) => Ok(resolve_stance(attacker.id(), *basic, arena, ctx)),
        ActionKind::Ability(name) => {
            match ability::activate(arena, actor, name, action.target, ctx) {
                Err(ActionRejected::InsufficientResource { resource, .. }) => {
                    Ok(exhausted(ctx.round, actor, action.logged(), resource))
                }
                other => other,
            }
        }
        ActionKind::Flee => Ok(resolve_flee(actor, ctx)),
    }
}

/// Log-only resolution for an action the actor could not pay for.
fn exhausted(
    round: u32,
    actor: CombatantId,
    action: LoggedAction,
    resource: ResourceKind,
) -> Resolution {
    tracing::debug!(round, actor = %actor, %action, %resource, "action rejected: insufficient resource");
    Resolution::entry_only(CombatLogEntry::new(
        round,
        actor,
        action,
        Outcome::Rejected,
        EventTag::Exhausted,
    ))
}

fn resolve_stance(
    actor: CombatantId,
    action: BasicAction,
    arena: &Arena,
    ctx: &ResolveContext<'_>,
) -> Resolution {
    let profile = ctx.config.actions.get(action);
    let Some(combatant) = arena.get(actor) else {
        return Resolution::new();
    };
    if !combatant
        .resources
        .can_afford(ResourceKind::Stamina, profile.stamina_cost)
    {
        return exhausted(ctx.round, actor, LoggedAction::Basic(action), ResourceKind::Stamina);
    }

    let mut resolution = Resolution::new();
    resolution.deltas.push(Delta::Spend {
        target: actor,
        resource: ResourceKind::Stamina,
        amount: profile.stamina_cost,
    });
    if let Some(flags) = action.stance() {
        resolution.deltas.push(Delta::Stance { target: actor, flags });
    }
    resolution.entries.push(
        CombatLogEntry::new(
            ctx.round,
            actor,
            LoggedAction::Basic(action),
            Outcome::Guard,
            EventTag::StanceRaised,
        )
        .with_target(actor)
        .with_cost(ResourceKind::Stamina, profile.stamina_cost),
    );
    resolution
}

fn resolve_attack(
    arena: &Arena,
    actor: CombatantId,
    action: BasicAction,
    target: Target,
    ctx: &mut ResolveContext<'_>,
) -> Result<Resolution, ActionRejected> {
    let Target::Enemy(target_id) = target else {
        return Err(ActionRejected::InvalidTarget {
            target: actor,
            action: action.to_string(),
        });
    };
    let attacker = arena.require_alive(actor)?;
    let defender = arena.require_hostile(attacker, target_id, &action.to_string())?;

    let profile = ctx.config.actions.get(action);
    if !attacker
        .resources
        .can_afford(ResourceKind::Stamina, profile.stamina_cost)
    {
        return Ok(exhausted(ctx.round, actor, LoggedAction::Basic(action), ResourceKind::Stamina));
    }

    let mut resolution = Resolution::new();
    resolution.deltas.push(Delta::Spend {
        target: actor,
        resource: ResourceKind::Stamina,
        amount: profile.stamina_cost,
    });

    let strike = Strike {
        base: attack::stat(attacker.stats().attack_power),
        damage_multiplier: profile.damage_multiplier,
        accuracy_multiplier: profile.accuracy_multiplier,
        critical_bonus: profile.critical_bonus,
        can_critical: true,
        parryable: profile.parryable,
        ignores_defense: false,
    };
    let result = roll_strike(attacker, defender, &strike, ctx.config, &mut *ctx.dice);
    let logged = LoggedAction::Basic(action);
    let mut entry = strike_entry(ctx.round, actor, target_id, logged, &result)
        .with_cost(ResourceKind::Stamina, profile.stamina_cost);

    match result {
        StrikeResult::Landed { final_damage, .. } => {
            resolution.deltas.push(Delta::Damage {
                target: target_id,
                amount: final_damage,
                source: Some(actor),
            });
            // a killing blow leaves nothing to carry the status
            let survives = final_damage < defender.resources.health;
            if let Some(on_hit) = profile.on_hit.as_ref().filter(|_| survives) {
                if ctx.dice.chance(on_hit.chance) {
                    entry.effects_applied.push(on_hit.grant.kind);
                    resolution.deltas.push(Delta::ApplyStatus {
                        target: target_id,
                        effect: on_hit.grant.instantiate(actor),
                        refresh: on_hit.grant.refresh,
                    });
                }
            }
            resolution.entries.push(entry);
        }
        StrikeResult::Parried {
            counter_raw,
            counter_final,
        } => {
            resolution.entries.push(entry);
            resolution.deltas.push(Delta::Damage {
                target: actor,
                amount: counter_final,
                source: Some(target_id),
            });
            resolution.entries.push(
                CombatLogEntry::new(
                    ctx.round,
                    target_id,
                    LoggedAction::Counter,
                    Outcome::Hit,
                    EventTag::Riposte,
                )
                .with_target(actor)
                .with_damage(counter_raw, counter_final),
            );
        }
        StrikeResult::Dodged | StrikeResult::Miss => resolution.entries.push(entry),
    }

    tracing::debug!(
        round = ctx.round,
        actor = %actor,
        target = %target_id,
        %action,
        outcome = %resolution.entries[0].outcome,
        damage = resolution.entries[0].final_damage,
        "attack resolved"
    );
    Ok(resolution)
}

/// Builds the log entry describing a strike result.
pub(crate) fn strike_entry(
    round: u32,
    actor: CombatantId,
    target: CombatantId,
    action: LoggedAction,
    result: &StrikeResult,
) -> CombatLogEntry {
    let (outcome, tag) = match result {
        StrikeResult::Parried { .. } => (Outcome::Parried, EventTag::Deflect),
        StrikeResult::Dodged => (Outcome::Dodged, EventTag::Evade),
        StrikeResult::Miss => (Outcome::Miss, EventTag::Whiff),
        StrikeResult::Landed { blocked: true, .. } => (Outcome::Blocked, EventTag::Guarded),
        StrikeResult::Landed { critical: true, .. } => {
            (Outcome::Critical, EventTag::CriticalStrike)
        }
        StrikeResult::Landed { .. } => (Outcome::Hit, EventTag::Strike),
    };
    let entry = CombatLogEntry::new(round, actor, action, outcome, tag).with_target(target);
    match *result {
        StrikeResult::Landed {
            critical,
            raw,
            final_damage,
            ..
        } => entry.with_damage(raw, final_damage).critical(critical),
        _ => entry,
    }
}

fn resolve_flee(actor: CombatantId, ctx: &mut ResolveContext<'_>) -> Resolution {
    let escaped = ctx.dice.chance(ctx.config.flee_chance);
    let (outcome, tag) = if escaped {
        (Outcome::Fled, EventTag::Escape)
    } else {
        (Outcome::FleeFailed, EventTag::EscapeFailed)
    };
    tracing::debug!(round = ctx.round, actor = %actor, escaped, "flee attempt");
    Resolution::entry_only(CombatLogEntry::new(
        ctx.round,
        actor,
        LoggedAction::Flee,
        outcome,
        tag,
    ))
}

/// Status multipliers of a combatant under `config`.
pub(crate) fn modifiers_of(
    combatant: &crate::entity::Combatant,
    config: &CombatConfig,
) -> StatusModifiers {
    StatusModifiers::from_effects(&combatant.effects, config.buff_step)
}
