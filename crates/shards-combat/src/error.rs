//! Error taxonomy for the combat engine.
//!
//! Three families, each recoverable at a different boundary:
//!
//! - [`ActionRejected`]: a single declared action cannot be accepted. The
//!   round does not advance and no state is mutated.
//! - [`SessionError`]: the session was misused (advancing a resolved session,
//!   declaring for an AI-controlled combatant).
//! - [`ConfigError`]: malformed reference data or configuration. Only raised
//!   while a session is being created, never mid-combat.
//!
//! [`CombatError`] wraps all three for callers that want a single type.

use thiserror::Error;

use crate::entity::{CombatantId, ResourceKind};

/// Reasons a declared action is refused.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ActionRejected {
    /// No combatant with this id exists in the session.
    #[error("unknown combatant {0}")]
    UnknownCombatant(CombatantId),

    /// The acting combatant is dead.
    #[error("combatant {0} is dead and cannot act")]
    DeadActor(CombatantId),

    /// The target is dead.
    #[error("target {0} is dead")]
    DeadTarget(CombatantId),

    /// The actor does not know an ability with this name.
    #[error("unknown ability `{0}`")]
    UnknownAbility(String),

    /// The ability is still cooling down.
    #[error("ability `{name}` is on cooldown for {remaining} more round(s)")]
    OnCooldown {
        /// Ability name
        name: String,
        /// Rounds left
        remaining: u32,
    },

    /// The actor cannot pay the cost.
    #[error("insufficient {resource}: needed {needed}, available {available}")]
    InsufficientResource {
        /// Pool the cost is paid from
        resource: ResourceKind,
        /// Cost of the action
        needed: f32,
        /// Current value of the pool
        available: f32,
    },

    /// The target does not fit the action's target mode.
    #[error("invalid target {target} for {action}")]
    InvalidTarget {
        /// Intended target
        target: CombatantId,
        /// Human readable action name
        action: String,
    },
}

/// Misuse of a session.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    /// The action itself was refused.
    #[error(transparent)]
    Rejected(#[from] ActionRejected),

    /// The session already reached a verdict.
    #[error("session is already resolved")]
    AlreadyResolved,

    /// Actions may only be declared for player-controlled combatants.
    #[error("combatant {0} is AI-controlled")]
    NotPlayerControlled(CombatantId),

    /// No combatant with this id exists in the session.
    #[error("unknown combatant {0}")]
    UnknownCombatant(CombatantId),
}

/// Invalid configuration or reference data.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// An ability definition is malformed.
    #[error("ability `{name}`: {reason}")]
    MalformedAbility {
        /// Ability name
        name: String,
        /// What is wrong with it
        reason: String,
    },

    /// A probability lies outside `[0, 1]`.
    #[error("{field} must be a probability in [0, 1], got {value}")]
    InvalidProbability {
        /// Config field
        field: &'static str,
        /// Offending value
        value: f32,
    },

    /// A numeric setting is out of range.
    #[error("{field} is out of range: {reason}")]
    OutOfRange {
        /// Config field
        field: &'static str,
        /// What is wrong with it
        reason: String,
    },

    /// The roster has no combatants.
    #[error("a session needs at least one combatant")]
    EmptyRoster,

    /// All combatants fight for the same team.
    #[error("a session needs at least two teams, found {0}")]
    SingleTeam(usize),

    /// Two abilities on one combatant share a name.
    #[error("combatant `{combatant}` knows ability `{ability}` twice")]
    DuplicateAbility {
        /// Combatant name
        combatant: String,
        /// Ability name
        ability: String,
    },

    /// Resource pools violate `0 <= current <= max` or have `max_health <= 0`.
    #[error("combatant `{0}` has invalid resource pools")]
    InvalidResources(String),

    /// A batch run needs a round cap so every encounter terminates.
    #[error("batch runs require max_rounds > 0")]
    UnboundedBatch,

    /// No enemy template with this key exists.
    #[error("unknown enemy template `{0}`")]
    UnknownEnemy(String),
}

/// Any error produced by the engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CombatError {
    /// See [`ActionRejected`].
    #[error(transparent)]
    Rejected(#[from] ActionRejected),

    /// See [`SessionError`].
    #[error(transparent)]
    Session(#[from] SessionError),

    /// See [`ConfigError`].
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result alias used across the crate.
pub type Result<T, E = CombatError> = std::result::Result<T, E>;
