//! # Shards Combat
//!
//! Turn-based, stamina-governed combat rules engine for Shards of Eternity.
//!
//! This crate resolves encounters between combatants: it decides who acts
//! when, whether attacks land, how much damage is dealt, how status effects
//! evolve, how AI opponents choose actions, and when a fight ends. It does no
//! I/O and owns no persistence; callers feed it rosters and declarations and
//! read back an append-only combat log.
//!
//! ## Architecture
//!
//! - **Combatants** live in an [`Arena`](arena::Arena) owned by one [`Session`](session::Session)
//! - **Resolver**: a pure function from (arena, action, dice) to log entries and deltas
//! - **Apply**: deltas are applied in order after each resolution
//! - **Policies**: AI weight tables and reward computation are data or trait objects
//!
//! ## Usage
//!
//! ```
//! use shards_combat::ability::ClassKind;
//! use shards_combat::config::CombatConfig;
//! use shards_combat::enemy::template;
//! use shards_combat::entity::{CombatantId, TeamId};
//! use shards_combat::resolver::CombatAction;
//! use shards_combat::session::Session;
//!
//! let hero = ClassKind::Warrior.hero("Aldric", TeamId::new(0));
//! let wolf = template("corrupt_wolf").unwrap().spawn(1, TeamId::new(1));
//! let mut session = Session::new(vec![hero, wolf], CombatConfig::default(), 42).unwrap();
//!
//! let (hero_id, wolf_id) = (CombatantId::new(0), CombatantId::new(1));
//! session.declare_action(hero_id, CombatAction::light(wolf_id)).unwrap();
//! let round = session.advance_round().unwrap();
//! assert_eq!(round.round, 1);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod ability;
pub mod ai;
pub mod arena;
pub mod batch;
pub mod config;
pub mod dice;
pub mod enemy;
pub mod entity;
pub mod error;
pub mod output;
pub mod resolver;
pub mod reward;
pub mod session;
pub mod status;

pub use config::CombatConfig;
pub use entity::{Combatant, CombatantId, TeamId};
pub use error::{ActionRejected, CombatError, ConfigError, Result, SessionError};
pub use output::CombatLogEntry;
pub use resolver::CombatAction;
pub use session::{Session, SessionOutcome, Verdict};

#[cfg(test)]
mod tests;
