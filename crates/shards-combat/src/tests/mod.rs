//! Cross-module tests.
//!
//! - `scenarios.rs`: worked rule examples with scripted dice
//! - `determinism.rs`: same seed, same log
//! - `integration.rs`: full sessions through the public surface
//! - `properties.rs`: proptest invariants
//! - `helpers.rs`: scripted dice and combatant factories

mod determinism;
pub(crate) mod helpers;
mod properties;
