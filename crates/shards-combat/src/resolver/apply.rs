//! Delta application.
//!
//! Applies the deltas of a [`Resolution`](crate::output::Resolution) to the
//! arena in order. Every mutation clamps, so resource invariants hold no
//! matter what the deltas ask for.
//!
//! # Defeat bookkeeping
//!
//! When damage takes a combatant from positive health to zero, a `Defeated`
//! entry is emitted. Deltas that target an already dead combatant, other than
//! cost payment, are dropped.

use crate::arena::Arena;
use crate::entity::{CombatantId, ResourceKind};
use crate::output::{CombatLogEntry, Delta, EventTag, LoggedAction, Outcome};
use crate::status;

/// Applies `deltas` in order and returns the defeat entries they caused.
pub fn apply(arena: &mut Arena, deltas: &[Delta], round: u32) -> Vec<CombatLogEntry> {
    let mut defeated = Vec::new();

    for delta in deltas {
        let Some(combatant) = arena.get_mut(delta.target()) else {
            tracing::warn!(target_id = %delta.target(), "delta for unknown combatant dropped");
            continue;
        };
        let was_alive = combatant.is_alive();

        match delta {
            Delta::Damage { amount, source, .. } => {
                if was_alive {
                    combatant.resources.drain(ResourceKind::Health, *amount);
                    if !combatant.is_alive() {
                        tracing::info!(
                            round,
                            combatant = %combatant.id(),
                            name = %combatant.name,
                            "combatant defeated"
                        );
                        defeated.push(defeat_entry(round, combatant.id(), *source));
                    }
                }
            }
            Delta::Heal { amount, .. } => {
                if was_alive {
                    combatant.resources.restore(ResourceKind::Health, *amount);
                }
            }
            Delta::Spend {
                resource, amount, ..
            } => {
                combatant.resources.drain(*resource, *amount);
            }
            Delta::Restore {
                resource, amount, ..
            } => {
                if was_alive {
                    combatant.resources.restore(*resource, *amount);
                }
            }
            Delta::Stance { flags, .. } => {
                if was_alive {
                    combatant.stance.insert(*flags);
                }
            }
            Delta::ApplyStatus {
                effect, refresh, ..
            } => {
                if was_alive {
                    status::apply(&mut combatant.effects, effect.clone(), *refresh);
                }
            }
            Delta::StartCooldown { ability, rounds, .. } => {
                if let Some(slot) = combatant.ability_mut(ability) {
                    slot.cooldown = *rounds;
                    slot.times_used += 1;
                }
            }
        }
    }

    defeated
}

/// The log entry recording a combatant's fall.
pub(crate) fn defeat_entry(
    round: u32,
    fallen: CombatantId,
    source: Option<CombatantId>,
) -> CombatLogEntry {
    CombatLogEntry::new(
        round,
        source.unwrap_or(fallen),
        LoggedAction::Defeat,
        Outcome::Defeated,
        EventTag::Defeated,
    )
    .with_target(fallen)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Combatant, StanceFlags, TeamId};
    use crate::status::{StatusEffect, StatusKind};

    fn arena() -> (Arena, CombatantId, CombatantId) {
        let mut arena = Arena::new();
        let a = arena.spawn(Combatant::new("A", TeamId::new(0)));
        let b = arena.spawn(Combatant::new("B", TeamId::new(1)));
        (arena, a, b)
    }

    #[test]
    fn lethal_damage_emits_one_defeat() {
        let (mut arena, a, b) = arena();
        let deltas = [
            Delta::Damage {
                target: b,
                amount: 150.0,
                source: Some(a),
            },
            Delta::Damage {
                target: b,
                amount: 10.0,
                source: Some(a),
            },
        ];
        let defeated = apply(&mut arena, &deltas, 3);
        assert_eq!(defeated.len(), 1);
        assert_eq!(defeated[0].target, Some(b));
        assert_eq!(defeated[0].actor, a);
        assert_eq!(arena.get(b).map(|c| c.resources.health), Some(0.0));
    }

    #[test]
    fn spend_and_restore_clamp() {
        let (mut arena, a, _) = arena();
        let deltas = [
            Delta::Spend {
                target: a,
                resource: ResourceKind::Stamina,
                amount: 500.0,
            },
            Delta::Restore {
                target: a,
                resource: ResourceKind::Mana,
                amount: 500.0,
            },
        ];
        apply(&mut arena, &deltas, 1);
        let combatant = arena.get(a).unwrap();
        assert_eq!(combatant.resources.stamina, 0.0);
        assert_eq!(combatant.resources.mana, combatant.resources.max_mana);
    }

    #[test]
    fn dead_combatants_receive_no_effects() {
        let (mut arena, a, b) = arena();
        arena.get_mut(b).unwrap().resources.health = 0.0;
        let deltas = [
            Delta::ApplyStatus {
                target: b,
                effect: StatusEffect::new(StatusKind::Bleed, 5.0, 3).from_source(a),
                refresh: false,
            },
            Delta::Heal {
                target: b,
                amount: 20.0,
            },
            Delta::Stance {
                target: b,
                flags: StanceFlags::BLOCKING,
            },
        ];
        apply(&mut arena, &deltas, 1);
        let fallen = arena.get(b).unwrap();
        assert!(fallen.effects.is_empty());
        assert!(!fallen.is_alive());
        assert!(fallen.stance.is_empty());
    }

    #[test]
    fn unknown_targets_are_dropped() {
        let (mut arena, _, _) = arena();
        let deltas = [Delta::Heal {
            target: CombatantId::new(99),
            amount: 5.0,
        }];
        assert!(apply(&mut arena, &deltas, 1).is_empty());
    }
}
