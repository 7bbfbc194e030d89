//! Ability validation and activation.

use crate::arena::Arena;
use crate::entity::{Combatant, CombatantId};
use crate::error::ActionRejected;
use crate::output::{CombatLogEntry, Cost, Delta, EventTag, LoggedAction, Outcome, Resolution};
use crate::resolver::{roll_strike, strike_entry, ResolveContext, Strike, StrikeResult, Target};

use super::{AbilityDefinition, TargetMode};

/// Checks that `caster` may use the named ability right now, ignoring targets.
///
/// Checks run in order: the ability is known, off cooldown, and affordable.
///
/// # Errors
///
/// Returns `UnknownAbility`, `OnCooldown` or `InsufficientResource`.
pub fn validate_use<'c>(
    caster: &'c Combatant,
    name: &str,
) -> Result<&'c AbilityDefinition, ActionRejected> {
    let slot = caster
        .ability(name)
        .ok_or_else(|| ActionRejected::UnknownAbility(name.to_string()))?;
    if !slot.is_ready() {
        return Err(ActionRejected::OnCooldown {
            name: name.to_string(),
            remaining: slot.cooldown,
        });
    }
    let definition = &slot.definition;
    if !caster
        .resources
        .can_afford(definition.resource, definition.cost)
    {
        return Err(ActionRejected::InsufficientResource {
            resource: definition.resource,
            needed: definition.cost,
            available: caster.resources.current(definition.resource),
        });
    }
    Ok(definition)
}

/// Resolves an ability use by `actor`.
///
/// On success the resolution pays the cost, starts the cooldown and carries
/// one log entry per affected combatant, all tagged as an ability cast.
/// Damaging abilities roll dodge, hit and critical per target like a basic
/// attack but can never be parried.
///
/// # Errors
///
/// Everything [`validate_use`] rejects, plus `InvalidTarget` when the target
/// does not fit the ability's [`TargetMode`] and `DeadTarget` for a fallen
/// single target.
pub fn activate(
    arena: &Arena,
    actor: CombatantId,
    name: &str,
    target: Target,
    ctx: &mut ResolveContext<'_>,
) -> Result<Resolution, ActionRejected> {
    let caster = arena.require_alive(actor)?;
    let definition = validate_use(caster, name)?;
    let targets = select_targets(arena, caster, definition, target)?;

    let mut resolution = Resolution::new();
    resolution.deltas.push(Delta::Spend {
        target: actor,
        resource: definition.resource,
        amount: definition.cost,
    });
    resolution.deltas.push(Delta::StartCooldown {
        target: actor,
        ability: definition.name.clone(),
        rounds: definition.cooldown_rounds(),
    });

    if definition.is_damaging() {
        for target_id in &targets {
            let Some(defender) = arena.get(*target_id) else {
                continue;
            };
            strike_target(caster, defender, definition, ctx, &mut resolution);
        }
    } else {
        for target_id in &targets {
            let entry = apply_effects(actor, *target_id, definition, ctx.round, &mut resolution.deltas);
            resolution.entries.push(entry);
        }
        if definition.healing > 0.0 {
            let amount = definition.healing_for(&caster.attributes);
            resolution.deltas.push(Delta::Heal { target: actor, amount });
            if let Some(entry) = resolution.entries.first_mut() {
                entry.healing += amount;
            }
        }
    }

    if let Some(gain) = definition.restores {
        resolution.deltas.push(Delta::Restore {
            target: actor,
            resource: gain.resource,
            amount: gain.amount,
        });
    }

    // The first entry carries the cost; an area cast with no one left to hit still logs one.
    let cost = Cost {
        resource: definition.resource,
        amount: definition.cost,
    };
    if let Some(first) = resolution.entries.first_mut() {
        first.cost = Some(cost);
    } else {
        resolution.entries.push(
            CombatLogEntry::new(
                ctx.round,
                actor,
                LoggedAction::Ability(definition.name.clone()),
                Outcome::Applied,
                EventTag::AbilityCast,
            )
            .with_cost(cost.resource, cost.amount),
        );
    }

    tracing::debug!(
        round = ctx.round,
        actor = %actor,
        ability = %definition.name,
        targets = targets.len(),
        "ability activated"
    );
    Ok(resolution)
}

/// The combatants an ability affects.
///
/// # Errors
///
/// `InvalidTarget` on a target mode mismatch, plus the lookup failures of
/// [`Arena::require_hostile`] for a single target.
pub(crate) fn select_targets(
    arena: &Arena,
    caster: &Combatant,
    definition: &AbilityDefinition,
    target: Target,
) -> Result<Vec<CombatantId>, ActionRejected> {
    let mismatch = |target| ActionRejected::InvalidTarget {
        target,
        action: definition.name.clone(),
    };
    match (definition.target, target) {
        (TargetMode::SelfOnly, Target::Myself) => Ok(vec![caster.id()]),
        (TargetMode::SingleEnemy, Target::Enemy(id)) => {
            let defender = arena.require_hostile(caster, id, &definition.name)?;
            Ok(vec![defender.id()])
        }
        (TargetMode::AllEnemies, Target::AllEnemies) => Ok(arena.living_enemies_of(caster.id())),
        (_, Target::Enemy(id)) => Err(mismatch(id)),
        (_, Target::Myself | Target::AllEnemies) => Err(mismatch(caster.id())),
    }
}

fn strike_target(
    caster: &Combatant,
    defender: &Combatant,
    definition: &AbilityDefinition,
    ctx: &mut ResolveContext<'_>,
    resolution: &mut Resolution,
) {
    let strike = Strike {
        base: definition.damage_for(&caster.attributes),
        damage_multiplier: 1.0,
        accuracy_multiplier: 1.0,
        critical_bonus: 0.0,
        can_critical: definition.can_critical,
        parryable: false,
        ignores_defense: definition.ignores_defense,
    };
    let result = roll_strike(caster, defender, &strike, ctx.config, &mut *ctx.dice);
    let mut entry = strike_entry(
        ctx.round,
        caster.id(),
        defender.id(),
        LoggedAction::Ability(definition.name.clone()),
        &result,
    );
    entry.tag = EventTag::AbilityCast;

    if let StrikeResult::Landed { final_damage, .. } = result {
        resolution.deltas.push(Delta::Damage {
            target: defender.id(),
            amount: final_damage,
            source: Some(caster.id()),
        });
        let survives = final_damage < defender.resources.health;
        if let Some(grant) = definition.status.as_ref().filter(|_| survives) {
            entry.effects_applied.push(grant.kind);
            resolution.deltas.push(Delta::ApplyStatus {
                target: defender.id(),
                effect: grant.instantiate(caster.id()),
                refresh: grant.refresh,
            });
        }
        if definition.healing > 0.0 {
            let amount = definition.healing_for(&caster.attributes);
            entry.healing = amount;
            resolution.deltas.push(Delta::Heal {
                target: caster.id(),
                amount,
            });
        }
    }
    resolution.entries.push(entry);
}

/// Log entry and deltas for a non-damaging ability on one target.
fn apply_effects(
    actor: CombatantId,
    target: CombatantId,
    definition: &AbilityDefinition,
    round: u32,
    deltas: &mut Vec<Delta>,
) -> CombatLogEntry {
    let mut entry = CombatLogEntry::new(
        round,
        actor,
        LoggedAction::Ability(definition.name.clone()),
        Outcome::Applied,
        EventTag::AbilityCast,
    )
    .with_target(target);
    if let Some(grant) = &definition.status {
        entry.effects_applied.push(grant.kind);
        deltas.push(Delta::ApplyStatus {
            target,
            effect: grant.instantiate(actor),
            refresh: grant.refresh,
        });
    }
    entry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ability::find;
    use crate::config::CombatConfig;
    use crate::entity::components::{Attribute, Attributes, ResourceKind, Resources};
    use crate::entity::TeamId;
    use crate::resolver::apply;
    use crate::status::StatusKind;
    use crate::tests::helpers::ScriptedDice;

    fn duel(kit: &[&str]) -> (Arena, CombatantId, CombatantId) {
        let mut arena = Arena::new();
        let caster = Combatant::new("Caster", TeamId::new(0))
            .with_attributes(Attributes::default().with(Attribute::Intelligence, 16))
            .with_resources(Resources::full(100.0, 100.0, 100.0))
            .with_abilities(kit.iter().filter_map(|name| find(name)));
        let a = arena.spawn(caster);
        let b = arena.spawn(Combatant::new("Target", TeamId::new(1)));
        (arena, a, b)
    }

    fn activate_with(
        arena: &Arena,
        actor: CombatantId,
        name: &str,
        target: Target,
        rolls: &[u32],
    ) -> Result<Resolution, ActionRejected> {
        let config = CombatConfig::default();
        let mut dice = ScriptedDice::rolls(rolls.iter().copied());
        let mut ctx = ResolveContext {
            round: 1,
            config: &config,
            dice: &mut dice,
        };
        activate(arena, actor, name, target, &mut ctx)
    }

    mod validation_tests {
        use super::*;

        #[test]
        fn unknown_ability_is_rejected() {
            let (arena, a, b) = duel(&[]);
            assert_eq!(
                activate_with(&arena, a, "Fireball", Target::Enemy(b), &[]).err(),
                Some(ActionRejected::UnknownAbility("Fireball".into()))
            );
        }

        #[test]
        fn cooling_down_ability_is_rejected() {
            let (mut arena, a, b) = duel(&["Fireball"]);
            arena.get_mut(a).unwrap().ability_mut("Fireball").unwrap().cooldown = 2;
            assert_eq!(
                activate_with(&arena, a, "Fireball", Target::Enemy(b), &[]).err(),
                Some(ActionRejected::OnCooldown {
                    name: "Fireball".into(),
                    remaining: 2
                })
            );
        }

        #[test]
        fn unaffordable_ability_reports_shortfall() {
            let (mut arena, a, b) = duel(&["Fireball"]);
            arena.get_mut(a).unwrap().resources.mana = 10.0;
            assert_eq!(
                activate_with(&arena, a, "Fireball", Target::Enemy(b), &[]).err(),
                Some(ActionRejected::InsufficientResource {
                    resource: ResourceKind::Mana,
                    needed: 30.0,
                    available: 10.0,
                })
            );
        }

        #[test]
        fn self_ability_aimed_at_enemy_is_invalid() {
            let (arena, a, b) = duel(&["Mana Shield"]);
            assert!(matches!(
                activate_with(&arena, a, "Mana Shield", Target::Enemy(b), &[]),
                Err(ActionRejected::InvalidTarget { target, .. }) if target == b
            ));
        }

        #[test]
        fn dead_single_target_is_rejected() {
            let (mut arena, a, b) = duel(&["Fireball"]);
            arena.get_mut(b).unwrap().resources.health = 0.0;
            assert_eq!(
                activate_with(&arena, a, "Fireball", Target::Enemy(b), &[]).err(),
                Some(ActionRejected::DeadTarget(b))
            );
        }

        #[test]
        fn health_costs_cannot_be_lethal() {
            let (mut arena, a, _) = duel(&["Dark Ritual"]);
            arena.get_mut(a).unwrap().resources.health = 30.0;
            assert!(matches!(
                activate_with(&arena, a, "Dark Ritual", Target::Myself, &[]),
                Err(ActionRejected::InsufficientResource { .. })
            ));
        }
    }

    mod activation_tests {
        use super::*;

        #[test]
        fn fireball_pays_cost_starts_cooldown_and_burns() {
            let (mut arena, a, b) = duel(&["Fireball"]);
            // hit, no critical
            let resolution = activate_with(&arena, a, "Fireball", Target::Enemy(b), &[1, 100]).unwrap();
            assert_eq!(resolution.entries.len(), 1);
            let entry = &resolution.entries[0];
            assert_eq!(entry.tag, EventTag::AbilityCast);
            assert_eq!(entry.outcome, Outcome::Hit);
            assert_eq!(entry.effects_applied, vec![StatusKind::Burn]);
            // 35 * (1 + 3 * 0.2), defense ignored
            assert!((entry.final_damage - 56.0).abs() < 1e-3);

            apply(&mut arena, &resolution.deltas, 1);
            let caster = arena.get(a).unwrap();
            assert!((caster.resources.mana - 70.0).abs() < 1e-4);
            assert_eq!(caster.cooldown("Fireball"), Some(1));
            assert_eq!(caster.ability("Fireball").unwrap().times_used, 1);
            let target = arena.get(b).unwrap();
            assert!((target.resources.health - 44.0).abs() < 1e-3);
            assert!(crate::status::has(&target.effects, StatusKind::Burn));
        }

        #[test]
        fn killing_fireball_leaves_no_burn() {
            let (mut arena, a, b) = duel(&["Fireball"]);
            arena.get_mut(b).unwrap().resources.health = 20.0;
            let resolution = activate_with(&arena, a, "Fireball", Target::Enemy(b), &[1, 100]).unwrap();
            assert!(resolution.entries[0].effects_applied.is_empty());

            let defeated = apply(&mut arena, &resolution.deltas, 1);
            assert_eq!(defeated.len(), 1);
            assert!(arena.get(b).unwrap().effects.is_empty());
        }

        #[test]
        fn missed_ability_still_costs() {
            let (mut arena, a, b) = duel(&["Fireball"]);
            let resolution = activate_with(&arena, a, "Fireball", Target::Enemy(b), &[99]).unwrap();
            assert_eq!(resolution.outcome(), Some(Outcome::Miss));
            apply(&mut arena, &resolution.deltas, 1);
            assert!((arena.get(a).unwrap().resources.mana - 70.0).abs() < 1e-4);
            assert!(arena.get(b).unwrap().effects.is_empty());
        }

        #[test]
        fn area_ability_strikes_every_enemy() {
            let mut arena = Arena::new();
            let caster = Combatant::new("Caster", TeamId::new(0))
                .with_resources(Resources::full(100.0, 100.0, 100.0))
                .with_ability(find("Ice Storm").unwrap());
            let a = arena.spawn(caster);
            arena.spawn(Combatant::new("One", TeamId::new(1)));
            arena.spawn(Combatant::new("Two", TeamId::new(1)));
            arena.spawn(Combatant::new("Ally", TeamId::new(0)));
            let resolution =
                activate_with(&arena, a, "Ice Storm", Target::AllEnemies, &[1, 100, 1, 100]).unwrap();
            assert_eq!(resolution.entries.len(), 2);
            assert!(resolution.entries[0].cost.is_some());
            assert!(resolution.entries[1].cost.is_none());
        }

        #[test]
        fn self_heal_is_applied_to_caster() {
            let mut arena = Arena::new();
            let paladin = Combatant::new("Paladin", TeamId::new(0))
                .with_resources(Resources::full(100.0, 100.0, 100.0))
                .with_ability(find("Lay on Hands").unwrap());
            let a = arena.spawn(paladin);
            arena.spawn(Combatant::new("Foe", TeamId::new(1)));
            arena.get_mut(a).unwrap().resources.health = 20.0;

            let resolution = activate_with(&arena, a, "Lay on Hands", Target::Myself, &[]).unwrap();
            assert!((resolution.entries[0].healing - 50.0).abs() < 1e-4);
            apply(&mut arena, &resolution.deltas, 1);
            assert!((arena.get(a).unwrap().resources.health - 70.0).abs() < 1e-4);
        }

        #[test]
        fn dark_ritual_converts_health_into_mana() {
            let (mut arena, a, _) = duel(&["Dark Ritual"]);
            arena.get_mut(a).unwrap().resources.mana = 10.0;
            let resolution = activate_with(&arena, a, "Dark Ritual", Target::Myself, &[]).unwrap();
            apply(&mut arena, &resolution.deltas, 1);
            let caster = arena.get(a).unwrap();
            assert!((caster.resources.health - 70.0).abs() < 1e-4);
            assert!((caster.resources.mana - 40.0).abs() < 1e-4);
        }

        #[test]
        fn curse_applies_without_rolling() {
            let (mut arena, a, b) = duel(&["Curse of Weakness"]);
            let resolution =
                activate_with(&arena, a, "Curse of Weakness", Target::Enemy(b), &[]).unwrap();
            assert_eq!(resolution.outcome(), Some(Outcome::Applied));
            apply(&mut arena, &resolution.deltas, 1);
            assert!(crate::status::has(&arena.get(b).unwrap().effects, StatusKind::Weakness));
        }
    }
}
