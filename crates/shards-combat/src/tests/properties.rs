//! Property tests for the engine invariants.

use proptest::prelude::*;

use crate::ability::{abilities_for, validate_use, AbilityDefinition, ClassKind, TargetMode};
use crate::ai::{AiController, BehaviorProfile};
use crate::config::CombatConfig;
use crate::enemy::templates;
use crate::entity::components::{Attribute, Attributes};
use crate::entity::{Combatant, Equipment, ResourceKind, StanceFlags, TeamId};
use crate::error::ActionRejected;
use crate::resolver::{mitigate, roll_strike, Strike, StrikeResult};
use crate::session::Session;
use crate::status::{self, StatusEffect, StatusKind};

use super::helpers::ScriptedDice;

fn attributes() -> impl Strategy<Value = Attributes> {
    prop::array::uniform6(3..=20i32).prop_map(|[s, d, c, i, w, ch]| {
        Attributes::default()
            .with(Attribute::Strength, s)
            .with(Attribute::Dexterity, d)
            .with(Attribute::Constitution, c)
            .with(Attribute::Intelligence, i)
            .with(Attribute::Wisdom, w)
            .with(Attribute::Charisma, ch)
    })
}

fn profile() -> impl Strategy<Value = BehaviorProfile> {
    prop_oneof![
        Just(BehaviorProfile::Aggressive),
        Just(BehaviorProfile::Defensive),
        Just(BehaviorProfile::Balanced),
        Just(BehaviorProfile::Tactical),
        Just(BehaviorProfile::Berserker),
        Just(BehaviorProfile::Coward),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn resources_stay_in_bounds(
        seed in any::<u64>(),
        first in 0..9usize,
        second in 0..9usize,
        level in 1..6u32,
        hero in attributes(),
        behavior in profile(),
    ) {
        let catalog = templates();
        let hero = Combatant::new("Hero", TeamId::new(0))
            .with_attributes(hero)
            .with_ai(AiController::new(behavior))
            .with_abilities(abilities_for(ClassKind::Rogue));
        let roster = vec![
            hero,
            catalog[first].spawn(level, TeamId::new(1)),
            catalog[second].spawn(level, TeamId::new(1)),
        ];
        let config = CombatConfig { max_rounds: 30, ..CombatConfig::default() };
        let mut session = Session::new(roster, config, seed).unwrap();

        while !session.is_resolved() {
            session.advance_round().unwrap();
            for c in session.combatants() {
                let r = &c.resources;
                prop_assert!((0.0..=r.max_health).contains(&r.health), "{}: health {}", c.name, r.health);
                prop_assert!((0.0..=r.max_stamina).contains(&r.stamina));
                prop_assert!((0.0..=r.max_mana).contains(&r.mana));
            }
        }
    }

    #[test]
    fn block_keeps_at_most_forty_percent(raw in 0.01f32..10_000.0, defense in 0..40i32) {
        let config = CombatConfig::default();
        let mut target = Combatant::new("Target", TeamId::new(1))
            .with_equipment(Equipment::armor("Plate", defense));
        let (open, _) = mitigate(raw, &target, false, &config);
        target.stance.insert(StanceFlags::BLOCKING);
        let (blocked, was_blocked) = mitigate(raw, &target, false, &config);
        prop_assert!(was_blocked);
        prop_assert!(blocked <= open * 0.4 + 1e-4);
        prop_assert!(blocked > 0.0);
    }

    #[test]
    fn successful_parry_spares_the_defender(attacker in attributes(), parrier in attributes()) {
        let config = CombatConfig::default();
        let attacker = Combatant::new("A", TeamId::new(0)).with_attributes(attacker);
        let mut defender = Combatant::new("D", TeamId::new(1)).with_attributes(parrier);
        defender.stance.insert(StanceFlags::PARRYING);
        let strike = Strike {
            base: 12.0,
            damage_multiplier: 1.0,
            accuracy_multiplier: 1.0,
            critical_bonus: 0.0,
            can_critical: true,
            parryable: true,
            ignores_defense: false,
        };
        // a roll of 1 is under the minimum parry chance
        let mut dice = ScriptedDice::rolls([1]);
        let result = roll_strike(&attacker, &defender, &strike, &config, &mut dice);
        let StrikeResult::Parried { counter_final, .. } = result else {
            return Err(TestCaseError::fail(format!("expected a parry, got {result:?}")));
        };
        prop_assert!(counter_final > 0.0);
    }

    #[test]
    fn abilities_on_cooldown_are_rejected(cooldown in 1..10u32, ticks in 0..12u32) {
        let definition = AbilityDefinition::new("Jab", ResourceKind::Stamina, 5.0, 9, TargetMode::SingleEnemy)
            .with_damage(5.0);
        let mut caster = Combatant::new("C", TeamId::new(0)).with_ability(definition);
        caster.ability_mut("Jab").unwrap().cooldown = cooldown;
        for _ in 0..ticks {
            caster.tick_cooldowns();
        }
        let remaining = cooldown.saturating_sub(ticks);
        prop_assert_eq!(caster.cooldown("Jab"), Some(remaining));
        match validate_use(&caster, "Jab") {
            Ok(_) => prop_assert_eq!(remaining, 0),
            Err(ActionRejected::OnCooldown { remaining: r, .. }) => prop_assert_eq!(r, remaining),
            Err(other) => return Err(TestCaseError::fail(other.to_string())),
        }
    }

    #[test]
    fn durations_drop_by_one_per_tick(duration in 1..8u32, potency in 0.0f32..5.0) {
        let mut bearer = Combatant::new("B", TeamId::new(0));
        status::apply(&mut bearer.effects, StatusEffect::new(StatusKind::Poison, potency, duration), false);
        for round in 1..=duration {
            let before = bearer.effects.first().map(|e| e.duration);
            prop_assert_eq!(before, Some(duration - round + 1));
            let (report, _) = status::tick(&mut bearer, round);
            if round < duration {
                prop_assert_eq!(bearer.effects[0].duration, duration - round);
                prop_assert!(report.expired.is_empty());
            } else {
                prop_assert!(bearer.effects.is_empty());
                prop_assert_eq!(report.expired, vec![StatusKind::Poison]);
            }
        }
    }
}
