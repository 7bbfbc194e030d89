//! Determinism verification tests.
//!
//! Same combatants, same declarations and the same seed must produce the
//! same log, round by round. This is what makes replays and batch runs
//! trustworthy.

use std::thread;

use crate::ability::ClassKind;
use crate::ai::{AiController, BehaviorProfile};
use crate::config::CombatConfig;
use crate::enemy::template;
use crate::entity::{Combatant, TeamId};
use crate::output::CombatLogEntry;
use crate::session::{RoundResult, Session};

// =============================================================================
// Setup
// =============================================================================

/// Three AI combatants per side, mixing classes and templates.
fn melee() -> Vec<Combatant> {
    let ai = |c: Combatant| c.with_ai(AiController::new(BehaviorProfile::Tactical));
    vec![
        ai(ClassKind::Warrior.hero("Aldric", TeamId::new(0))),
        ai(ClassKind::Sorcerer.hero("Mira", TeamId::new(0))),
        ai(ClassKind::Necromancer.hero("Vael", TeamId::new(0))),
        template("skeleton_warrior").unwrap().spawn(3, TeamId::new(1)),
        template("frost_mage").unwrap().spawn(3, TeamId::new(1)),
        template("dark_knight").unwrap().spawn(2, TeamId::new(1)),
    ]
}

fn run(seed: u64) -> Vec<CombatLogEntry> {
    let mut session = Session::new(melee(), CombatConfig::default(), seed).unwrap();
    session.run().unwrap();
    session.log().to_vec()
}

fn rounds(seed: u64, count: usize) -> Vec<RoundResult> {
    let mut session = Session::new(melee(), CombatConfig::default(), seed).unwrap();
    let mut results = Vec::new();
    while results.len() < count && !session.is_resolved() {
        results.push(session.advance_round().unwrap());
    }
    results
}

// =============================================================================
// Tests
// =============================================================================

#[test]
fn same_seed_same_log() {
    for seed in [0, 1, 42, 9_999] {
        assert_eq!(run(seed), run(seed), "seed {seed} diverged");
    }
}

#[test]
fn same_seed_same_rounds() {
    let a = rounds(17, 10);
    let b = rounds(17, 10);
    assert!(!a.is_empty());
    assert_eq!(a, b);
}

#[test]
fn seeds_change_the_fight() {
    let baseline = run(1);
    assert!((2..10).any(|seed| run(seed) != baseline));
}

#[test]
fn sessions_on_other_threads_agree() {
    let expected = run(123);
    let logs: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = (0..4).map(|_| scope.spawn(|| run(123))).collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    for log in logs {
        assert_eq!(log, expected);
    }
}

#[test]
fn final_snapshots_are_reproducible() {
    let snapshot = |seed| {
        let mut session = Session::new(melee(), CombatConfig::default(), seed).unwrap();
        session.run().unwrap();
        session.into_combatants()
    };
    assert_eq!(snapshot(5), snapshot(5));
}
