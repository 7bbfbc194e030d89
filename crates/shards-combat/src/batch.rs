//! Batch execution of independent encounters.
//!
//! Sessions share nothing, so a batch runs them on the rayon thread pool.
//! Each encounter carries its own seed; the report for a seed is the same
//! whether it ran alone, sequentially or in parallel, and reports come back
//! in input order.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::CombatConfig;
use crate::entity::{Combatant, CombatantId};
use crate::error::{CombatError, ConfigError};
use crate::output::CombatLogEntry;
use crate::reward::Rewards;
use crate::session::{Session, Verdict};

/// One encounter to run: a roster and a seed.
#[derive(Debug, Clone)]
pub struct Encounter {
    /// Combatants, spawned in order.
    pub combatants: Vec<Combatant>,
    /// Dice seed.
    pub seed: u64,
}

impl Encounter {
    /// Creates an encounter.
    #[must_use]
    pub fn new(combatants: Vec<Combatant>, seed: u64) -> Self {
        Self { combatants, seed }
    }
}

/// Result of one encounter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncounterReport {
    /// Seed the encounter ran with.
    pub seed: u64,
    /// How it ended.
    pub verdict: Verdict,
    /// Rounds played.
    pub rounds: u32,
    /// Members of the winning team.
    pub winner_ids: Vec<CombatantId>,
    /// Rewards for the winners.
    pub rewards: Rewards,
    /// Full combat log.
    pub log: Vec<CombatLogEntry>,
    /// Names of the combatants still standing, in id order.
    pub survivors: Vec<String>,
}

/// Runs one encounter to completion.
///
/// # Errors
///
/// Fails if the roster or configuration is invalid.
pub fn run_encounter(
    encounter: &Encounter,
    config: &CombatConfig,
) -> Result<EncounterReport, CombatError> {
    let mut session = Session::new(encounter.combatants.clone(), config.clone(), encounter.seed)?;
    let outcome = session.run()?.clone();
    let log = session.log().to_vec();
    let survivors = session
        .combatants()
        .filter(|c| c.is_alive())
        .map(|c| c.name.clone())
        .collect();

    Ok(EncounterReport {
        seed: encounter.seed,
        verdict: outcome.verdict,
        rounds: outcome.rounds,
        winner_ids: outcome.winner_ids,
        rewards: outcome.rewards,
        log,
        survivors,
    })
}

/// Runs every encounter in parallel, returning reports in input order.
///
/// # Errors
///
/// Returns [`ConfigError::UnboundedBatch`] when `max_rounds` is 0, since a
/// stalemate would never finish. Otherwise returns the first invalid
/// encounter's error, by input position.
pub fn run_batch(
    encounters: &[Encounter],
    config: &CombatConfig,
) -> Result<Vec<EncounterReport>, CombatError> {
    if config.max_rounds == 0 {
        return Err(ConfigError::UnboundedBatch.into());
    }
    config.validate()?;

    tracing::info!(encounters = encounters.len(), "running batch");
    let reports: Vec<_> = encounters
        .par_iter()
        .map(|encounter| run_encounter(encounter, config))
        .collect();
    reports.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enemy::template;
    use crate::entity::TeamId;

    fn skirmish(seed: u64) -> Encounter {
        let roster = vec![
            template("hollow_soldier").unwrap().spawn(2, TeamId::new(0)),
            template("corrupt_wolf").unwrap().spawn(2, TeamId::new(1)),
        ];
        Encounter::new(roster, seed)
    }

    #[test]
    fn batch_matches_sequential_runs() {
        let config = CombatConfig::default();
        let encounters: Vec<_> = (0..8).map(skirmish).collect();

        let parallel = run_batch(&encounters, &config).unwrap();
        let sequential: Vec<_> = encounters
            .iter()
            .map(|e| run_encounter(e, &config).unwrap())
            .collect();

        assert_eq!(parallel, sequential);
        let seeds: Vec<u64> = parallel.iter().map(|r| r.seed).collect();
        assert_eq!(seeds, (0..8).collect::<Vec<_>>());
    }

    #[test]
    fn unbounded_batches_are_refused() {
        let config = CombatConfig {
            max_rounds: 0,
            ..CombatConfig::default()
        };
        assert!(matches!(
            run_batch(&[skirmish(1)], &config),
            Err(CombatError::Config(ConfigError::UnboundedBatch))
        ));
    }

    #[test]
    fn invalid_encounter_fails_the_batch() {
        let lonely = Encounter::new(
            vec![template("hollow_soldier").unwrap().spawn(1, TeamId::new(0))],
            3,
        );
        let result = run_batch(&[skirmish(1), lonely], &CombatConfig::default());
        assert!(matches!(
            result,
            Err(CombatError::Config(ConfigError::SingleTeam(1)))
        ));
    }

    #[test]
    fn reports_end_with_a_verdict() {
        let report = run_encounter(&skirmish(11), &CombatConfig::default()).unwrap();
        assert!(report.rounds >= 1);
        assert!(!report.log.is_empty());
        match report.verdict {
            Verdict::Winner(_) => {
                assert!(!report.winner_ids.is_empty());
                assert!(report.rewards.experience > 0);
                assert!(!report.survivors.is_empty());
            }
            Verdict::Draw | Verdict::Fled(_) => assert!(report.winner_ids.is_empty()),
        }
    }
}
