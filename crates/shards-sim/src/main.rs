//! Headless Encounter Runner
//!
//! Runs seeded AI-versus-AI encounters against the combat engine and prints
//! the combat log, one line per entry, or a JSON report.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use shards_combat::ability::ClassKind;
use shards_combat::ai::{AiController, BehaviorProfile};
use shards_combat::batch::{run_batch, run_encounter, Encounter, EncounterReport};
use shards_combat::enemy::template;
use shards_combat::{CombatConfig, Combatant, TeamId, Verdict};
use tracing_subscriber::EnvFilter;

/// Headless encounter runner for the Shards combat engine
#[derive(Parser, Debug)]
#[command(name = "shards-sim")]
#[command(about = "Run seeded AI vs AI encounters and print the combat log")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one hero against one enemy and print the log
    Duel(DuelArgs),

    /// Run many seeded duels in parallel and print a summary
    Batch(BatchArgs),
}

/// Options shared by both commands.
#[derive(Args, Debug)]
struct Matchup {
    /// Hero class (warrior, sorcerer, rogue, paladin, necromancer, ranger)
    #[arg(long, default_value = "warrior")]
    hero: ClassKind,

    /// Level of the enemy
    #[arg(long, default_value_t = 1)]
    level: u32,

    /// Enemy template key (e.g. hollow_soldier, corrupt_wolf)
    #[arg(long, default_value = "hollow_soldier")]
    enemy: String,

    /// Random seed for deterministic runs
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// JSON file overriding the default combat rules
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct DuelArgs {
    #[command(flatten)]
    matchup: Matchup,
}

#[derive(Args, Debug)]
struct BatchArgs {
    #[command(flatten)]
    matchup: Matchup,

    /// Number of encounters; seeds run from --seed upward
    #[arg(long, default_value_t = 100)]
    count: u64,
}

/// Aggregate of a batch run.
#[derive(Serialize, Debug)]
struct BatchSummary {
    encounters: usize,
    hero_wins: usize,
    enemy_wins: usize,
    draws: usize,
    fled: usize,
    average_rounds: f64,
    experience: u64,
}

const HERO_TEAM: TeamId = TeamId::new(0);
const ENEMY_TEAM: TeamId = TeamId::new(1);

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Duel(args) => duel(&args),
        Command::Batch(args) => batch(&args),
    }
}

fn duel(args: &DuelArgs) -> Result<()> {
    let matchup = &args.matchup;
    let config = load_config(matchup.config.as_ref())?;
    let encounter = Encounter::new(roster(matchup)?, matchup.seed);
    let names: BTreeMap<u64, String> = (0..)
        .zip(encounter.combatants.iter().map(|c| c.name.clone()))
        .collect();

    let report = run_encounter(&encounter, &config).context("encounter failed")?;
    if matchup.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report, &names);
    }
    Ok(())
}

fn batch(args: &BatchArgs) -> Result<()> {
    let matchup = &args.matchup;
    if args.count == 0 {
        bail!("--count must be at least 1");
    }
    let config = load_config(matchup.config.as_ref())?;
    let encounters = (0..args.count)
        .map(|offset| -> Result<Encounter> {
            Ok(Encounter::new(roster(matchup)?, matchup.seed.wrapping_add(offset)))
        })
        .collect::<Result<Vec<_>>>()?;

    let reports = run_batch(&encounters, &config).context("batch failed")?;
    let summary = summarize(&reports);
    tracing::info!(
        encounters = summary.encounters,
        hero_wins = summary.hero_wins,
        "batch finished"
    );
    if matchup.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!(
            "{} encounters: hero {} / enemy {} / draw {} / fled {}, {:.1} rounds on average, {} xp",
            summary.encounters,
            summary.hero_wins,
            summary.enemy_wins,
            summary.draws,
            summary.fled,
            summary.average_rounds,
            summary.experience,
        );
    }
    Ok(())
}

/// An AI-controlled hero of the chosen class against one templated enemy.
fn roster(matchup: &Matchup) -> Result<Vec<Combatant>> {
    let hero = matchup
        .hero
        .hero(format!("{} hero", matchup.hero), HERO_TEAM)
        .with_level(matchup.level)
        .with_ai(AiController::new(BehaviorProfile::Tactical));
    let enemy = template(&matchup.enemy)
        .with_context(|| format!("cannot spawn enemy `{}`", matchup.enemy))?
        .spawn(matchup.level, ENEMY_TEAM);
    Ok(vec![hero, enemy])
}

fn load_config(path: Option<&PathBuf>) -> Result<CombatConfig> {
    let Some(path) = path else {
        return Ok(CombatConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config: CombatConfig = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse config {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok(config)
}

fn print_report(report: &EncounterReport, names: &BTreeMap<u64, String>) {
    for (id, name) in names {
        println!("#{id} = {name}");
    }
    for entry in &report.log {
        println!("{entry}");
    }
    let verdict = match report.verdict {
        Verdict::Winner(team) if team == HERO_TEAM => "the hero wins".to_string(),
        Verdict::Winner(_) => "the enemy wins".to_string(),
        other => other.to_string(),
    };
    println!(
        "after {} rounds {verdict}: {} xp, {} souls",
        report.rounds, report.rewards.experience, report.rewards.currency
    );
}

fn summarize(reports: &[EncounterReport]) -> BatchSummary {
    let count = |pred: &dyn Fn(&Verdict) -> bool| reports.iter().filter(|r| pred(&r.verdict)).count();
    let total_rounds: u64 = reports.iter().map(|r| u64::from(r.rounds)).sum();
    #[allow(clippy::cast_precision_loss)]
    let average_rounds = if reports.is_empty() {
        0.0
    } else {
        total_rounds as f64 / reports.len() as f64
    };

    BatchSummary {
        encounters: reports.len(),
        hero_wins: count(&|v| *v == Verdict::Winner(HERO_TEAM)),
        enemy_wins: count(&|v| *v == Verdict::Winner(ENEMY_TEAM)),
        draws: count(&|v| *v == Verdict::Draw),
        fled: count(&|v| matches!(v, Verdict::Fled(_))),
        average_rounds,
        experience: reports.iter().map(|r| r.rewards.experience).sum(),
    }
}
