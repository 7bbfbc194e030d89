//! Combat Session state machine.
//!
//! A [`Session`] owns the combatants of one encounter and drives them through
//! rounds until one side remains, everyone falls, or someone escapes:
//!
//! ```text
//! Created -> RoundLoop -> Resolved(Winner | Draw | Fled)
//! ```
//!
//! # Round Phases
//!
//! Each call to [`Session::advance_round`] runs one round:
//!
//! 1. **INITIATIVE** (first round only): every combatant rolls
//!    `initiative + d(initiative_die)` once; the score is kept for the session.
//! 2. **TICK**: status effects of every living combatant tick.
//! 3. **DECLARE**: player actions come from [`Session::declare_action`]
//!    (Block if none was declared); AI actions come from the policy engine.
//! 4. **RESOLVE**: actions resolve one at a time, fastest first
//!    (`initiative × action speed × frost factor`, lower id on ties). Each
//!    resolution is applied before the next begins, so a combatant that falls
//!    earlier in the round never acts.
//! 5. **UPKEEP**: stamina regenerates, stances clear, cooldowns tick.
//! 6. **TERMINATION**: no living side is a draw, one living side wins,
//!    reaching `max_rounds` is a draw.
//!
//! # Determinism
//!
//! All randomness flows through the session's [`Dice`]. Given the same
//! combatants, configuration, declarations and seed, every round produces the
//! same log.
//!
//! # Example
//!
//! ```
//! use shards_combat::config::CombatConfig;
//! use shards_combat::enemy::template;
//! use shards_combat::entity::TeamId;
//! use shards_combat::session::Session;
//!
//! let roster = vec![
//!     template("hollow_soldier").unwrap().spawn(1, TeamId::new(0)),
//!     template("corrupt_wolf").unwrap().spawn(2, TeamId::new(1)),
//! ];
//! let mut session = Session::new(roster, CombatConfig::default(), 7).unwrap();
//! while !session.is_resolved() {
//!     session.advance_round().unwrap();
//! }
//! assert!(session.outcome().is_some());
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::ability::{select_targets, validate_use};
use crate::arena::Arena;
use crate::config::{probability, CombatConfig};
use crate::dice::{Dice, SeededDice};
use crate::entity::{Combatant, CombatantId, Control, ResourceKind, StanceFlags, TeamId};
use crate::error::{ActionRejected, ConfigError, SessionError};
use crate::output::{CombatLogEntry, EventTag, LoggedAction, Outcome};
use crate::resolver::{
    self, apply, defeat_entry, ActionKind, BasicAction, CombatAction, ResolveContext, Target,
};
use crate::reward::{Defeated, RewardPolicy, Rewards, StandardRewards};
use crate::status::{self, StatusKind};

// =============================================================================
// States and Results
// =============================================================================

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    /// One team has living members left.
    Winner(TeamId),
    /// Nobody is left standing, or the round cap was reached.
    Draw,
    /// A combatant escaped.
    Fled(CombatantId),
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Winner(team) => write!(f, "{team} wins"),
            Self::Draw => f.write_str("draw"),
            Self::Fled(id) => write!(f, "{id} fled"),
        }
    }
}

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// Built and validated; initiative not rolled yet.
    Created,
    /// At least one round has run.
    RoundLoop,
    /// Finished.
    Resolved(Verdict),
}

/// What one call to [`Session::advance_round`] produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundResult {
    /// Round number, starting at 1.
    pub round: u32,
    /// Entries appended during this round.
    pub log: Vec<CombatLogEntry>,
    /// State after the round.
    pub state: SessionState,
}

/// Final result of a resolved session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionOutcome {
    /// How it ended.
    pub verdict: Verdict,
    /// Members of the winning team, fallen ones included. Empty unless there is a winner.
    pub winner_ids: Vec<CombatantId>,
    /// Rewards for the winning team. Zero unless there is a winner.
    pub rewards: Rewards,
    /// Rounds played.
    pub rounds: u32,
}

/// An action a combatant could declare, with its current availability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailableAction {
    /// The action.
    pub kind: ActionKind,
    /// Pool the cost is paid from.
    pub resource: ResourceKind,
    /// Cost.
    pub cost: f32,
    /// Whether the combatant can pay the cost now.
    pub affordable: bool,
    /// Rounds until the action is ready. Zero for basic actions and flee.
    pub cooldown: u32,
}

impl AvailableAction {
    /// Affordable and off cooldown.
    #[must_use]
    pub const fn is_usable(&self) -> bool {
        self.affordable && self.cooldown == 0
    }
}

// =============================================================================
// Session
// =============================================================================

/// One combat encounter.
///
/// The session owns its combatants exclusively; independent sessions share
/// nothing and may run on different threads.
pub struct Session<D: Dice = SeededDice> {
    arena: Arena,
    config: CombatConfig,
    dice: D,
    state: SessionState,
    round: u32,
    /// Initiative scores, rolled once when the first round starts.
    initiative: BTreeMap<CombatantId, i32>,
    /// Player declarations for the next round.
    declared: BTreeMap<CombatantId, CombatAction>,
    log: Vec<CombatLogEntry>,
    outcome: Option<SessionOutcome>,
    rewards: Box<dyn RewardPolicy>,
}

impl<D: Dice> fmt::Debug for Session<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("arena", &self.arena)
            .field("state", &self.state)
            .field("round", &self.round)
            .field("initiative", &self.initiative)
            .field("declared", &self.declared)
            .field("log", &format!("[{} entries]", self.log.len()))
            .finish_non_exhaustive()
    }
}

impl Session<SeededDice> {
    /// Creates a session with seeded dice.
    ///
    /// # Errors
    ///
    /// See [`Session::with_dice`].
    pub fn new(
        combatants: Vec<Combatant>,
        config: CombatConfig,
        seed: u64,
    ) -> Result<Self, ConfigError> {
        Self::with_dice(combatants, config, SeededDice::new(seed))
    }
}

impl<D: Dice> Session<D> {
    /// Creates a session with an explicit dice source.
    ///
    /// Combatants are spawned in the given order, so the first one gets id 0.
    ///
    /// # Errors
    ///
    /// Fails if the configuration is invalid, the roster is empty, fewer than
    /// two teams have living members, or a combatant has invalid resources,
    /// a malformed ability or an enrage threshold outside `[0, 1]`.
    pub fn with_dice(
        combatants: Vec<Combatant>,
        config: CombatConfig,
        dice: D,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        if combatants.is_empty() {
            return Err(ConfigError::EmptyRoster);
        }
        for combatant in &combatants {
            validate_combatant(combatant)?;
        }

        let mut arena = Arena::new();
        for combatant in combatants {
            arena.spawn(combatant);
        }
        let teams = arena.teams_alive().len();
        if teams < 2 {
            return Err(ConfigError::SingleTeam(teams));
        }

        tracing::info!(
            combatants = arena.len(),
            teams,
            max_rounds = config.max_rounds,
            "combat session created"
        );

        Ok(Self {
            arena,
            config,
            dice,
            state: SessionState::Created,
            round: 0,
            initiative: BTreeMap::new(),
            declared: BTreeMap::new(),
            log: Vec::new(),
            outcome: None,
            rewards: Box::new(StandardRewards),
        })
    }

    /// Replaces the reward policy.
    #[must_use]
    pub fn with_reward_policy(mut self, policy: impl RewardPolicy + 'static) -> Self {
        self.rewards = Box::new(policy);
        self
    }

    // -------------------------------------------------------------------------
    // Declarations
    // -------------------------------------------------------------------------

    /// Declares a player-controlled combatant's action for the next round.
    ///
    /// A later declaration for the same combatant replaces the earlier one.
    /// Actions the combatant cannot currently pay for are accepted: they
    /// resolve as a logged `Rejected` no-op.
    ///
    /// # Errors
    ///
    /// Fails if the session is resolved, the combatant is unknown or
    /// AI-controlled, or the action is rejected (dead actor, dead or friendly
    /// target, unknown ability, ability on cooldown, wrong target mode).
    pub fn declare_action(
        &mut self,
        id: CombatantId,
        action: CombatAction,
    ) -> Result<(), SessionError> {
        if self.is_resolved() {
            return Err(SessionError::AlreadyResolved);
        }
        let combatant = self
            .arena
            .get(id)
            .ok_or(SessionError::UnknownCombatant(id))?;
        if combatant.is_ai() {
            return Err(SessionError::NotPlayerControlled(id));
        }
        if let Err(reason) = check_declaration(&self.arena, id, &action) {
            tracing::warn!(combatant = %id, action = %action.logged(), %reason, "declaration rejected");
            return Err(reason.into());
        }

        self.declared.insert(id, action);
        Ok(())
    }

    /// Lists every action `id` could declare and whether it is usable now.
    ///
    /// # Errors
    ///
    /// Fails if the combatant is unknown.
    pub fn available_actions(&self, id: CombatantId) -> Result<Vec<AvailableAction>, SessionError> {
        let combatant = self
            .arena
            .get(id)
            .ok_or(SessionError::UnknownCombatant(id))?;

        let basics = BasicAction::ALL.into_iter().map(|action| {
            let cost = self.config.actions.get(action).stamina_cost;
            AvailableAction {
                kind: ActionKind::Basic(action),
                resource: ResourceKind::Stamina,
                cost,
                affordable: combatant.resources.can_afford(ResourceKind::Stamina, cost),
                cooldown: 0,
            }
        });
        let abilities = combatant.abilities().map(|slot| AvailableAction {
            kind: ActionKind::Ability(slot.definition.name.clone()),
            resource: slot.definition.resource,
            cost: slot.definition.cost,
            affordable: combatant
                .resources
                .can_afford(slot.definition.resource, slot.definition.cost),
            cooldown: slot.cooldown,
        });
        let flee = AvailableAction {
            kind: ActionKind::Flee,
            resource: ResourceKind::Stamina,
            cost: 0.0,
            affordable: true,
            cooldown: 0,
        };

        Ok(basics.chain(abilities).chain(std::iter::once(flee)).collect())
    }

    // -------------------------------------------------------------------------
    // Rounds
    // -------------------------------------------------------------------------

    /// Runs one round and returns the entries it logged.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::AlreadyResolved`] once the session has ended.
    pub fn advance_round(&mut self) -> Result<RoundResult, SessionError> {
        if self.is_resolved() {
            return Err(SessionError::AlreadyResolved);
        }
        if self.state == SessionState::Created {
            self.roll_initiative();
            self.state = SessionState::RoundLoop;
        }

        self.round += 1;
        let round = self.round;
        let log_start = self.log.len();
        tracing::debug!(round, "round started");

        self.tick_statuses();

        let mut fled = None;
        if self.arena.teams_alive().len() >= 2 {
            let declared = self.collect_actions();
            fled = self.resolve_actions(declared);
        }

        if fled.is_none() {
            self.upkeep();
        }
        self.declared.clear();

        let verdict = fled.map(Verdict::Fled).or_else(|| self.verdict());
        if let Some(verdict) = verdict {
            self.finish(verdict);
        }

        tracing::debug!(
            round,
            entries = self.log.len() - log_start,
            state = ?self.state,
            "round finished"
        );
        Ok(RoundResult {
            round,
            log: self.log[log_start..].to_vec(),
            state: self.state,
        })
    }

    /// Advances rounds until the session resolves.
    ///
    /// Player-controlled combatants that never declare default to Block each
    /// round. With `max_rounds` set to 0 and no side able to win, this never
    /// returns.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::AlreadyResolved`] if called on a resolved session.
    pub fn run(&mut self) -> Result<&SessionOutcome, SessionError> {
        if self.is_resolved() {
            return Err(SessionError::AlreadyResolved);
        }
        while !self.is_resolved() {
            self.advance_round()?;
        }
        self.outcome.as_ref().ok_or(SessionError::AlreadyResolved)
    }

    fn roll_initiative(&mut self) {
        let die = self.config.initiative_die;
        for combatant in self.arena.iter() {
            let roll = i32::try_from(self.dice.roll(die)).unwrap_or(i32::MAX);
            let score = combatant.stats().initiative.saturating_add(roll);
            tracing::trace!(combatant = %combatant.id(), score, "initiative rolled");
            self.initiative.insert(combatant.id(), score);
        }
    }

    /// Phase 2: status effects tick for every living combatant.
    fn tick_statuses(&mut self) {
        let round = self.round;
        let ids: Vec<_> = self.arena.living().map(Combatant::id).collect();
        for id in ids {
            let Some(combatant) = self.arena.get_mut(id) else {
                continue;
            };
            let (report, entries) = status::tick(combatant, round);
            let fell = !combatant.is_alive();
            if fell {
                tracing::info!(round, combatant = %id, name = %combatant.name, "combatant defeated");
            }
            if report.stunned {
                tracing::debug!(round, combatant = %id, "stunned");
            }

            let killer = entries
                .iter()
                .rev()
                .find(|e| e.tag == EventTag::StatusDamage && e.actor != id)
                .map(|e| e.actor);
            self.log.extend(entries);
            if fell {
                self.log.push(defeat_entry(round, id, killer));
            }
        }
    }

    /// Phase 3: one action per living combatant, in id order.
    fn collect_actions(&mut self) -> Vec<(CombatantId, CombatAction)> {
        let mut actions = Vec::new();
        for me in self.arena.living() {
            let id = me.id();
            if me.stance.contains(StanceFlags::STUNNED) {
                continue;
            }
            let action = match &me.control {
                Control::Player => self
                    .declared
                    .get(&id)
                    .cloned()
                    .unwrap_or_else(CombatAction::block),
                Control::Ai(controller) => {
                    let opponents: Vec<&Combatant> = self
                        .arena
                        .living()
                        .filter(|other| me.is_hostile_to(other))
                        .collect();
                    controller.choose_action(me, &opponents, &self.config, &mut self.dice)
                }
            };
            actions.push((id, action));
        }
        actions
    }

    /// Phase 4: resolve and apply in speed order. Returns the escapee, if any.
    fn resolve_actions(&mut self, mut actions: Vec<(CombatantId, CombatAction)>) -> Option<CombatantId> {
        let round = self.round;

        for id in self.arena.living().filter(|c| c.stance.contains(StanceFlags::STUNNED)).map(Combatant::id) {
            self.log.push(
                CombatLogEntry::new(
                    round,
                    id,
                    LoggedAction::StatusTick(StatusKind::Stun),
                    Outcome::Skipped,
                    EventTag::Stunned,
                )
                    .with_target(id),
            );
        }

        let speed: BTreeMap<CombatantId, f32> = actions
            .iter()
            .map(|(id, action)| (*id, self.speed_of(*id, action)))
            .collect();
        actions.sort_by(|(a, _), (b, _)| {
            let (sa, sb) = (speed.get(a).copied().unwrap_or(0.0), speed.get(b).copied().unwrap_or(0.0));
            sb.total_cmp(&sa).then(a.cmp(b))
        });

        for (id, action) in actions {
            if !self.arena.get(id).is_some_and(Combatant::is_alive) {
                continue;
            }
            let mut ctx = ResolveContext {
                round,
                config: &self.config,
                dice: &mut self.dice,
            };
            match resolver::resolve(&self.arena, id, &action, &mut ctx) {
                Ok(resolution) => {
                    let escaped = resolution.outcome() == Some(Outcome::Fled);
                    self.log.extend(resolution.entries);
                    let defeated = apply(&mut self.arena, &resolution.deltas, round);
                    self.log.extend(defeated);
                    if escaped {
                        tracing::info!(round, combatant = %id, "combatant fled");
                        return Some(id);
                    }
                }
                Err(reason) => {
                    tracing::debug!(round, actor = %id, %reason, "action rejected at resolution");
                    self.log.push(rejection_entry(round, id, &action, &reason));
                }
            }
        }
        None
    }

    fn speed_of(&self, id: CombatantId, action: &CombatAction) -> f32 {
        let Some(combatant) = self.arena.get(id) else {
            return 0.0;
        };
        let initiative = self.initiative.get(&id).copied().unwrap_or(0);
        #[allow(clippy::cast_precision_loss)]
        let initiative = initiative as f32;
        let frost = resolver::modifiers_of(combatant, &self.config).agility;
        initiative * action.speed(&self.config) * frost
    }

    /// Phase 5: stamina regeneration, stance reset and cooldowns.
    fn upkeep(&mut self) {
        let regen = self.config.stamina_regen;
        for combatant in self.arena.iter_mut() {
            if combatant.is_alive() {
                combatant.resources.restore(ResourceKind::Stamina, regen);
            }
            combatant.reset_stance();
            combatant.tick_cooldowns();
        }
    }

    /// Phase 6: the verdict, if the session is over.
    fn verdict(&self) -> Option<Verdict> {
        let alive = self.arena.teams_alive();
        let mut teams = alive.iter();
        match (teams.next(), teams.next()) {
            (None, _) => Some(Verdict::Draw),
            (Some(team), None) => Some(Verdict::Winner(*team)),
            (Some(_), Some(_)) => {
                let capped = self.config.max_rounds > 0 && self.round >= self.config.max_rounds;
                capped.then_some(Verdict::Draw)
            }
        }
    }

    fn finish(&mut self, verdict: Verdict) {
        let (winner_ids, rewards) = match verdict {
            Verdict::Winner(team) => {
                let winners: Vec<_> = self
                    .arena
                    .iter()
                    .filter(|c| c.team == team)
                    .map(Combatant::id)
                    .collect();
                let defeated: Vec<Defeated> = self
                    .arena
                    .iter()
                    .filter(|c| c.team != team)
                    .map(Defeated::from)
                    .collect();
                (winners, self.rewards.rewards(&defeated))
            }
            Verdict::Draw | Verdict::Fled(_) => (Vec::new(), Rewards::default()),
        };

        tracing::info!(
            rounds = self.round,
            %verdict,
            experience = rewards.experience,
            currency = rewards.currency,
            "combat session resolved"
        );
        self.state = SessionState::Resolved(verdict);
        self.outcome = Some(SessionOutcome {
            verdict,
            winner_ids,
            rewards,
            rounds: self.round,
        });
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Returns true once the session has ended.
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        matches!(self.state, SessionState::Resolved(_))
    }

    /// The final outcome, once resolved.
    #[must_use]
    pub const fn outcome(&self) -> Option<&SessionOutcome> {
        self.outcome.as_ref()
    }

    /// Rounds played so far.
    #[must_use]
    pub const fn round(&self) -> u32 {
        self.round
    }

    /// The full append-only log.
    #[must_use]
    pub fn log(&self) -> &[CombatLogEntry] {
        &self.log
    }

    /// Rules in force.
    #[must_use]
    pub const fn config(&self) -> &CombatConfig {
        &self.config
    }

    /// Initiative score of a combatant, once rolled.
    #[must_use]
    pub fn initiative(&self, id: CombatantId) -> Option<i32> {
        self.initiative.get(&id).copied()
    }

    /// A combatant by id.
    #[must_use]
    pub fn combatant(&self, id: CombatantId) -> Option<&Combatant> {
        self.arena.get(id)
    }

    /// Current snapshots of every combatant, in id order.
    pub fn combatants(&self) -> impl Iterator<Item = &Combatant> + '_ {
        self.arena.iter()
    }

    /// Ends the session, returning the final snapshots in id order.
    #[must_use]
    pub fn into_combatants(self) -> Vec<Combatant> {
        self.arena.into_combatants()
    }
}

fn validate_combatant(combatant: &Combatant) -> Result<(), ConfigError> {
    if !combatant.resources.is_valid() {
        return Err(ConfigError::InvalidResources(combatant.name.clone()));
    }
    for slot in combatant.abilities() {
        slot.definition.validate()?;
    }
    if let Control::Ai(controller) = &combatant.control {
        probability("enrage_threshold", controller.enrage_threshold)?;
    }
    Ok(())
}

/// Declaration-time checks. Affordability is left to resolution.
fn check_declaration(
    arena: &Arena,
    id: CombatantId,
    action: &CombatAction,
) -> Result<(), ActionRejected> {
    let actor = arena.require_alive(id)?;
    match (&action.kind, action.target) {
        (ActionKind::Basic(basic), Target::Enemy(target)) if basic.is_attack() => {
            arena.require_hostile(actor, target, &basic.to_string()).map(|_| ())
        }
        (ActionKind::Basic(basic), _) if basic.is_attack() => Err(ActionRejected::InvalidTarget {
            target: id,
            action: basic.to_string(),
        }),
        (ActionKind::Basic(_) | ActionKind::Flee, _) => Ok(()),
        (ActionKind::Ability(name), target) => {
            let definition = match validate_use(actor, name) {
                Err(ActionRejected::InsufficientResource { .. }) => actor
                    .ability(name)
                    .map(|slot| &slot.definition)
                    .ok_or_else(|| ActionRejected::UnknownAbility(name.clone()))?,
                other => other?,
            };
            select_targets(arena, actor, definition, target).map(|_| ())
        }
    }
}

/// Log entry for an action refused when its turn came.
fn rejection_entry(
    round: u32,
    actor: CombatantId,
    action: &CombatAction,
    reason: &ActionRejected,
) -> CombatLogEntry {
    let tag = match reason {
        ActionRejected::InsufficientResource { .. } => EventTag::Exhausted,
        ActionRejected::UnknownAbility(_) | ActionRejected::OnCooldown { .. } => {
            EventTag::Unavailable
        }
        ActionRejected::UnknownCombatant(_)
        | ActionRejected::DeadActor(_)
        | ActionRejected::DeadTarget(_)
        | ActionRejected::InvalidTarget { .. } => EventTag::InvalidTarget,
    };
    let entry = CombatLogEntry::new(round, actor, action.logged(), Outcome::Rejected, tag);
    match action.target {
        Target::Enemy(target) => entry.with_target(target),
        Target::Myself | Target::AllEnemies => entry,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{AiController, BehaviorProfile};
    use crate::entity::Resources;

    fn duel() -> Session {
        let roster = vec![
            Combatant::new("Hero", TeamId::new(0)),
            Combatant::new("Villain", TeamId::new(1)),
        ];
        Session::new(roster, CombatConfig::default(), 1).unwrap()
    }

    mod creation_tests {
        use super::*;

        #[test]
        fn empty_roster_is_rejected() {
            assert_eq!(
                Session::new(Vec::new(), CombatConfig::default(), 0).err(),
                Some(ConfigError::EmptyRoster)
            );
        }

        #[test]
        fn one_team_is_rejected() {
            let roster = vec![
                Combatant::new("A", TeamId::new(0)),
                Combatant::new("B", TeamId::new(0)),
            ];
            assert_eq!(
                Session::new(roster, CombatConfig::default(), 0).err(),
                Some(ConfigError::SingleTeam(1))
            );
        }

        #[test]
        fn invalid_resources_are_rejected() {
            let mut broken = Combatant::new("Broken", TeamId::new(0));
            broken.resources = Resources {
                health: 150.0,
                ..Resources::default()
            };
            let roster = vec![broken, Combatant::new("B", TeamId::new(1))];
            assert!(matches!(
                Session::new(roster, CombatConfig::default(), 0),
                Err(ConfigError::InvalidResources(name)) if name == "Broken"
            ));
        }

        #[test]
        fn invalid_config_is_rejected() {
            let config = CombatConfig {
                initiative_die: 0,
                ..CombatConfig::default()
            };
            let roster = vec![
                Combatant::new("A", TeamId::new(0)),
                Combatant::new("B", TeamId::new(1)),
            ];
            assert!(matches!(
                Session::new(roster, config, 0),
                Err(ConfigError::OutOfRange { field: "initiative_die", .. })
            ));
        }

        #[test]
        fn new_session_starts_created() {
            let session = duel();
            assert_eq!(session.state(), SessionState::Created);
            assert_eq!(session.round(), 0);
            assert!(session.outcome().is_none());
            assert_eq!(session.combatants().count(), 2);
        }
    }

    mod declaration_tests {
        use super::*;

        #[test]
        fn unknown_combatant_is_an_error() {
            let mut session = duel();
            assert_eq!(
                session.declare_action(CombatantId::new(9), CombatAction::block()),
                Err(SessionError::UnknownCombatant(CombatantId::new(9)))
            );
        }

        #[test]
        fn ai_combatants_cannot_be_declared_for() {
            let roster = vec![
                Combatant::new("Hero", TeamId::new(0)),
                Combatant::new("Bot", TeamId::new(1)).with_ai(AiController::new(BehaviorProfile::Balanced)),
            ];
            let mut session = Session::new(roster, CombatConfig::default(), 0).unwrap();
            assert_eq!(
                session.declare_action(CombatantId::new(1), CombatAction::block()),
                Err(SessionError::NotPlayerControlled(CombatantId::new(1)))
            );
        }

        #[test]
        fn attacking_an_ally_is_rejected() {
            let roster = vec![
                Combatant::new("A", TeamId::new(0)),
                Combatant::new("Ally", TeamId::new(0)),
                Combatant::new("Foe", TeamId::new(1)),
            ];
            let mut session = Session::new(roster, CombatConfig::default(), 0).unwrap();
            let result = session.declare_action(CombatantId::new(0), CombatAction::light(CombatantId::new(1)));
            assert!(matches!(
                result,
                Err(SessionError::Rejected(ActionRejected::InvalidTarget { .. }))
            ));
        }

        #[test]
        fn unknown_ability_is_rejected() {
            let mut session = duel();
            let result = session.declare_action(
                CombatantId::new(0),
                CombatAction::ability("Fireball", Target::Enemy(CombatantId::new(1))),
            );
            assert_eq!(
                result,
                Err(SessionError::Rejected(ActionRejected::UnknownAbility("Fireball".into())))
            );
        }

        #[test]
        fn unaffordable_actions_are_accepted() {
            let mut session = duel();
            let result = session.declare_action(CombatantId::new(0), CombatAction::heavy(CombatantId::new(1)));
            assert_eq!(result, Ok(()));
        }

        #[test]
        fn available_actions_list_basics_abilities_and_flee() {
            let roster = vec![
                crate::ability::ClassKind::Sorcerer.hero("Mage", TeamId::new(0)),
                Combatant::new("Foe", TeamId::new(1)),
            ];
            let session = Session::new(roster, CombatConfig::default(), 0).unwrap();
            let actions = session.available_actions(CombatantId::new(0)).unwrap();
            assert_eq!(actions.len(), 5 + 5 + 1);
            assert!(actions.iter().all(AvailableAction::is_usable));
            assert_eq!(actions.last().map(|a| &a.kind), Some(&ActionKind::Flee));
        }
    }

    mod round_tests {
        use super::*;

        #[test]
        fn resolved_sessions_refuse_to_advance() {
            let mut session = duel();
            session.finish(Verdict::Draw);
            assert_eq!(session.advance_round(), Err(SessionError::AlreadyResolved));
            assert_eq!(
                session.declare_action(CombatantId::new(0), CombatAction::block()),
                Err(SessionError::AlreadyResolved)
            );
        }

        #[test]
        fn undeclared_players_block() {
            let mut session = duel();
            let result = session.advance_round().unwrap();
            assert_eq!(result.round, 1);
            assert_eq!(result.state, SessionState::RoundLoop);
            assert_eq!(result.log.len(), 2);
            assert!(result
                .log
                .iter()
                .all(|e| e.action == LoggedAction::Basic(BasicAction::Block)));
            // block costs 10, regen restores 10
            let hero = session.combatant(CombatantId::new(0)).unwrap();
            assert!((hero.resources.stamina - 100.0).abs() < 1e-4);
            assert!(hero.stance.is_empty());
        }

        #[test]
        fn initiative_is_rolled_once() {
            let mut session = duel();
            assert!(session.initiative(CombatantId::new(0)).is_none());
            session.advance_round().unwrap();
            let first = session.initiative(CombatantId::new(0));
            session.advance_round().unwrap();
            assert_eq!(session.initiative(CombatantId::new(0)), first);
            assert!(first.is_some_and(|score| (11..=30).contains(&score)));
        }

        #[test]
        fn round_cap_is_a_draw() {
            let roster = vec![
                Combatant::new("A", TeamId::new(0)),
                Combatant::new("B", TeamId::new(1)),
            ];
            let config = CombatConfig {
                max_rounds: 3,
                ..CombatConfig::default()
            };
            let mut session = Session::new(roster, config, 0).unwrap();
            let outcome = session.run().unwrap().clone();
            assert_eq!(outcome.verdict, Verdict::Draw);
            assert_eq!(outcome.rounds, 3);
            assert!(outcome.winner_ids.is_empty());
            assert_eq!(outcome.rewards, Rewards::default());
        }
    }
}
