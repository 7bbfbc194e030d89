//! Reward computation.
//!
//! When a session ends with a winner, the defeated side is summarized as a
//! list of [`Defeated`] records and handed to a [`RewardPolicy`]. The policy
//! is a strategy object owned by the session, so callers can swap the economy
//! without touching resolution. Loot rolling stays with the caller.

use serde::{Deserialize, Serialize};

use crate::enemy::EnemyTier;
use crate::entity::{Combatant, CombatantId};

/// What the reward policy knows about a defeated combatant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Defeated {
    /// Who fell.
    pub id: CombatantId,
    /// Their level.
    pub level: u32,
    /// Their tier, if spawned from an enemy template.
    pub tier: Option<EnemyTier>,
}

impl From<&Combatant> for Defeated {
    fn from(combatant: &Combatant) -> Self {
        Self {
            id: combatant.id(),
            level: combatant.level,
            tier: combatant.tier,
        }
    }
}

/// Experience and currency granted to the winning side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rewards {
    /// Experience points.
    pub experience: u64,
    /// Currency (souls).
    pub currency: u64,
}

impl std::ops::Add for Rewards {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            experience: self.experience.saturating_add(other.experience),
            currency: self.currency.saturating_add(other.currency),
        }
    }
}

/// Computes rewards from the defeated side.
///
/// Implementations must be pure: the same input always yields the same rewards.
pub trait RewardPolicy: Send + Sync {
    /// Rewards for defeating `defeated`.
    fn rewards(&self, defeated: &[Defeated]) -> Rewards;
}

/// Experience `100 × level`; currency `tier base × level`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandardRewards;

impl StandardRewards {
    /// Experience per level of a defeated combatant.
    pub const EXPERIENCE_PER_LEVEL: u64 = 100;

    /// Currency per level for a tier. Untiered combatants count as 100.
    #[must_use]
    pub const fn currency_base(tier: Option<EnemyTier>) -> u64 {
        match tier {
            Some(EnemyTier::Basic) => 20,
            Some(EnemyTier::Elite) => 75,
            Some(EnemyTier::MiniBoss) => 225,
            Some(EnemyTier::Boss) => 750,
            Some(EnemyTier::WorldBoss) => 3500,
            None => 100,
        }
    }
}

impl RewardPolicy for StandardRewards {
    fn rewards(&self, defeated: &[Defeated]) -> Rewards {
        defeated
            .iter()
            .map(|d| {
                let level = u64::from(d.level);
                Rewards {
                    experience: Self::EXPERIENCE_PER_LEVEL * level,
                    currency: Self::currency_base(d.tier) * level,
                }
            })
            .fold(Rewards::default(), |acc, r| acc + r)
    }
}
