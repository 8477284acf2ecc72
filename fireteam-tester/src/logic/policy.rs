use std::fmt;
use std::str::FromStr;

use anyhow::{Error, bail};
use fireteam_game::{
    Ability, Aim, DamageTier, Encounter, ItemId, PlayerState, RunPhase, Tactic, constants::MAX_HP,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::Serialize;

/// Policy interface for automated play strategies.
pub trait PlayerPolicy {
    /// Name used for logging/debug output.
    fn name(&self) -> &'static str;

    /// Item to use outside combat (before deploying or extracting), if any.
    fn prepare(&mut self, state: &PlayerState, phase: RunPhase) -> Option<ItemId>;

    /// Tactic for the next combat turn.
    fn pick_tactic(&mut self, state: &PlayerState, encounter: &Encounter) -> Tactic;
}

/// Built-in gameplay strategies for automated runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum GameplayStrategy {
    Aggressive,
    Cautious,
    Balanced,
    Random,
}

impl GameplayStrategy {
    pub const ALL: [Self; 4] = [
        Self::Aggressive,
        Self::Cautious,
        Self::Balanced,
        Self::Random,
    ];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            GameplayStrategy::Aggressive => "Aggressive",
            GameplayStrategy::Cautious => "Cautious",
            GameplayStrategy::Balanced => "Balanced",
            GameplayStrategy::Random => "Random",
        }
    }

    #[must_use]
    pub fn create_policy(self, seed: u64) -> Box<dyn PlayerPolicy + Send> {
        match self {
            GameplayStrategy::Aggressive => Box::new(AggressivePolicy),
            GameplayStrategy::Cautious => Box::new(CautiousPolicy),
            GameplayStrategy::Balanced => Box::new(BalancedPolicy),
            GameplayStrategy::Random => Box::new(RandomPolicy::new(seed)),
        }
    }
}

impl fmt::Display for GameplayStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for GameplayStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        if let Some(strategy) = Self::ALL
            .into_iter()
            .find(|strategy| strategy.label().eq_ignore_ascii_case(needle))
        {
            return Ok(strategy);
        }
        bail!("Unknown policy: {needle}")
    }
}

struct AggressivePolicy;
struct CautiousPolicy;
struct BalancedPolicy;

struct RandomPolicy {
    rng: ChaCha20Rng,
}

impl RandomPolicy {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed ^ 0x5EED_F1E1),
        }
    }
}

/// First held item from `wanted` that the player's role may use.
fn first_usable(state: &PlayerState, wanted: &[ItemId]) -> Option<ItemId> {
    wanted.iter().copied().find(|item| {
        state.inventory.has(*item)
            && item.is_usable()
            && item.exclusive_to().is_none_or(|role| role == state.role)
    })
}

const HEALS: [ItemId; 2] = [ItemId::MedicalKit, ItemId::MedPack];

fn heal_if(state: &PlayerState, threshold: u8) -> Option<ItemId> {
    if state.hp <= threshold && state.hp < MAX_HP {
        first_usable(state, &HEALS)
    } else {
        None
    }
}

fn gear_up(state: &PlayerState) -> Option<ItemId> {
    if state.damage_tier == DamageTier::Standard
        && let Some(rifle) = first_usable(state, &[ItemId::AssaultRifle])
    {
        return Some(rifle);
    }
    let boosts = state.boosts;
    if boosts.hit_bonus == 0
        && let Some(ammo) = first_usable(state, &[ItemId::Ammo])
    {
        return Some(ammo);
    }
    if boosts.enemy_pool_reduction == 0
        && let Some(knife) = first_usable(state, &[ItemId::CombatKnife])
    {
        return Some(knife);
    }
    if boosts.enemy_accuracy_penalty == 0
        && let Some(camo) = first_usable(state, &[ItemId::Camouflage])
    {
        return Some(camo);
    }
    if boosts.difficulty_relief == 0
        && let Some(radio) = first_usable(state, &[ItemId::EncryptedRadio])
    {
        return Some(radio);
    }
    None
}

impl PlayerPolicy for AggressivePolicy {
    fn name(&self) -> &'static str {
        "Aggressive"
    }

    fn prepare(&mut self, state: &PlayerState, phase: RunPhase) -> Option<ItemId> {
        match phase {
            RunPhase::MissionLoop => gear_up(state),
            _ => None,
        }
    }

    fn pick_tactic(&mut self, state: &PlayerState, encounter: &Encounter) -> Tactic {
        if state.charges.kill_shot && encounter.enemy_pool >= 2 {
            return Tactic::UseAbility;
        }
        Tactic::Shoot(Aim::Center)
    }
}

impl PlayerPolicy for CautiousPolicy {
    fn name(&self) -> &'static str {
        "Cautious"
    }

    fn prepare(&mut self, state: &PlayerState, _phase: RunPhase) -> Option<ItemId> {
        heal_if(state, MAX_HP - 1)
    }

    fn pick_tactic(&mut self, state: &PlayerState, encounter: &Encounter) -> Tactic {
        if let Some(item) = heal_if(state, 1) {
            return Tactic::UseItem(item);
        }
        if state.hp == 1 {
            if state.role_def().ability == Ability::FieldMedic && state.charges.field_heal {
                return Tactic::UseAbility;
            }
            return Tactic::Retreat;
        }
        if encounter.turn_count() % 2 == 0 {
            Tactic::TakeCover
        } else {
            Tactic::Shoot(Aim::Center)
        }
    }
}

impl PlayerPolicy for BalancedPolicy {
    fn name(&self) -> &'static str {
        "Balanced"
    }

    fn prepare(&mut self, state: &PlayerState, phase: RunPhase) -> Option<ItemId> {
        match phase {
            RunPhase::MissionLoop => heal_if(state, 1).or_else(|| gear_up(state)),
            RunPhase::Extraction => heal_if(state, MAX_HP - 1),
            _ => None,
        }
    }

    fn pick_tactic(&mut self, state: &PlayerState, encounter: &Encounter) -> Tactic {
        if let Some(item) = heal_if(state, 1) {
            return Tactic::UseItem(item);
        }
        let ability = state.role_def().ability;
        if ability == Ability::FieldMedic && state.is_wounded() && state.charges.field_heal {
            return Tactic::UseAbility;
        }
        if ability == Ability::Marksman && state.charges.kill_shot && encounter.difficulty >= 3 {
            return Tactic::UseAbility;
        }
        if state.hp == 1 && encounter.enemy_pool >= 2 {
            return Tactic::Retreat;
        }
        Tactic::Shoot(Aim::Center)
    }
}

impl PlayerPolicy for RandomPolicy {
    fn name(&self) -> &'static str {
        "Random"
    }

    fn prepare(&mut self, state: &PlayerState, _phase: RunPhase) -> Option<ItemId> {
        if self.rng.gen_bool(0.5) {
            gear_up(state).or_else(|| heal_if(state, MAX_HP - 1))
        } else {
            None
        }
    }

    fn pick_tactic(&mut self, state: &PlayerState, _encounter: &Encounter) -> Tactic {
        match self.rng.gen_range(0..7) {
            0 => Tactic::Shoot(Aim::Left),
            1 => Tactic::Shoot(Aim::Right),
            2 => Tactic::TakeCover,
            3 => Tactic::Retreat,
            4 => Tactic::UseAbility,
            5 => heal_if(state, MAX_HP - 1).map_or(Tactic::Shoot(Aim::Center), Tactic::UseItem),
            _ => Tactic::Shoot(Aim::Center),
        }
    }
}
