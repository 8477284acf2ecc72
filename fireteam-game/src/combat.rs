//! Turn-based encounter resolution.
//!
//! An encounter opens with the trap disarm check (Engineers on trapped
//! missions) and the fixed headshot roll, then proceeds one player tactic at
//! a time until the enemy pool is empty, the player is down, or the player
//! gets away. Role abilities are dispatched on [`Ability`], never on the role
//! identity itself.
use crate::constants::{
    AIM_CENTER_MOD, AIM_LEFT_MOD, AIM_RIGHT_MOD, BASE_HIT_PCT, COVER_ENEMY_PENALTY,
    COVER_RETURN_FIRE_PENALTY, DISARM_PCT, ENEMY_ACCURACY_PER_DIFFICULTY, ENEMY_BASE_ACCURACY,
    FIELD_MEDIC_TURN_HEAL_PCT, FORESIGHT_DIFFICULTY_RELIEF, FORESIGHT_RETREAT_BONUS, HEADSHOT_PCT,
    HIT_PCT_PER_DIFFICULTY, MARKSMAN_ENEMY_PENALTY, MAX_COMBAT_TURNS, MAX_ROLL_PCT, MIN_ROLL_PCT,
    RETREAT_BASE_PCT, RETREAT_CRIT_BASE_PCT, RETREAT_CRIT_PER_DIFFICULTY,
    RETREAT_PCT_PER_DIFFICULTY, STEADY_DODGE_PCT, UPGRADED_DOUBLE_TAP_PCT,
};
use crate::dice::Dice;
use crate::error::GameError;
use crate::inventory::{InventoryLedger, ItemEffect};
use crate::items::ItemId;
use crate::missions::{Mission, MissionId, MissionKind};
use crate::roles::Ability;
use crate::state::{DamageTier, EncounterBoosts, PlayerState};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aim {
    Left,
    Center,
    Right,
}

impl Aim {
    const fn modifier(self) -> i32 {
        match self {
            Self::Left => AIM_LEFT_MOD,
            Self::Center => AIM_CENTER_MOD,
            Self::Right => AIM_RIGHT_MOD,
        }
    }
}

/// Player action for a single combat turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tactic {
    Shoot(Aim),
    TakeCover,
    Retreat,
    UseAbility,
    UseItem(ItemId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncounterOutcome {
    Won,
    Lost,
    Retreated,
}

/// How an encounter started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Opening {
    /// Combat begins; turns are required.
    Contact,
    /// The trap was disarmed; the encounter is won without a fight.
    Disarmed,
    /// The headshot check fired; the encounter is lost and the player is dead.
    Headshot,
}

/// What the player's side did during a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "action")]
pub enum PlayerAction {
    Fired { hit: bool, damage: u8 },
    ReturnedFire { hit: bool, damage: u8 },
    /// Medic healed instead of acting, either passively or via the field heal.
    Healed { amount: u8 },
    KillShot,
    RetreatAttempt { escaped: bool },
    UsedItem { item: ItemId, effect: ItemEffect },
    /// Ability requested with nothing available; the turn is wasted.
    Hesitated,
}

/// What the enemy did in reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnemyFire {
    /// The enemy did not fire (defeated, or the player escaped).
    Silent,
    Missed,
    Dodged,
    Hit,
}

/// One exchange inside an encounter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatTurn {
    pub turn: u32,
    pub tactic: Tactic,
    pub action: PlayerAction,
    pub enemy: EnemyFire,
    pub hp_after: u8,
    pub enemy_pool_after: u8,
}

impl CombatTurn {
    #[must_use]
    pub const fn damage_dealt(&self) -> u8 {
        match self.action {
            PlayerAction::Fired { damage, .. } | PlayerAction::ReturnedFire { damage, .. } => {
                damage
            }
            _ => 0,
        }
    }

    #[must_use]
    pub const fn damage_taken(&self) -> u8 {
        if matches!(self.enemy, EnemyFire::Hit) {
            1
        } else {
            0
        }
    }
}

/// An encounter in progress (or finished) against one mission's enemy force.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Encounter {
    pub mission: MissionId,
    /// Mission difficulty after role and item relief.
    pub difficulty: u8,
    pub enemy_pool: u8,
    pub opening: Opening,
    pub turns: Vec<CombatTurn>,
    pub outcome: Option<EncounterOutcome>,
    #[serde(skip)]
    boosts: EncounterBoosts,
    /// Boosts that outlive this encounter: opening-time boosts picked up
    /// mid-fight, and a Toolkit not yet spent on a trap.
    #[serde(skip)]
    carry: EncounterBoosts,
}

/// Final record of a resolved encounter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncounterReport {
    pub mission: MissionId,
    pub outcome: EncounterOutcome,
    pub headshot: bool,
    pub disarmed: bool,
    pub damage_taken: u8,
    pub turns: Vec<CombatTurn>,
}

impl Encounter {
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        self.outcome.is_some()
    }

    #[must_use]
    pub fn turn_count(&self) -> u32 {
        u32::try_from(self.turns.len()).unwrap_or(u32::MAX)
    }

    /// Snapshot the finished encounter. `None` while combat is still running.
    #[must_use]
    pub fn report(&self) -> Option<EncounterReport> {
        let outcome = self.outcome?;
        Some(EncounterReport {
            mission: self.mission,
            outcome,
            headshot: self.opening == Opening::Headshot,
            disarmed: self.opening == Opening::Disarmed,
            damage_taken: self.turns.iter().map(CombatTurn::damage_taken).sum(),
            turns: self.turns.clone(),
        })
    }

    /// Effective hit chance for an aimed shot this encounter.
    #[must_use]
    pub fn hit_chance(&self, player: &PlayerState, aim: Aim) -> i32 {
        let role = player.role_def();
        let raw = BASE_HIT_PCT + role.hit_mod + self.boosts.hit_bonus + aim.modifier()
            - HIT_PCT_PER_DIFFICULTY * i32::from(self.difficulty);
        clamp_pct(raw)
    }

    /// Enemy accuracy against the player, optionally from behind cover.
    #[must_use]
    pub fn enemy_accuracy(&self, player: &PlayerState, in_cover: bool) -> i32 {
        let mut raw = ENEMY_BASE_ACCURACY
            + ENEMY_ACCURACY_PER_DIFFICULTY * i32::from(self.difficulty)
            - self.boosts.enemy_accuracy_penalty;
        if player.role_def().ability == Ability::Marksman {
            raw -= MARKSMAN_ENEMY_PENALTY;
        }
        if in_cover {
            raw -= COVER_ENEMY_PENALTY;
        }
        clamp_pct(raw)
    }

    #[must_use]
    pub fn retreat_chance(&self, player: &PlayerState) -> i32 {
        let mut raw = RETREAT_BASE_PCT - RETREAT_PCT_PER_DIFFICULTY * i32::from(self.difficulty);
        if player.role_def().ability == Ability::Foresight {
            raw += FORESIGHT_RETREAT_BONUS;
        }
        clamp_pct(raw)
    }

    fn roll_damage<D: Dice + ?Sized>(player: &PlayerState, dice: &mut D) -> u8 {
        let mut double_tap = player.role_def().damage_mod;
        if player.damage_tier == DamageTier::Upgraded {
            double_tap += UPGRADED_DOUBLE_TAP_PCT;
        }
        if dice.chance(double_tap) { 2 } else { 1 }
    }

    fn strike(&mut self, damage: u8) {
        self.enemy_pool = self.enemy_pool.saturating_sub(damage);
    }

    /// Fold boosts gained from an item used mid-fight into this encounter.
    fn absorb(&mut self, fresh: EncounterBoosts) {
        let active = self.boosts;
        if fresh.enemy_pool_reduction > active.enemy_pool_reduction {
            let extra = fresh.enemy_pool_reduction - active.enemy_pool_reduction;
            self.enemy_pool = self.enemy_pool.saturating_sub(extra).max(1);
        }
        if fresh.difficulty_relief > active.difficulty_relief {
            self.carry.difficulty_relief = fresh.difficulty_relief;
        }
        if fresh.guaranteed_disarm && !active.guaranteed_disarm {
            self.carry.guaranteed_disarm = true;
        }
        self.boosts = fresh;
    }
}

const fn clamp_pct(raw: i32) -> i32 {
    if raw < MIN_ROLL_PCT {
        MIN_ROLL_PCT
    } else if raw > MAX_ROLL_PCT {
        MAX_ROLL_PCT
    } else {
        raw
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CombatResolver;

impl CombatResolver {
    /// Open an encounter: apply difficulty relief, run the disarm check, then
    /// the headshot check. Disarmed and headshot openings come back already
    /// resolved.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidState`] if the player has no hit points left.
    pub fn open<D: Dice + ?Sized>(
        player: &mut PlayerState,
        mission: &Mission,
        dice: &mut D,
    ) -> Result<Encounter, GameError> {
        if player.hp == 0 {
            return Err(GameError::InvalidState(
                "cannot start an encounter with zero hit points",
            ));
        }
        let ability = player.role_def().ability;
        let boosts = player.boosts;

        let mut relief = boosts.difficulty_relief;
        if ability == Ability::Foresight {
            relief = relief.saturating_add(FORESIGHT_DIFFICULTY_RELIEF);
        }
        let difficulty = mission.difficulty.saturating_sub(relief).max(1);
        let enemy_pool = difficulty
            .saturating_sub(boosts.enemy_pool_reduction)
            .max(1);
        // A primed Toolkit waits for the next trap.
        let carry = EncounterBoosts {
            guaranteed_disarm: boosts.guaranteed_disarm && mission.kind != MissionKind::Trap,
            ..EncounterBoosts::default()
        };

        let mut encounter = Encounter {
            mission: mission.id,
            difficulty,
            enemy_pool,
            opening: Opening::Contact,
            turns: Vec::new(),
            outcome: None,
            boosts,
            carry,
        };

        if ability == Ability::Disarm
            && mission.kind == MissionKind::Trap
            && (boosts.guaranteed_disarm || dice.chance(DISARM_PCT))
        {
            encounter.opening = Opening::Disarmed;
            encounter.enemy_pool = 0;
            encounter.outcome = Some(EncounterOutcome::Won);
        } else if dice.chance(HEADSHOT_PCT) {
            player.kill();
            encounter.opening = Opening::Headshot;
            encounter.outcome = Some(EncounterOutcome::Lost);
        }

        if encounter.is_resolved() {
            Self::conclude(player, encounter.carry);
        }
        log::debug!(
            "{} opened: difficulty {} enemy pool {} opening {:?}",
            mission.name,
            encounter.difficulty,
            encounter.enemy_pool,
            encounter.opening
        );
        Ok(encounter)
    }

    /// Play one turn with the given tactic.
    ///
    /// # Errors
    ///
    /// - [`GameError::InvalidState`] if the encounter is already resolved or the
    ///   player has no hit points.
    /// - Any [`InventoryLedger::use_item`] error for [`Tactic::UseItem`]; the
    ///   turn is then not consumed and nothing is rolled.
    pub fn play_turn<D: Dice + ?Sized>(
        encounter: &mut Encounter,
        player: &mut PlayerState,
        tactic: Tactic,
        dice: &mut D,
    ) -> Result<CombatTurn, GameError> {
        if encounter.is_resolved() {
            return Err(GameError::InvalidState("encounter is already resolved"));
        }
        if player.hp == 0 {
            return Err(GameError::InvalidState("player has no hit points"));
        }
        let ability = player.role_def().ability;

        let mut in_cover = false;
        let mut retreating = false;
        let action = if let Tactic::UseItem(item) = tactic {
            let effect = InventoryLedger::use_item(player, item)?;
            encounter.absorb(player.boosts);
            PlayerAction::UsedItem { item, effect }
        } else if ability == Ability::FieldMedic
            && player.is_wounded()
            && dice.chance(FIELD_MEDIC_TURN_HEAL_PCT)
        {
            PlayerAction::Healed {
                amount: player.heal(1),
            }
        } else {
            match tactic {
                Tactic::Shoot(aim) => {
                    let hit = dice.chance(encounter.hit_chance(player, aim));
                    let damage = if hit {
                        Encounter::roll_damage(player, dice)
                    } else {
                        0
                    };
                    encounter.strike(damage);
                    PlayerAction::Fired { hit, damage }
                }
                Tactic::TakeCover => {
                    in_cover = true;
                    let chance = encounter.hit_chance(player, Aim::Center) - COVER_RETURN_FIRE_PENALTY;
                    let hit = dice.chance(chance);
                    let damage = u8::from(hit);
                    encounter.strike(damage);
                    PlayerAction::ReturnedFire { hit, damage }
                }
                Tactic::Retreat => {
                    retreating = true;
                    let escaped = dice.chance(encounter.retreat_chance(player));
                    if escaped {
                        encounter.outcome = Some(EncounterOutcome::Retreated);
                    }
                    PlayerAction::RetreatAttempt { escaped }
                }
                Tactic::UseAbility => use_ability(encounter, player, ability),
                Tactic::UseItem(_) => PlayerAction::Hesitated,
            }
        };

        let enemy = if encounter.is_resolved() || encounter.enemy_pool == 0 {
            EnemyFire::Silent
        } else if retreating {
            let crit = RETREAT_CRIT_BASE_PCT
                + RETREAT_CRIT_PER_DIFFICULTY * i32::from(encounter.difficulty);
            if dice.chance(crit) {
                player.take_hit();
                EnemyFire::Hit
            } else {
                EnemyFire::Missed
            }
        } else if ability == Ability::Steady && dice.chance(STEADY_DODGE_PCT) {
            EnemyFire::Dodged
        } else if dice.chance(encounter.enemy_accuracy(player, in_cover)) {
            player.take_hit();
            EnemyFire::Hit
        } else {
            EnemyFire::Missed
        };

        let turn = CombatTurn {
            turn: encounter.turn_count() + 1,
            tactic,
            action,
            enemy,
            hp_after: player.hp,
            enemy_pool_after: encounter.enemy_pool,
        };
        encounter.turns.push(turn);

        if encounter.outcome.is_none() {
            if encounter.enemy_pool == 0 {
                encounter.outcome = Some(EncounterOutcome::Won);
            } else if player.hp == 0 {
                encounter.outcome = Some(EncounterOutcome::Lost);
            } else if encounter.turn_count() >= MAX_COMBAT_TURNS {
                // The enemy breaks contact.
                encounter.outcome = Some(EncounterOutcome::Retreated);
            }
        }
        log::trace!("turn {turn:?}");
        if encounter.is_resolved() {
            Self::conclude(player, encounter.carry);
        }
        Ok(turn)
    }

    /// Resolve a whole encounter, asking `choose` for each turn's tactic.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`Self::open`] and [`Self::play_turn`].
    pub fn resolve<D, F>(
        player: &mut PlayerState,
        mission: &Mission,
        dice: &mut D,
        mut choose: F,
    ) -> Result<EncounterReport, GameError>
    where
        D: Dice + ?Sized,
        F: FnMut(&PlayerState, &Encounter) -> Tactic,
    {
        let mut encounter = Self::open(player, mission, dice)?;
        while !encounter.is_resolved() {
            let tactic = choose(player, &encounter);
            Self::play_turn(&mut encounter, player, tactic, dice)?;
        }
        encounter
            .report()
            .ok_or(GameError::InvalidState("encounter ended without an outcome"))
    }

    /// Post-encounter bookkeeping: spent boosts expire, the field heal recharges.
    fn conclude(player: &mut PlayerState, carry: EncounterBoosts) {
        player.boosts = carry;
        if player.role_def().ability == Ability::FieldMedic {
            player.charges.field_heal = true;
        }
    }
}

fn use_ability(encounter: &mut Encounter, player: &mut PlayerState, ability: Ability) -> PlayerAction {
    match ability {
        Ability::Marksman if player.charges.kill_shot => {
            player.charges.kill_shot = false;
            encounter.enemy_pool = 0;
            PlayerAction::KillShot
        }
        Ability::FieldMedic if player.charges.field_heal => {
            player.charges.field_heal = false;
            PlayerAction::Healed {
                amount: player.heal(1),
            }
        }
        _ => PlayerAction::Hesitated,
    }
}
