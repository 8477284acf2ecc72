//! Mission runner: the run state machine and the decision interface.
use crate::combat::{CombatResolver, CombatTurn, Encounter, EncounterOutcome, Opening, Tactic};
use crate::config::RunConfig;
use crate::constants::MEDIC_REST_HEAL_PCT;
use crate::error::GameError;
use crate::extraction::{Ending, ExtractionEngine};
use crate::inventory::{InventoryLedger, ItemEffect, LootGrant};
use crate::items::ItemId;
use crate::missions::{MissionCatalog, MissionId};
use crate::result::RunSummary;
use crate::rng::{RollSource, Stream};
use crate::roles::{Ability, RoleId};
use crate::seed::encode_callsign;
use crate::state::{Inventory, PlayerState};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    #[default]
    RoleSelect,
    MissionLoop,
    Combat,
    Extraction,
    GameOver,
    Concluded,
}

/// Facts that drive phase transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseSignal {
    RoleChosen,
    MissionDeployed,
    EncounterEnded { alive: bool, quota_reached: bool },
    Extracted,
    Aborted,
}

impl RunPhase {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::GameOver | Self::Concluded)
    }

    /// Pure transition function.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidState`] when the signal is not valid in this phase.
    pub fn next(self, signal: PhaseSignal) -> Result<Self, GameError> {
        match (self, signal) {
            (Self::GameOver | Self::Concluded, _) => {
                Err(GameError::InvalidState("the run is over"))
            }
            (_, PhaseSignal::Aborted) => Ok(Self::GameOver),
            (Self::RoleSelect, PhaseSignal::RoleChosen) => Ok(Self::MissionLoop),
            (Self::MissionLoop, PhaseSignal::MissionDeployed) => Ok(Self::Combat),
            (Self::Combat, PhaseSignal::EncounterEnded { alive: false, .. }) => {
                Ok(Self::GameOver)
            }
            (
                Self::Combat,
                PhaseSignal::EncounterEnded {
                    quota_reached: true,
                    ..
                },
            ) => Ok(Self::Extraction),
            (Self::Combat, PhaseSignal::EncounterEnded { .. }) => Ok(Self::MissionLoop),
            (Self::Extraction, PhaseSignal::Extracted) => Ok(Self::Concluded),
            _ => Err(GameError::InvalidState("decision not allowed in this phase")),
        }
    }
}

/// Player input accepted by [`RunHandle::advance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    SelectRole(RoleId),
    Deploy,
    Engage(Tactic),
    UseItem(ItemId),
    Extract,
}

/// How a finished encounter was folded back into the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncounterResolution {
    pub mission: MissionId,
    pub outcome: EncounterOutcome,
    pub headshot: bool,
    pub disarmed: bool,
    pub damage_taken: u8,
    pub loot: LootGrant,
    /// Hit points restored by the Medic's post-mission rest.
    pub rest_heal: u8,
    pub phase: RunPhase,
}

/// Consequence of a single decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "event")]
pub enum RunEvent {
    RoleAssigned {
        role: RoleId,
        inventory: Inventory,
    },
    MissionDrawn {
        mission: MissionId,
        number: u32,
        opening: Opening,
        difficulty: u8,
        enemy_pool: u8,
        resolution: Option<EncounterResolution>,
    },
    CombatTurn {
        turn: CombatTurn,
        resolution: Option<EncounterResolution>,
    },
    ItemUsed {
        item: ItemId,
        effect: ItemEffect,
    },
    EndingReached {
        ending: Ending,
        survival_chance: i32,
    },
}

/// One run of the game: player state, phase, and random source.
#[derive(Debug, Clone)]
pub struct RunHandle {
    seed: u64,
    config: RunConfig,
    phase: RunPhase,
    player: Option<PlayerState>,
    rolls: RollSource,
    encounter: Option<Encounter>,
    history: Vec<EncounterResolution>,
    ending: Option<Ending>,
}

impl RunHandle {
    /// Fresh run waiting for a role choice, rolling from seeded streams.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::Config`] when the configuration is invalid.
    pub fn new(seed: u64, config: RunConfig) -> Result<Self, GameError> {
        Self::with_rolls(seed, config, RollSource::seeded(seed))
    }

    /// Fresh run drawing from an explicit roll source.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::Config`] when the configuration is invalid.
    pub fn with_rolls(seed: u64, config: RunConfig, rolls: RollSource) -> Result<Self, GameError> {
        config.validate()?;
        Ok(Self {
            seed,
            config,
            phase: RunPhase::RoleSelect,
            player: None,
            rolls,
            encounter: None,
            history: Vec::new(),
            ending: None,
        })
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    #[must_use]
    pub fn callsign(&self) -> String {
        encode_callsign(self.seed)
    }

    #[must_use]
    pub const fn config(&self) -> RunConfig {
        self.config
    }

    #[must_use]
    pub const fn phase(&self) -> RunPhase {
        self.phase
    }

    /// Player state, once a role has been chosen.
    #[must_use]
    pub const fn player(&self) -> Option<&PlayerState> {
        self.player.as_ref()
    }

    /// Encounter currently being fought, if any.
    #[must_use]
    pub const fn encounter(&self) -> Option<&Encounter> {
        self.encounter.as_ref()
    }

    /// Every encounter resolved so far, in order.
    #[must_use]
    pub fn history(&self) -> &[EncounterResolution] {
        &self.history
    }

    #[must_use]
    pub const fn ending(&self) -> Option<Ending> {
        self.ending
    }

    #[must_use]
    pub fn draws(&self) -> u64 {
        self.rolls.draws()
    }

    #[must_use]
    pub fn summary(&self) -> Option<RunSummary> {
        RunSummary::from_run(self)
    }

    /// Apply one decision.
    ///
    /// # Errors
    ///
    /// Recoverable errors leave the run exactly as it was. An
    /// [`GameError::InvariantViolation`] aborts the run into `GameOver`.
    pub fn advance(&mut self, decision: Decision) -> Result<RunEvent, GameError> {
        if self.phase.is_terminal() {
            return Err(GameError::InvalidState("the run is over"));
        }
        let event = match (self.phase, decision) {
            (RunPhase::RoleSelect, Decision::SelectRole(role)) => self.select_role(role)?,
            (RunPhase::MissionLoop, Decision::Deploy) => self.deploy()?,
            (RunPhase::Combat, Decision::Engage(tactic)) => self.engage(tactic)?,
            (RunPhase::Combat, Decision::UseItem(item)) => self.engage(Tactic::UseItem(item))?,
            (RunPhase::MissionLoop | RunPhase::Extraction, Decision::UseItem(item)) => {
                let player = self.player_mut()?;
                let effect = InventoryLedger::use_item(player, item)?;
                RunEvent::ItemUsed { item, effect }
            }
            (RunPhase::Extraction, Decision::Extract) => self.extract()?,
            _ => return Err(GameError::InvalidState("decision not allowed in this phase")),
        };
        self.verify()?;
        Ok(event)
    }

    fn player_mut(&mut self) -> Result<&mut PlayerState, GameError> {
        self.player
            .as_mut()
            .ok_or(GameError::InvalidState("no role selected"))
    }

    fn transition(&mut self, signal: PhaseSignal) -> Result<(), GameError> {
        let next = self.phase.next(signal)?;
        log::debug!("phase {:?} -> {next:?} on {signal:?}", self.phase);
        self.phase = next;
        Ok(())
    }

    fn select_role(&mut self, role: RoleId) -> Result<RunEvent, GameError> {
        let next = self.phase.next(PhaseSignal::RoleChosen)?;
        let player = PlayerState::new(role);
        let inventory = player.inventory.clone();
        self.player = Some(player);
        log::debug!("role {role} assigned; phase -> {next:?}");
        self.phase = next;
        Ok(RunEvent::RoleAssigned { role, inventory })
    }

    fn deploy(&mut self) -> Result<RunEvent, GameError> {
        let mission = MissionCatalog::draw_mission(self.rolls.stream(Stream::Mission));
        let Self { player, rolls, .. } = self;
        let player = player
            .as_mut()
            .ok_or(GameError::InvalidState("no role selected"))?;
        let encounter = CombatResolver::open(player, mission, rolls.stream(Stream::Combat))?;
        let number = player.missions_attempted + 1;
        log::debug!("mission {number}: {} ({:?})", mission.name, encounter.opening);
        self.transition(PhaseSignal::MissionDeployed)?;

        let opening = encounter.opening;
        let difficulty = encounter.difficulty;
        let enemy_pool = encounter.enemy_pool;
        let resolution = if encounter.is_resolved() {
            Some(self.fold_encounter(&encounter)?)
        } else {
            self.encounter = Some(encounter);
            None
        };
        Ok(RunEvent::MissionDrawn {
            mission: mission.id,
            number,
            opening,
            difficulty,
            enemy_pool,
            resolution,
        })
    }

    fn engage(&mut self, tactic: Tactic) -> Result<RunEvent, GameError> {
        let Self {
            player,
            rolls,
            encounter,
            ..
        } = self;
        let player = player
            .as_mut()
            .ok_or(GameError::InvalidState("no role selected"))?;
        let active = encounter
            .as_mut()
            .ok_or(GameError::InvalidState("no encounter in progress"))?;
        let turn = CombatResolver::play_turn(active, player, tactic, rolls.stream(Stream::Combat))?;
        let resolution = if active.is_resolved() {
            let finished = active.clone();
            self.encounter = None;
            Some(self.fold_encounter(&finished)?)
        } else {
            None
        };
        Ok(RunEvent::CombatTurn { turn, resolution })
    }

    /// Book a finished encounter: counters, loot, rest, and the next phase.
    fn fold_encounter(&mut self, encounter: &Encounter) -> Result<EncounterResolution, GameError> {
        let report = encounter
            .report()
            .ok_or(GameError::InvalidState("encounter is still in progress"))?;
        let quota = self.config.mission_quota;
        let Self { player, rolls, .. } = self;
        let player = player
            .as_mut()
            .ok_or(GameError::InvalidState("no role selected"))?;

        player.missions_attempted += 1;
        let mut loot = LootGrant::new();
        let mut rest_heal = 0;
        if player.hp > 0 {
            if report.outcome == EncounterOutcome::Won {
                player.missions_completed += 1;
                let mission = MissionCatalog::mission(report.mission);
                loot = InventoryLedger::grant_loot(
                    player,
                    MissionCatalog::loot_table_for(mission),
                    rolls.stream(Stream::Loot),
                );
            }
            if player.role_def().ability == Ability::FieldMedic
                && rolls.stream(Stream::Combat).chance(MEDIC_REST_HEAL_PCT)
            {
                rest_heal = player.heal(1);
            }
        }
        let alive = player.hp > 0;
        let quota_reached = player.missions_attempted >= quota;
        self.transition(PhaseSignal::EncounterEnded {
            alive,
            quota_reached,
        })?;
        if !alive {
            self.ending = Some(Ending::KilledInAction);
        }
        let resolution = EncounterResolution {
            mission: report.mission,
            outcome: report.outcome,
            headshot: report.headshot,
            disarmed: report.disarmed,
            damage_taken: report.damage_taken,
            loot,
            rest_heal,
            phase: self.phase,
        };
        log::debug!(
            "{} {:?}: loot {:?}, phase {:?}",
            resolution.mission,
            resolution.outcome,
            resolution.loot,
            resolution.phase
        );
        self.history.push(resolution.clone());
        Ok(resolution)
    }

    fn extract(&mut self) -> Result<RunEvent, GameError> {
        let Self { player, rolls, .. } = self;
        let player = player
            .as_ref()
            .ok_or(GameError::InvalidState("no role selected"))?;
        let survival_chance = ExtractionEngine::survival_chance(player);
        let ending = ExtractionEngine::compute_ending(player, rolls.stream(Stream::Extraction));
        self.ending = Some(ending);
        self.transition(PhaseSignal::Extracted)?;
        Ok(RunEvent::EndingReached {
            ending,
            survival_chance,
        })
    }

    fn verify(&mut self) -> Result<(), GameError> {
        let Some(player) = self.player.as_ref() else {
            return Ok(());
        };
        if let Err(err) = player.check_invariants() {
            log::error!("aborting run {}: {err}", self.callsign());
            self.phase = self
                .phase
                .next(PhaseSignal::Aborted)
                .unwrap_or(RunPhase::GameOver);
            self.encounter = None;
            return Err(err);
        }
        Ok(())
    }
}

/// Start a run with the default configuration and the role already chosen.
///
/// # Errors
///
/// Returns [`GameError::UnknownRole`] if `role_id` names no role.
pub fn start_run(role_id: &str, seed: u64) -> Result<RunHandle, GameError> {
    start_run_with(role_id, seed, RunConfig::default())
}

/// Start a run with an explicit configuration.
///
/// # Errors
///
/// Returns [`GameError::UnknownRole`] for an unknown role and
/// [`GameError::Config`] for an invalid configuration.
pub fn start_run_with(role_id: &str, seed: u64, config: RunConfig) -> Result<RunHandle, GameError> {
    let role: RoleId = role_id.parse()?;
    let mut handle = RunHandle::new(seed, config)?;
    handle.advance(Decision::SelectRole(role))?;
    Ok(handle)
}

/// Apply one decision to a run.
///
/// # Errors
///
/// See [`RunHandle::advance`].
pub fn advance(handle: &mut RunHandle, decision: Decision) -> Result<RunEvent, GameError> {
    handle.advance(decision)
}

/// Snapshot of the player, once a role has been chosen.
#[must_use]
pub fn current_state(handle: &RunHandle) -> Option<PlayerState> {
    handle.player().cloned()
}
