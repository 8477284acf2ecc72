use anyhow::{Context, Result, bail};
use fireteam_game::{
    Aim, Decision, EncounterOutcome, Ending, GameError, MissionId, RoleId, RunConfig, RunEvent,
    RunHandle, RunPhase, Tactic,
};
use serde::Serialize;

use crate::logic::policy::{GameplayStrategy, PlayerPolicy};

/// Upper bound on decisions per run; the engine guarantees far fewer.
const MAX_DECISIONS: usize = 1_000;
/// Upper bound on item uses between two deployments.
const MAX_PREP_ITEMS: usize = 8;

/// Configuration for a simulation session.
#[derive(Debug, Clone, Copy)]
pub struct SimulationConfig {
    pub seed: u64,
    pub role: RoleId,
    pub strategy: GameplayStrategy,
    pub mission_quota: u32,
}

impl SimulationConfig {
    #[must_use]
    pub fn new(role: RoleId, strategy: GameplayStrategy, seed: u64) -> Self {
        Self {
            seed,
            role,
            strategy,
            mission_quota: RunConfig::default_mission_quota(),
        }
    }

    #[must_use]
    pub fn with_quota(mut self, mission_quota: u32) -> Self {
        self.mission_quota = mission_quota;
        self
    }
}

/// One deployment and how it ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Sortie {
    pub mission: MissionId,
    pub outcome: EncounterOutcome,
}

/// Everything observed during one automated run.
#[derive(Debug, Clone, Serialize)]
pub struct RunRecord {
    pub role: RoleId,
    pub strategy: GameplayStrategy,
    pub seed: u64,
    pub callsign: String,
    pub ending: Ending,
    pub missions_attempted: u32,
    pub missions_completed: u32,
    pub final_hp: u8,
    pub encounters: u32,
    pub headshots: u32,
    pub combat_turns: u32,
    pub damage_dealt: u32,
    pub items_used: u32,
    pub rejected_decisions: u32,
    pub draws: u64,
    pub sorties: Vec<Sortie>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub trace: Vec<RunEvent>,
}

/// Play a full run with the configured policy.
///
/// # Errors
///
/// Fails if the engine rejects the configuration, reports an invariant
/// violation, or the run does not terminate.
pub fn run_simulation(config: SimulationConfig, keep_trace: bool) -> Result<RunRecord> {
    let mut handle = RunHandle::new(config.seed, RunConfig::with_quota(config.mission_quota))
        .context("invalid run configuration")?;
    let mut policy = config.strategy.create_policy(config.seed);
    let mut trace = Vec::new();
    let mut counters = Counters::default();

    let event = handle.advance(Decision::SelectRole(config.role))?;
    record(&mut trace, keep_trace, event);

    for _ in 0..MAX_DECISIONS {
        match handle.phase() {
            RunPhase::GameOver | RunPhase::Concluded => break,
            RunPhase::RoleSelect => bail!("run fell back to role selection"),
            RunPhase::MissionLoop => {
                prepare(&mut handle, policy.as_mut(), &mut counters, &mut trace, keep_trace)?;
                let event = handle.advance(Decision::Deploy)?;
                counters.encounters += 1;
                counters.observe(&event);
                record(&mut trace, keep_trace, event);
            }
            RunPhase::Combat => {
                let event = engage(&mut handle, policy.as_mut(), &mut counters)?;
                counters.combat_turns += 1;
                counters.observe(&event);
                record(&mut trace, keep_trace, event);
            }
            RunPhase::Extraction => {
                prepare(&mut handle, policy.as_mut(), &mut counters, &mut trace, keep_trace)?;
                let event = handle.advance(Decision::Extract)?;
                record(&mut trace, keep_trace, event);
            }
        }
    }

    if !handle.phase().is_terminal() {
        bail!(
            "run {} did not terminate within {MAX_DECISIONS} decisions",
            handle.callsign()
        );
    }
    let summary = handle.summary().context("run finished without a role")?;
    let ending = summary.ending.context("run finished without an ending")?;
    log::debug!(
        "{} {} {}: {ending} after {} missions",
        summary.callsign,
        config.role,
        policy.name(),
        summary.missions_attempted
    );

    Ok(RunRecord {
        role: config.role,
        strategy: config.strategy,
        seed: config.seed,
        callsign: summary.callsign,
        ending,
        missions_attempted: summary.missions_attempted,
        missions_completed: summary.missions_completed,
        final_hp: summary.final_hp,
        encounters: counters.encounters,
        headshots: summary.headshots,
        combat_turns: counters.combat_turns,
        damage_dealt: counters.damage_dealt,
        items_used: counters.items_used,
        rejected_decisions: counters.rejected,
        draws: handle.draws(),
        sorties: counters.sorties,
        trace,
    })
}

#[derive(Debug, Default)]
struct Counters {
    encounters: u32,
    combat_turns: u32,
    damage_dealt: u32,
    items_used: u32,
    rejected: u32,
    sorties: Vec<Sortie>,
}

impl Counters {
    fn observe(&mut self, event: &RunEvent) {
        let resolution = match event {
            RunEvent::MissionDrawn { resolution, .. } => resolution.as_ref(),
            RunEvent::CombatTurn { turn, resolution } => {
                self.damage_dealt += u32::from(turn.damage_dealt());
                resolution.as_ref()
            }
            _ => None,
        };
        if let Some(resolution) = resolution {
            self.sorties.push(Sortie {
                mission: resolution.mission,
                outcome: resolution.outcome,
            });
        }
    }
}

fn record(trace: &mut Vec<RunEvent>, keep_trace: bool, event: RunEvent) {
    if keep_trace {
        trace.push(event);
    }
}

fn prepare(
    handle: &mut RunHandle,
    policy: &mut dyn PlayerPolicy,
    counters: &mut Counters,
    trace: &mut Vec<RunEvent>,
    keep_trace: bool,
) -> Result<()> {
    for _ in 0..MAX_PREP_ITEMS {
        let phase = handle.phase();
        let Some(item) = handle
            .player()
            .and_then(|state| policy.prepare(state, phase))
        else {
            break;
        };
        match handle.advance(Decision::UseItem(item)) {
            Ok(event) => {
                counters.items_used += 1;
                record(trace, keep_trace, event);
            }
            Err(err) if err.is_recoverable() => {
                log::debug!("{} rejected {item}: {err}", policy.name());
                counters.rejected += 1;
                break;
            }
            Err(err) => return Err(err.into()),
        }
    }
    Ok(())
}

fn engage(
    handle: &mut RunHandle,
    policy: &mut dyn PlayerPolicy,
    counters: &mut Counters,
) -> Result<RunEvent> {
    let (Some(state), Some(encounter)) = (handle.player(), handle.encounter()) else {
        bail!("combat phase without an active encounter");
    };
    let tactic = policy.pick_tactic(state, encounter);
    match handle.advance(Decision::Engage(tactic)) {
        Ok(event) => {
            if matches!(tactic, Tactic::UseItem(_)) {
                counters.items_used += 1;
            }
            Ok(event)
        }
        Err(err) if is_rejection(&err) => {
            log::debug!("{} tactic {tactic:?} rejected: {err}", policy.name());
            counters.rejected += 1;
            Ok(handle.advance(Decision::Engage(Tactic::Shoot(Aim::Center)))?)
        }
        Err(err) => Err(err.into()),
    }
}

fn is_rejection(err: &GameError) -> bool {
    matches!(
        err,
        GameError::InsufficientItem { .. }
            | GameError::RoleMismatch { .. }
            | GameError::ItemNotUsable { .. }
    )
}
