//! End-of-run summary
use crate::extraction::Ending;
use crate::roles::RoleId;
use crate::runner::{RunHandle, RunPhase};
use crate::state::Inventory;
use serde::{Deserialize, Serialize};

/// Final standing of the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    /// Run still in progress
    Active,
    Survived,
    Captured,
    Deceased,
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunStatus::Active => write!(f, "ACTIVE"),
            RunStatus::Survived => write!(f, "SURVIVED"),
            RunStatus::Captured => write!(f, "CAPTURED"),
            RunStatus::Deceased => write!(f, "DECEASED"),
        }
    }
}

/// Complete summary of a run for display at the end of the campaign
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub role: RoleId,
    pub callsign: String,
    pub seed: u64,
    pub phase: RunPhase,
    pub status: RunStatus,
    pub ending: Option<Ending>,
    pub headline: String,
    pub epilogue: String,
    pub missions_attempted: u32,
    pub missions_completed: u32,
    pub headshots: u32,
    pub final_hp: u8,
    pub inventory: Inventory,
}

impl RunSummary {
    /// Summarise a run. `None` until a role has been chosen.
    #[must_use]
    pub fn from_run(run: &RunHandle) -> Option<Self> {
        let player = run.player()?;
        let ending = run.ending();
        let status = match ending {
            None if player.alive => RunStatus::Active,
            Some(ending) if ending.survived() => RunStatus::Survived,
            Some(Ending::Captured) => RunStatus::Captured,
            _ => RunStatus::Deceased,
        };
        let (headline, epilogue) = ending.map_or_else(
            || ("Run In Progress".to_string(), String::new()),
            |ending| (ending.headline().to_string(), ending.epilogue().to_string()),
        );
        let headshots = run
            .history()
            .iter()
            .filter(|resolution| resolution.headshot)
            .count();
        Some(Self {
            role: player.role,
            callsign: run.callsign(),
            seed: run.seed(),
            phase: run.phase(),
            status,
            ending,
            headline,
            epilogue,
            missions_attempted: player.missions_attempted,
            missions_completed: player.missions_completed,
            headshots: u32::try_from(headshots).unwrap_or(u32::MAX),
            final_hp: player.hp,
            inventory: player.inventory.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunConfig;
    use crate::runner::start_run;

    #[test]
    fn summary_waits_for_a_role() {
        let run = RunHandle::new(1, RunConfig::default()).unwrap();
        assert!(run.summary().is_none());
    }

    #[test]
    fn fresh_runs_are_active() {
        let run = start_run("medic", 42).unwrap();
        let summary = run.summary().unwrap();
        assert_eq!(summary.status, RunStatus::Active);
        assert_eq!(summary.role, RoleId::Medic);
        assert_eq!(summary.final_hp, 3);
        assert_eq!(summary.callsign, run.callsign());
        assert!(summary.ending.is_none());
        assert_eq!(RunStatus::Deceased.to_string(), "DECEASED");
    }
}
