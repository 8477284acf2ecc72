use anyhow::{Context, Result, ensure};
use fireteam_game::constants::{HEADSHOT_PCT, MAX_HP};
use fireteam_game::{EncounterOutcome, Ending, MissionId, RoleId};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

use crate::logic::policy::GameplayStrategy;
use crate::logic::seeds::SeedInfo;
use crate::logic::simulation::{RunRecord, SimulationConfig, run_simulation};

/// Allowed drift between the observed and configured headshot rate.
pub const HEADSHOT_TOLERANCE: f64 = 0.025;
/// Encounters required before the headshot rate is worth checking.
pub const MIN_HEADSHOT_SAMPLE: u32 = 2_000;

#[derive(Debug, Clone, Serialize)]
pub struct PlayabilityAggregate {
    pub scenario_name: String,
    pub role: RoleId,
    pub strategy: GameplayStrategy,
    pub iterations: usize,
    pub mean_missions_completed: f64,
    pub std_missions_completed: f64,
    pub mean_final_hp: f64,
    pub mean_combat_turns: f64,
    pub mean_damage_dealt: f64,
    pub mean_items_used: f64,
    pub survival_rate: f64,
    pub full_survival_pct: f64,
    pub wounded_pct: f64,
    pub captured_pct: f64,
    pub kia_pct: f64,
    pub headshot_rate: f64,
}

/// Deployment outcomes for one mission across every run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissionBreakdown {
    pub mission: MissionId,
    pub deployments: u32,
    pub won: u32,
    pub lost: u32,
    pub retreated: u32,
}

impl MissionBreakdown {
    #[must_use]
    pub fn win_rate(&self) -> f64 {
        if self.deployments == 0 {
            0.0
        } else {
            f64::from(self.won) / f64::from(self.deployments)
        }
    }
}

/// Play every role/strategy pairing against every seed.
///
/// Iteration `n` of a seed plays `seed + n`, so a single seed still produces
/// a spread of runs. With `keep_trace` each record carries its event log.
pub fn run_playability_analysis(
    seeds: &[SeedInfo],
    roles: &[RoleId],
    strategies: &[GameplayStrategy],
    iterations: usize,
    mission_quota: u32,
    keep_trace: bool,
) -> Result<Vec<RunRecord>> {
    let iterations = iterations.max(1);
    let mut records =
        Vec::with_capacity(seeds.len() * roles.len() * strategies.len() * iterations);

    for &role in roles {
        for &strategy in strategies {
            for seed in seeds {
                for iteration in 0..iterations {
                    let iteration_offset = u64::try_from(iteration).unwrap_or(0);
                    let iteration_seed = seed.seed.wrapping_add(iteration_offset);
                    let config = SimulationConfig::new(role, strategy, iteration_seed)
                        .with_quota(mission_quota);
                    let record = run_simulation(config, keep_trace).with_context(|| {
                        format!(
                            "simulation failed for {role} / {strategy}, seed {} (iteration {})",
                            seed.callsign(),
                            iteration + 1
                        )
                    })?;
                    records.push(record);
                }
            }
        }
    }

    Ok(records)
}

pub fn aggregate_playability(records: &[RunRecord]) -> Vec<PlayabilityAggregate> {
    let mut aggregates: BTreeMap<(RoleId, GameplayStrategy), AggregateBuilder> = BTreeMap::new();

    for record in records {
        aggregates
            .entry((record.role, record.strategy))
            .or_insert_with(|| AggregateBuilder::new(record))
            .ingest(record);
    }

    aggregates
        .into_values()
        .map(AggregateBuilder::finish)
        .collect()
}

/// One bucket per mission, in catalog order, including never-drawn missions.
pub fn mission_breakdown(records: &[RunRecord]) -> Vec<MissionBreakdown> {
    MissionId::ALL
        .into_iter()
        .map(|mission| {
            let mut bucket = MissionBreakdown {
                mission,
                deployments: 0,
                won: 0,
                lost: 0,
                retreated: 0,
            };
            for sortie in records
                .iter()
                .flat_map(|record| &record.sorties)
                .filter(|sortie| sortie.mission == mission)
            {
                bucket.deployments += 1;
                match sortie.outcome {
                    EncounterOutcome::Won => bucket.won += 1,
                    EncounterOutcome::Lost => bucket.lost += 1,
                    EncounterOutcome::Retreated => bucket.retreated += 1,
                }
            }
            bucket
        })
        .collect()
}

/// Check structural invariants on every record and aggregate and, given
/// enough encounters, that observed headshots track the configured rate.
pub fn validate_playability_targets(
    aggregates: &[PlayabilityAggregate],
    records: &[RunRecord],
) -> Result<()> {
    validate_record_invariants(records)?;
    validate_aggregates(aggregates, records)?;
    validate_determinism(records)?;
    validate_headshot_rate(records)?;
    Ok(())
}

fn validate_aggregates(aggregates: &[PlayabilityAggregate], records: &[RunRecord]) -> Result<()> {
    let covered: usize = aggregates.iter().map(|agg| agg.iterations).sum();
    ensure!(
        covered == records.len(),
        "aggregates cover {covered} runs but {} were recorded",
        records.len()
    );
    for agg in aggregates {
        let endings = agg.full_survival_pct + agg.wounded_pct + agg.captured_pct + agg.kia_pct;
        ensure!(
            (endings - 1.0).abs() < 1e-9,
            "{} ending shares sum to {endings:.4}",
            agg.scenario_name
        );
        ensure!(
            agg.mean_missions_completed >= 0.0
                && agg.mean_final_hp <= f64::from(MAX_HP)
                && (0.0..=1.0).contains(&agg.survival_rate),
            "{} has out-of-range statistics",
            agg.scenario_name
        );
    }
    Ok(())
}

fn validate_record_invariants(records: &[RunRecord]) -> Result<()> {
    for record in records {
        ensure!(
            record.final_hp <= MAX_HP,
            "{} {} ended with {} hp",
            record.callsign,
            record.role,
            record.final_hp
        );
        ensure!(
            record.missions_completed <= record.missions_attempted,
            "{} {} completed more missions than it attempted",
            record.callsign,
            record.role
        );
        ensure!(
            record.headshots <= record.encounters,
            "{} {} counted more headshots than encounters",
            record.callsign,
            record.role
        );
        let dead = record.final_hp == 0;
        ensure!(
            dead == (record.ending == Ending::KilledInAction),
            "{} {} ended {} with {} hp",
            record.callsign,
            record.role,
            record.ending,
            record.final_hp
        );
    }
    Ok(())
}

fn validate_determinism(records: &[RunRecord]) -> Result<()> {
    let mut outcomes: BTreeMap<(RoleId, GameplayStrategy, u64), HashSet<(Ending, u64)>> =
        BTreeMap::new();
    for record in records {
        outcomes
            .entry((record.role, record.strategy, record.seed))
            .or_default()
            .insert((record.ending, record.draws));
    }
    for ((role, strategy, seed), seen) in outcomes {
        ensure!(
            seen.len() <= 1,
            "{role} / {strategy} seed {seed} produced mixed outcomes {seen:?}"
        );
    }
    Ok(())
}

fn validate_headshot_rate(records: &[RunRecord]) -> Result<()> {
    // Engineers skip the headshot roll whenever a trap is disarmed.
    let (encounters, headshots) = records
        .iter()
        .filter(|record| record.role != RoleId::Engineer)
        .fold((0_u32, 0_u32), |(encounters, headshots), record| {
            (
                encounters.saturating_add(record.encounters),
                headshots.saturating_add(record.headshots),
            )
        });
    if encounters < MIN_HEADSHOT_SAMPLE {
        log::info!("skipping headshot rate check: only {encounters} encounters sampled");
        return Ok(());
    }
    let observed = f64::from(headshots) / f64::from(encounters);
    let expected = f64::from(HEADSHOT_PCT) / 100.0;
    ensure!(
        (observed - expected).abs() <= HEADSHOT_TOLERANCE,
        "headshot rate {observed:.4} drifted from {expected:.2} over {encounters} encounters"
    );
    Ok(())
}

#[derive(Debug, Clone)]
struct AggregateBuilder {
    role: RoleId,
    strategy: GameplayStrategy,
    stats_completed: RunningStats,
    iterations: u32,
    final_hp_sum: u32,
    combat_turn_sum: u32,
    damage_dealt_sum: u32,
    items_used_sum: u32,
    endings: BTreeMap<&'static str, u32>,
    encounters: u32,
    headshots: u32,
}

impl AggregateBuilder {
    fn new(record: &RunRecord) -> Self {
        Self {
            role: record.role,
            strategy: record.strategy,
            stats_completed: RunningStats::default(),
            iterations: 0,
            final_hp_sum: 0,
            combat_turn_sum: 0,
            damage_dealt_sum: 0,
            items_used_sum: 0,
            endings: BTreeMap::new(),
            encounters: 0,
            headshots: 0,
        }
    }

    fn ingest(&mut self, record: &RunRecord) {
        self.iterations += 1;
        self.stats_completed.add(f64::from(record.missions_completed));
        self.final_hp_sum += u32::from(record.final_hp);
        self.combat_turn_sum = self.combat_turn_sum.saturating_add(record.combat_turns);
        self.damage_dealt_sum = self.damage_dealt_sum.saturating_add(record.damage_dealt);
        self.items_used_sum = self.items_used_sum.saturating_add(record.items_used);
        *self.endings.entry(record.ending.key()).or_insert(0) += 1;
        self.encounters = self.encounters.saturating_add(record.encounters);
        self.headshots = self.headshots.saturating_add(record.headshots);
    }

    fn ending_pct(&self, ending: Ending, denom: f64) -> f64 {
        f64::from(self.endings.get(ending.key()).copied().unwrap_or(0)) / denom
    }

    fn finish(self) -> PlayabilityAggregate {
        let iterations = usize::try_from(self.iterations).unwrap_or(usize::MAX);
        let denom = f64::from(self.iterations.max(1));
        let kia_pct = self.ending_pct(Ending::KilledInAction, denom);
        let captured_pct = self.ending_pct(Ending::Captured, denom);
        PlayabilityAggregate {
            scenario_name: format!("{} - {}", self.role, self.strategy),
            role: self.role,
            strategy: self.strategy,
            iterations,
            mean_missions_completed: self.stats_completed.mean(),
            std_missions_completed: self.stats_completed.std_dev(),
            mean_final_hp: f64::from(self.final_hp_sum) / denom,
            mean_combat_turns: f64::from(self.combat_turn_sum) / denom,
            mean_damage_dealt: f64::from(self.damage_dealt_sum) / denom,
            mean_items_used: f64::from(self.items_used_sum) / denom,
            survival_rate: 1.0 - kia_pct - captured_pct,
            full_survival_pct: self.ending_pct(Ending::FullSurvival, denom),
            wounded_pct: self.ending_pct(Ending::WoundedExtraction, denom),
            captured_pct,
            kia_pct,
            headshot_rate: if self.encounters == 0 {
                0.0
            } else {
                f64::from(self.headshots) / f64::from(self.encounters)
            },
        }
    }
}

#[derive(Debug, Default, Clone)]
struct RunningStats {
    count: u32,
    mean: f64,
    m2: f64,
}

impl RunningStats {
    fn add(&mut self, value: f64) {
        self.count += 1;
        let count = f64::from(self.count);
        let delta = value - self.mean;
        self.mean += delta / count;
        let delta2 = value - self.mean;
        self.m2 += delta * delta2;
    }

    const fn mean(&self) -> f64 {
        if self.count == 0 { 0.0 } else { self.mean }
    }

    fn std_dev(&self) -> f64 {
        if self.count > 1 {
            (self.m2 / f64::from(self.count - 1)).sqrt()
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeds(values: &[u64]) -> Vec<SeedInfo> {
        values.iter().copied().map(SeedInfo::from_numeric).collect()
    }

    fn sample_record(ending: Ending, final_hp: u8) -> RunRecord {
        RunRecord {
            role: RoleId::Soldier,
            strategy: GameplayStrategy::Balanced,
            seed: 7,
            callsign: "FT-ALPHA07".to_string(),
            ending,
            missions_attempted: 3,
            missions_completed: 3,
            final_hp,
            encounters: 3,
            headshots: 0,
            combat_turns: 6,
            damage_dealt: 4,
            items_used: 1,
            rejected_decisions: 0,
            draws: 40,
            sorties: Vec::new(),
            trace: Vec::new(),
        }
    }

    #[test]
    fn generates_records_for_every_pairing() {
        let records = run_playability_analysis(
            &seeds(&[1337]),
            &RoleId::ALL,
            &GameplayStrategy::ALL,
            2,
            3,
            false,
        )
        .unwrap();
        assert_eq!(
            records.len(),
            RoleId::ALL.len() * GameplayStrategy::ALL.len() * 2
        );
        let aggregates = aggregate_playability(&records);
        assert_eq!(
            aggregates.len(),
            RoleId::ALL.len() * GameplayStrategy::ALL.len()
        );
        assert!(aggregates.iter().all(|agg| agg.iterations == 2));
        assert!(validate_playability_targets(&aggregates, &records).is_ok());
    }

    #[test]
    fn aggregate_percentages_sum_to_one() {
        let records = run_playability_analysis(
            &seeds(&[5, 500]),
            &[RoleId::Medic],
            &[GameplayStrategy::Cautious],
            10,
            3,
            false,
        )
        .unwrap();
        let aggregates = aggregate_playability(&records);
        assert_eq!(aggregates.len(), 1);
        let agg = &aggregates[0];
        let total = agg.full_survival_pct + agg.wounded_pct + agg.captured_pct + agg.kia_pct;
        assert!((total - 1.0).abs() < 1e-9);
        assert!((agg.survival_rate - agg.full_survival_pct - agg.wounded_pct).abs() < 1e-9);
        assert_eq!(agg.scenario_name, "Medic - Cautious");
    }

    #[test]
    fn running_stats_tracks_mean_and_spread() {
        let mut stats = RunningStats::default();
        for value in [1.0, 2.0, 3.0] {
            stats.add(value);
        }
        assert!((stats.mean() - 2.0).abs() < 1e-9);
        assert!((stats.std_dev() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn rejects_living_kia_record() {
        let records = vec![sample_record(Ending::KilledInAction, 2)];
        let err = validate_playability_targets(&[], &records).unwrap_err();
        assert!(err.to_string().contains("ended killed_in_action with 2 hp"));
    }

    #[test]
    fn rejects_aggregates_that_miss_runs() {
        let records = vec![
            sample_record(Ending::FullSurvival, 3),
            sample_record(Ending::WoundedExtraction, 2),
        ];
        let aggregates = aggregate_playability(&records[..1]);
        let err = validate_playability_targets(&aggregates, &records).unwrap_err();
        assert!(err.to_string().contains("aggregates cover 1 runs but 2"));

        let mut skewed = aggregate_playability(&records);
        skewed[0].kia_pct = 0.5;
        let err = validate_aggregates(&skewed, &records).unwrap_err();
        assert!(err.to_string().contains("ending shares"));
    }

    #[test]
    fn mission_breakdown_buckets_every_mission() {
        let records = run_playability_analysis(
            &seeds(&[11]),
            &[RoleId::Soldier],
            &[GameplayStrategy::Balanced],
            20,
            3,
            false,
        )
        .unwrap();
        let breakdown = mission_breakdown(&records);
        assert_eq!(breakdown.len(), MissionId::ALL.len());
        assert_eq!(breakdown[0].mission, MissionId::VillageCheckpoint);
        let deployments: u32 = breakdown.iter().map(|b| b.deployments).sum();
        let attempted: u32 = records.iter().map(|r| r.missions_attempted).sum();
        assert_eq!(deployments, attempted);
        for bucket in &breakdown {
            assert_eq!(bucket.won + bucket.lost + bucket.retreated, bucket.deployments);
            assert!((0.0..=1.0).contains(&bucket.win_rate()));
        }
    }

    #[test]
    fn rejects_mixed_outcomes_for_one_seed() {
        let mut other = sample_record(Ending::Captured, 2);
        other.draws = 41;
        let records = vec![sample_record(Ending::WoundedExtraction, 2), other];
        let err = validate_determinism(&records).unwrap_err();
        assert!(err.to_string().contains("mixed outcomes"));
    }

    #[test]
    fn small_samples_skip_the_headshot_check() {
        let mut record = sample_record(Ending::KilledInAction, 0);
        record.headshots = 3;
        assert!(validate_headshot_rate(&[record]).is_ok());
    }

    #[test]
    fn drifted_headshot_rate_fails() {
        let mut record = sample_record(Ending::KilledInAction, 0);
        record.encounters = MIN_HEADSHOT_SAMPLE;
        record.headshots = MIN_HEADSHOT_SAMPLE / 2;
        let err = validate_headshot_rate(&[record]).unwrap_err();
        assert!(err.to_string().contains("headshot rate"));
    }
}
