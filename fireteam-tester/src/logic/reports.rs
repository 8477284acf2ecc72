use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use std::io::Write;
use std::time::Duration;

use super::playability::{MissionBreakdown, PlayabilityAggregate, mission_breakdown};
use super::simulation::RunRecord;

const CSV_HEADER: &str = "role,strategy,seed,callsign,ending,missions_attempted,missions_completed,final_hp,encounters,headshots,combat_turns,damage_dealt,items_used,rejected_decisions,draws";

#[derive(Serialize)]
struct JsonReport<'a> {
    runs: &'a [RunRecord],
    aggregates: &'a [PlayabilityAggregate],
    missions: Vec<MissionBreakdown>,
}

fn pct(value: f64) -> String {
    format!("{:.1}%", value * 100.0)
}

pub fn generate_console_report(
    out: &mut dyn Write,
    records: &[RunRecord],
    aggregates: &[PlayabilityAggregate],
    total_duration: Duration,
) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "📊 Fireteam Simulation Summary".bright_cyan().bold())?;
    writeln!(out, "{}", "==============================".cyan())?;

    let total_runs = records.len();
    let survivors = records.iter().filter(|r| r.ending.survived()).count();
    writeln!(out, "Total runs: {total_runs}")?;
    writeln!(out, "Survived: {}", survivors.to_string().green())?;
    writeln!(out, "Lost: {}", (total_runs - survivors).to_string().red())?;
    writeln!(
        out,
        "Average per run: {:?}",
        total_duration / u32::try_from(total_runs.max(1)).unwrap_or(u32::MAX)
    )?;
    writeln!(out)?;

    for agg in aggregates {
        writeln!(out, "{}", agg.scenario_name.bold())?;
        writeln!(
            out,
            "   Runs: {} | missions completed {:.2} ± {:.2} | final hp {:.2}",
            agg.iterations,
            agg.mean_missions_completed,
            agg.std_missions_completed,
            agg.mean_final_hp
        )?;
        writeln!(
            out,
            "   Endings: full {} | wounded {} | captured {} | KIA {}",
            pct(agg.full_survival_pct).green(),
            pct(agg.wounded_pct).yellow(),
            pct(agg.captured_pct).magenta(),
            pct(agg.kia_pct).red()
        )?;
        writeln!(
            out,
            "   Combat: {:.1} turns/run | {:.1} damage/run | {:.1} items/run | headshots {}",
            agg.mean_combat_turns,
            agg.mean_damage_dealt,
            agg.mean_items_used,
            pct(agg.headshot_rate)
        )?;
        writeln!(out)?;
    }

    writeln!(out, "{}", "🗺  By Mission".bright_blue().bold())?;
    for bucket in mission_breakdown(records) {
        writeln!(
            out,
            "   {:<20} {:>5} deployed | won {} | lost {} | retreated {}",
            bucket.mission.to_string(),
            bucket.deployments,
            pct(bucket.win_rate()).green(),
            bucket.lost,
            bucket.retreated
        )?;
    }
    writeln!(out)?;

    if let (Some(best), Some(worst)) = (
        aggregates
            .iter()
            .max_by(|a, b| a.survival_rate.total_cmp(&b.survival_rate)),
        aggregates
            .iter()
            .min_by(|a, b| a.survival_rate.total_cmp(&b.survival_rate)),
    ) {
        writeln!(out, "{}", "🎖  Survival Summary".bright_yellow().bold())?;
        writeln!(out, "{}", "===================".yellow())?;
        writeln!(
            out,
            "Best: {} ({})",
            best.scenario_name.green(),
            pct(best.survival_rate)
        )?;
        writeln!(
            out,
            "Worst: {} ({})",
            worst.scenario_name.yellow(),
            pct(worst.survival_rate)
        )?;
    }
    Ok(())
}

pub fn generate_json_report(
    out: &mut dyn Write,
    records: &[RunRecord],
    aggregates: &[PlayabilityAggregate],
) -> Result<()> {
    let report = JsonReport {
        runs: records,
        aggregates,
        missions: mission_breakdown(records),
    };
    serde_json::to_writer_pretty(&mut *out, &report)?;
    writeln!(out)?;
    Ok(())
}

pub fn generate_markdown_report(
    out: &mut dyn Write,
    records: &[RunRecord],
    aggregates: &[PlayabilityAggregate],
) -> Result<()> {
    writeln!(out, "# Fireteam Simulation Results\n")?;

    let total_runs = records.len();
    let survivors = records.iter().filter(|r| r.ending.survived()).count();
    writeln!(out, "## Summary\n")?;
    writeln!(out, "- **Total runs**: {total_runs}")?;
    writeln!(out, "- **Survived**: {survivors}")?;
    writeln!(out, "- **Lost**: {}\n", total_runs - survivors)?;

    writeln!(out, "## By Role and Strategy\n")?;
    writeln!(
        out,
        "| Scenario | Runs | Missions | Full | Wounded | Captured | KIA | Headshots |"
    )?;
    writeln!(out, "|---|---|---|---|---|---|---|---|")?;
    for agg in aggregates {
        writeln!(
            out,
            "| {} | {} | {:.2} | {} | {} | {} | {} | {} |",
            agg.scenario_name,
            agg.iterations,
            agg.mean_missions_completed,
            pct(agg.full_survival_pct),
            pct(agg.wounded_pct),
            pct(agg.captured_pct),
            pct(agg.kia_pct),
            pct(agg.headshot_rate)
        )?;
    }

    writeln!(out, "\n## By Mission\n")?;
    writeln!(out, "| Mission | Deployed | Won | Lost | Retreated |")?;
    writeln!(out, "|---|---|---|---|---|")?;
    for bucket in mission_breakdown(records) {
        writeln!(
            out,
            "| {} | {} | {} | {} | {} |",
            bucket.mission, bucket.deployments, bucket.won, bucket.lost, bucket.retreated
        )?;
    }
    Ok(())
}

pub fn generate_csv_report(out: &mut dyn Write, records: &[RunRecord]) -> Result<()> {
    writeln!(out, "{CSV_HEADER}")?;
    for r in records {
        writeln!(
            out,
            "{},{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
            r.role.key(),
            r.strategy,
            r.seed,
            r.callsign,
            r.ending,
            r.missions_attempted,
            r.missions_completed,
            r.final_hp,
            r.encounters,
            r.headshots,
            r.combat_turns,
            r.damage_dealt,
            r.items_used,
            r.rejected_decisions,
            r.draws
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::playability::aggregate_playability;
    use crate::logic::policy::GameplayStrategy;
    use crate::logic::simulation::Sortie;
    use fireteam_game::{EncounterOutcome, Ending, MissionId, RoleId};

    fn record(role: RoleId, ending: Ending, final_hp: u8) -> RunRecord {
        RunRecord {
            role,
            strategy: GameplayStrategy::Aggressive,
            seed: 42,
            callsign: "FT-VIPER42".to_string(),
            ending,
            missions_attempted: 3,
            missions_completed: 2,
            final_hp,
            encounters: 3,
            headshots: 1,
            combat_turns: 7,
            damage_dealt: 5,
            items_used: 0,
            rejected_decisions: 0,
            draws: 30,
            sorties: vec![
                Sortie {
                    mission: MissionId::VillageCheckpoint,
                    outcome: EncounterOutcome::Won,
                },
                Sortie {
                    mission: MissionId::NightRaid,
                    outcome: EncounterOutcome::Retreated,
                },
                Sortie {
                    mission: MissionId::NightRaid,
                    outcome: EncounterOutcome::Won,
                },
            ],
            trace: Vec::new(),
        }
    }

    fn sample() -> (Vec<RunRecord>, Vec<PlayabilityAggregate>) {
        let records = vec![
            record(RoleId::Sniper, Ending::WoundedExtraction, 2),
            record(RoleId::Medic, Ending::KilledInAction, 0),
        ];
        let aggregates = aggregate_playability(&records);
        (records, aggregates)
    }

    fn render(f: impl FnOnce(&mut dyn Write) -> Result<()>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn csv_has_header_and_one_line_per_run() {
        let (records, _) = sample();
        let text = render(|out| generate_csv_report(out, &records));
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], CSV_HEADER);
        assert_eq!(
            lines[1],
            "sniper,Aggressive,42,FT-VIPER42,wounded_extraction,3,2,2,3,1,7,5,0,0,30"
        );
    }

    #[test]
    fn json_report_round_trips_through_serde_json() {
        let (records, aggregates) = sample();
        let text = render(|out| generate_json_report(out, &records, &aggregates));
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["runs"].as_array().unwrap().len(), 2);
        assert_eq!(value["runs"][1]["ending"], "killed_in_action");
        assert_eq!(value["aggregates"].as_array().unwrap().len(), 2);
        assert_eq!(value["runs"][0]["damage_dealt"], 5);
        let missions = value["missions"].as_array().unwrap();
        assert_eq!(missions.len(), MissionId::ALL.len());
        assert_eq!(missions[0]["mission"], "village_checkpoint");
        assert_eq!(missions[0]["deployments"], 2);
    }

    #[test]
    fn markdown_lists_every_aggregate() {
        let (records, aggregates) = sample();
        let text = render(|out| generate_markdown_report(out, &records, &aggregates));
        assert!(text.starts_with("# Fireteam Simulation Results"));
        assert!(text.contains("- **Survived**: 1"));
        assert!(text.contains("| Sniper - Aggressive | 1 |"));
        assert!(text.contains("| Medic - Aggressive | 1 |"));
        assert!(text.contains("| Night Raid | 4 | 2 | 0 | 2 |"));
        assert!(text.contains("| Mountain Pass | 0 | 0 | 0 | 0 |"));
    }

    #[test]
    fn console_report_names_best_and_worst() {
        colored::control::set_override(false);
        let (records, aggregates) = sample();
        let text = render(|out| {
            generate_console_report(out, &records, &aggregates, Duration::from_millis(5))
        });
        assert!(text.contains("Total runs: 2"));
        assert!(text.contains("Best: Sniper - Aggressive (100.0%)"));
        assert!(text.contains("Worst: Medic - Aggressive (0.0%)"));
        assert!(text.contains("5.0 damage/run"));
        assert!(text.contains("By Mission"));
    }
}
