mod logic;
mod play;
mod util;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use fireteam_game::{RoleId, RunConfig};
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::{Path, PathBuf};
use std::time::Instant;

use logic::{
    GameplayStrategy, PlayabilityAggregate, RunRecord, aggregate_playability,
    resolve_seed_inputs, run_playability_analysis, validate_playability_targets,
};
use util::split_csv;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RunMode {
    /// Policy-driven playthroughs with aggregate reports
    Simulate,
    /// Interactive play over stdin
    Play,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Console,
    Json,
    Markdown,
    Csv,
}

#[derive(Debug, Parser)]
#[command(name = "fireteam-tester", version)]
#[command(about = "Seeded simulation, reporting, and interactive play for the Fireteam engine")]
struct Args {
    /// Simulate automated runs or play interactively
    #[arg(long, value_enum, default_value_t = RunMode::Simulate)]
    mode: RunMode,

    /// Roles to simulate (comma-separated, or `all`)
    #[arg(long, default_value = "all")]
    roles: String,

    /// Policies to simulate (aggressive,cautious,balanced,random, or `all`)
    #[arg(long, default_value = "all")]
    policies: String,

    /// Seeds to run (comma-separated numbers or callsigns, or `all`)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Runs per seed, role and policy
    #[arg(long, default_value_t = 10)]
    iterations: usize,

    /// Missions to complete before extraction
    #[arg(long, default_value_t = RunConfig::default_mission_quota())]
    quota: u32,

    /// Run extended acceptance sweeps (forces ≥100 iterations)
    #[arg(long)]
    acceptance: bool,

    /// Output report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Console)]
    report: ReportFormat,

    /// Print every run's event trace
    #[arg(short, long)]
    verbose: bool,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if args.mode == RunMode::Play {
        return run_play(&args);
    }

    announce_banner();

    let iterations = compute_iterations(&args);
    let start_time = Instant::now();
    let roles = parse_roles(&args.roles)?;
    let strategies = parse_strategies(&args.policies)?;
    let seed_infos = resolve_seed_inputs(&split_csv(&args.seeds))?;

    let records = run_playability_analysis(
        &seed_infos,
        &roles,
        &strategies,
        iterations,
        args.quota,
        args.verbose,
    )?;
    if args.verbose {
        print_traces(&records)?;
    }
    let aggregates = aggregate_playability(&records);

    write_reports(&args, &records, &aggregates, start_time)?;
    validate_playability_targets(&aggregates, &records)?;

    Ok(())
}

fn announce_banner() {
    println!("{}", "🎖  Fireteam Automated Tester".bright_cyan().bold());
    println!("{}", "================================".cyan());
}

fn run_play(args: &Args) -> Result<()> {
    let seed_infos = resolve_seed_inputs(&split_csv(&args.seeds))?;
    let seed = seed_infos.first().map_or(1337, |info| info.seed);
    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    let mut output = stdout().lock();
    play::play_interactive(&mut input, &mut output, seed, RunConfig::with_quota(args.quota))?;
    Ok(())
}

fn compute_iterations(args: &Args) -> usize {
    if args.acceptance {
        if args.iterations < 100 {
            println!(
                "🔁 Acceptance mode enabled: increasing iterations from {} to 100",
                args.iterations
            );
        } else {
            println!(
                "🔁 Acceptance mode enabled: using {} iterations",
                args.iterations
            );
        }
        args.iterations.max(100)
    } else {
        args.iterations
    }
}

fn parse_roles(arg: &str) -> Result<Vec<RoleId>> {
    let tokens = split_csv(arg);
    if tokens.is_empty() || tokens.iter().any(|t| t.eq_ignore_ascii_case("all")) {
        return Ok(RoleId::ALL.to_vec());
    }
    tokens
        .iter()
        .map(|token| {
            token
                .parse::<RoleId>()
                .with_context(|| format!("invalid --roles entry '{token}'"))
        })
        .collect()
}

fn parse_strategies(arg: &str) -> Result<Vec<GameplayStrategy>> {
    let tokens = split_csv(arg);
    if tokens.is_empty() || tokens.iter().any(|t| t.eq_ignore_ascii_case("all")) {
        return Ok(GameplayStrategy::ALL.to_vec());
    }
    tokens.iter().map(|token| token.parse()).collect()
}

fn print_traces(records: &[RunRecord]) -> Result<()> {
    let mut out = stdout().lock();
    for record in records {
        writeln!(
            out,
            "{} {} {}: {}",
            record.callsign.bold(),
            record.role,
            record.strategy,
            record.ending
        )?;
        for event in &record.trace {
            writeln!(out, "  {}", serde_json::to_string(event)?)?;
        }
    }
    Ok(())
}

fn write_reports(
    args: &Args,
    records: &[RunRecord],
    aggregates: &[PlayabilityAggregate],
    start_time: Instant,
) -> Result<()> {
    ReportSink::open(args.report, args.output.as_deref())?.render(records, aggregates, start_time)
}

/// A report format bound to its destination, stdout or a file.
struct ReportSink {
    format: ReportFormat,
    writer: BufWriter<Box<dyn Write>>,
}

impl ReportSink {
    fn open(format: ReportFormat, path: Option<&Path>) -> Result<Self> {
        let inner: Box<dyn Write> = match path {
            Some(path) => Box::new(
                File::create(path)
                    .with_context(|| format!("failed to create {}", path.display()))?,
            ),
            None => Box::new(stdout()),
        };
        Ok(Self {
            format,
            writer: BufWriter::new(inner),
        })
    }

    fn render(
        mut self,
        records: &[RunRecord],
        aggregates: &[PlayabilityAggregate],
        start_time: Instant,
    ) -> Result<()> {
        let out: &mut dyn Write = &mut self.writer;
        match self.format {
            ReportFormat::Json => logic::reports::generate_json_report(out, records, aggregates)?,
            ReportFormat::Markdown => {
                logic::reports::generate_markdown_report(out, records, aggregates)?;
            }
            ReportFormat::Csv => logic::reports::generate_csv_report(out, records)?,
            ReportFormat::Console => {
                let duration = start_time.elapsed();
                if records.is_empty() {
                    writeln!(out, "No runs executed.")?;
                } else {
                    logic::reports::generate_console_report(out, records, aggregates, duration)?;
                }
                writeln!(out)?;
                writeln!(out, "🏁 Total time: {duration:?}")?;
            }
        }
        out.flush().context("failed to flush report output")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::seeds::SeedInfo;

    fn base_args() -> Args {
        Args {
            mode: RunMode::Simulate,
            roles: "all".to_string(),
            policies: "all".to_string(),
            seeds: "1337".to_string(),
            iterations: 1,
            quota: 3,
            acceptance: false,
            report: ReportFormat::Json,
            verbose: false,
            output: None,
        }
    }

    fn temp_path(label: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "fireteam-main-{label}-{}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        ))
    }

    #[test]
    fn acceptance_forces_minimum_iterations() {
        let mut args = base_args();
        assert_eq!(compute_iterations(&args), 1);
        args.acceptance = true;
        assert_eq!(compute_iterations(&args), 100);
        args.iterations = 250;
        assert_eq!(compute_iterations(&args), 250);
    }

    #[test]
    fn parses_role_and_policy_lists() {
        assert_eq!(parse_roles("all").unwrap(), RoleId::ALL.to_vec());
        assert_eq!(
            parse_roles("medic, 2").unwrap(),
            vec![RoleId::Medic, RoleId::Sniper]
        );
        assert!(parse_roles("pilot").is_err());
        assert_eq!(
            parse_strategies("Random,cautious").unwrap(),
            vec![GameplayStrategy::Random, GameplayStrategy::Cautious]
        );
        assert_eq!(parse_strategies("").unwrap().len(), 4);
        assert!(parse_strategies("reckless").is_err());
    }

    #[test]
    fn writes_every_report_format_to_file() {
        let records = run_playability_analysis(
            &[SeedInfo::from_numeric(7)],
            &[RoleId::Soldier],
            &[GameplayStrategy::Balanced],
            2,
            3,
            false,
        )
        .unwrap();
        let aggregates = aggregate_playability(&records);
        for (format, marker) in [
            (ReportFormat::Json, "\"aggregates\""),
            (ReportFormat::Markdown, "## By Mission"),
            (ReportFormat::Csv, "role,strategy,seed"),
            (ReportFormat::Console, "Total time"),
        ] {
            let path = temp_path(&format!("{format:?}"));
            let mut args = base_args();
            args.report = format;
            args.output = Some(path.clone());
            write_reports(&args, &records, &aggregates, Instant::now()).unwrap();
            let content = std::fs::read_to_string(&path).unwrap();
            assert!(content.contains(marker), "{format:?} report missing {marker}");
            let _ = std::fs::remove_file(path);
        }
    }
}
