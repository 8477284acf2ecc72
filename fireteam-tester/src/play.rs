use anyhow::{Context, Result};
use colored::Colorize;
use fireteam_game::{
    Aim, Decision, EncounterOutcome, EncounterResolution, EnemyFire, ItemEffect, ItemId,
    MissionCatalog, Opening, PlayerAction, PlayerState, RoleCatalog, RoleId, RunConfig, RunEvent,
    RunHandle, RunPhase, RunSummary, Tactic,
};
use std::io::{BufRead, Write};

const COMBAT_MENU: [(&str, Tactic); 6] = [
    ("Shoot left", Tactic::Shoot(Aim::Left)),
    ("Shoot center", Tactic::Shoot(Aim::Center)),
    ("Shoot right", Tactic::Shoot(Aim::Right)),
    ("Take cover", Tactic::TakeCover),
    ("Attempt retreat", Tactic::Retreat),
    ("Use ability", Tactic::UseAbility),
];

/// Numbered-menu session over any line-based input.
///
/// Returns the run summary, or `None` if input closed before a role was
/// chosen.
pub fn play_interactive<R: BufRead, W: Write>(
    input: &mut R,
    out: &mut W,
    seed: u64,
    config: RunConfig,
) -> Result<Option<RunSummary>> {
    let mut handle = RunHandle::new(seed, config).context("invalid run configuration")?;
    writeln!(
        out,
        "Callsign {} | {} missions to extraction",
        handle.callsign().bold(),
        handle.config().mission_quota
    )?;
    let mut session = Session { input, out };

    while !handle.phase().is_terminal() {
        let Some(decision) = session.next_decision(&handle)? else {
            writeln!(session.out, "Input closed; abandoning the run.")?;
            return Ok(handle.summary());
        };
        match handle.advance(decision) {
            Ok(event) => session.describe(&event)?,
            Err(err) if err.is_recoverable() => {
                writeln!(session.out, "{}", err.to_string().yellow())?;
            }
            Err(err) => return Err(err).context("run aborted"),
        }
    }

    let summary = handle.summary();
    if let Some(summary) = &summary {
        session.print_summary(summary)?;
    }
    Ok(summary)
}

struct Session<'a, R, W> {
    input: &'a mut R,
    out: &'a mut W,
}

impl<R: BufRead, W: Write> Session<'_, R, W> {
    /// Prompt and read one trimmed line; `None` at end of input.
    fn read_choice(&mut self, prompt: &str) -> Result<Option<String>> {
        write!(self.out, "{prompt} ")?;
        self.out.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn menu(&mut self, options: &[&str]) -> Result<Option<usize>> {
        for (idx, label) in options.iter().enumerate() {
            writeln!(self.out, "  {}) {label}", idx + 1)?;
        }
        loop {
            let Some(choice) = self.read_choice(">")? else {
                return Ok(None);
            };
            match choice.parse::<usize>() {
                Ok(n) if (1..=options.len()).contains(&n) => return Ok(Some(n - 1)),
                _ => writeln!(self.out, "Unknown choice '{choice}'")?,
            }
        }
    }

    fn next_decision(&mut self, handle: &RunHandle) -> Result<Option<Decision>> {
        let player = handle.player();
        match (handle.phase(), player) {
            (RunPhase::RoleSelect, _) | (_, None) => self.choose_role(),
            (RunPhase::MissionLoop, Some(player)) => {
                writeln!(
                    self.out,
                    "\nMission {} of {} | HP {}",
                    player.missions_attempted + 1,
                    handle.config().mission_quota,
                    player.hp
                )?;
                self.field_menu(player, "Deploy", Decision::Deploy)
            }
            (RunPhase::Extraction, Some(player)) => {
                writeln!(self.out, "\nExtraction point reached | HP {}", player.hp)?;
                self.field_menu(player, "Call for extraction", Decision::Extract)
            }
            (RunPhase::Combat, Some(player)) => self.combat_menu(handle, player),
            (RunPhase::GameOver | RunPhase::Concluded, Some(_)) => Ok(None),
        }
    }

    fn choose_role(&mut self) -> Result<Option<Decision>> {
        writeln!(self.out, "Choose your role:")?;
        for (idx, role) in RoleCatalog::list_roles().iter().enumerate() {
            writeln!(self.out, "  {}) {} - {}", idx + 1, role.name(), role.desc)?;
            writeln!(self.out, "     {}", role.ability.summary().dimmed())?;
        }
        loop {
            let Some(choice) = self.read_choice(">")? else {
                return Ok(None);
            };
            match choice.parse::<RoleId>() {
                Ok(role) => return Ok(Some(Decision::SelectRole(role))),
                Err(err) => writeln!(self.out, "{}", err.to_string().yellow())?,
            }
        }
    }

    /// Menu shared by the mission loop and extraction: act, use an item, or
    /// look at the kit.
    fn field_menu(
        &mut self,
        player: &PlayerState,
        act_label: &str,
        act: Decision,
    ) -> Result<Option<Decision>> {
        loop {
            match self.menu(&[act_label, "Use item", "Status"])? {
                None => return Ok(None),
                Some(0) => return Ok(Some(act)),
                Some(1) => {
                    if let Some(item) = self.choose_item(player)? {
                        return Ok(Some(Decision::UseItem(item)));
                    }
                }
                Some(_) => self.print_status(player)?,
            }
        }
    }

    fn combat_menu(
        &mut self,
        handle: &RunHandle,
        player: &PlayerState,
    ) -> Result<Option<Decision>> {
        if let Some(encounter) = handle.encounter() {
            writeln!(
                self.out,
                "Turn {} | HP {} | enemies {} | hit chance {}%",
                encounter.turn_count() + 1,
                player.hp,
                encounter.enemy_pool,
                encounter.hit_chance(player, Aim::Center)
            )?;
        }
        let mut labels: Vec<&str> = COMBAT_MENU.iter().map(|(label, _)| *label).collect();
        labels.push("Use item");
        loop {
            match self.menu(&labels)? {
                None => return Ok(None),
                Some(idx) if idx < COMBAT_MENU.len() => {
                    return Ok(Some(Decision::Engage(COMBAT_MENU[idx].1)));
                }
                Some(_) => {
                    if let Some(item) = self.choose_item(player)? {
                        return Ok(Some(Decision::Engage(Tactic::UseItem(item))));
                    }
                }
            }
        }
    }

    /// Pick a held item; `None` when the player backs out or holds nothing.
    fn choose_item(&mut self, player: &PlayerState) -> Result<Option<ItemId>> {
        let held: Vec<(ItemId, u32)> = player.inventory.iter().collect();
        if held.is_empty() {
            writeln!(self.out, "Your pack is empty.")?;
            return Ok(None);
        }
        writeln!(self.out, "  0) Back")?;
        for (idx, (item, count)) in held.iter().enumerate() {
            writeln!(self.out, "  {}) {item} x{count}", idx + 1)?;
        }
        let Some(choice) = self.read_choice(">")? else {
            return Ok(None);
        };
        Ok(choice
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|idx| held.get(idx))
            .map(|(item, _)| *item))
    }

    fn print_status(&mut self, player: &PlayerState) -> Result<()> {
        writeln!(
            self.out,
            "{} | HP {} | missions {}/{} completed",
            player.role,
            player.hp,
            player.missions_completed,
            player.missions_attempted
        )?;
        if player.inventory.is_empty() {
            writeln!(self.out, "  (no items)")?;
        }
        for (item, count) in player.inventory.iter() {
            writeln!(self.out, "  {item} x{count}")?;
        }
        if !player.boosts.is_empty() {
            writeln!(self.out, "  boosts ready for the next encounter")?;
        }
        Ok(())
    }

    fn describe(&mut self, event: &RunEvent) -> Result<()> {
        match event {
            RunEvent::RoleAssigned { role, inventory } => {
                let kit: Vec<String> = inventory
                    .iter()
                    .map(|(item, count)| format!("{item} x{count}"))
                    .collect();
                writeln!(self.out, "{} assigned. Kit: {}", role, kit.join(", "))?;
            }
            RunEvent::MissionDrawn {
                mission,
                number,
                opening,
                enemy_pool,
                resolution,
                ..
            } => {
                let mission = MissionCatalog::mission(*mission);
                writeln!(
                    self.out,
                    "{} {}: {}",
                    format!("Mission {number}").bold(),
                    mission.name,
                    mission.briefing
                )?;
                match opening {
                    Opening::Contact => writeln!(self.out, "Contact! {enemy_pool} hostiles.")?,
                    Opening::Disarmed => writeln!(self.out, "{}", "Trap disarmed.".green())?,
                    Opening::Headshot => writeln!(self.out, "{}", "Sniper round!".red())?,
                }
                if let Some(resolution) = resolution {
                    self.describe_resolution(resolution)?;
                }
            }
            RunEvent::CombatTurn { turn, resolution } => {
                let action = match turn.action {
                    PlayerAction::Fired { hit: true, damage }
                    | PlayerAction::ReturnedFire { hit: true, damage } => {
                        format!("Hit for {damage}.")
                    }
                    PlayerAction::Fired { hit: false, .. }
                    | PlayerAction::ReturnedFire { hit: false, .. } => "Missed.".to_string(),
                    PlayerAction::Healed { amount } => format!("Patched up {amount} hp."),
                    PlayerAction::KillShot => "Kill shot! The area is clear.".to_string(),
                    PlayerAction::RetreatAttempt { escaped: true } => "You slip away.".to_string(),
                    PlayerAction::RetreatAttempt { escaped: false } => {
                        "Retreat cut off.".to_string()
                    }
                    PlayerAction::UsedItem { item, effect } => describe_effect(item, effect),
                    PlayerAction::Hesitated => "Nothing left to call on.".to_string(),
                };
                let enemy = match turn.enemy {
                    EnemyFire::Silent => "",
                    EnemyFire::Missed => " Enemy fire goes wide.",
                    EnemyFire::Dodged => " You dodge the return fire.",
                    EnemyFire::Hit => " You're hit!",
                };
                writeln!(self.out, "{action}{enemy}")?;
                if let Some(resolution) = resolution {
                    self.describe_resolution(resolution)?;
                }
            }
            RunEvent::ItemUsed { item, effect } => {
                writeln!(self.out, "{}", describe_effect(*item, *effect))?;
            }
            RunEvent::EndingReached {
                survival_chance, ..
            } => {
                writeln!(self.out, "Extraction odds: {survival_chance}%")?;
            }
        }
        Ok(())
    }

    fn describe_resolution(&mut self, resolution: &EncounterResolution) -> Result<()> {
        let verdict = match resolution.outcome {
            EncounterOutcome::Won => "Mission complete.".green(),
            EncounterOutcome::Retreated => "Withdrew from the mission.".yellow(),
            EncounterOutcome::Lost => "Mission failed.".red(),
        };
        writeln!(self.out, "{verdict}")?;
        if !resolution.loot.is_empty() {
            let names: Vec<&str> = resolution.loot.iter().map(|item| item.name()).collect();
            writeln!(self.out, "Found: {}", names.join(", "))?;
        }
        if resolution.rest_heal > 0 {
            writeln!(self.out, "Rest restores {} hp.", resolution.rest_heal)?;
        }
        Ok(())
    }

    fn print_summary(&mut self, summary: &RunSummary) -> Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "{}", summary.headline.bright_cyan().bold())?;
        writeln!(self.out, "{}", summary.epilogue)?;
        writeln!(
            self.out,
            "{} | {} | missions {}/{} | HP {} | {}",
            summary.callsign,
            summary.role,
            summary.missions_completed,
            summary.missions_attempted,
            summary.final_hp,
            summary.status
        )?;
        Ok(())
    }
}

fn describe_effect(item: ItemId, effect: ItemEffect) -> String {
    match effect {
        ItemEffect::Healed { amount } => format!("{item}: healed {amount} hp."),
        ItemEffect::HitBoost { bonus } => format!("{item}: +{bonus}% to hit next fight."),
        ItemEffect::DamageTierUpgraded => format!("{item}: weapon upgraded."),
        ItemEffect::EnemyPoolReduced => format!("{item}: one fewer hostile to face."),
        ItemEffect::EnemyAccuracyReduced { penalty } => {
            format!("{item}: enemy accuracy -{penalty}%.")
        }
        ItemEffect::DisarmGuaranteed => format!("{item}: the next trap will be disarmed."),
        ItemEffect::DifficultyRelieved => format!("{item}: intel lowers the next threat."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn play(script: &str, seed: u64) -> (Option<RunSummary>, String) {
        colored::control::set_override(false);
        let mut input = Cursor::new(script.as_bytes().to_vec());
        let mut out = Vec::new();
        let summary = play_interactive(&mut input, &mut out, seed, RunConfig::default()).unwrap();
        (summary, String::from_utf8(out).unwrap())
    }

    #[test]
    fn closed_input_before_role_returns_none() {
        let (summary, text) = play("", 1);
        assert!(summary.is_none());
        assert!(text.contains("Choose your role:"));
        assert!(text.contains("Marksman: one guaranteed long-range kill shot"));
        assert!(text.contains("abandoning"));
    }

    #[test]
    fn rejects_bad_role_then_accepts_menu_index() {
        let (summary, text) = play("9\nsniper\n", 1);
        assert!(text.contains("unknown role '9'"));
        assert!(text.contains("Sniper assigned."));
        let summary = summary.unwrap();
        assert_eq!(summary.role, RoleId::Sniper);
        assert_eq!(summary.phase, RunPhase::MissionLoop);
    }

    #[test]
    fn status_and_backing_out_of_items_do_not_advance() {
        let (summary, text) = play("2\n3\n2\n0\n", 3);
        assert!(text.contains("Sniper | HP 3 | missions 0/0 completed"));
        let summary = summary.unwrap();
        assert_eq!(summary.missions_attempted, 0);
    }

    #[test]
    fn choosing_first_option_plays_to_an_ending() {
        let script = "1\n".repeat(200);
        for seed in [1_u64, 2, 3, 42] {
            let (summary, text) = play(&script, seed);
            let summary = summary.unwrap();
            assert!(summary.phase.is_terminal(), "seed {seed} did not finish");
            assert!(summary.ending.is_some());
            assert!(text.contains(&summary.headline));
        }
    }
}
