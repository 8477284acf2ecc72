//! Final extraction check and run endings.
use crate::constants::{
    EXTRACTION_BASE_PCT, EXTRACTION_MAX_PCT, EXTRACTION_MIN_PCT, EXTRACTION_PER_HP,
    EXTRACTION_PER_MISSION, MAX_HP,
};
use crate::dice::Dice;
use crate::items::ItemId;
use crate::state::{DamageTier, PlayerState};
use serde::{Deserialize, Serialize};

/// Possible run endings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ending {
    /// Extracted at full health
    FullSurvival,
    /// Extracted, but carrying wounds
    WoundedExtraction,
    /// Failed the extraction roll
    Captured,
    /// Died during the mission loop; extraction never happened
    KilledInAction,
}

impl Ending {
    pub const ALL: [Self; 4] = [
        Self::FullSurvival,
        Self::WoundedExtraction,
        Self::Captured,
        Self::KilledInAction,
    ];

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::FullSurvival => "full_survival",
            Self::WoundedExtraction => "wounded_extraction",
            Self::Captured => "captured",
            Self::KilledInAction => "killed_in_action",
        }
    }

    #[must_use]
    pub const fn headline(self) -> &'static str {
        match self {
            Self::FullSurvival => "Mission Accomplished",
            Self::WoundedExtraction => "Extracted Under Fire",
            Self::Captured => "Taken Prisoner",
            Self::KilledInAction => "Killed In Action",
        }
    }

    #[must_use]
    pub const fn epilogue(self) -> &'static str {
        match self {
            Self::FullSurvival => {
                "The helicopter lifts off with you aboard, unscathed. Command calls it a textbook operation."
            }
            Self::WoundedExtraction => {
                "You limp onto the helicopter as rounds ping off the hull. You made it out, barely."
            }
            Self::Captured => {
                "The landing zone is overrun before the helicopter arrives. You are taken alive."
            }
            Self::KilledInAction => {
                "Your fireteam recovers your tags. The mission continues without you."
            }
        }
    }

    /// Whether the player left the theatre alive and free.
    #[must_use]
    pub const fn survived(self) -> bool {
        matches!(self, Self::FullSurvival | Self::WoundedExtraction)
    }
}

impl std::fmt::Display for Ending {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractionEngine;

impl ExtractionEngine {
    /// Percent chance that the extraction roll succeeds for this state.
    #[must_use]
    pub fn survival_chance(player: &PlayerState) -> i32 {
        let held: i32 = player
            .inventory
            .iter()
            .map(|(item, count)| {
                item.extraction_value()
                    .saturating_mul(i32::try_from(count).unwrap_or(i32::MAX))
            })
            .fold(0, i32::saturating_add);
        let equipped = if player.damage_tier == DamageTier::Upgraded {
            ItemId::AssaultRifle.extraction_value()
        } else {
            0
        };
        let completed = i32::try_from(player.missions_completed).unwrap_or(i32::MAX);
        let raw = EXTRACTION_BASE_PCT
            .saturating_add(EXTRACTION_PER_HP * i32::from(player.hp))
            .saturating_add(EXTRACTION_PER_MISSION.saturating_mul(completed))
            .saturating_add(held)
            .saturating_add(equipped);
        raw.clamp(EXTRACTION_MIN_PCT, EXTRACTION_MAX_PCT)
    }

    /// Roll once against [`Self::survival_chance`]. A dead player is
    /// [`Ending::KilledInAction`] without consuming a roll.
    pub fn compute_ending<D: Dice + ?Sized>(player: &PlayerState, dice: &mut D) -> Ending {
        if player.hp == 0 {
            return Ending::KilledInAction;
        }
        let chance = Self::survival_chance(player);
        let ending = if !dice.chance(chance) {
            Ending::Captured
        } else if player.hp == MAX_HP {
            Ending::FullSurvival
        } else {
            Ending::WoundedExtraction
        };
        log::debug!("extraction at {chance}%: {ending}");
        ending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::ScriptedDice;
    use crate::roles::RoleId;

    fn veteran(hp: u8, completed: u32) -> PlayerState {
        let mut player = PlayerState::new(RoleId::Sniper);
        player.hp = hp;
        player.missions_attempted = completed;
        player.missions_completed = completed;
        player
    }

    #[test]
    fn chance_counts_hp_missions_and_gear() {
        let mut player = veteran(2, 2);
        player.inventory.add(ItemId::MedPack, 1);
        // Camouflage and rations carry no extraction value.
        player.inventory.add(ItemId::Rations, 3);
        assert_eq!(ExtractionEngine::survival_chance(&player), 69);

        player.inventory.add(ItemId::Ammo, 2);
        player.damage_tier = DamageTier::Upgraded;
        assert_eq!(ExtractionEngine::survival_chance(&player), 79);
    }

    #[test]
    fn chance_is_clamped() {
        let mut player = veteran(3, 10);
        player.inventory.add(ItemId::AssaultRifle, 5);
        assert_eq!(ExtractionEngine::survival_chance(&player), 90);
    }

    #[test]
    fn roll_below_chance_extracts() {
        let full = veteran(3, 1);
        assert_eq!(
            ExtractionEngine::compute_ending(&full, &mut ScriptedDice::new([0])),
            Ending::FullSurvival
        );
        let wounded = veteran(1, 1);
        let chance = ExtractionEngine::survival_chance(&wounded);
        let roll = u8::try_from(chance - 1).unwrap();
        assert_eq!(
            ExtractionEngine::compute_ending(&wounded, &mut ScriptedDice::new([roll])),
            Ending::WoundedExtraction
        );
        let at_chance = u8::try_from(chance).unwrap();
        assert_eq!(
            ExtractionEngine::compute_ending(&wounded, &mut ScriptedDice::new([at_chance])),
            Ending::Captured
        );
    }

    #[test]
    fn dead_players_do_not_roll() {
        let mut player = veteran(1, 0);
        player.kill();
        let mut dice = ScriptedDice::new([0]);
        assert_eq!(
            ExtractionEngine::compute_ending(&player, &mut dice),
            Ending::KilledInAction
        );
        assert_eq!(dice.consumed(), 0);
    }

    #[test]
    fn endings_have_distinct_copy() {
        let headlines: std::collections::HashSet<_> =
            Ending::ALL.iter().map(|ending| ending.headline()).collect();
        assert_eq!(headlines.len(), Ending::ALL.len());
        assert!(Ending::WoundedExtraction.survived());
        assert!(!Ending::Captured.survived());
        assert_eq!(Ending::KilledInAction.to_string(), "killed_in_action");
    }
}
