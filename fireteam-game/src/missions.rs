//! Mission templates and their loot tables.
use crate::dice::Dice;
use crate::items::ItemId;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionId {
    VillageCheckpoint,
    MountainPass,
    AbandonedBase,
    NightRaid,
    ConvoyAmbush,
}

impl MissionId {
    pub const ALL: [Self; 5] = [
        Self::VillageCheckpoint,
        Self::MountainPass,
        Self::AbandonedBase,
        Self::NightRaid,
        Self::ConvoyAmbush,
    ];
}

impl fmt::Display for MissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(MissionCatalog::mission(*self).name)
    }
}

/// Whether an Engineer can bypass the encounter by disarming it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionKind {
    Firefight,
    Trap,
}

/// One independently rolled drop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LootEntry {
    pub item: ItemId,
    /// Drop probability in percent.
    pub pct: u8,
}

const fn loot(item: ItemId, pct: u8) -> LootEntry {
    LootEntry { item, pct }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mission {
    pub id: MissionId,
    pub name: &'static str,
    pub briefing: &'static str,
    /// 1 (easy) to 3 (hard); scales enemy strength and accuracy.
    pub difficulty: u8,
    pub kind: MissionKind,
    pub loot: &'static [LootEntry],
}

static MISSIONS: [Mission; 5] = [
    Mission {
        id: MissionId::VillageCheckpoint,
        name: "Village Checkpoint",
        briefing: "A small village checkpoint controlled by local militia blocks the road.",
        difficulty: 1,
        kind: MissionKind::Firefight,
        loot: &[loot(ItemId::MedPack, 50), loot(ItemId::Ammo, 40)],
    },
    Mission {
        id: MissionId::MountainPass,
        name: "Mountain Pass",
        briefing: "A narrow mountain pass, seeded with buried IEDs and watched from the ridges.",
        difficulty: 2,
        kind: MissionKind::Trap,
        loot: &[loot(ItemId::Rations, 50), loot(ItemId::MedPack, 25)],
    },
    Mission {
        id: MissionId::AbandonedBase,
        name: "Abandoned Base",
        briefing: "An abandoned base. The silence hides hostile survivors and a weapons cache.",
        difficulty: 3,
        kind: MissionKind::Firefight,
        loot: &[
            loot(ItemId::AssaultRifle, 50),
            loot(ItemId::Ammo, 50),
            loot(ItemId::Toolkit, 10),
        ],
    },
    Mission {
        id: MissionId::NightRaid,
        name: "Night Raid",
        briefing: "Night operation: an enemy compound is targeted for destruction.",
        difficulty: 3,
        kind: MissionKind::Firefight,
        loot: &[loot(ItemId::IntelDocuments, 60), loot(ItemId::Ammo, 30)],
    },
    Mission {
        id: MissionId::ConvoyAmbush,
        name: "Convoy Ambush",
        briefing: "Your supply convoy is under ambush in a narrow valley.",
        difficulty: 2,
        kind: MissionKind::Firefight,
        loot: &[
            loot(ItemId::Rations, 40),
            loot(ItemId::MedPack, 30),
            loot(ItemId::AssaultRifle, 15),
        ],
    },
];

/// Read-only access to the fixed mission table.
#[derive(Debug, Clone, Copy, Default)]
pub struct MissionCatalog;

impl MissionCatalog {
    #[must_use]
    pub fn list_missions() -> &'static [Mission] {
        &MISSIONS
    }

    #[must_use]
    pub fn mission(id: MissionId) -> &'static Mission {
        MISSIONS
            .iter()
            .find(|mission| mission.id == id)
            .unwrap_or(&MISSIONS[0])
    }

    /// Draw one mission uniformly at random, with replacement.
    pub fn draw_mission<D: Dice + ?Sized>(dice: &mut D) -> &'static Mission {
        let idx = dice.index(MISSIONS.len());
        MISSIONS.get(idx).unwrap_or(&MISSIONS[0])
    }

    /// Ordered loot table rolled after the mission's encounter is won.
    #[must_use]
    pub const fn loot_table_for(mission: &Mission) -> &'static [LootEntry] {
        mission.loot
    }
}
