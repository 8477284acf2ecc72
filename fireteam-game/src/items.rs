//! Item identifiers and their static properties.
use crate::roles::RoleId;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemId {
    MedPack,
    Ammo,
    AssaultRifle,
    Rations,
    IntelDocuments,
    CombatKnife,
    Camouflage,
    MedicalKit,
    Toolkit,
    EncryptedRadio,
}

impl ItemId {
    pub const ALL: [Self; 10] = [
        Self::MedPack,
        Self::Ammo,
        Self::AssaultRifle,
        Self::Rations,
        Self::IntelDocuments,
        Self::CombatKnife,
        Self::Camouflage,
        Self::MedicalKit,
        Self::Toolkit,
        Self::EncryptedRadio,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::MedPack => "Med Pack",
            Self::Ammo => "Ammo",
            Self::AssaultRifle => "Assault Rifle",
            Self::Rations => "Rations",
            Self::IntelDocuments => "Intel Documents",
            Self::CombatKnife => "Combat Knife",
            Self::Camouflage => "Camouflage",
            Self::MedicalKit => "Medical Kit",
            Self::Toolkit => "Toolkit",
            Self::EncryptedRadio => "Encrypted Radio",
        }
    }

    /// Role allowed to use this item, if it is role-exclusive.
    #[must_use]
    pub const fn exclusive_to(self) -> Option<RoleId> {
        match self {
            Self::CombatKnife => Some(RoleId::Soldier),
            Self::Camouflage => Some(RoleId::Sniper),
            Self::MedicalKit => Some(RoleId::Medic),
            Self::Toolkit => Some(RoleId::Engineer),
            Self::EncryptedRadio => Some(RoleId::IntelligenceOfficer),
            Self::MedPack
            | Self::Ammo
            | Self::AssaultRifle
            | Self::Rations
            | Self::IntelDocuments => None,
        }
    }

    /// Whether `use_item` has an effect for this item.
    #[must_use]
    pub const fn is_usable(self) -> bool {
        !matches!(self, Self::Rations | Self::IntelDocuments)
    }

    /// Survival bonus per held unit at extraction, in percentage points.
    #[must_use]
    pub const fn extraction_value(self) -> i32 {
        match self {
            Self::MedPack => 4,
            Self::Ammo => 2,
            Self::AssaultRifle => 6,
            _ => 0,
        }
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
