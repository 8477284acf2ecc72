//! Role catalog: the five fixed roles and their combat modifiers.
use crate::error::GameError;
use crate::items::ItemId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleId {
    Soldier,
    Sniper,
    Medic,
    Engineer,
    IntelligenceOfficer,
}

impl RoleId {
    pub const ALL: [Self; 5] = [
        Self::Soldier,
        Self::Sniper,
        Self::Medic,
        Self::Engineer,
        Self::IntelligenceOfficer,
    ];

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Soldier => "soldier",
            Self::Sniper => "sniper",
            Self::Medic => "medic",
            Self::Engineer => "engineer",
            Self::IntelligenceOfficer => "intelligence_officer",
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Soldier => "Soldier",
            Self::Sniper => "Sniper",
            Self::Medic => "Medic",
            Self::Engineer => "Engineer",
            Self::IntelligenceOfficer => "Intelligence Officer",
        }
    }
}

impl fmt::Display for RoleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RoleId {
    type Err = GameError;

    /// Accepts the snake_case key, the display name, or the 1-based menu index.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(index) = trimmed.parse::<usize>() {
            return index
                .checked_sub(1)
                .and_then(|i| Self::ALL.get(i).copied())
                .ok_or_else(|| GameError::UnknownRole(trimmed.to_string()));
        }
        let normalized = trimmed.to_ascii_lowercase().replace([' ', '-'], "_");
        Self::ALL
            .into_iter()
            .find(|role| role.key() == normalized)
            .ok_or_else(|| GameError::UnknownRole(trimmed.to_string()))
    }
}

/// Role-exclusive combat ability, dispatched on by the combat resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ability {
    /// Small chance to dodge each incoming hit.
    Steady,
    /// Lower enemy accuracy, plus one guaranteed kill shot per run.
    Marksman,
    /// Chance each turn to heal instead of attacking, plus one field heal per mission.
    FieldMedic,
    /// Chance to disarm trap missions outright.
    Disarm,
    /// Reduced mission difficulty and easier retreats.
    Foresight,
}

impl Ability {
    #[must_use]
    pub const fn summary(self) -> &'static str {
        match self {
            Self::Steady => "Steady: small chance to dodge incoming fire.",
            Self::Marksman => "Marksman: one guaranteed long-range kill shot; enemies struggle to find you.",
            Self::FieldMedic => "Field Medic: patch yourself up mid-fight, once per mission on demand.",
            Self::Disarm => "Disarm: chance to clear trapped routes without a fight.",
            Self::Foresight => "Foresight: intel lowers mission danger and opens escape routes.",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Role {
    pub id: RoleId,
    pub desc: &'static str,
    /// Added to the base hit chance, in percentage points.
    pub hit_mod: i32,
    /// Chance, in percentage points, that a landed shot deals double damage.
    pub damage_mod: i32,
    pub ability: Ability,
    pub exclusive_items: &'static [ItemId],
}

static ROLES: [Role; 5] = [
    Role {
        id: RoleId::Soldier,
        desc: "All-rounder. Balanced in combat and survival.",
        hit_mod: 0,
        damage_mod: 10,
        ability: Ability::Steady,
        exclusive_items: &[ItemId::CombatKnife],
    },
    Role {
        id: RoleId::Sniper,
        desc: "Long-range specialist. Very accurate at range.",
        hit_mod: 15,
        damage_mod: 20,
        ability: Ability::Marksman,
        exclusive_items: &[ItemId::Camouflage],
    },
    Role {
        id: RoleId::Medic,
        desc: "Healer. Keeps themselves standing when others would fall.",
        hit_mod: -5,
        damage_mod: 0,
        ability: Ability::FieldMedic,
        exclusive_items: &[ItemId::MedicalKit],
    },
    Role {
        id: RoleId::Engineer,
        desc: "Handles traps and gadgets. Can disable explosives.",
        hit_mod: -2,
        damage_mod: 5,
        ability: Ability::Disarm,
        exclusive_items: &[ItemId::Toolkit],
    },
    Role {
        id: RoleId::IntelligenceOfficer,
        desc: "Information and stealth expert. Gains intel before risky choices.",
        hit_mod: -1,
        damage_mod: 0,
        ability: Ability::Foresight,
        exclusive_items: &[ItemId::EncryptedRadio],
    },
];

impl Role {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.id.name()
    }
}

/// Read-only access to the fixed role table.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoleCatalog;

impl RoleCatalog {
    /// The five roles in menu order.
    #[must_use]
    pub fn list_roles() -> &'static [Role] {
        &ROLES
    }

    /// Look up a role by key, display name, or 1-based menu index.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::UnknownRole`] if `id` names none of the five roles.
    pub fn get_role(id: &str) -> Result<&'static Role, GameError> {
        id.parse::<RoleId>().map(Self::role)
    }

    /// Infallible lookup by typed identifier.
    #[must_use]
    pub fn role(id: RoleId) -> &'static Role {
        ROLES
            .iter()
            .find(|role| role.id == id)
            .unwrap_or(&ROLES[0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_are_listed_in_menu_order() {
        let ids: Vec<_> = RoleCatalog::list_roles().iter().map(|r| r.id).collect();
        assert_eq!(ids, RoleId::ALL.to_vec());
    }

    #[test]
    fn every_role_has_one_exclusive_item_owned_by_it() {
        for role in RoleCatalog::list_roles() {
            assert_eq!(role.exclusive_items.len(), 1);
            for item in role.exclusive_items {
                assert_eq!(item.exclusive_to(), Some(role.id));
            }
        }
    }

    #[test]
    fn get_role_accepts_keys_names_and_indices() {
        assert_eq!(RoleCatalog::get_role("sniper").unwrap().id, RoleId::Sniper);
        assert_eq!(
            RoleCatalog::get_role("Intelligence Officer").unwrap().id,
            RoleId::IntelligenceOfficer
        );
        assert_eq!(RoleCatalog::get_role("3").unwrap().id, RoleId::Medic);
        assert_eq!(RoleCatalog::get_role(" ENGINEER ").unwrap().id, RoleId::Engineer);
    }

    #[test]
    fn role_names_come_from_the_identifier() {
        for role in RoleCatalog::list_roles() {
            assert_eq!(role.name(), role.id.name());
            assert_eq!(role.name(), role.id.to_string());
        }
        assert_eq!(RoleCatalog::role(RoleId::IntelligenceOfficer).name(), "Intelligence Officer");
    }

    #[test]
    fn get_role_rejects_unknown_ids() {
        for bad in ["pilot", "0", "6", ""] {
            assert!(matches!(
                RoleCatalog::get_role(bad),
                Err(GameError::UnknownRole(_))
            ));
        }
    }

    #[test]
    fn sniper_is_the_most_accurate() {
        let best = RoleCatalog::list_roles()
            .iter()
            .max_by_key(|role| role.hit_mod)
            .unwrap();
        assert_eq!(best.id, RoleId::Sniper);
        assert_eq!(
            RoleCatalog::role(RoleId::Engineer).ability,
            Ability::Disarm
        );
    }
}
