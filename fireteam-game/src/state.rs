//! Player state owned by the mission runner.
use crate::constants::MAX_HP;
use crate::error::GameError;
use crate::items::ItemId;
use crate::roles::{Ability, Role, RoleCatalog, RoleId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Item counts keyed by identifier. Zero-count entries are never stored.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Inventory(BTreeMap<ItemId, u32>);

impl Inventory {
    #[must_use]
    pub fn count(&self, item: ItemId) -> u32 {
        self.0.get(&item).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn has(&self, item: ItemId) -> bool {
        self.count(item) > 0
    }

    pub fn add(&mut self, item: ItemId, qty: u32) {
        if qty == 0 {
            return;
        }
        let entry = self.0.entry(item).or_insert(0);
        *entry = entry.saturating_add(qty);
    }

    /// Remove one unit. Returns `false` and leaves the inventory untouched
    /// when none are held.
    pub fn take_one(&mut self, item: ItemId) -> bool {
        match self.0.get_mut(&item) {
            Some(count) if *count > 1 => {
                *count -= 1;
                true
            }
            Some(_) => {
                self.0.remove(&item);
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (ItemId, u32)> + '_ {
        self.0.iter().map(|(item, count)| (*item, *count))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Weapon damage tier. Upgraded once an assault rifle is equipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageTier {
    #[default]
    Standard,
    Upgraded,
}

/// Modifiers that last for the next encounter only, except a primed disarm,
/// which waits for the next trap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EncounterBoosts {
    #[serde(default)]
    pub hit_bonus: i32,
    #[serde(default)]
    pub enemy_accuracy_penalty: i32,
    #[serde(default)]
    pub difficulty_relief: u8,
    #[serde(default)]
    pub enemy_pool_reduction: u8,
    #[serde(default)]
    pub guaranteed_disarm: bool,
}

impl EncounterBoosts {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Limited-use ability charges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityCharges {
    /// Sniper kill shot; one per run.
    pub kill_shot: bool,
    /// Medic field heal; recharges after every encounter.
    pub field_heal: bool,
}

impl AbilityCharges {
    #[must_use]
    pub const fn for_ability(ability: Ability) -> Self {
        Self {
            kill_shot: matches!(ability, Ability::Marksman),
            field_heal: matches!(ability, Ability::FieldMedic),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerState {
    pub role: RoleId,
    pub hp: u8,
    pub inventory: Inventory,
    pub missions_attempted: u32,
    pub missions_completed: u32,
    pub alive: bool,
    #[serde(default)]
    pub damage_tier: DamageTier,
    #[serde(default)]
    pub boosts: EncounterBoosts,
    pub charges: AbilityCharges,
}

impl PlayerState {
    /// Fresh state at full health, holding one of each role-exclusive item.
    #[must_use]
    pub fn new(role: RoleId) -> Self {
        let def = RoleCatalog::role(role);
        let mut inventory = Inventory::default();
        for item in def.exclusive_items {
            inventory.add(*item, 1);
        }
        Self {
            role,
            hp: MAX_HP,
            inventory,
            missions_attempted: 0,
            missions_completed: 0,
            alive: true,
            damage_tier: DamageTier::Standard,
            boosts: EncounterBoosts::default(),
            charges: AbilityCharges::for_ability(def.ability),
        }
    }

    #[must_use]
    pub fn role_def(&self) -> &'static Role {
        RoleCatalog::role(self.role)
    }

    #[must_use]
    pub const fn is_wounded(&self) -> bool {
        self.hp < MAX_HP
    }

    /// Restore up to `amount` hit points, capped at the maximum. Returns the
    /// amount actually restored.
    pub fn heal(&mut self, amount: u8) -> u8 {
        let before = self.hp;
        self.hp = self.hp.saturating_add(amount).min(MAX_HP);
        self.hp - before
    }

    /// Apply one point of damage. Returns `true` if this was fatal.
    pub fn take_hit(&mut self) -> bool {
        self.hp = self.hp.saturating_sub(1);
        if self.hp == 0 {
            self.alive = false;
        }
        !self.alive
    }

    /// Instant death, independent of remaining hit points.
    pub fn kill(&mut self) {
        self.hp = 0;
        self.alive = false;
    }

    /// Verify the hit point range and the alive flag agree.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvariantViolation`] describing the first broken invariant.
    pub fn check_invariants(&self) -> Result<(), GameError> {
        if self.hp > MAX_HP {
            return Err(GameError::InvariantViolation(format!(
                "hp {} exceeds maximum {MAX_HP}",
                self.hp
            )));
        }
        if self.alive != (self.hp > 0) {
            return Err(GameError::InvariantViolation(format!(
                "alive flag {} disagrees with hp {}",
                self.alive, self.hp
            )));
        }
        if self.missions_completed > self.missions_attempted {
            return Err(GameError::InvariantViolation(format!(
                "{} missions completed out of {} attempted",
                self.missions_completed, self.missions_attempted
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_state_starts_full_with_exclusive_gear() {
        let state = PlayerState::new(RoleId::Engineer);
        assert_eq!(state.hp, MAX_HP);
        assert!(state.alive);
        assert_eq!(state.inventory.count(ItemId::Toolkit), 1);
        assert_eq!(state.inventory.iter().count(), 1);
        assert!(!state.charges.kill_shot);
        assert!(state.check_invariants().is_ok());
    }

    #[test]
    fn charges_follow_the_ability() {
        assert!(PlayerState::new(RoleId::Sniper).charges.kill_shot);
        assert!(PlayerState::new(RoleId::Medic).charges.field_heal);
        let soldier = PlayerState::new(RoleId::Soldier);
        assert!(!soldier.charges.kill_shot && !soldier.charges.field_heal);
    }

    #[test]
    fn heal_is_capped() {
        let mut state = PlayerState::new(RoleId::Medic);
        assert_eq!(state.heal(1), 0);
        state.take_hit();
        state.take_hit();
        assert_eq!(state.heal(5), 2);
        assert_eq!(state.hp, MAX_HP);
    }

    #[test]
    fn hits_bottom_out_at_zero_and_kill() {
        let mut state = PlayerState::new(RoleId::Soldier);
        assert!(!state.take_hit());
        assert!(!state.take_hit());
        assert!(state.take_hit());
        assert!(state.take_hit());
        assert_eq!(state.hp, 0);
        assert!(!state.alive);
        assert!(state.check_invariants().is_ok());
    }

    #[test]
    fn take_one_never_goes_negative() {
        let mut inv = Inventory::default();
        assert!(!inv.take_one(ItemId::Ammo));
        inv.add(ItemId::Ammo, 2);
        assert!(inv.take_one(ItemId::Ammo));
        assert!(inv.take_one(ItemId::Ammo));
        assert!(!inv.take_one(ItemId::Ammo));
        assert!(inv.is_empty());
    }

    #[test]
    fn invariant_check_flags_corruption() {
        let mut state = PlayerState::new(RoleId::Sniper);
        state.hp = 4;
        assert!(matches!(
            state.check_invariants(),
            Err(GameError::InvariantViolation(_))
        ));
        state.hp = 0;
        assert!(state.check_invariants().is_err());
    }

    #[test]
    fn state_roundtrips_through_json() {
        let mut state = PlayerState::new(RoleId::IntelligenceOfficer);
        state.inventory.add(ItemId::MedPack, 2);
        let json = serde_json::to_string(&state).unwrap();
        let restored: PlayerState = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, state);
    }
}
