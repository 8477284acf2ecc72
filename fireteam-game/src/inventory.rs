//! Loot grants and item-use effects.
use crate::constants::{AMMO_HIT_BONUS, CAMOUFLAGE_ENEMY_PENALTY};
use crate::dice::Dice;
use crate::error::GameError;
use crate::items::ItemId;
use crate::missions::LootEntry;
use crate::state::{DamageTier, PlayerState};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Items granted by a single loot roll, in table order.
pub type LootGrant = SmallVec<[ItemId; 4]>;

/// Effect applied by a successful `use_item`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "effect")]
pub enum ItemEffect {
    Healed { amount: u8 },
    HitBoost { bonus: i32 },
    DamageTierUpgraded,
    EnemyPoolReduced,
    EnemyAccuracyReduced { penalty: i32 },
    DisarmGuaranteed,
    DifficultyRelieved,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct InventoryLedger;

impl InventoryLedger {
    /// Roll every entry independently, in order, and add what drops.
    pub fn grant_loot<D: Dice + ?Sized>(
        player: &mut PlayerState,
        table: &[LootEntry],
        dice: &mut D,
    ) -> LootGrant {
        let mut granted = LootGrant::new();
        for entry in table {
            if dice.chance(i32::from(entry.pct)) {
                player.inventory.add(entry.item, 1);
                granted.push(entry.item);
            }
        }
        if !granted.is_empty() {
            log::debug!("loot granted: {granted:?}");
        }
        granted
    }

    /// Consume one unit of `item` and apply its effect.
    ///
    /// # Errors
    ///
    /// - [`GameError::InsufficientItem`] if none are held.
    /// - [`GameError::RoleMismatch`] if the item is exclusive to another role.
    /// - [`GameError::ItemNotUsable`] if the item has no use effect.
    ///
    /// The state is untouched whenever an error is returned.
    pub fn use_item(player: &mut PlayerState, item: ItemId) -> Result<ItemEffect, GameError> {
        if !player.inventory.has(item) {
            return Err(GameError::InsufficientItem { item });
        }
        if let Some(required) = item.exclusive_to()
            && required != player.role
        {
            return Err(GameError::RoleMismatch {
                item,
                required,
                actual: player.role,
            });
        }
        if !item.is_usable() {
            return Err(GameError::ItemNotUsable { item });
        }

        let effect = match item {
            ItemId::MedPack | ItemId::MedicalKit => ItemEffect::Healed {
                amount: player.heal(1),
            },
            ItemId::Ammo => {
                player.boosts.hit_bonus = AMMO_HIT_BONUS;
                ItemEffect::HitBoost {
                    bonus: AMMO_HIT_BONUS,
                }
            }
            ItemId::AssaultRifle => {
                player.damage_tier = DamageTier::Upgraded;
                ItemEffect::DamageTierUpgraded
            }
            ItemId::CombatKnife => {
                player.boosts.enemy_pool_reduction = 1;
                ItemEffect::EnemyPoolReduced
            }
            ItemId::Camouflage => {
                player.boosts.enemy_accuracy_penalty = CAMOUFLAGE_ENEMY_PENALTY;
                ItemEffect::EnemyAccuracyReduced {
                    penalty: CAMOUFLAGE_ENEMY_PENALTY,
                }
            }
            ItemId::Toolkit => {
                player.boosts.guaranteed_disarm = true;
                ItemEffect::DisarmGuaranteed
            }
            ItemId::EncryptedRadio => {
                player.boosts.difficulty_relief = 1;
                ItemEffect::DifficultyRelieved
            }
            ItemId::Rations | ItemId::IntelDocuments => {
                return Err(GameError::ItemNotUsable { item });
            }
        };
        player.inventory.take_one(item);
        log::debug!("{} used {item}: {effect:?}", player.role);
        Ok(effect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::ScriptedDice;
    use crate::missions::{MissionCatalog, MissionId};
    use crate::roles::RoleId;

    #[test]
    fn loot_rolls_each_entry_in_order() {
        let mut player = PlayerState::new(RoleId::Soldier);
        let table = MissionCatalog::loot_table_for(MissionCatalog::mission(
            MissionId::AbandonedBase,
        ));
        // Rifle 50: hit, Ammo 50: miss, Toolkit 10: hit
        let mut dice = ScriptedDice::new([49, 50, 9]);
        let granted = InventoryLedger::grant_loot(&mut player, table, &mut dice);
        assert_eq!(granted.as_slice(), &[ItemId::AssaultRifle, ItemId::Toolkit]);
        assert_eq!(player.inventory.count(ItemId::AssaultRifle), 1);
        assert_eq!(player.inventory.count(ItemId::Ammo), 0);
        assert_eq!(dice.consumed(), 3);
    }

    #[test]
    fn using_a_missing_item_fails_without_mutation() {
        let mut player = PlayerState::new(RoleId::Sniper);
        player.hp = 1;
        let before = player.clone();
        for item in ItemId::ALL {
            if player.inventory.has(item) {
                continue;
            }
            assert_eq!(
                InventoryLedger::use_item(&mut player, item),
                Err(GameError::InsufficientItem { item })
            );
            assert_eq!(player, before);
        }
    }

    #[test]
    fn medpack_heals_but_is_capped() {
        let mut player = PlayerState::new(RoleId::Soldier);
        player.inventory.add(ItemId::MedPack, 2);
        assert_eq!(
            InventoryLedger::use_item(&mut player, ItemId::MedPack),
            Ok(ItemEffect::Healed { amount: 0 })
        );
        player.take_hit();
        assert_eq!(
            InventoryLedger::use_item(&mut player, ItemId::MedPack),
            Ok(ItemEffect::Healed { amount: 1 })
        );
        assert_eq!(player.hp, 3);
        assert!(!player.inventory.has(ItemId::MedPack));
    }

    #[test]
    fn exclusive_items_reject_other_roles() {
        let mut player = PlayerState::new(RoleId::Medic);
        player.inventory.add(ItemId::Toolkit, 1);
        let before = player.clone();
        assert_eq!(
            InventoryLedger::use_item(&mut player, ItemId::Toolkit),
            Err(GameError::RoleMismatch {
                item: ItemId::Toolkit,
                required: RoleId::Engineer,
                actual: RoleId::Medic,
            })
        );
        assert_eq!(player, before);
    }

    #[test]
    fn trophies_cannot_be_used() {
        let mut player = PlayerState::new(RoleId::Soldier);
        player.inventory.add(ItemId::IntelDocuments, 1);
        assert_eq!(
            InventoryLedger::use_item(&mut player, ItemId::IntelDocuments),
            Err(GameError::ItemNotUsable {
                item: ItemId::IntelDocuments
            })
        );
        assert_eq!(player.inventory.count(ItemId::IntelDocuments), 1);
    }

    #[test]
    fn boosts_and_upgrades_are_recorded() {
        let mut player = PlayerState::new(RoleId::Sniper);
        player.inventory.add(ItemId::Ammo, 1);
        player.inventory.add(ItemId::AssaultRifle, 1);
        InventoryLedger::use_item(&mut player, ItemId::Ammo).unwrap();
        InventoryLedger::use_item(&mut player, ItemId::Camouflage).unwrap();
        InventoryLedger::use_item(&mut player, ItemId::AssaultRifle).unwrap();
        assert_eq!(player.boosts.hit_bonus, AMMO_HIT_BONUS);
        assert_eq!(player.boosts.enemy_accuracy_penalty, CAMOUFLAGE_ENEMY_PENALTY);
        assert_eq!(player.damage_tier, DamageTier::Upgraded);
        assert!(player.inventory.is_empty());
    }
}
