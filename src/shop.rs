//! Coin economy: upgrades, consumables, characters and revives
//!
//! Every operation works on an in-memory [`Progress`]; callers persist it
//! afterwards.

use thiserror::Error;

use crate::characters::CharacterDescriptor;
use crate::consts::REVIVE_COST;
use crate::persistence::Progress;
use crate::sim::StartOptions;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShopError {
    #[error("not enough coins: need {needed}, have {available}")]
    InsufficientCoins { needed: u64, available: u64 },
    #[error("`{0}` is already owned")]
    AlreadyOwned(String),
    #[error("`{0}` is not for sale")]
    NotPurchasable(String),
    #[error("`{0}` is still locked")]
    Locked(String),
}

/// Permanent upgrades
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upgrade {
    EnergyMaster,
    RecoveryBoost,
    CoinBooster,
    ItemLuck,
}

impl Upgrade {
    pub const ALL: [Upgrade; 4] = [
        Upgrade::EnergyMaster,
        Upgrade::RecoveryBoost,
        Upgrade::CoinBooster,
        Upgrade::ItemLuck,
    ];

    /// Persisted id
    pub fn id(self) -> &'static str {
        match self {
            Upgrade::EnergyMaster => "energyMaster",
            Upgrade::RecoveryBoost => "recoveryBoost",
            Upgrade::CoinBooster => "coinBooster",
            Upgrade::ItemLuck => "itemLuck",
        }
    }

    pub fn price(self) -> u64 {
        match self {
            Upgrade::EnergyMaster | Upgrade::RecoveryBoost => 200,
            Upgrade::CoinBooster => 300,
            Upgrade::ItemLuck => 250,
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|u| u.id() == id)
    }
}

/// Single-run boosts, one consumed per run start
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Consumable {
    StartShield,
    FeverStart,
}

impl Consumable {
    pub const ALL: [Consumable; 2] = [Consumable::StartShield, Consumable::FeverStart];

    pub fn id(self) -> &'static str {
        match self {
            Consumable::StartShield => "startShield",
            Consumable::FeverStart => "feverStart",
        }
    }

    pub fn price(self) -> u64 {
        match self {
            Consumable::StartShield => 30,
            Consumable::FeverStart => 40,
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.id() == id)
    }
}

/// Coins needed to buy a character outright
pub fn character_price(character: &CharacterDescriptor) -> u64 {
    character.unlock_score * 2
}

fn spend(progress: &mut Progress, price: u64) -> Result<(), ShopError> {
    if progress.total_coins < price {
        return Err(ShopError::InsufficientCoins {
            needed: price,
            available: progress.total_coins,
        });
    }
    progress.total_coins -= price;
    Ok(())
}

pub fn buy_upgrade(progress: &mut Progress, upgrade: Upgrade) -> Result<(), ShopError> {
    if progress.has_upgrade(upgrade.id()) {
        return Err(ShopError::AlreadyOwned(upgrade.id().to_string()));
    }
    spend(progress, upgrade.price())?;
    progress.upgrades.insert(upgrade.id().to_string(), true);
    log::info!("Bought upgrade {}", upgrade.id());
    Ok(())
}

/// Returns the new stock of that consumable
pub fn buy_consumable(progress: &mut Progress, consumable: Consumable) -> Result<u32, ShopError> {
    spend(progress, consumable.price())?;
    let count = progress
        .consumables
        .entry(consumable.id().to_string())
        .or_insert(0);
    *count += 1;
    Ok(*count)
}

pub fn buy_character(progress: &mut Progress, character: &CharacterDescriptor) -> Result<(), ShopError> {
    if character.unlock_score == 0 {
        return Err(ShopError::NotPurchasable(character.id.clone()));
    }
    if character.is_unlocked(progress.high_score, &progress.purchased_chars) {
        return Err(ShopError::AlreadyOwned(character.id.clone()));
    }
    spend(progress, character_price(character))?;
    progress.purchased_chars.push(character.id.clone());
    log::info!("Bought character {}", character.id);
    Ok(())
}

/// Remember the selection; only unlocked characters can be picked
pub fn select_character(progress: &mut Progress, character: &CharacterDescriptor) -> Result<(), ShopError> {
    if !character.is_unlocked(progress.high_score, &progress.purchased_chars) {
        return Err(ShopError::Locked(character.id.clone()));
    }
    progress.selected_char = Some(character.id.clone());
    Ok(())
}

pub fn pay_for_revive(progress: &mut Progress) -> Result<(), ShopError> {
    spend(progress, REVIVE_COST)
}

/// Build run options from owned upgrades, using up one of each consumable
pub fn prepare_run(progress: &mut Progress) -> StartOptions {
    let mut take = |consumable: Consumable| match progress.consumables.get_mut(consumable.id()) {
        Some(count) if *count > 0 => {
            *count -= 1;
            true
        }
        _ => false,
    };
    let start_shield = take(Consumable::StartShield);
    let fever_start = take(Consumable::FeverStart);

    StartOptions {
        energy_master: progress.has_upgrade(Upgrade::EnergyMaster.id()),
        recovery_boost: progress.has_upgrade(Upgrade::RecoveryBoost.id()),
        coin_booster: progress.has_upgrade(Upgrade::CoinBooster.id()),
        item_luck: progress.has_upgrade(Upgrade::ItemLuck.id()),
        start_shield,
        fever_start,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::characters::{find, roster};

    fn wallet(coins: u64) -> Progress {
        Progress {
            total_coins: coins,
            ..Progress::default()
        }
    }

    #[test]
    fn test_upgrade_purchase() {
        let mut progress = wallet(450);
        buy_upgrade(&mut progress, Upgrade::ItemLuck).unwrap();
        assert_eq!(progress.total_coins, 200);
        assert_eq!(
            buy_upgrade(&mut progress, Upgrade::ItemLuck),
            Err(ShopError::AlreadyOwned("itemLuck".into()))
        );
        assert_eq!(
            buy_upgrade(&mut progress, Upgrade::CoinBooster),
            Err(ShopError::InsufficientCoins {
                needed: 300,
                available: 200
            })
        );
        assert_eq!(progress.total_coins, 200);
    }

    #[test]
    fn test_consumables_stack_and_are_used_once_per_run() {
        let mut progress = wallet(100);
        assert_eq!(buy_consumable(&mut progress, Consumable::StartShield), Ok(1));
        assert_eq!(buy_consumable(&mut progress, Consumable::StartShield), Ok(2));
        assert_eq!(progress.total_coins, 40);
        progress.upgrades.insert("energyMaster".into(), true);

        let first = prepare_run(&mut progress);
        assert!(first.start_shield);
        assert!(!first.fever_start);
        assert!(first.energy_master);
        assert_eq!(progress.consumable_count("startShield"), 1);

        prepare_run(&mut progress);
        let third = prepare_run(&mut progress);
        assert!(!third.start_shield);
        assert_eq!(progress.consumable_count("startShield"), 0);
    }

    #[test]
    fn test_character_purchase_rules() {
        let roster = roster();
        let default = find(&roster, "default").unwrap();
        let ninja = find(&roster, "ninja").unwrap();
        let robot = find(&roster, "robot").unwrap();

        let mut progress = wallet(250);
        assert_eq!(
            buy_character(&mut progress, default),
            Err(ShopError::NotPurchasable("default".into()))
        );
        assert!(matches!(
            buy_character(&mut progress, robot),
            Err(ShopError::InsufficientCoins { needed: 1000, .. })
        ));
        assert_eq!(select_character(&mut progress, ninja), Err(ShopError::Locked("ninja".into())));

        buy_character(&mut progress, ninja).unwrap();
        assert_eq!(progress.total_coins, 50);
        assert_eq!(
            buy_character(&mut progress, ninja),
            Err(ShopError::AlreadyOwned("ninja".into()))
        );
        select_character(&mut progress, ninja).unwrap();
        assert_eq!(progress.selected_char.as_deref(), Some("ninja"));
    }

    #[test]
    fn test_revive_costs_fifty() {
        let mut progress = wallet(60);
        pay_for_revive(&mut progress).unwrap();
        assert_eq!(progress.total_coins, 10);
        assert!(pay_for_revive(&mut progress).is_err());
        assert_eq!(progress.total_coins, 10);
    }

    #[test]
    fn test_ids_round_trip() {
        for upgrade in Upgrade::ALL {
            assert_eq!(Upgrade::from_id(upgrade.id()), Some(upgrade));
        }
        assert_eq!(Consumable::from_id("feverStart"), Some(Consumable::FeverStart));
        assert_eq!(Consumable::from_id("energy"), None);
    }
}
