//! Stat engine: bounded gauge mutations for the four pet vitals.
//!
//! Every operation validates its precondition before touching anything,
//! so a failure never leaves a half-applied update. Callers are expected
//! to hold the owning player's lock for the whole read-modify-write.

use chrono::Utc;

use crate::game::errors::GameError;
use crate::game::progression;
use crate::game::types::{ItemCategory, ItemInstance, PetRecord, PlayerRecord, GAUGE_MAX};

pub const FEED_HUNGER: u8 = 20;
pub const FEED_HAPPINESS: u8 = 5;
pub const FEED_XP: u64 = 10;

pub const PLAY_HAPPINESS: u8 = 25;
pub const PLAY_ENERGY_COST: u8 = 15;
pub const PLAY_XP: u64 = 15;

pub const HEAL_HEALTH: u8 = 30;
pub const HEAL_XP: u64 = 5;

pub const REST_ENERGY: u8 = 40;
pub const REST_XP: u64 = 5;

fn raise(gauge: u8, amount: u8) -> u8 {
    gauge.saturating_add(amount).min(GAUGE_MAX)
}

/// Feed the pet. Fails with `AlreadySatisfied` when hunger is full.
pub fn feed(pet: &mut PetRecord, player: &mut PlayerRecord) -> Result<(), GameError> {
    if pet.hunger >= GAUGE_MAX {
        return Err(GameError::AlreadySatisfied);
    }
    pet.hunger = raise(pet.hunger, FEED_HUNGER);
    pet.happiness = raise(pet.happiness, FEED_HAPPINESS);
    pet.last_fed = Some(Utc::now());
    progression::award_experience(player, FEED_XP);
    Ok(())
}

/// Play with the pet. Fails with `InsufficientEnergy` below the energy cost.
pub fn play(pet: &mut PetRecord, player: &mut PlayerRecord) -> Result<(), GameError> {
    if pet.energy < PLAY_ENERGY_COST {
        return Err(GameError::InsufficientEnergy);
    }
    pet.happiness = raise(pet.happiness, PLAY_HAPPINESS);
    pet.energy -= PLAY_ENERGY_COST;
    pet.last_played = Some(Utc::now());
    progression::award_experience(player, PLAY_XP);
    Ok(())
}

/// Heal the pet. Fails with `AlreadyHealthy` when health is full.
pub fn heal(pet: &mut PetRecord, player: &mut PlayerRecord) -> Result<(), GameError> {
    if pet.health >= GAUGE_MAX {
        return Err(GameError::AlreadyHealthy);
    }
    pet.health = raise(pet.health, HEAL_HEALTH);
    progression::award_experience(player, HEAL_XP);
    Ok(())
}

/// Rest always succeeds.
pub fn rest(pet: &mut PetRecord, player: &mut PlayerRecord) -> Result<(), GameError> {
    pet.energy = raise(pet.energy, REST_ENERGY);
    progression::award_experience(player, REST_XP);
    Ok(())
}

/// Consume an owned item, applying its effect to the matching gauge.
///
/// Removes the instance from the inventory and returns it. Consuming an
/// item awards no experience; only direct actions do.
pub fn use_item(
    pet: &mut PetRecord,
    player: &mut PlayerRecord,
    item_id: &uuid::Uuid,
) -> Result<ItemInstance, GameError> {
    let position = player
        .inventory
        .iter()
        .position(|item| item.id == *item_id)
        .ok_or_else(|| GameError::ItemNotFound(item_id.to_string()))?;
    let item = player.inventory.remove(position);

    match item.category {
        ItemCategory::Food => pet.hunger = raise(pet.hunger, item.effect),
        ItemCategory::Toy => pet.happiness = raise(pet.happiness, item.effect),
        ItemCategory::Health => pet.health = raise(pet.health, item.effect),
    }

    Ok(item)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::types::ItemCategory;

    fn fixtures() -> (PetRecord, PlayerRecord) {
        (PetRecord::new("p1", "Rex"), PlayerRecord::new("p1", "Alice"))
    }

    #[test]
    fn feed_raises_hunger_and_happiness() {
        let (mut pet, mut player) = fixtures();
        pet.hunger = 75;
        pet.happiness = 80;

        feed(&mut pet, &mut player).unwrap();
        assert_eq!(pet.hunger, 95);
        assert_eq!(pet.happiness, 85);
        assert_eq!(player.experience, FEED_XP);
        assert!(pet.last_fed.is_some());
    }

    #[test]
    fn feed_clamps_at_gauge_max() {
        let (mut pet, mut player) = fixtures();
        pet.hunger = 95;
        pet.happiness = 99;

        feed(&mut pet, &mut player).unwrap();
        assert_eq!(pet.hunger, GAUGE_MAX);
        assert_eq!(pet.happiness, GAUGE_MAX);
    }

    #[test]
    fn feed_full_pet_is_rejected_without_mutation() {
        let (mut pet, mut player) = fixtures();
        pet.hunger = GAUGE_MAX;
        let happiness_before = pet.happiness;

        let err = feed(&mut pet, &mut player).unwrap_err();
        assert!(matches!(err, GameError::AlreadySatisfied));
        assert_eq!(pet.hunger, GAUGE_MAX);
        assert_eq!(pet.happiness, happiness_before);
        assert_eq!(player.experience, 0);
    }

    #[test]
    fn play_boundary_at_energy_cost() {
        let (mut pet, mut player) = fixtures();
        pet.energy = 14;
        assert!(matches!(
            play(&mut pet, &mut player),
            Err(GameError::InsufficientEnergy)
        ));
        assert_eq!(pet.energy, 14);

        pet.energy = 15;
        play(&mut pet, &mut player).unwrap();
        assert_eq!(pet.energy, 0);
        assert_eq!(player.experience, PLAY_XP);
    }

    #[test]
    fn heal_full_pet_is_rejected() {
        let (mut pet, mut player) = fixtures();
        pet.health = GAUGE_MAX;
        assert!(matches!(
            heal(&mut pet, &mut player),
            Err(GameError::AlreadyHealthy)
        ));

        pet.health = 60;
        heal(&mut pet, &mut player).unwrap();
        assert_eq!(pet.health, 90);
    }

    #[test]
    fn rest_always_succeeds_and_clamps() {
        let (mut pet, mut player) = fixtures();
        pet.energy = 90;
        rest(&mut pet, &mut player).unwrap();
        assert_eq!(pet.energy, GAUGE_MAX);
        rest(&mut pet, &mut player).unwrap();
        assert_eq!(pet.energy, GAUGE_MAX);
    }

    #[test]
    fn use_item_applies_effect_and_removes_instance() {
        let (mut pet, mut player) = fixtures();
        pet.hunger = 50;
        let apple = ItemInstance::new("Apple", ItemCategory::Food, 15, 10);
        let apple_id = apple.id;
        player.inventory.push(apple);

        let consumed = use_item(&mut pet, &mut player, &apple_id).unwrap();
        assert_eq!(consumed.id, apple_id);
        assert_eq!(pet.hunger, 65);
        assert!(player.inventory.is_empty());
        // Policy: consuming an item never awards experience.
        assert_eq!(player.experience, 0);
    }

    #[test]
    fn use_item_missing_is_item_not_found() {
        let (mut pet, mut player) = fixtures();
        let ghost = uuid::Uuid::new_v4();
        assert!(matches!(
            use_item(&mut pet, &mut player, &ghost),
            Err(GameError::ItemNotFound(_))
        ));
    }
}
