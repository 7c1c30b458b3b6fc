//! Inventory and economy ledger: coin balance and owned-item bookkeeping.
//!
//! Balance mutations are pure functions over an already-loaded (and
//! locked) player record; the caller persists the record and appends the
//! matching audit entry in the same critical section so composite
//! operations stay all-or-nothing.

use uuid::Uuid;

use crate::game::errors::GameError;
use crate::game::storage::GameStore;
use crate::game::types::{CoinTransaction, ItemInstance, PlayerRecord, TransactionReason};

/// Remove coins. Fails with `InsufficientFunds` before any mutation, so
/// a balance can never go negative.
pub fn debit(player: &mut PlayerRecord, amount: i64) -> Result<(), GameError> {
    if player.coins < amount {
        return Err(GameError::InsufficientFunds);
    }
    player.coins -= amount;
    Ok(())
}

/// Add coins. Always succeeds.
pub fn credit(player: &mut PlayerRecord, amount: i64) {
    player.coins = player.coins.saturating_add(amount);
}

/// Place an item instance into the player's inventory.
pub fn add_item(player: &mut PlayerRecord, item: ItemInstance) {
    player.inventory.push(item);
}

/// Take an item instance out of the player's inventory.
///
/// Fails with `ItemNotFound` when the instance is not currently owned,
/// which is what stops the same item being escrowed or consumed twice by
/// racing requests.
pub fn remove_item(player: &mut PlayerRecord, item_id: &Uuid) -> Result<ItemInstance, GameError> {
    let position = player
        .inventory
        .iter()
        .position(|item| item.id == *item_id)
        .ok_or_else(|| GameError::ItemNotFound(item_id.to_string()))?;
    Ok(player.inventory.remove(position))
}

/// Buy a catalog item: debit the price, then mint the instance into the
/// player's inventory. If the debit fails nothing else runs.
pub fn purchase(
    store: &GameStore,
    player: &mut PlayerRecord,
    catalog_id: &str,
) -> Result<ItemInstance, GameError> {
    let template = store.get_catalog_item(catalog_id)?;
    debit(player, template.price)?;
    let item = template.mint();
    add_item(player, item.clone());
    store.append_transaction(&CoinTransaction::new(
        Some(&player.id),
        None,
        template.price,
        TransactionReason::Purchase,
    ))?;
    Ok(item)
}
