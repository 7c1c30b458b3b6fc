//! Trade marketplace: seller-created offers and buyer purchases across
//! the whole player population.
//!
//! The Open→Sold/Cancelled transition is the one globally contested
//! resource in the engine. Every composite mutation commits through a
//! single multi-tree transaction that re-checks the stored offer bytes:
//! of N concurrent buys against one offer, exactly one commit wins and
//! the rest observe `OfferAlreadyClosed` with none of their records
//! written. Callers must hold the involved players' locks (see
//! [`crate::game::engine`]) so fund checks stay valid through commit.

use uuid::Uuid;

use crate::game::errors::GameError;
use crate::game::ledger;
use crate::game::quests;
use crate::game::storage::GameStore;
use crate::game::types::{CoinTransaction, OfferView, TradeOffer, TransactionReason};

/// Escrow an owned item into a new open offer.
///
/// The item leaves the seller's inventory immediately; while the offer
/// is open it exists only in the offer's escrow snapshot.
pub fn create_offer(
    store: &GameStore,
    seller_id: &str,
    item_id: &Uuid,
    price: i64,
) -> Result<TradeOffer, GameError> {
    let mut seller = store.get_player(seller_id)?;
    let item = ledger::remove_item(&mut seller, item_id)?;
    let offer = TradeOffer::new(seller_id, item, price);
    store.commit_listing(offer.clone(), seller)?;
    Ok(offer)
}

/// All open offers as listing entries, oldest first, joined with each
/// seller's display name. When `exclude_seller` is set, that player's
/// own offers are filtered out (the browse view). Closed offers are
/// retained for audit but never listed.
pub fn list_open_offers(
    store: &GameStore,
    exclude_seller: Option<&str>,
    limit: usize,
) -> Result<Vec<OfferView>, GameError> {
    let mut views = Vec::new();
    for offer in store.list_open_offers()? {
        if exclude_seller == Some(offer.seller_id.as_str()) {
            continue;
        }
        let seller = store.get_player(&offer.seller_id)?;
        views.push(OfferView {
            id: offer.id,
            seller_id: offer.seller_id,
            seller_name: seller.display_name,
            item_name: offer.item.name,
            category: offer.item.category,
            effect: offer.item.effect,
            price: offer.price,
        });
        if views.len() >= limit {
            break;
        }
    }
    Ok(views)
}

/// Purchase an open offer.
///
/// Validates offer state, self-trade, and buyer funds, builds the
/// settled records in memory, then commits offer + both players + audit
/// entry in one transaction keyed on the stored offer bytes; whoever
/// commits first owns the purchase. Requires the buyer's and seller's
/// locks, taken by the caller in sorted id order.
pub fn buy(store: &GameStore, buyer_id: &str, offer_id: &Uuid) -> Result<TradeOffer, GameError> {
    let (offer, stored_bytes) = store.get_offer_with_bytes(offer_id)?;
    if !offer.is_open() {
        return Err(GameError::OfferAlreadyClosed(offer_id.to_string()));
    }
    if offer.seller_id == buyer_id {
        return Err(GameError::SelfTrade);
    }

    let mut buyer = store.get_player(buyer_id)?;
    if buyer.coins < offer.price {
        return Err(GameError::InsufficientFunds);
    }

    // Funds were verified under the buyer's lock, so this cannot fail.
    ledger::debit(&mut buyer, offer.price)?;
    ledger::add_item(&mut buyer, offer.item.clone());

    let mut seller = store.get_player(&offer.seller_id)?;
    ledger::credit(&mut seller, offer.price);
    quests::check_balance_achievements(store, &mut seller)?;
    quests::check_balance_achievements(store, &mut buyer)?;

    let sold = offer.clone().into_sold(buyer_id);
    let entry = CoinTransaction::new(
        Some(buyer_id),
        Some(&offer.seller_id),
        offer.price,
        TransactionReason::Trade,
    );
    if !store.commit_trade(&stored_bytes, sold.clone(), buyer, seller, &entry)? {
        return Err(GameError::OfferAlreadyClosed(offer_id.to_string()));
    }

    Ok(sold)
}

/// Cancel an open offer, returning the escrowed item to the seller.
///
/// Only the original seller may cancel; a cancelled offer can never be
/// bought, and its item becomes tradable again only via a new offer.
pub fn cancel_offer(
    store: &GameStore,
    caller_id: &str,
    offer_id: &Uuid,
) -> Result<TradeOffer, GameError> {
    let (offer, stored_bytes) = store.get_offer_with_bytes(offer_id)?;
    if offer.seller_id != caller_id {
        return Err(GameError::NotOwner);
    }
    if !offer.is_open() {
        return Err(GameError::OfferAlreadyClosed(offer_id.to_string()));
    }

    let mut seller = store.get_player(caller_id)?;
    ledger::add_item(&mut seller, offer.item.clone());
    let cancelled = offer.into_cancelled();
    if !store.commit_cancel(&stored_bytes, cancelled.clone(), seller)? {
        return Err(GameError::OfferAlreadyClosed(offer_id.to_string()));
    }

    Ok(cancelled)
}
