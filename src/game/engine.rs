//! Engine facade: one entry point per client action, with per-player
//! serialization.
//!
//! Every mutating operation on a player runs under that player's lock,
//! so read-modify-write cycles on one pet/balance/inventory never
//! interleave. Operations on different players proceed in parallel; the
//! only cross-player contention is the conditional offer commit inside
//! [`crate::game::market`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, info};
use uuid::Uuid;

use crate::game::errors::GameError;
use crate::game::ledger;
use crate::game::market;
use crate::game::quests;
use crate::game::seed;
use crate::game::stats;
use crate::game::storage::GameStore;
use crate::game::types::{
    AchievementView, ActionKind, CatalogItem, CoinTransaction, OfferView, PetRecord, PetView,
    PlayerRecord, PlayerSnapshot, QuestView, TradeOffer, TransactionReason, STARTING_COINS,
};

/// Runtime tunables, loaded from the `[game]` config section.
#[derive(Debug, Clone)]
pub struct GameSettings {
    /// Maximum entries returned by an offer listing.
    pub offer_listing_limit: usize,
    /// Maximum length accepted for player and pet names.
    pub max_name_length: usize,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            offer_listing_limit: 20,
            max_name_length: 32,
        }
    }
}

type LockRegistry = Mutex<HashMap<String, Arc<Mutex<()>>>>;

/// The authoritative game-state engine.
pub struct GameEngine {
    store: GameStore,
    settings: GameSettings,
    locks: LockRegistry,
}

fn relock<'a, T>(guard: Result<MutexGuard<'a, T>, PoisonError<MutexGuard<'a, T>>>) -> MutexGuard<'a, T> {
    // A poisoned player lock only means another thread panicked while
    // holding it; the store itself stays consistent because records are
    // written whole.
    guard.unwrap_or_else(PoisonError::into_inner)
}

impl GameEngine {
    pub fn new(store: GameStore, settings: GameSettings) -> Self {
        Self {
            store,
            settings,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &GameStore {
        &self.store
    }

    fn player_lock(&self, player_id: &str) -> Arc<Mutex<()>> {
        let mut registry = relock(self.locks.lock());
        registry
            .entry(player_id.to_string())
            .or_default()
            .clone()
    }

    fn validate_name(&self, name: &str) -> Result<(), GameError> {
        let trimmed = name.trim();
        if trimmed.is_empty() || trimmed.len() > self.settings.max_name_length {
            return Err(GameError::InvalidRequest(format!("invalid name: {:?}", name)));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Registration and snapshots
    // ------------------------------------------------------------------

    /// Create a player and their pet with the canonical starting state:
    /// starting coins, starter inventory, and the adoption achievement.
    /// Returns the new opaque player id and the first snapshot.
    pub fn register(
        &self,
        display_name: &str,
        pet_name: &str,
    ) -> Result<(String, PlayerSnapshot), GameError> {
        self.validate_name(display_name)?;
        self.validate_name(pet_name)?;

        let player_id = Uuid::new_v4().to_string();
        let mut player = PlayerRecord::new(&player_id, display_name.trim());
        player.inventory = seed::starter_inventory();
        quests::record_adoption(&self.store, &mut player)?;

        let pet = PetRecord::new(&player_id, pet_name.trim());
        let grant = CoinTransaction::new(
            None,
            Some(&player_id),
            STARTING_COINS,
            TransactionReason::Registration,
        );
        self.store
            .commit_registration(player.clone(), pet.clone(), &grant)?;

        info!("registered player {} ({})", player_id, player.display_name);
        let snapshot = self.build_snapshot(&player, &pet)?;
        Ok((player_id, snapshot))
    }

    /// Read-only authoritative snapshot of one player.
    pub fn snapshot(&self, player_id: &str) -> Result<PlayerSnapshot, GameError> {
        let player = self.store.get_player(player_id)?;
        let pet = self.store.get_pet(player_id)?;
        self.build_snapshot(&player, &pet)
    }

    fn build_snapshot(
        &self,
        player: &PlayerRecord,
        pet: &PetRecord,
    ) -> Result<PlayerSnapshot, GameError> {
        let mut quest_views = Vec::new();
        for template in self.store.list_quest_templates()? {
            let (progress, completed) = player
                .quests
                .iter()
                .find(|q| q.quest_id == template.id)
                .map(|q| (q.progress, q.completed))
                .unwrap_or((0, false));
            quest_views.push(QuestView {
                id: template.id,
                description: template.description,
                progress,
                goal: template.goal,
                reward: template.reward,
                completed,
            });
        }

        let mut achievement_views = Vec::new();
        for template in self.store.list_achievement_templates()? {
            let earned = player
                .achievements
                .iter()
                .any(|a| a.achievement_id == template.id && a.earned);
            achievement_views.push(AchievementView {
                id: template.id,
                description: template.description,
                earned,
            });
        }

        Ok(PlayerSnapshot {
            player_id: player.id.clone(),
            display_name: player.display_name.clone(),
            pet: PetView::from(pet),
            coins: player.coins,
            level: player.level,
            experience: player.experience,
            experience_to_next: player.experience_to_next,
            inventory: player.inventory.clone(),
            quests: quest_views,
            achievements: achievement_views,
        })
    }

    // ------------------------------------------------------------------
    // Pet actions
    // ------------------------------------------------------------------

    fn pet_action<F>(
        &self,
        player_id: &str,
        action: ActionKind,
        mutate: F,
    ) -> Result<PlayerSnapshot, GameError>
    where
        F: FnOnce(&mut PetRecord, &mut PlayerRecord) -> Result<(), GameError>,
    {
        let lock = self.player_lock(player_id);
        let _guard = relock(lock.lock());

        let mut pet = self.store.get_pet(player_id)?;
        let mut player = self.store.get_player(player_id)?;
        mutate(&mut pet, &mut player)?;
        let outcome = quests::record_action(&self.store, &mut player, action)?;
        self.store.put_pet(pet.clone())?;
        self.store.put_player(player.clone())?;

        if !outcome.completed_quests.is_empty() || !outcome.earned_achievements.is_empty() {
            debug!(
                "player {}: quests completed {:?}, achievements earned {:?}",
                player_id, outcome.completed_quests, outcome.earned_achievements
            );
        }
        self.build_snapshot(&player, &pet)
    }

    pub fn feed(&self, player_id: &str) -> Result<PlayerSnapshot, GameError> {
        self.pet_action(player_id, ActionKind::Feed, stats::feed)
    }

    pub fn play(&self, player_id: &str) -> Result<PlayerSnapshot, GameError> {
        self.pet_action(player_id, ActionKind::Play, stats::play)
    }

    pub fn heal(&self, player_id: &str) -> Result<PlayerSnapshot, GameError> {
        self.pet_action(player_id, ActionKind::Heal, stats::heal)
    }

    pub fn rest(&self, player_id: &str) -> Result<PlayerSnapshot, GameError> {
        self.pet_action(player_id, ActionKind::Rest, stats::rest)
    }

    /// Consume an owned item on the pet. No action event and no
    /// experience: only direct actions drive quests and progression.
    pub fn use_item(&self, player_id: &str, item_id: &Uuid) -> Result<PlayerSnapshot, GameError> {
        let lock = self.player_lock(player_id);
        let _guard = relock(lock.lock());

        let mut pet = self.store.get_pet(player_id)?;
        let mut player = self.store.get_player(player_id)?;
        let consumed = stats::use_item(&mut pet, &mut player, item_id)?;
        self.store.put_pet(pet.clone())?;
        self.store.put_player(player.clone())?;
        debug!("player {} consumed {}", player_id, consumed.name);
        self.build_snapshot(&player, &pet)
    }

    // ------------------------------------------------------------------
    // Shop
    // ------------------------------------------------------------------

    pub fn catalog(&self) -> Result<Vec<CatalogItem>, GameError> {
        self.store.list_catalog()
    }

    /// Buy a catalog item: debit then mint, all-or-nothing, followed by
    /// a Purchase action event.
    pub fn purchase(
        &self,
        player_id: &str,
        catalog_id: &str,
    ) -> Result<PlayerSnapshot, GameError> {
        let lock = self.player_lock(player_id);
        let _guard = relock(lock.lock());

        let mut player = self.store.get_player(player_id)?;
        let pet = self.store.get_pet(player_id)?;
        let item = ledger::purchase(&self.store, &mut player, catalog_id)?;
        quests::record_action(&self.store, &mut player, ActionKind::Purchase)?;
        self.store.put_player(player.clone())?;
        debug!("player {} bought {} from the shop", player_id, item.name);
        self.build_snapshot(&player, &pet)
    }

    // ------------------------------------------------------------------
    // Marketplace
    // ------------------------------------------------------------------

    pub fn create_offer(
        &self,
        player_id: &str,
        item_id: &Uuid,
        price: i64,
    ) -> Result<TradeOffer, GameError> {
        if price <= 0 {
            return Err(GameError::InvalidRequest(format!(
                "invalid asking price: {}",
                price
            )));
        }
        let lock = self.player_lock(player_id);
        let _guard = relock(lock.lock());
        let offer = market::create_offer(&self.store, player_id, item_id, price)?;
        info!(
            "player {} listed {} for {} coins (offer {})",
            player_id, offer.item.name, price, offer.id
        );
        Ok(offer)
    }

    pub fn list_offers(&self, exclude_seller: Option<&str>) -> Result<Vec<OfferView>, GameError> {
        market::list_open_offers(&self.store, exclude_seller, self.settings.offer_listing_limit)
    }

    /// Buy an open offer. Locks buyer and seller in sorted id order,
    /// then defers to the market's transactional settlement.
    pub fn buy_offer(&self, player_id: &str, offer_id: &Uuid) -> Result<PlayerSnapshot, GameError> {
        let offer = self.store.get_offer(offer_id)?;
        if offer.seller_id == player_id {
            return Err(GameError::SelfTrade);
        }

        let buyer_lock = self.player_lock(player_id);
        let seller_lock = self.player_lock(&offer.seller_id);
        let (first, second) = if player_id < offer.seller_id.as_str() {
            (&buyer_lock, &seller_lock)
        } else {
            (&seller_lock, &buyer_lock)
        };
        let _first_guard = relock(first.lock());
        let _second_guard = relock(second.lock());

        let sold = market::buy(&self.store, player_id, offer_id)?;
        info!(
            "offer {} sold to {} for {} coins",
            sold.id, player_id, sold.price
        );
        self.snapshot(player_id)
    }

    /// Cancel an own open offer, returning the escrowed item.
    pub fn cancel_offer(
        &self,
        player_id: &str,
        offer_id: &Uuid,
    ) -> Result<PlayerSnapshot, GameError> {
        let lock = self.player_lock(player_id);
        let _guard = relock(lock.lock());
        let cancelled = market::cancel_offer(&self.store, player_id, offer_id)?;
        info!("offer {} cancelled by {}", cancelled.id, player_id);
        self.snapshot(player_id)
    }
}
