use std::path::{Path, PathBuf};

use chrono::Utc;
use sled::transaction::TransactionError;
use sled::{IVec, Transactional};

use crate::game::errors::GameError;
use crate::game::seed;
use crate::game::types::{
    AchievementTemplate, CatalogItem, CoinTransaction, OfferState, PetRecord, PlayerRecord,
    TradeOffer, OFFER_SCHEMA_VERSION, PET_SCHEMA_VERSION, PLAYER_SCHEMA_VERSION,
    TEMPLATE_SCHEMA_VERSION,
};
use crate::game::types::QuestTemplate;

const TREE_PRIMARY: &str = "petden";
const TREE_OFFERS: &str = "petden_offers";
const TREE_TEMPLATES: &str = "petden_templates";
const TREE_LEDGER: &str = "petden_ledger";

fn next_timestamp_nanos() -> i64 {
    let now = Utc::now();
    now.timestamp_nanos_opt()
        .unwrap_or_else(|| now.timestamp_micros() * 1000)
}

/// Helper builder so tests can easily create throwaway stores with custom paths.
pub struct GameStoreBuilder {
    path: PathBuf,
    seed_templates: bool,
}

impl GameStoreBuilder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            seed_templates: true,
        }
    }

    /// Opt out of seeding the canonical catalog/quest/achievement
    /// templates during initialization (useful for targeted tests).
    pub fn without_templates(mut self) -> Self {
        self.seed_templates = false;
        self
    }

    pub fn open(self) -> Result<GameStore, GameError> {
        GameStore::open_with_options(self.path, self.seed_templates)
    }
}

/// Sled-backed persistence for players, pets, trade offers, global
/// templates, and the coin-movement audit log.
pub struct GameStore {
    _db: sled::Db,
    primary: sled::Tree,
    offers: sled::Tree,
    templates: sled::Tree,
    ledger: sled::Tree,
}

impl GameStore {
    /// Open (or create) the store rooted at `path`. When `seed_templates`
    /// is true the canonical shop catalog, quests, and achievements are
    /// inserted if none exist yet.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, GameError> {
        Self::open_with_options(path, true)
    }

    fn open_with_options<P: AsRef<Path>>(path: P, seed_templates: bool) -> Result<Self, GameError> {
        let path_ref = path.as_ref();
        std::fs::create_dir_all(path_ref)?;
        let db = sled::open(path_ref)?;
        let primary = db.open_tree(TREE_PRIMARY)?;
        let offers = db.open_tree(TREE_OFFERS)?;
        let templates = db.open_tree(TREE_TEMPLATES)?;
        let ledger = db.open_tree(TREE_LEDGER)?;
        let store = Self {
            _db: db,
            primary,
            offers,
            templates,
            ledger,
        };

        if seed_templates {
            store.seed_templates_if_needed()?;
        }

        Ok(store)
    }

    fn player_key(player_id: &str) -> Vec<u8> {
        format!("players:{}", player_id).into_bytes()
    }

    fn pet_key(player_id: &str) -> Vec<u8> {
        format!("pets:{}", player_id).into_bytes()
    }

    fn offer_key(offer_id: &uuid::Uuid) -> Vec<u8> {
        offer_id.to_string().into_bytes()
    }

    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>, GameError> {
        Ok(bincode::serialize(value)?)
    }

    fn deserialize<T: serde::de::DeserializeOwned>(bytes: &IVec) -> Result<T, GameError> {
        Ok(bincode::deserialize::<T>(bytes)?)
    }

    fn player_bytes(mut player: PlayerRecord) -> Result<Vec<u8>, GameError> {
        player.schema_version = PLAYER_SCHEMA_VERSION;
        player.touch();
        Self::serialize(&player)
    }

    fn pet_bytes(mut pet: PetRecord) -> Result<Vec<u8>, GameError> {
        pet.schema_version = PET_SCHEMA_VERSION;
        Self::serialize(&pet)
    }

    fn offer_bytes(mut offer: TradeOffer) -> Result<Vec<u8>, GameError> {
        offer.schema_version = OFFER_SCHEMA_VERSION;
        Self::serialize(&offer)
    }

    fn transaction_key(transaction: &CoinTransaction) -> Vec<u8> {
        format!("tx:{:020}:{}", next_timestamp_nanos(), transaction.id).into_bytes()
    }

    // ------------------------------------------------------------------
    // Players and pets
    // ------------------------------------------------------------------

    /// Insert or update a player record.
    pub fn put_player(&self, player: PlayerRecord) -> Result<(), GameError> {
        let key = Self::player_key(&player.id);
        let bytes = Self::player_bytes(player)?;
        self.primary.insert(key, bytes)?;
        self.primary.flush()?;
        Ok(())
    }

    /// Fetch a player record by id.
    pub fn get_player(&self, player_id: &str) -> Result<PlayerRecord, GameError> {
        let key = Self::player_key(player_id);
        let Some(bytes) = self.primary.get(&key)? else {
            return Err(GameError::PlayerNotFound(player_id.to_string()));
        };
        let record: PlayerRecord = Self::deserialize(&bytes)?;
        if record.schema_version != PLAYER_SCHEMA_VERSION {
            return Err(GameError::SchemaMismatch {
                entity: "player",
                expected: PLAYER_SCHEMA_VERSION,
                found: record.schema_version,
            });
        }
        Ok(record)
    }

    /// List all registered player ids.
    pub fn list_player_ids(&self) -> Result<Vec<String>, GameError> {
        let mut ids = Vec::new();
        for entry in self.primary.scan_prefix(b"players:") {
            let (key, _) = entry?;
            let text = String::from_utf8_lossy(&key);
            if let Some(id) = text.strip_prefix("players:") {
                ids.push(id.to_string());
            }
        }
        Ok(ids)
    }

    /// Insert or update the pet owned by a player.
    pub fn put_pet(&self, pet: PetRecord) -> Result<(), GameError> {
        let key = Self::pet_key(&pet.owner_id);
        let bytes = Self::pet_bytes(pet)?;
        self.primary.insert(key, bytes)?;
        self.primary.flush()?;
        Ok(())
    }

    /// Fetch the pet owned by a player. Pets are 1:1 with players, so a
    /// missing pet means the player was never registered.
    pub fn get_pet(&self, player_id: &str) -> Result<PetRecord, GameError> {
        let key = Self::pet_key(player_id);
        let Some(bytes) = self.primary.get(&key)? else {
            return Err(GameError::PlayerNotFound(player_id.to_string()));
        };
        let record: PetRecord = Self::deserialize(&bytes)?;
        if record.schema_version != PET_SCHEMA_VERSION {
            return Err(GameError::SchemaMismatch {
                entity: "pet",
                expected: PET_SCHEMA_VERSION,
                found: record.schema_version,
            });
        }
        Ok(record)
    }

    // ------------------------------------------------------------------
    // Trade offers
    // ------------------------------------------------------------------

    /// Insert a new trade offer.
    pub fn put_offer(&self, offer: TradeOffer) -> Result<(), GameError> {
        let key = Self::offer_key(&offer.id);
        let bytes = Self::offer_bytes(offer)?;
        self.offers.insert(key, bytes)?;
        self.offers.flush()?;
        Ok(())
    }

    /// Fetch an offer along with its stored byte image, for use as the
    /// `expected` argument of [`GameStore::commit_trade`] and
    /// [`GameStore::commit_cancel`].
    pub fn get_offer_with_bytes(
        &self,
        offer_id: &uuid::Uuid,
    ) -> Result<(TradeOffer, IVec), GameError> {
        let key = Self::offer_key(offer_id);
        let Some(bytes) = self.offers.get(&key)? else {
            return Err(GameError::OfferNotFound(offer_id.to_string()));
        };
        let record: TradeOffer = Self::deserialize(&bytes)?;
        if record.schema_version != OFFER_SCHEMA_VERSION {
            return Err(GameError::SchemaMismatch {
                entity: "offer",
                expected: OFFER_SCHEMA_VERSION,
                found: record.schema_version,
            });
        }
        Ok((record, bytes))
    }

    /// Fetch an offer by id.
    pub fn get_offer(&self, offer_id: &uuid::Uuid) -> Result<TradeOffer, GameError> {
        self.get_offer_with_bytes(offer_id).map(|(offer, _)| offer)
    }

    /// Persist a new offer together with the seller record the escrowed
    /// item was removed from. Committed as one transaction: the item is
    /// never durably in both the inventory and the offer, and a failure
    /// loses the listing rather than duplicating the item.
    pub fn commit_listing(
        &self,
        offer: TradeOffer,
        seller: PlayerRecord,
    ) -> Result<(), GameError> {
        let offer_key = Self::offer_key(&offer.id);
        let offer_bytes = Self::offer_bytes(offer)?;
        let seller_key = Self::player_key(&seller.id);
        let seller_bytes = Self::player_bytes(seller)?;

        let result: Result<(), TransactionError<()>> = (&self.offers, &self.primary)
            .transaction(|(offers, primary)| {
                offers.insert(offer_key.as_slice(), offer_bytes.clone())?;
                primary.insert(seller_key.as_slice(), seller_bytes.clone())?;
                Ok(())
            });
        match result {
            Ok(()) | Err(TransactionError::Abort(())) => {}
            Err(TransactionError::Storage(error)) => return Err(error.into()),
        }
        self.offers.flush()?;
        self.primary.flush()?;
        Ok(())
    }

    /// Settle a purchase: flip the offer to sold and persist both updated
    /// player records and the audit entry in one transaction. The commit
    /// succeeds only if the stored offer bytes still equal `expected`,
    /// which serializes competing buyers: exactly one concurrent caller
    /// wins the Open→Sold transition, and a loser's records are never
    /// written.
    pub fn commit_trade(
        &self,
        expected: &IVec,
        sold: TradeOffer,
        buyer: PlayerRecord,
        seller: PlayerRecord,
        entry: &CoinTransaction,
    ) -> Result<bool, GameError> {
        let offer_key = Self::offer_key(&sold.id);
        let offer_bytes = Self::offer_bytes(sold)?;
        let buyer_key = Self::player_key(&buyer.id);
        let buyer_bytes = Self::player_bytes(buyer)?;
        let seller_key = Self::player_key(&seller.id);
        let seller_bytes = Self::player_bytes(seller)?;
        let entry_key = Self::transaction_key(entry);
        let entry_bytes = Self::serialize(entry)?;

        let result: Result<bool, TransactionError<()>> =
            (&self.offers, &self.primary, &self.ledger).transaction(
                |(offers, primary, ledger)| {
                    if offers.get(offer_key.as_slice())?.as_ref() != Some(expected) {
                        return Ok(false);
                    }
                    offers.insert(offer_key.as_slice(), offer_bytes.clone())?;
                    primary.insert(buyer_key.as_slice(), buyer_bytes.clone())?;
                    primary.insert(seller_key.as_slice(), seller_bytes.clone())?;
                    ledger.insert(entry_key.as_slice(), entry_bytes.clone())?;
                    Ok(true)
                },
            );
        let committed = match result {
            Ok(committed) => committed,
            Err(TransactionError::Abort(())) => false,
            Err(TransactionError::Storage(error)) => return Err(error.into()),
        };
        if committed {
            self.offers.flush()?;
            self.primary.flush()?;
            self.ledger.flush()?;
        }
        Ok(committed)
    }

    /// Cancel an offer: flip it to cancelled and return the escrowed item
    /// to the seller record, committed together. Succeeds only if the
    /// stored offer bytes still equal `expected`, so a cancel racing a
    /// buy cannot duplicate the item.
    pub fn commit_cancel(
        &self,
        expected: &IVec,
        cancelled: TradeOffer,
        seller: PlayerRecord,
    ) -> Result<bool, GameError> {
        let offer_key = Self::offer_key(&cancelled.id);
        let offer_bytes = Self::offer_bytes(cancelled)?;
        let seller_key = Self::player_key(&seller.id);
        let seller_bytes = Self::player_bytes(seller)?;

        let result: Result<bool, TransactionError<()>> = (&self.offers, &self.primary)
            .transaction(|(offers, primary)| {
                if offers.get(offer_key.as_slice())?.as_ref() != Some(expected) {
                    return Ok(false);
                }
                offers.insert(offer_key.as_slice(), offer_bytes.clone())?;
                primary.insert(seller_key.as_slice(), seller_bytes.clone())?;
                Ok(true)
            });
        let committed = match result {
            Ok(committed) => committed,
            Err(TransactionError::Abort(())) => false,
            Err(TransactionError::Storage(error)) => return Err(error.into()),
        };
        if committed {
            self.offers.flush()?;
            self.primary.flush()?;
        }
        Ok(committed)
    }

    /// Persist a new player, their pet, and the starting-balance audit
    /// entry in one transaction, so a half-registered player can never
    /// exist.
    pub fn commit_registration(
        &self,
        player: PlayerRecord,
        pet: PetRecord,
        entry: &CoinTransaction,
    ) -> Result<(), GameError> {
        let player_key = Self::player_key(&player.id);
        let pet_key = Self::pet_key(&pet.owner_id);
        let player_bytes = Self::player_bytes(player)?;
        let pet_bytes = Self::pet_bytes(pet)?;
        let entry_key = Self::transaction_key(entry);
        let entry_bytes = Self::serialize(entry)?;

        let result: Result<(), TransactionError<()>> = (&self.primary, &self.ledger)
            .transaction(|(primary, ledger)| {
                primary.insert(player_key.as_slice(), player_bytes.clone())?;
                primary.insert(pet_key.as_slice(), pet_bytes.clone())?;
                ledger.insert(entry_key.as_slice(), entry_bytes.clone())?;
                Ok(())
            });
        match result {
            Ok(()) | Err(TransactionError::Abort(())) => {}
            Err(TransactionError::Storage(error)) => return Err(error.into()),
        }
        self.primary.flush()?;
        self.ledger.flush()?;
        Ok(())
    }

    /// All open offers, oldest first. Sold and cancelled offers are
    /// retained for audit but never listed.
    pub fn list_open_offers(&self) -> Result<Vec<TradeOffer>, GameError> {
        let mut open = Vec::new();
        for entry in self.offers.iter() {
            let (_, bytes) = entry?;
            let offer: TradeOffer = Self::deserialize(&bytes)?;
            if matches!(offer.state, OfferState::Open) {
                open.push(offer);
            }
        }
        open.sort_by_key(|offer| offer.created_at);
        Ok(open)
    }

    /// Total number of offers ever created (all states).
    pub fn count_offers(&self) -> usize {
        self.offers.len()
    }

    // ------------------------------------------------------------------
    // Global templates (catalog, quests, achievements)
    // ------------------------------------------------------------------

    pub fn put_catalog_item(&self, mut item: CatalogItem) -> Result<(), GameError> {
        item.schema_version = TEMPLATE_SCHEMA_VERSION;
        let key = format!("catalog:{}", item.id).into_bytes();
        let bytes = Self::serialize(&item)?;
        self.templates.insert(key, bytes)?;
        self.templates.flush()?;
        Ok(())
    }

    pub fn get_catalog_item(&self, catalog_id: &str) -> Result<CatalogItem, GameError> {
        let key = format!("catalog:{}", catalog_id).into_bytes();
        let bytes = self
            .templates
            .get(key)?
            .ok_or_else(|| GameError::TemplateNotFound(format!("catalog: {}", catalog_id)))?;
        Self::deserialize(&bytes)
    }

    pub fn list_catalog(&self) -> Result<Vec<CatalogItem>, GameError> {
        let mut items = Vec::new();
        for entry in self.templates.scan_prefix(b"catalog:") {
            let (_, bytes) = entry?;
            items.push(Self::deserialize(&bytes)?);
        }
        Ok(items)
    }

    pub fn put_quest_template(&self, mut quest: QuestTemplate) -> Result<(), GameError> {
        quest.schema_version = TEMPLATE_SCHEMA_VERSION;
        let key = format!("quests:{}", quest.id).into_bytes();
        let bytes = Self::serialize(&quest)?;
        self.templates.insert(key, bytes)?;
        self.templates.flush()?;
        Ok(())
    }

    pub fn list_quest_templates(&self) -> Result<Vec<QuestTemplate>, GameError> {
        let mut quests = Vec::new();
        for entry in self.templates.scan_prefix(b"quests:") {
            let (_, bytes) = entry?;
            quests.push(Self::deserialize(&bytes)?);
        }
        Ok(quests)
    }

    pub fn put_achievement_template(
        &self,
        mut achievement: AchievementTemplate,
    ) -> Result<(), GameError> {
        achievement.schema_version = TEMPLATE_SCHEMA_VERSION;
        let key = format!("achievements:{}", achievement.id).into_bytes();
        let bytes = Self::serialize(&achievement)?;
        self.templates.insert(key, bytes)?;
        self.templates.flush()?;
        Ok(())
    }

    pub fn list_achievement_templates(&self) -> Result<Vec<AchievementTemplate>, GameError> {
        let mut achievements = Vec::new();
        for entry in self.templates.scan_prefix(b"achievements:") {
            let (_, bytes) = entry?;
            achievements.push(Self::deserialize(&bytes)?);
        }
        Ok(achievements)
    }

    /// Seed the canonical templates on first open only.
    pub fn seed_templates_if_needed(&self) -> Result<usize, GameError> {
        if self.templates.scan_prefix(b"catalog:").next().is_some() {
            return Ok(0);
        }
        let mut inserted = 0usize;
        for item in seed::canonical_catalog() {
            self.put_catalog_item(item)?;
            inserted += 1;
        }
        for quest in seed::canonical_quests() {
            self.put_quest_template(quest)?;
            inserted += 1;
        }
        for achievement in seed::canonical_achievements() {
            self.put_achievement_template(achievement)?;
            inserted += 1;
        }
        Ok(inserted)
    }

    // ------------------------------------------------------------------
    // Coin-movement audit log
    // ------------------------------------------------------------------

    /// Append a coin-movement record to the audit log.
    pub fn append_transaction(&self, transaction: &CoinTransaction) -> Result<(), GameError> {
        let key = Self::transaction_key(transaction);
        let bytes = Self::serialize(transaction)?;
        self.ledger.insert(key, bytes)?;
        self.ledger.flush()?;
        Ok(())
    }

    /// All recorded coin movements, oldest first.
    pub fn list_transactions(&self) -> Result<Vec<CoinTransaction>, GameError> {
        let mut transactions = Vec::new();
        for entry in self.ledger.scan_prefix(b"tx:") {
            let (_, bytes) = entry?;
            transactions.push(Self::deserialize(&bytes)?);
        }
        Ok(transactions)
    }
}
