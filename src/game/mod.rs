//! The authoritative game-state engine: stat mutation, progression,
//! inventory/currency bookkeeping, quest and achievement tracking, and
//! the trade marketplace.

pub mod engine;
pub mod errors;
pub mod ledger;
pub mod market;
pub mod progression;
pub mod quests;
pub mod seed;
pub mod stats;
pub mod storage;
pub mod types;

pub use engine::{GameEngine, GameSettings};
pub use errors::GameError;
pub use storage::{GameStore, GameStoreBuilder};
pub use types::{
    AchievementProgress, AchievementTemplate, AchievementTrigger, ActionKind, CatalogItem,
    CoinTransaction, ItemCategory, ItemInstance, OfferState, OfferView, PetRecord, PlayerRecord,
    PlayerSnapshot, QuestProgress, QuestTemplate, TradeOffer, TransactionReason, GAUGE_MAX,
    STARTING_COINS,
};
