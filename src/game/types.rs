use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::game::progression;

pub const PLAYER_SCHEMA_VERSION: u8 = 1;
pub const PET_SCHEMA_VERSION: u8 = 1;
pub const OFFER_SCHEMA_VERSION: u8 = 1;
pub const TEMPLATE_SCHEMA_VERSION: u8 = 1;

/// Upper bound for every pet gauge (hunger, happiness, health, energy).
pub const GAUGE_MAX: u8 = 100;

/// Coins granted to a freshly registered player.
pub const STARTING_COINS: i64 = 120;

/// What a consumable item affects when used on a pet.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ItemCategory {
    /// Restores hunger.
    Food,
    /// Restores happiness.
    Toy,
    /// Restores health.
    Health,
}

/// Player-visible actions that drive quest and achievement progress.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Feed,
    Play,
    Heal,
    Rest,
    Purchase,
}

/// A concrete item owned by exactly one player, or held in escrow by
/// exactly one open trade offer. Never both, never neither.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ItemInstance {
    pub id: Uuid,
    pub name: String,
    pub category: ItemCategory,
    /// Gauge points restored when the item is consumed.
    pub effect: u8,
    /// Price the item was acquired for (shop price or trade price).
    pub price: i64,
}

impl ItemInstance {
    pub fn new(name: &str, category: ItemCategory, effect: u8, price: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            category,
            effect,
            price,
        }
    }
}

/// Shop template an item instance is minted from at purchase time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CatalogItem {
    pub id: String,
    pub name: String,
    pub category: ItemCategory,
    pub effect: u8,
    pub price: i64,
    pub schema_version: u8,
}

impl CatalogItem {
    pub fn new(id: &str, name: &str, category: ItemCategory, effect: u8, price: i64) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            category,
            effect,
            price,
            schema_version: TEMPLATE_SCHEMA_VERSION,
        }
    }

    /// Mint a fresh owned instance from this template.
    pub fn mint(&self) -> ItemInstance {
        ItemInstance::new(&self.name, self.category, self.effect, self.price)
    }
}

/// Global quest definition. Progress lives on each player record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuestTemplate {
    pub id: String,
    pub description: String,
    /// Action that advances this quest.
    pub action: ActionKind,
    pub goal: u32,
    /// Coins granted once, at the progress == goal transition.
    pub reward: i64,
    pub schema_version: u8,
}

impl QuestTemplate {
    pub fn new(id: &str, description: &str, action: ActionKind, goal: u32, reward: i64) -> Self {
        Self {
            id: id.to_string(),
            description: description.to_string(),
            action,
            goal,
            reward,
            schema_version: TEMPLATE_SCHEMA_VERSION,
        }
    }
}

/// Per-player quest state. Progress freezes at the goal; `completed` is
/// the idempotency guard for the reward, not the event count.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuestProgress {
    pub quest_id: String,
    pub progress: u32,
    pub completed: bool,
}

impl QuestProgress {
    pub fn new(quest_id: &str) -> Self {
        Self {
            quest_id: quest_id.to_string(),
            progress: 0,
            completed: false,
        }
    }
}

/// Condition that earns an achievement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AchievementTrigger {
    /// Granted at registration, when the pet is adopted.
    AdoptPet,
    /// Perform an action some number of times.
    ActionCount { action: ActionKind, required: u32 },
    /// Hold at least this many coins at any point.
    ReachBalance { amount: i64 },
}

/// Global achievement definition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AchievementTemplate {
    pub id: String,
    pub description: String,
    pub trigger: AchievementTrigger,
    pub schema_version: u8,
}

impl AchievementTemplate {
    pub fn new(id: &str, description: &str, trigger: AchievementTrigger) -> Self {
        Self {
            id: id.to_string(),
            description: description.to_string(),
            trigger,
            schema_version: TEMPLATE_SCHEMA_VERSION,
        }
    }
}

/// Per-player achievement state. `earned` is monotonic: once set it
/// never reverts, even if the triggering condition later stops holding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AchievementProgress {
    pub achievement_id: String,
    pub progress: u32,
    pub earned: bool,
    pub earned_at: Option<DateTime<Utc>>,
}

impl AchievementProgress {
    pub fn new(achievement_id: &str) -> Self {
        Self {
            achievement_id: achievement_id.to_string(),
            progress: 0,
            earned: false,
            earned_at: None,
        }
    }

    pub fn mark_earned(&mut self) {
        if !self.earned {
            self.earned = true;
            self.earned_at = Some(Utc::now());
        }
    }
}

/// Authoritative per-player state: identity, coin balance, progression,
/// owned items, and quest/achievement progress.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerRecord {
    pub id: String,
    pub display_name: String,
    pub coins: i64,
    pub level: u32,
    pub experience: u64,
    pub experience_to_next: u64,
    pub inventory: Vec<ItemInstance>,
    pub quests: Vec<QuestProgress>,
    pub achievements: Vec<AchievementProgress>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub schema_version: u8,
}

impl PlayerRecord {
    pub fn new(id: &str, display_name: &str) -> Self {
        let now = Utc::now();
        Self {
            id: id.to_string(),
            display_name: display_name.to_string(),
            coins: STARTING_COINS,
            level: 1,
            experience: 0,
            experience_to_next: progression::experience_to_next(1),
            inventory: Vec::new(),
            quests: Vec::new(),
            achievements: Vec::new(),
            created_at: now,
            updated_at: now,
            schema_version: PLAYER_SCHEMA_VERSION,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn find_item(&self, item_id: &Uuid) -> Option<&ItemInstance> {
        self.inventory.iter().find(|item| item.id == *item_id)
    }
}

/// A player's pet. 1:1 with the owning player, keyed by player id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PetRecord {
    pub owner_id: String,
    pub name: String,
    pub hunger: u8,
    pub happiness: u8,
    pub health: u8,
    pub energy: u8,
    pub last_fed: Option<DateTime<Utc>>,
    pub last_played: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub schema_version: u8,
}

impl PetRecord {
    pub fn new(owner_id: &str, name: &str) -> Self {
        Self {
            owner_id: owner_id.to_string(),
            name: name.to_string(),
            hunger: 75,
            happiness: 80,
            health: 90,
            energy: 65,
            last_fed: None,
            last_played: None,
            created_at: Utc::now(),
            schema_version: PET_SCHEMA_VERSION,
        }
    }
}

/// Trade offer lifecycle. Terminal states are immutable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum OfferState {
    Open,
    Sold {
        buyer_id: String,
        closed_at: DateTime<Utc>,
    },
    Cancelled {
        closed_at: DateTime<Utc>,
    },
}

/// A seller-created marketplace offer holding one item in escrow while
/// open. At most one buyer may transition an open offer to sold.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TradeOffer {
    pub id: Uuid,
    pub seller_id: String,
    /// Snapshot of the escrowed item, removed from the seller's
    /// inventory when the offer was created.
    pub item: ItemInstance,
    pub price: i64,
    pub state: OfferState,
    pub created_at: DateTime<Utc>,
    pub schema_version: u8,
}

impl TradeOffer {
    pub fn new(seller_id: &str, item: ItemInstance, price: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            seller_id: seller_id.to_string(),
            item,
            price,
            state: OfferState::Open,
            created_at: Utc::now(),
            schema_version: OFFER_SCHEMA_VERSION,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, OfferState::Open)
    }

    pub fn into_sold(mut self, buyer_id: &str) -> Self {
        self.state = OfferState::Sold {
            buyer_id: buyer_id.to_string(),
            closed_at: Utc::now(),
        };
        self
    }

    pub fn into_cancelled(mut self) -> Self {
        self.state = OfferState::Cancelled {
            closed_at: Utc::now(),
        };
        self
    }
}

/// Why coins moved. `from`/`to` of `None` means the system mint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TransactionReason {
    /// Starting balance granted at registration.
    Registration,
    /// Shop purchase (coins leave the economy).
    Purchase,
    /// Player-to-player trade settlement.
    Trade,
    /// Quest completion reward.
    QuestReward,
}

/// Audit entry for every coin movement. Trades carry both endpoints so
/// conservation can be checked across the whole population.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CoinTransaction {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub amount: i64,
    pub reason: TransactionReason,
}

impl CoinTransaction {
    pub fn new(
        from: Option<&str>,
        to: Option<&str>,
        amount: i64,
        reason: TransactionReason,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            from: from.map(str::to_string),
            to: to.map(str::to_string),
            amount,
            reason,
        }
    }
}

// ============================================================================
// Client-facing snapshots
// ============================================================================

/// Pet gauges as returned to the client after every action.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PetView {
    pub name: String,
    pub hunger: u8,
    pub happiness: u8,
    pub health: u8,
    pub energy: u8,
}

impl From<&PetRecord> for PetView {
    fn from(pet: &PetRecord) -> Self {
        Self {
            name: pet.name.clone(),
            hunger: pet.hunger,
            happiness: pet.happiness,
            health: pet.health,
            energy: pet.energy,
        }
    }
}

/// Quest progress joined with its template for display.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuestView {
    pub id: String,
    pub description: String,
    pub progress: u32,
    pub goal: u32,
    pub reward: i64,
    pub completed: bool,
}

/// Achievement progress joined with its template for display.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AchievementView {
    pub id: String,
    pub description: String,
    pub earned: bool,
}

/// The authoritative state returned to the caller after each operation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerSnapshot {
    pub player_id: String,
    pub display_name: String,
    pub pet: PetView,
    pub coins: i64,
    pub level: u32,
    pub experience: u64,
    pub experience_to_next: u64,
    pub inventory: Vec<ItemInstance>,
    pub quests: Vec<QuestView>,
    pub achievements: Vec<AchievementView>,
}

/// A marketplace listing entry (open offers only).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OfferView {
    pub id: Uuid,
    pub seller_id: String,
    pub seller_name: String,
    pub item_name: String,
    pub category: ItemCategory,
    pub effect: u8,
    pub price: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_player_starts_with_canonical_state() {
        let player = PlayerRecord::new("p1", "Alice");
        assert_eq!(player.coins, STARTING_COINS);
        assert_eq!(player.level, 1);
        assert_eq!(player.experience, 0);
        assert!(player.inventory.is_empty());
        assert_eq!(player.schema_version, PLAYER_SCHEMA_VERSION);
    }

    #[test]
    fn new_pet_gauges_are_in_range() {
        let pet = PetRecord::new("p1", "Rex");
        for gauge in [pet.hunger, pet.happiness, pet.health, pet.energy] {
            assert!(gauge <= GAUGE_MAX);
        }
    }

    #[test]
    fn offer_terminal_transitions() {
        let item = ItemInstance::new("Apple", ItemCategory::Food, 15, 10);
        let offer = TradeOffer::new("seller", item.clone(), 40);
        assert!(offer.is_open());

        let sold = offer.clone().into_sold("buyer");
        assert!(!sold.is_open());
        assert!(matches!(sold.state, OfferState::Sold { ref buyer_id, .. } if buyer_id == "buyer"));

        let cancelled = offer.into_cancelled();
        assert!(!cancelled.is_open());
    }

    #[test]
    fn achievement_earned_is_monotonic() {
        let mut progress = AchievementProgress::new("rich");
        progress.mark_earned();
        let first = progress.earned_at;
        progress.mark_earned();
        assert!(progress.earned);
        assert_eq!(progress.earned_at, first);
    }
}
