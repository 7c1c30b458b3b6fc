//! Canonical templates inserted into a fresh store: the shop catalog,
//! the starter quests, and the achievement set. Operators can extend
//! these through the template tree without code changes.

use crate::game::types::{
    AchievementTemplate, AchievementTrigger, ActionKind, CatalogItem, ItemCategory, ItemInstance,
    QuestTemplate,
};

/// Shop catalog available to every player.
pub fn canonical_catalog() -> Vec<CatalogItem> {
    vec![
        CatalogItem::new("pizza", "Pizza", ItemCategory::Food, 30, 35),
        CatalogItem::new("bone", "Bone", ItemCategory::Toy, 25, 40),
        CatalogItem::new("vitamins", "Vitamins", ItemCategory::Health, 40, 50),
    ]
}

/// Items placed in a new player's inventory at registration.
pub fn starter_inventory() -> Vec<ItemInstance> {
    vec![
        ItemInstance::new("Apple", ItemCategory::Food, 15, 10),
        ItemInstance::new("Ball", ItemCategory::Toy, 20, 25),
    ]
}

/// Repeat-action quests with one-time coin rewards.
pub fn canonical_quests() -> Vec<QuestTemplate> {
    vec![
        QuestTemplate::new("feed_3", "Feed your pet 3 times", ActionKind::Feed, 3, 50),
        QuestTemplate::new("play_5", "Play 5 times", ActionKind::Play, 5, 75),
    ]
}

/// Achievement set. Earned flags are monotonic and carry no coin reward.
pub fn canonical_achievements() -> Vec<AchievementTemplate> {
    vec![
        AchievementTemplate::new("first_friend", "Adopt a pet", AchievementTrigger::AdoptPet),
        AchievementTemplate::new(
            "caretaker",
            "Feed your pet 10 times",
            AchievementTrigger::ActionCount {
                action: ActionKind::Feed,
                required: 10,
            },
        ),
        AchievementTemplate::new(
            "tycoon",
            "Hold 500 coins",
            AchievementTrigger::ReachBalance { amount: 500 },
        ),
    ]
}
