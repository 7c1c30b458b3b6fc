//! Quest and achievement tracker.
//!
//! Observes `{player, ActionKind}` events emitted by completed actions
//! and advances any matching progress counters. Rewards are granted
//! exactly once: the persisted `completed`/`earned` flag is the
//! idempotency guard, so replaying a matching event can never re-grant.

use crate::game::errors::GameError;
use crate::game::ledger;
use crate::game::storage::GameStore;
use crate::game::types::{
    AchievementProgress, AchievementTrigger, ActionKind, CoinTransaction, PlayerRecord,
    QuestProgress, TransactionReason,
};

/// Outcome of one tracked event, for caller-side logging.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct TrackerOutcome {
    /// Quest ids that reached their goal on this event.
    pub completed_quests: Vec<String>,
    /// Achievement ids newly earned on this event.
    pub earned_achievements: Vec<String>,
}

/// Advance quest and achievement progress for one completed action.
///
/// The player record must already be locked and loaded by the caller;
/// the caller persists it afterwards. Quest rewards are credited here
/// and logged to the audit ledger.
pub fn record_action(
    store: &GameStore,
    player: &mut PlayerRecord,
    action: ActionKind,
) -> Result<TrackerOutcome, GameError> {
    let mut outcome = TrackerOutcome::default();

    for template in store.list_quest_templates()? {
        if template.action != action {
            continue;
        }
        let progress = find_or_insert_quest(player, &template.id);
        if progress.completed || progress.progress >= template.goal {
            continue;
        }
        progress.progress += 1;
        if progress.progress == template.goal {
            progress.completed = true;
            ledger::credit(player, template.reward);
            store.append_transaction(&CoinTransaction::new(
                None,
                Some(&player.id),
                template.reward,
                TransactionReason::QuestReward,
            ))?;
            outcome.completed_quests.push(template.id);
        }
    }

    for template in store.list_achievement_templates()? {
        let required = match template.trigger {
            AchievementTrigger::ActionCount {
                action: trigger_action,
                required,
            } if trigger_action == action => required,
            _ => continue,
        };
        let progress = find_or_insert_achievement(player, &template.id);
        if progress.earned {
            continue;
        }
        progress.progress += 1;
        if progress.progress >= required {
            progress.mark_earned();
            outcome.earned_achievements.push(template.id);
        }
    }

    // Quest rewards may have pushed the balance over a threshold.
    outcome
        .earned_achievements
        .extend(check_balance_achievements(store, player)?);

    Ok(outcome)
}

/// Earn any balance-threshold achievements the current balance satisfies.
/// Called after every balance change; earned flags never revert when the
/// balance later drops.
pub fn check_balance_achievements(
    store: &GameStore,
    player: &mut PlayerRecord,
) -> Result<Vec<String>, GameError> {
    let mut earned = Vec::new();
    for template in store.list_achievement_templates()? {
        let AchievementTrigger::ReachBalance { amount } = template.trigger else {
            continue;
        };
        if player.coins < amount {
            continue;
        }
        let progress = find_or_insert_achievement(player, &template.id);
        if !progress.earned {
            progress.mark_earned();
            earned.push(template.id);
        }
    }
    Ok(earned)
}

/// Grant the pet-adoption achievement at registration.
pub fn record_adoption(
    store: &GameStore,
    player: &mut PlayerRecord,
) -> Result<Vec<String>, GameError> {
    let mut earned = Vec::new();
    for template in store.list_achievement_templates()? {
        if !matches!(template.trigger, AchievementTrigger::AdoptPet) {
            continue;
        }
        let progress = find_or_insert_achievement(player, &template.id);
        if !progress.earned {
            progress.mark_earned();
            earned.push(template.id);
        }
    }
    Ok(earned)
}

fn find_or_insert_quest<'a>(player: &'a mut PlayerRecord, quest_id: &str) -> &'a mut QuestProgress {
    if let Some(position) = player.quests.iter().position(|q| q.quest_id == quest_id) {
        return &mut player.quests[position];
    }
    player.quests.push(QuestProgress::new(quest_id));
    let last = player.quests.len() - 1;
    &mut player.quests[last]
}

fn find_or_insert_achievement<'a>(
    player: &'a mut PlayerRecord,
    achievement_id: &str,
) -> &'a mut AchievementProgress {
    if let Some(position) = player
        .achievements
        .iter()
        .position(|a| a.achievement_id == achievement_id)
    {
        return &mut player.achievements[position];
    }
    player
        .achievements
        .push(AchievementProgress::new(achievement_id));
    let last = player.achievements.len() - 1;
    &mut player.achievements[last]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::storage::GameStoreBuilder;
    use tempfile::TempDir;

    fn setup() -> (TempDir, GameStore, PlayerRecord) {
        let dir = TempDir::new().expect("tempdir");
        let store = GameStoreBuilder::new(dir.path()).open().expect("store");
        let player = PlayerRecord::new("p1", "Alice");
        (dir, store, player)
    }

    #[test]
    fn quest_reward_granted_exactly_once() {
        let (_dir, store, mut player) = setup();
        let before = player.coins;

        // feed_3 has goal 3, reward 50.
        record_action(&store, &mut player, ActionKind::Feed).unwrap();
        record_action(&store, &mut player, ActionKind::Feed).unwrap();
        assert_eq!(player.coins, before);

        let outcome = record_action(&store, &mut player, ActionKind::Feed).unwrap();
        assert!(outcome.completed_quests.contains(&"feed_3".to_string()));
        assert_eq!(player.coins, before + 50);

        // A fourth matching event must not re-grant or advance further.
        let outcome = record_action(&store, &mut player, ActionKind::Feed).unwrap();
        assert!(outcome.completed_quests.is_empty());
        assert_eq!(player.coins, before + 50);
        let quest = player.quests.iter().find(|q| q.quest_id == "feed_3").unwrap();
        assert_eq!(quest.progress, 3);
        assert!(quest.completed);
    }

    #[test]
    fn non_matching_actions_do_not_advance() {
        let (_dir, store, mut player) = setup();
        record_action(&store, &mut player, ActionKind::Rest).unwrap();
        assert!(player.quests.iter().all(|q| q.progress == 0));
    }

    #[test]
    fn action_count_achievement_earned_at_threshold() {
        let (_dir, store, mut player) = setup();
        // caretaker requires 10 feeds.
        for _ in 0..9 {
            record_action(&store, &mut player, ActionKind::Feed).unwrap();
        }
        let caretaker = player
            .achievements
            .iter()
            .find(|a| a.achievement_id == "caretaker")
            .unwrap();
        assert!(!caretaker.earned);
        assert_eq!(caretaker.progress, 9);

        let outcome = record_action(&store, &mut player, ActionKind::Feed).unwrap();
        assert!(outcome
            .earned_achievements
            .contains(&"caretaker".to_string()));
    }

    #[test]
    fn balance_achievement_is_monotonic() {
        let (_dir, store, mut player) = setup();
        player.coins = 500;
        let earned = check_balance_achievements(&store, &mut player).unwrap();
        assert_eq!(earned, vec!["tycoon".to_string()]);

        // Dropping below the threshold does not revert the flag, and
        // re-crossing does not re-earn it.
        player.coins = 10;
        assert!(check_balance_achievements(&store, &mut player)
            .unwrap()
            .is_empty());
        player.coins = 600;
        assert!(check_balance_achievements(&store, &mut player)
            .unwrap()
            .is_empty());
        let tycoon = player
            .achievements
            .iter()
            .find(|a| a.achievement_id == "tycoon")
            .unwrap();
        assert!(tycoon.earned);
    }

    #[test]
    fn adoption_granted_once() {
        let (_dir, store, mut player) = setup();
        let earned = record_adoption(&store, &mut player).unwrap();
        assert_eq!(earned, vec!["first_friend".to_string()]);
        assert!(record_adoption(&store, &mut player).unwrap().is_empty());
    }

    #[test]
    fn quest_reward_is_audited() {
        let (_dir, store, mut player) = setup();
        for _ in 0..3 {
            record_action(&store, &mut player, ActionKind::Feed).unwrap();
        }
        let log = store.list_transactions().expect("transactions");
        let rewards: Vec<_> = log
            .iter()
            .filter(|tx| tx.reason == TransactionReason::QuestReward)
            .collect();
        assert_eq!(rewards.len(), 1);
        assert_eq!(rewards[0].amount, 50);
        assert_eq!(rewards[0].from, None);
        assert_eq!(rewards[0].to.as_deref(), Some("p1"));
    }
}
